// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 The widebus developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Split-channel adapter
//!
//! AXI-style: a write travels as a separate address phase and data
//! phase, a read as an address phase answered on its own data channel.
//! The adapter pairs address-phase metadata with the matching
//! data-phase payload before a [`Transaction`] exists, and holds at
//! most one in-flight transaction per direction; the harness never
//! reorders across the two channels.

use super::{ProtocolAdapter, WireRequest, WireResponse};
use crate::core::error::{ProtocolError, Result};
use crate::core::transaction::Transaction;

/// Decoupled address/data channel adapter
#[derive(Default)]
pub struct SplitChannelAdapter {
    /// Master side: write awaiting its completion ack
    pending_write: Option<Transaction>,

    /// Master side: read awaiting its data phase
    pending_read: Option<Transaction>,

    /// Target side: write address phase awaiting its data phase
    pending_write_address: Option<u64>,
}

impl SplitChannelAdapter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProtocolAdapter for SplitChannelAdapter {
    fn encode(&mut self, txn: &Transaction) -> Result<Vec<WireRequest>> {
        if txn.write {
            if self.pending_write.is_some() {
                return Err(ProtocolError::ChannelBusy.into());
            }
            self.pending_write = Some(*txn);
            log::trace!("split wr 0x{:016X} = 0x{:08X}", txn.address, txn.data);
            Ok(vec![
                WireRequest::WriteAddress {
                    address: txn.address,
                },
                WireRequest::WriteData {
                    data: txn.data,
                    strobe: txn.byte_enables.bits(),
                },
            ])
        } else {
            if self.pending_read.is_some() {
                return Err(ProtocolError::ChannelBusy.into());
            }
            self.pending_read = Some(*txn);
            log::trace!("split rd 0x{:016X}", txn.address);
            Ok(vec![WireRequest::ReadAddress {
                address: txn.address,
            }])
        }
    }

    fn decode(&mut self, response: WireResponse) -> Result<Option<Transaction>> {
        match response {
            WireResponse::WriteAck => {
                let txn = self.pending_write.take().ok_or(ProtocolError::UnpairedAck)?;
                Ok(Some(txn))
            }
            WireResponse::ReadData { data } => {
                let txn = self
                    .pending_read
                    .take()
                    .ok_or(ProtocolError::UnpairedReadData)?;
                Ok(Some(txn.with_data(data)))
            }
            WireResponse::Ack { .. } => Err(ProtocolError::ResponseKindMismatch.into()),
        }
    }

    fn accept(&mut self, request: WireRequest) -> Result<Option<Transaction>> {
        match request {
            WireRequest::WriteAddress { address } => {
                if self.pending_write_address.is_some() {
                    return Err(ProtocolError::ChannelBusy.into());
                }
                self.pending_write_address = Some(address);
                Ok(None)
            }
            WireRequest::WriteData { data, strobe } => {
                let address = self
                    .pending_write_address
                    .take()
                    .ok_or(ProtocolError::UnpairedWriteData)?;
                let byte_enables = super::check_select(strobe)?;
                Ok(Some(Transaction {
                    address,
                    data,
                    write: true,
                    byte_enables,
                    valid: true,
                }))
            }
            WireRequest::ReadAddress { address } => Ok(Some(Transaction::read(address))),
            WireRequest::Strobe { .. } => Err(ProtocolError::ResponseKindMismatch.into()),
        }
    }

    fn respond(&self, txn: &Transaction) -> WireResponse {
        if txn.write {
            WireResponse::WriteAck
        } else {
            WireResponse::ReadData { data: txn.data }
        }
    }
}
