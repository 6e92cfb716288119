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

//! Synchronous single-channel adapter
//!
//! Wishbone-style: one strobed request carries address, data, direction
//! and lane select together, and is answered by a single acknowledge.
//! The only adapter state is the one transaction awaiting its ack.
//!
//! The wire may address by byte or by word. Word addressing shifts the
//! address right by two on encode; transaction-level addresses are
//! always byte addresses, so decode restores the pending byte address
//! rather than shifting back.

use super::{ProtocolAdapter, WireRequest, WireResponse};
use crate::core::error::{ProtocolError, Result};
use crate::core::transaction::Transaction;

/// Wire-level address unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddressUnit {
    /// Addresses count bytes
    #[default]
    Byte,
    /// Addresses count 32-bit words
    Word,
}

/// Single-channel request/response adapter
pub struct SyncAdapter {
    unit: AddressUnit,
    pending: Option<Transaction>,
}

impl SyncAdapter {
    pub fn new(unit: AddressUnit) -> Self {
        Self { unit, pending: None }
    }

    fn wire_address(&self, byte_address: u64) -> u64 {
        match self.unit {
            AddressUnit::Byte => byte_address,
            AddressUnit::Word => byte_address >> 2,
        }
    }

    fn byte_address(&self, wire_address: u64) -> u64 {
        match self.unit {
            AddressUnit::Byte => wire_address,
            AddressUnit::Word => wire_address << 2,
        }
    }
}

impl ProtocolAdapter for SyncAdapter {
    fn encode(&mut self, txn: &Transaction) -> Result<Vec<WireRequest>> {
        if self.pending.is_some() {
            return Err(ProtocolError::ChannelBusy.into());
        }
        self.pending = Some(*txn);
        log::trace!(
            "sync {} 0x{:016X} (wire 0x{:016X})",
            if txn.write { "wr" } else { "rd" },
            txn.address,
            self.wire_address(txn.address)
        );
        Ok(vec![WireRequest::Strobe {
            address: self.wire_address(txn.address),
            data: txn.data,
            select: txn.byte_enables.bits(),
            write: txn.write,
        }])
    }

    fn decode(&mut self, response: WireResponse) -> Result<Option<Transaction>> {
        let pending = self.pending.take().ok_or(ProtocolError::UnpairedAck)?;
        match response {
            WireResponse::Ack { data } => {
                if pending.write {
                    Ok(Some(pending))
                } else {
                    Ok(Some(pending.with_data(data)))
                }
            }
            _ => Err(ProtocolError::ResponseKindMismatch.into()),
        }
    }

    fn accept(&mut self, request: WireRequest) -> Result<Option<Transaction>> {
        match request {
            WireRequest::Strobe {
                address,
                data,
                select,
                write,
            } => {
                let byte_enables = super::check_select(select)?;
                Ok(Some(Transaction {
                    address: self.byte_address(address),
                    data,
                    write,
                    byte_enables,
                    valid: true,
                }))
            }
            _ => Err(ProtocolError::ResponseKindMismatch.into()),
        }
    }

    fn respond(&self, txn: &Transaction) -> WireResponse {
        WireResponse::Ack {
            data: if txn.write { 0 } else { txn.data },
        }
    }
}
