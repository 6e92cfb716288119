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

//! Wire protocol adapters
//!
//! Two protocol flavors reach the fabric: a synchronous single-channel
//! protocol where one strobed request carries address, data and lane
//! select together, and a split-channel protocol where address and data
//! phases travel separately and must be paired again on the far side.
//!
//! Both are normalized to the same [`Transaction`] contract. An adapter
//! is a small state machine, not a format: it owns the pairing of
//! phases, holds at most one in-flight transaction per direction, and
//! rejects phases arriving in an order the protocol forbids.
//!
//! The [`Transport`] trait is the seam to whatever carries wire
//! requests to the device under test; the harness never assumes how
//! that transport is reached.

pub mod split;
pub mod sync;

pub use split::SplitChannelAdapter;
pub use sync::{AddressUnit, SyncAdapter};

use crate::core::error::{ProtocolError, Result};
use crate::core::transaction::{ByteEnables, Transaction, WORD_SIZE};

/// One wire-level request phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireRequest {
    /// Single-channel strobe carrying a whole operation at once
    Strobe {
        address: u64,
        data: u32,
        select: u8,
        write: bool,
    },

    /// Split-channel write address phase
    WriteAddress { address: u64 },

    /// Split-channel write data phase
    WriteData { data: u32, strobe: u8 },

    /// Split-channel read address phase
    ReadAddress { address: u64 },
}

/// One wire-level response phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireResponse {
    /// Single-channel acknowledge; `data` is the read word, zero for
    /// writes
    Ack { data: u32 },

    /// Split-channel write completion
    WriteAck,

    /// Split-channel read data phase
    ReadData { data: u32 },
}

/// Transaction transport toward the device under test
///
/// A request phase that produces no response of its own (a split write
/// address phase) yields `Ok(None)`.
pub trait Transport {
    fn submit(&mut self, request: WireRequest) -> Result<Option<WireResponse>>;
}

/// Translation between wire phases and normalized transactions
///
/// Adapters are used on both sides of the transport: a master encodes
/// transactions into request phases and decodes response phases, while
/// a target accepts request phases, reassembles them into transactions,
/// and produces the response phases for completed ones.
pub trait ProtocolAdapter {
    /// Master side: translate one transaction into its ordered request
    /// phases and mark it in flight.
    fn encode(&mut self, txn: &Transaction) -> Result<Vec<WireRequest>>;

    /// Master side: consume one response phase; returns the completed
    /// transaction once all of its phases have resolved.
    fn decode(&mut self, response: WireResponse) -> Result<Option<Transaction>>;

    /// Target side: consume one request phase; returns a transaction
    /// once a full operation has been reassembled.
    fn accept(&mut self, request: WireRequest) -> Result<Option<Transaction>>;

    /// Target side: produce the response phase for a completed
    /// transaction (read data filled in by the target).
    fn respond(&self, txn: &Transaction) -> WireResponse;
}

/// Validate a wire-level lane select mask against the word width
pub(crate) fn check_select(mask: u8) -> Result<ByteEnables> {
    ByteEnables::from_bits(mask).ok_or_else(|| {
        ProtocolError::ByteEnableWidth {
            mask,
            lanes: WORD_SIZE,
        }
        .into()
    })
}

/// Drive one transaction through an adapter and transport to completion
///
/// Issues every encoded request phase in order, feeding each response
/// phase back into the adapter.
pub fn transfer(
    adapter: &mut dyn ProtocolAdapter,
    transport: &mut dyn Transport,
    txn: Transaction,
) -> Result<Transaction> {
    let mut completed = None;
    for request in adapter.encode(&txn)? {
        if let Some(response) = transport.submit(request)? {
            completed = adapter.decode(response)?;
        }
    }
    completed.ok_or_else(|| ProtocolError::IncompleteTransfer.into())
}
