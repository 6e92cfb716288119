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

/// Harness error types
use thiserror::Error;

/// Result type for harness operations
pub type Result<T> = std::result::Result<T, HarnessError>;

/// Main error type for the verification harness
///
/// Routing and protocol failures are structural: they indicate a broken
/// mapping table or adapter, not a data error, and are never retried.
/// Data mismatches are *not* errors; they are collected in
/// [`VerificationReport`](crate::core::pattern::VerificationReport).
#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("address 0x{address:016X} matches no mapping entry")]
    OutOfRange { address: u64 },

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("alias period 0x{alias_period:X} is not a power of two of at least one word")]
    InvalidAliasPeriod { alias_period: u64 },

    #[error("mapping entries overlap: base 0x{first:016X} and base 0x{second:016X}")]
    OverlappingEntries { first: u64, second: u64 },

    #[error("invalid scenario descriptor: {0}")]
    Descriptor(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Wire-protocol framing errors
///
/// Raised by protocol adapters when request/response phases arrive in an
/// order the protocol does not allow, or carry a shape that disagrees
/// with the configured word size.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("write data phase with no pending write address phase")]
    UnpairedWriteData,

    #[error("read data phase with no pending read address phase")]
    UnpairedReadData,

    #[error("acknowledge received with no request in flight")]
    UnpairedAck,

    #[error("address phase issued while a transaction is already in flight")]
    ChannelBusy,

    #[error("byte-enable mask 0x{mask:02X} exceeds the {lanes}-lane word width")]
    ByteEnableWidth { mask: u8, lanes: usize },

    #[error("response kind does not match the request in flight")]
    ResponseKindMismatch,

    #[error("all request phases issued but no completing response arrived")]
    IncompleteTransfer,
}
