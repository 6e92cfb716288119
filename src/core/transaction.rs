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

//! Normalized bus transaction
//!
//! Every wire protocol the harness speaks is translated to and from this
//! one representation. The address is always carried at full 64-bit
//! width here, no matter how narrow the originating protocol's address
//! channel is; narrowing only ever happens at a declared bridge boundary.

use bitflags::bitflags;

/// Bus word size in bytes
pub const WORD_SIZE: usize = 4;

/// Bus word size in bits
pub const WORD_BITS: u32 = 32;

bitflags! {
    /// Per-byte write lane mask for one 32-bit word
    ///
    /// Bit `n` selects byte lane `n` (little-endian: lane 0 is the least
    /// significant byte of the word).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ByteEnables: u8 {
        const LANE0 = 0b0001;
        const LANE1 = 0b0010;
        const LANE2 = 0b0100;
        const LANE3 = 0b1000;
        const ALL   = 0b1111;
    }
}

impl ByteEnables {
    /// Check whether byte lane `lane` is selected
    pub fn lane(self, lane: usize) -> bool {
        debug_assert!(lane < WORD_SIZE);
        self.bits() & (1 << lane) != 0
    }
}

/// One normalized bus operation
///
/// Created per bus cycle and discarded after the response; adapters and
/// the bridge never hold on to a transaction beyond its completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transaction {
    /// Full-width target address (byte addressing)
    pub address: u64,

    /// Write payload, or read data once the response has been decoded
    pub data: u32,

    /// Operation direction: `true` for write, `false` for read
    pub write: bool,

    /// Byte lanes affected by a write; ignored for reads
    pub byte_enables: ByteEnables,

    /// Qualifier carried from the wire protocol's valid/strobe signal
    pub valid: bool,
}

impl Transaction {
    /// Create a full-word write transaction
    pub fn write(address: u64, data: u32) -> Self {
        Self {
            address,
            data,
            write: true,
            byte_enables: ByteEnables::ALL,
            valid: true,
        }
    }

    /// Create a write transaction touching only the selected byte lanes
    pub fn partial_write(address: u64, data: u32, byte_enables: ByteEnables) -> Self {
        Self {
            address,
            data,
            write: true,
            byte_enables,
            valid: true,
        }
    }

    /// Create a read transaction
    ///
    /// `data` is zero until an adapter fills it in from the response.
    pub fn read(address: u64) -> Self {
        Self {
            address,
            data: 0,
            write: false,
            byte_enables: ByteEnables::ALL,
            valid: true,
        }
    }

    /// Complete a read by attaching the returned data
    pub fn with_data(mut self, data: u32) -> Self {
        self.data = data;
        self
    }
}
