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

//! Byte-addressable memory target model
//!
//! A region models one downstream memory target as nothing more than a
//! zero-initialized byte array of `alias_period` length. Aliasing is a
//! declared property of the region, so two wide addresses that resolve
//! to the same storage index after the alias modulo *must* read back the
//! same bytes; that is the behavior under test, not a defect of the
//! model.
//!
//! No timing, refresh, or ECC is modeled.

use crate::core::error::{HarnessError, Result};
use crate::core::transaction::{ByteEnables, WORD_SIZE};

/// One memory target: base, window size, alias period, backing bytes
pub struct MemoryRegionModel {
    /// First wide address of the region's window
    base: u64,

    /// Window size in bytes (may exceed `alias_period` for a mirrored
    /// region)
    size_bytes: u64,

    /// Native addressable range; storage wraps at this period
    alias_period: u64,

    /// Backing store, exactly `alias_period` bytes, zero-initialized
    storage: Vec<u8>,
}

impl MemoryRegionModel {
    /// Create a zero-initialized region
    ///
    /// # Errors
    ///
    /// Returns `HarnessError::InvalidAliasPeriod` if `alias_period` is
    /// not a power of two of at least one word.
    pub fn new(base: u64, size_bytes: u64, alias_period: u64) -> Result<Self> {
        if !alias_period.is_power_of_two() || alias_period < WORD_SIZE as u64 {
            return Err(HarnessError::InvalidAliasPeriod { alias_period });
        }
        Ok(Self {
            base,
            size_bytes,
            alias_period,
            storage: vec![0u8; alias_period as usize],
        })
    }

    /// Region window base address
    pub fn base(&self) -> u64 {
        self.base
    }

    /// Region window size in bytes
    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// Declared alias period
    pub fn alias_period(&self) -> u64 {
        self.alias_period
    }

    /// Resolve a wide address inside the window to a storage offset
    ///
    /// Wraps by the alias period, reproducing the region's declared
    /// mirroring.
    pub fn resolve(&self, address: u64) -> u64 {
        debug_assert!(
            address >= self.base && address - self.base < self.size_bytes,
            "address 0x{:016X} outside region window",
            address
        );
        (address - self.base) % self.alias_period
    }

    /// Write one word, applying only the selected byte lanes
    ///
    /// Unselected bytes keep their prior value. The lane mask is applied
    /// in one call, so a write is never observed half-applied.
    ///
    /// # Panics
    ///
    /// Panics if `native_address` reaches beyond the alias period or is
    /// not word-aligned; the bridge contract keeps native addresses in
    /// range, so this is a harness bug, not a test failure.
    pub fn write(&mut self, native_address: u64, value: u32, byte_enables: ByteEnables) {
        let index = self.storage_index(native_address);
        let bytes = value.to_le_bytes();
        for lane in 0..WORD_SIZE {
            if byte_enables.lane(lane) {
                self.storage[index + lane] = bytes[lane];
            }
        }
    }

    /// Read one full word
    ///
    /// Words never written read back as zero.
    ///
    /// # Panics
    ///
    /// Same contract as [`write`](MemoryRegionModel::write).
    pub fn read(&self, native_address: u64) -> u32 {
        let index = self.storage_index(native_address);
        u32::from_le_bytes([
            self.storage[index],
            self.storage[index + 1],
            self.storage[index + 2],
            self.storage[index + 3],
        ])
    }

    fn storage_index(&self, native_address: u64) -> usize {
        assert!(
            native_address + WORD_SIZE as u64 <= self.alias_period,
            "native address 0x{:X} beyond alias period 0x{:X}",
            native_address,
            self.alias_period
        );
        assert!(
            native_address % WORD_SIZE as u64 == 0,
            "unaligned word access at native address 0x{:X}",
            native_address
        );
        native_address as usize
    }
}
