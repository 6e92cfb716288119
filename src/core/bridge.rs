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

//! Wide-to-narrow address bridging
//!
//! The bridge owns the fabric's mapping table: an ordered set of
//! non-overlapping address windows, each backed by a target with a
//! declared alias period. Routing a 64-bit address yields the matching
//! target and the (possibly narrower) address presented to it.
//!
//! The narrowing step is an explicit modulo against the target's
//! declared `alias_period`, never a raw truncation of high address
//! bits. Two wide addresses whose windows differ only above bit 32
//! therefore route to *different* targets; a fabric that masks the
//! address before consulting the table is exactly the bug this harness
//! exists to catch.

use crate::core::error::{HarnessError, Result};
use crate::core::transaction::WORD_SIZE;

/// Identifier of a downstream target, stable for the life of a bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetId(pub usize);

impl std::fmt::Display for TargetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "target{}", self.0)
    }
}

/// Operation direction, carried for logging and future access control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusOp {
    Read,
    Write,
}

/// One mapping table entry: an address window and its target's aliasing
///
/// `alias_period` is the target's native addressable range. A window
/// larger than its alias period describes a deliberately mirrored
/// region; the bridge reproduces that mirroring and nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapEntry {
    /// First wide address of the window
    pub base: u64,

    /// Window size in bytes
    pub size: u64,

    /// Native addressable range of the target (power of two, >= one word)
    pub alias_period: u64,
}

impl MapEntry {
    /// Check whether `address` falls inside this window
    pub fn contains(&self, address: u64) -> bool {
        address >= self.base && address - self.base < self.size
    }

    fn overlaps(&self, other: &MapEntry) -> bool {
        self.base < other.base.saturating_add(other.size)
            && other.base < self.base.saturating_add(self.size)
    }
}

/// Routing table from wide addresses to narrow-address targets
///
/// Pure lookup structure: [`route`](AddressBridge::route) has no side
/// effects, so generators and checkers can share one bridge freely.
#[derive(Debug)]
pub struct AddressBridge {
    entries: Vec<MapEntry>,
}

impl AddressBridge {
    /// Build a bridge from a mapping table
    ///
    /// # Errors
    ///
    /// - `HarnessError::OverlappingEntries` if two windows claim any
    ///   common wide address
    /// - `HarnessError::InvalidAliasPeriod` if an entry's alias period
    ///   is not a power of two of at least one word
    pub fn new(entries: Vec<MapEntry>) -> Result<Self> {
        for entry in &entries {
            if !entry.alias_period.is_power_of_two() || entry.alias_period < WORD_SIZE as u64 {
                return Err(HarnessError::InvalidAliasPeriod {
                    alias_period: entry.alias_period,
                });
            }
        }
        for (i, a) in entries.iter().enumerate() {
            for b in entries.iter().skip(i + 1) {
                if a.overlaps(b) {
                    return Err(HarnessError::OverlappingEntries {
                        first: a.base,
                        second: b.base,
                    });
                }
            }
        }
        Ok(Self { entries })
    }

    /// Route a wide address to its target and native address
    ///
    /// Finds the unique entry whose window contains `address` and
    /// computes the address presented to the target as
    /// `(address - base) % alias_period`.
    ///
    /// # Errors
    ///
    /// Returns `HarnessError::OutOfRange` if no window matches.
    pub fn route(&self, address: u64, op: BusOp) -> Result<(TargetId, u64)> {
        let (index, entry) = self
            .entries
            .iter()
            .enumerate()
            .find(|(_, entry)| entry.contains(address))
            .ok_or(HarnessError::OutOfRange { address })?;

        // Declared aliasing, not bit truncation: the modulo uses the
        // target's alias period, independent of any internal bus width.
        let native = (address - entry.base) % entry.alias_period;

        log::trace!(
            "route {:?} 0x{:016X} -> {} native 0x{:X}",
            op,
            address,
            TargetId(index),
            native
        );

        Ok((TargetId(index), native))
    }

    /// Get the mapping entry backing a target
    pub fn entry(&self, target: TargetId) -> &MapEntry {
        &self.entries[target.0]
    }

    /// Number of mapping entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether the mapping table is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn high_low_bridge() -> AddressBridge {
        AddressBridge::new(vec![
            MapEntry {
                base: 0x2_0000,
                size: 0x1_0000,
                alias_period: 0x1_0000,
            },
            MapEntry {
                base: 0x4_0002_0000,
                size: 0x1_0000,
                alias_period: 0x1_0000,
            },
        ])
        .unwrap()
    }

    #[test]
    fn test_route_low_window() {
        let bridge = high_low_bridge();
        let (target, native) = bridge.route(0x2_0040, BusOp::Write).unwrap();
        assert_eq!(target, TargetId(0));
        assert_eq!(native, 0x40);
    }

    #[test]
    fn test_route_distinguishes_high_bits() {
        // The two windows differ only above bit 32; a truncating
        // implementation would send both to target 0.
        let bridge = high_low_bridge();
        let (low, low_native) = bridge.route(0x2_0040, BusOp::Read).unwrap();
        let (high, high_native) = bridge.route(0x4_0002_0040, BusOp::Read).unwrap();
        assert_ne!(low, high);
        assert_eq!(low_native, high_native);
    }

    #[test]
    fn test_route_out_of_range() {
        let bridge = high_low_bridge();
        let err = bridge.route(0x10_0000, BusOp::Read).unwrap_err();
        assert!(matches!(
            err,
            HarnessError::OutOfRange { address: 0x10_0000 }
        ));

        // One byte past the high window
        assert!(bridge.route(0x4_0003_0000, BusOp::Read).is_err());
    }

    #[test]
    fn test_window_boundaries() {
        let bridge = high_low_bridge();
        assert!(bridge.route(0x2_0000, BusOp::Read).is_ok());
        assert!(bridge.route(0x2_FFFC, BusOp::Read).is_ok());
        assert!(bridge.route(0x1_FFFC, BusOp::Read).is_err());
        assert!(bridge.route(0x3_0000, BusOp::Read).is_err());
    }

    #[test]
    fn test_mirrored_window_wraps_by_alias_period() {
        let bridge = AddressBridge::new(vec![MapEntry {
            base: 0x2_0000,
            size: 0x200,
            alias_period: 0x100,
        }])
        .unwrap();

        let (_, a) = bridge.route(0x2_0010, BusOp::Write).unwrap();
        let (_, b) = bridge.route(0x2_0110, BusOp::Write).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, 0x10);
    }

    #[test]
    fn test_rejects_overlapping_entries() {
        let err = AddressBridge::new(vec![
            MapEntry {
                base: 0x1000,
                size: 0x1000,
                alias_period: 0x1000,
            },
            MapEntry {
                base: 0x1800,
                size: 0x1000,
                alias_period: 0x1000,
            },
        ])
        .unwrap_err();
        assert!(matches!(err, HarnessError::OverlappingEntries { .. }));
    }

    #[test]
    fn test_adjacent_entries_do_not_overlap() {
        assert!(AddressBridge::new(vec![
            MapEntry {
                base: 0x1000,
                size: 0x1000,
                alias_period: 0x1000,
            },
            MapEntry {
                base: 0x2000,
                size: 0x1000,
                alias_period: 0x1000,
            },
        ])
        .is_ok());
    }

    #[test]
    fn test_rejects_non_power_of_two_alias_period() {
        let err = AddressBridge::new(vec![MapEntry {
            base: 0,
            size: 0x100,
            alias_period: 0xC0,
        }])
        .unwrap_err();
        assert!(matches!(
            err,
            HarnessError::InvalidAliasPeriod { alias_period: 0xC0 }
        ));
    }
}
