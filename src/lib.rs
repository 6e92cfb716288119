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

//! Wide-address bus bridging verification harness
//!
//! This library verifies that a bus fabric with a 64-bit address space
//! routes transactions correctly to memory targets mapped above the
//! 32-bit boundary. It models the fabric as a data-driven mapping table
//! and byte-array regions, drives deterministic write patterns into
//! regions whose bases differ only in the high address bits, and reads
//! everything back to detect cross-region aliasing caused by dropped
//! address bits.
//!
//! # Example
//!
//! ```
//! use widebus::core::scenario::{run_scenario, ScenarioDescriptor, ScenarioStatus};
//!
//! let descriptor = ScenarioDescriptor::builtin("high-low-linear").unwrap();
//! let result = run_scenario(&descriptor).unwrap();
//! assert_eq!(result.status, ScenarioStatus::Done);
//! ```

pub mod core;
