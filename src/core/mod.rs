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

//! Core verification components
//!
//! This module contains all harness components:
//! - Normalized bus transactions and byte-enable masks
//! - Address bridge (wide-to-narrow routing)
//! - Memory region models with declared aliasing
//! - Deterministic pattern generation and checking
//! - Protocol adapters (synchronous and split-channel)
//! - Scenario orchestration

pub mod bridge;
pub mod error;
pub mod pattern;
pub mod protocol;
pub mod region;
pub mod scenario;
pub mod transaction;

// Re-export commonly used types
pub use bridge::{AddressBridge, BusOp, MapEntry, TargetId};
pub use error::{HarnessError, ProtocolError, Result};
pub use pattern::{PatternChecker, PatternGenerator, PatternParams, PatternPolicy, VerificationReport};
pub use protocol::{ProtocolAdapter, Transport};
pub use region::MemoryRegionModel;
pub use scenario::{
    run_scenario, AbortHandle, ScenarioDescriptor, ScenarioResult, ScenarioStatus,
};
pub use transaction::{ByteEnables, Transaction};
