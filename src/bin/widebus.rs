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

//! Scenario runner
//!
//! Thin front end: picks a built-in scenario or loads a TOML descriptor,
//! runs it against the simulated fabric, and prints the reports.

use clap::Parser;
use log::info;
use std::path::PathBuf;
use std::process::ExitCode;
use widebus::core::error::Result;
use widebus::core::scenario::{run_scenario, ScenarioDescriptor, ScenarioStatus};

/// Wide-address bus bridging verification harness
#[derive(Parser)]
#[command(name = "widebus")]
#[command(about = "Runs address-bridging verification scenarios", long_about = None)]
struct Args {
    /// Name of a built-in scenario
    scenario: Option<String>,

    /// Load the scenario descriptor from a TOML file instead
    #[arg(short = 'f', long)]
    file: Option<PathBuf>,

    /// List built-in scenarios and exit
    #[arg(short = 'l', long)]
    list: bool,
}

fn load_descriptor(args: &Args) -> Result<ScenarioDescriptor> {
    if let Some(path) = &args.file {
        return ScenarioDescriptor::from_path(path);
    }
    let name = args.scenario.as_deref().unwrap_or("high-low-linear");
    ScenarioDescriptor::builtin(name).ok_or_else(|| {
        widebus::core::error::HarnessError::Descriptor(format!("unknown scenario '{}'", name))
    })
}

fn run(args: &Args) -> Result<ScenarioStatus> {
    let descriptor = load_descriptor(args)?;
    let result = run_scenario(&descriptor)?;

    for (index, report) in result.reports.iter().enumerate() {
        println!(
            "region {}: {} words checked, {} mismatches",
            index,
            report.total,
            report.mismatches.len()
        );
        for mismatch in &report.mismatches {
            println!(
                "  0x{:016X}: expected 0x{:08X}, got 0x{:08X}",
                mismatch.address, mismatch.expected, mismatch.actual
            );
        }
    }
    println!("scenario '{}': {:?}", descriptor.name, result.status);
    Ok(result.status)
}

fn main() -> ExitCode {
    env_logger::init();

    let args = Args::parse();

    info!("widebus v{}", env!("CARGO_PKG_VERSION"));

    if args.list {
        for name in ScenarioDescriptor::builtin_names() {
            println!("{}", name);
        }
        return ExitCode::SUCCESS;
    }

    match run(&args) {
        Ok(ScenarioStatus::Done) => ExitCode::SUCCESS,
        Ok(status) => {
            log::error!("scenario finished with status {:?}", status);
            ExitCode::FAILURE
        }
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
