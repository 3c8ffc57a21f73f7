// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! vmsim entry point: picks the replacement policy, seeds the RNG and
//! drives the simulation onto the console dashboard.

#![forbid(unsafe_code)]

use std::env;
use std::process::ExitCode;
use std::sync::atomic::AtomicBool;

use log::error;

use vmsim::{ConsoleDashboard, Kernel, SimConfig, SimRng, POLICY_NAMES};

fn help() -> String {
    format!(
        "vmsim simulates a demand-paged virtual-memory subsystem.\n\
         Usage: vmsim [{}] [--seed N]",
        POLICY_NAMES.join("|")
    )
}

fn main() -> ExitCode {
    env_logger::init();

    let mut policy: Option<String> = None;
    let mut seed: Option<u64> = None;
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--help" | "-h" => {
                println!("{}", help());
                return ExitCode::SUCCESS;
            }
            "--seed" => match args.next().map(|raw| raw.parse::<u64>()) {
                Some(Ok(value)) => seed = Some(value),
                _ => {
                    eprintln!("vmsim: --seed expects an integer");
                    return ExitCode::FAILURE;
                }
            },
            other if policy.is_none() && !other.starts_with('-') => {
                policy = Some(other.to_string());
            }
            other => {
                eprintln!("vmsim: unexpected argument {other}\n{}", help());
                return ExitCode::FAILURE;
            }
        }
    }

    let policy = policy.unwrap_or_else(|| "clock".to_string());
    let rng = match seed {
        Some(seed) => SimRng::with_seed(seed),
        None => SimRng::new(),
    };
    let mut kernel = match Kernel::new(&policy, SimConfig::default(), rng) {
        Ok(kernel) => kernel,
        Err(err) => {
            eprintln!("vmsim: {err}");
            return ExitCode::FAILURE;
        }
    };

    let mut dashboard = ConsoleDashboard::stdout();
    let shutdown = AtomicBool::new(false);
    match kernel.run(&mut dashboard, &shutdown) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("simulation aborted: {err}");
            eprintln!("vmsim: {err}");
            ExitCode::FAILURE
        }
    }
}
