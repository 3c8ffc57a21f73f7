// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Simulation parameters.
//!
//! `Default` carries the contract constants; tests shrink the ranges to pin
//! behavior. [`SimConfig::validate`] rejects configurations the simulator
//! cannot run (inverted ranges, probabilities outside `[0, 1]`).

use std::ops::RangeInclusive;
use std::time::Duration;

use thiserror::Error;

use crate::Pid;

/// Hard cap on live processes.
pub const MAX_PROCESS_COUNT: usize = 25;

/// Validation failures for [`SimConfig`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A range field is empty (start > end) or starts at zero where a
    /// positive value is required.
    #[error("empty or zero range: {0}")]
    EmptyRange(&'static str),
    /// A probability field lies outside `[0, 1]`.
    #[error("probability out of range: {0}")]
    BadProbability(&'static str),
    /// The live-process cap is zero.
    #[error("max_processes must be positive")]
    NoProcessRoom,
}

/// Tunable parameters of one simulation run.
#[derive(Clone, Debug)]
pub struct SimConfig {
    /// Physical frame count drawn once at boot.
    pub frame_count: RangeInclusive<usize>,
    /// Page-table length drawn per process at spawn.
    pub page_table_len: RangeInclusive<usize>,
    /// Total references a process issues before exiting.
    pub process_ttl: RangeInclusive<u64>,
    /// Steps between working-set rotations.
    pub rotation_period: RangeInclusive<u64>,
    /// Per-page probability of landing in the working set on rotation.
    pub working_set_prob: f64,
    /// Probability a step references the working set rather than the idle set.
    pub hot_access_prob: f64,
    /// Probability an access is a write.
    pub write_prob: f64,
    /// Step budget drawn per process per tick.
    pub steps_per_tick: RangeInclusive<u32>,
    /// Probability of spawning extra processes at the end of a tick.
    pub spawn_prob: f64,
    /// Batch size of one spawn round.
    pub spawn_batch: RangeInclusive<usize>,
    /// Processes created at boot.
    pub initial_processes: RangeInclusive<usize>,
    /// Live-process cap; spawn requests beyond it are truncated.
    pub max_processes: usize,
    /// Pid space processes draw from.
    pub pid_range: RangeInclusive<Pid>,
    /// Pacing delay between ticks.
    pub tick_interval: Duration,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            frame_count: 512..=1024,
            page_table_len: 32..=64,
            process_ttl: 1024..=2048,
            rotation_period: 128..=256,
            working_set_prob: 0.20,
            hot_access_prob: 0.9,
            write_prob: 0.5,
            steps_per_tick: 64..=128,
            spawn_prob: 0.45,
            spawn_batch: 1..=3,
            initial_processes: 5..=10,
            max_processes: MAX_PROCESS_COUNT,
            pid_range: 1000..=9999,
            tick_interval: Duration::from_millis(500),
        }
    }
}

impl SimConfig {
    /// Checks the configuration is runnable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frame_count.is_empty() || *self.frame_count.start() == 0 {
            return Err(ConfigError::EmptyRange("frame_count"));
        }
        if self.page_table_len.is_empty() || *self.page_table_len.start() == 0 {
            return Err(ConfigError::EmptyRange("page_table_len"));
        }
        if self.process_ttl.is_empty() || *self.process_ttl.start() == 0 {
            return Err(ConfigError::EmptyRange("process_ttl"));
        }
        if self.rotation_period.is_empty() || *self.rotation_period.start() == 0 {
            return Err(ConfigError::EmptyRange("rotation_period"));
        }
        if self.steps_per_tick.is_empty() || *self.steps_per_tick.start() == 0 {
            return Err(ConfigError::EmptyRange("steps_per_tick"));
        }
        if self.spawn_batch.is_empty() {
            return Err(ConfigError::EmptyRange("spawn_batch"));
        }
        if self.initial_processes.is_empty() {
            return Err(ConfigError::EmptyRange("initial_processes"));
        }
        if self.pid_range.is_empty() {
            return Err(ConfigError::EmptyRange("pid_range"));
        }
        if self.max_processes == 0 {
            return Err(ConfigError::NoProcessRoom);
        }
        for (value, name) in [
            (self.working_set_prob, "working_set_prob"),
            (self.hot_access_prob, "hot_access_prob"),
            (self.write_prob, "write_prob"),
            (self.spawn_prob, "spawn_prob"),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::BadProbability(name));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(SimConfig::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_inverted_range() {
        let cfg = SimConfig {
            frame_count: 10..=5,
            ..SimConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::EmptyRange("frame_count")));
    }

    #[test]
    fn rejects_zero_sized_page_tables() {
        let cfg = SimConfig {
            page_table_len: 0..=4,
            ..SimConfig::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::EmptyRange("page_table_len"))
        );
    }

    #[test]
    fn rejects_probability_above_one() {
        let cfg = SimConfig {
            spawn_prob: 1.5,
            ..SimConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::BadProbability("spawn_prob")));
    }

    #[test]
    fn rejects_zero_process_cap() {
        let cfg = SimConfig {
            max_processes: 0,
            ..SimConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::NoProcessRoom));
    }
}
