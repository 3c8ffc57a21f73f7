// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Synthetic workload processes.
//!
//! A process owns a page table and partitions its pages into a hot working
//! set and a cold idle set. Most steps reference the working set; the
//! partition is re-rolled every few hundred steps so the locality drifts.
//! After `ttl` references the process exits on its own.

use crate::config::SimConfig;
use crate::page_table::PageTable;
use crate::rng::SimRng;
use crate::syscall::Syscall;
use crate::{PageIndex, Pid};

/// Read-only view of one process for the dashboard.
#[derive(Clone, Debug, PartialEq)]
pub struct ProcessStats {
    pub pid: Pid,
    pub ttl: u64,
    pub counter: u64,
    pub pages: usize,
    pub working_set: usize,
    pub working_set_ttl: u64,
    pub working_set_percent: f64,
    pub rotations: u64,
}

/// One synthetic process.
pub struct Process {
    pid: Pid,
    page_table: PageTable,
    ttl: u64,
    counter: u64,
    working_set: Vec<PageIndex>,
    idle_set: Vec<PageIndex>,
    working_set_ttl: u64,
    rotations: u64,
}

impl Process {
    /// Creates a process with freshly drawn page-table length and lifetime,
    /// and an initial working-set partition.
    pub fn spawn(pid: Pid, cfg: &SimConfig, rng: &mut SimRng) -> Self {
        let pages = rng.pick(cfg.page_table_len.clone());
        let mut process = Self {
            pid,
            page_table: PageTable::new(pages),
            ttl: rng.pick(cfg.process_ttl.clone()),
            counter: 0,
            working_set: Vec::new(),
            idle_set: Vec::new(),
            working_set_ttl: 0,
            rotations: 0,
        };
        process.rotate(cfg, rng);
        process
    }

    /// Re-rolls the working-set partition and schedules the next rotation.
    ///
    /// An empty working set is allowed; `step` falls back to the idle set.
    fn rotate(&mut self, cfg: &SimConfig, rng: &mut SimRng) {
        self.working_set_ttl += rng.pick(cfg.rotation_period.clone());
        self.working_set.clear();
        self.idle_set.clear();
        for page in 0..self.page_table.len() {
            if rng.chance(cfg.working_set_prob) {
                self.working_set.push(page);
            } else {
                self.idle_set.push(page);
            }
        }
        self.rotations += 1;
    }

    /// Runs one step and returns the syscall to issue.
    ///
    /// Exits after exactly `ttl` access steps; rotates the working set when
    /// the rotation deadline passed.
    pub fn step(&mut self, cfg: &SimConfig, rng: &mut SimRng) -> Syscall {
        let step_index = self.counter;
        self.counter += 1;
        if step_index >= self.ttl {
            return Syscall::Exit { pid: self.pid };
        }
        if step_index >= self.working_set_ttl {
            self.rotate(cfg, rng);
        }
        let (primary, fallback) = if rng.chance(cfg.hot_access_prob) {
            (&self.working_set, &self.idle_set)
        } else {
            (&self.idle_set, &self.working_set)
        };
        let pool = if primary.is_empty() { fallback } else { primary };
        // The partition covers every page index, so `pool` is non-empty
        // whenever the page table is.
        let page = rng.choose(pool).copied().unwrap_or_default();
        Syscall::AccessMemory {
            pid: self.pid,
            page,
            modify: rng.chance(cfg.write_prob),
        }
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    pub fn page_table(&self) -> &PageTable {
        &self.page_table
    }

    pub fn page_table_mut(&mut self) -> &mut PageTable {
        &mut self.page_table
    }

    pub fn stats(&self) -> ProcessStats {
        let pages = self.page_table.len();
        let working_set = self.working_set.len();
        let working_set_percent = if pages == 0 {
            0.0
        } else {
            100.0 * working_set as f64 / pages as f64
        };
        ProcessStats {
            pid: self.pid,
            ttl: self.ttl,
            counter: self.counter,
            pages,
            working_set,
            working_set_ttl: self.working_set_ttl,
            working_set_percent,
            rotations: self.rotations,
        }
    }
}
