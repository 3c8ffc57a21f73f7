// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Simulation kernel.
//!
//! Owns the process map, the MMU and the replacement policy. Each tick it
//! round-robins the live processes, dispatches their syscalls, services
//! page faults and publishes a [`TickReport`]. Everything runs on one
//! task; a tick is atomic with respect to the simulation.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use log::{debug, info, warn};

use crate::config::SimConfig;
use crate::error::SimError;
use crate::mmu::{FrameId, Mmu};
use crate::process::Process;
use crate::render::{TickReport, TickSink};
use crate::replacer::{replacer_for, Replacer};
use crate::rng::SimRng;
use crate::syscall::{Exception, Syscall};
use crate::{PageIndex, Pid};

/// Monotone access counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AccessStats {
    total: u64,
    faults: u64,
    replaced: u64,
}

impl AccessStats {
    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn faults(&self) -> u64 {
        self.faults
    }

    pub fn replaced(&self) -> u64 {
        self.replaced
    }

    /// Snapshot with derived rates for the renderer.
    pub fn view(&self) -> AccessStatsView {
        AccessStatsView {
            total: self.total,
            faults: self.faults,
            replaced: self.replaced,
            fault_rate_percent: (self.total > 0)
                .then(|| 100.0 * self.faults as f64 / self.total as f64),
            replacement_rate_percent: (self.faults > 0)
                .then(|| 100.0 * self.replaced as f64 / self.faults as f64),
        }
    }
}

/// Access counters plus derived rates; rates are `None` until their
/// denominator is non-zero (tick 1 renders before any access).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AccessStatsView {
    pub total: u64,
    pub faults: u64,
    pub replaced: u64,
    pub fault_rate_percent: Option<f64>,
    pub replacement_rate_percent: Option<f64>,
}

/// The simulated kernel.
pub struct Kernel {
    cfg: SimConfig,
    rng: SimRng,
    mmu: Mmu,
    replacer: Box<dyn Replacer>,
    processes: BTreeMap<Pid, Process>,
    stats: AccessStats,
}

impl Kernel {
    /// Boots a kernel with the named replacement policy and spawns the
    /// initial process fleet.
    pub fn new(policy: &str, cfg: SimConfig, mut rng: SimRng) -> Result<Self, SimError> {
        cfg.validate()?;
        let replacer = replacer_for(policy)?;
        let total_frames = rng.pick(cfg.frame_count.clone());
        let initial = rng.pick(cfg.initial_processes.clone());
        let mut kernel = Self {
            cfg,
            rng,
            mmu: Mmu::new(total_frames),
            replacer,
            processes: BTreeMap::new(),
            stats: AccessStats::default(),
        };
        info!(
            "boot: policy={} frames={} initial_processes={}",
            kernel.replacer.name(),
            total_frames,
            initial
        );
        kernel.spawn(initial);
        Ok(kernel)
    }

    /// Spawns up to `requested` processes, truncated at the live cap.
    /// Returns how many were actually created.
    pub fn spawn(&mut self, requested: usize) -> usize {
        let room = self.cfg.max_processes.saturating_sub(self.processes.len());
        let count = requested.min(room);
        for _ in 0..count {
            let processes = &self.processes;
            let pid = self
                .rng
                .pick_unique(self.cfg.pid_range.clone(), |candidate| {
                    processes.contains_key(&candidate)
                });
            let process = Process::spawn(pid, &self.cfg, &mut self.rng);
            let stats = process.stats();
            debug!("spawn pid={pid} pages={} ttl={}", stats.pages, stats.ttl);
            self.processes.insert(pid, process);
        }
        count
    }

    /// Runs one tick: steps every live process through its drawn budget,
    /// maybe spawns newcomers, and returns the report for the renderer.
    ///
    /// The pid snapshot is taken at tick start, so processes spawned this
    /// tick first run on the next one.
    pub fn tick(&mut self) -> Result<TickReport, SimError> {
        let pids: Vec<Pid> = self.processes.keys().copied().collect();
        for pid in pids {
            let budget = self.rng.pick(self.cfg.steps_per_tick.clone());
            for _ in 0..budget {
                let Some(process) = self.processes.get_mut(&pid) else {
                    break;
                };
                self.stats.total += 1;
                let syscall = process.step(&self.cfg, &mut self.rng);
                let exits = matches!(syscall, Syscall::Exit { .. });
                self.syscall(syscall)?;
                if exits {
                    break;
                }
            }
        }
        if self.processes.len() < self.cfg.max_processes && self.rng.chance(self.cfg.spawn_prob) {
            let batch = self.rng.pick(self.cfg.spawn_batch.clone());
            self.spawn(batch);
        }
        Ok(self.report())
    }

    /// Runs ticks until every process exited or `shutdown` is raised,
    /// publishing each report to `sink` and pacing between ticks.
    pub fn run(&mut self, sink: &mut dyn TickSink, shutdown: &AtomicBool) -> Result<(), SimError> {
        while !self.processes.is_empty() {
            let report = self.tick()?;
            sink.publish(&report);
            if shutdown.load(Ordering::Relaxed) {
                info!("shutdown requested, stopping simulation");
                return Ok(());
            }
            thread::sleep(self.cfg.tick_interval);
        }
        info!(
            "all processes exited: total={} faults={} replaced={}",
            self.stats.total, self.stats.faults, self.stats.replaced
        );
        Ok(())
    }

    /// Dispatches one syscall. Page faults raised by the access path are
    /// serviced here; the issuing process never observes them.
    pub fn syscall(&mut self, syscall: Syscall) -> Result<(), SimError> {
        match syscall {
            Syscall::Exit { pid } => self.terminate_process(pid),
            Syscall::AccessMemory { pid, page, modify } => {
                let process = self
                    .processes
                    .get_mut(&pid)
                    .ok_or(SimError::MissingProcess { pid })?;
                match self.mmu.access(pid, process.page_table_mut(), page, modify) {
                    Ok(()) => Ok(()),
                    Err(exception) => {
                        self.handle_exception(exception)?;
                        // The faulting access still has to land its bits.
                        let process = self
                            .processes
                            .get_mut(&pid)
                            .ok_or(SimError::MissingProcess { pid })?;
                        self.mmu
                            .access(pid, process.page_table_mut(), page, modify)
                            .map_err(|_| SimError::FaultStorm { pid, page })
                    }
                }
            }
        }
    }

    fn handle_exception(&mut self, exception: Exception) -> Result<(), SimError> {
        match exception {
            Exception::PageFault { pid, page } => self.handle_page_fault(pid, page),
        }
    }

    /// Makes `(pid, page)` resident, evicting a victim when the frame pool
    /// is exhausted.
    fn handle_page_fault(&mut self, pid: Pid, page: PageIndex) -> Result<(), SimError> {
        self.stats.faults += 1;
        if let Some(fid) = self.mmu.alloc(pid, page) {
            debug!("fault pid={pid} page={page}: free frame {fid}");
            return self.bind_page(pid, page, fid);
        }
        self.stats.replaced += 1;
        let victim = self
            .replacer
            .select_victim(&self.mmu, &mut self.processes, &mut self.rng)?;
        debug!(
            "fault pid={pid} page={page}: evict pid={} page={} frame={}",
            victim.pid, victim.page, victim.fid
        );
        self.mmu.realloc(victim.fid, pid, page)?;
        let owner = self
            .processes
            .get_mut(&victim.pid)
            .ok_or(SimError::MissingProcess { pid: victim.pid })?;
        owner
            .page_table_mut()
            .entry_mut(victim.page)
            .ok_or(SimError::PageOutOfRange {
                pid: victim.pid,
                page: victim.page,
            })?
            .unbind();
        self.bind_page(pid, page, victim.fid)
    }

    fn bind_page(&mut self, pid: Pid, page: PageIndex, fid: FrameId) -> Result<(), SimError> {
        let process = self
            .processes
            .get_mut(&pid)
            .ok_or(SimError::MissingProcess { pid })?;
        process
            .page_table_mut()
            .entry_mut(page)
            .ok_or(SimError::PageOutOfRange { pid, page })?
            .bind(fid);
        Ok(())
    }

    /// Frees every resident frame of `pid` and removes it from the map.
    fn terminate_process(&mut self, pid: Pid) -> Result<(), SimError> {
        let process = self
            .processes
            .remove(&pid)
            .ok_or(SimError::MissingProcess { pid })?;
        let mut freed = 0usize;
        for (_, fid) in process.page_table().resident_frames() {
            if self.mmu.free(fid) {
                freed += 1;
            } else {
                warn!("exit pid={pid}: frame {fid} was already free");
            }
        }
        debug!("exit pid={pid} freed={freed} live={}", self.processes.len());
        Ok(())
    }

    /// Builds the per-tick record set for the renderer.
    pub fn report(&self) -> TickReport {
        TickReport {
            memory: self.mmu.memory_stats(),
            access: self.stats.view(),
            processes: self.processes.values().map(Process::stats).collect(),
        }
    }

    pub fn live_processes(&self) -> usize {
        self.processes.len()
    }

    pub fn process(&self, pid: Pid) -> Option<&Process> {
        self.processes.get(&pid)
    }

    pub fn process_mut(&mut self, pid: Pid) -> Option<&mut Process> {
        self.processes.get_mut(&pid)
    }

    /// Live processes in pid order.
    pub fn processes(&self) -> impl Iterator<Item = &Process> {
        self.processes.values()
    }

    pub fn mmu(&self) -> &Mmu {
        &self.mmu
    }

    pub fn mmu_mut(&mut self) -> &mut Mmu {
        &mut self.mmu
    }

    pub fn stats(&self) -> &AccessStats {
        &self.stats
    }
}
