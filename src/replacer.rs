// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Page-replacement policies.
//!
//! A replacer only chooses the victim. It may flip reference bits while
//! scanning (clock), but residency and frame bindings are mutated by the
//! fault handler alone, so the unbind/rebind sequence stays atomic at the
//! call site.

use std::collections::BTreeMap;

use crate::error::SimError;
use crate::mmu::{FrameId, Mmu};
use crate::page_table::PageTableEntry;
use crate::process::Process;
use crate::rng::SimRng;
use crate::{PageIndex, Pid};

/// Registered policy names, in registry order.
pub const POLICY_NAMES: &[&str] = &["clock", "random"];

/// Resident page selected for eviction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Victim {
    pub pid: Pid,
    pub page: PageIndex,
    pub fid: FrameId,
}

/// Victim-selection capability.
pub trait Replacer {
    /// Policy name as registered.
    fn name(&self) -> &'static str;

    /// Picks a resident page whose frame the caller will repurpose.
    ///
    /// Fails with [`SimError::NoResidentPages`] when nothing is resident
    /// and with a hard error when a busy frame's binding does not resolve
    /// to a live, resident page-table entry.
    fn select_victim(
        &mut self,
        mmu: &Mmu,
        processes: &mut BTreeMap<Pid, Process>,
        rng: &mut SimRng,
    ) -> Result<Victim, SimError>;
}

/// Builds the replacer registered under `policy`.
pub fn replacer_for(policy: &str) -> Result<Box<dyn Replacer>, SimError> {
    match policy {
        "clock" => Ok(Box::new(ClockReplacer::new())),
        "random" => Ok(Box::new(RandomReplacer)),
        other => Err(SimError::UnknownPolicy(other.to_string())),
    }
}

/// Resolves a busy frame to its owning page-table entry, verifying the
/// frame/PTE bijection on the way.
fn resolve_entry<'a>(
    mmu: &Mmu,
    processes: &'a mut BTreeMap<Pid, Process>,
    fid: FrameId,
) -> Result<(Pid, PageIndex, &'a mut PageTableEntry), SimError> {
    let frame = mmu.frame(fid).ok_or(SimError::FrameNotBusy(fid))?;
    let (pid, page) = frame.binding().ok_or(SimError::BrokenFrameBinding { fid })?;
    let process = processes
        .get_mut(&pid)
        .ok_or(SimError::MissingProcess { pid })?;
    let entry = process
        .page_table_mut()
        .entry_mut(page)
        .ok_or(SimError::PageOutOfRange { pid, page })?;
    if entry.frame() != Some(fid) {
        return Err(SimError::BrokenFrameBinding { fid });
    }
    Ok((pid, page, entry))
}

/// Second-chance policy: sweeps the busy list circularly, clearing
/// reference bits until it finds one already clear.
pub struct ClockReplacer {
    hand: usize,
    last_scan_inspections: usize,
}

impl ClockReplacer {
    pub fn new() -> Self {
        Self {
            hand: 0,
            last_scan_inspections: 0,
        }
    }

    /// Frames inspected by the most recent sweep. Never exceeds twice the
    /// busy-list length: the first pass clears every reference bit it meets.
    pub fn last_scan_inspections(&self) -> usize {
        self.last_scan_inspections
    }
}

impl Default for ClockReplacer {
    fn default() -> Self {
        Self::new()
    }
}

impl Replacer for ClockReplacer {
    fn name(&self) -> &'static str {
        "clock"
    }

    fn select_victim(
        &mut self,
        mmu: &Mmu,
        processes: &mut BTreeMap<Pid, Process>,
        _rng: &mut SimRng,
    ) -> Result<Victim, SimError> {
        let busy = mmu.busy_fids();
        if busy.is_empty() {
            return Err(SimError::NoResidentPages);
        }
        // The busy list shrinks when processes exit; keep the hand on it.
        if self.hand >= busy.len() {
            self.hand = busy.len() - 1;
        }
        self.last_scan_inspections = 0;
        loop {
            let fid = busy[self.hand];
            self.hand = (self.hand + 1) % busy.len();
            self.last_scan_inspections += 1;
            let (pid, page, entry) = resolve_entry(mmu, processes, fid)?;
            if !entry.referenced() {
                return Ok(Victim { pid, page, fid });
            }
            entry.clear_referenced();
        }
    }
}

/// Uniformly random victim among the busy frames.
pub struct RandomReplacer;

impl Replacer for RandomReplacer {
    fn name(&self) -> &'static str {
        "random"
    }

    fn select_victim(
        &mut self,
        mmu: &Mmu,
        processes: &mut BTreeMap<Pid, Process>,
        rng: &mut SimRng,
    ) -> Result<Victim, SimError> {
        let fid = *rng
            .choose(mmu.busy_fids())
            .ok_or(SimError::NoResidentPages)?;
        let (pid, page, _entry) = resolve_entry(mmu, processes, fid)?;
        Ok(Victim { pid, page, fid })
    }
}
