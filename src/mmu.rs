// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Physical frame pool.
//!
//! The MMU is a pure data structure over frame state: it hands out frames,
//! takes them back, and detects non-resident accesses. Every residency
//! transition is decided elsewhere (the kernel's fault handler); the access
//! path only signals the fault.

use std::fmt;

use crate::error::SimError;
use crate::page_table::PageTable;
use crate::syscall::Exception;
use crate::{PageIndex, Pid};

/// Identifier of a physical frame, dense from zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct FrameId(pub usize);

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One physical frame and its current owner, if any.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Frame {
    fid: FrameId,
    binding: Option<(Pid, PageIndex)>,
}

impl Frame {
    fn new(fid: FrameId) -> Self {
        Self { fid, binding: None }
    }

    pub fn fid(&self) -> FrameId {
        self.fid
    }

    /// `(pid, page)` of the occupant, or `None` for a free frame.
    pub fn binding(&self) -> Option<(Pid, PageIndex)> {
        self.binding
    }

    pub fn is_busy(&self) -> bool {
        self.binding.is_some()
    }
}

/// Memory-utilization snapshot published every tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MemoryStats {
    pub total: usize,
    pub busy: usize,
    pub free: usize,
    pub load_percent: f64,
}

/// Frame allocator and access checker.
pub struct Mmu {
    frames: Vec<Frame>,
    // Insertion-ordered so the clock hand sees a stable sweep order.
    busy: Vec<FrameId>,
    free: Vec<FrameId>,
}

impl Mmu {
    /// Builds a pool of `total_frames` free frames.
    pub fn new(total_frames: usize) -> Self {
        let frames = (0..total_frames)
            .map(|fid| Frame::new(FrameId(fid)))
            .collect();
        // Reversed so allocation pops fid 0 first.
        let free = (0..total_frames).rev().map(FrameId).collect();
        Self {
            frames,
            busy: Vec::with_capacity(total_frames),
            free,
        }
    }

    /// Takes a free frame for `(pid, page)`, or `None` when exhausted.
    pub fn alloc(&mut self, pid: Pid, page: PageIndex) -> Option<FrameId> {
        let fid = self.free.pop()?;
        self.frames[fid.0].binding = Some((pid, page));
        self.busy.push(fid);
        Some(fid)
    }

    /// Releases `fid` back to the free list.
    ///
    /// Returns false without touching anything when the frame is not busy,
    /// so double-frees are harmless.
    pub fn free(&mut self, fid: FrameId) -> bool {
        let Some(pos) = self.busy.iter().position(|&busy| busy == fid) else {
            return false;
        };
        // Vec::remove keeps the sweep order of the remaining busy frames.
        self.busy.remove(pos);
        self.frames[fid.0].binding = None;
        self.free.push(fid);
        true
    }

    /// Rebinds a busy frame to `(pid, page)` without a free/alloc cycle.
    ///
    /// Used when a victim frame is repurposed during replacement; the busy
    /// set is unchanged.
    pub fn realloc(&mut self, fid: FrameId, pid: Pid, page: PageIndex) -> Result<(), SimError> {
        let frame = self
            .frames
            .get_mut(fid.0)
            .ok_or(SimError::FrameNotBusy(fid))?;
        if frame.binding.is_none() {
            return Err(SimError::FrameNotBusy(fid));
        }
        frame.binding = Some((pid, page));
        Ok(())
    }

    /// Performs one access against `table`.
    ///
    /// A resident page gets its reference bit (and modify bit, for writes)
    /// set; a non-resident page raises a page fault for the kernel to
    /// service.
    pub fn access(
        &self,
        pid: Pid,
        table: &mut PageTable,
        page: PageIndex,
        modify: bool,
    ) -> Result<(), Exception> {
        match table.entry_mut(page) {
            Some(entry) if entry.is_resident() => {
                entry.mark_referenced();
                if modify {
                    entry.mark_modified();
                }
                Ok(())
            }
            _ => Err(Exception::PageFault { pid, page }),
        }
    }

    pub fn frame(&self, fid: FrameId) -> Option<&Frame> {
        self.frames.get(fid.0)
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Busy frames in the order they entered the busy set.
    pub fn busy_fids(&self) -> &[FrameId] {
        &self.busy
    }

    pub fn memory_stats(&self) -> MemoryStats {
        let total = self.frames.len();
        let busy = self.busy.len();
        let load_percent = if total == 0 {
            0.0
        } else {
            100.0 * busy as f64 / total as f64
        };
        MemoryStats {
            total,
            busy,
            free: self.free.len(),
            load_percent,
        }
    }
}
