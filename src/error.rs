// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Fatal simulation errors.
//!
//! Page faults are not errors: they travel as [`crate::syscall::Exception`]
//! values and are serviced by the kernel. Everything in [`SimError`] is an
//! invariant violation or a construction failure that aborts the run.

use thiserror::Error;

use crate::config::ConfigError;
use crate::mmu::FrameId;
use crate::{PageIndex, Pid};

/// Errors that terminate the simulation.
#[derive(Debug, Error)]
pub enum SimError {
    /// Requested replacement policy is not registered.
    #[error("unknown replacement policy {0:?} (expected one of: clock, random)")]
    UnknownPolicy(String),
    /// A victim was requested while no page is resident.
    #[error("no resident pages to evict")]
    NoResidentPages,
    /// An operation named a pid that is not in the process map.
    #[error("process {pid} is not alive")]
    MissingProcess { pid: Pid },
    /// A frame operation targeted a frame outside the busy set.
    #[error("frame {0} is not busy")]
    FrameNotBusy(FrameId),
    /// A busy frame and the page table disagree about who owns it.
    #[error("frame {fid} binding does not match a resident page-table entry")]
    BrokenFrameBinding { fid: FrameId },
    /// A page index fell outside the owning process's page table.
    #[error("page {page} out of range for process {pid}")]
    PageOutOfRange { pid: Pid, page: PageIndex },
    /// An access faulted again right after its fault was serviced.
    #[error("page fault persisted after handling (pid {pid}, page {page})")]
    FaultStorm { pid: Pid, page: PageIndex },
    /// Simulation parameters failed validation.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}
