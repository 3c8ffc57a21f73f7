// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Messages exchanged between processes and the kernel.
//!
//! These are plain tagged carriers; all dispatch lives in the kernel.

use crate::{PageIndex, Pid};

/// Request a process issues to the kernel during one step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Syscall {
    /// Touch `page`, optionally as a write.
    AccessMemory {
        pid: Pid,
        page: PageIndex,
        modify: bool,
    },
    /// The process reached the end of its lifetime.
    Exit { pid: Pid },
}

/// Exceptional condition raised while servicing a syscall.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Exception {
    /// `page` of process `pid` is not resident.
    PageFault { pid: Pid, page: PageIndex },
}
