// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Terminal dashboard.
//!
//! The kernel publishes a [`TickReport`] through the [`TickSink`] seam;
//! the console implementation clears the screen and prints the memory,
//! access and process records. Tests inject their own sink to capture
//! reports.

use std::io::{self, Write};

use log::warn;

use crate::kernel::AccessStatsView;
use crate::mmu::MemoryStats;
use crate::process::ProcessStats;

/// Process rows shown per tick; the rest is summarized.
const MAX_PROCESS_ROWS: usize = 20;

/// Everything the kernel publishes for one tick.
#[derive(Clone, Debug)]
pub struct TickReport {
    pub memory: MemoryStats,
    pub access: AccessStatsView,
    pub processes: Vec<ProcessStats>,
}

/// Consumer of per-tick reports.
pub trait TickSink {
    fn publish(&mut self, report: &TickReport);
}

/// Dashboard that rewrites the terminal every tick.
pub struct ConsoleDashboard<W: Write> {
    out: W,
}

impl ConsoleDashboard<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> ConsoleDashboard<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn render(&mut self, report: &TickReport) -> io::Result<()> {
        // Clear screen, cursor home.
        write!(self.out, "\x1b[2J\x1b[H")?;
        let mem = &report.memory;
        writeln!(
            self.out,
            "memory  {}/{} frames busy  load {:.2}%  free {}",
            mem.busy, mem.total, mem.load_percent, mem.free
        )?;
        let access = &report.access;
        writeln!(
            self.out,
            "access  total {}  faults {} ({})  replaced {} ({})",
            access.total,
            access.faults,
            fmt_rate(access.fault_rate_percent),
            access.replaced,
            fmt_rate(access.replacement_rate_percent)
        )?;
        writeln!(self.out)?;
        writeln!(
            self.out,
            "{:>6} {:>8} {:>8} {:>6} {:>4} {:>8} {:>10} {:>6}",
            "pid", "ttl", "counter", "pages", "ws", "ws%", "rotate-at", "rolls"
        )?;
        for stats in report.processes.iter().take(MAX_PROCESS_ROWS) {
            writeln!(
                self.out,
                "{:>6} {:>8} {:>8} {:>6} {:>4} {:>7.2}% {:>10} {:>6}",
                stats.pid,
                stats.ttl,
                stats.counter,
                stats.pages,
                stats.working_set,
                stats.working_set_percent,
                stats.working_set_ttl,
                stats.rotations
            )?;
        }
        if report.processes.len() > MAX_PROCESS_ROWS {
            writeln!(
                self.out,
                "... and {} more",
                report.processes.len() - MAX_PROCESS_ROWS
            )?;
        }
        self.out.flush()
    }
}

fn fmt_rate(rate: Option<f64>) -> String {
    match rate {
        Some(value) => format!("{value:.2}%"),
        None => "-".to_string(),
    }
}

impl<W: Write> TickSink for ConsoleDashboard<W> {
    fn publish(&mut self, report: &TickReport) {
        if let Err(err) = self.render(report) {
            warn!("dashboard write failed: {err}");
        }
    }
}
