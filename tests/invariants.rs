// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Property tests: frame accounting, resident-page bijection, stats
//! monotonicity and the clock sweep bound must hold for any seed and
//! either policy.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use proptest::prelude::*;
use proptest::test_runner::TestCaseError;

use vmsim::{ClockReplacer, Kernel, Mmu, Pid, Process, Replacer, SimConfig, SimRng};

/// Configuration small enough to force frequent replacement.
fn pressured_config() -> SimConfig {
    SimConfig {
        frame_count: 8..=16,
        page_table_len: 4..=8,
        process_ttl: 16..=64,
        rotation_period: 8..=16,
        steps_per_tick: 8..=16,
        initial_processes: 2..=4,
        spawn_batch: 1..=2,
        max_processes: 6,
        tick_interval: Duration::ZERO,
        ..SimConfig::default()
    }
}

/// Checks the frame partition (busy + free = all, disjoint) and the
/// resident-PTE <-> busy-frame bijection.
fn check_frame_invariants(kernel: &Kernel) -> Result<(), TestCaseError> {
    let mmu = kernel.mmu();
    let stats = mmu.memory_stats();
    prop_assert_eq!(stats.busy + stats.free, stats.total);

    let busy: BTreeSet<_> = mmu.busy_fids().iter().copied().collect();
    prop_assert_eq!(busy.len(), stats.busy, "busy list must not alias");
    for frame in mmu.frames() {
        prop_assert_eq!(frame.is_busy(), busy.contains(&frame.fid()));
    }

    let mut resident = 0usize;
    for process in kernel.processes() {
        for (page, fid) in process.page_table().resident_frames() {
            resident += 1;
            let frame = mmu.frame(fid);
            prop_assert!(frame.is_some(), "resident page maps a real frame");
            let binding = frame.and_then(|frame| frame.binding());
            prop_assert_eq!(binding, Some((process.pid(), page)));
        }
    }
    prop_assert_eq!(resident, stats.busy, "one resident page per busy frame");
    Ok(())
}

proptest! {
    /// Frame accounting and the bijection survive arbitrary seeded runs.
    #[test]
    fn frame_accounting_holds_across_ticks(
        seed in any::<u64>(),
        ticks in 1usize..10,
        use_random_policy in any::<bool>(),
    ) {
        let policy = if use_random_policy { "random" } else { "clock" };
        let mut kernel = Kernel::new(policy, pressured_config(), SimRng::with_seed(seed))
            .expect("kernel boots");
        check_frame_invariants(&kernel)?;
        for _ in 0..ticks {
            if kernel.live_processes() == 0 {
                break;
            }
            let report = kernel.tick().expect("tick succeeds");
            check_frame_invariants(&kernel)?;
            prop_assert_eq!(report.processes.len(), kernel.live_processes());
        }
    }

    /// Pids stay unique and inside the configured range.
    #[test]
    fn pids_stay_unique_and_in_range(seed in any::<u64>(), ticks in 1usize..6) {
        let cfg = pressured_config();
        let mut kernel = Kernel::new("clock", cfg.clone(), SimRng::with_seed(seed))
            .expect("kernel boots");
        for _ in 0..ticks {
            if kernel.live_processes() == 0 {
                break;
            }
            kernel.tick().expect("tick succeeds");
            let pids: Vec<_> = kernel.processes().map(Process::pid).collect();
            let unique: BTreeSet<_> = pids.iter().copied().collect();
            prop_assert_eq!(unique.len(), pids.len());
            prop_assert!(pids.iter().all(|pid| cfg.pid_range.contains(pid)));
            prop_assert!(pids.len() <= cfg.max_processes);
        }
    }

    /// Stats counters never decrease and keep their ordering:
    /// replaced <= faults <= total.
    #[test]
    fn stats_are_monotone(seed in any::<u64>(), ticks in 1usize..10) {
        let mut kernel = Kernel::new("clock", pressured_config(), SimRng::with_seed(seed))
            .expect("kernel boots");
        let mut previous = *kernel.stats();
        for _ in 0..ticks {
            if kernel.live_processes() == 0 {
                break;
            }
            kernel.tick().expect("tick succeeds");
            let current = *kernel.stats();
            prop_assert!(current.total() >= previous.total());
            prop_assert!(current.faults() >= previous.faults());
            prop_assert!(current.replaced() >= previous.replaced());
            prop_assert!(current.faults() <= current.total());
            prop_assert!(current.replaced() <= current.faults());
            previous = current;
        }
    }

    /// A clock sweep inspects at most two passes over the busy list,
    /// whatever the reference-bit pattern, and the chosen victim has a
    /// clear reference bit.
    #[test]
    fn clock_sweep_inspects_at_most_two_passes(
        seed in any::<u64>(),
        ref_bits in proptest::collection::vec(any::<bool>(), 1..24),
        selections in 1usize..6,
    ) {
        let pages = ref_bits.len();
        let cfg = SimConfig {
            page_table_len: pages..=pages,
            ..SimConfig::default()
        };
        let mut rng = SimRng::with_seed(seed);
        let pid: Pid = 1000;
        let mut processes: BTreeMap<Pid, Process> = BTreeMap::new();
        processes.insert(pid, Process::spawn(pid, &cfg, &mut rng));
        let mut mmu = Mmu::new(pages);
        for (page, referenced) in ref_bits.iter().enumerate() {
            let fid = mmu.alloc(pid, page).expect("free frame");
            let entry = processes
                .get_mut(&pid)
                .expect("live process")
                .page_table_mut()
                .entry_mut(page)
                .expect("page in range");
            entry.bind(fid);
            if *referenced {
                entry.mark_referenced();
            }
        }

        let mut clock = ClockReplacer::new();
        for _ in 0..selections {
            let busy_len = mmu.busy_fids().len();
            let victim = clock
                .select_victim(&mmu, &mut processes, &mut rng)
                .expect("busy set is non-empty");
            prop_assert!(clock.last_scan_inspections() <= 2 * busy_len);
            let entry = processes
                .get(&pid)
                .expect("live process")
                .page_table()
                .entry(victim.page)
                .expect("page in range");
            prop_assert!(!entry.referenced());
            // Re-reference the victim so later sweeps face fresh bits.
            processes
                .get_mut(&pid)
                .expect("live process")
                .page_table_mut()
                .entry_mut(victim.page)
                .expect("page in range")
                .mark_referenced();
        }
    }

    /// Draining the fleet leaves no busy frame behind.
    #[test]
    fn drained_fleet_leaks_no_frames(seed in any::<u64>()) {
        let cfg = SimConfig {
            process_ttl: 8..=16,
            spawn_prob: 0.0,
            ..pressured_config()
        };
        let mut kernel = Kernel::new("clock", cfg, SimRng::with_seed(seed))
            .expect("kernel boots");
        // ttl <= 16 and 8+ steps per tick: a handful of ticks drains all.
        for _ in 0..16 {
            if kernel.live_processes() == 0 {
                break;
            }
            kernel.tick().expect("tick succeeds");
        }
        prop_assert_eq!(kernel.live_processes(), 0);
        prop_assert_eq!(kernel.mmu().memory_stats().busy, 0);
        prop_assert!(kernel.mmu().frames().iter().all(|frame| !frame.is_busy()));
    }
}
