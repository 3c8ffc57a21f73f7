// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Injected randomness capability.
//!
//! All stochastic choices in the simulator go through [`SimRng`] so a
//! seeded run replays exactly. Construct with [`SimRng::with_seed`] for
//! reproducibility or [`SimRng::new`] for an entropy-seeded run.

use std::ops::RangeInclusive;

use rand::distributions::uniform::{SampleRange, SampleUniform};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Seedable RNG wrapper handed to every stochastic component.
pub struct SimRng {
    rng: StdRng,
}

impl SimRng {
    /// Creates an entropy-seeded generator.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Creates a deterministic generator for reproducible runs.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Draws a uniform value from `range`. The range must be non-empty.
    pub fn pick<T, R>(&mut self, range: R) -> T
    where
        T: SampleUniform,
        R: SampleRange<T>,
    {
        self.rng.gen_range(range)
    }

    /// Bernoulli trial: true with probability `p`. `p` must lie in `[0, 1]`.
    pub fn chance(&mut self, p: f64) -> bool {
        self.rng.gen_bool(p)
    }

    /// Uniformly picks an element, or `None` if `items` is empty.
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        items.choose(&mut self.rng)
    }

    /// Rejection-samples `range` until `taken` rejects the candidate.
    ///
    /// Used for fresh pids; callers must keep the taken set far smaller
    /// than the range or the redraw loop will spin.
    pub fn pick_unique<T, F>(&mut self, range: RangeInclusive<T>, mut taken: F) -> T
    where
        T: SampleUniform + PartialOrd + Copy,
        F: FnMut(T) -> bool,
    {
        loop {
            let candidate = self.rng.gen_range(range.clone());
            if !taken(candidate) {
                return candidate;
            }
        }
    }
}

impl Default for SimRng {
    fn default() -> Self {
        Self::new()
    }
}
