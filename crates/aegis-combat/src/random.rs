//! Uniform random sources for combat rolls.
//!
//! Every probabilistic decision in the pipeline asks a [`RandomSource`] for a
//! value in `[0, 1)` and labels the request with the [`Draw`] that needs it.
//! Production code uses a shared `fastrand` generator; tests inject a
//! [`ScriptedRandom`] and assert on the recorded draw order.

use std::collections::VecDeque;
use std::sync::Arc;

use ahash::AHashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Pipeline stage that requested a random value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Draw {
    /// Creature overpower check.
    Overpower,
    /// Primary evasion roll.
    Evasion,
    /// Full / glancing / clean sub-roll after a successful evasion roll.
    PartialEvasion,
    /// Block roll.
    Block,
    /// Base damage between the envelope's min and max.
    BaseDamage,
    /// Critical strike roll.
    Critical,
    /// Critical defense roll.
    CriticalDefense,
    /// Weighted body part selection.
    BodyPart,
    /// Thorns damage recompute.
    Thorns,
    /// Fury self-damage chance.
    FurySelfDamage,
    /// Draw requested by an extension hook.
    Hook,
}

/// A source of uniform values in `[0, 1)`.
pub trait RandomSource {
    /// Returns the next value in `[0, 1)` for the given draw.
    fn roll(&mut self, draw: Draw) -> f32;

    /// Returns a value in `[min, max]`.
    ///
    /// Always consumes exactly one draw, even for an empty range.
    fn roll_range(&mut self, draw: Draw, min: f32, max: f32) -> f32 {
        let t = self.roll(draw);
        if max <= min {
            return min;
        }
        min + (max - min) * t
    }
}

impl RandomSource for fastrand::Rng {
    fn roll(&mut self, _draw: Draw) -> f32 {
        self.f32()
    }
}

/// Cloneable handle to one generator shared between simulation contexts.
#[derive(Debug, Clone)]
pub struct SharedRandom {
    inner: Arc<Mutex<fastrand::Rng>>,
}

impl SharedRandom {
    /// Creates a shared generator with a random seed.
    #[must_use]
    pub fn new() -> Self {
        Self::from_rng(fastrand::Rng::new())
    }

    /// Creates a shared generator with a fixed seed.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self::from_rng(fastrand::Rng::with_seed(seed))
    }

    fn from_rng(rng: fastrand::Rng) -> Self {
        Self {
            inner: Arc::new(Mutex::new(rng)),
        }
    }
}

impl Default for SharedRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for SharedRandom {
    fn roll(&mut self, _draw: Draw) -> f32 {
        self.inner.lock().f32()
    }
}

/// Deterministic random source for tests and replays.
///
/// Values are queued per [`Draw`]; a draw with nothing queued returns the
/// fallback. Every draw is recorded in order.
#[derive(Debug, Clone)]
pub struct ScriptedRandom {
    queued: AHashMap<Draw, VecDeque<f32>>,
    fallback: f32,
    log: Vec<Draw>,
}

impl ScriptedRandom {
    /// Creates a source that answers every draw with `fallback`.
    #[must_use]
    pub fn new(fallback: f32) -> Self {
        Self {
            queued: AHashMap::new(),
            fallback: fallback.clamp(0.0, 0.999_999),
            log: Vec::new(),
        }
    }

    /// Queues a value for the next draw of the given kind.
    #[must_use]
    pub fn with(mut self, draw: Draw, value: f32) -> Self {
        self.push(draw, value);
        self
    }

    /// Queues a value for the next draw of the given kind.
    pub fn push(&mut self, draw: Draw, value: f32) {
        self.queued.entry(draw).or_default().push_back(value);
    }

    /// Draws made so far, in order.
    #[must_use]
    pub fn log(&self) -> &[Draw] {
        &self.log
    }

    /// Number of draws of one kind made so far.
    #[must_use]
    pub fn count(&self, draw: Draw) -> usize {
        self.log.iter().filter(|d| **d == draw).count()
    }
}

impl RandomSource for ScriptedRandom {
    fn roll(&mut self, draw: Draw) -> f32 {
        self.log.push(draw);
        self.queued
            .get_mut(&draw)
            .and_then(VecDeque::pop_front)
            .unwrap_or(self.fallback)
    }
}
