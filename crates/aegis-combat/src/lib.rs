//! # Aegis Combat
//!
//! Damage resolution for one attack between two combatants.
//!
//! This crate provides:
//! - Attack context resolution (combat type, weapons, abilities, damage envelope)
//! - The outcome gate (invulnerable, evaded, blocked, hit)
//! - The damage roll with critical determination
//! - The mitigation pipeline (armor, shields, resistances, ratings, wards)
//! - Reactive effects (riposte, thorns, procs, Fury backlash)
//! - An extension registry for ability and sigil trinket hooks
//!
//! Every probabilistic decision draws from a [`RandomSource`] in a fixed
//! stage order, so a [`ScriptedRandom`] replays an attack exactly.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod ability;
pub mod body;
pub mod combatant;
pub mod compose;
pub mod config;
pub mod context;
pub mod curves;
pub mod damage_mod;
pub mod equipment;
pub mod error;
pub mod event;
pub mod extension;
pub mod mitigation;
pub mod pipeline;
pub mod random;
pub mod skills;

mod gate;
mod reactive;
mod roll;

#[cfg(test)]
mod scenarios;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::ability::*;
    pub use crate::body::*;
    pub use crate::combatant::*;
    pub use crate::compose::*;
    pub use crate::config::*;
    pub use crate::context::*;
    pub use crate::curves::*;
    pub use crate::damage_mod::*;
    pub use crate::equipment::*;
    pub use crate::error::*;
    pub use crate::event::*;
    pub use crate::extension::*;
    pub use crate::mitigation::*;
    pub use crate::pipeline::*;
    pub use crate::random::*;
    pub use crate::skills::*;
}

pub use prelude::*;
