//! Degraded conditions inside the damage pipeline.
//!
//! None of these reach the caller of `resolve_attack`: the orchestrator turns
//! each one into its safe outcome.

use thiserror::Error;

use crate::body::CreatureType;

/// Internal pipeline faults.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CombatError {
    /// The attack's damage type could not be resolved.
    #[error("undefined damage type for attack by {attacker} on {defender}")]
    UndefinedDamageType {
        /// Attacker name.
        attacker: String,
        /// Defender name.
        defender: String,
    },

    /// No damage envelope exists for the attack.
    #[error("no damage envelope for attacker {0}")]
    MissingDamageEnvelope(String),

    /// No hit-location table for a creature type.
    #[error("no body part table for creature type {0:?}")]
    MissingBodyPartTable(CreatureType),

    /// The hit-location table has no usable entry for a quadrant.
    #[error("body part table has no entries for quadrant {0:#04x}")]
    EmptyBodyPartTable(u8),
}

/// Result type for pipeline stages.
pub type CombatResult<T> = Result<T, CombatError>;
