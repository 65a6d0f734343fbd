//! Externally tuned curves consumed by the pipeline.
//!
//! Only the contracts matter to the core; the default implementations here
//! are what the simulator and tests run with.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::compose::{DiminishingRatingCurve, RatingCurve};

/// Probability that an attack skill succeeds against a defense skill.
pub trait SkillCheck: Send + Sync {
    /// Success chance in `[0, 1]`, increasing in `attack` and decreasing in
    /// `defense`.
    fn chance(&self, attack: f32, defense: f32) -> f32;
}

/// Logistic skill check: `1 - 1 / (1 + e^(factor * (attack - defense)))`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SigmoidSkillCheck {
    /// Steepness of the curve.
    pub factor: f32,
}

impl Default for SigmoidSkillCheck {
    fn default() -> Self {
        Self { factor: 0.03 }
    }
}

impl SkillCheck for SigmoidSkillCheck {
    fn chance(&self, attack: f32, defense: f32) -> f32 {
        let delta = (self.factor * (attack - defense)).clamp(-80.0, 80.0);
        1.0 - 1.0 / (1.0 + delta.exp())
    }
}

/// Level-difference scalars applied when the level-scaling gate is open.
pub trait LevelScaling: Send + Sync {
    /// Multiplier on the attacker's effective attack skill.
    fn attack_scalar(&self, attacker_level: u32, defender_level: u32) -> f32;
    /// Multiplier on the defender's effective defense skill.
    fn defense_scalar(&self, attacker_level: u32, defender_level: u32) -> f32;
    /// Multiplier on outgoing damage.
    fn damage_scalar(&self, attacker_level: u32, defender_level: u32) -> f32;
}

/// Level scaling that never changes anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLevelScaling;

impl LevelScaling for NoLevelScaling {
    fn attack_scalar(&self, _attacker_level: u32, _defender_level: u32) -> f32 {
        1.0
    }

    fn defense_scalar(&self, _attacker_level: u32, _defender_level: u32) -> f32 {
        1.0
    }

    fn damage_scalar(&self, _attacker_level: u32, _defender_level: u32) -> f32 {
        1.0
    }
}

/// Linear scaling by level gap, clamped to `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BracketLevelScaling {
    /// Change per level of difference.
    pub per_level: f32,
    /// Lowest scalar.
    pub min: f32,
    /// Highest scalar.
    pub max: f32,
}

impl Default for BracketLevelScaling {
    fn default() -> Self {
        Self {
            per_level: 0.01,
            min: 0.5,
            max: 1.5,
        }
    }
}

impl BracketLevelScaling {
    fn scalar(&self, ahead: i64) -> f32 {
        (1.0 + self.per_level * ahead as f32).clamp(self.min, self.max)
    }
}

impl LevelScaling for BracketLevelScaling {
    fn attack_scalar(&self, attacker_level: u32, defender_level: u32) -> f32 {
        self.scalar(i64::from(attacker_level) - i64::from(defender_level))
    }

    fn defense_scalar(&self, attacker_level: u32, defender_level: u32) -> f32 {
        self.scalar(i64::from(defender_level) - i64::from(attacker_level))
    }

    fn damage_scalar(&self, attacker_level: u32, defender_level: u32) -> f32 {
        self.scalar(i64::from(attacker_level) - i64::from(defender_level))
    }
}

/// The external curves bundled for one pipeline.
#[derive(Clone)]
pub struct CombatCurves {
    /// Skill-vs-skill success probability.
    pub skill_check: Arc<dyn SkillCheck>,
    /// Gear rating diminishing-returns curve.
    pub rating: Arc<dyn RatingCurve>,
    /// Level-difference scalars.
    pub level_scaling: Arc<dyn LevelScaling>,
}

impl Default for CombatCurves {
    fn default() -> Self {
        Self {
            skill_check: Arc::new(SigmoidSkillCheck::default()),
            rating: Arc::new(DiminishingRatingCurve::default()),
            level_scaling: Arc::new(NoLevelScaling),
        }
    }
}

impl std::fmt::Debug for CombatCurves {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CombatCurves").finish_non_exhaustive()
    }
}

impl CombatCurves {
    /// Replaces the skill check curve.
    #[must_use]
    pub fn with_skill_check(mut self, curve: impl SkillCheck + 'static) -> Self {
        self.skill_check = Arc::new(curve);
        self
    }

    /// Replaces the rating curve.
    #[must_use]
    pub fn with_rating_curve(mut self, curve: impl RatingCurve + 'static) -> Self {
        self.rating = Arc::new(curve);
        self
    }

    /// Replaces the level scaling.
    #[must_use]
    pub fn with_level_scaling(mut self, scaling: impl LevelScaling + 'static) -> Self {
        self.level_scaling = Arc::new(scaling);
        self
    }
}
