//! Combat skills and training levels.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// Skills the damage pipeline reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Skill {
    /// Axes and hatchets.
    Axe,
    /// Daggers and knives.
    Dagger,
    /// Maces and clubs.
    Mace,
    /// Spears and lances.
    Spear,
    /// Staves.
    Staff,
    /// Swords.
    Sword,
    /// Fists and claws.
    UnarmedCombat,
    /// Bows.
    Bow,
    /// Crossbows.
    Crossbow,
    /// Thrown weapons.
    ThrownWeapon,
    /// Defense against melee attacks.
    MeleeDefense,
    /// Defense against missile attacks.
    MissileDefense,
    /// Shield handling.
    Shield,
    /// Fighting with a weapon in each hand.
    DualWield,
    /// Two-handed weapon handling.
    TwoHandedCombat,
    /// Damage traded for exposure at mid power.
    Recklessness,
    /// Attacks from stealth or from behind.
    SneakAttack,
    /// Reading incoming critical strikes.
    Perception,
}

/// Training level of a skill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Training {
    /// Not trained; the skill grants no bonuses.
    #[default]
    Untrained,
    /// Trained.
    Trained,
    /// Specialized.
    Specialized,
}

impl Training {
    /// Trained or specialized.
    #[must_use]
    pub fn is_trained(self) -> bool {
        matches!(self, Self::Trained | Self::Specialized)
    }
}

/// Current value and training of one skill.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SkillEntry {
    /// Current effective value (buffs included).
    pub current: f32,
    /// Training level.
    pub training: Training,
}

/// Skill table of a combatant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Skills {
    entries: AHashMap<Skill, SkillEntry>,
}

impl Skills {
    /// Creates an empty skill table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a skill (builder pattern).
    #[must_use]
    pub fn with(mut self, skill: Skill, current: f32, training: Training) -> Self {
        self.set(skill, current, training);
        self
    }

    /// Sets a skill.
    pub fn set(&mut self, skill: Skill, current: f32, training: Training) {
        self.entries.insert(
            skill,
            SkillEntry {
                current: current.max(0.0),
                training,
            },
        );
    }

    /// Current value of a skill, 0 when absent.
    #[must_use]
    pub fn current(&self, skill: Skill) -> f32 {
        self.entries.get(&skill).map_or(0.0, |e| e.current)
    }

    /// Training of a skill, untrained when absent.
    #[must_use]
    pub fn training(&self, skill: Skill) -> Training {
        self.entries.get(&skill).map_or(Training::Untrained, |e| e.training)
    }

    /// Whether the skill is trained or specialized.
    #[must_use]
    pub fn is_trained(&self, skill: Skill) -> bool {
        self.training(skill).is_trained()
    }

    /// Whether the skill is specialized.
    #[must_use]
    pub fn is_specialized(&self, skill: Skill) -> bool {
        self.training(skill) == Training::Specialized
    }
}
