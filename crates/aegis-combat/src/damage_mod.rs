//! Damage envelope of one weapon or natural attack.

use serde::{Deserialize, Serialize};

use crate::combatant::AttackPart;
use crate::compose::clamp_sign;
use crate::equipment::Weapon;

/// Damage envelope: raw max damage, variance and the bonuses applied to it.
///
/// Built fresh per attack and never mutated afterwards; a counter-attack
/// derives its own.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaseDamageMod {
    /// Raw maximum damage.
    pub raw_max: f32,
    /// Damage variance.
    pub variance: f32,
    /// Enchantment multiplier on the variance.
    pub variance_mod: f32,
    /// Flat damage bonus.
    pub damage_bonus: f32,
    /// Damage multiplier.
    pub damage_mod: f32,
    /// Flat elemental damage bonus.
    pub elemental_bonus: f32,
}

impl BaseDamageMod {
    /// Creates an envelope with no bonuses.
    #[must_use]
    pub const fn new(raw_max: f32, variance: f32) -> Self {
        Self {
            raw_max,
            variance,
            variance_mod: 1.0,
            damage_bonus: 0.0,
            damage_mod: 1.0,
            elemental_bonus: 0.0,
        }
    }

    /// Envelope of a melee weapon.
    #[must_use]
    pub fn from_weapon(weapon: &Weapon) -> Self {
        Self {
            raw_max: weapon.max_damage,
            variance: weapon.variance,
            variance_mod: weapon.variance_mod,
            damage_bonus: weapon.damage_bonus,
            damage_mod: weapon.damage_mod,
            elemental_bonus: weapon.elemental_bonus,
        }
    }

    /// Envelope of a creature's natural attack.
    #[must_use]
    pub fn from_attack_part(part: &AttackPart) -> Self {
        Self::new(part.max_damage, part.variance)
    }

    /// Envelope of a missile attack: ammunition damage scaled by the
    /// launcher. Falls back to whichever of the two is present.
    #[must_use]
    pub fn for_missile(launcher: Option<&Weapon>, ammo: Option<&Weapon>) -> Option<Self> {
        match (launcher, ammo) {
            (Some(launcher), Some(ammo)) => Some(Self {
                raw_max: ammo.max_damage,
                variance: ammo.variance,
                variance_mod: ammo.variance_mod,
                damage_bonus: ammo.damage_bonus,
                damage_mod: launcher.damage_mod,
                elemental_bonus: launcher.elemental_bonus,
            }),
            (Some(weapon), None) | (None, Some(weapon)) => Some(Self::from_weapon(weapon)),
            (None, None) => None,
        }
    }

    /// Maximum damage, kept on the same side of zero as the raw maximum.
    #[must_use]
    pub fn max_damage(&self) -> f32 {
        let max = (self.raw_max + self.damage_bonus + self.elemental_bonus) * self.damage_mod;
        clamp_sign(max, self.raw_max)
    }

    /// Minimum damage.
    #[must_use]
    pub fn min_damage(&self) -> f32 {
        let spread = (self.variance * self.variance_mod).clamp(0.0, 1.0);
        self.max_damage() * (1.0 - spread)
    }

    /// Midpoint of min and max damage.
    #[must_use]
    pub fn median_damage(&self) -> f32 {
        (self.min_damage() + self.max_damage()) / 2.0
    }
}
