//! Combat tuning.
//!
//! Every constant the damage pipeline uses lives here so that scenario files
//! can override it. Defaults are the live tuning values.

use serde::{Deserialize, Serialize};

use crate::compose::{DiminishingRatingCurve, RampParams};
use crate::curves::{CombatCurves, SigmoidSkillCheck};

/// Combat tuning parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    // === Curves ===
    /// Steepness of the default skill check.
    pub skill_check_factor: f32,
    /// Asymptotic bonus of the rating curve.
    pub rating_cap: f32,
    /// Rating at half of the curve's cap.
    pub rating_half: f32,
    /// Apply level-difference scalars to player/creature fights.
    pub level_scaling: bool,

    // === Evasion ===
    /// Attack/defense skill bonus from attack height.
    pub height_bonus: f32,
    /// Height bonus when the relevant skill is specialized.
    pub height_bonus_specialized: f32,
    /// Attack skill multiplier while Steady Shot is active.
    pub steady_shot_attack_bonus: f32,
    /// Evade chance added while Smokescreen is active.
    pub smokescreen_evade_bonus: f32,
    /// Extra evade chance right after Smokescreen triggers.
    pub smokescreen_recent_bonus: f32,
    /// Seconds after activation that count as "recently triggered".
    pub smokescreen_recent_secs: f64,
    /// Damage multiplier of a glancing blow.
    pub glancing_mod: f32,
    /// Glancing blow multiplier while the defender's Provoke is active.
    pub provoke_glancing_mod: f32,

    // === Block ===
    /// Base frontal arc a block can cover, in degrees.
    pub block_angle: f32,
    /// Extra arc for Shield specialization.
    pub shield_spec_block_angle: f32,
    /// Block chance from Physical Defense specialization at full skill.
    pub spec_defense_block_bonus: f32,
    /// Block chance from wielding a two-handed or dual weapon with Parry.
    pub parry_block_bonus: f32,
    /// Extra block chance while Parry is active.
    pub parry_active_block_bonus: f32,
    /// Block chance while Phalanx is active.
    pub phalanx_block_bonus: f32,

    // === Damage ===
    /// Raw max damage of a player's bare hands.
    pub unarmed_max_damage: f32,
    /// Damage variance of a player's bare hands.
    pub unarmed_variance: f32,
    /// Attribute value where the attribute modifier starts rising.
    pub attribute_base: f32,
    /// Melee damage per strength point above the base.
    pub strength_factor: f32,
    /// Missile damage per coordination point above the base.
    pub coordination_factor: f32,
    /// Added to the power level for the melee power modifier.
    pub melee_power_offset: f32,
    /// Lowest power level that counts as reckless.
    pub recklessness_power_min: f32,
    /// Highest power level that counts as reckless.
    pub recklessness_power_max: f32,
    /// Recklessness damage bonus (trained).
    pub recklessness_bonus: f32,
    /// Recklessness damage bonus (specialized).
    pub recklessness_bonus_specialized: f32,
    /// Sneak attack damage bonus (trained).
    pub sneak_attack_bonus: f32,
    /// Sneak attack damage bonus (specialized).
    pub sneak_attack_bonus_specialized: f32,
    /// Relative angle beyond which the attacker is behind the defender.
    pub behind_angle: f32,
    /// Dual wield specialization bonus.
    pub dual_wield_bonus: f32,
    /// Two-handed specialization bonus.
    pub two_handed_bonus: f32,
    /// Damage multiplier per projectile while Multishot is active.
    pub multishot_penalty: f32,
    /// Damage multiplier while Provoke is active.
    pub provoke_damage_bonus: f32,
    /// Damage multiplier while Steady Shot is active.
    pub steady_shot_damage_bonus: f32,
    /// Damage multiplier for secondary cleave targets.
    pub cleave_mod: f32,

    // === Critical ===
    /// Critical chance while sneak attacking.
    pub sneak_attack_crit_bonus: f32,
    /// Critical chance from Axe or Dagger specialization.
    pub spec_crit_chance_bonus: f32,
    /// Critical damage from Mace specialization.
    pub mace_spec_crit_damage: f32,
    /// Critical damage from Staff specialization.
    pub staff_spec_crit_damage: f32,
    /// Critical defense per augmentation against players.
    pub aug_crit_defense_vs_player: f32,
    /// Critical defense per augmentation against creatures.
    pub aug_crit_defense_vs_creature: f32,
    /// Perception critical defense scale.
    pub perception_crit_defense: f32,
    /// Perception critical defense cap.
    pub perception_crit_defense_cap: f32,

    // === Mitigation ===
    /// Armor level divisor of the armor modifier.
    pub armor_divisor: f32,
    /// Attack skill where armor rending starts.
    pub armor_rending_base_skill: f32,
    /// Attack skill span of armor rending.
    pub armor_rending_divisor: f32,
    /// Most armor rending can remove.
    pub armor_rending_cap: f32,
    /// Armor ignored by Spear-specialized martial wielders.
    pub spear_spec_armor_bonus: f32,
    /// Damage multiplier of Physical Defense specialization.
    pub spec_defense_base: f32,
    /// Extra reduction from Physical Defense specialization at full skill.
    pub spec_defense_range: f32,
    /// Ward level giving half damage.
    pub ward_base: f32,
    /// Red fury damage-taken ramp (progress is missing health fraction).
    pub red_fury_ramp: RampParams,
    /// Yellow fury damage-taken ramp (progress is missing stamina fraction).
    pub yellow_fury_ramp: RampParams,

    // === Reactive ===
    /// Riposte range.
    pub riposte_range: f32,
    /// Thorns range.
    pub thorns_range: f32,
    /// Fury stack cap.
    pub fury_max_stacks: u32,
    /// Stacks above which fury self-damage can occur.
    pub fury_self_damage_threshold: u32,
    /// Self-damage chance at the stack cap.
    pub fury_self_damage_max_chance: f32,
    /// Self-damage as a fraction of the dealt damage.
    pub fury_self_damage_fraction: f32,
    /// Self-damage cap as a fraction of max health.
    pub fury_self_damage_health_cap: f32,
    /// Damage bonus at the stack cap while Fury is active.
    pub fury_damage_bonus: f32,
    /// Stacks gained per landed hit.
    pub fury_stacks_per_hit: u32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            // Curves
            skill_check_factor: 0.03,
            rating_cap: 1.0,
            rating_half: 100.0,
            level_scaling: false,

            // Evasion
            height_bonus: 1.10,
            height_bonus_specialized: 1.15,
            steady_shot_attack_bonus: 1.20,
            smokescreen_evade_bonus: 0.10,
            smokescreen_recent_bonus: 0.30,
            smokescreen_recent_secs: 2.0,
            glancing_mod: 0.5,
            provoke_glancing_mod: 0.25,

            // Block
            block_angle: 180.0,
            shield_spec_block_angle: 45.0,
            spec_defense_block_bonus: 0.10,
            parry_block_bonus: 0.20,
            parry_active_block_bonus: 0.15,
            phalanx_block_bonus: 0.50,

            // Damage
            unarmed_max_damage: 4.0,
            unarmed_variance: 0.5,
            attribute_base: 55.0,
            strength_factor: 0.011,
            coordination_factor: 0.008,
            melee_power_offset: 0.5,
            recklessness_power_min: 0.2,
            recklessness_power_max: 0.8,
            recklessness_bonus: 1.10,
            recklessness_bonus_specialized: 1.20,
            sneak_attack_bonus: 1.10,
            sneak_attack_bonus_specialized: 1.20,
            behind_angle: 90.0,
            dual_wield_bonus: 1.10,
            two_handed_bonus: 1.10,
            multishot_penalty: 0.75,
            provoke_damage_bonus: 1.2,
            steady_shot_damage_bonus: 1.25,
            cleave_mod: 0.5,

            // Critical
            sneak_attack_crit_bonus: 0.20,
            spec_crit_chance_bonus: 0.05,
            mace_spec_crit_damage: 0.5,
            staff_spec_crit_damage: 0.5,
            aug_crit_defense_vs_player: 0.05,
            aug_crit_defense_vs_creature: 0.25,
            perception_crit_defense: 0.25,
            perception_crit_defense_cap: 0.5,

            // Mitigation
            armor_divisor: 200.0,
            armor_rending_base_skill: 160.0,
            armor_rending_divisor: 400.0,
            armor_rending_cap: 0.6,
            spear_spec_armor_bonus: 0.10,
            spec_defense_base: 0.90,
            spec_defense_range: 0.10,
            ward_base: 50.0,
            red_fury_ramp: RampParams::new(0.05, 0.01, 1.0),
            yellow_fury_ramp: RampParams::new(0.05, 0.01, 1.0),

            // Reactive
            riposte_range: 3.0,
            thorns_range: 10.0,
            fury_max_stacks: 500,
            fury_self_damage_threshold: 250,
            fury_self_damage_max_chance: 0.10,
            fury_self_damage_fraction: 0.5,
            fury_self_damage_health_cap: 0.10,
            fury_damage_bonus: 0.5,
            fury_stacks_per_hit: 10,
        }
    }
}

impl CombatConfig {
    /// Clamp configuration values to sensible ranges.
    pub fn validate(&mut self) {
        // Curves
        self.skill_check_factor = self.skill_check_factor.clamp(0.001, 1.0);
        self.rating_cap = self.rating_cap.clamp(0.0, 10.0);
        self.rating_half = self.rating_half.max(1.0);

        // Evasion
        self.height_bonus = self.height_bonus.clamp(1.0, 2.0);
        self.height_bonus_specialized = self.height_bonus_specialized.clamp(self.height_bonus, 2.0);
        self.smokescreen_evade_bonus = self.smokescreen_evade_bonus.clamp(0.0, 1.0);
        self.smokescreen_recent_bonus = self.smokescreen_recent_bonus.clamp(0.0, 1.0);
        self.smokescreen_recent_secs = self.smokescreen_recent_secs.max(0.0);
        self.glancing_mod = self.glancing_mod.clamp(0.0, 1.0);
        self.provoke_glancing_mod = self.provoke_glancing_mod.clamp(0.0, 1.0);

        // Block
        self.block_angle = self.block_angle.clamp(0.0, 360.0);
        self.shield_spec_block_angle = self.shield_spec_block_angle.clamp(0.0, 360.0);
        self.spec_defense_block_bonus = self.spec_defense_block_bonus.clamp(0.0, 1.0);
        self.parry_block_bonus = self.parry_block_bonus.clamp(0.0, 1.0);
        self.parry_active_block_bonus = self.parry_active_block_bonus.clamp(0.0, 1.0);
        self.phalanx_block_bonus = self.phalanx_block_bonus.clamp(0.0, 1.0);

        // Damage
        self.unarmed_max_damage = self.unarmed_max_damage.max(0.0);
        self.unarmed_variance = self.unarmed_variance.clamp(0.0, 1.0);
        self.recklessness_power_min = self.recklessness_power_min.clamp(0.0, 1.0);
        self.recklessness_power_max = self
            .recklessness_power_max
            .clamp(self.recklessness_power_min, 1.0);
        self.behind_angle = self.behind_angle.clamp(0.0, 180.0);
        self.multishot_penalty = self.multishot_penalty.clamp(0.0, 1.0);
        self.cleave_mod = self.cleave_mod.clamp(0.0, 1.0);

        // Critical
        self.perception_crit_defense_cap = self.perception_crit_defense_cap.clamp(0.0, 1.0);

        // Mitigation
        self.armor_divisor = self.armor_divisor.max(1.0);
        self.armor_rending_divisor = self.armor_rending_divisor.max(1.0);
        self.armor_rending_cap = self.armor_rending_cap.clamp(0.0, 1.0);
        self.spec_defense_base = self.spec_defense_base.clamp(0.0, 1.0);
        self.spec_defense_range = self.spec_defense_range.clamp(0.0, self.spec_defense_base);
        self.ward_base = self.ward_base.max(1.0);

        // Reactive
        self.riposte_range = self.riposte_range.max(0.0);
        self.thorns_range = self.thorns_range.max(0.0);
        self.fury_max_stacks = self.fury_max_stacks.max(1);
        self.fury_self_damage_threshold = self.fury_self_damage_threshold.min(self.fury_max_stacks);
        self.fury_self_damage_max_chance = self.fury_self_damage_max_chance.clamp(0.0, 1.0);
        self.fury_self_damage_fraction = self.fury_self_damage_fraction.clamp(0.0, 1.0);
        self.fury_self_damage_health_cap = self.fury_self_damage_health_cap.clamp(0.0, 1.0);
    }

    /// Rating curve with this configuration's shape.
    #[must_use]
    pub fn rating_curve(&self) -> DiminishingRatingCurve {
        DiminishingRatingCurve {
            cap: self.rating_cap,
            half: self.rating_half,
        }
    }

    /// Default curves tuned by this configuration.
    #[must_use]
    pub fn curves(&self) -> CombatCurves {
        CombatCurves::default()
            .with_skill_check(SigmoidSkillCheck {
                factor: self.skill_check_factor,
            })
            .with_rating_curve(self.rating_curve())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CombatConfig::default();
        assert_eq!(config.block_angle, 180.0);
        assert_eq!(config.fury_max_stacks, 500);
        assert_eq!(config.cleave_mod, 0.5);
        assert!(!config.level_scaling);
    }

    #[test]
    fn test_config_validation() {
        let mut config = CombatConfig::default();
        config.glancing_mod = 3.0;
        config.fury_max_stacks = 0;
        config.fury_self_damage_threshold = 250;
        config.armor_divisor = -5.0;

        config.validate();

        assert_eq!(config.glancing_mod, 1.0);
        assert_eq!(config.fury_max_stacks, 1);
        assert_eq!(config.fury_self_damage_threshold, 1);
        assert_eq!(config.armor_divisor, 1.0);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: CombatConfig =
            serde_json::from_str(r#"{ "riposte_range": 5.0 }"#).expect("Failed to parse");
        assert_eq!(config.riposte_range, 5.0);
        assert_eq!(config.thorns_range, 10.0);
    }

    #[test]
    fn test_curves_follow_config() {
        let mut config = CombatConfig::default();
        config.rating_half = 50.0;
        let curves = config.curves();
        assert!((curves.rating.offense(50.0) - 1.5).abs() < 1e-6);
    }
}
