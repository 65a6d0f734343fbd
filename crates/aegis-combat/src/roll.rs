//! Damage roll: base damage draw, offensive modifiers and the critical
//! decision.

use tracing::{debug, error, trace};

use crate::ability::CombatAbility;
use crate::body::AttackHeight;
use crate::combatant::{Combatant, Rating};
use crate::compose::{additive_combine, chain};
use crate::context::AttackContext;
use crate::equipment::{DamageType, Jewel, Weapon, WeaponKind};
use crate::error::{CombatError, CombatResult};
use crate::event::{CombatType, DamageEvent, Modifiers};
use crate::extension::{HookContext, HookEffect, HookKey, HookSite, Side};
use crate::pipeline::DamagePipeline;
use crate::random::{Draw, RandomSource};
use crate::skills::Skill;

/// Critical chance of an attack without a weapon.
const UNARMED_CRITICAL_CHANCE: f32 = 0.10;

impl DamagePipeline {
    pub(crate) fn roll_damage(
        &self,
        ctx: &AttackContext,
        attacker: &mut Combatant,
        defender: &mut Combatant,
        event: &mut DamageEvent,
        rng: &mut dyn RandomSource,
    ) -> CombatResult<()> {
        let damage_type = match ctx.damage_type {
            Some(damage_type) => damage_type,
            None if ctx.player_involved => {
                return Err(CombatError::UndefinedDamageType {
                    attacker: attacker.name.clone(),
                    defender: defender.name.clone(),
                });
            },
            None => DamageType::Bludgeon,
        };
        event.damage_type = Some(damage_type);

        let (min, max) = ctx
            .envelope
            .map_or((0.0, 0.0), |e| (e.min_damage(), e.max_damage()));
        event.base_damage = rng.roll_range(Draw::BaseDamage, min, max);

        self.offense_mods(ctx, attacker, defender, damage_type, event);
        if attacker.is_ability_active(CombatAbility::Fury, ctx.now) {
            attacker.reckless_stacks = 0;
        }
        self.critical(ctx, attacker, defender, event, rng);

        let total = if event.is_critical {
            let Some(envelope) = ctx.envelope else {
                error!("{}", CombatError::MissingDamageEnvelope(attacker.name.clone()));
                event.damage_before_mitigation = 0.0;
                return Ok(());
            };
            let base = if attacker.is_player {
                envelope.max_damage()
            } else {
                envelope.median_damage()
            };
            event.modifiers.damage_rating_mod = self.damage_rating_mod(attacker, ctx.pk_battle, true);
            event.modifiers.critical_damage_mod = self.critical_damage_mod(ctx, attacker, defender, event, rng);

            let m = &event.modifiers;
            base * chain([
                m.attribute_mod,
                m.power_mod,
                m.slayer_mod,
                m.damage_rating_mod,
                m.critical_damage_mod,
                m.dual_wield_bonus,
                m.two_handed_bonus,
                m.multishot_penalty,
                m.provoke_bonus,
                m.fury_bonus,
                m.steady_shot_bonus,
                m.sneak_attack_mod,
                m.attack_height_bonus,
                m.level_scaling_mod,
            ])
        } else {
            event.modifiers.damage_rating_mod = self.damage_rating_mod(attacker, ctx.pk_battle, false);
            event.base_damage * normal_damage_mod(&event.modifiers)
        };

        let bonus = {
            let hook = HookContext::new(HookSite::DamageBonus, Side::Attacker, attacker, defender, event, ctx.now);
            self.extensions
                .first_override(&hook, rng, |e| matches!(e, HookEffect::DamageBonus { .. }))
        };
        event.damage_before_mitigation = match bonus {
            Some((_, HookEffect::DamageBonus { flat, multiplier })) => {
                event.modifiers.extension_flat_bonus = flat;
                event.modifiers.extension_damage_mod = multiplier;
                ((total + flat) * multiplier).max(0.0)
            },
            _ => total,
        };

        trace!(
            "{} rolled {:.2} base, {:.2} before mitigation: {:?}",
            attacker.name,
            event.base_damage,
            event.damage_before_mitigation,
            event.modifiers
        );
        Ok(())
    }

    /// Fills the offensive modifiers shared by critical and normal hits.
    pub(crate) fn offense_mods(
        &self,
        ctx: &AttackContext,
        attacker: &Combatant,
        defender: &Combatant,
        damage_type: DamageType,
        event: &mut DamageEvent,
    ) {
        let cfg = &self.config;
        let now = ctx.now;
        let attack_skill = attacker.skills.current(ctx.attack_skill);

        let m = &mut event.modifiers;
        m.attribute_mod = self.attribute_mod(ctx.combat_type, attacker);
        m.power_mod = match ctx.combat_type {
            CombatType::Melee => ctx.options.power_level + cfg.melee_power_offset,
            CombatType::Missile => 1.0,
        };
        m.slayer_mod = slayer_mod(ctx.weapon.as_ref(), defender);

        let power = ctx.options.power_level;
        if attacker.skills.is_trained(Skill::Recklessness)
            && (cfg.recklessness_power_min..=cfg.recklessness_power_max).contains(&power)
        {
            let bonus = if attacker.skills.is_specialized(Skill::Recklessness) {
                cfg.recklessness_bonus_specialized
            } else {
                cfg.recklessness_bonus
            };
            let ratio = if attack_skill > 0.0 {
                (attacker.skills.current(Skill::Recklessness) / attack_skill).min(1.0)
            } else {
                1.0
            };
            m.recklessness_mod = 1.0 + (bonus - 1.0) * ratio;
            event.recklessness = true;
        }

        if attacker.skills.is_trained(Skill::SneakAttack)
            && (attacker.stealthed || ctx.relative_angle.abs() > cfg.behind_angle)
        {
            m.sneak_attack_mod = if attacker.skills.is_specialized(Skill::SneakAttack) {
                cfg.sneak_attack_bonus_specialized
            } else {
                cfg.sneak_attack_bonus
            };
            event.sneak_attack = true;
        }

        if ctx.options.height == AttackHeight::High {
            m.attack_height_bonus = self.height_bonus(attacker.skills.is_specialized(ctx.attack_skill));
        }
        if !damage_type.is_physical() {
            m.elemental_rating_bonus = self
                .curves
                .rating
                .offense(attacker.ratings.get(Rating::ElementalDamage));
        }
        m.dual_wield_bonus = self.dual_wield_bonus(attacker);
        m.two_handed_bonus = self.two_handed_bonus(attacker);

        if ctx.combat_type == CombatType::Missile && attacker.is_ability_active(CombatAbility::Multishot, now) {
            m.multishot_penalty = cfg.multishot_penalty;
        }
        if attacker.is_ability_active(CombatAbility::Provoke, now) {
            m.provoke_bonus = cfg.provoke_damage_bonus;
        }
        if attacker.is_ability_active(CombatAbility::SteadyShot, now) {
            m.steady_shot_bonus = cfg.steady_shot_damage_bonus;
        }
        if attacker.is_ability_active(CombatAbility::Fury, now) {
            let stacks = attacker.reckless_stacks.min(cfg.fury_max_stacks) as f32;
            m.fury_bonus = 1.0 + cfg.fury_damage_bonus * stacks / cfg.fury_max_stacks as f32;
        }

        m.ammo_effect_mod = ctx.ammo.as_ref().map_or(1.0, |ammo| ammo.effect_mod);
        if ctx.level_scaling {
            m.level_scaling_mod = self
                .curves
                .level_scaling
                .damage_scalar(attacker.level, defender.level);
        }
    }

    /// Rolls the critical, applies forced criticals, hook overrides and the
    /// defender's critical defense.
    fn critical(
        &self,
        ctx: &AttackContext,
        attacker: &mut Combatant,
        defender: &Combatant,
        event: &mut DamageEvent,
        rng: &mut dyn RandomSource,
    ) {
        let cfg = &self.config;

        let mut chance = ctx
            .weapon
            .as_ref()
            .map_or(UNARMED_CRITICAL_CHANCE, |w| w.critical_chance);
        if event.sneak_attack {
            chance += cfg.sneak_attack_crit_bonus;
        }
        if ctx.weapon_kind().spec_grants_crit_chance() && attacker.skills.is_specialized(ctx.attack_skill) {
            chance += cfg.spec_crit_chance_bonus;
        }
        event.modifiers.critical_chance = chance;
        event.is_critical = rng.roll(Draw::Critical) < chance;

        if attacker.stealthed && !defender.is_player {
            event.is_critical = true;
        }
        if attacker.reprisal_banked {
            attacker.reprisal_banked = false;
            event.is_critical = true;
            debug!("{} spent a banked reprisal", attacker.name);
        }

        let forced = {
            let hook = HookContext::new(HookSite::Critical, Side::Attacker, attacker, defender, event, ctx.now);
            self.extensions
                .first_override(&hook, rng, |e| *e == HookEffect::ForceCritical)
        };
        if let Some((key, _)) = forced {
            event.is_critical = true;
            event.critical_overridden_by_trinket = matches!(key, HookKey::Trinket(_));
        } else if event.is_critical {
            let denied = {
                let hook =
                    HookContext::new(HookSite::Critical, Side::Defender, attacker, defender, event, ctx.now);
                self.extensions
                    .first_override(&hook, rng, |e| *e == HookEffect::DenyCritical)
            };
            if let Some((key, _)) = denied {
                trace!("{key:?} denied a critical");
                event.is_critical = false;
            }
        }

        if !event.is_critical || event.critical_overridden_by_trinket {
            return;
        }

        let defense = self.critical_defense_chance(attacker, defender, event.modifiers.effective_attack_skill);
        event.modifiers.critical_defense_chance = defense;
        if defense > 0.0 && rng.roll(Draw::CriticalDefense) < defense {
            debug!("{} defended a critical from {}", defender.name, attacker.name);
            event.is_critical = false;
            event.critical_defended = true;
        }
    }

    /// Chance the defender turns a critical into a normal hit.
    pub(crate) fn critical_defense_chance(&self, attacker: &Combatant, defender: &Combatant, attack_skill: f32) -> f32 {
        let cfg = &self.config;
        if defender.aug_critical_defense > 0.0 {
            let per_rank = if attacker.is_player {
                cfg.aug_crit_defense_vs_player
            } else {
                cfg.aug_crit_defense_vs_creature
            };
            return defender.aug_critical_defense * per_rank;
        }
        if defender.skills.is_specialized(Skill::Perception) && attack_skill > 0.0 {
            let ratio = defender.skills.current(Skill::Perception) / attack_skill;
            return (cfg.perception_crit_defense * ratio).min(cfg.perception_crit_defense_cap);
        }
        0.0
    }

    fn critical_damage_mod(
        &self,
        ctx: &AttackContext,
        attacker: &Combatant,
        defender: &Combatant,
        event: &DamageEvent,
        rng: &mut dyn RandomSource,
    ) -> f32 {
        let cfg = &self.config;
        let mut base = 1.0 + ctx.weapon.as_ref().map_or(0.0, |w| w.critical_damage_mod);
        match ctx.weapon_kind() {
            WeaponKind::Mace if attacker.skills.is_specialized(Skill::Mace) => base += cfg.mace_spec_crit_damage,
            WeaponKind::Staff if attacker.skills.is_specialized(Skill::Staff) => base += cfg.staff_spec_crit_damage,
            _ => {},
        }
        let jewel = 1.0 + attacker.equipment.jewels.bonus(Jewel::Bludgeon);

        let hook = HookContext::new(HookSite::CriticalDamage, Side::Attacker, attacker, defender, event, ctx.now);
        let multiplier = match self.extensions.first_override(&hook, rng, |e| {
            matches!(e, HookEffect::CriticalDamageMultiplier(_))
        }) {
            Some((_, HookEffect::CriticalDamageMultiplier(multiplier))) => multiplier,
            _ => 1.0,
        };

        base * jewel * multiplier
    }

    pub(crate) fn attribute_mod(&self, combat_type: CombatType, attacker: &Combatant) -> f32 {
        let cfg = &self.config;
        let (attribute, factor) = match combat_type {
            CombatType::Melee => (attacker.attributes.strength, cfg.strength_factor),
            CombatType::Missile => (attacker.attributes.coordination, cfg.coordination_factor),
        };
        (1.0 + (attribute - cfg.attribute_base) * factor).max(1.0)
    }

    /// Damage rating curve over the summed damage ratings.
    pub(crate) fn damage_rating_mod(&self, attacker: &Combatant, pk_battle: bool, critical: bool) -> f32 {
        let ratings = &attacker.ratings;
        let crit = if critical { ratings.get(Rating::CritDamage) } else { 0.0 };
        let pk = if pk_battle { ratings.get(Rating::PkDamage) } else { 0.0 };
        self.curves
            .rating
            .offense(additive_combine([ratings.get(Rating::Damage), crit, pk]))
    }

    pub(crate) fn dual_wield_bonus(&self, attacker: &Combatant) -> f32 {
        if attacker.equipment.is_dual_wielding() && attacker.skills.is_specialized(Skill::DualWield) {
            self.config.dual_wield_bonus
        } else {
            1.0
        }
    }

    pub(crate) fn two_handed_bonus(&self, attacker: &Combatant) -> f32 {
        if attacker.equipment.is_two_handed() && attacker.skills.is_specialized(Skill::TwoHandedCombat) {
            self.config.two_handed_bonus
        } else {
            1.0
        }
    }
}

/// Product of the offensive modifiers of a non-critical hit.
pub(crate) fn normal_damage_mod(m: &Modifiers) -> f32 {
    chain([
        m.attribute_mod,
        m.power_mod,
        m.slayer_mod,
        m.damage_rating_mod,
        m.recklessness_mod,
        m.sneak_attack_mod,
        m.attack_height_bonus,
        m.elemental_rating_bonus,
        m.dual_wield_bonus,
        m.two_handed_bonus,
        m.multishot_penalty,
        m.provoke_bonus,
        m.fury_bonus,
        m.steady_shot_bonus,
        m.ammo_effect_mod,
        m.level_scaling_mod,
    ])
}

/// Slayer multiplier of a weapon against a target.
pub(crate) fn slayer_mod(weapon: Option<&Weapon>, target: &Combatant) -> f32 {
    weapon
        .and_then(|w| w.slayer)
        .filter(|slayer| slayer.creature == target.creature_type)
        .map_or(1.0, |slayer| slayer.damage_mod)
}
