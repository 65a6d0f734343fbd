//! Outcome gate: invulnerability, evasion and block, decided before any
//! damage number exists.

use tracing::{debug, trace};

use crate::ability::CombatAbility;
use crate::body::AttackHeight;
use crate::combatant::{CombatMode, Combatant};
use crate::context::AttackContext;
use crate::equipment::Jewel;
use crate::event::{DamageEvent, Outcome, PartialEvasion};
use crate::extension::{HookContext, HookEffect, HookSite, Side};
use crate::pipeline::DamagePipeline;
use crate::random::{Draw, RandomSource};
use crate::reactive::apply_procs;
use crate::skills::Skill;

const FULL_EVADE_BELOW: f32 = 1.0 / 3.0;
const GLANCING_BELOW: f32 = 2.0 / 3.0;

/// Whether the attack ended in the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Gate {
    /// Invulnerable, evaded or blocked.
    Terminal,
    /// Go on to the damage roll.
    Continue,
}

impl DamagePipeline {
    pub(crate) fn run_gate(
        &self,
        ctx: &AttackContext,
        attacker: &mut Combatant,
        defender: &mut Combatant,
        event: &mut DamageEvent,
        rng: &mut dyn RandomSource,
    ) -> Gate {
        if defender.lifestone_protection || defender.invincible {
            event.lifestone_protected = defender.lifestone_protection;
            event.terminate(Outcome::Invulnerable);
            debug!("{} cannot be damaged", defender.name);
            return Gate::Terminal;
        }

        let (attack, defense) = self.effective_skills(ctx, attacker, defender);
        event.modifiers.effective_attack_skill = attack;
        event.modifiers.effective_defense_skill = defense;

        if defender.combat_mode == CombatMode::NonCombat {
            return Gate::Continue;
        }

        if self.evasion(ctx, attacker, defender, event, rng) == Gate::Terminal {
            return Gate::Terminal;
        }
        self.block(ctx, attacker, defender, event, rng)
    }

    /// Effective attack and defense skills after height, ability, level and
    /// jewel bonuses.
    pub(crate) fn effective_skills(
        &self,
        ctx: &AttackContext,
        attacker: &Combatant,
        defender: &Combatant,
    ) -> (f32, f32) {
        let cfg = &self.config;
        let (attack_scalar, defense_scalar) = if ctx.level_scaling {
            let scaling = &self.curves.level_scaling;
            (
                scaling.attack_scalar(attacker.level, defender.level),
                scaling.defense_scalar(attacker.level, defender.level),
            )
        } else {
            (1.0, 1.0)
        };

        let height_attack = if ctx.options.height == AttackHeight::Medium {
            self.height_bonus(attacker.skills.is_specialized(ctx.attack_skill))
        } else {
            1.0
        };
        let steady_shot = if attacker.is_ability_active(CombatAbility::SteadyShot, ctx.now) {
            cfg.steady_shot_attack_bonus
        } else {
            1.0
        };
        let attack = attacker.skills.current(ctx.attack_skill)
            * attack_scalar
            * height_attack
            * steady_shot
            * (1.0 + attacker.equipment.jewels.bonus(Jewel::Bravado));

        let height_defense = if ctx.options.height == AttackHeight::Low {
            self.height_bonus(defender.skills.is_specialized(ctx.defense_skill))
        } else {
            1.0
        };
        let defense = defender.skills.current(ctx.defense_skill)
            * defense_scalar
            * height_defense
            * (1.0 + defender.equipment.jewels.bonus(Jewel::Familiarity));

        (attack, defense)
    }

    pub(crate) fn height_bonus(&self, specialized: bool) -> f32 {
        if specialized {
            self.config.height_bonus_specialized
        } else {
            self.config.height_bonus
        }
    }

    /// Chance the defender evades, Smokescreen included.
    ///
    /// The evasion and block draws are always taken; a chance of zero never
    /// succeeds, even on a roll of exactly zero.
    pub(crate) fn evade_chance(&self, attack: f32, defense: f32, defender: &Combatant, now: f64) -> f32 {
        let cfg = &self.config;
        let mut chance = (1.0 - self.curves.skill_check.chance(attack, defense)).clamp(0.0, 1.0);

        if defender.is_ability_active(CombatAbility::Smokescreen, now) {
            chance += cfg.smokescreen_evade_bonus;
            let recent = defender
                .abilities
                .get(CombatAbility::Smokescreen)
                .is_some_and(|w| w.activated_within(now, cfg.smokescreen_recent_secs));
            if recent {
                chance += cfg.smokescreen_recent_bonus;
            }
        }
        chance.clamp(0.0, 1.0)
    }

    fn guaranteed_hit(&self, ctx: &AttackContext, attacker: &Combatant, event: &DamageEvent) -> bool {
        let now = ctx.now;
        event.overpower
            || (attacker.is_ability_active(CombatAbility::SteadyShot, now)
                && attacker.equipment.launcher.is_some())
            || attacker.is_ability_active(CombatAbility::Fury, now)
            || attacker.is_ability_active(CombatAbility::Backstab, now)
            || ctx.self_target
    }

    fn evasion(
        &self,
        ctx: &AttackContext,
        attacker: &mut Combatant,
        defender: &mut Combatant,
        event: &mut DamageEvent,
        rng: &mut dyn RandomSource,
    ) -> Gate {
        let now = ctx.now;

        if !attacker.is_player && attacker.overpower_chance > 0.0 {
            event.overpower = rng.roll(Draw::Overpower) < attacker.overpower_chance;
        }

        if self.guaranteed_hit(ctx, attacker, event) {
            trace!("{} cannot miss", attacker.name);
            return Gate::Continue;
        }

        let forced_hit = {
            let hook = HookContext::new(HookSite::Evasion, Side::Attacker, attacker, defender, event, now);
            self.extensions
                .first_override(&hook, rng, |e| *e == HookEffect::ForceHit)
        };
        if let Some((key, _)) = forced_hit {
            trace!("{key:?} forced a hit");
            return Gate::Continue;
        }

        let forced_evade = {
            let hook = HookContext::new(HookSite::Evasion, Side::Defender, attacker, defender, event, now);
            self.extensions
                .first_override(&hook, rng, |e| *e == HookEffect::ForceEvade)
        };
        if let Some((key, _)) = forced_evade {
            debug!("{} evaded via {key:?}", defender.name);
            event.terminate(Outcome::Evaded);
            return Gate::Terminal;
        }

        let chance = self.evade_chance(
            event.modifiers.effective_attack_skill,
            event.modifiers.effective_defense_skill,
            defender,
            now,
        );
        event.modifiers.evade_chance = chance;

        let roll = rng.roll(Draw::Evasion);
        if chance <= 0.0 || roll > chance {
            return Gate::Continue;
        }

        let sub_roll = rng.roll(Draw::PartialEvasion);
        if sub_roll < FULL_EVADE_BELOW {
            debug!("{} evaded {}", defender.name, attacker.name);
            event.terminate(Outcome::Evaded);
            return Gate::Terminal;
        }
        if sub_roll >= GLANCING_BELOW {
            return Gate::Continue;
        }

        // Glancing blow
        let provoke = defender.is_ability_active(CombatAbility::Provoke, now);
        event.partial_evasion = PartialEvasion::Some;
        event.modifiers.evasion_mod = if provoke {
            self.config.provoke_glancing_mod
        } else {
            self.config.glancing_mod
        };

        let upgraded = {
            let hook = HookContext::new(HookSite::GlancingBlow, Side::Defender, attacker, defender, event, now);
            self.extensions
                .first_override(&hook, rng, |e| *e == HookEffect::UpgradeToEvade)
        };
        if let Some((key, _)) = upgraded {
            debug!("{} turned a glancing blow into an evade via {key:?}", defender.name);
            event.terminate(Outcome::Evaded);
            return Gate::Terminal;
        }

        if provoke {
            let procs = {
                let hook =
                    HookContext::new(HookSite::DefensiveProc, Side::Defender, attacker, defender, event, now);
                self.extensions.procs(&hook, rng)
            };
            apply_procs(Side::Defender, &procs, attacker, defender, event);
        }
        Gate::Continue
    }

    fn block(
        &self,
        ctx: &AttackContext,
        attacker: &mut Combatant,
        defender: &mut Combatant,
        event: &mut DamageEvent,
        rng: &mut dyn RandomSource,
    ) -> Gate {
        let cfg = &self.config;
        let now = ctx.now;

        let mut arc = cfg.block_angle;
        if defender.skills.is_specialized(Skill::Shield) {
            arc += cfg.shield_spec_block_angle;
        }
        let phalanx = defender.is_ability_active(CombatAbility::Phalanx, now);
        if ctx.relative_angle.abs() >= arc / 2.0 && !phalanx {
            return Gate::Continue;
        }

        let mut chance = 0.0;
        if defender.skills.is_specialized(ctx.defense_skill) {
            if let Some(shield) = defender.equipment.shield() {
                chance += cfg.spec_defense_block_bonus
                    * self
                        .curves
                        .skill_check
                        .chance(shield.armor_level, event.modifiers.effective_attack_skill);
            }
        }
        let parry_stance =
            defender.equipment.is_two_handed() || defender.equipment.is_dual_wielding();
        if defender.combat_ability() == Some(CombatAbility::Parry) && parry_stance {
            chance += cfg.parry_block_bonus;
            if defender.is_ability_active(CombatAbility::Parry, now) {
                chance += cfg.parry_active_block_bonus;
            }
        }
        if phalanx {
            chance += cfg.phalanx_block_bonus;
        }
        chance *= 1.0 + defender.equipment.jewels.bonus(Jewel::GearBlock);
        event.modifiers.block_chance = chance;

        let roll = rng.roll(Draw::Block);
        if chance <= 0.0 || roll > chance {
            return Gate::Continue;
        }

        debug!("{} blocked {}", defender.name, attacker.name);
        event.terminate(Outcome::Blocked);
        self.on_block(ctx, attacker, defender, event, rng);
        Gate::Terminal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{AttackOptions, DamageSource};
    use crate::equipment::{Offhand, Shield, Weapon, WeaponKind};
    use crate::random::ScriptedRandom;
    use crate::skills::Training;
    use aegis_common::{ItemId, Position};

    fn duel() -> (Combatant, Combatant) {
        let attacker = Combatant::player("Attacker")
            .with_skill(Skill::UnarmedCombat, 200.0, Training::Trained)
            .with_position(Position::new(1.0, 0.0));
        let defender = Combatant::player("Defender")
            .with_skill(Skill::MeleeDefense, 200.0, Training::Trained);
        (attacker, defender)
    }

    fn attack(
        pipeline: &DamagePipeline,
        attacker: &mut Combatant,
        defender: &mut Combatant,
        rng: &mut ScriptedRandom,
    ) -> DamageEvent {
        pipeline.resolve_attack(
            attacker,
            defender,
            &DamageSource::Attacker,
            &AttackOptions::default(),
            0.0,
            rng,
        )
    }

    #[test]
    fn test_invincible_short_circuits() {
        let pipeline = DamagePipeline::default();
        let (mut attacker, mut defender) = duel();
        defender.invincible = true;
        let mut rng = ScriptedRandom::new(0.0);

        let event = attack(&pipeline, &mut attacker, &mut defender, &mut rng);
        assert_eq!(event.outcome, Outcome::Invulnerable);
        assert!(!event.has_damage());
        assert!(rng.log().is_empty());
    }

    #[test]
    fn test_glancing_blow_halves_damage() {
        let pipeline = DamagePipeline::default();
        let (mut attacker, mut defender) = duel();
        let mut rng = ScriptedRandom::new(0.9)
            .with(Draw::Evasion, 0.0)
            .with(Draw::PartialEvasion, 0.5);

        let event = attack(&pipeline, &mut attacker, &mut defender, &mut rng);
        assert!(event.is_glancing());
        assert_eq!(event.modifiers.evasion_mod, 0.5);
        assert!(!event.evaded());
    }

    #[test]
    fn test_provoke_glancing_mod() {
        let pipeline = DamagePipeline::default();
        let (mut attacker, defender) = duel();
        let mut defender = defender.with_focus(CombatAbility::Provoke);
        defender.activate(CombatAbility::Provoke, 0.0, 10.0);
        let mut rng = ScriptedRandom::new(0.9)
            .with(Draw::Evasion, 0.0)
            .with(Draw::PartialEvasion, 0.5);

        let event = attack(&pipeline, &mut attacker, &mut defender, &mut rng);
        assert_eq!(event.modifiers.evasion_mod, 0.25);
    }

    #[test]
    fn test_non_combat_defender_never_evades_or_blocks() {
        let pipeline = DamagePipeline::default();
        let (mut attacker, defender) = duel();
        let mut defender = defender.with_combat_mode(CombatMode::NonCombat);
        let mut rng = ScriptedRandom::new(0.0);

        let event = attack(&pipeline, &mut attacker, &mut defender, &mut rng);
        assert_eq!(event.outcome, Outcome::Hit);
        assert_eq!(rng.count(Draw::Evasion), 0);
        assert_eq!(rng.count(Draw::Block), 0);
    }

    #[test]
    fn test_smokescreen_adds_evade_chance() {
        let pipeline = DamagePipeline::default();
        let mut defender = Combatant::player("Rogue").with_focus(CombatAbility::Smokescreen);
        let base = pipeline.evade_chance(300.0, 200.0, &defender, 0.0);

        defender.activate(CombatAbility::Smokescreen, 0.0, 20.0);
        let recent = pipeline.evade_chance(300.0, 200.0, &defender, 1.0);
        let later = pipeline.evade_chance(300.0, 200.0, &defender, 10.0);

        assert!((later - base - 0.10).abs() < 1e-5);
        assert!((recent - base - 0.40).abs() < 1e-5);
    }

    #[test]
    fn test_block_outside_arc_without_phalanx() {
        let pipeline = DamagePipeline::default();
        let (attacker, defender) = duel();
        // Attacker directly behind a defender facing +X.
        let mut attacker = attacker.with_position(Position::new(-1.0, 0.0));
        let mut defender = defender
            .with_focus(CombatAbility::Phalanx)
            .with_offhand(Offhand::Shield(Shield::new(ItemId::new(9), 300.0)));
        let mut rng = ScriptedRandom::new(0.9);

        let event = attack(&pipeline, &mut attacker, &mut defender, &mut rng);
        assert_eq!(rng.count(Draw::Block), 0);
        assert_ne!(event.outcome, Outcome::Blocked);

        defender.activate(CombatAbility::Phalanx, 0.0, 5.0);
        let mut rng = ScriptedRandom::new(0.9).with(Draw::Block, 0.1);
        let event = attack(&pipeline, &mut attacker, &mut defender, &mut rng);
        assert_eq!(event.outcome, Outcome::Blocked);
        assert!((event.modifiers.block_chance - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_frontal_attack_draws_block_without_chance() {
        let pipeline = DamagePipeline::default();
        let (mut attacker, mut defender) = duel();
        let mut rng = ScriptedRandom::new(0.9).with(Draw::Block, 0.0);

        let event = attack(&pipeline, &mut attacker, &mut defender, &mut rng);
        assert_eq!(rng.count(Draw::Block), 1);
        assert_eq!(event.modifiers.block_chance, 0.0);
        assert_ne!(event.outcome, Outcome::Blocked);
    }

    #[test]
    fn test_parry_block_chance() {
        let pipeline = DamagePipeline::default();
        let (mut attacker, defender) = duel();
        let greatsword = Weapon::new(ItemId::new(3), "Greatsword", WeaponKind::Sword).two_handed();
        let mut defender = defender
            .with_melee(greatsword)
            .with_focus(CombatAbility::Parry);
        let mut rng = ScriptedRandom::new(0.9);

        let event = attack(&pipeline, &mut attacker, &mut defender, &mut rng);
        assert!((event.modifiers.block_chance - 0.20).abs() < 1e-6);

        defender.activate(CombatAbility::Parry, 0.0, 5.0);
        let event = attack(&pipeline, &mut attacker, &mut defender, &mut rng);
        assert!((event.modifiers.block_chance - 0.35).abs() < 1e-6);
    }

    #[test]
    fn test_guaranteed_hit_skips_evasion_draws() {
        let pipeline = DamagePipeline::default();
        let (attacker, mut defender) = duel();
        let mut attacker = attacker.with_focus(CombatAbility::Backstab);
        attacker.activate(CombatAbility::Backstab, 0.0, 5.0);
        let mut rng = ScriptedRandom::new(0.0);

        let event = attack(&pipeline, &mut attacker, &mut defender, &mut rng);
        assert!(!event.evaded());
        assert_eq!(rng.count(Draw::Evasion), 0);
        assert_eq!(rng.count(Draw::PartialEvasion), 0);
    }
}
