//! Reactive effects: counter-attacks and thorns on a block, procs and Fury
//! backlash on a landed hit.

use tracing::debug;

use crate::ability::CombatAbility;
use crate::combatant::{Combatant, DamageKind};
use crate::context::{resolve_context, AttackContext, DamageSource};
use crate::equipment::{DamageType, Jewel};
use crate::event::DamageEvent;
use crate::extension::{HookContext, HookSite, ProcEffect, Side};
use crate::pipeline::DamagePipeline;
use crate::random::{Draw, RandomSource};
use crate::roll::normal_damage_mod;

impl DamagePipeline {
    /// Counter-attack and thorns after the defender blocked.
    pub(crate) fn on_block(
        &self,
        ctx: &AttackContext,
        attacker: &mut Combatant,
        defender: &mut Combatant,
        event: &mut DamageEvent,
        rng: &mut dyn RandomSource,
    ) {
        let cfg = &self.config;

        if ctx.options.allow_riposte
            && defender.is_ability_active(CombatAbility::Parry, ctx.now)
            && (defender.equipment.is_two_handed() || defender.equipment.is_dual_wielding())
            && ctx.distance <= cfg.riposte_range
        {
            let counter = self.resolve(
                defender,
                attacker,
                &DamageSource::Weapon,
                &ctx.options.counter(),
                ctx.now,
                rng,
            );
            debug!(
                "{} ripostes {}: {:?} for {:.1}",
                defender.name, attacker.name, counter.outcome, counter.damage
            );
            if counter.has_damage()
                && counter.damage > 0.0
                && attacker.apply_damage(defender.id, counter.damage, DamageKind::Riposte)
            {
                event.attacker_killed = true;
            }
            event.riposte = Some(Box::new(counter));
        }

        self.thorns(ctx, attacker, defender, event, rng);
        self.notify_deaths(ctx, attacker, defender, event, rng);
    }

    /// Reflects part of the damage the defender would deal back at the
    /// attacker. Never critical, never mitigated.
    ///
    /// The thorns percentage comes from the rating alone; ramp progress does
    /// not gate it.
    fn thorns(
        &self,
        ctx: &AttackContext,
        attacker: &mut Combatant,
        defender: &Combatant,
        event: &mut DamageEvent,
        rng: &mut dyn RandomSource,
    ) {
        let cfg = &self.config;
        let socket = defender.equipment.jewels.socket(Jewel::Thorns);
        if socket.rating <= 0.0 || ctx.distance > cfg.thorns_range {
            return;
        }

        let reflected = resolve_context(
            cfg,
            defender,
            attacker,
            &DamageSource::Weapon,
            &ctx.options.counter(),
            ctx.now,
        );
        let Some(envelope) = reflected.envelope else {
            return;
        };

        let damage_type = reflected.damage_type.unwrap_or(DamageType::Bludgeon);
        let mut scratch = DamageEvent::new(defender.id, attacker.id);
        self.offense_mods(&reflected, defender, attacker, damage_type, &mut scratch);
        scratch.modifiers.damage_rating_mod = self.damage_rating_mod(defender, reflected.pk_battle, false);

        let base = rng.roll_range(Draw::Thorns, envelope.min_damage(), envelope.max_damage());
        let amount = base
            * normal_damage_mod(&scratch.modifiers)
            * defender.equipment.jewels.rated_bonus(Jewel::Thorns);
        if amount <= 0.0 {
            return;
        }

        debug!("{} reflects {:.1} thorns damage at {}", defender.name, amount, attacker.name);
        event.thorns_damage = amount;
        if attacker.apply_damage(defender.id, amount, DamageKind::Thorns) {
            event.attacker_killed = true;
        }
    }

    /// On-hit procs of both sides, then the Fury backlash and stack accrual.
    pub(crate) fn after_hit(
        &self,
        ctx: &AttackContext,
        attacker: &mut Combatant,
        defender: &mut Combatant,
        event: &mut DamageEvent,
        rng: &mut dyn RandomSource,
    ) {
        for side in [Side::Attacker, Side::Defender] {
            let procs = {
                let hook = HookContext::new(HookSite::OnHit, side, attacker, defender, event, ctx.now);
                self.extensions.procs(&hook, rng)
            };
            apply_procs(side, &procs, attacker, defender, event);
        }

        self.fury_backlash(ctx, attacker, event, rng);
        self.notify_deaths(ctx, attacker, defender, event, rng);
    }

    /// Fury self-damage check, then stack accrual.
    ///
    /// Reads the stacks left by the damage roll, which erases them while the
    /// Fury window is open.
    fn fury_backlash(
        &self,
        ctx: &AttackContext,
        attacker: &mut Combatant,
        event: &mut DamageEvent,
        rng: &mut dyn RandomSource,
    ) {
        let cfg = &self.config;
        if attacker.combat_ability() != Some(CombatAbility::Fury) {
            return;
        }

        let stacks = attacker.reckless_stacks;
        let threshold = cfg.fury_self_damage_threshold;
        if stacks > threshold {
            let span = cfg.fury_max_stacks.saturating_sub(threshold).max(1) as f32;
            let chance = cfg.fury_self_damage_max_chance * ((stacks - threshold) as f32 / span).min(1.0);
            if rng.roll(Draw::FurySelfDamage) < chance {
                let amount = (cfg.fury_self_damage_fraction * event.damage)
                    .min(cfg.fury_self_damage_health_cap * attacker.vitals.max_health);
                if amount > 0.0 {
                    debug!("{} suffers {:.1} fury backlash", attacker.name, amount);
                    event.self_damage = amount;
                    if attacker.apply_damage(attacker.id, amount, DamageKind::SelfInflicted) {
                        event.attacker_killed = true;
                    }
                }
            }
        }

        if !attacker.abilities.is_active(CombatAbility::Fury, ctx.now) {
            attacker.reckless_stacks = (stacks + cfg.fury_stacks_per_hit).min(cfg.fury_max_stacks);
        }
    }

    fn notify_deaths(
        &self,
        ctx: &AttackContext,
        attacker: &Combatant,
        defender: &Combatant,
        event: &DamageEvent,
        rng: &mut dyn RandomSource,
    ) {
        for (side, dead) in [
            (Side::Attacker, event.attacker_killed),
            (Side::Defender, event.defender_killed),
        ] {
            if dead {
                let hook = HookContext::new(HookSite::Death, side, attacker, defender, event, ctx.now);
                self.extensions.notify(&hook, rng);
            }
        }
    }
}

/// Applies proc effects owned by one side, in order.
pub(crate) fn apply_procs(
    side: Side,
    procs: &[ProcEffect],
    attacker: &mut Combatant,
    defender: &mut Combatant,
    event: &mut DamageEvent,
) {
    let (owner, opponent) = match side {
        Side::Attacker => (attacker, defender),
        Side::Defender => (defender, attacker),
    };

    for effect in procs {
        match *effect {
            ProcEffect::HealSelf(amount) => owner.heal(amount),
            ProcEffect::RestoreStamina(amount) => owner.restore_stamina(amount),
            ProcEffect::BankReprisal => owner.reprisal_banked = true,
            ProcEffect::DamageOpponent(amount) => {
                if opponent.apply_damage(owner.id, amount, DamageKind::Proc) {
                    match side {
                        Side::Attacker => event.defender_killed = true,
                        Side::Defender => event.attacker_killed = true,
                    }
                }
            },
        }
        event.procs.push(*effect);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::AttackOptions;
    use crate::equipment::{DamageType, TrinketId, Weapon, WeaponKind};
    use crate::event::Outcome;
    use crate::extension::{HookEffect, HookKey};
    use crate::random::ScriptedRandom;
    use crate::skills::{Skill, Training};
    use aegis_common::{ItemId, Position};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn brawler() -> Combatant {
        Combatant::player("Brawler")
            .with_skill(Skill::UnarmedCombat, 10_000.0, Training::Trained)
            .with_position(Position::new(1.0, 0.0))
    }

    fn duelist() -> Combatant {
        let greatsword = Weapon::new(ItemId::new(8), "Greatsword", WeaponKind::Sword)
            .with_damage(20.0, 0.5, DamageType::Slash)
            .two_handed();
        let mut duelist = Combatant::player("Duelist")
            .with_skill(Skill::Sword, 10_000.0, Training::Trained)
            .with_melee(greatsword)
            .with_focus(CombatAbility::Parry);
        duelist.activate(CombatAbility::Parry, 0.0, 10.0);
        duelist
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
    fn test_parry_riposte_counters_once() {
        let pipeline = DamagePipeline::default();
        let mut attacker = brawler();
        let mut defender = duelist();
        let mut rng = ScriptedRandom::new(0.99).with(Draw::Block, 0.1);

        let event = attack(&pipeline, &mut attacker, &mut defender, &mut rng);
        assert_eq!(event.outcome, Outcome::Blocked);
        let riposte = event.riposte.as_deref().expect("riposte should fire");
        assert_eq!(riposte.outcome, Outcome::Hit);
        assert!(riposte.riposte.is_none());
        assert!(riposte.damage > 0.0);

        let record = attacker.damage_history.last().expect("riposte recorded");
        assert_eq!(record.source, defender.id);
        assert_eq!(record.kind, DamageKind::Riposte);
        assert!((attacker.vitals.health - (100.0 - riposte.damage)).abs() < 1e-4);
    }

    #[test]
    fn test_riposte_needs_range() {
        let pipeline = DamagePipeline::default();
        let mut attacker = brawler().with_position(Position::new(5.0, 0.0));
        let mut defender = duelist();
        let mut rng = ScriptedRandom::new(0.99).with(Draw::Block, 0.1);

        let event = attack(&pipeline, &mut attacker, &mut defender, &mut rng);
        assert_eq!(event.outcome, Outcome::Blocked);
        assert!(event.riposte.is_none());
        assert!(attacker.damage_history.is_empty());
    }

    #[test]
    fn test_fury_backlash_reads_erased_stacks() {
        let pipeline = DamagePipeline::default();
        let mut attacker = brawler().with_focus(CombatAbility::Fury);
        attacker.reckless_stacks = 500;
        let mut defender = Combatant::player("Defender");
        let mut rng = ScriptedRandom::new(0.99)
            .with(Draw::BaseDamage, 0.5)
            .with(Draw::FurySelfDamage, 0.0);

        // Window closed: the stacks survive the roll and the backlash fires.
        let event = attack(&pipeline, &mut attacker, &mut defender, &mut rng);
        assert!((event.self_damage - 1.5).abs() < 1e-5);
        assert_eq!(attacker.reckless_stacks, 500);
        assert_eq!(attacker.damage_history.last().map(|r| r.kind), Some(DamageKind::SelfInflicted));

        // Window open: the roll erases the stacks before the check.
        attacker.activate(CombatAbility::Fury, 0.0, 10.0);
        let mut rng = ScriptedRandom::new(0.0);
        let event = attack(&pipeline, &mut attacker, &mut defender, &mut rng);
        assert_eq!(event.self_damage, 0.0);
        assert_eq!(rng.count(Draw::FurySelfDamage), 0);
        assert_eq!(attacker.reckless_stacks, 0);
    }

    #[test]
    fn test_fury_stacks_accrue_on_hit() {
        let pipeline = DamagePipeline::default();
        let mut attacker = brawler().with_focus(CombatAbility::Fury);
        attacker.reckless_stacks = 495;
        let mut defender = Combatant::player("Defender");
        let mut rng = ScriptedRandom::new(0.99);

        attack(&pipeline, &mut attacker, &mut defender, &mut rng);
        assert_eq!(attacker.reckless_stacks, 500);
    }

    #[test]
    fn test_on_hit_procs_apply_in_order() {
        let mut pipeline = DamagePipeline::default();
        pipeline.extensions_mut().register_fn(
            HookKey::Trinket(TrinketId(1)),
            HookSite::OnHit,
            |_, _| Some(HookEffect::Proc(ProcEffect::DamageOpponent(500.0))),
        );
        let deaths = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&deaths);
        pipeline.extensions_mut().register_fn(
            HookKey::Trinket(TrinketId(2)),
            HookSite::Death,
            move |_, _| {
                counter.fetch_add(1, Ordering::SeqCst);
                None
            },
        );

        let mut attacker = brawler().with_trinket(TrinketId(1));
        let mut defender = Combatant::player("Defender").with_trinket(TrinketId(2));
        let mut rng = ScriptedRandom::new(0.99);

        let event = attack(&pipeline, &mut attacker, &mut defender, &mut rng);
        assert_eq!(event.procs, vec![ProcEffect::DamageOpponent(500.0)]);
        assert!(event.defender_killed);
        assert!(defender.is_dead());
        assert_eq!(deaths.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_apply_procs_owner_perspective() {
        let mut attacker = Combatant::player("A").with_vitals(crate::combatant::Vitals::full(100.0, 100.0, 0.0));
        attacker.vitals.health = 50.0;
        let mut defender = Combatant::player("D");
        let mut event = DamageEvent::default();

        apply_procs(
            Side::Defender,
            &[ProcEffect::DamageOpponent(10.0), ProcEffect::BankReprisal],
            &mut attacker,
            &mut defender,
            &mut event,
        );
        assert_eq!(attacker.vitals.health, 40.0);
        assert!(defender.reprisal_banked);

        apply_procs(Side::Attacker, &[ProcEffect::HealSelf(25.0)], &mut attacker, &mut defender, &mut event);
        assert_eq!(attacker.vitals.health, 65.0);
        assert_eq!(event.procs.len(), 3);
    }
}
