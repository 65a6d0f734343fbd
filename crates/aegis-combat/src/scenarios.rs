//! End-to-end attack scenarios across every stage of the pipeline.

use aegis_common::{ItemId, Position};
use proptest::prelude::*;

use crate::prelude::*;

/// Replays a fixed stream of values regardless of the draw label.
struct StreamRandom {
    values: Vec<f32>,
    next: usize,
}

impl StreamRandom {
    fn new(values: Vec<f32>) -> Self {
        Self { values, next: 0 }
    }
}

impl RandomSource for StreamRandom {
    fn roll(&mut self, _draw: Draw) -> f32 {
        let value = self.values[self.next % self.values.len()];
        self.next += 1;
        value
    }
}

fn brawler() -> Combatant {
    Combatant::player("Brawler")
        .with_skill(Skill::UnarmedCombat, 10_000.0, Training::Trained)
        .with_position(Position::new(1.0, 0.0))
}

fn resolve(
    pipeline: &DamagePipeline,
    attacker: &mut Combatant,
    defender: &mut Combatant,
    rng: &mut dyn RandomSource,
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

fn check_invariants(event: &DamageEvent) {
    assert!(event.damage >= 0.0, "negative damage: {}", event.damage);
    assert!(
        (event.damage_mitigated - (event.damage_before_mitigation - event.damage)).abs() < 1e-3,
        "mitigated {} != {} - {}",
        event.damage_mitigated,
        event.damage_before_mitigation,
        event.damage
    );
    assert_eq!(event.evaded(), event.outcome == Outcome::Evaded);
    assert_eq!(event.blocked(), event.outcome == Outcome::Blocked);
    if event.has_damage() {
        assert_eq!(event.outcome, Outcome::Hit);
    }
    if event.outcome != Outcome::Hit {
        assert_eq!(event.damage, 0.0);
        assert!(!event.is_critical);
    }
    if let Some(riposte) = &event.riposte {
        check_invariants(riposte);
    }
}

proptest! {
    #[test]
    fn outcome_invariants_hold(
        rolls in prop::collection::vec(0.0f32..1.0, 1..32),
        attack in 0.0f32..400.0,
        defense in 0.0f32..400.0,
        armor in -50.0f32..400.0,
        angle in -180.0f32..180.0,
        phalanx in any::<bool>(),
        parry in any::<bool>(),
        critical in any::<bool>(),
    ) {
        let pipeline = DamagePipeline::default();
        let radians = angle.to_radians();
        let mut attacker = Combatant::player("Attacker")
            .with_skill(Skill::UnarmedCombat, attack, Training::Trained)
            .with_position(Position::new(radians.cos(), radians.sin()))
            .with_jewel(Jewel::Thorns, 5.0, 100.0);
        attacker.reprisal_banked = critical;

        let greatsword = Weapon::new(ItemId::new(1), "Greatsword", WeaponKind::Sword)
            .with_damage(20.0, 0.5, DamageType::Slash)
            .two_handed();
        let focus = if phalanx { CombatAbility::Phalanx } else { CombatAbility::Parry };
        let mut defender = Combatant::player("Defender")
            .with_skill(Skill::MeleeDefense, defense, Training::Specialized)
            .with_skill(Skill::Sword, attack, Training::Trained)
            .with_armor(ArmorPiece::new(ItemId::new(2), armor, [BodyPart::Chest, BodyPart::Head]))
            .with_jewel(Jewel::Thorns, 10.0, 100.0)
            .with_focus(focus);
        if parry {
            defender = defender.with_melee(greatsword);
        }
        defender.activate(focus, 0.0, 10.0);

        let mut rng = StreamRandom::new(rolls);
        let event = resolve(&pipeline, &mut attacker, &mut defender, &mut rng);
        check_invariants(&event);
    }

    #[test]
    fn invincible_defender_never_takes_damage(
        rolls in prop::collection::vec(0.0f32..1.0, 1..16),
        attack in 0.0f32..400.0,
        reprisal in any::<bool>(),
    ) {
        let pipeline = DamagePipeline::default();
        let mut attacker = Combatant::player("Attacker")
            .with_skill(Skill::UnarmedCombat, attack, Training::Specialized);
        attacker.reprisal_banked = reprisal;
        let mut defender = Combatant::player("Defender").with_focus(CombatAbility::Phalanx);
        defender.activate(CombatAbility::Phalanx, 0.0, 10.0);
        defender.invincible = true;

        let mut rng = StreamRandom::new(rolls);
        let event = resolve(&pipeline, &mut attacker, &mut defender, &mut rng);
        prop_assert_eq!(event.damage, 0.0);
        prop_assert!(!event.blocked());
        prop_assert!(!event.evaded());
        prop_assert!(!event.has_damage());
        prop_assert_eq!(rng.next, 0);
    }
}

#[test]
fn test_evasion_sub_roll_splits_in_thirds() {
    let pipeline = DamagePipeline::default();
    // Evade chance clamps to 1, so every attack reaches the sub-roll.
    let mut attacker = Combatant::player("Attacker");
    let mut defender =
        Combatant::player("Defender").with_skill(Skill::MeleeDefense, 10_000.0, Training::Trained);
    let mut rng = fastrand::Rng::with_seed(7);

    let trials = 6000;
    let (mut evaded, mut glancing, mut clean) = (0, 0, 0);
    for _ in 0..trials {
        let event = resolve(&pipeline, &mut attacker, &mut defender, &mut rng);
        assert_eq!(event.modifiers.evade_chance, 1.0);
        match (event.outcome, event.partial_evasion) {
            (Outcome::Evaded, PartialEvasion::All) => evaded += 1,
            (Outcome::Hit, PartialEvasion::Some) => glancing += 1,
            (Outcome::Hit, PartialEvasion::None) => clean += 1,
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    for count in [evaded, glancing, clean] {
        let share = f64::from(count) / f64::from(trials);
        assert!((share - 1.0 / 3.0).abs() < 0.04, "share {share} too far from 1/3");
    }
}

#[test]
fn test_guaranteed_hits_ignore_an_always_evading_generator() {
    let pipeline = DamagePipeline::default();
    let defender = || {
        Combatant::player("Defender")
            .with_skill(Skill::MeleeDefense, 1_000_000.0, Training::Trained)
            .with_skill(Skill::MissileDefense, 1_000_000.0, Training::Trained)
    };

    // Baseline: a 0.0 stream evades everything.
    let mut rng = ScriptedRandom::new(0.0);
    let event = resolve(&pipeline, &mut brawler(), &mut defender(), &mut rng);
    assert!(event.evaded());

    for ability in [CombatAbility::Fury, CombatAbility::Backstab] {
        let mut attacker = brawler().with_focus(ability);
        attacker.activate(ability, 0.0, 10.0);
        let mut rng = ScriptedRandom::new(0.0);
        let event = resolve(&pipeline, &mut attacker, &mut defender(), &mut rng);
        assert!(!event.evaded(), "{ability:?} should always hit");
        assert_eq!(event.partial_evasion, PartialEvasion::None);
    }

    // Steady Shot needs a launcher.
    let bow = Weapon::new(ItemId::new(1), "Bow", WeaponKind::Bow);
    let arrow = Weapon::new(ItemId::new(2), "Arrow", WeaponKind::Bow).with_damage(10.0, 0.2, DamageType::Pierce);
    let mut archer = Combatant::player("Archer")
        .with_skill(Skill::Bow, 100.0, Training::Trained)
        .with_launcher(bow)
        .with_focus(CombatAbility::SteadyShot);
    archer.activate(CombatAbility::SteadyShot, 0.0, 10.0);
    let source = DamageSource::Projectile(Projectile {
        launcher: None,
        ammo: Some(arrow),
    });
    let mut rng = ScriptedRandom::new(0.0);
    let event = pipeline.resolve_attack(
        &mut archer,
        &mut defender(),
        &source,
        &AttackOptions::default(),
        0.0,
        &mut rng,
    );
    assert_eq!(event.combat_type, CombatType::Missile);
    assert!(!event.evaded());

    // Overpowering creature.
    let claw = AttackPart {
        part: BodyPart::Hand,
        max_damage: 6.0,
        variance: 0.5,
        damage_type: Some(DamageType::Slash),
    };
    let mut drudge = Combatant::creature("Drudge", CreatureType::Drudge).with_attack_part(claw);
    drudge.overpower_chance = 1.0;
    let mut rng = ScriptedRandom::new(0.0);
    let event = resolve(&pipeline, &mut drudge, &mut defender(), &mut rng);
    assert!(event.overpower);
    assert!(event.conditions().overpower);
    assert!(!event.evaded());

    // Self-targeting.
    let mut attacker = brawler().with_skill(Skill::MeleeDefense, 1_000_000.0, Training::Trained);
    let mut reflection = attacker.clone();
    let mut rng = ScriptedRandom::new(0.0);
    let event = resolve(&pipeline, &mut attacker, &mut reflection, &mut rng);
    assert!(!event.evaded());
}

#[test]
fn test_thorns_reflect_damage_on_block() {
    let pipeline = DamagePipeline::default();
    let mut attacker = brawler();
    let mut defender = Combatant::player("Thornguard")
        .with_focus(CombatAbility::Phalanx)
        .with_jewel(Jewel::Thorns, 10.0, 100.0);
    defender.activate(CombatAbility::Phalanx, 0.0, 10.0);
    let mut rng = ScriptedRandom::new(0.5);

    let event = resolve(&pipeline, &mut attacker, &mut defender, &mut rng);
    assert!(event.blocked());
    assert_eq!(event.damage, 0.0);
    // 3.0 unarmed draw at 25% thorns.
    assert!((event.thorns_damage - 0.75).abs() < 1e-5);
    assert!((attacker.vitals.health - 99.25).abs() < 1e-4);

    let record = attacker.damage_history.last().expect("thorns recorded");
    assert_eq!(record.source, defender.id);
    assert_eq!(record.kind, DamageKind::Thorns);
}

#[test]
fn test_thorns_reflect_without_ramp_progress() {
    let pipeline = DamagePipeline::default();
    let mut attacker = brawler();
    let mut defender = Combatant::player("Thornguard")
        .with_focus(CombatAbility::Phalanx)
        .with_jewel(Jewel::Thorns, 10.0, 0.0);
    defender.activate(CombatAbility::Phalanx, 0.0, 10.0);
    let mut rng = ScriptedRandom::new(0.5);

    let event = resolve(&pipeline, &mut attacker, &mut defender, &mut rng);
    assert!(event.blocked());
    assert!((event.thorns_damage - 0.75).abs() < 1e-5);
    let record = attacker.damage_history.last().expect("thorns recorded");
    assert_eq!(record.source, defender.id);
}

#[test]
fn test_thorns_carry_defender_power() {
    let pipeline = DamagePipeline::default();
    let mut attacker = brawler();
    let mut defender = Combatant::player("Thornguard")
        .with_focus(CombatAbility::Phalanx)
        .with_jewel(Jewel::Thorns, 10.0, 100.0);
    defender.activate(CombatAbility::Phalanx, 0.0, 10.0);
    let mut rng = ScriptedRandom::new(0.5);

    let event = pipeline.resolve_attack(
        &mut attacker,
        &mut defender,
        &DamageSource::Attacker,
        &AttackOptions::new(AttackHeight::Medium, 1.0),
        0.0,
        &mut rng,
    );
    assert!(event.blocked());
    // 3.0 unarmed draw, full power (1.5) at 25% thorns.
    assert!((event.thorns_damage - 1.125).abs() < 1e-5);
}

#[test]
fn test_thorns_need_range() {
    let pipeline = DamagePipeline::default();
    let mut attacker = brawler().with_position(Position::new(20.0, 0.0));
    let mut defender = Combatant::player("Thornguard")
        .with_focus(CombatAbility::Phalanx)
        .with_jewel(Jewel::Thorns, 10.0, 100.0);
    defender.activate(CombatAbility::Phalanx, 0.0, 10.0);
    let mut rng = ScriptedRandom::new(0.5);

    let event = resolve(&pipeline, &mut attacker, &mut defender, &mut rng);
    assert!(event.blocked());
    assert_eq!(event.thorns_damage, 0.0);
    assert!(attacker.damage_history.is_empty());
}

#[test]
fn test_deterministic_unarmed_damage() {
    let pipeline = DamagePipeline::default();
    let mut attacker = brawler();
    let mut defender = Combatant::player("Dummy");
    let mut rng = ScriptedRandom::new(0.99)
        .with(Draw::BaseDamage, 0.5)
        .with(Draw::Critical, 0.99);

    let event = resolve(&pipeline, &mut attacker, &mut defender, &mut rng);
    assert_eq!(event.outcome, Outcome::Hit);
    assert!(!event.is_critical);
    assert!((event.base_damage - 3.0).abs() < 1e-6);
    assert!((event.damage - 3.0).abs() < 1e-6);
    assert_eq!(event.damage_mitigated, 0.0);
    assert_eq!(event.modifiers.mitigation(), 1.0);
    assert!(event.has_damage());
    // The main damage is the caller's to apply.
    assert_eq!(defender.vitals.health, 100.0);
}

#[test]
fn test_critical_at_least_midpoint_hit() {
    let pipeline = DamagePipeline::default();
    let sword = Weapon::new(ItemId::new(1), "Sword", WeaponKind::Sword).with_damage(20.0, 0.5, DamageType::Slash);
    let attacker = || {
        Combatant::player("Swordsman")
            .with_skill(Skill::Sword, 10_000.0, Training::Trained)
            .with_melee(sword.clone())
            .with_position(Position::new(1.0, 0.0))
    };
    let mut defender = Combatant::player("Defender");

    let mut rng = ScriptedRandom::new(0.99).with(Draw::BaseDamage, 0.5);
    let normal = resolve(&pipeline, &mut attacker(), &mut defender, &mut rng);
    let mut rng = ScriptedRandom::new(0.99)
        .with(Draw::BaseDamage, 0.5)
        .with(Draw::Critical, 0.0);
    let critical = resolve(&pipeline, &mut attacker(), &mut defender, &mut rng);

    assert!(!normal.is_critical);
    assert!(critical.is_critical);
    assert!((normal.damage_before_mitigation - 15.0).abs() < 1e-4);
    assert!(critical.damage_before_mitigation >= normal.damage_before_mitigation);
}

#[test]
fn test_full_draw_order_with_glancing_blow() {
    let pipeline = DamagePipeline::default();
    let mut attacker = Combatant::player("Attacker")
        .with_skill(Skill::UnarmedCombat, 200.0, Training::Trained)
        .with_position(Position::new(1.0, 0.0));
    let mut defender = Combatant::player("Defender")
        .with_skill(Skill::MeleeDefense, 200.0, Training::Trained)
        .with_focus(CombatAbility::Phalanx);
    defender.activate(CombatAbility::Phalanx, 0.0, 10.0);
    let mut rng = ScriptedRandom::new(0.9)
        .with(Draw::Evasion, 0.0)
        .with(Draw::PartialEvasion, 0.5);

    let event = resolve(&pipeline, &mut attacker, &mut defender, &mut rng);
    assert!(event.is_glancing());
    assert_eq!(
        rng.log(),
        &[
            Draw::Evasion,
            Draw::PartialEvasion,
            Draw::Block,
            Draw::BaseDamage,
            Draw::Critical,
            Draw::BodyPart,
        ]
    );
}

#[test]
fn test_event_report_serializes() {
    let pipeline = DamagePipeline::default();
    let mut rng = ScriptedRandom::new(0.99).with(Draw::BaseDamage, 0.5);
    let event = resolve(&pipeline, &mut brawler(), &mut Combatant::player("Dummy"), &mut rng);

    let json = serde_json::to_value(&event).expect("event serializes");
    assert_eq!(json["outcome"], "Hit");
    assert!(json["modifiers"]["armor_mod"].is_number());
}
