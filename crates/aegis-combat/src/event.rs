//! The per-attack result object.

use aegis_common::{EntityId, ItemId};
use serde::{Deserialize, Serialize};

use crate::ability::CombatAbility;
use crate::body::BodyPart;
use crate::damage_mod::BaseDamageMod;
use crate::equipment::DamageType;
use crate::extension::ProcEffect;

/// Terminal outcome of the outcome gate. Exactly one holds per attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Outcome {
    /// Defender could not be damaged.
    Invulnerable,
    /// Attack fully evaded.
    Evaded,
    /// Attack blocked.
    Blocked,
    /// Attack landed.
    #[default]
    Hit,
}

/// Result of the evasion sub-roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PartialEvasion {
    /// Clean hit.
    #[default]
    None,
    /// Glancing blow.
    Some,
    /// Full evade.
    All,
}

/// Melee or missile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CombatType {
    /// Melee swing.
    #[default]
    Melee,
    /// Projectile impact.
    Missile,
}

/// Notable conditions of one attack, for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AttackConditions {
    /// A critical was negated by critical defense.
    pub critical_defended: bool,
    /// Recklessness bonus applied.
    pub recklessness: bool,
    /// Sneak attack bonus applied.
    pub sneak_attack: bool,
    /// Creature overpowered the defender's evasion.
    pub overpower: bool,
}

/// Every named intermediate modifier of one attack.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Modifiers {
    // === Skills and chances ===
    /// Attacker skill after height, ability and jewel bonuses.
    pub effective_attack_skill: f32,
    /// Defender skill after height and jewel bonuses.
    pub effective_defense_skill: f32,
    /// Chance the defender evaded.
    pub evade_chance: f32,
    /// Chance the defender blocked.
    pub block_chance: f32,
    /// Chance of a critical strike.
    pub critical_chance: f32,
    /// Chance a critical was defended.
    pub critical_defense_chance: f32,

    // === Damage roll ===
    /// Attribute modifier.
    pub attribute_mod: f32,
    /// Power modifier.
    pub power_mod: f32,
    /// Slayer modifier.
    pub slayer_mod: f32,
    /// Damage rating modifier.
    pub damage_rating_mod: f32,
    /// Recklessness modifier.
    pub recklessness_mod: f32,
    /// Sneak attack modifier.
    pub sneak_attack_mod: f32,
    /// High attack damage bonus.
    pub attack_height_bonus: f32,
    /// Elemental damage rating bonus.
    pub elemental_rating_bonus: f32,
    /// Dual wield bonus.
    pub dual_wield_bonus: f32,
    /// Two-handed bonus.
    pub two_handed_bonus: f32,
    /// Multishot penalty.
    pub multishot_penalty: f32,
    /// Provoke bonus.
    pub provoke_bonus: f32,
    /// Fury bonus.
    pub fury_bonus: f32,
    /// Steady Shot bonus.
    pub steady_shot_bonus: f32,
    /// Ammunition effect modifier.
    pub ammo_effect_mod: f32,
    /// Level scaling damage modifier.
    pub level_scaling_mod: f32,
    /// Critical damage modifier.
    pub critical_damage_mod: f32,
    /// Flat damage added by an extension.
    pub extension_flat_bonus: f32,
    /// Damage multiplier from an extension.
    pub extension_damage_mod: f32,

    // === Mitigation ===
    /// Fraction of armor that still applies.
    pub ignore_armor_mod: f32,
    /// Armor modifier.
    pub armor_mod: f32,
    /// Shield modifier.
    pub shield_mod: f32,
    /// Resistance modifier.
    pub resistance_mod: f32,
    /// Damage resistance rating modifier.
    pub damage_resistance_rating_mod: f32,
    /// Glancing blow modifier.
    pub evasion_mod: f32,
    /// Physical Defense specialization modifier.
    pub spec_defense_mod: f32,
    /// Damage type ward modifier.
    pub ward_mod: f32,
    /// Self-harm rating modifier.
    pub self_harm_rating_mod: f32,
    /// Red fury rating modifier.
    pub red_fury_rating_mod: f32,
    /// Yellow fury rating modifier.
    pub yellow_fury_rating_mod: f32,
    /// Cleave modifier.
    pub cleave_mod: f32,
}

impl Default for Modifiers {
    fn default() -> Self {
        Self {
            effective_attack_skill: 0.0,
            effective_defense_skill: 0.0,
            evade_chance: 0.0,
            block_chance: 0.0,
            critical_chance: 0.0,
            critical_defense_chance: 0.0,
            attribute_mod: 1.0,
            power_mod: 1.0,
            slayer_mod: 1.0,
            damage_rating_mod: 1.0,
            recklessness_mod: 1.0,
            sneak_attack_mod: 1.0,
            attack_height_bonus: 1.0,
            elemental_rating_bonus: 1.0,
            dual_wield_bonus: 1.0,
            two_handed_bonus: 1.0,
            multishot_penalty: 1.0,
            provoke_bonus: 1.0,
            fury_bonus: 1.0,
            steady_shot_bonus: 1.0,
            ammo_effect_mod: 1.0,
            level_scaling_mod: 1.0,
            critical_damage_mod: 1.0,
            extension_flat_bonus: 0.0,
            extension_damage_mod: 1.0,
            ignore_armor_mod: 1.0,
            armor_mod: 1.0,
            shield_mod: 1.0,
            resistance_mod: 1.0,
            damage_resistance_rating_mod: 1.0,
            evasion_mod: 1.0,
            spec_defense_mod: 1.0,
            ward_mod: 1.0,
            self_harm_rating_mod: 1.0,
            red_fury_rating_mod: 1.0,
            yellow_fury_rating_mod: 1.0,
            cleave_mod: 1.0,
        }
    }
}

impl Modifiers {
    /// Product of the mitigation factors (cleave excluded).
    #[must_use]
    pub fn mitigation(&self) -> f32 {
        self.armor_mod
            * self.shield_mod
            * self.resistance_mod
            * self.damage_resistance_rating_mod
            * self.evasion_mod
            * self.spec_defense_mod
            * self.ward_mod
            * self.self_harm_rating_mod
            * self.red_fury_rating_mod
            * self.yellow_fury_rating_mod
    }
}

/// Outcome and numbers of one resolved attack.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DamageEvent {
    /// Attacker.
    pub attacker: Option<EntityId>,
    /// Defender.
    pub defender: Option<EntityId>,
    /// Gate outcome.
    pub outcome: Outcome,
    /// Evasion sub-roll result.
    pub partial_evasion: PartialEvasion,
    /// Critical strike.
    pub is_critical: bool,
    /// A critical was negated by critical defense.
    pub critical_defended: bool,
    /// An attacker extension forced the critical; critical defense is skipped.
    pub critical_overridden_by_trinket: bool,
    /// Defender was under lifestone protection.
    pub lifestone_protected: bool,
    /// The attack could not be resolved and dealt nothing.
    pub general_failure: bool,
    /// Creature overpowered the defender's evasion.
    pub overpower: bool,
    /// Recklessness bonus applied.
    pub recklessness: bool,
    /// Sneak attack bonus applied.
    pub sneak_attack: bool,

    /// Melee or missile.
    pub combat_type: CombatType,
    /// Damage type, if resolved.
    pub damage_type: Option<DamageType>,
    /// Body part struck.
    pub body_part: Option<BodyPart>,
    /// Attacking weapon.
    pub weapon: Option<ItemId>,
    /// Defender's weapon.
    pub defender_weapon: Option<ItemId>,
    /// Attacker's off-hand item.
    pub offhand: Option<ItemId>,
    /// Attacker's selected ability.
    pub attacker_ability: Option<CombatAbility>,
    /// Defender's selected ability.
    pub defender_ability: Option<CombatAbility>,

    /// Damage envelope used for the roll.
    pub base_damage_mod: Option<BaseDamageMod>,
    /// Drawn base damage.
    pub base_damage: f32,
    /// Damage before mitigation.
    pub damage_before_mitigation: f32,
    /// Final damage.
    pub damage: f32,
    /// Damage removed by mitigation.
    pub damage_mitigated: f32,
    /// Named intermediate modifiers.
    pub modifiers: Modifiers,

    /// Counter-attack triggered by a parried block.
    pub riposte: Option<Box<DamageEvent>>,
    /// Damage reflected to the attacker by thorns.
    pub thorns_damage: f32,
    /// Fury backlash taken by the attacker.
    pub self_damage: f32,
    /// Proc effects applied after the hit, in order.
    pub procs: Vec<ProcEffect>,
    /// Attacker died from reactive effects.
    pub attacker_killed: bool,
    /// Defender died from reactive effects.
    pub defender_killed: bool,
}

impl DamageEvent {
    /// Creates an event for an attack.
    #[must_use]
    pub fn new(attacker: EntityId, defender: EntityId) -> Self {
        Self {
            attacker: Some(attacker),
            defender: Some(defender),
            ..Self::default()
        }
    }

    /// Attack landed on an unprotected defender.
    #[must_use]
    pub fn has_damage(&self) -> bool {
        self.outcome == Outcome::Hit && !self.lifestone_protected
    }

    /// Attack was fully evaded.
    #[must_use]
    pub fn evaded(&self) -> bool {
        self.outcome == Outcome::Evaded
    }

    /// Attack was blocked.
    #[must_use]
    pub fn blocked(&self) -> bool {
        self.outcome == Outcome::Blocked
    }

    /// Glancing blow.
    #[must_use]
    pub fn is_glancing(&self) -> bool {
        self.outcome == Outcome::Hit && self.partial_evasion == PartialEvasion::Some
    }

    /// Shield modifier applied.
    #[must_use]
    pub fn shield_mod(&self) -> f32 {
        self.modifiers.shield_mod
    }

    /// Reporting flags of this attack.
    #[must_use]
    pub fn conditions(&self) -> AttackConditions {
        AttackConditions {
            critical_defended: self.critical_defended,
            recklessness: self.recklessness,
            sneak_attack: self.sneak_attack,
            overpower: self.overpower,
        }
    }

    /// Ends the attack with no damage.
    pub(crate) fn terminate(&mut self, outcome: Outcome) {
        self.outcome = outcome;
        if outcome == Outcome::Evaded {
            self.partial_evasion = PartialEvasion::All;
        }
        self.is_critical = false;
        self.damage_before_mitigation = 0.0;
        self.damage = 0.0;
        self.damage_mitigated = 0.0;
    }

    /// Records final damage; mitigated damage is the exact difference.
    pub(crate) fn finish(&mut self, before: f32, after: f32) {
        self.damage_before_mitigation = before;
        self.damage = after.max(0.0);
        self.damage_mitigated = self.damage_before_mitigation - self.damage;
    }
}
