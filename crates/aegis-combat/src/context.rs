//! Attack context resolution: combat type, weapons, abilities and the damage
//! envelope of one attack.

use serde::{Deserialize, Serialize};

use crate::ability::CombatAbility;
use crate::body::{AttackHeight, BodyPart};
use crate::combatant::{AttackPart, Combatant};
use crate::config::CombatConfig;
use crate::damage_mod::BaseDamageMod;
use crate::equipment::{DamageType, Offhand, Weapon, WeaponKind};
use crate::event::CombatType;
use crate::skills::Skill;

/// A projectile's launcher and ammunition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    /// Launcher that fired it.
    pub launcher: Option<Weapon>,
    /// The ammunition itself.
    pub ammo: Option<Weapon>,
}

/// What dealt the damage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum DamageSource {
    /// The attacker itself (natural attacks, fists).
    #[default]
    Attacker,
    /// The attacker's equipped melee weapon.
    Weapon,
    /// A projectile.
    Projectile(Projectile),
}

/// Per-attack options supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttackOptions {
    /// Attack height.
    pub height: AttackHeight,
    /// Power (melee) or accuracy (missile) level in `[0, 1]`.
    pub power_level: f32,
    /// Natural attack used by a non-player attacker.
    pub attack_part: Option<BodyPart>,
    /// Secondary target of a cleaving swing.
    pub is_cleave: bool,
    pub(crate) allow_riposte: bool,
}

impl Default for AttackOptions {
    fn default() -> Self {
        Self {
            height: AttackHeight::Medium,
            power_level: 0.5,
            attack_part: None,
            is_cleave: false,
            allow_riposte: true,
        }
    }
}

impl AttackOptions {
    /// Options with the given height and power.
    #[must_use]
    pub fn new(height: AttackHeight, power_level: f32) -> Self {
        Self {
            height,
            power_level: power_level.clamp(0.0, 1.0),
            ..Self::default()
        }
    }

    /// Uses a specific natural attack.
    #[must_use]
    pub fn with_attack_part(mut self, part: BodyPart) -> Self {
        self.attack_part = Some(part);
        self
    }

    /// Marks the attack as a secondary cleave hit.
    #[must_use]
    pub fn cleave(mut self) -> Self {
        self.is_cleave = true;
        self
    }

    /// Options for a counter-attack, which can never be countered itself.
    pub(crate) fn counter(&self) -> Self {
        Self {
            attack_part: None,
            is_cleave: false,
            allow_riposte: false,
            ..*self
        }
    }
}

/// Everything about an attack that is fixed before the first roll.
#[derive(Debug, Clone)]
pub struct AttackContext {
    /// Melee or missile.
    pub combat_type: CombatType,
    /// Attacking weapon (melee weapon, launcher, or ammunition).
    pub weapon: Option<Weapon>,
    /// Ammunition of a missile attack.
    pub ammo: Option<Weapon>,
    /// Natural attack of a non-player attacker.
    pub attack_part: Option<AttackPart>,
    /// Defender's melee weapon.
    pub defender_weapon: Option<Weapon>,
    /// Attacker's off-hand item.
    pub offhand: Option<Offhand>,
    /// Attacker's selected ability.
    pub attacker_ability: Option<CombatAbility>,
    /// Defender's selected ability.
    pub defender_ability: Option<CombatAbility>,
    /// Skill used to attack.
    pub attack_skill: Skill,
    /// Skill used to defend.
    pub defense_skill: Skill,
    /// Damage envelope.
    pub envelope: Option<BaseDamageMod>,
    /// Damage type, if resolved.
    pub damage_type: Option<DamageType>,
    /// Player against player.
    pub pk_battle: bool,
    /// Either side is a player.
    pub player_involved: bool,
    /// Level scalars apply.
    pub level_scaling: bool,
    /// Attacker and defender are the same entity.
    pub self_target: bool,
    /// Attacker's angle relative to the defender's heading.
    pub relative_angle: f32,
    /// Distance between attacker and defender.
    pub distance: f32,
    /// Caller options.
    pub options: AttackOptions,
    /// Time of the attack in seconds.
    pub now: f64,
}

impl AttackContext {
    /// Weapon family used to attack.
    #[must_use]
    pub fn weapon_kind(&self) -> WeaponKind {
        self.weapon.as_ref().map_or(WeaponKind::Unarmed, |w| w.kind)
    }
}

/// Resolves the context of one attack.
#[must_use]
pub fn resolve_context(
    config: &CombatConfig,
    attacker: &Combatant,
    defender: &Combatant,
    source: &DamageSource,
    options: &AttackOptions,
    now: f64,
) -> AttackContext {
    let (combat_type, weapon, ammo) = match source {
        DamageSource::Projectile(projectile) => {
            let launcher = projectile
                .launcher
                .clone()
                .or_else(|| attacker.equipment.launcher.clone());
            let weapon = launcher.or_else(|| projectile.ammo.clone());
            (CombatType::Missile, weapon, projectile.ammo.clone())
        },
        DamageSource::Attacker | DamageSource::Weapon => {
            (CombatType::Melee, attacker.equipment.melee.clone(), None)
        },
    };

    // Natural attacks only stand in for a missing melee weapon.
    let attack_part = if weapon.is_none() && !attacker.is_player {
        select_attack_part(attacker, options.attack_part)
    } else {
        None
    };

    let envelope = match combat_type {
        CombatType::Missile => BaseDamageMod::for_missile(weapon.as_ref(), ammo.as_ref()),
        CombatType::Melee => match (&weapon, &attack_part) {
            (Some(weapon), _) => Some(BaseDamageMod::from_weapon(weapon)),
            (None, Some(part)) => Some(BaseDamageMod::from_attack_part(part)),
            (None, None) if attacker.is_player => Some(BaseDamageMod::new(
                config.unarmed_max_damage,
                config.unarmed_variance,
            )),
            (None, None) => None,
        },
    };

    let damage_type = ammo
        .as_ref()
        .and_then(|a| a.damage_type)
        .or_else(|| weapon.as_ref().and_then(|w| w.damage_type))
        .or_else(|| attack_part.as_ref().and_then(|p| p.damage_type))
        .or_else(|| (weapon.is_none() && attacker.is_player).then_some(DamageType::Bludgeon));

    let attack_skill = weapon
        .as_ref()
        .map_or(WeaponKind::Unarmed, |w| w.kind)
        .skill();
    let defense_skill = match combat_type {
        CombatType::Melee => Skill::MeleeDefense,
        CombatType::Missile => Skill::MissileDefense,
    };

    AttackContext {
        combat_type,
        weapon,
        ammo,
        attack_part,
        defender_weapon: defender.equipment.melee.clone(),
        offhand: attacker.equipment.offhand.clone(),
        attacker_ability: attacker.combat_ability(),
        defender_ability: defender.combat_ability(),
        attack_skill,
        defense_skill,
        envelope,
        damage_type,
        pk_battle: attacker.is_player && defender.is_player,
        player_involved: attacker.is_player || defender.is_player,
        level_scaling: config.level_scaling && attacker.is_player != defender.is_player,
        self_target: attacker.id == defender.id,
        relative_angle: defender.position.relative_angle_to(&attacker.position),
        distance: attacker.distance_to(defender),
        options: *options,
        now,
    }
}

/// Natural attack for a non-player: the requested part, else the first one.
fn select_attack_part(attacker: &Combatant, requested: Option<BodyPart>) -> Option<AttackPart> {
    requested
        .and_then(|part| attacker.attack_parts.iter().find(|a| a.part == part))
        .or_else(|| attacker.attack_parts.first())
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::CreatureType;
    use aegis_common::{ItemId, Position};

    #[test]
    fn test_projectile_makes_missile() {
        let config = CombatConfig::default();
        let bow = Weapon::new(ItemId::new(1), "Bow", WeaponKind::Bow).with_damage_mod(1.5);
        let arrow = Weapon::new(ItemId::new(2), "Arrow", WeaponKind::Bow).with_damage(
            12.0,
            0.3,
            DamageType::Pierce,
        );
        let archer = Combatant::player("Archer").with_launcher(bow);
        let target = Combatant::player("Target");
        let source = DamageSource::Projectile(Projectile {
            launcher: None,
            ammo: Some(arrow),
        });

        let ctx = resolve_context(&config, &archer, &target, &source, &AttackOptions::default(), 0.0);
        assert_eq!(ctx.combat_type, CombatType::Missile);
        assert_eq!(ctx.weapon_kind(), WeaponKind::Bow);
        assert_eq!(ctx.attack_skill, Skill::Bow);
        assert_eq!(ctx.defense_skill, Skill::MissileDefense);
        assert_eq!(ctx.damage_type, Some(DamageType::Pierce));
        assert!(ctx.pk_battle);
        assert_eq!(ctx.envelope.map(|e| e.max_damage()), Some(18.0));
    }

    #[test]
    fn test_creature_uses_requested_attack_part() {
        let config = CombatConfig::default();
        let claw = AttackPart {
            part: BodyPart::Hand,
            max_damage: 8.0,
            variance: 0.5,
            damage_type: Some(DamageType::Slash),
        };
        let bite = AttackPart {
            part: BodyPart::Head,
            max_damage: 14.0,
            variance: 0.2,
            damage_type: Some(DamageType::Pierce),
        };
        let drudge = Combatant::creature("Drudge", CreatureType::Drudge)
            .with_attack_part(claw)
            .with_attack_part(bite);
        let target = Combatant::player("Target");

        let options = AttackOptions::default().with_attack_part(BodyPart::Head);
        let ctx = resolve_context(&config, &drudge, &target, &DamageSource::Attacker, &options, 0.0);
        assert_eq!(ctx.damage_type, Some(DamageType::Pierce));
        assert_eq!(ctx.combat_type, CombatType::Melee);

        let ctx = resolve_context(
            &config,
            &drudge,
            &target,
            &DamageSource::Attacker,
            &AttackOptions::default(),
            0.0,
        );
        assert_eq!(ctx.damage_type, Some(DamageType::Slash));
    }

    #[test]
    fn test_unarmed_player_uses_configured_envelope() {
        let config = CombatConfig::default();
        let brawler = Combatant::player("Brawler");
        let target = Combatant::creature("Golem", CreatureType::Golem)
            .with_position(Position::new(1.0, 0.0).with_heading(180.0));

        let ctx = resolve_context(
            &config,
            &brawler,
            &target,
            &DamageSource::Attacker,
            &AttackOptions::default(),
            0.0,
        );
        assert_eq!(ctx.attack_skill, Skill::UnarmedCombat);
        assert_eq!(ctx.damage_type, Some(DamageType::Bludgeon));
        assert_eq!(
            ctx.envelope.map(|e| e.raw_max),
            Some(config.unarmed_max_damage)
        );
        assert!(ctx.relative_angle.abs() < 1e-3);
        assert!(!ctx.pk_battle);
    }

    #[test]
    fn test_creature_without_attacks_has_no_envelope() {
        let config = CombatConfig::default();
        let wisp = Combatant::creature("Wisp", CreatureType::Undead);
        let target = Combatant::player("Target");

        let ctx = resolve_context(
            &config,
            &wisp,
            &target,
            &DamageSource::Attacker,
            &AttackOptions::default(),
            0.0,
        );
        assert!(ctx.envelope.is_none());
        assert!(ctx.damage_type.is_none());
    }
}
