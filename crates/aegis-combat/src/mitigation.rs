//! Mitigation: armor, shield, resistances, ratings and wards.

use tracing::trace;

use crate::body::{pick_weighted, player_weights, BodyPart, Quadrant};
use crate::combatant::{CombatMode, Combatant, Rating};
use crate::compose::{additive_combine, ramping_bonus};
use crate::context::AttackContext;
use crate::equipment::{DamageType, WeaponKind};
use crate::error::{CombatError, CombatResult};
use crate::event::DamageEvent;
use crate::pipeline::DamagePipeline;
use crate::random::{Draw, RandomSource};
use crate::skills::Skill;

/// Damage multiplier of an armor level.
///
/// Positive armor reduces damage hyperbolically; negative armor increases it
/// linearly.
#[must_use]
pub fn calc_armor_mod(armor_level: f32, divisor: f32) -> f32 {
    if armor_level > 0.0 {
        divisor / (armor_level + divisor)
    } else if armor_level < 0.0 {
        1.0 - armor_level / divisor
    } else {
        1.0
    }
}

impl DamagePipeline {
    pub(crate) fn mitigate(
        &self,
        ctx: &AttackContext,
        attacker: &Combatant,
        defender: &Combatant,
        event: &mut DamageEvent,
        rng: &mut dyn RandomSource,
    ) -> CombatResult<()> {
        let cfg = &self.config;
        let damage_type = event.damage_type.unwrap_or(DamageType::Bludgeon);
        let weapon = ctx.weapon.as_ref().filter(|w| w.special_properties_active());

        let ignore = self.ignore_armor_mod(ctx, attacker);
        event.modifiers.ignore_armor_mod = ignore;

        let part = self.select_body_part(ctx, defender, rng)?;
        event.body_part = Some(part);

        let m = &mut event.modifiers;
        m.armor_mod = if weapon.is_some_and(|w| w.imbues.ignore_all_armor) {
            1.0
        } else {
            calc_armor_mod(armor_level(defender, part, damage_type, ignore), cfg.armor_divisor)
        };

        if defender.combat_mode != CombatMode::NonCombat
            && ctx.relative_angle.abs() <= cfg.block_angle / 2.0
        {
            if let Some(shield) = defender.equipment.shield() {
                let level = shield.armor_level * shield.mods.get(damage_type) * ignore;
                m.shield_mod = calc_armor_mod(level, cfg.armor_divisor);
            }
        }

        let mut resistance = defender.resistances.get(damage_type).max(0.0);
        if let Some(rending) = weapon.and_then(|w| w.imbues.resistance_rending.get(&damage_type)) {
            resistance = resistance.max(*rending);
        }
        m.resistance_mod = resistance;

        let ratings = &defender.ratings;
        let crit = if event.is_critical { ratings.get(Rating::CritDamageResist) } else { 0.0 };
        let pk = if ctx.pk_battle { ratings.get(Rating::PkDamageResist) } else { 0.0 };
        m.damage_resistance_rating_mod = self
            .curves
            .rating
            .defense(additive_combine([ratings.get(Rating::DamageResist), crit, pk]));

        if defender.skills.is_specialized(ctx.defense_skill) {
            let check = self
                .curves
                .skill_check
                .chance(m.effective_defense_skill, m.effective_attack_skill);
            m.spec_defense_mod = cfg.spec_defense_base - cfg.spec_defense_range * check;
        }

        m.ward_mod = cfg.ward_base / (cfg.ward_base + defender.wards.get(damage_type));
        m.self_harm_rating_mod = self.curves.rating.offense(ratings.get(Rating::SelfHarm));
        m.red_fury_rating_mod = 1.0
            + ramping_bonus(
                cfg.red_fury_ramp,
                ratings.get(Rating::RedFury),
                defender.vitals.missing_health_fraction(),
            );
        m.yellow_fury_rating_mod = 1.0
            + ramping_bonus(
                cfg.yellow_fury_ramp,
                ratings.get(Rating::YellowFury),
                defender.vitals.missing_stamina_fraction(),
            );
        if ctx.options.is_cleave {
            m.cleave_mod = cfg.cleave_mod;
        }

        let before = event.damage_before_mitigation;
        let after = before * event.modifiers.mitigation() * event.modifiers.cleave_mod;
        event.finish(before, after);

        trace!(
            "{} struck on {:?}: {:.2} -> {:.2} (x{:.3})",
            defender.name,
            part,
            before,
            event.damage,
            event.modifiers.mitigation()
        );
        Ok(())
    }

    /// Fraction of the defender's armor that still applies.
    pub(crate) fn ignore_armor_mod(&self, ctx: &AttackContext, attacker: &Combatant) -> f32 {
        let cfg = &self.config;
        let mut ignore = match ctx.weapon.as_ref().filter(|w| w.special_properties_active()) {
            Some(weapon) => {
                let rending = if weapon.imbues.armor_rending {
                    let skill = attacker.skills.current(ctx.attack_skill);
                    let reduction = ((skill - cfg.armor_rending_base_skill) / cfg.armor_rending_divisor)
                        .clamp(0.0, cfg.armor_rending_cap);
                    1.0 - reduction
                } else {
                    1.0
                };
                let cleaving = 1.0 - weapon.imbues.armor_cleaving.clamp(0.0, 1.0);
                rending.min(cleaving)
            },
            None => 1.0,
        };

        if ctx.weapon_kind() == WeaponKind::Spear && attacker.skills.is_specialized(Skill::Spear) {
            ignore = (ignore - cfg.spear_spec_armor_bonus).max(0.0);
        }
        ignore
    }

    /// Draws the struck body part.
    fn select_body_part(
        &self,
        ctx: &AttackContext,
        defender: &Combatant,
        rng: &mut dyn RandomSource,
    ) -> CombatResult<BodyPart> {
        let height = ctx.options.height;
        let roll = rng.roll(Draw::BodyPart);
        if defender.is_player {
            pick_weighted(player_weights(height), roll)
                .ok_or(CombatError::EmptyBodyPartTable(Quadrant::from_height(height).bits()))
        } else {
            let quadrant = Quadrant::of_attack(height, ctx.relative_angle);
            self.body_tables.select(defender.creature_type, quadrant, roll)
        }
    }
}

/// Effective armor level on a body part after type mods and armor ignore.
fn armor_level(defender: &Combatant, part: BodyPart, damage_type: DamageType, ignore: f32) -> f32 {
    if defender.is_player {
        defender
            .equipment
            .armor
            .iter()
            .filter(|piece| piece.covers(part))
            .map(|piece| piece.armor_level * piece.mods.get(damage_type) * ignore)
            .sum()
    } else {
        defender
            .body
            .get(&part)
            .map_or(0.0, |p| p.armor_level * p.mods.get(damage_type) * ignore)
    }
}
