//! Combatant profiles.
//!
//! A [`Combatant`] is the view of an attacker or defender the pipeline reads
//! from and writes side effects to (vitals, stacks, damage history).

use ahash::AHashMap;
use aegis_common::{EntityId, Position};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ability::{AbilityWindows, CombatAbility};
use crate::body::{BodyPart, CreatureType};
use crate::equipment::{
    ArmorMods, ArmorPiece, DamageType, Equipment, Jewel, Offhand, TrinketId, Weapon,
};
use crate::skills::{Skill, Skills, Training};

/// Stance a combatant is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CombatMode {
    /// Peaceful; cannot evade or block.
    NonCombat,
    /// Melee stance.
    #[default]
    Melee,
    /// Missile stance.
    Missile,
}

/// Primary attributes feeding the damage roll.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Attributes {
    /// Melee damage attribute.
    pub strength: f32,
    /// Missile damage attribute.
    pub coordination: f32,
}

impl Default for Attributes {
    fn default() -> Self {
        Self {
            strength: 10.0,
            coordination: 10.0,
        }
    }
}

/// Gear rating categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rating {
    /// Outgoing damage.
    Damage,
    /// Incoming damage reduction.
    DamageResist,
    /// Outgoing critical damage.
    CritDamage,
    /// Incoming critical damage reduction.
    CritDamageResist,
    /// Outgoing damage against players.
    PkDamage,
    /// Incoming damage reduction from players.
    PkDamageResist,
    /// Outgoing elemental damage.
    ElementalDamage,
    /// Incoming damage increase.
    SelfHarm,
    /// Damage taken increase as health drops.
    RedFury,
    /// Damage taken increase as stamina drops.
    YellowFury,
}

/// Summed gear ratings by category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ratings {
    values: AHashMap<Rating, f32>,
}

impl Ratings {
    /// Rating sum for a category, 0 when unset.
    #[must_use]
    pub fn get(&self, rating: Rating) -> f32 {
        self.values.get(&rating).copied().unwrap_or(0.0)
    }

    /// Sets a rating sum.
    pub fn set(&mut self, rating: Rating, value: f32) {
        self.values.insert(rating, value);
    }
}

/// Resistance multipliers by damage type (1.0 when unset, lower resists).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resistances {
    values: AHashMap<DamageType, f32>,
}

impl Resistances {
    /// Multiplier for a damage type.
    #[must_use]
    pub fn get(&self, damage_type: DamageType) -> f32 {
        self.values.get(&damage_type).copied().unwrap_or(1.0)
    }

    /// Sets the multiplier for a damage type.
    pub fn set(&mut self, damage_type: DamageType, value: f32) {
        self.values.insert(damage_type, value);
    }
}

/// Ward levels by damage type (0 when unset).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Wards {
    values: AHashMap<DamageType, f32>,
}

impl Wards {
    /// Ward level for a damage type.
    #[must_use]
    pub fn get(&self, damage_type: DamageType) -> f32 {
        self.values.get(&damage_type).copied().unwrap_or(0.0)
    }

    /// Sets the ward level for a damage type.
    pub fn set(&mut self, damage_type: DamageType, value: f32) {
        self.values.insert(damage_type, value.max(0.0));
    }
}

/// Health, stamina and mana.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vitals {
    /// Current health.
    pub health: f32,
    /// Maximum health.
    pub max_health: f32,
    /// Current stamina.
    pub stamina: f32,
    /// Maximum stamina.
    pub max_stamina: f32,
    /// Current mana.
    pub mana: f32,
    /// Maximum mana.
    pub max_mana: f32,
}

impl Default for Vitals {
    fn default() -> Self {
        Self::full(100.0, 100.0, 100.0)
    }
}

impl Vitals {
    /// Full vitals with the given maxima.
    #[must_use]
    pub const fn full(health: f32, stamina: f32, mana: f32) -> Self {
        Self {
            health,
            max_health: health,
            stamina,
            max_stamina: stamina,
            mana,
            max_mana: mana,
        }
    }

    /// Missing health as a fraction of the maximum.
    #[must_use]
    pub fn missing_health_fraction(&self) -> f32 {
        missing_fraction(self.health, self.max_health)
    }

    /// Missing stamina as a fraction of the maximum.
    #[must_use]
    pub fn missing_stamina_fraction(&self) -> f32 {
        missing_fraction(self.stamina, self.max_stamina)
    }
}

fn missing_fraction(current: f32, max: f32) -> f32 {
    if max <= 0.0 {
        return 0.0;
    }
    (1.0 - current / max).clamp(0.0, 1.0)
}

/// Armor on one body part of a creature.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreaturePart {
    /// Natural armor level.
    pub armor_level: f32,
    /// Per-type armor modifiers.
    #[serde(default)]
    pub mods: ArmorMods,
}

/// A natural attack of a creature (claw, bite, kick).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackPart {
    /// Body part the attack is made with.
    pub part: BodyPart,
    /// Maximum damage.
    pub max_damage: f32,
    /// Damage variance.
    pub variance: f32,
    /// Damage type; `None` if unresolved.
    pub damage_type: Option<DamageType>,
}

/// Why a combatant took damage outside the main attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DamageKind {
    /// A resolved attack.
    Attack,
    /// A parry counter-attack.
    Riposte,
    /// Reflected block damage.
    Thorns,
    /// Fury backlash.
    SelfInflicted,
    /// An on-hit proc.
    Proc,
}

/// One entry of a combatant's damage history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DamageRecord {
    /// Who dealt the damage.
    pub source: EntityId,
    /// Amount applied.
    pub amount: f32,
    /// How it was dealt.
    pub kind: DamageKind,
}

/// A participant in combat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Combatant {
    /// Entity identifier.
    pub id: EntityId,
    /// Display name.
    pub name: String,
    /// Player-controlled.
    pub is_player: bool,
    /// Non-combat placeholder that never takes damage.
    pub placeholder: bool,
    /// Character or creature level.
    pub level: u32,
    /// Creature family (hit-location table, slayer matching).
    pub creature_type: CreatureType,
    /// Location and heading.
    pub position: Position,
    /// Current stance.
    pub combat_mode: CombatMode,
    /// Primary attributes.
    pub attributes: Attributes,
    /// Skills.
    pub skills: Skills,
    /// Equipped items.
    pub equipment: Equipment,
    /// Ability activation windows.
    pub abilities: AbilityWindows,
    /// Gear rating sums.
    pub ratings: Ratings,
    /// Resistance multipliers.
    pub resistances: Resistances,
    /// Ward levels.
    pub wards: Wards,
    /// Vitals.
    pub vitals: Vitals,
    /// Natural armor per body part (creatures).
    pub body: AHashMap<BodyPart, CreaturePart>,
    /// Natural attacks (creatures).
    pub attack_parts: Vec<AttackPart>,
    /// Chance to overpower the defender's evasion (creatures).
    pub overpower_chance: f32,
    /// Critical defense augmentation ranks.
    pub aug_critical_defense: f32,
    /// Accumulated Fury stacks.
    pub reckless_stacks: u32,
    /// A reprisal proc is banked and will force the next critical.
    pub reprisal_banked: bool,
    /// Hidden from the defender.
    pub stealthed: bool,
    /// Recently resurrected and protected.
    pub lifestone_protection: bool,
    /// Immune to all damage.
    pub invincible: bool,
    /// Damage taken outside the main attack, oldest first.
    pub damage_history: Vec<DamageRecord>,
}

impl Default for Combatant {
    fn default() -> Self {
        Self {
            id: EntityId::new(),
            name: String::from("Combatant"),
            is_player: false,
            placeholder: false,
            level: 1,
            creature_type: CreatureType::Human,
            position: Position::default(),
            combat_mode: CombatMode::Melee,
            attributes: Attributes::default(),
            skills: Skills::new(),
            equipment: Equipment::default(),
            abilities: AbilityWindows::new(),
            ratings: Ratings::default(),
            resistances: Resistances::default(),
            wards: Wards::default(),
            vitals: Vitals::default(),
            body: AHashMap::new(),
            attack_parts: Vec::new(),
            overpower_chance: 0.0,
            aug_critical_defense: 0.0,
            reckless_stacks: 0,
            reprisal_banked: false,
            stealthed: false,
            lifestone_protection: false,
            invincible: false,
            damage_history: Vec::new(),
        }
    }
}

impl Combatant {
    /// Creates a player combatant.
    #[must_use]
    pub fn player(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_player: true,
            ..Self::default()
        }
    }

    /// Creates a creature combatant.
    #[must_use]
    pub fn creature(name: impl Into<String>, creature_type: CreatureType) -> Self {
        Self {
            name: name.into(),
            creature_type,
            ..Self::default()
        }
    }

    /// Sets the level.
    #[must_use]
    pub fn with_level(mut self, level: u32) -> Self {
        self.level = level;
        self
    }

    /// Sets the position.
    #[must_use]
    pub fn with_position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    /// Sets the combat mode.
    #[must_use]
    pub fn with_combat_mode(mut self, mode: CombatMode) -> Self {
        self.combat_mode = mode;
        self
    }

    /// Sets the attributes.
    #[must_use]
    pub fn with_attributes(mut self, strength: f32, coordination: f32) -> Self {
        self.attributes = Attributes {
            strength,
            coordination,
        };
        self
    }

    /// Sets a skill.
    #[must_use]
    pub fn with_skill(mut self, skill: Skill, current: f32, training: Training) -> Self {
        self.skills.set(skill, current, training);
        self
    }

    /// Equips a melee weapon.
    #[must_use]
    pub fn with_melee(mut self, weapon: Weapon) -> Self {
        self.equipment.melee = Some(weapon);
        self
    }

    /// Equips an off-hand weapon or shield.
    #[must_use]
    pub fn with_offhand(mut self, offhand: Offhand) -> Self {
        self.equipment.offhand = Some(offhand);
        self
    }

    /// Equips a missile launcher.
    #[must_use]
    pub fn with_launcher(mut self, launcher: Weapon) -> Self {
        self.equipment.launcher = Some(launcher);
        self.combat_mode = CombatMode::Missile;
        self
    }

    /// Adds a layer of armor.
    #[must_use]
    pub fn with_armor(mut self, piece: ArmorPiece) -> Self {
        self.equipment.armor.push(piece);
        self
    }

    /// Equips a combat focus granting an ability.
    #[must_use]
    pub fn with_focus(mut self, ability: CombatAbility) -> Self {
        self.equipment.combat_focus = Some(ability);
        self
    }

    /// Equips a sigil trinket.
    #[must_use]
    pub fn with_trinket(mut self, trinket: TrinketId) -> Self {
        self.equipment.trinkets.push(trinket);
        self
    }

    /// Socketed jewel rating and ramp progress.
    #[must_use]
    pub fn with_jewel(mut self, jewel: Jewel, rating: f32, progress: f32) -> Self {
        self.equipment.jewels.set(jewel, rating, progress);
        self
    }

    /// Sets a gear rating sum.
    #[must_use]
    pub fn with_rating(mut self, rating: Rating, value: f32) -> Self {
        self.ratings.set(rating, value);
        self
    }

    /// Sets a resistance multiplier.
    #[must_use]
    pub fn with_resistance(mut self, damage_type: DamageType, value: f32) -> Self {
        self.resistances.set(damage_type, value);
        self
    }

    /// Sets a ward level.
    #[must_use]
    pub fn with_ward(mut self, damage_type: DamageType, level: f32) -> Self {
        self.wards.set(damage_type, level);
        self
    }

    /// Sets the vitals.
    #[must_use]
    pub fn with_vitals(mut self, vitals: Vitals) -> Self {
        self.vitals = vitals;
        self
    }

    /// Sets natural armor on a body part.
    #[must_use]
    pub fn with_body_part(mut self, part: BodyPart, armor_level: f32) -> Self {
        self.body.insert(
            part,
            CreaturePart {
                armor_level,
                mods: ArmorMods::new(),
            },
        );
        self
    }

    /// Adds a natural attack.
    #[must_use]
    pub fn with_attack_part(mut self, attack: AttackPart) -> Self {
        self.attack_parts.push(attack);
        self
    }

    /// Ability granted by the equipped combat focus.
    #[must_use]
    pub fn combat_ability(&self) -> Option<CombatAbility> {
        self.equipment.combat_focus
    }

    /// Whether `ability` is the selected ability and its window is open.
    #[must_use]
    pub fn is_ability_active(&self, ability: CombatAbility, now: f64) -> bool {
        self.combat_ability() == Some(ability) && self.abilities.is_active(ability, now)
    }

    /// Opens an ability window.
    pub fn activate(&mut self, ability: CombatAbility, now: f64, duration: f64) {
        self.abilities.activate(ability, now, duration);
    }

    /// Distance to another combatant.
    #[must_use]
    pub fn distance_to(&self, other: &Combatant) -> f32 {
        self.position.distance_to(&other.position)
    }

    /// Whether the combatant has no health left.
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.vitals.health <= 0.0
    }

    /// Lowers health, records the hit and returns `true` if this killed the
    /// combatant.
    pub fn apply_damage(&mut self, source: EntityId, amount: f32, kind: DamageKind) -> bool {
        let amount = amount.max(0.0);
        let was_alive = !self.is_dead();
        self.vitals.health = (self.vitals.health - amount).max(0.0);
        self.damage_history.push(DamageRecord {
            source,
            amount,
            kind,
        });

        let killed = was_alive && self.is_dead();
        if killed {
            debug!("{} ({}) killed by {} via {:?}", self.name, self.id, source, kind);
        }
        killed
    }

    /// Restores health up to the maximum.
    pub fn heal(&mut self, amount: f32) {
        self.vitals.health = (self.vitals.health + amount.max(0.0)).min(self.vitals.max_health);
    }

    /// Restores stamina up to the maximum.
    pub fn restore_stamina(&mut self, amount: f32) {
        self.vitals.stamina = (self.vitals.stamina + amount.max(0.0)).min(self.vitals.max_stamina);
    }
}
