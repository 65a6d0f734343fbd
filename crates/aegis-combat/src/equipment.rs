//! Weapons, shields, armor and the other equipment the pipeline reads.
//!
//! This module provides:
//! - Damage types and per-type armor modifiers
//! - Weapons (melee, launchers, ammunition) and their imbues
//! - Shields, layered armor pieces and the offhand slot
//! - Jewel sockets feeding the ramping bonus
//! - The per-combatant equipment loadout

use ahash::AHashMap;
use aegis_common::ItemId;
use serde::{Deserialize, Serialize};

use crate::ability::CombatAbility;
use crate::body::{BodyPart, CreatureType};
use crate::compose::{ramping_bonus, RampParams};
use crate::skills::Skill;

// ============================================================================
// Damage Types
// ============================================================================

/// Type of damage an attack deals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DamageType {
    /// Edged weapons.
    Slash,
    /// Points and arrows.
    Pierce,
    /// Blunt force.
    Bludgeon,
    /// Fire.
    Fire,
    /// Frost.
    Cold,
    /// Acid.
    Acid,
    /// Lightning.
    Electric,
    /// Void magic.
    Nether,
}

impl DamageType {
    /// Slash, pierce or bludgeon.
    #[must_use]
    pub fn is_physical(self) -> bool {
        matches!(self, Self::Slash | Self::Pierce | Self::Bludgeon)
    }
}

/// Per-damage-type multipliers on an armor level (1.0 when unset).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArmorMods {
    values: AHashMap<DamageType, f32>,
}

impl ArmorMods {
    /// Creates neutral modifiers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the modifier for a damage type (builder pattern).
    #[must_use]
    pub fn with(mut self, damage_type: DamageType, value: f32) -> Self {
        self.values.insert(damage_type, value);
        self
    }

    /// Modifier for a damage type.
    #[must_use]
    pub fn get(&self, damage_type: DamageType) -> f32 {
        self.values.get(&damage_type).copied().unwrap_or(1.0)
    }
}

// ============================================================================
// Weapons
// ============================================================================

/// Weapon family; decides the attack skill and melee vs missile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WeaponKind {
    /// Fists or natural weapons.
    #[default]
    Unarmed,
    /// Axe.
    Axe,
    /// Dagger.
    Dagger,
    /// Mace.
    Mace,
    /// Spear.
    Spear,
    /// Staff.
    Staff,
    /// Sword.
    Sword,
    /// Bow (launcher).
    Bow,
    /// Crossbow (launcher).
    Crossbow,
    /// Thrown weapon.
    Thrown,
}

impl WeaponKind {
    /// Skill used to attack with this weapon.
    #[must_use]
    pub fn skill(self) -> Skill {
        match self {
            Self::Unarmed => Skill::UnarmedCombat,
            Self::Axe => Skill::Axe,
            Self::Dagger => Skill::Dagger,
            Self::Mace => Skill::Mace,
            Self::Spear => Skill::Spear,
            Self::Staff => Skill::Staff,
            Self::Sword => Skill::Sword,
            Self::Bow => Skill::Bow,
            Self::Crossbow => Skill::Crossbow,
            Self::Thrown => Skill::ThrownWeapon,
        }
    }

    /// Bows, crossbows and thrown weapons.
    #[must_use]
    pub fn is_missile(self) -> bool {
        matches!(self, Self::Bow | Self::Crossbow | Self::Thrown)
    }

    /// Melee weapons other than bare hands.
    #[must_use]
    pub fn is_martial(self) -> bool {
        !self.is_missile() && self != Self::Unarmed
    }

    /// Weapon families whose specialization adds critical chance.
    #[must_use]
    pub fn spec_grants_crit_chance(self) -> bool {
        matches!(self, Self::Axe | Self::Dagger)
    }
}

/// Armor-defeating properties of a weapon.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Imbues {
    /// Armor rending: armor reduced by the attack skill.
    pub armor_rending: bool,
    /// Fraction of armor ignored by cleaving (0 = none).
    pub armor_cleaving: f32,
    /// Armor is ignored entirely.
    pub ignore_all_armor: bool,
    /// Minimum resistance multiplier per damage type.
    pub resistance_rending: AHashMap<DamageType, f32>,
}

/// Bonus damage against one creature type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Slayer {
    /// Creature type affected.
    pub creature: CreatureType,
    /// Damage multiplier against it.
    pub damage_mod: f32,
}

/// A weapon, launcher or piece of ammunition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Weapon {
    /// Item template.
    pub id: ItemId,
    /// Display name.
    pub name: String,
    /// Weapon family.
    pub kind: WeaponKind,
    /// Raw maximum damage.
    pub max_damage: f32,
    /// Damage variance in `[0, 1]`; min damage is `max * (1 - variance)`.
    pub variance: f32,
    /// Enchantment multiplier on the variance.
    pub variance_mod: f32,
    /// Flat damage bonus.
    pub damage_bonus: f32,
    /// Damage multiplier (launcher damage mod for missiles).
    pub damage_mod: f32,
    /// Flat elemental damage bonus.
    pub elemental_bonus: f32,
    /// Damage dealt; `None` if unresolved.
    pub damage_type: Option<DamageType>,
    /// Two-handed weapon.
    pub two_handed: bool,
    /// Base critical chance.
    pub critical_chance: f32,
    /// Additive critical damage modifier.
    pub critical_damage_mod: f32,
    /// Special ammunition effect multiplier.
    pub effect_mod: f32,
    /// Weapon must be charged with mana for its imbues to work.
    pub requires_mana: bool,
    /// Remaining mana charge.
    pub mana: f32,
    /// Armor-defeating properties.
    pub imbues: Imbues,
    /// Creature slayer property.
    pub slayer: Option<Slayer>,
}

impl Default for Weapon {
    fn default() -> Self {
        Self {
            id: ItemId::new(0),
            name: String::from("Fists"),
            kind: WeaponKind::Unarmed,
            max_damage: 0.0,
            variance: 0.0,
            variance_mod: 1.0,
            damage_bonus: 0.0,
            damage_mod: 1.0,
            elemental_bonus: 0.0,
            damage_type: Some(DamageType::Bludgeon),
            two_handed: false,
            critical_chance: 0.10,
            critical_damage_mod: 0.0,
            effect_mod: 1.0,
            requires_mana: false,
            mana: 0.0,
            imbues: Imbues::default(),
            slayer: None,
        }
    }
}

impl Weapon {
    /// Creates a weapon with default properties.
    #[must_use]
    pub fn new(id: ItemId, name: impl Into<String>, kind: WeaponKind) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            ..Self::default()
        }
    }

    /// Sets the damage envelope (builder pattern).
    #[must_use]
    pub fn with_damage(mut self, max_damage: f32, variance: f32, damage_type: DamageType) -> Self {
        self.max_damage = max_damage;
        self.variance = variance.clamp(0.0, 1.0);
        self.damage_type = Some(damage_type);
        self
    }

    /// Sets the damage multiplier.
    #[must_use]
    pub fn with_damage_mod(mut self, damage_mod: f32) -> Self {
        self.damage_mod = damage_mod;
        self
    }

    /// Marks the weapon two-handed.
    #[must_use]
    pub fn two_handed(mut self) -> Self {
        self.two_handed = true;
        self
    }

    /// Sets critical chance and critical damage modifier.
    #[must_use]
    pub fn with_critical(mut self, chance: f32, damage_mod: f32) -> Self {
        self.critical_chance = chance;
        self.critical_damage_mod = damage_mod;
        self
    }

    /// Sets the imbues.
    #[must_use]
    pub fn with_imbues(mut self, imbues: Imbues) -> Self {
        self.imbues = imbues;
        self
    }

    /// Sets the slayer property.
    #[must_use]
    pub fn with_slayer(mut self, creature: CreatureType, damage_mod: f32) -> Self {
        self.slayer = Some(Slayer {
            creature,
            damage_mod,
        });
        self
    }

    /// Whether imbues and other special properties are in effect.
    #[must_use]
    pub fn special_properties_active(&self) -> bool {
        !self.requires_mana || self.mana > 0.0
    }
}

// ============================================================================
// Shields, Armor, Offhand
// ============================================================================

/// A shield.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shield {
    /// Item template.
    pub id: ItemId,
    /// Base armor level.
    pub armor_level: f32,
    /// Per-type armor modifiers.
    #[serde(default)]
    pub mods: ArmorMods,
}

impl Shield {
    /// Creates a shield with neutral type modifiers.
    #[must_use]
    pub fn new(id: ItemId, armor_level: f32) -> Self {
        Self {
            id,
            armor_level,
            mods: ArmorMods::new(),
        }
    }
}

/// One layer of worn armor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArmorPiece {
    /// Item template.
    pub id: ItemId,
    /// Base armor level.
    pub armor_level: f32,
    /// Body parts covered.
    pub coverage: Vec<BodyPart>,
    /// Per-type armor modifiers.
    #[serde(default)]
    pub mods: ArmorMods,
}

impl ArmorPiece {
    /// Creates an armor piece.
    #[must_use]
    pub fn new(id: ItemId, armor_level: f32, coverage: impl Into<Vec<BodyPart>>) -> Self {
        Self {
            id,
            armor_level,
            coverage: coverage.into(),
            mods: ArmorMods::new(),
        }
    }

    /// Whether this piece covers a body part.
    #[must_use]
    pub fn covers(&self, part: BodyPart) -> bool {
        self.coverage.contains(&part)
    }
}

/// What is held in the off hand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Offhand {
    /// A second weapon (dual wield).
    Weapon(Weapon),
    /// A shield.
    Shield(Shield),
}

// ============================================================================
// Jewels
// ============================================================================

/// Jewel kinds whose bonuses ramp with accumulated progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Jewel {
    /// Attack skill bonus.
    Bravado,
    /// Defense skill bonus.
    Familiarity,
    /// Block chance bonus.
    GearBlock,
    /// Critical damage bonus.
    Bludgeon,
    /// Fraction of blocked damage reflected.
    Thorns,
}

impl Jewel {
    /// Ramp parameters of this jewel.
    #[must_use]
    pub const fn ramp(self) -> RampParams {
        match self {
            Self::Bravado | Self::Familiarity => RampParams::new(0.02, 0.005, 100.0),
            Self::GearBlock => RampParams::new(0.05, 0.01, 100.0),
            Self::Bludgeon => RampParams::new(0.05, 0.01, 100.0),
            Self::Thorns => RampParams::new(0.05, 0.02, 100.0),
        }
    }
}

/// Socketed jewel rating plus ramp progress.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct JewelSocket {
    /// Summed rating of this jewel kind.
    pub rating: f32,
    /// Accumulated ramp progress.
    pub progress: f32,
}

/// Jewel sockets of a loadout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Jewels {
    sockets: AHashMap<Jewel, JewelSocket>,
}

impl Jewels {
    /// Creates empty sockets.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a socket (builder pattern).
    #[must_use]
    pub fn with(mut self, jewel: Jewel, rating: f32, progress: f32) -> Self {
        self.set(jewel, rating, progress);
        self
    }

    /// Sets a socket.
    pub fn set(&mut self, jewel: Jewel, rating: f32, progress: f32) {
        self.sockets.insert(jewel, JewelSocket { rating, progress });
    }

    /// Socket for a jewel kind.
    #[must_use]
    pub fn socket(&self, jewel: Jewel) -> JewelSocket {
        self.sockets.get(&jewel).copied().unwrap_or_default()
    }

    /// Ramping bonus fraction granted by a jewel kind.
    #[must_use]
    pub fn bonus(&self, jewel: Jewel) -> f32 {
        let socket = self.socket(jewel);
        ramping_bonus(jewel.ramp(), socket.rating, socket.progress)
    }

    /// Bonus fraction of a jewel kind from its rating alone, as if fully
    /// ramped.
    #[must_use]
    pub fn rated_bonus(&self, jewel: Jewel) -> f32 {
        let params = jewel.ramp();
        ramping_bonus(params, self.socket(jewel).rating, params.ramp_cap)
    }
}

// ============================================================================
// Loadout
// ============================================================================

/// Identifier of an equipped sigil trinket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrinketId(pub u32);

/// Everything a combatant has equipped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Equipment {
    /// Melee weapon in the main hand.
    pub melee: Option<Weapon>,
    /// Off-hand weapon or shield.
    pub offhand: Option<Offhand>,
    /// Missile launcher.
    pub launcher: Option<Weapon>,
    /// Layered armor.
    pub armor: Vec<ArmorPiece>,
    /// Ability granted by the equipped combat focus.
    pub combat_focus: Option<CombatAbility>,
    /// Equipped sigil trinkets.
    pub trinkets: Vec<TrinketId>,
    /// Jewel sockets.
    pub jewels: Jewels,
}

impl Equipment {
    /// Equipped shield, if any.
    #[must_use]
    pub fn shield(&self) -> Option<&Shield> {
        match &self.offhand {
            Some(Offhand::Shield(shield)) => Some(shield),
            _ => None,
        }
    }

    /// Off-hand weapon, if dual wielding.
    #[must_use]
    pub fn offhand_weapon(&self) -> Option<&Weapon> {
        match &self.offhand {
            Some(Offhand::Weapon(weapon)) => Some(weapon),
            _ => None,
        }
    }

    /// A weapon in each hand.
    #[must_use]
    pub fn is_dual_wielding(&self) -> bool {
        self.melee.is_some() && self.offhand_weapon().is_some()
    }

    /// Main-hand weapon is two-handed.
    #[must_use]
    pub fn is_two_handed(&self) -> bool {
        self.melee.as_ref().is_some_and(|w| w.two_handed)
    }
}
