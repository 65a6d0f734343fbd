//! Body parts and weighted hit-location tables.

use std::ops::BitOr;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{CombatError, CombatResult};

/// A hit location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BodyPart {
    /// Head.
    Head,
    /// Chest.
    Chest,
    /// Abdomen.
    Abdomen,
    /// Upper arm.
    UpperArm,
    /// Lower arm.
    LowerArm,
    /// Hand.
    Hand,
    /// Upper leg.
    UpperLeg,
    /// Lower leg.
    LowerLeg,
    /// Foot.
    Foot,
}

/// Height an attack is aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AttackHeight {
    /// High.
    High,
    /// Medium.
    #[default]
    Medium,
    /// Low.
    Low,
}

/// Creature families with their own hit-location tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CreatureType {
    /// Humans (players and humanoid NPCs).
    #[default]
    Human,
    /// Drudges.
    Drudge,
    /// Olthoi.
    Olthoi,
    /// Tuskers.
    Tusker,
    /// Undead.
    Undead,
    /// Golems.
    Golem,
    /// Banderlings.
    Banderling,
    /// Mosswarts.
    Mosswart,
}

/// Height bits OR'd with direction bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Quadrant(u8);

impl Quadrant {
    /// High attack.
    pub const HIGH: Self = Self(0x01);
    /// Medium attack.
    pub const MEDIUM: Self = Self(0x02);
    /// Low attack.
    pub const LOW: Self = Self(0x04);
    /// Attacker in front.
    pub const FRONT: Self = Self(0x08);
    /// Attacker on the right.
    pub const RIGHT: Self = Self(0x10);
    /// Attacker behind.
    pub const BACK: Self = Self(0x20);
    /// Attacker on the left.
    pub const LEFT: Self = Self(0x40);

    /// Height bits for an attack height.
    #[must_use]
    pub const fn from_height(height: AttackHeight) -> Self {
        match height {
            AttackHeight::High => Self::HIGH,
            AttackHeight::Medium => Self::MEDIUM,
            AttackHeight::Low => Self::LOW,
        }
    }

    /// Direction bits for the attacker's angle relative to the defender's
    /// heading, in degrees (positive is counter-clockwise).
    #[must_use]
    pub fn from_relative_angle(angle: f32) -> Self {
        let abs = angle.abs();
        if abs <= 45.0 {
            Self::FRONT
        } else if abs >= 135.0 {
            Self::BACK
        } else if angle > 0.0 {
            Self::LEFT
        } else {
            Self::RIGHT
        }
    }

    /// Full quadrant of an attack.
    #[must_use]
    pub fn of_attack(height: AttackHeight, relative_angle: f32) -> Self {
        Self::from_height(height) | Self::from_relative_angle(relative_angle)
    }

    /// Raw bits.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }
}

impl BitOr for Quadrant {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

const PLAYER_HIGH: &[(BodyPart, f32)] = &[
    (BodyPart::Head, 0.33),
    (BodyPart::Chest, 0.33),
    (BodyPart::UpperArm, 0.34),
];

const PLAYER_MEDIUM: &[(BodyPart, f32)] = &[
    (BodyPart::Chest, 0.2),
    (BodyPart::Abdomen, 0.2),
    (BodyPart::UpperArm, 0.1),
    (BodyPart::LowerArm, 0.15),
    (BodyPart::Hand, 0.15),
    (BodyPart::UpperLeg, 0.2),
];

const PLAYER_LOW: &[(BodyPart, f32)] = &[
    (BodyPart::Abdomen, 0.1),
    (BodyPart::UpperLeg, 0.3),
    (BodyPart::LowerLeg, 0.4),
    (BodyPart::Foot, 0.2),
];

const QUADRUPED_HIGH: &[(BodyPart, f32)] = &[(BodyPart::Head, 0.6), (BodyPart::Chest, 0.4)];

const QUADRUPED_MEDIUM: &[(BodyPart, f32)] = &[
    (BodyPart::Chest, 0.3),
    (BodyPart::Abdomen, 0.4),
    (BodyPart::UpperLeg, 0.3),
];

const QUADRUPED_LOW: &[(BodyPart, f32)] = &[
    (BodyPart::UpperLeg, 0.2),
    (BodyPart::LowerLeg, 0.5),
    (BodyPart::Foot, 0.3),
];

/// Player hit-location weights for an attack height.
#[must_use]
pub fn player_weights(height: AttackHeight) -> &'static [(BodyPart, f32)] {
    match height {
        AttackHeight::High => PLAYER_HIGH,
        AttackHeight::Medium => PLAYER_MEDIUM,
        AttackHeight::Low => PLAYER_LOW,
    }
}

/// Picks an entry from a weighted list with a uniform `roll` in `[0, 1)`.
///
/// Returns `None` if the weights sum to zero.
#[must_use]
pub fn pick_weighted(weights: &[(BodyPart, f32)], roll: f32) -> Option<BodyPart> {
    let total: f32 = weights.iter().map(|(_, w)| w.max(0.0)).sum();
    if total <= 0.0 {
        return None;
    }
    let target = roll.clamp(0.0, 1.0) * total;
    let mut cumulative = 0.0;
    for (part, weight) in weights {
        cumulative += weight.max(0.0);
        if target < cumulative {
            return Some(*part);
        }
    }
    weights
        .iter()
        .rev()
        .find(|(_, w)| *w > 0.0)
        .map(|(part, _)| *part)
}

/// Hit-location weights of one creature type, keyed by quadrant.
#[derive(Debug, Clone, Default)]
pub struct BodyPartTable {
    quadrants: AHashMap<Quadrant, Vec<(BodyPart, f32)>>,
}

impl BodyPartTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the weights for a quadrant (builder pattern).
    #[must_use]
    pub fn with(mut self, quadrant: Quadrant, weights: &[(BodyPart, f32)]) -> Self {
        self.quadrants.insert(quadrant, weights.to_vec());
        self
    }

    /// Table using the same weights for every direction at each height.
    #[must_use]
    pub fn uniform_directions(
        high: &[(BodyPart, f32)],
        medium: &[(BodyPart, f32)],
        low: &[(BodyPart, f32)],
    ) -> Self {
        let directions = [Quadrant::FRONT, Quadrant::RIGHT, Quadrant::BACK, Quadrant::LEFT];
        let mut table = Self::new();
        for direction in directions {
            table = table
                .with(Quadrant::HIGH | direction, high)
                .with(Quadrant::MEDIUM | direction, medium)
                .with(Quadrant::LOW | direction, low);
        }
        table
    }

    /// Humanoid table.
    #[must_use]
    pub fn humanoid() -> Self {
        Self::uniform_directions(PLAYER_HIGH, PLAYER_MEDIUM, PLAYER_LOW)
    }

    /// Four-legged table.
    #[must_use]
    pub fn quadruped() -> Self {
        Self::uniform_directions(QUADRUPED_HIGH, QUADRUPED_MEDIUM, QUADRUPED_LOW)
    }

    /// Picks a body part for a quadrant.
    pub fn select(&self, quadrant: Quadrant, roll: f32) -> CombatResult<BodyPart> {
        let weights = self
            .quadrants
            .get(&quadrant)
            .ok_or(CombatError::EmptyBodyPartTable(quadrant.bits()))?;
        pick_weighted(weights, roll).ok_or(CombatError::EmptyBodyPartTable(quadrant.bits()))
    }
}

/// Hit-location tables for every known creature type.
#[derive(Debug, Clone, Default)]
pub struct BodyPartTables {
    tables: AHashMap<CreatureType, BodyPartTable>,
}

impl BodyPartTables {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the stock tables for every creature type.
    #[must_use]
    pub fn standard() -> Self {
        let mut tables = Self::new();
        for creature in [
            CreatureType::Human,
            CreatureType::Drudge,
            CreatureType::Undead,
            CreatureType::Golem,
            CreatureType::Banderling,
            CreatureType::Mosswart,
        ] {
            tables.register(creature, BodyPartTable::humanoid());
        }
        tables.register(CreatureType::Olthoi, BodyPartTable::quadruped());
        tables.register(CreatureType::Tusker, BodyPartTable::quadruped());
        tables
    }

    /// Registers (or replaces) a creature table.
    pub fn register(&mut self, creature: CreatureType, table: BodyPartTable) {
        self.tables.insert(creature, table);
    }

    /// Picks a body part for a creature type and quadrant.
    pub fn select(
        &self,
        creature: CreatureType,
        quadrant: Quadrant,
        roll: f32,
    ) -> CombatResult<BodyPart> {
        self.tables
            .get(&creature)
            .ok_or(CombatError::MissingBodyPartTable(creature))?
            .select(quadrant, roll)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quadrant_directions() {
        assert_eq!(Quadrant::from_relative_angle(10.0), Quadrant::FRONT);
        assert_eq!(Quadrant::from_relative_angle(90.0), Quadrant::LEFT);
        assert_eq!(Quadrant::from_relative_angle(-90.0), Quadrant::RIGHT);
        assert_eq!(Quadrant::from_relative_angle(180.0), Quadrant::BACK);
        assert_eq!(
            Quadrant::of_attack(AttackHeight::Low, 170.0).bits(),
            Quadrant::LOW.bits() | Quadrant::BACK.bits()
        );
    }

    #[test]
    fn test_pick_weighted() {
        let weights = player_weights(AttackHeight::High);
        assert_eq!(pick_weighted(weights, 0.0), Some(BodyPart::Head));
        assert_eq!(pick_weighted(weights, 0.5), Some(BodyPart::Chest));
        assert_eq!(pick_weighted(weights, 0.999), Some(BodyPart::UpperArm));
        assert_eq!(pick_weighted(&[(BodyPart::Head, 0.0)], 0.5), None);
    }

    #[test]
    fn test_missing_table_is_an_error() {
        let tables = BodyPartTables::new();
        let quadrant = Quadrant::of_attack(AttackHeight::Medium, 0.0);
        assert!(matches!(
            tables.select(CreatureType::Drudge, quadrant, 0.5),
            Err(CombatError::MissingBodyPartTable(CreatureType::Drudge))
        ));
    }

    #[test]
    fn test_standard_tables_cover_every_quadrant() {
        let tables = BodyPartTables::standard();
        for height in [AttackHeight::High, AttackHeight::Medium, AttackHeight::Low] {
            for angle in [0.0, 90.0, -90.0, 180.0] {
                let quadrant = Quadrant::of_attack(height, angle);
                assert!(tables.select(CreatureType::Olthoi, quadrant, 0.3).is_ok());
            }
        }
    }
}
