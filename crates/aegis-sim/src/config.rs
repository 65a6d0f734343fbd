//! Scenario configuration.
//!
//! A scenario bundles the combat tuning, the run parameters and both
//! combatant profiles. It is loaded from and saved to TOML.

use std::fs;
use std::path::Path;

use aegis_combat::prelude::*;
use aegis_common::{AegisResult, ConfigError, ItemId, Position};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Default scenario file name.
pub const CONFIG_FILE: &str = "aegis.toml";

/// Simulation scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    // === Run Settings ===
    /// Number of attacks to resolve
    pub trials: u32,
    /// Seed of the shared generator
    pub seed: u64,
    /// Attack height
    pub height: AttackHeight,
    /// Power (melee) or accuracy (missile) level, 0.0 - 1.0
    pub power_level: f32,
    /// Resolve every attack as a secondary cleave hit
    pub cleave: bool,
    /// Ammunition fired when the attacker is in missile mode
    pub ammo: Option<Weapon>,

    // === Combat Tuning ===
    /// Pipeline constants
    pub combat: CombatConfig,

    // === Combatants ===
    /// Attacking combatant
    pub attacker: Combatant,
    /// Defending combatant
    pub defender: Combatant,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            // Run
            trials: 1000,
            seed: 0xAE61,
            height: AttackHeight::Medium,
            power_level: 0.5,
            cleave: false,
            ammo: None,

            // Combat
            combat: CombatConfig::default(),

            // Combatants
            attacker: default_attacker(),
            defender: default_defender(),
        }
    }
}

fn default_attacker() -> Combatant {
    let longsword = Weapon::new(ItemId::new(1), "Longsword", WeaponKind::Sword)
        .with_damage(40.0, 0.45, DamageType::Slash)
        .with_critical(0.10, 0.5);

    Combatant::player("Swordsman")
        .with_level(50)
        .with_attributes(150.0, 100.0)
        .with_skill(Skill::Sword, 300.0, Training::Specialized)
        .with_skill(Skill::Recklessness, 200.0, Training::Trained)
        .with_melee(longsword)
        .with_rating(Rating::Damage, 20.0)
        .with_position(Position::new(1.0, 0.0))
}

fn default_defender() -> Combatant {
    let bite = AttackPart {
        part: BodyPart::Head,
        max_damage: 18.0,
        variance: 0.4,
        damage_type: Some(DamageType::Pierce),
    };

    Combatant::creature("Drudge Skulker", CreatureType::Drudge)
        .with_level(40)
        .with_skill(Skill::MeleeDefense, 250.0, Training::Trained)
        .with_body_part(BodyPart::Head, 60.0)
        .with_body_part(BodyPart::Chest, 80.0)
        .with_body_part(BodyPart::Abdomen, 80.0)
        .with_body_part(BodyPart::UpperArm, 60.0)
        .with_body_part(BodyPart::LowerArm, 60.0)
        .with_body_part(BodyPart::Hand, 40.0)
        .with_body_part(BodyPart::UpperLeg, 60.0)
        .with_body_part(BodyPart::LowerLeg, 50.0)
        .with_body_part(BodyPart::Foot, 40.0)
        .with_attack_part(bite)
}

impl SimConfig {
    /// Load a scenario from a specific path.
    /// Returns the default scenario if the file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Scenario file not found, using defaults");
            return Self::default();
        }

        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!("Failed to read scenario file: {e}");
                return Self::default();
            },
        };

        match Self::parse(&contents) {
            Ok(config) => {
                info!("Loaded scenario from {}", path.display());
                config
            },
            Err(e) => {
                warn!("Failed to parse scenario file: {e}");
                Self::default()
            },
        }
    }

    /// Parse a scenario from TOML text and validate it.
    pub fn parse(contents: &str) -> AegisResult<Self> {
        let mut config: Self = toml::from_str(contents).map_err(ConfigError::from)?;
        if config.trials == 0 {
            return Err(ConfigError::InvalidValue {
                field: "trials".to_string(),
                reason: "at least one attack is needed".to_string(),
            }
            .into());
        }
        config.validate();
        Ok(config)
    }

    /// Save the scenario to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> AegisResult<()> {
        let path = path.as_ref();

        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self).map_err(ConfigError::from)?;
        fs::write(path, contents)?;

        info!("Saved scenario to {}", path.display());
        Ok(())
    }

    /// Validate and clamp values to sensible ranges.
    pub fn validate(&mut self) {
        self.trials = self.trials.clamp(1, 10_000_000);
        self.power_level = self.power_level.clamp(0.0, 1.0);
        self.combat.validate();
    }

    /// Damage source of every attack in the run.
    #[must_use]
    pub fn damage_source(&self) -> DamageSource {
        if self.attacker.combat_mode == CombatMode::Missile {
            DamageSource::Projectile(Projectile {
                launcher: None,
                ammo: self.ammo.clone(),
            })
        } else if self.attacker.equipment.melee.is_some() {
            DamageSource::Weapon
        } else {
            DamageSource::Attacker
        }
    }

    /// Per-attack options of the run.
    #[must_use]
    pub fn attack_options(&self) -> AttackOptions {
        let options = AttackOptions::new(self.height, self.power_level);
        if self.cleave {
            options.cleave()
        } else {
            options
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = SimConfig::default();
        assert_eq!(config.trials, 1000);
        assert_eq!(config.height, AttackHeight::Medium);
        assert!(config.attacker.is_player);
        assert!(!config.defender.is_player);
        assert_eq!(config.damage_source(), DamageSource::Weapon);
    }

    #[test]
    fn test_config_validation() {
        let mut config = SimConfig::default();
        config.power_level = 3.0;
        config.combat.glancing_mod = -1.0;

        config.validate();

        assert_eq!(config.power_level, 1.0);
        assert_eq!(config.combat.glancing_mod, 0.0);
    }

    #[test]
    fn test_config_save_load() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("scenarios").join("duel.toml");

        let mut config = SimConfig::default();
        config.trials = 250;
        config.seed = 99;
        config.height = AttackHeight::High;
        config.combat.riposte_range = 5.0;

        config.save_to(&config_path).expect("Failed to save scenario");

        let loaded = SimConfig::load_from(&config_path);
        assert_eq!(loaded.trials, 250);
        assert_eq!(loaded.seed, 99);
        assert_eq!(loaded.height, AttackHeight::High);
        assert_eq!(loaded.combat.riposte_range, 5.0);
        assert_eq!(loaded.attacker.name, "Swordsman");
        assert_eq!(loaded.attacker.skills.current(Skill::Sword), 300.0);
        assert_eq!(loaded.defender.creature_type, CreatureType::Drudge);
    }

    #[test]
    fn test_config_load_missing_file() {
        let config = SimConfig::load_from("/nonexistent/path/aegis.toml");
        assert_eq!(config.trials, 1000);
    }

    #[test]
    fn test_parse_partial_scenario() {
        let config = SimConfig::parse("trials = 10\nseed = 3\n").expect("Failed to parse");
        assert_eq!(config.trials, 10);
        assert_eq!(config.seed, 3);
        assert_eq!(config.combat, CombatConfig::default());
    }

    #[test]
    fn test_parse_rejects_zero_trials() {
        assert!(SimConfig::parse("trials = 0\n").is_err());
    }

    #[test]
    fn test_missile_source_uses_ammo() {
        let bow = Weapon::new(ItemId::new(5), "Yumi", WeaponKind::Bow);
        let arrow = Weapon::new(ItemId::new(6), "Arrow", WeaponKind::Bow);
        let mut config = SimConfig::default();
        config.attacker = Combatant::player("Archer").with_launcher(bow);
        config.ammo = Some(arrow.clone());

        match config.damage_source() {
            DamageSource::Projectile(projectile) => assert_eq!(projectile.ammo, Some(arrow)),
            other => panic!("expected a projectile, got {other:?}"),
        }
    }
}
