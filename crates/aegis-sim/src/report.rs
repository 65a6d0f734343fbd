//! Runs a scenario and tallies the outcomes.

use std::fmt;

use aegis_combat::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::SimConfig;

/// Outcome counts and damage totals of one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Report {
    /// Attacks resolved
    pub trials: u32,
    /// Attacks against an invulnerable defender
    pub invulnerable: u32,
    /// Fully evaded attacks
    pub evaded: u32,
    /// Glancing blows
    pub glancing: u32,
    /// Blocked attacks
    pub blocked: u32,
    /// Landed hits
    pub hits: u32,
    /// Critical hits
    pub criticals: u32,
    /// Criticals turned into normal hits
    pub criticals_defended: u32,
    /// Hits that failed to resolve
    pub general_failures: u32,
    /// Sum of final damage over landed hits
    pub total_damage: f64,
    /// Largest single hit
    pub max_damage: f32,
    /// Counter-attacks launched
    pub ripostes: u32,
    /// Damage dealt by counter-attacks
    pub riposte_damage: f64,
    /// Damage reflected by thorns
    pub thorns_damage: f64,
    /// Fury backlash taken by the attacker
    pub self_damage: f64,
    /// Attacks that ended with the attacker dead
    pub attacker_deaths: u32,
    /// Attacks that ended with the defender dead
    pub defender_deaths: u32,
}

impl Report {
    /// Adds one resolved attack.
    pub fn record(&mut self, event: &DamageEvent) {
        self.trials += 1;
        match event.outcome {
            Outcome::Invulnerable => self.invulnerable += 1,
            Outcome::Evaded => self.evaded += 1,
            Outcome::Blocked => self.blocked += 1,
            Outcome::Hit => {
                if event.general_failure {
                    self.general_failures += 1;
                } else {
                    self.hits += 1;
                }
            },
        }
        if event.is_glancing() {
            self.glancing += 1;
        }
        if event.is_critical {
            self.criticals += 1;
        }
        if event.critical_defended {
            self.criticals_defended += 1;
        }
        if event.has_damage() {
            self.total_damage += f64::from(event.damage);
            self.max_damage = self.max_damage.max(event.damage);
        }
        if let Some(riposte) = &event.riposte {
            self.ripostes += 1;
            if riposte.has_damage() {
                self.riposte_damage += f64::from(riposte.damage);
            }
        }
        self.thorns_damage += f64::from(event.thorns_damage);
        self.self_damage += f64::from(event.self_damage);
        if event.attacker_killed {
            self.attacker_deaths += 1;
        }
        if event.defender_killed {
            self.defender_deaths += 1;
        }
    }

    /// Mean damage per landed hit.
    #[must_use]
    pub fn mean_damage(&self) -> f64 {
        if self.hits == 0 {
            0.0
        } else {
            self.total_damage / f64::from(self.hits)
        }
    }

    fn percent(&self, count: u32) -> f64 {
        if self.trials == 0 {
            0.0
        } else {
            100.0 * f64::from(count) / f64::from(self.trials)
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Attacks:        {}", self.trials)?;
        for (label, count) in [
            ("Invulnerable", self.invulnerable),
            ("Evaded", self.evaded),
            ("Glancing", self.glancing),
            ("Blocked", self.blocked),
            ("Hit", self.hits),
            ("Critical", self.criticals),
            ("Crit defended", self.criticals_defended),
            ("Failed", self.general_failures),
        ] {
            writeln!(f, "{label:<15} {count:>8} ({:5.1}%)", self.percent(count))?;
        }
        writeln!(f, "Mean damage:    {:.2}", self.mean_damage())?;
        writeln!(f, "Max damage:     {:.2}", self.max_damage)?;
        writeln!(
            f,
            "Ripostes:       {} ({:.1} damage)",
            self.ripostes, self.riposte_damage
        )?;
        writeln!(f, "Thorns damage:  {:.1}", self.thorns_damage)?;
        writeln!(f, "Fury backlash:  {:.1}", self.self_damage)?;
        write!(
            f,
            "Deaths:         attacker {}, defender {}",
            self.attacker_deaths, self.defender_deaths
        )
    }
}

/// Resolves every attack of a scenario on fresh copies of both combatants.
pub fn run(config: &SimConfig) -> Report {
    let pipeline = DamagePipeline::new(config.combat.clone());
    let mut rng = SharedRandom::seeded(config.seed);
    let source = config.damage_source();
    let options = config.attack_options();

    info!(
        "Running {} attacks: {} -> {} (seed {})",
        config.trials, config.attacker.name, config.defender.name, config.seed
    );

    let mut report = Report::default();
    for trial in 0..config.trials {
        let mut attacker = config.attacker.clone();
        let mut defender = config.defender.clone();
        let event = pipeline.resolve_attack(&mut attacker, &mut defender, &source, &options, 0.0, &mut rng);
        debug!("Attack {trial}: {:?} for {:.1}", event.outcome, event.damage);
        report.record(&event);
    }
    report
}
