//! The damage pipeline orchestrator.
//!
//! One call to [`DamagePipeline::resolve_attack`] runs, in order: context
//! resolution, the outcome gate, the damage roll, mitigation and the reactive
//! effects of a landed hit. Stage implementations live in their own modules
//! as further `impl DamagePipeline` blocks.

use tracing::{debug, error, trace};

use crate::body::BodyPartTables;
use crate::combatant::Combatant;
use crate::config::CombatConfig;
use crate::context::{resolve_context, AttackOptions, DamageSource};
use crate::curves::CombatCurves;
use crate::equipment::Offhand;
use crate::event::{DamageEvent, Outcome};
use crate::extension::ExtensionRegistry;
use crate::gate::Gate;
use crate::random::RandomSource;

/// Resolves attacks between two combatants.
#[derive(Debug, Clone)]
pub struct DamagePipeline {
    pub(crate) config: CombatConfig,
    pub(crate) curves: CombatCurves,
    pub(crate) body_tables: BodyPartTables,
    pub(crate) extensions: ExtensionRegistry,
}

impl Default for DamagePipeline {
    fn default() -> Self {
        Self::new(CombatConfig::default())
    }
}

impl DamagePipeline {
    /// Creates a pipeline with the stock curves and body part tables.
    #[must_use]
    pub fn new(config: CombatConfig) -> Self {
        let curves = config.curves();
        Self {
            config,
            curves,
            body_tables: BodyPartTables::standard(),
            extensions: ExtensionRegistry::new(),
        }
    }

    /// Replaces the external curves.
    #[must_use]
    pub fn with_curves(mut self, curves: CombatCurves) -> Self {
        self.curves = curves;
        self
    }

    /// Replaces the creature body part tables.
    #[must_use]
    pub fn with_body_tables(mut self, tables: BodyPartTables) -> Self {
        self.body_tables = tables;
        self
    }

    /// Replaces the extension registry.
    #[must_use]
    pub fn with_extensions(mut self, extensions: ExtensionRegistry) -> Self {
        self.extensions = extensions;
        self
    }

    /// Tuning in use.
    #[must_use]
    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    /// Extension registry, for registering hooks.
    pub fn extensions_mut(&mut self) -> &mut ExtensionRegistry {
        &mut self.extensions
    }

    /// Resolves one attack.
    ///
    /// The main damage is reported on the event, not applied: the caller owns
    /// the defender's vitals for it. Reactive effects (counter-attacks,
    /// thorns, procs, fury backlash) are applied to both combatants here.
    /// Never fails; malformed attacks resolve to a zero-damage outcome.
    pub fn resolve_attack(
        &self,
        attacker: &mut Combatant,
        defender: &mut Combatant,
        source: &DamageSource,
        options: &AttackOptions,
        now: f64,
        rng: &mut dyn RandomSource,
    ) -> DamageEvent {
        let event = self.resolve(attacker, defender, source, options, now, rng);
        debug!(
            "{} -> {}: {:?}{} for {:.1} ({:.1} mitigated)",
            attacker.name,
            defender.name,
            event.outcome,
            if event.is_critical { " (critical)" } else { "" },
            event.damage,
            event.damage_mitigated
        );
        event
    }

    pub(crate) fn resolve(
        &self,
        attacker: &mut Combatant,
        defender: &mut Combatant,
        source: &DamageSource,
        options: &AttackOptions,
        now: f64,
        rng: &mut dyn RandomSource,
    ) -> DamageEvent {
        let mut event = DamageEvent::new(attacker.id, defender.id);

        if defender.placeholder {
            trace!("{} is a placeholder, skipping attack", defender.name);
            event.terminate(Outcome::Invulnerable);
            return event;
        }

        let ctx = resolve_context(&self.config, attacker, defender, source, options, now);
        event.combat_type = ctx.combat_type;
        event.damage_type = ctx.damage_type;
        event.weapon = ctx.weapon.as_ref().map(|w| w.id);
        event.defender_weapon = ctx.defender_weapon.as_ref().map(|w| w.id);
        event.offhand = ctx.offhand.as_ref().map(|offhand| match offhand {
            Offhand::Weapon(weapon) => weapon.id,
            Offhand::Shield(shield) => shield.id,
        });
        event.attacker_ability = ctx.attacker_ability;
        event.defender_ability = ctx.defender_ability;
        event.base_damage_mod = ctx.envelope;

        if self.run_gate(&ctx, attacker, defender, &mut event, rng) == Gate::Terminal {
            return event;
        }

        if let Err(err) = self.roll_damage(&ctx, attacker, defender, &mut event, rng) {
            error!("{err}; resolving as a general failure");
            event.general_failure = true;
            event.is_critical = false;
            event.finish(0.0, 0.0);
            return event;
        }

        if let Err(err) = self.mitigate(&ctx, attacker, defender, &mut event, rng) {
            error!("{err}; treating the attack as evaded");
            event.terminate(Outcome::Evaded);
            return event;
        }

        self.after_hit(&ctx, attacker, defender, &mut event, rng);
        event
    }
}
