//! Extension points for combat abilities and sigil trinkets.
//!
//! Effects are registered in a dispatch table keyed by the granting ability or
//! trinket and the injection site. At each site the pipeline asks the hooks of
//! one side, in equip order (combat focus first, then trinkets), and applies
//! the first override it accepts.

use std::sync::Arc;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::ability::CombatAbility;
use crate::combatant::Combatant;
use crate::equipment::TrinketId;
use crate::event::DamageEvent;
use crate::random::RandomSource;

/// What grants a hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HookKey {
    /// A combat ability from the equipped focus.
    Ability(CombatAbility),
    /// An equipped sigil trinket.
    Trinket(TrinketId),
}

/// Where in the pipeline a hook runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HookSite {
    /// Before the evasion roll. Attacker: force hit. Defender: force evade.
    Evasion,
    /// After a glancing blow. Defender: upgrade to a full evade.
    GlancingBlow,
    /// Provoke glancing blow. Defender: procs.
    DefensiveProc,
    /// After the critical roll. Attacker: force. Defender: deny.
    Critical,
    /// Critical damage. Attacker: multiplier.
    CriticalDamage,
    /// Pre-mitigation damage. Attacker: flat bonus and multiplier.
    DamageBonus,
    /// After a landed hit. Both sides: procs.
    OnHit,
    /// A combatant died from a reactive effect.
    Death,
}

/// Which participant a hook belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// The attacker.
    Attacker,
    /// The defender.
    Defender,
}

/// Side effect a proc applies, from the hook owner's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ProcEffect {
    /// Heal the owner.
    HealSelf(f32),
    /// Damage the owner's opponent.
    DamageOpponent(f32),
    /// Restore the owner's stamina.
    RestoreStamina(f32),
    /// Bank a reprisal: the owner's next critical check is forced.
    BankReprisal,
}

/// Effect returned by a hook.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum HookEffect {
    /// Attack cannot be evaded.
    ForceHit,
    /// Attack is fully evaded.
    ForceEvade,
    /// Glancing blow becomes a full evade.
    UpgradeToEvade,
    /// Attack is a critical.
    ForceCritical,
    /// Attack is not a critical.
    DenyCritical,
    /// Multiplier on the critical damage modifier.
    CriticalDamageMultiplier(f32),
    /// Pre-mitigation damage bonus.
    DamageBonus {
        /// Added before the multiplier.
        flat: f32,
        /// Damage multiplier.
        multiplier: f32,
    },
    /// A proc side effect.
    Proc(ProcEffect),
}

/// Read-only view handed to hooks.
#[derive(Debug, Clone, Copy)]
pub struct HookContext<'a> {
    /// Site being evaluated.
    pub site: HookSite,
    /// Side that owns the hook.
    pub side: Side,
    /// Attacker.
    pub attacker: &'a Combatant,
    /// Defender.
    pub defender: &'a Combatant,
    /// Event so far.
    pub event: &'a DamageEvent,
    /// Current time in seconds.
    pub now: f64,
}

impl<'a> HookContext<'a> {
    /// Creates a context.
    #[must_use]
    pub fn new(
        site: HookSite,
        side: Side,
        attacker: &'a Combatant,
        defender: &'a Combatant,
        event: &'a DamageEvent,
        now: f64,
    ) -> Self {
        Self {
            site,
            side,
            attacker,
            defender,
            event,
            now,
        }
    }

    /// The combatant owning the hook.
    #[must_use]
    pub fn owner(&self) -> &Combatant {
        match self.side {
            Side::Attacker => self.attacker,
            Side::Defender => self.defender,
        }
    }
}

/// Behavior registered at one site.
///
/// Hooks that need randomness must draw with [`crate::random::Draw::Hook`].
pub trait CombatHook: Send + Sync {
    /// Evaluates the hook; `None` means no effect.
    fn invoke(&self, ctx: &HookContext<'_>, rng: &mut dyn RandomSource) -> Option<HookEffect>;
}

/// Adapter turning a closure into a [`CombatHook`].
pub struct FnHook<F>(pub F);

impl<F> CombatHook for FnHook<F>
where
    F: Fn(&HookContext<'_>, &mut dyn RandomSource) -> Option<HookEffect> + Send + Sync,
{
    fn invoke(&self, ctx: &HookContext<'_>, rng: &mut dyn RandomSource) -> Option<HookEffect> {
        (self.0)(ctx, rng)
    }
}

/// Dispatch table from (key, site) to behavior.
#[derive(Clone, Default)]
pub struct ExtensionRegistry {
    hooks: AHashMap<(HookKey, HookSite), Arc<dyn CombatHook>>,
}

impl std::fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionRegistry")
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

impl ExtensionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) a hook.
    pub fn register(&mut self, key: HookKey, site: HookSite, hook: impl CombatHook + 'static) {
        self.hooks.insert((key, site), Arc::new(hook));
    }

    /// Registers a closure as a hook.
    pub fn register_fn<F>(&mut self, key: HookKey, site: HookSite, f: F)
    where
        F: Fn(&HookContext<'_>, &mut dyn RandomSource) -> Option<HookEffect>
            + Send
            + Sync
            + 'static,
    {
        self.register(key, site, FnHook(f));
    }

    /// Removes a hook.
    pub fn unregister(&mut self, key: HookKey, site: HookSite) {
        self.hooks.remove(&(key, site));
    }

    /// Number of registered hooks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    /// Whether no hooks are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Hooks of a combatant in equip order.
    fn keys(combatant: &Combatant) -> impl Iterator<Item = HookKey> + '_ {
        combatant
            .combat_ability()
            .map(HookKey::Ability)
            .into_iter()
            .chain(combatant.equipment.trinkets.iter().copied().map(HookKey::Trinket))
    }

    /// First effect at a site accepted by `accept`, along with its key.
    pub fn first_override(
        &self,
        ctx: &HookContext<'_>,
        rng: &mut dyn RandomSource,
        accept: impl Fn(&HookEffect) -> bool,
    ) -> Option<(HookKey, HookEffect)> {
        if self.hooks.is_empty() {
            return None;
        }
        for key in Self::keys(ctx.owner()) {
            let Some(hook) = self.hooks.get(&(key, ctx.site)) else {
                continue;
            };
            if let Some(effect) = hook.invoke(ctx, rng) {
                if accept(&effect) {
                    return Some((key, effect));
                }
            }
        }
        None
    }

    /// Proc effects from every hook at a site, in equip order.
    pub fn procs(&self, ctx: &HookContext<'_>, rng: &mut dyn RandomSource) -> Vec<ProcEffect> {
        if self.hooks.is_empty() {
            return Vec::new();
        }
        Self::keys(ctx.owner())
            .filter_map(|key| self.hooks.get(&(key, ctx.site)))
            .filter_map(|hook| match hook.invoke(ctx, rng) {
                Some(HookEffect::Proc(effect)) => Some(effect),
                _ => None,
            })
            .collect()
    }

    /// Runs every hook at a site for notification; effects are ignored.
    pub fn notify(&self, ctx: &HookContext<'_>, rng: &mut dyn RandomSource) {
        for key in Self::keys(ctx.owner()) {
            if let Some(hook) = self.hooks.get(&(key, ctx.site)) {
                let _ = hook.invoke(ctx, rng);
            }
        }
    }
}
