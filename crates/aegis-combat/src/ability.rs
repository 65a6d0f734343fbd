//! Combat abilities and their activation windows.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// A selectable combat ability granted by an equipped combat focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CombatAbility {
    /// Taunt: bonus damage while active, glancing blows hurt less.
    Provoke,
    /// Shield wall: large block bonus and blocks from any angle.
    Phalanx,
    /// Weapon parry: block bonus with two-handed or dual weapons, ripostes.
    Parry,
    /// Builds reckless stacks, spends them as a damage burst.
    Fury,
    /// Guaranteed hits while active.
    Backstab,
    /// Missile accuracy and damage while active.
    SteadyShot,
    /// Evasion bonus while active.
    Smokescreen,
    /// Extra projectiles at reduced damage per projectile.
    Multishot,
}

/// Activation window of one ability: active iff `now < activated_at + duration`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AbilityWindow {
    /// Ability this window belongs to.
    pub ability: CombatAbility,
    /// Activation timestamp in seconds.
    pub activated_at: f64,
    /// Window length in seconds.
    pub duration: f64,
}

impl AbilityWindow {
    /// Creates a new window.
    #[must_use]
    pub const fn new(ability: CombatAbility, activated_at: f64, duration: f64) -> Self {
        Self {
            ability,
            activated_at,
            duration,
        }
    }

    /// Whether the window is open at `now`.
    #[must_use]
    pub fn is_active(&self, now: f64) -> bool {
        now < self.activated_at + self.duration
    }

    /// Whether the window was opened no more than `seconds` ago.
    #[must_use]
    pub fn activated_within(&self, now: f64, seconds: f64) -> bool {
        now >= self.activated_at && now - self.activated_at <= seconds
    }
}

/// The latest window per ability for one combatant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AbilityWindows {
    windows: AHashMap<CombatAbility, AbilityWindow>,
}

impl AbilityWindows {
    /// Creates an empty set of windows.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens (or reopens) the window for an ability.
    pub fn activate(&mut self, ability: CombatAbility, now: f64, duration: f64) {
        self.windows
            .insert(ability, AbilityWindow::new(ability, now, duration));
    }

    /// Closes the window for an ability.
    pub fn clear(&mut self, ability: CombatAbility) {
        self.windows.remove(&ability);
    }

    /// Latest window for an ability, if it was ever activated.
    #[must_use]
    pub fn get(&self, ability: CombatAbility) -> Option<&AbilityWindow> {
        self.windows.get(&ability)
    }

    /// Whether the ability's window is open at `now`.
    #[must_use]
    pub fn is_active(&self, ability: CombatAbility, now: f64) -> bool {
        self.get(ability).is_some_and(|w| w.is_active(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_boundaries() {
        let window = AbilityWindow::new(CombatAbility::Fury, 10.0, 5.0);
        assert!(!window.is_active(15.0));
        assert!(window.is_active(14.999));
        assert!(window.activated_within(12.0, 3.0));
        assert!(!window.activated_within(9.0, 3.0));
    }

    #[test]
    fn test_windows_reactivate() {
        let mut windows = AbilityWindows::new();
        assert!(!windows.is_active(CombatAbility::Phalanx, 0.0));

        windows.activate(CombatAbility::Phalanx, 0.0, 2.0);
        assert!(windows.is_active(CombatAbility::Phalanx, 1.0));
        assert!(!windows.is_active(CombatAbility::Phalanx, 3.0));

        windows.activate(CombatAbility::Phalanx, 3.0, 2.0);
        assert!(windows.is_active(CombatAbility::Phalanx, 3.5));

        windows.clear(CombatAbility::Phalanx);
        assert!(windows.get(CombatAbility::Phalanx).is_none());
    }
}
