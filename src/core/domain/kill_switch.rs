//! Kill-switch state: a latch, once tripped it stays tripped until reset.

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KillSwitchTrigger {
    ConsecutiveLosses,
    ErrorRate,
    Connectivity,
    Manual,
    Dispute,
    OracleBlacklist,
}

#[derive(Debug, Clone)]
pub struct KillSwitchState {
    active: bool,
    trigger: Option<KillSwitchTrigger>,
    triggered_at: Option<DateTime<Utc>>,
    reason: Option<String>,
}

impl Default for KillSwitchState {
    fn default() -> Self {
        Self {
            active: false,
            trigger: None,
            triggered_at: None,
            reason: None,
        }
    }
}

impl KillSwitchState {
    #[must_use]
    pub const fn active(&self) -> bool {
        self.active
    }

    #[must_use]
    pub const fn trigger(&self) -> Option<KillSwitchTrigger> {
        self.trigger
    }

    #[must_use]
    pub const fn triggered_at(&self) -> Option<DateTime<Utc>> {
        self.triggered_at
    }

    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    /// Latches the switch. No-op if already active — re-triggering must not
    /// clobber the original trigger/reason.
    pub fn trip(&mut self, trigger: KillSwitchTrigger, reason: impl Into<String>, now: DateTime<Utc>) {
        if self.active {
            return;
        }
        self.active = true;
        self.trigger = Some(trigger);
        self.triggered_at = Some(now);
        self.reason = Some(reason.into());
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trip_latches_and_ignores_further_trips() {
        let mut state = KillSwitchState::default();
        state.trip(KillSwitchTrigger::ConsecutiveLosses, "too many losses", Utc::now());
        assert!(state.active());
        assert_eq!(state.trigger(), Some(KillSwitchTrigger::ConsecutiveLosses));

        state.trip(KillSwitchTrigger::Manual, "operator pressed the button", Utc::now());
        assert_eq!(state.trigger(), Some(KillSwitchTrigger::ConsecutiveLosses));
    }

    #[test]
    fn reset_clears_all_state() {
        let mut state = KillSwitchState::default();
        state.trip(KillSwitchTrigger::Manual, "stop", Utc::now());
        state.reset();
        assert!(!state.active());
        assert!(state.trigger().is_none());
    }
}
