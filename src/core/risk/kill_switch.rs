//! Multi-trigger kill switch: consecutive losses, rolling error rate, and API
//! connectivity health all latch the same [`KillSwitchState`]. Once tripped,
//! only an explicit [`KillSwitchManager::reset`] clears it.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::core::domain::{KillSwitchState, KillSwitchTrigger};
use crate::core::risk::config::KillSwitchConfig;

pub struct KillSwitchManager {
    config: KillSwitchConfig,
    state: KillSwitchState,
    consecutive_losses: u32,
    recent_results: VecDeque<bool>,
    api_error_count: u32,
}

impl KillSwitchManager {
    #[must_use]
    pub fn new(config: KillSwitchConfig) -> Self {
        Self {
            config,
            state: KillSwitchState::default(),
            consecutive_losses: 0,
            recent_results: VecDeque::new(),
            api_error_count: 0,
        }
    }

    #[must_use]
    pub const fn active(&self) -> bool {
        self.state.active()
    }

    #[must_use]
    pub const fn state(&self) -> &KillSwitchState {
        &self.state
    }

    #[must_use]
    pub const fn consecutive_losses(&self) -> u32 {
        self.consecutive_losses
    }

    #[must_use]
    pub fn error_rate(&self) -> f64 {
        if self.recent_results.is_empty() {
            return 0.0;
        }
        let failures = self.recent_results.iter().filter(|r| !**r).count();
        (failures as f64 / self.recent_results.len() as f64) * 100.0
    }

    #[must_use]
    pub fn check_consecutive_losses(&self) -> bool {
        self.consecutive_losses >= self.config.max_consecutive_losses
    }

    #[must_use]
    pub fn check_error_rate(&self) -> bool {
        if self.recent_results.is_empty() {
            return false;
        }
        self.error_rate() >= self.config.max_error_rate_pct
    }

    #[must_use]
    pub fn check_connectivity(&self, error_count: u32) -> bool {
        error_count >= self.config.connectivity_max_errors
    }

    pub fn trigger(&mut self, trigger: KillSwitchTrigger, reason: impl Into<String>, now: DateTime<Utc>) {
        self.state.trip(trigger, reason, now);
    }

    pub fn reset(&mut self) {
        self.state.reset();
        self.consecutive_losses = 0;
        self.recent_results.clear();
        self.api_error_count = 0;
    }

    /// Updates counters after a trade and auto-checks the loss/error-rate
    /// triggers. Returns the trigger that newly fired, if any.
    pub fn record_trade_result(&mut self, success: bool, now: DateTime<Utc>) -> Option<KillSwitchTrigger> {
        if self.state.active() {
            return None;
        }

        if self.recent_results.len() == self.config.error_window_trades {
            self.recent_results.pop_front();
        }
        self.recent_results.push_back(success);

        if success {
            self.consecutive_losses = 0;
        } else {
            self.consecutive_losses += 1;
        }

        if self.check_consecutive_losses() {
            let trigger = KillSwitchTrigger::ConsecutiveLosses;
            let reason = format!("{} consecutive losses", self.consecutive_losses);
            warn!(reason = %reason, "kill_switch_triggered");
            self.trigger(trigger, reason, now);
            return Some(trigger);
        }

        if self.check_error_rate() {
            let trigger = KillSwitchTrigger::ErrorRate;
            let reason = format!(
                "error rate {:.1}% exceeds {}% threshold",
                self.error_rate(),
                self.config.max_error_rate_pct
            );
            warn!(reason = %reason, "kill_switch_triggered");
            self.trigger(trigger, reason, now);
            return Some(trigger);
        }

        None
    }

    /// Records an API failure and auto-checks the connectivity trigger.
    pub fn record_api_error(&mut self, now: DateTime<Utc>) -> Option<KillSwitchTrigger> {
        if self.state.active() {
            return None;
        }

        self.api_error_count += 1;
        if self.check_connectivity(self.api_error_count) {
            let trigger = KillSwitchTrigger::Connectivity;
            let reason = format!(
                "{} API errors exceeds {} threshold",
                self.api_error_count, self.config.connectivity_max_errors
            );
            warn!(reason = %reason, "kill_switch_triggered");
            self.trigger(trigger, reason, now);
            return Some(trigger);
        }
        None
    }

    pub fn record_api_success(&mut self) {
        self.api_error_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> KillSwitchManager {
        let mut config = KillSwitchConfig::default();
        config.max_consecutive_losses = 3;
        config.error_window_trades = 5;
        config.max_error_rate_pct = 100.0;
        config.connectivity_max_errors = 3;
        KillSwitchManager::new(config)
    }

    #[test]
    fn consecutive_losses_trigger_kill_switch() {
        let mut m = manager();
        assert!(m.record_trade_result(false, Utc::now()).is_none());
        assert!(m.record_trade_result(false, Utc::now()).is_none());
        let trigger = m.record_trade_result(false, Utc::now());
        assert_eq!(trigger, Some(KillSwitchTrigger::ConsecutiveLosses));
        assert!(m.active());
    }

    #[test]
    fn a_win_resets_the_consecutive_loss_streak() {
        let mut m = manager();
        m.record_trade_result(false, Utc::now());
        m.record_trade_result(false, Utc::now());
        m.record_trade_result(true, Utc::now());
        assert_eq!(m.consecutive_losses(), 0);
        assert!(!m.active());
    }

    #[test]
    fn latched_state_ignores_further_results() {
        let mut m = manager();
        m.record_trade_result(false, Utc::now());
        m.record_trade_result(false, Utc::now());
        m.record_trade_result(false, Utc::now());
        let trigger = m.record_trade_result(false, Utc::now());
        assert!(trigger.is_none());
        assert_eq!(m.state().trigger(), Some(KillSwitchTrigger::ConsecutiveLosses));
    }

    #[test]
    fn connectivity_errors_trigger_after_threshold() {
        let mut m = manager();
        m.record_api_error(Utc::now());
        m.record_api_error(Utc::now());
        let trigger = m.record_api_error(Utc::now());
        assert_eq!(trigger, Some(KillSwitchTrigger::Connectivity));
    }

    #[test]
    fn reset_clears_counters_and_state() {
        let mut m = manager();
        m.record_trade_result(false, Utc::now());
        m.record_trade_result(false, Utc::now());
        m.record_trade_result(false, Utc::now());
        m.reset();
        assert!(!m.active());
        assert_eq!(m.consecutive_losses(), 0);
    }
}
