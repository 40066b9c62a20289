//! Failure streaks and fire times of automation rules.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// One evaluation outcome to fold into a rule's health.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthUpdate {
    /// The rule evaluated without error.
    Succeeded {
        /// Whether its condition held.
        fired: bool,
        /// Evaluation time.
        at: DateTime<Utc>,
    },
    /// The rule failed to evaluate.
    Failed {
        /// Failure message.
        reason: String,
        /// Evaluation time.
        at: DateTime<Utc>,
        /// Rolling window of the streak.
        window: Duration,
        /// Streak length that quarantines the rule.
        threshold: u32,
    },
}

/// Evaluation health of one rule.
///
/// A streak counts consecutive failed evaluations. It restarts when a
/// failure falls outside the rolling window opened by the streak's first
/// failure, so only failures close together in time lead to quarantine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleHealth {
    consecutive_failures: u32,
    streak_started_at: Option<DateTime<Utc>>,
    last_failure_at: Option<DateTime<Utc>>,
    last_error: Option<String>,
    last_fired_at: Option<DateTime<Utc>>,
}

impl RuleHealth {
    /// Returns the length of the current failure streak.
    #[must_use]
    pub const fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Returns when the most recent failure happened.
    #[must_use]
    pub const fn last_failure_at(&self) -> Option<DateTime<Utc>> {
        self.last_failure_at
    }

    /// Returns the most recent failure message.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Returns when the rule last emitted intents.
    #[must_use]
    pub const fn last_fired_at(&self) -> Option<DateTime<Utc>> {
        self.last_fired_at
    }

    /// Records a successful evaluation; clears the streak.
    pub fn record_success(&mut self, fired: bool, at: DateTime<Utc>) {
        self.consecutive_failures = 0;
        self.streak_started_at = None;
        if fired {
            self.last_fired_at = Some(at);
        }
    }

    /// Records a failed evaluation and returns the streak length.
    pub fn record_failure(&mut self, reason: &str, at: DateTime<Utc>, window: Duration) -> u32 {
        let within_window = self
            .streak_started_at
            .is_some_and(|started| at.signed_duration_since(started) <= window);
        if within_window {
            self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        } else {
            self.consecutive_failures = 1;
            self.streak_started_at = Some(at);
        }
        self.last_failure_at = Some(at);
        self.last_error = Some(reason.to_owned());
        self.consecutive_failures
    }

    /// Returns whether the streak reached `threshold`.
    #[must_use]
    pub const fn should_quarantine(&self, threshold: u32) -> bool {
        self.consecutive_failures >= threshold
    }

    /// Closes the streak once the rule has been quarantined.
    pub const fn reset_streak(&mut self) {
        self.consecutive_failures = 0;
        self.streak_started_at = None;
    }

    /// Folds `update` into the health.
    ///
    /// Returns the streak length when this failure reached the quarantine
    /// threshold; the streak is closed in the same step, so exactly one
    /// caller observes the crossing.
    pub fn apply(&mut self, update: &HealthUpdate) -> Option<u32> {
        match update {
            HealthUpdate::Succeeded { fired, at } => {
                self.record_success(*fired, *at);
                None
            }
            HealthUpdate::Failed {
                reason,
                at,
                window,
                threshold,
            } => {
                let streak = self.record_failure(reason, *at, *window);
                if !self.should_quarantine(*threshold) {
                    return None;
                }
                self.reset_streak();
                Some(streak)
            }
        }
    }
}
