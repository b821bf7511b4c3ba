use crate::domain::account::Account;
use chrono::{DateTime, Utc};

/// Пробный период: сколько полных суток после регистрации можно тратить токены.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrialPolicy {
    pub window_days: i64,
}

impl Default for TrialPolicy {
    fn default() -> Self {
        Self { window_days: 3 }
    }
}

/// Снимок состояния аккаунта на момент проверки.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrialStatus {
    pub credits: i64,
    pub days_elapsed: i64,
    pub days_remaining: i64,
    pub is_active: bool,
    pub has_credits: bool,
}

impl TrialStatus {
    /// Период не истек и баланс не пуст.
    pub fn may_consume(&self) -> bool {
        self.is_active && self.has_credits
    }
}

impl TrialPolicy {
    pub fn new(window_days: i64) -> Self {
        Self { window_days }
    }

    // Считаем только целые прошедшие сутки: 2д 23ч -> 2 дня.
    pub fn evaluate(&self, account: &Account, now: DateTime<Utc>) -> TrialStatus {
        let days_elapsed = (now - account.created_at).num_days().max(0);
        let days_remaining = (self.window_days - days_elapsed).max(0);

        TrialStatus {
            credits: account.credits,
            days_elapsed,
            days_remaining,
            is_active: days_remaining > 0,
            has_credits: account.credits > 0,
        }
    }
}
