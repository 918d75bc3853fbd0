use chrono::{DateTime, Datelike, Days, Months, NaiveDate, NaiveTime, Utc};
use postforge_core::{PlanTier, UserId};
use serde::Serialize;
use thiserror::Error;

use crate::limits::PlanLimits;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuotaError {
    #[error("daily generation limit reached ({used}/{limit})")]
    DailyLimitReached { used: u32, limit: u32 },
    #[error("monthly generation limit reached ({used}/{limit})")]
    MonthlyLimitReached { used: u32, limit: u32 },
}

/// The per-user counter row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsageCounter {
    pub user_id: UserId,
    pub daily_count: u32,
    pub monthly_count: u32,
    /// UTC date the daily count belongs to.
    pub day_start: NaiveDate,
    /// First day of the month the monthly count belongs to.
    pub month_start: NaiveDate,
}

/// First day of `date`'s month.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date)
}

fn midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

impl UsageCounter {
    pub fn new(user_id: UserId, today: NaiveDate) -> Self {
        Self {
            user_id,
            daily_count: 0,
            monthly_count: 0,
            day_start: today,
            month_start: month_start(today),
        }
    }

    /// Reset whichever windows `today` has moved past. Returns true if
    /// anything changed.
    pub fn rollover(&mut self, today: NaiveDate) -> bool {
        let mut changed = false;
        if self.day_start != today {
            self.daily_count = 0;
            self.day_start = today;
            changed = true;
        }
        let this_month = month_start(today);
        if self.month_start != this_month {
            self.monthly_count = 0;
            self.month_start = this_month;
            changed = true;
        }
        changed
    }

    /// Whether one more generation fits. Assumes `rollover` already ran.
    pub fn check(&self, limits: &PlanLimits) -> Result<(), QuotaError> {
        self.ensure_capacity(limits, 1)
    }

    /// Whether `n` more generations fit. The daily window is checked first.
    pub fn ensure_capacity(&self, limits: &PlanLimits, n: u32) -> Result<(), QuotaError> {
        if let Some(limit) = limits.daily {
            if self.daily_count.saturating_add(n) > limit {
                return Err(QuotaError::DailyLimitReached { used: self.daily_count, limit });
            }
        }
        if let Some(limit) = limits.monthly {
            if self.monthly_count.saturating_add(n) > limit {
                return Err(QuotaError::MonthlyLimitReached { used: self.monthly_count, limit });
            }
        }
        Ok(())
    }

    /// Roll over, check, then count one generation.
    pub fn record(&mut self, today: NaiveDate, limits: &PlanLimits) -> Result<(), QuotaError> {
        self.record_many(today, limits, 1)
    }

    /// Roll over, check, then count `n` generations. On rejection the
    /// counts are left as they were after rollover.
    pub fn record_many(
        &mut self,
        today: NaiveDate,
        limits: &PlanLimits,
        n: u32,
    ) -> Result<(), QuotaError> {
        self.rollover(today);
        self.ensure_capacity(limits, n)?;
        self.daily_count = self.daily_count.saturating_add(n);
        self.monthly_count = self.monthly_count.saturating_add(n);
        Ok(())
    }

    pub fn daily_resets_at(&self) -> DateTime<Utc> {
        let next = self.day_start.checked_add_days(Days::new(1)).unwrap_or(self.day_start);
        midnight_utc(next)
    }

    pub fn monthly_resets_at(&self) -> DateTime<Utc> {
        let next = self
            .month_start
            .checked_add_months(Months::new(1))
            .unwrap_or(self.month_start);
        midnight_utc(next)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UsageWindow {
    pub used: u32,
    /// `None` when the plan is unlimited for this window.
    pub limit: Option<u32>,
    pub remaining: Option<u32>,
    pub resets_at: DateTime<Utc>,
}

impl UsageWindow {
    fn new(used: u32, limit: Option<u32>, resets_at: DateTime<Utc>) -> Self {
        Self {
            used,
            limit,
            remaining: limit.map(|l| l.saturating_sub(used)),
            resets_at,
        }
    }

    /// The limit `n` more generations would break, if any.
    fn exceeded_by(&self, n: u32) -> Option<u32> {
        match (self.limit, self.remaining) {
            (Some(limit), Some(remaining)) if remaining < n => Some(limit),
            _ => None,
        }
    }
}

/// What the usage endpoint and quota rejections report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UsageSnapshot {
    pub plan: PlanTier,
    pub daily: UsageWindow,
    pub monthly: UsageWindow,
}

impl UsageSnapshot {
    /// Report `counter` as of `today` (rolled over on a copy, the input is untouched).
    pub fn new(counter: &UsageCounter, limits: &PlanLimits, today: NaiveDate) -> Self {
        let mut c = counter.clone();
        c.rollover(today);
        Self {
            plan: limits.plan,
            daily: UsageWindow::new(c.daily_count, limits.daily, c.daily_resets_at()),
            monthly: UsageWindow::new(c.monthly_count, limits.monthly, c.monthly_resets_at()),
        }
    }

    /// Whether `n` more generations fit, judged from this snapshot. The
    /// daily window is reported first, as in [`UsageCounter::ensure_capacity`].
    pub fn check(&self, n: u32) -> Result<(), QuotaError> {
        if let Some(limit) = self.daily.exceeded_by(n) {
            return Err(QuotaError::DailyLimitReached { used: self.daily.used, limit });
        }
        if let Some(limit) = self.monthly.exceeded_by(n) {
            return Err(QuotaError::MonthlyLimitReached { used: self.monthly.used, limit });
        }
        Ok(())
    }
}
