//! Per-plan post generation quotas.
//!
//! Each user has one [`UsageCounter`] row holding a daily and a monthly
//! count. Counters roll over lazily: every read or write first calls
//! [`UsageCounter::rollover`] with the current UTC date, so a counter that
//! has not been touched for a week resets the moment it is next used.

pub mod counter;
pub mod limits;

pub use counter::{QuotaError, UsageCounter, UsageSnapshot, UsageWindow};
pub use limits::PlanLimits;
