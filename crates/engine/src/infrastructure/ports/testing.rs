//! Testability ports for injecting time and randomness.

use chrono::{DateTime, Utc};
use uuid::Uuid;

#[cfg_attr(test, mockall::automock)]
pub trait ClockPort: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub trait RandomPort: Send + Sync {
    /// Uniform integer in `min..=max`.
    fn gen_range(&self, min: i32, max: i32) -> i32;
    fn gen_uuid(&self) -> Uuid;
}

/// Index picker for the domain code generators (`JoinCode::generate` etc).
pub fn pick_index(random: &dyn RandomPort) -> impl FnMut(usize) -> usize + '_ {
    move |len| {
        let max = i32::try_from(len.saturating_sub(1)).unwrap_or(i32::MAX);
        usize::try_from(random.gen_range(0, max)).unwrap_or(0)
    }
}
