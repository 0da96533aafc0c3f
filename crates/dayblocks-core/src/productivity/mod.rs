//! Productivity scoring and aggregation over tracked time.

mod aggregate;
mod completions;
mod scorer;

pub use aggregate::{
    awake_seconds, daily_totals, inputs_for_day, sessions_on, todays_sleep,
    total_productive_seconds, DayTotal, SessionSlice, SECONDS_PER_DAY,
};
pub use completions::{CompletionRow, MonthlyCompletions};
pub use scorer::{
    base_productivity, PenaltyTable, ProductivityInputs, ProductivityScorer,
    ProductivitySnapshot, SleepQuality,
};
