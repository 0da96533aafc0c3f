//! Productivity scoring.
//!
//! `base_productivity` is the productive/awake ratio as a percentage. The
//! reported `productivity_percentage` is that base reduced by a penalty that
//! depends only on how well the user slept:
//!
//! ```text
//! productivity = base * (1 - penalty(sleep_quality))
//! ```
//!
//! Penalties are fractions in `[0, 1]` and must grow with severity:
//! Excellent <= Fair <= Excessive <= Poor.

use serde::{Deserialize, Serialize};

use crate::api::ProductivityReport;
use crate::duration;

/// Sleep quality buckets, by hours slept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SleepQuality {
    /// Less than 6 hours
    Poor,
    /// 6 hours up to (not including) 7
    Fair,
    /// 7 to 9 hours, both inclusive
    Excellent,
    /// More than 9 hours
    Excessive,
}

impl SleepQuality {
    pub fn from_hours(hours: f64) -> Self {
        if hours < 6.0 {
            SleepQuality::Poor
        } else if hours < 7.0 {
            SleepQuality::Fair
        } else if hours <= 9.0 {
            SleepQuality::Excellent
        } else {
            SleepQuality::Excessive
        }
    }

    pub fn from_seconds(seconds: f64) -> Self {
        Self::from_hours(seconds / 3600.0)
    }

    pub fn label(&self) -> &'static str {
        match self {
            SleepQuality::Poor => "Poor",
            SleepQuality::Fair => "Fair",
            SleepQuality::Excellent => "Excellent",
            SleepQuality::Excessive => "Excessive",
        }
    }
}

impl std::fmt::Display for SleepQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Penalty fraction per sleep quality.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PenaltyTable {
    #[serde(default = "default_excellent")]
    pub excellent: f64,
    #[serde(default = "default_fair")]
    pub fair: f64,
    #[serde(default = "default_excessive")]
    pub excessive: f64,
    #[serde(default = "default_poor")]
    pub poor: f64,
}

fn default_excellent() -> f64 {
    0.0
}

fn default_fair() -> f64 {
    0.10
}

fn default_excessive() -> f64 {
    0.15
}

fn default_poor() -> f64 {
    0.25
}

impl Default for PenaltyTable {
    fn default() -> Self {
        Self {
            excellent: default_excellent(),
            fair: default_fair(),
            excessive: default_excessive(),
            poor: default_poor(),
        }
    }
}

impl PenaltyTable {
    pub fn penalty(&self, quality: SleepQuality) -> f64 {
        match quality {
            SleepQuality::Excellent => self.excellent,
            SleepQuality::Fair => self.fair,
            SleepQuality::Excessive => self.excessive,
            SleepQuality::Poor => self.poor,
        }
    }

    /// Every fraction in `[0, 1]`, non-decreasing with severity.
    pub fn is_valid(&self) -> bool {
        let ordered = [self.excellent, self.fair, self.excessive, self.poor];
        ordered.iter().all(|p| (0.0..=1.0).contains(p))
            && ordered.windows(2).all(|w| w[0] <= w[1])
    }
}

/// `100 * productive / awake`, or 0 when nothing was awake.
pub fn base_productivity(productive_seconds: f64, awake_seconds: f64) -> f64 {
    if awake_seconds <= 0.0 {
        return 0.0;
    }
    100.0 * productive_seconds / awake_seconds
}

fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

/// Raw inputs for one day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProductivityInputs {
    pub productive_seconds: f64,
    pub awake_seconds: f64,
    pub sleep_seconds: f64,
}

/// Computes the whole pipeline locally.
#[derive(Debug, Clone, Default)]
pub struct ProductivityScorer {
    penalties: PenaltyTable,
}

impl ProductivityScorer {
    pub fn new(penalties: PenaltyTable) -> Self {
        Self { penalties }
    }

    pub fn penalties(&self) -> &PenaltyTable {
        &self.penalties
    }

    pub fn score(&self, inputs: ProductivityInputs) -> ProductivitySnapshot {
        let base = base_productivity(inputs.productive_seconds, inputs.awake_seconds);
        let quality = SleepQuality::from_seconds(inputs.sleep_seconds);
        let percentage = base * (1.0 - self.penalties.penalty(quality));
        ProductivitySnapshot {
            total_productive_seconds: inputs.productive_seconds,
            total_awake_seconds: inputs.awake_seconds,
            sleep_seconds: inputs.sleep_seconds,
            base_productivity: base,
            productivity_percentage: percentage,
            sleep_quality: quality,
            malformed: Vec::new(),
        }
    }
}

/// Derived view of one day's productivity. Never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductivitySnapshot {
    pub total_productive_seconds: f64,
    pub total_awake_seconds: f64,
    pub sleep_seconds: f64,
    pub base_productivity: f64,
    /// Already penalized.
    pub productivity_percentage: f64,
    pub sleep_quality: SleepQuality,
    /// Duration texts that could not be parsed and were read as zero.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub malformed: Vec<String>,
}

impl ProductivitySnapshot {
    /// Consume a server report, where the penalty has already been applied.
    pub fn from_report(report: &ProductivityReport) -> Self {
        let mut malformed = Vec::new();
        let productive = duration::parse_or_zero(&report.total_productive_time, &mut malformed);
        let awake = duration::parse_or_zero(&report.total_awake_time, &mut malformed);
        let sleep = duration::parse_or_zero(&report.sleep_duration, &mut malformed);
        Self {
            total_productive_seconds: productive,
            total_awake_seconds: awake,
            sleep_seconds: sleep,
            base_productivity: report.base_productivity,
            productivity_percentage: report.productivity_percentage,
            sleep_quality: SleepQuality::from_seconds(sleep),
            malformed,
        }
    }

    /// Percentage points lost to sleep quality.
    pub fn sleep_penalty(&self) -> f64 {
        self.base_productivity - self.productivity_percentage
    }

    pub fn display_base(&self) -> f64 {
        clamp_percent(self.base_productivity)
    }

    pub fn display_percentage(&self) -> f64 {
        clamp_percent(self.productivity_percentage)
    }

    pub fn display_penalty(&self) -> f64 {
        clamp_percent(self.sleep_penalty())
    }

    /// Back to the wire shape.
    pub fn to_report(&self) -> ProductivityReport {
        ProductivityReport {
            total_productive_time: duration::format_hms(self.total_productive_seconds),
            total_awake_time: duration::format_hms(self.total_awake_seconds),
            productivity_percentage: self.productivity_percentage,
            sleep_duration: duration::format_hms(self.sleep_seconds),
            base_productivity: self.base_productivity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_productivity_ratio() {
        assert_eq!(base_productivity(18000.0, 57600.0), 31.25);
        assert_eq!(base_productivity(3600.0, 0.0), 0.0);
    }

    #[test]
    fn sleep_quality_boundaries() {
        assert_eq!(SleepQuality::from_hours(5.99).label(), "Poor");
        assert_eq!(SleepQuality::from_hours(6.0).label(), "Fair");
        assert_eq!(SleepQuality::from_hours(6.5).label(), "Fair");
        assert_eq!(SleepQuality::from_hours(7.0).label(), "Excellent");
        assert_eq!(SleepQuality::from_hours(9.0).label(), "Excellent");
        assert_eq!(SleepQuality::from_hours(9.5).label(), "Excessive");
    }

    #[test]
    fn score_applies_penalty_for_sleep() {
        let scorer = ProductivityScorer::default();
        let snapshot = scorer.score(ProductivityInputs {
            productive_seconds: 18000.0,
            awake_seconds: 57600.0,
            sleep_seconds: 6.5 * 3600.0,
        });
        assert_eq!(snapshot.base_productivity, 31.25);
        assert_eq!(snapshot.sleep_quality, SleepQuality::Fair);
        assert!((snapshot.productivity_percentage - 28.125).abs() < 1e-9);
        assert!((snapshot.sleep_penalty() - 3.125).abs() < 1e-9);
    }

    #[test]
    fn excellent_sleep_costs_nothing() {
        let snapshot = ProductivityScorer::default().score(ProductivityInputs {
            productive_seconds: 7200.0,
            awake_seconds: 57600.0,
            sleep_seconds: 8.0 * 3600.0,
        });
        assert_eq!(snapshot.productivity_percentage, snapshot.base_productivity);
    }

    #[test]
    fn from_report_reads_durations_and_clamps_display() {
        let report = ProductivityReport {
            total_productive_time: "20h0m0s".into(),
            total_awake_time: "16h0m0s".into(),
            productivity_percentage: 118.75,
            sleep_duration: "garbage".into(),
            base_productivity: 125.0,
        };
        let snapshot = ProductivitySnapshot::from_report(&report);
        assert_eq!(snapshot.total_productive_seconds, 72000.0);
        assert_eq!(snapshot.sleep_seconds, 0.0);
        assert_eq!(snapshot.sleep_quality, SleepQuality::Poor);
        assert_eq!(snapshot.malformed, vec!["garbage".to_string()]);
        assert_eq!(snapshot.sleep_penalty(), 6.25);
        assert_eq!(snapshot.display_base(), 100.0);
        assert_eq!(snapshot.display_percentage(), 100.0);
    }

    #[test]
    fn penalty_table_validation() {
        assert!(PenaltyTable::default().is_valid());
        let inverted = PenaltyTable {
            poor: 0.05,
            ..PenaltyTable::default()
        };
        assert!(!inverted.is_valid());
        let too_big = PenaltyTable {
            poor: 1.5,
            ..PenaltyTable::default()
        };
        assert!(!too_big.is_valid());
    }
}
