//! Per-day activity series.

use std::collections::HashMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Reporting window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "7d")]
    Week,
    #[default]
    #[serde(rename = "30d")]
    Month,
    #[serde(rename = "90d")]
    Quarter,
}

impl Timeframe {
    /// Every window, in menu order.
    pub const ALL: [Self; 3] = [Self::Week, Self::Month, Self::Quarter];

    /// Length of the window in days.
    #[must_use]
    pub const fn days(self) -> i64 {
        match self {
            Self::Week => 7,
            Self::Month => 30,
            Self::Quarter => 90,
        }
    }

    /// Query parameter value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Week => "7d",
            Self::Month => "30d",
            Self::Quarter => "90d",
        }
    }

    /// Menu label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Week => "Letzte 7 Tage",
            Self::Month => "Letzte 30 Tage",
            Self::Quarter => "Letzte 90 Tage",
        }
    }

    /// Parse a query parameter; unknown values fall back to 30 days.
    #[must_use]
    pub fn from_param(value: Option<&str>) -> Self {
        match value {
            Some("7d") => Self::Week,
            Some("90d") => Self::Quarter,
            _ => Self::Month,
        }
    }

    /// First instant of the window ending at `now`.
    #[must_use]
    pub fn start(self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::days(self.days())
    }
}

/// One day of a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: u64,
}

/// A feature usage share, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FeatureUsage {
    pub name: &'static str,
    pub usage: u8,
}

/// Static feature ranking until usage tracking exists.
pub const TOP_FEATURES: [FeatureUsage; 4] = [
    FeatureUsage { name: "Nachrichten", usage: 85 },
    FeatureUsage { name: "Profil", usage: 72 },
    FeatureUsage { name: "Suche", usage: 68 },
    FeatureUsage { name: "Einstellungen", usage: 45 },
];

/// Activity of a timeframe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalyticsOverview {
    pub timeframe: Timeframe,
    pub user_growth: Vec<DailyCount>,
    pub message_activity: Vec<DailyCount>,
    pub top_features: Vec<FeatureUsage>,
}

impl AnalyticsOverview {
    /// An overview with zero-filled series, shown when loading fails.
    #[must_use]
    pub fn empty(timeframe: Timeframe, now: DateTime<Utc>) -> Self {
        Self {
            timeframe,
            user_growth: daily_buckets(&[], timeframe.days(), now),
            message_activity: daily_buckets(&[], timeframe.days(), now),
            top_features: TOP_FEATURES.to_vec(),
        }
    }

    /// Sign-ups in the window.
    #[must_use]
    pub fn total_signups(&self) -> u64 {
        self.user_growth.iter().map(|d| d.count).sum()
    }

    /// Messages in the window.
    #[must_use]
    pub fn total_messages(&self) -> u64 {
        self.message_activity.iter().map(|d| d.count).sum()
    }

    /// Largest daily value across both series (at least 1, for bar scaling).
    #[must_use]
    pub fn peak(&self) -> u64 {
        self.user_growth
            .iter()
            .chain(&self.message_activity)
            .map(|d| d.count)
            .max()
            .unwrap_or(0)
            .max(1)
    }

    /// Bar height of `day` in percent of [`Self::peak`].
    #[must_use]
    pub fn bar_percent(&self, day: &DailyCount) -> u64 {
        day.count.saturating_mul(100) / self.peak()
    }
}

/// Group timestamps by UTC day over the `days` days ending at `now`.
///
/// Days without events are present with a count of 0, oldest first.
#[must_use]
pub fn daily_buckets(timestamps: &[DateTime<Utc>], days: i64, now: DateTime<Utc>) -> Vec<DailyCount> {
    let mut by_day: HashMap<NaiveDate, u64> = HashMap::new();
    for ts in timestamps {
        *by_day.entry(ts.date_naive()).or_default() += 1;
    }

    (0..days)
        .rev()
        .map(|offset| {
            let date = (now - Duration::days(offset)).date_naive();
            DailyCount {
                date,
                count: by_day.get(&date).copied().unwrap_or(0),
            }
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_timeframe_params() {
        assert_eq!(Timeframe::from_param(Some("7d")).days(), 7);
        assert_eq!(Timeframe::from_param(Some("90d")).days(), 90);
        assert_eq!(Timeframe::from_param(Some("1y")), Timeframe::Month);
        assert_eq!(Timeframe::from_param(None).as_str(), "30d");
    }

    #[test]
    fn test_buckets_are_zero_filled_and_ordered() {
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap();
        let events = [
            Utc.with_ymd_and_hms(2025, 3, 10, 1, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 3, 10, 23, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 3, 8, 9, 0, 0).unwrap(),
            // Outside the window
            Utc.with_ymd_and_hms(2025, 2, 1, 9, 0, 0).unwrap(),
        ];

        let buckets = daily_buckets(&events, 7, now);
        assert_eq!(buckets.len(), 7);
        assert_eq!(buckets[0].date, NaiveDate::from_ymd_opt(2025, 3, 4).unwrap());
        assert_eq!(buckets[6].date, NaiveDate::from_ymd_opt(2025, 3, 10).unwrap());
        assert_eq!(buckets[6].count, 2);
        assert_eq!(buckets[4].count, 1);
        assert_eq!(buckets.iter().map(|b| b.count).sum::<u64>(), 3);
    }

    #[test]
    fn test_peak_never_zero() {
        let overview = AnalyticsOverview {
            timeframe: Timeframe::Week,
            user_growth: vec![],
            message_activity: vec![],
            top_features: TOP_FEATURES.to_vec(),
        };
        assert_eq!(overview.peak(), 1);
        assert_eq!(overview.total_signups(), 0);
    }

    #[test]
    fn test_empty_overview_keeps_window_length() {
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap();
        let overview = AnalyticsOverview::empty(Timeframe::Quarter, now);
        assert_eq!(overview.user_growth.len(), 90);
        assert_eq!(overview.message_activity.len(), 90);
        assert_eq!(overview.total_messages(), 0);
        assert_eq!(overview.bar_percent(&overview.user_growth[0]), 0);
    }
}
