// src/services/analytics_service.rs
// DOCUMENTATION: Engagement statistics for the admin dashboard

use crate::db::NoteRepository;
use crate::errors::BoardError;
use chrono::{DateTime, Datelike, Utc, Weekday};
use sqlx::PgPool;
use std::collections::BTreeMap;

const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Short English day name
fn short_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
        Weekday::Sun => "Sun",
    }
}

/// Notes per weekday; every day present
pub fn weekday_buckets<I>(timestamps: I) -> BTreeMap<String, i64>
where
    I: IntoIterator<Item = DateTime<Utc>>,
{
    let mut buckets: BTreeMap<String, i64> = WEEKDAYS
        .iter()
        .map(|d| (short_name(*d).to_string(), 0))
        .collect();

    for t in timestamps {
        *buckets.entry(short_name(t.weekday()).to_string()).or_insert(0) += 1;
    }
    buckets
}

pub struct AnalyticsService;

impl AnalyticsService {
    pub async fn weekly_engagement(pool: &PgPool) -> Result<BTreeMap<String, i64>, BoardError> {
        let timestamps = NoteRepository::list_created_at(pool).await?;
        Ok(weekday_buckets(timestamps))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_empty_input_has_all_days() {
        let buckets = weekday_buckets(Vec::new());
        assert_eq!(buckets.len(), 7);
        assert!(buckets.values().all(|c| *c == 0));
        for day in ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"] {
            assert!(buckets.contains_key(day));
        }
    }

    #[test]
    fn test_counts_by_weekday() {
        // 2024-01-01 was a Monday
        let monday = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        let sunday = Utc.with_ymd_and_hms(2024, 1, 7, 23, 0, 0).unwrap();
        let buckets = weekday_buckets(vec![monday, monday, sunday]);

        assert_eq!(buckets["Mon"], 2);
        assert_eq!(buckets["Sun"], 1);
        assert_eq!(buckets["Wed"], 0);
        assert_eq!(buckets.values().sum::<i64>(), 3);
    }
}
