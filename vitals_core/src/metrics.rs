//! Derived metrics over the journal.
//!
//! Every function here is a pure query: the journal and the caller's clock
//! go in, numbers come out. Calendar days are taken in the timezone of the
//! `now` (or `tz`) argument, so a reading at 23:30 UTC can belong to the
//! next day for a caller east of Greenwich.

use crate::{Journal, Reading};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use std::collections::BTreeMap;

/// Points added to the health score per recorded reading
pub const SCORE_INCREMENT: u8 = 5;

/// Upper bound of the health score
pub const MAX_SCORE: u8 = 100;

fn local_date<Tz: TimeZone>(timestamp: &DateTime<Utc>, tz: &Tz) -> NaiveDate {
    timestamp.with_timezone(tz).date_naive()
}

/// Number of readings per calendar day
pub fn daily_counts<Tz: TimeZone>(journal: &Journal, tz: &Tz) -> BTreeMap<NaiveDate, usize> {
    let mut counts = BTreeMap::new();
    for reading in journal.all() {
        *counts.entry(local_date(&reading.timestamp, tz)).or_insert(0) += 1;
    }
    counts
}

/// Readings recorded on the same calendar day as `now`, insertion order
pub fn today_entries<'a, Tz: TimeZone>(
    journal: &'a Journal,
    now: &DateTime<Tz>,
) -> Vec<&'a Reading> {
    let tz = now.timezone();
    let today = now.date_naive();

    journal
        .all()
        .iter()
        .filter(|r| local_date(&r.timestamp, &tz) == today)
        .collect()
}

/// Count of readings recorded on the same calendar day as `now`
pub fn today_count<Tz: TimeZone>(journal: &Journal, now: &DateTime<Tz>) -> usize {
    today_entries(journal, now).len()
}

/// The `limit` most recent readings, newest first
pub fn recent_entries(journal: &Journal, limit: usize) -> Vec<&Reading> {
    journal.all().iter().rev().take(limit).collect()
}

/// Timestamp of the most recently appended reading
pub fn last_entry_time(journal: &Journal) -> Option<DateTime<Utc>> {
    journal.last().map(|r| r.timestamp)
}

/// Consecutive calendar days with at least one reading
///
/// The run is anchored at today when today has a reading, otherwise at
/// yesterday, so the streak survives until the user misses a whole day.
/// Readings after `now` never count.
pub fn streak<Tz: TimeZone>(journal: &Journal, now: &DateTime<Tz>) -> u32 {
    let days = daily_counts(journal, &now.timezone());
    let today = now.date_naive();

    let anchor = if days.contains_key(&today) {
        Some(today)
    } else {
        today.pred_opt().filter(|yesterday| days.contains_key(yesterday))
    };

    let mut count = 0;
    let mut day = anchor;
    while let Some(d) = day.filter(|d| days.contains_key(d)) {
        count += 1;
        day = d.pred_opt();
    }
    count
}

/// Longest run of consecutive days with readings anywhere in the journal
pub fn longest_streak<Tz: TimeZone>(journal: &Journal, tz: &Tz) -> u32 {
    let mut longest = 0;
    let mut run = 0;
    let mut prev: Option<NaiveDate> = None;

    // BTreeMap keys come out sorted and deduplicated
    for day in daily_counts(journal, tz).into_keys() {
        run = match prev.and_then(|p| p.succ_opt()) {
            Some(next) if next == day => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        prev = Some(day);
    }
    longest
}

/// Health score after one more reading has been recorded
///
/// Never decreases and never exceeds [`MAX_SCORE`].
pub fn health_score(prior: u8) -> u8 {
    prior.saturating_add(SCORE_INCREMENT).min(MAX_SCORE)
}

/// Score a freshly loaded session starts from
///
/// Only the journal is persisted, so the score restarts here on every load.
pub fn baseline_score() -> u8 {
    0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BloodSugarContext, ReadingFields};
    use chrono::FixedOffset;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    fn reading(timestamp: DateTime<Utc>) -> Reading {
        ReadingFields {
            systolic: 120,
            diastolic: 80,
            heart_rate: 60,
            oxygen_saturation: 98,
            weight: 70.0,
            temperature: 36.6,
            blood_sugar: 90,
            blood_sugar_context: BloodSugarContext::Fasting,
            notes: String::new(),
        }
        .stamp(timestamp)
    }

    fn journal_at(timestamps: &[DateTime<Utc>]) -> Journal {
        Journal::from_readings(timestamps.iter().copied().map(reading).collect())
    }

    #[test]
    fn test_today_count_across_midnight() {
        let journal = journal_at(&[
            at(2024, 1, 1, 10, 0),
            at(2024, 1, 1, 23, 59),
            at(2024, 1, 2, 0, 1),
        ]);

        assert_eq!(today_count(&journal, &at(2024, 1, 1, 12, 0)), 2);
        assert_eq!(today_count(&journal, &at(2024, 1, 2, 8, 0)), 1);
        assert_eq!(today_count(&journal, &at(2024, 1, 3, 8, 0)), 0);
    }

    #[test]
    fn test_today_count_uses_callers_timezone() {
        let journal = journal_at(&[at(2024, 1, 1, 23, 30)]);
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();

        // 23:30 UTC is 01:30 on Jan 2 at +02:00
        let now = plus_two.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap();
        assert_eq!(today_count(&journal, &now), 1);

        let now = plus_two.with_ymd_and_hms(2024, 1, 1, 20, 0, 0).unwrap();
        assert_eq!(today_count(&journal, &now), 0);
    }

    #[test]
    fn test_today_count_ignores_same_day_other_month() {
        let journal = journal_at(&[at(2024, 2, 1, 9, 0), at(2023, 1, 1, 9, 0)]);
        assert_eq!(today_count(&journal, &at(2024, 1, 1, 12, 0)), 0);
    }

    #[test]
    fn test_last_entry_time() {
        assert_eq!(last_entry_time(&Journal::new()), None);

        let journal = journal_at(&[at(2024, 3, 5, 9, 0), at(2024, 3, 5, 9, 5)]);
        assert_eq!(last_entry_time(&journal), Some(at(2024, 3, 5, 9, 5)));
    }

    #[test]
    fn test_streak_empty_journal() {
        assert_eq!(streak(&Journal::new(), &at(2024, 3, 5, 9, 0)), 0);
    }

    #[test]
    fn test_streak_counts_back_from_today() {
        let journal = journal_at(&[
            at(2024, 3, 1, 8, 0),
            at(2024, 3, 3, 8, 0),
            at(2024, 3, 4, 8, 0),
            at(2024, 3, 4, 20, 0),
            at(2024, 3, 5, 8, 0),
        ]);

        // Mar 2 is empty, so the run is Mar 3..=5
        assert_eq!(streak(&journal, &at(2024, 3, 5, 12, 0)), 3);
    }

    #[test]
    fn test_streak_survives_empty_today() {
        let journal = journal_at(&[at(2024, 3, 3, 8, 0), at(2024, 3, 4, 8, 0)]);
        assert_eq!(streak(&journal, &at(2024, 3, 5, 7, 0)), 2);
    }

    #[test]
    fn test_streak_broken_by_missed_day() {
        let journal = journal_at(&[at(2024, 3, 2, 8, 0), at(2024, 3, 3, 8, 0)]);
        assert_eq!(streak(&journal, &at(2024, 3, 5, 7, 0)), 0);
    }

    #[test]
    fn test_streak_across_month_boundary() {
        let journal = journal_at(&[
            at(2024, 2, 28, 8, 0),
            at(2024, 2, 29, 8, 0),
            at(2024, 3, 1, 8, 0),
        ]);
        assert_eq!(streak(&journal, &at(2024, 3, 1, 22, 0)), 3);
    }

    #[test]
    fn test_streak_ignores_future_readings() {
        let journal = journal_at(&[at(2024, 3, 5, 8, 0), at(2024, 3, 6, 8, 0)]);
        assert_eq!(streak(&journal, &at(2024, 3, 5, 12, 0)), 1);
    }

    #[test]
    fn test_streak_is_repeatable() {
        let journal = journal_at(&[at(2024, 3, 4, 8, 0), at(2024, 3, 5, 8, 0)]);
        let now = at(2024, 3, 5, 12, 0);
        assert_eq!(streak(&journal, &now), streak(&journal, &now));
    }

    #[test]
    fn test_longest_streak() {
        let journal = journal_at(&[
            at(2024, 1, 1, 8, 0),
            at(2024, 1, 2, 8, 0),
            at(2024, 1, 3, 8, 0),
            at(2024, 1, 10, 8, 0),
            at(2024, 1, 11, 8, 0),
        ]);
        assert_eq!(longest_streak(&journal, &Utc), 3);
        assert_eq!(longest_streak(&Journal::new(), &Utc), 0);
    }

    #[test]
    fn test_daily_counts() {
        let journal = journal_at(&[
            at(2024, 1, 1, 8, 0),
            at(2024, 1, 1, 9, 0),
            at(2024, 1, 2, 8, 0),
        ]);
        let counts = daily_counts(&journal, &Utc);

        assert_eq!(counts.len(), 2);
        assert_eq!(counts[&NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()], 2);
    }

    #[test]
    fn test_today_entries_and_recent() {
        let journal = journal_at(&[
            at(2024, 3, 4, 8, 0),
            at(2024, 3, 5, 8, 0),
            at(2024, 3, 5, 9, 0),
        ]);

        let today = today_entries(&journal, &at(2024, 3, 5, 12, 0));
        assert_eq!(today.len(), 2);
        assert_eq!(today[0].timestamp, at(2024, 3, 5, 8, 0));

        let recent = recent_entries(&journal, 2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].timestamp, at(2024, 3, 5, 9, 0));
        assert_eq!(recent[1].timestamp, at(2024, 3, 5, 8, 0));
    }

    #[test]
    fn test_health_score_saturates() {
        assert_eq!(health_score(baseline_score()), 5);
        assert_eq!(health_score(95), 100);
        assert_eq!(health_score(98), 100);
        assert_eq!(health_score(100), 100);
        assert_eq!(health_score(u8::MAX), 100);
    }

    #[test]
    fn test_health_score_never_decreases() {
        let mut score = baseline_score();
        for _ in 0..50 {
            let next = health_score(score);
            assert!(next >= score);
            assert!(next <= MAX_SCORE);
            score = next;
        }
        assert_eq!(score, MAX_SCORE);
    }
}
