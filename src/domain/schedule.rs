//! Plan scheduler
//!
//! Partitions tracks into daily buckets. Pure: no I/O and no errors. A bad
//! configuration yields an empty or truncated plan instead of failing.
//!
//! Two interleave modes:
//! - **Mixed**: every active track contributes its own rate each day. The plan
//!   runs for as many days as the slowest track needs.
//! - **Sequential**: tracks are drained one at a time (old, psalms, proverbs,
//!   new) from a single combined quota equal to the sum of all rates.

use std::collections::HashSet;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use super::corpus::ChapterRef;
use super::track::{TrackKind, TrackSet};

/// Upper bound on produced days, regardless of configuration
pub const MAX_PLAN_DAYS: usize = 5000;

/// Chapters per day for each track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rates {
    pub old: u32,
    pub new: u32,
    pub psalms: u32,
    pub proverbs: u32,
}

impl Rates {
    pub fn get(&self, kind: TrackKind) -> u32 {
        match kind {
            TrackKind::Old => self.old,
            TrackKind::New => self.new,
            TrackKind::Psalms => self.psalms,
            TrackKind::Proverbs => self.proverbs,
        }
    }

    /// Combined daily quota used by sequential mode
    pub fn total(&self) -> u64 {
        [self.old, self.new, self.psalms, self.proverbs]
            .iter()
            .map(|r| u64::from(*r))
            .sum()
    }
}

/// How tracks are interleaved across days
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum PlanOrder {
    #[default]
    Mixed,
    Sequential,
}

impl PlanOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanOrder::Mixed => "mixed",
            PlanOrder::Sequential => "sequential",
        }
    }
}

/// Set of allowed weekdays, numbered 0 (Sunday) through 6 (Saturday)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekdaySet(u8);

impl WeekdaySet {
    pub const ALL: WeekdaySet = WeekdaySet(0b111_1111);

    /// Builds a set from day numbers; numbers above 6 are ignored
    pub fn from_numbers(days: impl IntoIterator<Item = u8>) -> Self {
        let bits = days
            .into_iter()
            .filter(|d| *d <= 6)
            .fold(0u8, |acc, d| acc | (1 << d));
        Self(bits)
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0 & (1 << day.num_days_from_sunday()) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Day numbers in ascending order
    pub fn numbers(&self) -> Vec<u8> {
        (0..7).filter(|d| self.0 & (1 << d) != 0).collect()
    }
}

impl Default for WeekdaySet {
    fn default() -> Self {
        Self::ALL
    }
}

/// Calendar constraint: dates start here and only allowed weekdays count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calendar {
    pub start: NaiveDate,
    pub weekdays: WeekdaySet,
}

/// Scheduler input besides the tracks themselves
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleConfig {
    pub rates: Rates,
    pub order: PlanOrder,
    pub pad_with_repeats: bool,
    /// `None` produces undated days
    pub calendar: Option<Calendar>,
}

impl ScheduleConfig {
    /// Number of reading days the scheduler will count before stopping
    pub fn reading_day_budget(&self, tracks: &TrackSet) -> usize {
        let needed = TrackKind::DRAW_ORDER
            .iter()
            .map(|kind| days_needed(tracks.get(*kind).len(), self.rates.get(*kind)));

        match self.order {
            PlanOrder::Mixed => needed.max().unwrap_or(0),
            PlanOrder::Sequential => needed.sum(),
        }
    }
}

/// Days a track of `len` chapters needs at `rate` per day; 0 if it never runs
pub fn days_needed(len: usize, rate: u32) -> usize {
    if len == 0 || rate == 0 {
        0
    } else {
        len.div_ceil(rate as usize)
    }
}

/// One day of reading
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Day {
    /// 0-based position in the plan
    pub index: usize,
    pub date: Option<NaiveDate>,
    pub chapters: Vec<ChapterRef>,
}

impl Day {
    /// 1-based day number used in titles and file names
    pub fn number(&self) -> usize {
        self.index + 1
    }

    /// Human title, e.g. `Day 3 - 2026-01-05`
    pub fn title(&self) -> String {
        match self.date {
            Some(date) => format!("Day {} - {}", self.number(), date),
            None => format!("Day {}", self.number()),
        }
    }
}

/// Summary counts for a plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanStats {
    pub days: usize,
    pub total_chapters: usize,
    /// Distinct chapters; lower than the total when padding repeats content
    pub unique_chapters: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
}

/// Ordered days produced by the scheduler
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Plan {
    days: Vec<Day>,
}

impl Plan {
    /// Wraps already-built days, renumbering them in order and dropping empty ones
    pub fn from_days(days: impl IntoIterator<Item = Day>) -> Self {
        let days = days
            .into_iter()
            .filter(|d| !d.chapters.is_empty())
            .take(MAX_PLAN_DAYS)
            .enumerate()
            .map(|(index, day)| Day { index, ..day })
            .collect();

        Self { days }
    }

    pub fn days(&self) -> &[Day] {
        &self.days
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// The first `n` days
    pub fn preview(&self, n: usize) -> &[Day] {
        &self.days[..n.min(self.days.len())]
    }

    /// Total chapter slots across all days
    pub fn chapter_count(&self) -> usize {
        self.days.iter().map(|d| d.chapters.len()).sum()
    }

    pub fn stats(&self) -> PlanStats {
        let unique: HashSet<u32> = self
            .days
            .iter()
            .flat_map(|d| d.chapters.iter().map(|c| c.global_id))
            .collect();

        PlanStats {
            days: self.days.len(),
            total_chapters: self.chapter_count(),
            unique_chapters: unique.len(),
            first_date: self.days.first().and_then(|d| d.date),
            last_date: self.days.last().and_then(|d| d.date),
        }
    }
}

/// Read position within one track
struct Cursor<'a> {
    chapters: &'a [ChapterRef],
    rate: usize,
    /// Grows without bound while padding; the position is `idx % len`
    idx: usize,
}

impl<'a> Cursor<'a> {
    /// A day takes at most one full pass over the track, even when padding
    fn new(chapters: &'a [ChapterRef], rate: u32) -> Self {
        Self {
            chapters,
            rate: (rate as usize).min(chapters.len()),
            idx: 0,
        }
    }

    fn is_active(&self) -> bool {
        self.rate > 0 && !self.chapters.is_empty()
    }

    fn remaining(&self) -> bool {
        self.idx < self.chapters.len()
    }

    /// Pulls up to `rate` chapters, wrapping around when padding
    fn pull_rate(&mut self, pad: bool, out: &mut Vec<ChapterRef>) {
        if !self.is_active() {
            return;
        }

        for _ in 0..self.rate {
            if self.remaining() {
                out.push(self.chapters[self.idx].clone());
            } else if pad {
                out.push(self.chapters[self.idx % self.chapters.len()].clone());
            } else {
                break;
            }
            self.idx += 1;
        }
    }

    /// Pulls from the remaining content until `quota` is spent or the track ends
    fn pull_quota(&mut self, quota: &mut usize, out: &mut Vec<ChapterRef>) {
        if !self.is_active() {
            return;
        }

        while *quota > 0 && self.remaining() {
            out.push(self.chapters[self.idx].clone());
            self.idx += 1;
            *quota -= 1;
        }
    }
}

/// Builds the day-by-day plan from tracks
pub fn build_plan(tracks: &TrackSet, config: &ScheduleConfig) -> Plan {
    if config.calendar.is_some_and(|c| c.weekdays.is_empty()) {
        return Plan::default();
    }

    let budget = config.reading_day_budget(tracks);
    let mut cursors: Vec<Cursor<'_>> = TrackKind::DRAW_ORDER
        .iter()
        .map(|kind| Cursor::new(tracks.get(*kind), config.rates.get(*kind)))
        .collect();

    let mut days: Vec<Day> = Vec::new();
    let mut date = config.calendar.map(|c| c.start);
    let mut counted = 0;

    while counted < budget && days.len() < MAX_PLAN_DAYS {
        let allowed = match (config.calendar, date) {
            (Some(calendar), Some(current)) => calendar.weekdays.contains(current.weekday()),
            _ => true,
        };

        if allowed {
            let mut chapters = Vec::new();

            match config.order {
                PlanOrder::Mixed => {
                    for cursor in cursors.iter_mut() {
                        cursor.pull_rate(config.pad_with_repeats, &mut chapters);
                    }
                }
                PlanOrder::Sequential => {
                    let mut quota = usize::try_from(config.rates.total()).unwrap_or(usize::MAX);
                    for cursor in cursors.iter_mut() {
                        cursor.pull_quota(&mut quota, &mut chapters);
                    }
                }
            }

            if !chapters.is_empty() {
                days.push(Day {
                    index: days.len(),
                    date,
                    chapters,
                });
            }
            counted += 1;
        }

        if let Some(current) = date {
            match current.succ_opt() {
                Some(next) => date = Some(next),
                None => break,
            }
        }
    }

    Plan { days }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::corpus::{Corpus, Selection};
    use proptest::prelude::*;

    fn synthetic(name: &str, first_id: u32, len: usize) -> Vec<ChapterRef> {
        (0..len as u32)
            .map(|i| ChapterRef {
                book: name.to_string(),
                chapter: i + 1,
                global_id: first_id + i,
            })
            .collect()
    }

    fn two_tracks(old_len: usize, new_len: usize) -> TrackSet {
        TrackSet {
            old: synthetic("Old", 1, old_len),
            new: synthetic("New", 10_000, new_len),
            ..TrackSet::default()
        }
    }

    fn rates(old: u32, new: u32) -> Rates {
        Rates {
            old,
            new,
            ..Rates::default()
        }
    }

    fn count_from(day: &Day, book: &str) -> usize {
        day.chapters.iter().filter(|c| c.book == book).count()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn old_testament_at_three_per_day() {
        let corpus = Corpus::canonical();
        let books: Vec<_> = corpus
            .select(&Selection::All)
            .unwrap()
            .into_iter()
            .filter(|b| b.is_old_testament())
            .collect();
        let tracks = TrackSet::build(&books, false, false);

        let config = ScheduleConfig {
            rates: rates(3, 0),
            ..ScheduleConfig::default()
        };
        let plan = build_plan(&tracks, &config);

        assert_eq!(plan.len(), 310);
        assert_eq!(plan.days().last().unwrap().chapters.len(), 2);
        assert!(plan.days().iter().all(|d| d.date.is_none()));
        assert_eq!(plan.days()[0].chapters[0].to_string(), "Genesis 1");
        assert_eq!(plan.days()[309].chapters[1].to_string(), "Malachi 4");
    }

    #[test]
    fn padding_wraps_shorter_track() {
        let tracks = two_tracks(10, 6);
        let config = ScheduleConfig {
            rates: rates(2, 1),
            pad_with_repeats: true,
            ..ScheduleConfig::default()
        };
        let plan = build_plan(&tracks, &config);

        assert_eq!(plan.len(), 6);
        let old_ids = |day: &Day| -> Vec<u32> {
            day.chapters
                .iter()
                .filter(|c| c.book == "Old")
                .map(|c| c.global_id - 1)
                .collect()
        };
        assert_eq!(old_ids(&plan.days()[4]), vec![8, 9]);
        assert_eq!(old_ids(&plan.days()[5]), vec![0, 1]);
        assert_eq!(plan.days()[5].chapters.last().unwrap().chapter, 6);
    }

    #[test]
    fn without_padding_exhausted_track_goes_silent() {
        let tracks = two_tracks(4, 6);
        let config = ScheduleConfig {
            rates: rates(2, 1),
            ..ScheduleConfig::default()
        };
        let plan = build_plan(&tracks, &config);

        assert_eq!(plan.len(), 6);
        for day in &plan.days()[2..] {
            assert_eq!(count_from(day, "Old"), 0);
            assert_eq!(count_from(day, "New"), 1);
        }
    }

    #[test]
    fn mixed_draw_order_is_old_psalms_proverbs_new() {
        let tracks = TrackSet {
            old: synthetic("Old", 1, 3),
            psalms: synthetic("Psalms", 100, 3),
            proverbs: synthetic("Proverbs", 200, 3),
            new: synthetic("New", 300, 3),
        };
        let config = ScheduleConfig {
            rates: Rates {
                old: 1,
                new: 1,
                psalms: 1,
                proverbs: 1,
            },
            ..ScheduleConfig::default()
        };
        let plan = build_plan(&tracks, &config);

        let books: Vec<_> = plan.days()[0].chapters.iter().map(|c| c.book.as_str()).collect();
        assert_eq!(books, vec!["Old", "Psalms", "Proverbs", "New"]);
    }

    #[test]
    fn sequential_drains_tracks_in_priority_order() {
        let tracks = TrackSet {
            old: synthetic("Old", 1, 5),
            proverbs: synthetic("Proverbs", 100, 2),
            new: synthetic("New", 200, 4),
            ..TrackSet::default()
        };
        let config = ScheduleConfig {
            rates: Rates {
                old: 2,
                new: 1,
                psalms: 0,
                proverbs: 1,
            },
            order: PlanOrder::Sequential,
            ..ScheduleConfig::default()
        };

        assert_eq!(config.reading_day_budget(&tracks), 3 + 4 + 2);

        let plan = build_plan(&tracks, &config);
        let flat: Vec<_> = plan
            .days()
            .iter()
            .flat_map(|d| d.chapters.iter().map(|c| c.book.as_str()))
            .collect();

        // Combined quota of 4 per day; 11 chapters fill three days
        assert_eq!(plan.len(), 3);
        assert_eq!(plan.days()[0].chapters.len(), 4);
        assert_eq!(plan.days()[1].chapters.len(), 4);
        assert_eq!(plan.days()[2].chapters.len(), 3);
        assert_eq!(
            flat,
            vec!["Old", "Old", "Old", "Old", "Old", "Proverbs", "Proverbs", "New", "New", "New", "New"]
        );
    }

    #[test]
    fn sequential_ignores_padding() {
        let tracks = two_tracks(3, 0);
        let config = ScheduleConfig {
            rates: rates(2, 0),
            order: PlanOrder::Sequential,
            pad_with_repeats: true,
            ..ScheduleConfig::default()
        };
        let plan = build_plan(&tracks, &config);

        assert_eq!(plan.chapter_count(), 3);
        assert_eq!(plan.len(), 2);
    }

    #[test]
    fn zero_rate_track_never_contributes() {
        let tracks = two_tracks(5, 5);
        for order in [PlanOrder::Mixed, PlanOrder::Sequential] {
            for pad in [false, true] {
                let config = ScheduleConfig {
                    rates: rates(0, 1),
                    order,
                    pad_with_repeats: pad,
                    calendar: None,
                };
                let plan = build_plan(&tracks, &config);

                assert_eq!(plan.len(), 5);
                assert!(plan.days().iter().all(|d| count_from(d, "Old") == 0));
            }
        }
    }

    #[test]
    fn huge_sequential_rates_do_not_overflow_the_quota() {
        let tracks = two_tracks(7, 3);
        let config = ScheduleConfig {
            rates: rates(u32::MAX, 1),
            order: PlanOrder::Sequential,
            ..ScheduleConfig::default()
        };
        assert_eq!(config.rates.total(), u64::from(u32::MAX) + 1);

        let plan = build_plan(&tracks, &config);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.chapter_count(), 10);
    }

    #[test]
    fn padded_day_takes_at_most_one_pass() {
        let tracks = two_tracks(4, 3);
        let config = ScheduleConfig {
            rates: rates(u32::MAX, 1),
            pad_with_repeats: true,
            ..ScheduleConfig::default()
        };
        let plan = build_plan(&tracks, &config);

        assert_eq!(plan.len(), 3);
        for day in plan.days() {
            let old: Vec<u32> = day
                .chapters
                .iter()
                .filter(|c| c.book == "Old")
                .map(|c| c.global_id)
                .collect();
            assert_eq!(old, vec![1, 2, 3, 4]);
        }
    }

    #[test]
    fn all_rates_zero_yields_empty_plan() {
        let tracks = two_tracks(5, 5);
        let plan = build_plan(&tracks, &ScheduleConfig::default());
        assert!(plan.is_empty());
    }

    #[test]
    fn empty_selection_yields_empty_plan() {
        let config = ScheduleConfig {
            rates: rates(3, 1),
            pad_with_repeats: true,
            ..ScheduleConfig::default()
        };
        assert!(build_plan(&TrackSet::default(), &config).is_empty());
    }

    #[test]
    fn empty_weekday_set_does_not_hang() {
        let config = ScheduleConfig {
            rates: rates(1, 0),
            calendar: Some(Calendar {
                start: date(2026, 1, 1),
                weekdays: WeekdaySet::from_numbers([]),
            }),
            ..ScheduleConfig::default()
        };
        assert!(build_plan(&two_tracks(5, 0), &config).is_empty());
    }

    #[test]
    fn calendar_skips_disallowed_weekdays() {
        // 2026-01-05 is a Monday
        let config = ScheduleConfig {
            rates: rates(1, 0),
            calendar: Some(Calendar {
                start: date(2026, 1, 5),
                weekdays: WeekdaySet::from_numbers([1, 3, 5]),
            }),
            ..ScheduleConfig::default()
        };
        let plan = build_plan(&two_tracks(4, 0), &config);

        let dates: Vec<_> = plan.days().iter().map(|d| d.date.unwrap()).collect();
        assert_eq!(
            dates,
            vec![date(2026, 1, 5), date(2026, 1, 7), date(2026, 1, 9), date(2026, 1, 12)]
        );
        assert_eq!(plan.days()[3].title(), "Day 4 - 2026-01-12");
    }

    #[test]
    fn sequential_empty_days_still_consume_calendar() {
        let tracks = two_tracks(2, 2);
        let config = ScheduleConfig {
            rates: rates(1, 1),
            order: PlanOrder::Sequential,
            calendar: Some(Calendar {
                start: date(2026, 3, 1),
                weekdays: WeekdaySet::ALL,
            }),
            ..ScheduleConfig::default()
        };
        let plan = build_plan(&tracks, &config);

        assert_eq!(config.reading_day_budget(&tracks), 4);
        assert_eq!(plan.len(), 2);
        assert_eq!(plan.days()[1].date, Some(date(2026, 3, 2)));
    }

    #[test]
    fn plan_is_capped() {
        let tracks = two_tracks(6000, 0);
        let config = ScheduleConfig {
            rates: rates(1, 0),
            ..ScheduleConfig::default()
        };
        assert_eq!(build_plan(&tracks, &config).len(), MAX_PLAN_DAYS);
    }

    #[test]
    fn stats_count_repeats() {
        let tracks = two_tracks(2, 6);
        let config = ScheduleConfig {
            rates: rates(1, 1),
            pad_with_repeats: true,
            ..ScheduleConfig::default()
        };
        let stats = build_plan(&tracks, &config).stats();

        assert_eq!(stats.days, 6);
        assert_eq!(stats.total_chapters, 12);
        assert_eq!(stats.unique_chapters, 8);
        assert_eq!(stats.first_date, None);
    }

    #[test]
    fn weekday_set_numbers() {
        let set = WeekdaySet::from_numbers([6, 0, 9, 3]);
        assert_eq!(set.numbers(), vec![0, 3, 6]);
        assert!(set.contains(Weekday::Sun));
        assert!(!set.contains(Weekday::Mon));
        assert_eq!(WeekdaySet::default().numbers().len(), 7);
    }

    #[test]
    fn from_days_renumbers_and_drops_empty() {
        let plan = Plan::from_days(vec![
            Day { index: 7, date: None, chapters: synthetic("A", 1, 1) },
            Day { index: 8, date: None, chapters: vec![] },
            Day { index: 9, date: None, chapters: synthetic("B", 5, 2) },
        ]);

        assert_eq!(plan.len(), 2);
        assert_eq!(plan.days()[1].index, 1);
        assert_eq!(plan.preview(10).len(), 2);
    }

    proptest! {
        #[test]
        fn single_track_day_count_and_tail(len in 1usize..400, rate in 1u32..15) {
            let config = ScheduleConfig { rates: rates(rate, 0), ..ScheduleConfig::default() };
            let plan = build_plan(&two_tracks(len, 0), &config);

            let r = rate as usize;
            prop_assert_eq!(plan.len(), len.div_ceil(r));
            let expected_tail = if len % r == 0 { r } else { len % r };
            prop_assert_eq!(plan.days().last().unwrap().chapters.len(), expected_tail);
            prop_assert!(plan.days()[..plan.len() - 1].iter().all(|d| d.chapters.len() == r));
        }

        #[test]
        fn mixed_length_is_max_of_tracks(
            old_len in 0usize..120,
            new_len in 0usize..120,
            old_rate in 0u32..6,
            new_rate in 0u32..6,
            pad in any::<bool>(),
        ) {
            let config = ScheduleConfig {
                rates: rates(old_rate, new_rate),
                pad_with_repeats: pad,
                ..ScheduleConfig::default()
            };
            let plan = build_plan(&two_tracks(old_len, new_len), &config);

            let expected = days_needed(old_len, old_rate).max(days_needed(new_len, new_rate));
            prop_assert_eq!(plan.len(), expected);
            prop_assert!(plan.days().iter().all(|d| !d.chapters.is_empty()));
        }

        #[test]
        fn sequential_budget_is_sum_and_content_is_complete(
            old_len in 0usize..80,
            new_len in 0usize..80,
            old_rate in 0u32..5,
            new_rate in 0u32..5,
        ) {
            let tracks = two_tracks(old_len, new_len);
            let config = ScheduleConfig {
                rates: rates(old_rate, new_rate),
                order: PlanOrder::Sequential,
                ..ScheduleConfig::default()
            };
            let plan = build_plan(&tracks, &config);

            let budget = days_needed(old_len, old_rate) + days_needed(new_len, new_rate);
            prop_assert_eq!(config.reading_day_budget(&tracks), budget);
            prop_assert!(plan.len() <= budget);

            let old_active = if old_rate > 0 { old_len } else { 0 };
            let new_active = if new_rate > 0 { new_len } else { 0 };
            let active = old_active + new_active;
            prop_assert_eq!(plan.chapter_count(), active);
            if old_rate == 0 || new_rate == 0 {
                prop_assert_eq!(plan.len(), budget);
            }
        }

        #[test]
        fn exhausted_track_without_padding_contributes_nothing(
            old_len in 1usize..40,
            extra in 1usize..40,
            rate in 1u32..4,
        ) {
            let new_len = days_needed(old_len, rate) + extra;
            let config = ScheduleConfig { rates: rates(rate, 1), ..ScheduleConfig::default() };
            let plan = build_plan(&two_tracks(old_len, new_len), &config);

            let last_old_day = days_needed(old_len, rate);
            for day in &plan.days()[last_old_day..] {
                prop_assert_eq!(count_from(day, "Old"), 0);
                prop_assert_eq!(count_from(day, "New"), 1);
            }
        }

        #[test]
        fn padding_is_a_uniform_cycle(
            old_len in 1usize..30,
            rate in 1u32..5,
            new_len in 1usize..200,
        ) {
            let config = ScheduleConfig {
                rates: rates(rate, 1),
                pad_with_repeats: true,
                ..ScheduleConfig::default()
            };
            let plan = build_plan(&two_tracks(old_len, new_len), &config);

            let r = (rate as usize).min(old_len);
            for day in plan.days() {
                let old: Vec<_> = day.chapters.iter().filter(|c| c.book == "Old").collect();
                prop_assert_eq!(old.len(), r);
                for (j, chapter) in old.iter().enumerate() {
                    let expected = (day.index * r + j) % old_len;
                    prop_assert_eq!(chapter.global_id as usize - 1, expected);
                }
            }
        }

        #[test]
        fn calendar_dates_follow_allowed_weekdays(
            offset in 0i64..400,
            mask in 1u8..128,
            len in 1usize..60,
        ) {
            let start = date(2025, 1, 1) + chrono::Duration::days(offset);
            let weekdays = WeekdaySet::from_numbers((0..7).filter(|d| mask & (1 << d) != 0));
            let config = ScheduleConfig {
                rates: rates(1, 0),
                calendar: Some(Calendar { start, weekdays }),
                ..ScheduleConfig::default()
            };
            let plan = build_plan(&two_tracks(len, 0), &config);

            let expected: Vec<NaiveDate> = start
                .iter_days()
                .filter(|d| weekdays.contains(d.weekday()))
                .take(len)
                .collect();
            let actual: Vec<NaiveDate> = plan.days().iter().filter_map(|d| d.date).collect();
            prop_assert_eq!(actual, expected);
        }
    }
}
