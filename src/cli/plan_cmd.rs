//! Plan command and the schedule flags shared with `build`

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Args;
use serde::Serialize;

use super::output::Output;
use crate::domain::{build_plan, Corpus, Day, Plan, PlanOrder, PlanStats, Preset, Rates, TrackSet};
use crate::storage::ScheduleSection;

/// Schedule overrides; anything left unset comes from the config file
#[derive(Args, Debug, Clone, Default)]
pub struct ScheduleArgs {
    /// Book to read (repeatable). With no books or presets the whole corpus is read
    #[arg(long = "book", value_name = "NAME")]
    pub books: Vec<String>,

    /// Preset group of books (repeatable)
    #[arg(long = "preset", value_enum, value_name = "PRESET")]
    pub presets: Vec<Preset>,

    /// Old Testament chapters per day
    #[arg(long, value_name = "N")]
    pub old_per_day: Option<u32>,

    /// New Testament chapters per day
    #[arg(long, value_name = "N")]
    pub new_per_day: Option<u32>,

    /// Psalms per day (with --split-psalms)
    #[arg(long, value_name = "N")]
    pub psalms_per_day: Option<u32>,

    /// Proverbs per day (with --split-proverbs)
    #[arg(long, value_name = "N")]
    pub proverbs_per_day: Option<u32>,

    /// Read Psalms as a separate track
    #[arg(long)]
    pub split_psalms: bool,

    /// Read Proverbs as a separate track
    #[arg(long)]
    pub split_proverbs: bool,

    /// How tracks are interleaved
    #[arg(long, value_enum)]
    pub order: Option<PlanOrder>,

    /// Restart finished tracks until the longest one ends (mixed order only)
    #[arg(long)]
    pub pad: bool,

    /// Produce undated days and ignore weekday limits
    #[arg(long)]
    pub no_dates: bool,

    /// First day of the plan (defaults to today)
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub start: Option<NaiveDate>,

    /// Reading weekdays, comma separated, 0 = Sunday
    #[arg(
        long,
        value_delimiter = ',',
        value_name = "DAYS",
        value_parser = clap::value_parser!(u8).range(0..=6)
    )]
    pub weekdays: Option<Vec<u8>>,
}

impl ScheduleArgs {
    /// Layers these flags over the configured schedule
    pub fn apply(&self, base: &ScheduleSection) -> ScheduleSection {
        let mut section = base.clone();

        if !self.books.is_empty() || !self.presets.is_empty() {
            section.books = self.books.clone();
            section.presets = self.presets.clone();
        }

        if let Some(n) = self.old_per_day {
            section.old_per_day = n;
        }
        if let Some(n) = self.new_per_day {
            section.new_per_day = n;
        }
        if let Some(n) = self.psalms_per_day {
            section.psalms_per_day = n;
        }
        if let Some(n) = self.proverbs_per_day {
            section.proverbs_per_day = n;
        }

        section.split_psalms |= self.split_psalms;
        section.split_proverbs |= self.split_proverbs;
        section.pad_with_repeats |= self.pad;

        if let Some(order) = self.order {
            section.order = order;
        }
        if self.no_dates {
            section.use_dates = false;
        }
        if self.start.is_some() {
            section.start_date = self.start;
        }
        if let Some(days) = &self.weekdays {
            section.reading_days = days.clone();
        }

        section
    }
}

/// Builds the plan for a schedule section
pub fn resolve_plan(section: &ScheduleSection, corpus: &Corpus, today: NaiveDate) -> Result<Plan> {
    let books = corpus
        .select(&section.selection())
        .context("Failed to select books")?;
    let tracks = TrackSet::build(&books, section.split_psalms, section.split_proverbs);
    let schedule = section.to_schedule(today);

    tracing::debug!(
        books = books.len(),
        old = tracks.old.len(),
        new = tracks.new.len(),
        psalms = tracks.psalms.len(),
        proverbs = tracks.proverbs.len(),
        budget = schedule.reading_day_budget(&tracks),
        "Built tracks"
    );

    Ok(build_plan(&tracks, &schedule))
}

#[derive(Args, Debug)]
pub struct PlanArgs {
    #[command(flatten)]
    pub schedule: ScheduleArgs,

    /// Number of days to list
    #[arg(long, default_value = "7", conflicts_with = "all")]
    pub preview: usize,

    /// List every day
    #[arg(long)]
    pub all: bool,
}

#[derive(Serialize)]
struct PlanReport<'a> {
    order: PlanOrder,
    rates: Rates,
    stats: PlanStats,
    days: &'a [Day],
}

pub fn run(args: PlanArgs, base: &ScheduleSection, corpus: &Corpus, output: &Output) -> Result<()> {
    let section = args.schedule.apply(base);
    output.verbose_ctx("plan", &format!("Schedule: {:?}", section));

    let today = chrono::Local::now().date_naive();
    let plan = resolve_plan(&section, corpus, today)?;
    let stats = plan.stats();
    let days = if args.all {
        plan.days()
    } else {
        plan.preview(args.preview)
    };

    if output.is_json() {
        let schedule = section.to_schedule(today);
        output.data(&PlanReport {
            order: schedule.order,
            rates: schedule.rates,
            stats,
            days,
        });
        return Ok(());
    }

    if plan.is_empty() {
        output.success("Plan is empty: no books selected or every rate is 0");
        return Ok(());
    }

    let span = match (stats.first_date, stats.last_date) {
        (Some(first), Some(last)) => format!(" ({} to {})", first, last),
        _ => String::new(),
    };
    output.line(&format!("{} days{}", stats.days, span));
    output.line(&format!(
        "{} chapters ({} unique), {} order",
        stats.total_chapters,
        stats.unique_chapters,
        section.order.as_str()
    ));
    output.blank();

    for day in days {
        let chapters: Vec<String> = day.chapters.iter().map(|c| c.to_string()).collect();
        output.row(&[day.title().as_str(), chapters.join(", ").as_str()]);
    }

    if days.len() < plan.len() {
        output.line(&format!("... {} more days (use --all)", plan.len() - days.len()));
    }

    Ok(())
}
