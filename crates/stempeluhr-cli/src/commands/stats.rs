use chrono::{Datelike, Duration};
use clap::Subcommand;
use serde::Serialize;
use stempeluhr_core::{DayStats, DaySummary, TrackingRepository, WeekStats};

use super::{parse_date, App};

#[derive(Subcommand)]
pub enum StatsAction {
    /// One day's figures
    Day {
        /// Day, YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<String>,
    },
    /// One week's figures
    Week {
        /// First day of the week, YYYY-MM-DD (default: this week's Monday)
        #[arg(long)]
        start: Option<String>,
    },
}

#[derive(Serialize)]
struct WeekView {
    week: WeekStats,
    days: Vec<DaySummary>,
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let app = App::open()?;
    let now = app.now();

    match action {
        StatsAction::Day { date } => {
            let date = match date.as_deref() {
                Some(value) => parse_date(value)?,
                None => now.date(),
            };
            let entries = app.db.entries_in_range(date, date)?;
            let stats =
                DayStats::compute(&entries, app.settings.current().daily_target_hours(), now);
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        StatsAction::Week { start } => {
            let start = match start.as_deref() {
                Some(value) => parse_date(value)?,
                None => {
                    let today = now.date();
                    today - Duration::days(today.weekday().num_days_from_monday() as i64)
                }
            };
            let entries = app.db.entries_in_range(start, start + Duration::days(6))?;
            let days: Vec<DaySummary> = (0..7)
                .map(|offset| {
                    let date = start + Duration::days(offset);
                    let of_day: Vec<_> = entries
                        .iter()
                        .filter(|e| e.entry.date == date)
                        .cloned()
                        .collect();
                    DaySummary::from_entries(date, &of_day, now)
                })
                .collect();
            let week = WeekStats::compute(&days, app.settings.current().weekly_target_hours);
            println!("{}", serde_json::to_string_pretty(&WeekView { week, days })?);
        }
    }
    Ok(())
}
