use chrono::{Duration, NaiveDateTime, NaiveTime};
use clap::Subcommand;
use stempeluhr_core::{EntryWithPauses, Pause, TrackingEntry, TrackingRepository};

use super::{parse_date, parse_kind, parse_time, App};

#[derive(Subcommand)]
pub enum EntriesAction {
    /// List entries in a date range
    List {
        /// First day, YYYY-MM-DD (default: 30 days before --to)
        #[arg(long)]
        from: Option<String>,
        /// Last day, YYYY-MM-DD (default: today)
        #[arg(long)]
        to: Option<String>,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Book a completed entry after the fact
    Add {
        /// Day, YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<String>,
        /// Start of work, HH:MM
        #[arg(long)]
        start: String,
        /// End of work, HH:MM
        #[arg(long)]
        end: String,
        /// Entry kind: office, home, or manual
        #[arg(long, default_value = "manual")]
        kind: String,
        /// Note to store on the entry
        #[arg(long)]
        note: Option<String>,
        /// Pause as HH:MM-HH:MM, repeatable
        #[arg(long)]
        pause: Vec<String>,
    },
    /// Mark an entry as reviewed
    Confirm {
        /// Entry id
        id: String,
    },
    /// Delete an entry and its pauses
    Delete {
        /// Entry id
        id: String,
    },
}

fn entry_line(e: &EntryWithPauses, now: NaiveDateTime) -> String {
    let end = match e.entry.end_time {
        Some(end) => end.format("%H:%M").to_string(),
        None => "open".to_string(),
    };
    let mut line = format!(
        "{}  {}  {}-{end}  {}  {} min",
        e.entry.id,
        e.entry.date,
        e.entry.start_time.format("%H:%M"),
        e.entry.kind.as_str(),
        e.net_duration(now).num_minutes(),
    );
    if !e.entry.confirmed {
        line.push_str("  unconfirmed");
    }
    if let Some(notes) = &e.entry.notes {
        line.push_str("  ");
        line.push_str(notes);
    }
    line
}

fn parse_pause(spec: &str) -> Result<(NaiveTime, NaiveTime), String> {
    let (start, end) = spec
        .split_once('-')
        .ok_or_else(|| format!("expected HH:MM-HH:MM, got {spec:?}"))?;
    let start = parse_time(start)?;
    let end = parse_time(end)?;
    if end <= start {
        return Err(format!("pause end {end} is not after its start {start}"));
    }
    Ok((start, end))
}

pub fn run(action: EntriesAction) -> Result<(), Box<dyn std::error::Error>> {
    let app = App::open()?;

    match action {
        EntriesAction::List { from, to, json } => {
            let to = match to.as_deref() {
                Some(value) => parse_date(value)?,
                None => app.now().date(),
            };
            let from = match from.as_deref() {
                Some(value) => parse_date(value)?,
                None => to - Duration::days(30),
            };
            let entries = app.db.entries_in_range(from, to)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else if entries.is_empty() {
                println!("no entries between {from} and {to}");
            } else {
                for e in &entries {
                    println!("{}", entry_line(e, app.now()));
                }
            }
        }
        EntriesAction::Add {
            date,
            start,
            end,
            kind,
            note,
            pause,
        } => {
            let kind = parse_kind(&kind)?;
            let date = match date.as_deref() {
                Some(value) => parse_date(value)?,
                None => app.now().date(),
            };
            let start = date.and_time(parse_time(&start)?);
            let end = date.and_time(parse_time(&end)?);
            if end <= start {
                return Err(format!(
                    "end {} is not after start {}",
                    end.time(),
                    start.time()
                )
                .into());
            }
            let pauses = pause
                .iter()
                .map(|spec| parse_pause(spec))
                .collect::<Result<Vec<_>, _>>()?;

            let mut entry = TrackingEntry::completed(kind, start, end, note);
            // hand-entered, nothing left to review
            entry.confirmed = true;
            app.db.create_entry(&entry)?;
            for (pause_start, pause_end) in pauses {
                app.db.create_pause(&Pause::closed(
                    entry.id.clone(),
                    date.and_time(pause_start),
                    date.and_time(pause_end),
                ))?;
            }
            println!(
                "entry {} added ({date} {}-{})",
                entry.id,
                start.format("%H:%M"),
                end.format("%H:%M")
            );
        }
        EntriesAction::Confirm { id } => {
            if app.db.set_confirmed(&id, true)? {
                println!("entry {id} confirmed");
            } else {
                return Err(format!("no entry with id {id}").into());
            }
        }
        EntriesAction::Delete { id } => {
            if app.db.delete_entry(&id)? {
                println!("entry {id} deleted");
            } else {
                return Err(format!("no entry with id {id}").into());
            }
        }
    }
    Ok(())
}
