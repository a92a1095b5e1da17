use clap::Subcommand;
use serde::Serialize;
use stempeluhr_core::{CommutePhase, TrackingEvent, TrackingState};

use super::{parse_kind, status_line, App};

#[derive(Subcommand)]
pub enum TrackAction {
    /// Start a session by hand
    Start {
        /// Session kind: office, home, or manual
        #[arg(long, default_value = "manual")]
        kind: String,
        /// Note to store on the entry
        #[arg(long)]
        note: Option<String>,
    },
    /// Stop the running session
    Stop,
    /// Pause the running session
    Pause,
    /// Resume a paused session
    Resume,
    /// Print the current tracking state
    Status {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Serialize)]
struct StatusView {
    tracking: TrackingState,
    phase: CommutePhase,
}

pub fn run(action: TrackAction) -> Result<(), Box<dyn std::error::Error>> {
    let app = App::open()?;

    match action {
        TrackAction::Start { kind, note } => {
            let kind = parse_kind(&kind)?;
            if app.machine.state().is_idle() {
                app.machine.process_event(TrackingEvent::ManualStart { kind })?;
                if let TrackingState::Tracking {
                    entry_id,
                    start_time,
                    ..
                } = app.machine.state()
                {
                    if let Some(note) = note {
                        app.db.set_notes(&entry_id, Some(note.as_str()))?;
                    }
                    println!(
                        "started {} at {} (entry {entry_id})",
                        kind.as_str(),
                        start_time.format("%H:%M")
                    );
                }
            } else {
                println!("a session is already open");
            }
        }
        TrackAction::Stop => match app.machine.state().active_entry_id() {
            None => println!("no open session"),
            Some(id) => {
                let id = id.to_string();
                app.machine.process_event(TrackingEvent::ManualStop)?;
                match app.db.entry_with_pauses(&id)? {
                    Some(entry) => println!(
                        "stopped (entry {id}, net {} min)",
                        entry.net_duration(app.now()).num_minutes()
                    ),
                    None => println!("stopped"),
                }
            }
        },
        TrackAction::Pause => {
            app.machine.process_event(TrackingEvent::PauseStart)?;
            match app.machine.state() {
                TrackingState::Paused { .. } => println!("paused"),
                _ => println!("no running session to pause"),
            }
        }
        TrackAction::Resume => {
            let was_paused = matches!(app.machine.state(), TrackingState::Paused { .. });
            app.machine.process_event(TrackingEvent::PauseResume)?;
            match app.machine.state() {
                TrackingState::Tracking { .. } if was_paused => println!("resumed"),
                _ => println!("no paused session to resume"),
            }
        }
        TrackAction::Status { json } => {
            if json {
                let view = StatusView {
                    tracking: app.machine.state(),
                    phase: app.phase.current(),
                };
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                println!("{}", status_line(&app.machine.state(), app.phase.current()));
            }
        }
    }

    app.save_phase()?;
    Ok(())
}
