use clap::Subcommand;
use stempeluhr_core::{CommuteDayChecker, HomeOfficeTracker, TrackingEvent, ZoneType};

use super::{parse_at, status_line, App};

#[derive(Subcommand)]
pub enum SignalAction {
    /// Feed a geofence entry event
    ZoneEnter {
        /// Zone: home-station, office, or office-station
        zone: String,
        /// Event time, HH:MM or YYYY-MM-DDTHH:MM (default: now)
        #[arg(long)]
        at: Option<String>,
    },
    /// Feed a geofence exit event
    ZoneExit {
        /// Zone: home-station, office, or office-station
        zone: String,
        /// Event time, HH:MM or YYYY-MM-DDTHH:MM (default: now)
        #[arg(long)]
        at: Option<String>,
    },
    /// Feed a beacon sighting
    BeaconSeen {
        /// Beacon id (default: the configured beacon UUID)
        #[arg(long)]
        id: Option<String>,
        /// Event time, HH:MM or YYYY-MM-DDTHH:MM (default: now)
        #[arg(long)]
        at: Option<String>,
    },
    /// Feed a beacon timeout
    BeaconLost {
        /// Event time, HH:MM or YYYY-MM-DDTHH:MM (default: now)
        #[arg(long)]
        at: Option<String>,
        /// Last sighting before the timeout; backdates the session end
        #[arg(long)]
        last_seen: Option<String>,
    },
}

fn parse_zone(value: &str) -> Result<ZoneType, String> {
    match value {
        "home-station" => Ok(ZoneType::HomeStation),
        "office" => Ok(ZoneType::Office),
        "office-station" => Ok(ZoneType::OfficeStation),
        other => Err(format!(
            "unknown zone {other:?} (expected home-station, office, or office-station)"
        )),
    }
}

pub fn run(action: SignalAction) -> Result<(), Box<dyn std::error::Error>> {
    let app = App::open()?;
    let now = app.now();

    match action {
        SignalAction::ZoneEnter { zone, at } => {
            let zone = parse_zone(&zone)?;
            let timestamp = parse_at(at.as_deref(), now)?;
            app.machine
                .process_event(TrackingEvent::GeofenceEntered { zone, timestamp })?;
        }
        SignalAction::ZoneExit { zone, at } => {
            let zone = parse_zone(&zone)?;
            let timestamp = parse_at(at.as_deref(), now)?;
            app.machine
                .process_event(TrackingEvent::GeofenceExited { zone, timestamp })?;
        }
        SignalAction::BeaconSeen { id, at } => {
            let timestamp = parse_at(at.as_deref(), now)?;
            let beacon_id = id
                .or_else(|| app.settings.current().beacon_uuid)
                .unwrap_or_else(|| "beacon".to_string());
            home_office(&app).on_beacon_detected(&beacon_id, timestamp)?;
        }
        SignalAction::BeaconLost { at, last_seen } => {
            let timestamp = parse_at(at.as_deref(), now)?;
            let last_seen = match last_seen.as_deref() {
                Some(value) => Some(parse_at(Some(value), now)?),
                None => None,
            };
            home_office(&app).on_beacon_timeout(timestamp, last_seen)?;
        }
    }

    app.save_phase()?;
    println!("{}", status_line(&app.machine.state(), app.phase.current()));
    Ok(())
}

/// The same sighting/timeout gate the app puts between the beacon scanner
/// and the state machine.
fn home_office(app: &App) -> HomeOfficeTracker {
    HomeOfficeTracker::new(
        app.machine.clone(),
        CommuteDayChecker::new(app.settings.subscribe()),
        app.settings.subscribe(),
    )
}
