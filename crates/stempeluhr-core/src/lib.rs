//! # Stempeluhr Core Library
//!
//! This library provides the core business logic for Stempeluhr, an
//! automatic work-time tracker for commuters and home-office days. It
//! implements a CLI-first philosophy where all operations are available via
//! a standalone CLI binary, with any GUI or platform shell expected to be a
//! thin layer over the same core library.
//!
//! ## Architecture
//!
//! - **Tracking**: An event-driven state machine that turns geofence,
//!   beacon, and manual events into tracking entries with pauses
//! - **Commute**: Phase bookkeeping for the outbound/office/return legs of
//!   an office day, plus commute-day and time-window checks
//! - **Storage**: SQLite-based entry storage and TOML-based configuration
//! - **Export**: Semicolon-delimited CSV in the format German payroll
//!   tooling expects
//!
//! The core is platform-free: geofencing and BLE scanning live in an outer
//! layer that feeds events in, and "now" is injected through [`Clock`] so
//! every time-dependent rule stays testable.
//!
//! ## Key Components
//!
//! - [`TrackingStateMachine`]: Turns events into entries, pauses, and state
//! - [`HomeOfficeTracker`]: Beacon-driven home-office session gating
//! - [`BeaconPresence`]: Edge-triggered beacon presence bookkeeping
//! - [`Database`]: Entry and pause persistence
//! - [`Config`]: Application configuration management
//! - [`CsvExporter`]: Payroll-ready CSV export

pub mod beacon;
pub mod clock;
pub mod commute;
pub mod error;
pub mod export;
pub mod home_office;
pub mod model;
pub mod stats;
pub mod storage;
pub mod tracking;

pub use beacon::{BeaconPresence, BeaconTimeout, PresenceEdge};
pub use clock::{Clock, FixedClock, SystemClock};
pub use commute::{CommuteDayChecker, CommutePhase, CommutePhaseTracker};
pub use error::{ConfigError, CoreError, ExportError, Result, StorageError};
pub use export::CsvExporter;
pub use home_office::HomeOfficeTracker;
pub use model::{
    BeaconConfig, EntryWithPauses, Pause, TimeWindow, TrackingEntry, TrackingType, ZoneType,
};
pub use stats::{DayStats, DaySummary, WeekStats};
pub use storage::{Config, Database, Settings, SettingsStore, TrackingRepository};
pub use tracking::{KvStateStore, StateStore, TrackingEvent, TrackingState, TrackingStateMachine};
