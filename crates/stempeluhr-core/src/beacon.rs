//! Desk-beacon presence bookkeeping.
//!
//! The BLE radio lives outside the core; whatever drives it feeds sightings
//! and out-of-range observations in here and polls [`timeout_due`]. Edges
//! come out exactly once, so a chatty scanner cannot produce duplicate
//! start or stop events downstream.
//!
//! [`timeout_due`]: BeaconPresence::timeout_due

use chrono::{NaiveDateTime, NaiveTime};

use crate::model::BeaconConfig;

/// A presence transition worth acting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceEdge {
    /// The beacon came into range.
    Detected,
    /// The beacon left range; the loss countdown is running.
    Lost,
}

/// A loss countdown that has run out.
///
/// `last_seen` is the final sighting before the beacon disappeared; session
/// ends are backdated to it rather than to the timeout instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeaconTimeout {
    pub timestamp: NaiveDateTime,
    pub last_seen: Option<NaiveDateTime>,
}

/// Edge-triggered presence state for the configured beacon.
#[derive(Debug, Clone)]
pub struct BeaconPresence {
    config: BeaconConfig,
    in_range: bool,
    last_seen: Option<NaiveDateTime>,
    out_of_range_since: Option<NaiveDateTime>,
}

impl BeaconPresence {
    pub fn new(config: BeaconConfig) -> Self {
        Self {
            config,
            in_range: false,
            last_seen: None,
            out_of_range_since: None,
        }
    }

    /// Feeds one sighting.
    ///
    /// Sightings of other beacons, or of the configured beacon below the
    /// RSSI threshold, change nothing. A qualifying sighting refreshes
    /// `last_seen`, cancels a running loss countdown, and yields `Detected`
    /// when the beacon was previously out of range.
    pub fn observe(
        &mut self,
        beacon_id: &str,
        rssi: i32,
        at: NaiveDateTime,
    ) -> Option<PresenceEdge> {
        if !beacon_id.eq_ignore_ascii_case(&self.config.uuid) {
            return None;
        }
        if let Some(threshold) = self.config.rssi_threshold {
            if rssi < threshold {
                return None;
            }
        }

        self.last_seen = Some(at);
        self.out_of_range_since = None;
        if self.in_range {
            None
        } else {
            self.in_range = true;
            Some(PresenceEdge::Detected)
        }
    }

    /// Records that a scan cycle no longer sees the beacon.
    ///
    /// On the present-to-absent edge the loss countdown starts and `Lost`
    /// is yielded once; repeats while already absent change nothing.
    pub fn mark_out_of_range(&mut self, at: NaiveDateTime) -> Option<PresenceEdge> {
        if !self.in_range {
            return None;
        }
        self.in_range = false;
        self.out_of_range_since = Some(at);
        Some(PresenceEdge::Lost)
    }

    /// Whether the loss countdown has run out.
    ///
    /// Yields at most once per `Lost` edge; the caller forwards the result
    /// to [`HomeOfficeTracker::on_beacon_timeout`].
    ///
    /// [`HomeOfficeTracker::on_beacon_timeout`]: crate::home_office::HomeOfficeTracker::on_beacon_timeout
    pub fn timeout_due(&mut self, now: NaiveDateTime) -> Option<BeaconTimeout> {
        let since = self.out_of_range_since?;
        let deadline = since + chrono::Duration::minutes(i64::from(self.config.timeout_minutes));
        if now < deadline {
            return None;
        }
        self.out_of_range_since = None;
        Some(BeaconTimeout {
            timestamp: now,
            last_seen: self.last_seen,
        })
    }

    pub fn is_in_range(&self) -> bool {
        self.in_range
    }

    /// The most recent qualifying sighting.
    pub fn last_seen(&self) -> Option<NaiveDateTime> {
        self.last_seen
    }

    pub fn config(&self) -> &BeaconConfig {
        &self.config
    }
}

/// Milliseconds from `now` until the next occurrence of `target`.
///
/// A target at or before `now` is taken to mean tomorrow. Schedulers use
/// this to sleep until a work-window boundary.
pub fn millis_until(now: NaiveTime, target: NaiveTime) -> u64 {
    const DAY_MS: u64 = 24 * 60 * 60 * 1_000;
    let now_ms = millis_of_day(now);
    let target_ms = millis_of_day(target);
    if target_ms > now_ms {
        target_ms - now_ms
    } else {
        DAY_MS - now_ms + target_ms
    }
}

fn millis_of_day(time: NaiveTime) -> u64 {
    use chrono::Timelike;
    u64::from(time.num_seconds_from_midnight()) * 1_000 + u64::from(time.nanosecond()) / 1_000_000
}
