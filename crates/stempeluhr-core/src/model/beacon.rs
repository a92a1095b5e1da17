//! BLE beacon configuration.

pub const DEFAULT_SCAN_INTERVAL_MS: u64 = 60_000;
pub const DEFAULT_TIMEOUT_MINUTES: u32 = 10;

/// Configuration for the desk-beacon watchdog.
///
/// The actual BLE scanning lives outside the core; this configures the
/// presence bookkeeping in [`crate::beacon::BeaconPresence`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeaconConfig {
    /// UUID of the beacon to monitor, compared case-insensitively.
    pub uuid: String,
    /// Time between scans in milliseconds.
    pub scan_interval_ms: u64,
    /// Minutes without a sighting before the beacon counts as lost.
    pub timeout_minutes: u32,
    /// Minimum signal strength in dBm for a sighting to count; `None`
    /// accepts any strength.
    pub rssi_threshold: Option<i32>,
}

impl BeaconConfig {
    pub fn new(uuid: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            scan_interval_ms: DEFAULT_SCAN_INTERVAL_MS,
            timeout_minutes: DEFAULT_TIMEOUT_MINUTES,
            rssi_threshold: None,
        }
    }
}
