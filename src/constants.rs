//! Application-wide constants and defaults.

use std::time::Duration;

/// Resolution of the cooperative scheduler. Every sensor poll, signal check
/// and sync countdown advances on this tick.
pub const TICK: Duration = Duration::from_secs(1);

/// Total attempts for one transit API fetch (first try included).
pub const SCHEDULE_MAX_ATTEMPTS: u32 = 3;

/// Flat delay between transit API retry attempts.
pub const SCHEDULE_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Total attempts for one Hue bridge call that timed out (first try included).
pub const BRIDGE_MAX_ATTEMPTS: u32 = 3;

/// Base delay for exponential backoff on Hue bridge timeouts. Doubles on
/// each attempt, with jitter.
pub const BRIDGE_BACKOFF_BASE: Duration = Duration::from_millis(250);

/// Request timeout for Hue bridge calls. Device timeouts are the one
/// retryable bridge failure, so they must be detectable.
pub const BRIDGE_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Lead applied to a fresh kill-switch reference instant. Guards against a
/// button event that lands in the same second as the watch (re)start.
pub const REFERENCE_LEAD_SECS: i64 = 1;

/// Datetime layout of the HAFAS feed's `date`/`time` string pairs.
pub const HAFAS_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Timestamp layout of the Hue sensor `lastupdated` field (naive UTC).
pub const SENSOR_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Host header override required by the Mobiliteit.lu travel planner.
pub const TRANSIT_HOST_HEADER: &str = "travelplanner.mobiliteit.lu";

/// Button event codes treated as benign presses: the watch keeps running.
/// 2xxx/3xxx are the dimmer up/down groups.
pub const DEFAULT_IGNORE_BUTTONS: &[u32] = &[
    2000, 2001, 2002, 2003, 3000, 3001, 3002, 3003,
];

/// Button event codes that terminate the watch without restoring the light.
/// Extends the ignore set with the 4xxx (off) group.
pub const DEFAULT_NO_RESET_BUTTONS: &[u32] = &[
    2000, 2001, 2002, 2003, 3000, 3001, 3002, 3003, 4000, 4001, 4002, 4003,
];

/// Default status code a start switch reports when pressed.
pub const DEFAULT_START_ACTIVATED_CODE: i32 = 1;

/// Default status code written back to a start switch to re-arm it.
pub const DEFAULT_START_IDLE_CODE: i32 = 0;

/// Configuration file name, looked up under the XDG config directory.
pub const CONFIG_FILE: &str = "mobihue.toml";

/// Exit code for fatal errors.
pub const EXIT_FAILURE: i32 = 1;
