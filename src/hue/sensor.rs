//! Polled switch facades.
//!
//! Two sensor roles share the bridge's sensor endpoints:
//!
//! - [`KillSwitch`]: a dimmer whose button presses end (or merely annotate)
//!   a running watch. Presses are detected by comparing the sensor's
//!   `lastupdated` timestamp against a reference instant captured when the
//!   watch (re)starts.
//! - [`StartSwitch`]: a status sensor that arms the next watch. Reading an
//!   activation also clears it, so one press starts exactly one watch.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Local, NaiveDateTime, TimeZone, Utc};

use super::bridge::{Bridge, BridgeError, SensorState};
use super::{bridge_retry, call_bridge};
use crate::config::StartSwitchConfig;
use crate::constants::{
    DEFAULT_START_ACTIVATED_CODE, DEFAULT_START_IDLE_CODE, REFERENCE_LEAD_SECS,
    SENSOR_TIMESTAMP_FORMAT,
};
use crate::retry::RetryPolicy;

/// One interpreted kill-switch observation.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorAction {
    /// Whether the press happened after the current reference instant.
    pub actioned: bool,
    /// The raw button event code of the press.
    pub button: u32,
    /// When the press happened, in local time.
    pub time: DateTime<Local>,
}

/// Kill-switch facade around a Hue dimmer sensor.
pub struct KillSwitch {
    bridge: Arc<dyn Bridge>,
    sensor_id: String,
    reference: DateTime<Local>,
    last: Option<SensorState>,
    retry: RetryPolicy,
}

impl KillSwitch {
    pub fn new(bridge: Arc<dyn Bridge>, sensor_id: &str) -> Self {
        Self {
            bridge,
            sensor_id: sensor_id.to_string(),
            reference: reference_instant(),
            last: None,
            retry: bridge_retry(),
        }
    }

    /// Take a fresh reference instant and forget earlier observations.
    /// Called at the start of every watch so stale presses never count.
    pub fn rearm(&mut self) {
        self.reference = reference_instant();
        self.last = None;
    }

    /// Read the sensor once and remember the observation.
    pub fn poll(&mut self) -> Result<(), BridgeError> {
        let state = call_bridge(&self.retry, || self.bridge.sensor_state(&self.sensor_id))?;
        self.last = Some(state);
        Ok(())
    }

    /// Interpret the most recent observation. `Ok(None)` means the sensor
    /// has never reported a press at all.
    pub fn last_action(&self) -> Result<Option<SensorAction>> {
        let state = self
            .last
            .as_ref()
            .context("kill switch has not been polled yet")?;
        evaluate_action(state, self.reference)
    }
}

fn reference_instant() -> DateTime<Local> {
    Local::now() + Duration::seconds(REFERENCE_LEAD_SECS)
}

/// Turn a raw sensor state into an interpreted action.
///
/// The bridge reports `lastupdated` as a naive UTC timestamp; it is converted
/// to local time before the comparison. A sensor that has never fired reports
/// the literal string "none" (or nothing), which is not an action.
pub fn evaluate_action(
    state: &SensorState,
    reference: DateTime<Local>,
) -> Result<Option<SensorAction>> {
    let raw = match state.lastupdated.as_deref() {
        None | Some("none") => return Ok(None),
        Some(raw) => raw,
    };
    let button = state
        .buttonevent
        .context("sensor reported a press without a button code")?;
    let naive = NaiveDateTime::parse_from_str(raw, SENSOR_TIMESTAMP_FORMAT)
        .with_context(|| format!("unparseable sensor timestamp '{raw}'"))?;
    let time = Utc.from_utc_datetime(&naive).with_timezone(&Local);
    Ok(Some(SensorAction {
        actioned: time >= reference,
        button,
        time,
    }))
}

/// Start-switch facade around a Hue status sensor.
pub struct StartSwitch {
    bridge: Arc<dyn Bridge>,
    sensor_id: String,
    activated_code: i32,
    idle_code: i32,
    retry: RetryPolicy,
}

impl StartSwitch {
    pub fn from_config(bridge: Arc<dyn Bridge>, config: &StartSwitchConfig) -> Self {
        Self {
            bridge,
            sensor_id: config.sensor_id.clone(),
            activated_code: config.activated_code.unwrap_or(DEFAULT_START_ACTIVATED_CODE),
            idle_code: config.idle_code.unwrap_or(DEFAULT_START_IDLE_CODE),
            retry: bridge_retry(),
        }
    }

    /// Whether the switch has been activated since the last poll. An
    /// activation is cleared on read by writing the idle code back.
    pub fn poll(&mut self) -> Result<bool, BridgeError> {
        let state = call_bridge(&self.retry, || self.bridge.sensor_state(&self.sensor_id))?;
        if state.status != Some(self.activated_code) {
            return Ok(false);
        }
        call_bridge(&self.retry, || {
            self.bridge.set_sensor_status(&self.sensor_id, self.idle_code)
        })?;
        Ok(true)
    }
}
