//! Hue device facades.
//!
//! This module wraps the opaque bridge capability in the two surfaces the
//! controller works with:
//!
//! - [`LightControl`]: one capability contract over two interchangeable
//!   backends, direct per-light state control ([`light::StateLight`]) and
//!   scene activation across a group ([`scenes::SceneLights`]). The backend
//!   is selected once at startup from configuration and never switched.
//! - Sensor facades ([`sensor::KillSwitch`], [`sensor::StartSwitch`]) for
//!   the polled switches.
//!
//! Device timeouts are the one transient bridge failure; every facade call
//! runs through [`call_bridge`] which retries timeouts with exponential
//! backoff and propagates everything else.

pub mod bridge;
pub mod light;
pub mod scenes;
pub mod sensor;

use std::sync::Arc;

use anyhow::{Context, Result, bail};

use crate::config::Config;
use crate::constants::{BRIDGE_BACKOFF_BASE, BRIDGE_MAX_ATTEMPTS};
use crate::retry::RetryPolicy;
use crate::zone::Zone;

pub use bridge::{Bridge, BridgeError, HueBridge, LightState, SensorState};
pub use light::{StateLight, ZoneStates};
pub use scenes::SceneLights;
pub use sensor::{KillSwitch, StartSwitch};

/// Capability contract shared by the two light backends.
pub trait LightControl {
    /// Turn the light(s) on if not already on. Idempotent.
    fn turn_on(&mut self) -> Result<(), BridgeError>;

    /// Drive the visual state for a zone.
    fn apply_zone(&mut self, zone: Zone) -> Result<(), BridgeError>;

    /// Restore the state captured at startup. No-op if nothing was ever
    /// mutated; idempotent.
    fn reset(&mut self) -> Result<(), BridgeError>;

    /// Whether the light (any member light, in scene mode) was on at start.
    fn initially_on(&self) -> bool;

    /// Whether this zone must be re-applied every sync even without a zone
    /// change. Direct mode re-triggers alert effects this way; scene mode
    /// never does.
    fn zone_forces_reapply(&self, _zone: Zone) -> bool {
        false
    }
}

/// The retry policy applied to every bridge call.
pub(crate) fn bridge_retry() -> RetryPolicy {
    RetryPolicy::exponential(BRIDGE_MAX_ATTEMPTS, BRIDGE_BACKOFF_BASE)
}

/// Run one bridge operation under the timeout retry policy.
pub(crate) fn call_bridge<T>(
    retry: &RetryPolicy,
    mut op: impl FnMut() -> Result<T, BridgeError>,
) -> Result<T, BridgeError> {
    retry.run(
        &mut op,
        BridgeError::is_timeout,
        |attempt, _| {
            log_warning!(
                "Hue bridge call timed out, try {} of {} ...",
                attempt,
                BRIDGE_MAX_ATTEMPTS
            );
        },
    )
}

/// Build the light backend selected by the configuration.
///
/// Validation already guarantees exactly one mode is configured; this is the
/// construction half of that contract.
pub fn create_light_control(
    config: &Config,
    bridge: Arc<dyn Bridge>,
) -> Result<Box<dyn LightControl>> {
    match (&config.light.states, &config.light.scenes) {
        (Some(states), None) => {
            let zones = ZoneStates::from_config(&config.zones)?;
            let light = StateLight::new(bridge, &states.light_id, zones)
                .context("failed to initialize the light")?;
            Ok(Box::new(light))
        }
        (None, Some(scenes)) => {
            let lights = SceneLights::new(bridge, &scenes.group_id, &config.zones)
                .context("failed to initialize the scene group")?;
            Ok(Box::new(lights))
        }
        _ => bail!("light mode must be exactly one of states or scenes"),
    }
}
