//! Direct per-light state control.
//!
//! Captures the light's state once at startup, then drives zone visuals by
//! writing precomputed attribute patches. A dirty flag records whether the
//! device ever diverged from that snapshot; reset is a no-op until it does.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::anyhow;

use super::bridge::{Bridge, BridgeError, LightState};
use super::{LightControl, bridge_retry, call_bridge};
use crate::config::{Effect, ZonesConfig};
use crate::retry::RetryPolicy;
use crate::zone::Zone;

/// Precomputed light state per zone, built once from configuration the way
/// the settings layer shapes them: an effect choice becomes a concrete
/// `{alert, effect}` pair next to the zone colour.
pub struct ZoneStates {
    states: HashMap<Zone, LightState>,
}

impl ZoneStates {
    pub fn from_config(zones: &ZonesConfig) -> anyhow::Result<Self> {
        let mut states = HashMap::new();
        for zone in Zone::all() {
            let zone_config = zones.get(zone);
            let xy = zone_config
                .xy
                .ok_or_else(|| anyhow!("zone '{zone}' is missing xy"))?;
            let effect = zone_config
                .effect
                .ok_or_else(|| anyhow!("zone '{zone}' is missing effect"))?;
            let (alert, effect) = match effect {
                Effect::None => ("none", "none"),
                Effect::Blink => ("lselect", "none"),
                Effect::Colourloop => ("none", "colorloop"),
            };
            states.insert(
                zone,
                LightState {
                    xy: Some(xy),
                    effect: Some(effect.into()),
                    alert: Some(alert.into()),
                    ..LightState::default()
                },
            );
        }
        Ok(Self { states })
    }

    pub fn state_for(&self, zone: Zone) -> Option<&LightState> {
        self.states.get(&zone)
    }

    /// A zone with a non-neutral alert must be re-written every sync, so the
    /// blink keeps re-triggering.
    pub fn forces_reapply(&self, zone: Zone) -> bool {
        self.states
            .get(&zone)
            .and_then(|state| state.alert.as_deref())
            .is_some_and(|alert| alert != "none")
    }
}

/// The direct-state light backend.
pub struct StateLight {
    bridge: Arc<dyn Bridge>,
    light_id: String,
    initial_state: LightState,
    dirty: bool,
    zones: ZoneStates,
    retry: RetryPolicy,
}

impl StateLight {
    /// Capture the light's current state as the restore snapshot and build
    /// the backend around it.
    pub fn new(
        bridge: Arc<dyn Bridge>,
        light_id: &str,
        zones: ZoneStates,
    ) -> Result<Self, BridgeError> {
        let retry = bridge_retry();
        let initial_state = call_bridge(&retry, || bridge.light_state(light_id))?.sanitized();
        Ok(Self {
            bridge,
            light_id: light_id.to_string(),
            initial_state,
            dirty: false,
            zones,
            retry,
        })
    }

    fn write_state(&mut self, state: &LightState) -> Result<(), BridgeError> {
        call_bridge(&self.retry, || {
            self.bridge.set_light_state(&self.light_id, state)
        })?;
        self.dirty = true;
        Ok(())
    }

    /// Current on/off view: live query once the device has been touched,
    /// the captured snapshot before that (saves a round-trip).
    fn is_on(&self) -> Result<bool, BridgeError> {
        if self.dirty {
            let state = call_bridge(&self.retry, || self.bridge.light_state(&self.light_id))?;
            Ok(state.on.unwrap_or(false))
        } else {
            Ok(self.initial_state.on.unwrap_or(false))
        }
    }
}

impl LightControl for StateLight {
    fn turn_on(&mut self) -> Result<(), BridgeError> {
        if self.is_on()? {
            log_decorated!("Light already on");
            return Ok(());
        }
        log_decorated!("Turning light on");
        self.write_state(&LightState::power(true))
    }

    fn apply_zone(&mut self, zone: Zone) -> Result<(), BridgeError> {
        let state = self
            .zones
            .state_for(zone)
            .cloned()
            .ok_or_else(|| BridgeError::Protocol(format!("no light state for zone '{zone}'")))?;
        log_decorated!("Setting light to zone '{}'", zone);
        self.write_state(&state)
    }

    fn reset(&mut self) -> Result<(), BridgeError> {
        if !self.dirty {
            log_decorated!("Light state never changed, no reset needed");
            return Ok(());
        }
        if self.initial_state.on.unwrap_or(false) {
            log_decorated!("Restoring light to its original state");
            let snapshot = self.initial_state.clone();
            self.write_state(&snapshot)?;
        } else {
            log_decorated!("Light was off at start, turning it off again");
            self.write_state(&LightState::power(false))?;
        }
        self.dirty = false;
        Ok(())
    }

    fn initially_on(&self) -> bool {
        self.initial_state.on.unwrap_or(false)
    }

    fn zone_forces_reapply(&self, zone: Zone) -> bool {
        self.zones.forces_reapply(zone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ZoneConfig;
    use crate::hue::testing::{DeviceWrite, FakeBridge};
    use crate::logger::Log;

    fn zones_config(imminent_effect: Effect) -> ZonesConfig {
        let zone = |effect: Effect| ZoneConfig {
            max_minutes: None,
            xy: Some([0.5, 0.4]),
            effect: Some(effect),
            scene: None,
        };
        ZonesConfig {
            imminent: zone(imminent_effect),
            close: zone(Effect::None),
            intermediate: zone(Effect::None),
            further: zone(Effect::None),
            warning: zone(Effect::Colourloop),
        }
    }

    fn light_on_at_start() -> LightState {
        LightState {
            on: Some(true),
            bri: Some(200),
            xy: Some([0.3, 0.3]),
            effect: Some("none".into()),
            alert: Some("none".into()),
            colormode: Some("xy".into()),
            reachable: Some(true),
        }
    }

    fn state_light(bridge: Arc<FakeBridge>, effect: Effect) -> StateLight {
        Log::set_enabled(false);
        let zones = ZoneStates::from_config(&zones_config(effect)).unwrap();
        StateLight::new(bridge, "1", zones).unwrap()
    }

    #[test]
    fn turn_on_is_idempotent_when_already_on() {
        let bridge = Arc::new(FakeBridge::default().with_light("1", light_on_at_start()));
        let mut light = state_light(Arc::clone(&bridge), Effect::None);
        light.turn_on().unwrap();
        assert_eq!(bridge.write_count(), 0);
    }

    #[test]
    fn turn_on_writes_when_off() {
        let bridge = Arc::new(FakeBridge::default().with_light("1", LightState::power(false)));
        let mut light = state_light(Arc::clone(&bridge), Effect::None);
        light.turn_on().unwrap();
        assert_eq!(
            bridge.writes.borrow()[0],
            DeviceWrite::Light("1".into(), LightState::power(true))
        );
    }

    #[test]
    fn apply_zone_writes_the_precomputed_state() {
        let bridge = Arc::new(FakeBridge::default().with_light("1", light_on_at_start()));
        let mut light = state_light(Arc::clone(&bridge), Effect::Blink);
        light.apply_zone(Zone::Imminent).unwrap();
        let writes = bridge.writes.borrow();
        let DeviceWrite::Light(_, ref state) = writes[0] else {
            panic!("expected a light write");
        };
        assert_eq!(state.alert.as_deref(), Some("lselect"));
        assert_eq!(state.effect.as_deref(), Some("none"));
        assert_eq!(state.xy, Some([0.5, 0.4]));
    }

    #[test]
    fn blink_zones_force_reapply_but_neutral_zones_do_not() {
        let bridge = Arc::new(FakeBridge::default().with_light("1", light_on_at_start()));
        let light = state_light(bridge, Effect::Blink);
        assert!(light.zone_forces_reapply(Zone::Imminent));
        assert!(!light.zone_forces_reapply(Zone::Close));
        // colourloop is a continuous effect, not an alert: no re-announcement
        assert!(!light.zone_forces_reapply(Zone::Warning));
    }

    #[test]
    fn reset_without_mutation_writes_nothing() {
        let bridge = Arc::new(FakeBridge::default().with_light("1", light_on_at_start()));
        let mut light = state_light(Arc::clone(&bridge), Effect::None);
        light.reset().unwrap();
        light.reset().unwrap();
        assert_eq!(bridge.write_count(), 0);
    }

    #[test]
    fn reset_replays_the_sanitized_snapshot_when_initially_on() {
        let bridge = Arc::new(FakeBridge::default().with_light("1", light_on_at_start()));
        let mut light = state_light(Arc::clone(&bridge), Effect::None);
        light.apply_zone(Zone::Close).unwrap();
        light.reset().unwrap();
        let writes = bridge.writes.borrow();
        let DeviceWrite::Light(_, ref restored) = writes[1] else {
            panic!("expected a light write");
        };
        assert_eq!(restored.on, Some(true));
        assert_eq!(restored.bri, Some(200));
        assert_eq!(restored.xy, Some([0.3, 0.3]));
        assert_eq!(restored.alert.as_deref(), Some("none"));
        assert!(restored.colormode.is_none());
    }

    #[test]
    fn reset_turns_off_when_initially_off() {
        let bridge = Arc::new(FakeBridge::default().with_light("1", LightState::power(false)));
        let mut light = state_light(Arc::clone(&bridge), Effect::None);
        light.apply_zone(Zone::Close).unwrap();
        light.reset().unwrap();
        let writes = bridge.writes.borrow();
        assert_eq!(
            writes[1],
            DeviceWrite::Light("1".into(), LightState::power(false))
        );
    }

    #[test]
    fn reset_is_idempotent() {
        let bridge = Arc::new(FakeBridge::default().with_light("1", light_on_at_start()));
        let mut light = state_light(Arc::clone(&bridge), Effect::None);
        light.apply_zone(Zone::Close).unwrap();
        light.reset().unwrap();
        let writes_after_first = bridge.write_count();
        light.reset().unwrap();
        assert_eq!(bridge.write_count(), writes_after_first);
    }
}
