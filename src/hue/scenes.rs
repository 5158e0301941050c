//! Scene activation across a light group.
//!
//! Zones map to scene ids activated on a group instead of per-light state
//! writes. Live light state is not meaningful in this mode (a scene fans out
//! to many lights asynchronously), so on/off decisions use the snapshots
//! captured at startup from the member lights of the imminent zone's scene.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::anyhow;

use super::bridge::{Bridge, BridgeError, LightState};
use super::{LightControl, bridge_retry, call_bridge};
use crate::config::ZonesConfig;
use crate::retry::RetryPolicy;
use crate::zone::Zone;

struct Member {
    light_id: String,
    initial_state: LightState,
}

/// The scene-mode light backend.
pub struct SceneLights {
    bridge: Arc<dyn Bridge>,
    group_id: String,
    zone_scenes: HashMap<Zone, String>,
    members: Vec<Member>,
    dirty: bool,
    retry: RetryPolicy,
}

impl SceneLights {
    /// Resolve the per-zone scene ids and capture restore snapshots for the
    /// member lights of the original imminent scene.
    pub fn new(
        bridge: Arc<dyn Bridge>,
        group_id: &str,
        zones: &ZonesConfig,
    ) -> anyhow::Result<Self> {
        let retry = bridge_retry();

        let mut zone_scenes = HashMap::new();
        for zone in Zone::all() {
            let scene = zones
                .get(zone)
                .scene
                .clone()
                .ok_or_else(|| anyhow!("zone '{zone}' is missing a scene id"))?;
            zone_scenes.insert(zone, scene);
        }

        // The imminent scene's light list defines the member set for the
        // whole run.
        let imminent_scene = &zone_scenes[&Zone::Imminent];
        let light_ids = call_bridge(&retry, || bridge.scene_lights(imminent_scene))?;

        let mut members = Vec::with_capacity(light_ids.len());
        for light_id in light_ids {
            let initial_state = call_bridge(&retry, || bridge.light_state(&light_id))?.sanitized();
            members.push(Member {
                light_id,
                initial_state,
            });
        }

        Ok(Self {
            bridge,
            group_id: group_id.to_string(),
            zone_scenes,
            members,
            dirty: false,
            retry,
        })
    }
}

impl LightControl for SceneLights {
    fn turn_on(&mut self) -> Result<(), BridgeError> {
        let mut wrote = false;
        for member in &self.members {
            if member.initial_state.on.unwrap_or(false) {
                continue;
            }
            log_decorated!("Turning light {} on", member.light_id);
            call_bridge(&self.retry, || {
                self.bridge
                    .set_light_state(&member.light_id, &LightState::power(true))
            })?;
            wrote = true;
        }
        if wrote {
            self.dirty = true;
        } else {
            log_decorated!("All scene lights already on");
        }
        Ok(())
    }

    fn apply_zone(&mut self, zone: Zone) -> Result<(), BridgeError> {
        let scene = self
            .zone_scenes
            .get(&zone)
            .ok_or_else(|| BridgeError::Protocol(format!("no scene for zone '{zone}'")))?;
        log_decorated!("Activating scene for zone '{}'", zone);
        call_bridge(&self.retry, || {
            self.bridge.activate_scene(&self.group_id, scene)
        })?;
        self.dirty = true;
        Ok(())
    }

    fn reset(&mut self) -> Result<(), BridgeError> {
        if !self.dirty {
            log_decorated!("Scene lights never changed, no reset needed");
            return Ok(());
        }
        for member in &self.members {
            let state = if member.initial_state.on.unwrap_or(false) {
                member.initial_state.clone()
            } else {
                LightState::power(false)
            };
            log_decorated!("Restoring light {}", member.light_id);
            call_bridge(&self.retry, || {
                self.bridge.set_light_state(&member.light_id, &state)
            })?;
        }
        self.dirty = false;
        Ok(())
    }

    fn initially_on(&self) -> bool {
        self.members
            .iter()
            .any(|member| member.initial_state.on.unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ZoneConfig;
    use crate::hue::testing::{DeviceWrite, FakeBridge};
    use crate::logger::Log;

    fn zones_config() -> ZonesConfig {
        let zone = |scene: &str| ZoneConfig {
            max_minutes: None,
            xy: None,
            effect: None,
            scene: Some(scene.into()),
        };
        ZonesConfig {
            imminent: zone("scene-imminent"),
            close: zone("scene-close"),
            intermediate: zone("scene-intermediate"),
            further: zone("scene-further"),
            warning: zone("scene-warning"),
        }
    }

    fn bridge_with_members() -> Arc<FakeBridge> {
        Arc::new(
            FakeBridge::default()
                .with_scene("scene-imminent", &["1", "2"])
                .with_light(
                    "1",
                    LightState {
                        on: Some(true),
                        bri: Some(100),
                        ..LightState::default()
                    },
                )
                .with_light("2", LightState::power(false)),
        )
    }

    fn scene_lights(bridge: Arc<FakeBridge>) -> SceneLights {
        Log::set_enabled(false);
        SceneLights::new(bridge, "0", &zones_config()).unwrap()
    }

    #[test]
    fn turn_on_only_writes_members_that_were_off() {
        let bridge = bridge_with_members();
        let mut lights = scene_lights(Arc::clone(&bridge));
        lights.turn_on().unwrap();
        let writes = bridge.writes.borrow();
        assert_eq!(writes.len(), 1);
        assert_eq!(
            writes[0],
            DeviceWrite::Light("2".into(), LightState::power(true))
        );
    }

    #[test]
    fn apply_zone_activates_the_zone_scene_on_the_group() {
        let bridge = bridge_with_members();
        let mut lights = scene_lights(Arc::clone(&bridge));
        lights.apply_zone(Zone::Close).unwrap();
        assert_eq!(
            bridge.writes.borrow()[0],
            DeviceWrite::Scene("0".into(), "scene-close".into())
        );
    }

    #[test]
    fn reset_without_mutation_writes_nothing() {
        let bridge = bridge_with_members();
        let mut lights = scene_lights(Arc::clone(&bridge));
        lights.reset().unwrap();
        assert_eq!(bridge.write_count(), 0);
    }

    #[test]
    fn reset_restores_each_member_individually() {
        let bridge = bridge_with_members();
        let mut lights = scene_lights(Arc::clone(&bridge));
        lights.apply_zone(Zone::Imminent).unwrap();
        lights.reset().unwrap();
        let writes = bridge.writes.borrow();
        // scene activation + one restore per member
        assert_eq!(writes.len(), 3);
        let DeviceWrite::Light(ref id, ref state) = writes[1] else {
            panic!("expected a light write");
        };
        assert_eq!(id, "1");
        assert_eq!(state.on, Some(true));
        assert_eq!(state.bri, Some(100));
        assert_eq!(
            writes[2],
            DeviceWrite::Light("2".into(), LightState::power(false))
        );
    }

    #[test]
    fn reset_is_idempotent() {
        let bridge = bridge_with_members();
        let mut lights = scene_lights(Arc::clone(&bridge));
        lights.apply_zone(Zone::Further).unwrap();
        lights.reset().unwrap();
        let count = bridge.write_count();
        lights.reset().unwrap();
        assert_eq!(bridge.write_count(), count);
    }

    #[test]
    fn initially_on_when_any_member_was_on() {
        let bridge = bridge_with_members();
        let lights = scene_lights(bridge);
        assert!(lights.initially_on());
    }
}
