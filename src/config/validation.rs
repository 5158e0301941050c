//! Configuration validation.
//!
//! Every constraint that would otherwise surface as a runtime surprise is
//! checked here, once, at startup: threshold ordering, light mode selection,
//! and per-mode zone completeness.

use anyhow::{Result, bail};

use super::Config;
use crate::zone::Zone;

/// Validate a loaded configuration. Returns the first violation found.
pub fn validate_config(config: &Config) -> Result<()> {
    if config.transit.api_base_url.is_empty() {
        bail!("transit.api_base_url must not be empty");
    }
    if config.transit.stop_id.is_empty() {
        bail!("transit.stop_id must not be empty");
    }
    if config.transit.interval == 0 {
        bail!("transit.interval must be at least 1 second");
    }
    if config.transit.lines.is_empty() {
        bail!("transit.lines must list at least one line to watch");
    }
    for line in &config.transit.lines {
        if line.direction.is_empty() {
            bail!("transit line {} has an empty direction filter", line.number);
        }
    }

    if config.bridge.address.is_empty() || config.bridge.api_key.is_empty() {
        bail!("bridge.address and bridge.api_key must both be set");
    }

    let thresholds = config.zones.thresholds()?;
    if thresholds.imminent < 0 {
        bail!("zones.imminent.max_minutes must not be negative");
    }
    if thresholds.imminent >= thresholds.close || thresholds.close >= thresholds.intermediate {
        bail!(
            "zone cutoffs must be strictly increasing: imminent ({}) < close ({}) < intermediate ({})",
            thresholds.imminent,
            thresholds.close,
            thresholds.intermediate
        );
    }

    // Exactly one light mode; a misconfiguration here must never be
    // discovered mid-run.
    match (&config.light.states, &config.light.scenes) {
        (Some(_), Some(_)) => {
            bail!("light mode is ambiguous: configure either [light.states] or [light.scenes], not both")
        }
        (None, None) => {
            bail!("no light mode configured: add a [light.states] or [light.scenes] table")
        }
        (Some(states), None) => {
            if states.light_id.is_empty() {
                bail!("light.states.light_id must not be empty");
            }
            for zone in Zone::all() {
                let zone_config = config.zones.get(zone);
                if zone_config.xy.is_none() || zone_config.effect.is_none() {
                    bail!("states mode requires xy and effect for zone '{zone}'");
                }
            }
        }
        (None, Some(scenes)) => {
            if scenes.group_id.is_empty() {
                bail!("light.scenes.group_id must not be empty");
            }
            for zone in Zone::all() {
                if config.zones.get(zone).scene.is_none() {
                    bail!("scenes mode requires a scene id for zone '{zone}'");
                }
            }
        }
    }

    if let Some(kill) = config.kill_switch()
        && kill.sensor_id.is_empty()
    {
        bail!("kill_switch.sensor_id must not be empty");
    }
    if let Some(start) = config.start_switch()
        && start.sensor_id.is_empty()
    {
        bail!("start_switch.sensor_id must not be empty");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        BridgeConfig, KillSwitchConfig, LightConfig, ScenesModeConfig, StatesModeConfig,
        TransitConfig, TransitLine, ZoneConfig, ZonesConfig,
    };

    fn zone(max_minutes: Option<i64>) -> ZoneConfig {
        ZoneConfig {
            max_minutes,
            xy: Some([0.5, 0.4]),
            effect: Some(crate::config::Effect::None),
            scene: None,
        }
    }

    fn valid_config() -> Config {
        Config {
            transit: TransitConfig {
                api_base_url: "https://example.invalid/board?id=".into(),
                stop_id: "A=1@O=Test@".into(),
                interval: 20,
                lines: vec![TransitLine {
                    number: 160,
                    direction: "Gare".into(),
                }],
            },
            bridge: BridgeConfig {
                address: "192.168.1.2".into(),
                api_key: "key".into(),
            },
            light: LightConfig {
                states: Some(StatesModeConfig {
                    light_id: "1".into(),
                }),
                scenes: None,
            },
            zones: ZonesConfig {
                imminent: zone(Some(5)),
                close: zone(Some(10)),
                intermediate: zone(Some(20)),
                further: zone(None),
                warning: zone(None),
            },
            kill_switch: Some(KillSwitchConfig {
                enabled: true,
                sensor_id: "2".into(),
                ignore_buttons: None,
                no_reset_buttons: None,
            }),
            start_switch: None,
        }
    }

    #[test]
    fn accepts_a_valid_config() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn rejects_both_light_modes() {
        let mut config = valid_config();
        config.light.scenes = Some(ScenesModeConfig {
            group_id: "0".into(),
        });
        let err = validate_config(&config).unwrap_err().to_string();
        assert!(err.contains("not both"));
    }

    #[test]
    fn rejects_missing_light_mode() {
        let mut config = valid_config();
        config.light.states = None;
        let err = validate_config(&config).unwrap_err().to_string();
        assert!(err.contains("no light mode"));
    }

    #[test]
    fn rejects_unordered_thresholds() {
        let mut config = valid_config();
        config.zones.close.max_minutes = Some(5);
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn rejects_missing_threshold() {
        let mut config = valid_config();
        config.zones.imminent.max_minutes = None;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn scenes_mode_requires_scene_ids() {
        let mut config = valid_config();
        config.light.states = None;
        config.light.scenes = Some(ScenesModeConfig {
            group_id: "0".into(),
        });
        let err = validate_config(&config).unwrap_err().to_string();
        assert!(err.contains("scene id"));
    }

    #[test]
    fn rejects_empty_line_list() {
        let mut config = valid_config();
        config.transit.lines.clear();
        assert!(validate_config(&config).is_err());
    }
}
