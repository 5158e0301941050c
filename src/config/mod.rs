//! Configuration system for mobihue.
//!
//! TOML-based settings loaded from `mobihue.toml` under the XDG config
//! directory (or a directory given with `--config`). A missing file is
//! replaced with a commented template so the user has something to edit.
//!
//! ## Configuration Structure
//!
//! ```toml
//! [transit]
//! api_base_url = "https://travelplanner.mobiliteit.lu/restproxy/departureBoard?accessId=cdt&format=json&id="
//! stop_id = "A=1@O=Gare Centrale@"
//! interval = 20                      # ticks (seconds) between schedule syncs
//!
//! [[transit.lines]]
//! number = 160
//! direction = "Gare"                 # substring match against the feed's direction
//!
//! [bridge]
//! address = "192.168.1.2"
//! api_key = "..."
//!
//! [light.states]                     # direct per-light state control...
//! light_id = "1"
//!
//! # [light.scenes]                   # ...or scene activation on a group (never both)
//! # group_id = "0"
//!
//! [zones.imminent]
//! max_minutes = 5
//! xy = [0.675, 0.322]
//! effect = "blink"                   # "none", "blink" or "colourloop"
//! # scene = "AbC123"                 # scene id, required in scenes mode
//!
//! [zones.close]
//! max_minutes = 10
//! xy = [0.6, 0.4]
//! effect = "none"
//!
//! [zones.intermediate]
//! max_minutes = 20
//! xy = [0.45, 0.5]
//! effect = "none"
//!
//! [zones.further]                    # catch-all, no threshold
//! xy = [0.32, 0.33]
//! effect = "none"
//!
//! [zones.warning]                    # synthetic, applied when the feed has no data
//! xy = [0.675, 0.322]
//! effect = "colourloop"
//!
//! [kill_switch]
//! sensor_id = "2"
//! # ignore_buttons = [2000, 2001]    # optional overrides for the built-in sets
//! # no_reset_buttons = [4002]
//!
//! [start_switch]
//! sensor_id = "10"
//! # activated_code = 1
//! # idle_code = 0
//! ```
//!
//! ## Validation
//!
//! Loading validates the whole surface up front: thresholds must be present
//! and strictly increasing, exactly one light mode must be configured, and
//! each zone must carry the visual state its mode needs. Invalid
//! configurations abort startup; they are never discovered at runtime.

pub mod loading;
pub mod validation;

use serde::Deserialize;

use crate::zone::{Zone, ZoneThresholds};

pub use loading::{default_config_path, load, load_from_path};

/// Top-level configuration for the mobihue application.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Config {
    pub transit: TransitConfig,
    pub bridge: BridgeConfig,
    pub light: LightConfig,
    pub zones: ZonesConfig,
    #[serde(default)]
    pub kill_switch: Option<KillSwitchConfig>,
    #[serde(default)]
    pub start_switch: Option<StartSwitchConfig>,
}

/// Transit API endpoint, stop and line filtering settings.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct TransitConfig {
    /// Base URL of the departure board API; the stop id is appended verbatim.
    pub api_base_url: String,
    pub stop_id: String,
    /// Ticks (seconds) between schedule syncs while running.
    pub interval: u64,
    /// Allow-list of lines to watch; anything else in the feed is dropped.
    pub lines: Vec<TransitLine>,
}

/// One entry of the line allow-list.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct TransitLine {
    /// Route number, compared against the feed's `Product.line`.
    pub number: u32,
    /// Substring matched against the feed's `direction` field.
    pub direction: String,
}

/// Hue bridge connection settings.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct BridgeConfig {
    pub address: String,
    pub api_key: String,
}

/// Light control mode selection. Exactly one of the two tables must be
/// present; this is enforced at load time.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct LightConfig {
    #[serde(default)]
    pub states: Option<StatesModeConfig>,
    #[serde(default)]
    pub scenes: Option<ScenesModeConfig>,
}

/// Direct per-light state control.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct StatesModeConfig {
    pub light_id: String,
}

/// Scene activation across a light group.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ScenesModeConfig {
    pub group_id: String,
}

/// Per-zone settings, one table per zone label.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ZonesConfig {
    pub imminent: ZoneConfig,
    pub close: ZoneConfig,
    pub intermediate: ZoneConfig,
    pub further: ZoneConfig,
    pub warning: ZoneConfig,
}

impl ZonesConfig {
    pub fn get(&self, zone: Zone) -> &ZoneConfig {
        match zone {
            Zone::Imminent => &self.imminent,
            Zone::Close => &self.close,
            Zone::Intermediate => &self.intermediate,
            Zone::Further => &self.further,
            Zone::Warning => &self.warning,
        }
    }

    /// Minute cutoffs for classification. Validation guarantees the three
    /// threshold-bearing zones carry `max_minutes`.
    pub fn thresholds(&self) -> anyhow::Result<ZoneThresholds> {
        let need = |zone: Zone, value: Option<i64>| {
            value.ok_or_else(|| anyhow::anyhow!("zone '{zone}' is missing max_minutes"))
        };
        Ok(ZoneThresholds {
            imminent: need(Zone::Imminent, self.imminent.max_minutes)?,
            close: need(Zone::Close, self.close.max_minutes)?,
            intermediate: need(Zone::Intermediate, self.intermediate.max_minutes)?,
        })
    }
}

/// Visual state and threshold for a single zone.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ZoneConfig {
    /// Maximum minutes-to-arrival for this zone. Required for imminent,
    /// close and intermediate; meaningless for further and warning.
    #[serde(default)]
    pub max_minutes: Option<i64>,
    /// CIE xy colour coordinates, required in states mode.
    #[serde(default)]
    pub xy: Option<[f64; 2]>,
    /// Visual effect, required in states mode.
    #[serde(default)]
    pub effect: Option<Effect>,
    /// Scene id, required in scenes mode.
    #[serde(default)]
    pub scene: Option<String>,
}

/// Visual effect applied together with a zone's colour.
///
/// `Blink` maps to the Hue `lselect` alert, `Colourloop` to the `colorloop`
/// effect; they are mutually exclusive by construction.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Effect {
    None,
    Blink,
    Colourloop,
}

/// Kill-switch sensor settings. Presence of the table enables the watch.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct KillSwitchConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub sensor_id: String,
    /// Button codes treated as benign presses. Defaults to the dimmer
    /// up/down groups.
    #[serde(default)]
    pub ignore_buttons: Option<Vec<u32>>,
    /// Button codes that terminate without restoring the light.
    #[serde(default)]
    pub no_reset_buttons: Option<Vec<u32>>,
}

/// Start-switch sensor settings. Presence of the table enables the outer
/// idle-watching loop.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct StartSwitchConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub sensor_id: String,
    #[serde(default)]
    pub activated_code: Option<i32>,
    #[serde(default)]
    pub idle_code: Option<i32>,
}

fn default_enabled() -> bool {
    true
}

impl Config {
    /// Kill-switch config if present and enabled.
    pub fn kill_switch(&self) -> Option<&KillSwitchConfig> {
        self.kill_switch.as_ref().filter(|k| k.enabled)
    }

    /// Start-switch config if present and enabled.
    pub fn start_switch(&self) -> Option<&StartSwitchConfig> {
        self.start_switch.as_ref().filter(|s| s.enabled)
    }

    /// Log a summary of the loaded configuration.
    pub fn log_config(&self) {
        log_block_start!("Loaded configuration");
        log_indented!("Stop id: {}", self.transit.stop_id);
        for line in &self.transit.lines {
            log_indented!("Watching line {} towards \"{}\"", line.number, line.direction);
        }
        log_indented!("Sync interval: every {} seconds", self.transit.interval);
        let mode = if self.light.states.is_some() {
            "states"
        } else {
            "scenes"
        };
        log_indented!("Light mode: {}", mode);
        if let Ok(t) = self.zones.thresholds() {
            log_indented!(
                "Zone cutoffs: imminent <= {} min, close <= {} min, intermediate <= {} min",
                t.imminent,
                t.close,
                t.intermediate
            );
        }
        match self.kill_switch() {
            Some(k) => log_indented!("Kill switch: sensor {}", k.sensor_id),
            None => log_indented!("Kill switch: disabled"),
        }
        match self.start_switch() {
            Some(s) => log_indented!("Start switch: sensor {}", s.sensor_id),
            None => log_indented!("Start switch: disabled"),
        }
    }
}
