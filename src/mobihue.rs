//! Application coordinator that manages the complete lifecycle of mobihue.
//!
//! This module handles resource acquisition, initialization and orchestration
//! of the core watch loop:
//! - Configuration loading
//! - Signal handler setup
//! - Bridge connection and light backend selection
//! - Optional kill-switch and start-switch facades
//!
//! The `Mobihue` struct uses a builder pattern so the binary can thread the
//! CLI flags through: `Mobihue::new(debug_enabled).with_config_dir(dir).run()`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config;
use crate::constants::EXIT_FAILURE;
use crate::core::Controller;
use crate::hue::{Bridge, HueBridge, KillSwitch, StartSwitch, create_light_control};
use crate::schedule::Schedule;
use crate::signals::setup_signal_handler;

/// Builder for configuring and running the mobihue application.
pub struct Mobihue {
    debug_enabled: bool,
    config_dir: Option<PathBuf>,
}

impl Mobihue {
    /// Create a new runner with defaults matching a normal run.
    pub fn new(debug_enabled: bool) -> Self {
        Self {
            debug_enabled,
            config_dir: None,
        }
    }

    /// Load configuration from a custom directory instead of the XDG default.
    pub fn with_config_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.config_dir = dir;
        self
    }

    /// Execute the application with the configured settings.
    pub fn run(self) -> Result<()> {
        log_version!();
        if self.debug_enabled {
            log_pipe!();
            log_debug!("Debug mode enabled - showing startup diagnostics");
        }

        let config = match config::load(self.config_dir.as_deref()) {
            Ok(config) => config,
            Err(err) => {
                log_error_exit!("{err:#}");
                std::process::exit(EXIT_FAILURE);
            }
        };
        config.log_config();
        if self.debug_enabled {
            log_pipe!();
            log_debug!(
                "Departure board endpoint: {}{}",
                config.transit.api_base_url,
                config.transit.stop_id
            );
            log_debug!("Hue bridge at {}", config.bridge.address);
            log_debug!(
                "Light mode: {}",
                if config.light.states.is_some() {
                    "states"
                } else {
                    "scenes"
                }
            );
            log_debug!(
                "Kill switch: {}",
                config
                    .kill_switch()
                    .map_or("disabled".into(), |k| format!("sensor {}", k.sensor_id))
            );
            log_debug!(
                "Start switch: {}",
                config
                    .start_switch()
                    .map_or("disabled".into(), |s| format!("sensor {}", s.sensor_id))
            );
        }

        let signals = setup_signal_handler()?;

        let bridge: Arc<dyn Bridge> = Arc::new(
            HueBridge::new(&config.bridge).context("failed to set up the Hue bridge client")?,
        );

        let lights = create_light_control(&config, Arc::clone(&bridge))?;
        let kill_switch = config
            .kill_switch()
            .map(|k| KillSwitch::new(Arc::clone(&bridge), &k.sensor_id));
        let start_switch = config
            .start_switch()
            .map(|s| StartSwitch::from_config(Arc::clone(&bridge), s));

        let schedule = Schedule::new(&config.transit, config.zones.thresholds()?)
            .context("failed to set up the transit API client")?;

        let mut controller = Controller::new(
            Box::new(schedule),
            lights,
            kill_switch,
            start_switch,
            signals,
            &config,
        );
        let result = controller.run();

        log_block_start!("Shutting down mobihue...");
        log_end!();
        result
    }
}
