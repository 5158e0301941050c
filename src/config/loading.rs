//! Configuration loading.
//!
//! Resolves the configuration path, writes a commented template when no file
//! exists yet, and runs the validation pass after deserialization.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};

use super::Config;
use super::validation::validate_config;
use crate::constants::CONFIG_FILE;

/// Template written when no configuration file exists. The placeholders are
/// deliberately unusable so a fresh install fails loudly until edited.
const CONFIG_TEMPLATE: &str = r#"# mobihue configuration

[transit]
api_base_url = "https://travelplanner.mobiliteit.lu/restproxy/departureBoard?accessId=cdt&format=json&id="
stop_id = "YOUR_STOP_ID"
interval = 20            # seconds between schedule syncs

[[transit.lines]]
number = 160
direction = "Gare"       # substring of the feed's direction field

[bridge]
address = "192.168.1.2"
api_key = "YOUR_API_KEY"

# Pick exactly one light mode: direct state control...
[light.states]
light_id = "1"

# ...or scene activation on a group:
# [light.scenes]
# group_id = "0"

[zones.imminent]
max_minutes = 5
xy = [0.675, 0.322]
effect = "blink"

[zones.close]
max_minutes = 10
xy = [0.599, 0.388]
effect = "none"

[zones.intermediate]
max_minutes = 20
xy = [0.445, 0.476]
effect = "none"

[zones.further]
xy = [0.168, 0.041]
effect = "none"

[zones.warning]
xy = [0.675, 0.322]
effect = "colourloop"

[kill_switch]
sensor_id = "2"

# [start_switch]
# sensor_id = "10"
"#;

/// Default configuration path under the XDG config directory.
pub fn default_config_path() -> Result<PathBuf> {
    let base = dirs::config_dir().context("could not determine the user configuration directory")?;
    Ok(base.join("mobihue").join(CONFIG_FILE))
}

/// Load the configuration, honoring an optional custom directory.
///
/// When no file exists a template is written and loading fails with a
/// pointer to it: the defaults cannot work without a bridge key and stop id.
pub fn load(custom_dir: Option<&Path>) -> Result<Config> {
    let path = match custom_dir {
        Some(dir) => dir.join(CONFIG_FILE),
        None => default_config_path()?,
    };

    if !path.exists() {
        write_template(&path)?;
        return Err(anyhow!(
            "no configuration found; a template was written to {}, fill in your bridge key and stop id",
            path.display()
        ));
    }

    load_from_path(&path)
}

/// Load and validate a configuration file at an explicit path.
pub fn load_from_path(path: &Path) -> Result<Config> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read configuration from {}", path.display()))?;
    let config: Config = toml::from_str(&raw)
        .with_context(|| format!("failed to parse configuration at {}", path.display()))?;
    validate_config(&config)?;
    Ok(config)
}

fn write_template(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, CONFIG_TEMPLATE)
        .with_context(|| format!("failed to write template to {}", path.display()))?;
    log_pipe!();
    log_warning!("No configuration file found");
    log_indented!("A template was created at {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_itself_parses_and_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, CONFIG_TEMPLATE).unwrap();
        let config = load_from_path(&path).unwrap();
        assert_eq!(config.transit.interval, 20);
        assert_eq!(config.transit.lines.len(), 1);
        assert!(config.light.states.is_some());
        assert!(config.kill_switch().is_some());
        assert!(config.start_switch().is_none());
    }

    #[test]
    fn missing_file_writes_template_and_errors() {
        crate::logger::Log::set_enabled(false);
        let dir = tempfile::tempdir().unwrap();
        let result = load(Some(dir.path()));
        assert!(result.is_err());
        assert!(dir.path().join(CONFIG_FILE).exists());
    }

    #[test]
    fn unparseable_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "not [valid toml").unwrap();
        assert!(load_from_path(&path).is_err());
    }
}
