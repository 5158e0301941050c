//! Hue bridge capability surface.
//!
//! The vendor protocol is deliberately opaque to the rest of the program:
//! everything above this module talks to the [`Bridge`] trait, which exposes
//! exactly the handful of operations mobihue needs (read/write a light
//! state, activate a scene, read a sensor, write a sensor status). The one
//! production implementation speaks the Hue REST API over HTTP.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::BridgeConfig;
use crate::constants::BRIDGE_REQUEST_TIMEOUT;

/// Failure modes of a bridge call.
///
/// `Timeout` is the only transient, retryable kind; anything else points at
/// a configuration problem (wrong device id, bad credentials) that will not
/// self-resolve.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("request to the Hue bridge timed out")]
    Timeout,
    #[error("Hue bridge returned HTTP {0}")]
    Status(StatusCode),
    #[error("could not reach the Hue bridge: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("unexpected Hue bridge response: {0}")]
    Protocol(String),
}

impl BridgeError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, BridgeError::Timeout)
    }
}

impl From<reqwest::Error> for BridgeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            BridgeError::Timeout
        } else if let Some(status) = err.status() {
            BridgeError::Status(status)
        } else {
            BridgeError::Transport(err)
        }
    }
}

/// Visible attributes of a light, used both as a read snapshot and as a
/// partial write (only populated fields are serialized).
///
/// `colormode` and `reachable` are read-only on the device and `alert`
/// interferes when echoed back mid-blink; [`LightState::sanitized`] strips
/// them before a snapshot is ever replayed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LightState {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bri: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xy: Option<[f64; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effect: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert: Option<String>,
    #[serde(skip_serializing)]
    pub colormode: Option<String>,
    #[serde(skip_serializing)]
    pub reachable: Option<bool>,
}

impl LightState {
    /// A state that only toggles power.
    pub fn power(on: bool) -> Self {
        Self {
            on: Some(on),
            ..Self::default()
        }
    }

    /// Normalize a captured state for later replay: drop the non-settable
    /// fields and force a neutral alert.
    pub fn sanitized(&self) -> Self {
        Self {
            alert: Some("none".into()),
            colormode: None,
            reachable: None,
            ..self.clone()
        }
    }
}

/// Raw sensor state. Kill switches populate `buttonevent`/`lastupdated`,
/// start switches populate `status`.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct SensorState {
    pub buttonevent: Option<u32>,
    pub lastupdated: Option<String>,
    pub status: Option<i32>,
}

/// The narrow device capability mobihue depends on.
pub trait Bridge {
    fn light_state(&self, light_id: &str) -> Result<LightState, BridgeError>;
    fn set_light_state(&self, light_id: &str, state: &LightState) -> Result<(), BridgeError>;
    fn activate_scene(&self, group_id: &str, scene_id: &str) -> Result<(), BridgeError>;
    /// Light ids belonging to a scene.
    fn scene_lights(&self, scene_id: &str) -> Result<Vec<String>, BridgeError>;
    fn sensor_state(&self, sensor_id: &str) -> Result<SensorState, BridgeError>;
    fn set_sensor_status(&self, sensor_id: &str, status: i32) -> Result<(), BridgeError>;
}

#[derive(Debug, Deserialize)]
struct LightResource {
    state: LightState,
}

#[derive(Debug, Deserialize)]
struct SceneResource {
    lights: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SensorResource {
    state: SensorState,
}

/// Hue REST API client.
pub struct HueBridge {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl HueBridge {
    pub fn new(config: &BridgeConfig) -> anyhow::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(BRIDGE_REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base_url: format!("http://{}/api/{}", config.address, config.api_key),
        })
    }

    fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, BridgeError> {
        let response = self
            .client
            .get(format!("{}/{path}", self.base_url))
            .send()?
            .error_for_status()?;
        response
            .json()
            .map_err(|err| BridgeError::Protocol(err.to_string()))
    }

    fn put(&self, path: &str, body: &impl Serialize) -> Result<(), BridgeError> {
        self.client
            .put(format!("{}/{path}", self.base_url))
            .json(body)
            .send()?
            .error_for_status()?;
        Ok(())
    }
}

impl Bridge for HueBridge {
    fn light_state(&self, light_id: &str) -> Result<LightState, BridgeError> {
        let resource: LightResource = self.get(&format!("lights/{light_id}"))?;
        Ok(resource.state)
    }

    fn set_light_state(&self, light_id: &str, state: &LightState) -> Result<(), BridgeError> {
        self.put(&format!("lights/{light_id}/state"), state)
    }

    fn activate_scene(&self, group_id: &str, scene_id: &str) -> Result<(), BridgeError> {
        self.put(
            &format!("groups/{group_id}/action"),
            &serde_json::json!({ "scene": scene_id }),
        )
    }

    fn scene_lights(&self, scene_id: &str) -> Result<Vec<String>, BridgeError> {
        let resource: SceneResource = self.get(&format!("scenes/{scene_id}"))?;
        Ok(resource.lights)
    }

    fn sensor_state(&self, sensor_id: &str) -> Result<SensorState, BridgeError> {
        let resource: SensorResource = self.get(&format!("sensors/{sensor_id}"))?;
        Ok(resource.state)
    }

    fn set_sensor_status(&self, sensor_id: &str, status: i32) -> Result<(), BridgeError> {
        self.put(
            &format!("sensors/{sensor_id}/state"),
            &serde_json::json!({ "status": status }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitized_strips_volatile_fields_and_neutralizes_alert() {
        let captured = LightState {
            on: Some(true),
            bri: Some(144),
            xy: Some([0.4, 0.4]),
            effect: Some("none".into()),
            alert: Some("lselect".into()),
            colormode: Some("xy".into()),
            reachable: Some(true),
        };
        let replayable = captured.sanitized();
        assert_eq!(replayable.alert.as_deref(), Some("none"));
        assert!(replayable.colormode.is_none());
        assert!(replayable.reachable.is_none());
        assert_eq!(replayable.on, Some(true));
        assert_eq!(replayable.bri, Some(144));
    }

    #[test]
    fn partial_state_serializes_only_populated_fields() {
        let body = serde_json::to_value(LightState::power(true)).unwrap();
        assert_eq!(body, serde_json::json!({ "on": true }));
    }

    #[test]
    fn read_only_fields_never_serialize() {
        let state = LightState {
            on: Some(false),
            colormode: Some("xy".into()),
            reachable: Some(false),
            ..LightState::default()
        };
        let body = serde_json::to_value(&state).unwrap();
        assert_eq!(body, serde_json::json!({ "on": false }));
    }
}
