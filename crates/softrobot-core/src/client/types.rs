//! Request and response payloads of the backend API.
//!
//! The kinematics payloads are opaque to the client beyond their shape; no
//! array-length checks happen here (that belongs to the form layer).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Tendon routing parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TendonConfig {
    /// Number of tendons.
    pub count: u32,
    /// Distance from the backbone to the tendon eyelets (m).
    pub radius: f64,
    /// Vertical offset of the eyelets (m).
    #[serde(default)]
    pub coupling_offset: f64,
}

impl Default for TendonConfig {
    fn default() -> Self {
        Self {
            count: 3,
            radius: 0.03,
            coupling_offset: 0.0,
        }
    }
}

/// Input of the PCC compute endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PccParams {
    pub bending_angles: Vec<f64>,
    pub rotation_angles: Vec<f64>,
    pub backbone_lengths: Vec<f64>,
    pub coupling_lengths: Vec<f64>,
    pub discretization_steps: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tendon_config: Option<TendonConfig>,
}

/// Output of `POST /pcc`: per segment, a list of 3D points.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KinematicsResult {
    #[serde(alias = "points")]
    pub segments: Vec<Vec<Vec<f64>>>,
}

/// Actuation for one tendon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActuationCommand {
    pub length_change_m: f64,
    /// `pull`, `release` or `hold`.
    pub pull_direction: String,
    pub magnitude: f64,
}

/// Output of `POST /pcc-with-tendons`. Fields the client does not model
/// (coupling data, tendon analysis, ...) are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActuationResult {
    #[serde(default, alias = "points", alias = "robot_positions")]
    pub segments: Vec<Vec<Vec<f64>>>,
    /// Keyed by tendon id (`"1"`, `"2"`, ...).
    #[serde(default)]
    pub actuation_commands: BTreeMap<String, ActuationCommand>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Email/password pair for register and login.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

fn bearer() -> String {
    "bearer".to_string()
}

/// Result of a successful login.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    #[serde(default = "bearer")]
    pub token_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// A saved robot configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub configuration: Map<String, Value>,
    #[serde(default)]
    pub segments: Option<u32>,
    #[serde(default)]
    pub tendon_count: Option<u32>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresetCreate {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub is_public: bool,
    pub configuration: Map<String, Value>,
}

/// Partial update; absent fields are left unchanged by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PresetUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedPreset {
    pub deleted_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn pcc_params_omit_missing_tendon_config() {
        let p = PccParams {
            discretization_steps: 10,
            ..PccParams::default()
        };
        let v = serde_json::to_value(&p).unwrap();
        assert_eq!(
            v,
            json!({
                "bending_angles": [],
                "rotation_angles": [],
                "backbone_lengths": [],
                "coupling_lengths": [],
                "discretization_steps": 10
            })
        );
    }

    #[test]
    fn kinematics_accepts_points_alias() {
        let r: KinematicsResult =
            serde_json::from_value(json!({ "points": [[[0.0, 0.0, 0.0], [0.0, 0.0, 0.1]]] })).unwrap();
        assert_eq!(r.segments.len(), 1);
        assert_eq!(r.segments[0][1], vec![0.0, 0.0, 0.1]);
    }

    #[test]
    fn actuation_result_keeps_unmodelled_fields() {
        let r: ActuationResult = serde_json::from_value(json!({
            "robot_positions": [[[0.0, 0.0, 0.0]]],
            "actuation_commands": {
                "1": { "length_change_m": -0.002, "pull_direction": "pull", "magnitude": 0.002 }
            },
            "model_type": "pcc"
        }))
        .unwrap();
        assert_eq!(r.segments.len(), 1);
        assert_eq!(r.actuation_commands["1"].pull_direction, "pull");
        assert_eq!(r.extra.get("model_type"), Some(&json!("pcc")));
    }

    #[test]
    fn preset_update_serializes_only_present_fields() {
        let u = PresetUpdate {
            name: Some("arm".to_string()),
            ..PresetUpdate::default()
        };
        assert_eq!(serde_json::to_value(&u).unwrap(), json!({ "name": "arm" }));
    }
}
