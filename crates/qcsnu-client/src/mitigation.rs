//! Error-mitigation parameters attached to a job at submission time.
//!
//! On the wire a technique is `{"technique": <name>, "params": {...}}`. Known
//! techniques get typed variants; anything else, including a known name whose
//! parameters do not match the typed shape, is kept verbatim as
//! [`MitigationParams::Custom`] so it round-trips unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Technique name for zero-noise extrapolation.
pub const ZNE: &str = "zne";

/// Technique name for readout-error mitigation.
pub const READOUT: &str = "readout";

/// Error-mitigation technique and its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "WireMitigation", from = "WireMitigation")]
pub enum MitigationParams {
    /// Zero-noise extrapolation over noise-scaled circuit copies.
    ZeroNoiseExtrapolation {
        scale_factors: Vec<f64>,
        extrapolation: Extrapolation,
    },
    /// Readout (measurement) error mitigation from calibration runs.
    ReadoutError { calibration_shots: Option<u32> },
    /// Any other technique, passed through untouched.
    Custom {
        technique: String,
        params: Map<String, Value>,
    },
}

/// Extrapolation model for zero-noise extrapolation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Extrapolation {
    #[default]
    Linear,
    Richardson,
    Exponential,
}

impl MitigationParams {
    /// Zero-noise extrapolation with the given scale factors.
    pub fn zne(scale_factors: impl Into<Vec<f64>>, extrapolation: Extrapolation) -> Self {
        Self::ZeroNoiseExtrapolation {
            scale_factors: scale_factors.into(),
            extrapolation,
        }
    }

    /// Readout-error mitigation.
    pub fn readout(calibration_shots: Option<u32>) -> Self {
        Self::ReadoutError { calibration_shots }
    }

    /// An arbitrary technique.
    pub fn custom(technique: impl Into<String>, params: Map<String, Value>) -> Self {
        Self::Custom {
            technique: technique.into(),
            params,
        }
    }

    /// The technique identifier sent to the service.
    pub fn technique(&self) -> &str {
        match self {
            Self::ZeroNoiseExtrapolation { .. } => ZNE,
            Self::ReadoutError { .. } => READOUT,
            Self::Custom { technique, .. } => technique,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ZneParams {
    #[serde(default = "default_scale_factors")]
    scale_factors: Vec<f64>,
    #[serde(default)]
    extrapolation: Extrapolation,
}

fn default_scale_factors() -> Vec<f64> {
    vec![1.0, 2.0, 3.0]
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ReadoutParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    calibration_shots: Option<u32>,
}

/// `{technique, params}` shape used on the wire.
#[derive(Debug, Serialize, Deserialize)]
struct WireMitigation {
    technique: String,
    #[serde(default)]
    params: Map<String, Value>,
}

impl From<MitigationParams> for WireMitigation {
    fn from(m: MitigationParams) -> Self {
        let technique = m.technique().to_string();
        let params = match m {
            MitigationParams::ZeroNoiseExtrapolation {
                scale_factors,
                extrapolation,
            } => to_map(&ZneParams {
                scale_factors,
                extrapolation,
            }),
            MitigationParams::ReadoutError { calibration_shots } => {
                to_map(&ReadoutParams { calibration_shots })
            }
            MitigationParams::Custom { params, .. } => params,
        };
        Self { technique, params }
    }
}

impl From<WireMitigation> for MitigationParams {
    fn from(w: WireMitigation) -> Self {
        let typed = match w.technique.as_str() {
            ZNE => serde_json::from_value::<ZneParams>(Value::Object(w.params.clone()))
                .ok()
                .map(|p| Self::ZeroNoiseExtrapolation {
                    scale_factors: p.scale_factors,
                    extrapolation: p.extrapolation,
                }),
            READOUT => serde_json::from_value::<ReadoutParams>(Value::Object(w.params.clone()))
                .ok()
                .map(|p| Self::ReadoutError {
                    calibration_shots: p.calibration_shots,
                }),
            _ => None,
        };
        typed.unwrap_or(Self::Custom {
            technique: w.technique,
            params: w.params,
        })
    }
}

fn to_map(value: &impl Serialize) -> Map<String, Value> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}
