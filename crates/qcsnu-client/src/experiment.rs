//! Pulse-level experiment runs (`/api/experiments/`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::job::{JobId, JobStatus, timestamp};

/// Experiment identifiers share the job id representation.
pub type ExperimentId = JobId;

/// An experiment run on the hardware.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Experiment {
    pub id: ExperimentId,
    pub status: JobStatus,
    #[serde(default)]
    pub pulse_schedule: Value,
    /// Run id assigned by the hardware controller.
    #[serde(default)]
    pub external_run_id: Option<i64>,
    #[serde(default, with = "timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
}

/// Body of `POST /api/experiments/`.
#[derive(Debug, Clone, Serialize)]
pub struct ExperimentRequest {
    pub pulse_schedule: Value,
    pub external_run_id: i64,
}
