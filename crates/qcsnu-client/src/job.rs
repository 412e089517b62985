//! Job types.
//!
//! The job state machine as reported by the service:
//!
//! ```text
//!   create ──→ Created ──→ Queued ──→ Running ──→ Completed
//!                 │           │          │
//!                 │           │          └──→ Error(message)
//!                 │           │
//!                 └───────────┴──────────────→ Cancelled
//! ```
//!
//! The client never moves a job between states itself. A locally held
//! [`Job`] only changes when it is re-fetched, see
//! [`QuantumClient::refresh_job`](crate::QuantumClient::refresh_job).

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::{ClientError, ClientResult};
use crate::mitigation::MitigationParams;

/// Backend used when the caller does not name one.
pub const DEFAULT_BACKEND: &str = "cassiopeia";

/// Shot count used when the caller does not give one.
pub const DEFAULT_SHOTS: u32 = 1024;

/// Service-assigned job identifier.
///
/// The service sends integers; the client treats the id as opaque text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct JobId(pub String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<u64> for JobId {
    fn from(n: u64) -> Self {
        Self(n.to_string())
    }
}

impl<'de> Deserialize<'de> for JobId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Int(i64),
            Text(String),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Int(n) => Self(n.to_string()),
            RawId::Text(s) => Self(s),
        })
    }
}

/// Status of a job as reported by the service.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum JobStatus {
    /// Accepted but not yet queued.
    Created,
    /// Waiting for the backend.
    Queued,
    /// Executing on the backend.
    Running,
    /// Finished; results are available.
    Completed,
    /// Finished with a failure.
    Error,
    /// Cancelled by the user.
    Cancelled,
    /// A status this client does not know. Treated as pending.
    Unknown(String),
}

impl JobStatus {
    /// Parse a wire status string. Never fails.
    pub fn from_wire(s: &str) -> Self {
        match s {
            "created" => Self::Created,
            "queued" => Self::Queued,
            "running" => Self::Running,
            "completed" => Self::Completed,
            "error" => Self::Error,
            "cancelled" => Self::Cancelled,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// The wire status string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Created => "created",
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Error => "error",
            Self::Cancelled => "cancelled",
            Self::Unknown(s) => s,
        }
    }

    /// No further transitions occur from a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error | Self::Cancelled)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Terminal without results.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Error | Self::Cancelled)
    }

    pub fn is_pending(&self) -> bool {
        !self.is_terminal()
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for JobStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for JobStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from_wire(&s))
    }
}

/// Circuit payload. The text is passed to the service unparsed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Circuit {
    pub qasm: String,
    pub name: Option<String>,
    pub metadata: Map<String, Value>,
}

impl Circuit {
    pub fn new(qasm: impl Into<String>) -> Self {
        Self {
            qasm: qasm.into(),
            name: None,
            metadata: Map::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

impl From<&str> for Circuit {
    fn from(qasm: &str) -> Self {
        Self::new(qasm)
    }
}

impl From<String> for Circuit {
    fn from(qasm: String) -> Self {
        Self::new(qasm)
    }
}

impl<'de> Deserialize<'de> for Circuit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Object {
            qasm: String,
            #[serde(default)]
            name: Option<String>,
            #[serde(default)]
            metadata: Option<Map<String, Value>>,
        }

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Object(Object),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(qasm) => Self::new(qasm),
            Raw::Object(o) => Self {
                qasm: o.qasm,
                name: o.name,
                metadata: o.metadata.unwrap_or_default(),
            },
        })
    }
}

/// A job as last observed from the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub circuit: Option<Circuit>,
    #[serde(default)]
    pub backend: String,
    #[serde(default)]
    pub shots: u32,
    #[serde(default, with = "timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Failure text set by the service for `error` jobs.
    #[serde(default)]
    pub error_message: Option<String>,
    /// Free-form service message; some deployments report failures here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub mitigation_params: Option<MitigationParams>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: Map<String, Value>,
}

impl Job {
    /// Text describing why the job failed.
    pub fn failure_message(&self) -> String {
        let nonblank = |m: &&str| !m.trim().is_empty();
        self.error_message
            .as_deref()
            .filter(nonblank)
            .or(self.message.as_deref().filter(nonblank))
            .unwrap_or("Job failed")
            .to_string()
    }

    /// Serialize back into the service's JSON shape.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Parameters of a job creation request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobRequest {
    #[serde(rename = "circuit_info")]
    pub circuit: Circuit,
    pub backend: String,
    pub shots: u32,
    #[serde(rename = "mitigation_params", skip_serializing_if = "Option::is_none")]
    pub mitigation: Option<MitigationParams>,
}

impl JobRequest {
    pub fn new(circuit: impl Into<Circuit>, backend: impl Into<String>, shots: u32) -> Self {
        Self {
            circuit: circuit.into(),
            backend: backend.into(),
            shots,
            mitigation: None,
        }
    }

    pub fn with_mitigation(mut self, mitigation: MitigationParams) -> Self {
        self.mitigation = Some(mitigation);
        self
    }

    /// Check the request before it is sent.
    pub fn validate(&self) -> ClientResult<()> {
        if self.shots == 0 {
            return Err(ClientError::Configuration(
                "shots must be greater than 0".into(),
            ));
        }
        if self.backend.trim().is_empty() {
            return Err(ClientError::Configuration(
                "backend must be a non-empty name".into(),
            ));
        }
        Ok(())
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// ISO-8601 timestamps; values without an offset are UTC.
pub(crate) mod timestamp {
    use super::*;

    pub fn parse(s: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
            .ok()
            .map(|naive| naive.and_utc())
    }

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(dt) => serializer.serialize_str(&dt.to_rfc3339()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(None),
            Some(s) => parse(&s)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{s}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use serde_json::json;

    fn wire_job() -> Value {
        json!({
            "id": 17,
            "status": "running",
            "circuit": {"qasm": "OPENQASM 2.0;", "name": "bell", "metadata": {}},
            "backend": "cassiopeia",
            "shots": 1024,
            "created_at": "2024-03-01T12:30:00",
            "updated_at": "2024-03-01T12:31:05.250+09:00",
            "error_message": null,
            "mitigation_params": null,
            "metadata": {"queue_position": 2},
            "owner": "ignored"
        })
    }

    #[test]
    fn test_job_from_wire() {
        let job: Job = serde_json::from_value(wire_job()).unwrap();
        assert_eq!(job.id, JobId::new("17"));
        assert_eq!(job.status, JobStatus::Running);
        assert_eq!(job.circuit.as_ref().unwrap().name.as_deref(), Some("bell"));
        assert_eq!(job.shots, 1024);
        assert_eq!(job.metadata["queue_position"], 2);

        let created = job.created_at.unwrap();
        assert_eq!((created.year(), created.hour(), created.minute()), (2024, 12, 30));
        let updated = job.updated_at.unwrap();
        assert_eq!(updated.hour(), 3);
    }

    #[test]
    fn test_job_id_string_or_int() {
        let a: JobId = serde_json::from_value(json!(42)).unwrap();
        let b: JobId = serde_json::from_value(json!("42")).unwrap();
        assert_eq!(a, b);
        assert_eq!(serde_json::to_value(&a).unwrap(), json!("42"));
    }

    #[test]
    fn test_bare_string_circuit() {
        let mut raw = wire_job();
        raw["circuit"] = json!("OPENQASM 2.0; qreg q[1];");
        let job: Job = serde_json::from_value(raw).unwrap();
        let circuit = job.circuit.unwrap();
        assert_eq!(circuit.qasm, "OPENQASM 2.0; qreg q[1];");
        assert!(circuit.name.is_none());
    }

    #[test]
    fn test_minimal_job() {
        let job: Job = serde_json::from_value(json!({"id": "a1", "status": "queued"})).unwrap();
        assert_eq!(job.status, JobStatus::Queued);
        assert!(job.circuit.is_none());
        assert!(job.created_at.is_none());
    }

    #[test]
    fn test_invalid_timestamp_rejected() {
        let mut raw = wire_job();
        raw["created_at"] = json!("yesterday");
        assert!(serde_json::from_value::<Job>(raw).is_err());
    }

    #[test]
    fn test_status_terminal() {
        assert!(!JobStatus::Created.is_terminal());
        assert!(!JobStatus::Queued.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Error.is_terminal());
        assert!(JobStatus::Cancelled.is_terminal());
        assert!(JobStatus::Cancelled.is_failure());
    }

    #[test]
    fn test_unknown_status_is_pending() {
        let status: JobStatus = serde_json::from_value(json!("calibrating")).unwrap();
        assert_eq!(status, JobStatus::Unknown("calibrating".into()));
        assert!(status.is_pending());
        assert_eq!(status.to_string(), "calibrating");
        assert_eq!(serde_json::to_value(&status).unwrap(), json!("calibrating"));
    }

    #[test]
    fn test_failure_message_fallbacks() {
        let mut job: Job = serde_json::from_value(json!({"id": 1, "status": "error"})).unwrap();
        assert_eq!(job.failure_message(), "Job failed");

        job.message = Some("circuit too deep".into());
        assert_eq!(job.failure_message(), "circuit too deep");

        job.error_message = Some("qubit 3 unavailable".into());
        assert_eq!(job.failure_message(), "qubit 3 unavailable");
    }

    #[test]
    fn test_blank_error_message_falls_back_to_message() {
        let job: Job = serde_json::from_value(json!({
            "id": 1,
            "status": "error",
            "error_message": "  ",
            "message": "circuit too deep"
        }))
        .unwrap();
        assert_eq!(job.failure_message(), "circuit too deep");
    }

    #[test]
    fn test_job_request_wire_shape() {
        let req = JobRequest::new("OPENQASM 2.0;", "cassiopeia", 100)
            .with_mitigation(MitigationParams::readout(Some(500)));
        let body = serde_json::to_value(&req).unwrap();
        assert_eq!(body["circuit_info"]["qasm"], "OPENQASM 2.0;");
        assert_eq!(body["backend"], "cassiopeia");
        assert_eq!(body["shots"], 100);
        assert_eq!(body["mitigation_params"]["technique"], "readout");

        let plain = serde_json::to_value(JobRequest::new("x", "b", 1)).unwrap();
        assert!(plain.get("mitigation_params").is_none());
    }

    #[test]
    fn test_job_request_validation() {
        assert!(JobRequest::new("x", "cassiopeia", 1).validate().is_ok());
        assert!(matches!(
            JobRequest::new("x", "cassiopeia", 0).validate(),
            Err(ClientError::Configuration(_))
        ));
        assert!(matches!(
            JobRequest::new("x", "  ", 10).validate(),
            Err(ClientError::Configuration(_))
        ));
    }
}
