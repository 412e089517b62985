//! Backend descriptors from `GET /api/hardware/backends/`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Read-only snapshot of a backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendInfo {
    pub name: String,
    /// Live status string, e.g. `online` or `maintenance`.
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub n_qubits: u32,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub capabilities: Map<String, Value>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub metadata: Map<String, Value>,
}

impl BackendInfo {
    pub fn is_online(&self) -> bool {
        matches!(
            self.status.to_ascii_lowercase().as_str(),
            "online" | "available" | "active"
        )
    }

    /// Capability flag lookup, `false` when absent or not a boolean.
    pub fn supports(&self, capability: &str) -> bool {
        self.capabilities
            .get(capability)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_backend_from_wire() {
        let b: BackendInfo = serde_json::from_value(json!({
            "name": "cassiopeia",
            "status": "online",
            "n_qubits": 5,
            "capabilities": {"mid_circuit_measurement": true},
            "metadata": null
        }))
        .unwrap();
        assert_eq!(b.n_qubits, 5);
        assert!(b.is_online());
        assert!(b.supports("mid_circuit_measurement"));
        assert!(!b.supports("pulse"));
        assert!(b.metadata.is_empty());
    }

    #[test]
    fn test_backend_offline() {
        let b: BackendInfo =
            serde_json::from_value(json!({"name": "sim", "status": "Maintenance"})).unwrap();
        assert!(!b.is_online());
        assert_eq!(b.n_qubits, 0);
    }
}
