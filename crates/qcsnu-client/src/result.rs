//! Result translation.
//!
//! The service returns a measurement histogram keyed by bitstring, either as
//! raw counts or as probabilities. [`ExecutionResult`] validates the payload
//! once and then answers probability and expectation-value queries against
//! it. All keys of one result have the same width: the number of classical
//! bits of the circuit.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Deserializer, Serialize, de};
use serde_json::{Map, Number, Value};

use crate::error::{ClientError, ClientResult};
use crate::job::JobId;

/// Largest register for which [`Observable::parity`] enumerates bitstrings.
pub const MAX_PARITY_WIDTH: usize = 20;

/// Tolerance on the total of a probability distribution.
const PROBABILITY_TOLERANCE: f64 = 1e-6;

/// Measurement histogram as sent by the service.
///
/// A mapping of whole numbers (`512` or `512.0`) is raw counts. Any value
/// with a fractional part makes the whole mapping a probability distribution.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Distribution {
    Counts(FxHashMap<String, u64>),
    Probabilities(FxHashMap<String, f64>),
}

impl<'de> Deserialize<'de> for Distribution {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = FxHashMap::<String, Number>::deserialize(deserializer)?;

        let counts: Option<FxHashMap<String, u64>> = raw
            .iter()
            .map(|(k, n)| whole_count(n).map(|c| (k.clone(), c)))
            .collect();
        if let Some(counts) = counts {
            return Ok(Self::Counts(counts));
        }

        raw.into_iter()
            .map(|(k, n)| {
                n.as_f64()
                    .map(|p| (k, p))
                    .ok_or_else(|| {
                        <D::Error as de::Error>::custom(format!("{n} is not a probability"))
                    })
            })
            .collect::<Result<_, _>>()
            .map(Self::Probabilities)
    }
}

/// `n` as a shot count, if it is a non-negative whole number.
fn whole_count(n: &Number) -> Option<u64> {
    n.as_u64().or_else(|| {
        n.as_f64()
            .filter(|v| *v >= 0.0 && v.fract() == 0.0 && *v < u64::MAX as f64)
            .map(|v| v as u64)
    })
}

impl Distribution {
    pub fn len(&self) -> usize {
        match self {
            Self::Counts(m) => m.len(),
            Self::Probabilities(m) => m.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn keys(&self) -> Box<dyn Iterator<Item = &String> + '_> {
        match self {
            Self::Counts(m) => Box::new(m.keys()),
            Self::Probabilities(m) => Box::new(m.keys()),
        }
    }
}

impl Default for Distribution {
    fn default() -> Self {
        Self::Counts(FxHashMap::default())
    }
}

/// Result payload from `GET /api/runner/jobs/{id}/results/`.
#[derive(Debug, Clone, Deserialize)]
pub struct ResultPayload {
    #[serde(default)]
    pub job_id: Option<JobId>,
    #[serde(default)]
    pub counts: Distribution,
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
    #[serde(default)]
    pub processed_data: Option<Value>,
    #[serde(default)]
    pub error_mitigation: Option<Value>,
}

/// Validated result of a completed job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionResult {
    pub job_id: JobId,
    counts: Distribution,
    #[serde(skip)]
    width: Option<usize>,
    pub metadata: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_mitigation: Option<Value>,
}

impl ExecutionResult {
    /// Translate a wire payload. `job_id` is used when the payload omits it.
    pub fn from_payload(job_id: JobId, payload: ResultPayload) -> ClientResult<Self> {
        let width = validate_distribution(&payload.counts)?;
        Ok(Self {
            job_id: payload.job_id.unwrap_or(job_id),
            counts: payload.counts,
            width,
            metadata: payload.metadata.unwrap_or_default(),
            processed_data: payload.processed_data,
            error_mitigation: payload.error_mitigation,
        })
    }

    /// Build a result from a distribution with no metadata.
    pub fn new(job_id: impl Into<JobId>, counts: Distribution) -> ClientResult<Self> {
        Self::from_payload(
            job_id.into(),
            ResultPayload {
                job_id: None,
                counts,
                metadata: None,
                processed_data: None,
                error_mitigation: None,
            },
        )
    }

    /// Build a result from raw counts.
    pub fn from_counts<K: Into<String>>(
        job_id: impl Into<JobId>,
        counts: impl IntoIterator<Item = (K, u64)>,
    ) -> ClientResult<Self> {
        let map = counts.into_iter().map(|(k, v)| (k.into(), v)).collect();
        Self::new(job_id, Distribution::Counts(map))
    }

    /// Build a result from probabilities.
    pub fn from_probabilities<K: Into<String>>(
        job_id: impl Into<JobId>,
        probabilities: impl IntoIterator<Item = (K, f64)>,
    ) -> ClientResult<Self> {
        let map = probabilities
            .into_iter()
            .map(|(k, v)| (k.into(), v))
            .collect();
        Self::new(job_id, Distribution::Probabilities(map))
    }

    pub fn distribution(&self) -> &Distribution {
        &self.counts
    }

    /// Register width, `None` for an empty result.
    pub fn width(&self) -> Option<usize> {
        self.width
    }

    /// Total shots, when the result holds raw counts.
    pub fn total_shots(&self) -> Option<u64> {
        match &self.counts {
            Distribution::Counts(m) => Some(m.values().sum()),
            Distribution::Probabilities(_) => None,
        }
    }

    /// Execution time in seconds, if the service reported it.
    pub fn execution_time(&self) -> Option<f64> {
        self.metadata.get("execution_time").and_then(Value::as_f64)
    }

    /// Backend name, if the service reported it.
    pub fn backend(&self) -> Option<&str> {
        self.metadata.get("backend").and_then(Value::as_str)
    }

    /// Probability of a bitstring.
    ///
    /// A well-formed bitstring that was never observed has probability 0.0.
    pub fn get_probability(&self, bitstring: &str) -> ClientResult<f64> {
        check_binary(bitstring)?;
        let Some(width) = self.width else {
            return Ok(0.0);
        };
        check_width(bitstring, width)?;

        Ok(match &self.counts {
            Distribution::Counts(m) => {
                let total: u64 = m.values().sum();
                if total == 0 {
                    0.0
                } else {
                    m.get(bitstring).copied().unwrap_or(0) as f64 / total as f64
                }
            }
            Distribution::Probabilities(m) => m.get(bitstring).copied().unwrap_or(0.0),
        })
    }

    /// Probability of every observed bitstring.
    pub fn probabilities(&self) -> FxHashMap<String, f64> {
        match &self.counts {
            Distribution::Counts(m) => {
                let total: u64 = m.values().sum();
                m.iter()
                    .map(|(k, &v)| {
                        let p = if total == 0 {
                            0.0
                        } else {
                            v as f64 / total as f64
                        };
                        (k.clone(), p)
                    })
                    .collect()
            }
            Distribution::Probabilities(m) => m.clone(),
        }
    }

    /// Probabilities ordered from most to least likely, ties by bitstring.
    pub fn sorted(&self) -> Vec<(String, f64)> {
        let mut entries: Vec<_> = self.probabilities().into_iter().collect();
        entries.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        entries
    }

    /// The most likely bitstring.
    pub fn most_frequent(&self) -> Option<(String, f64)> {
        self.sorted().into_iter().next()
    }

    /// Expectation value of a diagonal observable.
    ///
    /// Observable entries the result never observed contribute nothing. An
    /// observed bitstring without a coefficient is an error.
    pub fn expectation_value(&self, observable: &Observable) -> ClientResult<f64> {
        for key in observable.0.keys() {
            check_binary(key)?;
            if let Some(width) = self.width {
                check_width(key, width)?;
            }
        }

        let mut expectation = 0.0;
        for (bitstring, p) in self.probabilities() {
            if p == 0.0 {
                continue;
            }
            let coefficient = observable
                .get(&bitstring)
                .ok_or_else(|| ClientError::IncompleteObservable(bitstring.clone()))?;
            expectation += coefficient * p;
        }
        Ok(expectation)
    }

    /// Expectation of Z on every qubit, `sum p(b) * (-1)^popcount(b)`.
    ///
    /// Computed over the observed bitstrings only, so it works for any
    /// register width. An empty result yields 0.0.
    pub fn parity_expectation(&self) -> f64 {
        self.probabilities()
            .iter()
            .map(|(bitstring, p)| {
                let ones = bitstring.bytes().filter(|&b| b == b'1').count();
                if ones % 2 == 0 { *p } else { -*p }
            })
            .sum()
    }
}

/// Diagonal observable: one real coefficient per bitstring.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Observable(FxHashMap<String, f64>);

impl Observable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, bitstring: impl Into<String>, coefficient: f64) {
        self.0.insert(bitstring.into(), coefficient);
    }

    pub fn with(mut self, bitstring: impl Into<String>, coefficient: f64) -> Self {
        self.insert(bitstring, coefficient);
        self
    }

    pub fn get(&self, bitstring: &str) -> Option<f64> {
        self.0.get(bitstring).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, &v)| (k.as_str(), v))
    }

    /// Z on every qubit: `(-1)^popcount(b)` for all `2^width` bitstrings.
    ///
    /// Widths above [`MAX_PARITY_WIDTH`] are a configuration error; use
    /// [`ExecutionResult::parity_expectation`] for wide registers.
    pub fn parity(width: usize) -> ClientResult<Self> {
        if width > MAX_PARITY_WIDTH {
            return Err(ClientError::Configuration(format!(
                "parity observable over {width} bits exceeds the {MAX_PARITY_WIDTH}-bit limit"
            )));
        }
        if width == 0 {
            return Ok(Self::default());
        }
        Ok((0u64..1 << width)
            .map(|i| {
                let sign = if i.count_ones() % 2 == 0 { 1.0 } else { -1.0 };
                (format!("{i:0width$b}"), sign)
            })
            .collect())
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for Observable {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl From<FxHashMap<String, f64>> for Observable {
    fn from(map: FxHashMap<String, f64>) -> Self {
        Self(map)
    }
}

fn check_binary(bitstring: &str) -> ClientResult<()> {
    if bitstring.chars().all(|c| c == '0' || c == '1') {
        Ok(())
    } else {
        Err(ClientError::InvalidBitstring(bitstring.to_string()))
    }
}

fn check_width(bitstring: &str, width: usize) -> ClientResult<()> {
    if bitstring.len() == width {
        Ok(())
    } else {
        Err(ClientError::BitstringLength {
            bitstring: bitstring.to_string(),
            expected: width,
            found: bitstring.len(),
        })
    }
}

/// Returns the common key width.
fn validate_distribution(dist: &Distribution) -> ClientResult<Option<usize>> {
    let mut width = None;
    for key in dist.keys() {
        if key.is_empty() || check_binary(key).is_err() {
            return Err(ClientError::InvalidResult(format!(
                "'{key}' is not a bitstring"
            )));
        }
        match width {
            None => width = Some(key.len()),
            Some(w) if w != key.len() => {
                return Err(ClientError::InvalidResult(format!(
                    "bitstrings of mixed width ({w} and {})",
                    key.len()
                )));
            }
            Some(_) => {}
        }
    }

    if let Distribution::Probabilities(m) = dist {
        if let Some((key, p)) = m
            .iter()
            .find(|(_, p)| !p.is_finite() || **p < 0.0 || **p > 1.0 + PROBABILITY_TOLERANCE)
        {
            return Err(ClientError::InvalidResult(format!(
                "probability {p} for '{key}' is out of range"
            )));
        }
        let total: f64 = m.values().sum();
        if !m.is_empty() && (total - 1.0).abs() > PROBABILITY_TOLERANCE {
            return Err(ClientError::InvalidResult(format!(
                "probabilities sum to {total}, not 1"
            )));
        }
    }
    Ok(width)
}
