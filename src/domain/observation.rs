// Observation domain models - frames pushed by the monitoring middleware
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::HashMap;

pub const WAVEFORM_OBSERVATION_ID: &str = "waveform";

/// One named measurement sample from a bedside monitor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub observation_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<ObservationValue>,
    #[serde(rename = "wave-name", default, skip_serializing_if = "Option::is_none")]
    pub wave_name: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_samples",
        skip_serializing_if = "Option::is_none"
    )]
    pub data: Option<String>,
    /// Device specific attributes (sampling rate, limits, units, ...)
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl Observation {
    pub fn is_waveform(&self) -> bool {
        self.observation_id == WAVEFORM_OBSERVATION_ID
    }

    /// Display form of the live value, `None` when the frame carried no usable value.
    pub fn display_value(&self) -> Option<String> {
        self.value.as_ref().and_then(ObservationValue::display)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ObservationValue {
    Number(Number),
    Text(String),
    BloodPressure {
        systolic: Option<Number>,
        diastolic: Option<Number>,
    },
    Other(Value),
}

impl From<Value> for ObservationValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Number(n) => ObservationValue::Number(n),
            Value::String(s) => ObservationValue::Text(s),
            Value::Object(mut map)
                if map.contains_key("systolic") || map.contains_key("diastolic") =>
            {
                ObservationValue::BloodPressure {
                    systolic: pressure_side(map.remove("systolic")),
                    diastolic: pressure_side(map.remove("diastolic")),
                }
            }
            other => ObservationValue::Other(other),
        }
    }
}

impl<'de> Deserialize<'de> for ObservationValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(deserializer).map(ObservationValue::from)
    }
}

impl ObservationValue {
    pub fn display(&self) -> Option<String> {
        match self {
            ObservationValue::Number(n) => Some(n.to_string()),
            ObservationValue::Text(s) if s.is_empty() => None,
            ObservationValue::Text(s) => Some(s.clone()),
            ObservationValue::BloodPressure {
                systolic: None,
                diastolic: None,
            } => None,
            ObservationValue::BloodPressure {
                systolic,
                diastolic,
            } => Some(format_pressure_pair(
                systolic.as_ref().map(Number::to_string),
                diastolic.as_ref().map(Number::to_string),
            )),
            ObservationValue::Other(Value::Null) => None,
            ObservationValue::Other(v) => Some(v.to_string()),
        }
    }
}

pub const MISSING_READING: &str = "--";

/// `systolic/diastolic`, each missing side shown as a dash.
pub fn format_pressure_pair(systolic: Option<String>, diastolic: Option<String>) -> String {
    format!(
        "{}/{}",
        systolic.as_deref().unwrap_or(MISSING_READING),
        diastolic.as_deref().unwrap_or(MISSING_READING)
    )
}

// Some monitors nest each side as `{ "value": 120 }`.
fn pressure_side(value: Option<Value>) -> Option<Number> {
    match value {
        Some(Value::Number(n)) => Some(n),
        Some(Value::Object(mut inner)) => match inner.remove("value") {
            Some(Value::Number(n)) => Some(n),
            _ => None,
        },
        _ => None,
    }
}

fn deserialize_samples<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Array(items)) => Some(
            items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(" "),
        ),
        Some(Value::Null) | None => None,
        Some(other) => Some(other.to_string()),
    })
}

/// Decode one inbound text frame.
///
/// Anything that is not a non-empty JSON array of observations yields `None`,
/// which callers treat as a no-op.
pub fn decode_frame(text: &str) -> Option<Vec<Observation>> {
    if text.trim().is_empty() {
        return None;
    }
    match serde_json::from_str::<Vec<Observation>>(text) {
        Ok(observations) if !observations.is_empty() => Some(observations),
        Ok(_) => None,
        Err(e) => {
            tracing::debug!("Ignoring undecodable observation frame: {}", e);
            None
        }
    }
}

/// Latest observation per key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObservationSnapshot {
    observations: HashMap<String, Observation>,
}

impl ObservationSnapshot {
    /// Fold a frame into a fresh snapshot; later entries win.
    pub fn from_frame(frame: &[Observation]) -> Self {
        let observations = frame
            .iter()
            .map(|o| (o.observation_id.clone(), o.clone()))
            .collect();
        Self { observations }
    }

    pub fn get(&self, key: &str) -> Option<&Observation> {
        self.observations.get(key)
    }
}

/// Waveform entries of the latest frame, in arrival order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WaveformSet {
    fragments: Vec<Observation>,
}

/// A channel's buffer assembled from every fragment in the frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelBuffer {
    pub channel: String,
    pub data: String,
    pub attributes: Map<String, Value>,
}

impl WaveformSet {
    pub fn from_frame(frame: &[Observation]) -> Self {
        Self {
            fragments: frame.iter().filter(|o| o.is_waveform()).cloned().collect(),
        }
    }

    pub fn channel(&self, name: &str) -> Option<ChannelBuffer> {
        let mut matching = self
            .fragments
            .iter()
            .filter(|o| o.wave_name.as_deref() == Some(name))
            .peekable();
        let first = matching.peek().copied()?;
        let attributes = first.attributes.clone();
        let data = matching
            .map(|o| o.data.as_deref().unwrap_or_default())
            .collect::<Vec<_>>()
            .join(" ");

        Some(ChannelBuffer {
            channel: name.to_string(),
            data,
            attributes,
        })
    }
}
