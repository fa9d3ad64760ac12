// Patient domain models - the parts of a patient record the vitals dashboard reads
use super::observation::{MISSING_READING, format_pressure_pair};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub last_consultation: Option<Consultation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Consultation {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub current_bed: Option<CurrentBed>,
    #[serde(default)]
    pub last_daily_round: Option<DailyRound>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentBed {
    #[serde(default)]
    pub bed_object: Option<BedRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BedRef {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// The most recent periodic (non-live) vitals reading.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyRound {
    #[serde(default)]
    pub bp: Option<PressureReading>,
    #[serde(default)]
    pub taken_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub readings: HashMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PressureReading {
    #[serde(default)]
    pub systolic: Option<Value>,
    #[serde(default)]
    pub diastolic: Option<Value>,
}

impl Patient {
    pub fn current_bed_id(&self) -> Option<&str> {
        self.last_consultation
            .as_ref()?
            .current_bed
            .as_ref()?
            .bed_object
            .as_ref()
            .map(|bed| bed.id.as_str())
            .filter(|id| !id.is_empty())
    }

    pub fn last_daily_round(&self) -> Option<&DailyRound> {
        self.last_consultation.as_ref()?.last_daily_round.as_ref()
    }
}

impl DailyRound {
    pub fn display(&self, key: &str) -> Option<String> {
        fallback_display(Some(self), key)
    }
}

/// Fallback display for a vital. Blood pressure always renders as a pair,
/// with `--` for each side the round does not carry.
pub fn fallback_display(round: Option<&DailyRound>, key: &str) -> Option<String> {
    if key == "bp" {
        let bp = round.and_then(|round| round.bp.as_ref());
        return Some(format_pressure_pair(
            bp.and_then(|bp| bp.systolic.as_ref()).and_then(reading_text),
            bp.and_then(|bp| bp.diastolic.as_ref()).and_then(reading_text),
        ));
    }
    round?.readings.get(key).and_then(reading_text)
}

// Zero, empty and null readings were never recorded.
fn reading_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if s.is_empty() || s == MISSING_READING => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(_) | Value::Array(_) | Value::Object(_) => None,
    }
}
