// Vital display descriptors - which live key, fallback key and waveform each vital uses
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WaveType {
    /// Trace scrolls continuously.
    Stream,
    /// Trace redraws from the left edge each sweep.
    Refresh,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WaveformChannel {
    pub key: &'static str,
    pub title: &'static str,
    pub color: &'static str,
    pub wave_type: WaveType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VitalDescriptor {
    pub label: &'static str,
    pub short_label: &'static str,
    pub live_key: &'static str,
    pub fallback_key: &'static str,
    pub waveform: Option<WaveformChannel>,
}

impl VitalDescriptor {
    pub fn label(&self, compact: bool) -> &'static str {
        if compact { self.short_label } else { self.label }
    }
}

pub fn default_vitals() -> Vec<VitalDescriptor> {
    vec![
        VitalDescriptor {
            label: "Pulse Rate",
            short_label: "Pulse",
            live_key: "pulse-rate",
            fallback_key: "pulse",
            waveform: Some(WaveformChannel {
                key: "II",
                title: "ECG",
                color: "limegreen",
                wave_type: WaveType::Refresh,
            }),
        },
        VitalDescriptor {
            label: "Blood Pressure",
            short_label: "BP",
            live_key: "bp",
            fallback_key: "bp",
            waveform: None,
        },
        VitalDescriptor {
            label: "SpO2",
            short_label: "SpO2",
            live_key: "SpO2",
            fallback_key: "ventilator_spo2",
            waveform: Some(WaveformChannel {
                key: "Pleth",
                title: "Pleth",
                color: "yellow",
                wave_type: WaveType::Stream,
            }),
        },
        VitalDescriptor {
            label: "R. Rate",
            short_label: "R. Rate",
            live_key: "respiratory-rate",
            fallback_key: "resp",
            waveform: Some(WaveformChannel {
                key: "Respiration",
                title: "Respiration",
                color: "cyan",
                wave_type: WaveType::Stream,
            }),
        },
        VitalDescriptor {
            label: "Temperature (°F)",
            short_label: "Temp. (°F)",
            live_key: "body-temperature1",
            fallback_key: "temperature",
            waveform: None,
        },
    ]
}
