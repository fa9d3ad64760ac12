// Dashboard domain model - live display state and the view rendered from it
use super::observation::{
    ChannelBuffer, MISSING_READING, Observation, ObservationSnapshot, WaveformSet, decode_frame,
};
use super::patient::{DailyRound, fallback_display};
use super::vitals::{VitalDescriptor, WaveType};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionPhase {
    /// No endpoint resolved.
    #[default]
    Idle,
    Connected,
    /// The stream dropped; the last frame stays on screen.
    Disconnected,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardState {
    pub phase: ConnectionPhase,
    pub endpoint: Option<String>,
    pub snapshot: ObservationSnapshot,
    pub waveforms: Option<WaveformSet>,
    pub fallback: Option<DailyRound>,
    pub show_stats: bool,
}

impl DashboardState {
    /// Apply one inbound frame. Returns whether anything changed.
    pub fn apply_frame(&mut self, text: &str) -> bool {
        let Some(frame) = decode_frame(text) else {
            return false;
        };
        self.apply_observations(&frame);
        true
    }

    pub fn apply_observations(&mut self, frame: &[Observation]) {
        if frame.is_empty() {
            return;
        }
        self.waveforms = Some(WaveformSet::from_frame(frame));
        self.snapshot = ObservationSnapshot::from_frame(frame);
    }

    /// Drop everything tied to the current stream.
    pub fn clear_stream(&mut self) {
        self.waveforms = None;
        self.phase = ConnectionPhase::Idle;
        self.endpoint = None;
    }

    pub fn render(&self, vitals: &[VitalDescriptor], compact: bool) -> DashboardView {
        let readings = vitals
            .iter()
            .map(|vital| self.render_reading(vital, compact))
            .collect();

        let waveforms = self.waveforms.as_ref().map(|set| {
            vitals
                .iter()
                .map(|vital| self.render_panel(set, vital))
                .collect()
        });

        DashboardView {
            phase: self.phase,
            endpoint: self.endpoint.clone(),
            show_stats: self.show_stats,
            vitals: readings,
            waveforms,
            fallback_taken_at: self.fallback.as_ref().and_then(|round| round.taken_at),
        }
    }

    fn render_reading(&self, vital: &VitalDescriptor, compact: bool) -> VitalReading {
        let live = self
            .snapshot
            .get(vital.live_key)
            .and_then(Observation::display_value);

        let (value, live_indicator) = match live {
            Some(value) => (value, true),
            None => (
                fallback_display(self.fallback.as_ref(), vital.fallback_key)
                    .unwrap_or_else(|| MISSING_READING.to_string()),
                false,
            ),
        };

        VitalReading {
            label: vital.label(compact).to_string(),
            value,
            live: live_indicator,
        }
    }

    fn render_panel(&self, set: &WaveformSet, vital: &VitalDescriptor) -> WaveformPanel {
        let Some(channel) = vital.waveform.as_ref() else {
            return WaveformPanel::Placeholder;
        };
        let Some(buffer) = set.channel(channel.key) else {
            return WaveformPanel::Placeholder;
        };
        let stats = self.show_stats.then(|| TraceStats::from_samples(&buffer.data));
        let ChannelBuffer {
            channel: channel_key,
            data,
            attributes,
        } = buffer;

        WaveformPanel::Trace {
            channel: channel_key,
            title: channel.title.to_string(),
            color: channel.color.to_string(),
            wave_type: channel.wave_type,
            data,
            attributes,
            stats,
        }
    }
}

/// What a dashboard UI paints.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub phase: ConnectionPhase,
    pub endpoint: Option<String>,
    pub show_stats: bool,
    pub vitals: Vec<VitalReading>,
    /// `None` renders the "No Live data at the moment!" state.
    pub waveforms: Option<Vec<WaveformPanel>>,
    pub fallback_taken_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VitalReading {
    pub label: String,
    pub value: String,
    pub live: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WaveformPanel {
    Trace {
        channel: String,
        title: String,
        color: String,
        wave_type: WaveType,
        data: String,
        attributes: Map<String, Value>,
        #[serde(skip_serializing_if = "Option::is_none")]
        stats: Option<TraceStats>,
    },
    Placeholder,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceStats {
    pub samples: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
}

impl TraceStats {
    pub fn from_samples(data: &str) -> Self {
        let values: Vec<f64> = data
            .split_whitespace()
            .filter_map(|s| s.parse::<f64>().ok())
            .collect();

        if values.is_empty() {
            return Self {
                samples: 0,
                min: None,
                max: None,
                mean: None,
            };
        }

        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = values.iter().sum::<f64>() / values.len() as f64;

        Self {
            samples: values.len(),
            min: Some(min),
            max: Some(max),
            mean: Some(mean),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::vitals::default_vitals;

    fn reading<'a>(view: &'a DashboardView, label: &str) -> &'a VitalReading {
        view.vitals.iter().find(|v| v.label == label).unwrap()
    }

    #[test]
    fn test_live_pulse_rate() {
        let mut state = DashboardState::default();
        assert!(state.apply_frame(r#"[{"observation_id":"pulse-rate","value":72}]"#));

        let live = state.snapshot.get("pulse-rate").unwrap();
        assert_eq!(live.display_value().as_deref(), Some("72"));

        let view = state.render(&default_vitals(), false);
        let pulse = reading(&view, "Pulse Rate");
        assert_eq!(pulse.value, "72");
        assert!(pulse.live);
    }

    #[test]
    fn test_ecg_trace_concatenates_fragments() {
        let mut state = DashboardState::default();
        state.apply_frame(
            r#"[{"observation_id":"waveform","wave-name":"II","data":"1 2"},
                {"observation_id":"waveform","wave-name":"II","data":"3 4"}]"#,
        );

        let view = state.render(&default_vitals(), false);
        let panels = view.waveforms.unwrap();
        match &panels[0] {
            WaveformPanel::Trace {
                data,
                title,
                wave_type,
                ..
            } => {
                assert_eq!(data, "1 2 3 4");
                assert_eq!(title, "ECG");
                assert_eq!(*wave_type, WaveType::Refresh);
            }
            other => panic!("expected ECG trace, got {:?}", other),
        }
        assert_eq!(panels[1], WaveformPanel::Placeholder);
        assert_eq!(panels[2], WaveformPanel::Placeholder);
    }

    #[test]
    fn test_empty_frame_is_noop() {
        let mut state = DashboardState::default();
        state.apply_frame(
            r#"[{"observation_id":"pulse-rate","value":72},
                {"observation_id":"waveform","wave-name":"Pleth","data":"5 6"}]"#,
        );
        let before = state.clone();
        let view_before = state.render(&default_vitals(), false);

        assert!(!state.apply_frame("[]"));
        assert!(!state.apply_frame("garbage"));

        assert_eq!(state, before);
        assert_eq!(state.render(&default_vitals(), false), view_before);
    }

    #[test]
    fn test_blood_pressure_fallback() {
        let mut state = DashboardState::default();
        state.fallback = Some(
            serde_json::from_str(r#"{"bp":{"systolic":120,"diastolic":80}}"#).unwrap(),
        );
        let view = state.render(&default_vitals(), false);
        let bp = reading(&view, "Blood Pressure");
        assert_eq!(bp.value, "120/80");
        assert!(!bp.live);

        state.fallback = Some(serde_json::from_str(r#"{"bp":{"diastolic":80}}"#).unwrap());
        let view = state.render(&default_vitals(), true);
        assert_eq!(reading(&view, "BP").value, "--/80");
    }

    #[test]
    fn test_missing_everything_renders_dash() {
        let mut state = DashboardState::default();
        let view = state.render(&default_vitals(), false);
        assert!(view.vitals.iter().all(|v| !v.live));
        assert_eq!(reading(&view, "Blood Pressure").value, "--/--");
        assert!(
            view.vitals
                .iter()
                .filter(|v| v.label != "Blood Pressure")
                .all(|v| v.value == "--")
        );
        assert!(view.waveforms.is_none());

        state.fallback = Some(serde_json::from_str(r#"{"pulse":80}"#).unwrap());
        let view = state.render(&default_vitals(), false);
        assert_eq!(reading(&view, "Blood Pressure").value, "--/--");
        assert_eq!(reading(&view, "Pulse Rate").value, "80");
    }

    #[test]
    fn test_same_frame_twice_is_idempotent() {
        let frame = r#"[{"observation_id":"SpO2","value":97},
                        {"observation_id":"waveform","wave-name":"Pleth","data":"1 2 3"}]"#;
        let mut state = DashboardState::default();
        state.apply_frame(frame);
        let once = state.clone();
        state.apply_frame(frame);
        assert_eq!(state, once);
    }

    #[test]
    fn test_new_frame_replaces_waveforms() {
        let mut state = DashboardState::default();
        state.apply_frame(r#"[{"observation_id":"waveform","wave-name":"II","data":"1 2"}]"#);
        state.apply_frame(r#"[{"observation_id":"pulse-rate","value":60}]"#);

        assert_eq!(state.waveforms, Some(WaveformSet::default()));
        assert!(state.snapshot.get("waveform").is_none());
    }

    #[test]
    fn test_stats_overlay_follows_flag() {
        let mut state = DashboardState::default();
        state.apply_frame(
            r#"[{"observation_id":"waveform","wave-name":"Respiration","data":"2 4 6"}]"#,
        );

        let view = state.render(&default_vitals(), false);
        let trace = &view.waveforms.as_ref().unwrap()[3];
        assert!(matches!(trace, WaveformPanel::Trace { stats: None, .. }));

        state.show_stats = true;
        let view = state.render(&default_vitals(), false);
        match &view.waveforms.as_ref().unwrap()[3] {
            WaveformPanel::Trace {
                stats: Some(stats), ..
            } => {
                assert_eq!(stats.samples, 3);
                assert_eq!(stats.min, Some(2.0));
                assert_eq!(stats.max, Some(6.0));
                assert_eq!(stats.mean, Some(4.0));
            }
            other => panic!("expected trace with stats, got {:?}", other),
        }
    }

    #[test]
    fn test_live_value_beats_fallback() {
        let mut state = DashboardState::default();
        state.fallback = Some(serde_json::from_str(r#"{"temperature":"98.1"}"#).unwrap());
        let view = state.render(&default_vitals(), false);
        assert_eq!(reading(&view, "Temperature (°F)").value, "98.1");

        state.apply_frame(r#"[{"observation_id":"body-temperature1","value":99.2}]"#);
        let view = state.render(&default_vitals(), false);
        let temp = reading(&view, "Temperature (°F)");
        assert_eq!(temp.value, "99.2");
        assert!(temp.live);
    }
}
