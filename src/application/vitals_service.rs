// Vitals dashboard service - one observation stream per dashboard, decoded into display state
use crate::application::care_repository::CareDataAccess;
use crate::application::endpoint_resolver::{EndpointResolver, Resolution};
use crate::application::reconnect::ReconnectPolicy;
use crate::application::transport::{ObservationConnection, ObservationTransport};
use crate::domain::dashboard::{ConnectionPhase, DashboardState, DashboardView};
use crate::domain::observation::ObservationSnapshot;
use crate::domain::patient::Patient;
use crate::domain::vitals::VitalDescriptor;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, oneshot, watch};
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Default)]
pub struct DashboardOptions {
    /// Use short vital labels.
    pub compact: bool,
    pub reconnect: ReconnectPolicy,
}

/// What the dashboard should be showing.
#[derive(Debug, Clone, Default)]
pub struct DashboardTarget {
    pub facility_id: Option<String>,
    pub patient: Option<Patient>,
    /// Always stream from this URL instead of resolving one.
    pub endpoint_override: Option<String>,
}

/// Read side of a dashboard, cheap to clone into request handlers.
#[derive(Clone)]
pub struct DashboardHandle {
    state: Arc<watch::Sender<DashboardState>>,
    vitals: Arc<Vec<VitalDescriptor>>,
    compact: bool,
}

impl DashboardHandle {
    pub fn view(&self) -> DashboardView {
        self.render(&self.state.borrow())
    }

    pub fn render(&self, state: &DashboardState) -> DashboardView {
        state.render(&self.vitals, self.compact)
    }

    pub fn subscribe(&self) -> watch::Receiver<DashboardState> {
        self.state.subscribe()
    }

    /// Flip the waveform stats overlay, returning the new setting.
    pub fn toggle_stats(&self) -> bool {
        let mut show_stats = false;
        self.state.send_modify(|state| {
            state.show_stats = !state.show_stats;
            show_stats = state.show_stats;
        });
        show_stats
    }
}

struct Session {
    facility_id: Option<String>,
    patient: Option<Patient>,
    endpoint_override: Option<String>,
    endpoint: Option<String>,
    reader: Option<StreamReader>,
}

struct StreamReader {
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl StreamReader {
    async fn stop(self) {
        let _ = self.shutdown.send(());
        if let Err(e) = self.handle.await {
            tracing::warn!("Observation reader ended abnormally: {}", e);
        }
    }
}

pub struct VitalsDashboard {
    resolver: EndpointResolver,
    transport: Arc<dyn ObservationTransport>,
    reconnect: ReconnectPolicy,
    handle: DashboardHandle,
    session: Mutex<Session>,
    connection_generation: Arc<AtomicU64>,
}

impl VitalsDashboard {
    pub fn new(
        data_access: Arc<dyn CareDataAccess>,
        transport: Arc<dyn ObservationTransport>,
        vitals: Vec<VitalDescriptor>,
        options: DashboardOptions,
    ) -> Self {
        let (state, _) = watch::channel(DashboardState::default());
        Self {
            resolver: EndpointResolver::new(data_access),
            transport,
            reconnect: options.reconnect,
            handle: DashboardHandle {
                state: Arc::new(state),
                vitals: Arc::new(vitals),
                compact: options.compact,
            },
            session: Mutex::new(Session {
                facility_id: None,
                patient: None,
                endpoint_override: None,
                endpoint: None,
                reader: None,
            }),
            connection_generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn handle(&self) -> DashboardHandle {
        self.handle.clone()
    }

    pub async fn endpoint(&self) -> Option<String> {
        self.session.lock().await.endpoint.clone()
    }

    /// Point the dashboard at a new target and re-resolve the stream.
    ///
    /// Switching to a different patient tears the current stream down first so
    /// frames from the previous bed are never shown for the new patient.
    pub async fn retarget(&self, target: DashboardTarget) -> Option<String> {
        let DashboardTarget {
            facility_id,
            patient,
            endpoint_override,
        } = target;
        {
            let mut session = self.session.lock().await;
            let patient_changed = session.patient.as_ref().map(|p| &p.id)
                != patient.as_ref().map(|p| &p.id);
            if patient_changed {
                self.teardown(&mut session).await;
            }

            let fallback = patient
                .as_ref()
                .and_then(Patient::last_daily_round)
                .cloned();
            self.handle.state.send_modify(|state| {
                if patient_changed {
                    state.snapshot = ObservationSnapshot::default();
                }
                state.fallback = fallback;
            });

            session.facility_id = facility_id;
            session.patient = patient;
            session.endpoint_override = endpoint_override.filter(|url| !url.is_empty());
        }
        self.refresh().await
    }

    /// Recompute the endpoint from the current target and apply it.
    async fn refresh(&self) -> Option<String> {
        let ticket = self.resolver.begin();
        let (facility_id, patient, endpoint_override) = {
            let session = self.session.lock().await;
            (
                session.facility_id.clone(),
                session.patient.clone(),
                session.endpoint_override.clone(),
            )
        };

        let endpoint = match endpoint_override {
            Some(url) => Some(url),
            None => match self
                .resolver
                .resolve(ticket, facility_id.as_deref(), patient.as_ref())
                .await
            {
                Resolution::Resolved(endpoint) => endpoint,
                Resolution::Stale => return self.endpoint().await,
            },
        };

        let mut session = self.session.lock().await;
        if !self.resolver.is_current(ticket) {
            tracing::debug!("Endpoint resolution superseded before it could be applied");
            return session.endpoint.clone();
        }
        self.apply_endpoint(&mut session, endpoint).await;
        session.endpoint.clone()
    }

    /// Stream from `endpoint`, or go idle when it is `None`.
    pub async fn set_endpoint(&self, endpoint: Option<String>) {
        // Invalidate any resolution still in flight.
        self.resolver.begin();
        let mut session = self.session.lock().await;
        self.apply_endpoint(&mut session, endpoint).await;
    }

    /// Close the stream and clear live waveforms, as when the dashboard is removed.
    pub async fn shutdown(&self) {
        self.resolver.begin();
        let mut session = self.session.lock().await;
        self.teardown(&mut session).await;
    }

    async fn apply_endpoint(&self, session: &mut Session, endpoint: Option<String>) {
        let endpoint = endpoint.filter(|url| !url.is_empty());
        if session.endpoint == endpoint {
            return;
        }

        self.teardown(session).await;
        let Some(url) = endpoint else {
            tracing::info!("Observation endpoint cleared, dashboard idle");
            return;
        };

        let generation = self.connection_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let stream = ObservationStream {
            url: url.clone(),
            generation,
            current_generation: self.connection_generation.clone(),
            transport: self.transport.clone(),
            state: self.handle.state.clone(),
            reconnect: self.reconnect.clone(),
        };

        self.handle.state.send_modify(|state| state.endpoint = Some(url.clone()));
        session.endpoint = Some(url);
        session.reader = Some(StreamReader {
            shutdown: shutdown_tx,
            handle: tokio::spawn(stream.run(shutdown_rx)),
        });
    }

    async fn teardown(&self, session: &mut Session) {
        // Frames still in flight from the old reader are dropped from here on.
        self.connection_generation.fetch_add(1, Ordering::SeqCst);
        if let Some(reader) = session.reader.take() {
            reader.stop().await;
        }
        session.endpoint = None;
        self.handle.state.send_modify(DashboardState::clear_stream);
    }
}

enum ReadOutcome {
    Shutdown,
    Dropped,
}

struct ObservationStream {
    url: String,
    generation: u64,
    current_generation: Arc<AtomicU64>,
    transport: Arc<dyn ObservationTransport>,
    state: Arc<watch::Sender<DashboardState>>,
    reconnect: ReconnectPolicy,
}

impl ObservationStream {
    fn is_current(&self) -> bool {
        self.current_generation.load(Ordering::SeqCst) == self.generation
    }

    fn update(&self, modify: impl FnOnce(&mut DashboardState) -> bool) {
        self.state.send_if_modified(|state| self.is_current() && modify(state));
    }

    fn set_phase(&self, phase: ConnectionPhase) {
        self.update(|state| {
            let changed = state.phase != phase;
            state.phase = phase;
            changed
        });
    }

    async fn run(self, mut shutdown: oneshot::Receiver<()>) {
        let mut attempt = 0;
        loop {
            let connected = tokio::select! {
                _ = &mut shutdown => return,
                result = self.transport.connect(&self.url) => result,
            };

            match connected {
                Ok(mut connection) => {
                    tracing::info!("Connected to observation stream {}", self.url);
                    attempt = 0;
                    self.set_phase(ConnectionPhase::Connected);

                    let outcome = self.read_frames(connection.as_mut(), &mut shutdown).await;
                    if let Err(e) = connection.close().await {
                        tracing::debug!("Closing {} failed: {}", self.url, e);
                    }
                    if let ReadOutcome::Shutdown = outcome {
                        tracing::info!("Closed observation stream {}", self.url);
                        return;
                    }
                    tracing::warn!("Observation stream {} dropped", self.url);
                }
                Err(e) => {
                    tracing::warn!("Could not connect to {}: {}", self.url, e);
                }
            }

            self.set_phase(ConnectionPhase::Disconnected);
            let Some(delay) = self.reconnect.delay_for(attempt) else {
                return;
            };
            attempt += 1;
            tracing::info!("Reconnecting to {} in {:?} (attempt {})", self.url, delay, attempt);
            tokio::select! {
                _ = &mut shutdown => return,
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    async fn read_frames(
        &self,
        connection: &mut dyn ObservationConnection,
        shutdown: &mut oneshot::Receiver<()>,
    ) -> ReadOutcome {
        loop {
            tokio::select! {
                _ = &mut *shutdown => return ReadOutcome::Shutdown,
                frame = connection.next_frame() => match frame {
                    Some(Ok(text)) => {
                        tracing::trace!("Observation frame of {} bytes", text.len());
                        self.update(|state| state.apply_frame(&text));
                    }
                    Some(Err(e)) => {
                        tracing::warn!("Observation stream {} failed: {}", self.url, e);
                        return ReadOutcome::Dropped;
                    }
                    None => return ReadOutcome::Dropped,
                },
            }
        }
    }
}
