// In-memory fakes for the care backend and observation transport
use crate::application::care_repository::CareDataAccess;
use crate::application::error::{Result, VitalsError};
use crate::application::transport::{ObservationConnection, ObservationTransport};
use crate::domain::facility::{Asset, AssetBed, AssetMeta, Facility};
use crate::domain::patient::Patient;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Default)]
pub struct FakeCareData {
    facilities: HashMap<String, Facility>,
    asset_beds: HashMap<String, Vec<AssetBed>>,
    patients: HashMap<String, Patient>,
}

impl FakeCareData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_facility(mut self, id: &str, middleware: Option<&str>) -> Self {
        self.facilities.insert(
            id.to_string(),
            Facility {
                id: id.to_string(),
                name: Some(format!("Facility {}", id)),
                middleware_address: middleware.map(str::to_string),
            },
        );
        self
    }

    pub fn with_monitor(self, bed_id: &str, address: &str) -> Self {
        self.with_asset(bed_id, "HL7MONITOR", address)
    }

    pub fn with_camera(self, bed_id: &str, address: &str) -> Self {
        self.with_asset(bed_id, "ONVIF", address)
    }

    pub fn with_patient(mut self, patient: Patient) -> Self {
        self.patients.insert(patient.id.clone(), patient);
        self
    }

    fn with_asset(mut self, bed_id: &str, asset_type: &str, address: &str) -> Self {
        let links = self.asset_beds.entry(bed_id.to_string()).or_default();
        links.push(AssetBed {
            id: Some(format!("link-{}", links.len())),
            asset_object: Asset {
                id: format!("{}-{}", asset_type.to_lowercase(), address),
                name: None,
                meta: Some(AssetMeta {
                    asset_type: Some(asset_type.to_string()),
                    local_ip_address: Some(address.to_string()),
                }),
            },
            bed_object: None,
        });
        self
    }
}

#[async_trait]
impl CareDataAccess for FakeCareData {
    async fn get_facility(&self, facility_id: &str) -> Result<Facility> {
        self.facilities
            .get(facility_id)
            .cloned()
            .ok_or_else(|| VitalsError::NotFound {
                resource: "facility",
                id: facility_id.to_string(),
            })
    }

    async fn list_asset_beds(&self, bed_id: &str) -> Result<Vec<AssetBed>> {
        Ok(self.asset_beds.get(bed_id).cloned().unwrap_or_default())
    }

    async fn get_patient(&self, patient_id: &str) -> Result<Patient> {
        self.patients
            .get(patient_id)
            .cloned()
            .ok_or_else(|| VitalsError::NotFound {
                resource: "patient",
                id: patient_id.to_string(),
            })
    }
}

pub fn patient_in_bed(id: &str, bed_id: &str) -> Patient {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "last_consultation": {
            "current_bed": { "bed_object": { "id": bed_id } }
        }
    }))
    .unwrap()
}

/// Test side of a fake connection.
pub struct FakeSocket {
    pub url: String,
    frames: Option<mpsc::UnboundedSender<String>>,
    closed: Arc<AtomicBool>,
}

impl FakeSocket {
    pub fn push(&self, text: &str) {
        if let Some(frames) = &self.frames {
            let _ = frames.send(text.to_string());
        }
    }

    /// Simulate the peer dropping the connection.
    pub fn hang_up(&mut self) {
        self.frames = None;
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

struct FakeConnection {
    frames: mpsc::UnboundedReceiver<String>,
    closed: Arc<AtomicBool>,
}

#[async_trait]
impl ObservationConnection for FakeConnection {
    async fn next_frame(&mut self) -> Option<Result<String>> {
        self.frames.recv().await.map(Ok)
    }

    async fn send(&mut self, _text: &str) -> Result<()> {
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

pub struct FakeTransport {
    sockets_tx: mpsc::UnboundedSender<FakeSocket>,
    sockets_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<FakeSocket>>,
    connects: Mutex<Vec<String>>,
    refuse: AtomicBool,
}

impl FakeTransport {
    pub fn new() -> Self {
        let (sockets_tx, sockets_rx) = mpsc::unbounded_channel();
        Self {
            sockets_tx,
            sockets_rx: tokio::sync::Mutex::new(sockets_rx),
            connects: Mutex::new(Vec::new()),
            refuse: AtomicBool::new(false),
        }
    }

    pub fn refuse_connections(&self, refuse: bool) {
        self.refuse.store(refuse, Ordering::SeqCst);
    }

    pub fn connect_attempts(&self) -> Vec<String> {
        self.connects.lock().unwrap().clone()
    }

    /// Wait for the next accepted connection.
    pub async fn next_socket(&self) -> FakeSocket {
        let mut sockets = self.sockets_rx.lock().await;
        tokio::time::timeout(Duration::from_secs(5), sockets.recv())
            .await
            .expect("timed out waiting for a connection")
            .expect("transport dropped")
    }
}

#[async_trait]
impl ObservationTransport for FakeTransport {
    async fn connect(&self, url: &str) -> Result<Box<dyn ObservationConnection>> {
        self.connects.lock().unwrap().push(url.to_string());
        if self.refuse.load(Ordering::SeqCst) {
            return Err(VitalsError::transport("connection refused"));
        }

        let (frames_tx, frames_rx) = mpsc::unbounded_channel();
        let closed = Arc::new(AtomicBool::new(false));
        let _ = self.sockets_tx.send(FakeSocket {
            url: url.to_string(),
            frames: Some(frames_tx),
            closed: closed.clone(),
        });

        Ok(Box::new(FakeConnection {
            frames: frames_rx,
            closed,
        }))
    }
}
