// Endpoint resolution - facility middleware + bed monitor address -> stream URL
use crate::application::care_repository::CareDataAccess;
use crate::domain::facility::first_monitor;
use crate::domain::patient::Patient;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolutionTicket(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(Option<String>),
    /// A newer resolution was started while this one was in flight.
    Stale,
}

pub fn observation_url(middleware_hostname: &str, device_address: &str) -> String {
    format!("wss://{}/observations/{}", middleware_hostname, device_address)
}

pub struct EndpointResolver {
    data_access: Arc<dyn CareDataAccess>,
    generation: AtomicU64,
}

impl EndpointResolver {
    pub fn new(data_access: Arc<dyn CareDataAccess>) -> Self {
        Self {
            data_access,
            generation: AtomicU64::new(0),
        }
    }

    /// Start a resolution, superseding any still in flight.
    pub fn begin(&self) -> ResolutionTicket {
        ResolutionTicket(self.generation.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: ResolutionTicket) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket.0
    }

    pub async fn resolve(
        &self,
        ticket: ResolutionTicket,
        facility_id: Option<&str>,
        patient: Option<&Patient>,
    ) -> Resolution {
        let endpoint = self.lookup(facility_id, patient).await;
        if !self.is_current(ticket) {
            tracing::debug!("Discarding stale endpoint resolution {:?}", ticket);
            return Resolution::Stale;
        }
        Resolution::Resolved(endpoint)
    }

    async fn lookup(&self, facility_id: Option<&str>, patient: Option<&Patient>) -> Option<String> {
        let facility_id = facility_id.filter(|id| !id.is_empty())?;
        let bed_id = patient.and_then(Patient::current_bed_id)?;

        let (facility, asset_beds) = tokio::join!(
            self.data_access.get_facility(facility_id),
            self.data_access.list_asset_beds(bed_id)
        );

        let facility = match facility {
            Ok(facility) => facility,
            Err(e) => {
                tracing::warn!("Facility lookup for {} failed: {}", facility_id, e);
                return None;
            }
        };
        let Some(hostname) = facility.middleware_hostname() else {
            tracing::info!("Facility {} has no middleware address", facility_id);
            return None;
        };

        let asset_beds = match asset_beds {
            Ok(asset_beds) => asset_beds,
            Err(e) => {
                tracing::warn!("Asset lookup for bed {} failed: {}", bed_id, e);
                return None;
            }
        };
        let Some(monitor) = first_monitor(&asset_beds) else {
            tracing::debug!("No monitor linked to bed {}", bed_id);
            return None;
        };
        let Some(address) = monitor.device_address() else {
            tracing::info!("Monitor {} has no local address", monitor.id);
            return None;
        };

        Some(observation_url(hostname, address))
    }
}
