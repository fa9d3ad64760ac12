// Repository trait for the care backend lookups the vitals dashboard needs
use crate::application::error::Result;
use crate::domain::facility::{AssetBed, Facility};
use crate::domain::patient::Patient;
use async_trait::async_trait;

#[async_trait]
pub trait CareDataAccess: Send + Sync {
    /// Facility the caller is permitted to see
    async fn get_facility(&self, facility_id: &str) -> Result<Facility>;

    /// Asset links for a bed, in backend order
    async fn list_asset_beds(&self, bed_id: &str) -> Result<Vec<AssetBed>>;

    async fn get_patient(&self, patient_id: &str) -> Result<Patient>;
}
