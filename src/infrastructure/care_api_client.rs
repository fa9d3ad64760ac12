// Care backend REST client implementing the dashboard's data access
use crate::application::care_repository::CareDataAccess;
use crate::application::error::{Result, VitalsError};
use crate::domain::facility::{AssetBed, Facility};
use crate::domain::patient::Patient;
use anyhow::Context;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;

const ASSET_BED_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone)]
pub struct CareApiClient {
    base_url: String,
    token: Option<String>,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct Page<T> {
    results: Vec<T>,
}

impl CareApiClient {
    pub fn new(base_url: String, token: Option<String>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
            client: reqwest::Client::new(),
        }
    }

    /// GET a JSON document, `None` on 404.
    async fn fetch<T: DeserializeOwned>(&self, url: &str) -> anyhow::Result<Option<T>> {
        let mut request = self.client.get(url).header("Accept", "application/json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", url))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Care API request failed with status {}: {}", status, body);
        }

        let data = response
            .json::<T>()
            .await
            .with_context(|| format!("Failed to parse response from {}", url))?;
        Ok(Some(data))
    }

    async fn fetch_required<T: DeserializeOwned>(
        &self,
        url: &str,
        resource: &'static str,
        id: &str,
    ) -> Result<T> {
        self.fetch(url)
            .await
            .map_err(|e| VitalsError::data_access(format!("{:#}", e)))?
            .ok_or_else(|| VitalsError::NotFound {
                resource,
                id: id.to_string(),
            })
    }
}

#[async_trait]
impl CareDataAccess for CareApiClient {
    async fn get_facility(&self, facility_id: &str) -> Result<Facility> {
        let url = format!(
            "{}/api/v1/facility/{}/",
            self.base_url,
            urlencoding::encode(facility_id)
        );
        self.fetch_required(&url, "facility", facility_id).await
    }

    async fn list_asset_beds(&self, bed_id: &str) -> Result<Vec<AssetBed>> {
        let url = format!(
            "{}/api/v1/assetbed/?bed={}&limit={}",
            self.base_url,
            urlencoding::encode(bed_id),
            ASSET_BED_PAGE_SIZE
        );
        let page: Page<AssetBed> = self.fetch_required(&url, "bed", bed_id).await?;
        tracing::debug!("Bed {} has {} linked assets", bed_id, page.results.len());
        Ok(page.results)
    }

    async fn get_patient(&self, patient_id: &str) -> Result<Patient> {
        let url = format!(
            "{}/api/v1/patient/{}/",
            self.base_url,
            urlencoding::encode(patient_id)
        );
        self.fetch_required(&url, "patient", patient_id).await
    }
}
