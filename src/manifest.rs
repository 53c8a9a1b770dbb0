use reqwest::blocking::Client;
use tracing::{debug, info};

use crate::config::MANIFEST_TIMEOUT;
use crate::domain::Manifest;
use crate::error::RemixError;
use crate::http::{build_client, handle_status};

pub trait ManifestClient {
    /// Fetches the manifest as published; tracks are in wire order.
    fn fetch_manifest(&self) -> Result<Manifest, RemixError>;
}

impl<T: ManifestClient + ?Sized> ManifestClient for &T {
    fn fetch_manifest(&self) -> Result<Manifest, RemixError> {
        (**self).fetch_manifest()
    }
}

#[derive(Clone)]
pub struct ManifestHttpClient {
    client: Client,
    url: String,
}

impl ManifestHttpClient {
    pub fn new(url: impl Into<String>) -> Result<Self, RemixError> {
        Ok(Self {
            client: build_client()?,
            url: url.into(),
        })
    }
}

impl ManifestClient for ManifestHttpClient {
    fn fetch_manifest(&self) -> Result<Manifest, RemixError> {
        info!(url = %self.url, "fetching track manifest");
        let response = self
            .client
            .get(&self.url)
            .timeout(MANIFEST_TIMEOUT)
            .send()
            .map_err(|err| RemixError::Network(err.to_string()))?;
        let response = handle_status(response)?;
        let body = response
            .bytes()
            .map_err(|err| RemixError::Network(err.to_string()))?;
        debug!(bytes = body.len(), "manifest received");
        parse_manifest(&body)
    }
}

pub fn parse_manifest(body: &[u8]) -> Result<Manifest, RemixError> {
    serde_json::from_slice(body).map_err(|err| RemixError::ManifestParse(err.to_string()))
}
