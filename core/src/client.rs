//! Stateless HTTP request builder and response parser for the catalog API.
//!
//! # Design
//! `CatalogClient` holds only the API base URL and the API key. Each endpoint
//! is split into a `build_*` method that produces an `HttpRequest` and a
//! `parse_*` method that consumes an `HttpResponse`. Sequencing the two
//! endpoints is the job of `CatalogSession`.

use crate::error::CatalogError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{CatalogConfig, CatalogItem, NowPlayingResponse};

/// Query parameter carrying the API key on every request.
pub const API_KEY_PARAM: &str = "api_key";

/// Synchronous, stateless client for the catalog API.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    base_url: String,
    api_key: String,
}

impl CatalogClient {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    pub fn build_configuration(&self) -> HttpRequest {
        self.get("/configuration")
    }

    pub fn build_now_playing(&self) -> HttpRequest {
        self.get("/movie/now_playing")
    }

    /// Parse the image configuration, choosing `preferred_size` as default
    /// poster size when the catalog offers it.
    pub fn parse_configuration(
        &self,
        response: HttpResponse,
        preferred_size: &str,
    ) -> Result<CatalogConfig, CatalogError> {
        check_status(&response)?;
        CatalogConfig::from_json(&response.body, preferred_size)
    }

    /// Parse the now-playing listing. Either every record parses or the
    /// whole listing is rejected.
    pub fn parse_now_playing(&self, response: HttpResponse) -> Result<Vec<CatalogItem>, CatalogError> {
        check_status(&response)?;
        let listing = NowPlayingResponse::from_json(&response.body)?;
        listing.results.iter().map(CatalogItem::from_json).collect()
    }

    fn get(&self, endpoint: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: format!("{}{endpoint}", self.base_url),
            query: vec![(API_KEY_PARAM.to_string(), self.api_key.clone())],
            headers: vec![("accept".to_string(), "application/json".to_string())],
        }
    }
}

/// Map non-2xx status codes to `CatalogError::Http`.
fn check_status(response: &HttpResponse) -> Result<(), CatalogError> {
    if response.is_success() {
        return Ok(());
    }
    Err(CatalogError::Http {
        status: response.status,
        body: response.body.clone(),
    })
}
