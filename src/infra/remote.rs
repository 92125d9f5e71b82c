//! Remote catalog adapters.
//!
//! [`RestCatalogSource`] reads the hosted catalog through its PostgREST-style endpoint.
//! [`OfflineCatalogSource`] stands in when no endpoint is configured.

use async_trait::async_trait;
use reqwest::{Client, Response, Url, header};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::application::repos::{CatalogSource, SourceError};
use crate::config::RemoteSettings;
use crate::domain::catalog::ItemRecord;
use crate::domain::taxonomy::TaxonomyRecord;

use super::error::InfraError;

const ITEMS_PATH: &str = "rest/v1/books";
const TAXONOMY_PATH: &str = "rest/v1/categories";
const CLIENT_INFO_HEADER: &str = "x-client-info";
const API_KEY_HEADER: &str = "apikey";

#[derive(Clone, Debug)]
pub struct RestCatalogSource {
    client: Client,
    base: Url,
    api_key: Option<String>,
}

impl RestCatalogSource {
    pub fn new(settings: &RemoteSettings) -> Result<Self, InfraError> {
        let Some(site) = settings.base_url.as_ref() else {
            return Err(InfraError::configuration("remote.base_url is not set"));
        };
        let base = site
            .join("/")
            .map_err(|err| InfraError::configuration(format!("invalid remote.base_url: {err}")))?;
        let client = Client::builder()
            .user_agent(Self::user_agent())
            .timeout(settings.timeout)
            .build()
            .map_err(|err| InfraError::client(err.to_string()))?;

        Ok(Self {
            client,
            base,
            api_key: settings.api_key.clone(),
        })
    }

    pub fn user_agent() -> &'static str {
        concat!("librarise/", env!("CARGO_PKG_VERSION"))
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    fn url(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, SourceError> {
        let mut url = self.base.join(path).map_err(SourceError::transport)?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    async fn select<T: DeserializeOwned>(
        &self,
        path: &str,
        order: &str,
    ) -> Result<Vec<T>, SourceError> {
        let url = self.url(path, &[("select", "*"), ("order", order)])?;
        debug!(%url, "Fetching remote rows");

        let mut request = self
            .client
            .get(url)
            .header(header::ACCEPT, "application/json")
            .header(CLIENT_INFO_HEADER, Self::user_agent());
        if let Some(key) = self.api_key.as_deref() {
            request = request
                .header(API_KEY_HEADER, key)
                .header(header::AUTHORIZATION, format!("Bearer {key}"));
        }

        let response = request.send().await.map_err(SourceError::transport)?;
        Self::handle(response).await
    }

    async fn handle<T: DeserializeOwned>(response: Response) -> Result<Vec<T>, SourceError> {
        let status = response.status();
        let body = response.text().await.map_err(SourceError::transport)?;
        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
                body,
            });
        }
        decode_rows(&body)
    }
}

#[async_trait]
impl CatalogSource for RestCatalogSource {
    #[instrument(skip(self), fields(base = %self.base))]
    async fn fetch_items(&self) -> Result<Vec<ItemRecord>, SourceError> {
        self.select(ITEMS_PATH, "created_at.desc").await
    }

    #[instrument(skip(self), fields(base = %self.base))]
    async fn fetch_taxonomy(&self) -> Result<Vec<TaxonomyRecord>, SourceError> {
        self.select(TAXONOMY_PATH, "name.asc").await
    }
}

fn decode_rows<T: DeserializeOwned>(body: &str) -> Result<Vec<T>, SourceError> {
    serde_json::from_str(body).map_err(SourceError::decode)
}

/// Source used when no remote is configured or `--offline` is given.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineCatalogSource;

#[async_trait]
impl CatalogSource for OfflineCatalogSource {
    async fn fetch_items(&self) -> Result<Vec<ItemRecord>, SourceError> {
        Err(SourceError::Unavailable("running offline".to_string()))
    }

    async fn fetch_taxonomy(&self) -> Result<Vec<TaxonomyRecord>, SourceError> {
        Err(SourceError::Unavailable("running offline".to_string()))
    }
}
