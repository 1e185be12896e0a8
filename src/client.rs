//! Typed client for the PayBazaar backend.
//!
//! The console only depends on the [`CommissionBackend`] trait; the
//! HTTP implementation lives here and adds the bearer token to every
//! call.  A `404` on the commission lookup means no record exists
//! anywhere above the node and is returned as `Ok(None)`; any other
//! reply without a record is an error.  Node ids are percent-encoded
//! as single path segments.

use crate::config::ConsoleConfig;
use crate::error::BackendError;
use crate::models::{
    ApiEnvelope, CommissionRecord, CreateCommissionRequest, DistributorList, HierarchyNode,
    MasterDistributorList, RetailerList, UpdateCommissionRequest,
};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

/// Operations the console needs from the backend.
#[async_trait]
pub trait CommissionBackend: Send + Sync {
    async fn list_master_distributors(&self, admin_id: &str) -> Result<Vec<HierarchyNode>, BackendError>;

    async fn list_distributors(&self, md_id: &str) -> Result<Vec<HierarchyNode>, BackendError>;

    async fn list_retailers(&self, distributor_id: &str) -> Result<Vec<HierarchyNode>, BackendError>;

    /// The record that applies to `user_id`: its own, or the nearest
    /// ancestor's.  `None` when nothing is configured up the chain.
    async fn get_commission(
        &self,
        user_id: &str,
        service: &str,
    ) -> Result<Option<CommissionRecord>, BackendError>;

    /// Returns the backend's success message, if it sent one.
    async fn create_commission(&self, req: &CreateCommissionRequest) -> Result<Option<String>, BackendError>;

    async fn update_commission(&self, req: &UpdateCommissionRequest) -> Result<Option<String>, BackendError>;
}

#[derive(Clone)]
pub struct HttpBackend {
    base_url: String,
    token: String,
    client: Client,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>, client: Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            client,
        }
    }

    /// Builds a backend from configuration, with the configured timeout.
    pub fn from_config(config: &ConsoleConfig) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self::new(config.api_url.clone(), config.token.clone(), client))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.header("Authorization", format!("Bearer {}", self.token))
    }

    /// Joins `segments` onto the base URL, encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, BackendError> {
        let mut url = Url::parse(&self.base_url).map_err(|e| BackendError::InvalidUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| BackendError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_list<T>(&self, segments: &[&str]) -> Result<T, BackendError>
    where
        T: DeserializeOwned + Default,
    {
        let url = self.endpoint(segments)?;
        debug!(%url, "fetching hierarchy list");
        let resp = self.authorized(self.client.get(url)).send().await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(T::default());
        }
        let envelope: ApiEnvelope<T> = read_envelope(resp).await?;
        Ok(envelope.data.unwrap_or_default())
    }
}

/// Decodes a response body, turning non-success statuses into
/// [`BackendError::Status`] with whatever message the body carried.
async fn read_envelope<T: DeserializeOwned>(resp: Response) -> Result<ApiEnvelope<T>, BackendError> {
    let status = resp.status();
    let body = resp.text().await?;
    if !status.is_success() {
        let message = serde_json::from_str::<ApiEnvelope<serde_json::Value>>(&body)
            .ok()
            .and_then(|envelope| envelope.message)
            .filter(|m| !m.is_empty());
        warn!(status = status.as_u16(), "backend call failed");
        return Err(BackendError::Status {
            status: status.as_u16(),
            message,
        });
    }
    serde_json::from_str(&body).map_err(|e| BackendError::Decode(e.to_string()))
}

#[async_trait]
impl CommissionBackend for HttpBackend {
    async fn list_master_distributors(&self, admin_id: &str) -> Result<Vec<HierarchyNode>, BackendError> {
        let list: MasterDistributorList = self.get_list(&["md", "get", "admin", admin_id]).await?;
        Ok(list.master_distributors.into_iter().map(Into::into).collect())
    }

    async fn list_distributors(&self, md_id: &str) -> Result<Vec<HierarchyNode>, BackendError> {
        let list: DistributorList = self.get_list(&["distributor", "get", "md", md_id]).await?;
        Ok(list.distributors.into_iter().map(Into::into).collect())
    }

    async fn list_retailers(&self, distributor_id: &str) -> Result<Vec<HierarchyNode>, BackendError> {
        let list: RetailerList = self
            .get_list(&["retailer", "get", "distributor", distributor_id])
            .await?;
        Ok(list.retailers.into_iter().map(Into::into).collect())
    }

    async fn get_commission(
        &self,
        user_id: &str,
        service: &str,
    ) -> Result<Option<CommissionRecord>, BackendError> {
        let url = self.endpoint(&["commision", "get", "commision", user_id, service])?;
        debug!(%url, "fetching commission record");
        let resp = self.authorized(self.client.get(url)).send().await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let envelope: ApiEnvelope<CommissionRecord> = read_envelope(resp).await?;
        if envelope.status.as_deref().is_some_and(|status| status != "success") {
            warn!(user_id, status = ?envelope.status, "commission lookup rejected");
            return Err(BackendError::Rejected {
                message: envelope.message.filter(|m| !m.is_empty()),
            });
        }
        match envelope.data {
            Some(record) => Ok(Some(record)),
            None => Err(BackendError::Decode("commission lookup returned no record".into())),
        }
    }

    async fn create_commission(&self, req: &CreateCommissionRequest) -> Result<Option<String>, BackendError> {
        let url = self.endpoint(&["commision", "create"])?;
        debug!(%url, user_id = %req.user_id, "creating commission");
        let resp = self.authorized(self.client.post(url)).json(req).send().await?;
        let envelope: ApiEnvelope<serde_json::Value> = read_envelope(resp).await?;
        Ok(envelope.message)
    }

    async fn update_commission(&self, req: &UpdateCommissionRequest) -> Result<Option<String>, BackendError> {
        let url = self.endpoint(&["commision", "update", "commision"])?;
        debug!(%url, commission_id = %req.commission_id, "updating commission");
        let resp = self.authorized(self.client.put(url)).json(req).send().await?;
        let envelope: ApiEnvelope<serde_json::Value> = read_envelope(resp).await?;
        Ok(envelope.message)
    }
}
