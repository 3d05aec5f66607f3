//! Remote profile API.
//!
//! [`ProfileApi`] is the seam between the session core and the server;
//! [`HttpProfileApi`] speaks the JSON API over reqwest.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;

use rolodex_shared::protocol::{
    LimitExceededBody, TrackViewRequest, TrackViewResponse, ViewStatus, WeekViewsResponse,
};
use rolodex_shared::quota::WeekBucket;
use rolodex_shared::types::UserId;

use crate::config::ClientConfig;
use crate::error::ApiError;

/// Calls against the signed-in user's authoritative profile.
#[async_trait]
pub trait ProfileApi: Send + Sync {
    /// Current quota, rolled over to the server's today.
    async fn view_status(&self) -> Result<ViewStatus, ApiError>;

    /// Ask the server to count a reveal of `contact_id`.
    async fn track_view(&self, contact_id: &str) -> Result<TrackViewResponse, ApiError>;

    /// Count one tick in today's weekly bucket and return the history.
    async fn week_views(&self) -> Result<Vec<WeekBucket>, ApiError>;
}

#[async_trait]
impl<A: ProfileApi + ?Sized> ProfileApi for Arc<A> {
    async fn view_status(&self) -> Result<ViewStatus, ApiError> {
        (**self).view_status().await
    }

    async fn track_view(&self, contact_id: &str) -> Result<TrackViewResponse, ApiError> {
        (**self).track_view(contact_id).await
    }

    async fn week_views(&self) -> Result<Vec<WeekBucket>, ApiError> {
        (**self).week_views().await
    }
}

// ── HttpProfileApi ────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct HttpProfileApi {
    client: Client,
    base_url: String,
    user_header: String,
    user_id: UserId,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

impl HttpProfileApi {
    /// Build a client whose every call is bounded by `config.timeout`.
    pub fn new(config: &ClientConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: Client, config: &ClientConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.clone(),
            user_header: config.user_header.clone(),
            user_id: config.user_id.clone(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn send(&self, req: RequestBuilder) -> Result<Response, ApiError> {
        let resp = req
            .header(self.user_header.as_str(), self.user_id.as_str())
            .send()
            .await
            .map_err(ApiError::transient)?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        match status {
            StatusCode::UNAUTHORIZED => Err(ApiError::Unauthenticated),
            StatusCode::FORBIDDEN => match resp.json::<LimitExceededBody>().await {
                Ok(body) => Err(ApiError::LimitExceeded {
                    daily_limit: body.daily_limit,
                    snapshot: Box::new(body.into_record()),
                }),
                Err(e) => Err(ApiError::Transient(format!("HTTP 403: {e}"))),
            },
            StatusCode::BAD_REQUEST => Err(ApiError::BadRequest(error_message(resp).await)),
            StatusCode::CONFLICT => Err(ApiError::StaleWrite(error_message(resp).await)),
            _ => Err(ApiError::Transient(format!(
                "HTTP {}: {}",
                status.as_u16(),
                error_message(resp).await
            ))),
        }
    }
}

async fn error_message(resp: Response) -> String {
    let status = resp.status();
    match resp.json::<ErrorBody>().await {
        Ok(body) => body.error,
        Err(_) => status.to_string(),
    }
}

#[async_trait]
impl ProfileApi for HttpProfileApi {
    async fn view_status(&self) -> Result<ViewStatus, ApiError> {
        let resp = self.send(self.client.get(self.url("/view-status"))).await?;
        resp.json().await.map_err(ApiError::transient)
    }

    async fn track_view(&self, contact_id: &str) -> Result<TrackViewResponse, ApiError> {
        let body = TrackViewRequest {
            contact_id: Some(contact_id.to_string()),
        };
        let resp = self
            .send(self.client.post(self.url("/track-view")).json(&body))
            .await?;
        resp.json().await.map_err(ApiError::transient)
    }

    async fn week_views(&self) -> Result<Vec<WeekBucket>, ApiError> {
        let resp = self.send(self.client.post(self.url("/week-views"))).await?;
        let body: WeekViewsResponse = resp.json().await.map_err(ApiError::transient)?;
        Ok(body.week_views)
    }
}
