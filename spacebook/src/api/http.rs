//! HTTP implementation of the catalog and booking APIs

use futures::future::BoxFuture;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;

use super::{ApiResult, BookingApi, SpaceCatalog};
use crate::error::ApiError;
use crate::types::{Booking, ConfirmedBooking, Space};

/// Error body returned by the API
#[derive(Deserialize)]
struct ErrorBody {
    detail: Option<String>,
}

/// The spaces endpoint returns either a bare list or a paginated page
#[derive(Deserialize)]
#[serde(untagged)]
enum SpacesPayload {
    List(Vec<Space>),
    Page { results: Vec<Space> },
}

impl From<SpacesPayload> for Vec<Space> {
    fn from(payload: SpacesPayload) -> Self {
        match payload {
            SpacesPayload::List(spaces) | SpacesPayload::Page { results: spaces } => spaces,
        }
    }
}

/// Booking API client over HTTP
#[derive(Clone, Debug)]
pub struct HttpBookingApi {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpBookingApi {
    /// Create a client for the API at `base_url` (e.g. `http://localhost:8000/api`)
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    /// Send `Authorization: Bearer <token>` with every request
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(request: RequestBuilder) -> ApiResult<Response> {
        let response = request.send().await.map_err(|e| {
            tracing::warn!(error = %e, "Request failed");
            ApiError::Network(e.to_string())
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|body| body.detail);

        tracing::warn!(status = status.as_u16(), detail = ?detail, "API returned an error");
        Err(ApiError::Status {
            status: status.as_u16(),
            detail,
        })
    }
}

impl SpaceCatalog for HttpBookingApi {
    fn list_spaces(&self) -> BoxFuture<'static, ApiResult<Vec<Space>>> {
        let request = self.authorize(self.client.get(self.url("spaces/")));

        Box::pin(async move {
            let response = Self::send(request).await?;
            let payload: SpacesPayload = response
                .json()
                .await
                .map_err(|e| ApiError::Decode(e.to_string()))?;

            let spaces: Vec<Space> = payload.into();
            tracing::debug!(count = spaces.len(), "Fetched spaces");
            Ok(spaces)
        })
    }
}

impl BookingApi for HttpBookingApi {
    fn create_booking(&self, booking: ConfirmedBooking) -> BoxFuture<'static, ApiResult<Booking>> {
        let request = self.authorize(self.client.post(self.url("bookings/")).json(&booking));

        Box::pin(async move {
            let response = Self::send(request).await?;
            let created: Booking = response
                .json()
                .await
                .map_err(|e| ApiError::Decode(e.to_string()))?;

            tracing::info!(
                booking_id = created.id,
                transaction_id = %booking.transaction_id,
                "Booking created"
            );
            Ok(created)
        })
    }
}
