use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::header::ACCEPT;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

use super::BookingBackend;
use crate::errors::AppError;
use crate::models::{Appointment, Professional, Service, TimeSlot};
use crate::services::auth::TokenProvider;

/// REST client for the booking backend, scoped to one tenant and location.
pub struct HttpBackend {
    base_url: String,
    tenant_id: String,
    location_id: String,
    tokens: Arc<dyn TokenProvider>,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(
        base_url: String,
        tenant_id: String,
        location_id: String,
        tokens: Arc<dyn TokenProvider>,
    ) -> Self {
        Self {
            base_url,
            tenant_id,
            location_id,
            tokens,
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/tenants/{}/locations/{}{path}",
            self.base_url.trim_end_matches('/'),
            self.tenant_id,
            self.location_id,
        )
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, AppError> {
        let token = self
            .tokens
            .access_token()
            .await
            .map_err(|e| AppError::Auth(e.to_string()))?;

        let resp = request
            .bearer_auth(&token.access_token)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let resp = self.check(resp).await?;
        Ok(resp.json().await?)
    }

    async fn check(&self, resp: Response) -> Result<Response, AppError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let path = resp.url().path().to_string();
        let body = resp.text().await.unwrap_or_default();
        match status {
            StatusCode::UNAUTHORIZED => {
                tracing::warn!(path = %path, "backend rejected access token");
                self.tokens.invalidate().await;
                Err(AppError::Auth(format!("backend rejected the access token: {body}")))
            }
            StatusCode::NOT_FOUND => Err(AppError::NotFound(path)),
            _ => Err(AppError::Backend(format!("{path} returned {status}: {body}"))),
        }
    }
}

#[async_trait]
impl BookingBackend for HttpBackend {
    async fn list_services(&self) -> Result<Vec<Service>, AppError> {
        self.send(self.client.get(self.url("/services"))).await
    }

    async fn list_professionals(&self, service_id: &str) -> Result<Vec<Professional>, AppError> {
        let url = self.url(&format!("/services/{service_id}/professionals"));
        self.send(self.client.get(url)).await
    }

    async fn list_time_slots(
        &self,
        professional_id: &str,
        date: NaiveDate,
        service_id: &str,
    ) -> Result<Vec<TimeSlot>, AppError> {
        let url = self.url(&format!("/professionals/{professional_id}/slots"));
        let request = self.client.get(url).query(&[
            ("date", date.format("%Y-%m-%d").to_string()),
            ("serviceId", service_id.to_string()),
        ]);
        self.send(request).await
    }

    async fn create_appointment(
        &self,
        appointment: &Appointment,
    ) -> Result<Appointment, AppError> {
        let request = self.client.post(self.url("/appointments")).json(appointment);
        self.send(request).await
    }
}
