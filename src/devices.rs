// Device discovery against the management API

use std::time::Duration;

use reqwest::Client;

use crate::config::BackendConfig;
use crate::error::ApiError;
use crate::models::Device;
use crate::session::SessionContext;

#[derive(Debug, Clone)]
pub struct DeviceClient {
    base_url: String,
    default_vendor: String,
    http: Client,
}

impl DeviceClient {
    pub fn new(
        base_url: &str,
        default_vendor: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            default_vendor: default_vendor.into(),
            http,
        })
    }

    pub fn from_config(config: &BackendConfig) -> Result<Self, ApiError> {
        Self::new(
            &config.base_url,
            config.device_vendor.clone(),
            Duration::from_millis(config.request_timeout_ms),
        )
    }

    pub fn default_vendor(&self) -> &str {
        &self.default_vendor
    }

    /// `GET /api/devices?vendor=<tag>`, in the order the backend returns them.
    /// `None` uses the configured vendor tag; an empty tag lists every device.
    #[tracing::instrument(skip(self, session), fields(operation = "list_devices"))]
    pub async fn list_devices(
        &self,
        vendor: Option<&str>,
        session: &SessionContext,
    ) -> Result<Vec<Device>, ApiError> {
        let vendor = vendor.unwrap_or(&self.default_vendor);
        let mut request = self
            .http
            .get(format!("{}/api/devices", self.base_url))
            .bearer_auth(session.token());
        if !vendor.is_empty() {
            request = request.query(&[("vendor", vendor)]);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let devices: Vec<Device> = response.json().await?;
        tracing::debug!(count = devices.len(), "devices listed");
        Ok(devices)
    }
}
