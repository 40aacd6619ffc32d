// System endpoints: health and licensing.

use serde_json::json;

use crate::client::MobiusClient;
use crate::error::Error;
use crate::models::{HealthStatus, LicenseStatus};

impl MobiusClient {
    /// Server health summary.
    ///
    /// `GET /health`
    pub async fn get_health(&self) -> Result<HealthStatus, Error> {
        self.get(&["health"]).await
    }

    /// License tier and enrollment headroom.
    ///
    /// `GET /license/status`
    pub async fn get_license_status(&self) -> Result<LicenseStatus, Error> {
        self.get(&["license", "status"]).await
    }

    /// Install a new license key. Admin role required server-side.
    ///
    /// `PUT /license` with `{"key": ...}`
    pub async fn update_license(&self, key: &str) -> Result<(), Error> {
        self.put_no_response(&["license"], &json!({ "key": key })).await
    }
}
