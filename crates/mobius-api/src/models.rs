// Request and response records for the Mobius REST API.
//
// Plain serde types mirroring the JSON on the wire. Nothing here is a
// managed object: every value is a snapshot of server state.

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, Serializer};
use strum::{AsRefStr, Display, EnumString};

// ── Devices ─────────────────────────────────────────────────────────

/// Connectivity state reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DeviceStatus {
    Online,
    Offline,
    Pending,
    /// Any value this client does not know yet.
    #[serde(other)]
    Unknown,
}

/// An enrolled device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: String,
    #[serde(default)]
    pub uuid: String,
    #[serde(default)]
    pub hostname: String,
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub os_version: String,
    pub status: DeviceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<DateTime<FixedOffset>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enrollment_date: Option<DateTime<FixedOffset>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enrolled_user: Option<String>,
}

/// `GET /devices` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceList {
    pub devices: Vec<Device>,
    pub total: u64,
}

/// Query filters for `GET /devices`. Unset fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeviceFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl DeviceFilter {
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }

    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }
}

/// Partial device body for enrollment and updates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DevicePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<DeviceStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enrolled_user: Option<String>,
}

/// Remote actions under `POST /devices/{id}/actions/{action}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum DeviceAction {
    Lock,
    Unlock,
    Wipe,
}

/// Body for `POST /devices/{id}/commands`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceCommand {
    pub command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<serde_json::Map<String, serde_json::Value>>,
}

/// Outcome of a device command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandResult {
    pub id: String,
    pub command: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executed_at: Option<DateTime<FixedOffset>>,
}

/// Body for `POST /devices/{id}/osquery`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OsqueryRequest {
    pub query: String,
}

/// Rows returned by a live osquery `SELECT` on a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OsqueryResult {
    pub query: String,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub rows: Vec<serde_json::Map<String, serde_json::Value>>,
    #[serde(default)]
    pub duration_ms: u64,
    /// Set when the device ran the query but osquery reported a failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ── Policies ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub enabled: bool,
    /// Opaque, platform-specific settings.
    #[serde(default)]
    pub configuration: serde_json::Map<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<FixedOffset>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<FixedOffset>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyList {
    pub policies: Vec<Policy>,
    pub total: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration: Option<serde_json::Map<String, serde_json::Value>>,
}

/// `GET /policies/{id}/devices`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyDevices {
    pub devices: Vec<Device>,
    pub count: u64,
}

/// `GET /policies/{id}/groups`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyGroups {
    pub groups: Vec<DeviceGroup>,
    pub count: u64,
}

// ── Applications ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: String,
    pub name: String,
    pub version: String,
    pub platform: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Package size in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<FixedOffset>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationList {
    pub applications: Vec<Application>,
    pub total: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicationPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Multipart upload for `POST /applications`.
#[derive(Debug, Clone)]
pub struct ApplicationUpload {
    pub name: String,
    pub version: String,
    pub platform: String,
    pub description: Option<String>,
    /// Package file name and bytes, sent as the `file` part.
    pub package: Option<(String, Vec<u8>)>,
}

impl ApplicationUpload {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        platform: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            platform: platform.into(),
            description: None,
            package: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn package(mut self, file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.package = Some((file_name.into(), bytes));
        self
    }

    pub(crate) fn into_form(self) -> reqwest::multipart::Form {
        let mut form = reqwest::multipart::Form::new()
            .text("name", self.name)
            .text("version", self.version)
            .text("platform", self.platform);
        if let Some(description) = self.description {
            form = form.text("description", description);
        }
        if let Some((file_name, bytes)) = self.package {
            form = form.part(
                "file",
                reqwest::multipart::Part::bytes(bytes).file_name(file_name),
            );
        }
        form
    }
}

// ── Device groups ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceGroup {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Derived by the server; ignored on writes.
    #[serde(default)]
    pub device_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<FixedOffset>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupList {
    pub groups: Vec<DeviceGroup>,
    pub total: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// `GET /groups/{id}/devices`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupDevices {
    pub devices: Vec<Device>,
    pub count: u64,
}

// ── Auth ────────────────────────────────────────────────────────────

/// Credentials for `POST /auth/login`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    #[serde(serialize_with = "expose")]
    pub password: SecretString,
}

impl LoginRequest {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: SecretString::from(password.into()),
        }
    }
}

fn expose<S: Serializer>(secret: &SecretString, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

// ── System ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum HealthState {
    Healthy,
    Degraded,
    Unhealthy,
}

/// `GET /health`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: HealthState,
    #[serde(default)]
    pub version: String,
    /// Seconds since the server started.
    #[serde(default)]
    pub uptime: f64,
    #[serde(default)]
    pub database: bool,
    #[serde(default)]
    pub services: HashMap<String, bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LicenseTier {
    Community,
    Professional,
    Enterprise,
}

/// `GET /license/status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseStatus {
    pub tier: LicenseTier,
    pub devices_enrolled: u64,
    pub devices_limit: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub features: Vec<String>,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::str::FromStr;

    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn partial_device_payload_deserializes() {
        let device: Device = serde_json::from_value(json!({
            "id": "1",
            "uuid": "device-uuid-1",
            "hostname": "test-device",
            "platform": "windows",
            "status": "online"
        }))
        .unwrap();

        assert_eq!(device.id, "1");
        assert_eq!(device.status, DeviceStatus::Online);
        assert_eq!(device.os_version, "");
        assert!(device.last_seen.is_none());
        assert!(device.enrolled_user.is_none());
    }

    #[test]
    fn server_offset_is_preserved() {
        let device: Device = serde_json::from_value(json!({
            "id": "1",
            "last_seen": "2026-10-01T12:00:00.5+02:00"
        }))
        .unwrap();

        let seen = device.last_seen.unwrap();
        assert_eq!(seen.offset().local_minus_utc(), 2 * 3600);
        assert_eq!(seen.to_rfc3339(), "2026-10-01T12:00:00.500+02:00");
    }

    #[test]
    fn unknown_device_status_is_kept() {
        let device: Device =
            serde_json::from_value(json!({ "id": "9", "status": "quarantined" })).unwrap();
        assert_eq!(device.status, DeviceStatus::Unknown);
    }

    #[test]
    fn device_filter_serializes_only_set_fields() {
        let filter = DeviceFilter::default().limit(10).platform("windows");
        assert_eq!(
            serde_json::to_value(&filter).unwrap(),
            json!({ "limit": 10, "platform": "windows" })
        );
    }

    #[test]
    fn device_action_renders_path_segment() {
        assert_eq!(DeviceAction::Lock.to_string(), "lock");
        assert_eq!(DeviceAction::Wipe.to_string(), "wipe");
        assert_eq!(DeviceAction::Lock.as_ref(), "lock");
        assert_eq!(DeviceAction::from_str("unlock").unwrap(), DeviceAction::Unlock);
    }

    #[test]
    fn osquery_result_tolerates_missing_rows() {
        let result: OsqueryResult = serde_json::from_value(json!({
            "query": "SELECT 1",
            "duration_ms": 3,
            "error": "table not found"
        }))
        .unwrap();

        assert!(result.columns.is_empty());
        assert!(result.rows.is_empty());
        assert_eq!(result.error.as_deref(), Some("table not found"));
    }

    #[test]
    fn login_request_exposes_password_on_the_wire_only() {
        let req = LoginRequest::new("admin@mobius.local", "admin123");
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({ "email": "admin@mobius.local", "password": "admin123" })
        );
        assert!(!format!("{req:?}").contains("admin123"));
    }

    #[test]
    fn license_status_parses_optional_expiry() {
        let status: LicenseStatus = serde_json::from_value(json!({
            "tier": "professional",
            "devices_enrolled": 42,
            "devices_limit": 500,
            "expires_at": "2027-01-01T00:00:00Z",
            "features": ["policies", "apps"]
        }))
        .unwrap();

        assert_eq!(status.tier, LicenseTier::Professional);
        assert!(status.expires_at.is_some());
        assert_eq!(status.features, vec!["policies", "apps"]);
    }

    #[test]
    fn policy_patch_omits_unset_fields() {
        let patch = PolicyPatch {
            enabled: Some(false),
            ..PolicyPatch::default()
        };
        assert_eq!(serde_json::to_value(&patch).unwrap(), json!({ "enabled": false }));
    }
}
