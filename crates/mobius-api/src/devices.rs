// Device endpoints
//
// Enrollment, lookup, policy assignment and remote actions. Every method
// is one REST call; nothing is cached.

use serde::Serialize;
use tracing::debug;

use crate::client::MobiusClient;
use crate::error::Error;
use crate::models::{
    CommandResult, Device, DeviceAction, DeviceCommand, DeviceFilter, DeviceList, DevicePatch,
    OsqueryRequest, OsqueryResult,
};

impl MobiusClient {
    /// List devices. Filter fields are forwarded verbatim as query params.
    ///
    /// `GET /devices?limit&offset&platform&status&search`
    pub async fn get_devices(&self, filter: &DeviceFilter) -> Result<DeviceList, Error> {
        self.get_with_query(&["devices"], filter).await
    }

    /// `GET /devices/{id}`
    pub async fn get_device(&self, device_id: &str) -> Result<Device, Error> {
        self.get(&["devices", device_id]).await
    }

    /// `POST /devices`
    pub async fn enroll_device(&self, device: &DevicePatch) -> Result<Device, Error> {
        self.post(&["devices"], device).await
    }

    /// `PUT /devices/{id}`
    pub async fn update_device(
        &self,
        device_id: &str,
        device: &DevicePatch,
    ) -> Result<Device, Error> {
        self.put(&["devices", device_id], device).await
    }

    /// `DELETE /devices/{id}`
    pub async fn unenroll_device(&self, device_id: &str) -> Result<(), Error> {
        self.delete(&["devices", device_id]).await
    }

    /// Replace the device's policy set.
    ///
    /// `POST /devices/{id}/policies` with `{"policy_ids": [...]}`
    pub async fn assign_device_policies(
        &self,
        device_id: &str,
        policy_ids: &[String],
    ) -> Result<(), Error> {
        #[derive(Serialize)]
        struct Body<'a> {
            policy_ids: &'a [String],
        }

        self.post_no_response(
            &["devices", device_id, "policies"],
            &Body { policy_ids },
        )
        .await
    }

    /// `POST /devices/{id}/actions/{lock|unlock|wipe}`
    pub async fn device_action(&self, device_id: &str, action: DeviceAction) -> Result<(), Error> {
        debug!(device_id, %action, "device action");
        self.post_empty(&["devices", device_id, "actions", action.as_ref()])
            .await
    }

    pub async fn lock_device(&self, device_id: &str) -> Result<(), Error> {
        self.device_action(device_id, DeviceAction::Lock).await
    }

    pub async fn unlock_device(&self, device_id: &str) -> Result<(), Error> {
        self.device_action(device_id, DeviceAction::Unlock).await
    }

    /// Factory-reset the device. Irreversible.
    pub async fn wipe_device(&self, device_id: &str) -> Result<(), Error> {
        self.device_action(device_id, DeviceAction::Wipe).await
    }

    /// Run an arbitrary command on an online device.
    ///
    /// `POST /devices/{id}/commands`
    pub async fn send_device_command(
        &self,
        device_id: &str,
        command: &DeviceCommand,
    ) -> Result<CommandResult, Error> {
        self.post(&["devices", device_id, "commands"], command)
            .await
    }

    /// Run a read-only osquery `SELECT` on an online device.
    ///
    /// The server refuses empty or non-`SELECT` statements with a 400.
    ///
    /// `POST /devices/{id}/osquery`
    pub async fn run_device_osquery(
        &self,
        device_id: &str,
        query: &str,
    ) -> Result<OsqueryResult, Error> {
        debug!(device_id, "running osquery");
        let body = OsqueryRequest {
            query: query.to_owned(),
        };
        self.post(&["devices", device_id, "osquery"], &body).await
    }
}
