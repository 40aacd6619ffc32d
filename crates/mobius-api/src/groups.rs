// Device group endpoints
//
// Membership is only ever changed through the add/remove calls; group
// records never embed their devices.

use crate::client::MobiusClient;
use crate::error::Error;
use crate::models::{DeviceGroup, GroupDevices, GroupList, GroupPatch};

impl MobiusClient {
    /// `GET /groups`
    pub async fn get_device_groups(&self) -> Result<GroupList, Error> {
        self.get(&["groups"]).await
    }

    /// `GET /groups/{id}`
    pub async fn get_device_group(&self, group_id: &str) -> Result<DeviceGroup, Error> {
        self.get(&["groups", group_id]).await
    }

    /// `POST /groups`
    pub async fn create_device_group(&self, group: &GroupPatch) -> Result<DeviceGroup, Error> {
        self.post(&["groups"], group).await
    }

    /// `PUT /groups/{id}`
    pub async fn update_device_group(
        &self,
        group_id: &str,
        group: &GroupPatch,
    ) -> Result<DeviceGroup, Error> {
        self.put(&["groups", group_id], group).await
    }

    /// `DELETE /groups/{id}`
    pub async fn delete_device_group(&self, group_id: &str) -> Result<(), Error> {
        self.delete(&["groups", group_id]).await
    }

    /// `POST /groups/{id}/devices/{deviceId}`
    pub async fn add_device_to_group(&self, group_id: &str, device_id: &str) -> Result<(), Error> {
        self.post_empty(&["groups", group_id, "devices", device_id])
            .await
    }

    /// `DELETE /groups/{id}/devices/{deviceId}`
    pub async fn remove_device_from_group(
        &self,
        group_id: &str,
        device_id: &str,
    ) -> Result<(), Error> {
        self.delete(&["groups", group_id, "devices", device_id])
            .await
    }

    /// `GET /groups/{id}/devices`
    pub async fn get_group_devices(&self, group_id: &str) -> Result<GroupDevices, Error> {
        self.get(&["groups", group_id, "devices"]).await
    }
}
