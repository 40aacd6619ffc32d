// Policy endpoints

use crate::client::MobiusClient;
use crate::error::Error;
use crate::models::{Policy, PolicyDevices, PolicyGroups, PolicyList, PolicyPatch};

impl MobiusClient {
    /// `GET /policies`
    pub async fn get_policies(&self) -> Result<PolicyList, Error> {
        self.get(&["policies"]).await
    }

    /// `GET /policies/{id}`
    pub async fn get_policy(&self, policy_id: &str) -> Result<Policy, Error> {
        self.get(&["policies", policy_id]).await
    }

    /// `POST /policies`
    pub async fn create_policy(&self, policy: &PolicyPatch) -> Result<Policy, Error> {
        self.post(&["policies"], policy).await
    }

    /// `PUT /policies/{id}`
    pub async fn update_policy(
        &self,
        policy_id: &str,
        policy: &PolicyPatch,
    ) -> Result<Policy, Error> {
        self.put(&["policies", policy_id], policy).await
    }

    /// `DELETE /policies/{id}`
    pub async fn delete_policy(&self, policy_id: &str) -> Result<(), Error> {
        self.delete(&["policies", policy_id]).await
    }

    /// `POST /policies/{id}/devices/{deviceId}`
    pub async fn assign_policy_to_device(
        &self,
        policy_id: &str,
        device_id: &str,
    ) -> Result<(), Error> {
        self.post_empty(&["policies", policy_id, "devices", device_id])
            .await
    }

    /// `DELETE /policies/{id}/devices/{deviceId}`
    pub async fn unassign_policy_from_device(
        &self,
        policy_id: &str,
        device_id: &str,
    ) -> Result<(), Error> {
        self.delete(&["policies", policy_id, "devices", device_id])
            .await
    }

    /// Devices the policy applies to directly.
    ///
    /// `GET /policies/{id}/devices`
    pub async fn get_policy_devices(&self, policy_id: &str) -> Result<PolicyDevices, Error> {
        self.get(&["policies", policy_id, "devices"]).await
    }

    /// `GET /policies/{id}/groups`
    pub async fn get_policy_groups(&self, policy_id: &str) -> Result<PolicyGroups, Error> {
        self.get(&["policies", policy_id, "groups"]).await
    }

    /// `POST /policies/{id}/groups/{groupId}`
    pub async fn assign_policy_to_group(
        &self,
        policy_id: &str,
        group_id: &str,
    ) -> Result<(), Error> {
        self.post_empty(&["policies", policy_id, "groups", group_id])
            .await
    }

    /// `DELETE /policies/{id}/groups/{groupId}`
    pub async fn unassign_policy_from_group(
        &self,
        policy_id: &str,
        group_id: &str,
    ) -> Result<(), Error> {
        self.delete(&["policies", policy_id, "groups", group_id])
            .await
    }
}
