// Application catalog endpoints
//
// Uploads go out as multipart/form-data; every other call is JSON.

use tracing::debug;

use crate::client::MobiusClient;
use crate::error::Error;
use crate::models::{Application, ApplicationList, ApplicationPatch, ApplicationUpload};

impl MobiusClient {
    /// `GET /applications`
    pub async fn get_applications(&self) -> Result<ApplicationList, Error> {
        self.get(&["applications"]).await
    }

    /// `GET /applications/{id}`
    pub async fn get_application(&self, app_id: &str) -> Result<Application, Error> {
        self.get(&["applications", app_id]).await
    }

    /// Register a new application, optionally with its package file.
    ///
    /// `POST /applications` (multipart/form-data)
    pub async fn add_application(&self, upload: ApplicationUpload) -> Result<Application, Error> {
        debug!(name = %upload.name, version = %upload.version, "uploading application");
        self.post_multipart(&["applications"], upload.into_form()).await
    }

    /// `PUT /applications/{id}`
    pub async fn update_application(
        &self,
        app_id: &str,
        app: &ApplicationPatch,
    ) -> Result<Application, Error> {
        self.put(&["applications", app_id], app).await
    }

    /// `DELETE /applications/{id}`
    pub async fn delete_application(&self, app_id: &str) -> Result<(), Error> {
        self.delete(&["applications", app_id]).await
    }
}
