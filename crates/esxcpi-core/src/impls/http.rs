//! HttpRemoteApi - `reqwest` による [`RemoteApi`] 実装

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use std::path::Path;
use tokio_util::io::ReaderStream;

use crate::config::EsxCloudConfig;
use crate::domain::{
    CloudError, DiskCreateSpec, DiskId, DiskList, ImageId, PersistentDisk, Task,
    TaskId, Vm, VmCreateSpec, VmDiskOperation, VmId, VmOperation,
};
use crate::impls::classify::{classify, decode, unreachable};
use crate::ports::RemoteApi;

/// アップロードしたイメージに要求するレプリケーション方式
const IMAGE_REPLICATION: &str = "EAGER";

#[derive(Debug, Clone)]
pub struct HttpRemoteApi {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpRemoteApi {
    /// `endpoint` は API のルート（例: `http://10.0.0.5:9000`）
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        let endpoint = endpoint.into().trim_end_matches('/').to_string();
        Self { client, endpoint }
    }

    pub fn from_config(config: &EsxCloudConfig) -> Result<Self, CloudError> {
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(config.ignore_cert)
            .build()
            .map_err(|e| CloudError::internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self::new(client, &config.target))
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1{}", self.endpoint, path)
    }

    async fn execute(&self, request: reqwest::RequestBuilder) -> Result<Bytes, CloudError> {
        let response = request.send().await.map_err(unreachable)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(unreachable)?;
        tracing::debug!(status, len = body.len(), "esxcloud response");
        classify(status, body)
    }

    async fn fetch<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T, CloudError> {
        let body = self.execute(request).await?;
        decode(&body)
    }

    async fn upload(&self, url: String, file: &Path, fields: &[(&'static str, &str)]) -> Result<Task, CloudError> {
        let handle = tokio::fs::File::open(file).await.map_err(|e| {
            CloudError::internal(format!("failed to open {}: {e}", file.display()))
        })?;
        let len = handle.metadata().await.map(|m| m.len()).ok();

        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());

        let body = reqwest::Body::wrap_stream(ReaderStream::new(handle));
        let part = match len {
            Some(len) => Part::stream_with_length(body, len),
            None => Part::stream(body),
        }
        .file_name(file_name);

        let mut form = Form::new();
        for (key, value) in fields {
            form = form.text(*key, value.to_string());
        }
        let form = form.part("file", part);

        tracing::debug!(url = %url, file = %file.display(), "esxcloud upload");
        self.fetch(self.client.post(url).multipart(form)).await
    }
}

#[async_trait]
impl RemoteApi for HttpRemoteApi {
    async fn get_task(&self, id: &TaskId) -> Result<Task, CloudError> {
        self.fetch(self.client.get(self.url(&format!("/tasks/{id}")))).await
    }

    async fn create_vm(&self, project: &str, spec: &VmCreateSpec) -> Result<Task, CloudError> {
        let url = self.url(&format!("/projects/{project}/vms"));
        self.fetch(self.client.post(url).json(spec)).await
    }

    async fn get_vm(&self, id: &VmId) -> Result<Vm, CloudError> {
        self.fetch(self.client.get(self.url(&format!("/vms/{id}")))).await
    }

    async fn delete_vm(&self, id: &VmId) -> Result<Task, CloudError> {
        let url = self.url(&format!("/vms/{id}"));
        self.fetch(self.client.delete(url).query(&[("force", "true")])).await
    }

    async fn vm_operation(&self, id: &VmId, op: &VmOperation) -> Result<Task, CloudError> {
        let url = self.url(&format!("/vms/{id}/operations"));
        self.fetch(self.client.post(url).json(op)).await
    }

    async fn attach_disk(&self, id: &VmId, op: &VmDiskOperation) -> Result<Task, CloudError> {
        let url = self.url(&format!("/vms/{id}/attach_disk"));
        self.fetch(self.client.post(url).json(op)).await
    }

    async fn detach_disk(&self, id: &VmId, op: &VmDiskOperation) -> Result<Task, CloudError> {
        let url = self.url(&format!("/vms/{id}/detach_disk"));
        self.fetch(self.client.post(url).json(op)).await
    }

    async fn attach_iso(&self, id: &VmId, iso: &Path) -> Result<Task, CloudError> {
        self.upload(self.url(&format!("/vms/{id}/attach_iso")), iso, &[]).await
    }

    async fn create_disk(&self, project: &str, spec: &DiskCreateSpec) -> Result<Task, CloudError> {
        let url = self.url(&format!("/projects/{project}/disks"));
        self.fetch(self.client.post(url).json(spec)).await
    }

    async fn get_disk(&self, id: &DiskId) -> Result<PersistentDisk, CloudError> {
        self.fetch(self.client.get(self.url(&format!("/disks/{id}")))).await
    }

    async fn delete_disk(&self, id: &DiskId) -> Result<Task, CloudError> {
        let url = self.url(&format!("/disks/{id}"));
        self.fetch(self.client.delete(url).query(&[("force", "true")])).await
    }

    async fn list_disks(&self, project: &str) -> Result<DiskList, CloudError> {
        self.fetch(self.client.get(self.url(&format!("/projects/{project}/disks"))))
            .await
    }

    async fn create_image(&self, image: &Path, name: &str) -> Result<Task, CloudError> {
        tracing::debug!(name, "uploading image");
        self.upload(self.url("/images"), image, &[("ImageReplication", IMAGE_REPLICATION)])
            .await
    }

    async fn delete_image(&self, id: &ImageId) -> Result<Task, CloudError> {
        self.fetch(self.client.delete(self.url(&format!("/images/{id}")))).await
    }
}
