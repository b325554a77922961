use std::time::Duration;

use forge_logging::{forge_debug, forge_warn};
use futures_util::StreamExt;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::types::{
    FileBody, FileListing, MessageLog, ProjectList, ProviderAck, ProviderRequest,
};
use crate::{
    ApiError, FailureKind, FileEntry, JobRecord, MessageRecord, ProjectRecord, SubmitJobRequest,
    SubmitJobResponse,
};

const TARGET: &str = "forge::api";

#[derive(Debug, Clone)]
pub struct ApiSettings {
    /// Root of the backend, optionally with a path prefix such as `/api`.
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    /// Upper bound on any response body, file reads included.
    pub max_bytes: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            max_bytes: 5 * 1024 * 1024,
        }
    }
}

/// The backend's HTTP surface.
#[async_trait::async_trait]
pub trait ForgeApi: Send + Sync {
    async fn submit_job(&self, request: &SubmitJobRequest) -> Result<SubmitJobResponse, ApiError>;

    async fn list_jobs(&self) -> Result<Vec<JobRecord>, ApiError>;

    async fn get_job(&self, job_id: &str) -> Result<JobRecord, ApiError>;

    /// Returns the provider the server acknowledged.
    async fn set_provider(&self, provider: &str) -> Result<String, ApiError>;

    async fn list_files(&self, job_id: &str) -> Result<Vec<FileEntry>, ApiError>;

    async fn read_file(&self, job_id: &str, path: &str) -> Result<String, ApiError>;

    async fn get_messages(&self, project_id: &str) -> Result<Vec<MessageRecord>, ApiError>;

    async fn list_projects(&self) -> Result<Vec<ProjectRecord>, ApiError>;

    async fn health(&self) -> Result<(), ApiError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestForgeApi {
    base: Url,
    client: reqwest::Client,
    max_bytes: u64,
}

impl ReqwestForgeApi {
    pub fn new(settings: ApiSettings) -> Result<Self, ApiError> {
        let base = Url::parse(&settings.base_url)
            .map_err(|err| ApiError::new(FailureKind::InvalidUrl, err.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::new(
                FailureKind::InvalidUrl,
                format!("{base} cannot be used as a base url"),
            ));
        }
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ApiError::new(FailureKind::Transport, err.to_string()))?;
        Ok(Self {
            base,
            client,
            max_bytes: settings.max_bytes,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Appends percent-encoded `segments` to the base url, keeping any path prefix.
    fn endpoint<'a, I>(&self, segments: I) -> Result<Url, ApiError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::new(FailureKind::InvalidUrl, "url has no path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        forge_debug!(target: TARGET, "GET {}", url);
        let request = self.client.get(url).header(ACCEPT, "application/json");
        self.execute(request).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<T, ApiError> {
        forge_debug!(target: TARGET, "POST {}", url);
        let payload = serde_json::to_vec(body)
            .map_err(|err| ApiError::new(FailureKind::Decode, err.to_string()))?;
        let request = self
            .client
            .post(url)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .body(payload);
        self.execute(request).await
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let body = self.fetch_body(request).await?;
        serde_json::from_slice(&body)
            .map_err(|err| ApiError::new(FailureKind::Decode, err.to_string()))
    }

    async fn fetch_body(&self, request: reqwest::RequestBuilder) -> Result<Vec<u8>, ApiError> {
        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status();

        if let Some(content_len) = response.content_length() {
            if content_len > self.max_bytes {
                return Err(ApiError::new(
                    FailureKind::TooLarge {
                        max_bytes: self.max_bytes,
                        actual: Some(content_len),
                    },
                    "response too large",
                ));
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > self.max_bytes {
                return Err(ApiError::new(
                    FailureKind::TooLarge {
                        max_bytes: self.max_bytes,
                        actual: Some(next_len),
                    },
                    "response too large",
                ));
            }
            bytes.extend_from_slice(&chunk);
        }

        if !status.is_success() {
            let message = server_message(&bytes).unwrap_or_else(|| status.to_string());
            forge_warn!(target: TARGET, "request failed with {}: {}", status, message);
            return Err(ApiError::new(
                FailureKind::HttpStatus(status.as_u16()),
                message,
            ));
        }
        Ok(bytes)
    }
}

#[async_trait::async_trait]
impl ForgeApi for ReqwestForgeApi {
    async fn submit_job(&self, request: &SubmitJobRequest) -> Result<SubmitJobResponse, ApiError> {
        let url = self.endpoint(["jobs"])?;
        self.post(url, request).await
    }

    async fn list_jobs(&self) -> Result<Vec<JobRecord>, ApiError> {
        let url = self.endpoint(["jobs"])?;
        let jobs: Option<Vec<JobRecord>> = self.get(url).await?;
        Ok(jobs.unwrap_or_default())
    }

    async fn get_job(&self, job_id: &str) -> Result<JobRecord, ApiError> {
        let url = self.endpoint(["jobs", job_id])?;
        let job: Option<JobRecord> = self.get(url).await?;
        job.ok_or_else(|| ApiError::new(FailureKind::HttpStatus(404), "job not found"))
    }

    async fn set_provider(&self, provider: &str) -> Result<String, ApiError> {
        let url = self.endpoint(["jobs", "provider"])?;
        let ack: ProviderAck = self.post(url, &ProviderRequest { provider }).await?;
        Ok(ack.provider.unwrap_or_else(|| provider.to_string()))
    }

    async fn list_files(&self, job_id: &str) -> Result<Vec<FileEntry>, ApiError> {
        let url = self.endpoint(["workspace", job_id, "files"])?;
        let listing: FileListing = self.get(url).await?;
        Ok(listing.files)
    }

    async fn read_file(&self, job_id: &str, path: &str) -> Result<String, ApiError> {
        let segments = ["workspace", job_id, "files"]
            .into_iter()
            .chain(path.split('/').filter(|part| !part.is_empty()));
        let url = self.endpoint(segments)?;
        let body: FileBody = self.get(url).await?;
        Ok(body.content)
    }

    async fn get_messages(&self, project_id: &str) -> Result<Vec<MessageRecord>, ApiError> {
        let url = self.endpoint(["projects", project_id, "messages"])?;
        let log: MessageLog = self.get(url).await?;
        Ok(log.messages)
    }

    async fn list_projects(&self) -> Result<Vec<ProjectRecord>, ApiError> {
        let url = self.endpoint(["projects", ""])?;
        let list: ProjectList = self.get(url).await?;
        Ok(list.projects)
    }

    async fn health(&self) -> Result<(), ApiError> {
        let url = self.endpoint(["health"])?;
        forge_debug!(target: TARGET, "GET {}", url);
        self.fetch_body(self.client.get(url)).await.map(|_| ())
    }
}

/// Best human readable message in an error body: `detail`, then `message`, then raw text.
fn server_message(body: &[u8]) -> Option<String> {
    if let Ok(Value::Object(map)) = serde_json::from_slice::<Value>(body) {
        for key in ["detail", "message"] {
            match map.get(key) {
                Some(Value::String(text)) => return Some(text.clone()),
                Some(Value::Null) | None => {}
                Some(other) => return Some(other.to_string()),
            }
        }
    }
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return ApiError::new(FailureKind::Decode, err.to_string());
    }
    ApiError::new(FailureKind::Transport, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::server_message;

    #[test]
    fn prefers_detail_over_message_and_text() {
        assert_eq!(
            server_message(br#"{"detail":"Project not found","message":"x"}"#).as_deref(),
            Some("Project not found")
        );
        assert_eq!(
            server_message(br#"{"message":"bad provider"}"#).as_deref(),
            Some("bad provider")
        );
        assert_eq!(server_message(b"  upstream down \n").as_deref(), Some("upstream down"));
        assert_eq!(server_message(b""), None);
    }

    #[test]
    fn structured_detail_is_kept_as_json() {
        let message = server_message(br#"{"detail":[{"loc":["body","spec"]}]}"#).unwrap();
        assert!(message.contains("spec"));
    }
}
