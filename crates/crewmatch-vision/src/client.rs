//! Blocking HTTP transport for the vision service.

use base64::Engine;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crewmatch_core::{FaceDetail, VisionError, VisionService};

use crate::wire::{
    CompareFacesRequest, CompareFacesResponse, DetectFacesRequest, DetectFacesResponse,
    ImageBlob, RecognizeCelebritiesRequest, RecognizeCelebritiesResponse,
};

const DETECT_PATH: &str = "detect-faces";
const RECOGNIZE_PATH: &str = "recognize-celebrities";
const COMPARE_PATH: &str = "compare-faces";

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("invalid endpoint {0:?}: must start with http:// or https://")]
    InvalidEndpoint(String),
    #[error("cannot build http client: {0}")]
    Build(#[from] reqwest::Error),
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL; operation names are appended as path segments.
    pub endpoint: String,
    /// Sent as a bearer token when present.
    pub api_key: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

/// Vision service client. One instance is shared by every worker thread;
/// the underlying connection pool is thread-safe.
pub struct HttpVisionClient {
    http: reqwest::blocking::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpVisionClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let endpoint = config.endpoint.trim_end_matches('/').to_string();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(ClientError::InvalidEndpoint(config.endpoint));
        }
        let http = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()?;

        tracing::info!(endpoint = %endpoint, timeout_secs = config.timeout.as_secs(), "vision client ready");
        Ok(Self {
            http,
            endpoint,
            api_key: config.api_key,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn url(&self, operation: &str) -> String {
        format!("{}/{operation}", self.endpoint)
    }

    fn post<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        operation: &str,
        body: &Req,
    ) -> Result<Resp, VisionError> {
        let mut request = self.http.post(self.url(operation)).json(body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .map_err(|e| VisionError::Transport(format!("{operation}: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().unwrap_or_default();
            return Err(VisionError::Transport(format!(
                "{operation}: HTTP {status}: {}",
                detail.trim()
            )));
        }
        response
            .json::<Resp>()
            .map_err(|e| VisionError::Response(format!("{operation}: {e}")))
    }
}

/// Read an image file into an inline base64 payload.
pub fn encode_image(path: &Path) -> Result<ImageBlob, VisionError> {
    let bytes = std::fs::read(path).map_err(|source| VisionError::Image {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(ImageBlob {
        bytes: base64::engine::general_purpose::STANDARD.encode(bytes),
    })
}

impl VisionService for HttpVisionClient {
    fn detect_faces(&self, image: &Path) -> Result<Vec<FaceDetail>, VisionError> {
        let request = DetectFacesRequest {
            image: encode_image(image)?,
            attributes: vec!["ALL".to_string()],
        };
        let response: DetectFacesResponse = self.post(DETECT_PATH, &request)?;
        tracing::debug!(image = %image.display(), faces = response.face_details.len(), "faces detected");
        Ok(response.face_details.into_iter().map(FaceDetail::from).collect())
    }

    fn recognize_names(&self, image: &Path) -> Result<Vec<String>, VisionError> {
        let request = RecognizeCelebritiesRequest {
            image: encode_image(image)?,
        };
        let response: RecognizeCelebritiesResponse = self.post(RECOGNIZE_PATH, &request)?;
        Ok(response
            .celebrity_faces
            .into_iter()
            .map(|c| c.name)
            .collect())
    }

    fn compare_faces(
        &self,
        source: &Path,
        target: &Path,
        similarity_threshold: f32,
    ) -> Result<usize, VisionError> {
        let request = CompareFacesRequest {
            source_image: encode_image(source)?,
            target_image: encode_image(target)?,
            similarity_threshold,
        };
        let response: CompareFacesResponse = self.post(COMPARE_PATH, &request)?;
        if let Some(best) = response
            .face_matches
            .iter()
            .map(|m| m.similarity)
            .reduce(f32::max)
        {
            tracing::trace!(source = %source.display(), similarity = best, "face match");
        }
        Ok(response.face_matches.len())
    }
}
