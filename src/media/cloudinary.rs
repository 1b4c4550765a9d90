use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha1::{Digest, Sha1};
use tracing::debug;

use super::image::{ImageRef, UploadFile};
use super::store::{MediaError, MediaStore};
use crate::config::CloudinaryConfig;

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

impl DestroyResponse {
    /// Destroying an id that is already gone counts as done.
    fn outcome(&self) -> Result<(), MediaError> {
        match self.result.as_str() {
            "ok" | "not found" => Ok(()),
            other => Err(MediaError::InvalidResponse(format!("destroy returned '{}'", other))),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorMessage,
}

#[derive(Debug, Deserialize)]
struct ErrorMessage {
    message: String,
}

struct Credentials<'a> {
    cloud_name: &'a str,
    api_key: &'a str,
    api_secret: &'a str,
}

/// Signed Cloudinary upload API client.
pub struct CloudinaryStore {
    client: reqwest::Client,
    config: CloudinaryConfig,
}

impl CloudinaryStore {
    pub fn new(config: CloudinaryConfig) -> Result<Self, MediaError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    pub fn is_configured(&self) -> bool {
        self.credentials().is_ok()
    }

    fn credentials(&self) -> Result<Credentials<'_>, MediaError> {
        match (
            self.config.cloud_name.as_deref(),
            self.config.api_key.as_deref(),
            self.config.api_secret.as_deref(),
        ) {
            (Some(cloud_name), Some(api_key), Some(api_secret))
                if !cloud_name.is_empty() && !api_key.is_empty() && !api_secret.is_empty() =>
            {
                Ok(Credentials { cloud_name, api_key, api_secret })
            }
            _ => Err(MediaError::NotConfigured),
        }
    }

    fn endpoint(&self, cloud_name: &str, action: &str) -> String {
        format!(
            "{}/{}/image/{}",
            self.config.api_base.trim_end_matches('/'),
            cloud_name,
            action
        )
    }

    async fn rejection(response: reqwest::Response) -> MediaError {
        let status = response.status().as_u16();
        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.error.message,
            Err(_) => "no error message".to_string(),
        };
        MediaError::Rejected { status, message }
    }
}

/// Cloudinary request signature: params sorted by key, joined as `k=v&k=v`,
/// secret appended, SHA-1 hex digest.
pub fn sign_params(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted: Vec<&(&str, &str)> = params.iter().filter(|(_, v)| !v.is_empty()).collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let to_sign = sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha1::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[async_trait]
impl MediaStore for CloudinaryStore {
    async fn upload(&self, folder: &str, file: &UploadFile) -> Result<ImageRef, MediaError> {
        let creds = self.credentials()?;
        if file.bytes.is_empty() {
            return Err(MediaError::InvalidFile(format!("{} is empty", file.file_name)));
        }

        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = sign_params(
            &[("folder", folder), ("timestamp", &timestamp)],
            creds.api_secret,
        );

        let part = Part::bytes(file.bytes.clone())
            .file_name(file.file_name.clone())
            .mime_str(&file.content_type)
            .map_err(|e| MediaError::InvalidFile(e.to_string()))?;

        let form = Form::new()
            .part("file", part)
            .text("api_key", creds.api_key.to_string())
            .text("timestamp", timestamp)
            .text("folder", folder.to_string())
            .text("signature", signature);

        let response = self
            .client
            .post(self.endpoint(creds.cloud_name, "upload"))
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| MediaError::InvalidResponse(e.to_string()))?;

        debug!(public_id = %body.public_id, "cloudinary upload complete");
        Ok(ImageRef::new(body.secure_url, body.public_id))
    }

    async fn delete(&self, public_id: &str) -> Result<(), MediaError> {
        let creds = self.credentials()?;
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = sign_params(
            &[("public_id", public_id), ("timestamp", &timestamp)],
            creds.api_secret,
        );

        let response = self
            .client
            .post(self.endpoint(creds.cloud_name, "destroy"))
            .form(&[
                ("public_id", public_id),
                ("api_key", creds.api_key),
                ("timestamp", timestamp.as_str()),
                ("signature", signature.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        let body: DestroyResponse = response
            .json()
            .await
            .map_err(|e| MediaError::InvalidResponse(e.to_string()))?;

        body.outcome()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(secret: Option<&str>) -> CloudinaryConfig {
        CloudinaryConfig {
            cloud_name: Some("demo".to_string()),
            api_key: Some("1234".to_string()),
            api_secret: secret.map(str::to_string),
            api_base: "https://api.cloudinary.com/v1_1/".to_string(),
            timeout_secs: 5,
        }
    }

    #[test]
    fn signature_ignores_param_order() {
        let a = sign_params(&[("timestamp", "1315060510"), ("public_id", "sample")], "abcd");
        let b = sign_params(&[("public_id", "sample"), ("timestamp", "1315060510")], "abcd");
        assert_eq!(a, b);
        assert_eq!(a.len(), 40);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn signature_depends_on_secret() {
        let a = sign_params(&[("public_id", "sample")], "one");
        let b = sign_params(&[("public_id", "sample")], "two");
        assert_ne!(a, b);
    }

    #[test]
    fn builds_endpoints_without_double_slash() {
        let store = CloudinaryStore::new(config(Some("s"))).unwrap();
        assert_eq!(
            store.endpoint("demo", "destroy"),
            "https://api.cloudinary.com/v1_1/demo/image/destroy"
        );
    }

    #[test]
    fn destroy_outcome_accepts_missing_ids() {
        let gone = DestroyResponse { result: "not found".to_string() };
        assert!(gone.outcome().is_ok());

        let odd = DestroyResponse { result: "pending".to_string() };
        assert!(matches!(odd.outcome(), Err(MediaError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn deleting_twice_succeeds_against_the_api() {
        use axum::{routing::post, Json, Router};
        use serde_json::json;

        // first destroy removes the image, every later one reports it missing
        let calls = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counter = calls.clone();
        let app = Router::new().route(
            "/demo/image/destroy",
            post(move || {
                let counter = counter.clone();
                async move {
                    let n = counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                    Json(json!({ "result": if n == 0 { "ok" } else { "not found" } }))
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let mut cfg = config(Some("s"));
        cfg.api_base = format!("http://{addr}/");
        let store = CloudinaryStore::new(cfg).unwrap();

        store.delete("pages/x").await.unwrap();
        store.delete("pages/x").await.unwrap();
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn missing_credentials_fail_fast() {
        let store = CloudinaryStore::new(config(None)).unwrap();
        assert!(!store.is_configured());
        let err = store.delete("pages/x").await.unwrap_err();
        assert!(matches!(err, MediaError::NotConfigured));
    }
}
