//! HTTP client for the lead-intake backend
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | POST   | `/api/consultations`, `/api/collaborate`, `/api/service-inquiries`, `/api/reviews`, `/api/cultural-support` | multipart lead intake |
//! | GET    | `/api/reviews/approved` | approved reviews |
//! | GET    | `/api/gallery` | gallery images |

use std::future::Future;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::IntakeError;
use crate::payload::MultipartPayload;
use crate::types::{Envelope, GalleryImage, Review, SubmissionReceipt};

pub const APPROVED_REVIEWS_PATH: &str = "/api/reviews/approved";
pub const GALLERY_PATH: &str = "/api/gallery";

/// Sends a submission somewhere; the coordinator only knows this much
pub trait Transport: Send + Sync {
    fn post_multipart(
        &self,
        endpoint: &str,
        payload: MultipartPayload,
    ) -> impl Future<Output = Result<SubmissionReceipt, IntakeError>> + Send;
}

/// Optional fields of any JSON body the backend sends back
#[derive(Debug, Default, Deserialize)]
struct ResponseBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<serde_json::Value>,
}

fn parse_body(body: &str) -> ResponseBody {
    serde_json::from_str(body).unwrap_or_default()
}

#[derive(Debug, Clone)]
pub struct IntakeClient {
    http: reqwest::Client,
    config: Config,
}

impl IntakeClient {
    pub fn new(config: Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Calls `GET {base}/api/reviews/approved`
    pub async fn approved_reviews(&self) -> Result<Vec<Review>, IntakeError> {
        self.get_envelope(APPROVED_REVIEWS_PATH).await
    }

    /// Calls `GET {base}/api/gallery`
    pub async fn gallery(&self) -> Result<Vec<GalleryImage>, IntakeError> {
        self.get_envelope(GALLERY_PATH).await
    }

    async fn get_envelope<T: DeserializeOwned>(&self, path: &str) -> Result<T, IntakeError> {
        let endpoint = format!("GET {path}");
        let url = self.config.endpoint_url(path);
        debug!("{} -> {}", endpoint, url);

        let resp = self.http.get(&url).send().await.map_err(|source| IntakeError::Network {
            endpoint: endpoint.clone(),
            source,
        })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(IntakeError::Api {
                endpoint,
                status,
                message: parse_body(&body).message,
            });
        }

        let envelope: Envelope<T> = resp
            .json()
            .await
            .map_err(|source| IntakeError::Deserialization {
                endpoint: endpoint.clone(),
                source,
            })?;

        if !envelope.success {
            return Err(IntakeError::Rejected {
                endpoint,
                message: envelope.message,
            });
        }
        Ok(envelope.data)
    }
}

impl Transport for IntakeClient {
    /// Calls `POST {base}{endpoint}` with a multipart body. Any 2xx is success.
    async fn post_multipart(
        &self,
        endpoint: &str,
        payload: MultipartPayload,
    ) -> Result<SubmissionReceipt, IntakeError> {
        let label = format!("POST {endpoint}");
        let url = self.config.endpoint_url(endpoint);
        debug!(
            "{} -> {} ({} text parts, {} files)",
            label,
            url,
            payload.text.len(),
            payload.files.len()
        );

        let form = payload.into_form()?;
        let resp = self
            .http
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|source| IntakeError::Network {
                endpoint: label.clone(),
                source,
            })?;

        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        let parsed = parse_body(&body);

        if !status.is_success() {
            warn!("{} returned {}", label, status);
            return Err(IntakeError::Api {
                endpoint: label,
                status: status.as_u16(),
                message: parsed.message,
            });
        }

        Ok(SubmissionReceipt {
            status: status.as_u16(),
            message: parsed.message,
            data: parsed.data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_json_bodies_parse_to_nothing() {
        let parsed = parse_body("<html>502 Bad Gateway</html>");
        assert!(parsed.message.is_none());
        assert!(parsed.data.is_none());
    }

    #[test]
    fn message_is_extracted_from_error_bodies() {
        let parsed = parse_body(r#"{"message":"File too large","code":413}"#);
        assert_eq!(parsed.message.as_deref(), Some("File too large"));
    }
}
