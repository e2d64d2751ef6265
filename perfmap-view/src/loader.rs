//! REST API client and map download
//!
//! Every request is independent: no retries, no caching. Responses use the
//! `{success, message?, data?}` envelope; `success: false` or an error status
//! becomes [`Error::Api`] carrying the server's message.

use perfmap_common::{ApiEnvelope, Performance, PerformanceInput};
use reqwest::multipart::{Form, Part};
use reqwest::{Method, Response, Url};
use serde::de::DeserializeOwned;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::geometry::FeatureCollection;

const USER_AGENT: &str = concat!("perfmap-view/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A poster image to upload with a submission
#[derive(Debug, Clone)]
pub struct PosterFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl PosterFile {
    pub async fn read(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self { file_name, bytes })
    }
}

/// Client for the perfmap REST API
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    /// `base_url` is the API root, e.g. `http://localhost:3001/api`
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|e| {
            perfmap_common::Error::Config(format!("Invalid API base URL {}: {}", base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(perfmap_common::Error::Config(format!(
                "API base URL cannot carry a path: {}",
                base_url
            ))
            .into());
        }

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Endpoint URL; each segment is percent-encoded
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        segments: &[&str],
        form: Option<Form>,
    ) -> Result<Option<T>> {
        let url = self.endpoint(segments);
        debug!("{} {}", method, url);

        let mut request = self.http.request(method, url);
        if let Some(form) = form {
            request = request.multipart(form);
        }
        read_envelope(request.send().await?).await
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T> {
        self.send(Method::GET, segments, None)
            .await?
            .ok_or_else(|| Error::Api("Response carried no data".to_string()))
    }

    /// All events, newest first
    pub async fn performances(&self) -> Result<Vec<Performance>> {
        let events: Vec<Performance> = self.get(&["performances"]).await?;
        info!("Loaded {} performances", events.len());
        Ok(events)
    }

    /// Events whose stored province matches exactly
    pub async fn performances_in_province(&self, province: &str) -> Result<Vec<Performance>> {
        self.get(&["performances", "province", province]).await
    }

    pub async fn performances_by_artist(&self, artist: &str) -> Result<Vec<Performance>> {
        self.get(&["performances", "artist", artist]).await
    }

    /// Distinct artist names
    pub async fn artists(&self) -> Result<Vec<String>> {
        self.get(&["artists"]).await
    }

    /// Validate locally, then submit a new event
    pub async fn create(
        &self,
        input: &PerformanceInput,
        poster: Option<PosterFile>,
    ) -> Result<Performance> {
        let form = submission_form(input, poster)?;
        let created: Performance = self
            .send(Method::POST, &["performances"], Some(form))
            .await?
            .ok_or_else(|| Error::Api("Response carried no data".to_string()))?;
        info!("Created performance {} ({})", created.id, created.artist);
        Ok(created)
    }

    /// Replace every field of an event; `None` keeps the stored poster
    pub async fn update(
        &self,
        id: i64,
        input: &PerformanceInput,
        poster: Option<PosterFile>,
    ) -> Result<Performance> {
        let form = submission_form(input, poster)?;
        let id = id.to_string();
        let updated: Performance = self
            .send(Method::PUT, &["performances", &id], Some(form))
            .await?
            .ok_or_else(|| Error::Api("Response carried no data".to_string()))?;
        info!("Updated performance {}", updated.id);
        Ok(updated)
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let id = id.to_string();
        self.send::<serde_json::Value>(Method::DELETE, &["performances", &id], None)
            .await?;
        info!("Deleted performance {}", id);
        Ok(())
    }

    /// Download and parse the province boundary dataset
    pub async fn fetch_map(&self, map_url: &str) -> Result<FeatureCollection> {
        debug!("GET {}", map_url);
        let response = self.http.get(map_url).send().await?.error_for_status()?;
        let body = response.text().await?;
        let collection = FeatureCollection::from_json(&body)?;
        info!("Loaded {} map features", collection.features.len());
        Ok(collection)
    }
}

/// Multipart body for create/update; nothing is sent when validation fails
fn submission_form(input: &PerformanceInput, poster: Option<PosterFile>) -> Result<Form> {
    input.validate()?;

    let mut form = Form::new();
    for (name, value) in input.fields() {
        form = form.text(name, value.trim().to_string());
    }
    if let Some(poster) = poster {
        form = form.part("poster", Part::bytes(poster.bytes).file_name(poster.file_name));
    }
    Ok(form)
}

async fn read_envelope<T: DeserializeOwned>(response: Response) -> Result<Option<T>> {
    let status = response.status();
    let bytes = response.bytes().await?;

    let envelope: ApiEnvelope<T> = match serde_json::from_slice(&bytes) {
        Ok(envelope) => envelope,
        Err(_) if !status.is_success() => {
            return Err(Error::Api(format!("{} {}", status, String::from_utf8_lossy(&bytes))));
        }
        Err(e) => return Err(e.into()),
    };

    if !envelope.success || !status.is_success() {
        let message = envelope.message.unwrap_or_else(|| status.to_string());
        return Err(Error::Api(message));
    }
    Ok(envelope.data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_encodes_segments() {
        let client = ApiClient::new("http://localhost:3001/api").unwrap();
        assert_eq!(
            client.endpoint(&["performances"]).as_str(),
            "http://localhost:3001/api/performances"
        );
        assert_eq!(
            client.endpoint(&["performances", "artist", "A/B C"]).as_str(),
            "http://localhost:3001/api/performances/artist/A%2FB%20C"
        );
    }

    #[test]
    fn test_endpoint_with_trailing_slash() {
        let client = ApiClient::new("http://localhost:3001/api/").unwrap();
        assert_eq!(
            client.endpoint(&["artists"]).as_str(),
            "http://localhost:3001/api/artists"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(ApiClient::new("not a url"), Err(Error::Common(_))));
        assert!(matches!(ApiClient::new("mailto:x@example.com"), Err(Error::Common(_))));
    }

    #[test]
    fn test_submission_form_validates_first() {
        let input = PerformanceInput {
            artist: Some("A".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            submission_form(&input, None),
            Err(Error::Common(perfmap_common::Error::InvalidInput(_)))
        ));
    }
}
