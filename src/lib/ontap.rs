use log::debug;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::lib::config::ConnectionConfig;
use crate::lib::error::{OntapError, Result};
use crate::lib::volume::VolumeRecord;

/// Fields requested for each volume; nothing else is needed for sizing
pub const VOLUME_FIELDS: &str = "name,svm.name,style,efficiency,space,aggregates";

const VOLUMES_PATH: &str = "api/storage/volumes";

/// ONTAP REST client authenticated with HTTP basic auth
pub struct OntapClient {
    client: Client,
    base_url: Url,
    username: String,
    password: String,
}

/// Collection envelope shared by ONTAP list endpoints
#[derive(Debug, Deserialize)]
pub struct CollectionResponse<T> {
    #[serde(default = "Vec::new")]
    pub records: Vec<T>,
    pub num_records: Option<u64>,
    #[serde(rename = "_links")]
    pub links: Option<Links>,
}

#[derive(Debug, Deserialize)]
pub struct Links {
    pub next: Option<Href>,
}

#[derive(Debug, Deserialize)]
pub struct Href {
    pub href: String,
}

/// Volume entry from the collection listing
#[derive(Debug, Clone, Deserialize)]
pub struct VolumeRef {
    pub uuid: String,
    pub name: Option<String>,
}

impl VolumeRef {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.uuid)
    }
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
    code: Option<String>,
}

impl OntapClient {
    /// Create a new client for the configured cluster
    pub fn new(config: &ConnectionConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .user_agent(format!("volume-compression-resize/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| OntapError::ConnectionFailed(e.to_string()))?;

        debug!("Created REST client for {}", config.base_url);

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    /// List volumes whose aggregate membership includes `aggregate`
    ///
    /// Follows `_links.next` until the listing is exhausted. Records come
    /// back in the order the cluster returns them.
    pub async fn volumes_on_aggregate(&self, aggregate: &str) -> Result<Vec<VolumeRef>> {
        let mut url = self.endpoint(VOLUMES_PATH)?;
        url.query_pairs_mut().append_pair("aggregates.name", aggregate);

        let mut volumes = Vec::new();
        let mut next = Some(url);

        while let Some(url) = next.take() {
            let page: CollectionResponse<VolumeRef> = self.get_json(url).await?;
            debug!(
                "Received {} volume records (num_records={:?})",
                page.records.len(),
                page.num_records
            );
            volumes.extend(page.records);

            if let Some(href) = page.links.and_then(|l| l.next).map(|n| n.href) {
                next = Some(self.endpoint(&href)?);
            }
        }

        Ok(volumes)
    }

    /// Fetch the sizing fields of one volume
    ///
    /// Returns the parsed record alongside the raw JSON object.
    pub async fn volume_details(&self, uuid: &str) -> Result<(VolumeRecord, serde_json::Value)> {
        let mut url = self.endpoint(&format!("{}/{}", VOLUMES_PATH, urlencoding::encode(uuid)))?;
        url.query_pairs_mut().append_pair("fields", VOLUME_FIELDS);

        let raw: serde_json::Value = self.get_json(url).await?;
        let record = VolumeRecord::deserialize(&raw)
            .map_err(|e| OntapError::InvalidResponse(format!("volume {}: {}", uuid, e)))?;

        Ok((record, raw))
    }

    /// Resolve an API path or `_links` href against the base URL
    fn endpoint(&self, path: &str) -> Result<Url> {
        let url = if path.starts_with('/') {
            // hrefs are absolute paths below the cluster root
            self.base_url.join(&path[1..])
        } else {
            self.base_url.join(path)
        };
        url.map_err(|e| OntapError::InvalidUrl(format!("{}: {}", path, e)).into())
    }

    /// Execute an authenticated GET and decode the JSON body
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url.clone())
            .basic_auth(&self.username, Some(&self.password))
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| OntapError::ConnectionFailed(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(OntapError::AuthenticationFailed(self.username.clone()).into());
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OntapError::Status {
                status: status.as_u16(),
                message: error_message(&body),
            }
            .into());
        }

        response
            .json()
            .await
            .map_err(|e| OntapError::InvalidResponse(format!("{}: {}", url, e)).into())
    }
}

/// Pull `error.message` out of an ONTAP error body, falling back to the text
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(ErrorResponse {
            error: ErrorBody {
                message,
                code: Some(code),
            },
        }) => format!("{} (code {})", message, code),
        Ok(ErrorResponse { error }) => error.message,
        Err(_) if body.trim().is_empty() => "empty response body".to_string(),
        Err(_) => body.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_prefers_ontap_body() {
        let body = r#"{"error":{"message":"entry doesn't exist","code":"4"}}"#;
        assert_eq!(error_message(body), "entry doesn't exist (code 4)");

        let body = r#"{"error":{"message":"bad field"}}"#;
        assert_eq!(error_message(body), "bad field");
    }

    #[test]
    fn error_message_falls_back_to_text() {
        assert_eq!(error_message("  gateway timeout \n"), "gateway timeout");
        assert_eq!(error_message(""), "empty response body");
    }

    #[test]
    fn endpoint_resolves_next_links() {
        let config = ConnectionConfig::new("cluster1", "admin", "pw").unwrap();
        let client = OntapClient::new(&config).unwrap();

        let url = client
            .endpoint("/api/storage/volumes?start.uuid=abc&aggregates.name=aggr1")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://cluster1/api/storage/volumes?start.uuid=abc&aggregates.name=aggr1"
        );

        let url = client.endpoint(VOLUMES_PATH).unwrap();
        assert_eq!(url.as_str(), "https://cluster1/api/storage/volumes");
    }
}
