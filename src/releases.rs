use std::time::Duration;
use reqwest::blocking::Client;
use reqwest::header::USER_AGENT;
use serde::Deserialize;
use tracing::{debug, error};
use crate::config::HvmConfig;
use crate::error::{HvmError, Result};
use crate::listing::{latest_from_listing, versions_from_listing, FLOOR_VERSION};
use crate::tool::{archive_name, Platform, SourceKind, Tool};
use crate::version::{ensure_safe_version, is_at_least};

/// User agent the checkpoint API expects from hvm.
pub const CHECKPOINT_USER_AGENT: &str = "hvm-oss-http-client";

/// Lowest `current_version` accepted from the checkpoint API.
const MIN_CHECKPOINT_VERSION: &str = "0.0.1";

/// Response of `GET /v1/check/<tool>`. Only the field hvm needs is kept.
#[derive(Debug, Deserialize)]
struct CheckpointResponse {
    #[serde(default)]
    current_version: String,
}

/// Where release metadata, manifests and archives come from.
///
/// Built once from the configuration; every call is a single blocking
/// request with no retries and no caching between runs.
#[derive(Debug, Clone)]
pub struct ReleaseSource {
    client: Client,
    checkpoint_client: Client,
    releases_url: String,
    checkpoint_url: String,
}

impl ReleaseSource {
    pub fn new(config: &HvmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .map_err(|e| HvmError::Config(format!("failed to build HTTP client: {e}")))?;
        let checkpoint_client = Client::builder()
            .timeout(Duration::from_secs(config.checkpoint_timeout_secs))
            .build()
            .map_err(|e| HvmError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            checkpoint_client,
            releases_url: config.releases_url.trim_end_matches('/').to_string(),
            checkpoint_url: config.checkpoint_url.trim_end_matches('/').to_string(),
        })
    }

    /// Client for the releases site (bounded by `http_timeout_secs`).
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// `<releases>/<tool>/`
    pub fn listing_url(&self, tool: Tool) -> String {
        format!("{}/{}/", self.releases_url, tool.name())
    }

    /// `<releases>/<tool>/<version>/<tool>_<version>_SHA256SUMS`
    pub fn manifest_url(&self, tool: Tool, version: &str) -> String {
        format!(
            "{}/{tool}/{version}/{tool}_{version}_SHA256SUMS",
            self.releases_url,
            tool = tool.name(),
        )
    }

    /// Archive URL carrying the expected digest as `?checksum=sha256:<digest>`.
    pub fn archive_url(&self, tool: Tool, version: &str, platform: &Platform, digest: &str) -> String {
        format!(
            "{}/{}/{}/{}?checksum=sha256:{}",
            self.releases_url,
            tool.name(),
            version,
            archive_name(tool, version, platform),
            digest
        )
    }

    /// GETs `url` and returns the body, failing on transport errors and non-2xx statuses.
    pub fn fetch_text(&self, url: &str) -> Result<String> {
        debug!(url, "fetching");
        let response = self.client.get(url).send().map_err(|e| {
            error!(url, error = %e, "fetch data error");
            HvmError::network(url, e)
        })?;
        if !response.status().is_success() {
            error!(url, status = %response.status(), "fetch data error");
            return Err(HvmError::HttpStatus {
                url: url.to_string(),
                status: response.status(),
            });
        }
        response.text().map_err(|e| HvmError::network(url, e))
    }

    /// Newest published version of `tool`, using the tool's source protocol.
    pub fn latest_version(&self, tool: Tool) -> Result<String> {
        match tool.ensure_supported()? {
            SourceKind::Checkpoint => self.checkpoint_latest(tool),
            SourceKind::HtmlListing => self.listing_latest(tool),
        }
    }

    /// Every version in the releases listing of `tool`, newest first,
    /// down to and including [`FLOOR_VERSION`].
    pub fn all_versions(&self, tool: Tool) -> Result<Vec<String>> {
        tool.ensure_supported()?;
        let html = self.fetch_text(&self.listing_url(tool))?;
        let versions = versions_from_listing(&html, tool, FLOOR_VERSION);
        debug!(tool = %tool, count = versions.len(), "scraped release listing");
        Ok(versions)
    }

    fn checkpoint_latest(&self, tool: Tool) -> Result<String> {
        let url = format!("{}/v1/check/{}", self.checkpoint_url, tool.name());
        debug!(tool = %tool, url = %url, "querying checkpoint");
        let response = self
            .checkpoint_client
            .get(&url)
            .header(USER_AGENT, CHECKPOINT_USER_AGENT)
            .send()
            .map_err(|e| HvmError::network(&url, e))?;
        if !response.status().is_success() {
            return Err(HvmError::HttpStatus {
                url,
                status: response.status(),
            });
        }
        let body = response.text().map_err(|e| HvmError::network(&url, e))?;
        let parsed: CheckpointResponse = serde_json::from_str(&body)
            .map_err(|e| HvmError::unparsable(tool, format!("invalid checkpoint response: {e}")))?;

        let version = parsed.current_version.trim().to_string();
        if !is_at_least(&version, MIN_CHECKPOINT_VERSION) {
            error!(tool = %tool, value = %version, "unexpected checkpoint api value");
            return Err(HvmError::unparsable(
                tool,
                format!("checkpoint returned unusable version {version:?}"),
            ));
        }
        ensure_safe_version(tool, &version)?;
        Ok(version)
    }

    fn listing_latest(&self, tool: Tool) -> Result<String> {
        let url = self.listing_url(tool);
        let html = self.fetch_text(&url)?;
        let version = latest_from_listing(&html, tool)
            .ok_or_else(|| HvmError::unparsable(tool, format!("no releases found at {url}")))?;
        ensure_safe_version(tool, &version)?;
        Ok(version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    fn source_for(server: &Server) -> ReleaseSource {
        let config = HvmConfig {
            releases_url: server.url(),
            checkpoint_url: server.url(),
            ..HvmConfig::default()
        };
        ReleaseSource::new(&config).unwrap()
    }

    #[test]
    fn test_checkpoint_latest_sends_user_agent() {
        let mut server = Server::new();
        let mock = server
            .mock("GET", "/v1/check/consul")
            .match_header("user-agent", CHECKPOINT_USER_AGENT)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"product":"consul","current_version":"1.4.2","current_release":1549400000}"#)
            .create();

        let latest = source_for(&server).latest_version(Tool::Consul).unwrap();
        assert_eq!(latest, "1.4.2");
        mock.assert();
    }

    #[test]
    fn test_checkpoint_rejects_placeholder_version() {
        let mut server = Server::new();
        let _m = server
            .mock("GET", "/v1/check/nomad")
            .with_status(200)
            .with_body(r#"{"current_version":"0.0.0"}"#)
            .create();

        let err = source_for(&server).latest_version(Tool::Nomad).unwrap_err();
        assert!(matches!(err, HvmError::UnparsableMetadata { .. }));
    }

    #[test]
    fn test_checkpoint_rejects_missing_or_garbage_version() {
        let mut server = Server::new();
        let _empty = server
            .mock("GET", "/v1/check/packer")
            .with_status(200)
            .with_body(r#"{"product":"packer"}"#)
            .create();
        let _garbage = server
            .mock("GET", "/v1/check/terraform")
            .with_status(200)
            .with_body("<html>maintenance</html>")
            .create();

        let source = source_for(&server);
        assert!(matches!(source.latest_version(Tool::Packer), Err(HvmError::UnparsableMetadata { .. })));
        assert!(matches!(source.latest_version(Tool::Terraform), Err(HvmError::UnparsableMetadata { .. })));
    }

    #[test]
    fn test_checkpoint_non_success_status() {
        let mut server = Server::new();
        let _m = server.mock("GET", "/v1/check/vagrant").with_status(503).create();

        let err = source_for(&server).latest_version(Tool::Vagrant).unwrap_err();
        assert!(matches!(err, HvmError::HttpStatus { status, .. } if status.as_u16() == 503));
    }

    #[test]
    fn test_vault_latest_is_scraped() {
        let mut server = Server::new();
        let _m = server
            .mock("GET", "/vault/")
            .with_status(200)
            .with_body(r#"<ul><li><a href="../">../</a></li><li><a href="/vault/1.0.3/">vault_1.0.3</a></li><li><a href="/vault/1.0.2/">vault_1.0.2</a></li></ul>"#)
            .create();

        assert_eq!(source_for(&server).latest_version(Tool::Vault).unwrap(), "1.0.3");
    }

    #[test]
    fn test_vault_latest_must_be_a_plain_version() {
        let mut server = Server::new();
        let _m = server
            .mock("GET", "/vault/")
            .with_status(200)
            .with_body(r#"<a href="../">../</a><a href="/vault/x/">vault_../../escaped</a><a href="/vault/1.0.2/">vault_1.0.2</a>"#)
            .create();

        let err = source_for(&server).latest_version(Tool::Vault).unwrap_err();
        assert!(matches!(err, HvmError::InvalidVersion { ref version, .. } if version == "../../escaped"));
    }

    #[test]
    fn test_all_versions_skips_path_like_entries() {
        let mut server = Server::new();
        let _m = server
            .mock("GET", "/consul/")
            .with_status(200)
            .with_body(r#"<a href="../">../</a><a href="/consul/1.4.3/">consul_1.4.3</a><a href="/x">consul_../../escaped</a><a href="/x">consul_..</a><a href="/consul/1.4.2/">consul_1.4.2</a>"#)
            .create();

        let versions = source_for(&server).all_versions(Tool::Consul).unwrap();
        assert_eq!(versions, vec!["1.4.3", "1.4.2"]);
    }

    #[test]
    fn test_unsupported_tool_makes_no_request() {
        let mut server = Server::new();
        let mock = server.mock("GET", mockito::Matcher::Any).expect(0).create();

        let source = source_for(&server);
        assert!(matches!(source.latest_version(Tool::Sentinel), Err(HvmError::UnsupportedTool(_))));
        assert!(matches!(source.all_versions(Tool::EnvConsul), Err(HvmError::UnsupportedTool(_))));
        mock.assert();
    }

    #[test]
    fn test_all_versions_from_listing() {
        let mut server = Server::new();
        let _m = server
            .mock("GET", "/nomad/")
            .with_status(200)
            .with_body(r#"<a href="../">../</a><a href="/nomad/0.8.5/">nomad_0.8.5</a><a href="/nomad/0.6.0/">nomad_0.6.0</a><a href="/nomad/0.1.0/">nomad_0.1.0</a><a href="/x">nomad_0.0.1</a>"#)
            .create();

        let versions = source_for(&server).all_versions(Tool::Nomad).unwrap();
        assert_eq!(versions, vec!["0.8.5", "0.6.0", "0.1.0"]);
    }

    #[test]
    fn test_urls() {
        let config = HvmConfig::default();
        let source = ReleaseSource::new(&config).unwrap();
        assert_eq!(
            source.manifest_url(Tool::Consul, "1.4.2"),
            "https://releases.hashicorp.com/consul/1.4.2/consul_1.4.2_SHA256SUMS"
        );
        assert_eq!(
            source.archive_url(Tool::Consul, "1.4.2", &Platform::new("linux", "amd64"), "abc"),
            "https://releases.hashicorp.com/consul/1.4.2/consul_1.4.2_linux_amd64.zip?checksum=sha256:abc"
        );
        assert_eq!(source.listing_url(Tool::Vault), "https://releases.hashicorp.com/vault/");
    }
}
