//! Nacos config-center sink writer.
//!
//! A template declares the sink with a `[template.nacos]` table:
//!
//! ```toml
//! [template.nacos]
//! endpoint = { name = "nacos-server" }
//! format = "properties"
//! metadata = { dataId = "{{ parameter.dataId }}", group = "DEFAULT_GROUP" }
//! content = { ... }
//! ```
//!
//! The endpoint is itself an integration (see the `nacos-server` built-in
//! template), read from the system namespace:
//!
//! ```json
//! {
//!   "servers": [{ "ipAddr": "127.0.0.1", "port": 8848 }],
//!   "client": { "namespaceId": "dev", "username": "nacos", "password": "..." }
//! }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use conflux_core::{
    application::{ports::IntegrationReader, ports::SinkWriter, WriterError},
    domain::{ExpandedWriterData, PropertyMap},
};
use serde::Deserialize;
use tracing::{debug, instrument};

/// Sink kind handled by [`NacosWriter`].
pub const KIND: &str = "nacos";

const DEFAULT_GROUP: &str = "DEFAULT_GROUP";
const DEFAULT_CONTEXT_PATH: &str = "/nacos";

/// One Nacos server address.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NacosServer {
    pub ip_addr: String,
    pub port: u16,
    #[serde(default)]
    pub scheme: Option<String>,
    #[serde(default)]
    pub context_path: Option<String>,
}

impl NacosServer {
    fn base_url(&self) -> String {
        let scheme = self.scheme.as_deref().unwrap_or("http");
        let context = self
            .context_path
            .as_deref()
            .unwrap_or(DEFAULT_CONTEXT_PATH)
            .trim_end_matches('/');
        format!("{scheme}://{}:{}{context}", self.ip_addr, self.port)
    }
}

/// Client settings of a Nacos endpoint.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NacosClient {
    #[serde(default)]
    pub namespace_id: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

/// Properties of a `nacos-server` endpoint integration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NacosEndpoint {
    pub servers: Vec<NacosServer>,
    #[serde(default)]
    pub client: NacosClient,
}

impl NacosEndpoint {
    pub fn from_properties(name: &str, properties: &PropertyMap) -> Result<Self, WriterError> {
        let invalid = |reason: String| WriterError::Endpoint {
            name: name.into(),
            reason,
        };
        let json = serde_json::to_value(properties).map_err(|e| invalid(e.to_string()))?;
        let endpoint: Self = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        if endpoint.servers.is_empty() {
            return Err(invalid("no server is configured".into()));
        }
        Ok(endpoint)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    access_token: String,
}

/// Publishes payloads to a Nacos config service over its open API.
pub struct NacosWriter {
    http: reqwest::Client,
}

impl NacosWriter {
    /// Create a writer whose requests time out after `request_timeout`,
    /// unless the endpoint sets its own `timeoutMs`.
    pub fn new(request_timeout: Duration) -> Result<Self, WriterError> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| WriterError::InvalidConfig(format!("fail to build the HTTP client: {e}")))?;
        Ok(Self { http })
    }

    async fn login(
        &self,
        server: &NacosServer,
        client: &NacosClient,
        timeout: Option<Duration>,
    ) -> Result<Option<String>, WriterError> {
        let (Some(username), Some(password)) = (&client.username, &client.password) else {
            return Ok(None);
        };

        let mut request = self
            .http
            .post(format!("{}/v1/auth/login", server.base_url()))
            .form(&[("username", username.as_str()), ("password", password.as_str())]);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(connection_error)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WriterError::Rejected(format!("login failed ({status}): {body}")));
        }
        let login: LoginResponse = response
            .json()
            .await
            .map_err(|e| WriterError::Rejected(format!("unexpected login response: {e}")))?;
        Ok(Some(login.access_token))
    }
}

fn connection_error(e: reqwest::Error) -> WriterError {
    WriterError::Connection(e.to_string())
}

#[async_trait]
impl SinkWriter for NacosWriter {
    fn kind(&self) -> &'static str {
        KIND
    }

    #[instrument(skip_all, fields(endpoint = %payload.config.endpoint))]
    async fn write(
        &self,
        payload: &ExpandedWriterData,
        reader: &dyn IntegrationReader,
    ) -> Result<(), WriterError> {
        let endpoint_name = payload.config.endpoint.as_str();
        let properties = reader
            .resolve_integration(reader.system_namespace(), endpoint_name)
            .await
            .map_err(|e| WriterError::Endpoint {
                name: endpoint_name.into(),
                reason: e.to_string(),
            })?;
        let endpoint = NacosEndpoint::from_properties(endpoint_name, &properties)?;

        let data_id = payload
            .metadata_str("dataId")
            .ok_or_else(|| WriterError::InvalidConfig("metadata.dataId is required".into()))?;
        let group = payload
            .metadata_str("group")
            .unwrap_or_else(|| DEFAULT_GROUP.to_string());
        let tenant = payload
            .metadata_str("namespaceId")
            .or_else(|| endpoint.client.namespace_id.clone())
            .unwrap_or_default();
        let app_name = payload.metadata_str("appName").unwrap_or_default();
        let tag = payload.metadata_str("tag").unwrap_or_default();
        let content = String::from_utf8(payload.content.clone())
            .map_err(|e| WriterError::InvalidConfig(format!("the content is not UTF-8: {e}")))?;

        let timeout = endpoint.client.timeout_ms.map(Duration::from_millis);
        // Single attempt against the first server.
        let server = &endpoint.servers[0];
        let token = self.login(server, &endpoint.client, timeout).await?;

        let form = [
            ("dataId", data_id.as_str()),
            ("group", group.as_str()),
            ("content", content.as_str()),
            ("tenant", tenant.as_str()),
            ("type", payload.config.format.as_str()),
            ("appName", app_name.as_str()),
            ("tag", tag.as_str()),
        ];
        let mut request = self
            .http
            .post(format!("{}/v1/cs/configs", server.base_url()))
            .form(&form);
        if let Some(token) = &token {
            request = request.query(&[("accessToken", token.as_str())]);
        }
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(connection_error)?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(WriterError::Rejected(format!("{status}: {body}")));
        }
        if body.trim() != "true" {
            return Err(WriterError::Rejected(format!(
                "the server did not confirm the publish: {body}"
            )));
        }

        debug!(data_id = %data_id, group = %group, "Published config");
        Ok(())
    }
}
