//! API client for the scheduler's pfpstatus endpoint

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use url::Url;

/// Body the server sends back for a node it holds no status for
const UNKNOWN_NODE_BODY: &str = "unknown node name";

/// Failures reported by the status server
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("no fingerprint status recorded for node '{0}'")]
    UnknownNode(String),

    #[error("API error ({status}): {body}")]
    Api { status: StatusCode, body: String },
}

/// API client for the pfpstatus HTTP endpoint
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url).context("Invalid API URL")?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("Invalid API URL: {}", base_url);
        }

        Ok(Self { client, base_url })
    }

    /// Number of nodes the server holds status for
    pub async fn node_count(&self) -> Result<NodeCount> {
        let url = self.endpoint(&["pfpstatus"])?;
        self.get(url).await
    }

    /// Status recorded for one node
    pub async fn node_status(&self, node: &str) -> Result<NodeStatus> {
        let url = self.endpoint(&["pfpstatus", node])?;
        self.get(url).await.map_err(|err| match err.downcast::<ClientError>() {
            Ok(ClientError::Api { status, body })
                if status == StatusCode::UNPROCESSABLE_ENTITY
                    && body.trim() == UNKNOWN_NODE_BODY =>
            {
                ClientError::UnknownNode(node.to_string()).into()
            }
            Ok(other) => other.into(),
            Err(err) => err,
        })
    }

    /// Status of every node, keyed by node name
    pub async fn all_status(&self) -> Result<BTreeMap<String, NodeStatus>> {
        let url = self.endpoint(&["pfpstatus", "_all"])?;
        self.get(url).await
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("Invalid API URL: {}", self.base_url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Api { status, body }.into());
        }

        response.json().await.context("Failed to parse response")
    }
}

// API response types

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeCount {
    pub nodes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PodRef {
    #[serde(default)]
    pub namespace: String,
    pub name: String,
}

/// One recorded fingerprint computation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSample {
    #[serde(default)]
    pub fingerprint_expected: String,
    #[serde(default)]
    pub fingerprint_computed: String,
    #[serde(default)]
    pub pods: Vec<PodRef>,
    #[serde(default)]
    pub node_name: String,
    pub last_write: DateTime<Utc>,
    pub seq_no: u64,
}

impl StatusSample {
    pub fn is_match(&self) -> bool {
        self.fingerprint_expected == self.fingerprint_computed
    }
}

/// Per-node content as served or dumped
///
/// A windowed recorder keeps a list of samples per node, a
/// latest-only store keeps a single one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeStatus {
    Window(Vec<StatusSample>),
    Latest(StatusSample),
}

impl NodeStatus {
    pub fn into_samples(self) -> Vec<StatusSample> {
        match self {
            NodeStatus::Window(samples) => samples,
            NodeStatus::Latest(sample) => vec![sample],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW_BODY: &str = r#"[
        {"fingerprintExpected":"pfp0v001aa","fingerprintComputed":"pfp0v001aa",
         "pods":[{"namespace":"default","name":"web-0"}],"nodeName":"worker-0",
         "lastWrite":"2024-03-01T12:00:00Z","seqNo":1},
        {"fingerprintExpected":"pfp0v001aa","fingerprintComputed":"pfp0v001bb",
         "pods":[],"nodeName":"worker-0","lastWrite":"2024-03-01T12:00:10Z","seqNo":4}
    ]"#;

    #[tokio::test]
    async fn test_node_count() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/pfpstatus")
            .with_status(200)
            .with_header("content-type", "application/json; charset=UTF-8")
            .with_body(r#"{"nodes":3}"#)
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let count = client.node_count().await.unwrap();

        assert_eq!(count.nodes, 3);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_node_status_window() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/pfpstatus/worker-0")
            .with_status(200)
            .with_body(WINDOW_BODY)
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let samples = client.node_status("worker-0").await.unwrap().into_samples();

        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].pods[0].name, "web-0");
        assert!(samples[0].is_match());
        assert!(!samples[1].is_match());
        assert_eq!(samples[1].seq_no, 4);
    }

    #[tokio::test]
    async fn test_node_status_latest() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/pfpstatus/worker-1")
            .with_status(200)
            .with_body(
                r#"{"fingerprintExpected":"a","fingerprintComputed":"a","nodeName":"worker-1",
                    "lastWrite":"2024-03-01T12:00:00Z","seqNo":7}"#,
            )
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let status = client.node_status("worker-1").await.unwrap();

        assert!(matches!(status, NodeStatus::Latest(_)));
        let samples = status.into_samples();
        assert_eq!(samples[0].seq_no, 7);
        assert!(samples[0].pods.is_empty());
    }

    #[tokio::test]
    async fn test_all_status_mixes_window_and_latest() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/pfpstatus/_all")
            .with_status(200)
            .with_body(format!(
                r#"{{"worker-0":{},"worker-1":{{"fingerprintExpected":"a","fingerprintComputed":"a",
                    "lastWrite":"2024-03-01T12:00:00Z","seqNo":7}}}}"#,
                WINDOW_BODY
            ))
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let all = client.all_status().await.unwrap();

        let nodes: Vec<&str> = all.keys().map(String::as_str).collect();
        assert_eq!(nodes, ["worker-0", "worker-1"]);
        assert!(matches!(&all["worker-0"], NodeStatus::Window(samples) if samples.len() == 2));
        assert!(matches!(&all["worker-1"], NodeStatus::Latest(sample) if sample.seq_no == 7));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unknown_node_maps_to_client_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/pfpstatus/missing")
            .with_status(422)
            .with_body("unknown node name")
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let err = client.node_status("missing").await.unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ClientError>(),
            Some(ClientError::UnknownNode(node)) if node == "missing"
        ));
    }

    #[tokio::test]
    async fn test_other_errors_keep_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/pfpstatus")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let err = client.node_count().await.unwrap_err();

        assert!(err.to_string().contains("500"));
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let client = ApiClient::new("http://scheduler.local:33445/debug/").unwrap();
        let url = client.endpoint(&["pfpstatus", "worker-0"]).unwrap();
        assert_eq!(url.as_str(), "http://scheduler.local:33445/debug/pfpstatus/worker-0");

        let client = ApiClient::new("http://scheduler.local:33445").unwrap();
        let url = client.endpoint(&["pfpstatus"]).unwrap();
        assert_eq!(url.as_str(), "http://scheduler.local:33445/pfpstatus");
    }

    #[test]
    fn test_invalid_url_rejected() {
        assert!(ApiClient::new("not a url").is_err());
        assert!(ApiClient::new("mailto:ops@example.com").is_err());
    }
}
