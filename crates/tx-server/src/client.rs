//! HTTP client for a running Tractatus server, used by the CLI.

use anyhow::{bail, Context, Result};
use futures_util::stream::{self, BoxStream, StreamExt};
use serde::Deserialize;
use std::collections::VecDeque;
use std::path::Path;
use tx_core::{ChatRequestBody, TractatusRequest};
use tx_llm::{PartDecoder, StreamPart};

/// Parts read back from a data stream response.
pub type ClientPartStream = BoxStream<'static, Result<StreamPart>>;

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UploadBody {
    text: String,
}

#[derive(Debug, Clone)]
pub struct TractatusClient {
    http: reqwest::Client,
    base_url: String,
}

impl TractatusClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Upload a document and return its extracted text.
    pub async fn upload(&self, path: &Path) -> Result<String> {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        self.upload_bytes(name, bytes).await
    }

    pub async fn upload_bytes(&self, file_name: String, bytes: Vec<u8>) -> Result<String> {
        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name);
        let form = reqwest::multipart::Form::new().part("file", part);
        let resp = self
            .http
            .post(self.url("/api/upload"))
            .multipart(form)
            .send()
            .await
            .context("sending upload")?;
        let resp = check(resp).await?;
        let body: UploadBody = resp.json().await.context("decoding upload response")?;
        Ok(body.text)
    }

    /// Start a generation and stream its parts.
    pub async fn generate(&self, request: &TractatusRequest) -> Result<ClientPartStream> {
        self.post_stream("/api/tractatus", request).await
    }

    /// Send a chat turn and stream the reply's parts.
    pub async fn chat(&self, body: &ChatRequestBody) -> Result<ClientPartStream> {
        self.post_stream("/api/chat", body).await
    }

    async fn post_stream<T: serde::Serialize>(&self, path: &str, body: &T) -> Result<ClientPartStream> {
        let resp = self
            .http
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .with_context(|| format!("sending request to {path}"))?;
        let resp = check(resp).await?;
        Ok(part_stream(Box::pin(resp.bytes_stream())))
    }
}

/// Turn non-2xx responses into errors carrying the server's message.
async fn check(resp: reqwest::Response) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let raw = resp.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorBody>(&raw) {
        Ok(ErrorBody { error, message: Some(m) }) => bail!("{status}: {error}: {m}"),
        Ok(ErrorBody { error, message: None }) => bail!("{status}: {error}"),
        Err(_) if raw.is_empty() => bail!("{status}"),
        Err(_) => bail!("{status}: {raw}"),
    }
}

fn part_stream<S>(bytes: S) -> ClientPartStream
where
    S: futures_util::Stream<Item = reqwest::Result<bytes::Bytes>> + Send + Unpin + 'static,
{
    let state = (bytes, PartDecoder::new(), VecDeque::new(), false);
    Box::pin(stream::unfold(
        state,
        |(mut bytes, mut decoder, mut pending, mut done)| async move {
            loop {
                if let Some(item) = pending.pop_front() {
                    return Some((item, (bytes, decoder, pending, done)));
                }
                if done {
                    return None;
                }
                match bytes.next().await {
                    Some(Ok(chunk)) => pending.extend(
                        decoder
                            .push(&chunk)
                            .into_iter()
                            .map(|r| r.map_err(anyhow::Error::from)),
                    ),
                    Some(Err(e)) => {
                        done = true;
                        pending.push_back(Err(anyhow::Error::from(e).context("reading stream")));
                    }
                    None => {
                        done = true;
                        pending.extend(decoder.finish().map(|r| r.map_err(anyhow::Error::from)));
                    }
                }
            }
        },
    ))
}
