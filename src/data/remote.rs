//! Remote acronym server client
//!
//! Fetches the expansions of an acronym over HTTP and maps every transport or
//! protocol failure to a `StatusKind`. The response body is handed to the
//! parser chunk by chunk as it arrives.

use std::io::{self, BufRead, Read};

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::parser::{parse, ParseError};
use super::{AcronymRecord, ResolutionResult, StatusKind};
use crate::config::ResolverConfig;

/// Body chunks buffered between the download and the parser
const CHUNK_QUEUE: usize = 16;

/// Something that can look up acronym expansions remotely
#[async_trait]
pub trait AcronymSource: Send + Sync {
    /// Fetches every expansion of `name`
    ///
    /// Never fails with an error: failures are reported through the
    /// result's `status`.
    async fn fetch(&self, name: &str) -> ResolutionResult;
}

/// Client for the acronym server
#[derive(Debug, Clone)]
pub struct RemoteClient {
    /// HTTP client for making requests
    http_client: Client,
    /// Base URL; the acronym is appended as the query string
    endpoint: String,
}

impl RemoteClient {
    /// Creates a client using the endpoint and timeouts from `config`
    pub fn new(config: &ResolverConfig) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            http_client,
            endpoint: config.endpoint.clone(),
        })
    }

    /// Builds the request URL for `name`
    ///
    /// `name` is expected to be sanitized already and is appended verbatim.
    fn url(&self, name: &str) -> String {
        format!("{}?{}", self.endpoint, name)
    }
}

/// Maps an error raised before any response headers were read
///
/// Only failures to open a connection (refused, DNS, connect timeout) or to
/// build the request count as unreachable. Anything after the connection
/// exists has no status to report.
fn send_failure(e: &reqwest::Error) -> StatusKind {
    if e.is_connect() || e.is_builder() {
        StatusKind::NetworkUnreachable
    } else {
        StatusKind::CommunicationFailure { http_status: None }
    }
}

#[async_trait]
impl AcronymSource for RemoteClient {
    async fn fetch(&self, name: &str) -> ResolutionResult {
        let url = self.url(name);
        debug!("Fetching {}", url);

        let response = match self.http_client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                let status = send_failure(&e);
                warn!("Acronym server request failed ({}): {}", status, e);
                return ResolutionResult::failure(status);
            }
        };

        let status = response.status().as_u16();
        debug!("Acronym server answered HTTP {}", status);

        if !response.status().is_success() {
            return ResolutionResult::failure(StatusKind::CommunicationFailure {
                http_status: Some(status),
            });
        }

        let (tx, rx) = mpsc::channel(CHUNK_QUEUE);
        let parser = tokio::task::spawn_blocking(move || parse(ChunkReader::new(rx)));

        let mut read_error = None;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(chunk) => {
                    // The parser hung up early: it already has its answer
                    if tx.send(chunk.to_vec()).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    read_error = Some(e);
                    break;
                }
            }
        }
        drop(tx);

        let parsed: Result<Vec<AcronymRecord>, ParseError> = match parser.await {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Response parser task failed: {}", e);
                return ResolutionResult::failure(StatusKind::ParseFailure)
                    .with_http_status(status);
            }
        };

        if let Some(e) = read_error {
            warn!("Did not receive a complete response: {}", e);
            return ResolutionResult::failure(StatusKind::CommunicationFailure {
                http_status: Some(status),
            });
        }

        match parsed {
            Ok(records) => {
                debug!("Parsed {} expansion(s) for {}", records.len(), name);
                ResolutionResult::success(records).with_http_status(status)
            }
            Err(e) => {
                warn!("Cannot parse the acronym server response: {}", e);
                ResolutionResult::failure(StatusKind::ParseFailure).with_http_status(status)
            }
        }
    }
}

/// Blocking reader over body chunks sent from the async side
///
/// Reports end of input once the sender is dropped.
struct ChunkReader {
    chunks: mpsc::Receiver<Vec<u8>>,
    current: Vec<u8>,
    pos: usize,
}

impl ChunkReader {
    fn new(chunks: mpsc::Receiver<Vec<u8>>) -> Self {
        Self {
            chunks,
            current: Vec::new(),
            pos: 0,
        }
    }
}

impl Read for ChunkReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let available = self.fill_buf()?;
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.consume(n);
        Ok(n)
    }
}

impl BufRead for ChunkReader {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        while self.pos >= self.current.len() {
            match self.chunks.blocking_recv() {
                Some(chunk) => {
                    self.current = chunk;
                    self.pos = 0;
                }
                None => return Ok(&[]),
            }
        }
        Ok(&self.current[self.pos..])
    }

    fn consume(&mut self, amt: usize) {
        self.pos = (self.pos + amt).min(self.current.len());
    }
}
