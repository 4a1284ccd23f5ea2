//! Single-flight background worker
//!
//! Runs a `Resolver` on its own tokio task and feeds it requests through a
//! channel. Requests are handled one at a time in arrival order, so two
//! lookups of the same acronym never hit the network concurrently and cache
//! replacements never interleave.

use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::data::ResolutionResult;
use crate::resolver::Resolver;

/// Number of requests that may wait in the queue
const QUEUE_CAPACITY: usize = 32;

/// Errors talking to the worker
#[derive(Debug, Error)]
pub enum WorkerError {
    /// The worker task has stopped
    #[error("Resolver worker is no longer running")]
    Closed,
}

/// A queued request and where to send its result
enum Job {
    Resolve {
        name: String,
        ttl: Option<Duration>,
        reply: oneshot::Sender<ResolutionResult>,
    },
    ListAll {
        reply: oneshot::Sender<ResolutionResult>,
    },
    Clear {
        reply: oneshot::Sender<ResolutionResult>,
    },
}

/// Handle for submitting requests to the background worker
pub struct ResolverHandle {
    sender: mpsc::Sender<Job>,
    task: JoinHandle<()>,
}

impl ResolverHandle {
    /// Moves `resolver` onto a new background task
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(resolver: Resolver) -> Self {
        let (sender, mut receiver) = mpsc::channel::<Job>(QUEUE_CAPACITY);

        let task = tokio::spawn(async move {
            while let Some(job) = receiver.recv().await {
                // A caller that stopped waiting does not cancel its job
                match job {
                    Job::Resolve { name, ttl, reply } => {
                        let result = match ttl {
                            Some(ttl) => resolver.resolve_with_ttl(&name, ttl).await,
                            None => resolver.resolve(&name).await,
                        };
                        let _ = reply.send(result);
                    }
                    Job::ListAll { reply } => {
                        let _ = reply.send(resolver.list_all());
                    }
                    Job::Clear { reply } => {
                        let _ = reply.send(resolver.clear());
                    }
                }
            }
            debug!("Resolver worker stopped");
        });

        Self { sender, task }
    }

    /// Resolves `name` with the resolver's configured TTL
    pub async fn resolve(&self, name: impl Into<String>) -> Result<ResolutionResult, WorkerError> {
        let name = name.into();
        self.submit(|reply| Job::Resolve {
            name,
            ttl: None,
            reply,
        })
        .await
    }

    /// Resolves `name` with an explicit TTL
    pub async fn resolve_with_ttl(
        &self,
        name: impl Into<String>,
        ttl: Duration,
    ) -> Result<ResolutionResult, WorkerError> {
        let name = name.into();
        self.submit(|reply| Job::Resolve {
            name,
            ttl: Some(ttl),
            reply,
        })
        .await
    }

    /// Lists every cached record
    pub async fn list_all(&self) -> Result<ResolutionResult, WorkerError> {
        self.submit(|reply| Job::ListAll { reply }).await
    }

    /// Empties the cache
    pub async fn clear(&self) -> Result<ResolutionResult, WorkerError> {
        self.submit(|reply| Job::Clear { reply }).await
    }

    /// Stops accepting requests and waits for queued ones to finish
    pub async fn shutdown(self) {
        drop(self.sender);
        let _ = self.task.await;
    }

    async fn submit(
        &self,
        make_job: impl FnOnce(oneshot::Sender<ResolutionResult>) -> Job,
    ) -> Result<ResolutionResult, WorkerError> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(make_job(reply))
            .await
            .map_err(|_| WorkerError::Closed)?;
        response.await.map_err(|_| WorkerError::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::SqliteStore;
    use crate::config::ResolverConfig;
    use crate::data::{AcronymRecord, AcronymSource, StatusKind};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Source that answers every name with one expansion after a short delay
    struct SlowSource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl AcronymSource for SlowSource {
        async fn fetch(&self, name: &str) -> ResolutionResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            ResolutionResult::success(vec![AcronymRecord::new(name, "Expansion")])
                .with_http_status(200)
        }
    }

    fn spawn_worker() -> (ResolverHandle, Arc<SlowSource>) {
        let store = Arc::new(SqliteStore::open_in_memory().expect("Failed to open store"));
        let source = Arc::new(SlowSource {
            calls: AtomicUsize::new(0),
        });
        let resolver = Resolver::new(store, source.clone(), ResolverConfig::default());
        (ResolverHandle::spawn(resolver), source)
    }

    #[tokio::test]
    async fn test_concurrent_resolves_fetch_once() {
        let (handle, source) = spawn_worker();

        let (first, second) = tokio::join!(handle.resolve("FAQ"), handle.resolve("FAQ"));

        assert_eq!(first.unwrap().records().len(), 1);
        assert_eq!(second.unwrap().records().len(), 1);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1, "Second resolve should hit the cache");
    }

    #[tokio::test]
    async fn test_requests_run_in_order() {
        let (handle, _source) = spawn_worker();

        let (resolved, listed) = tokio::join!(handle.resolve("FAQ"), handle.list_all());

        assert_eq!(resolved.unwrap().status, StatusKind::Ok);
        assert_eq!(listed.unwrap().records().len(), 1, "List should run after resolve");
    }

    #[tokio::test]
    async fn test_clear_through_worker() {
        let (handle, _source) = spawn_worker();
        handle.resolve("FAQ").await.unwrap();

        let cleared = handle.clear().await.unwrap();

        assert_eq!(cleared.records, Some(Vec::new()));
        assert!(handle.list_all().await.unwrap().records().is_empty());
    }

    #[tokio::test]
    async fn test_resolve_with_ttl_override() {
        let (handle, source) = spawn_worker();
        handle.resolve("FAQ").await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;

        let result = handle
            .resolve_with_ttl("FAQ", Duration::from_millis(1))
            .await
            .unwrap();

        assert_eq!(result.status, StatusKind::Ok);
        assert_eq!(source.calls.load(Ordering::SeqCst), 2, "Tiny TTL should force a refetch");
    }

    #[tokio::test]
    async fn test_dropped_caller_does_not_cancel_job() {
        let (handle, source) = spawn_worker();

        let abandoned = tokio::time::timeout(Duration::from_millis(1), handle.resolve("FAQ")).await;
        assert!(abandoned.is_err(), "Caller should give up before the fetch completes");

        let listed = handle.list_all().await.unwrap();
        assert_eq!(listed.records().len(), 1);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_shutdown_waits_for_queue() {
        let (handle, source) = spawn_worker();
        handle.resolve("FAQ").await.unwrap();

        handle.shutdown().await;

        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }
}
