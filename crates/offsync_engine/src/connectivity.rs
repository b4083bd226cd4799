//! Connectivity and network transport seams.
//!
//! The engine never talks to the network directly; it goes through the
//! [`FetchClient`] trait and asks the [`ConnectivityOracle`] whether the
//! device is online. Both have mock implementations for tests.

use crate::error::{EngineError, EngineResult};
use offsync_http::{Request, Response};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

/// Reports whether the device currently has network connectivity.
pub trait ConnectivityOracle: Send + Sync {
    /// True if the device is online.
    fn is_online(&self) -> bool;
}

/// A [`ConnectivityOracle`] backed by a settable flag.
#[derive(Debug)]
pub struct NetworkStatus {
    online: AtomicBool,
}

impl NetworkStatus {
    /// Creates a status with the given initial state.
    pub fn new(online: bool) -> Self {
        Self {
            online: AtomicBool::new(online),
        }
    }

    /// Flips the connectivity state.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }
}

impl Default for NetworkStatus {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ConnectivityOracle for NetworkStatus {
    fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}

/// The network transport.
///
/// Implement this over your HTTP stack of choice; the engine only needs
/// one blocking call. Transport-level failures (connection refused, DNS,
/// resets) are reported as [`EngineError::Fetch`]; an HTTP error status is
/// a successful fetch and comes back as a [`Response`].
pub trait FetchClient: Send + Sync {
    /// Performs the request against the network.
    fn fetch(&self, request: &Request) -> EngineResult<Response>;
}

/// Runs `client.fetch` with a deadline.
///
/// The fetch runs on a helper thread; if it does not produce a result
/// within `timeout`, [`EngineError::Timeout`] is returned and the helper
/// thread is left to finish in the background.
pub fn fetch_with_timeout(
    client: &Arc<dyn FetchClient>,
    request: &Request,
    timeout: Duration,
) -> EngineResult<Response> {
    let (tx, rx) = mpsc::channel();
    let client = Arc::clone(client);
    let request = request.clone();
    std::thread::spawn(move || {
        let _ = tx.send(client.fetch(&request));
    });
    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(_) => Err(EngineError::Timeout),
    }
}

/// A scripted [`FetchClient`] for tests.
///
/// Responses and errors are queued in call order; every request is
/// recorded for later assertions.
#[derive(Default)]
pub struct MockFetchClient {
    queue: Mutex<VecDeque<EngineResult<Response>>>,
    requests: Mutex<Vec<Request>>,
}

impl MockFetchClient {
    /// Creates an empty mock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a response for the next unanswered fetch.
    pub fn push_response(&self, response: Response) {
        self.queue.lock().push_back(Ok(response));
    }

    /// Queues a transport failure.
    pub fn push_failure(&self, message: impl Into<String>) {
        self.queue.lock().push_back(Err(EngineError::fetch(message)));
    }

    /// Every request that has been fetched so far.
    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().clone()
    }

    /// Number of fetches performed.
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

impl FetchClient for MockFetchClient {
    fn fetch(&self, request: &Request) -> EngineResult<Response> {
        self.requests.lock().push(request.clone());
        self.queue
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(EngineError::fetch("no mock response queued")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_status_flips() {
        let status = NetworkStatus::new(true);
        assert!(status.is_online());
        status.set_online(false);
        assert!(!status.is_online());
    }

    #[test]
    fn mock_client_replays_in_order() {
        let client = MockFetchClient::new();
        client.push_response(Response::new(200, "OK"));
        client.push_failure("connection reset");

        let request = Request::get("https://example.com");
        assert_eq!(client.fetch(&request).unwrap().status, 200);
        assert!(matches!(
            client.fetch(&request),
            Err(EngineError::Fetch(_))
        ));
        // queue exhausted
        assert!(client.fetch(&request).is_err());
        assert_eq!(client.request_count(), 3);
    }

    #[test]
    fn timeout_fires_when_fetch_blocks() {
        struct BlockingClient;
        impl FetchClient for BlockingClient {
            fn fetch(&self, _request: &Request) -> EngineResult<Response> {
                std::thread::sleep(Duration::from_secs(5));
                Ok(Response::ok())
            }
        }

        let client: Arc<dyn FetchClient> = Arc::new(BlockingClient);
        let result = fetch_with_timeout(
            &client,
            &Request::options("https://example.com"),
            Duration::from_millis(20),
        );
        assert!(matches!(result, Err(EngineError::Timeout)));
    }

    #[test]
    fn timeout_passes_through_fast_fetch() {
        let mock = Arc::new(MockFetchClient::new());
        mock.push_response(Response::ok());
        let client: Arc<dyn FetchClient> = mock;
        let result = fetch_with_timeout(
            &client,
            &Request::options("https://example.com"),
            Duration::from_secs(1),
        );
        assert!(result.unwrap().is_ok());
    }
}
