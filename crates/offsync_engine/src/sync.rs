//! Replaying the sync log.

use crate::connectivity::fetch_with_timeout;
use crate::context::EngineContext;
use crate::error::{EngineError, EngineResult};
use crate::events::{ListenerId, ListenerRegistry, SyncAction, SyncEvent, SyncEventListener, SyncEventType};
use crate::sync_log::SyncLog;
use offsync_http::{Request, Response};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Whether a sync cycle is currently running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// No cycle in progress.
    Idle,
    /// A cycle is replaying the log.
    Syncing,
}

/// Per-cycle sync configuration.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Substring of URLs that should be preflighted with an OPTIONS
    /// probe before replay; `None` disables preflight.
    pub preflight_url_pattern: Option<String>,
    /// Probe deadline. A timed-out probe fails the entry being replayed.
    pub preflight_timeout: Duration,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            preflight_url_pattern: None,
            preflight_timeout: Duration::from_secs(60),
        }
    }
}

impl SyncOptions {
    /// Creates the default options (no preflight).
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables preflight for URLs containing `pattern`.
    pub fn with_preflight_url_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.preflight_url_pattern = Some(pattern.into());
        self
    }

    /// Sets the probe deadline.
    pub fn with_preflight_timeout(mut self, timeout: Duration) -> Self {
        self.preflight_timeout = timeout;
        self
    }
}

/// Single-flight replay of the sync log.
///
/// Entries are replayed strictly one at a time, mutations before reads,
/// oldest first within each class. A server rejection (status 400 or
/// above), a transport failure, or a preflight timeout aborts the cycle
/// and leaves the failing entry and everything after it in the log.
pub struct SyncEngine {
    ctx: Arc<EngineContext>,
    log: Arc<SyncLog>,
    listeners: ListenerRegistry,
    state: Mutex<SyncState>,
}

impl SyncEngine {
    /// Creates an engine over the given context and log.
    pub fn new(ctx: Arc<EngineContext>, log: Arc<SyncLog>) -> Self {
        Self {
            ctx,
            log,
            listeners: ListenerRegistry::new(),
            state: Mutex::new(SyncState::Idle),
        }
    }

    /// The sync log being replayed.
    pub fn log(&self) -> &Arc<SyncLog> {
        &self.log
    }

    /// The current replay state.
    pub fn state(&self) -> SyncState {
        *self.state.lock()
    }

    /// Registers a lifecycle listener. See [`ListenerRegistry::add_listener`].
    pub fn add_listener(
        &self,
        event_type: SyncEventType,
        listener: Arc<dyn SyncEventListener>,
        url_filter: Option<&str>,
    ) -> ListenerId {
        self.listeners.add_listener(event_type, listener, url_filter)
    }

    /// Removes a lifecycle listener.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners.remove_listener(id)
    }

    /// Replays the log.
    ///
    /// Fails immediately with [`EngineError::SyncInProgress`] if a cycle
    /// is already running. Offline, resolves without doing any work.
    pub fn sync(&self, options: &SyncOptions) -> EngineResult<()> {
        {
            let mut state = self.state.lock();
            if *state == SyncState::Syncing {
                return Err(EngineError::SyncInProgress);
            }
            *state = SyncState::Syncing;
        }
        // reset on every exit path, including an unwinding listener
        struct IdleOnDrop<'a>(&'a Mutex<SyncState>);
        impl Drop for IdleOnDrop<'_> {
            fn drop(&mut self) {
                *self.0.lock() = SyncState::Idle;
            }
        }
        let _reset = IdleOnDrop(&self.state);
        self.run_cycle(options)
    }

    fn run_cycle(&self, options: &SyncOptions) -> EngineResult<()> {
        if !self.ctx.is_online() {
            debug!("offline, skipping sync");
            return Ok(());
        }
        let entries = self.log.entries()?;
        if entries.is_empty() {
            return Ok(());
        }
        info!(pending = entries.len(), "starting sync cycle");

        // mutations first, reads last, insertion order within each class
        let (mutations, reads): (Vec<_>, Vec<_>) = entries
            .into_iter()
            .partition(|e| !e.request.method.is_read());

        let mut probed_hosts = HashSet::new();
        for entry in mutations.into_iter().chain(reads) {
            let id = entry.request_id;
            let mut request = entry.request;

            let event = SyncEvent {
                request_id: id.clone(),
                request: request.clone(),
                response: None,
            };
            match self.listeners.dispatch(SyncEventType::BeforeSyncRequest, &event)? {
                Some(SyncAction::Stop) => {
                    debug!(request_id = %id, "listener stopped sync cycle");
                    return Ok(());
                }
                Some(SyncAction::Skip) => {
                    self.log.remove(&id)?;
                    continue;
                }
                Some(SyncAction::Replay(substitute)) => request = substitute,
                None => {}
            }

            self.preflight(&id, &request, options, &mut probed_hosts)?;

            let response = match self.ctx.fetch(&request) {
                Ok(response) => response,
                Err(err) => {
                    return Err(EngineError::sync_failed(err.to_string(), id, request, None))
                }
            };
            if response.status >= 400 {
                return Err(EngineError::sync_failed(
                    response.status_text.clone(),
                    id,
                    request,
                    Some(response),
                ));
            }

            let event = SyncEvent {
                request_id: id.clone(),
                request: request.clone(),
                response: Some(response.clone()),
            };
            if let Some(SyncAction::Stop) =
                self.listeners.dispatch(SyncEventType::SyncRequest, &event)?
            {
                return Ok(());
            }

            self.log.remove(&id)?;
            if request.method.is_read() {
                self.ctx.default_cache()?.put(&request, &response)?;
            }
            debug!(request_id = %id, url = %request.url, "replayed request");
        }
        Ok(())
    }

    /// Probes reachability with an OPTIONS request, once per host per
    /// cycle. A rejected probe still counts as reachable (servers may
    /// simply refuse OPTIONS); only a timeout fails the entry.
    fn preflight(
        &self,
        id: &str,
        request: &Request,
        options: &SyncOptions,
        probed_hosts: &mut HashSet<String>,
    ) -> EngineResult<()> {
        let Some(pattern) = &options.preflight_url_pattern else {
            return Ok(());
        };
        if !request.url.contains(pattern.as_str()) {
            return Ok(());
        }
        let host = request.host().unwrap_or_else(|| request.url.clone());
        if probed_hosts.contains(&host) {
            return Ok(());
        }
        let probe = Request::options(request.url.clone());
        match fetch_with_timeout(self.ctx.client(), &probe, options.preflight_timeout) {
            Err(EngineError::Timeout) => Err(EngineError::sync_failed(
                "Preflight OPTIONS request timed out",
                id,
                request.clone(),
                Some(Response::new(504, "Preflight OPTIONS request timed out")),
            )),
            _ => {
                probed_hosts.insert(host);
                Ok(())
            }
        }
    }
}
