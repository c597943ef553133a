//! Shared utilities for integration tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use job_tracker_api::config::{self, ServiceConfig, SharedConfig};
use job_tracker_api::database::{ConnectOptions, Transport, TransportError, TransportEvent};
use tokio::sync::broadcast;

/// Transport whose attempts follow a script. A scripted success publishes
/// `Connecting` then `Connected`; a failure publishes `Connecting` then
/// `Disconnected`, like a driver giving up on server selection.
pub struct ScriptedTransport {
    events: broadcast::Sender<TransportEvent>,
    outcomes: Mutex<VecDeque<Result<(), TransportError>>>,
    attempts: Mutex<usize>,
}

#[allow(dead_code)]
impl ScriptedTransport {
    pub fn new(outcomes: Vec<Result<(), TransportError>>) -> Arc<Self> {
        let (events, _) = broadcast::channel(16);
        Arc::new(Self {
            events,
            outcomes: Mutex::new(outcomes.into()),
            attempts: Mutex::new(0),
        })
    }

    pub fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap()
    }

    /// Publish an event as if the driver had observed it.
    pub fn emit(&self, event: TransportEvent) {
        let _ = self.events.send(event);
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn connect(&self, _url: &str, _options: &ConnectOptions) -> Result<(), TransportError> {
        *self.attempts.lock().unwrap() += 1;
        self.emit(TransportEvent::Connecting);
        let outcome = self
            .outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Other("connect ECONNREFUSED 10.0.0.5:27017".into())));
        match outcome {
            Ok(()) => self.emit(TransportEvent::Connected),
            Err(_) => self.emit(TransportEvent::Disconnected),
        }
        outcome
    }

    fn subscribe(&self) -> broadcast::Receiver<TransportEvent> {
        self.events.subscribe()
    }

    async fn close(&self) {
        self.emit(TransportEvent::Disconnecting);
        self.emit(TransportEvent::Disconnected);
    }
}

/// Config pointing at `url`, with an override variable nobody sets.
#[allow(dead_code)]
pub fn config_with_url(url: Option<&str>) -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.database.url = url.map(str::to_string);
    config.database.url_env = "JOB_TRACKER_INTEGRATION_UNSET".into();
    config
}

#[allow(dead_code)]
pub fn shared_with_url(url: Option<&str>) -> SharedConfig {
    config::shared(config_with_url(url))
}

/// Poll `condition` every 20ms until it holds or `limit` elapses.
#[allow(dead_code)]
pub async fn wait_for<F>(limit: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + limit;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    condition()
}
