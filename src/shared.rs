//! Engine shared between concurrent tasks.

use std::sync::Arc;

use tokio::sync::{RwLock, RwLockReadGuard, broadcast};
use tracing::warn;

use crate::{
    error::Result,
    state::{Engine, LoggedEvent, OperationEvents},
};

const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Single-writer, multi-reader handle to an [`Engine`].
///
/// Readers observe a consistent snapshot while they hold the read guard. Events
/// committed through [`SharedEngine::execute`] are published to subscribers in log
/// order.
#[derive(Clone, Debug)]
pub struct SharedEngine {
    engine: Arc<RwLock<Engine>>,
    events: broadcast::Sender<LoggedEvent>,
}

impl SharedEngine {
    pub fn new(engine: Engine) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            engine: Arc::new(RwLock::new(engine)),
            events,
        }
    }

    /// Subscribes to events committed from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<LoggedEvent> {
        self.events.subscribe()
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, Engine> {
        self.engine.read().await
    }

    /// Runs an engine operation under the write lock and publishes the events it
    /// committed.
    pub async fn execute<T>(
        &self,
        operation: impl FnOnce(&mut Engine) -> Result<T>,
    ) -> Result<(T, OperationEvents)> {
        let mut engine = self.engine.write().await;
        let from = engine.log().len();
        match operation(&mut *engine) {
            Ok(value) => {
                let committed = engine.events_since(from).to_vec();
                for event in &committed {
                    // No subscribers is fine
                    let _ = self.events.send(event.clone());
                }
                Ok((value, OperationEvents::new(engine.instant(), committed)))
            }
            Err(err) => {
                warn!(%err, "operation rejected");
                Err(err)
            }
        }
    }
}
