use alloy::primitives::Address;

/// Events committed by a specific engine operation.
#[derive(Debug)]
pub struct BlockEvents<T> {
    instant: super::StateInstant,
    events: Vec<T>,
}

/// Event along with the context it was emitted in.
#[derive(Clone, Debug)]
pub struct EventContext<T> {
    pub(crate) instant: super::StateInstant,
    pub(crate) log_index: u64,
    pub(crate) emitter: Address,
    pub(crate) event: T,
}

impl<T> BlockEvents<T> {
    pub(crate) fn new(instant: super::StateInstant, events: Vec<T>) -> Self {
        Self { instant, events }
    }

    /// Instant the events were produced at.
    pub fn instant(&self) -> super::StateInstant {
        self.instant
    }

    pub fn events(&self) -> &[T] {
        &self.events
    }
}

impl<T> EventContext<T> {
    pub(crate) fn new(
        instant: super::StateInstant,
        log_index: u64,
        emitter: Address,
        event: T,
    ) -> Self {
        Self {
            instant,
            log_index,
            emitter,
            event,
        }
    }

    pub fn instant(&self) -> super::StateInstant {
        self.instant
    }

    /// Position of the event within the whole engine log.
    pub fn log_index(&self) -> u64 {
        self.log_index
    }

    /// Address of the set that emitted the event.
    pub fn emitter(&self) -> Address {
        self.emitter
    }

    pub fn event(&self) -> &T {
        &self.event
    }
}
