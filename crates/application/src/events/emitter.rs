use super::RelayEvent;
use tokio::sync::mpsc;

/// Fire-and-forget sink for relay events. A disabled emitter drops everything.
#[derive(Clone)]
pub struct RelayEventEmitter {
    sender: Option<mpsc::UnboundedSender<RelayEvent>>,
}

impl RelayEventEmitter {
    pub fn new_disabled() -> Self {
        Self { sender: None }
    }

    pub fn new_enabled() -> (Self, mpsc::UnboundedReceiver<RelayEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let emitter = Self { sender: Some(tx) };
        (emitter, rx)
    }

    pub fn emit(&self, event: RelayEvent) {
        if let Some(ref tx) = self.sender {
            let _ = tx.send(event);
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.sender.is_some()
    }
}

impl Default for RelayEventEmitter {
    fn default() -> Self {
        Self::new_disabled()
    }
}

impl std::fmt::Debug for RelayEventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayEventEmitter")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}
