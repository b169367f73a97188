use crate::engine::{EngineCommand, EngineRecord, NegotiationState, RecordSnapshot};
use std::sync::Arc;
use tandem_core::ParticipantId;
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;

pub struct EngineHandle {
    pub(crate) command_tx: mpsc::Sender<EngineCommand>,
    pub(crate) record: Arc<Mutex<EngineRecord>>,
    pub(crate) state_rx: watch::Receiver<NegotiationState>,
    pub(crate) task: JoinHandle<()>,
}

impl EngineHandle {
    pub fn observer(&self, remote: ParticipantId) -> EngineObserver {
        EngineObserver {
            remote,
            record: Arc::clone(&self.record),
            state_rx: self.state_rx.clone(),
        }
    }
}

/// Read-only view on a running engine.
#[derive(Clone)]
pub struct EngineObserver {
    remote: ParticipantId,
    record: Arc<Mutex<EngineRecord>>,
    state_rx: watch::Receiver<NegotiationState>,
}

impl EngineObserver {
    pub fn remote(&self) -> ParticipantId {
        self.remote
    }

    pub fn state(&self) -> NegotiationState {
        *self.state_rx.borrow()
    }

    /// Resolves once the engine reports `target`. False if the engine is gone.
    pub async fn wait_for(&self, target: NegotiationState) -> bool {
        let mut state_rx = self.state_rx.clone();
        state_rx.wait_for(|state| *state == target).await.is_ok()
    }

    /// Waits for the current negotiation step to finish, then copies the record.
    pub async fn snapshot(&self) -> RecordSnapshot {
        self.record.lock().await.snapshot()
    }
}
