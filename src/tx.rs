// src/tx.rs
//! Lifecycle of the single in-flight transaction shown in the popup.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use tracing::warn;

use crate::errors::{DashboardError, DashboardResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    #[default]
    Idle,
    Pending,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxEvent {
    Show,
    SetHash(String),
    Success,
    Error(String),
    Dismiss,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TxPopupState {
    pub visible: bool,
    pub tx_hash: Option<String>,
    pub status: TxStatus,
    pub error_message: Option<String>,
}

impl TxPopupState {
    /// Returns the state after `event`, or `None` when the event is not
    /// permitted from the current status.
    pub fn transition(&self, event: &TxEvent) -> Option<TxPopupState> {
        match (self.status, event) {
            (_, TxEvent::Show) => Some(TxPopupState {
                visible: true,
                tx_hash: None,
                status: TxStatus::Pending,
                error_message: None,
            }),
            (TxStatus::Pending, TxEvent::SetHash(hash)) => Some(TxPopupState {
                tx_hash: Some(hash.clone()),
                ..self.clone()
            }),
            (TxStatus::Pending, TxEvent::Success) => Some(TxPopupState {
                status: TxStatus::Success,
                ..self.clone()
            }),
            (TxStatus::Pending, TxEvent::Error(message)) => Some(TxPopupState {
                status: TxStatus::Error,
                error_message: Some(message.clone()),
                ..self.clone()
            }),
            (TxStatus::Success | TxStatus::Error, TxEvent::Dismiss) => Some(TxPopupState::default()),
            _ => None,
        }
    }

    /// Pure reducer: rejected events leave the state as it was.
    pub fn reduce(self, event: &TxEvent) -> TxPopupState {
        self.transition(event).unwrap_or(self)
    }

    pub fn is_pending(&self) -> bool {
        self.status == TxStatus::Pending
    }
}

/// Shared handle to the popup state. Clones observe the same cell.
#[derive(Clone, Default)]
pub struct TxPopup {
    state: Arc<RwLock<TxPopupState>>,
}

impl TxPopup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> TxPopupState {
        self.state.read().clone()
    }

    pub fn dispatch(&self, event: TxEvent) -> DashboardResult<TxPopupState> {
        let mut state = self.state.write();
        match state.transition(&event) {
            Some(next) => {
                *state = next.clone();
                Ok(next)
            }
            None => {
                warn!(?event, status = ?state.status, "popup event rejected");
                Err(DashboardError::Rejected(event))
            }
        }
    }

    /// Opens a new pending episode unless one is already running.
    pub fn begin(&self) -> DashboardResult<()> {
        let mut state = self.state.write();
        if state.is_pending() {
            return Err(DashboardError::Busy);
        }
        *state = state.clone().reduce(&TxEvent::Show);
        Ok(())
    }
}
