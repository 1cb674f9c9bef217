// src/errors.rs
use thiserror::Error;

use crate::tx::TxEvent;

/// Failures raised by a [`crate::dapp::Dapp`] collaborator.
#[derive(Debug, Clone, Error)]
pub enum DappError {
    #[error("wallet unavailable: {0}")]
    WalletUnavailable(String),
    #[error("wrong network: expected chain {expected}, provider reports {actual}")]
    WrongNetwork { expected: u64, actual: u64 },
    #[error("contract binding failed: {0}")]
    Binding(String),
    #[error("contract call failed: {0}")]
    Contract(String),
    #[error("provider error: {0}")]
    Provider(String),
    #[error("invalid amount `{0}`")]
    InvalidAmount(String),
    #[error("transaction {0} reverted")]
    Reverted(String),
    #[error("transaction {0} dropped from mempool")]
    Dropped(String),
    #[error("contracts not initialized")]
    NotInitialized,
    #[error("price feed error: {0}")]
    PriceFeed(String),
}

pub type DappResult<T> = Result<T, DappError>;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("a transaction is already pending")]
    Busy,
    #[error("wallet is not connected")]
    NotConnected,
    #[error("popup event {0:?} not allowed in the current state")]
    Rejected(TxEvent),
}

pub type DashboardResult<T> = Result<T, DashboardError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
    #[error("invalid deployment file: {0}")]
    Deployment(String),
}
