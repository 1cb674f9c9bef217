// src/dapp.rs
//! Seam between the dashboard and whatever talks to the chain.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::errors::DappResult;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserData {
    pub user_address: String,
    pub user_coin: String,
    pub user_token: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChainData {
    pub token_total_supply: String,
    pub bank_coin_balance: String,
    pub bank_coin_balance_usd: String,
    pub bank_coin_price: String,
    pub coingecko_price: Option<String>,
    pub rebase: bool,
}

type Confirmation = Pin<Box<dyn Future<Output = DappResult<()>> + Send + 'static>>;

/// A broadcast transaction awaiting confirmation.
pub struct PendingTx {
    pub hash: String,
    confirmation: Confirmation,
}

impl PendingTx {
    pub fn new<F>(hash: impl Into<String>, confirmation: F) -> Self
    where
        F: Future<Output = DappResult<()>> + Send + 'static,
    {
        Self {
            hash: hash.into(),
            confirmation: Box::pin(confirmation),
        }
    }

    /// Resolves once the transaction is mined successfully.
    pub async fn wait(self) -> DappResult<()> {
        self.confirmation.await
    }
}

impl fmt::Debug for PendingTx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingTx").field("hash", &self.hash).finish_non_exhaustive()
    }
}

#[async_trait]
pub trait Dapp: Send + Sync {
    /// Connects the signing wallet and checks the network.
    async fn load_wallet(&self) -> DappResult<()>;

    async fn init_contracts(&self) -> DappResult<()>;

    async fn get_user_data(&self) -> DappResult<UserData>;

    async fn get_chain_data(&self) -> DappResult<ChainData>;

    fn chain_name(&self) -> String;

    /// Periodic protocol maintenance; safe to call repeatedly.
    async fn trigger_bot(&self) -> DappResult<()>;

    async fn coin_to_token(&self, amount: &str) -> DappResult<String>;

    async fn token_to_coin(&self, amount: &str) -> DappResult<String>;

    async fn mint(&self, amount: &str) -> DappResult<PendingTx>;

    async fn burn(&self, amount: &str) -> DappResult<PendingTx>;

    async fn rebase(&self) -> DappResult<PendingTx>;
}

/// Produces a fresh collaborator each time the dashboard (re)initializes.
pub type DappFactory = Arc<dyn Fn() -> Arc<dyn Dapp> + Send + Sync>;
