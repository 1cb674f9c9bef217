// src/dashboard.rs
//! Ephemeral UI state and the actions that mutate it.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::dapp::{ChainData, Dapp, DappFactory, UserData};
use crate::errors::{DappError, DappResult, DashboardError, DashboardResult};
use crate::tx::{TxEvent, TxPopup, TxPopupState};
use crate::utils::{ZERO_AMOUNT, is_positive_amount, numeric_value};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Connection {
    #[default]
    Busy,
    Connected,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AmountInput {
    pub amount: String,
    pub preview: String,
}

impl Default for AmountInput {
    fn default() -> Self {
        Self {
            amount: String::new(),
            preview: ZERO_AMOUNT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TxAction {
    Mint,
    Burn,
    Rebase,
}

impl fmt::Display for TxAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TxAction::Mint => "mint",
            TxAction::Burn => "burn",
            TxAction::Rebase => "rebase",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AmountField {
    Mint,
    Burn,
}

/// How many units of coin buy one dollar's worth of token.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CoinWorth {
    Value(f64),
    Unavailable,
}

impl fmt::Display for CoinWorth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoinWorth::Value(value) => write!(f, "{}", value),
            CoinWorth::Unavailable => f.write_str(ZERO_AMOUNT),
        }
    }
}

impl Serialize for CoinWorth {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Reciprocal of `price`, truncated to four decimals.
pub fn coin_worth(price: Option<&str>) -> CoinWorth {
    match price.and_then(numeric_value) {
        Some(price) if price > 0.0 => CoinWorth::Value(((1.0 / price) * 10_000.0).floor() / 10_000.0),
        _ => CoinWorth::Unavailable,
    }
}

#[derive(Debug, Clone, Default)]
struct ViewState {
    connection: Connection,
    chain_name: String,
    user_data: UserData,
    chain_data: ChainData,
    mint: AmountInput,
    burn: AmountInput,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub connection: Connection,
    pub chain_name: String,
    pub user_data: UserData,
    pub chain_data: ChainData,
    pub mint: AmountInput,
    pub burn: AmountInput,
    pub coin_worth: CoinWorth,
    pub popup: TxPopupState,
}

#[derive(Serialize)]
struct TxFailure<'a> {
    action: TxAction,
    stage: &'a str,
    reason: String,
}

fn describe_failure(action: TxAction, stage: &str, err: &DappError) -> String {
    let failure = TxFailure {
        action,
        stage,
        reason: err.to_string(),
    };
    serde_json::to_string(&failure).unwrap_or_else(|_| format!("{action} failed at {stage}: {err}"))
}

pub struct Dashboard {
    factory: DappFactory,
    dapp: RwLock<Option<Arc<dyn Dapp>>>,
    popup: TxPopup,
    view: RwLock<ViewState>,
}

impl Dashboard {
    pub fn new(factory: DappFactory, popup: TxPopup) -> Self {
        Self {
            factory,
            dapp: RwLock::new(None),
            popup,
            view: RwLock::new(ViewState::default()),
        }
    }

    pub fn popup(&self) -> &TxPopup {
        &self.popup
    }

    /// The collaborator installed by the latest `init`.
    pub fn current_dapp(&self) -> Option<Arc<dyn Dapp>> {
        self.dapp.read().clone()
    }

    pub fn connection(&self) -> Connection {
        self.view.read().connection
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        let view = self.view.read().clone();
        let coin_worth = coin_worth(Some(view.chain_data.bank_coin_price.as_str()));
        DashboardSnapshot {
            connection: view.connection,
            chain_name: view.chain_name,
            user_data: view.user_data,
            chain_data: view.chain_data,
            mint: view.mint,
            burn: view.burn,
            coin_worth,
            popup: self.popup.snapshot(),
        }
    }

    /// Acquires a fresh collaborator and runs the connection sequence.
    pub async fn init(&self) -> Connection {
        let dapp = (self.factory)();
        *self.dapp.write() = Some(dapp.clone());
        self.view.write().connection = Connection::Busy;

        let outcome = Self::connect(dapp.as_ref()).await;

        if !self.is_current(&dapp) {
            info!("discarding result of superseded initialization");
            return self.connection();
        }

        let mut view = self.view.write();
        match outcome {
            Ok((user_data, chain_data)) => {
                view.user_data = user_data;
                view.chain_data = chain_data;
                view.chain_name = dapp.chain_name();
                view.connection = Connection::Connected;
                info!(chain = %view.chain_name, "dashboard connected");
            }
            Err(err) => {
                warn!(%err, "wallet connection failed");
                view.connection = Connection::Error;
            }
        }
        view.connection
    }

    fn is_current(&self, dapp: &Arc<dyn Dapp>) -> bool {
        self.dapp
            .read()
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(current, dapp))
    }

    pub async fn reconnect(&self) -> Connection {
        info!("reinitializing wallet connection");
        self.init().await
    }

    async fn connect(dapp: &dyn Dapp) -> DappResult<(UserData, ChainData)> {
        dapp.load_wallet().await?;
        dapp.init_contracts().await?;
        dapp.trigger_bot().await?;
        let user_data = dapp.get_user_data().await?;
        let chain_data = dapp.get_chain_data().await?;
        Ok((user_data, chain_data))
    }

    /// One maintenance call against the current collaborator; failures are
    /// only logged.
    pub async fn trigger_bot(&self) {
        let Some(dapp) = self.current_dapp() else {
            return;
        };
        if let Err(err) = dapp.trigger_bot().await {
            warn!(%err, "bot trigger failed");
        }
    }

    /// Re-reads display data through `dapp`. The view keeps its data if a
    /// newer `init` has replaced `dapp` in the meantime.
    pub async fn refresh_data(&self, dapp: &Arc<dyn Dapp>) -> DappResult<()> {
        let user_data = dapp.get_user_data().await?;
        let chain_data = dapp.get_chain_data().await?;
        let installed = self.dapp.read();
        if !installed.as_ref().is_some_and(|current| Arc::ptr_eq(current, dapp)) {
            debug!("dropping display data read through a replaced collaborator");
            return Ok(());
        }
        let mut view = self.view.write();
        view.user_data = user_data;
        view.chain_data = chain_data;
        Ok(())
    }

    pub async fn set_mint_amount(&self, amount: &str) -> AmountInput {
        self.set_amount(AmountField::Mint, amount).await
    }

    pub async fn set_burn_amount(&self, amount: &str) -> AmountInput {
        self.set_amount(AmountField::Burn, amount).await
    }

    async fn set_amount(&self, field: AmountField, amount: &str) -> AmountInput {
        let Some(dapp) = self.current_dapp().filter(|_| is_positive_amount(amount)) else {
            let mut view = self.view.write();
            let input = Self::input_mut(&mut view, field);
            input.amount = amount.to_string();
            input.preview = ZERO_AMOUNT.to_string();
            return input.clone();
        };
        Self::input_mut(&mut self.view.write(), field).amount = amount.to_string();

        let quote = match field {
            AmountField::Mint => dapp.coin_to_token(amount).await,
            AmountField::Burn => dapp.token_to_coin(amount).await,
        };

        let mut view = self.view.write();
        let input = Self::input_mut(&mut view, field);
        // a newer edit owns the preview now
        if input.amount != amount {
            return input.clone();
        }
        input.preview = match quote {
            Ok(preview) => preview,
            Err(err) => {
                warn!(?field, %err, "quote failed");
                ZERO_AMOUNT.to_string()
            }
        };
        input.clone()
    }

    fn input_mut(view: &mut ViewState, field: AmountField) -> &mut AmountInput {
        match field {
            AmountField::Mint => &mut view.mint,
            AmountField::Burn => &mut view.burn,
        }
    }

    pub async fn mint(&self) -> DashboardResult<TxPopupState> {
        self.run_action(TxAction::Mint).await
    }

    pub async fn burn(&self) -> DashboardResult<TxPopupState> {
        self.run_action(TxAction::Burn).await
    }

    pub async fn rebase(&self) -> DashboardResult<TxPopupState> {
        self.run_action(TxAction::Rebase).await
    }

    /// Runs `action` to completion and returns the final popup state.
    pub async fn run_action(&self, action: TxAction) -> DashboardResult<TxPopupState> {
        let dapp = self.admit()?;
        let amount = self.clicked_amount(action);
        self.drive(dapp, action, amount).await;
        Ok(self.popup.snapshot())
    }

    /// Opens the popup for `action` and finishes it on a background task.
    pub fn start_action(self: &Arc<Self>, action: TxAction) -> DashboardResult<TxPopupState> {
        let dapp = self.admit()?;
        let amount = self.clicked_amount(action);
        let opened = self.popup.snapshot();
        let dashboard = Arc::clone(self);
        tokio::spawn(async move { dashboard.drive(dapp, action, amount).await });
        Ok(opened)
    }

    fn admit(&self) -> DashboardResult<Arc<dyn Dapp>> {
        if self.connection() != Connection::Connected {
            return Err(DashboardError::NotConnected);
        }
        let dapp = self.current_dapp().ok_or(DashboardError::NotConnected)?;
        self.popup.begin()?;
        Ok(dapp)
    }

    /// The amount the action sends, as typed when the action was admitted.
    fn clicked_amount(&self, action: TxAction) -> String {
        let view = self.view.read();
        match action {
            TxAction::Mint => view.mint.amount.clone(),
            TxAction::Burn => view.burn.amount.clone(),
            TxAction::Rebase => String::new(),
        }
    }

    async fn drive(&self, dapp: Arc<dyn Dapp>, action: TxAction, amount: String) {
        info!(%action, %amount, "transaction started");
        match self.execute(&dapp, action, &amount).await {
            Ok(()) => {
                self.advance(TxEvent::Success);
                info!(%action, "transaction succeeded");
            }
            Err((stage, err)) => {
                warn!(%action, stage, %err, "transaction failed");
                self.advance(TxEvent::Error(describe_failure(action, stage, &err)));
            }
        }
    }

    /// Moves the episode opened by `admit`. Nothing else leaves a pending
    /// episode, so a rejection here only means the popup was driven
    /// externally; `dispatch` has already logged it.
    fn advance(&self, event: TxEvent) {
        if let Err(err) = self.popup.dispatch(event) {
            debug!(%err, "popup kept its state");
        }
    }

    async fn execute(
        &self,
        dapp: &Arc<dyn Dapp>,
        action: TxAction,
        amount: &str,
    ) -> Result<(), (&'static str, DappError)> {
        let submitted = match action {
            TxAction::Mint => dapp.mint(amount).await,
            TxAction::Burn => dapp.burn(amount).await,
            TxAction::Rebase => dapp.rebase().await,
        };
        let pending = submitted.map_err(|err| ("submit", err))?;

        self.advance(TxEvent::SetHash(pending.hash.clone()));
        pending.wait().await.map_err(|err| ("confirm", err))?;
        self.refresh_data(dapp).await.map_err(|err| ("refresh", err))?;
        Ok(())
    }
}
