#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use elastic_money_dashboard::dapp::{ChainData, Dapp, DappFactory, PendingTx, UserData};
use elastic_money_dashboard::errors::{DappError, DappResult};
use elastic_money_dashboard::tx::{TxPopup, TxPopupState};
use parking_lot::Mutex;
use tokio::sync::Semaphore;

/// Knobs and counters shared by every instance a [`MockFactory`] creates.
#[derive(Default)]
pub struct MockState {
    pub fail_load: AtomicBool,
    pub fail_submit: AtomicBool,
    pub fail_confirm: AtomicBool,
    pub fail_trigger: AtomicBool,
    pub fail_refresh: AtomicBool,
    pub fail_quote: AtomicBool,
    pub instances: AtomicUsize,
    pub trigger_calls: AtomicUsize,
    pub user_calls: AtomicUsize,
    pub chain_calls: AtomicUsize,
    pub quote_calls: AtomicUsize,
    pub triggered_by: Mutex<Vec<usize>>,
    pub refreshed_by: Mutex<Vec<usize>>,
    pub submitted_amounts: Mutex<Vec<String>>,
    pub seen: Mutex<Vec<TxPopupState>>,
    pub trigger_gate: Mutex<Option<Arc<Semaphore>>>,
    /// One-shot gates: the first call to reach one takes it and waits for a
    /// permit, later calls pass straight through.
    pub load_gate: Mutex<Option<Arc<Semaphore>>>,
    pub quote_gate: Mutex<Option<Arc<Semaphore>>>,
    pub confirm_gate: Mutex<Option<Arc<Semaphore>>>,
}

impl MockState {
    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    pub fn set(flag: &AtomicBool, value: bool) {
        flag.store(value, Ordering::SeqCst);
    }

    async fn pass(gate: &Mutex<Option<Arc<Semaphore>>>) {
        let gate = gate.lock().take();
        if let Some(gate) = gate {
            gate.acquire().await.expect("gate closed").forget();
        }
    }
}

pub struct MockDapp {
    id: usize,
    state: Arc<MockState>,
    popup: TxPopup,
}

impl MockDapp {
    fn fail(flag: &AtomicBool, err: DappError) -> DappResult<()> {
        if flag.load(Ordering::SeqCst) { Err(err) } else { Ok(()) }
    }

    fn pending(&self, hash: &str) -> PendingTx {
        self.state.seen.lock().push(self.popup.snapshot());
        let state = self.state.clone();
        let popup = self.popup.clone();
        let hash_owned = hash.to_string();
        PendingTx::new(hash, async move {
            state.seen.lock().push(popup.snapshot());
            MockState::pass(&state.confirm_gate).await;
            MockDapp::fail(&state.fail_confirm, DappError::Reverted(hash_owned))
        })
    }

    fn submit(&self, hash: &str, amount: Option<&str>) -> DappResult<PendingTx> {
        if let Some(amount) = amount {
            self.state.submitted_amounts.lock().push(amount.to_string());
        }
        if self.state.fail_submit.load(Ordering::SeqCst) {
            self.state.seen.lock().push(self.popup.snapshot());
            return Err(DappError::Contract("user rejected transaction".to_string()));
        }
        Ok(self.pending(hash))
    }
}

#[async_trait]
impl Dapp for MockDapp {
    async fn load_wallet(&self) -> DappResult<()> {
        MockState::pass(&self.state.load_gate).await;
        Self::fail(&self.state.fail_load, DappError::WalletUnavailable("no wallet".to_string()))
    }

    async fn init_contracts(&self) -> DappResult<()> {
        Ok(())
    }

    async fn get_user_data(&self) -> DappResult<UserData> {
        self.state.user_calls.fetch_add(1, Ordering::SeqCst);
        self.state.refreshed_by.lock().push(self.id);
        if self.state.fail_refresh.load(Ordering::SeqCst) {
            self.state.seen.lock().push(self.popup.snapshot());
            return Err(DappError::Provider("balance lookup timed out".to_string()));
        }
        Ok(UserData {
            user_address: format!("0x{:040x}", self.id),
            user_coin: "12.5".to_string(),
            user_token: "50".to_string(),
        })
    }

    async fn get_chain_data(&self) -> DappResult<ChainData> {
        self.state.chain_calls.fetch_add(1, Ordering::SeqCst);
        Ok(ChainData {
            token_total_supply: "1000".to_string(),
            bank_coin_balance: "250".to_string(),
            bank_coin_balance_usd: "62.5".to_string(),
            bank_coin_price: "0.25".to_string(),
            coingecko_price: Some("0.26".to_string()),
            rebase: true,
        })
    }

    fn chain_name(&self) -> String {
        "ETHERLINK TESTNET".to_string()
    }

    async fn trigger_bot(&self) -> DappResult<()> {
        self.state.trigger_calls.fetch_add(1, Ordering::SeqCst);
        self.state.triggered_by.lock().push(self.id);
        let gate = self.state.trigger_gate.lock().clone();
        if let Some(gate) = gate {
            gate.acquire().await.expect("gate closed").forget();
        }
        Self::fail(&self.state.fail_trigger, DappError::Provider("rpc timeout".to_string()))
    }

    async fn coin_to_token(&self, amount: &str) -> DappResult<String> {
        self.state.quote_calls.fetch_add(1, Ordering::SeqCst);
        MockState::pass(&self.state.quote_gate).await;
        Self::fail(&self.state.fail_quote, DappError::Contract("quote reverted".to_string()))?;
        let coins: f64 = amount.trim().parse().map_err(|_| DappError::InvalidAmount(amount.to_string()))?;
        Ok(format!("{}", coins * 4.0))
    }

    async fn token_to_coin(&self, amount: &str) -> DappResult<String> {
        self.state.quote_calls.fetch_add(1, Ordering::SeqCst);
        MockState::pass(&self.state.quote_gate).await;
        Self::fail(&self.state.fail_quote, DappError::Contract("quote reverted".to_string()))?;
        let tokens: f64 = amount.trim().parse().map_err(|_| DappError::InvalidAmount(amount.to_string()))?;
        Ok(format!("{}", tokens / 4.0))
    }

    async fn mint(&self, amount: &str) -> DappResult<PendingTx> {
        self.submit("0xmint", Some(amount))
    }

    async fn burn(&self, amount: &str) -> DappResult<PendingTx> {
        self.submit("0xburn", Some(amount))
    }

    async fn rebase(&self) -> DappResult<PendingTx> {
        self.submit("0xrebase", None)
    }
}

/// Builds numbered [`MockDapp`] instances that share one [`MockState`].
pub fn mock_factory(state: Arc<MockState>, popup: TxPopup) -> DappFactory {
    Arc::new(move || {
        let id = state.instances.fetch_add(1, Ordering::SeqCst) + 1;
        Arc::new(MockDapp {
            id,
            state: state.clone(),
            popup: popup.clone(),
        }) as Arc<dyn Dapp>
    })
}
