// src/evm.rs
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ethers::contract::{ContractCall, ContractError, Multicall, MulticallError};
use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Middleware, PendingTransaction, Provider, ProviderError};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, TxHash, U256};
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::dapp::{ChainData, Dapp, PendingTx, UserData};
use crate::errors::{DappError, DappResult};
use crate::utils::{checked_decimals, human_to_u256, u256_to_human};
use crate::{AlgoBank, ElasticToken};

type Client = SignerMiddleware<Provider<Http>, LocalWallet>;

const MULTICALL_ADDRESS: &str = "0xcA11bde05977b3631167028862bE2a173976CA11";
const DISPLAY_FRACTION: usize = 6;
const PRICE_FEED_TIMEOUT: Duration = Duration::from_secs(5);

impl From<ProviderError> for DappError {
    fn from(err: ProviderError) -> Self {
        DappError::Provider(err.to_string())
    }
}

impl From<ContractError<Client>> for DappError {
    fn from(err: ContractError<Client>) -> Self {
        DappError::Contract(err.to_string())
    }
}

impl From<MulticallError<Client>> for DappError {
    fn from(err: MulticallError<Client>) -> Self {
        DappError::Contract(err.to_string())
    }
}

#[derive(Clone)]
struct Contracts {
    client: Arc<Client>,
    token: ElasticToken<Client>,
    bank: AlgoBank<Client>,
    token_decimals: u8,
}

/// [`Dapp`] backed by a JSON-RPC provider and a local signing key.
pub struct EvmDapp {
    settings: Settings,
    http: reqwest::Client,
    client: RwLock<Option<Arc<Client>>>,
    contracts: RwLock<Option<Contracts>>,
}

impl EvmDapp {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            http: reqwest::Client::new(),
            client: RwLock::new(None),
            contracts: RwLock::new(None),
        }
    }

    fn client(&self) -> DappResult<Arc<Client>> {
        self.client
            .read()
            .clone()
            .ok_or_else(|| DappError::WalletUnavailable("wallet not loaded".to_string()))
    }

    fn contracts(&self) -> DappResult<Contracts> {
        self.contracts.read().clone().ok_or(DappError::NotInitialized)
    }

    fn coin_decimals(&self) -> u8 {
        self.settings.deployment.coin_decimals
    }

    async fn submit(&self, call: ContractCall<Client, ()>, client: &Arc<Client>) -> DappResult<PendingTx> {
        let tx_hash = {
            let pending = call.send().await?;
            *pending
        };
        info!(hash = ?tx_hash, "transaction broadcast");
        let client = client.clone();
        Ok(PendingTx::new(format!("0x{:x}", tx_hash), confirm(client, tx_hash)))
    }

    /// Collateral and supply figures in one round trip.
    async fn read_bank_state(&self, contracts: &Contracts) -> DappResult<(U256, U256, bool, U256)> {
        let multicall_addr: Address = MULTICALL_ADDRESS
            .parse()
            .map_err(|_| DappError::Binding("invalid multicall address".to_string()))?;
        let mut multicall = Multicall::new(contracts.client.clone(), Some(multicall_addr)).await?;
        multicall
            .add_call(contracts.token.total_supply(), false)
            .add_call(contracts.bank.coin_price(), false)
            .add_call(contracts.bank.can_rebase(), false)
            .add_get_eth_balance(self.settings.bank_address, false);
        let results: (U256, U256, bool, U256) = multicall.call().await?;
        Ok(results)
    }

    async fn reference_price(&self) -> DappResult<Option<String>> {
        let Some(url) = &self.settings.price_feed_url else {
            return Ok(None);
        };
        let id = self.settings.deployment.coingecko_id.as_str();
        let body: HashMap<String, HashMap<String, f64>> = self
            .http
            .get(url)
            .query(&[("ids", id), ("vs_currencies", "usd")])
            .timeout(PRICE_FEED_TIMEOUT)
            .send()
            .await
            .and_then(|res| res.error_for_status())
            .map_err(|err| DappError::PriceFeed(err.to_string()))?
            .json()
            .await
            .map_err(|err| DappError::PriceFeed(err.to_string()))?;
        Ok(body.get(id).and_then(|prices| prices.get("usd")).map(|price| price.to_string()))
    }
}

async fn confirm(client: Arc<Client>, tx_hash: TxHash) -> DappResult<()> {
    let receipt = PendingTransaction::new(tx_hash, client.provider()).await?;
    match receipt {
        Some(receipt) if receipt.status.unwrap_or_default().as_u64() == 1 => {
            info!(hash = ?tx_hash, block = ?receipt.block_number, "transaction confirmed");
            Ok(())
        }
        Some(_) => Err(DappError::Reverted(format!("0x{:x}", tx_hash))),
        None => Err(DappError::Dropped(format!("0x{:x}", tx_hash))),
    }
}

#[async_trait]
impl Dapp for EvmDapp {
    async fn load_wallet(&self) -> DappResult<()> {
        let key = self
            .settings
            .private_key
            .as_deref()
            .ok_or_else(|| DappError::WalletUnavailable("PRIVATE_KEY is not set".to_string()))?;
        let provider = Provider::<Http>::try_from(self.settings.rpc_url.as_str())
            .map_err(|err| DappError::Provider(err.to_string()))?;

        let actual = provider.get_chainid().await?.as_u64();
        let expected = self.settings.deployment.chain_id;
        if actual != expected {
            return Err(DappError::WrongNetwork { expected, actual });
        }

        let wallet = key
            .parse::<LocalWallet>()
            .map_err(|err| DappError::WalletUnavailable(err.to_string()))?
            .with_chain_id(actual);
        let client = Arc::new(SignerMiddleware::new(provider, wallet));
        info!(address = ?client.address(), chain_id = actual, "wallet loaded");

        *self.client.write() = Some(client);
        *self.contracts.write() = None;
        Ok(())
    }

    async fn init_contracts(&self) -> DappResult<()> {
        let client = self.client()?;
        let token_address = self.settings.token_address;
        let bank_address = self.settings.bank_address;

        for (label, address) in [("token", token_address), ("bank", bank_address)] {
            let code = client.provider().get_code(address, None).await?;
            if code.is_empty() {
                return Err(DappError::Binding(format!("no {} contract at 0x{:x}", label, address)));
            }
        }

        let token = ElasticToken::new(token_address, client.clone());
        let bank = AlgoBank::new(bank_address, client.clone());

        let bound_token = bank.token().call().await?;
        if bound_token != token_address {
            return Err(DappError::Binding(format!(
                "bank 0x{:x} is bound to token 0x{:x}, expected 0x{:x}",
                bank_address, bound_token, token_address
            )));
        }
        let token_decimals = checked_decimals(token.decimals().call().await?)?;
        debug!(token_decimals, "contracts bound");

        *self.contracts.write() = Some(Contracts {
            client,
            token,
            bank,
            token_decimals,
        });
        Ok(())
    }

    async fn get_user_data(&self) -> DappResult<UserData> {
        let contracts = self.contracts()?;
        let address = contracts.client.address();
        let coin = contracts.client.provider().get_balance(address, None).await?;
        let token = contracts.token.balance_of(address).call().await?;
        Ok(UserData {
            user_address: format!("0x{:x}", address),
            user_coin: u256_to_human(coin, self.coin_decimals(), DISPLAY_FRACTION),
            user_token: u256_to_human(token, contracts.token_decimals, DISPLAY_FRACTION),
        })
    }

    async fn get_chain_data(&self) -> DappResult<ChainData> {
        let contracts = self.contracts()?;
        let (total_supply, price, rebase, bank_balance) = self.read_bank_state(&contracts).await?;

        let price_decimals = self.settings.deployment.price_decimals;
        let balance_usd = bank_balance.saturating_mul(price) / U256::exp10(self.coin_decimals() as usize);

        let coingecko_price = match self.reference_price().await {
            Ok(price) => price,
            Err(err) => {
                warn!(%err, "reference price unavailable");
                None
            }
        };

        Ok(ChainData {
            token_total_supply: u256_to_human(total_supply, contracts.token_decimals, DISPLAY_FRACTION),
            bank_coin_balance: u256_to_human(bank_balance, self.coin_decimals(), DISPLAY_FRACTION),
            bank_coin_balance_usd: u256_to_human(balance_usd, price_decimals, 2),
            bank_coin_price: u256_to_human(price, price_decimals, DISPLAY_FRACTION),
            coingecko_price,
            rebase,
        })
    }

    fn chain_name(&self) -> String {
        self.settings.deployment.chain_name.clone()
    }

    async fn trigger_bot(&self) -> DappResult<()> {
        let contracts = self.contracts()?;
        if !contracts.bank.can_rebase().call().await? {
            debug!("rebase not due");
            return Ok(());
        }
        info!("rebase due, submitting");
        let pending = self.submit(contracts.bank.rebase(), &contracts.client).await?;
        pending.wait().await
    }

    async fn coin_to_token(&self, amount: &str) -> DappResult<String> {
        let contracts = self.contracts()?;
        let coins = human_to_u256(amount, self.coin_decimals())?;
        let tokens = contracts.bank.coin_to_token(coins).call().await?;
        Ok(u256_to_human(tokens, contracts.token_decimals, DISPLAY_FRACTION))
    }

    async fn token_to_coin(&self, amount: &str) -> DappResult<String> {
        let contracts = self.contracts()?;
        let tokens = human_to_u256(amount, contracts.token_decimals)?;
        let coins = contracts.bank.token_to_coin(tokens).call().await?;
        Ok(u256_to_human(coins, self.coin_decimals(), DISPLAY_FRACTION))
    }

    async fn mint(&self, amount: &str) -> DappResult<PendingTx> {
        let contracts = self.contracts()?;
        let value = human_to_u256(amount, self.coin_decimals())?;
        self.submit(contracts.bank.mint().value(value), &contracts.client).await
    }

    async fn burn(&self, amount: &str) -> DappResult<PendingTx> {
        let contracts = self.contracts()?;
        let tokens = human_to_u256(amount, contracts.token_decimals)?;
        self.submit(contracts.bank.burn(tokens), &contracts.client).await
    }

    async fn rebase(&self) -> DappResult<PendingTx> {
        let contracts = self.contracts()?;
        self.submit(contracts.bank.rebase(), &contracts.client).await
    }
}
