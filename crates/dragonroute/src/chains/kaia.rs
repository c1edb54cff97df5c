use crate::{
    config::DragonrouteConfig,
    fees::FeeTier,
    pools::{PoolDirectory, PoolState},
    retry::{try_all_with_backoff, BackoffConfig},
    tokens::DecimalsReader,
};
use alloy::{
    primitives::{Address, U256},
    providers::{Provider as _, RootProvider},
    sol,
};
use async_trait::async_trait;
use eyre::Context as _;
use reqwest::Client;
use std::time::Duration;

const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(15);
const DEFAULT_RPC_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

type KaiaProvider = RootProvider;

sol! {
    #[sol(rpc)]
    contract IERC20 {
        function balanceOf(address account) external view returns (uint256);
        function decimals() external view returns (uint8);
        function allowance(address owner, address spender) external view returns (uint256);
    }
}

sol! {
    #[sol(rpc)]
    contract IDragonSwapV3Factory {
        function getPool(address tokenA, address tokenB, uint24 fee) external view returns (address pool);
    }
}

sol! {
    #[sol(rpc)]
    contract IDragonSwapV3Pool {
        function token0() external view returns (address);
        function token1() external view returns (address);
        function liquidity() external view returns (uint128);
        function slot0() external view returns (
            uint160 sqrtPriceX96,
            int24 tick,
            uint16 observationIndex,
            uint16 observationCardinality,
            uint16 observationCardinalityNext,
            uint8 feeProtocol,
            bool unlocked
        );
    }
}

/// Read-only KAIA client: pool snapshots, token metadata and balances.
#[derive(Debug, Clone)]
pub struct KaiaChain {
    pub rpc_url: String,
    pub fallback_rpc_urls: Vec<String>,
    pub factory: Address,
    backoff: BackoffConfig,
}

impl KaiaChain {
    pub fn from_config(cfg: &DragonrouteConfig) -> Self {
        Self {
            rpc_url: cfg.network.rpc_url.clone(),
            fallback_rpc_urls: cfg.network.fallback_rpc_urls.clone(),
            factory: cfg.dragonswap.factory,
            backoff: BackoffConfig::default(),
        }
    }

    fn provider_for_url(url: &str) -> eyre::Result<KaiaProvider> {
        let u: reqwest::Url = url
            .parse()
            .with_context(|| format!("invalid rpc url: {url}"))?;
        let client = Client::builder()
            .timeout(DEFAULT_RPC_TIMEOUT)
            .connect_timeout(DEFAULT_RPC_CONNECT_TIMEOUT)
            .build()
            .context("build rpc http client")?;
        let http = alloy::transports::http::Http::with_client(client, u);
        let rpc_client = alloy::rpc::client::RpcClient::new(http, false);
        Ok(RootProvider::new(rpc_client))
    }

    fn all_rpc_urls(&self) -> Vec<String> {
        let mut urls = Vec::with_capacity(1 + self.fallback_rpc_urls.len());
        for u in std::iter::once(&self.rpc_url).chain(&self.fallback_rpc_urls) {
            let t = u.trim();
            if t.is_empty() || urls.iter().any(|x| x == t) {
                continue;
            }
            urls.push(t.to_owned());
        }
        urls
    }

    async fn with_fallback_and_backoff<T, Fut>(
        &self,
        label: &'static str,
        f: impl Fn(KaiaProvider) -> Fut + Sync,
    ) -> eyre::Result<T>
    where
        T: Send,
        Fut: std::future::Future<Output = eyre::Result<T>> + Send,
    {
        let urls = self.all_rpc_urls();
        try_all_with_backoff(
            &urls,
            &self.backoff,
            |u| {
                let u = u.clone();
                let f = &f;
                async move {
                    let p = Self::provider_for_url(&u)?;
                    f(p).await
                }
            },
            label,
        )
        .await
    }

    pub async fn block_number(&self) -> eyre::Result<u64> {
        self.with_fallback_and_backoff("get block number", |p| async move {
            p.get_block_number().await.context("get block number")
        })
        .await
    }

    pub async fn native_balance(&self, owner: Address) -> eyre::Result<U256> {
        self.with_fallback_and_backoff("get balance", |p| async move {
            p.get_balance(owner).await.context("get balance")
        })
        .await
    }

    pub async fn erc20_balance(&self, token: Address, owner: Address) -> eyre::Result<U256> {
        self.with_fallback_and_backoff("erc20 balance", |p| async move {
            let c = IERC20::new(token, &p);
            c.balanceOf(owner).call().await.context("erc20 balanceOf")
        })
        .await
    }

    pub async fn erc20_allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> eyre::Result<U256> {
        self.with_fallback_and_backoff("erc20 allowance", |p| async move {
            let c = IERC20::new(token, &p);
            c.allowance(owner, spender)
                .call()
                .await
                .context("erc20 allowance")
        })
        .await
    }

    async fn read_pool(p: &KaiaProvider, pool: Address, fee: FeeTier) -> eyre::Result<PoolState> {
        let c = IDragonSwapV3Pool::new(pool, p);
        let token0 = c.token0().call().await.context("pool token0")?;
        let token1 = c.token1().call().await.context("pool token1")?;
        let liquidity = c.liquidity().call().await.context("pool liquidity")?;
        let slot0 = c.slot0().call().await.context("pool slot0")?;
        let tick = i32::try_from(slot0.tick).map_err(|e| eyre::eyre!("pool tick: {e}"))?;
        Ok(PoolState {
            address: pool,
            token0,
            token1,
            fee,
            liquidity,
            sqrt_price_x96: U256::from(slot0.sqrtPriceX96),
            tick,
        })
    }
}

#[async_trait]
impl PoolDirectory for KaiaChain {
    async fn get_pool(
        &self,
        token_a: Address,
        token_b: Address,
        fee: FeeTier,
    ) -> eyre::Result<Option<PoolState>> {
        let factory = self.factory;
        self.with_fallback_and_backoff("dragonswap pool", |p| async move {
            let f = IDragonSwapV3Factory::new(factory, &p);
            let pool = f
                .getPool(token_a, token_b, alloy::primitives::Uint::from(fee.pips()))
                .call()
                .await
                .context("factory getPool")?;
            if pool.is_zero() {
                return Ok(None);
            }
            Self::read_pool(&p, pool, fee).await.map(Some)
        })
        .await
    }
}

#[async_trait]
impl DecimalsReader for KaiaChain {
    async fn erc20_decimals(&self, token: Address) -> eyre::Result<u8> {
        self.with_fallback_and_backoff("erc20 decimals", |p| async move {
            let c = IERC20::new(token, &p);
            c.decimals().call().await.context("erc20 decimals")
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rpc_urls_are_deduplicated_in_order() {
        let mut cfg = DragonrouteConfig::default();
        cfg.network.rpc_url = "https://a.example".into();
        cfg.network.fallback_rpc_urls = vec![
            " https://b.example ".into(),
            "https://a.example".into(),
            String::new(),
        ];
        let chain = KaiaChain::from_config(&cfg);
        assert_eq!(
            chain.all_rpc_urls(),
            vec!["https://a.example".to_owned(), "https://b.example".to_owned()],
            "primary first, duplicates and blanks dropped"
        );
    }

    #[test]
    fn invalid_rpc_url_is_reported() {
        let r = KaiaChain::provider_for_url("not a url");
        assert!(r.is_err(), "garbage url must not build a provider");
    }
}
