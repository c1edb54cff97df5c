use crate::{
    config::{DragonrouteConfig, HttpConfig, TradeSizing},
    route::{TradeSizer, UnitsAsUsd, UsdValued},
};
use eyre::Context as _;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::{collections::BTreeMap, time::Duration};
use tracing::{debug, warn};

fn allow_insecure_http() -> bool {
    std::env::var("DRAGONROUTE_ALLOW_INSECURE_HTTP")
        .ok()
        .is_some_and(|v| {
            matches!(
                v.as_str(),
                "1" | "true" | "TRUE" | "yes" | "YES" | "on" | "ON"
            )
        })
}

fn is_loopback_http(url: &str) -> bool {
    fn host_prefix_ok(s: &str, prefix: &str) -> bool {
        if !s.starts_with(prefix) {
            return false;
        }
        matches!(s.as_bytes().get(prefix.len()), None | Some(b':' | b'/'))
    }
    let u = url.trim();
    host_prefix_ok(u, "http://127.0.0.1")
        || host_prefix_ok(u, "http://localhost")
        || host_prefix_ok(u, "http://[::1]")
}

/// USD prices keyed by token symbol.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceTable {
    usd: BTreeMap<String, f64>,
}

impl PriceTable {
    pub fn from_pairs<S: AsRef<str>>(pairs: impl IntoIterator<Item = (S, f64)>) -> Self {
        Self {
            usd: pairs
                .into_iter()
                .map(|(s, p)| (s.as_ref().to_ascii_uppercase(), p))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.usd.len()
    }

    /// Wrapped and bridged tokens are priced as their underlying asset.
    pub fn get(&self, symbol: &str) -> Option<f64> {
        let key = symbol.trim().to_ascii_uppercase();
        let key = match key.as_str() {
            "WKAIA" => "KAIA",
            "WETH" => "ETH",
            "BTCB" => "BTC",
            "USDT_WORMHOLE" => "USDT",
            other => other,
        };
        self.usd.get(key).copied().filter(|p| p.is_finite() && *p > 0.0_f64)
    }

    #[expect(
        clippy::float_arithmetic,
        reason = "usd estimate used only to bucket trade size"
    )]
    pub fn usd_value(&self, symbol: &str, amount_ui: f64) -> Option<f64> {
        self.get(symbol).map(|p| p * amount_ui)
    }
}

#[derive(Debug, Deserialize)]
struct PriceResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Vec<PriceItem>,
}

#[derive(Debug, Deserialize)]
struct PriceItem {
    symbol: String,
    price: Value,
}

fn price_value(v: &Value) -> Option<f64> {
    v.as_f64()
        .or_else(|| v.as_str().and_then(|s| s.trim().parse::<f64>().ok()))
}

fn internal_symbol(api_symbol: &str) -> String {
    match api_symbol {
        "MARBLEX" => "MBX".to_owned(),
        "STAKED_KAIA" => "STKAIA".to_owned(),
        other => other.to_ascii_uppercase(),
    }
}

/// Parse a `{success, data: [{symbol, price}]}` body.
pub fn parse_price_response(body: &str) -> eyre::Result<PriceTable> {
    let resp: PriceResponse = serde_json::from_str(body).context("price api json")?;
    if !resp.success {
        eyre::bail!("price api reported failure");
    }
    let mut pairs = Vec::with_capacity(resp.data.len() + 1);
    for item in resp.data {
        match price_value(&item.price) {
            Some(p) => pairs.push((internal_symbol(&item.symbol), p)),
            None => debug!(symbol = %item.symbol, "skipping unparseable price"),
        }
    }
    if !pairs.iter().any(|(s, _)| s == "USDT") {
        pairs.push(("USDT".to_owned(), 1.0_f64));
    }
    Ok(PriceTable::from_pairs(pairs))
}

pub async fn fetch_price_table(http: &HttpConfig) -> eyre::Result<PriceTable> {
    let url = http.price_api_url.trim();
    if !url.starts_with("https://") && !is_loopback_http(url) && !allow_insecure_http() {
        eyre::bail!(
            "price_api_url must use https (or loopback); set DRAGONROUTE_ALLOW_INSECURE_HTTP=1 to override"
        );
    }
    let client = Client::builder()
        .timeout(Duration::from_millis(http.timeout_ms))
        .build()
        .context("build http client")?;
    let body = client
        .get(url)
        .send()
        .await
        .context("price api request")?
        .error_for_status()
        .context("price api status")?
        .text()
        .await
        .context("price api body")?;
    parse_price_response(&body)
}

/// Trade sizer selected by `trade.sizing`. A failed price fetch degrades to units.
pub async fn trade_sizer(cfg: &DragonrouteConfig) -> Box<dyn TradeSizer> {
    match cfg.trade.sizing {
        TradeSizing::Units => Box::new(UnitsAsUsd),
        TradeSizing::Usd => match fetch_price_table(&cfg.http).await {
            Ok(prices) => {
                debug!(tokens = prices.len(), "loaded price table for trade sizing");
                Box::new(UsdValued::new(prices))
            }
            Err(e) => {
                warn!(error = %e, "price api unavailable; sizing trades in token units");
                Box::new(UnitsAsUsd)
            }
        },
    }
}
