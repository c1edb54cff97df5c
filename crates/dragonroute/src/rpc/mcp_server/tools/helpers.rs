use crate::{
    config::DragonrouteConfig,
    errors::DragonrouteError,
    fees::FeeTier,
    price_math::percent_to_bps,
    swap::{capped_slippage_bps, deadline_after},
};
use alloy::primitives::Address;
use serde_json::Value;
use std::str::FromStr as _;

fn invalid(msg: String) -> eyre::Report {
    DragonrouteError::InvalidRequest(msg).into()
}

pub fn req_str<'a>(args: &'a Value, key: &str) -> eyre::Result<&'a str> {
    let s = args
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or_default();
    if s.is_empty() {
        return Err(invalid(format!("missing {key}")));
    }
    Ok(s)
}

pub fn opt_str<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Amounts may arrive as decimal strings or JSON numbers; both become a decimal string.
pub fn amount_arg(args: &Value, key: &str) -> eyre::Result<String> {
    match args.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim().to_owned()),
        Some(Value::Number(n)) => Ok(number_as_decimal(n)),
        Some(Value::Null) | None => Err(invalid(format!("missing {key}"))),
        Some(other) => Err(DragonrouteError::InvalidAmount(other.to_string()).into()),
    }
}

/// `serde_json` prints large floats in exponent form (`1e+20`); `f64`'s `Display` never does.
fn number_as_decimal(n: &serde_json::Number) -> String {
    match (n.as_u64(), n.as_f64()) {
        (Some(u), _) => u.to_string(),
        (None, Some(f)) => f.to_string(),
        (None, None) => n.to_string(),
    }
}

fn opt_u64(args: &Value, key: &str) -> eyre::Result<Option<u64>> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_u64()
            .map(Some)
            .ok_or_else(|| invalid(format!("{key} must be a non-negative integer"))),
    }
}

fn opt_u32(args: &Value, key: &str) -> eyre::Result<Option<u32>> {
    opt_u64(args, key)?
        .map(|v| u32::try_from(v).map_err(|_e| invalid(format!("{key} is out of range"))))
        .transpose()
}

pub fn parse_address(s: &str) -> Result<Address, DragonrouteError> {
    Address::from_str(s.trim()).map_err(|_e| DragonrouteError::InvalidAddress(s.to_owned()))
}

pub fn opt_address(args: &Value, key: &str) -> eyre::Result<Option<Address>> {
    opt_str(args, key)
        .map(|s| parse_address(s).map_err(Into::into))
        .transpose()
}

pub fn fee_tier_arg(args: &Value) -> eyre::Result<Option<FeeTier>> {
    opt_u32(args, "fee_tier")?
        .map(|v| FeeTier::parse(v).map_err(Into::into))
        .transpose()
}

fn opt_percent(args: &Value, key: &str) -> eyre::Result<Option<u32>> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_f64()
            .and_then(percent_to_bps)
            .map(Some)
            .ok_or_else(|| invalid(format!("{key} must be a non-negative number"))),
    }
}

/// `slippage_bps` (or `slippage_percent`), defaulted from config and capped at
/// `trade.max_slippage_bps`.
pub fn slippage_arg(args: &Value, cfg: &DragonrouteConfig) -> eyre::Result<u32> {
    let bps = match opt_u64(args, "slippage_bps")? {
        Some(v) => u32::try_from(v).unwrap_or(u32::MAX),
        None => opt_percent(args, "slippage_percent")?.unwrap_or(cfg.trade.default_slippage_bps),
    };
    Ok(capped_slippage_bps(bps, cfg.trade.max_slippage_bps)?)
}

/// Absolute unix deadline from `deadline_minutes`.
pub fn deadline_arg(args: &Value, cfg: &DragonrouteConfig, now_unix: u64) -> eyre::Result<u64> {
    let minutes = opt_u64(args, "deadline_minutes")?.unwrap_or(cfg.trade.default_deadline_minutes);
    Ok(deadline_after(
        now_unix,
        minutes,
        cfg.trade.max_deadline_minutes,
    )?)
}

pub fn now_unix() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp()).unwrap_or_default()
}
