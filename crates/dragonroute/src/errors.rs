use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

/// A structured error suitable for returning to an MCP client as tool output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolError {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Value::is_null", default)]
    pub data: Value,
}

impl ToolError {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: Value::Null,
        }
    }

    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }
}

/// Failures a caller can act on: bad input, an unknown token, or a pair nobody provides
/// liquidity for. Network and RPC failures are not represented here.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DragonrouteError {
    #[error("unknown token: {0}")]
    UnknownToken(String),

    #[error("no liquidity for {pair}")]
    NoLiquidity { pair: String },

    #[error("invalid slippage: {0} bps (expected 0..=10000)")]
    InvalidSlippage(u32),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("invalid fee tier: {0}")]
    InvalidFeeTier(u32),

    #[error("invalid deadline: {0} minutes")]
    InvalidDeadline(u64),

    #[error("token_in and token_out are the same token: {0}")]
    IdenticalTokens(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl From<DragonrouteError> for ToolError {
    fn from(e: DragonrouteError) -> Self {
        let message = e.to_string();
        match e {
            DragonrouteError::UnknownToken(token) => {
                Self::new("unknown_token", message).with_data(json!({ "token": token }))
            }
            DragonrouteError::NoLiquidity { pair } => {
                Self::new("no_liquidity", message).with_data(json!({ "pair": pair }))
            }
            DragonrouteError::InvalidSlippage(bps) => {
                Self::new("invalid_slippage", message).with_data(json!({ "slippage_bps": bps }))
            }
            DragonrouteError::InvalidAmount(_) => Self::new("invalid_amount", message),
            DragonrouteError::InvalidFeeTier(fee) => {
                Self::new("invalid_fee_tier", message).with_data(json!({ "fee_tier": fee }))
            }
            DragonrouteError::InvalidDeadline(_) => Self::new("invalid_deadline", message),
            DragonrouteError::IdenticalTokens(_) => Self::new("identical_tokens", message),
            DragonrouteError::InvalidAddress(_) => Self::new("invalid_address", message),
            DragonrouteError::InvalidRequest(_) => Self::new("invalid_request", message),
        }
    }
}

/// Map any report to a tool error, keeping domain codes when the chain carries one.
pub fn tool_error_from_report(e: &eyre::Report) -> ToolError {
    e.downcast_ref::<DragonrouteError>().map_or_else(
        || ToolError::new("internal_error", format!("{e:#}")),
        |de| ToolError::from(de.clone()),
    )
}
