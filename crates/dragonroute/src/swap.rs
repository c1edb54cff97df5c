use crate::{
    amount::format_amount_base_to_ui,
    errors::DragonrouteError,
    fees::FeeTier,
    route::RoutePath,
    tokens::Token,
};
use alloy::{
    network::TransactionBuilder as _,
    primitives::{Address, Bytes, Uint, U256},
    rpc::types::TransactionRequest,
    sol,
    sol_types::SolCall as _,
};
use serde_json::{json, Value};

pub const MAX_SLIPPAGE_BPS: u32 = 10_000;
const BPS_DENOMINATOR: u64 = 10_000;

sol! {
    contract IDragonSwapRouter {
        struct ExactInputSingleParams {
            address tokenIn;
            address tokenOut;
            uint24 fee;
            address recipient;
            uint256 deadline;
            uint256 amountIn;
            uint256 amountOutMinimum;
            uint160 sqrtPriceLimitX96;
        }
        struct ExactInputParams {
            bytes path;
            address recipient;
            uint256 deadline;
            uint256 amountIn;
            uint256 amountOutMinimum;
        }
        function exactInputSingle(ExactInputSingleParams params)
            external payable returns (uint256 amountOut);
        function exactInput(ExactInputParams params)
            external payable returns (uint256 amountOut);
        function multicall(bytes[] data) external payable returns (bytes[] results);
        function unwrapWETH9(uint256 amountMinimum, address recipient) external payable;
    }
}

sol! {
    contract IERC20Approve {
        function approve(address spender, uint256 value) returns (bool);
    }
}

pub const fn validate_slippage_bps(bps: u32) -> Result<u32, DragonrouteError> {
    if bps > MAX_SLIPPAGE_BPS {
        return Err(DragonrouteError::InvalidSlippage(bps));
    }
    Ok(bps)
}

/// Like [`validate_slippage_bps`], with a caller-facing ceiling (`trade.max_slippage_bps`).
pub const fn capped_slippage_bps(bps: u32, max_bps: u32) -> Result<u32, DragonrouteError> {
    if bps > max_bps {
        return Err(DragonrouteError::InvalidSlippage(bps));
    }
    validate_slippage_bps(bps)
}

/// `floor(amount_out * (10000 - bps) / 10000)`.
pub fn min_amount_out(amount_out: U256, slippage_bps: u32) -> Result<U256, DragonrouteError> {
    let bps = validate_slippage_bps(slippage_bps)?;
    let keep = U256::from(u64::from(MAX_SLIPPAGE_BPS - bps));
    let denom = U256::from(BPS_DENOMINATOR);
    Ok(amount_out.checked_mul(keep).map_or_else(
        || amount_out / denom * keep,
        |scaled| scaled / denom,
    ))
}

/// Unix timestamp `minutes` from `now_unix`; `minutes` must be in `1..=max_minutes`.
pub const fn deadline_after(
    now_unix: u64,
    minutes: u64,
    max_minutes: u64,
) -> Result<u64, DragonrouteError> {
    if minutes == 0 || minutes > max_minutes {
        return Err(DragonrouteError::InvalidDeadline(minutes));
    }
    Ok(now_unix.saturating_add(minutes.saturating_mul(60)))
}

/// A selected route with its slippage guard applied.
#[derive(Debug, Clone, PartialEq)]
pub struct SwapPlan {
    pub route: RoutePath,
    pub amount_in: U256,
    pub expected_amount_out: U256,
    pub min_amount_out: U256,
    /// Fee tier of the first hop.
    pub fee_tier: FeeTier,
    pub slippage_bps: u32,
}

impl SwapPlan {
    pub const fn token_in(&self) -> &Token {
        self.route.token_in()
    }

    pub const fn token_out(&self) -> &Token {
        self.route.token_out()
    }

    pub fn fee_tiers(&self) -> Vec<FeeTier> {
        self.route.hops().iter().map(|q| q.fee_tier).collect()
    }

    pub fn to_json(&self) -> Value {
        let out_decimals = self.token_out().decimals;
        json!({
          "route": self.route.label(),
          "amount_in": self.amount_in.to_string(),
          "expected_amount_out": self.expected_amount_out.to_string(),
          "min_amount_out": self.min_amount_out.to_string(),
          "min_amount_out_formatted": u128::try_from(self.min_amount_out)
              .ok()
              .map(|v| format_amount_base_to_ui(v, out_decimals)),
          "fee_tier": self.fee_tier.pips(),
          "fee_tiers": self.fee_tiers().iter().map(|t| t.pips()).collect::<Vec<_>>(),
          "slippage_bps": self.slippage_bps,
        })
    }
}

pub fn prepare_swap(route: &RoutePath, slippage_bps: u32) -> Result<SwapPlan, DragonrouteError> {
    let expected = U256::from(route.amount_out());
    Ok(SwapPlan {
        route: route.clone(),
        amount_in: U256::from(route.amount_in()),
        expected_amount_out: expected,
        min_amount_out: min_amount_out(expected, slippage_bps)?,
        fee_tier: route.first().fee_tier,
        slippage_bps,
    })
}

/// Everything an external signer needs to submit the swap.
#[derive(Debug, Clone, PartialEq)]
pub struct SwapPayload {
    pub plan: SwapPlan,
    pub recipient: Address,
    pub deadline: u64,
}

impl SwapPayload {
    pub fn to_json(&self) -> Value {
        json!({
          "amountIn": self.plan.amount_in.to_string(),
          "minAmountOut": self.plan.min_amount_out.to_string(),
          "feeTier": self.plan.fee_tier.pips(),
          "recipient": format!("{:#x}", self.recipient),
          "deadline": self.deadline,
        })
    }
}

/// Packed V3 path: `token (20) | fee (3) | token (20) | ...`.
pub fn encode_path(tokens: &[Address], fees: &[FeeTier]) -> eyre::Result<Bytes> {
    if tokens.len() != fees.len() + 1 {
        eyre::bail!(
            "path needs one more token than fees ({} tokens, {} fees)",
            tokens.len(),
            fees.len()
        );
    }
    let mut out = Vec::with_capacity(tokens.len() * 20 + fees.len() * 3);
    for (i, token) in tokens.iter().enumerate() {
        out.extend_from_slice(token.as_slice());
        if let Some(fee) = fees.get(i) {
            let be = fee.pips().to_be_bytes();
            out.extend_from_slice(be.get(1..).unwrap_or_default());
        }
    }
    Ok(Bytes::from(out))
}

/// Unsigned router call for `payload`.
///
/// Native KAIA input is sent as `value`; native output is swapped to the router and
/// unwrapped to the recipient in the same `multicall`.
pub fn build_swap_tx(
    router: Address,
    wrapped_native: Address,
    from: Address,
    payload: &SwapPayload,
) -> eyre::Result<TransactionRequest> {
    let plan = &payload.plan;
    let native_in = plan.token_in().native;
    let native_out = plan.token_out().native;
    let swap_recipient = if native_out { router } else { payload.recipient };
    let deadline = U256::from(payload.deadline);

    let swap_call: Vec<u8> = match &plan.route {
        RoutePath::Direct(q) => IDragonSwapRouter::exactInputSingleCall {
            params: IDragonSwapRouter::ExactInputSingleParams {
                tokenIn: q.token_in.pool_address(wrapped_native),
                tokenOut: q.token_out.pool_address(wrapped_native),
                fee: Uint::from(q.fee_tier.pips()),
                recipient: swap_recipient,
                deadline,
                amountIn: plan.amount_in,
                amountOutMinimum: plan.min_amount_out,
                sqrtPriceLimitX96: Uint::ZERO,
            },
        }
        .abi_encode(),
        RoutePath::TwoHop { first, second } => {
            let path = encode_path(
                &[
                    first.token_in.pool_address(wrapped_native),
                    first.token_out.pool_address(wrapped_native),
                    second.token_out.pool_address(wrapped_native),
                ],
                &[first.fee_tier, second.fee_tier],
            )?;
            IDragonSwapRouter::exactInputCall {
                params: IDragonSwapRouter::ExactInputParams {
                    path,
                    recipient: swap_recipient,
                    deadline,
                    amountIn: plan.amount_in,
                    amountOutMinimum: plan.min_amount_out,
                },
            }
            .abi_encode()
        }
    };

    let data = if native_out {
        let unwrap = IDragonSwapRouter::unwrapWETH9Call {
            amountMinimum: plan.min_amount_out,
            recipient: payload.recipient,
        }
        .abi_encode();
        IDragonSwapRouter::multicallCall {
            data: vec![Bytes::from(swap_call), Bytes::from(unwrap)],
        }
        .abi_encode()
    } else {
        swap_call
    };

    let value = if native_in { plan.amount_in } else { U256::ZERO };
    Ok(TransactionRequest::default()
        .with_from(from)
        .with_to(router)
        .with_value(value)
        .with_input(Bytes::from(data)))
}

/// Native KAIA needs no approval; ERC-20 input needs one when the allowance is short.
pub fn needs_approval(token_in: &Token, allowance: U256, amount_in: U256) -> bool {
    !token_in.native && allowance < amount_in
}

pub fn build_approve_tx(from: Address, token: Address, spender: Address, value: U256) -> TransactionRequest {
    let calldata = IERC20Approve::approveCall { spender, value }.abi_encode();
    TransactionRequest::default()
        .with_from(from)
        .with_to(token)
        .with_input(Bytes::from(calldata))
}
