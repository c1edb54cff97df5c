//! Float helpers for off-chain price estimation from pool state.
//!
//! These are routing estimates only. Settlement uses the pool's own fixed-point math and
//! the on-chain `amountOutMinimum` guard, never these numbers.
//!
//! All `cast_precision_loss` / `float_arithmetic` lint expects live here so that
//! call-sites in the quote and route modules stay lint-clean.

#![expect(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    clippy::float_arithmetic,
    reason = "dedicated float-math module; casts and arithmetic are intentional"
)]

use alloy::primitives::U256;

const OUTPUT_WEIGHT: f64 = 0.4;
const LIQUIDITY_WEIGHT: f64 = 0.3;
const IMPACT_WEIGHT: f64 = 0.2;
const FEE_WEIGHT: f64 = 0.1;

fn q96() -> f64 {
    2.0_f64.powi(96)
}

fn pow10(exp: i32) -> f64 {
    10.0_f64.powi(exp)
}

pub fn u256_to_f64(v: U256) -> f64 {
    let limb_base = 2.0_f64.powi(64);
    v.as_limbs()
        .iter()
        .rev()
        .fold(0.0_f64, |acc, limb| acc.mul_add(limb_base, *limb as f64))
}

/// Convert a base-unit amount to whole tokens.
pub fn base_to_ui(base: u128, decimals: u8) -> f64 {
    base as f64 / pow10(i32::from(decimals))
}

/// Human price of token0 denominated in token1, decimals already applied.
pub fn sqrt_price_x96_to_price(sqrt_price_x96: U256, decimals0: u8, decimals1: u8) -> f64 {
    let sqrt_price = u256_to_f64(sqrt_price_x96) / q96();
    let price_raw = sqrt_price * sqrt_price;
    price_raw * pow10(i32::from(decimals0) - i32::from(decimals1))
}

/// Estimated output in base units of the output token.
///
/// `None` when the pool has no usable price (zero or non-finite), which callers treat
/// the same as a missing pool.
pub fn amount_out(
    sqrt_price_x96: U256,
    amount_in: u128,
    decimals_in: u8,
    decimals_out: u8,
    is_token0_input: bool,
) -> Option<u128> {
    if sqrt_price_x96.is_zero() {
        return None;
    }
    let (decimals0, decimals1) = if is_token0_input {
        (decimals_in, decimals_out)
    } else {
        (decimals_out, decimals_in)
    };
    let price = sqrt_price_x96_to_price(sqrt_price_x96, decimals0, decimals1);
    if !price.is_finite() || price <= 0.0_f64 {
        return None;
    }

    let amount_in_ui = base_to_ui(amount_in, decimals_in);
    let amount_out_ui = if is_token0_input {
        amount_in_ui * price
    } else {
        amount_in_ui / price
    };
    let raw = (amount_out_ui * pow10(i32::from(decimals_out))).floor();
    if !raw.is_finite() || raw < 0.0_f64 {
        return None;
    }
    Some(raw as u128)
}

/// `1 / (1 + (amount_in / liquidity) * 10)`, in (0, 1]. Deeper pools relative to the
/// trade score higher.
pub fn liquidity_score(amount_in: u128, liquidity: u128) -> f64 {
    if liquidity == 0 {
        return 0.0_f64;
    }
    let ratio = amount_in as f64 / liquidity as f64;
    1.0_f64 / ratio.mul_add(10.0_f64, 1.0_f64)
}

/// Size-dominance impact estimate in percent, capped at 100.
pub fn price_impact_percent(amount_in: u128, liquidity: u128) -> f64 {
    let a = amount_in as f64;
    let denom = a + liquidity as f64;
    if denom <= 0.0_f64 {
        return 0.0_f64;
    }
    (a / denom * 100.0_f64).min(100.0_f64)
}

/// Weighted route score: output 40%, liquidity 30%, impact 20%, fee 10%.
pub fn combined_score(
    amount_out_ui: f64,
    max_amount_out_ui: f64,
    liquidity_score: f64,
    price_impact_percent: f64,
    fee_pips: u32,
) -> f64 {
    let output_score = if max_amount_out_ui > 0.0_f64 {
        amount_out_ui / max_amount_out_ui
    } else {
        0.0_f64
    };
    let impact_penalty = price_impact_percent / 100.0_f64;
    let fee_penalty = f64::from(fee_pips) / 10_000.0_f64;
    OUTPUT_WEIGHT * output_score
        + LIQUIDITY_WEIGHT * liquidity_score
        + IMPACT_WEIGHT * (1.0_f64 - impact_penalty)
        + FEE_WEIGHT * (1.0_f64 - fee_penalty)
}

pub fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0_f64 {
        return None;
    }
    let r = numerator / denominator;
    r.is_finite().then_some(r)
}

/// How much better `candidate` is than `baseline`, in percent.
pub fn percent_gain(candidate: f64, baseline: f64) -> Option<f64> {
    ratio(candidate - baseline, baseline).map(|r| r * 100.0_f64)
}

/// Slippage percent to basis points (`0.5` -> 50), rounded. Saturates at `u32::MAX`.
pub fn percent_to_bps(percent: f64) -> Option<u32> {
    if !percent.is_finite() || percent < 0.0_f64 {
        return None;
    }
    let bps = (percent * 100.0_f64).round();
    Some(if bps >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        bps as u32
    })
}

#[cfg(test)]
pub fn sqrt_price_x96_for(price: f64, decimals0: u8, decimals1: u8) -> U256 {
    let price_raw = price / pow10(i32::from(decimals0) - i32::from(decimals1));
    U256::from((price_raw.sqrt() * q96()) as u128)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn close(a: f64, b: f64, rel: f64) -> bool {
        (a - b).abs() <= rel * a.abs().max(b.abs())
    }

    #[test]
    fn unit_price_at_q96() {
        let one = U256::from(1_u8) << 96;
        let p = sqrt_price_x96_to_price(one, 18, 18);
        assert!(close(p, 1.0, 1e-12), "price at 2^96 should be 1, got {p}");
        assert!(
            close(u256_to_f64(one), q96(), 1e-12),
            "u256 conversion of 2^96"
        );
    }

    #[test]
    fn usdt_to_wkaia_example() {
        // WKAIA (18) sorts below USDT (6); 1 WKAIA = 0.1 USDT, so 1 USDT = 10 WKAIA.
        let sqrt = sqrt_price_x96_for(0.1, 18, 6);
        let amount_in = 100_000_000_u128;
        let out = amount_out(sqrt, amount_in, 6, 18, false);
        let out_ui = out.map(|o| base_to_ui(o, 18)).unwrap_or_default();
        assert!(close(out_ui, 1_000.0, 1e-6), "expected ~1000 WKAIA, got {out_ui}");
    }

    #[test]
    fn zero_sqrt_price_has_no_quote() {
        assert_eq!(
            amount_out(U256::ZERO, 1_000, 18, 18, true),
            None,
            "zero price must not quote"
        );
    }

    #[test]
    fn tiny_output_rounds_to_zero_but_still_quotes() {
        let sqrt = sqrt_price_x96_for(1e-9, 18, 6);
        assert_eq!(
            amount_out(sqrt, 1, 18, 6, true),
            Some(0),
            "dust output floors to zero"
        );
    }

    #[test]
    fn combined_score_hand_calculation() {
        // 0.4*1 + 0.3*0.3 + 0.2*(1-0.01) + 0.1*(1-0.3) = 0.758
        let a = combined_score(100.0, 100.0, 0.3, 1.0, 3_000);
        // 0.4*0.98 + 0.3*0.9 + 0.2*(1-0.01) + 0.1*(1-0.05) = 0.955
        let b = combined_score(98.0, 100.0, 0.9, 1.0, 500);
        assert!(close(a, 0.758, 1e-9), "score a = {a}");
        assert!(close(b, 0.955, 1e-9), "score b = {b}");
    }

    #[test]
    fn percent_gain_against_zero_baseline_is_none() {
        assert_eq!(percent_gain(5.0, 0.0), None, "no baseline");
        let g = percent_gain(110.0, 100.0).unwrap_or_default();
        assert!(close(g, 10.0, 1e-9), "10% gain, got {g}");
    }

    #[test]
    fn slippage_percent_rounds_to_bps() {
        assert_eq!(percent_to_bps(0.5), Some(50), "half a percent");
        assert_eq!(percent_to_bps(0.333), Some(33), "rounded");
        assert_eq!(percent_to_bps(-1.0), None, "negative");
        assert_eq!(percent_to_bps(f64::NAN), None, "nan");
        assert_eq!(percent_to_bps(1e12), Some(u32::MAX), "saturates");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(128))]

        #[test]
        fn forward_then_reverse_recovers_input(
            price in 0.01_f64..100.0_f64,
            dec_in in 6_u8..=18_u8,
            dec_out in 6_u8..=18_u8,
            whole in 1_u64..1_000_000_u64,
        ) {
            // Input is token0, so the pool price is quoted as token1 per token0.
            let sqrt = sqrt_price_x96_for(price, dec_in, dec_out);
            let amount_in = u128::from(whole) * 10_u128.pow(u32::from(dec_in));
            let out = amount_out(sqrt, amount_in, dec_in, dec_out, true);
            prop_assert!(out.is_some(), "forward quote missing");
            let back = out.and_then(|o| amount_out(sqrt, o, dec_out, dec_in, false));
            prop_assert!(back.is_some(), "reverse quote missing");
            let back_ui = back.map(|b| base_to_ui(b, dec_in)).unwrap_or_default();
            prop_assert!(
                close(back_ui, whole as f64, 1e-3),
                "round trip {} -> {}", whole, back_ui
            );
        }

        #[test]
        fn bigger_trades_never_look_better(
            a in 1_u128..u128::from(u64::MAX),
            extra in 0_u128..u128::from(u64::MAX),
            liquidity in 1_u128..u128::from(u64::MAX),
        ) {
            let b = a + extra;
            prop_assert!(
                price_impact_percent(b, liquidity) >= price_impact_percent(a, liquidity),
                "impact must not decrease"
            );
            prop_assert!(
                liquidity_score(b, liquidity) <= liquidity_score(a, liquidity),
                "liquidity score must not increase"
            );
            let s = liquidity_score(a, liquidity);
            prop_assert!(s > 0.0 && s <= 1.0, "score {} out of (0, 1]", s);
            let i = price_impact_percent(a, liquidity);
            prop_assert!((0.0..=100.0).contains(&i), "impact {} out of range", i);
        }
    }
}
