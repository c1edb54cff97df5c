use crate::errors::DragonrouteError;

fn invalid(msg: impl Into<String>) -> eyre::Report {
    DragonrouteError::InvalidAmount(msg.into()).into()
}

/// Parse a human decimal amount ("1.5") into base units for a token with `decimals`.
///
/// Exact string arithmetic: no floats are involved, so "0.1" of an 18-decimal token is
/// exactly 10^17. Zero, negative and non-numeric input are rejected.
pub fn parse_amount_ui_to_base(s: &str, decimals: u8) -> eyre::Result<u128> {
    let s = s.trim();
    if s.is_empty() {
        return Err(invalid("empty amount"));
    }
    if s.starts_with('-') {
        return Err(invalid(format!("amount must be positive: {s}")));
    }

    let (whole, frac) = s.split_once('.').unwrap_or((s, ""));
    if whole.is_empty() && frac.is_empty() {
        return Err(invalid(format!("not a number: {s}")));
    }
    let digits_ok = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    if !digits_ok(whole) || !digits_ok(frac) {
        return Err(invalid(format!("not a number: {s}")));
    }

    let decimals_len = usize::from(decimals);
    if frac.len() > decimals_len {
        return Err(invalid(format!(
            "too many decimal places for token (decimals={decimals})"
        )));
    }

    let whole_v: u128 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|e| invalid(format!("{s}: {e}")))?
    };

    let mut frac_s = frac.to_owned();
    while frac_s.len() < decimals_len {
        frac_s.push('0');
    }
    let frac_v: u128 = if frac_s.is_empty() {
        0
    } else {
        frac_s.parse().map_err(|e| invalid(format!("{s}: {e}")))?
    };

    let scale = 10_u128
        .checked_pow(u32::from(decimals))
        .ok_or_else(|| invalid("decimals too large"))?;
    let base = whole_v
        .checked_mul(scale)
        .and_then(|x| x.checked_add(frac_v))
        .ok_or_else(|| invalid(format!("amount overflow: {s}")))?;

    if base == 0 {
        return Err(invalid("amount must be greater than zero"));
    }
    Ok(base)
}

/// Format a base-unit integer amount into a UI decimal string without using floats.
///
/// Examples:
/// - base=1500000, decimals=6 => "1.5"
/// - base=1, decimals=6 => "0.000001"
pub fn format_amount_base_to_ui(base: u128, decimals: u8) -> String {
    if decimals == 0 {
        return base.to_string();
    }
    let Some(scale) = 10_u128.checked_pow(u32::from(decimals)) else {
        return base.to_string();
    };
    let whole = base / scale;
    let frac = base % scale;
    if frac == 0 {
        return whole.to_string();
    }
    let mut frac_s = format!("{frac:0width$}", width = usize::from(decimals));
    while frac_s.ends_with('0') {
        frac_s.pop();
    }
    format!("{whole}.{frac_s}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_ui_amount_basic() {
        let v1 = parse_amount_ui_to_base("1", 6);
        assert!(v1.is_ok(), "parse failed: {v1:?}");
        assert_eq!(v1.ok(), Some(1_000_000));

        let v15 = parse_amount_ui_to_base("1.5", 6);
        assert_eq!(v15.ok(), Some(1_500_000), "1.5 with 6 decimals");

        let vsmall = parse_amount_ui_to_base("0.000001", 6);
        assert_eq!(vsmall.ok(), Some(1), "smallest unit");

        let v100 = parse_amount_ui_to_base("100", 18);
        assert_eq!(
            v100.ok(),
            Some(100_000_000_000_000_000_000),
            "100 with 18 decimals"
        );

        let lead = parse_amount_ui_to_base(".5", 1);
        assert_eq!(lead.ok(), Some(5), "leading dot");
    }

    #[test]
    fn parse_rejects_non_positive_and_garbage() {
        for bad in ["", "0", "0.0", "-1", "abc", "1e3", "1.2.3", ".", "NaN", "inf"] {
            let r = parse_amount_ui_to_base(bad, 6);
            let is_invalid_amount = r
                .as_ref()
                .err()
                .and_then(|e| e.downcast_ref::<DragonrouteError>())
                .is_some_and(|e| matches!(e, DragonrouteError::InvalidAmount(_)));
            assert!(is_invalid_amount, "expected InvalidAmount for {bad:?}, got {r:?}");
        }
    }

    #[test]
    fn parse_rejects_too_many_decimals() {
        let r = parse_amount_ui_to_base("1.0000001", 6);
        assert!(r.is_err(), "expected error, got ok");
        if let Err(err) = r {
            assert!(
                err.to_string().contains("too many decimal places"),
                "unexpected message: {err}"
            );
        }
    }

    #[test]
    fn format_base_to_ui() {
        assert_eq!(format_amount_base_to_ui(1_500_000, 6), "1.5", "1.5");
        assert_eq!(format_amount_base_to_ui(1, 6), "0.000001", "dust");
        assert_eq!(format_amount_base_to_ui(10_000_000, 6), "10", "whole");
        assert_eq!(format_amount_base_to_ui(42, 0), "42", "zero decimals");
    }
}
