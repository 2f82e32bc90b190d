/// Converts a raw integer amount in base units into a decimal string scaled
/// down by `decimals`.
///
/// Trailing fractional zeros are trimmed, so `("1500000", 6)` yields `"1.5"`
/// and `("1000000", 6)` yields `"1"`. A malformed amount yields `"0"` rather
/// than failing the caller's whole batch.
pub fn to_decimal_amount(raw: &str, decimals: u8) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return "0".to_string();
    }

    let digits = trimmed.trim_start_matches('0');
    if digits.is_empty() {
        return "0".to_string();
    }

    let scale = decimals as usize;
    if scale == 0 {
        return digits.to_string();
    }

    let (int_part, frac_part) = if digits.len() > scale {
        digits.split_at(digits.len() - scale)
    } else {
        ("", digits)
    };

    let mut frac = "0".repeat(scale - frac_part.len());
    frac.push_str(frac_part);
    let frac = frac.trim_end_matches('0');

    match (int_part.is_empty(), frac.is_empty()) {
        (true, true) => "0".to_string(),
        (true, false) => format!("0.{}", frac),
        (false, true) => int_part.to_string(),
        (false, false) => format!("{}.{}", int_part, frac),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn scales_by_decimals() {
        assert_eq!(to_decimal_amount("123456", 4), "12.3456");
        assert_eq!(to_decimal_amount("1500000", 6), "1.5");
        assert_eq!(to_decimal_amount("1", 18), "0.000000000000000001");
    }

    #[test]
    fn trims_trailing_fractional_zeros() {
        assert_eq!(to_decimal_amount("1000000", 6), "1");
        assert_eq!(to_decimal_amount("1200000", 6), "1.2");
    }

    #[test]
    fn zero_decimals_passes_through() {
        assert_eq!(to_decimal_amount("42", 0), "42");
        assert_eq!(to_decimal_amount("007", 0), "7");
    }

    #[test]
    fn handles_leading_zeros_and_small_amounts() {
        assert_eq!(to_decimal_amount("007", 2), "0.07");
        assert_eq!(to_decimal_amount("0", 6), "0");
        assert_eq!(to_decimal_amount("000", 6), "0");
    }

    #[test]
    fn malformed_amounts_fall_back_to_zero() {
        assert_eq!(to_decimal_amount("", 6), "0");
        assert_eq!(to_decimal_amount("12a4", 6), "0");
        assert_eq!(to_decimal_amount("-5", 6), "0");
    }
}
