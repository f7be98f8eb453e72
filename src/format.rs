//! Display formatting for amounts, percentages and addresses.
//!
//! Every currency-bearing string in the UI goes through [`format_currency`],
//! so the amounts-hidden privacy flag is a plain parameter here rather than
//! shared state.

/// Mask shown in place of any amount while privacy mode is on.
pub const MASKED_AMOUNT: &str = "****";

/// Renders a USD amount with thousands grouping, or the privacy mask.
pub fn format_currency(value: f64, hidden: bool) -> String {
    if hidden {
        return MASKED_AMOUNT.to_string();
    }
    format!("${}", format_with_commas(value))
}

/// `value` as a percentage of `total`, two decimals. A zero total renders
/// as `0.00%` instead of dividing by zero.
pub fn format_percentage(value: f64, total: f64) -> String {
    if total == 0.0 {
        return "0.00%".to_string();
    }
    format!("{:.2}%", value / total * 100.0)
}

/// Truncates an address to `first 6 + "..." + last 4`. Anything of ten
/// characters or fewer is returned unmodified.
pub fn format_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 10 {
        return address.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

fn format_with_commas(value: f64) -> String {
    let formatted = format!("{value:.2}");
    let (integer_part, decimal_part) = formatted
        .split_once('.')
        .unwrap_or((formatted.as_str(), "00"));

    let formatted_integer = integer_part
        .chars()
        .rev()
        .collect::<String>()
        .chars()
        .collect::<Vec<_>>()
        .chunks(3)
        .map(|chunk| chunk.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(",")
        .chars()
        .rev()
        .collect::<String>();

    format!("{formatted_integer}.{decimal_part}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_groups_thousands() {
        assert_eq!(format_currency(1234567.891, false), "$1,234,567.89");
        assert_eq!(format_currency(0.0, false), "$0.00");
        assert_eq!(format_currency(999.9, false), "$999.90");
    }

    #[test]
    fn currency_masks_when_hidden() {
        assert_eq!(format_currency(1234567.891, true), MASKED_AMOUNT);
        assert_eq!(format_currency(0.0, true), MASKED_AMOUNT);
    }

    #[test]
    fn percentage_of_zero_total_is_zero() {
        assert_eq!(format_percentage(42.0, 0.0), "0.00%");
        assert_eq!(format_percentage(-17.3, 0.0), "0.00%");
        assert_eq!(format_percentage(0.0, 0.0), "0.00%");
    }

    #[test]
    fn percentage_has_two_decimals() {
        assert_eq!(format_percentage(1.0, 3.0), "33.33%");
        assert_eq!(format_percentage(50.0, 100.0), "50.00%");
    }

    #[test]
    fn long_addresses_truncate_to_thirteen_chars() {
        let addr = "0xAAAA000000000000000000000000000000001111";
        let formatted = format_address(addr);
        assert_eq!(formatted, "0xAAAA...1111");
        assert_eq!(formatted.len(), 13);
    }

    #[test]
    fn short_addresses_pass_through() {
        assert_eq!(format_address("0x1234"), "0x1234");
        assert_eq!(format_address("0x12345678"), "0x12345678");
        // exactly ten characters is still unmodified
        assert_eq!(format_address("0123456789"), "0123456789");
    }
}
