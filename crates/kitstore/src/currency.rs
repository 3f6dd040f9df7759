use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// Currency used to display prices.
///
/// All prices are stored as an integer number of minor units (cents, pence).
#[derive(
    Serialize,
    Deserialize,
    Debug,
    Default,
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::VariantArray,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Currency {
    /// US dollar
    #[default]
    Usd,
    /// Euro
    Eur,
    /// Pound sterling
    Gbp,
}
impl Currency {
    /// Returns the currency symbol.
    pub fn symbol(self) -> &'static str {
        match self {
            Currency::Usd => "$",
            Currency::Eur => "€",
            Currency::Gbp => "£",
        }
    }

    fn separators(self) -> (char, char) {
        // (thousands, decimal)
        match self {
            Currency::Usd | Currency::Gbp => (',', '.'),
            Currency::Eur => ('.', ','),
        }
    }

    fn symbol_is_suffix(self) -> bool {
        self == Currency::Eur
    }
}

/// Formats a price given in minor units, such as `$1,234.50` or `1.234,50 €`.
pub fn format_price(minor_units: i64, currency: Currency) -> String {
    let (thousands_sep, decimal_sep) = currency.separators();

    let sign = if minor_units < 0 { "-" } else { "" };
    let abs = minor_units.unsigned_abs();
    let major = abs / 100;
    let minor = abs % 100;

    let digits = major.to_string();
    let grouped = digits
        .as_bytes()
        .rchunks(3)
        .rev()
        .map(|chunk| String::from_utf8_lossy(chunk))
        .join(&thousands_sep.to_string());

    let amount = format!("{grouped}{decimal_sep}{minor:02}");
    let symbol = currency.symbol();
    if currency.symbol_is_suffix() {
        format!("{sign}{amount} {symbol}")
    } else {
        format!("{sign}{symbol}{amount}")
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(0, Currency::Usd), "$0.00");
        assert_eq!(format_price(5, Currency::Usd), "$0.05");
        assert_eq!(format_price(1999, Currency::Usd), "$19.99");
        assert_eq!(format_price(123_456_78, Currency::Usd), "$123,456.78");
        assert_eq!(format_price(1_000_000_00, Currency::Gbp), "£1,000,000.00");
        assert_eq!(format_price(123_450, Currency::Eur), "1.234,50 €");
        assert_eq!(format_price(-250, Currency::Usd), "-$2.50");
    }

    #[test]
    fn test_parse_currency() {
        assert_eq!("usd".parse::<Currency>().unwrap(), Currency::Usd);
        assert_eq!("EUR".parse::<Currency>().unwrap(), Currency::Eur);
        assert!("yen".parse::<Currency>().is_err());
        assert_eq!(Currency::Gbp.to_string(), "gbp");
    }
}
