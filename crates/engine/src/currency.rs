use serde::{Deserialize, Serialize};

use crate::EngineError;

/// Currency of an asset and every transaction recorded against it.
///
/// Kanemane tracks money in Japan and Indonesia, so only `JPY` and `IDR` are
/// supported today; the engine still models currency explicitly so new codes
/// only touch this module.
///
/// ## Minor units
///
/// Monetary values are stored as an `i64` number of **minor units** (see
/// [`Money`](crate::Money)). `minor_units()` returns how many decimal digits
/// separate major from minor units:
/// - JPY has no fraction digits, so `500 JPY` ⇄ `500`
/// - IDR uses 2 (sen), so `10.50 IDR` ⇄ `1050`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Jpy,
    Idr,
}

impl Currency {
    /// Canonical currency code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Currency::Jpy => "JPY",
            Currency::Idr => "IDR",
        }
    }

    /// Symbol used when rendering amounts for humans.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Currency::Jpy => "¥",
            Currency::Idr => "Rp",
        }
    }

    /// Number of fraction digits used when formatting/parsing amounts.
    #[must_use]
    pub const fn minor_units(self) -> u8 {
        match self {
            Currency::Jpy => 0,
            Currency::Idr => 2,
        }
    }
}

impl core::fmt::Display for Currency {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

impl TryFrom<&str> for Currency {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "JPY" => Ok(Currency::Jpy),
            "IDR" => Ok(Currency::Idr),
            other => Err(EngineError::CurrencyMismatch(format!(
                "unsupported currency: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_codes_case_insensitively() {
        assert_eq!(Currency::try_from("jpy").unwrap(), Currency::Jpy);
        assert_eq!(Currency::try_from(" IDR ").unwrap(), Currency::Idr);
        assert!(Currency::try_from("USD").is_err());
    }

    #[test]
    fn minor_units_differ_per_currency() {
        assert_eq!(Currency::Jpy.minor_units(), 0);
        assert_eq!(Currency::Idr.minor_units(), 2);
    }
}
