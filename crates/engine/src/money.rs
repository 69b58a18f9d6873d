use crate::Currency;

/// Signed money amount represented as **integer minor units**.
///
/// Use this type for **all** monetary values in the engine (balances,
/// transaction amounts) to avoid floating-point drift. How many minor units
/// make one major unit depends on the currency (see
/// [`Currency::minor_units`]), so formatting always takes a [`Currency`].
///
/// The value is signed:
/// - positive = income / increase
/// - negative = expense / decrease
///
/// # Examples
///
/// ```rust
/// use engine::{Currency, Money};
///
/// assert_eq!(Money::new(1250).format(Currency::Jpy), "¥1.250");
/// assert_eq!(Money::new(1050).format(Currency::Idr), "Rp10,50");
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Money(i64);

impl Money {
    /// Creates a new amount from integer minor units.
    #[must_use]
    pub const fn new(minor: i64) -> Self {
        Self(minor)
    }

    /// Returns the raw value in minor units.
    #[must_use]
    pub const fn minor(self) -> i64 {
        self.0
    }

    /// Checked addition (returns `None` on overflow).
    #[must_use]
    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    /// Formats the amount for humans: symbol, `.` as thousands separator and
    /// `,` before the fraction digits (Indonesian convention, matching the
    /// chat bot output).
    #[must_use]
    pub fn format(self, currency: Currency) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let major = abs / scale(currency) as u64;
        let minor = abs % scale(currency) as u64;

        let mut grouped = String::new();
        let digits = major.to_string();
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(c);
        }

        match currency.minor_units() {
            0 => format!("{sign}{}{grouped}", currency.symbol()),
            n => format!(
                "{sign}{}{grouped},{minor:0width$}",
                currency.symbol(),
                width = usize::from(n)
            ),
        }
    }
}

const fn scale(currency: Currency) -> i64 {
    match currency.minor_units() {
        0 => 1,
        1 => 10,
        _ => 100,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_with_thousands_separator() {
        assert_eq!(Money::new(1250).format(Currency::Jpy), "¥1.250");
        assert_eq!(Money::new(1_000_000).format(Currency::Jpy), "¥1.000.000");
        assert_eq!(Money::new(1050).format(Currency::Idr), "Rp10,50");
        assert_eq!(Money::new(-500).format(Currency::Jpy), "-¥500");
        assert_eq!(Money::new(0).format(Currency::Idr), "Rp0,00");
    }

    #[test]
    fn checked_add_reports_overflow() {
        assert_eq!(
            Money::new(300).checked_add(Money::new(-500)),
            Some(Money::new(-200))
        );
        assert!(Money::new(i64::MAX).checked_add(Money::new(1)).is_none());
    }
}
