//! Multi-step conversation flows.
//!
//! Each step is a variant of [`Step`]; the answers collected so far live in
//! [`FlowData`]. The small mapping functions here translate the numbered
//! menu replies into domain values and are what the handler layer leans on.

use engine::{AssetKind, Currency, TransactionKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Step {
    ExportPeriod,
    AssetCreateKind,
    AssetCreateCountry,
    AssetCreateName,
    AssetCreateBalance,
    AssetEditChoice,
    AssetEditName,
    AssetEditBalance,
    AssetDeleteConfirm,
    ConfirmTransaction,
    ConfirmReceipt,
}

/// A transaction waiting for the human's go-ahead. The asset is already
/// resolved and its currency is authoritative.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct PendingTransaction {
    pub kind: TransactionKind,
    pub category: String,
    pub amount_minor: i64,
    pub asset_id: Uuid,
    pub description: String,
}

/// A scanned receipt waiting for the human's go-ahead. The asset is picked
/// at confirmation time, by the receipt's currency.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct PendingReceipt {
    pub amount_minor: i64,
    pub date: String,
    pub merchant: String,
    pub category: String,
    pub currency: Currency,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct FlowData {
    pub asset_id: Option<Uuid>,
    pub asset_kind: Option<AssetKind>,
    pub country: Option<String>,
    pub currency: Option<Currency>,
    pub name: Option<String>,
    pub transaction: Option<PendingTransaction>,
    pub receipt: Option<PendingReceipt>,
}

/// Export period options, in menu order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ExportPeriod {
    ThisMonth,
    LastThreeMonths,
    LastSixMonths,
    ThisYear,
}

impl ExportPeriod {
    pub(crate) fn label(self) -> &'static str {
        match self {
            Self::ThisMonth => "Bulan ini",
            Self::LastThreeMonths => "3 bulan terakhir",
            Self::LastSixMonths => "6 bulan terakhir",
            Self::ThisYear => "Tahun ini",
        }
    }

    pub(crate) fn months(self) -> u32 {
        match self {
            Self::ThisMonth => 1,
            Self::LastThreeMonths => 3,
            Self::LastSixMonths => 6,
            Self::ThisYear => 12,
        }
    }
}

pub(crate) fn parse_export_period(choice: &str) -> Option<ExportPeriod> {
    match choice.trim() {
        "1" => Some(ExportPeriod::ThisMonth),
        "2" => Some(ExportPeriod::LastThreeMonths),
        "3" => Some(ExportPeriod::LastSixMonths),
        "4" => Some(ExportPeriod::ThisYear),
        _ => None,
    }
}

pub(crate) fn parse_asset_kind(choice: &str) -> Option<AssetKind> {
    match choice.trim() {
        "1" => Some(AssetKind::Savings),
        "2" => Some(AssetKind::EMoney),
        "3" => Some(AssetKind::Investment),
        "4" => Some(AssetKind::Cash),
        _ => None,
    }
}

/// Country menu: each option pins both the country and its currency.
pub(crate) fn parse_country(choice: &str) -> Option<(&'static str, Currency)> {
    match choice.trim() {
        "1" => Some(("JP", Currency::Jpy)),
        "2" => Some(("ID", Currency::Idr)),
        _ => None,
    }
}

pub(crate) fn is_yes(text: &str) -> bool {
    matches!(
        text.trim().to_lowercase().as_str(),
        "1" | "ya" | "yes" | "y" | "benar" | "simpan"
    )
}

pub(crate) fn is_no(text: &str) -> bool {
    matches!(
        text.trim().to_lowercase().as_str(),
        "2" | "tidak" | "no" | "n" | "batal"
    )
}

/// Cancel keywords abort any flow before its step handler runs.
pub(crate) fn is_cancel(text: &str) -> bool {
    matches!(
        text.trim().to_lowercase().as_str(),
        "batal" | "cancel" | "stop" | "berhenti"
    )
}

/// Balance replies keep only the digits, so `¥1.500` and `1500` agree.
pub(crate) fn parse_balance_digits(text: &str) -> Option<i64> {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_menu_maps_all_four_choices() {
        assert_eq!(parse_export_period("1"), Some(ExportPeriod::ThisMonth));
        assert_eq!(parse_export_period(" 4 "), Some(ExportPeriod::ThisYear));
        assert_eq!(parse_export_period("5"), None);
        assert_eq!(parse_export_period("satu"), None);
    }

    #[test]
    fn asset_kind_menu() {
        assert_eq!(parse_asset_kind("1"), Some(AssetKind::Savings));
        assert_eq!(parse_asset_kind("2"), Some(AssetKind::EMoney));
        assert_eq!(parse_asset_kind("3"), Some(AssetKind::Investment));
        assert_eq!(parse_asset_kind("4"), Some(AssetKind::Cash));
        assert_eq!(parse_asset_kind("0"), None);
    }

    #[test]
    fn country_pins_currency() {
        assert_eq!(parse_country("1"), Some(("JP", Currency::Jpy)));
        assert_eq!(parse_country("2"), Some(("ID", Currency::Idr)));
        assert_eq!(parse_country("3"), None);
    }

    #[test]
    fn yes_no_and_cancel_words() {
        for word in ["1", "ya", "YES", "y", "benar", "simpan"] {
            assert!(is_yes(word), "{word}");
        }
        for word in ["2", "tidak", "no", "n", "batal"] {
            assert!(is_no(word), "{word}");
        }
        for word in ["batal", "CANCEL", "stop", "berhenti"] {
            assert!(is_cancel(word), "{word}");
        }
        assert!(!is_cancel("stopwatch"));
        assert!(!is_yes("yakin"));
    }

    #[test]
    fn balance_digits_ignore_formatting() {
        assert_eq!(parse_balance_digits("¥1.500"), Some(1500));
        assert_eq!(parse_balance_digits("10 000"), Some(10000));
        assert_eq!(parse_balance_digits("banyak"), None);
    }
}
