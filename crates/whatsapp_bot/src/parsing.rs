//! Deterministic transaction parsing.
//!
//! This is both the fallback for the AI parser and the contract its output
//! is normalized into. Categories come back in the Japanese ledger labels
//! and are translated to Indonesian for the chat.

use engine::{Currency, TransactionKind};

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ParsedTransaction {
    pub kind: TransactionKind,
    pub category: String,
    pub amount_minor: i64,
    pub currency: Currency,
    pub asset_name: Option<String>,
    pub description: String,
}

const INCOME_KEYWORDS: &[&str] = &[
    "gaji",
    "gajian",
    "salary",
    "beasiswa",
    "scholarship",
    "bonus",
    "dapat",
    "terima",
    "masuk",
    "income",
    "pendapatan",
];

const IDR_KEYWORDS: &[&str] = &["rupiah", "rp", "idr"];

const FOOD_KEYWORDS: &[&str] = &[
    "makan", "jajan", "food", "resto", "cafe", "breakfast", "lunch", "dinner", "食", "飯",
];
const TRANSPORT_KEYWORDS: &[&str] = &[
    "train", "bus", "taxi", "transport", "交通", "kereta", "grab", "gojek", "bensin",
];
const RENT_KEYWORDS: &[&str] = &["rent", "sewa", "家賃"];
const UTILITY_KEYWORDS: &[&str] = &[
    "electric", "water", "internet", "gas", "光熱費", "listrik", "air", "wifi",
];

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

fn first_number(text: &str) -> Option<i64> {
    let mut digits = String::new();
    for c in text.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
        } else if !digits.is_empty() {
            break;
        }
    }
    digits.parse().ok()
}

/// Keyword parser used when the AI is unavailable or returns garbage.
///
/// The first run of digits is the amount (in major units), income and
/// currency come from keyword lists, category from keyword buckets.
/// Defaults: expense, JPY, その他.
pub(crate) fn fallback_parse(text: &str) -> ParsedTransaction {
    let lower = text.to_lowercase();

    let kind = if contains_any(&lower, INCOME_KEYWORDS) {
        TransactionKind::Income
    } else {
        TransactionKind::Expense
    };

    let currency = if contains_any(&lower, IDR_KEYWORDS) {
        Currency::Idr
    } else {
        Currency::Jpy
    };

    let category = if contains_any(&lower, FOOD_KEYWORDS) {
        "食費"
    } else if contains_any(&lower, TRANSPORT_KEYWORDS) {
        "交通費"
    } else if contains_any(&lower, RENT_KEYWORDS) {
        "家賃"
    } else if contains_any(&lower, UTILITY_KEYWORDS) {
        "光熱費"
    } else {
        "その他"
    };

    let amount_major = first_number(text).unwrap_or(0);

    ParsedTransaction {
        kind,
        category: category.to_string(),
        amount_minor: major_to_minor(amount_major, currency),
        currency,
        asset_name: None,
        description: text.trim().to_string(),
    }
}

/// Scales a whole major-unit amount to minor units (JPY ×1, IDR ×100).
pub(crate) fn major_to_minor(amount_major: i64, currency: Currency) -> i64 {
    amount_major * 10i64.pow(u32::from(currency.minor_units()))
}

/// Translates the ledger's Japanese category labels for the chat. Unknown
/// labels pass through unchanged.
pub(crate) fn normalize_category(category: &str) -> String {
    match category {
        "食費" => "Makanan",
        "交通費" => "Transportasi",
        "家賃" => "Sewa",
        "光熱費" => "Utilitas",
        "その他" => "Lainnya",
        other => other,
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expense_jpy_food_by_default() {
        let parsed = fallback_parse("jajan crepes 500");
        assert_eq!(parsed.kind, TransactionKind::Expense);
        assert_eq!(parsed.currency, Currency::Jpy);
        assert_eq!(parsed.category, "食費");
        assert_eq!(parsed.amount_minor, 500);
        assert_eq!(parsed.description, "jajan crepes 500");
    }

    #[test]
    fn income_keywords_flip_the_kind() {
        let parsed = fallback_parse("gajian 5000000 rupiah");
        assert_eq!(parsed.kind, TransactionKind::Income);
        assert_eq!(parsed.currency, Currency::Idr);
        // IDR carries two minor digits.
        assert_eq!(parsed.amount_minor, 500_000_000);
    }

    #[test]
    fn category_buckets() {
        assert_eq!(fallback_parse("naik kereta 210").category, "交通費");
        assert_eq!(fallback_parse("sewa apato 45000").category, "家賃");
        assert_eq!(fallback_parse("bayar listrik 8000").category, "光熱費");
        assert_eq!(fallback_parse("hadiah 1000").category, "その他");
    }

    #[test]
    fn only_the_first_number_counts() {
        assert_eq!(fallback_parse("beli 2 onigiri 300 yen").amount_minor, 2);
        assert_eq!(fallback_parse("tanpa angka").amount_minor, 0);
    }

    #[test]
    fn categories_translate_for_the_chat() {
        assert_eq!(normalize_category("食費"), "Makanan");
        assert_eq!(normalize_category("その他"), "Lainnya");
        assert_eq!(normalize_category("Makanan"), "Makanan");
    }
}
