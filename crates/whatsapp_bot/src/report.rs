//! CSV report rendering for the export flow.

use chrono::{DateTime, Datelike, TimeZone, Utc};
use chrono_tz::Asia::Tokyo;
use engine::{Asset, Money, Transaction};
use uuid::Uuid;

use crate::BotError;
use crate::flow::ExportPeriod;

/// Start of the reporting window, computed in the household's timezone.
///
/// A period of `n` months opens at the first day of the month `n` months
/// back, mirroring how the humans think about "3 bulan terakhir".
pub(crate) fn period_start(period: ExportPeriod, now: DateTime<Utc>) -> DateTime<Utc> {
    let local = now.with_timezone(&Tokyo);
    let months = period.months();

    let total = local.year() * 12 + local.month0() as i32 - months as i32;
    let (year, month0) = (total.div_euclid(12), total.rem_euclid(12));
    Tokyo
        .with_ymd_and_hms(year, month0 as u32 + 1, 1, 0, 0, 0)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(now)
}

pub(crate) fn filename(period: ExportPeriod, now: DateTime<Utc>) -> String {
    let label = period.label().replace(' ', "_");
    format!("Laporan_{label}_{}.csv", now.with_timezone(&Tokyo).format("%Y-%m-%d"))
}

/// Render transactions as CSV, newest first as handed in.
pub(crate) fn render_csv(
    transactions: &[Transaction],
    assets: &[Asset],
) -> Result<Vec<u8>, BotError> {
    let asset_name = |id: Uuid| {
        assets
            .iter()
            .find(|a| a.id == id)
            .map_or("-", |a| a.name.as_str())
    };

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "Tanggal", "Tipe", "Kategori", "Jumlah", "Mata Uang", "Aset", "Catatan",
    ])?;
    for tx in transactions {
        writer.write_record([
            tx.date.with_timezone(&Tokyo).format("%Y-%m-%d").to_string(),
            tx.kind.as_str().to_string(),
            tx.category.clone(),
            Money::new(tx.amount_minor).format(tx.currency),
            tx.currency.code().to_string(),
            asset_name(tx.asset_id).to_string(),
            tx.note.clone().unwrap_or_default(),
        ])?;
    }
    writer
        .into_inner()
        .map_err(|err| BotError::Report(err.to_string()))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use engine::{AssetKind, Currency, OwnerRef, TransactionKind};

    use super::*;

    #[test]
    fn period_start_lands_on_the_first_of_a_month() {
        let now = Utc.with_ymd_and_hms(2026, 8, 15, 12, 0, 0).unwrap();

        let start = period_start(ExportPeriod::ThisMonth, now);
        let local = start.with_timezone(&Tokyo);
        assert_eq!((local.year(), local.month(), local.day()), (2026, 7, 1));

        let start = period_start(ExportPeriod::ThisYear, now);
        let local = start.with_timezone(&Tokyo);
        assert_eq!((local.year(), local.month(), local.day()), (2025, 8, 1));
    }

    #[test]
    fn period_start_crosses_year_boundaries() {
        let now = Utc.with_ymd_and_hms(2026, 2, 10, 0, 0, 0).unwrap();
        let start = period_start(ExportPeriod::LastSixMonths, now);
        let local = start.with_timezone(&Tokyo);
        assert_eq!((local.year(), local.month()), (2025, 8));
    }

    #[test]
    fn filenames_carry_label_and_date() {
        let now = Utc.with_ymd_and_hms(2026, 8, 15, 12, 0, 0).unwrap();
        assert_eq!(
            filename(ExportPeriod::LastThreeMonths, now),
            "Laporan_3_bulan_terakhir_2026-08-15.csv"
        );
    }

    #[test]
    fn csv_lists_transactions_with_asset_names() {
        let owner = OwnerRef::User("u1".to_string());
        let asset = Asset::new(
            owner.clone(),
            "JP".to_string(),
            "PayPay".to_string(),
            AssetKind::EMoney,
            Currency::Jpy,
            0,
            Utc::now(),
        )
        .unwrap();
        let tx = Transaction::new(
            owner,
            asset.id,
            TransactionKind::Expense,
            "Makanan".to_string(),
            850,
            Currency::Jpy,
            Utc::now(),
            Some("makan siang".to_string()),
            "u1".to_string(),
        )
        .unwrap();

        let bytes = render_csv(&[tx], &[asset]).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("Tanggal,Tipe,Kategori"));
        assert!(text.contains("expense,Makanan,¥850,JPY,PayPay,makan siang"));
    }
}
