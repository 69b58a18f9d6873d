//! Chat copy. All user-facing text lives here, in Indonesian.

use engine::{Asset, Currency, Money, Transaction, TransactionKind};
use uuid::Uuid;

use crate::gemini::ReceiptScan;
use crate::parsing::{ParsedTransaction, normalize_category};

pub(crate) const MSG_CANCELLED: &str = "✅ Dibatalkan.";
pub(crate) const MSG_TRANSACTION_CANCELLED: &str = "❌ Transaksi dibatalkan.";
pub(crate) const MSG_RECEIPT_CANCELLED: &str = "❌ Pengeluaran dibatalkan.";
pub(crate) const MSG_NO_ASSETS: &str =
    "❌ Anda belum memiliki asset.\n\nSilakan buat asset dengan 'tambah aset' terlebih dahulu.";
pub(crate) const MSG_NO_PRIMARY: &str =
    "❌ Tidak dapat menentukan asset untuk transaksi ini.\n\nSilakan set dompet utama dengan perintah /dompet";
pub(crate) const MSG_MEDIA_FAILED: &str = "❌ Gagal memproses gambar. Silakan coba lagi.";
pub(crate) const MSG_UNSUPPORTED: &str =
    "❓ Maaf, tipe pesan tidak didukung.\n\nKirim teks seperti: makan 850\natau foto struk belanja.";
pub(crate) const MSG_INVALID_CHOICE: &str = "❌ Pilihan tidak valid.";
pub(crate) const MSG_INVALID_CHOICE_1_4: &str =
    "❌ Pilihan tidak valid. Ketik angka 1-4 atau 'batal'";
pub(crate) const MSG_INVALID_BALANCE: &str = "❌ Saldo tidak valid.";
pub(crate) const MSG_EXPORT_FAILED: &str = "❌ Gagal membuat laporan.";
pub(crate) const MSG_INSUFFICIENT: &str =
    "❌ Saldo tidak cukup untuk transaksi ini.";
pub(crate) const MSG_PENDING_EXPIRED: &str =
    "❌ Data transaksi sudah kadaluarsa. Silakan kirim ulang.";
pub(crate) const MSG_RECEIPT_EXPIRED: &str =
    "❌ Data struk sudah kadaluarsa. Silakan kirim ulang foto struk.";

pub(crate) const PROMPT_EXPORT_PERIOD: &str = "Pilih periode laporan:\n\n1. Bulan ini\n2. 3 bulan terakhir\n3. 6 bulan terakhir\n4. Tahun ini\n\nKetik angka pilihan atau 'batal'";
pub(crate) const PROMPT_ASSET_KIND: &str =
    "Jenis aset?\n\n1. Tabungan\n2. E-money\n3. Investasi\n4. Cash";
pub(crate) const PROMPT_COUNTRY: &str = "Negara?\n\n1. Jepang (JPY)\n2. Indonesia (IDR)";
pub(crate) const PROMPT_ASSET_NAME: &str = "Nama aset?";
pub(crate) const PROMPT_ASSET_BALANCE: &str = "Saldo awal?";
pub(crate) const PROMPT_EDIT_CHOICE: &str =
    "Mau ubah apa?\n\n1. Nama\n2. Saldo\n3. Batal";
pub(crate) const PROMPT_NEW_NAME: &str = "Nama baru?";
pub(crate) const PROMPT_NEW_BALANCE: &str = "Saldo baru?";

pub(crate) fn amount(minor: i64, currency: Currency) -> String {
    Money::new(minor).format(currency)
}

fn star(asset: &Asset, primary: Option<Uuid>) -> &'static str {
    if primary == Some(asset.id) { " 🌟" } else { "" }
}

/// `saldo` with no argument: every asset, plus per-currency totals when more
/// than one currency is in play.
pub(crate) fn balance_overview(
    assets: &[Asset],
    totals: &[(Currency, i64)],
    primary: Option<Uuid>,
) -> String {
    let mut message = "💰 *Total Saldo Anda*\n\n".to_string();
    for asset in assets {
        message.push_str(&format!(
            "• {}{}: {}\n",
            asset.name,
            star(asset, primary),
            amount(asset.balance_minor, asset.currency)
        ));
    }
    if totals.len() > 1 {
        message.push_str("\n*Total per Mata Uang:*\n");
        for (currency, total) in totals {
            message.push_str(&format!("• {}\n", amount(*total, *currency)));
        }
    }
    message
}

pub(crate) fn currency_balance(
    currency: Currency,
    assets: &[Asset],
    primary: Option<Uuid>,
) -> String {
    let mut message = format!("💰 *Saldo {}*\n\n", currency.code());
    let mut total = 0i64;
    for asset in assets {
        message.push_str(&format!(
            "• {}{}: {}\n",
            asset.name,
            star(asset, primary),
            amount(asset.balance_minor, asset.currency)
        ));
        total += asset.balance_minor;
    }
    message.push_str(&format!("\n*Total: {}*", amount(total, currency)));
    message
}

pub(crate) fn asset_balance(asset: &Asset) -> String {
    format!(
        "💰 *Saldo {}*\n\n{}",
        asset.name,
        amount(asset.balance_minor, asset.currency)
    )
}

pub(crate) fn asset_not_found(query: &str) -> String {
    format!("❌ Asset '{query}' tidak ditemukan.\n\nKirim 'saldo' untuk melihat semua asset Anda.")
}

pub(crate) fn no_assets_in_currency(currency: Currency) -> String {
    format!(
        "❌ Anda tidak memiliki asset dengan mata uang {}.",
        currency.code()
    )
}

pub(crate) fn wallet_info(primary: Option<&Asset>, frontend_url: &str) -> String {
    let current = match primary {
        Some(asset) => format!("*{}* 🌟", asset.name),
        None => "Belum diset".to_string(),
    };
    format!(
        "🏦 *Dompet Utama*\n\nDompet utama saat ini: {current}\n\n\
         Untuk mengganti dompet utama, silakan buka:\n{frontend_url}/assets"
    )
}

pub(crate) fn help_text() -> &'static str {
    "📱 *Panduan Kanemane WhatsApp Bot*\n\n\
     Cara mencatat transaksi:\n\
     • Kirim teks: \"makan 850\" atau \"gajian 5000000\"\n\
     • Sebutkan asset: \"jajan 500 pake PayPay\"\n\
     • Atau foto struk belanja\n\n\
     Perintah:\n\
     • saldo - Cek semua saldo\n\
     • saldo [nama asset] - Cek saldo spesifik\n\
     • saldo JPY - Cek total saldo JPY\n\
     • /dompet - Kelola dompet utama\n\
     • export - Unduh laporan\n\
     • tambah aset / edit aset / hapus aset\n\
     • help - Panduan ini"
}

/// Picked by a rolling seed rather than an RNG; variety is all that matters.
pub(crate) fn greeting(name: &str, seed: u64) -> String {
    let greetings = [
        format!("Halo {name}! Jajan apa hari ini? 🍜"),
        format!("Konnichiwa {name}! Belanja apa hari ini? 🛍️"),
        format!("Hai {name}! Ada pengeluaran baru? 💸"),
        format!("Halo {name}! Mau catat transaksi? 📝"),
        format!("Konnichiwa! Gimana kabar keuangan hari ini, {name}? 💰"),
    ];
    let index = (seed as usize) % greetings.len();
    greetings[index].clone()
}

pub(crate) fn confirm_transaction(parsed: &ParsedTransaction, asset: &Asset) -> String {
    let type_label = match parsed.kind {
        TransactionKind::Income => "Pemasukan",
        TransactionKind::Expense => "Pengeluaran",
    };
    let mut message = format!(
        "📝 *Konfirmasi Transaksi*\n\n\
         Tipe: {type_label}\n\
         Item: {}\n\
         Jumlah: {}\n\
         Kategori: {}\n\
         Asset: {} ({})\n\n",
        parsed.description,
        amount(parsed.amount_minor, parsed.currency),
        normalize_category(&parsed.category),
        asset.name,
        asset.currency.code(),
    );
    if parsed.currency != asset.currency {
        message.push_str(&format!(
            "⚠️ *Perhatian*: Mata uang transaksi ({}) beda dengan asset ({}).\n\n",
            parsed.currency.code(),
            asset.currency.code()
        ));
    }
    message.push_str("Apakah data ini benar?");
    message
}

pub(crate) fn transaction_recorded(tx: &Transaction, asset: &Asset, new_balance: i64) -> String {
    let headline = match tx.kind {
        TransactionKind::Income => "✅ *Pemasukan tercatat!*",
        TransactionKind::Expense => "✅ *Pengeluaran tercatat!*",
    };
    format!(
        "{headline}\n\n\
         Asset: {}\n\
         Kategori: {}\n\
         Jumlah: {}\n\
         Note: {}\n\n\
         💰 Saldo: {}",
        asset.name,
        tx.category,
        amount(tx.amount_minor, tx.currency),
        tx.note.as_deref().unwrap_or("-"),
        amount(new_balance, asset.currency),
    )
}

pub(crate) fn receipt_detected(scan: &ReceiptScan) -> String {
    format!(
        "📄 *Struk terdeteksi!*\n\n\
         Merchant: {}\n\
         Tanggal: {}\n\
         Total: {}\n\
         Kategori: {}\n\n\
         Simpan pengeluaran ini?",
        scan.merchant,
        scan.date,
        amount(scan.amount_minor, scan.currency),
        normalize_category(&scan.category),
    )
}

pub(crate) fn receipt_saved(
    category: &str,
    amount_minor: i64,
    currency: Currency,
    merchant: &str,
    new_balance: i64,
) -> String {
    format!(
        "✅ *Pengeluaran tersimpan!*\n\n\
         Kategori: {category}\n\
         Jumlah: {}\n\
         Merchant: {merchant}\n\n\
         💰 Saldo: {}",
        amount(amount_minor, currency),
        amount(new_balance, currency),
    )
}

pub(crate) fn export_ready(period_label: &str, download_url: &str) -> String {
    format!(
        "✅ *Laporan {period_label} siap!*\n\n📥 Download: {download_url}\n\nLink berlaku 24 jam"
    )
}

pub(crate) fn export_building(period_label: &str) -> String {
    format!("⏳ Membuat laporan {period_label}...")
}

pub(crate) fn asset_created(name: &str, balance_minor: i64, currency: Currency) -> String {
    format!(
        "✅ Aset *{name}* berhasil ditambahkan dengan saldo {}",
        amount(balance_minor, currency)
    )
}

pub(crate) fn asset_exists(name: &str) -> String {
    format!("❌ Aset dengan nama *{name}* sudah ada.")
}

pub(crate) fn asset_renamed(name: &str) -> String {
    format!("✅ Nama aset diubah menjadi *{name}*")
}

pub(crate) fn asset_balance_updated(balance_minor: i64, currency: Currency) -> String {
    format!("✅ Saldo diubah menjadi {}", amount(balance_minor, currency))
}

pub(crate) fn asset_deleted(name: &str) -> String {
    format!("✅ Aset *{name}* berhasil dihapus")
}

pub(crate) fn delete_confirm(name: &str) -> String {
    format!(
        "⚠️ Hapus aset *{name}* beserta semua transaksinya?\n\nKetik 'ya' untuk menghapus atau 'batal'"
    )
}

/// `edit aset` / `hapus aset` without a name: list what the user has.
pub(crate) fn ask_asset_name(command: &str, assets: &[Asset]) -> String {
    let mut message = format!("Sebutkan nama asetnya, contoh: {command} PayPay\n\nAset kamu:\n");
    for asset in assets {
        message.push_str(&format!("• {} ({})\n", asset.name, asset.currency.code()));
    }
    message
}

pub(crate) fn setup_incomplete(name: &str, frontend_url: &str) -> String {
    format!(
        "Halo {name}! 👋\n\nKamu belum menyelesaikan setup awal nih.\n\nYuk lengkapi di sini:\n{frontend_url}/onboarding"
    )
}

pub(crate) fn not_registered(onboarding_url: &str) -> String {
    format!(
        "Halo! 👋\n\nNomor kamu sepertinya belum terdaftar nih.\n\nDaftarin di sini ya:\n{onboarding_url}"
    )
}

pub(crate) fn error_message(detail: &str) -> String {
    format!("❌ Terjadi kesalahan: {detail}")
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use engine::{AssetKind, OwnerRef};

    use super::*;

    fn asset(name: &str, currency: Currency, balance: i64) -> Asset {
        Asset::new(
            OwnerRef::User("u1".to_string()),
            "JP".to_string(),
            name.to_string(),
            AssetKind::EMoney,
            currency,
            balance,
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn overview_marks_the_primary_asset() {
        let a = asset("PayPay", Currency::Jpy, 1_250);
        let b = asset("Gopay", Currency::Idr, 10_50);
        let totals = vec![(Currency::Jpy, 1_250), (Currency::Idr, 10_50)];
        let text = balance_overview(&[a.clone(), b], &totals, Some(a.id));

        assert!(text.contains("PayPay 🌟: ¥1.250"));
        assert!(text.contains("Gopay: Rp10,50"));
        assert!(text.contains("Total per Mata Uang"));
    }

    #[test]
    fn single_currency_overview_skips_totals() {
        let a = asset("PayPay", Currency::Jpy, 500);
        let text = balance_overview(&[a], &[(Currency::Jpy, 500)], None);
        assert!(!text.contains("Total per Mata Uang"));
    }

    #[test]
    fn greeting_rotates_with_the_seed() {
        let first = greeting("Aya", 0);
        let second = greeting("Aya", 1);
        assert_ne!(first, second);
        assert!(first.contains("Aya"));
        // Seeds wrap around.
        assert_eq!(greeting("Aya", 0), greeting("Aya", 5));
    }

    #[test]
    fn mismatched_currency_warns_in_confirmation() {
        let wallet = asset("PayPay", Currency::Jpy, 0);
        let parsed = ParsedTransaction {
            kind: TransactionKind::Expense,
            category: "食費".to_string(),
            amount_minor: 50_000_00,
            currency: Currency::Idr,
            asset_name: None,
            description: "oleh-oleh".to_string(),
        };
        let text = confirm_transaction(&parsed, &wallet);
        assert!(text.contains("⚠️"));
        assert!(text.contains("Kategori: Makanan"));
    }
}
