//! Event routing.
//!
//! Cancel keywords are checked before any step handler runs. A stored step
//! owns the text until it resolves, except the confirmation steps, which
//! only claim yes/no words and let everything else fall through to the
//! command router, exactly as the humans expect mid-confirmation.

use chrono::{NaiveDate, TimeZone, Utc};
use chrono_tz::Asia::Tokyo;
use engine::{
    Asset, Currency, EngineError, NewAsset, OwnerRef, RecordTransaction, TransactionKind, User,
};

use crate::flow::{
    self, FlowData, PendingReceipt, PendingTransaction, Step, parse_asset_kind,
    parse_balance_digits, parse_country, parse_export_period,
};
use crate::parsing::{self, normalize_category};
use crate::state::{ConversationState, actor_key};
use crate::waha::Button;
use crate::{Bot, BotError, EventKind, IncomingEvent, report, ui};

const CONFIRM_TX_BUTTONS: &[Button] = &[
    Button {
        id: "confirm_transaction",
        title: "✅ Ya, Benar",
    },
    Button {
        id: "cancel_transaction",
        title: "❌ Batal",
    },
];

const CONFIRM_RECEIPT_BUTTONS: &[Button] = &[
    Button {
        id: "confirm_receipt",
        title: "✅ Ya, simpan",
    },
    Button {
        id: "cancel_receipt",
        title: "❌ Batal",
    },
];

#[derive(PartialEq)]
enum Outcome {
    Handled,
    NotHandled,
}

impl Bot {
    /// Entry point for a normalized webhook event.
    ///
    /// Handler failures are reported back to the chat; only transport
    /// failures bubble up to the caller.
    pub async fn handle_event(&self, event: IncomingEvent) -> Result<(), BotError> {
        let from = event.from.clone();

        let Some(user) = self.resolve_user(&from).await? else {
            let url = format!("{}/onboarding", self.frontend_url);
            return self.waha.send_message(&from, &ui::not_registered(&url)).await;
        };

        let owner = OwnerRef::User(user.id.clone());
        let assets = self.engine.assets_for_owner(&owner).await?;
        if assets.is_empty() || user.primary_asset_id.is_none() {
            let text = ui::setup_incomplete(&user.name, &self.frontend_url);
            return self.waha.send_message(&from, &text).await;
        }

        let result = match event.kind {
            EventKind::Text(text) => self.handle_text(&from, &user, &owner, &text).await,
            EventKind::Media { url, mime_type } => {
                self.handle_media(&from, &url, &mime_type).await
            }
            EventKind::Button { id } => self.handle_button(&from, &user, &owner, &id).await,
        };

        if let Err(err) = result {
            tracing::error!(from, "event handling failed: {err}");
            self.waha
                .send_message(&from, &ui::error_message(&err.to_string()))
                .await?;
        }
        Ok(())
    }

    async fn resolve_user(&self, from: &str) -> Result<Option<User>, BotError> {
        let mut phone = actor_key(from);
        if from.contains("@lid")
            && let Some(real) = self.waha.lid_to_phone(&phone).await
        {
            tracing::debug!(from, phone = real, "resolved lid to phone");
            phone = real;
        }
        Ok(self.engine.find_user_by_phone(&phone).await?)
    }

    async fn handle_text(
        &self,
        from: &str,
        user: &User,
        owner: &OwnerRef,
        text: &str,
    ) -> Result<(), BotError> {
        let text = text.trim();

        if let Some(state) = self.store.get(from).await {
            if flow::is_cancel(text) {
                self.store.clear(from).await;
                return self.waha.send_message(from, ui::MSG_CANCELLED).await;
            }
            if self.handle_step(from, user, owner, text, &state).await? == Outcome::Handled {
                return Ok(());
            }
        }

        self.handle_command(from, user, owner, text).await
    }

    async fn handle_step(
        &self,
        from: &str,
        user: &User,
        owner: &OwnerRef,
        text: &str,
        state: &ConversationState,
    ) -> Result<Outcome, BotError> {
        let mut data = state.data.clone();
        match state.step {
            Step::ExportPeriod => {
                let Some(period) = parse_export_period(text) else {
                    self.waha
                        .send_message(from, ui::MSG_INVALID_CHOICE_1_4)
                        .await?;
                    return Ok(Outcome::Handled);
                };
                self.store.clear(from).await;
                self.waha
                    .send_message(from, &ui::export_building(period.label()))
                    .await?;
                match self.build_export(user, owner, period).await {
                    Ok(url) => {
                        self.waha
                            .send_message(from, &ui::export_ready(period.label(), &url))
                            .await?;
                    }
                    Err(err) => {
                        tracing::error!(user = user.id, "export failed: {err}");
                        self.waha.send_message(from, ui::MSG_EXPORT_FAILED).await?;
                    }
                }
            }
            Step::AssetCreateKind => {
                let Some(kind) = parse_asset_kind(text) else {
                    self.waha
                        .send_message(from, ui::MSG_INVALID_CHOICE_1_4)
                        .await?;
                    return Ok(Outcome::Handled);
                };
                data.asset_kind = Some(kind);
                if self
                    .store
                    .advance(from, state.version, Step::AssetCreateCountry, data)
                    .await
                {
                    self.waha.send_message(from, ui::PROMPT_COUNTRY).await?;
                }
            }
            Step::AssetCreateCountry => {
                let Some((country, currency)) = parse_country(text) else {
                    self.waha.send_message(from, ui::MSG_INVALID_CHOICE).await?;
                    return Ok(Outcome::Handled);
                };
                data.country = Some(country.to_string());
                data.currency = Some(currency);
                if self
                    .store
                    .advance(from, state.version, Step::AssetCreateName, data)
                    .await
                {
                    self.waha.send_message(from, ui::PROMPT_ASSET_NAME).await?;
                }
            }
            Step::AssetCreateName => {
                data.name = Some(text.to_string());
                if self
                    .store
                    .advance(from, state.version, Step::AssetCreateBalance, data)
                    .await
                {
                    self.waha
                        .send_message(from, ui::PROMPT_ASSET_BALANCE)
                        .await?;
                }
            }
            Step::AssetCreateBalance => {
                let Some(balance_major) = parse_balance_digits(text) else {
                    self.waha
                        .send_message(from, ui::MSG_INVALID_BALANCE)
                        .await?;
                    return Ok(Outcome::Handled);
                };
                let (Some(kind), Some(country), Some(currency), Some(name)) = (
                    data.asset_kind,
                    data.country.clone(),
                    data.currency,
                    data.name.clone(),
                ) else {
                    self.store.clear(from).await;
                    self.waha.send_message(from, ui::MSG_INVALID_CHOICE).await?;
                    return Ok(Outcome::Handled);
                };
                self.store.clear(from).await;

                let balance_minor = parsing::major_to_minor(balance_major, currency);
                match self
                    .engine
                    .new_asset(NewAsset {
                        owner: owner.clone(),
                        country,
                        name: name.clone(),
                        kind,
                        currency,
                        balance_minor,
                    })
                    .await
                {
                    Ok(asset) => {
                        self.waha
                            .send_message(
                                from,
                                &ui::asset_created(&asset.name, balance_minor, currency),
                            )
                            .await?;
                    }
                    Err(EngineError::ExistingKey(_)) => {
                        self.waha
                            .send_message(from, &ui::asset_exists(&name))
                            .await?;
                    }
                    Err(err) => return Err(err.into()),
                }
            }
            Step::AssetEditChoice => {
                match text.trim() {
                    "3" => {
                        self.store.clear(from).await;
                        self.waha.send_message(from, ui::MSG_CANCELLED).await?;
                    }
                    "1" => {
                        if self
                            .store
                            .advance(from, state.version, Step::AssetEditName, data)
                            .await
                        {
                            self.waha.send_message(from, ui::PROMPT_NEW_NAME).await?;
                        }
                    }
                    "2" => {
                        if self
                            .store
                            .advance(from, state.version, Step::AssetEditBalance, data)
                            .await
                        {
                            self.waha.send_message(from, ui::PROMPT_NEW_BALANCE).await?;
                        }
                    }
                    _ => {
                        self.waha.send_message(from, ui::MSG_INVALID_CHOICE).await?;
                    }
                }
            }
            Step::AssetEditName => {
                let Some(asset_id) = data.asset_id else {
                    self.store.clear(from).await;
                    return Ok(Outcome::Handled);
                };
                self.store.clear(from).await;
                let asset = self.engine.rename_asset(asset_id, owner, text).await?;
                self.waha
                    .send_message(from, &ui::asset_renamed(&asset.name))
                    .await?;
            }
            Step::AssetEditBalance => {
                let Some(asset_id) = data.asset_id else {
                    self.store.clear(from).await;
                    return Ok(Outcome::Handled);
                };
                let Some(balance_major) = parse_balance_digits(text) else {
                    self.waha
                        .send_message(from, ui::MSG_INVALID_BALANCE)
                        .await?;
                    return Ok(Outcome::Handled);
                };
                self.store.clear(from).await;
                let asset = self.engine.asset(asset_id, owner).await?;
                let balance_minor = parsing::major_to_minor(balance_major, asset.currency);
                self.engine
                    .set_asset_balance(asset_id, owner, balance_minor)
                    .await?;
                self.waha
                    .send_message(from, &ui::asset_balance_updated(balance_minor, asset.currency))
                    .await?;
            }
            Step::AssetDeleteConfirm => {
                let Some(asset_id) = data.asset_id else {
                    self.store.clear(from).await;
                    return Ok(Outcome::Handled);
                };
                self.store.clear(from).await;
                if !flow::is_yes(text) {
                    self.waha.send_message(from, ui::MSG_CANCELLED).await?;
                    return Ok(Outcome::Handled);
                }
                let asset = self.engine.asset(asset_id, owner).await?;
                self.engine.delete_asset(asset_id, owner).await?;
                self.waha
                    .send_message(from, &ui::asset_deleted(&asset.name))
                    .await?;
            }
            Step::ConfirmTransaction => {
                if flow::is_yes(text) {
                    self.confirm_pending_transaction(from, user, owner).await?;
                } else if flow::is_no(text) {
                    self.store.clear(from).await;
                    self.waha
                        .send_message(from, ui::MSG_TRANSACTION_CANCELLED)
                        .await?;
                } else {
                    return Ok(Outcome::NotHandled);
                }
            }
            Step::ConfirmReceipt => {
                if flow::is_yes(text) {
                    self.confirm_pending_receipt(from, user, owner).await?;
                } else if flow::is_no(text) {
                    self.store.clear(from).await;
                    self.waha
                        .send_message(from, ui::MSG_RECEIPT_CANCELLED)
                        .await?;
                } else {
                    return Ok(Outcome::NotHandled);
                }
            }
        }
        Ok(Outcome::Handled)
    }

    async fn handle_command(
        &self,
        from: &str,
        user: &User,
        owner: &OwnerRef,
        text: &str,
    ) -> Result<(), BotError> {
        let lower = text.to_lowercase();

        match lower.as_str() {
            "saldo" | "balance" => return self.send_balance_overview(from, user, owner).await,
            "/dompet" | "/wallet" => return self.send_wallet_info(from, user, owner).await,
            "help" | "bantuan" => {
                return self.waha.send_message(from, ui::help_text()).await;
            }
            "export" | "laporan" => {
                self.store
                    .set(from, Step::ExportPeriod, FlowData::default())
                    .await;
                return self.waha.send_message(from, ui::PROMPT_EXPORT_PERIOD).await;
            }
            "tambah aset" => {
                self.store
                    .set(from, Step::AssetCreateKind, FlowData::default())
                    .await;
                return self.waha.send_message(from, ui::PROMPT_ASSET_KIND).await;
            }
            _ => {}
        }

        if let Some(query) = lower.strip_prefix("saldo ").or_else(|| lower.strip_prefix("balance "))
        {
            return self.send_specific_balance(from, user, owner, query.trim()).await;
        }
        if let Some(name) = lower.strip_prefix("edit aset") {
            return self
                .start_asset_flow(from, owner, name.trim(), "edit aset")
                .await;
        }
        if let Some(name) = lower.strip_prefix("hapus aset") {
            return self
                .start_asset_flow(from, owner, name.trim(), "hapus aset")
                .await;
        }

        // No digits means it is not a transaction, just chatter.
        if !text.chars().any(|c| c.is_ascii_digit()) {
            let seed = Utc::now().timestamp() as u64;
            return self
                .waha
                .send_message(from, &ui::greeting(&user.name, seed))
                .await;
        }

        self.start_transaction_confirmation(from, user, owner, text)
            .await
    }

    async fn send_balance_overview(
        &self,
        from: &str,
        user: &User,
        owner: &OwnerRef,
    ) -> Result<(), BotError> {
        let assets = self.engine.assets_for_owner(owner).await?;
        if assets.is_empty() {
            return self.waha.send_message(from, ui::MSG_NO_ASSETS).await;
        }
        let totals = self.engine.balance_totals(owner).await?;
        let text = ui::balance_overview(&assets, &totals, user.primary_asset_id);
        self.waha.send_message(from, &text).await
    }

    async fn send_specific_balance(
        &self,
        from: &str,
        user: &User,
        owner: &OwnerRef,
        query: &str,
    ) -> Result<(), BotError> {
        if let Ok(currency) = Currency::try_from(query) {
            let assets: Vec<Asset> = self
                .engine
                .assets_for_owner(owner)
                .await?
                .into_iter()
                .filter(|a| a.currency == currency)
                .collect();
            if assets.is_empty() {
                return self
                    .waha
                    .send_message(from, &ui::no_assets_in_currency(currency))
                    .await;
            }
            let text = ui::currency_balance(currency, &assets, user.primary_asset_id);
            return self.waha.send_message(from, &text).await;
        }

        match self.engine.find_asset_by_name(owner, query).await? {
            Some(asset) => {
                self.waha
                    .send_message(from, &ui::asset_balance(&asset))
                    .await
            }
            None => {
                self.waha
                    .send_message(from, &ui::asset_not_found(query))
                    .await
            }
        }
    }

    async fn send_wallet_info(
        &self,
        from: &str,
        user: &User,
        owner: &OwnerRef,
    ) -> Result<(), BotError> {
        let primary = match user.primary_asset_id {
            Some(id) => self.engine.asset(id, owner).await.ok(),
            None => None,
        };
        let text = ui::wallet_info(primary.as_ref(), &self.frontend_url);
        self.waha.send_message(from, &text).await
    }

    /// Shared entry for `edit aset <nama>` and `hapus aset <nama>`.
    async fn start_asset_flow(
        &self,
        from: &str,
        owner: &OwnerRef,
        name: &str,
        command: &str,
    ) -> Result<(), BotError> {
        if name.is_empty() {
            let assets = self.engine.assets_for_owner(owner).await?;
            return self
                .waha
                .send_message(from, &ui::ask_asset_name(command, &assets))
                .await;
        }
        let Some(asset) = self.engine.find_asset_by_name(owner, name).await? else {
            return self
                .waha
                .send_message(from, &ui::asset_not_found(name))
                .await;
        };

        let data = FlowData {
            asset_id: Some(asset.id),
            ..Default::default()
        };
        if command == "hapus aset" {
            self.store.set(from, Step::AssetDeleteConfirm, data).await;
            self.waha
                .send_message(from, &ui::delete_confirm(&asset.name))
                .await
        } else {
            self.store.set(from, Step::AssetEditChoice, data).await;
            self.waha.send_message(from, ui::PROMPT_EDIT_CHOICE).await
        }
    }

    async fn start_transaction_confirmation(
        &self,
        from: &str,
        user: &User,
        owner: &OwnerRef,
        text: &str,
    ) -> Result<(), BotError> {
        let assets = self.engine.assets_for_owner(owner).await?;
        let asset_names: Vec<String> = assets.iter().map(|a| a.name.clone()).collect();
        let parsed = self.gemini.parse_transaction(text, &asset_names).await;

        let mut asset = None;
        if let Some(name) = &parsed.asset_name {
            asset = self.engine.find_asset_by_name(owner, name).await?;
        }
        if asset.is_none() {
            asset = self
                .engine
                .find_asset_by_currency(owner, parsed.currency)
                .await?;
        }
        if asset.is_none()
            && let Some(id) = user.primary_asset_id
        {
            asset = self.engine.asset(id, owner).await.ok();
        }
        let Some(asset) = asset else {
            return self.waha.send_message(from, ui::MSG_NO_PRIMARY).await;
        };

        // The asset's currency wins; a mismatched parse keeps its number but
        // is recorded in the asset's currency, after the warning below.
        let pending = PendingTransaction {
            kind: parsed.kind,
            category: normalize_category(&parsed.category),
            amount_minor: rescale(parsed.amount_minor, parsed.currency, asset.currency),
            asset_id: asset.id,
            description: parsed.description.clone(),
        };
        let data = FlowData {
            transaction: Some(pending),
            ..Default::default()
        };
        self.store.set(from, Step::ConfirmTransaction, data).await;

        self.waha
            .send_buttons(from, &ui::confirm_transaction(&parsed, &asset), CONFIRM_TX_BUTTONS)
            .await
    }

    async fn handle_media(&self, from: &str, url: &str, mime_type: &str) -> Result<(), BotError> {
        if !mime_type.starts_with("image/") {
            return self.waha.send_message(from, ui::MSG_UNSUPPORTED).await;
        }
        let bytes = match self.waha.download_media(url).await {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::warn!(from, "media download failed: {err}");
                return self.waha.send_message(from, ui::MSG_MEDIA_FAILED).await;
            }
        };
        let scan = match self.gemini.scan_receipt(&bytes, mime_type).await {
            Ok(scan) => scan,
            Err(err) => {
                tracing::warn!(from, "receipt scan failed: {err}");
                return self.waha.send_message(from, ui::MSG_MEDIA_FAILED).await;
            }
        };

        let data = FlowData {
            receipt: Some(PendingReceipt {
                amount_minor: scan.amount_minor,
                date: scan.date.clone(),
                merchant: scan.merchant.clone(),
                category: normalize_category(&scan.category),
                currency: scan.currency,
            }),
            ..Default::default()
        };
        self.store.set(from, Step::ConfirmReceipt, data).await;

        self.waha
            .send_buttons(from, &ui::receipt_detected(&scan), CONFIRM_RECEIPT_BUTTONS)
            .await
    }

    async fn handle_button(
        &self,
        from: &str,
        user: &User,
        owner: &OwnerRef,
        id: &str,
    ) -> Result<(), BotError> {
        match id {
            "confirm_transaction" => self.confirm_pending_transaction(from, user, owner).await,
            "cancel_transaction" => {
                self.store.clear(from).await;
                self.waha
                    .send_message(from, ui::MSG_TRANSACTION_CANCELLED)
                    .await
            }
            "confirm_receipt" => self.confirm_pending_receipt(from, user, owner).await,
            "cancel_receipt" => {
                self.store.clear(from).await;
                self.waha.send_message(from, ui::MSG_RECEIPT_CANCELLED).await
            }
            other => {
                tracing::warn!(from, button = other, "unknown button id");
                Ok(())
            }
        }
    }

    async fn confirm_pending_transaction(
        &self,
        from: &str,
        user: &User,
        owner: &OwnerRef,
    ) -> Result<(), BotError> {
        let (pending, version) = match self.store.get(from).await {
            Some(state) if state.step == Step::ConfirmTransaction => {
                (state.data.transaction, state.version)
            }
            _ => (None, 0),
        };
        let Some(pending) = pending else {
            return self.waha.send_message(from, ui::MSG_PENDING_EXPIRED).await;
        };
        // Webhooks arrive at-least-once; only the delivery that takes the
        // slot gets to commit, the duplicate is dropped.
        if !self.store.take(from, version).await {
            return Ok(());
        }

        let cmd = RecordTransaction {
            asset_id: pending.asset_id,
            category: pending.category,
            amount_minor: pending.amount_minor,
            date: Utc::now(),
            note: Some(pending.description),
            created_by: user.id.clone(),
        };
        let result = match pending.kind {
            TransactionKind::Income => self.engine.record_income(owner, cmd).await,
            TransactionKind::Expense => self.engine.record_expense(owner, cmd).await,
        };
        match result {
            Ok(tx) => {
                let asset = self.engine.asset(tx.asset_id, owner).await?;
                let text = ui::transaction_recorded(&tx, &asset, asset.balance_minor);
                self.waha.send_message(from, &text).await
            }
            Err(EngineError::InsufficientBalance(_)) => {
                self.waha.send_message(from, ui::MSG_INSUFFICIENT).await
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn confirm_pending_receipt(
        &self,
        from: &str,
        user: &User,
        owner: &OwnerRef,
    ) -> Result<(), BotError> {
        let (pending, version) = match self.store.get(from).await {
            Some(state) if state.step == Step::ConfirmReceipt => {
                (state.data.receipt, state.version)
            }
            _ => (None, 0),
        };
        let Some(receipt) = pending else {
            return self.waha.send_message(from, ui::MSG_RECEIPT_EXPIRED).await;
        };

        let mut asset = self
            .engine
            .find_asset_by_currency(owner, receipt.currency)
            .await?;
        if asset.is_none()
            && let Some(id) = user.primary_asset_id
        {
            asset = self.engine.asset(id, owner).await.ok();
        }
        let Some(asset) = asset else {
            return self.waha.send_message(from, ui::MSG_NO_PRIMARY).await;
        };
        // Same single-commit rule as text confirmations: the duplicate
        // delivery fails to take the slot and is dropped.
        if !self.store.take(from, version).await {
            return Ok(());
        }

        let cmd = RecordTransaction {
            asset_id: asset.id,
            category: receipt.category.clone(),
            amount_minor: rescale(receipt.amount_minor, receipt.currency, asset.currency),
            date: receipt_date(&receipt.date),
            note: Some(format!("Receipt from {}", receipt.merchant)),
            created_by: user.id.clone(),
        };
        match self.engine.record_expense(owner, cmd).await {
            Ok(tx) => {
                let asset = self.engine.asset(tx.asset_id, owner).await?;
                let text = ui::receipt_saved(
                    &tx.category,
                    tx.amount_minor,
                    tx.currency,
                    &receipt.merchant,
                    asset.balance_minor,
                );
                self.waha.send_message(from, &text).await
            }
            Err(EngineError::InsufficientBalance(_)) => {
                self.waha.send_message(from, ui::MSG_INSUFFICIENT).await
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Render and store a CSV report, returning its download URL.
    async fn build_export(
        &self,
        user: &User,
        owner: &OwnerRef,
        period: flow::ExportPeriod,
    ) -> Result<String, BotError> {
        let now = Utc::now();
        let start = report::period_start(period, now);
        let transactions = self.engine.list_transactions(owner, Some(start), None).await?;
        let assets = self.engine.assets_for_owner(owner).await?;

        let content = report::render_csv(&transactions, &assets)?;
        let filename = report::filename(period, now);
        let export = self
            .engine
            .create_export(&user.id, &filename, period.label(), content)
            .await?;
        Ok(format!("{}/exports/{}", self.public_url, export.token))
    }
}

/// Re-express an amount in another currency keeping its major-unit number;
/// `¥500` read against an IDR wallet becomes `Rp500`.
fn rescale(amount_minor: i64, from: Currency, to: Currency) -> i64 {
    if from == to {
        return amount_minor;
    }
    let major = amount_minor / 10i64.pow(u32::from(from.minor_units()));
    parsing::major_to_minor(major, to)
}

/// Receipt dates arrive as `YYYY-MM-DD`; unparseable ones fall back to now.
fn receipt_date(date: &str) -> chrono::DateTime<Utc> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .and_then(|dt| Tokyo.from_local_datetime(&dt).single())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(Utc::now)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rescale_keeps_the_major_number() {
        assert_eq!(rescale(500, Currency::Jpy, Currency::Jpy), 500);
        assert_eq!(rescale(500, Currency::Jpy, Currency::Idr), 50_000);
        assert_eq!(rescale(50_000, Currency::Idr, Currency::Jpy), 500);
    }

    #[test]
    fn receipt_dates_parse_or_default() {
        let parsed = receipt_date("2026-01-11");
        assert_eq!(parsed.with_timezone(&Tokyo).format("%Y-%m-%d").to_string(), "2026-01-11");
        // Garbage falls back to roughly now.
        let fallback = receipt_date("soon");
        assert!((Utc::now() - fallback).num_seconds() < 5);
    }
}
