//! Stored report exports.

use chrono::{Duration, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::{EngineError, Export, ResultEngine, exports};

use super::Engine;

/// How long a generated export stays downloadable.
const EXPORT_TTL_HOURS: i64 = 24;

impl Engine {
    /// Store a rendered report and return the record carrying its download
    /// token.
    pub async fn create_export(
        &self,
        user_id: &str,
        filename: &str,
        period: &str,
        content: Vec<u8>,
    ) -> ResultEngine<Export> {
        let now = Utc::now();
        let export = Export {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            token: Uuid::new_v4(),
            filename: filename.to_string(),
            period: period.to_string(),
            content,
            created_at: now,
            expires_at: now + Duration::hours(EXPORT_TTL_HOURS),
        };
        exports::ActiveModel::from(&export)
            .insert(self.database())
            .await?;
        Ok(export)
    }

    /// Fetch an export by its download token.
    ///
    /// Expired records answer the same way as missing ones.
    pub async fn take_export(&self, token: Uuid) -> ResultEngine<Export> {
        let model = exports::Entity::find()
            .filter(exports::Column::Token.eq(token.to_string()))
            .one(self.database())
            .await?
            .ok_or_else(|| EngineError::ExportNotFound(token.to_string()))?;
        let export = Export::try_from(model)?;
        if export.expires_at <= Utc::now() {
            return Err(EngineError::ExportNotFound(token.to_string()));
        }
        Ok(export)
    }
}
