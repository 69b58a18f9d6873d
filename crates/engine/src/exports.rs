//! Report exports.
//!
//! The bot's export flow renders a CSV report and stores it here behind a
//! one-time token; the web tier serves it for 24 hours and the record is
//! useless afterwards.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use uuid::Uuid;

use crate::EngineError;

#[derive(Clone, Debug, PartialEq)]
pub struct Export {
    pub id: Uuid,
    pub user_id: String,
    pub token: Uuid,
    pub filename: String,
    /// Human label of the requested period ("Bulan ini", …).
    pub period: String,
    pub content: Vec<u8>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "exports")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    #[sea_orm(unique)]
    pub token: String,
    pub filename: String,
    pub period: String,
    pub content: Vec<u8>,
    pub created_at: DateTimeUtc,
    pub expires_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Export> for ActiveModel {
    fn from(export: &Export) -> Self {
        Self {
            id: ActiveValue::Set(export.id.to_string()),
            user_id: ActiveValue::Set(export.user_id.clone()),
            token: ActiveValue::Set(export.token.to_string()),
            filename: ActiveValue::Set(export.filename.clone()),
            period: ActiveValue::Set(export.period.clone()),
            content: ActiveValue::Set(export.content.clone()),
            created_at: ActiveValue::Set(export.created_at),
            expires_at: ActiveValue::Set(export.expires_at),
        }
    }
}

impl TryFrom<Model> for Export {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::ExportNotFound(model.id.clone()))?,
            user_id: model.user_id,
            token: Uuid::parse_str(&model.token)
                .map_err(|_| EngineError::ExportNotFound(model.token.clone()))?,
            filename: model.filename,
            period: model.period,
            content: model.content,
            created_at: model.created_at,
            expires_at: model.expires_at,
        })
    }
}
