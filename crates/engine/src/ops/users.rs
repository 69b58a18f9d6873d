//! User lookups for the messaging tier.

use sea_orm::{ActiveModelTrait, ActiveValue, EntityTrait};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, User, users, users::normalize_phone};

use super::Engine;

impl Engine {
    pub async fn user(&self, user_id: &str) -> ResultEngine<User> {
        let model = users::Entity::find_by_id(user_id)
            .one(self.database())
            .await?
            .ok_or_else(|| EngineError::InvalidId(format!("unknown user: {user_id}")))?;
        User::try_from(model)
    }

    /// Register a user. The id must be fresh.
    pub async fn new_user(&self, user: &User) -> ResultEngine<()> {
        if users::Entity::find_by_id(&user.id)
            .one(self.database())
            .await?
            .is_some()
        {
            return Err(EngineError::ExistingKey(user.id.clone()));
        }
        users::ActiveModel::from(user).insert(self.database()).await?;
        Ok(())
    }

    /// Resolve a user by phone number.
    ///
    /// Both sides are normalized with [`normalize_phone`] so `0812…`,
    /// `+62 812…` and `62812…` all match the same record.
    pub async fn find_user_by_phone(&self, phone: &str) -> ResultEngine<Option<User>> {
        let wanted = normalize_phone(phone);
        if wanted.is_empty() {
            return Ok(None);
        }
        let models = users::Entity::find().all(self.database()).await?;
        for model in models {
            if let Some(stored) = &model.phone
                && normalize_phone(stored) == wanted
            {
                return Ok(Some(User::try_from(model)?));
            }
        }
        Ok(None)
    }

    /// Remember which asset is the user's primary wallet.
    pub async fn set_primary_asset(&self, user_id: &str, asset_id: Uuid) -> ResultEngine<()> {
        self.user(user_id).await?;
        users::ActiveModel {
            id: ActiveValue::Set(user_id.to_string()),
            primary_asset_id: ActiveValue::Set(Some(asset_id.to_string())),
            ..Default::default()
        }
        .update(self.database())
        .await?;
        Ok(())
    }
}
