use chrono::Utc;
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, TransactionTrait, prelude::*, sea_query::Expr,
};

use crate::{
    EngineError, ResultEngine, User, users,
    util::{new_public_token, normalize_required_name},
};

use super::{Engine, with_tx};

impl Engine {
    /// Create a user. Nicknames are unique (case insensitive).
    pub async fn new_user(&self, nickname: &str, email: &str) -> ResultEngine<User> {
        let nickname = normalize_required_name(nickname, "user")?;
        let email = email.trim().to_string();
        with_tx!(self, |db_tx| {
            let exists = users::Entity::find()
                .filter(Expr::cust("LOWER(nickname)").eq(nickname.to_lowercase()))
                .one(&db_tx)
                .await?
                .is_some();
            if exists {
                return Err(EngineError::ExistingKey(nickname));
            }

            let model = users::ActiveModel {
                id: ActiveValue::NotSet,
                uuid: ActiveValue::Set(new_public_token()),
                nickname: ActiveValue::Set(nickname.clone()),
                email: ActiveValue::Set(email),
                created_at: ActiveValue::Set(Utc::now()),
            }
            .insert(&db_tx)
            .await?;
            tracing::info!(user_id = model.id, nickname = %model.nickname, "user created");
            Ok(User::from(model))
        })
    }

    /// Return a user by id.
    pub async fn user(&self, id: i64) -> ResultEngine<User> {
        with_tx!(self, |db_tx| {
            let model = self.require_user(&db_tx, id).await?;
            Ok(User::from(model))
        })
    }

    pub(super) async fn require_user(
        &self,
        db_tx: &DatabaseTransaction,
        id: i64,
    ) -> ResultEngine<users::Model> {
        users::Entity::find_by_id(id)
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::InvalidId(format!("user {id} not exists")))
    }
}
