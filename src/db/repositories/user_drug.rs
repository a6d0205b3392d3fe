use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, SqlErr,
};

use crate::entities::user_drugs;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDrug {
    pub id: i32,
    pub user_id: i32,
    pub rxcui: String,
    pub drug_name: String,
    pub created_at: String,
}

impl From<user_drugs::Model> for UserDrug {
    fn from(model: user_drugs::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            rxcui: model.rxcui,
            drug_name: model.drug_name,
            created_at: model.created_at,
        }
    }
}

/// Outcome of inserting a `(user_id, rxcui)` pair.
#[derive(Debug)]
pub enum InsertOutcome {
    Inserted(UserDrug),
    Duplicate,
}

pub struct UserDrugRepository {
    conn: DatabaseConnection,
}

impl UserDrugRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn exists(&self, user_id: i32, rxcui: &str) -> Result<bool> {
        let count = user_drugs::Entity::find()
            .filter(user_drugs::Column::UserId.eq(user_id))
            .filter(user_drugs::Column::Rxcui.eq(rxcui))
            .count(&self.conn)
            .await
            .context("Failed to check user drug existence")?;

        Ok(count > 0)
    }

    /// Inserts the row, reporting a unique index violation as
    /// [`InsertOutcome::Duplicate`] rather than an error.
    pub async fn insert(&self, user_id: i32, rxcui: &str, drug_name: &str) -> Result<InsertOutcome> {
        let active = user_drugs::ActiveModel {
            user_id: Set(user_id),
            rxcui: Set(rxcui.to_string()),
            drug_name: Set(drug_name.to_string()),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        match active.insert(&self.conn).await {
            Ok(model) => Ok(InsertOutcome::Inserted(UserDrug::from(model))),
            Err(e) if is_unique_violation(&e) => Ok(InsertOutcome::Duplicate),
            Err(e) => Err(e).context("Failed to insert user drug"),
        }
    }

    /// Returns `false` when the user had no such drug.
    pub async fn delete(&self, user_id: i32, rxcui: &str) -> Result<bool> {
        let result = user_drugs::Entity::delete_many()
            .filter(user_drugs::Column::UserId.eq(user_id))
            .filter(user_drugs::Column::Rxcui.eq(rxcui))
            .exec(&self.conn)
            .await
            .context("Failed to delete user drug")?;

        Ok(result.rows_affected > 0)
    }

    pub async fn list_for_user(&self, user_id: i32) -> Result<Vec<UserDrug>> {
        let rows = user_drugs::Entity::find()
            .filter(user_drugs::Column::UserId.eq(user_id))
            .order_by_asc(user_drugs::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list user drugs")?;

        Ok(rows.into_iter().map(UserDrug::from).collect())
    }
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}
