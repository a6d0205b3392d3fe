use crate::entities::prelude::*;
use crate::entities::user_drugs;
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

#[derive(DeriveMigrationName)]
pub struct Migration;

const UNIQUE_USER_RXCUI: &str = "idx_user_drugs_user_id_rxcui";

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        manager
            .create_table(
                schema
                    .create_table_from_entity(UserDrugs)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name(UNIQUE_USER_RXCUI)
                    .table(UserDrugs)
                    .col(user_drugs::Column::UserId)
                    .col(user_drugs::Column::Rxcui)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name(UNIQUE_USER_RXCUI)
                    .table(UserDrugs)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(UserDrugs).to_owned())
            .await?;

        Ok(())
    }
}
