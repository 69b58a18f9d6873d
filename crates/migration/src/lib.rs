pub use sea_orm_migration::prelude::*;

mod m20260110_000001_users;
mod m20260110_000002_assets;
mod m20260110_000003_transactions;
mod m20260210_000001_exports;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260110_000001_users::Migration),
            Box::new(m20260110_000002_assets::Migration),
            Box::new(m20260110_000003_transactions::Migration),
            Box::new(m20260210_000001_exports::Migration),
        ]
    }
}
