pub use sea_orm_migration::prelude::*;

mod m20260901_000000_init;
mod m20260901_000001_main_piggybank_unique;
mod m20260901_000002_default_categories;
mod m20260901_000003_budgets;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260901_000000_init::Migration),
            Box::new(m20260901_000001_main_piggybank_unique::Migration),
            Box::new(m20260901_000002_default_categories::Migration),
            Box::new(m20260901_000003_budgets::Migration),
        ]
    }
}
