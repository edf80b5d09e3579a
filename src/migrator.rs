use anyhow::Result;
use sea_orm::{ConnectOptions, Database};
use sea_orm_migration::prelude::*;
use std::time::Duration;
use tracing::{error, info};

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_expense_categories_table::Migration),
            Box::new(m20250301_000002_create_shipments_table::Migration),
            Box::new(m20250301_000003_create_shipment_items_table::Migration),
            Box::new(m20250301_000004_create_shared_costs_table::Migration),
            Box::new(m20250301_000005_create_shared_cost_allocations_table::Migration),
            Box::new(m20250301_000006_create_product_cost_prices_table::Migration),
        ]
    }
}

mod m20250301_000001_create_expense_categories_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000001_create_expense_categories_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ExpenseCategories::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ExpenseCategories::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ExpenseCategories::Name).string().not_null())
                        .col(
                            ColumnDef::new(ExpenseCategories::AllowsItemOverride)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(ExpenseCategories::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(ExpenseCategories::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ExpenseCategories::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum ExpenseCategories {
        Table,
        Id,
        Name,
        AllowsItemOverride,
        IsActive,
        CreatedAt,
    }
}

mod m20250301_000002_create_shipments_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000002_create_shipments_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Shipments::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Shipments::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Shipments::Name).string().not_null())
                        .col(ColumnDef::new(Shipments::ShipmentDate).date().not_null())
                        .col(
                            ColumnDef::new(Shipments::CalculationMethod)
                                .string_len(32)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Shipments::BaseCurrency)
                                .string_len(3)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Shipments::ExchangeRate)
                                .string_len(40)
                                .not_null()
                                .default("1"),
                        )
                        .col(
                            ColumnDef::new(Shipments::Status)
                                .string_len(16)
                                .not_null()
                                .default("draft"),
                        )
                        .col(
                            ColumnDef::new(Shipments::IsFinalized)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Shipments::TotalBaseCost)
                                .string_len(40)
                                .not_null()
                                .default("0"),
                        )
                        .col(
                            ColumnDef::new(Shipments::TotalSharedCost)
                                .string_len(40)
                                .not_null()
                                .default("0"),
                        )
                        .col(
                            ColumnDef::new(Shipments::TotalLandedCost)
                                .string_len(40)
                                .not_null()
                                .default("0"),
                        )
                        .col(
                            ColumnDef::new(Shipments::TotalLandedCostConverted)
                                .string_len(40)
                                .not_null()
                                .default("0"),
                        )
                        .col(ColumnDef::new(Shipments::CreatedBy).uuid().null())
                        .col(
                            ColumnDef::new(Shipments::FinalizationStartedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Shipments::FinalizedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Shipments::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Shipments::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_shipments_created_at")
                        .table(Shipments::Table)
                        .col(Shipments::CreatedAt)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_shipments_status")
                        .table(Shipments::Table)
                        .col(Shipments::Status)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Shipments::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Shipments {
        Table,
        Id,
        Name,
        ShipmentDate,
        CalculationMethod,
        BaseCurrency,
        ExchangeRate,
        Status,
        IsFinalized,
        TotalBaseCost,
        TotalSharedCost,
        TotalLandedCost,
        TotalLandedCostConverted,
        CreatedBy,
        FinalizationStartedAt,
        FinalizedAt,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20250301_000003_create_shipment_items_table {
    use super::m20250301_000002_create_shipments_table::Shipments;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000003_create_shipment_items_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ShipmentItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ShipmentItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ShipmentItems::ShipmentId).uuid().not_null())
                        .col(ColumnDef::new(ShipmentItems::Position).integer().not_null())
                        .col(ColumnDef::new(ShipmentItems::ProductId).uuid().not_null())
                        .col(ColumnDef::new(ShipmentItems::ItemName).string().not_null())
                        .col(ColumnDef::new(ShipmentItems::Quantity).string_len(40).not_null())
                        .col(ColumnDef::new(ShipmentItems::UnitCost).string_len(40).not_null())
                        .col(ColumnDef::new(ShipmentItems::Weight).string_len(40).null())
                        .col(
                            ColumnDef::new(ShipmentItems::TotalItemCost)
                                .string_len(40)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ShipmentItems::PercentageShare)
                                .string_len(40)
                                .not_null()
                                .default("0"),
                        )
                        .col(
                            ColumnDef::new(ShipmentItems::AllocatedSharedCost)
                                .string_len(40)
                                .not_null()
                                .default("0"),
                        )
                        .col(
                            ColumnDef::new(ShipmentItems::TotalLandedCost)
                                .string_len(40)
                                .not_null()
                                .default("0"),
                        )
                        .col(
                            ColumnDef::new(ShipmentItems::LandedCostPerUnit)
                                .string_len(40)
                                .not_null()
                                .default("0"),
                        )
                        .col(
                            ColumnDef::new(ShipmentItems::CostAppliedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(ShipmentItems::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ShipmentItems::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_shipment_items_shipment_id")
                                .from(ShipmentItems::Table, ShipmentItems::ShipmentId)
                                .to(Shipments::Table, Shipments::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_shipment_items_shipment_id")
                        .table(ShipmentItems::Table)
                        .col(ShipmentItems::ShipmentId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ShipmentItems::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum ShipmentItems {
        Table,
        Id,
        ShipmentId,
        Position,
        ProductId,
        ItemName,
        Quantity,
        UnitCost,
        Weight,
        TotalItemCost,
        PercentageShare,
        AllocatedSharedCost,
        TotalLandedCost,
        LandedCostPerUnit,
        CostAppliedAt,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20250301_000004_create_shared_costs_table {
    use super::m20250301_000002_create_shipments_table::Shipments;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000004_create_shared_costs_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(SharedCosts::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(SharedCosts::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(SharedCosts::ShipmentId).uuid().not_null())
                        .col(ColumnDef::new(SharedCosts::Position).integer().not_null())
                        .col(
                            ColumnDef::new(SharedCosts::ExpenseCategoryId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(SharedCosts::Description).string().not_null())
                        .col(ColumnDef::new(SharedCosts::Amount).string_len(40).not_null())
                        .col(
                            ColumnDef::new(SharedCosts::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_shared_costs_shipment_id")
                                .from(SharedCosts::Table, SharedCosts::ShipmentId)
                                .to(Shipments::Table, Shipments::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_shared_costs_shipment_id")
                        .table(SharedCosts::Table)
                        .col(SharedCosts::ShipmentId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(SharedCosts::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum SharedCosts {
        Table,
        Id,
        ShipmentId,
        Position,
        ExpenseCategoryId,
        Description,
        Amount,
        CreatedAt,
    }
}

mod m20250301_000005_create_shared_cost_allocations_table {
    use super::m20250301_000003_create_shipment_items_table::ShipmentItems;
    use super::m20250301_000004_create_shared_costs_table::SharedCosts;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000005_create_shared_cost_allocations_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(SharedCostAllocations::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(SharedCostAllocations::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SharedCostAllocations::SharedCostId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SharedCostAllocations::ShipmentItemId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SharedCostAllocations::AllocatedAmount)
                                .string_len(40)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SharedCostAllocations::IsManualOverride)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(SharedCostAllocations::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_allocations_shared_cost_id")
                                .from(
                                    SharedCostAllocations::Table,
                                    SharedCostAllocations::SharedCostId,
                                )
                                .to(SharedCosts::Table, SharedCosts::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_allocations_shipment_item_id")
                                .from(
                                    SharedCostAllocations::Table,
                                    SharedCostAllocations::ShipmentItemId,
                                )
                                .to(ShipmentItems::Table, ShipmentItems::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_allocations_shared_cost_item")
                        .table(SharedCostAllocations::Table)
                        .col(SharedCostAllocations::SharedCostId)
                        .col(SharedCostAllocations::ShipmentItemId)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(SharedCostAllocations::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum SharedCostAllocations {
        Table,
        Id,
        SharedCostId,
        ShipmentItemId,
        AllocatedAmount,
        IsManualOverride,
        CreatedAt,
    }
}

mod m20250301_000006_create_product_cost_prices_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000006_create_product_cost_prices_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ProductCostPrices::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ProductCostPrices::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ProductCostPrices::ProductId).uuid().not_null())
                        .col(
                            ColumnDef::new(ProductCostPrices::CostPrice)
                                .string_len(40)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductCostPrices::Currency)
                                .string_len(3)
                                .not_null(),
                        )
                        .col(ColumnDef::new(ProductCostPrices::ShipmentId).uuid().null())
                        .col(
                            ColumnDef::new(ProductCostPrices::ShipmentReceivedDate)
                                .date()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ProductCostPrices::Notes).text().null())
                        .col(ColumnDef::new(ProductCostPrices::CreatedBy).uuid().null())
                        .col(
                            ColumnDef::new(ProductCostPrices::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_product_cost_prices_product_created")
                        .table(ProductCostPrices::Table)
                        .col(ProductCostPrices::ProductId)
                        .col(ProductCostPrices::CreatedAt)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ProductCostPrices::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum ProductCostPrices {
        Table,
        Id,
        ProductId,
        CostPrice,
        Currency,
        ShipmentId,
        ShipmentReceivedDate,
        Notes,
        CreatedBy,
        CreatedAt,
    }
}

// Database migration CLI runner
pub async fn run_migration(db_url: &str) -> Result<()> {
    info!("Setting up database connection for migrations");

    let mut opt = ConnectOptions::new(db_url);
    opt.max_connections(2)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(30))
        .acquire_timeout(Duration::from_secs(30))
        .sqlx_logging(true);

    let db = Database::connect(opt).await?;

    info!("Running database migrations");

    match Migrator::up(&db, None).await {
        Ok(_) => {
            info!("Migrations completed successfully");
            Ok(())
        }
        Err(e) => {
            error!("Migration failed: {}", e);
            Err(e.into())
        }
    }
}
