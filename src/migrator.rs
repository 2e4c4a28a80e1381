use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20241023_000001_create_districts_table::Migration),
            Box::new(m20241023_000002_create_orders_table::Migration),
            Box::new(m20241023_000003_create_logs_table::Migration),
        ]
    }
}

// Migration implementations

mod m20241023_000001_create_districts_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20241023_000001_create_districts_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Districts::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Districts::DistrictId)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Districts::DistrictName).text().null())
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Districts::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Districts {
        Table,
        DistrictId,
        DistrictName,
    }
}

mod m20241023_000002_create_orders_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20241023_000002_create_orders_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Orders::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Orders::OrderId)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Orders::Weight).float().not_null())
                        .col(
                            ColumnDef::new(Orders::OrderTime)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Orders::ExpectedDeliveryTime)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Orders::DeliveryTime)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(ColumnDef::new(Orders::DistrictId).integer().not_null())
                        .col(ColumnDef::new(Orders::Ip).text().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_orders_district_id")
                        .table(Orders::Table)
                        .col(Orders::DistrictId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Orders::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Orders {
        Table,
        OrderId,
        Weight,
        OrderTime,
        ExpectedDeliveryTime,
        DeliveryTime,
        DistrictId,
        Ip,
    }
}

mod m20241023_000003_create_logs_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20241023_000003_create_logs_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Logs::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Logs::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Logs::Level).string().not_null())
                        .col(ColumnDef::new(Logs::Target).string().not_null())
                        .col(ColumnDef::new(Logs::Message).text().not_null())
                        .col(ColumnDef::new(Logs::Fields).text().null())
                        .col(
                            ColumnDef::new(Logs::RaiseDate)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Logs::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Logs {
        Table,
        Id,
        Level,
        Target,
        Message,
        Fields,
        RaiseDate,
    }
}
