use sea_orm_migration::prelude::*;
use sha2::Digest as _;

use crate::m20250701_090000_init::{Child, Setting, Staff};

const ADMIN_ID: u128 = 12345;
const STAFF_COUNT: u128 = 20;
const CHILD_OFFSET: u128 = 1_000;
const CHILD_COUNT: u128 = 40;

const SETTINGS: [(&str, &str); 5] = [
    ("rates.late_per_minute", "500"),
    ("rates.early_leave_per_minute", "500"),
    ("rates.overtime_per_minute", "750"),
    ("attendance.grace_minutes", "15"),
    ("child_payment.default_amount", "35000"),
];

fn seeded_id(i: u128) -> SimpleExpr {
    Expr::val(format!("{i:032x}")).cast_as("uuid")
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let time = Expr::val("2025-07-02T09:00:00.000Z").cast_as("timestamptz");

        // Demo staff log in with their username as password
        for i in 1..=STAFF_COUNT {
            let username = format!("staff{i}");
            let salary = rand::random_range(3_000_000..=9_000_000_i64);

            let hashed_password = &sha2::Sha256::digest(format!("{username}:{username}"))[..];

            manager
                .exec_stmt(Query::insert()
                    .into_table(Staff::Table)
                    .columns([Alias::new("id"), Alias::new("created_at"), Alias::new("updated_at"), Alias::new("username"), Alias::new("password"), Alias::new("display_name"), Alias::new("role"), Alias::new("salary")])
                    .values_panic([seeded_id(i), time.clone(), time.clone(), username.clone().into(), hashed_password.into(), format!("Staff member {i}").into(), Expr::val("staff").cast_as("role_type"), salary.into()])
                    .to_owned()
            ).await?;
        }

        let hashed_password = &sha2::Sha256::digest("admin:admin")[..];

        manager
            .exec_stmt(Query::insert()
                .into_table(Staff::Table)
                .columns([Alias::new("id"), Alias::new("created_at"), Alias::new("updated_at"), Alias::new("username"), Alias::new("password"), Alias::new("display_name"), Alias::new("role")])
                .values_panic([seeded_id(ADMIN_ID), time.clone(), time.clone(), "admin".into(), hashed_password.into(), "Administrator".into(), Expr::val("admin").cast_as("role_type")])
                .to_owned()
        ).await?;

        for i in 1..=CHILD_COUNT {
            manager
                .exec_stmt(Query::insert()
                    .into_table(Child::Table)
                    .columns([Alias::new("id"), Alias::new("created_at"), Alias::new("updated_at"), Alias::new("full_name")])
                    .values_panic([seeded_id(CHILD_OFFSET + i), time.clone(), time.clone(), format!("Child {i}").into()])
                    .to_owned()
            ).await?;
        }

        for (key, value) in SETTINGS {
            manager
                .exec_stmt(Query::insert()
                    .into_table(Setting::Table)
                    .columns([Setting::Key, Setting::Value, Setting::UpdatedAt])
                    .values_panic([key.into(), value.into(), time.clone()])
                    .to_owned()
            ).await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for (key, _) in SETTINGS {
            manager
                .exec_stmt(Query::delete()
                    .from_table(Setting::Table)
                    .and_where(Expr::col(Setting::Key).eq(key))
                    .to_owned()
            ).await?;
        }

        let ids = (1..=STAFF_COUNT)
            .chain([ADMIN_ID])
            .map(|i| (Staff::Table.into_iden(), i))
            .chain((1..=CHILD_COUNT).map(|i| (Child::Table.into_iden(), CHILD_OFFSET + i)));

        for (table, i) in ids {
            manager
                .exec_stmt(Query::delete()
                    .from_table(table)
                    .and_where(Expr::col(Alias::new("id")).eq(seeded_id(i)))
                    .to_owned()
            ).await?;
        }

        Ok(())
    }
}
