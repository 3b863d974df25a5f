#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{
    Budget, Code, Currency, Engine, MemoryCache, NewBudgetCmd, NewProjectCmd, Payment, Project,
    RecordPaymentCmd,
};
use migration::MigratorTrait;

pub struct Fixture {
    pub engine: Engine,
    pub db: DatabaseConnection,
    pub platform: Budget,
    pub project: Project,
    pub root: Budget,
    pub a: Budget,
    pub b: Budget,
    /// Budget payments arrive on; belongs to no project.
    pub source: Budget,
}

pub async fn migrated_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    db
}

pub async fn fixture() -> Fixture {
    let db = migrated_db().await;
    let setup = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    let platform = setup
        .bootstrap_platform("Platform", "platform")
        .await
        .unwrap();

    let engine = Engine::builder()
        .database(db.clone())
        .cache(Arc::new(MemoryCache::new()))
        .platform_budget(platform.token.clone())
        .build()
        .await
        .unwrap();

    let project = engine
        .new_project(NewProjectCmd::new("Open Source", "open-source"))
        .await
        .unwrap();
    let root = engine
        .root_budgets(project.id)
        .await
        .unwrap()
        .remove(0);
    let a = engine
        .new_budget(
            NewBudgetCmd::new("Servers")
                .project_id(project.id)
                .parent_id(root.id),
        )
        .await
        .unwrap();
    let b = engine
        .new_budget(
            NewBudgetCmd::new("Docs")
                .project_id(project.id)
                .parent_id(root.id),
        )
        .await
        .unwrap();
    let source = engine
        .new_budget(NewBudgetCmd::new("Bank import"))
        .await
        .unwrap();

    Fixture {
        engine,
        db,
        platform,
        project,
        root,
        a,
        b,
        source,
    }
}

pub fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()
}

pub fn payment_cmd(source: &Budget, amount: i64, created_at: DateTime<Utc>) -> RecordPaymentCmd {
    RecordPaymentCmd::new(source.id, amount, Currency::Eur, "hbci", created_at)
}

/// Record a payment carrying `code` explicitly.
pub async fn pay(fx: &Fixture, code: &Code, amount: i64, created_at: DateTime<Utc>) -> Payment {
    fx.engine
        .record_payment(payment_cmd(&fx.source, amount, created_at).code(code.token.clone()))
        .await
        .unwrap()
}

pub async fn balance(fx: &Fixture, budget: &Budget) -> i64 {
    fx.engine.balance(budget.id).await.unwrap()
}

pub async fn count_rows(db: &DatabaseConnection, table: &str) -> i64 {
    let backend = db.get_database_backend();
    let row = db
        .query_one(Statement::from_string(
            backend,
            format!("SELECT COUNT(*) AS n FROM {table}"),
        ))
        .await
        .unwrap()
        .unwrap();
    row.try_get("", "n").unwrap()
}
