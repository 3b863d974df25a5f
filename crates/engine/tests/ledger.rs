mod common;

use engine::{EngineError, TransferCmd};

use common::{Fixture, at, balance, fixture, pay};

/// Fund the source budget directly: a code pointing at the source itself
/// keeps the whole payment there.
async fn fund_source(fx: &Fixture, amount: i64, day: chrono::DateTime<chrono::Utc>) {
    let code = fx
        .engine
        .code_for_budget(fx.source.id, None)
        .await
        .unwrap();
    pay(fx, &code, amount, day).await;
}

#[tokio::test]
async fn transfer_is_zero_sum() {
    let fx = fixture().await;
    fund_source(&fx, 100, at(2024, 3, 1)).await;
    assert_eq!(balance(&fx, &fx.source).await, 100);

    let (credit, debit) = fx
        .engine
        .transfer(TransferCmd::new(fx.source.id, fx.a.id, 40, at(2024, 3, 2)).purpose("servers"))
        .await
        .unwrap();

    assert_eq!(credit.amount + debit.amount, 0);
    assert_eq!(credit.budget_id, fx.a.id);
    assert_eq!(credit.from_budget_id, Some(fx.source.id));
    assert_eq!(debit.budget_id, fx.source.id);
    assert_eq!(debit.to_budget_id, Some(fx.a.id));
    assert_eq!(credit.purpose.as_deref(), Some("servers"));

    assert_eq!(balance(&fx, &fx.source).await, 60);
    assert_eq!(balance(&fx, &fx.a).await, 40);
}

#[tokio::test]
async fn negative_transfer_swaps_direction() {
    let fx = fixture().await;
    fund_source(&fx, 100, at(2024, 3, 1)).await;

    let (credit, debit) = fx
        .engine
        .transfer(TransferCmd::new(fx.a.id, fx.source.id, -30, at(2024, 3, 2)))
        .await
        .unwrap();

    assert_eq!(debit.budget_id, fx.source.id);
    assert_eq!(debit.amount, -30);
    assert_eq!(credit.budget_id, fx.a.id);
    assert_eq!(balance(&fx, &fx.a).await, 30);
    assert_eq!(balance(&fx, &fx.source).await, 70);
}

#[tokio::test]
async fn transfer_requires_funds() {
    let fx = fixture().await;
    fund_source(&fx, 100, at(2024, 3, 1)).await;

    let result = fx
        .engine
        .transfer(TransferCmd::new(fx.source.id, fx.a.id, 101, at(2024, 3, 2)))
        .await;
    assert!(matches!(result, Err(EngineError::InsufficientFunds(_))));
    assert_eq!(balance(&fx, &fx.source).await, 100);
    assert_eq!(balance(&fx, &fx.a).await, 0);
}

#[tokio::test]
async fn invalid_transfers_are_rejected() {
    let fx = fixture().await;
    let now = at(2024, 3, 2);

    let zero = fx
        .engine
        .transfer(TransferCmd::new(fx.source.id, fx.a.id, 0, now))
        .await;
    assert!(matches!(zero, Err(EngineError::InvalidAmount(_))));

    let same = fx
        .engine
        .transfer(TransferCmd::new(fx.a.id, fx.a.id, 10, now))
        .await;
    assert!(matches!(same, Err(EngineError::InvalidAmount(_))));

    let bad_id = fx
        .engine
        .transfer(TransferCmd::new(0, fx.a.id, 10, now))
        .await;
    assert!(matches!(bad_id, Err(EngineError::InvalidId(_))));

    let unknown = fx
        .engine
        .transfer(TransferCmd::new(fx.a.id, 9_999, 10, now))
        .await;
    assert!(matches!(unknown, Err(EngineError::UnknownBudget(_))));
}

#[tokio::test]
async fn legs_are_listed_newest_first() {
    let fx = fixture().await;
    fund_source(&fx, 100, at(2024, 1, 10)).await;
    fx.engine
        .transfer(TransferCmd::new(fx.source.id, fx.a.id, 10, at(2024, 3, 1)))
        .await
        .unwrap();
    fx.engine
        .transfer(TransferCmd::new(fx.source.id, fx.a.id, 20, at(2024, 2, 1)))
        .await
        .unwrap();

    let legs = fx
        .engine
        .transactions_for_budget(fx.source.id)
        .await
        .unwrap();
    let amounts: Vec<i64> = legs.iter().map(|leg| leg.amount).collect();
    assert_eq!(amounts, vec![-10, -20, 100]);
}

#[tokio::test]
async fn balance_history_walks_back_by_month() {
    let fx = fixture().await;
    fund_source(&fx, 1000, at(2024, 1, 15)).await;
    fund_source(&fx, 500, at(2024, 2, 10)).await;
    fx.engine
        .transfer(TransferCmd::new(fx.source.id, fx.a.id, 200, at(2024, 3, 5)))
        .await
        .unwrap();

    let history = fx
        .engine
        .balance_history(fx.source.id, at(2024, 3, 20))
        .await
        .unwrap();
    assert_eq!(history, vec![1300, 1500, 1000]);

    let untouched = fx
        .engine
        .balance_history(fx.b.id, at(2024, 3, 20))
        .await
        .unwrap();
    assert_eq!(untouched, vec![0]);
}

#[tokio::test]
async fn project_statistics_average_monthly_change() {
    let fx = fixture().await;
    let code = fx
        .engine
        .code_for(&[fx.a.id, fx.b.id], &[60, 40], None)
        .await
        .unwrap();
    pay(&fx, &code, 100, at(2024, 1, 10)).await;
    pay(&fx, &code, 100, at(2024, 2, 10)).await;

    assert_eq!(fx.engine.project_balance(fx.project.id).await.unwrap(), 180);

    let stats = fx
        .engine
        .project_statistics(fx.project.id, at(2024, 3, 15))
        .await
        .unwrap();
    assert_eq!(stats.balance, 180);
    assert_eq!(stats.month_end_balances, vec![180, 180, 90]);
    assert_eq!(stats.monthly_change, 30);

    let missing = fx.engine.project_statistics(9_999, at(2024, 3, 15)).await;
    assert!(matches!(missing, Err(EngineError::UnknownProject(_))));
}

#[tokio::test]
async fn overflowing_balance_is_an_error() {
    let fx = fixture().await;
    fund_source(&fx, i64::MAX, at(2024, 3, 1)).await;
    fund_source(&fx, i64::MAX, at(2024, 3, 2)).await;

    assert!(matches!(
        fx.engine.balance(fx.source.id).await,
        Err(EngineError::InvalidAmount(_))
    ));
    let transfer = fx
        .engine
        .transfer(TransferCmd::new(fx.source.id, fx.a.id, 1, at(2024, 3, 3)))
        .await;
    assert!(matches!(transfer, Err(EngineError::InvalidAmount(_))));
    assert_eq!(balance(&fx, &fx.a).await, 0);
}
