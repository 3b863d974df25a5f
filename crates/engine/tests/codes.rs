mod common;

use engine::{
    EngineError, NewBudgetCmd,
    tokens::{MIN_TOKEN_DISTANCE, TOKEN_LEN, has_no_adjacent_repeats, token_distance},
};

use common::{count_rows, fixture};

#[tokio::test]
async fn same_split_returns_same_code() {
    let fx = fixture().await;

    let first = fx
        .engine
        .code_for(&[fx.a.id, fx.b.id], &[60, 40], None)
        .await
        .unwrap();
    let reordered = fx
        .engine
        .code_for(&[fx.b.id, fx.a.id], &[40, 60], None)
        .await
        .unwrap();

    assert_eq!(first, reordered);
    assert_eq!(first.budget_ids, vec![fx.a.id, fx.b.id]);
    assert_eq!(first.ratios, vec![60, 40]);
    assert_eq!(count_rows(&fx.db, "codes").await, 1);
}

#[tokio::test]
async fn owner_is_part_of_the_key() {
    let fx = fixture().await;
    let user = fx.engine.new_user("ada", "ada@example.org").await.unwrap();

    let anonymous = fx
        .engine
        .code_for(&[fx.a.id, fx.b.id], &[60, 40], None)
        .await
        .unwrap();
    let owned = fx
        .engine
        .code_for(&[fx.a.id, fx.b.id], &[60, 40], Some(user.id))
        .await
        .unwrap();
    let owned_again = fx
        .engine
        .code_for(&[fx.a.id, fx.b.id], &[60, 40], Some(user.id))
        .await
        .unwrap();

    assert_ne!(anonymous.token, owned.token);
    assert_eq!(owned.token, owned_again.token);
    assert_eq!(owned.user_id, Some(user.id));
    assert_eq!(count_rows(&fx.db, "codes").await, 2);
}

#[tokio::test]
async fn invalid_splits_are_rejected() {
    let fx = fixture().await;

    let over = fx
        .engine
        .code_for(&[fx.a.id, fx.b.id, fx.root.id], &[50, 50, 1], None)
        .await;
    assert!(matches!(over, Err(EngineError::InvalidRatio(_))));

    let mismatch = fx
        .engine
        .code_for(&[fx.a.id, fx.b.id], &[50, 25, 25], None)
        .await;
    assert!(matches!(mismatch, Err(EngineError::InvalidBudgetRatioSet(_))));

    let unknown = fx
        .engine
        .code_for(&[fx.a.id, 9_999], &[50, 50], None)
        .await;
    assert!(matches!(unknown, Err(EngineError::UnknownBudget(_))));

    let zero_id = fx.engine.code_for(&[0], &[100], None).await;
    assert!(matches!(zero_id, Err(EngineError::InvalidId(_))));

    let text = engine::parse_ratios(&["60", "forty"]);
    assert!(matches!(text, Err(EngineError::InvalidRatio(_))));

    assert_eq!(count_rows(&fx.db, "codes").await, 0);
}

#[tokio::test]
async fn generated_tokens_stay_apart() {
    let fx = fixture().await;
    let mut tokens = Vec::new();
    for i in 0..6 {
        let budget = fx
            .engine
            .new_budget(NewBudgetCmd::new(format!("Budget {i}")))
            .await
            .unwrap();
        let code = fx.engine.code_for_budget(budget.id, None).await.unwrap();
        tokens.push(code.token);
    }

    for (i, left) in tokens.iter().enumerate() {
        assert_eq!(left.len(), TOKEN_LEN);
        assert!(has_no_adjacent_repeats(left), "{left}");
        for right in &tokens[i + 1..] {
            assert!(token_distance(left, right) > MIN_TOKEN_DISTANCE);
        }
    }
}

#[tokio::test]
async fn lookup_by_token_and_reference() {
    let fx = fixture().await;
    let code = fx.engine.code_for_budget(fx.a.id, None).await.unwrap();

    let found = fx
        .engine
        .code_by_token(&format!(" {} ", code.token.to_lowercase()))
        .await
        .unwrap();
    assert_eq!(found, code);

    let resolved = fx
        .engine
        .resolve_reference(&format!("Spende/{}/2024", code.token))
        .await
        .unwrap();
    assert_eq!(resolved, Some(code.clone()));

    assert_eq!(
        fx.engine.resolve_reference("no code here").await.unwrap(),
        None
    );
    assert!(matches!(
        fx.engine.code_by_token("KM3SAT9W").await,
        Err(EngineError::UnknownCode(_))
    ));
}
