use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{Amount, Engine, EngineError, EntityKind};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let backend = db.get_database_backend();
    for sql in [
        "INSERT INTO groups (id, name) VALUES ('g1', 'Sunrise');",
        "INSERT INTO members (id, name, gender, group_id) VALUES \
         ('m1', 'Anita', 'female', 'g1');",
        "INSERT INTO users (username, password, role, member_id) VALUES \
         ('anita', 'password', 'member', 'm1');",
    ] {
        db.execute(Statement::from_string(backend, sql))
            .await
            .unwrap();
    }
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

#[tokio::test]
async fn deposit_credits_the_group_fund() {
    let (engine, _db) = engine_with_db().await;

    let deposit = engine
        .record_deposit("m1", Amount::new(25_000), "weekly", "anita")
        .await
        .unwrap();
    assert_eq!(deposit.member_id, "m1");
    assert_eq!(deposit.amount, Amount::new(25_000));
    assert_eq!(deposit.deposit_type, "weekly");

    assert_eq!(
        engine.fund_balance("g1").await.unwrap(),
        Amount::new(25_000)
    );

    // A second deposit accumulates on the same fund row.
    engine
        .record_deposit("m1", Amount::new(5_000), "weekly", "anita")
        .await
        .unwrap();
    assert_eq!(
        engine.fund_balance("g1").await.unwrap(),
        Amount::new(30_000)
    );
}

#[tokio::test]
async fn deposit_leaves_an_unprocessed_marker() {
    let (engine, _db) = engine_with_db().await;

    let deposit = engine
        .record_deposit("m1", Amount::new(25_000), "weekly", "anita")
        .await
        .unwrap();

    let pending = engine.unprocessed(EntityKind::Deposit).await.unwrap();
    assert_eq!(pending, vec![deposit.id.clone()]);

    engine
        .mark_processed(EntityKind::Deposit, &deposit.id)
        .await
        .unwrap();
    assert!(
        engine
            .unprocessed(EntityKind::Deposit)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn deposit_rejects_non_positive_amounts() {
    let (engine, _db) = engine_with_db().await;

    for minor in [0, -100] {
        let err = engine
            .record_deposit("m1", Amount::new(minor), "weekly", "anita")
            .await
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidAmount("deposit amount must be > 0".to_string())
        );
    }
    assert_eq!(engine.fund_balance("g1").await.unwrap(), Amount::ZERO);
}

#[tokio::test]
async fn deposit_for_unknown_member_fails() {
    let (engine, _db) = engine_with_db().await;

    let err = engine
        .record_deposit("nobody", Amount::new(25_000), "weekly", "anita")
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("member not exists".to_string()));
}
