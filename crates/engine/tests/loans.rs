use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{Amount, Engine, EngineError, EntityKind, LoanStatus};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let backend = db.get_database_backend();
    for sql in [
        "INSERT INTO groups (id, name) VALUES ('g1', 'Sunrise'), ('g2', 'Moonlight');",
        "INSERT INTO members (id, name, gender, group_id) VALUES \
         ('m1', 'Anita', 'female', 'g1'), \
         ('m2', 'Babu', 'male', 'g1'), \
         ('m3', 'Chitra', 'female', 'g2');",
        "INSERT INTO users (username, password, role, member_id) VALUES \
         ('anita', 'password', 'member', 'm1'), \
         ('babu', 'password', 'member', 'm2'), \
         ('chitra', 'password', 'member', 'm3'), \
         ('prema', 'password', 'president', NULL), \
         ('tara', 'password', 'treasurer', NULL);",
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

async fn seed_fund(db: &DatabaseConnection, group_id: &str, minor: i64) {
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "INSERT INTO group_funds (group_id, balance_minor) VALUES (?, ?);",
        vec![group_id.into(), minor.into()],
    ))
    .await
    .unwrap();
}

async fn approved_loan(engine: &Engine, member_id: &str, applicant: &str, minor: i64) -> String {
    let loan = engine
        .apply_loan(member_id, Amount::new(minor), Some("seed money"), applicant)
        .await
        .unwrap();
    engine.approve_loan(&loan.id, "prema").await.unwrap();
    loan.id
}

#[tokio::test]
async fn apply_creates_pending_loan_with_audit_entry() {
    let (engine, _db) = engine_with_db().await;

    let loan = engine
        .apply_loan("m1", Amount::new(50_000), Some("buy a loom"), "anita")
        .await
        .unwrap();

    assert_eq!(loan.status, LoanStatus::Pending);
    assert_eq!(loan.remaining, loan.amount);
    assert_eq!(loan.purpose.as_deref(), Some("buy a loom"));

    let history = engine.loan_history(&loan.id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, LoanStatus::Pending);
    assert_eq!(history[0].actor, "anita");
    assert_eq!(history[0].note, "Loan applied by Anita");

    let pending = engine.unprocessed(EntityKind::Loan).await.unwrap();
    assert_eq!(pending, vec![loan.id]);
}

#[tokio::test]
async fn apply_for_unknown_member_or_actor_fails() {
    let (engine, _db) = engine_with_db().await;

    let err = engine
        .apply_loan("nobody", Amount::new(50_000), None, "anita")
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("member not exists".to_string()));

    let err = engine
        .apply_loan("m1", Amount::new(50_000), None, "ghost")
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("user not exists".to_string()));
}

#[tokio::test]
async fn full_lifecycle_conserves_fund_balance() {
    let (engine, db) = engine_with_db().await;
    seed_fund(&db, "g1", 100_000).await;

    let loan = engine
        .apply_loan("m1", Amount::new(50_000), Some("buy a loom"), "anita")
        .await
        .unwrap();
    engine.approve_loan(&loan.id, "prema").await.unwrap();

    let loan = engine.disburse_loan(&loan.id, "tara").await.unwrap();
    assert_eq!(loan.status, LoanStatus::Disbursed);
    assert_eq!(loan.remaining, Amount::new(50_000));
    assert!(loan.disbursement_date.is_some());
    assert_eq!(
        engine.fund_balance("g1").await.unwrap(),
        Amount::new(50_000)
    );

    let loan = engine
        .repay_loan(&loan.id, Amount::new(20_000), "anita")
        .await
        .unwrap();
    assert_eq!(loan.status, LoanStatus::Disbursed);
    assert_eq!(loan.remaining, Amount::new(30_000));
    assert_eq!(
        engine.fund_balance("g1").await.unwrap(),
        Amount::new(70_000)
    );

    let loan = engine
        .repay_loan(&loan.id, Amount::new(30_000), "anita")
        .await
        .unwrap();
    assert_eq!(loan.status, LoanStatus::Repaid);
    assert_eq!(loan.remaining, Amount::ZERO);
    assert!(loan.repayment_date.is_some());
    assert_eq!(
        engine.fund_balance("g1").await.unwrap(),
        Amount::new(100_000)
    );

    let history = engine.loan_history(&loan.id).await.unwrap();
    let notes: Vec<_> = history.iter().map(|e| e.note.as_str()).collect();
    assert_eq!(
        notes,
        vec![
            "Loan applied by Anita",
            "Approved by prema",
            "Disbursed 500.00 by tara",
            "Repayment of 200.00 by anita",
            "Repayment of 300.00 by anita",
        ]
    );
    let statuses: Vec<_> = history.iter().map(|e| e.status).collect();
    assert_eq!(
        statuses,
        vec![
            LoanStatus::Pending,
            LoanStatus::Approved,
            LoanStatus::Disbursed,
            LoanStatus::Disbursed,
            LoanStatus::Repaid,
        ]
    );
}

#[tokio::test]
async fn approve_is_only_valid_from_pending() {
    let (engine, _db) = engine_with_db().await;

    let loan_id = approved_loan(&engine, "m1", "anita", 50_000).await;
    let err = engine.approve_loan(&loan_id, "prema").await.unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidTransition(
            "only pending loans can be approved, loan is approved".to_string()
        )
    );

    // The failed attempt must leave no trace in the audit trail.
    let history = engine.loan_history(&loan_id).await.unwrap();
    assert_eq!(history.len(), 2);
}

#[tokio::test]
async fn disburse_requires_the_treasurer() {
    let (engine, db) = engine_with_db().await;
    seed_fund(&db, "g1", 100_000).await;
    let loan_id = approved_loan(&engine, "m1", "anita", 50_000).await;

    for actor in ["prema", "anita"] {
        let err = engine.disburse_loan(&loan_id, actor).await.unwrap_err();
        assert_eq!(
            err,
            EngineError::Forbidden("only the treasurer can do this".to_string())
        );
    }

    // The fund was never touched by the refused attempts.
    assert_eq!(
        engine.fund_balance("g1").await.unwrap(),
        Amount::new(100_000)
    );
}

#[tokio::test]
async fn disburse_with_insufficient_fund_leaves_loan_approved() {
    let (engine, db) = engine_with_db().await;
    seed_fund(&db, "g1", 10_000).await;
    let loan_id = approved_loan(&engine, "m1", "anita", 50_000).await;

    let err = engine.disburse_loan(&loan_id, "tara").await.unwrap_err();
    assert_eq!(
        err,
        EngineError::InsufficientFunds("group fund cannot cover 500.00".to_string())
    );

    assert_eq!(
        engine.fund_balance("g1").await.unwrap(),
        Amount::new(10_000)
    );
    let loans = engine.loans_by_member("m1").await.unwrap();
    assert_eq!(loans[0].status, LoanStatus::Approved);
    let history = engine.loan_history(&loan_id).await.unwrap();
    assert_eq!(history.len(), 2);
}

#[tokio::test]
async fn reject_is_valid_from_pending_and_approved_only() {
    let (engine, db) = engine_with_db().await;
    seed_fund(&db, "g1", 100_000).await;

    let pending = engine
        .apply_loan("m1", Amount::new(10_000), None, "anita")
        .await
        .unwrap();
    let rejected = engine.reject_loan(&pending.id, "prema").await.unwrap();
    assert_eq!(rejected.status, LoanStatus::Rejected);

    let approved_id = approved_loan(&engine, "m1", "anita", 10_000).await;
    let rejected = engine.reject_loan(&approved_id, "tara").await.unwrap();
    assert_eq!(rejected.status, LoanStatus::Rejected);

    let disbursed_id = approved_loan(&engine, "m1", "anita", 10_000).await;
    engine.disburse_loan(&disbursed_id, "tara").await.unwrap();
    let err = engine.reject_loan(&disbursed_id, "prema").await.unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidTransition(
            "only pending or approved loans can be rejected, loan is disbursed".to_string()
        )
    );
}

#[tokio::test]
async fn excess_repayment_is_rejected_entirely() {
    let (engine, db) = engine_with_db().await;
    seed_fund(&db, "g1", 100_000).await;
    let loan_id = approved_loan(&engine, "m1", "anita", 50_000).await;
    engine.disburse_loan(&loan_id, "tara").await.unwrap();

    let err = engine
        .repay_loan(&loan_id, Amount::new(60_000), "anita")
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::ExcessRepayment(
            "repayment 600.00 exceeds remaining balance 500.00".to_string()
        )
    );

    // Nothing was partially applied.
    let loans = engine.loans_by_member("m1").await.unwrap();
    assert_eq!(loans[0].remaining, Amount::new(50_000));
    assert_eq!(
        engine.fund_balance("g1").await.unwrap(),
        Amount::new(50_000)
    );
}

#[tokio::test]
async fn repaying_a_repaid_loan_fails_as_excess() {
    let (engine, db) = engine_with_db().await;
    seed_fund(&db, "g1", 100_000).await;
    let loan_id = approved_loan(&engine, "m1", "anita", 50_000).await;
    engine.disburse_loan(&loan_id, "tara").await.unwrap();
    engine
        .repay_loan(&loan_id, Amount::new(50_000), "anita")
        .await
        .unwrap();

    let err = engine
        .repay_loan(&loan_id, Amount::new(1), "anita")
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::ExcessRepayment("repayment 0.01 exceeds remaining balance 0.00".to_string())
    );
}

#[tokio::test]
async fn repay_requires_the_borrowing_member() {
    let (engine, db) = engine_with_db().await;
    seed_fund(&db, "g1", 100_000).await;
    let loan_id = approved_loan(&engine, "m1", "anita", 50_000).await;
    engine.disburse_loan(&loan_id, "tara").await.unwrap();

    // Another member, and a user with no member link at all.
    for actor in ["babu", "tara"] {
        let err = engine
            .repay_loan(&loan_id, Amount::new(10_000), actor)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::Forbidden("this loan does not belong to the current user".to_string())
        );
    }
}

#[tokio::test]
async fn repay_rejects_non_positive_amounts() {
    let (engine, db) = engine_with_db().await;
    seed_fund(&db, "g1", 100_000).await;
    let loan_id = approved_loan(&engine, "m1", "anita", 50_000).await;
    engine.disburse_loan(&loan_id, "tara").await.unwrap();

    let err = engine
        .repay_loan(&loan_id, Amount::ZERO, "anita")
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidAmount("repayment amount must be > 0".to_string())
    );
}

#[tokio::test]
async fn repay_before_disbursement_fails() {
    let (engine, _db) = engine_with_db().await;
    let loan_id = approved_loan(&engine, "m1", "anita", 50_000).await;

    let err = engine
        .repay_loan(&loan_id, Amount::new(10_000), "anita")
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidTransition(
            "only disbursed loans can be repaid, loan is approved".to_string()
        )
    );
}

#[tokio::test]
async fn group_funds_are_independent() {
    let (engine, db) = engine_with_db().await;
    seed_fund(&db, "g1", 100_000).await;

    let loan_id = approved_loan(&engine, "m1", "anita", 50_000).await;
    engine.disburse_loan(&loan_id, "tara").await.unwrap();

    // Untouched fund reads zero, and money in g1 never covers g2.
    assert_eq!(engine.fund_balance("g2").await.unwrap(), Amount::ZERO);

    let other_id = approved_loan(&engine, "m3", "chitra", 10_000).await;
    let err = engine.disburse_loan(&other_id, "tara").await.unwrap_err();
    assert_eq!(
        err,
        EngineError::InsufficientFunds("group fund cannot cover 100.00".to_string())
    );
    assert_eq!(
        engine.fund_balance("g1").await.unwrap(),
        Amount::new(50_000)
    );
}

#[tokio::test]
async fn overdue_loans_respect_the_ninety_day_threshold() {
    let (engine, db) = engine_with_db().await;
    seed_fund(&db, "g1", 100_000).await;
    let backend = db.get_database_backend();

    let old_id = approved_loan(&engine, "m1", "anita", 10_000).await;
    engine.disburse_loan(&old_id, "tara").await.unwrap();
    let recent_id = approved_loan(&engine, "m2", "babu", 10_000).await;
    engine.disburse_loan(&recent_id, "tara").await.unwrap();

    let today = chrono::Utc::now().date_naive();
    for (id, age_days) in [(&old_id, 95i64), (&recent_id, 89i64)] {
        let backdated = today - chrono::Duration::days(age_days);
        db.execute(Statement::from_sql_and_values(
            backend,
            "UPDATE loans SET disbursement_date = ? WHERE id = ?;",
            vec![backdated.to_string().into(), id.as_str().into()],
        ))
        .await
        .unwrap();
    }

    let overdue = engine.overdue_loans("g1").await.unwrap();
    assert_eq!(overdue.len(), 1);
    assert_eq!(overdue[0].id, old_id);

    let members = engine.members_with_overdue_loans("g1").await.unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].id, "m1");
}

#[tokio::test]
async fn overdue_members_are_listed_once() {
    let (engine, db) = engine_with_db().await;
    seed_fund(&db, "g1", 100_000).await;
    let backend = db.get_database_backend();

    // Two overdue loans held by the same member.
    for _ in 0..2 {
        let loan_id = approved_loan(&engine, "m1", "anita", 10_000).await;
        engine.disburse_loan(&loan_id, "tara").await.unwrap();
    }
    let backdated = chrono::Utc::now().date_naive() - chrono::Duration::days(120);
    db.execute(Statement::from_sql_and_values(
        backend,
        "UPDATE loans SET disbursement_date = ? WHERE member_id = 'm1';",
        vec![backdated.to_string().into()],
    ))
    .await
    .unwrap();

    assert_eq!(engine.overdue_loans("g1").await.unwrap().len(), 2);
    let members = engine.members_with_overdue_loans("g1").await.unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].name, "Anita");
}

#[tokio::test]
async fn monthly_repayments_filter_by_calendar_month() {
    let (engine, db) = engine_with_db().await;
    seed_fund(&db, "g1", 100_000).await;
    let backend = db.get_database_backend();

    let loan_id = approved_loan(&engine, "m1", "anita", 10_000).await;
    engine.disburse_loan(&loan_id, "tara").await.unwrap();
    engine
        .repay_loan(&loan_id, Amount::new(10_000), "anita")
        .await
        .unwrap();

    db.execute(Statement::from_sql_and_values(
        backend,
        "UPDATE loans SET repayment_date = ? WHERE id = ?;",
        vec!["2026-05-15".into(), loan_id.as_str().into()],
    ))
    .await
    .unwrap();

    let may = engine.monthly_repayments("g1", 2026, 5).await.unwrap();
    assert_eq!(may.len(), 1);
    assert_eq!(may[0].id, loan_id);

    let june = engine.monthly_repayments("g1", 2026, 6).await.unwrap();
    assert!(june.is_empty());

    let err = engine.monthly_repayments("g1", 2026, 13).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidAmount("invalid month: 2026-13".to_string())
    );
}

#[tokio::test]
async fn loans_by_group_spans_all_members() {
    let (engine, _db) = engine_with_db().await;

    engine
        .apply_loan("m1", Amount::new(10_000), None, "anita")
        .await
        .unwrap();
    engine
        .apply_loan("m2", Amount::new(20_000), None, "babu")
        .await
        .unwrap();
    engine
        .apply_loan("m3", Amount::new(30_000), None, "chitra")
        .await
        .unwrap();

    let g1 = engine.loans_by_group("g1").await.unwrap();
    assert_eq!(g1.len(), 2);
    let g2 = engine.loans_by_group("g2").await.unwrap();
    assert_eq!(g2.len(), 1);
    assert_eq!(g2[0].amount, Amount::new(30_000));

    let err = engine.loans_by_group("nowhere").await.unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("group not exists".to_string()));
}

#[tokio::test]
async fn corrupt_stored_status_surfaces_as_storage_error() {
    let (engine, db) = engine_with_db().await;
    let backend = db.get_database_backend();

    let loan = engine
        .apply_loan("m1", Amount::new(10_000), None, "anita")
        .await
        .unwrap();
    db.execute(Statement::from_sql_and_values(
        backend,
        "UPDATE loans SET status = 'settled' WHERE id = ?;",
        vec![loan.id.as_str().into()],
    ))
    .await
    .unwrap();

    let err = engine.loans_by_member("m1").await.unwrap_err();
    assert!(matches!(err, EngineError::Database(_)));
    let err = engine.approve_loan(&loan.id, "prema").await.unwrap_err();
    assert!(matches!(err, EngineError::Database(_)));
}

#[tokio::test]
async fn mark_processed_clears_the_unprocessed_marker() {
    let (engine, _db) = engine_with_db().await;

    let loan = engine
        .apply_loan("m1", Amount::new(10_000), None, "anita")
        .await
        .unwrap();
    assert_eq!(
        engine.unprocessed(EntityKind::Loan).await.unwrap(),
        vec![loan.id.clone()]
    );

    engine
        .mark_processed(EntityKind::Loan, &loan.id)
        .await
        .unwrap();
    assert!(engine.unprocessed(EntityKind::Loan).await.unwrap().is_empty());

    let err = engine
        .mark_processed(EntityKind::Loan, "missing")
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::KeyNotFound("processing status not exists".to_string())
    );
}
