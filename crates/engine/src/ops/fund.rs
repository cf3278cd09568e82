//! The fund service: per-group cash pool credit/debit.
//!
//! Both mutations run as guarded row updates against `group_funds` inside
//! the caller's transaction. The debit's `balance_minor >= ?` predicate
//! makes the non-negative invariant a storage-level fact: two operations
//! racing on the same group serialize on the row, and operations on
//! different groups touch different rows and never block each other.

use sea_orm::{DatabaseTransaction, Statement, TransactionTrait, prelude::*};

use crate::{Amount, EngineError, ResultEngine, group_funds};

use super::{Engine, with_tx};

impl Engine {
    /// Current balance of a group's fund. A group whose fund was never
    /// touched reports zero.
    pub async fn fund_balance(&self, group_id: &str) -> ResultEngine<Amount> {
        with_tx!(self, |db_tx| {
            self.require_group(&db_tx, group_id).await?;
            let balance = group_funds::Entity::find_by_id(group_id.to_string())
                .one(&db_tx)
                .await?
                .map(|fund| Amount::new(fund.balance_minor))
                .unwrap_or(Amount::ZERO);
            Ok(balance)
        })
    }

    /// Ensure the fund row exists, creating it with balance 0 on first use.
    async fn ensure_fund(&self, db: &DatabaseTransaction, group_id: &str) -> ResultEngine<()> {
        let backend = db.get_database_backend();
        db.execute(Statement::from_sql_and_values(
            backend,
            "INSERT INTO group_funds (group_id, balance_minor) VALUES (?, 0) \
             ON CONFLICT (group_id) DO NOTHING;",
            vec![group_id.into()],
        ))
        .await?;
        Ok(())
    }

    /// Add `amount` to the group's fund. Requires `amount > 0`.
    pub(super) async fn credit_fund(
        &self,
        db: &DatabaseTransaction,
        group_id: &str,
        amount: Amount,
    ) -> ResultEngine<()> {
        if !amount.is_positive() {
            return Err(EngineError::InvalidAmount(
                "credit amount must be > 0".to_string(),
            ));
        }
        self.ensure_fund(db, group_id).await?;

        let backend = db.get_database_backend();
        let result = db
            .execute(Statement::from_sql_and_values(
                backend,
                "UPDATE group_funds SET balance_minor = balance_minor + ? WHERE group_id = ?;",
                vec![amount.minor().into(), group_id.into()],
            ))
            .await?;
        if result.rows_affected() != 1 {
            return Err(EngineError::KeyNotFound("group fund not exists".to_string()));
        }
        Ok(())
    }

    /// Remove `amount` from the group's fund. Requires `amount > 0`; fails
    /// with [`EngineError::InsufficientFunds`] when the balance cannot cover
    /// it, leaving the row untouched.
    pub(super) async fn debit_fund(
        &self,
        db: &DatabaseTransaction,
        group_id: &str,
        amount: Amount,
    ) -> ResultEngine<()> {
        if !amount.is_positive() {
            return Err(EngineError::InvalidAmount(
                "debit amount must be > 0".to_string(),
            ));
        }
        self.ensure_fund(db, group_id).await?;

        let backend = db.get_database_backend();
        let result = db
            .execute(Statement::from_sql_and_values(
                backend,
                "UPDATE group_funds SET balance_minor = balance_minor - ? \
                 WHERE group_id = ? AND balance_minor >= ?;",
                vec![amount.minor().into(), group_id.into(), amount.minor().into()],
            ))
            .await?;
        if result.rows_affected() != 1 {
            return Err(EngineError::InsufficientFunds(format!(
                "group fund cannot cover {amount}"
            )));
        }
        Ok(())
    }
}
