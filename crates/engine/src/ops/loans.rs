//! Loan lifecycle operations.
//!
//! Each operation is one transaction: status validation, the loan mutation,
//! the fund movement (for disburse/repay) and the audit entry commit
//! together or not at all. A failed fund debit therefore leaves the loan
//! exactly as it was, and a failed status check never reaches the fund.

use chrono::Utc;
use sea_orm::{ActiveValue, TransactionTrait, prelude::*};

use crate::{Amount, EngineError, EntityKind, Loan, LoanStatus, ResultEngine, Role, loans};

use super::{
    Engine, access::require_own_member, access::require_role, normalize_optional_text, with_tx,
};

impl Engine {
    /// A member applies for a loan. The loan starts `PENDING` with its
    /// remaining balance equal to the requested amount; no money moves.
    pub async fn apply_loan(
        &self,
        member_id: &str,
        amount: Amount,
        purpose: Option<&str>,
        actor: &str,
    ) -> ResultEngine<Loan> {
        let purpose = normalize_optional_text(purpose);
        with_tx!(self, |db_tx| {
            self.require_actor(&db_tx, actor).await?;
            let member = self.require_member(&db_tx, member_id).await?;

            let loan = Loan::new(member_id, amount, purpose, Utc::now().date_naive())?;
            loans::ActiveModel::from(&loan).insert(&db_tx).await?;

            self.track_unprocessed(&db_tx, EntityKind::Loan, &loan.id)
                .await?;
            self.append_audit(
                &db_tx,
                &loan.id,
                LoanStatus::Pending,
                actor,
                format!("Loan applied by {}", member.name),
            )
            .await?;

            Ok(loan)
        })
    }

    /// Approve a pending loan. No money moves yet.
    ///
    /// Which actors may approve is the caller's concern; the HTTP layer
    /// gates this behind the president role.
    pub async fn approve_loan(&self, loan_id: &str, actor: &str) -> ResultEngine<Loan> {
        with_tx!(self, |db_tx| {
            self.require_actor(&db_tx, actor).await?;

            let mut model = self.require_loan(&db_tx, loan_id).await?;
            let status = LoanStatus::try_from(model.status.as_str())?;
            if !status.permits_approval() {
                return Err(EngineError::InvalidTransition(format!(
                    "only pending loans can be approved, loan is {}",
                    status.as_str()
                )));
            }

            model.status = LoanStatus::Approved.as_str().to_string();
            model.approval_date = Some(Utc::now().date_naive());
            let update = loans::ActiveModel {
                id: ActiveValue::Unchanged(model.id.clone()),
                status: ActiveValue::Set(model.status.clone()),
                approval_date: ActiveValue::Set(model.approval_date),
                ..Default::default()
            };
            update.update(&db_tx).await?;

            self.append_audit(
                &db_tx,
                loan_id,
                LoanStatus::Approved,
                actor,
                format!("Approved by {actor}"),
            )
            .await?;

            Ok(Loan::try_from(model)?)
        })
    }

    /// The treasurer pays an approved loan out of the group fund.
    ///
    /// The debit and the loan mutation are one atomic unit: if the fund
    /// cannot cover the principal the whole operation fails with
    /// [`EngineError::InsufficientFunds`] and the loan stays `APPROVED`.
    pub async fn disburse_loan(&self, loan_id: &str, actor: &str) -> ResultEngine<Loan> {
        with_tx!(self, |db_tx| {
            let user = self.require_actor(&db_tx, actor).await?;
            require_role(&user, Role::Treasurer)?;

            let mut model = self.require_loan(&db_tx, loan_id).await?;
            let status = LoanStatus::try_from(model.status.as_str())?;
            if !status.permits_disbursement() {
                return Err(EngineError::InvalidTransition(format!(
                    "only approved loans can be disbursed, loan is {}",
                    status.as_str()
                )));
            }

            let amount = Amount::new(model.amount_minor);
            let group_id = self.loan_group_id(&db_tx, &model).await?;
            self.debit_fund(&db_tx, &group_id, amount).await?;

            model.status = LoanStatus::Disbursed.as_str().to_string();
            model.disbursement_date = Some(Utc::now().date_naive());
            // Disbursement opens balance tracking: remaining is reset to the
            // full principal exactly once, here.
            model.remaining_minor = amount.minor();
            let update = loans::ActiveModel {
                id: ActiveValue::Unchanged(model.id.clone()),
                status: ActiveValue::Set(model.status.clone()),
                disbursement_date: ActiveValue::Set(model.disbursement_date),
                remaining_minor: ActiveValue::Set(model.remaining_minor),
                ..Default::default()
            };
            update.update(&db_tx).await?;

            self.append_audit(
                &db_tx,
                loan_id,
                LoanStatus::Disbursed,
                actor,
                format!("Disbursed {amount} by {actor}"),
            )
            .await?;

            Ok(Loan::try_from(model)?)
        })
    }

    /// Reject a loan that has not been disbursed. No money ever moved, so
    /// no fund interaction.
    pub async fn reject_loan(&self, loan_id: &str, actor: &str) -> ResultEngine<Loan> {
        with_tx!(self, |db_tx| {
            self.require_actor(&db_tx, actor).await?;

            let mut model = self.require_loan(&db_tx, loan_id).await?;
            let status = LoanStatus::try_from(model.status.as_str())?;
            if !status.permits_rejection() {
                return Err(EngineError::InvalidTransition(format!(
                    "only pending or approved loans can be rejected, loan is {}",
                    status.as_str()
                )));
            }

            model.status = LoanStatus::Rejected.as_str().to_string();
            let update = loans::ActiveModel {
                id: ActiveValue::Unchanged(model.id.clone()),
                status: ActiveValue::Set(model.status.clone()),
                ..Default::default()
            };
            update.update(&db_tx).await?;

            self.append_audit(
                &db_tx,
                loan_id,
                LoanStatus::Rejected,
                actor,
                format!("Rejected by {actor}"),
            )
            .await?;

            Ok(Loan::try_from(model)?)
        })
    }

    /// The borrowing member repays part or all of a disbursed loan.
    ///
    /// The whole repayment is rejected with
    /// [`EngineError::ExcessRepayment`] when it exceeds the remaining
    /// balance; nothing is partially applied. Reaching zero marks the loan
    /// `REPAID` and stamps the repayment date. The fund credit happens in
    /// the same transaction.
    pub async fn repay_loan(
        &self,
        loan_id: &str,
        amount: Amount,
        actor: &str,
    ) -> ResultEngine<Loan> {
        if !amount.is_positive() {
            return Err(EngineError::InvalidAmount(
                "repayment amount must be > 0".to_string(),
            ));
        }
        with_tx!(self, |db_tx| {
            let user = self.require_actor(&db_tx, actor).await?;

            let mut model = self.require_loan(&db_tx, loan_id).await?;
            require_own_member(&user, &model.member_id)?;

            let status = LoanStatus::try_from(model.status.as_str())?;
            if !status.permits_repayment() {
                return Err(EngineError::InvalidTransition(format!(
                    "only disbursed loans can be repaid, loan is {}",
                    status.as_str()
                )));
            }

            let remaining = Amount::new(model.remaining_minor);
            let new_balance = remaining
                .checked_sub(amount)
                .ok_or_else(|| EngineError::InvalidAmount("amount too large".to_string()))?;
            if new_balance.is_negative() {
                return Err(EngineError::ExcessRepayment(format!(
                    "repayment {amount} exceeds remaining balance {remaining}"
                )));
            }

            model.remaining_minor = new_balance.minor();
            if new_balance.is_zero() {
                model.status = LoanStatus::Repaid.as_str().to_string();
                model.repayment_date = Some(Utc::now().date_naive());
            }
            let update = loans::ActiveModel {
                id: ActiveValue::Unchanged(model.id.clone()),
                remaining_minor: ActiveValue::Set(model.remaining_minor),
                status: ActiveValue::Set(model.status.clone()),
                repayment_date: ActiveValue::Set(model.repayment_date),
                ..Default::default()
            };
            update.update(&db_tx).await?;

            let group_id = self.loan_group_id(&db_tx, &model).await?;
            self.credit_fund(&db_tx, &group_id, amount).await?;

            let loan = Loan::try_from(model)?;
            self.append_audit(
                &db_tx,
                loan_id,
                loan.status,
                actor,
                format!("Repayment of {amount} by {actor}"),
            )
            .await?;

            Ok(loan)
        })
    }
}
