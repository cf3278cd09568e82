//! Read-only projections over the ledger.
//!
//! Queries never mutate; each runs in its own transaction so it reads one
//! consistent snapshot and can never observe a half-applied transition.

use chrono::{Duration, NaiveDate, Utc};
use sea_orm::{
    ActiveValue, JoinType, QueryFilter, QueryOrder, QuerySelect, TransactionTrait, prelude::*,
};

use crate::{
    AuditEntry, EngineError, EntityKind, Loan, LoanStatus, Member, ResultEngine, audit_log, loans,
    members, processing,
};

use super::{Engine, OVERDUE_AFTER_DAYS, with_tx};

impl Engine {
    /// All loans of one member, oldest application first.
    pub async fn loans_by_member(&self, member_id: &str) -> ResultEngine<Vec<Loan>> {
        with_tx!(self, |db_tx| {
            self.require_member(&db_tx, member_id).await?;
            let models = loans::Entity::find()
                .filter(loans::Column::MemberId.eq(member_id.to_string()))
                .order_by_asc(loans::Column::ApplicationDate)
                .order_by_asc(loans::Column::Id)
                .all(&db_tx)
                .await?;
            models.into_iter().map(Loan::try_from).collect()
        })
    }

    /// All loans of a group, resolved through the member link.
    pub async fn loans_by_group(&self, group_id: &str) -> ResultEngine<Vec<Loan>> {
        with_tx!(self, |db_tx| {
            self.require_group(&db_tx, group_id).await?;
            let models = loans::Entity::find()
                .join(JoinType::InnerJoin, loans::Relation::Members.def())
                .filter(members::Column::GroupId.eq(group_id.to_string()))
                .order_by_asc(loans::Column::ApplicationDate)
                .order_by_asc(loans::Column::Id)
                .all(&db_tx)
                .await?;
            models.into_iter().map(Loan::try_from).collect()
        })
    }

    /// Disbursed loans of a group whose disbursement is older than the
    /// overdue threshold at query time.
    pub async fn overdue_loans(&self, group_id: &str) -> ResultEngine<Vec<Loan>> {
        let due = Utc::now().date_naive() - Duration::days(OVERDUE_AFTER_DAYS);
        with_tx!(self, |db_tx| {
            self.require_group(&db_tx, group_id).await?;
            let models = self.overdue_models(&db_tx, group_id, due).await?;
            models.into_iter().map(Loan::try_from).collect()
        })
    }

    /// Distinct members of a group holding at least one overdue loan.
    pub async fn members_with_overdue_loans(&self, group_id: &str) -> ResultEngine<Vec<Member>> {
        let due = Utc::now().date_naive() - Duration::days(OVERDUE_AFTER_DAYS);
        with_tx!(self, |db_tx| {
            self.require_group(&db_tx, group_id).await?;
            let models = self.overdue_models(&db_tx, group_id, due).await?;

            let mut member_ids: Vec<String> = Vec::new();
            for model in &models {
                if !member_ids.contains(&model.member_id) {
                    member_ids.push(model.member_id.clone());
                }
            }

            let mut out = Vec::with_capacity(member_ids.len());
            for member_id in member_ids {
                let member = self.require_member(&db_tx, &member_id).await?;
                out.push(Member::try_from(member)?);
            }
            Ok(out)
        })
    }

    /// Loans of a group fully repaid within the given calendar month.
    pub async fn monthly_repayments(
        &self,
        group_id: &str,
        year: i32,
        month: u32,
    ) -> ResultEngine<Vec<Loan>> {
        let start = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
            EngineError::InvalidAmount(format!("invalid month: {year}-{month:02}"))
        })?;
        let next_month = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)
        }
        .ok_or_else(|| EngineError::InvalidAmount(format!("invalid month: {year}-{month:02}")))?;
        let end = next_month - Duration::days(1);

        with_tx!(self, |db_tx| {
            self.require_group(&db_tx, group_id).await?;
            let models = loans::Entity::find()
                .join(JoinType::InnerJoin, loans::Relation::Members.def())
                .filter(members::Column::GroupId.eq(group_id.to_string()))
                .filter(loans::Column::RepaymentDate.between(start, end))
                .order_by_asc(loans::Column::RepaymentDate)
                .order_by_asc(loans::Column::Id)
                .all(&db_tx)
                .await?;
            models.into_iter().map(Loan::try_from).collect()
        })
    }

    /// Full audit history of a loan, timestamp ascending with insertion
    /// order as the tiebreak.
    pub async fn loan_history(&self, loan_id: &str) -> ResultEngine<Vec<AuditEntry>> {
        with_tx!(self, |db_tx| {
            self.require_loan(&db_tx, loan_id).await?;
            let models = audit_log::Entity::find()
                .filter(audit_log::Column::LoanId.eq(loan_id.to_string()))
                .order_by_asc(audit_log::Column::Timestamp)
                .order_by_asc(audit_log::Column::Id)
                .all(&db_tx)
                .await?;
            models.into_iter().map(AuditEntry::try_from).collect()
        })
    }

    /// Reference ids of the given kind not yet picked up by the external
    /// impact-tagging batch.
    pub async fn unprocessed(&self, kind: EntityKind) -> ResultEngine<Vec<String>> {
        with_tx!(self, |db_tx| {
            let models = processing::Entity::find()
                .filter(processing::Column::EntityType.eq(kind.as_str()))
                .filter(processing::Column::Processed.eq(false))
                .order_by_asc(processing::Column::ReferenceId)
                .all(&db_tx)
                .await?;
            Ok(models.into_iter().map(|m| m.reference_id).collect())
        })
    }

    /// Mark one entity processed on behalf of the batch job.
    pub async fn mark_processed(&self, kind: EntityKind, reference_id: &str) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let existing = processing::Entity::find_by_id((
                kind.as_str().to_string(),
                reference_id.to_string(),
            ))
            .one(&db_tx)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("processing status not exists".to_string()))?;

            let update = processing::ActiveModel {
                entity_type: ActiveValue::Unchanged(existing.entity_type),
                reference_id: ActiveValue::Unchanged(existing.reference_id),
                processed: ActiveValue::Set(true),
                processed_at: ActiveValue::Set(Some(Utc::now())),
            };
            update.update(&db_tx).await?;
            Ok(())
        })
    }

    async fn overdue_models(
        &self,
        db_tx: &sea_orm::DatabaseTransaction,
        group_id: &str,
        due: NaiveDate,
    ) -> ResultEngine<Vec<loans::Model>> {
        let models = loans::Entity::find()
            .join(JoinType::InnerJoin, loans::Relation::Members.def())
            .filter(members::Column::GroupId.eq(group_id.to_string()))
            .filter(loans::Column::Status.eq(LoanStatus::Disbursed.as_str()))
            .filter(loans::Column::DisbursementDate.lt(due))
            .order_by_asc(loans::Column::DisbursementDate)
            .order_by_asc(loans::Column::Id)
            .all(db_tx)
            .await?;
        Ok(models)
    }
}
