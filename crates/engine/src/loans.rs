//! Loan records and the lifecycle state machine.
//!
//! A loan moves `PENDING → APPROVED → DISBURSED → REPAID`, with `REJECTED`
//! reachable from `PENDING` or `APPROVED`. `REPAID` and `REJECTED` are
//! terminal. The permitted transitions live on [`LoanStatus`] so every
//! operation validates against the current status instead of blindly
//! overwriting it.

use chrono::NaiveDate;
use sea_orm::DbErr;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Amount, EngineError, ResultEngine};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "loans")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub member_id: String,
    pub amount_minor: i64,
    pub remaining_minor: i64,
    pub status: String,
    pub purpose: Option<String>,
    pub application_date: Date,
    pub approval_date: Option<Date>,
    pub disbursement_date: Option<Date>,
    pub repayment_date: Option<Date>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::members::Entity",
        from = "Column::MemberId",
        to = "super::members::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Members,
}

impl Related<super::members::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Members.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Status of a loan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    Pending,
    Approved,
    Disbursed,
    Repaid,
    Rejected,
}

impl LoanStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Disbursed => "disbursed",
            Self::Repaid => "repaid",
            Self::Rejected => "rejected",
        }
    }

    /// Only pending loans can be approved.
    pub fn permits_approval(self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Only approved loans can be disbursed.
    pub fn permits_disbursement(self) -> bool {
        matches!(self, Self::Approved)
    }

    /// A loan that never touched the fund can be rejected.
    pub fn permits_rejection(self) -> bool {
        matches!(self, Self::Pending | Self::Approved)
    }

    /// Repayments are accepted against disbursed loans. A fully repaid loan
    /// still passes this check; the excess-repayment rule then rejects any
    /// positive amount, so further repayments fail cleanly instead of
    /// surfacing a confusing transition error.
    pub fn permits_repayment(self) -> bool {
        matches!(self, Self::Disbursed | Self::Repaid)
    }
}

impl TryFrom<&str> for LoanStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "disbursed" => Ok(Self::Disbursed),
            "repaid" => Ok(Self::Repaid),
            "rejected" => Ok(Self::Rejected),
            // A status string nothing in the engine writes means the stored
            // row is corrupt, not that the caller sent bad input.
            other => Err(EngineError::Database(DbErr::Custom(format!(
                "invalid loan status: {other}"
            )))),
        }
    }
}

/// A loan as seen by callers of the engine.
///
/// Invariant: `Amount::ZERO <= remaining <= amount`. The remaining balance
/// starts equal to the principal, is reset to the principal once at
/// disbursement, and afterwards only decreases via repayments.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Loan {
    pub id: String,
    pub member_id: String,
    pub amount: Amount,
    pub remaining: Amount,
    pub status: LoanStatus,
    pub purpose: Option<String>,
    pub application_date: NaiveDate,
    pub approval_date: Option<NaiveDate>,
    pub disbursement_date: Option<NaiveDate>,
    pub repayment_date: Option<NaiveDate>,
}

impl Loan {
    /// Creates a fresh application: `PENDING`, remaining equal to the
    /// requested amount, application date stamped by the caller.
    pub fn new(
        member_id: &str,
        amount: Amount,
        purpose: Option<String>,
        application_date: NaiveDate,
    ) -> ResultEngine<Self> {
        if !amount.is_positive() {
            return Err(EngineError::InvalidAmount(
                "loan amount must be > 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            member_id: member_id.to_string(),
            amount,
            remaining: amount,
            status: LoanStatus::Pending,
            purpose,
            application_date,
            approval_date: None,
            disbursement_date: None,
            repayment_date: None,
        })
    }
}

impl TryFrom<Model> for Loan {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            status: LoanStatus::try_from(model.status.as_str())?,
            id: model.id,
            member_id: model.member_id,
            amount: Amount::new(model.amount_minor),
            remaining: Amount::new(model.remaining_minor),
            purpose: model.purpose,
            application_date: model.application_date,
            approval_date: model.approval_date,
            disbursement_date: model.disbursement_date,
            repayment_date: model.repayment_date,
        })
    }
}

impl From<&Loan> for ActiveModel {
    fn from(loan: &Loan) -> Self {
        use sea_orm::ActiveValue;

        Self {
            id: ActiveValue::Set(loan.id.clone()),
            member_id: ActiveValue::Set(loan.member_id.clone()),
            amount_minor: ActiveValue::Set(loan.amount.minor()),
            remaining_minor: ActiveValue::Set(loan.remaining.minor()),
            status: ActiveValue::Set(loan.status.as_str().to_string()),
            purpose: ActiveValue::Set(loan.purpose.clone()),
            application_date: ActiveValue::Set(loan.application_date),
            approval_date: ActiveValue::Set(loan.approval_date),
            disbursement_date: ActiveValue::Set(loan.disbursement_date),
            repayment_date: ActiveValue::Set(loan.repayment_date),
        }
    }
}
