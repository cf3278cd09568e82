//! Append-only audit trail for loan lifecycle transitions.
//!
//! One row per successful transition, never per failed attempt. Rows are
//! immutable once written; display order is timestamp ascending with the
//! auto-increment id as the tiebreak, so entries written in the same
//! instant keep insertion order.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::Serialize;

use crate::{EngineError, LoanStatus};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "loan_audit_log")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub loan_id: String,
    pub status: String,
    pub actor: String,
    pub timestamp: DateTimeUtc,
    pub note: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::loans::Entity",
        from = "Column::LoanId",
        to = "super::loans::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Loans,
}

impl Related<super::loans::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Loans.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// One audit entry, as returned by `loan_history`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AuditEntry {
    pub id: i64,
    pub loan_id: String,
    pub status: LoanStatus,
    pub actor: String,
    pub timestamp: DateTime<Utc>,
    pub note: String,
}

impl TryFrom<Model> for AuditEntry {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            status: LoanStatus::try_from(model.status.as_str())?,
            id: model.id,
            loan_id: model.loan_id,
            actor: model.actor,
            timestamp: model.timestamp,
            note: model.note,
        })
    }
}
