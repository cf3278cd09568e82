//! Savings deposits.
//!
//! Deposit bookkeeping beyond the fund credit is an external concern; the
//! engine records the row so the group fund grows atomically with it and so
//! the external impact-tagging batch can pick unprocessed deposits up.

use chrono::NaiveDate;
use sea_orm::entity::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::{Amount, EngineError};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "saving_deposits")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub member_id: String,
    pub amount_minor: i64,
    pub deposit_type: String,
    pub deposit_date: Date,
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

/// A recorded deposit, as returned by `record_deposit`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Deposit {
    pub id: String,
    pub member_id: String,
    pub amount: Amount,
    pub deposit_type: String,
    pub deposit_date: NaiveDate,
}

impl Deposit {
    pub fn new(
        member_id: &str,
        amount: Amount,
        deposit_type: &str,
        deposit_date: NaiveDate,
    ) -> Result<Self, EngineError> {
        if !amount.is_positive() {
            return Err(EngineError::InvalidAmount(
                "deposit amount must be > 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            member_id: member_id.to_string(),
            amount,
            deposit_type: deposit_type.to_string(),
            deposit_date,
        })
    }
}

impl From<&Deposit> for ActiveModel {
    fn from(deposit: &Deposit) -> Self {
        use sea_orm::ActiveValue;

        Self {
            id: ActiveValue::Set(deposit.id.clone()),
            member_id: ActiveValue::Set(deposit.member_id.clone()),
            amount_minor: ActiveValue::Set(deposit.amount.minor()),
            deposit_type: ActiveValue::Set(deposit.deposit_type.clone()),
            deposit_date: ActiveValue::Set(deposit.deposit_date),
        }
    }
}
