//! Processing status for the external impact-tagging batch.
//!
//! The engine only persists and exposes the flag: a row is created
//! unprocessed whenever a loan or deposit is created, and the batch job
//! marks it processed once tagged. What "processed" means is the batch
//! job's business.

use sea_orm::DbErr;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::EngineError;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "processing_status")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub entity_type: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub reference_id: String,
    pub processed: bool,
    pub processed_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Kind of entity a processing row refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Loan,
    Deposit,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Loan => "loan",
            Self::Deposit => "deposit",
        }
    }
}

impl TryFrom<&str> for EntityKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "loan" => Ok(Self::Loan),
            "deposit" => Ok(Self::Deposit),
            other => Err(EngineError::Database(DbErr::Custom(format!(
                "invalid entity kind: {other}"
            )))),
        }
    }
}
