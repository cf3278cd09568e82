//! Users table (the resolved actor identity).
//!
//! The engine stores every attribution by `username`. A user may be linked
//! to a `members` row; the link is what lifecycle ownership checks use.

use sea_orm::DbErr;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::EngineError;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub username: String,
    pub password: String,
    pub role: String,
    pub member_id: Option<String>,
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

/// Group office held by a user.
///
/// Presidents approve loans, treasurers disburse them; either may reject.
/// Ordinary members apply for and repay their own loans.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Member,
    President,
    Treasurer,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::President => "president",
            Self::Treasurer => "treasurer",
        }
    }
}

impl TryFrom<&str> for Role {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "member" => Ok(Self::Member),
            "president" => Ok(Self::President),
            "treasurer" => Ok(Self::Treasurer),
            other => Err(EngineError::Database(DbErr::Custom(format!(
                "invalid role: {other}"
            )))),
        }
    }
}
