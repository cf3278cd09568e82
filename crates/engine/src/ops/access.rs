//! Lookup and authorization helpers shared by the lifecycle operations.
//!
//! Every helper takes the caller's transaction so checks and mutations see
//! the same snapshot. The member → group direction is always resolved by
//! lookup here; no entity stores a back-pointer that would need manual
//! synchronization.

use sea_orm::{DatabaseTransaction, prelude::*};

use crate::{EngineError, ResultEngine, Role, groups, loans, members, users};

use super::Engine;

impl Engine {
    /// Resolve the acting user by username.
    pub(super) async fn require_actor(
        &self,
        db: &DatabaseTransaction,
        username: &str,
    ) -> ResultEngine<users::Model> {
        users::Entity::find_by_id(username.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("user not exists".to_string()))
    }

    pub(super) async fn require_member(
        &self,
        db: &DatabaseTransaction,
        member_id: &str,
    ) -> ResultEngine<members::Model> {
        members::Entity::find_by_id(member_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("member not exists".to_string()))
    }

    pub(super) async fn require_group(
        &self,
        db: &DatabaseTransaction,
        group_id: &str,
    ) -> ResultEngine<groups::Model> {
        groups::Entity::find_by_id(group_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("group not exists".to_string()))
    }

    pub(super) async fn require_loan(
        &self,
        db: &DatabaseTransaction,
        loan_id: &str,
    ) -> ResultEngine<loans::Model> {
        loans::Entity::find_by_id(loan_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("loan not exists".to_string()))
    }

    /// The group a loan draws on, resolved through its member.
    pub(super) async fn loan_group_id(
        &self,
        db: &DatabaseTransaction,
        loan: &loans::Model,
    ) -> ResultEngine<String> {
        let member = self.require_member(db, &loan.member_id).await?;
        Ok(member.group_id)
    }
}

/// Require the actor to hold `role`.
pub(super) fn require_role(user: &users::Model, role: Role) -> ResultEngine<()> {
    if Role::try_from(user.role.as_str())? != role {
        return Err(EngineError::Forbidden(format!(
            "only the {} can do this",
            role.as_str()
        )));
    }
    Ok(())
}

/// Require the actor's linked member to be `member_id`.
pub(super) fn require_own_member(user: &users::Model, member_id: &str) -> ResultEngine<()> {
    match user.member_id.as_deref() {
        Some(linked) if linked == member_id => Ok(()),
        _ => Err(EngineError::Forbidden(
            "this loan does not belong to the current user".to_string(),
        )),
    }
}
