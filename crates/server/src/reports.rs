//! Read-only loan report endpoints

use api_types::loan::LoansResponse;
use api_types::member::{MemberView, MembersResponse};
use axum::{
    Extension, Json,
    extract::{Path, State},
};

use crate::{ServerError, loans::loan_view, server::ServerState};
use engine::users;

/// Handle requests for a member's loans.
pub async fn by_member(
    Extension(_user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(member_id): Path<String>,
) -> Result<Json<LoansResponse>, ServerError> {
    let loans = state.engine.loans_by_member(&member_id).await?;

    Ok(Json(LoansResponse {
        loans: loans.into_iter().map(loan_view).collect(),
    }))
}

/// Handle requests for a group's loans.
pub async fn by_group(
    Extension(_user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(group_id): Path<String>,
) -> Result<Json<LoansResponse>, ServerError> {
    let loans = state.engine.loans_by_group(&group_id).await?;

    Ok(Json(LoansResponse {
        loans: loans.into_iter().map(loan_view).collect(),
    }))
}

/// Handle requests for a group's overdue loans.
pub async fn overdue(
    Extension(_user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(group_id): Path<String>,
) -> Result<Json<LoansResponse>, ServerError> {
    let loans = state.engine.overdue_loans(&group_id).await?;

    Ok(Json(LoansResponse {
        loans: loans.into_iter().map(loan_view).collect(),
    }))
}

/// Handle requests for the members holding overdue loans.
pub async fn overdue_members(
    Extension(_user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(group_id): Path<String>,
) -> Result<Json<MembersResponse>, ServerError> {
    let members = state.engine.members_with_overdue_loans(&group_id).await?;

    Ok(Json(MembersResponse {
        members: members
            .into_iter()
            .map(|member| MemberView {
                id: member.id,
                name: member.name,
                phone: member.phone,
                email: member.email,
                group_id: member.group_id,
            })
            .collect(),
    }))
}

/// Handle requests for a group's loans fully repaid in a calendar month.
pub async fn monthly_repayments(
    Extension(_user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path((group_id, year, month)): Path<(String, i32, u32)>,
) -> Result<Json<LoansResponse>, ServerError> {
    let loans = state
        .engine
        .monthly_repayments(&group_id, year, month)
        .await?;

    Ok(Json(LoansResponse {
        loans: loans.into_iter().map(loan_view).collect(),
    }))
}
