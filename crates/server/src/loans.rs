//! Loan lifecycle API endpoints

use api_types::audit::{AuditEntryView, HistoryResponse};
use api_types::loan::{LoanApply, LoanView, RepaymentNew};
use axum::{
    Extension, Json,
    extract::{Path, State},
};

use crate::{ServerError, server::ServerState};
use engine::{Amount, EngineError, Role, users};

pub(crate) fn map_status(status: engine::LoanStatus) -> api_types::LoanStatus {
    match status {
        engine::LoanStatus::Pending => api_types::LoanStatus::Pending,
        engine::LoanStatus::Approved => api_types::LoanStatus::Approved,
        engine::LoanStatus::Disbursed => api_types::LoanStatus::Disbursed,
        engine::LoanStatus::Repaid => api_types::LoanStatus::Repaid,
        engine::LoanStatus::Rejected => api_types::LoanStatus::Rejected,
    }
}

pub(crate) fn loan_view(loan: engine::Loan) -> LoanView {
    LoanView {
        id: loan.id,
        member_id: loan.member_id,
        amount_minor: loan.amount.minor(),
        remaining_minor: loan.remaining.minor(),
        status: map_status(loan.status),
        purpose: loan.purpose,
        application_date: loan.application_date,
        approval_date: loan.approval_date,
        disbursement_date: loan.disbursement_date,
        repayment_date: loan.repayment_date,
    }
}

/// The member linked to the authenticated user, for operations a member
/// performs on their own behalf.
pub(crate) fn own_member_id(user: &users::Model) -> Result<String, ServerError> {
    user.member_id.clone().ok_or_else(|| {
        ServerError::Engine(EngineError::Forbidden(
            "no member is linked to the current user".to_string(),
        ))
    })
}

fn require_role(user: &users::Model, roles: &[Role], action: &str) -> Result<(), ServerError> {
    let role = Role::try_from(user.role.as_str()).map_err(ServerError::Engine)?;
    if !roles.contains(&role) {
        return Err(ServerError::Engine(EngineError::Forbidden(format!(
            "{} may not {action}",
            role.as_str()
        ))));
    }
    Ok(())
}

/// Handle requests for new loan applications.
pub async fn apply(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<LoanApply>,
) -> Result<Json<LoanView>, ServerError> {
    let member_id = own_member_id(&user)?;
    let loan = state
        .engine
        .apply_loan(
            &member_id,
            Amount::new(payload.amount_minor),
            payload.purpose.as_deref(),
            &user.username,
        )
        .await?;

    Ok(Json(loan_view(loan)))
}

/// Handle requests for approving a pending loan (president only).
pub async fn approve(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(loan_id): Path<String>,
) -> Result<Json<LoanView>, ServerError> {
    require_role(&user, &[Role::President], "approve loans")?;
    let loan = state.engine.approve_loan(&loan_id, &user.username).await?;

    Ok(Json(loan_view(loan)))
}

/// Handle requests for disbursing an approved loan.
///
/// The treasurer-role check lives in the engine, next to the fund debit.
pub async fn disburse(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(loan_id): Path<String>,
) -> Result<Json<LoanView>, ServerError> {
    let loan = state.engine.disburse_loan(&loan_id, &user.username).await?;

    Ok(Json(loan_view(loan)))
}

/// Handle requests for rejecting a loan (president or treasurer).
pub async fn reject(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(loan_id): Path<String>,
) -> Result<Json<LoanView>, ServerError> {
    require_role(&user, &[Role::President, Role::Treasurer], "reject loans")?;
    let loan = state.engine.reject_loan(&loan_id, &user.username).await?;

    Ok(Json(loan_view(loan)))
}

/// Handle requests for repaying a disbursed loan.
pub async fn repay(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(loan_id): Path<String>,
    Json(payload): Json<RepaymentNew>,
) -> Result<Json<LoanView>, ServerError> {
    let loan = state
        .engine
        .repay_loan(&loan_id, Amount::new(payload.amount_minor), &user.username)
        .await?;

    Ok(Json(loan_view(loan)))
}

/// Handle requests for a loan's audit history.
pub async fn history(
    Extension(_user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(loan_id): Path<String>,
) -> Result<Json<HistoryResponse>, ServerError> {
    let entries = state.engine.loan_history(&loan_id).await?;

    Ok(Json(HistoryResponse {
        loan_id,
        entries: entries
            .into_iter()
            .map(|entry| AuditEntryView {
                status: map_status(entry.status),
                actor: entry.actor,
                timestamp: entry.timestamp,
                note: entry.note,
            })
            .collect(),
    }))
}
