//! Savings deposit API endpoints

use api_types::deposit::{DepositNew, DepositView};
use axum::{Extension, Json, extract::State};

use crate::{ServerError, loans::own_member_id, server::ServerState};
use engine::{Amount, users};

/// Handle requests for recording a savings deposit for the authenticated
/// user's member.
pub async fn record(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<DepositNew>,
) -> Result<Json<DepositView>, ServerError> {
    let member_id = own_member_id(&user)?;
    let deposit = state
        .engine
        .record_deposit(
            &member_id,
            Amount::new(payload.amount_minor),
            &payload.deposit_type,
            &user.username,
        )
        .await?;

    Ok(Json(DepositView {
        id: deposit.id,
        member_id: deposit.member_id,
        amount_minor: deposit.amount.minor(),
        deposit_type: deposit.deposit_type,
        deposit_date: deposit.deposit_date,
    }))
}
