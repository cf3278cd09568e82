//! Group fund API endpoints

use api_types::fund::FundView;
use axum::{
    Extension, Json,
    extract::{Path, State},
};

use crate::{ServerError, server::ServerState};
use engine::users;

/// Handle requests for a group's current fund balance.
pub async fn balance(
    Extension(_user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(group_id): Path<String>,
) -> Result<Json<FundView>, ServerError> {
    let balance = state.engine.fund_balance(&group_id).await?;

    Ok(Json(FundView {
        group_id,
        balance_minor: balance.minor(),
    }))
}
