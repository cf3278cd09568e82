use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Basic},
};
use sea_orm::{DatabaseConnection, EntityTrait};

use std::sync::Arc;

use crate::{deposits, fund, loans, reports};
use engine::{Engine, users};

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub db: DatabaseConnection,
}

/// Resolve the Basic-auth credentials to a `users` row and stash it as a
/// request extension. The engine receives only the username; role and
/// member-link checks read the row loaded here.
async fn auth(
    auth_header: TypedHeader<Authorization<Basic>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if auth_header.username().is_empty() || auth_header.password().is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let user: Option<users::Model> = users::Entity::find_by_id(auth_header.username().to_string())
        .one(&state.db)
        .await
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    let user = match user {
        Some(user) if user.password == auth_header.password() => user,
        _ => return Err(StatusCode::UNAUTHORIZED),
    };

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/loans", post(loans::apply))
        .route("/loans/{id}/approve", post(loans::approve))
        .route("/loans/{id}/disburse", post(loans::disburse))
        .route("/loans/{id}/reject", post(loans::reject))
        .route("/loans/{id}/repay", post(loans::repay))
        .route("/loans/{id}/history", get(loans::history))
        .route("/loans/member/{member_id}", get(reports::by_member))
        .route("/loans/group/{group_id}", get(reports::by_group))
        .route("/loans/group/{group_id}/overdue", get(reports::overdue))
        .route(
            "/loans/group/{group_id}/overdue/members",
            get(reports::overdue_members),
        )
        .route(
            "/loans/group/{group_id}/repayments/{year}/{month}",
            get(reports::monthly_repayments),
        )
        .route("/fund/{group_id}", get(fund::balance))
        .route("/deposits", post(deposits::record))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth))
        .with_state(state)
}

pub async fn run(engine: Engine, db: DatabaseConnection) {
    let listener = match tokio::net::TcpListener::bind("127.0.0.1:3000").await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, db, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    db: DatabaseConnection,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
        db,
    };

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    engine: Engine,
    db: DatabaseConnection,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, db, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
