use actix_web::{web, HttpResponse};
use serde::Serialize;

use crate::state::app_state::AppState;
use crate::ws::hub::ConnectionCount;
use crate::AppError;

#[derive(Debug, Serialize)]
struct HealthBody {
    status: &'static str,
    connections: usize,
}

async fn health(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let connections = app_state
        .hub
        .send(ConnectionCount)
        .await
        .map_err(|err| AppError::internal(format!("hub unavailable: {err}")))?;

    Ok(HttpResponse::Ok().json(HealthBody {
        status: "ok",
        connections,
    }))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health));
}
