use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use caro_backend::config::ServerConfig;
use caro_backend::infra::state::build_state;
use caro_backend::routes;
use tracing::info;

mod telemetry;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Invalid configuration: {e}");
            std::process::exit(1);
        }
    };
    telemetry::init_tracing(config.log_json);

    let (host, port) = config.bind_addr();
    info!(
        host = %host,
        port,
        rows = config.board_rows,
        columns = config.board_columns,
        rule = %config.default_rule,
        anonymous = config.allow_anonymous,
        "🚀 Starting caro backend"
    );

    let app_state = match build_state().with_config(config).build().await {
        Ok(state) => state,
        Err(e) => {
            eprintln!("❌ Failed to build application state: {e}");
            std::process::exit(1);
        }
    };

    let data = web::Data::new(app_state);

    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .app_data(data.clone())
            .configure(routes::configure)
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
