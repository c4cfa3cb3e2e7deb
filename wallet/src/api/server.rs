use actix_web::{
    error::InternalError,
    get,
    http::{header, StatusCode},
    post, web, App, HttpResponse, HttpServer, Responder,
};
use log::info;
use std::sync::Arc;
use tickwire_common::{
    api::faucet::{FaucetClaimRequest, FaucetClaimResponse},
    config::VERSION,
};

use crate::{
    error::{ErrorKind, WalletError},
    faucet::FaucetService,
};

pub fn status_code(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        ErrorKind::Busy => StatusCode::CONFLICT,
        ErrorKind::Network | ErrorKind::Signing | ErrorKind::Protocol => StatusCode::BAD_GATEWAY,
        ErrorKind::Schema | ErrorKind::Storage | ErrorKind::Rejected | ErrorKind::Internal => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn error_response(err: &WalletError) -> HttpResponse {
    let retry_after = err.retry_after().map(|remaining| remaining.as_secs());
    let mut builder = HttpResponse::build(status_code(err.kind()));
    if let Some(seconds) = retry_after {
        builder.insert_header((header::RETRY_AFTER, seconds.to_string()));
    }
    builder.json(FaucetClaimResponse::failed(err.to_string(), retry_after))
}

#[get("/")]
async fn index() -> impl Responder {
    HttpResponse::Ok().body(format!("Tickwire faucet\nRunning on: {}", VERSION))
}

#[post("/v1/faucet/claim")]
async fn claim(
    service: web::Data<FaucetService>,
    body: web::Json<FaucetClaimRequest>,
) -> HttpResponse {
    match service.claim(&body).await {
        Ok(receipt) => {
            HttpResponse::Ok().json(FaucetClaimResponse::claimed(receipt.tx_id, receipt.target_tick))
        }
        Err(e) => error_response(&e),
    }
}

#[get("/v1/faucet/status/{network}/{address}")]
async fn status(service: web::Data<FaucetService>, path: web::Path<(String, String)>) -> HttpResponse {
    let (network, address) = path.into_inner();
    match service.status(&network, &address) {
        Ok(status) => HttpResponse::Ok().json(status),
        Err(e) => error_response(&e),
    }
}

// Malformed bodies answer with the same shape as any other failed claim
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _| {
        let response =
            HttpResponse::BadRequest().json(FaucetClaimResponse::failed(err.to_string(), None));
        InternalError::from_response(err, response).into()
    })
}

// Routes of the faucet server, the service itself is expected as app data
pub fn configure_faucet(config: &mut web::ServiceConfig) {
    config
        .app_data(json_config())
        .service(index)
        .service(claim)
        .service(status);
}

pub async fn run_faucet_server(
    service: Arc<FaucetService>,
    bind_address: &str,
    threads: usize,
) -> std::io::Result<()> {
    if log::log_enabled!(log::Level::Info) {
        info!("Starting faucet server on {}", bind_address);
    }

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::from(Arc::clone(&service)))
            .configure(configure_faucet)
    })
    .bind(bind_address)?
    .workers(threads)
    .run()
    .await
}
