use std::sync::Arc;

use axum::{routing::get, Router};

use appointment_cell::router::appointment_routes;
use scheduling_cell::router::{schedule_routes, slot_routes};
use shared_config::AppConfig;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    // Static segments win over wildcards, so /appointments/slots can nest
    // alongside /appointments/{appointment_id}.
    Router::new()
        .route("/", get(|| async { "Clinica booking API is running!" }))
        .nest("/appointments/slots", slot_routes(state.clone()))
        .nest("/appointments", appointment_routes(state.clone()))
        .nest("/doctors", schedule_routes(state.clone()))
}
