use axum::{
    Router,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use botaskaf_core::health::healthz;
use botaskaf_core::middleware::{propagate_request_id_layer, request_id_layer};

use crate::handlers::{
    contact_form::{issue_token, verify_token},
    forms::{create_form, get_form, list_forms},
    login::{login, setup},
    readyz,
    recipients::{create_recipient, get_recipient, list_recipients},
    users::{create_user, get_user, list_users},
};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Public widget
        .route("/contactform/{uuid}/token", get(issue_token))
        .route("/contactform/{uuid}/verify", post(verify_token))
        // Session
        .route("/login", post(login))
        .route("/setup", post(setup))
        // Forms
        .route("/forms", get(list_forms).post(create_form))
        .route("/forms/{id}", get(get_form))
        // Recipients
        .route(
            "/forms/{id}/recipients",
            get(list_recipients).post(create_recipient),
        )
        .route("/forms/{id}/recipients/{recipient_id}", get(get_recipient))
        // Users
        .route("/users", get(list_users).post(create_user))
        .route("/users/{id}", get(get_user))
        .layer(
            ServiceBuilder::new()
                .layer(request_id_layer())
                .layer(propagate_request_id_layer())
                .layer(TraceLayer::new_for_http()),
        )
        .with_state(state)
}
