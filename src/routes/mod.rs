use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};

use crate::middleware::{
    auth::require_bearer_auth,
    rate_limit::{new_rps_state, rps_middleware},
};
use crate::AppState;

pub mod auth;
pub mod candidates;
pub mod dashboard;
pub mod extract;
pub mod health;
pub mod interviews;
pub mod jobs;
pub mod outreach;
pub mod sourcing;
pub mod tasks;

/// Every endpoint of the service. `/health`, the auth entry points and the
/// signed provider webhook are open; the rest require a bearer token.
pub fn router(state: AppState) -> Router {
    let open_api = Router::new()
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/register", post(auth::register))
        .route("/api/v1/webhooks/messaging", post(outreach::messaging_webhook));

    let protected_api = Router::new()
        .route("/api/v1/auth/me", get(auth::me))
        .route("/api/v1/jobs", get(jobs::list_jobs).post(jobs::create_job))
        .route(
            "/api/v1/jobs/:id",
            get(jobs::get_job)
                .patch(jobs::update_job)
                .delete(jobs::delete_job),
        )
        .route("/api/v1/jobs/:id/candidates", get(jobs::job_candidates))
        .route(
            "/api/v1/candidates",
            get(candidates::list_candidates).post(candidates::create_candidate),
        )
        .route(
            "/api/v1/candidates/bulk-approve",
            post(candidates::bulk_approve),
        )
        .route(
            "/api/v1/candidates/:id",
            get(candidates::get_candidate)
                .patch(candidates::update_candidate)
                .delete(candidates::delete_candidate),
        )
        .route("/api/v1/candidates/:id/stage", post(candidates::change_stage))
        .route("/api/v1/candidates/:id/status", post(candidates::change_status))
        .route(
            "/api/v1/candidates/:id/analyze",
            post(candidates::analyze_candidate),
        )
        .route(
            "/api/v1/candidates/:id/interviews",
            get(candidates::candidate_interviews),
        )
        .route(
            "/api/v1/candidates/:id/outreach",
            get(candidates::outreach_history).post(candidates::send_outreach),
        )
        .route(
            "/api/v1/interviews",
            get(interviews::list_interviews).post(interviews::schedule_interview),
        )
        .route(
            "/api/v1/interviews/availability",
            get(interviews::availability),
        )
        .route("/api/v1/interviews/:id", get(interviews::get_interview))
        .route(
            "/api/v1/interviews/:id/cancel",
            post(interviews::cancel_interview),
        )
        .route(
            "/api/v1/interviews/:id/reschedule",
            post(interviews::reschedule_interview),
        )
        .route(
            "/api/v1/interviews/:id/feedback",
            get(interviews::list_feedback).post(interviews::submit_feedback),
        )
        .route("/api/v1/dashboard/overview", get(dashboard::overview))
        .route("/api/v1/dashboard/trends", get(dashboard::trends))
        .route(
            "/api/v1/dashboard/pipeline/:job_id",
            get(dashboard::pipeline),
        )
        .route("/api/v1/sourcing/search", post(sourcing::search))
        .route("/api/v1/sourcing/import", post(sourcing::import))
        .route("/api/v1/calls/:call_id/status", get(outreach::call_status))
        .route("/api/v1/tasks/:id", get(tasks::get_task))
        .route("/api/v1/tasks/:id/cancel", post(tasks::cancel_task))
        .route_layer(from_fn_with_state(state.clone(), require_bearer_auth));

    let api = open_api
        .merge(protected_api)
        .layer(from_fn_with_state(
            new_rps_state(state.config.api_rps),
            rps_middleware,
        ));

    Router::new()
        .route("/health", get(health::health))
        .merge(api)
        .with_state(state)
}
