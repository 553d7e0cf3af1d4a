pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};

use crate::resumes::handlers;
use crate::state::AppState;

/// Room for multipart boundaries and the text fields around the file part.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = usize::try_from(state.policy.max_bytes())
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/api/v1/resumes/upload",
            post(handlers::handle_upload).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route(
            "/api/v1/resumes/upload-info",
            get(handlers::handle_upload_info),
        )
        .route(
            "/api/v1/resumes/:id",
            get(handlers::handle_get_resume).delete(handlers::handle_delete_resume),
        )
        .route(
            "/api/v1/resumes/:id/status",
            put(handlers::handle_update_status),
        )
        .route(
            "/api/v1/resumes/job/:job_posting_id",
            get(handlers::handle_list_for_job_posting),
        )
        .route(
            "/api/v1/resumes/job/:job_posting_id/status/:status",
            get(handlers::handle_list_by_status),
        )
        .route(
            "/api/v1/resumes/job/:job_posting_id/count",
            get(handlers::handle_count_by_status),
        )
        .with_state(state)
}
