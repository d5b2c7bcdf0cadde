use axum::{
    extract::State,
    response::{IntoResponse, Json},
};
use uuid::Uuid;

use crate::{error::Result, routes::extract::ApiPath, AppState};

#[utoipa::path(
    get,
    path = "/api/v1/tasks/{id}",
    params(
        ("id" = Uuid, Path, description = "Task ID")
    ),
    responses(
        (status = 200, description = "Task state", body = Json<Task>),
        (status = 404, description = "Task not found")
    )
)]
#[axum::debug_handler]
pub async fn get_task(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse> {
    let task = state.task_queue.get(id).await?;
    Ok(Json(task))
}

#[utoipa::path(
    post,
    path = "/api/v1/tasks/{id}/cancel",
    params(
        ("id" = Uuid, Path, description = "Task ID")
    ),
    responses(
        (status = 200, description = "Task cancelled", body = Json<Task>),
        (status = 404, description = "Task not found"),
        (status = 409, description = "Task already started")
    )
)]
#[axum::debug_handler]
pub async fn cancel_task(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse> {
    let task = state.task_queue.cancel(id).await?;
    Ok(Json(task))
}
