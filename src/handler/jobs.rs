use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::jobdtos::*,
    error::HttpError,
    middleware::JWTAuthMiddleware,
    AppState,
};

pub fn jobs_handler() -> Router {
    Router::new()
        .route("/", post(create_job))
        .route("/user", get(get_requester_jobs))
        .route("/provider", get(get_provider_jobs))
        .route("/:job_id", get(get_job))
        .route("/:job_id/accept", post(accept_job))
        .route("/:job_id/start", post(start_job))
        .route("/:job_id/end", post(end_job))
        .route("/:job_id/cancel", post(cancel_job))
        .route("/:job_id/rate", post(rate_job))
        .route("/:job_id/messages", get(get_messages).post(send_message))
}

fn job_response(job: crate::models::jobmodel::Job) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "success",
        "data": JobResponseDto::from(job)
    }))
}

pub async fn create_job(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    body: Result<Json<CreateJobDto>, JsonRejection>,
) -> Result<impl IntoResponse, HttpError> {
    let Json(body) = body?;
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let job = app_state
        .job_service
        .request(auth.caller, body.into_request()?)
        .await?;

    Ok((StatusCode::CREATED, job_response(job)))
}

pub async fn get_requester_jobs(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
) -> Result<impl IntoResponse, HttpError> {
    let jobs = app_state.job_service.list_for_requester(auth.caller).await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": JobResponseDto::from_jobs(jobs)
    })))
}

pub async fn get_provider_jobs(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
) -> Result<impl IntoResponse, HttpError> {
    let jobs = app_state.job_service.list_for_provider(auth.caller).await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": JobResponseDto::from_jobs(jobs)
    })))
}

pub async fn get_job(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let job = app_state.job_service.get_job(job_id, auth.caller).await?;
    Ok(job_response(job))
}

pub async fn accept_job(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let job = app_state.job_service.accept(job_id, auth.caller).await?;
    Ok(job_response(job))
}

pub async fn start_job(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let job = app_state.job_service.start(job_id, auth.caller).await?;
    Ok(job_response(job))
}

pub async fn end_job(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let job = app_state.job_service.end(job_id, auth.caller).await?;
    Ok(job_response(job))
}

pub async fn cancel_job(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    Path(job_id): Path<Uuid>,
    body: Option<Json<CancelJobDto>>,
) -> Result<impl IntoResponse, HttpError> {
    let body = body.map(|Json(body)| body).unwrap_or_default();
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let job = app_state
        .job_service
        .cancel(job_id, auth.caller, body.reason)
        .await?;
    Ok(job_response(job))
}

pub async fn rate_job(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    Path(job_id): Path<Uuid>,
    body: Result<Json<RateJobDto>, JsonRejection>,
) -> Result<impl IntoResponse, HttpError> {
    let Json(body) = body?;

    // Range is checked in the service, after the ownership, status and repeat checks.
    let job = app_state
        .job_service
        .rate(job_id, auth.caller, body.rating)
        .await?;
    Ok(job_response(job))
}

pub async fn get_messages(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let messages = app_state.chat_service.list(job_id, auth.caller.id).await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": messages
    })))
}

pub async fn send_message(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddleware>,
    Path(job_id): Path<Uuid>,
    body: Result<Json<SendMessageDto>, JsonRejection>,
) -> Result<impl IntoResponse, HttpError> {
    let Json(body) = body?;
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let message = app_state
        .chat_service
        .send(job_id, auth.caller.id, &body.text)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "status": "success",
            "data": message
        })),
    ))
}
