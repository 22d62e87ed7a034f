use std::sync::Arc;

use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::{JsonRejection, PathRejection},
        DefaultBodyLimit, Multipart, Path, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tracing::{debug, error};

use super::domain::{CompanyId, NewCompany};
use super::mail::MailDispatcher;
use super::repository::RecordStore;
use super::resume::{ResumeError, ResumeRepository};
use super::service::{OutreachError, OutreachService};

/// Largest accepted multipart upload.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Router builder exposing the company, resume, dispatch, and log endpoints.
pub fn outreach_router<S, R, M>(service: Arc<OutreachService<S, R, M>>) -> Router
where
    S: RecordStore + 'static,
    R: ResumeRepository + 'static,
    M: MailDispatcher + 'static,
{
    Router::new()
        .route(
            "/api/companies",
            get(list_companies_handler::<S, R, M>).post(create_company_handler::<S, R, M>),
        )
        .route(
            "/api/resume",
            get(resume_status_handler::<S, R, M>).post(upload_resume_handler::<S, R, M>),
        )
        .route("/api/send/:company_id", post(dispatch_handler::<S, R, M>))
        .route("/api/applications", get(applications_handler::<S, R, M>))
        .route("/uploads/:filename", get(uploaded_file_handler::<S, R, M>))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(service)
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let payload = json!({ "error": message.into() });
    (status, Json(payload)).into_response()
}

fn internal_error(err: &OutreachError) -> Response {
    error!(error = %err, "outreach request failed");
    error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}

async fn run_blocking<T, F>(work: F) -> Result<T, Response>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work).await.map_err(|err| {
        error!(error = %err, "blocking worker failed");
        error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("worker task failed: {err}"),
        )
    })
}

pub(crate) async fn list_companies_handler<S, R, M>(
    State(service): State<Arc<OutreachService<S, R, M>>>,
) -> Response
where
    S: RecordStore + 'static,
    R: ResumeRepository + 'static,
    M: MailDispatcher + 'static,
{
    let result = match run_blocking(move || service.companies()).await {
        Ok(result) => result,
        Err(response) => return response,
    };

    match result {
        Ok(companies) => (StatusCode::OK, Json(companies)).into_response(),
        Err(err) => internal_error(&err),
    }
}

pub(crate) async fn create_company_handler<S, R, M>(
    State(service): State<Arc<OutreachService<S, R, M>>>,
    payload: Result<Json<NewCompany>, JsonRejection>,
) -> Response
where
    S: RecordStore + 'static,
    R: ResumeRepository + 'static,
    M: MailDispatcher + 'static,
{
    let company = match payload {
        Ok(Json(company)) => company,
        Err(rejection) => {
            debug!(error = %rejection, "company payload rejected");
            return error_response(StatusCode::BAD_REQUEST, rejection.body_text());
        }
    };

    match service.add_company(company) {
        Ok(company) => (StatusCode::CREATED, Json(json!({ "id": company.id }))).into_response(),
        Err(OutreachError::Validation(err)) => {
            error_response(StatusCode::BAD_REQUEST, err.to_string())
        }
        Err(other) => internal_error(&other),
    }
}

pub(crate) async fn upload_resume_handler<S, R, M>(
    State(service): State<Arc<OutreachService<S, R, M>>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response
where
    S: RecordStore + 'static,
    R: ResumeRepository + 'static,
    M: MailDispatcher + 'static,
{
    let mut multipart = match multipart {
        Ok(multipart) => multipart,
        Err(rejection) => {
            debug!(error = %rejection, "resume upload is not multipart");
            return error_response(StatusCode::BAD_REQUEST, "No file part");
        }
    };

    let mut upload = None;
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                if field.name() != Some("file") {
                    continue;
                }
                let filename = field.file_name().unwrap_or_default().to_string();
                match field.bytes().await {
                    Ok(bytes) => {
                        upload = Some((filename, bytes));
                        break;
                    }
                    Err(err) => return error_response(err.status(), err.body_text()),
                }
            }
            Ok(None) => break,
            Err(err) => return error_response(err.status(), err.body_text()),
        }
    }

    let Some((filename, bytes)) = upload else {
        return error_response(StatusCode::BAD_REQUEST, "No file part");
    };

    let result = match run_blocking(move || service.upload_resume(&bytes, &filename)).await {
        Ok(result) => result,
        Err(response) => return response,
    };

    match result {
        Ok(url) => (
            StatusCode::OK,
            Json(json!({
                "ok": true,
                "url": url,
                "message": "Resume uploaded successfully",
            })),
        )
            .into_response(),
        Err(OutreachError::Resume(ResumeError::InvalidInput(reason))) => {
            error_response(StatusCode::BAD_REQUEST, reason.to_string())
        }
        Err(other) => {
            error!(error = %other, "resume upload failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "ok": false,
                    "error": format!("Upload failed: {other}"),
                })),
            )
                .into_response()
        }
    }
}

pub(crate) async fn resume_status_handler<S, R, M>(
    State(service): State<Arc<OutreachService<S, R, M>>>,
) -> Response
where
    S: RecordStore + 'static,
    R: ResumeRepository + 'static,
    M: MailDispatcher + 'static,
{
    let payload = match service.resume_url() {
        Some(url) => json!({ "ok": true, "url": url }),
        None => json!({ "ok": false, "error": "No resume uploaded yet" }),
    };
    (StatusCode::OK, Json(payload)).into_response()
}

pub(crate) async fn dispatch_handler<S, R, M>(
    State(service): State<Arc<OutreachService<S, R, M>>>,
    company_id: Result<Path<i64>, PathRejection>,
) -> Response
where
    S: RecordStore + 'static,
    R: ResumeRepository + 'static,
    M: MailDispatcher + 'static,
{
    // Non-numeric ids can never match a company.
    let company_id = match company_id {
        Ok(Path(company_id)) => CompanyId(company_id),
        Err(rejection) => {
            debug!(error = %rejection, "company id is not an integer");
            return error_response(StatusCode::NOT_FOUND, "Company not found");
        }
    };
    let result = match run_blocking(move || service.dispatch(company_id)).await {
        Ok(result) => result,
        Err(response) => return response,
    };

    match result {
        Ok(application) => (StatusCode::OK, Json(application.dispatch_view())).into_response(),
        Err(err @ OutreachError::CompanyNotFound(_)) => {
            error_response(StatusCode::NOT_FOUND, err.to_string())
        }
        Err(err @ OutreachError::ResumeMissing) => {
            error_response(StatusCode::BAD_REQUEST, err.to_string())
        }
        Err(other) => internal_error(&other),
    }
}

pub(crate) async fn applications_handler<S, R, M>(
    State(service): State<Arc<OutreachService<S, R, M>>>,
) -> Response
where
    S: RecordStore + 'static,
    R: ResumeRepository + 'static,
    M: MailDispatcher + 'static,
{
    let result = match run_blocking(move || service.applications()).await {
        Ok(result) => result,
        Err(response) => return response,
    };

    match result {
        Ok(entries) => (StatusCode::OK, Json(entries)).into_response(),
        Err(err) => internal_error(&err),
    }
}

pub(crate) async fn uploaded_file_handler<S, R, M>(
    State(service): State<Arc<OutreachService<S, R, M>>>,
    Path(filename): Path<String>,
) -> Response
where
    S: RecordStore + 'static,
    R: ResumeRepository + 'static,
    M: MailDispatcher + 'static,
{
    let lookup = filename.clone();
    let result = match run_blocking(move || service.read_upload(&lookup)).await {
        Ok(result) => result,
        Err(response) => return response,
    };

    match result {
        Ok(Some(bytes)) => {
            let content_type = mime_guess::from_path(&filename)
                .first_or_octet_stream()
                .to_string();
            (StatusCode::OK, [(header::CONTENT_TYPE, content_type)], bytes).into_response()
        }
        Ok(None) => error_response(StatusCode::NOT_FOUND, "File not found"),
        Err(err) => internal_error(&err),
    }
}
