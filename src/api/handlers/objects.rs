use crate::AppState;
use crate::api::error::GatewayError;
use crate::api::response::ApiResponse;
use crate::services::staging::{StagedFile, StagingError};
use crate::services::storage::ObjectStore;
use crate::utils::validation::{normalize_directory, sanitize_filename};
use axum::{
    Json,
    extract::{
        FromRequest, Multipart, Request, State,
        multipart::{Field, MultipartError},
    },
    http::{Method, StatusCode},
};
use bytes::Bytes;
use futures::{Stream, TryStreamExt};
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tokio_util::io::StreamReader;
use utoipa::ToSchema;

/// Multipart body accepted by `/upload`.
#[derive(ToSchema)]
pub struct UploadForm {
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
    /// Destination directory, the bucket root when blank
    pub directory: Option<String>,
}

/// Multipart body accepted by `/delete`.
#[derive(ToSchema)]
pub struct DeleteForm {
    /// Object name to remove
    pub filename: String,
}

type FieldStream<'a> = Pin<Box<dyn Stream<Item = io::Result<Bytes>> + Send + 'a>>;

#[utoipa::path(
    post,
    path = "/upload",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Upload outcome, failures carry an `error` field", body = ApiResponse)
    ),
    tag = "objects"
)]
pub async fn upload_file(
    State(state): State<AppState>,
    method: Method,
    request: Request,
) -> Result<Json<ApiResponse>, GatewayError> {
    if method != Method::POST {
        return Err(GatewayError::MethodNotAllowed);
    }

    let mut multipart = parse_form(request, &state).await?;

    let mut directory = String::new();
    let mut staged: Option<StagedFile> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| form_error(e, &state))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if name == "file" && staged.is_none() {
            let original_filename = field.file_name().unwrap_or_default().to_string();
            // Browsers send an empty part when no file was picked.
            if original_filename.is_empty() {
                continue;
            }

            let filename = sanitize_filename(&original_filename)
                .map_err(|e| GatewayError::FormParse(e.to_string()))?;

            staged = Some(state.staging.stage(field_reader(field), &filename).await?);
        } else if name == "directory" {
            directory = field
                .text()
                .await
                .map_err(|e| form_error(e, &state))?;
        }
    }

    let staged = staged.ok_or(GatewayError::MissingField("No file provided"))?;
    let directory = normalize_directory(&directory);

    let store = acquire_store(&state).await?;
    let reference = timeout(
        state.config.backend_timeout,
        store.upload_file(staged.path(), staged.file_name(), &directory, true),
    )
    .await
    .map_err(|_| GatewayError::BackendUpload(deadline_message(state.config.backend_timeout)))?
    .map_err(|e| GatewayError::BackendUpload(format!("{:#}", e)))?;

    tracing::info!(
        "Uploaded {} ({} bytes) to '{}' as {}",
        staged.file_name(),
        staged.size(),
        directory,
        reference
    );

    Ok(Json(ApiResponse::success_with_output(
        format!("File {} uploaded successfully", staged.file_name()),
        reference,
    )))
}

#[utoipa::path(
    post,
    path = "/delete",
    request_body(content = DeleteForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Delete outcome, failures carry an `error` field", body = ApiResponse)
    ),
    tag = "objects"
)]
pub async fn delete_file(
    State(state): State<AppState>,
    method: Method,
    request: Request,
) -> Result<Json<ApiResponse>, GatewayError> {
    if method != Method::POST {
        return Err(GatewayError::MethodNotAllowed);
    }

    let mut multipart = parse_form(request, &state).await?;

    let mut filename = String::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| form_error(e, &state))?
    {
        if field.name() == Some("filename") {
            filename = field
                .text()
                .await
                .map_err(|e| form_error(e, &state))?;
        }
    }

    let filename = filename.trim();
    if filename.is_empty() {
        return Err(GatewayError::MissingField("Filename is required"));
    }

    let store = acquire_store(&state).await?;
    timeout(state.config.backend_timeout, store.delete_file(filename))
        .await
        .map_err(|_| GatewayError::BackendDelete(deadline_message(state.config.backend_timeout)))?
        .map_err(|e| GatewayError::BackendDelete(format!("{:#}", e)))?;

    tracing::info!("Deleted {}", filename);

    Ok(Json(ApiResponse::success(format!(
        "File {} deleted successfully from S3",
        filename
    ))))
}

async fn parse_form(request: Request, state: &AppState) -> Result<Multipart, GatewayError> {
    Multipart::from_request(request, state).await.map_err(|e| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            size_exceeded(state)
        } else {
            GatewayError::FormParse(e.body_text())
        }
    })
}

/// The body limit can trip while multer reads part headers or a text
/// field, not only inside the file stream.
fn form_error(err: MultipartError, state: &AppState) -> GatewayError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        size_exceeded(state)
    } else {
        GatewayError::FormParse(err.body_text())
    }
}

fn size_exceeded(state: &AppState) -> GatewayError {
    GatewayError::Staging(StagingError::SizeExceeded {
        limit: state.config.max_form_size,
    })
}

async fn acquire_store(state: &AppState) -> Result<Arc<dyn ObjectStore>, GatewayError> {
    timeout(state.config.backend_timeout, state.store.acquire())
        .await
        .map_err(|_| GatewayError::BackendClientInit(deadline_message(state.config.backend_timeout)))?
        .map_err(|e| GatewayError::BackendClientInit(format!("{:#}", e)))
}

/// Adapts a multipart field to `AsyncRead`. An exceeded body limit is
/// reported as `FileTooLarge` so staging can tell it apart from I/O failures.
fn field_reader(field: Field<'_>) -> StreamReader<FieldStream<'_>, Bytes> {
    let stream: FieldStream<'_> = Box::pin(field.map_err(|err| {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            io::Error::new(io::ErrorKind::FileTooLarge, err)
        } else {
            io::Error::new(io::ErrorKind::Other, err)
        }
    }));
    StreamReader::new(stream)
}

fn deadline_message(deadline: Duration) -> String {
    format!("operation timed out after {:?}", deadline)
}
