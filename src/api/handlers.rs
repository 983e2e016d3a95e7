//! Request handlers

use super::{
    demo::DEMO_PAGE,
    envelope::{attachment, HealthResponse, RemovalEnvelope},
    error::ApiError,
    startup::AppState,
};
use crate::{
    config::{OutputFormat, ReturnType},
    utils::UploadValidator,
};
use axum::{
    body::Bytes,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::QueryRejection,
        Multipart, Query, State,
    },
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use tracing::{debug, info, instrument};

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::default())
}

pub async fn demo_page() -> Html<&'static str> {
    Html(DEMO_PAGE)
}

/// Fields of a `/remove-bg` form
struct RemovalForm {
    filename: String,
    data: Bytes,
    return_type: String,
    output_format: String,
}

impl RemovalForm {
    /// Read the form, rejecting a bad filename before its content is read
    async fn read(state: &AppState, mut multipart: Multipart) -> Result<Self, ApiError> {
        let policy = &state.config.upload;
        let validator = UploadValidator::new(policy);
        let body_limit = state.config.body_limit();
        let field_error = |e: MultipartError| {
            ApiError::from_multipart(&e, policy.max_file_size, body_limit)
        };

        let mut upload = None;
        let mut return_type = None;
        let mut output_format = None;

        while let Some(field) = multipart.next_field().await.map_err(field_error)? {
            let name = field.name().map(str::to_owned);
            match name.as_deref() {
                Some("image") => {
                    // A plain text part is not a file upload
                    let filename = field
                        .file_name()
                        .map(str::to_owned)
                        .ok_or(ApiError::MissingField("image"))?;
                    validator.validate_filename(&filename)?;
                    let data = field.bytes().await.map_err(field_error)?;
                    upload = Some((filename, data));
                }
                Some("return_type") => {
                    return_type = Some(field.text().await.map_err(field_error)?);
                }
                Some("output_format") => {
                    output_format = Some(field.text().await.map_err(field_error)?);
                }
                other => debug!(field = ?other, "Ignoring unknown form field"),
            }
        }

        let (filename, data) = upload.ok_or(ApiError::MissingField("image"))?;
        validator.validate_size(data.len())?;

        Ok(Self {
            filename,
            data,
            return_type: return_type.unwrap_or_else(|| "file".to_string()),
            output_format: output_format.unwrap_or_else(|| "png".to_string()),
        })
    }
}

#[instrument(skip_all)]
pub async fn remove_background(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let multipart = multipart.map_err(|_| ApiError::MissingField("image"))?;
    let form = RemovalForm::read(&state, multipart).await?;

    info!(
        filename = %form.filename,
        bytes = form.data.len(),
        return_type = %form.return_type,
        output_format = %form.output_format,
        "Removing background from upload"
    );

    let format = OutputFormat::parse(&form.output_format)?;
    let pipeline = state.pipeline.clone();
    let data = form.data;
    let processed =
        tokio::task::spawn_blocking(move || pipeline.process(&data, format)).await??;

    let response = match ReturnType::from_tag(&form.return_type) {
        ReturnType::Base64 => {
            Json(RemovalEnvelope::new(&processed, form.output_format)).into_response()
        }
        ReturnType::File => attachment(processed, &form.output_format),
    };
    Ok(response)
}

/// `image_url` from the query string or a JSON body
#[derive(Debug, Default, Deserialize)]
pub struct ImageUrlParams {
    pub image_url: Option<String>,
}

#[instrument(skip_all)]
pub async fn remove_background_from_url(
    State(state): State<AppState>,
    query: Result<Query<ImageUrlParams>, QueryRejection>,
    body: Bytes,
) -> Result<Json<RemovalEnvelope>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let image_url = match query.image_url {
        Some(url) => url,
        None => serde_json::from_slice::<ImageUrlParams>(&body)
            .ok()
            .and_then(|params| params.image_url)
            .ok_or(ApiError::MissingField("image_url"))?,
    };

    info!(%image_url, "Removing background from remote image");

    let data = state.fetcher.fetch(&image_url).await?;
    let pipeline = state.pipeline.clone();
    let processed =
        tokio::task::spawn_blocking(move || pipeline.process(&data, OutputFormat::Png)).await??;

    Ok(Json(RemovalEnvelope::new(&processed, "png")))
}
