//! City filter download endpoint

use axum::{
    extract::{FromRequest, Multipart, Query, Request},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use serde::Deserialize;

use crate::city_filter::{extend_city_filter, DEFAULT_FILENAME};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Form field carrying the uploaded filter file
pub const UPLOAD_FIELD: &str = "txt_file";

#[derive(Debug, Deserialize)]
pub struct CityFilterQuery {
    /// Download name of the extended filter
    #[serde(default = "default_filename")]
    pub new_filename: String,
}

fn default_filename() -> String {
    DEFAULT_FILENAME.to_string()
}

/// POST /extend_city_filter/
///
/// Accepts the filter file either as a `multipart/form-data` upload in the
/// `txt_file` field or as a plain text body, one direction per line. The
/// extended filter comes back as a text attachment.
pub async fn extend_city_filter_handler(
    Query(query): Query<CityFilterQuery>,
    request: Request,
) -> ApiResult<Response> {
    let body = read_filter_file(request).await?;
    let extended = extend_city_filter(&body)?;

    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename={}",
        query.new_filename
    ))
    .map_err(|_| ApiError::BadRequest(format!("invalid filename '{}'", query.new_filename)))?;

    let mut text = extended.join("\n");
    if !text.is_empty() {
        text.push('\n');
    }

    Ok((
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/plain; charset=utf-8"),
            ),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        text,
    )
        .into_response())
}

async fn read_filter_file(request: Request) -> ApiResult<String> {
    let is_multipart = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("multipart/form-data"));

    if !is_multipart {
        return String::from_request(request, &())
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()));
    }

    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
        if field.name() == Some(UPLOAD_FIELD) {
            return field
                .text()
                .await
                .map_err(|e| ApiError::BadRequest(e.body_text()));
        }
    }

    Err(ApiError::BadRequest(format!(
        "missing '{}' file field",
        UPLOAD_FIELD
    )))
}

/// Build city filter routes
pub fn city_filter_routes() -> Router<AppState> {
    Router::new().route("/extend_city_filter/", post(extend_city_filter_handler))
}
