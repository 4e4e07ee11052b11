use crate::error::{AppError, Result};
use crate::model::{ShortenRequest, ShortenResponse};
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use tinylink_core::ShortCode;
use tracing::{debug, trace};

/// Literal path segment of the shorten route, resolved as a code on `GET`.
const SHORTEN_SEGMENT: &str = "shorten";

pub async fn shorten_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ShortenRequest>, JsonRejection>,
) -> Result<Json<ShortenResponse>> {
    let Json(request) = payload.map_err(|rejection| AppError::InvalidUrl(rejection.body_text()))?;

    let shortened = state.shortener().shorten(&request.original_url).await?;
    debug!(
        code = %shortened.code,
        created = shortened.created,
        cache_write = ?shortened.cache_write,
        "shortened URL"
    );

    Ok(Json(ShortenResponse {
        short_url: shortened.short_url,
    }))
}

pub async fn redirect_handler(
    State(state): State<AppState>,
    Path(short_code): Path<String>,
) -> Result<Response> {
    redirect(&state, short_code).await
}

/// `GET /shorten` is shadowed by the shorten route, so it is resolved here.
pub async fn shorten_segment_redirect_handler(State(state): State<AppState>) -> Result<Response> {
    redirect(&state, SHORTEN_SEGMENT.to_string()).await
}

async fn redirect(state: &AppState, short_code: String) -> Result<Response> {
    let code = ShortCode::new(&short_code).map_err(|_| AppError::NotFound(short_code))?;

    let resolved = state.redirector().resolve(&code).await?;
    trace!(code = %code, source = ?resolved.source, "redirecting");

    let location = HeaderValue::try_from(resolved.original_url).map_err(|e| {
        AppError::Server(format!("stored URL for {code} is not a valid Location: {e}"))
    })?;

    Ok((StatusCode::FOUND, [(header::LOCATION, location)]).into_response())
}
