use axum::Json;
use axum_extra::extract::WithRejection;
use common::{CoordinatesPayload, CoordinatesResponse};
use validator::Validate;

use crate::error::AppError;

/// ## Submit a coordinate pair
/// Logs the pair and echoes it back. Nothing is stored.
#[utoipa::path(
    post,
    path = "/api/coordinates",
    request_body = CoordinatesPayload,
    responses(
        (status = 200, description = "Coordinates received", body = CoordinatesResponse),
        (status = 400, description = "Missing or malformed latitude/longitude")
    )
)]
pub async fn submit_coordinates(
    WithRejection(Json(payload), _): WithRejection<Json<CoordinatesPayload>, AppError>,
) -> Result<Json<CoordinatesResponse>, AppError> {
    payload.validate()?;

    let coordinates = payload.coordinates().ok_or_else(|| {
        AppError::InternalServerError("validated payload is missing a coordinate".to_string())
    })?;

    tracing::info!(
        latitude = coordinates.latitude,
        longitude = coordinates.longitude,
        "Received coordinates"
    );

    Ok(Json(CoordinatesResponse::received(coordinates)))
}
