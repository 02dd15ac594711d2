use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[cfg(not(target_arch = "wasm32"))]
use sqlx::FromRow;

pub mod utils;

// --- Auth ---

/// Login payload. Missing fields deserialize as empty strings so the
/// server can reject them the same way it rejects a bad password.
#[derive(Serialize, Deserialize, Clone, Debug, ToSchema)]
pub struct Credentials {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Body of a successful identity check.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub logged_in: bool,
    pub email: String,
}

// --- Coordinates ---

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, ToSchema)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Incoming coordinate submission. Both fields are optional at the
/// serde level so an absent value surfaces as a validation error
/// instead of an opaque deserialization failure.
#[derive(Serialize, Deserialize, Clone, Debug, Default, Validate, ToSchema)]
pub struct CoordinatesPayload {
    #[validate(required(message = "latitude is required"))]
    pub latitude: Option<f64>,
    #[validate(required(message = "longitude is required"))]
    pub longitude: Option<f64>,
}

impl CoordinatesPayload {
    /// Returns the pair once both values are present.
    pub fn coordinates(&self) -> Option<Coordinates> {
        Some(Coordinates {
            latitude: self.latitude?,
            longitude: self.longitude?,
        })
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, ToSchema)]
pub struct CoordinatesResponse {
    pub status: String,
    pub message: String,
    pub data: Coordinates,
}

impl CoordinatesResponse {
    pub fn received(data: Coordinates) -> Self {
        Self {
            status: "success".to_string(),
            message: "Coordinates received".to_string(),
            data,
        }
    }
}

// --- Rows ---

/// A row of the `location` table.
#[cfg_attr(not(target_arch = "wasm32"), derive(FromRow))]
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, ToSchema)]
pub struct Location {
    pub id: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub suburban_area: Option<String>,
    pub council_area: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_with_both_values_is_valid() {
        let payload: CoordinatesPayload =
            serde_json::from_str(r#"{"latitude": -33.8, "longitude": 151.2}"#).unwrap();
        assert!(payload.validate().is_ok());
        assert_eq!(
            payload.coordinates(),
            Some(Coordinates {
                latitude: -33.8,
                longitude: 151.2
            })
        );
    }

    #[test]
    fn payload_missing_latitude_fails_validation() {
        let payload: CoordinatesPayload =
            serde_json::from_str(r#"{"longitude": 151.2}"#).unwrap();
        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("latitude"));
        assert!(!errors.field_errors().contains_key("longitude"));
        assert_eq!(payload.coordinates(), None);
    }

    #[test]
    fn explicit_null_is_treated_as_missing() {
        let payload: CoordinatesPayload =
            serde_json::from_str(r#"{"latitude": null, "longitude": null}"#).unwrap();
        let errors = payload.validate().unwrap_err();
        assert_eq!(errors.field_errors().len(), 2);
    }

    #[test]
    fn credentials_default_missing_fields_to_empty() {
        let creds: Credentials = serde_json::from_str(r#"{"email": "a@b.io"}"#).unwrap();
        assert_eq!(creds.email, "a@b.io");
        assert!(creds.password.is_empty());
    }

    #[test]
    fn me_response_uses_camel_case() {
        let body = serde_json::to_value(MeResponse {
            logged_in: true,
            email: "a@b.io".to_string(),
        })
        .unwrap();
        assert_eq!(body["loggedIn"], true);
        assert_eq!(body["email"], "a@b.io");
    }
}
