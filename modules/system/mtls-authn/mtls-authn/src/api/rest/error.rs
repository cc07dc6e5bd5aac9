//! RFC 9457 problem responses for authentication failures.

use axum::Json;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use crate::domain::MtlsAuthError;

pub const PROBLEM_CONTENT_TYPE: &str = "application/problem+json";

/// Problem details body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    #[serde(rename = "type")]
    pub type_url: String,
    pub title: String,
    pub status: u16,
    pub detail: String,
}

impl Problem {
    #[must_use]
    pub fn new(status: StatusCode, title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            type_url: "about:blank".to_owned(),
            title: title.into(),
            status: status.as_u16(),
            detail: detail.into(),
        }
    }
}

impl IntoResponse for Problem {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (
            status,
            [(header::CONTENT_TYPE, PROBLEM_CONTENT_TYPE)],
            Json(self),
        )
            .into_response()
    }
}

impl From<&MtlsAuthError> for Problem {
    fn from(err: &MtlsAuthError) -> Self {
        match err {
            MtlsAuthError::MissingCertificate => {
                Self::new(StatusCode::UNAUTHORIZED, "Unauthorized", err.to_string())
            }
            // Parser details stay in the logs.
            MtlsAuthError::MalformedCertificate(_) => Self::new(
                StatusCode::UNAUTHORIZED,
                "Unauthorized",
                "peer certificate could not be read",
            ),
            MtlsAuthError::WrongIntegrationPoint => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal Server Error",
                err.to_string(),
            ),
        }
    }
}

impl IntoResponse for MtlsAuthError {
    fn into_response(self) -> Response {
        Problem::from(&self).into_response()
    }
}
