//! Errores de la API y su traducción a respuestas HTTP.
//!
//! El cuerpo siempre es `{ "error": true, "code": ..., "message": ... }`.
//! Ningún error se reintenta: el cliente debe repetir la petición completa.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::prompts::TemplateError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    /// Rechazo decidido por el modelo; el mensaje es su nota literal.
    #[error("{0}")]
    IntentRejected(String),
    #[error("Not authenticated")]
    Unauthenticated,
    #[error("You do not have access to this roadmap")]
    Forbidden,
    #[error("User not found")]
    UserNotFound,
    #[error("Roadmap not found")]
    RoadmapNotFound,
    #[error("Section not found")]
    SectionNotFound,
    #[error("Failed to parse AI response. Please try again.")]
    MalformedModelOutput(String),
    /// El detalle del proveedor sólo va al log.
    #[error("The AI model could not complete the request. Please try again.")]
    Upstream(String),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::IntentRejected(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::UserNotFound | ApiError::RoadmapNotFound | ApiError::SectionNotFound => {
                StatusCode::NOT_FOUND
            }
            ApiError::MalformedModelOutput(_) | ApiError::Upstream(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "bad_request",
            ApiError::IntentRejected(_) => "intent_rejected",
            ApiError::Unauthenticated => "unauthenticated",
            ApiError::Forbidden => "forbidden",
            ApiError::UserNotFound => "user_not_found",
            ApiError::RoadmapNotFound => "roadmap_not_found",
            ApiError::SectionNotFound => "section_not_found",
            ApiError::MalformedModelOutput(_) => "malformed_model_output",
            ApiError::Upstream(_) => "upstream_error",
            ApiError::Internal(_) => "internal_error",
        }
    }

    /// Fallo del modelo externo (red, cuota, modelo).
    pub fn upstream(err: anyhow::Error) -> Self {
        ApiError::Upstream(format!("{err:#}"))
    }

    /// Fallo del almacén de documentos. El detalle (driver, destino de la
    /// conexión) se registra y al cliente sólo le llega un mensaje fijo.
    pub fn store(err: anyhow::Error) -> Self {
        error!("Error del almacén: {err:#}");
        ApiError::Internal("Internal storage error".to_string())
    }
}

impl From<TemplateError> for ApiError {
    fn from(err: TemplateError) -> Self {
        error!("Plantilla de prompt inválida: {err}");
        ApiError::Internal("Internal error".to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            match &self {
                ApiError::MalformedModelOutput(detail) => {
                    error!("Respuesta del modelo ilegible: {}", detail)
                }
                ApiError::Upstream(detail) => error!("Fallo del proveedor LLM: {}", detail),
                other => error!("Error interno atendiendo la petición: {}", other),
            }
        }

        let body = Json(json!({
            "error": true,
            "code": self.code(),
            "message": self.to_string(),
        }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(ApiError::BadRequest("Prompt field is required".into()), StatusCode::BAD_REQUEST)]
    #[case(ApiError::IntentRejected("too vague".into()), StatusCode::BAD_REQUEST)]
    #[case(ApiError::Unauthenticated, StatusCode::UNAUTHORIZED)]
    #[case(ApiError::Forbidden, StatusCode::FORBIDDEN)]
    #[case(ApiError::UserNotFound, StatusCode::NOT_FOUND)]
    #[case(ApiError::RoadmapNotFound, StatusCode::NOT_FOUND)]
    #[case(ApiError::MalformedModelOutput("eof".into()), StatusCode::INTERNAL_SERVER_ERROR)]
    #[case(ApiError::Upstream("quota".into()), StatusCode::INTERNAL_SERVER_ERROR)]
    fn maps_to_status(#[case] err: ApiError, #[case] expected: StatusCode) {
        assert_eq!(err.into_response().status(), expected);
    }

    #[test]
    fn malformed_and_rejected_are_distinguishable() {
        let malformed = ApiError::MalformedModelOutput("expected value".into());
        let rejected = ApiError::IntentRejected("Timeline is unrealistic.".into());
        assert_ne!(malformed.code(), rejected.code());
        assert_ne!(malformed.status(), rejected.status());
        assert_eq!(rejected.to_string(), "Timeline is unrealistic.");
    }

    async fn body_of(err: ApiError) -> serde_json::Value {
        let bytes = axum::body::to_bytes(err.into_response().into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn storage_details_stay_out_of_the_body() {
        let err = ApiError::store(anyhow::anyhow!(
            "Neo4j: connection refused bolt://db-internal:7687"
        ));
        let body = body_of(err).await;
        assert_eq!(body["code"], "internal_error");
        assert_eq!(body["message"], "Internal storage error");
        assert!(!body.to_string().contains("db-internal"));
    }

    #[tokio::test]
    async fn provider_details_stay_out_of_the_body() {
        let err = ApiError::upstream(anyhow::anyhow!("401 invalid api key sk-abc123"));
        assert!(matches!(err, ApiError::Upstream(ref detail) if detail.contains("sk-abc123")));

        let body = body_of(err).await;
        assert_eq!(body["code"], "upstream_error");
        assert_eq!(
            body["message"],
            "The AI model could not complete the request. Please try again."
        );
        assert!(!body.to_string().contains("sk-abc123"));
    }

    #[test]
    fn template_errors_are_internal() {
        let err: ApiError = TemplateError::Unbound {
            template: "roadmap",
            placeholder: "timeline".into(),
        }
        .into();
        assert_eq!(err.code(), "internal_error");
    }
}
