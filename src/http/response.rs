use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;

use crate::domain::order::OrderError;

/// `{"success": true}` acknowledgement used by the worker and subscriber routes.
pub fn ack() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "success": true }))
}

impl ResponseError for OrderError {
    fn status_code(&self) -> StatusCode {
        match self {
            OrderError::Validation(_) | OrderError::InvalidTransition { .. } => {
                StatusCode::BAD_REQUEST
            }
            OrderError::MissingOrderId | OrderError::NotFound(_) => StatusCode::NOT_FOUND,
            OrderError::Transport(_) => StatusCode::BAD_GATEWAY,
            OrderError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "success": false,
            "message": self.to_string(),
        }))
    }
}
