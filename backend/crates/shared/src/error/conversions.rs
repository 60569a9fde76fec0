//! Conversions into [`AppError`]

use super::app_error::AppError;
use crate::id::IdError;

impl From<IdError> for AppError {
    fn from(err: IdError) -> Self {
        AppError::bad_request(err.to_string()).with_source(err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_syntax() || err.is_data() || err.is_eof() {
            AppError::bad_request(format!("Malformed JSON: {err}")).with_source(err)
        } else {
            AppError::internal("JSON serialization failed").with_source(err)
        }
    }
}

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = axum::http::StatusCode::from_u16(self.status_code())
            .unwrap_or(axum::http::StatusCode::INTERNAL_SERVER_ERROR);

        (status, axum::Json(self.problem_details())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::kind::ErrorKind;
    use crate::id::EntityId;

    #[test]
    fn test_id_error_conversion() {
        let err: AppError = "XID=0".parse::<EntityId>().unwrap_err().into();
        assert_eq!(err.kind(), ErrorKind::BadRequest);
        assert!(err.message().contains("zero"));
    }

    #[test]
    fn test_json_error_conversion() {
        for input in ["{", "{\"a\": ]", "[1, 2"] {
            let json_err = serde_json::from_str::<serde_json::Value>(input).unwrap_err();
            let err: AppError = json_err.into();
            assert_eq!(err.kind(), ErrorKind::BadRequest, "input {input:?}");
        }
    }

    #[cfg(feature = "axum")]
    #[test]
    fn test_into_response_status() {
        use axum::response::IntoResponse;

        let response = AppError::new(ErrorKind::NotFound, "No such player").into_response();
        assert_eq!(response.status(), axum::http::StatusCode::NOT_FOUND);
    }
}
