use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use error_stack::Report;
use kernel::KernelError;
use serde_json::json;
use std::process::{ExitCode, Termination};

#[derive(Debug)]
pub struct StackTrace(Report<KernelError>);

impl From<Report<KernelError>> for StackTrace {
    fn from(e: Report<KernelError>) -> Self {
        StackTrace(e)
    }
}

impl Termination for StackTrace {
    fn report(self) -> ExitCode {
        self.0.report()
    }
}

#[derive(Debug)]
pub struct ErrorStatus(Report<KernelError>);

impl From<Report<KernelError>> for ErrorStatus {
    fn from(e: Report<KernelError>) -> Self {
        ErrorStatus(e)
    }
}

fn status_of(error: &KernelError) -> StatusCode {
    match error {
        KernelError::ItemNotFound | KernelError::LoanNotFound => StatusCode::NOT_FOUND,
        KernelError::OutOfStock
        | KernelError::AlreadyBorrowed
        | KernelError::NoActiveLoan
        | KernelError::AlreadyReturned => StatusCode::CONFLICT,
        KernelError::InvalidArgument => StatusCode::BAD_REQUEST,
        KernelError::Concurrency => StatusCode::SERVICE_UNAVAILABLE,
        KernelError::Timeout => StatusCode::REQUEST_TIMEOUT,
        KernelError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ErrorStatus {
    fn into_response(self) -> axum::response::Response {
        let error = self.0.current_context();
        let status = status_of(error);
        if status.is_server_error() || status == StatusCode::REQUEST_TIMEOUT {
            tracing::error!("{:?}", self.0);
        }
        (status, Json(json!({ "error": error.to_string() }))).into_response()
    }
}

/// The caller could not be identified.
#[derive(Debug)]
pub struct Unauthorized(&'static str);

impl Unauthorized {
    pub fn new(reason: &'static str) -> Self {
        Self(reason)
    }
}

impl IntoResponse for Unauthorized {
    fn into_response(self) -> axum::response::Response {
        (StatusCode::UNAUTHORIZED, Json(json!({ "error": self.0 }))).into_response()
    }
}

#[cfg(test)]
mod test {
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use error_stack::Report;
    use kernel::KernelError;

    use crate::error::{status_of, ErrorStatus, Unauthorized};

    #[test]
    fn business_rejections_are_conflicts() {
        for error in [
            KernelError::OutOfStock,
            KernelError::AlreadyBorrowed,
            KernelError::NoActiveLoan,
            KernelError::AlreadyReturned,
        ] {
            assert_eq!(status_of(&error), StatusCode::CONFLICT);
        }
    }

    #[test]
    fn status_mapping() {
        assert_eq!(status_of(&KernelError::ItemNotFound), StatusCode::NOT_FOUND);
        assert_eq!(status_of(&KernelError::LoanNotFound), StatusCode::NOT_FOUND);
        assert_eq!(
            status_of(&KernelError::InvalidArgument),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(&KernelError::Concurrency),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_of(&KernelError::Internal),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn responses_carry_status() {
        let response = ErrorStatus::from(Report::new(KernelError::OutOfStock)).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = Unauthorized::new("missing").into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
