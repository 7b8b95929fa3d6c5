//! Tests for `AppError` → HTTP response mapping.
//!
//! Each variant must produce the right status, error code and message.
//! They call `IntoResponse` directly; no server is involved.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use http_body_util::BodyExt;
use mtrack_api::error::AppError;
use mtrack_core::error::CoreError;
use mtrack_core::store::StoreError;
use uuid::Uuid;

/// Helper: convert an `AppError` into its status code and parsed JSON body.
async fn error_to_response(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

#[tokio::test]
async fn domain_input_errors_return_400_with_specific_codes() {
    let cases = [
        (CoreError::InvalidUnit("Unknown unit 'parsec'".into()), "INVALID_UNIT"),
        (CoreError::InvalidTimezone("Mars/Olympus_Mons".into()), "INVALID_TIMEZONE"),
        (CoreError::InvalidDateFormat("yesterday".into()), "INVALID_DATE_FORMAT"),
        (CoreError::InvalidMetric("Value cannot be negative".into()), "INVALID_METRIC"),
        (CoreError::Validation("user_id must not be empty".into()), "VALIDATION_ERROR"),
    ];

    for (err, code) in cases {
        let message = match &err {
            CoreError::InvalidUnit(m)
            | CoreError::InvalidTimezone(m)
            | CoreError::InvalidDateFormat(m)
            | CoreError::InvalidMetric(m)
            | CoreError::Validation(m) => m.clone(),
            _ => unreachable!(),
        };

        let (status, json) = error_to_response(AppError::Core(err)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "code {code}");
        assert_eq!(json["code"], code);
        assert_eq!(json["error"], message);
    }
}

#[tokio::test]
async fn not_found_error_returns_404() {
    let id = Uuid::new_v4();
    let err = AppError::Core(CoreError::NotFound {
        entity: "Metric",
        id,
    });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["error"], format!("Metric with id {id} not found"));
}

#[tokio::test]
async fn bad_request_error_returns_400() {
    let err = AppError::BadRequest("Invalid metric id: abc".into());

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "BAD_REQUEST");
    assert_eq!(json["error"], "Invalid metric id: abc");
}

#[tokio::test]
async fn unrouted_path_error_returns_404() {
    let err = AppError::NotFound("Endpoint not found: /nowhere".into());

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["error"], "Endpoint not found: /nowhere");
}

#[tokio::test]
async fn storage_error_returns_500_and_sanitizes_message() {
    let err = AppError::Core(CoreError::Infrastructure(StoreError::Query(
        "relation \"metrics\" does not exist".into(),
    )));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");
    assert_eq!(json["error"], "An internal error occurred");
}

#[tokio::test]
async fn internal_errors_return_500_and_sanitize_message() {
    for err in [
        AppError::InternalError("secret database credentials leaked".into()),
        AppError::Core(CoreError::Internal("stack trace".into())),
    ] {
        let (status, json) = error_to_response(err).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["code"], "INTERNAL_ERROR");
        assert_eq!(json["error"], "An internal error occurred");
    }
}
