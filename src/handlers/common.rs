use crate::errors::ServiceError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Standard success response
pub fn success_response<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(data)).into_response()
}

/// Parses an optional integer query parameter.
///
/// Missing or blank values fall back to `default`; anything that is not a
/// whole number is a bad request.
pub fn parse_int_param(
    name: &str,
    raw: Option<&str>,
    default: i64,
) -> Result<i64, ServiceError> {
    match raw.map(str::trim).filter(|value| !value.is_empty()) {
        None => Ok(default),
        Some(value) => value.parse::<i64>().map_err(|_| {
            ServiceError::BadRequest(format!("{} must be an integer, got {:?}", name, value))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(None, Ok(14))]
    #[case(Some(""), Ok(14))]
    #[case(Some("  "), Ok(14))]
    #[case(Some("30"), Ok(30))]
    #[case(Some(" -5 "), Ok(-5))]
    #[case(Some("7.5"), Err(()))]
    #[case(Some("abc"), Err(()))]
    fn int_params(#[case] raw: Option<&str>, #[case] expected: Result<i64, ()>) {
        let parsed = parse_int_param("lookback", raw, 14).map_err(|_| ());
        assert_eq!(parsed, expected);
    }

    #[test]
    fn bad_param_names_the_parameter() {
        let err = parse_int_param("safety", Some("x"), 3).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().contains("safety"));
    }
}
