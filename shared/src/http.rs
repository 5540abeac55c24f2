//! HTTP helpers for Lambda functions.

use lambda_http::{Body, Request, RequestExt, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::error;

use crate::period::ReportingMonth;
use crate::Error;

/// Standard API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Create a JSON response with the given status code and data.
pub fn json_response<T: Serialize>(status: u16, data: &T) -> Result<Response<Body>, lambda_http::Error> {
    Ok(Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .header("access-control-allow-origin", "*")
        .body(Body::from(serde_json::to_string(data)?))?)
}

/// Create an error response with the given status code and message.
pub fn error_response(status: u16, message: impl Into<String>) -> Result<Response<Body>, lambda_http::Error> {
    json_response(status, &ApiResponse::<()>::error(message))
}

/// Map a domain error onto its status code and the error envelope.
pub fn error_from(err: &Error) -> Result<Response<Body>, lambda_http::Error> {
    let status = err.status_code();
    if status >= 500 {
        error!("Request failed: {}", err);
    }
    error_response(status, err.to_string())
}

/// Wrap a domain result: `status` with the data on success, the mapped error otherwise.
pub fn result_response<T: Serialize>(
    status: u16,
    result: crate::Result<T>,
) -> Result<Response<Body>, lambda_http::Error> {
    match result {
        Ok(data) => json_response(status, &ApiResponse::success(data)),
        Err(err) => error_from(&err),
    }
}

/// A downloadable file. Binary bodies are base64-encoded by the runtime.
pub fn file_response(
    content_type: &str,
    filename: &str,
    bytes: Vec<u8>,
) -> Result<Response<Body>, lambda_http::Error> {
    Ok(Response::builder()
        .status(200)
        .header("content-type", content_type)
        .header(
            "content-disposition",
            format!("attachment; filename=\"{}\"", filename),
        )
        .header("access-control-allow-origin", "*")
        .body(Body::Binary(bytes))?)
}

/// A downloadable text file.
pub fn text_file_response(
    content_type: &str,
    filename: &str,
    text: String,
) -> Result<Response<Body>, lambda_http::Error> {
    Ok(Response::builder()
        .status(200)
        .header("content-type", content_type)
        .header(
            "content-disposition",
            format!("attachment; filename=\"{}\"", filename),
        )
        .header("access-control-allow-origin", "*")
        .body(Body::Text(text))?)
}

/// Request path with the API Gateway stage prefix removed.
pub fn route_path(event: &Request) -> String {
    let raw_path = event.uri().path();
    raw_path.strip_prefix("/api").unwrap_or(raw_path).to_string()
}

/// Optional `month=YYYY-MM` query parameter.
pub fn month_param(event: &Request) -> crate::Result<Option<ReportingMonth>> {
    event
        .query_string_parameters_ref()
        .and_then(|params| params.first("month"))
        .map(str::parse)
        .transpose()
}

/// Parse request body as JSON, returning a 400 response on failure.
///
/// Returns `Ok(Ok(T))` on successful parse, `Ok(Err(Response))` on parse error (400),
/// or `Err(lambda_http::Error)` on serialization failure.
pub fn parse_json_body<T: DeserializeOwned>(body: &Body) -> Result<Result<T, Response<Body>>, lambda_http::Error> {
    match serde_json::from_slice(body.as_ref()) {
        Ok(parsed) => Ok(Ok(parsed)),
        Err(e) => {
            let response = error_response(400, format!("Invalid request body: {}", e))?;
            Ok(Err(response))
        }
    }
}

/// Macro to parse request body, returning early with 400 on parse error.
///
/// Usage:
/// ```ignore
/// let request: MyRequest = parse_body!(event.body());
/// ```
#[macro_export]
macro_rules! parse_body {
    ($body:expr) => {
        match shared::http::parse_json_body($body)? {
            Ok(parsed) => parsed,
            Err(response) => return Ok(response),
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Ping {
        count: u32,
    }

    #[test]
    fn test_error_from_status() {
        let response = error_from(&Error::Conflict("2024-03-04".into())).unwrap();
        assert_eq!(response.status(), 409);
        let body = std::str::from_utf8(response.body().as_ref()).unwrap();
        assert!(body.contains("\"success\":false"));
        assert!(body.contains("Conflict: 2024-03-04"));
    }

    #[test]
    fn test_result_response() {
        let ok = result_response(201, Ok(serde_json::json!({ "id": "abc" }))).unwrap();
        assert_eq!(ok.status(), 201);
        assert!(std::str::from_utf8(ok.body().as_ref()).unwrap().contains("\"success\":true"));

        let missing = result_response::<()>(200, Err(Error::NoData("March 2024".into()))).unwrap();
        assert_eq!(missing.status(), 404);
    }

    #[test]
    fn test_parse_json_body() {
        let parsed: Result<Ping, _> = parse_json_body(&Body::from(r#"{"count":3}"#)).unwrap();
        assert_eq!(parsed.unwrap().count, 3);

        let rejected: Result<Ping, _> = parse_json_body(&Body::from("nope")).unwrap();
        assert_eq!(rejected.unwrap_err().status(), 400);
    }

    #[test]
    fn test_file_response_headers() {
        let response = file_response("application/pdf", "invoice-2024-03.pdf", b"%PDF".to_vec()).unwrap();
        assert_eq!(response.headers()["content-type"], "application/pdf");
        assert_eq!(
            response.headers()["content-disposition"],
            "attachment; filename=\"invoice-2024-03.pdf\""
        );
    }
}
