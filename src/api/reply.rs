use std::convert::Infallible;

use serde::Serialize;
use serde_json::{json, Value};
use warp::{
    filters::body::BodyDeserializeError,
    http::StatusCode,
    reject::{LengthRequired, MethodNotAllowed, MissingCookie, PayloadTooLarge},
    reply::Response,
    Rejection, Reply,
};

use crate::middleware::Unauthorized;

fn status_of(error: &potion::Error) -> StatusCode {
    u16::try_from(error.code)
        .ok()
        .and_then(|code| StatusCode::from_u16(code).ok())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

fn detail(status: StatusCode, message: &str) -> Response {
    warp::reply::with_status(warp::reply::json(&json!({ "detail": message })), status)
        .into_response()
}

/// Field errors are already a JSON object; anything else is wrapped in
/// `{"detail": ..}`.
pub fn error_reply(error: &potion::Error) -> Response {
    let status = status_of(error);
    let info = error.info.clone();

    let body = match info {
        Some(info) if info.starts_with('{') => {
            serde_json::from_str::<Value>(&info).unwrap_or_else(|_| json!({ "detail": info }))
        }
        Some(info) => json!({ "detail": info }),
        None => json!({ "detail": status.canonical_reason().unwrap_or("Error") }),
    };

    if status.is_server_error() {
        log::error!("request failed with {}: {}", status, body);
    }

    warp::reply::with_status(warp::reply::json(&body), status).into_response()
}

pub fn json_reply<T: Serialize>(result: Result<T, potion::Error>, status: StatusCode) -> Response {
    match result {
        Ok(value) => warp::reply::with_status(warp::reply::json(&value), status).into_response(),
        Err(e) => error_reply(&e),
    }
}

pub fn empty_reply(result: Result<(), potion::Error>) -> Response {
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_reply(&e),
    }
}

pub async fn handle_rejection(err: Rejection) -> Result<Response, Infallible> {
    if err.find::<Unauthorized>().is_some() || err.find::<MissingCookie>().is_some() {
        return Ok(detail(
            StatusCode::UNAUTHORIZED,
            "Authentication credentials were not provided.",
        ));
    }

    if let Some(e) = err.find::<BodyDeserializeError>() {
        log::warn!("rejected malformed body: {e}");
        return Ok(detail(StatusCode::BAD_REQUEST, &format!("JSON parse error - {e}")));
    }

    if err.find::<LengthRequired>().is_some() {
        return Ok(detail(StatusCode::LENGTH_REQUIRED, "Content-Length required."));
    }

    if err.find::<PayloadTooLarge>().is_some() {
        return Ok(detail(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large."));
    }

    if err.find::<MethodNotAllowed>().is_some() {
        return Ok(detail(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed."));
    }

    if err.is_not_found() {
        return Ok(detail(StatusCode::NOT_FOUND, "Not found."));
    }

    log::error!("unhandled rejection: {:?}", err);
    Ok(detail(
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error.",
    ))
}
