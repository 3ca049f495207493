use std::{any::Any, sync::Arc};

use axum::{
    http::{HeaderName, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use super::{ClientError, REQUEST_ID_HEADER};
use crate::web::{log, Error};

/// Permissive cross-origin headers carried by every response.
pub const CORS_HEADERS: [(&str, &str); 3] = [
    ("access-control-allow-origin", "*"),
    ("access-control-allow-headers", "content-type"),
    ("access-control-allow-methods", "POST, OPTIONS"),
];

/// Turns an `Error` stashed in the response extensions into the client facing JSON body
/// and logs the request.
pub async fn response_mapper(req_method: Method, uri: Uri, resp: Response) -> Response {
    let req_id = resp
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    let web_error = resp.extensions().get::<Arc<Error>>().map(Arc::as_ref);
    let client_status_and_error = web_error.map(Error::status_code_and_client_error);

    if let Some(web_error) = web_error {
        match web_error {
            Error::Validation(_) => {
                tracing::info!("CLIENT ERROR: {web_error} ID: {req_id:?}")
            }
            _ => tracing::error!("SERVER ERROR: {web_error:?} ID: {req_id:?}"),
        }
    }

    let err_resp = client_status_and_error.map(|(status, client_error)| {
        let mut err_resp = client_error_response(status, client_error);
        if let Some(id) = resp.headers().get(REQUEST_ID_HEADER) {
            err_resp.headers_mut().insert(REQUEST_ID_HEADER, id.clone());
        }
        err_resp
    });

    log::log_request(
        req_id,
        req_method,
        uri,
        resp.status(),
        web_error,
        client_status_and_error,
    );

    err_resp.unwrap_or(resp)
}

/// Adds `CORS_HEADERS` to the response, whatever produced it.
pub async fn cors_headers(mut resp: Response) -> Response {
    insert_cors_headers(&mut resp);
    resp
}

fn insert_cors_headers(resp: &mut Response) {
    let headers = resp.headers_mut();
    for (name, value) in CORS_HEADERS {
        headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }
}

/// Handler for `CatchPanicLayer`: a panic is answered like any other unexpected failure.
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic payload");
    tracing::error!("PANIC: {detail}");

    let mut resp =
        client_error_response(StatusCode::INTERNAL_SERVER_ERROR, ClientError::ServiceError);
    insert_cors_headers(&mut resp);
    resp
}

fn client_error_response(status: StatusCode, client_error: ClientError) -> Response {
    let body = json!({ "error": client_error.to_string() });
    (status, Json(body)).into_response()
}
