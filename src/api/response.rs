use axum::{
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;

#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }

    pub fn with_status(self, status: StatusCode) -> Response {
        json_response(status, &self, HeaderMap::new())
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        self.with_status(StatusCode::OK)
    }
}

pub fn with_total_count<T: Serialize>(data: T, count: usize) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert("X-Total-Count", HeaderValue::from(count));

    json_response(StatusCode::OK, &ApiResponse { data }, headers)
}

/// Raw export body with the given content type.
pub fn attachment(body: String, content_type: &'static str) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));

    (StatusCode::OK, headers, body).into_response()
}

fn json_response<T: Serialize>(status: StatusCode, body: &T, mut headers: HeaderMap) -> Response {
    let json = match serde_json::to_string(body) {
        Ok(json) => json,
        Err(_) => return StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    };

    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));

    (status, headers, json).into_response()
}
