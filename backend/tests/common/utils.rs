use axum::{body::Body, http::Request, response::Response};
use http_body_util::BodyExt;
use resume_backend::types::{FILE_FIELD, FIRST_NAME_FIELD, LAST_NAME_FIELD};

pub const UPLOAD_ROUTE: &str = "/api/upload";
const BOUNDARY: &str = "resume-backend-test-boundary";

/// Parse response body to JSON
pub async fn parse_response_body(response: Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

/// Fake PDF payload of roughly `size` bytes
pub fn fake_pdf(size: usize) -> Vec<u8> {
    let mut data = b"%PDF-1.4\n".to_vec();
    data.resize(size.max(data.len()), b'x');
    data
}

/// Minimal `multipart/form-data` body builder
pub struct MultipartForm {
    body: Vec<u8>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self { body: Vec::new() }
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, data: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn into_request(mut self, route: &str) -> Request<Body> {
        self.body
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .uri(route)
            .method("POST")
            .header(
                "Content-Type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(self.body))
            .unwrap()
    }
}

/// Complete, valid upload form for `file_name`
pub fn resume_form(file_name: &str, data: &[u8]) -> MultipartForm {
    MultipartForm::new()
        .file(FILE_FIELD, file_name, "application/pdf", data)
        .text(FIRST_NAME_FIELD, "Ana")
        .text(LAST_NAME_FIELD, "Souza")
}
