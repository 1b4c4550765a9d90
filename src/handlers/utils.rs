use std::collections::HashMap;

use axum::extract::multipart::{Multipart, MultipartError};
use axum::extract::rejection::JsonRejection;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::database::models::Owned;
use crate::database::{AccountRepository, Filter, PageRequest};
use crate::error::ApiError;
use crate::media::UploadFile;
use crate::middleware::CurrentAccount;
use crate::state::AppState;

/// Multipart field carrying uploaded images.
pub const IMAGES_FIELD: &str = "images";

/// Multipart field listing public ids to remove.
pub const IMAGES_TO_DELETE_FIELD: &str = "imagesToDelete";

/// Text fields and image files of a multipart form.
#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: HashMap<String, Vec<String>>,
    pub files: Vec<UploadFile>,
}

impl MultipartForm {
    /// Read the whole form, accepting at most `max_files` images.
    pub async fn read(mut multipart: Multipart, max_files: usize) -> Result<Self, ApiError> {
        let mut form = MultipartForm::default();

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().unwrap_or_default().to_string();

            if field.file_name().is_none() && name != IMAGES_FIELD {
                let value = field.text().await.map_err(multipart_error)?;
                form.push_text(name, value);
                continue;
            }

            if name != IMAGES_FIELD {
                return Err(ApiError::bad_request(format!("Unexpected file field '{}'", name)));
            }
            if form.files.len() >= max_files {
                return Err(ApiError::bad_request(format!("Maximum {} files", max_files)));
            }

            let file_name = field.file_name().unwrap_or("upload").to_string();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let bytes = field.bytes().await.map_err(multipart_error)?;

            form.push_file(UploadFile {
                file_name,
                content_type,
                bytes: bytes.to_vec(),
            })?;
        }

        Ok(form)
    }

    fn push_text(&mut self, name: String, value: String) {
        // `imagesToDelete[]` is how some clients repeat a field
        let name = name.trim_end_matches("[]").to_string();
        self.fields.entry(name).or_default().push(value);
    }

    fn push_file(&mut self, file: UploadFile) -> Result<(), ApiError> {
        if !file.is_allowed_type() {
            return Err(ApiError::bad_request(
                "Only images are allowed (jpeg, jpg, png, gif, webp)",
            ));
        }
        if file.bytes.len() > UploadFile::MAX_BYTES {
            return Err(ApiError::bad_request("File too large (max 5MB)"));
        }
        self.files.push(file);
        Ok(())
    }

    /// First value of a text field.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(|values| values.first()).map(String::as_str)
    }

    /// First value of the first field present among `names`.
    pub fn text_any(&self, names: &[&str]) -> Option<&str> {
        names.iter().find_map(|name| self.text(name))
    }

    /// Assignment field in tri-state form: absent, or present with its raw text.
    pub fn assignment(&self, name: &str) -> Option<Option<&str>> {
        self.text(name).map(Some)
    }

    pub fn images_to_delete(&self) -> Result<Vec<String>, ApiError> {
        let values = self
            .fields
            .get(IMAGES_TO_DELETE_FIELD)
            .map(Vec::as_slice)
            .unwrap_or_default();
        parse_images_to_delete(values)
    }

    pub fn take_files(&mut self) -> Vec<UploadFile> {
        std::mem::take(&mut self.files)
    }

    #[cfg(test)]
    pub fn from_fields(pairs: &[(&str, &str)]) -> Self {
        let mut form = Self::default();
        for (name, value) in pairs {
            form.push_text(name.to_string(), value.to_string());
        }
        form
    }
}

fn multipart_error(err: MultipartError) -> ApiError {
    ApiError::bad_request(format!("Invalid multipart body: {}", err.body_text()))
}

/// Unwrap a JSON body, reporting rejections in the error envelope.
pub fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ApiError::bad_request(rejection.body_text()))
}

/// Each value is either a JSON array of public ids or a single public id.
pub fn parse_images_to_delete(values: &[String]) -> Result<Vec<String>, ApiError> {
    let mut ids = Vec::new();

    for value in values {
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        if value.starts_with('[') {
            let parsed: Vec<String> = serde_json::from_str(value).map_err(|_| {
                ApiError::bad_request("imagesToDelete must be a JSON array of public ids")
            })?;
            ids.extend(parsed.into_iter().filter(|id| !id.trim().is_empty()));
        } else {
            ids.push(value.to_string());
        }
    }

    Ok(ids)
}

/// Query string of the list endpoints. Unknown filters are ignored per route.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub page_name: Option<String>,
    pub task_name: Option<String>,
    #[serde(alias = "Done")]
    pub done: Option<String>,
    pub document_name: Option<String>,
    pub report_title: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
}

impl ListParams {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::from_raw(self.page.as_deref(), self.limit.as_deref())
    }
}

/// Case-insensitive substring filter, skipped when blank.
pub fn contains_filter(column: &'static str, value: Option<&str>) -> Option<Filter> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| Filter::Contains(column, v.to_string()))
}

/// Exact match on an enum column; rejects values outside the enum.
pub fn enum_filter<T>(column: &'static str, value: Option<&str>) -> Result<Option<Filter>, ApiError>
where
    T: std::str::FromStr + std::fmt::Display,
    T::Err: std::fmt::Display,
{
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<T>()
            .map(|parsed| Some(Filter::Text(column, parsed.to_string())))
            .map_err(|e| ApiError::bad_request(e.to_string())),
    }
}

pub fn ensure_visible<T: Owned>(doc: &T, current: &CurrentAccount) -> Result<(), ApiError> {
    if doc.is_visible_to(current.id(), current.role()) {
        Ok(())
    } else {
        Err(ApiError::forbidden("Access denied"))
    }
}

/// 404 `"{label} not found"` unless the account exists.
pub async fn ensure_account_exists(state: &AppState, id: Uuid, label: &str) -> Result<(), ApiError> {
    if AccountRepository::new(state.db.pool()).exists(id).await? {
        Ok(())
    } else {
        Err(ApiError::not_found(format!("{} not found", label)))
    }
}

/// Check the account named by an assignment update, if it names one.
pub async fn ensure_assignee_exists(
    state: &AppState,
    assignment: Option<Option<Uuid>>,
) -> Result<(), ApiError> {
    match assignment {
        Some(Some(id)) => ensure_account_exists(state, id, "AssignedTo").await,
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::extract::FromRequest;
    use axum::http::Request;

    const BOUNDARY: &str = "devtrack-boundary";

    enum Part<'a> {
        Text(&'a str, &'a str),
        File(&'a str, &'a str, &'a str, usize),
    }

    fn multipart_request(parts: &[Part<'_>]) -> Request<Body> {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match part {
                Part::Text(name, value) => {
                    body.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                            .as_bytes(),
                    );
                }
                Part::File(name, file_name, content_type, size) => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
                             Content-Type: {content_type}\r\n\r\n"
                        )
                        .as_bytes(),
                    );
                    body.extend(std::iter::repeat(0u8).take(*size));
                    body.extend_from_slice(b"\r\n");
                }
            }
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/")
            .header("content-type", format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from(body))
            .unwrap()
    }

    async fn multipart(parts: &[Part<'_>]) -> Multipart {
        Multipart::from_request(multipart_request(parts), &()).await.unwrap()
    }

    #[tokio::test]
    async fn reads_text_fields_and_images() {
        let form = MultipartForm::read(
            multipart(&[
                Part::Text("pageName", "Landing"),
                Part::Text("assignedTo", "null"),
                Part::File("images", "a.png", "image/png", 16),
                Part::File("images", "b.jpg", "image/jpeg", 16),
            ])
            .await,
            5,
        )
        .await
        .unwrap();

        assert_eq!(form.text("pageName"), Some("Landing"));
        assert_eq!(form.assignment("assignedTo"), Some(Some("null")));
        assert_eq!(form.assignment("owner"), None);
        assert_eq!(form.files.len(), 2);
        assert_eq!(form.files[1].file_name, "b.jpg");
    }

    #[tokio::test]
    async fn rejects_non_image_uploads() {
        let err = MultipartForm::read(
            multipart(&[Part::File("images", "doc.pdf", "application/pdf", 8)]).await,
            5,
        )
        .await
        .unwrap_err();
        assert_eq!(err.message(), "Only images are allowed (jpeg, jpg, png, gif, webp)");
    }

    #[tokio::test]
    async fn rejects_too_many_files() {
        let err = MultipartForm::read(
            multipart(&[
                Part::File("images", "a.png", "image/png", 4),
                Part::File("images", "b.png", "image/png", 4),
                Part::File("images", "c.png", "image/png", 4),
            ])
            .await,
            2,
        )
        .await
        .unwrap_err();
        assert_eq!(err.message(), "Maximum 2 files");
    }

    #[tokio::test]
    async fn rejects_oversized_files() {
        use axum::body::to_bytes;
        use axum::extract::DefaultBodyLimit;
        use axum::routing::post;
        use axum::Router;
        use tower::ServiceExt;

        async fn upload(multipart: Multipart) -> Result<(), ApiError> {
            MultipartForm::read(multipart, 5).await.map(|_| ())
        }

        // the route limit sits above one file's maximum, as in the application router
        let app = Router::new()
            .route("/", post(upload))
            .layer(DefaultBodyLimit::max(30 * 1024 * 1024));
        let request = multipart_request(&[Part::File(
            "images",
            "big.png",
            "image/png",
            UploadFile::MAX_BYTES + 1,
        )]);

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::BAD_REQUEST);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "File too large (max 5MB)");
    }

    #[tokio::test]
    async fn images_to_delete_accepts_json_or_repeated_fields() {
        let json_form = MultipartForm::read(
            multipart(&[Part::Text("imagesToDelete", r#"["pages/a","pages/b"]"#)]).await,
            5,
        )
        .await
        .unwrap();
        assert_eq!(json_form.images_to_delete().unwrap(), vec!["pages/a", "pages/b"]);

        let repeated = MultipartForm::read(
            multipart(&[
                Part::Text("imagesToDelete[]", "pages/a"),
                Part::Text("imagesToDelete[]", "pages/c"),
            ])
            .await,
            5,
        )
        .await
        .unwrap();
        assert_eq!(repeated.images_to_delete().unwrap(), vec!["pages/a", "pages/c"]);
    }

    #[test]
    fn malformed_images_to_delete_is_rejected() {
        assert!(parse_images_to_delete(&["[\"unterminated".to_string()]).is_err());
        assert_eq!(parse_images_to_delete(&["  ".to_string()]).unwrap(), Vec::<String>::new());
    }

    #[test]
    fn list_filters() {
        assert_eq!(contains_filter("page_name", Some("  ")), None);
        assert_eq!(
            contains_filter("page_name", Some(" home ")),
            Some(Filter::Contains("page_name", "home".to_string()))
        );

        let status = enum_filter::<crate::types::TodoStatus>("status", Some("resolved")).unwrap();
        assert_eq!(status, Some(Filter::Text("status", "resolved".to_string())));
        assert!(enum_filter::<crate::types::TodoStatus>("status", Some("done")).is_err());
    }
}
