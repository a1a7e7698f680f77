//! Request body helpers.
//!
//! The browser form posts either JSON or `application/x-www-form-urlencoded`,
//! so handlers take [`JsonOrForm`] instead of a fixed extractor.

use async_trait::async_trait;
use axum::{
    extract::{FromRequest, Request},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Form, Json,
};
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};

use crate::downloader::FormatSelector;

/// Body accepted as JSON or as a url-encoded form
#[derive(Debug, Clone)]
pub struct JsonOrForm<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonOrForm<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send + 'static,
{
    type Rejection = PayloadRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map_or(false, |ct| ct.starts_with("application/x-www-form-urlencoded"));

        if is_form {
            let Form(payload) = Form::<T>::from_request(req, state)
                .await
                .map_err(|rejection| PayloadRejection {
                    status: rejection.status(),
                    message: rejection.body_text(),
                })?;
            return Ok(Self(payload));
        }

        let Json(payload) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| PayloadRejection {
                status: rejection.status(),
                message: rejection.body_text(),
            })?;
        Ok(Self(payload))
    }
}

/// Body that could not be read or deserialized.
///
/// Responds as `{"error": ...}`; handlers with another error shape take
/// `Result<JsonOrForm<T>, PayloadRejection>` and map it themselves.
#[derive(Debug)]
pub struct PayloadRejection {
    pub status: StatusCode,
    pub message: String,
}

impl IntoResponse for PayloadRejection {
    fn into_response(self) -> Response {
        (self.status, Json(serde_json::json!({ "error": self.message }))).into_response()
    }
}

/// Quality as a number, a numeric string (`"720"`, `"720p"`), or empty.
pub fn deserialize_quality<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Height(u32),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None | Some(Raw::Height(0)) => Ok(None),
        Some(Raw::Height(height)) => Ok(Some(height)),
        Some(Raw::Text(text)) => FormatSelector::parse_quality(&text).map_err(D::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[derive(Debug, Deserialize)]
    struct Payload {
        url: String,
        #[serde(default, deserialize_with = "deserialize_quality")]
        quality: Option<u32>,
    }

    async fn extract(content_type: &str, body: &str) -> Result<Payload, PayloadRejection> {
        let req = Request::builder()
            .method("POST")
            .uri("/")
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(body.to_string()))
            .unwrap();
        JsonOrForm::<Payload>::from_request(req, &()).await.map(|JsonOrForm(p)| p)
    }

    #[tokio::test]
    async fn test_json_body() {
        let p = extract("application/json", r#"{"url":"https://a/b","quality":720}"#)
            .await
            .unwrap();
        assert_eq!(p.url, "https://a/b");
        assert_eq!(p.quality, Some(720));
    }

    #[tokio::test]
    async fn test_json_quality_variants() {
        let p = extract("application/json", r#"{"url":"u","quality":"480"}"#).await.unwrap();
        assert_eq!(p.quality, Some(480));
        let p = extract("application/json", r#"{"url":"u","quality":""}"#).await.unwrap();
        assert_eq!(p.quality, None);
        let p = extract("application/json", r#"{"url":"u","quality":null}"#).await.unwrap();
        assert_eq!(p.quality, None);
        let p = extract("application/json", r#"{"url":"u"}"#).await.unwrap();
        assert_eq!(p.quality, None);
    }

    #[tokio::test]
    async fn test_form_body() {
        let p = extract(
            "application/x-www-form-urlencoded",
            "url=https%3A%2F%2Fa%2Fb&quality=1080p",
        )
        .await
        .unwrap();
        assert_eq!(p.url, "https://a/b");
        assert_eq!(p.quality, Some(1080));
    }

    #[tokio::test]
    async fn test_rejects_bad_quality() {
        let res = extract("application/json", r#"{"url":"u","quality":"best[ext=webm]"}"#).await;
        let rejection = res.unwrap_err();
        assert_eq!(rejection.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(rejection.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_missing_content_type_is_rejected() {
        let req = Request::builder()
            .method("POST")
            .uri("/")
            .body(Body::from("{}"))
            .unwrap();
        let res = JsonOrForm::<Payload>::from_request(req, &()).await;
        assert_eq!(
            res.unwrap_err().status,
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
    }
}
