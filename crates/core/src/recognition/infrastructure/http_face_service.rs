use std::time::Duration;

use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::{Client, Response};
use reqwest::{StatusCode, Url};

use crate::recognition::domain::face_service::{
    FaceRecognitionService, KnownFacesRegistry, RecognitionOutcome,
};
use crate::recognition::infrastructure::wire::{ErrorBody, HealthBody, KnownFacesBody};
use crate::shared::client_config::ClientConfig;
use crate::shared::encoded_image::EncodedImage;
use crate::shared::error::ClientError;
use crate::shared::known_face::{KnownFaceEntry, RegistryReply};

/// Blocking HTTP client for the face recognition service.
///
/// Endpoints:
/// - `POST /recognize_image` (multipart `file`)
/// - `POST /add_face` (multipart `file`, `name`)
/// - `GET /known_faces`
/// - `POST /delete_face/{name}`
/// - `GET /health`
///
/// Calls block; the annotator runs them on worker threads.
pub struct HttpFaceServiceClient {
    base: Url,
    client: Client,
}

impl HttpFaceServiceClient {
    pub fn new(server_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let base = Url::parse(server_url).map_err(|e| {
            ClientError::Validation(format!("invalid server URL '{server_url}': {e}"))
        })?;
        if base.cannot_be_a_base() {
            return Err(ClientError::Validation(format!(
                "server URL '{server_url}' cannot carry a path"
            )));
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { base, client })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        Self::new(&config.server_url, config.request_timeout())
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Returns the service's reported status (`"ok"` when healthy).
    pub fn health(&self) -> Result<String, ClientError> {
        let response = self.client.get(self.endpoint(&["health"])?).send()?;
        let (status, body) = read_body(response)?;
        if !status.is_success() {
            return Err(status_error(status, &body));
        }
        let health: HealthBody = serde_json::from_str(&body)?;
        Ok(health.status)
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::Validation(format!("bad server URL: {}", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn post_registry(&self, url: Url, form: Option<Form>) -> Result<RegistryReply, ClientError> {
        let request = self.client.post(url);
        let request = match form {
            Some(form) => request.multipart(form),
            None => request,
        };
        let (status, body) = read_body(request.send()?)?;

        // Failed mutations still carry `{success: false, message}` bodies
        // (e.g. 404 for an unknown name); those are replies, not transport errors.
        match serde_json::from_str::<RegistryReply>(&body) {
            Ok(reply) => Ok(reply),
            Err(_) if !status.is_success() => Err(status_error(status, &body)),
            Err(e) => Err(ClientError::Protocol(e.to_string())),
        }
    }
}

impl FaceRecognitionService for HttpFaceServiceClient {
    fn recognize(&self, image: &EncodedImage) -> Result<RecognitionOutcome, ClientError> {
        let form = Form::new().part("file", file_part(image)?);
        let response = self
            .client
            .post(self.endpoint(&["recognize_image"])?)
            .multipart(form)
            .send()?;
        let (status, body) = read_body(response)?;
        if !status.is_success() {
            return Err(status_error(status, &body));
        }
        Ok(serde_json::from_str(&body)?)
    }
}

impl KnownFacesRegistry for HttpFaceServiceClient {
    fn list(&self) -> Result<Vec<KnownFaceEntry>, ClientError> {
        let response = self.client.get(self.endpoint(&["known_faces"])?).send()?;
        let (status, body) = read_body(response)?;
        if !status.is_success() {
            return Err(status_error(status, &body));
        }
        let listing: KnownFacesBody = serde_json::from_str(&body)?;
        Ok(listing.faces.into_iter().map(KnownFaceEntry::new).collect())
    }

    fn add(&self, name: &str, image: &EncodedImage) -> Result<RegistryReply, ClientError> {
        let form = Form::new()
            .part("file", file_part(image)?)
            .text("name", name.to_string());
        self.post_registry(self.endpoint(&["add_face"])?, Some(form))
    }

    fn delete(&self, name: &str) -> Result<RegistryReply, ClientError> {
        self.post_registry(self.endpoint(&["delete_face", name])?, None)
    }
}

fn file_part(image: &EncodedImage) -> Result<Part, ClientError> {
    Ok(Part::bytes(image.bytes().to_vec())
        .file_name(image.file_name().to_string())
        .mime_str(image.mime())?)
}

fn read_body(response: Response) -> Result<(StatusCode, String), ClientError> {
    let status = response.status();
    let body = response.text()?;
    Ok((status, body))
}

fn status_error(status: StatusCode, body: &str) -> ClientError {
    let detail = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(ErrorBody::into_message)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string());
    ClientError::Network(format!("HTTP {}: {detail}", status.as_u16()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn jpeg() -> EncodedImage {
        EncodedImage::jpeg(b"fake-jpeg-bytes".to_vec(), "frame.jpg")
    }

    /// Builds and drops the blocking client off the async runtime.
    async fn with_client<T, F>(uri: String, f: F) -> T
    where
        T: Send + 'static,
        F: FnOnce(HttpFaceServiceClient) -> T + Send + 'static,
    {
        tokio::task::spawn_blocking(move || {
            let client = HttpFaceServiceClient::new(&uri, Duration::from_secs(5)).unwrap();
            f(client)
        })
        .await
        .unwrap()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_recognize_parses_faces() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/recognize_image"))
            .and(body_string_contains("name=\"file\""))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "faces": [{
                    "name": "Alice",
                    "confidence": 0.93,
                    "location": {"left": 10, "top": 10, "right": 100, "bottom": 120}
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = with_client(server.uri(), |c| c.recognize(&jpeg()))
            .await
            .unwrap();

        assert_eq!(outcome.faces.len(), 1);
        assert_eq!(outcome.faces[0].name, "Alice");
        assert_eq!(outcome.faces[0].location.right, 100);
        assert!(outcome.error.is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_recognize_missing_faces_means_none() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/recognize_image"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let outcome = with_client(server.uri(), |c| c.recognize(&jpeg()))
            .await
            .unwrap();
        assert!(outcome.faces.is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_recognize_malformed_body_is_protocol_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/recognize_image"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = with_client(server.uri(), |c| c.recognize(&jpeg()))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Protocol(_)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_recognize_non_2xx_is_network_error_with_server_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/recognize_image"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({"error": "File type not allowed"})),
            )
            .mount(&server)
            .await;

        let err = with_client(server.uri(), |c| c.recognize(&jpeg()))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ClientError::Network("HTTP 400: File type not allowed".to_string())
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_list_known_faces() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/known_faces"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"faces": ["Bob", "Carol"]})))
            .mount(&server)
            .await;

        let faces = with_client(server.uri(), |c| c.list()).await.unwrap();
        assert_eq!(
            faces,
            vec![KnownFaceEntry::new("Bob"), KnownFaceEntry::new("Carol")]
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_add_face_sends_name_field() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/add_face"))
            .and(body_string_contains("name=\"name\""))
            .and(body_string_contains("Dave"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"success": true, "message": "Added Dave"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let reply = with_client(server.uri(), |c| c.add("Dave", &jpeg()))
            .await
            .unwrap();
        assert!(reply.success);
        assert_eq!(reply.message.as_deref(), Some("Added Dave"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_delete_escapes_name_in_path() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/delete_face/Mary%20Ann"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"success": true, "message": "Deleted Mary Ann"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let reply = with_client(server.uri(), |c| c.delete("Mary Ann"))
            .await
            .unwrap();
        assert!(reply.success);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_delete_unknown_name_returns_unsuccessful_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/delete_face/Nobody"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(json!({"success": false, "message": "Person not found"})),
            )
            .mount(&server)
            .await;

        let reply = with_client(server.uri(), |c| c.delete("Nobody"))
            .await
            .unwrap();
        assert!(!reply.success);
        assert_eq!(reply.message.as_deref(), Some("Person not found"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_add_face_bad_request_without_reply_is_network_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/add_face"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({"error": "Invalid file or name"})),
            )
            .mount(&server)
            .await;

        let err = with_client(server.uri(), |c| c.add("Dave", &jpeg()))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ClientError::Network("HTTP 400: Invalid file or name".to_string())
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_health_reports_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
            .mount(&server)
            .await;

        let status = with_client(server.uri(), |c| c.health()).await.unwrap();
        assert_eq!(status, "ok");
    }

    #[test]
    fn test_unreachable_server_is_network_error() {
        let client =
            HttpFaceServiceClient::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let err = client.list().unwrap_err();
        assert!(matches!(err, ClientError::Network(_)));
    }

    #[test]
    fn test_invalid_server_url_is_validation_error() {
        let result = HttpFaceServiceClient::new("not a url", Duration::from_secs(1));
        assert!(matches!(result, Err(ClientError::Validation(_))));
    }

    #[test]
    fn test_endpoint_keeps_base_path_prefix() {
        let client =
            HttpFaceServiceClient::new("http://example.com/api/", Duration::from_secs(1)).unwrap();
        let url = client.endpoint(&["delete_face", "a/b"]).unwrap();
        assert_eq!(url.as_str(), "http://example.com/api/delete_face/a%2Fb");
    }
}
