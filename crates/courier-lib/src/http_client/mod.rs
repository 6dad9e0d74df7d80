//! HTTP client that sends and receives bodies through a pair of codecs.
//!
//! Wraps `reqwest::Client`. The client is safe to clone (codecs are
//! `Arc`-ed) and can be shared across tasks.

use std::sync::Arc;

use reqwest::header::{HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::codec::{Decoder, Encoder, JsonDecoder, JsonEncoder};
use crate::config::ClientConfig;
use crate::errors::{CourierError, Result};
use crate::message::{RequestTemplate, Response};
use crate::types::{DescribeType, TypeDescriptor};

const APPLICATION_JSON: &str = "application/json";

pub struct JsonClient<E = JsonEncoder, D = JsonDecoder> {
    inner: reqwest::Client,
    encoder: Arc<E>,
    decoder: Arc<D>,
    decode_not_found: bool,
}

impl<E, D> Clone for JsonClient<E, D> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            encoder: Arc::clone(&self.encoder),
            decoder: Arc::clone(&self.decoder),
            decode_not_found: self.decode_not_found,
        }
    }
}

impl JsonClient {
    /// Build a client with the default JSON codecs.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        Self::with_codec(config, JsonEncoder::new(), JsonDecoder::new())
    }

    pub fn from_defaults() -> Result<Self> {
        Self::new(&ClientConfig::default())
    }
}

impl<E: Encoder, D: Decoder> JsonClient<E, D> {
    pub fn with_codec(config: &ClientConfig, encoder: E, decoder: D) -> Result<Self> {
        Ok(Self {
            inner: Self::build_client(config)?,
            encoder: Arc::new(encoder),
            decoder: Arc::new(decoder),
            decode_not_found: config.decode_not_found,
        })
    }

    pub fn encoder(&self) -> &E {
        &self.encoder
    }

    pub fn decoder(&self) -> &D {
        &self.decoder
    }

    /// Send `template` and decode a successful response as `response_type`.
    ///
    /// A 404 is decoded (to an empty value) only when `decode_not_found` is
    /// set; every other non-2xx status is returned as `CourierError::Server`.
    pub async fn execute<R>(
        &self,
        template: RequestTemplate,
        response_type: &TypeDescriptor,
    ) -> Result<Option<R>>
    where
        R: DeserializeOwned,
    {
        let request = template.into_request(&self.inner)?;
        tracing::debug!(method = %request.method(), url = %request.url(), "sending request");

        let response = Response::from_reqwest(self.inner.execute(request).await?).await?;
        let status = response.status();
        tracing::debug!(status = %status, "received response");

        let decodable =
            status.is_success() || (self.decode_not_found && status == StatusCode::NOT_FOUND);
        if !decodable {
            return Err(CourierError::Server {
                status: status.as_u16(),
                message: response.body_text_lossy(),
            });
        }
        self.decoder.decode(&response, response_type)
    }

    pub async fn get<R>(&self, url: &str) -> Result<Option<R>>
    where
        R: DeserializeOwned + DescribeType,
    {
        let mut template = RequestTemplate::new(Method::GET, url);
        template.header(ACCEPT, HeaderValue::from_static(APPLICATION_JSON));
        self.execute(template, &R::describe()).await
    }

    /// Encode `body` as a JSON request body and decode the response.
    pub async fn send<B, R>(&self, method: Method, url: &str, body: &B) -> Result<Option<R>>
    where
        B: Serialize + DescribeType + ?Sized,
        R: DeserializeOwned + DescribeType,
    {
        let mut template = RequestTemplate::new(method, url);
        template
            .header(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON))
            .header(ACCEPT, HeaderValue::from_static(APPLICATION_JSON));
        self.encoder.encode_typed(body, &mut template)?;
        self.execute(template, &R::describe()).await
    }

    fn build_client(config: &ClientConfig) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .pool_max_idle_per_host(config.pool_max_idle_per_host as usize)
            .pool_idle_timeout(config.pool_idle_timeout())
            .build()
            .map_err(CourierError::Http)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json::Module;
    use axum::body::Bytes as AxumBytes;
    use axum::http::StatusCode as AxumStatus;
    use axum::routing::{get, post};
    use axum::Router;
    use bytes::Bytes;
    use serde::Deserialize;
    use serde_json::Value;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Zone {
        name: String,
        id: Option<String>,
    }

    impl DescribeType for Zone {}

    /// Serve a fixture router on an ephemeral port and return its base URL.
    async fn serve() -> String {
        let app = Router::new()
            .route(
                "/zones",
                get(|| async {
                    r#"[{"name": "denominator.io."}, {"name": "denominator.io.", "id": "ABCD"}]"#
                }),
            )
            .route("/echo", post(|body: AxumBytes| async move { body }))
            .route("/empty", get(|| async { AxumStatus::NO_CONTENT }))
            .route("/broken", get(|| async { (AxumStatus::INTERNAL_SERVER_ERROR, "boom") }));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind ephemeral port");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });
        format!("http://{addr}")
    }

    #[test]
    fn test_from_defaults() {
        let client = JsonClient::from_defaults().expect("should build from defaults");
        let _cloned = client.clone();
    }

    #[tokio::test]
    async fn test_get_decodes_list() {
        let base = serve().await;
        let client = JsonClient::from_defaults().unwrap();

        let zones: Option<Vec<Zone>> = client.get(&format!("{base}/zones")).await.unwrap();
        let zones = zones.expect("body present");
        assert_eq!(zones.len(), 2);
        assert_eq!(zones[1].id.as_deref(), Some("ABCD"));
    }

    #[tokio::test]
    async fn test_send_round_trips_through_echo() {
        let base = serve().await;
        let client = JsonClient::from_defaults().unwrap();
        let zone = Zone {
            name: "denominator.io.".into(),
            id: None,
        };

        let echoed: Option<Value> = client
            .send(Method::POST, &format!("{base}/echo"), &zone)
            .await
            .unwrap();
        assert_eq!(echoed, Some(serde_json::json!({"name": "denominator.io."})));
    }

    #[tokio::test]
    async fn test_send_uses_encoder_modules() {
        let base = serve().await;
        let encoder = JsonEncoder::with_modules([Module::new("zones").serialize_with::<Zone, _>(
            |zone| Ok(Value::String(zone.name.to_uppercase())),
        )]);
        let client =
            JsonClient::with_codec(&ClientConfig::default(), encoder, JsonDecoder::new()).unwrap();

        let zones = vec![Zone {
            name: "a.io.".into(),
            id: None,
        }];
        let echoed: Option<Vec<String>> = client
            .send(Method::POST, &format!("{base}/echo"), &zones)
            .await
            .unwrap();
        assert_eq!(echoed, Some(vec!["A.IO.".to_string()]));
    }

    #[tokio::test]
    async fn test_no_content_decodes_to_none() {
        let base = serve().await;
        let client = JsonClient::from_defaults().unwrap();
        let zones: Option<Vec<Zone>> = client.get(&format!("{base}/empty")).await.unwrap();
        assert_eq!(zones, None);
    }

    #[tokio::test]
    async fn test_not_found_is_an_error_by_default() {
        let base = serve().await;
        let client = JsonClient::from_defaults().unwrap();
        let err = client
            .get::<Vec<Zone>>(&format!("{base}/missing"))
            .await
            .unwrap_err();
        assert!(matches!(err, CourierError::Server { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_not_found_decodes_when_enabled() {
        let base = serve().await;
        let config = ClientConfig {
            decode_not_found: true,
            ..ClientConfig::default()
        };
        let client = JsonClient::new(&config).unwrap();

        let bytes: Option<Bytes> = client.get(&format!("{base}/missing")).await.unwrap();
        assert_eq!(bytes, Some(Bytes::new()));
    }

    #[tokio::test]
    async fn test_server_error_carries_body() {
        let base = serve().await;
        let client = JsonClient::from_defaults().unwrap();
        let err = client
            .get::<Value>(&format!("{base}/broken"))
            .await
            .unwrap_err();
        match err {
            CourierError::Server { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "boom");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_encode_failure_skips_request() {
        let client = JsonClient::from_defaults().unwrap();
        let mut unsupported = std::collections::BTreeMap::new();
        unsupported.insert(vec![1u8], 1);
        // Unroutable URL: the request would fail with an HTTP error if it were sent.
        let err = client
            .send::<_, Value>(Method::POST, "http://127.0.0.1:9/never", &unsupported)
            .await
            .unwrap_err();
        assert!(err.is_encode());
    }
}
