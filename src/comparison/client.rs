use std::{sync::Arc, sync::Mutex, time::Duration};

use futures::future::BoxFuture;
use log::{error, warn};
use rand::{rngs::StdRng, Rng, SeedableRng};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use tokio::time;

use crate::{
    config::{FallbackPolicy, PracticeConfig},
    error::PracticeError,
    models::{
        ComparisonSource, GestureComparisonRequest, GestureComparisonResponse,
        GestureRecognitionResult, Landmark, PracticeGesture,
    },
};

/// Lower bound of the synthetic confidence used when the service is unreachable.
pub const FALLBACK_CONFIDENCE_FLOOR: f64 = 0.70;

/// Scores a landmark sample against a target gesture.
pub trait ComparisonService: Send + Sync {
    fn compare<'a>(
        &'a self,
        request: &'a GestureComparisonRequest,
    ) -> BoxFuture<'a, Result<GestureComparisonResponse, PracticeError>>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CompareBody<'a> {
    current_landmarks: &'a [Landmark],
    gesture_name: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompareReply {
    #[serde(default)]
    similarity: Option<f64>,
    #[serde(default, rename = "match")]
    match_label: Option<String>,
    #[serde(default)]
    gesture_name: Option<String>,
}

#[derive(Deserialize)]
struct PracticeGesturesReply {
    #[serde(default)]
    gestures: Vec<PracticeGesture>,
}

#[derive(Deserialize)]
struct PracticeSignsReply {
    #[serde(default)]
    signs: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SaveResultBody<'a> {
    user_id: &'a str,
    gesture: &'a str,
    confidence: f64,
    landmarks: &'a [Landmark],
}

/// HTTP client for the gesture recognition backend.
#[derive(Clone)]
pub struct GestureApiClient {
    http: Client,
    base_url: Url,
    match_threshold: f64,
}

impl GestureApiClient {
    pub fn new(base_url: &str, timeout: Duration, match_threshold: f64) -> anyhow::Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        let base_url = Url::parse(base_url)?;
        Ok(Self {
            http,
            base_url,
            match_threshold,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, PracticeError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                PracticeError::NetworkFailure(format!("invalid backend url {}", self.base_url))
            })?;
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }

    pub async fn compare_landmarks(
        &self,
        request: &GestureComparisonRequest,
    ) -> Result<GestureComparisonResponse, PracticeError> {
        let url = self.endpoint(&["api", "compare"])?;
        let body = CompareBody {
            current_landmarks: &request.landmarks,
            gesture_name: &request.target_gesture,
        };

        let reply: CompareReply = self
            .http
            .post(url)
            .json(&body)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(network_failure)?
            .json()
            .await
            .map_err(network_failure)?;

        let confidence =
            GestureComparisonResponse::normalize_confidence(reply.similarity.unwrap_or(0.0));
        Ok(GestureComparisonResponse {
            confidence,
            is_match: confidence >= self.match_threshold,
            message: reply.match_label.unwrap_or_else(|| "poor".into()),
            gesture: reply.gesture_name,
            source: ComparisonSource::Service,
        })
    }

    /// Reference gestures registered for `sign`. An empty list is a valid answer.
    pub async fn practice_gestures(&self, sign: &str) -> Result<Vec<PracticeGesture>, PracticeError> {
        let url = self.endpoint(&["api", "practice-gestures", sign])?;
        let reply: PracticeGesturesReply = self.get_json(url).await?;
        Ok(reply.gestures)
    }

    pub async fn practice_signs(&self) -> Result<Vec<String>, PracticeError> {
        let url = self.endpoint(&["api", "practice-signs"])?;
        let reply: PracticeSignsReply = self.get_json(url).await?;
        Ok(reply.signs)
    }

    pub async fn save_gesture_result(
        &self,
        user_id: &str,
        result: &GestureRecognitionResult,
    ) -> Result<(), PracticeError> {
        let url = self.endpoint(&["api", "save-gesture-result"])?;
        let body = SaveResultBody {
            user_id,
            gesture: &result.gesture,
            confidence: result.confidence,
            landmarks: &result.landmarks,
        };
        self.http
            .post(url)
            .json(&body)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(network_failure)?;
        Ok(())
    }

    pub async fn health(&self) -> bool {
        let Ok(url) = self.endpoint(&["health"]) else {
            return false;
        };
        match self.http.get(url).send().await {
            Ok(response) => response.status().is_success(),
            Err(err) => {
                warn!("gesture service health check failed: {err}");
                false
            }
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T, PracticeError> {
        self.http
            .get(url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(network_failure)?
            .json()
            .await
            .map_err(network_failure)
    }
}

fn network_failure(err: reqwest::Error) -> PracticeError {
    if err.is_timeout() {
        PracticeError::NetworkFailure(format!("request timed out: {err}"))
    } else {
        PracticeError::NetworkFailure(err.to_string())
    }
}

impl ComparisonService for GestureApiClient {
    fn compare<'a>(
        &'a self,
        request: &'a GestureComparisonRequest,
    ) -> BoxFuture<'a, Result<GestureComparisonResponse, PracticeError>> {
        Box::pin(self.compare_landmarks(request))
    }
}

/// Bounds each comparison by the configured timeout and applies the
/// fallback policy when the wrapped service fails.
pub struct FallbackComparison {
    inner: Arc<dyn ComparisonService>,
    policy: FallbackPolicy,
    threshold: f64,
    timeout: Duration,
    rng: Mutex<StdRng>,
}

impl FallbackComparison {
    pub fn new(inner: Arc<dyn ComparisonService>, config: &PracticeConfig) -> Self {
        Self {
            inner,
            policy: config.fallback_policy,
            threshold: config.confidence_threshold,
            timeout: config.compare_timeout(),
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = Mutex::new(rng);
        self
    }

    fn synthetic_confidence(&self) -> f64 {
        let mut rng = match self.rng.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        rng.gen_range(FALLBACK_CONFIDENCE_FLOOR..1.0)
    }

    async fn bounded(
        &self,
        request: &GestureComparisonRequest,
    ) -> Result<GestureComparisonResponse, PracticeError> {
        match time::timeout(self.timeout, self.inner.compare(request)).await {
            Ok(result) => result,
            Err(_) => Err(PracticeError::NetworkFailure(format!(
                "comparison timed out after {}ms",
                self.timeout.as_millis()
            ))),
        }
    }
}

impl ComparisonService for FallbackComparison {
    fn compare<'a>(
        &'a self,
        request: &'a GestureComparisonRequest,
    ) -> BoxFuture<'a, Result<GestureComparisonResponse, PracticeError>> {
        Box::pin(async move {
            let err = match self.bounded(request).await {
                Ok(response) => return Ok(response),
                Err(err) => err,
            };
            error!("gesture comparison for '{}' failed: {err}", request.target_gesture);

            match self.policy {
                FallbackPolicy::Surface => Err(err),
                FallbackPolicy::SyntheticConfidence => {
                    let confidence = self.synthetic_confidence();
                    Ok(GestureComparisonResponse {
                        confidence,
                        is_match: confidence >= self.threshold,
                        message: "fallback".into(),
                        gesture: Some(request.target_gesture.clone()),
                        source: ComparisonSource::Fallback,
                    })
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_http::serve_once;
    use tokio::net::TcpListener;

    struct AlwaysDown;

    impl ComparisonService for AlwaysDown {
        fn compare<'a>(
            &'a self,
            _request: &'a GestureComparisonRequest,
        ) -> BoxFuture<'a, Result<GestureComparisonResponse, PracticeError>> {
            Box::pin(async { Err(PracticeError::NetworkFailure("connection refused".into())) })
        }
    }

    fn request() -> GestureComparisonRequest {
        GestureComparisonRequest {
            landmarks: vec![Landmark::new(0.1, 0.2, 0.3)],
            target_gesture: "Thank You".into(),
            user_id: "guest".into(),
        }
    }

    #[tokio::test]
    async fn compare_posts_landmark_triples() {
        let (address, server) =
            serve_once("200 OK", r#"{"similarity":0.91,"match":"excellent","gestureName":"Thank You"}"#).await;
        let client = GestureApiClient::new(&address, Duration::from_secs(2), 0.8).unwrap();

        let response = client.compare_landmarks(&request()).await.unwrap();
        assert!((response.confidence - 0.91).abs() < 1e-9);
        assert!(response.is_match);
        assert_eq!(response.message, "excellent");
        assert_eq!(response.source, ComparisonSource::Service);

        let raw = server.await.unwrap();
        assert!(raw.starts_with("POST /api/compare"));
        assert!(raw.contains(r#""currentLandmarks":[[0.1,0.2,0.3]]"#));
        assert!(raw.contains(r#""gestureName":"Thank You""#));
    }

    #[tokio::test]
    async fn missing_similarity_scores_zero() {
        let (address, _server) = serve_once("200 OK", r#"{}"#).await;
        let client = GestureApiClient::new(&address, Duration::from_secs(2), 0.8).unwrap();
        let response = client.compare_landmarks(&request()).await.unwrap();
        assert_eq!(response.confidence, 0.0);
        assert!(!response.is_match);
        assert_eq!(response.message, "poor");
    }

    #[tokio::test]
    async fn server_error_is_network_failure() {
        let (address, _server) = serve_once("500 Internal Server Error", r#"{"error":"boom"}"#).await;
        let client = GestureApiClient::new(&address, Duration::from_secs(2), 0.8).unwrap();
        assert!(matches!(
            client.compare_landmarks(&request()).await,
            Err(PracticeError::NetworkFailure(_))
        ));
    }

    #[tokio::test]
    async fn slow_service_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = format!("http://{}", listener.local_addr().unwrap());
        let _hold = tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let client = GestureApiClient::new(&address, Duration::from_millis(100), 0.8).unwrap();
        let err = client.compare_landmarks(&request()).await.unwrap_err();
        assert!(matches!(err, PracticeError::NetworkFailure(_)));
    }

    struct Hangs;

    impl ComparisonService for Hangs {
        fn compare<'a>(
            &'a self,
            _request: &'a GestureComparisonRequest,
        ) -> BoxFuture<'a, Result<GestureComparisonResponse, PracticeError>> {
            Box::pin(std::future::pending())
        }
    }

    #[tokio::test]
    async fn hung_service_times_out_into_fallback() {
        let config = PracticeConfig {
            compare_timeout_ms: 50,
            ..PracticeConfig::default()
        };
        let service = FallbackComparison::new(Arc::new(Hangs), &config);
        let response = service.compare(&request()).await.unwrap();
        assert_eq!(response.source, ComparisonSource::Fallback);
    }

    #[tokio::test]
    async fn practice_gestures_path_is_encoded() {
        let (address, server) = serve_once("200 OK", r#"{"gestures":[]}"#).await;
        let client = GestureApiClient::new(&address, Duration::from_secs(2), 0.8).unwrap();
        let gestures = client.practice_gestures("Thank You").await.unwrap();
        assert!(gestures.is_empty());
        let raw = server.await.unwrap();
        assert!(raw.starts_with("GET /api/practice-gestures/Thank%20You"));
    }

    #[tokio::test]
    async fn practice_signs_are_listed() {
        let (address, server) = serve_once("200 OK", r#"{"signs":["Hello","Yes"]}"#).await;
        let client = GestureApiClient::new(&address, Duration::from_secs(2), 0.8).unwrap();
        assert_eq!(client.practice_signs().await.unwrap(), vec!["Hello", "Yes"]);
        assert!(server.await.unwrap().starts_with("GET /api/practice-signs"));
    }

    #[tokio::test]
    async fn synthetic_fallback_stays_in_range() {
        let service = FallbackComparison::new(Arc::new(AlwaysDown), &PracticeConfig::default())
            .with_rng(StdRng::seed_from_u64(7));
        for _ in 0..200 {
            let response = service.compare(&request()).await.unwrap();
            assert!(response.confidence >= FALLBACK_CONFIDENCE_FLOOR);
            assert!(response.confidence < 1.0);
            assert_eq!(response.source, ComparisonSource::Fallback);
        }
    }

    #[tokio::test]
    async fn surface_policy_returns_the_error() {
        let config = PracticeConfig {
            fallback_policy: FallbackPolicy::Surface,
            ..PracticeConfig::default()
        };
        let service = FallbackComparison::new(Arc::new(AlwaysDown), &config);
        assert!(matches!(
            service.compare(&request()).await,
            Err(PracticeError::NetworkFailure(_))
        ));
    }
}
