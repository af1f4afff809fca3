use crate::gemini::{GeminiClient, GeminiConfig, GeminiOptions};
use crate::prelude::{eprintln, *};
use axum::{
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use rcoach_core::analysis::{AnalyzeRequest, AnalyzeResponse};
use std::any::Any;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{self, CorsLayer};

#[derive(Debug, clap::Args)]
pub struct ServeOptions {
    /// Port to listen on
    #[arg(short, long, env = "RCOACH_PORT", default_value = "8000")]
    pub port: u16,

    /// Host to bind to
    #[arg(long, env = "RCOACH_HOST", default_value = "127.0.0.1")]
    pub host: String,

    #[clap(flatten)]
    pub gemini: GeminiOptions,
}

/// State shared by every request. Read-only after startup.
#[derive(Debug)]
pub struct AppState {
    pub client: GeminiClient,
}

pub async fn run_serve(options: ServeOptions, global: crate::Global) -> Result<()> {
    let config = GeminiConfig::from_options(options.gemini)?;
    let client = GeminiClient::new(config)?;
    let state = Arc::new(AppState { client });

    let addr = f!("{}:{}", options.host, options.port);

    if global.verbose {
        eprintln!("Model: {}", state.client.config().model);
        eprintln!("Analyze endpoint: http://{}/analyze", addr);
    }

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| eyre!("Failed to bind to {}: {}", addr, e))?;

    info!("Listening on http://{}", addr);

    axum::serve(listener, router(state))
        .await
        .map_err(|e| eyre!("Server error: {e}"))?;

    Ok(())
}

pub fn router(state: Arc<AppState>) -> Router {
    with_layers(routes(state))
}

fn routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(home_handler))
        .route("/analyze", post(analyze_handler))
        .with_state(state)
}

fn with_layers(router: Router) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(cors::Any)
        .allow_methods(cors::Any)
        .allow_headers(cors::Any);

    router
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(cors)
}

async fn home_handler() -> Json<serde_json::Value> {
    debug!("Home endpoint hit");
    Json(serde_json::json!({ "message": "Backend is running!" }))
}

async fn analyze_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalyzeResponse>, Error> {
    let Json(request) = payload.map_err(|rejection| {
        warn!("Rejected analyze request: {}", rejection.body_text());
        Error::InvalidRequest(rejection.body_text())
    })?;

    debug!("Received answers: {}", request.answers);

    match crate::analyze::analyze_data(&state.client, &request.answers).await {
        Ok(response) => Ok(Json(response)),
        Err(err) => {
            error!("Analyze failed: {}", err);
            Err(err)
        }
    }
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!("Handler panicked: {}", message);

    Error::Internal("Internal server error".to_string()).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::OriginalUri;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Stand-in for the Gemini API that answers every request with `reply`.
    struct FakeUpstream {
        reply: Value,
        calls: AtomicUsize,
        last_uri: Mutex<Option<String>>,
        last_body: Mutex<Option<Value>>,
    }

    async fn fake_handler(
        State(fake): State<Arc<FakeUpstream>>,
        OriginalUri(uri): OriginalUri,
        Json(body): Json<Value>,
    ) -> Json<Value> {
        fake.calls.fetch_add(1, Ordering::SeqCst);
        *fake.last_uri.lock().unwrap() = Some(uri.to_string());
        *fake.last_body.lock().unwrap() = Some(body);
        Json(fake.reply.clone())
    }

    async fn spawn(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        f!("http://{addr}")
    }

    fn client_for(api_base: String) -> GeminiClient {
        GeminiClient::new(GeminiConfig {
            api_key: "test-key".to_string(),
            model: "gemini-test".to_string(),
            api_base,
            timeout: Some(Duration::from_secs(5)),
        })
        .unwrap()
    }

    /// Starts a fake upstream and the service wired to it.
    async fn start(reply: Value) -> (String, Arc<FakeUpstream>) {
        let fake = Arc::new(FakeUpstream {
            reply,
            calls: AtomicUsize::new(0),
            last_uri: Mutex::new(None),
            last_body: Mutex::new(None),
        });
        let upstream = spawn(
            Router::new()
                .fallback(fake_handler)
                .with_state(fake.clone()),
        )
        .await;

        let state = Arc::new(AppState {
            client: client_for(upstream),
        });
        (spawn(router(state)).await, fake)
    }

    fn candidate(text: &str) -> Value {
        json!({"candidates": [{"content": {"parts": [{"text": text}], "role": "model"}}]})
    }

    async fn post_analyze(base: &str, body: Value) -> (u16, Value) {
        let response = reqwest::Client::new()
            .post(f!("{base}/analyze"))
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = response.status().as_u16();
        (status, response.json().await.unwrap())
    }

    #[tokio::test]
    async fn test_home() {
        let (base, _) = start(json!({})).await;
        let body: Value = reqwest::get(f!("{base}/"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body, json!({"message": "Backend is running!"}));
    }

    #[tokio::test]
    async fn test_analyze_success() {
        let (base, fake) = start(candidate(
            "**Justification:** A two-sample t-test compares the group means.\n\n\
             **R Code:**\n```r\nt.test(score ~ group, data = df)\n```\n",
        ))
        .await;

        let (status, body) =
            post_analyze(&base, json!({"answers": {"groups": 2, "outcome": "score"}})).await;

        assert_eq!(status, 200);
        assert_eq!(
            body,
            json!({
                "recommendation": "A two-sample t-test compares the group means.",
                "explanation": "A two-sample t-test compares the group means.",
                "r_code": "```r\nt.test(score ~ group, data = df)\n```"
            })
        );

        assert_eq!(fake.calls.load(Ordering::SeqCst), 1);
        let uri = fake.last_uri.lock().unwrap().clone().unwrap();
        assert_eq!(uri, "/models/gemini-test:generateContent?key=test-key");

        let sent = fake.last_body.lock().unwrap().clone().unwrap();
        let prompt = sent["contents"][0]["parts"][0]["text"].as_str().unwrap();
        assert!(prompt.contains("**Justification:**"));
        assert!(prompt.ends_with(r#"{"groups":2,"outcome":"score"}"#));
    }

    #[tokio::test]
    async fn test_empty_answers_never_reach_upstream() {
        let (base, fake) = start(candidate("unused")).await;

        let (status, body) = post_analyze(&base, json!({"answers": {}})).await;

        assert_eq!(status, 400);
        assert_eq!(body, json!({"detail": "No answers provided!"}));
        assert_eq!(fake.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_upstream_error_message_is_surfaced() {
        let (base, _) = start(json!({"error": {"message": "quota exceeded"}})).await;

        let (status, body) = post_analyze(&base, json!({"answers": {"q1": "yes"}})).await;

        assert_eq!(status, 500);
        assert!(body["detail"].as_str().unwrap().contains("quota exceeded"));
    }

    #[tokio::test]
    async fn test_upstream_without_text() {
        let (base, _) = start(json!({"candidates": []})).await;

        let (status, body) = post_analyze(&base, json!({"answers": {"q1": "yes"}})).await;

        assert_eq!(status, 500);
        assert_eq!(
            body,
            json!({"detail": "No response received from Gemini API."})
        );
    }

    #[tokio::test]
    async fn test_unstructured_reply_uses_fallbacks() {
        let (base, _) = start(candidate("I would use a t-test.")).await;

        let (status, body) = post_analyze(&base, json!({"answers": {"q1": "yes"}})).await;

        assert_eq!(status, 200);
        assert_eq!(
            body["recommendation"],
            "Could not extract justification from the response."
        );
        assert_eq!(
            body["r_code"],
            "```r\n# Error: Could not extract R code. Try re-running the request.\n```"
        );
    }

    #[tokio::test]
    async fn test_malformed_body_is_rejected() {
        let (base, fake) = start(candidate("unused")).await;

        let (status, body) = post_analyze(&base, json!({"questions": {"q1": "yes"}})).await;
        assert_eq!(status, 422);
        assert!(body["detail"].as_str().unwrap().contains("answers"));

        let (status, _) = post_analyze(&base, json!({"answers": ["q1"]})).await;
        assert_eq!(status, 422);

        assert_eq!(fake.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unreachable_upstream() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let dead = f!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let state = Arc::new(AppState {
            client: client_for(dead),
        });
        let base = spawn(router(state)).await;

        let (status, body) = post_analyze(&base, json!({"answers": {"q1": "yes"}})).await;

        assert_eq!(status, 500);
        let detail = body["detail"].as_str().unwrap();
        assert!(detail.starts_with("Failed to reach Gemini API"));
        assert!(!detail.contains("test-key"));
    }

    #[tokio::test]
    async fn test_cors_allows_any_origin() {
        let (base, _) = start(json!({})).await;

        let response = reqwest::Client::new()
            .get(f!("{base}/"))
            .header("Origin", "http://frontend.example")
            .send()
            .await
            .unwrap();

        assert_eq!(response.headers()["access-control-allow-origin"], "*");
    }

    #[tokio::test]
    async fn test_panics_become_server_errors() {
        let state = Arc::new(AppState {
            client: client_for("http://127.0.0.1:9".to_string()),
        });
        async fn boom() -> &'static str {
            panic!("boom")
        }

        let app = with_layers(routes(state).route("/boom", get(boom)));
        let base = spawn(app).await;

        let response = reqwest::get(f!("{base}/boom")).await.unwrap();
        assert_eq!(response.status().as_u16(), 500);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body, json!({"detail": "Internal server error"}));

        let response = reqwest::get(f!("{base}/")).await.unwrap();
        assert_eq!(response.status().as_u16(), 200);
    }
}
