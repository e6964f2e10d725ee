//! Web form API tests served on an ephemeral port

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use product_design::crew::{Crew, RoleKind};
use product_design::llm::{LlmProvider, LlmResponse, Message, ToolDefinition};
use product_design::tools::ToolRegistry;
use product_design::transport::http;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct CannedProvider {
    fail: bool,
    calls: AtomicUsize,
}

#[async_trait]
impl LlmProvider for CannedProvider {
    fn name(&self) -> &str {
        "canned"
    }

    async fn chat(
        &self,
        messages: &[Message],
        _tools: Option<&[ToolDefinition]>,
    ) -> Result<LlmResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(anyhow!("API key rejected"));
        }
        let system = messages[0].text().unwrap_or("");
        let title = RoleKind::ALL
            .iter()
            .map(|r| r.title())
            .find(|t| system.contains(*t))
            .unwrap_or("Unknown");
        Ok(LlmResponse::Text {
            text: format!("- {} view", title),
            usage: None,
        })
    }
}

async fn serve(fail: bool) -> (String, Arc<CannedProvider>) {
    let provider = Arc::new(CannedProvider {
        fail,
        calls: AtomicUsize::new(0),
    });
    let crew = Arc::new(Crew::new(provider.clone(), Arc::new(ToolRegistry::new())));
    let app = http::router(crew, "gpt-4o-mini");

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}", addr), provider)
}

#[tokio::test]
async fn health_reports_model() {
    let (base, _) = serve(false).await;
    let body: Value = reqwest::get(format!("{}/health", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["model"], "gpt-4o-mini");
}

#[tokio::test]
async fn index_serves_the_form() {
    let (base, _) = serve(false).await;
    let html = reqwest::get(&base).await.unwrap().text().await.unwrap();
    assert!(html.contains("IKEA Innovation Assistant"));
    assert!(html.contains("Generate Innovation Analysis"));
}

#[tokio::test]
async fn blank_topic_is_rejected_without_calling_the_model() {
    let (base, provider) = serve(false).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/api/analyze", base))
        .json(&json!({"topic": "   "}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Please enter a topic before proceeding.");

    let resp = client
        .get(format!("{}/api/analyze/stream", base))
        .query(&[("topic", "")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn analyze_returns_three_sections() {
    let (base, _) = serve(false).await;
    let body: Value = reqwest::Client::new()
        .post(format!("{}/api/analyze", base))
        .json(&json!({"topic": "Smart Modular Storage System"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let titles: Vec<&str> = body["sections"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["title"].as_str().unwrap())
        .collect();
    assert_eq!(
        titles,
        vec![
            "🎯 Market Analysis",
            "🔧 Technical Assessment",
            "📊 Feasibility Evaluation"
        ]
    );
    assert_eq!(body["sections"][1]["markdown"], "- Technology Specialist view");
}

#[tokio::test]
async fn stream_sends_progress_then_result() {
    let (base, _) = serve(false).await;
    let text = reqwest::Client::new()
        .get(format!("{}/api/analyze/stream", base))
        .query(&[("topic", "Smart Modular Storage System")])
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    let progress = text.find("event: progress").unwrap();
    let result = text.find("event: result").unwrap();
    assert!(progress < result);
    assert!(text.contains("task_started"));
    assert!(!text.contains("event: failure"));
}

#[tokio::test]
async fn failures_are_reported_and_server_keeps_serving() {
    let (base, _) = serve(true).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/api/analyze", base))
        .json(&json!({"topic": "Smart Modular Storage System"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 500);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("An error occurred:"));

    let text = client
        .get(format!("{}/api/analyze/stream", base))
        .query(&[("topic", "Smart Modular Storage System")])
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(text.contains("event: failure"));
    assert!(text.contains("API key rejected"));

    let health = client.get(format!("{}/health", base)).send().await.unwrap();
    assert!(health.status().is_success());
}
