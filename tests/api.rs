//! HTTP API tests: the router served on an ephemeral port, driven by reqwest.

mod common;

use common::{completion, config_for, spawn_app, spawn_mock, two_pages, FixedModel};
use edgequake_compliance::api;
use edgequake_compliance::{
    AnalysisResult, AnalysisService, AnalysisStatus, ContextStore, HttpModelClient,
};
use serde_json::{json, Value};
use std::sync::Arc;

async fn fixed_app(reply: &'static str) -> String {
    let service = AnalysisService::new(two_pages(), ContextStore::defaults(), FixedModel(reply));
    spawn_app(api::router(Arc::new(service), &["*".to_string()])).await
}

#[tokio::test]
async fn empty_batch_analyses_whole_catalog_in_order() {
    let base = fixed_app("OK").await;

    let results: Vec<AnalysisResult> = reqwest::Client::new()
        .post(format!("{base}/analyze/batch"))
        .json(&json!({ "qids": [] }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(results.len(), 20);
    for (i, r) in results.iter().enumerate() {
        assert_eq!(r.qid, i as u32 + 1);
        assert_eq!(r.status, AnalysisStatus::Success);
        assert_eq!(r.answer, "OK");
    }
}

#[tokio::test]
async fn single_analysis_returns_record() {
    let base = fixed_app("Compliant").await;

    let resp = reqwest::Client::new()
        .post(format!("{base}/analyze/single"))
        .json(&json!({ "qid": 12 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["qid"], 12);
    assert_eq!(body["status"], "success");
    assert_eq!(body["answer"], "Compliant");
    assert_eq!(body["context"], "Default context for question 12");
    assert!(body["processing_time"].is_number());
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn out_of_range_ids_are_rejected() {
    let base = fixed_app("OK").await;
    let client = reqwest::Client::new();

    for qid in [0, 21, -3] {
        let resp = client
            .post(format!("{base}/analyze/single"))
            .json(&json!({ "qid": qid }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400, "qid {qid}");
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["error"], "BAD_REQUEST");
    }

    let resp = client
        .post(format!("{base}/analyze/batch"))
        .json(&json!({ "qids": [1, 25, 2] }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert!(body["message"].as_str().unwrap().contains("25"));
}

#[tokio::test]
async fn integral_float_ids_are_accepted() {
    let base = fixed_app("OK").await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base}/analyze/single"))
        .json(&json!({ "qid": 3.0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["qid"], 3);

    let results: Vec<AnalysisResult> = client
        .post(format!("{base}/analyze/batch"))
        .json(&json!({ "qids": [2.0, 7] }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let ids: Vec<u32> = results.iter().map(|r| r.qid).collect();
    assert_eq!(ids, vec![2, 7]);

    let resp = client
        .post(format!("{base}/analyze/single"))
        .json(&json!({ "qid": 3.5 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn malformed_body_is_bad_request() {
    let base = fixed_app("OK").await;
    let resp = reqwest::Client::new()
        .post(format!("{base}/analyze/single"))
        .header("content-type", "application/json")
        .body("{\"qid\": \"three\"}")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn batch_preserves_duplicates_and_order() {
    let base = fixed_app("OK").await;
    let results: Vec<AnalysisResult> = reqwest::Client::new()
        .post(format!("{base}/analyze/batch"))
        .json(&json!({ "qids": [5, 1, 5] }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let ids: Vec<u32> = results.iter().map(|r| r.qid).collect();
    assert_eq!(ids, vec![5, 1, 5]);
}

#[tokio::test]
async fn questions_status_health_and_root() {
    let base = fixed_app("OK").await;
    let client = reqwest::Client::new();

    let questions: Value = client
        .get(format!("{base}/questions"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(questions["total"], 20);
    assert_eq!(questions["questions"].as_array().unwrap().len(), 20);
    assert_eq!(questions["questions"][0]["qid"], 1);
    assert_eq!(questions["questions"][0]["has_context"], true);

    // One analysis so the counter moves.
    client
        .post(format!("{base}/analyze/single"))
        .json(&json!({ "qid": 1 }))
        .send()
        .await
        .unwrap();

    let status: Value = client
        .get(format!("{base}/status"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["document_loaded"], true);
    assert_eq!(status["document_pages"], 2);
    assert_eq!(status["total_questions"], 20);
    assert_eq!(status["processed_questions"], 1);
    assert_eq!(status["api_status"], "ready");

    let health: Value = client
        .get(format!("{base}/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "healthy");
    assert!(health["timestamp"].is_string());

    let root: Value = client
        .get(format!("{base}/"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(root["endpoints"]["batch_analysis"], "POST /analyze/batch");
}

#[tokio::test]
async fn cors_wildcard_allows_any_origin() {
    let base = fixed_app("OK").await;
    let resp = reqwest::Client::new()
        .get(format!("{base}/health"))
        .header("origin", "https://portal.example")
        .send()
        .await
        .unwrap();
    assert_eq!(
        resp.headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}

#[tokio::test]
async fn cors_list_only_echoes_listed_origins() {
    let service = AnalysisService::new(two_pages(), ContextStore::defaults(), FixedModel("OK"));
    let base = spawn_app(api::router(
        Arc::new(service),
        &["https://portal.example".to_string()],
    ))
    .await;
    let client = reqwest::Client::new();

    let allowed = client
        .get(format!("{base}/health"))
        .header("origin", "https://portal.example")
        .send()
        .await
        .unwrap();
    assert_eq!(
        allowed
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("https://portal.example")
    );

    let other = client
        .get(format!("{base}/health"))
        .header("origin", "https://elsewhere.example")
        .send()
        .await
        .unwrap();
    assert!(other.headers().get("access-control-allow-origin").is_none());
}

#[tokio::test]
async fn full_stack_through_http_model_client() {
    let (url, endpoint) = spawn_mock(vec![completion("**Findings:** none")]).await;
    let client = HttpModelClient::new(&config_for(&url, 10)).unwrap();
    let service = AnalysisService::new(two_pages(), ContextStore::defaults(), client);
    let base = spawn_app(api::router(Arc::new(service), &["*".to_string()])).await;

    let results: Vec<AnalysisResult> = reqwest::Client::new()
        .post(format!("{base}/analyze/batch"))
        .json(&json!({ "qids": [1, 2] }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.answer == "**Findings:** none"));
    assert_eq!(endpoint.hits(), 2);
}
