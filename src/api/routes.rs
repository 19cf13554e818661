//! Route handlers and request/response DTOs.

use std::sync::Arc;

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{de::Error as _, Deserialize, Deserializer, Serialize};
use serde_json::{json, Number, Value};
use tracing::info;

use crate::api::error::{AppError, AppResult};
use crate::catalog;
use crate::output::{format_timestamp, AnalysisResult, QuestionInfo, ServiceStatus};
use crate::pipeline::llm::ModelClient;
use crate::service::AnalysisService;

/// Shared handler state.
pub type SharedService<M> = Arc<AnalysisService<M>>;

/// Request payload for `POST /analyze/single`.
#[derive(Debug, Deserialize)]
pub struct SingleAnalysisRequest {
    /// Question id, 1–20. `3.0` is accepted as `3`.
    #[serde(deserialize_with = "integral_id")]
    pub qid: i64,
}

/// Request payload for `POST /analyze/batch`.
#[derive(Debug, Default, Deserialize)]
pub struct BatchAnalysisRequest {
    /// Question ids; empty means every catalog question.
    #[serde(default, deserialize_with = "integral_ids")]
    pub qids: Vec<i64>,
}

/// Response payload for `GET /questions`.
#[derive(Debug, Serialize, Deserialize)]
pub struct QuestionsResponse {
    pub total: usize,
    pub questions: Vec<QuestionInfo>,
}

/// Handler: GET /
pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "Regulatory compliance analysis API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "single_analysis": "POST /analyze/single",
            "batch_analysis": "POST /analyze/batch",
            "questions": "GET /questions",
            "status": "GET /status",
            "health": "GET /health"
        }
    }))
}

/// Handler: GET /status
pub async fn status<M: ModelClient + 'static>(
    State(service): State<SharedService<M>>,
) -> Json<ServiceStatus> {
    Json(service.status())
}

/// Handler: GET /questions
pub async fn questions<M: ModelClient + 'static>(
    State(service): State<SharedService<M>>,
) -> Json<QuestionsResponse> {
    let questions = service.questions();
    Json(QuestionsResponse {
        total: questions.len(),
        questions,
    })
}

/// Handler: POST /analyze/single
///
/// # Example
/// ```bash
/// curl -X POST http://127.0.0.1:8000/analyze/single \
///   -H 'content-type: application/json' \
///   -d '{"qid": 3}'
/// ```
pub async fn analyze_single<M: ModelClient + 'static>(
    State(service): State<SharedService<M>>,
    payload: Result<Json<SingleAnalysisRequest>, JsonRejection>,
) -> AppResult<Json<AnalysisResult>> {
    let Json(body) = payload?;
    let qid = checked_qid(body.qid).ok_or_else(|| {
        AppError::BadRequest(format!(
            "Question ID must be between {} and {}",
            catalog::MIN_QID,
            catalog::MAX_QID
        ))
    })?;

    info!("POST /analyze/single qid={}", qid);
    Ok(Json(service.analyze(qid).await))
}

/// Handler: POST /analyze/batch
///
/// An empty (or absent) `qids` list analyses the whole catalog in id order.
pub async fn analyze_batch<M: ModelClient + 'static>(
    State(service): State<SharedService<M>>,
    payload: Result<Json<BatchAnalysisRequest>, JsonRejection>,
) -> AppResult<Json<Vec<AnalysisResult>>> {
    let Json(body) = payload?;

    let invalid: Vec<i64> = body
        .qids
        .iter()
        .copied()
        .filter(|&q| !catalog::in_range(q))
        .collect();
    if !invalid.is_empty() {
        return Err(AppError::BadRequest(format!(
            "Invalid question IDs: {:?}, must be between {} and {}",
            invalid,
            catalog::MIN_QID,
            catalog::MAX_QID
        )));
    }

    let qids: Vec<u32> = if body.qids.is_empty() {
        catalog::all_ids()
    } else {
        body.qids.iter().filter_map(|&q| checked_qid(q)).collect()
    };

    info!("POST /analyze/batch {} questions", qids.len());
    Ok(Json(service.analyze_batch(&qids).await))
}

/// Handler: GET /health
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy", "timestamp": format_timestamp() }))
}

/// A JSON number with no fractional part, as `i64`.
fn integral_value(n: &Number) -> Option<i64> {
    if let Some(i) = n.as_i64() {
        return Some(i);
    }
    let f = n.as_f64()?;
    (f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64)
        .then_some(f as i64)
}

fn integral_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let n = Number::deserialize(deserializer)?;
    integral_value(&n)
        .ok_or_else(|| D::Error::custom(format!("question id must be an integer, got {n}")))
}

fn integral_ids<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<i64>, D::Error> {
    Vec::<Number>::deserialize(deserializer)?
        .iter()
        .map(|n| {
            integral_value(n)
                .ok_or_else(|| D::Error::custom(format!("question id must be an integer, got {n}")))
        })
        .collect()
}

fn checked_qid(raw: i64) -> Option<u32> {
    if catalog::in_range(raw) {
        u32::try_from(raw).ok()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qid_bounds() {
        assert_eq!(checked_qid(1), Some(1));
        assert_eq!(checked_qid(20), Some(20));
        assert_eq!(checked_qid(0), None);
        assert_eq!(checked_qid(-5), None);
        assert_eq!(checked_qid(i64::MAX), None);
    }

    #[test]
    fn batch_request_defaults_to_empty() {
        let req: BatchAnalysisRequest = serde_json::from_str("{}").unwrap();
        assert!(req.qids.is_empty());
    }

    #[test]
    fn integral_floats_are_accepted_as_ids() {
        let req: SingleAnalysisRequest = serde_json::from_str(r#"{"qid": 3.0}"#).unwrap();
        assert_eq!(req.qid, 3);

        let req: BatchAnalysisRequest = serde_json::from_str(r#"{"qids": [1.0, 2, 20.0]}"#).unwrap();
        assert_eq!(req.qids, vec![1, 2, 20]);
    }

    #[test]
    fn fractional_and_non_numeric_ids_are_rejected() {
        assert!(serde_json::from_str::<SingleAnalysisRequest>(r#"{"qid": 3.5}"#).is_err());
        assert!(serde_json::from_str::<SingleAnalysisRequest>(r#"{"qid": "3"}"#).is_err());
        assert!(serde_json::from_str::<BatchAnalysisRequest>(r#"{"qids": [1, 2.25]}"#).is_err());
    }

    #[test]
    fn unknown_request_fields_are_ignored() {
        let req: SingleAnalysisRequest =
            serde_json::from_str(r#"{"qid": 4, "pdf_path": "x.pdf"}"#).unwrap();
        assert_eq!(req.qid, 4);
    }
}
