//! Records returned to callers: per-question results, status, and the
//! question listing.

use serde::{Deserialize, Serialize};

/// Outcome of one analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    Success,
    Failed,
}

/// The uniform record produced per question, success or failure alike.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub qid: u32,
    pub question: String,
    pub context: String,
    /// Model output, or `"Error: <message>"` when the analysis failed.
    pub answer: String,
    pub status: AnalysisStatus,
    /// Wall-clock seconds, rounded to two decimals.
    pub processing_time: f64,
    /// Local time, `YYYY-MM-DD HH:MM:SS`.
    pub timestamp: String,
    /// Document the answer refers to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_path: Option<String>,
}

impl AnalysisResult {
    pub fn is_success(&self) -> bool {
        self.status == AnalysisStatus::Success
    }
}

/// Service status snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub document_loaded: bool,
    pub document_pages: usize,
    pub total_questions: usize,
    pub processed_questions: u64,
    pub api_status: String,
    pub last_update: String,
}

/// One entry of the question listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionInfo {
    pub qid: u32,
    pub question: String,
    pub has_context: bool,
}

/// Round seconds to two decimals.
pub fn round_secs(secs: f64) -> f64 {
    (secs * 100.0).round() / 100.0
}

/// Current local time as `YYYY-MM-DD HH:MM:SS`.
pub fn format_timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}
