//! Analysis Service: answer catalog questions about the rendered document.
//!
//! The service owns the three pieces built at startup (the rendered
//! [`DocumentImages`], the [`ContextStore`], and a [`ModelClient`]) and
//! composes them per question: look up question and context, build the
//! prompt, send it with every page image, time the round trip.
//!
//! Every failure (unknown id, exhausted retries, malformed model response)
//! becomes a `failed` [`AnalysisResult`]; nothing escapes to the caller.

use crate::catalog::{self, Question};
use crate::config::ServiceConfig;
use crate::context::ContextStore;
use crate::error::ComplianceError;
use crate::output::{
    format_timestamp, round_secs, AnalysisResult, AnalysisStatus, QuestionInfo, ServiceStatus,
};
use crate::pipeline::llm::{HttpModelClient, ModelClient};
use crate::pipeline::render::{render_document, DocumentImages};
use crate::prompts::build_analysis_prompt;
use futures::stream::{self, StreamExt};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Question text reported when the id is not in the catalog.
pub const UNKNOWN_QUESTION: &str = "Unknown";

/// Composes document, contexts and model client into per-question answers.
pub struct AnalysisService<M = HttpModelClient> {
    document: DocumentImages,
    contexts: ContextStore,
    model: M,
    batch_concurrency: usize,
    processed: AtomicU64,
}

impl AnalysisService<HttpModelClient> {
    /// Load contexts, render the document and build the HTTP model client.
    ///
    /// # Errors
    /// Any document or rendering error is fatal: the service cannot start
    /// without its page images. Context loading never fails.
    pub async fn from_config(config: &ServiceConfig) -> Result<Self, ComplianceError> {
        let contexts = ContextStore::load(&config.context_path);
        let document = render_document(&config.pdf_path, config.dpi).await?;
        let model = HttpModelClient::new(config)?;

        info!(
            "Analysis service ready: {} pages, {} contexts ({:?})",
            document.page_count(),
            contexts.len(),
            contexts.source()
        );

        Ok(Self::new(document, contexts, model).with_batch_concurrency(config.batch_concurrency))
    }
}

impl<M: ModelClient> AnalysisService<M> {
    pub fn new(document: DocumentImages, contexts: ContextStore, model: M) -> Self {
        Self {
            document,
            contexts,
            model,
            batch_concurrency: 1,
            processed: AtomicU64::new(0),
        }
    }

    /// Questions in flight at once during [`Self::analyze_batch`]; `1` is
    /// strictly sequential.
    pub fn with_batch_concurrency(mut self, n: usize) -> Self {
        self.batch_concurrency = n.max(1);
        self
    }

    /// Answer one question. Always returns a record.
    pub async fn analyze(&self, qid: u32) -> AnalysisResult {
        let start = Instant::now();
        let outcome = self.try_analyze(qid).await;
        let processing_time = round_secs(start.elapsed().as_secs_f64());
        self.processed.fetch_add(1, Ordering::Relaxed);

        let pdf_path = Some(self.document.path().display().to_string());

        match outcome {
            Ok((question, context, answer)) => {
                info!("Question {} answered in {:.2}s", qid, processing_time);
                AnalysisResult {
                    qid,
                    question: question.text.to_string(),
                    context: context.to_string(),
                    answer,
                    status: AnalysisStatus::Success,
                    processing_time,
                    timestamp: format_timestamp(),
                    pdf_path,
                }
            }
            Err(e) => {
                warn!("Question {} failed after {:.2}s: {}", qid, processing_time, e);
                AnalysisResult {
                    qid,
                    question: catalog::get(qid)
                        .map(|q| q.text)
                        .unwrap_or(UNKNOWN_QUESTION)
                        .to_string(),
                    context: self.contexts.get_or_sentinel(qid).to_string(),
                    answer: format!("Error: {e}"),
                    status: AnalysisStatus::Failed,
                    processing_time,
                    timestamp: format_timestamp(),
                    pdf_path,
                }
            }
        }
    }

    async fn try_analyze(
        &self,
        qid: u32,
    ) -> Result<(&'static Question, &str, String), ComplianceError> {
        let question = catalog::get(qid).ok_or(ComplianceError::UnknownQuestion(qid))?;
        let context = self.contexts.get_or_sentinel(qid);

        let prompt = build_analysis_prompt(question.text, context);
        debug!(
            "Question {}: prompt {} chars, {} images",
            qid,
            prompt.len(),
            self.document.page_count()
        );

        let answer = self.model.complete(&prompt, self.document.pages()).await?;
        Ok((question, context, answer))
    }

    /// Answer several questions, in input order.
    ///
    /// Ids outside the catalog are logged and dropped; no placeholder record
    /// is produced for them. Duplicates are answered each time they appear.
    pub async fn analyze_batch(&self, qids: &[u32]) -> Vec<AnalysisResult> {
        let valid: Vec<u32> = qids
            .iter()
            .copied()
            .filter(|&qid| {
                let known = catalog::contains(qid);
                if !known {
                    warn!("Invalid question ID: {}", qid);
                }
                known
            })
            .collect();

        info!(
            "Batch of {} questions ({} skipped), concurrency {}",
            valid.len(),
            qids.len() - valid.len(),
            self.batch_concurrency
        );

        if self.batch_concurrency <= 1 {
            let mut results = Vec::with_capacity(valid.len());
            for qid in valid {
                results.push(self.analyze(qid).await);
            }
            results
        } else {
            // `buffered` yields in input order regardless of completion order.
            stream::iter(valid.into_iter().map(|qid| self.analyze(qid)))
                .buffered(self.batch_concurrency)
                .collect()
                .await
        }
    }

    /// Status snapshot. A service only exists once its document rendered,
    /// so the document counts as loaded even when it has no pages.
    pub fn status(&self) -> ServiceStatus {
        ServiceStatus {
            document_loaded: true,
            document_pages: self.document.page_count(),
            total_questions: catalog::QUESTION_COUNT,
            processed_questions: self.processed_questions(),
            api_status: "ready".to_string(),
            last_update: format_timestamp(),
        }
    }

    /// Every catalog question with whether a context entry exists for it.
    pub fn questions(&self) -> Vec<QuestionInfo> {
        catalog::QUESTIONS
            .iter()
            .map(|q| QuestionInfo {
                qid: q.qid,
                question: q.text.to_string(),
                has_context: self.contexts.contains(q.qid),
            })
            .collect()
    }

    /// Analyses performed since startup, failed ones included.
    pub fn processed_questions(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }

    pub fn document(&self) -> &DocumentImages {
        &self.document
    }

    pub fn contexts(&self) -> &ContextStore {
        &self.contexts
    }
}
