//! Context Store: question id → reference text snippet.
//!
//! The mapping is read once from a JSON object such as
//! `{"1": "...", "2": "...", ..., "20": "..."}`. Loading is all-or-nothing:
//! if the file is missing, unreadable, not a string-to-string object, or lacks
//! any catalog id, the whole table is replaced by synthetic defaults. Nothing
//! in here ever fails past [`ContextStore::load`].

use crate::catalog;
use std::collections::HashMap;
use std::path::Path;
use tracing::{error, info, warn};

/// Text used when a question has no context entry.
pub const CONTEXT_NOT_AVAILABLE: &str = "Context not available";

/// Where the loaded table came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextSource {
    /// Every catalog id was present in the JSON file.
    File,
    /// The file was missing or invalid; defaults were synthesised.
    Defaults,
}

/// Read-only table of reference contexts, built once at startup.
#[derive(Debug, Clone)]
pub struct ContextStore {
    contexts: HashMap<String, String>,
    source: ContextSource,
}

impl ContextStore {
    /// Load the mapping at `path`, degrading to [`ContextStore::defaults`]
    /// on any problem.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            warn!(
                "JSON file not found: {}. Using default contexts.",
                path.display()
            );
            return Self::defaults();
        }

        match read_mapping(path) {
            Ok(contexts) => {
                info!("Loaded {} question contexts from {}", contexts.len(), path.display());
                Self {
                    contexts,
                    source: ContextSource::File,
                }
            }
            Err(reason) => {
                error!("Error loading question contexts: {}", reason);
                Self::defaults()
            }
        }
    }

    /// Synthetic table: `"Default context for question {i}"` for every id.
    pub fn defaults() -> Self {
        let contexts = catalog::QUESTIONS
            .iter()
            .map(|q| (q.qid.to_string(), default_context(q.qid)))
            .collect();
        Self {
            contexts,
            source: ContextSource::Defaults,
        }
    }

    /// Build a store from an in-memory map without validation.
    pub fn from_map(contexts: HashMap<String, String>) -> Self {
        Self {
            contexts,
            source: ContextSource::File,
        }
    }

    /// Context text for `qid`, if present.
    pub fn get(&self, qid: u32) -> Option<&str> {
        self.contexts.get(&qid.to_string()).map(String::as_str)
    }

    /// Context text for `qid`, or [`CONTEXT_NOT_AVAILABLE`].
    pub fn get_or_sentinel(&self, qid: u32) -> &str {
        self.get(qid).unwrap_or(CONTEXT_NOT_AVAILABLE)
    }

    pub fn contains(&self, qid: u32) -> bool {
        self.contexts.contains_key(&qid.to_string())
    }

    pub fn source(&self) -> ContextSource {
        self.source
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    /// The underlying table.
    pub fn as_map(&self) -> &HashMap<String, String> {
        &self.contexts
    }
}

fn default_context(qid: u32) -> String {
    format!("Default context for question {qid}")
}

/// Read and validate the JSON mapping. Any error is reported as a message.
fn read_mapping(path: &Path) -> Result<HashMap<String, String>, String> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| format!("reading {}: {e}", path.display()))?;
    let contexts: HashMap<String, String> =
        serde_json::from_str(&raw).map_err(|e| format!("parsing {}: {e}", path.display()))?;

    for qid in catalog::MIN_QID..=catalog::MAX_QID {
        if !contexts.contains_key(&qid.to_string()) {
            error!("Missing context for question ID {} in JSON file.", qid);
            return Err(format!("Missing context for question ID {qid}"));
        }
    }

    Ok(contexts)
}
