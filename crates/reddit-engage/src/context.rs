//! Engagement Context
//!
//! Everything one engagement session accumulates: fetched posts, the user's
//! selection, generated responses and digest status. Handlers load a context,
//! apply one step and save it back.
//!
//! | step | reads | writes |
//! |---|---|---|
//! | fetch | - | posts (clears selection and responses) |
//! | select | posts | selection (clears responses) |
//! | generate | selection | analysis, report |
//! | digest | report, analysis | `email_sent` |

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngageError, Result};
use crate::extract::ExtractionReport;
use crate::model::Post;

/// Unique engagement context identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContextId(String);

impl ContextId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ContextId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ContextId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// State of one engagement session
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EngagementContext {
    pub id: ContextId,

    posts: Vec<Post>,

    /// Indices into `posts`, in selection order
    selected: Vec<usize>,

    /// Raw model reply the responses were extracted from
    analysis: Option<String>,

    report: Option<ExtractionReport>,

    /// Posts the report was generated for
    responded: Vec<Post>,

    pub email_sent: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for EngagementContext {
    fn default() -> Self {
        Self::new()
    }
}

impl EngagementContext {
    pub fn new() -> Self {
        Self::with_id(ContextId::new())
    }

    pub fn with_id(id: ContextId) -> Self {
        let now = Utc::now();
        Self {
            id,
            posts: Vec::new(),
            selected: Vec::new(),
            analysis: None,
            report: None,
            responded: Vec::new(),
            email_sent: false,
            created_at: now,
            updated_at: now,
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    /// Replace the fetched posts. Selection and responses are dropped.
    pub fn set_posts(&mut self, posts: Vec<Post>) {
        self.posts = posts;
        self.selected.clear();
        self.clear_responses();
        self.touch();
    }

    /// Select posts by index. Duplicates are ignored; an out-of-range index
    /// rejects the whole selection.
    pub fn select(&mut self, indices: &[usize]) -> Result<()> {
        if let Some(bad) = indices.iter().find(|&&i| i >= self.posts.len()) {
            return Err(EngageError::InvalidSelection(format!(
                "post index {bad} out of range (have {} posts)",
                self.posts.len()
            )));
        }

        let mut selected = Vec::with_capacity(indices.len());
        for &i in indices {
            if !selected.contains(&i) {
                selected.push(i);
            }
        }
        self.selected = selected;
        self.clear_responses();
        self.touch();
        Ok(())
    }

    /// Select every fetched post
    pub fn select_all(&mut self) {
        self.selected = (0..self.posts.len()).collect();
        self.clear_responses();
        self.touch();
    }

    pub fn selected_indices(&self) -> &[usize] {
        &self.selected
    }

    /// Selected posts, in selection order
    pub fn selected_posts(&self) -> Vec<Post> {
        self.selected
            .iter()
            .filter_map(|&i| self.posts.get(i).cloned())
            .collect()
    }

    /// Store a generation result for `posts`
    pub fn set_responses(&mut self, posts: Vec<Post>, analysis: String, report: ExtractionReport) {
        self.responded = posts;
        self.analysis = Some(analysis);
        self.report = Some(report);
        self.email_sent = false;
        self.touch();
    }

    pub fn clear_responses(&mut self) {
        self.responded.clear();
        self.analysis = None;
        self.report = None;
        self.email_sent = false;
    }

    pub fn has_responses(&self) -> bool {
        self.report.is_some()
    }

    pub fn report(&self) -> Option<&ExtractionReport> {
        self.report.as_ref()
    }

    pub fn analysis(&self) -> Option<&str> {
        self.analysis.as_deref()
    }

    /// Posts the current report covers, index-aligned with its entries
    pub fn responded_posts(&self) -> &[Post] {
        &self.responded
    }

    pub fn mark_email_sent(&mut self) {
        self.email_sent = true;
        self.touch();
    }
}

/// Context store trait for persistence
pub trait ContextStore: Send + Sync {
    fn save(&self, context: &EngagementContext) -> Result<()>;

    fn load(&self, id: &ContextId) -> Result<Option<EngagementContext>>;

    fn delete(&self, id: &ContextId) -> Result<()>;

    /// Most recently updated first
    fn list(&self, limit: usize) -> Result<Vec<EngagementContext>>;

    /// Load or fail with [`EngageError::ContextNotFound`]
    fn require(&self, id: &ContextId) -> Result<EngagementContext> {
        self.load(id)?
            .ok_or_else(|| EngageError::ContextNotFound(id.to_string()))
    }
}

/// In-memory context store
#[derive(Default)]
pub struct MemoryContextStore {
    contexts: RwLock<HashMap<ContextId, EngagementContext>>,
}

impl MemoryContextStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> EngageError {
    EngageError::Agent(agent_core::AgentError::Session(
        "context store lock poisoned".into(),
    ))
}

impl ContextStore for MemoryContextStore {
    fn save(&self, context: &EngagementContext) -> Result<()> {
        self.contexts
            .write()
            .map_err(poisoned)?
            .insert(context.id.clone(), context.clone());
        Ok(())
    }

    fn load(&self, id: &ContextId) -> Result<Option<EngagementContext>> {
        Ok(self.contexts.read().map_err(poisoned)?.get(id).cloned())
    }

    fn delete(&self, id: &ContextId) -> Result<()> {
        self.contexts.write().map_err(poisoned)?.remove(id);
        Ok(())
    }

    fn list(&self, limit: usize) -> Result<Vec<EngagementContext>> {
        let mut result: Vec<_> = self.contexts.read().map_err(poisoned)?.values().cloned().collect();
        result.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        result.truncate(limit);
        Ok(result)
    }
}
