//! Query planner.
//!
//! A document is a candidate when any of its entries matches any hash of
//! the query (OR semantics). Lookups are always scoped to one tenant.
//! Candidates still need verification against decrypted content.

use std::sync::Arc;

use tracing::debug;

use blindex_storage::Storage;
use blindex_tokens::{TokenPipeline, TokenSet};
use blindex_types::{DocumentId, TenantId};

use crate::error::QueryError;

/// One matched document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub document_id: DocumentId,
    /// How many distinct query hashes the document holds
    pub match_count: u32,
}

/// Candidates ordered by match count (descending), then document id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateSet {
    candidates: Vec<Candidate>,
    query_tokens: usize,
}

impl CandidateSet {
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Candidate> {
        self.candidates.iter()
    }

    pub fn document_ids(&self) -> Vec<DocumentId> {
        self.candidates.iter().map(|c| c.document_id).collect()
    }

    pub fn contains(&self, document_id: DocumentId) -> bool {
        self.candidates.iter().any(|c| c.document_id == document_id)
    }

    /// Number of unique hashes the query planned to.
    pub fn query_token_count(&self) -> usize {
        self.query_tokens
    }

    pub fn into_vec(self) -> Vec<Candidate> {
        self.candidates
    }
}

impl<'a> IntoIterator for &'a CandidateSet {
    type Item = &'a Candidate;
    type IntoIter = std::slice::Iter<'a, Candidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[derive(Clone)]
pub struct QueryPlanner {
    storage: Arc<Storage>,
    pipeline: TokenPipeline,
}

impl QueryPlanner {
    pub fn new(storage: Arc<Storage>, pipeline: TokenPipeline) -> Self {
        Self { storage, pipeline }
    }

    /// Hash the query text. Capped at `max_query_tokens` unique hashes.
    pub fn plan_query(&self, query_text: &str) -> Result<TokenSet, QueryError> {
        Ok(self.pipeline.query_tokens(query_text)?)
    }

    /// Candidate documents of `tenant_id` for `query_text`.
    ///
    /// A query that plans to no hashes (stop words only, too short) returns
    /// an empty set without touching storage.
    pub fn search(
        &self,
        tenant_id: TenantId,
        query_text: &str,
        limit: Option<usize>,
    ) -> Result<CandidateSet, QueryError> {
        let plan = self.plan_query(query_text)?;
        if plan.is_empty() {
            debug!(tenant = %tenant_id, "Query planned to no tokens");
            return Ok(CandidateSet::default());
        }

        let matches = self.storage.lookup(tenant_id, plan.as_slice())?;
        let mut candidates: Vec<Candidate> = matches
            .into_iter()
            .map(|(document_id, match_count)| Candidate {
                document_id,
                match_count,
            })
            .collect();
        candidates.sort_by(|a, b| {
            b.match_count
                .cmp(&a.match_count)
                .then_with(|| a.document_id.cmp(&b.document_id))
        });
        if let Some(limit) = limit {
            candidates.truncate(limit);
        }

        debug!(
            tenant = %tenant_id,
            query_tokens = plan.len(),
            candidates = candidates.len(),
            "Search complete"
        );
        Ok(CandidateSet {
            candidates,
            query_tokens: plan.len(),
        })
    }
}
