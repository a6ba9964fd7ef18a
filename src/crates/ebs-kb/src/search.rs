//! Epsilon-thresholded recall over the knowledge base (§4.13).
//!
//! A query is only useful if it lands near *some* prior record; rather than a fixed
//! distance cutoff, the threshold scales with how spread out the indexed population
//! already is, via the same adaptive-bandwidth estimator the evolution step uses.

use ndarray::Array2;
use serde::Serialize;

use crate::error::KbError;
use crate::kb::KnowledgeBase;
use crate::record::Record;

/// Used when fewer than two embedded records exist to estimate a population spread
/// from — a fixed high-dimensional default rather than refusing to search at all.
const DEFAULT_EPSILON: f64 = 10.0;
const CONTENT_SNIPPET_LEN: usize = 300;

#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub title: String,
    #[serde(rename = "type")]
    pub record_type: &'static str,
    pub content: String,
    pub tags: Vec<String>,
    pub distance: Option<f64>,
    pub relevance: f64,
}

impl KnowledgeBase {
    /// Returns up to `limit` records ranked by ascending embedding distance, falling
    /// back to a case-insensitive substring match when no query embedding is
    /// available (the embed call failed, or returned an empty vector).
    pub async fn search_experiences(
        &self,
        query: &str,
        limit: usize,
        epsilon_threshold: f64,
    ) -> Result<Vec<SearchResult>, KbError> {
        let entries = self.read_all().await?;
        let query_embedding = self.try_embed(query).await;

        let Some(query_embedding) = query_embedding else {
            return Ok(substring_search(&entries_into_records(entries), query, limit));
        };

        let mut embedded = Vec::new();
        for (path, record) in entries {
            if let Some(embedding) = record.embedding.clone() {
                embedded.push((record, embedding));
            } else {
                match self.migrate_embedding(&path, record).await {
                    Ok(migrated) => {
                        if let Some(embedding) = migrated.embedding.clone() {
                            embedded.push((migrated, embedding));
                        }
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "lazy embedding migration failed, skipping record");
                    }
                }
            }
        }

        if embedded.is_empty() {
            return Ok(Vec::new());
        }

        let epsilon = estimate_population_epsilon(&embedded);
        let distance_threshold = epsilon_threshold * epsilon;

        let mut scored: Vec<(f64, Record)> = embedded
            .into_iter()
            .map(|(record, embedding)| (euclidean_distance(&query_embedding, &embedding), record))
            .filter(|(distance, _)| *distance < distance_threshold)
            .collect();
        scored.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);

        Ok(scored
            .into_iter()
            .map(|(distance, record)| to_result(record, Some(distance), relevance_from_distance(distance, distance_threshold)))
            .collect())
    }
}

fn entries_into_records(entries: Vec<(std::path::PathBuf, Record)>) -> Vec<Record> {
    entries.into_iter().map(|(_, record)| record).collect()
}

fn substring_search(records: &[Record], query: &str, limit: usize) -> Vec<SearchResult> {
    let needle = query.to_lowercase();
    records
        .iter()
        .filter(|record| {
            record.title.to_lowercase().contains(&needle)
                || record.content.to_lowercase().contains(&needle)
                || record.tags.iter().any(|tag| tag.to_lowercase().contains(&needle))
        })
        .take(limit)
        .cloned()
        .map(|record| to_result(record, None, 1.0))
        .collect()
}

fn to_result(record: Record, distance: Option<f64>, relevance: f64) -> SearchResult {
    let content: String = record.content.chars().take(CONTENT_SNIPPET_LEN).collect();
    SearchResult {
        title: record.title,
        record_type: record.record_type.as_filename_segment(),
        content,
        tags: record.tags,
        distance,
        relevance,
    }
}

fn relevance_from_distance(distance: f64, threshold: f64) -> f64 {
    if threshold <= 0.0 {
        return 0.0;
    }
    (1.0 - distance / threshold).clamp(0.0, 1.0)
}

fn euclidean_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

fn estimate_population_epsilon(embedded: &[(Record, Vec<f64>)]) -> f64 {
    if embedded.len() < 2 {
        return DEFAULT_EPSILON;
    }
    let dim = embedded[0].1.len();
    if embedded.iter().any(|(_, e)| e.len() != dim) {
        return DEFAULT_EPSILON;
    }
    let mut matrix = Array2::<f64>::zeros((embedded.len(), dim));
    for (row, (_, embedding)) in embedded.iter().enumerate() {
        for (col, value) in embedding.iter().enumerate() {
            matrix[[row, col]] = *value;
        }
    }
    ebs_math::estimate_bandwidth(&matrix, None)
}
