//! The knowledge base itself: writes, atomic-per-file persistence, and the directory
//! scan [`crate::search`] reads from.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use ebs_llm::InferenceService;
use uuid::Uuid;

use crate::error::KbError;
use crate::filename::build_filename;
use crate::record::{Record, RecordType};

const ARCHIVE_CONTEXT_SNIPPET_LEN: usize = 500;

pub struct KnowledgeBase {
    path: PathBuf,
    inference: Arc<dyn InferenceService>,
}

impl KnowledgeBase {
    /// Opens (creating if needed) a knowledge base rooted at `path`.
    pub async fn open(path: impl Into<PathBuf>, inference: Arc<dyn InferenceService>) -> Result<Self, KbError> {
        let path = path.into();
        tokio::fs::create_dir_all(&path)
            .await
            .map_err(|source| KbError::CreateDir {
                path: path.display().to_string(),
                source,
            })?;
        Ok(KnowledgeBase { path, inference })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A generalisable lesson, success pattern, branching heuristic, or meta-insight
    /// (§4.13). Persisted even if embedding the content fails — a record without a
    /// vector is still useful to substring search and to lazy migration later.
    pub async fn write_experience(
        &self,
        title: impl Into<String>,
        content: impl Into<String>,
        type_str: &str,
        tags: Vec<String>,
        metadata: serde_json::Value,
    ) -> Result<Record, KbError> {
        let record_type = RecordType::from_experience_str(type_str)
            .ok_or_else(|| KbError::InvalidExperienceType(type_str.to_string()))?;
        let title = title.into();
        let content = content.into();

        let embedding = self.try_embed(&content).await;

        let record = Record {
            id: Uuid::new_v4().to_string(),
            title: title.clone(),
            content,
            record_type,
            tags,
            created_at: Utc::now(),
            metadata,
            embedding,
        };

        let filename = build_filename(
            record.created_at,
            record_type.as_filename_segment(),
            &title,
            &short_id(&record.id),
        );
        self.persist(&filename, &record).await?;
        Ok(record)
    }

    /// Archives a hard-pruned branch. Only the synthesis rationale is embedded, not
    /// the full synthesized content — the KB indexes *why* a branch was folded in, not
    /// the report text itself (§4.12).
    pub async fn write_strategy_archive(
        &self,
        strategy_name: impl Into<String>,
        branch_rationale: impl Into<String>,
        final_score: f64,
        synthesis_context: impl Into<String>,
        report_version: u32,
    ) -> Result<Record, KbError> {
        let strategy_name = strategy_name.into();
        let branch_rationale = branch_rationale.into();
        let synthesis_context = synthesis_context.into();
        let snippet: String = synthesis_context
            .chars()
            .take(ARCHIVE_CONTEXT_SNIPPET_LEN)
            .collect();

        let content = serde_json::json!({
            "strategy_name": strategy_name,
            "branch_rationale": branch_rationale,
            "final_score": final_score,
            "synthesis_context": snippet,
            "report_version": report_version,
        })
        .to_string();

        let embedding = self.try_embed(&branch_rationale).await;

        let record = Record {
            id: Uuid::new_v4().to_string(),
            title: strategy_name.clone(),
            content,
            record_type: RecordType::BranchArchive,
            tags: vec!["branch_archive".to_string()],
            created_at: Utc::now(),
            metadata: serde_json::json!({ "report_version": report_version }),
            embedding,
        };

        let filename = build_filename(
            record.created_at,
            RecordType::BranchArchive.as_filename_segment(),
            &strategy_name,
            &short_id(&record.id),
        );
        self.persist(&filename, &record).await?;
        Ok(record)
    }

    /// Reads every record currently on disk. Used by search and by lazy migration.
    pub async fn read_all(&self) -> Result<Vec<(PathBuf, Record)>, KbError> {
        let mut entries = tokio::fs::read_dir(&self.path)
            .await
            .map_err(|source| KbError::Read {
                path: self.path.display().to_string(),
                source,
            })?;

        let mut records = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|source| KbError::Read {
            path: self.path.display().to_string(),
            source,
        })? {
            let file_path = entry.path();
            if file_path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let text = tokio::fs::read_to_string(&file_path)
                .await
                .map_err(|source| KbError::Read {
                    path: file_path.display().to_string(),
                    source,
                })?;
            let record: Record = serde_json::from_str(&text).map_err(|source| KbError::Serde {
                path: file_path.display().to_string(),
                source,
            })?;
            records.push((file_path, record));
        }
        Ok(records)
    }

    /// Persists `record` to a record lacking an embedding (lazy migration), rewriting
    /// it in place at `path`.
    pub async fn migrate_embedding(&self, path: &Path, mut record: Record) -> Result<Record, KbError> {
        let embedding = self.try_embed(&record.content).await;
        record.embedding = embedding;
        let text = serde_json::to_string_pretty(&record).map_err(|source| KbError::Serde {
            path: path.display().to_string(),
            source,
        })?;
        tokio::fs::write(path, text)
            .await
            .map_err(|source| KbError::Write {
                path: path.display().to_string(),
                source,
            })?;
        Ok(record)
    }

    pub(crate) async fn try_embed(&self, text: &str) -> Option<Vec<f64>> {
        let embedding = self.inference.embed(text).await;
        if embedding.is_empty() {
            tracing::warn!("embedding call returned empty vector; persisting record without one");
            None
        } else {
            Some(embedding)
        }
    }

    /// Writes to a fresh, content-addressed filename via a temp-file-then-rename, so
    /// concurrent runs writing distinct records never interleave partial writes
    /// (§5's "atomic-per-file" shared-resource policy).
    async fn persist(&self, filename: &str, record: &Record) -> Result<(), KbError> {
        let final_path = self.path.join(filename);
        let tmp_path = self.path.join(format!("{filename}.tmp"));

        let text = serde_json::to_string_pretty(record).map_err(|source| KbError::Serde {
            path: final_path.display().to_string(),
            source,
        })?;
        tokio::fs::write(&tmp_path, text)
            .await
            .map_err(|source| KbError::Write {
                path: tmp_path.display().to_string(),
                source,
            })?;
        tokio::fs::rename(&tmp_path, &final_path)
            .await
            .map_err(|source| KbError::Rename {
                from: tmp_path.display().to_string(),
                to: final_path.display().to_string(),
                source,
            })?;
        Ok(())
    }
}

fn short_id(id: &str) -> String {
    id.chars().take(8).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ebs_llm::MockInferenceService;

    async fn kb_with_mock() -> (tempfile::TempDir, KnowledgeBase) {
        let dir = tempfile::tempdir().unwrap();
        let inference = Arc::new(MockInferenceService::new(4));
        let kb = KnowledgeBase::open(dir.path(), inference).await.unwrap();
        (dir, kb)
    }

    #[tokio::test]
    async fn write_experience_rejects_unknown_type() {
        let (_dir, kb) = kb_with_mock().await;
        let result = kb
            .write_experience("title", "content", "not_a_real_type", vec![], serde_json::json!({}))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn write_experience_persists_even_when_embedding_fails() {
        let dir = tempfile::tempdir().unwrap();
        let inference = Arc::new(MockInferenceService::new(4).always_fail_embeddings());
        let kb = KnowledgeBase::open(dir.path(), inference).await.unwrap();

        let record = kb
            .write_experience(
                "Lesson",
                "content body",
                "lesson_learned",
                vec!["tag".to_string()],
                serde_json::json!({}),
            )
            .await
            .unwrap();
        assert!(record.embedding.is_none());

        let all = kb.read_all().await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn write_strategy_archive_embeds_only_rationale() {
        let (_dir, kb) = kb_with_mock().await;
        let record = kb
            .write_strategy_archive("strategy-a", "rationale text", 0.8, "x".repeat(1000), 1)
            .await
            .unwrap();
        assert!(record.embedding.is_some());
        assert!(record.content.contains("\"report_version\":1"));
        let parsed: serde_json::Value = serde_json::from_str(&record.content).unwrap();
        assert_eq!(
            parsed["synthesis_context"].as_str().unwrap().len(),
            ARCHIVE_CONTEXT_SNIPPET_LEN
        );
    }

    #[tokio::test]
    async fn filenames_are_unique_per_write() {
        let (_dir, kb) = kb_with_mock().await;
        kb.write_experience("same title", "c1", "lesson_learned", vec![], serde_json::json!({}))
            .await
            .unwrap();
        kb.write_experience("same title", "c2", "lesson_learned", vec![], serde_json::json!({}))
            .await
            .unwrap();
        let all = kb.read_all().await.unwrap();
        assert_eq!(all.len(), 2);
    }
}
