//! JSON-state-file backed association store with atomic persistence.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use hublink_core::write_text_atomic;

use crate::association::{association_set_key, tags_match, AssociationTag};
use crate::association_store::AssociationStore;

pub const ASSOCIATION_STATE_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedAssociationRecord {
    tags: Vec<AssociationTag>,
    value: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct AssociationStateFile {
    schema_version: u32,
    #[serde(default)]
    records: BTreeMap<String, PersistedAssociationRecord>,
}

impl Default for AssociationStateFile {
    fn default() -> Self {
        Self {
            schema_version: ASSOCIATION_STATE_SCHEMA_VERSION,
            records: BTreeMap::new(),
        }
    }
}

/// File-backed association store. Every mutation rewrites the state file
/// atomically, so a crash never leaves partial records behind.
pub struct FileAssociationStore {
    path: PathBuf,
    state: Mutex<AssociationStateFile>,
}

impl FileAssociationStore {
    /// Loads persisted state, starting fresh (with a diagnostic) on parse or
    /// schema mismatch rather than refusing to serve.
    pub fn load(path: PathBuf) -> Result<Self> {
        let mut state = if path.exists() {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read state file {}", path.display()))?;
            match serde_json::from_str::<AssociationStateFile>(&raw) {
                Ok(state) => state,
                Err(error) => {
                    eprintln!(
                        "failed to parse association state file {}: {} (starting fresh)",
                        path.display(),
                        error
                    );
                    AssociationStateFile::default()
                }
            }
        } else {
            AssociationStateFile::default()
        };

        if state.schema_version != ASSOCIATION_STATE_SCHEMA_VERSION {
            eprintln!(
                "unsupported association state schema: expected {}, found {} (starting fresh)",
                ASSOCIATION_STATE_SCHEMA_VERSION, state.schema_version
            );
            state = AssociationStateFile::default();
        }

        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    fn save_locked(&self, state: &AssociationStateFile) -> Result<()> {
        let mut payload =
            serde_json::to_string_pretty(state).context("failed to serialize association state")?;
        payload.push('\n');
        write_text_atomic(&self.path, &payload)
            .with_context(|| format!("failed to write state file {}", self.path.display()))
    }
}

#[async_trait]
impl AssociationStore for FileAssociationStore {
    async fn read_matching(&self, tags: &[AssociationTag]) -> Result<Vec<Value>> {
        let state = self
            .state
            .lock()
            .map_err(|_| anyhow!("association state mutex is poisoned"))?;
        Ok(state
            .records
            .values()
            .filter(|record| tags_match(&record.tags, tags))
            .map(|record| record.value.clone())
            .collect())
    }

    async fn upsert(&self, tags: &[AssociationTag], value: Value) -> Result<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| anyhow!("association state mutex is poisoned"))?;
        state.records.insert(
            association_set_key(tags),
            PersistedAssociationRecord {
                tags: tags.to_vec(),
                value,
            },
        );
        self.save_locked(&state)
    }

    async fn remove_matching(&self, tags: &[AssociationTag]) -> Result<u64> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| anyhow!("association state mutex is poisoned"))?;
        let before = state.records.len();
        state.records.retain(|_, record| !tags_match(&record.tags, tags));
        let removed = (before - state.records.len()) as u64;
        if removed > 0 {
            self.save_locked(&state)?;
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::tempdir;

    use super::FileAssociationStore;
    use crate::association::AssociationTag;
    use crate::association_store::AssociationStore;

    #[tokio::test]
    async fn integration_file_store_round_trips_records_across_reloads() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("bridge/associations.json");

        {
            let store = FileAssociationStore::load(path.clone()).expect("load fresh");
            store
                .upsert(
                    &[
                        AssociationTag::room("r1"),
                        AssociationTag::misc("repo:owner/repo"),
                    ],
                    json!({"repo_slug": "owner/repo", "room_id": "r1"}),
                )
                .await
                .expect("upsert");
        }

        let reloaded = FileAssociationStore::load(path).expect("reload");
        let rows = reloaded
            .read_matching(&[AssociationTag::misc("repo:owner/repo")])
            .await
            .expect("read");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["room_id"], "r1");
    }

    #[tokio::test]
    async fn regression_corrupt_state_file_starts_fresh_instead_of_failing() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("associations.json");
        std::fs::write(&path, "{not json").expect("write corrupt");

        let store = FileAssociationStore::load(path).expect("load despite corruption");
        let rows = store
            .read_matching(&[AssociationTag::misc("repo:owner/repo")])
            .await
            .expect("read");
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn unit_remove_matching_persists_the_deletion() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("associations.json");

        let store = FileAssociationStore::load(path.clone()).expect("load");
        store
            .upsert(
                &[AssociationTag::user("u1"), AssociationTag::misc("github-key")],
                json!({"access_token": "tok"}),
            )
            .await
            .expect("upsert");
        let removed = store
            .remove_matching(&[AssociationTag::user("u1")])
            .await
            .expect("remove");
        assert_eq!(removed, 1);

        let reloaded = FileAssociationStore::load(path).expect("reload");
        let rows = reloaded
            .read_matching(&[AssociationTag::user("u1")])
            .await
            .expect("read");
        assert!(rows.is_empty());
    }
}
