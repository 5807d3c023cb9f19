//! The host KV capability: read/upsert/remove records by association tags.

use std::collections::BTreeMap;
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::Value;

use crate::association::{association_set_key, tags_match, AssociationTag};

#[derive(Debug, Clone)]
pub(crate) struct StoredAssociationRecord {
    pub(crate) tags: Vec<AssociationTag>,
    pub(crate) value: Value,
}

/// Durable association-record store provided by the host runtime.
///
/// Writes are upserts against the exact tag set; reads return every record
/// whose tag set contains all query tags; removes delete matching records
/// and report how many were dropped.
#[async_trait]
pub trait AssociationStore: Send + Sync {
    async fn read_matching(&self, tags: &[AssociationTag]) -> Result<Vec<Value>>;
    async fn upsert(&self, tags: &[AssociationTag], value: Value) -> Result<()>;
    async fn remove_matching(&self, tags: &[AssociationTag]) -> Result<u64>;
}

/// In-memory association store for tests and ephemeral hosts.
#[derive(Default)]
pub struct MemoryAssociationStore {
    records: Mutex<BTreeMap<String, StoredAssociationRecord>>,
}

impl MemoryAssociationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AssociationStore for MemoryAssociationStore {
    async fn read_matching(&self, tags: &[AssociationTag]) -> Result<Vec<Value>> {
        let records = self
            .records
            .lock()
            .map_err(|_| anyhow!("association store mutex is poisoned"))?;
        Ok(records
            .values()
            .filter(|record| tags_match(&record.tags, tags))
            .map(|record| record.value.clone())
            .collect())
    }

    async fn upsert(&self, tags: &[AssociationTag], value: Value) -> Result<()> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| anyhow!("association store mutex is poisoned"))?;
        records.insert(
            association_set_key(tags),
            StoredAssociationRecord {
                tags: tags.to_vec(),
                value,
            },
        );
        Ok(())
    }

    async fn remove_matching(&self, tags: &[AssociationTag]) -> Result<u64> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| anyhow!("association store mutex is poisoned"))?;
        let before = records.len();
        records.retain(|_, record| !tags_match(&record.tags, tags));
        Ok((before - records.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{AssociationStore, MemoryAssociationStore};
    use crate::association::AssociationTag;

    #[tokio::test]
    async fn unit_upsert_overwrites_record_with_same_tag_set() {
        let store = MemoryAssociationStore::new();
        let tags = vec![AssociationTag::user("u1"), AssociationTag::misc("github-key")];
        store
            .upsert(&tags, json!({"access_token": "first"}))
            .await
            .expect("first upsert");
        store
            .upsert(&tags, json!({"access_token": "second"}))
            .await
            .expect("second upsert");

        let rows = store.read_matching(&tags).await.expect("read");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["access_token"], "second");
    }

    #[tokio::test]
    async fn functional_read_matching_uses_subset_semantics() {
        let store = MemoryAssociationStore::new();
        store
            .upsert(
                &[
                    AssociationTag::room("r1"),
                    AssociationTag::misc("repo:owner/repo"),
                ],
                json!({"room_id": "r1"}),
            )
            .await
            .expect("upsert");

        let by_misc_only = store
            .read_matching(&[AssociationTag::misc("repo:owner/repo")])
            .await
            .expect("read");
        assert_eq!(by_misc_only.len(), 1);
        assert_eq!(by_misc_only[0]["room_id"], "r1");

        let miss = store
            .read_matching(&[AssociationTag::misc("repo:other/repo")])
            .await
            .expect("read");
        assert!(miss.is_empty());
    }

    #[tokio::test]
    async fn unit_remove_matching_reports_dropped_count() {
        let store = MemoryAssociationStore::new();
        store
            .upsert(
                &[
                    AssociationTag::room("r1"),
                    AssociationTag::misc("repo:owner/repo"),
                ],
                json!({"room_id": "r1"}),
            )
            .await
            .expect("upsert");

        let removed = store
            .remove_matching(&[AssociationTag::misc("repo:owner/repo")])
            .await
            .expect("remove");
        assert_eq!(removed, 1);
        let removed_again = store
            .remove_matching(&[AssociationTag::misc("repo:owner/repo")])
            .await
            .expect("remove again");
        assert_eq!(removed_again, 0);
    }
}
