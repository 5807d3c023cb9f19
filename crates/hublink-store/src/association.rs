//! Composite association tags addressing persisted bridge records.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssociationScope {
    Room,
    User,
    Misc,
}

impl AssociationScope {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Room => "room",
            Self::User => "user",
            Self::Misc => "misc",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssociationTag {
    pub scope: AssociationScope,
    pub key: String,
}

impl AssociationTag {
    pub fn new(scope: AssociationScope, key: impl Into<String>) -> Self {
        Self {
            scope,
            key: key.into(),
        }
    }

    pub fn room(room_id: impl Into<String>) -> Self {
        Self::new(AssociationScope::Room, room_id)
    }

    pub fn user(user_id: impl Into<String>) -> Self {
        Self::new(AssociationScope::User, user_id)
    }

    pub fn misc(key: impl Into<String>) -> Self {
        Self::new(AssociationScope::Misc, key)
    }
}

/// Canonical key for an exact tag set. Order-insensitive: the same tags in
/// any order address the same record.
pub fn association_set_key(tags: &[AssociationTag]) -> String {
    let mut parts = tags
        .iter()
        .map(|tag| format!("{}:{}", tag.scope.as_str(), tag.key))
        .collect::<Vec<_>>();
    parts.sort();
    parts.dedup();
    parts.join("|")
}

/// True when `record_tags` contains every tag in `query` (subset match, the
/// read semantics of the host association store).
pub fn tags_match(record_tags: &[AssociationTag], query: &[AssociationTag]) -> bool {
    query.iter().all(|tag| record_tags.contains(tag))
}

#[cfg(test)]
mod tests {
    use super::{association_set_key, tags_match, AssociationTag};

    #[test]
    fn unit_association_set_key_is_order_insensitive() {
        let forward = association_set_key(&[
            AssociationTag::user("u1"),
            AssociationTag::misc("github-key"),
        ]);
        let reverse = association_set_key(&[
            AssociationTag::misc("github-key"),
            AssociationTag::user("u1"),
        ]);
        assert_eq!(forward, reverse);
        assert_eq!(forward, "misc:github-key|user:u1");
    }

    #[test]
    fn unit_tags_match_requires_every_query_tag() {
        let record = vec![
            AssociationTag::room("r1"),
            AssociationTag::misc("repo:owner/repo"),
        ];
        assert!(tags_match(&record, &[AssociationTag::misc("repo:owner/repo")]));
        assert!(tags_match(&record, &record));
        assert!(!tags_match(&record, &[AssociationTag::user("u1")]));
    }
}
