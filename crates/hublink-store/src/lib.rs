//! Persistence layer for the Hublink bridge.
//!
//! Records are addressed by composite association tags (scope + key). The
//! `AssociationStore` trait is the host KV capability; `BridgeStore` layers
//! the domain operations (repo↔room links, access tokens, event
//! subscriptions, pagination replay memory) on top of it.

pub mod association;
pub mod association_store;
pub mod bridge_store;
pub mod file_store;

pub use association::{AssociationScope, AssociationTag};
pub use association_store::{AssociationStore, MemoryAssociationStore};
pub use bridge_store::{BridgeStore, ReplayCommand};
pub use file_store::FileAssociationStore;
