use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::contract::model::{HoloMember, HoloMemberPatch, NewHoloMember};
use crate::domain::merge::MergeError;

/// Result of a fetch-merge-write update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated(HoloMember),
    NotFound,
    /// The merged record broke a domain rule; nothing was written.
    Rejected(MergeError),
    /// Storage refused the write (constraint violation and the like).
    StorageRejected(String),
}

/// Port for the domain layer: persistence operations the domain needs.
/// Object-safe and async-friendly via `async_trait`.
///
/// A missing row is reported as `None` / `NotFound`, never as an error.
#[async_trait]
pub trait HoloMemberRepository: Send + Sync {
    /// Load a member by id.
    async fn find_by_id(&self, id: i32) -> anyhow::Result<Option<HoloMember>>;

    /// Every member, ordered by id.
    async fn list_all(&self) -> anyhow::Result<Vec<HoloMember>>;

    /// Insert a new row stamped with `at`; storage assigns the id.
    async fn insert(&self, new: NewHoloMember, at: DateTime<Utc>) -> anyhow::Result<HoloMember>;

    /// Fetch the row, merge `patch` over it and write the result, atomically.
    async fn update(
        &self,
        id: i32,
        patch: &HoloMemberPatch,
        at: DateTime<Utc>,
    ) -> anyhow::Result<UpdateOutcome>;

    /// Delete by id, returning the id when a row existed.
    async fn delete(&self, id: i32) -> anyhow::Result<Option<i32>>;
}
