use std::sync::Arc;

use chrono::{DateTime, SubsecRound, Utc};
use tracing::{debug, info, instrument, warn};

use crate::contract::model::{HoloMember, HoloMemberPatch, NewHoloMember};
use crate::domain::error::DomainError;
use crate::domain::merge::normalize_age;
use crate::domain::repo::{HoloMemberRepository, UpdateOutcome};

/// Domain service for holo members.
/// Depends only on the repository port, not on infra types.
///
/// Lookups return `Ok(None)` for a missing id; the REST layer decides the status.
#[derive(Clone)]
pub struct Service {
    repo: Arc<dyn HoloMemberRepository>,
}

impl Service {
    pub fn new(repo: Arc<dyn HoloMemberRepository>) -> Self {
        Self { repo }
    }

    #[instrument(name = "holo_member.service.get", skip(self), fields(member_id = id))]
    pub async fn get(&self, id: i32) -> Result<Option<HoloMember>, DomainError> {
        debug!("Getting holo member by id");
        let found = self
            .repo
            .find_by_id(id)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;
        debug!(found = found.is_some(), "Lookup finished");
        Ok(found)
    }

    #[instrument(name = "holo_member.service.list", skip(self))]
    pub async fn list(&self) -> Result<Vec<HoloMember>, DomainError> {
        let all = self
            .repo
            .list_all()
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;
        debug!("Listed {} holo members", all.len());
        Ok(all)
    }

    #[instrument(
        name = "holo_member.service.create",
        skip(self, new),
        fields(generation = %new.generation, name = %new.name)
    )]
    pub async fn create(&self, mut new: NewHoloMember) -> Result<HoloMember, DomainError> {
        info!("Creating new holo member");

        if new.name.trim().is_empty() {
            return Err(DomainError::validation("name", "must not be blank"));
        }
        new.age = normalize_age(new.age).ok_or_else(|| {
            DomainError::validation("age", format!("{} does not fit numeric(10,1)", new.age))
        })?;

        let created = self
            .repo
            .insert(new, now())
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;

        info!(member_id = created.id, "Successfully created holo member");
        Ok(created)
    }

    #[instrument(name = "holo_member.service.update", skip(self, patch), fields(member_id = id))]
    pub async fn update(
        &self,
        id: i32,
        patch: HoloMemberPatch,
    ) -> Result<Option<HoloMember>, DomainError> {
        info!("Updating holo member");

        let outcome = self
            .repo
            .update(id, &patch, now())
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;

        match outcome {
            UpdateOutcome::Updated(member) => {
                info!("Successfully updated holo member");
                Ok(Some(member))
            }
            UpdateOutcome::NotFound => Ok(None),
            UpdateOutcome::Rejected(e) => {
                debug!(error = %e, "Update rejected by merge rules");
                Err(e.into())
            }
            UpdateOutcome::StorageRejected(reason) => {
                warn!(%reason, "Storage rejected update");
                Err(DomainError::invalid_update(reason))
            }
        }
    }

    #[instrument(name = "holo_member.service.delete", skip(self), fields(member_id = id))]
    pub async fn delete(&self, id: i32) -> Result<Option<i32>, DomainError> {
        info!("Deleting holo member");
        let deleted = self
            .repo
            .delete(id)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;
        if deleted.is_some() {
            info!("Successfully deleted holo member");
        }
        Ok(deleted)
    }
}

/// Current time at the microsecond precision every backend stores.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}
