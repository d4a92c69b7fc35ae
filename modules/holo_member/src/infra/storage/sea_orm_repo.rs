//! SeaORM-backed repository implementation for the domain port.
//!
//! Generic over the connection so tests can hand it any `DatabaseConnection`.
//! Update and delete run their read and write in one transaction; on Postgres
//! the read also takes a row lock, so a concurrent delete either happens before
//! the read or waits for the commit.

use anyhow::Context;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseTransaction, DbBackend, DbErr, EntityTrait,
    QueryOrder, QuerySelect, TransactionTrait,
};

use crate::contract::model::{HoloMember, HoloMemberPatch, NewHoloMember};
use crate::domain::merge::apply_patch;
use crate::domain::repo::{HoloMemberRepository, UpdateOutcome};
use crate::infra::storage::entity::{Column, Entity as HoloMemberEntity, Model};
use crate::infra::storage::errors::is_rejected_write;
use crate::infra::storage::mapper::{insert_model, update_model};

pub struct SeaOrmHoloMemberRepository<C>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmHoloMemberRepository<C>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }

    async fn find_for_write(
        &self,
        txn: &DatabaseTransaction,
        id: i32,
    ) -> anyhow::Result<Option<Model>> {
        let mut query = HoloMemberEntity::find_by_id(id);
        if txn.get_database_backend() == DbBackend::Postgres {
            query = query.lock_exclusive();
        }
        query.one(txn).await.context("find_for_write failed")
    }
}

fn to_domain(m: Model) -> anyhow::Result<HoloMember> {
    let id = m.id;
    HoloMember::try_from(m).with_context(|| format!("row {id} holds an invalid type"))
}

#[async_trait::async_trait]
impl<C> HoloMemberRepository for SeaOrmHoloMemberRepository<C>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync + 'static,
{
    async fn find_by_id(&self, id: i32) -> anyhow::Result<Option<HoloMember>> {
        let found = HoloMemberEntity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("find_by_id failed")?;
        found.map(to_domain).transpose()
    }

    async fn list_all(&self) -> anyhow::Result<Vec<HoloMember>> {
        let rows = HoloMemberEntity::find()
            .order_by_asc(Column::Id)
            .all(&self.conn)
            .await
            .context("list_all failed")?;
        rows.into_iter().map(to_domain).collect()
    }

    async fn insert(&self, new: NewHoloMember, at: DateTime<Utc>) -> anyhow::Result<HoloMember> {
        let model = insert_model(new, at)
            .insert(&self.conn)
            .await
            .context("insert failed")?;
        to_domain(model)
    }

    async fn update(
        &self,
        id: i32,
        patch: &HoloMemberPatch,
        at: DateTime<Utc>,
    ) -> anyhow::Result<UpdateOutcome> {
        let txn = self.conn.begin().await.context("begin update failed")?;

        let Some(row) = self.find_for_write(&txn, id).await? else {
            txn.rollback().await.context("rollback failed")?;
            return Ok(UpdateOutcome::NotFound);
        };

        let merged = match apply_patch(&to_domain(row)?, patch, at) {
            Ok(m) => m,
            Err(e) => {
                txn.rollback().await.context("rollback failed")?;
                return Ok(UpdateOutcome::Rejected(e));
            }
        };

        match update_model(&merged).update(&txn).await {
            Ok(model) => {
                txn.commit().await.context("commit update failed")?;
                Ok(UpdateOutcome::Updated(to_domain(model)?))
            }
            Err(DbErr::RecordNotUpdated) => {
                txn.rollback().await.context("rollback failed")?;
                Ok(UpdateOutcome::NotFound)
            }
            Err(e) if is_rejected_write(&e) => {
                txn.rollback().await.context("rollback failed")?;
                Ok(UpdateOutcome::StorageRejected(e.to_string()))
            }
            Err(e) => Err(e).context("update failed"),
        }
    }

    async fn delete(&self, id: i32) -> anyhow::Result<Option<i32>> {
        let txn = self.conn.begin().await.context("begin delete failed")?;

        if self.find_for_write(&txn, id).await?.is_none() {
            txn.rollback().await.context("rollback failed")?;
            return Ok(None);
        }

        HoloMemberEntity::delete_by_id(id)
            .exec(&txn)
            .await
            .context("delete failed")?;
        txn.commit().await.context("commit delete failed")?;
        Ok(Some(id))
    }
}
