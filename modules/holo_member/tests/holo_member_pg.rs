#![cfg(feature = "integration")]

mod common;

use anyhow::Result;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use sea_orm::{ConnectionTrait, DatabaseConnection, Statement, TransactionTrait};
use sea_orm_migration::MigratorTrait;

use holo_member::contract::model::{GenerationType, HoloMemberPatch, NewHoloMember};
use holo_member::domain::repo::{HoloMemberRepository, UpdateOutcome};
use holo_member::infra::storage::migrations::Migrator;
use holo_member::infra::storage::SeaOrmHoloMemberRepository;

fn pekora() -> NewHoloMember {
    NewHoloMember {
        generation: GenerationType::Gen3,
        name: "Usada Pekora".into(),
        description: "peko".into(),
        twitter: "@usadapekora".into(),
        age: Decimal::new(1110, 1),
    }
}

#[tokio::test]
async fn holo_member_works_with_postgres() -> Result<()> {
    let dut = common::bring_up_postgres().await?;
    let db = modkit_db::DbHandle::connect(&dut.url, modkit_db::ConnectOpts::default()).await?;
    let conn = db.sea();

    Migrator::up(&conn, None)
        .await
        .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;

    test_crud_round_trip(&conn).await?;
    test_trigger_refreshes_updated_at(&conn).await?;
    test_check_constraint_rejects_unknown_type(&conn).await?;
    test_numeric_column_rounds(&conn).await?;
    test_concurrent_update_and_delete(&conn).await?;
    test_delete_waits_for_row_lock(&conn).await?;
    test_update_refused_by_constraint(&conn).await?;

    Migrator::down(&conn, None)
        .await
        .map_err(|e| anyhow::anyhow!("Down migration failed: {}", e))?;

    db.close().await;
    Ok(())
}

async fn test_crud_round_trip(conn: &DatabaseConnection) -> Result<()> {
    let repo = SeaOrmHoloMemberRepository::new(conn.clone());
    let at = Utc::now();

    let created = repo.insert(pekora(), at).await?;
    assert!(created.id >= 1);
    assert_eq!(repo.find_by_id(created.id).await?, Some(created.clone()));

    let patch = HoloMemberPatch {
        name: Some(Some("Pekora".into())),
        ..Default::default()
    };
    let UpdateOutcome::Updated(updated) = repo.update(created.id, &patch, at).await? else {
        anyhow::bail!("expected the update to succeed");
    };
    assert_eq!(updated.name, "Pekora");
    assert_eq!(updated.twitter, created.twitter);

    assert_eq!(repo.delete(created.id).await?, Some(created.id));
    assert_eq!(repo.delete(created.id).await?, None);
    assert_eq!(
        repo.update(created.id, &patch, at).await?,
        UpdateOutcome::NotFound
    );
    Ok(())
}

async fn test_trigger_refreshes_updated_at(conn: &DatabaseConnection) -> Result<()> {
    let repo = SeaOrmHoloMemberRepository::new(conn.clone());
    // Stamped in the past so the trigger's now() is observably later
    let long_ago = Utc::now() - Duration::days(1);
    let created = repo.insert(pekora(), long_ago).await?;

    let patch = HoloMemberPatch {
        description: Some(Some("updated".into())),
        ..Default::default()
    };
    let UpdateOutcome::Updated(updated) = repo.update(created.id, &patch, long_ago).await? else {
        anyhow::bail!("expected the update to succeed");
    };
    assert!(updated.updated_at > long_ago + Duration::hours(1));
    assert!(updated.updated_at >= updated.created_at);
    Ok(())
}

async fn test_check_constraint_rejects_unknown_type(conn: &DatabaseConnection) -> Result<()> {
    let res = conn
        .execute(Statement::from_string(
            conn.get_database_backend(),
            "INSERT INTO holo_member (type, name, twitter, age) VALUES ('Myth', 'Gura', '@gawrgura', 9000)",
        ))
        .await;
    assert!(res.is_err(), "CHECK constraint should reject unknown type");
    Ok(())
}

async fn test_numeric_column_rounds(conn: &DatabaseConnection) -> Result<()> {
    conn.execute(Statement::from_string(
        conn.get_database_backend(),
        "INSERT INTO holo_member (type, name, twitter, age) VALUES ('EN', 'Ame', '@watsonameliaEN', 3.14)",
    ))
    .await?;

    let repo = SeaOrmHoloMemberRepository::new(conn.clone());
    let ame = repo
        .list_all()
        .await?
        .into_iter()
        .find(|m| m.name == "Ame")
        .ok_or_else(|| anyhow::anyhow!("row not found"))?;
    assert_eq!(ame.age, Decimal::new(31, 1));
    assert_eq!(ame.description, "");
    Ok(())
}

async fn test_concurrent_update_and_delete(conn: &DatabaseConnection) -> Result<()> {
    let repo = SeaOrmHoloMemberRepository::new(conn.clone());
    let patch = HoloMemberPatch {
        name: Some(Some("Pekora (racing)".into())),
        ..Default::default()
    };

    for _ in 0..20 {
        let created = repo.insert(pekora(), Utc::now()).await?;
        let id = created.id;

        let (updated, deleted) = tokio::join!(repo.update(id, &patch, Utc::now()), repo.delete(id));
        let (updated, deleted) = (updated?, deleted?);

        // Delete always wins the row in the end; an update either commits
        // first or sees the row already gone
        assert_eq!(deleted, Some(id));
        match updated {
            UpdateOutcome::Updated(m) => assert_eq!(m.id, id),
            UpdateOutcome::NotFound => {}
            other => anyhow::bail!("unexpected outcome for {id}: {other:?}"),
        }
        assert_eq!(repo.find_by_id(id).await?, None);
    }
    Ok(())
}

async fn test_delete_waits_for_row_lock(conn: &DatabaseConnection) -> Result<()> {
    let repo = SeaOrmHoloMemberRepository::new(conn.clone());
    let created = repo.insert(pekora(), Utc::now()).await?;
    let id = created.id;

    let txn = conn.begin().await?;
    txn.execute(Statement::from_string(
        txn.get_database_backend(),
        format!("SELECT id FROM holo_member WHERE id = {id} FOR UPDATE"),
    ))
    .await?;

    let deleting = tokio::spawn({
        let repo = SeaOrmHoloMemberRepository::new(conn.clone());
        async move { repo.delete(id).await }
    });
    tokio::time::sleep(std::time::Duration::from_millis(300)).await;
    assert!(!deleting.is_finished(), "delete must wait for the lock holder");

    txn.execute(Statement::from_string(
        txn.get_database_backend(),
        format!("UPDATE holo_member SET name = 'locked' WHERE id = {id}"),
    ))
    .await?;
    txn.commit().await?;

    assert_eq!(deleting.await??, Some(id));
    assert_eq!(repo.find_by_id(id).await?, None);
    Ok(())
}

async fn test_update_refused_by_constraint(conn: &DatabaseConnection) -> Result<()> {
    let repo = SeaOrmHoloMemberRepository::new(conn.clone());
    let created = repo.insert(pekora(), Utc::now()).await?;

    conn.execute_unprepared(
        "ALTER TABLE holo_member ADD CONSTRAINT twitter_handle CHECK (twitter LIKE '@%') NOT VALID",
    )
    .await?;

    let patch = HoloMemberPatch {
        twitter: Some(Some("pekora".into())),
        ..Default::default()
    };
    let outcome = repo.update(created.id, &patch, Utc::now()).await;

    conn.execute_unprepared("ALTER TABLE holo_member DROP CONSTRAINT twitter_handle")
        .await?;

    assert!(
        matches!(outcome?, UpdateOutcome::StorageRejected(_)),
        "CHECK violation should surface as a storage rejection"
    );
    assert_eq!(repo.find_by_id(created.id).await?, Some(created));
    Ok(())
}
