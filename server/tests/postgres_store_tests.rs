use anyhow::Result;
use chrono::{Duration, Utc};
use std::sync::Arc;

mod common;
use common::TestDatabase;

use clicker_server::db::PlayerStore;
use clicker_server::db::models::{BoostCounter, ProgressUpdate};
use clicker_server::db::postgres::PgPlayerStore;
use clicker_server::player_service::{BoostRejection, PlayerStateService, ServiceError};
use clicker_server::referrals::{RankTier, ReferralRanking};

/// Creates a migrated scratch database, or returns `None` so the test can skip
async fn setup(test_name: &str) -> Result<Option<(TestDatabase, Arc<PgPlayerStore>)>> {
    let Some(admin_url) = TestDatabase::admin_url() else {
        eprintln!("Skipping {}: TEST_DATABASE_URL not set", test_name);
        return Ok(None);
    };
    let db = TestDatabase::new(&admin_url).await?;
    let store = Arc::new(PgPlayerStore::new(db.pool.clone()));
    Ok(Some((db, store)))
}

#[tokio::test(flavor = "multi_thread")]
async fn test_insert_applies_column_defaults() -> Result<()> {
    let Some((db, store)) = setup("test_insert_applies_column_defaults").await? else {
        return Ok(());
    };

    let player = store.insert_player("pg-1").await?;
    assert_eq!(player.score, 0);
    assert_eq!(player.current_energy, 1000);
    assert_eq!(player.multi_level, 1);
    assert_eq!((player.turbo_count, player.energy_full_count), (6, 12));
    assert!(player.last_boost_reset.is_none());

    // A second insert for the same id returns the existing row
    let again = store.insert_player("pg-1").await?;
    assert_eq!(again, player);

    db.cleanup().await
}

#[tokio::test(flavor = "multi_thread")]
async fn test_conditional_updates() -> Result<()> {
    let Some((db, store)) = setup("test_conditional_updates").await? else {
        return Ok(());
    };

    store.insert_player("pg-2").await?;
    store
        .save_progress(
            "pg-2",
            &ProgressUpdate { score: 150, current_energy: 900, turbo_count: Some(1), energy_full_count: None },
        )
        .await?;

    assert_eq!(store.consume_boost("pg-2", BoostCounter::Turbo).await?, Some(0));
    assert_eq!(store.consume_boost("pg-2", BoostCounter::Turbo).await?, None);
    assert_eq!(store.consume_boost("pg-2", BoostCounter::EnergyFull).await?, Some(11));

    assert_eq!(store.purchase_multi_click("pg-2", 100).await?, Some((50, 2)));
    assert_eq!(store.purchase_multi_click("pg-2", 100).await?, None);

    let player = store.get_player("pg-2").await?.expect("player exists");
    assert_eq!((player.score, player.multi_level, player.turbo_count), (50, 2, 0));

    db.cleanup().await
}

#[tokio::test(flavor = "multi_thread")]
async fn test_negative_score_is_a_store_error() -> Result<()> {
    let Some((db, store)) = setup("test_negative_score_is_a_store_error").await? else {
        return Ok(());
    };

    store.insert_player("pg-3").await?;
    let update = ProgressUpdate { score: -10, current_energy: 0, turbo_count: None, energy_full_count: None };
    assert!(store.save_progress("pg-3", &update).await.is_err());

    db.cleanup().await
}

#[tokio::test(flavor = "multi_thread")]
async fn test_daily_reset_is_persisted() -> Result<()> {
    let Some((db, store)) = setup("test_daily_reset_is_persisted").await? else {
        return Ok(());
    };

    store.insert_player("pg-4").await?;
    let yesterday = Utc::now() - Duration::days(1);
    assert!(store.reset_daily_boosts("pg-4", 0, 0, None, yesterday).await?);
    // A writer that still believes the row was never reset loses
    assert!(!store.reset_daily_boosts("pg-4", 6, 12, None, Utc::now()).await?);

    let service = PlayerStateService::new(store.clone());
    let snapshot = service.get_or_create_player("pg-4").await?;
    assert_eq!((snapshot.turbo_count, snapshot.energy_full_count), (6, 12));

    let player = store.get_player("pg-4").await?.expect("player exists");
    assert_eq!((player.turbo_count, player.energy_full_count), (6, 12));
    assert!(player.last_boost_reset.expect("reset time") > yesterday);

    db.cleanup().await
}

#[tokio::test(flavor = "multi_thread")]
async fn test_concurrent_purchases_never_overdraw() -> Result<()> {
    let Some((db, store)) = setup("test_concurrent_purchases_never_overdraw").await? else {
        return Ok(());
    };

    store.insert_player("pg-5").await?;
    store
        .save_progress(
            "pg-5",
            &ProgressUpdate { score: 100, current_energy: 0, turbo_count: None, energy_full_count: None },
        )
        .await?;

    let service = PlayerStateService::new(store.clone());
    let attempts: Vec<_> = (0..8)
        .map(|_| {
            let service = service.clone();
            tokio::spawn(async move { service.apply_boost_transaction("pg-5", "multiClick", Some(40)).await })
        })
        .collect();

    let mut upgraded = 0;
    for attempt in attempts {
        match attempt.await? {
            Ok(_) => upgraded += 1,
            Err(ServiceError::Rejected(BoostRejection::InsufficientScore)) => {}
            Err(e) => return Err(e.into()),
        }
    }
    assert_eq!(upgraded, 2);

    let player = store.get_player("pg-5").await?.expect("player exists");
    assert_eq!((player.score, player.multi_level), (20, 3));

    db.cleanup().await
}

#[tokio::test(flavor = "multi_thread")]
async fn test_concurrent_last_boost_is_spent_once() -> Result<()> {
    let Some((db, store)) = setup("test_concurrent_last_boost_is_spent_once").await? else {
        return Ok(());
    };

    store.insert_player("pg-6").await?;
    store
        .save_progress(
            "pg-6",
            &ProgressUpdate { score: 0, current_energy: 0, turbo_count: Some(1), energy_full_count: None },
        )
        .await?;

    let service = PlayerStateService::new(store.clone());
    let racers: Vec<_> = (0..2)
        .map(|_| {
            let service = service.clone();
            tokio::spawn(async move { service.apply_boost_transaction("pg-6", "turbo", Some(0)).await })
        })
        .collect();

    let mut used = 0;
    let mut limited = 0;
    for racer in racers {
        match racer.await? {
            Ok(_) => used += 1,
            Err(ServiceError::Rejected(BoostRejection::LimitReached)) => limited += 1,
            Err(e) => return Err(e.into()),
        }
    }
    assert_eq!((used, limited), (1, 1));

    let player = store.get_player("pg-6").await?.expect("player exists");
    assert_eq!(player.turbo_count, 0);

    db.cleanup().await
}

#[tokio::test(flavor = "multi_thread")]
async fn test_referral_ranking_order() -> Result<()> {
    let Some((db, store)) = setup("test_referral_ranking_order").await? else {
        return Ok(());
    };

    for (id, score) in [("b-fren", 300), ("a-fren", 300), ("c-fren", 900)] {
        sqlx::query("INSERT INTO players (id, score, inviter_id) VALUES ($1, $2, 'pg-host')")
            .bind(id)
            .bind(score as i64)
            .execute(&db.pool)
            .await?;
    }

    let frens = ReferralRanking::new(store.clone()).list("pg-host").await?;
    let names: Vec<_> = frens.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, ["User_c-fren", "User_a-fren", "User_b-fren"]);
    assert!(frens.iter().all(|f| f.rank == RankTier::Gold));
    assert_eq!(frens[0].commission, 90);

    db.cleanup().await
}
