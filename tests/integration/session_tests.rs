/*!
 * Integration tests for translation sessions
 */

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

use poorly_translated::providers::mock::MockEndpoint;
use poorly_translated::session::{AutosavePolicy, TranslationSession};
use poorly_translated::storage::TranslationArchive;
use poorly_translated::translation::PoolLimits;

use crate::common;

async fn wait_with_timeout(session: &TranslationSession) {
    tokio::time::timeout(Duration::from_secs(5), session.wait())
        .await
        .expect("session did not finish in time");
}

/// A full run translates every key and saves the archive
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_session_run_withSampleTable_shouldTranslateAndSave() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let (endpoint, pool) = common::mock_pool(MockEndpoint::working(), PoolLimits::default());
    let table = common::sample_table("de-DE");
    let session = TranslationSession::new(pool, table.clone(), Some(TranslationArchive::new(temp_dir.path())))
        .with_hops(2);

    session.run().await;
    assert!(session.is_running());
    wait_with_timeout(&session).await;

    assert!(!session.is_running());
    assert_eq!(session.remaining(), 0);
    assert_eq!(session.translated_count(), 6);
    assert_eq!(endpoint.request_count(), 18);

    session.update();
    assert_eq!(table.get("Items.Sword").as_deref().map(|t| t.starts_with("[de] ")), Some(true));
    assert!(table.get("Items.Potion").unwrap().contains("{0}"));
    assert!(temp_dir.path().join("de-DE.json").exists());
    Ok(())
}

/// Keys restored from the archive are not sent again
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_session_load_withArchive_shouldSkipTranslatedKeys() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_test_file(
        temp_dir.path(),
        "fr-FR.json",
        r#"{"Items": {"Sword": "Epee", "Shield": "Bouclier", "Potion": "Buvez {0}"}}"#,
    )?;

    let (endpoint, pool) = common::mock_pool(MockEndpoint::working(), PoolLimits::default());
    let table = common::sample_table("fr-FR");
    let session = TranslationSession::new(pool, table.clone(), Some(TranslationArchive::new(temp_dir.path())))
        .with_hops(1);

    assert_eq!(session.load()?, 3);
    session.run().await;
    wait_with_timeout(&session).await;

    assert_eq!(endpoint.request_count(), 6);
    assert!(endpoint.requests().iter().all(|r| !r.text.contains("Sword")));
    assert_eq!(table.get("Items.Sword").as_deref(), Some("Epee"));
    assert_eq!(session.translated_count(), 6);
    Ok(())
}

/// A culture change forgets what was translated for the old culture
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_session_run_withCultureChange_shouldStartOver() -> Result<()> {
    let (endpoint, pool) = common::mock_pool(MockEndpoint::working(), PoolLimits::default());
    let table = common::sample_table("fr-FR");
    let session = TranslationSession::new(pool, table.clone(), None).with_hops(1);

    session.run().await;
    wait_with_timeout(&session).await;
    assert_eq!(endpoint.request_count(), 12);

    session.run().await;
    wait_with_timeout(&session).await;
    assert_eq!(endpoint.request_count(), 12);

    table.set_culture("es-ES");
    session.run().await;
    wait_with_timeout(&session).await;
    assert_eq!(endpoint.request_count(), 24);
    assert!(endpoint.requests().last().is_some_and(|r| r.target_language == "es"));
    Ok(())
}

/// Stopping cancels everything, joins the workers and saves progress
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_session_stop_withWorkInFlight_shouldJoinAndSave() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let (_, pool) = common::mock_pool(MockEndpoint::slow(30), PoolLimits::new(2, 5));
    let table = Arc::new(poorly_translated::storage::LocalizationTable::with_entries(
        "fr-FR",
        (0..40).map(|i| (format!("Group{}.Key{}", i % 4, i), format!("Text {}", i))),
    ));
    let session = TranslationSession::new(pool, table, Some(TranslationArchive::new(temp_dir.path())))
        .with_hops(1);

    session.run().await;
    tokio::time::sleep(Duration::from_millis(200)).await;
    session.stop(true).await;

    assert!(!session.is_running());
    assert_eq!(session.remaining(), 0);
    assert_eq!(session.pool().live_workers(), 0);
    assert_eq!(session.pool().pending_count(), 0);

    let translated = session.translated_count();
    assert!(translated > 0 && translated < 40);
    assert!(temp_dir.path().join("fr-FR.json").exists());
    Ok(())
}

/// Autosave writes the archive from the host tick
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_session_update_withAutosavePolicy_shouldSaveWhileRunning() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let (_, pool) = common::mock_pool(MockEndpoint::slow(20), PoolLimits::new(4, 5));
    let table = Arc::new(poorly_translated::storage::LocalizationTable::with_entries(
        "fr-FR",
        (0..40).map(|i| (format!("Items.Key{}", i), format!("Text {}", i))),
    ));
    let session = TranslationSession::new(pool, table, Some(TranslationArchive::new(temp_dir.path())))
        .with_hops(1)
        .with_autosave(AutosavePolicy {
            min_keys: 1,
            interval: Duration::from_secs(3600),
        });

    session.run().await;
    let archive_file = temp_dir.path().join("fr-FR.json");

    let saved = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            session.update();
            if archive_file.exists() {
                return session.is_running();
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await?;

    assert!(saved, "archive should be written before the run finished");
    session.stop(false).await;
    Ok(())
}
