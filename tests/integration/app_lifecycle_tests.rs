/*!
 * Integration tests for application lifecycle
 */

use anyhow::Result;
use serde_json::Value;
use std::fs;
use std::sync::Arc;

use poorly_translated::app_config::Config;
use poorly_translated::app_controller::Controller;
use poorly_translated::file_utils::FileManager;
use poorly_translated::providers::mock::MockEndpoint;

use crate::common;

fn test_controller(target: &str) -> Result<Controller> {
    let mut config = Config::default();
    config.target_language = target.to_string();
    config.translation.hops = 2;
    config.pool.max_workers = 4;
    Ok(Controller::with_config(config)?.with_progress(false))
}

/// Test the controller with an invalid configuration
#[test]
fn test_controller_withInvalidConfig_shouldFail() {
    let mut config = Config::default();
    config.pool.max_workers = 0;
    assert!(Controller::with_config(config).is_err());
}

/// Test a full run against the mock endpoint
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_run_with_endpoint_withSampleInput_shouldWriteArchive() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_file(temp_dir.path(), "en.json", common::sample_input_json())?;
    let table = Arc::new(FileManager::load_table(&input, "it-IT")?);
    let endpoint = Arc::new(MockEndpoint::working());

    let controller = test_controller("it-IT")?;
    let summary = controller
        .run_with_endpoint(table, temp_dir.path().join("out"), endpoint.clone())
        .await?;

    assert_eq!(summary.total_keys, 6);
    assert_eq!(summary.translated_keys, 6);
    assert_eq!(summary.resumed_keys, 0);
    assert_eq!(summary.translations_done, 18);
    assert!(!summary.interrupted);

    let output = summary.output.expect("archive should be written");
    assert_eq!(output, temp_dir.path().join("out").join("it-IT.json"));

    let saved: Value = serde_json::from_str(&fs::read_to_string(&output)?)?;
    let merchant = saved["NPCs"]["Merchant"].as_str().unwrap();
    assert!(merchant.starts_with("[it] "));
    assert!(merchant.contains("{0}"));
    Ok(())
}

/// Test that a second run resumes from the archive without new calls
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_run_with_endpoint_withExistingArchive_shouldResume() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let controller = test_controller("fr-FR")?;

    let first = Arc::new(MockEndpoint::working());
    controller
        .run_with_endpoint(common::sample_table("fr-FR"), temp_dir.path().to_path_buf(), first.clone())
        .await?;
    assert_eq!(first.request_count(), 18);

    let second = Arc::new(MockEndpoint::working());
    let summary = controller
        .run_with_endpoint(common::sample_table("fr-FR"), temp_dir.path().to_path_buf(), second.clone())
        .await?;

    assert_eq!(summary.resumed_keys, 6);
    assert_eq!(summary.translated_keys, 6);
    assert_eq!(second.request_count(), 0);
    Ok(())
}

/// Test that an unreachable input is reported
#[test]
fn test_run_withMissingInput_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let controller = test_controller("fr-FR")?;

    let result = tokio_test::block_on(async { controller.run(&temp_dir.path().join("missing.json"), None).await });
    assert!(result.is_err());
    Ok(())
}

/// Test that an input that is not an object is rejected
#[test]
fn test_load_table_withArrayInput_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_file(temp_dir.path(), "en.json", "[1, 2]")?;

    assert!(FileManager::load_table(&input, "fr-FR").is_err());
    Ok(())
}
