//! End-to-end tests for the imgsync binary
//!
//! The bucket is a wiremock server speaking enough path-style S3 for
//! existence checks; the same server answers the public-URL probes. Signed
//! requests come from the S3 client, unsigned ones from the prober.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;
use wiremock::{
    matchers::{header_exists, method, path},
    Mock, MockServer, ResponseTemplate,
};

const BUCKET: &str = "shop-images";

const PRODUCTS: &str = "sku,name,WOO IMAGE\n\
A1,Blue Mug,https://shop.example.com/wp-content/uploads/2024/05/blue-mug.png\n\
A2,Red Mug,https://shop.example.com/wp-content/uploads/2024/05/red-mug.png\n\
A3,Green Mug,PENDING\n";

/// Command with a clean, network-free environment rooted in `dir`
fn imgsync(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("imgsync").unwrap();
    cmd.current_dir(dir)
        .env_clear()
        .env("PATH", std::env::var_os("PATH").unwrap_or_default())
        .env("HOME", dir)
        .env("AWS_ACCESS_KEY_ID", "test-access-key")
        .env("AWS_SECRET_ACCESS_KEY", "test-secret-key")
        .env("AWS_EC2_METADATA_DISABLED", "true")
        .env("LOG_OUTPUT", "console")
        .env("NO_COLOR", "1");
    cmd
}

fn write_products(dir: &Path) -> std::path::PathBuf {
    let input = dir.join("products.csv");
    std::fs::write(&input, PRODUCTS).unwrap();
    input
}

/// Answer the signed existence check for `key`
async fn mount_object(server: &MockServer, key: &str, status: u16) {
    Mock::given(method("HEAD"))
        .and(path(format!("/{}/{}", BUCKET, key)))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Answer the anonymous public-URL probe for `key`
async fn mount_public(server: &MockServer, key: &str, status: u16) {
    Mock::given(method("HEAD"))
        .and(path(format!("/{}/{}", BUCKET, key)))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

// ============================================================================
// run
// ============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn test_dry_run_writes_statuses() {
    let server = MockServer::start().await;
    mount_object(&server, "wp-content/uploads/2024/05/blue-mug.jpg", 200).await;
    mount_public(&server, "wp-content/uploads/2024/05/blue-mug.jpg", 200).await;
    mount_object(&server, "wp-content/uploads/2024/05/red-mug.jpg", 404).await;

    let temp = TempDir::new().unwrap();
    let input = write_products(temp.path());

    imgsync(temp.path())
        .arg("run")
        .arg("--input")
        .arg(&input)
        .arg("--bucket")
        .arg(BUCKET)
        .arg("--endpoint")
        .arg(server.uri())
        .assert()
        .success()
        .stdout(predicate::str::contains("DRY RUN"))
        .stdout(predicate::str::contains("Summary"));

    let output = std::fs::read_to_string(temp.path().join("products_processed.csv")).unwrap();
    let lines: Vec<&str> = output.lines().collect();
    let blue_url = format!("{}/{}/wp-content/uploads/2024/05/blue-mug.jpg", server.uri(), BUCKET);
    let red_url = format!("{}/{}/wp-content/uploads/2024/05/red-mug.jpg", server.uri(), BUCKET);

    assert_eq!(lines.len(), 4);
    assert_eq!(
        lines[0],
        "sku,name,WOO IMAGE,S3_Key,Processing_Status,HTTP_Response_Code,S3_URL"
    );
    assert!(lines[1].ends_with(&format!(
        "wp-content/uploads/2024/05/blue-mug.jpg,EXISTS_OK,200,{}",
        blue_url
    )));
    assert!(lines[2].ends_with(&format!(
        "wp-content/uploads/2024/05/red-mug.jpg,WOULD_UPLOAD_NOT_EXISTS,,{}",
        red_url
    )));
    assert!(lines[3].ends_with("PENDING,,SKIPPED_INVALID_URL,,"));

    let puts = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.method.as_str() == "PUT")
        .count();
    assert_eq!(puts, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_forbidden_object_is_flagged_for_reupload() {
    let server = MockServer::start().await;
    mount_object(&server, "wp-content/uploads/2024/05/blue-mug.jpg", 200).await;
    mount_public(&server, "wp-content/uploads/2024/05/blue-mug.jpg", 403).await;

    let temp = TempDir::new().unwrap();
    let input = write_products(temp.path());
    let output = temp.path().join("out.csv");

    imgsync(temp.path())
        .args(["run", "--test-mode", "--test-rows", "1"])
        .arg("--input-csv")
        .arg(&input)
        .arg("--output-csv")
        .arg(&output)
        .arg("--bucket-name")
        .arg(BUCKET)
        .arg("--endpoint")
        .arg(server.uri())
        .assert()
        .success();

    let written = std::fs::read_to_string(&output).unwrap();
    assert_eq!(written.lines().count(), 2);
    assert!(written.contains(",WOULD_UPLOAD_EXISTS_403_REUPLOAD,403,"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_production_run_can_be_cancelled() {
    let server = MockServer::start().await;
    let temp = TempDir::new().unwrap();
    let input = write_products(temp.path());

    imgsync(temp.path())
        .args(["run", "--upload", "--no-test-mode"])
        .arg("--input")
        .arg(&input)
        .arg("--bucket")
        .arg(BUCKET)
        .arg("--endpoint")
        .arg(server.uri())
        .write_stdin("no\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("CONFIRM UPLOAD"))
        .stdout(predicate::str::contains("Run cancelled"));

    assert!(!temp.path().join("products_processed.csv").exists());
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[test]
fn test_missing_bucket_is_a_configuration_error() {
    let temp = TempDir::new().unwrap();
    let input = write_products(temp.path());

    imgsync(temp.path())
        .arg("run")
        .arg("--input")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("bucket name is required"));

    assert!(!temp.path().join("products_processed.csv").exists());
}

#[test]
fn test_missing_input_file_fails() {
    let temp = TempDir::new().unwrap();

    imgsync(temp.path())
        .args(["run", "--input", "missing.csv", "--bucket", BUCKET])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

// ============================================================================
// config / key
// ============================================================================

#[test]
fn test_config_show_merges_file_and_env() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("imgsync.toml");
    std::fs::write(
        &config,
        "bucket = \"from-file\"\nregion = \"eu-west-1\"\ntarget_width = 640\n",
    )
    .unwrap();

    imgsync(temp.path())
        .args(["config", "show", "--input", "products.csv"])
        .arg("--config")
        .arg(&config)
        .env("IMGSYNC_BUCKET", "from-env")
        .assert()
        .success()
        .stdout(predicate::str::contains("bucket = \"from-env\""))
        .stdout(predicate::str::contains("region = \"eu-west-1\""))
        .stdout(predicate::str::contains("target_width = 640"))
        .stdout(predicate::str::contains("Ready to run"));
}

#[test]
fn test_config_show_lists_problems() {
    let temp = TempDir::new().unwrap();

    imgsync(temp.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Not ready to run"))
        .stdout(predicate::str::contains("bucket name is required"));
}

#[test]
fn test_key_preview() {
    let temp = TempDir::new().unwrap();

    imgsync(temp.path())
        .args([
            "key",
            "https://shop.example.com/wp-content/uploads/2024/05/Blue%20Mug.png",
            "PENDING",
            "--bucket",
            BUCKET,
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("wp-content/uploads/2024/05/Blue%20Mug.jpg"))
        .stdout(predicate::str::contains(
            "https://shop-images.s3.ap-south-1.amazonaws.com/wp-content/uploads/2024/05/Blue%2520Mug.jpg",
        ))
        .stdout(predicate::str::contains("SKIPPED_INVALID_URL"));
}
