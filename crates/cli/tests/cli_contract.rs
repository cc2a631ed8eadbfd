use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::path::{Path, PathBuf};

fn cli() -> Command {
    Command::cargo_bin("docshelf-cli").expect("binary should build")
}

fn write_png(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    let image = image::RgbaImage::from_pixel(4, 4, image::Rgba([120, 10, 200, 255]));
    image.save(&path).expect("png fixture should be written");
    path
}

fn upload(root: &Path, file: &Path) -> Value {
    let output = cli()
        .arg("--root")
        .arg(root)
        .arg("upload")
        .arg(file)
        .arg("--name")
        .arg("scan")
        .arg("--title")
        .arg("Lease agreement")
        .arg("--author")
        .arg("Hari")
        .arg("--description")
        .arg("Signed copy")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    serde_json::from_slice(&output).expect("stdout should contain valid json")
}

#[test]
fn upload_then_list_round_trips_metadata() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let source = write_png(temp.path(), "source.png");
    let root = temp.path().join("store");

    let uploaded = upload(&root, &source);
    assert_eq!(uploaded["title"], "Lease agreement");
    assert_eq!(uploaded["content_type"], "png");
    assert!(uploaded["id"].as_u64().is_some());

    let output = cli()
        .arg("--root")
        .arg(&root)
        .arg("list")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let listed: Value = serde_json::from_slice(&output).expect("list should emit json");
    let documents = listed.as_array().expect("list output should be an array");
    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0]["id"], uploaded["id"]);
    assert_eq!(documents[0]["author"], "Hari");
}

#[test]
fn upload_rejects_blank_title() {
    let temp = tempfile::tempdir().unwrap();
    let source = write_png(temp.path(), "source.png");

    cli()
        .arg("--root")
        .arg(temp.path().join("store"))
        .arg("upload")
        .arg(&source)
        .arg("--name")
        .arg("scan")
        .arg("--title")
        .arg("")
        .arg("--author")
        .arg("Hari")
        .arg("--description")
        .arg("Signed copy")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Document title cannot be empty"));
}

#[test]
fn upload_rejects_unsupported_extension() {
    let temp = tempfile::tempdir().unwrap();
    let source = temp.path().join("notes.txt");
    std::fs::write(&source, b"plain text").unwrap();

    cli()
        .arg("--root")
        .arg(temp.path().join("store"))
        .arg("upload")
        .arg(&source)
        .arg("--name")
        .arg("notes")
        .arg("--title")
        .arg("Notes")
        .arg("--author")
        .arg("Hari")
        .arg("--description")
        .arg("Plain text")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported content type"));
}

#[test]
fn info_emits_page_count_for_images() {
    let temp = tempfile::tempdir().unwrap();
    let source = write_png(temp.path(), "source.png");
    let root = temp.path().join("store");

    let uploaded = upload(&root, &source);
    let id = uploaded["id"].as_u64().unwrap().to_string();

    let output = cli()
        .arg("--root")
        .arg(&root)
        .arg("info")
        .arg(&id)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let info: Value = serde_json::from_slice(&output).expect("info should emit json");
    assert_eq!(info["page_count"], 1);
    assert_eq!(info["title"], "Lease agreement");
}

#[test]
fn info_fails_for_unknown_id() {
    let temp = tempfile::tempdir().unwrap();

    cli()
        .arg("--root")
        .arg(temp.path().join("store"))
        .arg("info")
        .arg("12345")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn delete_removes_the_document() {
    let temp = tempfile::tempdir().unwrap();
    let source = write_png(temp.path(), "source.png");
    let root = temp.path().join("store");

    let uploaded = upload(&root, &source);
    let id = uploaded["id"].as_u64().unwrap().to_string();

    cli()
        .arg("--root")
        .arg(&root)
        .arg("delete")
        .arg(&id)
        .assert()
        .success()
        .stdout(predicate::str::contains("deleted"));

    let output =
        cli().arg("--root").arg(&root).arg("list").assert().success().get_output().stdout.clone();
    let listed: Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(listed.as_array().unwrap().len(), 0);
}

#[test]
fn clear_reports_removed_count() {
    let temp = tempfile::tempdir().unwrap();
    let root = temp.path().join("store");

    upload(&root, &write_png(temp.path(), "a.png"));

    cli()
        .arg("--root")
        .arg(&root)
        .arg("clear")
        .assert()
        .success()
        .stdout(predicate::str::contains("removed 1"));
}

#[test]
fn render_page_writes_png_file() {
    let temp = tempfile::tempdir().unwrap();
    let source = write_png(temp.path(), "source.png");
    let root = temp.path().join("store");

    let uploaded = upload(&root, &source);
    let id = uploaded["id"].as_u64().unwrap().to_string();
    let output_path = temp.path().join("page.png");

    cli()
        .arg("--root")
        .arg(&root)
        .arg("render-page")
        .arg(&id)
        .arg("--brightness")
        .arg("1.5")
        .arg("--output")
        .arg(&output_path)
        .assert()
        .success();

    let image = image::open(&output_path).expect("rendered page should be a readable image");
    assert_eq!(image.width(), 4);
    assert_eq!(image.height(), 4);
}

#[test]
fn open_supports_dry_run_for_tests() {
    let temp = tempfile::tempdir().unwrap();
    let source = write_png(temp.path(), "source.png");
    let root = temp.path().join("store");

    let uploaded = upload(&root, &source);
    let id = uploaded["id"].as_u64().unwrap().to_string();

    cli()
        .arg("--root")
        .arg(&root)
        .arg("open")
        .arg(&id)
        .env("DOCSHELF_TEST_NO_SPAWN", "1")
        .assert()
        .success()
        .stdout(predicate::str::contains("open:"));
}

#[test]
fn version_prints_the_crate_version() {
    cli()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}
