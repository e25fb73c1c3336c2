use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

use gt2_core::ContainerKind;
use gt2_core::core_api::Engine;
use serde_json::Value;

const START: usize = 8192;

fn run_cli(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_gt2-se"))
        .args(args)
        .output()
        .expect("failed to run gt2-se CLI")
}

fn temp_path(prefix: &str, ext: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before unix epoch")
        .as_nanos();
    std::env::temp_dir().join(format!("{prefix}_{}_{}.{ext}", std::process::id(), nanos))
}

fn card_bytes() -> Vec<u8> {
    let mut bytes = vec![0u8; 16 * 8192];
    bytes[128] = 0x51;
    bytes[138..154].copy_from_slice(b"BASCUS-94455GAME");
    bytes[START + 512] = 1;
    bytes[START + 15988] = 2;
    bytes[START + 15992..START + 15996].copy_from_slice(&[0x12, 0x34, 0x56, 0x78]);
    bytes
}

fn write_card(prefix: &str, ext: &str) -> PathBuf {
    let path = temp_path(prefix, ext);
    fs::write(&path, card_bytes()).expect("card should be writable");
    path
}

fn open(path: &PathBuf, kind: ContainerKind) -> gt2_core::core_api::Session {
    let bytes = fs::read(path).expect("image should be readable");
    Engine::new().open_bytes(bytes, kind)
}

#[test]
fn read_prints_offset_report() {
    let path = write_card("gt2se_read", "mcr");
    let path_s = path.to_string_lossy().to_string();

    let output = run_cli(&[&path_s]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("Start offset: 8192\n"));
    assert!(stdout.contains("Region: US\n"));
    assert!(stdout.contains("Language at 8704: en-us\n"));
    assert!(stdout.contains("Car count at 24180: 2\n"));
    assert!(stdout.contains("24184,0,invalid,12345678"));

    let _ = fs::remove_file(&path);
}

#[test]
fn read_json_uses_car_table() {
    let path = write_card("gt2se_json", "mcr");
    let db = temp_path("gt2se_cars", "csv");
    fs::write(&db, "12345678,Roadster EU,Roadster US,Roadster JP\n").expect("db writable");

    let output = run_cli(&[
        "--json",
        "--cars-db",
        &db.to_string_lossy(),
        &path.to_string_lossy(),
    ]);
    assert!(output.status.success());

    let json: Value = serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    let slots = json.as_array().expect("top level should be an array");
    assert_eq!(slots.len(), 1);
    assert_eq!(slots[0]["region"], "US");
    assert_eq!(slots[0]["cars"][0]["name"], "Roadster US");
    assert_eq!(slots[0]["cars"][1]["name"], "invalid");

    let _ = fs::remove_file(&path);
    let _ = fs::remove_file(&db);
}

#[test]
fn edits_are_written_to_output_and_checksum_is_valid() {
    let path = write_card("gt2se_edit_src", "mcr");
    let out = temp_path("gt2se_edit_out", "mcr");

    let output = run_cli(&[
        "--money",
        "5000",
        "--lang",
        "de",
        "--career",
        "1st",
        "--license",
        "gold",
        "--arcade",
        "hard",
        "--rank",
        "10",
        "20",
        "--edit-field",
        "1",
        "colour",
        "0A",
        "--current-car",
        "1",
        "--output",
        &out.to_string_lossy(),
        &path.to_string_lossy(),
    ]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Save 0 at 8192: updated"));
    assert!(stdout.contains("Wrote edited image to"));

    assert_eq!(fs::read(&path).expect("source readable"), card_bytes());

    let session = open(&out, ContainerKind::RawCard);
    assert!(session.verify_checksum(0).expect("verify"));
    let snapshot = session.snapshot(0, None).expect("snapshot");
    assert_eq!(snapshot.money.value, 5000);
    assert_eq!(snapshot.language.code(), "de");
    assert_eq!(snapshot.best_rank_sum.value, 10);
    assert_eq!(snapshot.rank_sum.value, 20);
    assert_eq!(snapshot.current_car, Some(1));
    assert_eq!(snapshot.cars[1].field("colour"), Some("0A"));
    assert_eq!(snapshot.career.completion_percent, 113.24);

    let _ = fs::remove_file(&path);
    let _ = fs::remove_file(&out);
}

#[test]
fn edits_without_output_overwrite_the_image() {
    let path = write_card("gt2se_inplace", "bin");
    let path_s = path.to_string_lossy().to_string();

    let output = run_cli(&["--kind", "raw", "--days", "99", "--save", "0", &path_s]);
    assert!(output.status.success());

    let session = open(&path, ContainerKind::RawCard);
    assert_eq!(session.snapshot(0, None).expect("snapshot").days.value, 99);
    assert!(session.verify_checksum(0).expect("verify"));

    let _ = fs::remove_file(&path);
}

#[test]
fn strict_car_index_rejects_append_and_leaves_file() {
    let path = write_card("gt2se_strict", "mcr");
    let path_s = path.to_string_lossy().to_string();

    let output = run_cli(&["--strict-car-index", "--edit", "5", "FFFF", &path_s]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("InvalidIndex"));
    assert_eq!(fs::read(&path).expect("image readable"), card_bytes());

    let output = run_cli(&["--edit", "5", "FFFF", &path_s]);
    assert!(output.status.success());
    let session = open(&path, ContainerKind::RawCard);
    let snapshot = session.snapshot(0, None).expect("snapshot");
    assert_eq!(snapshot.car_count.value, 3);
    assert_eq!(snapshot.cars[2].code, "FFFF0000");

    let _ = fs::remove_file(&path);
}

#[test]
fn usage_errors_exit_with_two() {
    let path = write_card("gt2se_usage", "mcr");
    let path_s = path.to_string_lossy().to_string();

    let output = run_cli(&["--output", "/tmp/never-written.mcr", &path_s]);
    assert_eq!(output.status.code(), Some(2));

    let output = run_cli(&[
        "--edit-field",
        "0",
        "colour",
        "01",
        "--edit-field",
        "1",
        "colour",
        "02",
        &path_s,
    ]);
    assert_eq!(output.status.code(), Some(2));

    let output = run_cli(&["--lang", "klingon", &path_s]);
    assert_eq!(output.status.code(), Some(2));

    let unknown_ext = write_card("gt2se_usage", "dat");
    let output = run_cli(&[&unknown_ext.to_string_lossy()]);
    assert_eq!(output.status.code(), Some(2));

    let _ = fs::remove_file(&path);
    let _ = fs::remove_file(&unknown_ext);
}

#[test]
fn missing_save_slot_is_an_error() {
    let path = write_card("gt2se_missing", "mcr");
    let output = run_cli(&["--save", "4", &path.to_string_lossy()]);
    assert_eq!(output.status.code(), Some(1));
    let _ = fs::remove_file(&path);

    let empty = temp_path("gt2se_empty", "mcr");
    fs::write(&empty, vec![0u8; 16 * 8192]).expect("empty card writable");
    let output = run_cli(&[&empty.to_string_lossy()]);
    assert_eq!(output.status.code(), Some(1));
    let _ = fs::remove_file(&empty);
}
