use std::collections::BTreeMap;

use gt2_core::core_api::{CarCatalog, Engine, SlotSnapshot};
use gt2_core::{CarEdit, ContainerKind, SaveUpdates};
use gt2_render::{
    JsonStyle, TextRenderOptions, TextStyle, render_json, render_patch_summary, render_text,
    render_text_with_options,
};
use serde_json::Value;

const START: usize = 8192;

fn card() -> Vec<u8> {
    let mut bytes = vec![0u8; 16 * 8192];
    bytes[128] = 0x51;
    bytes[138..154].copy_from_slice(b"BESCES-02380GAME");
    bytes[START + 512] = 1;
    bytes[START + 15988] = 2;
    let first_car = START + 15992;
    bytes[first_car..first_car + 4].copy_from_slice(&[0xCA, 0xFE, 0x00, 0x01]);
    bytes
}

fn snapshots() -> Vec<SlotSnapshot> {
    let catalog = CarCatalog::from_csv_str("CAFE0001,\"Coupe, EU\",Coupe US,Coupe JP\n")
        .expect("catalog should parse");
    let mut session = Engine::new().open_bytes(card(), ContainerKind::RawCard);
    let updates = SaveUpdates {
        money: Some(123_456),
        current_car: Some(1),
        ..SaveUpdates::default()
    };
    session.apply(None, &updates).expect("apply should succeed");
    session
        .snapshots(Some(&catalog))
        .expect("snapshots should decode")
}

#[test]
fn json_uses_canonical_key_order() {
    let value = render_json(&snapshots(), JsonStyle::CanonicalV1);
    let slots = value.as_array().expect("json should be an array");
    assert_eq!(slots.len(), 1);

    let keys: Vec<&str> = slots[0]
        .as_object()
        .expect("slot should be an object")
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(
        keys,
        vec![
            "index",
            "container",
            "start_offset",
            "game_id",
            "region",
            "checksum",
            "language",
            "money",
            "days",
            "races",
            "wins",
            "best_rank_sum",
            "rank_sum",
            "average_ranking",
            "prize",
            "licenses",
            "arcade",
            "career",
            "ending_movie_unlocked",
            "car_count",
            "current_car",
            "cars",
        ]
    );
}

#[test]
fn json_values_round_trip_through_text() {
    let value = render_json(&snapshots(), JsonStyle::CanonicalV1);
    let json: Value =
        serde_json::from_str(&serde_json::to_string(&value).expect("json should serialize"))
            .expect("serialized json should parse");

    let slot = &json[0];
    assert_eq!(slot["region"], "EU");
    assert_eq!(slot["container"], "raw card");
    assert_eq!(slot["checksum"]["valid"], true);
    assert_eq!(slot["language"]["value"], "en-us");
    assert_eq!(slot["money"]["offset"], START + 32392);
    assert_eq!(slot["money"]["value"], 123_456);
    assert_eq!(slot["current_car"]["value"], 1);
    assert_eq!(slot["licenses"][0]["tests"][0], "none");
    assert_eq!(slot["arcade"]["value"][20]["track"], "Test Course");
    assert_eq!(slot["cars"][0]["name"], "Coupe, EU");
    assert_eq!(slot["cars"][0]["fields"]["code"], "CAFE0001");
    assert_eq!(slot["cars"][1]["name"], "invalid");
}

#[test]
fn text_report_lists_fields_with_offsets() {
    let rendered = render_text(&snapshots(), TextStyle::OffsetReport);

    assert!(rendered.starts_with("Start offset: 8192\n"));
    assert!(rendered.contains("Game Id at 138: BESCES-02380GAME\n"));
    assert!(rendered.contains("Region: EU\n"));
    assert!(rendered.contains("Valid checksum: true\n"));
    assert!(rendered.contains("Language at 8704: en-us\n"));
    assert!(rendered.contains("Money at 40584: 123456\n"));
    assert!(rendered.contains("Average race ranking: 0\n"));
    assert!(rendered.contains("License S at 13849: none,none"));
    assert!(rendered.contains("Arcade progress at 8888:\n  Rome: none\n"));
    assert!(rendered.contains("Career percentage: 0\n"));
    assert!(rendered.contains("Ending movie unlocked at 9237: false\n"));
    assert!(rendered.contains("Car count at 24180: 2\n"));
    assert!(rendered.contains("Current car at 40588: 1\n"));
    assert!(rendered.contains("Offset,Position,Name,Bytes\n24184,0,\"Coupe, EU\",CAFE0001"));
    assert!(rendered.ends_with("\n\n"));
    assert!(!rendered.contains("  colour: "));
}

#[test]
fn verbose_text_lists_car_fields() {
    let rendered = render_text_with_options(
        &snapshots(),
        TextStyle::OffsetReport,
        TextRenderOptions { verbose: true },
    );
    assert!(rendered.contains("  code: CAFE0001\n"));
    assert!(rendered.contains("  colour: 00\n"));
}

#[test]
fn patch_summary_reports_each_slot() {
    let mut bytes = card();
    bytes[5 * 128] = 0x51;
    bytes[5 * 128 + 10..5 * 128 + 26].copy_from_slice(b"BASCUS-94455GAME");
    bytes[5 * 8192 + 15988] = 100;
    let mut session = Engine::new().open_bytes(bytes, ContainerKind::RawCard);

    let updates = SaveUpdates {
        car_edit: Some(CarEdit {
            index: 7,
            bytes: None,
            fields: BTreeMap::from([("colour".to_string(), "01".to_string())]),
        }),
        current_car: Some(200),
        ..SaveUpdates::default()
    };
    let report = session.apply(None, &updates).expect("apply should succeed");
    let summary = render_patch_summary(&report);
    let lines: Vec<&str> = summary.lines().collect();

    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("Save 0 at 8192: updated, checksum "));
    assert!(lines[0].ends_with(", car 2, current car none"));
    assert!(lines[1].starts_with("Save 1 at 40960: failed, InvalidIndex: "));
}
