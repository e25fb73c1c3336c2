use gt2_core::core_api::{CoreErrorCode, Engine, average_ranking};
use gt2_core::layout::{CARD_BLOCK_SIZE, CARD_FRAMES, FRAME_HEADER_SIZE};
use gt2_core::progress::{ArcadeRank, CareerRank, Language, LicenseRank};
use gt2_core::{ContainerKind, Region, SaveUpdates};

const EU_ID: &str = "BESCES-02380GAME";
const US_ID: &str = "BASCUS-94455GAME";

fn raw_card(frames: &[(usize, &str)]) -> Vec<u8> {
    let mut bytes = vec![0u8; CARD_FRAMES * CARD_BLOCK_SIZE];
    for &(frame, id) in frames {
        let header = FRAME_HEADER_SIZE * frame;
        bytes[header] = 0x51;
        bytes[header + 10..header + 26].copy_from_slice(id.as_bytes());
    }
    bytes
}

fn put_i32(bytes: &mut [u8], offset: usize, value: i32) {
    bytes[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

#[test]
fn money_edit_round_trips_and_closes_checksum() {
    let mut session = Engine::new().open_bytes(raw_card(&[(1, EU_ID)]), ContainerKind::RawCard);

    let slots = session.slots();
    assert_eq!(slots.len(), 1);
    assert_eq!(slots[0].start_offset, 8192);
    assert_eq!(slots[0].game_id_offset, 138);
    assert_eq!(slots[0].region, Region::Eu);

    let updates = SaveUpdates {
        money: Some(1000),
        ..SaveUpdates::default()
    };
    let report = session.apply(Some(0), &updates).expect("apply should succeed");
    assert!(report.is_clean());
    assert_eq!(report.outcomes.len(), 1);

    let snapshot = session.snapshot(0, None).expect("snapshot");
    assert_eq!(snapshot.money.value, 1000);
    assert_eq!(snapshot.money.offset, 8192 + 32392);
    assert!(snapshot.checksum.valid);
    assert!(session.verify_checksum(0).expect("verify"));

    let mut bytes = session.into_bytes();
    bytes[8192 + 100] ^= 0x01;
    let session = Engine::new().open_bytes(bytes, ContainerKind::RawCard);
    assert!(!session.verify_checksum(0).expect("verify"));
    assert_eq!(session.snapshot(0, None).expect("snapshot").money.value, 1000);
}

#[test]
fn snapshot_decodes_progress_fields() {
    let start = 8192;
    let mut bytes = raw_card(&[(1, US_ID)]);
    bytes[start + 512] = 2;
    put_i32(&mut bytes, start + 760, 42);
    put_i32(&mut bytes, start + 768, 30);
    put_i32(&mut bytes, start + 772, 12);
    put_i32(&mut bytes, start + 776, 15);
    put_i32(&mut bytes, start + 780, 60);
    put_i32(&mut bytes, start + 788, -5);
    bytes[start + 696] = 4;
    bytes[start + 697] = 3;
    bytes[start + 792] = 0x21;
    bytes[start + 1045] = 1;
    bytes[start + 5657] = 4;
    bytes[start + 5657 + 164] = 2;
    bytes[start + 13857 + 9 * 164] = 1;
    bytes[start + 32396] = 255;

    let session = Engine::new().open_bytes(bytes, ContainerKind::RawCard);
    let snapshot = session.snapshot(0, None).expect("snapshot");

    assert_eq!(snapshot.slot.region, Region::Us);
    assert_eq!(snapshot.language, Language::EnglishGb);
    assert_eq!(snapshot.days.value, 42);
    assert_eq!(snapshot.races.value, 30);
    assert_eq!(snapshot.wins.value, 12);
    assert_eq!(snapshot.prize.value, -5);
    assert_eq!(snapshot.average_ranking, 0.25);

    assert_eq!(snapshot.arcade.len(), 21);
    assert_eq!(snapshot.arcade[0].track, "Rome");
    assert_eq!(snapshot.arcade[0].rank, ArcadeRank::Hard);
    assert_eq!(snapshot.arcade[1].rank, ArcadeRank::Unknown(3));
    assert_eq!(snapshot.arcade[2].rank, ArcadeRank::None);

    assert_eq!(snapshot.career.events.len(), 248);
    assert_eq!(snapshot.career.events[0], CareerRank::Place(1));
    assert_eq!(snapshot.career.events[1], CareerRank::Place(2));
    assert_eq!(snapshot.career.events[2], CareerRank::None);
    // (1 + 1/2) * 100 / 219
    assert_eq!(snapshot.career.completion_percent, 0.68);

    assert!(snapshot.ending_movie_unlocked);

    assert_eq!(snapshot.licenses.len(), 6);
    assert_eq!(snapshot.licenses[0].name, "S");
    assert_eq!(snapshot.licenses[0].offset, start + 5657);
    assert_eq!(snapshot.licenses[0].tests[0], LicenseRank::Gold);
    assert_eq!(snapshot.licenses[0].tests[1], LicenseRank::Bronze);
    assert_eq!(snapshot.licenses[1].offset, start + 7297);
    assert_eq!(snapshot.licenses[5].name, "B");
    assert_eq!(snapshot.licenses[5].tests[9], LicenseRank::Kid);

    assert_eq!(snapshot.car_count.value, 0);
    assert!(snapshot.cars.is_empty());
    assert_eq!(snapshot.current_car, None);
}

#[test]
fn average_ranking_is_zero_without_races() {
    assert_eq!(average_ranking(10, 0), 0.0);
    assert_eq!(average_ranking(3, 6), 0.5);
}

#[test]
fn missing_slot_is_invalid_index() {
    let mut session = Engine::new().open_bytes(raw_card(&[(1, EU_ID)]), ContainerKind::RawCard);

    let err = session.snapshot(1, None).expect_err("slot 1 should not exist");
    assert_eq!(err.code, CoreErrorCode::InvalidIndex);

    let before = session.as_bytes().to_vec();
    let updates = SaveUpdates {
        money: Some(5),
        ..SaveUpdates::default()
    };
    let err = session
        .apply(Some(3), &updates)
        .expect_err("slot 3 should not exist");
    assert_eq!(err.code, CoreErrorCode::InvalidIndex);
    assert_eq!(session.as_bytes(), before.as_slice());
}

#[test]
fn image_without_saves_has_no_slots() {
    let mut session = Engine::new().open_bytes(raw_card(&[]), ContainerKind::RawCard);
    assert_eq!(session.slot_count(), 0);
    assert!(session.snapshots(None).expect("snapshots").is_empty());

    let report = session
        .apply(None, &SaveUpdates::default())
        .expect("apply to all");
    assert!(report.outcomes.is_empty());
    assert!(report.is_clean());
}

#[test]
fn refresh_checksum_repairs_a_stale_slot() {
    let mut session = Engine::new().open_bytes(raw_card(&[(1, EU_ID)]), ContainerKind::RawCard);
    assert!(!session.verify_checksum(0).expect("verify"));

    let crc = session.refresh_checksum(0).expect("refresh");
    let status = session.checksum_status(0).expect("status");
    assert!(status.valid);
    assert_eq!(status.stored, crc);
    assert_eq!(status.offset, 8192 + 32412);
}

#[test]
fn snapshot_serializes_to_json() {
    let session = Engine::new().open_bytes(raw_card(&[(1, EU_ID)]), ContainerKind::RawCard);
    let snapshot = session.snapshot(0, None).expect("snapshot");
    let json = serde_json::to_value(&snapshot).expect("serialize");
    assert_eq!(json["slot"]["game_id"], EU_ID);
    assert_eq!(json["money"]["offset"], 8192 + 32392);
    assert_eq!(json["container"], "RawCard");
}
