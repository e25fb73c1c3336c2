use std::fmt::Write as _;

use gt2_core::PatchReport;
use gt2_core::core_api::{
    ArcadeEntry, CarEntry, CareerProgress, LicenseEntry, ScalarEntry, SlotSnapshot,
};
use serde_json::{Map as JsonMap, Value as JsonValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonStyle {
    #[default]
    CanonicalV1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextStyle {
    /// One `Label at OFFSET: value` line per field, slots separated by a
    /// blank line.
    #[default]
    OffsetReport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextRenderOptions {
    /// Also list every car's named sub-fields under its row.
    pub verbose: bool,
}

pub fn render_json(snapshots: &[SlotSnapshot], style: JsonStyle) -> JsonValue {
    JsonValue::Array(
        snapshots
            .iter()
            .map(|snapshot| render_json_slot(snapshot, style))
            .collect(),
    )
}

pub fn render_json_slot(snapshot: &SlotSnapshot, style: JsonStyle) -> JsonValue {
    match style {
        JsonStyle::CanonicalV1 => JsonValue::Object(slot_json(snapshot)),
    }
}

pub fn render_text(snapshots: &[SlotSnapshot], style: TextStyle) -> String {
    render_text_with_options(snapshots, style, TextRenderOptions::default())
}

pub fn render_text_with_options(
    snapshots: &[SlotSnapshot],
    style: TextStyle,
    options: TextRenderOptions,
) -> String {
    match style {
        TextStyle::OffsetReport => snapshots
            .iter()
            .map(|snapshot| render_offset_report(snapshot, options))
            .collect(),
    }
}

/// One line per processed slot, e.g. `Save 0 at 8192: updated, checksum 1234`.
pub fn render_patch_summary(report: &PatchReport) -> String {
    let mut out = String::new();
    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(applied) => {
                write!(
                    &mut out,
                    "Save {} at {}: updated, checksum {}",
                    outcome.slot, outcome.start_offset, applied.checksum
                )
                .expect("writing to String cannot fail");
                if let Some(index) = applied.car_index {
                    write!(&mut out, ", car {index}").expect("writing to String cannot fail");
                }
                if let Some(current) = applied.current_car {
                    write!(&mut out, ", current car {}", current_car_label(Some(current)))
                        .expect("writing to String cannot fail");
                }
                writeln!(&mut out).expect("writing to String cannot fail");
            }
            Err(e) => {
                writeln!(
                    &mut out,
                    "Save {} at {}: failed, {e}",
                    outcome.slot, outcome.start_offset
                )
                .expect("writing to String cannot fail");
            }
        }
    }
    out
}

fn slot_json(snapshot: &SlotSnapshot) -> JsonMap<String, JsonValue> {
    let mut out = JsonMap::new();

    out.insert("index".to_string(), JsonValue::from(snapshot.slot.index));
    out.insert(
        "container".to_string(),
        JsonValue::String(snapshot.container.as_str().to_string()),
    );
    out.insert(
        "start_offset".to_string(),
        JsonValue::from(snapshot.slot.start_offset),
    );
    out.insert(
        "game_id".to_string(),
        offset_value(
            snapshot.slot.game_id_offset,
            JsonValue::String(snapshot.slot.game_id.clone()),
        ),
    );
    out.insert(
        "region".to_string(),
        JsonValue::String(snapshot.slot.region.to_string()),
    );

    let mut checksum = JsonMap::new();
    checksum.insert(
        "offset".to_string(),
        JsonValue::from(snapshot.checksum.offset),
    );
    checksum.insert(
        "stored".to_string(),
        JsonValue::from(snapshot.checksum.stored),
    );
    checksum.insert(
        "computed".to_string(),
        JsonValue::from(snapshot.checksum.computed),
    );
    checksum.insert("valid".to_string(), JsonValue::Bool(snapshot.checksum.valid));
    out.insert("checksum".to_string(), JsonValue::Object(checksum));

    out.insert(
        "language".to_string(),
        offset_value(
            snapshot.language_offset,
            JsonValue::String(snapshot.language.code().to_string()),
        ),
    );
    out.insert("money".to_string(), scalar_to_json(&snapshot.money));
    out.insert("days".to_string(), scalar_to_json(&snapshot.days));
    out.insert("races".to_string(), scalar_to_json(&snapshot.races));
    out.insert("wins".to_string(), scalar_to_json(&snapshot.wins));
    out.insert(
        "best_rank_sum".to_string(),
        scalar_to_json(&snapshot.best_rank_sum),
    );
    out.insert("rank_sum".to_string(), scalar_to_json(&snapshot.rank_sum));
    out.insert(
        "average_ranking".to_string(),
        JsonValue::from(snapshot.average_ranking),
    );
    out.insert("prize".to_string(), scalar_to_json(&snapshot.prize));
    out.insert(
        "licenses".to_string(),
        JsonValue::Array(snapshot.licenses.iter().map(license_to_json).collect()),
    );
    out.insert(
        "arcade".to_string(),
        offset_value(
            snapshot.arcade_offset,
            JsonValue::Array(snapshot.arcade.iter().map(arcade_to_json).collect()),
        ),
    );
    out.insert("career".to_string(), career_to_json(&snapshot.career));
    out.insert(
        "ending_movie_unlocked".to_string(),
        offset_value(
            snapshot.ending_movie_offset,
            JsonValue::Bool(snapshot.ending_movie_unlocked),
        ),
    );
    out.insert("car_count".to_string(), scalar_to_json(&snapshot.car_count));
    out.insert(
        "current_car".to_string(),
        offset_value(
            snapshot.current_car_offset,
            match snapshot.current_car {
                Some(index) => JsonValue::from(index),
                None => JsonValue::Null,
            },
        ),
    );
    out.insert(
        "cars".to_string(),
        JsonValue::Array(snapshot.cars.iter().map(car_to_json).collect()),
    );

    out
}

fn offset_value(offset: usize, value: JsonValue) -> JsonValue {
    let mut m = JsonMap::new();
    m.insert("offset".to_string(), JsonValue::from(offset));
    m.insert("value".to_string(), value);
    JsonValue::Object(m)
}

fn scalar_to_json(entry: &ScalarEntry) -> JsonValue {
    offset_value(entry.offset, JsonValue::from(entry.value))
}

fn license_to_json(entry: &LicenseEntry) -> JsonValue {
    let mut m = JsonMap::new();
    m.insert("name".to_string(), JsonValue::String(entry.name.clone()));
    m.insert("offset".to_string(), JsonValue::from(entry.offset));
    m.insert(
        "tests".to_string(),
        JsonValue::Array(
            entry
                .tests
                .iter()
                .map(|rank| JsonValue::String(rank.to_string()))
                .collect(),
        ),
    );
    JsonValue::Object(m)
}

fn arcade_to_json(entry: &ArcadeEntry) -> JsonValue {
    let mut m = JsonMap::new();
    m.insert("track".to_string(), JsonValue::String(entry.track.clone()));
    m.insert("rank".to_string(), JsonValue::String(entry.rank.to_string()));
    JsonValue::Object(m)
}

fn career_to_json(career: &CareerProgress) -> JsonValue {
    let mut m = JsonMap::new();
    m.insert("offset".to_string(), JsonValue::from(career.offset));
    m.insert(
        "events".to_string(),
        JsonValue::Array(
            career
                .events
                .iter()
                .map(|rank| JsonValue::String(rank.to_string()))
                .collect(),
        ),
    );
    m.insert(
        "completion_percent".to_string(),
        JsonValue::from(career.completion_percent),
    );
    JsonValue::Object(m)
}

fn car_to_json(car: &CarEntry) -> JsonValue {
    let mut fields = JsonMap::new();
    for field in &car.fields {
        fields.insert(field.name.clone(), JsonValue::String(field.hex.clone()));
    }

    let mut m = JsonMap::new();
    m.insert("index".to_string(), JsonValue::from(car.index));
    m.insert("offset".to_string(), JsonValue::from(car.offset));
    m.insert("name".to_string(), JsonValue::String(car.name.clone()));
    m.insert("code".to_string(), JsonValue::String(car.code.clone()));
    m.insert("bytes".to_string(), JsonValue::String(car.bytes.clone()));
    m.insert("fields".to_string(), JsonValue::Object(fields));
    JsonValue::Object(m)
}

fn render_offset_report(snapshot: &SlotSnapshot, options: TextRenderOptions) -> String {
    let mut out = String::new();
    let slot = &snapshot.slot;

    writeln!(&mut out, "Start offset: {}", slot.start_offset)
        .expect("writing to String cannot fail");
    writeln!(
        &mut out,
        "Game Id at {}: {}",
        slot.game_id_offset, slot.game_id
    )
    .expect("writing to String cannot fail");
    writeln!(&mut out, "Region: {}", slot.region).expect("writing to String cannot fail");
    writeln!(
        &mut out,
        "Checksum at {}: {}",
        snapshot.checksum.offset, snapshot.checksum.stored
    )
    .expect("writing to String cannot fail");
    writeln!(&mut out, "Valid checksum: {}", snapshot.checksum.valid)
        .expect("writing to String cannot fail");
    writeln!(
        &mut out,
        "Language at {}: {}",
        snapshot.language_offset, snapshot.language
    )
    .expect("writing to String cannot fail");

    write_scalar(&mut out, "Money", &snapshot.money);
    write_scalar(&mut out, "Days", &snapshot.days);
    write_scalar(&mut out, "Races", &snapshot.races);
    write_scalar(&mut out, "Wins", &snapshot.wins);
    write_scalar(&mut out, "Sum of best race rankings", &snapshot.best_rank_sum);
    write_scalar(&mut out, "Sum of race rankings", &snapshot.rank_sum);
    writeln!(
        &mut out,
        "Average race ranking: {}",
        snapshot.average_ranking
    )
    .expect("writing to String cannot fail");
    write_scalar(&mut out, "Prize", &snapshot.prize);

    for license in &snapshot.licenses {
        let tests: Vec<&str> = license.tests.iter().map(|r| r.as_str()).collect();
        writeln!(
            &mut out,
            "License {} at {}: {}",
            license.name,
            license.offset,
            tests.join(",")
        )
        .expect("writing to String cannot fail");
    }

    writeln!(&mut out, "Arcade progress at {}:", snapshot.arcade_offset)
        .expect("writing to String cannot fail");
    for entry in &snapshot.arcade {
        writeln!(&mut out, "  {}: {}", entry.track, entry.rank)
            .expect("writing to String cannot fail");
    }

    let events: Vec<&str> = snapshot.career.events.iter().map(|r| r.as_str()).collect();
    writeln!(
        &mut out,
        "Career progress at {}: {}",
        snapshot.career.offset,
        events.join(",")
    )
    .expect("writing to String cannot fail");
    writeln!(
        &mut out,
        "Career percentage: {}",
        snapshot.career.completion_percent
    )
    .expect("writing to String cannot fail");
    writeln!(
        &mut out,
        "Ending movie unlocked at {}: {}",
        snapshot.ending_movie_offset, snapshot.ending_movie_unlocked
    )
    .expect("writing to String cannot fail");
    write_scalar(&mut out, "Car count", &snapshot.car_count);
    writeln!(
        &mut out,
        "Current car at {}: {}",
        snapshot.current_car_offset,
        current_car_label(snapshot.current_car)
    )
    .expect("writing to String cannot fail");

    if !snapshot.cars.is_empty() {
        writeln!(&mut out, "Offset,Position,Name,Bytes").expect("writing to String cannot fail");
    }
    for car in &snapshot.cars {
        writeln!(
            &mut out,
            "{},{},{},{}",
            car.offset,
            car.index,
            csv_field(&car.name),
            car.bytes
        )
        .expect("writing to String cannot fail");
        if options.verbose {
            for field in &car.fields {
                writeln!(&mut out, "  {}: {}", field.name, field.hex)
                    .expect("writing to String cannot fail");
            }
        }
    }

    writeln!(&mut out).expect("writing to String cannot fail");
    out
}

fn write_scalar(out: &mut String, label: &str, entry: &ScalarEntry) {
    writeln!(out, "{label} at {}: {}", entry.offset, entry.value)
        .expect("writing to String cannot fail");
}

fn current_car_label(current: Option<u8>) -> String {
    match current {
        Some(index) if usize::from(index) < gt2_core::layout::MAX_CAR_COUNT => index.to_string(),
        _ => "none".to_string(),
    }
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
