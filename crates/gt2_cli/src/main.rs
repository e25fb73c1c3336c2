use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, ValueEnum};
use gt2_core::core_api::{CarCatalog, Engine, EngineOptions, Session, SlotSnapshot};
use gt2_core::progress::{ArcadeRank, CareerRank, Language, LicenseRank};
use gt2_core::{CarEdit, ContainerKind, RecordIndexPolicy, SaveUpdates};
use gt2_render::{
    JsonStyle, TextRenderOptions, TextStyle, render_json, render_patch_summary,
    render_text_with_options,
};
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const LOG_ENV: &str = "GT2SE_LOG";

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum KindArg {
    /// Raw memory-card image (.mcr)
    Raw,
    /// Emulator card image with a 3904-byte prefix (.gme)
    Emulator,
    /// Single-save export (.psv)
    Export,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum ArcadeArg {
    None,
    Easy,
    Normal,
    Hard,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum LicenseArg {
    None,
    Kid,
    Bronze,
    Silver,
    Gold,
}

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    #[arg(value_name = "IMAGE")]
    path: PathBuf,
    /// Container layout; inferred from the file extension when omitted.
    #[arg(long)]
    kind: Option<KindArg>,
    /// Only read or edit this save (0-based, in card order).
    #[arg(long, value_name = "N")]
    save: Option<usize>,
    #[arg(long)]
    json: bool,
    /// List every car's named fields in the text report.
    #[arg(long)]
    verbose: bool,
    /// CSV table of car codes and regional names.
    #[arg(long = "cars-db", value_name = "PATH")]
    cars_db: Option<PathBuf>,
    #[arg(long = "lang", value_name = "ja|en-us|en-gb|fr|de|it|es", value_parser = parse_language)]
    language: Option<Language>,
    #[arg(long)]
    arcade: Option<ArcadeArg>,
    #[arg(long, value_name = "none|1st|2nd|3rd|4th|5th|6th", value_parser = parse_career_rank)]
    career: Option<CareerRank>,
    #[arg(long)]
    license: Option<LicenseArg>,
    #[arg(long, allow_hyphen_values = true)]
    money: Option<i64>,
    #[arg(long, allow_hyphen_values = true)]
    days: Option<i64>,
    #[arg(long, allow_hyphen_values = true)]
    races: Option<i64>,
    #[arg(long, allow_hyphen_values = true)]
    wins: Option<i64>,
    #[arg(long, allow_hyphen_values = true)]
    prize: Option<i64>,
    /// Sum of best race rankings and sum of race rankings.
    #[arg(long, num_args = 2, value_names = ["BEST", "SUM"], allow_hyphen_values = true)]
    rank: Option<Vec<i64>>,
    /// Replace a car record with the given hex bytes.
    #[arg(long, num_args = 2, value_names = ["INDEX", "HEX"], allow_hyphen_values = true)]
    edit: Option<Vec<String>>,
    /// Overwrite one named field of a car record; repeatable.
    #[arg(
        long = "edit-field",
        num_args = 3,
        value_names = ["INDEX", "NAME", "HEX"],
        allow_hyphen_values = true
    )]
    edit_field: Vec<String>,
    /// Car index to select; out-of-range values clear the selection.
    #[arg(long = "current-car", value_name = "N", allow_hyphen_values = true)]
    current_car: Option<i64>,
    /// Reject car edits whose index is past the last car instead of appending.
    #[arg(long = "strict-car-index")]
    strict_car_index: bool,
    /// Write the edited image here instead of overwriting IMAGE.
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let updates = build_updates(&cli).unwrap_or_else(|message| {
        eprintln!("{message}");
        process::exit(2);
    });
    let has_edits = !updates.is_empty();
    if !has_edits && cli.output.is_some() {
        eprintln!("--output requires at least one edit flag");
        process::exit(2);
    }

    let kind = resolve_kind(&cli).unwrap_or_else(|| {
        eprintln!(
            "Cannot infer container kind of {}; pass --kind raw|emulator|export",
            cli.path.display()
        );
        process::exit(2);
    });

    let bytes = fs::read(&cli.path).unwrap_or_else(|e| {
        eprintln!("Error reading {}: {e}", cli.path.display());
        process::exit(1);
    });

    let catalog = cli.cars_db.as_deref().map(|path| {
        CarCatalog::load_from_path(path).unwrap_or_else(|e| {
            eprintln!("Error loading car table: {e}");
            process::exit(1);
        })
    });

    let engine = Engine::with_options(EngineOptions {
        record_index_policy: if cli.strict_car_index {
            RecordIndexPolicy::Strict
        } else {
            RecordIndexPolicy::Append
        },
    });
    let mut session = engine.open_bytes(bytes, kind);
    debug!(path = %cli.path.display(), slots = session.slot_count(), "loaded image");

    if session.slot_count() == 0 {
        eprintln!("No Gran Turismo 2 saves found in {}", cli.path.display());
        process::exit(1);
    }

    if has_edits {
        let report = session.apply(cli.save, &updates).unwrap_or_else(|e| {
            eprintln!("Error applying edits: {e}");
            process::exit(1);
        });
        if !report.is_clean() {
            eprint!("{}", render_patch_summary(&report));
            eprintln!("Image not written because at least one save failed to update");
            process::exit(1);
        }

        let out_path = cli.output.as_deref().unwrap_or(cli.path.as_path());
        write_image(out_path, session.as_bytes());
        if !cli.json {
            print!("{}", render_patch_summary(&report));
            println!("Wrote edited image to {}", out_path.display());
            return;
        }
    }

    let snapshots = collect_snapshots(&session, cli.save, catalog.as_ref());
    if cli.json {
        let json = render_json(&snapshots, JsonStyle::CanonicalV1);
        let rendered = serde_json::to_string_pretty(&json).unwrap_or_else(|e| {
            eprintln!("Error rendering JSON output: {e}");
            process::exit(1);
        });
        println!("{rendered}");
        return;
    }

    print!(
        "{}",
        render_text_with_options(
            &snapshots,
            TextStyle::OffsetReport,
            TextRenderOptions {
                verbose: cli.verbose,
            },
        )
    );
}

fn build_updates(cli: &Cli) -> Result<SaveUpdates, String> {
    let (best_rank_sum, rank_sum) = match cli.rank.as_deref() {
        Some(&[best, sum]) => (Some(best), Some(sum)),
        Some(_) => return Err("--rank takes exactly two values: BEST SUM".to_string()),
        None => (None, None),
    };

    Ok(SaveUpdates {
        language: cli.language,
        arcade: cli.arcade.map(to_arcade_rank),
        days: cli.days,
        races: cli.races,
        wins: cli.wins,
        best_rank_sum,
        rank_sum,
        prize: cli.prize,
        career: cli.career,
        license: cli.license.map(to_license_rank),
        car_edit: build_car_edit(cli)?,
        money: cli.money,
        current_car: cli.current_car,
    })
}

/// Folds `--edit` and every `--edit-field` into one record edit. All of them
/// must name the same car index.
fn build_car_edit(cli: &Cli) -> Result<Option<CarEdit>, String> {
    let mut edit: Option<CarEdit> = None;

    if let Some(values) = cli.edit.as_deref() {
        let [index, hex] = values else {
            return Err("--edit takes exactly two values: INDEX HEX".to_string());
        };
        edit = Some(CarEdit {
            index: parse_car_index(index)?,
            bytes: Some(hex.clone()),
            fields: BTreeMap::new(),
        });
    }

    for chunk in cli.edit_field.chunks(3) {
        let [index, name, hex] = chunk else {
            return Err("--edit-field takes exactly three values: INDEX NAME HEX".to_string());
        };
        let index = parse_car_index(index)?;
        let edit = edit.get_or_insert_with(|| CarEdit {
            index,
            ..CarEdit::default()
        });
        if edit.index != index {
            return Err(format!(
                "all car edits must target the same car (got {} and {index})",
                edit.index
            ));
        }
        edit.fields.insert(name.clone(), hex.clone());
    }

    Ok(edit)
}

fn parse_car_index(value: &str) -> Result<i64, String> {
    value
        .parse::<i64>()
        .map_err(|_| format!("invalid car index '{value}'"))
}

fn resolve_kind(cli: &Cli) -> Option<ContainerKind> {
    match cli.kind {
        Some(KindArg::Raw) => Some(ContainerKind::RawCard),
        Some(KindArg::Emulator) => Some(ContainerKind::EmulatorCard),
        Some(KindArg::Export) => Some(ContainerKind::SingleSaveExport),
        None => cli
            .path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(ContainerKind::from_extension),
    }
}

fn collect_snapshots(
    session: &Session,
    save: Option<usize>,
    catalog: Option<&CarCatalog>,
) -> Vec<SlotSnapshot> {
    let result = match save {
        Some(index) => session.snapshot(index, catalog).map(|s| vec![s]),
        None => session.snapshots(catalog),
    };
    result.unwrap_or_else(|e| {
        eprintln!("Error reading save: {e}");
        process::exit(1);
    })
}

fn write_image(path: &Path, bytes: &[u8]) {
    fs::write(path, bytes).unwrap_or_else(|e| {
        eprintln!("Error writing {}: {e}", path.display());
        process::exit(1);
    });
}

fn parse_language(value: &str) -> Result<Language, String> {
    Language::from_code(&value.to_ascii_lowercase())
        .ok_or_else(|| {
            format!("unknown language '{value}' (expected ja, en-us, en-gb, fr, de, it or es)")
        })
}

fn parse_career_rank(value: &str) -> Result<CareerRank, String> {
    let value = value.to_ascii_lowercase();
    CareerRank::ALL
        .into_iter()
        .find(|rank| rank.as_str() == value)
        .ok_or_else(|| format!("unknown career rank '{value}' (expected none or 1st..6th)"))
}

fn to_arcade_rank(arg: ArcadeArg) -> ArcadeRank {
    match arg {
        ArcadeArg::None => ArcadeRank::None,
        ArcadeArg::Easy => ArcadeRank::Easy,
        ArcadeArg::Normal => ArcadeRank::Normal,
        ArcadeArg::Hard => ArcadeRank::Hard,
    }
}

fn to_license_rank(arg: LicenseArg) -> LicenseRank {
    match arg {
        LicenseArg::None => LicenseRank::None,
        LicenseArg::Kid => LicenseRank::Kid,
        LicenseArg::Bronze => LicenseRank::Bronze,
        LicenseArg::Silver => LicenseRank::Silver,
        LicenseArg::Gold => LicenseRank::Gold,
    }
}
