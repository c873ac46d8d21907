use clap::Parser;
use patchflow::io::{
    crop_to_multiple, features_from_rgb, load_rgb_image, pixels_from_rgb, save_rgb_pixels,
};
use patchflow::{
    warp_features, Analogy, BoxPyramidExtractor, CorrespondenceField, Direction, FeatureArray,
    FlowConfig, LevelParams, LevelReport, RadiusSchedule,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "patchflow CLI (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print the JSON schema and exit.
    #[arg(long)]
    print_schema: bool,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output for performance profiling.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum RadiusScheduleConfig {
    Fixed,
    Decayed,
}

impl From<RadiusScheduleConfig> for RadiusSchedule {
    fn from(value: RadiusScheduleConfig) -> Self {
        match value {
            RadiusScheduleConfig::Fixed => RadiusSchedule::Fixed,
            RadiusScheduleConfig::Decayed => RadiusSchedule::Decayed,
        }
    }
}

#[derive(Debug, Deserialize)]
struct LevelParamsJson {
    weight: f32,
    radius: i32,
    padding: usize,
}

impl From<LevelParamsJson> for LevelParams {
    fn from(value: LevelParamsJson) -> Self {
        Self {
            weight: value.weight,
            radius: value.radius,
            padding: value.padding,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct Config {
    first_path: String,
    second_path: String,
    output_dir: Option<String>,
    report_path: Option<String>,
    levels: usize,
    schedule: Option<Vec<LevelParamsJson>>,
    iterations: usize,
    radius_schedule: RadiusScheduleConfig,
    seed: u64,
    parallel: bool,
}

impl Default for Config {
    fn default() -> Self {
        let flow = FlowConfig::default();
        Self {
            first_path: String::new(),
            second_path: String::new(),
            output_dir: None,
            report_path: None,
            levels: BoxPyramidExtractor::default().levels,
            schedule: None,
            iterations: flow.iterations,
            radius_schedule: RadiusScheduleConfig::Fixed,
            seed: flow.seed,
            parallel: flow.parallel,
        }
    }
}

#[derive(Debug, Serialize)]
struct LevelRecord {
    depth: usize,
    direction: &'static str,
    iterations: usize,
    mean_score: f32,
    ema_score: f32,
}

impl From<&LevelReport> for LevelRecord {
    fn from(value: &LevelReport) -> Self {
        Self {
            depth: value.depth,
            direction: match value.direction {
                Direction::FirstToSecond => "first_to_second",
                Direction::SecondToFirst => "second_to_first",
            },
            iterations: value.iterations,
            mean_score: value.mean_score,
            ema_score: value.ema_score,
        }
    }
}

#[derive(Debug, Serialize)]
struct FieldRecord {
    output_path: String,
    height: usize,
    width: usize,
    mean_score: f32,
    identity_cells: usize,
}

#[derive(Debug, Serialize)]
struct Output {
    first: FieldRecord,
    second: FieldRecord,
    levels: Vec<LevelRecord>,
}

fn output_path(input: &str, output_dir: Option<&str>) -> PathBuf {
    let input = Path::new(input);
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    let dir = match output_dir {
        Some(dir) => PathBuf::from(dir),
        None => input.parent().map(Path::to_path_buf).unwrap_or_default(),
    };
    dir.join(format!("{stem}_na.png"))
}

fn write_warped(
    field: &CorrespondenceField,
    source: &FeatureArray,
    out_height: usize,
    out_width: usize,
    path: &Path,
) -> Result<FieldRecord, Box<dyn std::error::Error>> {
    let warped = warp_features(field, source, out_height, out_width)?;
    save_rgb_pixels(&warped, path)?;
    Ok(FieldRecord {
        output_path: path.display().to_string(),
        height: field.height(),
        width: field.width(),
        mean_score: field.mean_score(),
        identity_cells: field.identity_count(),
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("patchflow=info".parse()?))
            .with_target(false)
            .init();
    }

    if cli.print_schema {
        println!("{SCHEMA_JSON}");
        return Ok(());
    }
    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    if config.first_path.is_empty() || config.second_path.is_empty() {
        return Err("first_path and second_path must be set in the config".into());
    }
    if config.levels == 0 || config.levels > 16 {
        return Err("levels must be between 1 and 16".into());
    }

    let mut flow = FlowConfig {
        iterations: config.iterations,
        radius_schedule: config.radius_schedule.into(),
        seed: config.seed,
        parallel: config.parallel,
        ..FlowConfig::default()
    };
    if let Some(schedule) = config.schedule {
        flow.levels = schedule.into_iter().map(LevelParams::from).collect();
    }
    let mut analogy = Analogy::new(flow)?;

    let multiple = 1u32 << (config.levels - 1);
    let first_img = crop_to_multiple(&load_rgb_image(&config.first_path)?, multiple)?;
    let second_img = crop_to_multiple(&load_rgb_image(&config.second_path)?, multiple)?;

    let extractor = BoxPyramidExtractor {
        levels: config.levels,
    };
    let result = analogy.run_images(
        &extractor,
        &features_from_rgb(&first_img)?,
        &features_from_rgb(&second_img)?,
    )?;

    let first_pixels = pixels_from_rgb(&first_img)?;
    let second_pixels = pixels_from_rgb(&second_img)?;
    let output_dir = config.output_dir.as_deref();
    if let Some(dir) = output_dir {
        fs::create_dir_all(dir)?;
    }

    // each image is rebuilt from the other image's pixels
    let first = write_warped(
        result.first_field(),
        &second_pixels,
        first_pixels.height(),
        first_pixels.width(),
        &output_path(&config.first_path, output_dir),
    )?;
    let second = write_warped(
        result.second_field(),
        &first_pixels,
        second_pixels.height(),
        second_pixels.width(),
        &output_path(&config.second_path, output_dir),
    )?;

    let output = Output {
        first,
        second,
        levels: result.reports.iter().map(LevelRecord::from).collect(),
    };
    let json = serde_json::to_string_pretty(&output)?;

    match config.report_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}
