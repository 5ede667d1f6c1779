mod render;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use room_layout::{
    CatalogEntry, Layout, LayoutArgs, LayoutGenerator, LayoutSettings, Phase, Point, Rect, RenderHook,
    RoomCollection,
};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::render::PngFrameWriter;

fn cli() -> clap::Command<'static> {
    clap::Command::new("Dungeon Room Layout Example")
        .version("1.0")
        .arg(
            clap::Arg::new("seed")
                .short('s')
                .long("seed")
                .value_name("STRING")
                .help("Random seed, any string")
                .required(false)
                .default_value("42")
                .takes_value(true),
        )
        .arg(
            clap::Arg::new("rooms")
                .short('n')
                .long("rooms")
                .value_name("INT")
                .help("Number of rooms to place")
                .required(false)
                .default_value("20")
                .takes_value(true)
                .allow_hyphen_values(true)
                .validator(|input| input.parse::<i64>()),
        )
        .arg(
            clap::Arg::new("bounds")
                .short('b')
                .long("bounds")
                .value_name("X,Y,W,H")
                .help("Region rooms start in and the layout center is drawn from")
                .required(false)
                .default_value("-50,-50,100,100")
                .takes_value(true)
                .allow_hyphen_values(true),
        )
        .arg(
            clap::Arg::new("catalog")
                .long("catalog")
                .value_name("FILE")
                .help("JSON array of {\"width\", \"height\"} room templates")
                .takes_value(true),
        )
        .arg(
            clap::Arg::new("settings")
                .long("settings")
                .value_name("FILE")
                .help("JSON layout settings; missing fields take their defaults")
                .takes_value(true),
        )
        .arg(
            clap::Arg::new("max_explode_sweeps")
                .long("max-explode-sweeps")
                .value_name("INT")
                .help("Fail if the explode phase needs more sweeps than this")
                .takes_value(true)
                .validator(|input| input.parse::<u64>()),
        )
        .arg(
            clap::Arg::new("max_condense_iterations")
                .long("max-condense-iterations")
                .value_name("INT")
                .help("Fail if the condense phase needs more iterations than this")
                .takes_value(true)
                .validator(|input| input.parse::<u64>()),
        )
        .arg(
            clap::Arg::new("frames")
                .long("frames")
                .value_name("DIR")
                .help("Write a PNG of the layout at every sampled iteration into this directory")
                .takes_value(true),
        )
        .arg(
            clap::Arg::new("every")
                .long("every")
                .value_name("INT")
                .help("Only write frames for iterations divisible by this")
                .default_value("1")
                .takes_value(true)
                .validator(|input| input.parse::<u64>()),
        )
}

#[derive(Debug)]
struct MainArgs {
    seed: String,
    room_count: i64,
    bounds: Rect,
    catalog: Vec<CatalogEntry>,
    settings: LayoutSettings,
    frames: Option<PathBuf>,
    every: u64,
}

impl MainArgs {
    fn from_matches(matches: &clap::ArgMatches) -> anyhow::Result<Self> {
        let catalog = match matches.value_of("catalog") {
            Some(path) => read_json(Path::new(path))?,
            None => default_catalog(),
        };
        let mut settings: LayoutSettings = match matches.value_of("settings") {
            Some(path) => read_json(Path::new(path))?,
            None => LayoutSettings::default(),
        };
        if let Some(max_sweeps) = parse_optional::<u64>(matches, "max_explode_sweeps")? {
            settings.max_explode_sweeps = Some(max_sweeps);
        }
        if let Some(max_iterations) = parse_optional::<u64>(matches, "max_condense_iterations")? {
            settings.max_condense_iterations = Some(max_iterations);
        }
        Ok(MainArgs {
            seed: matches.value_of("seed").unwrap_or("42").to_string(),
            room_count: parse_optional::<i64>(matches, "rooms")?.unwrap_or(20),
            bounds: parse_bounds(matches.value_of("bounds").unwrap_or("-50,-50,100,100"))?,
            catalog,
            settings,
            frames: matches.value_of("frames").map(PathBuf::from),
            every: parse_optional::<u64>(matches, "every")?.unwrap_or(1),
        })
    }
}

fn default_catalog() -> Vec<CatalogEntry> {
    vec![CatalogEntry::new(4, 4), CatalogEntry::new(6, 3)]
}

fn parse_optional<T>(matches: &clap::ArgMatches, name: &str) -> anyhow::Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    matches
        .value_of(name)
        .map(|value| value.parse::<T>().with_context(|| format!("invalid {}: {:?}", name, value)))
        .transpose()
}

fn parse_bounds(input: &str) -> anyhow::Result<Rect> {
    let parts = input
        .split(',')
        .map(|part| part.trim().parse::<i32>())
        .collect::<Result<Vec<i32>, _>>()
        .with_context(|| format!("bounds must be x,y,width,height, got {:?}", input))?;
    match parts.as_slice() {
        [x, y, width, height] => Ok(Rect::new(*x, *y, *width, *height)),
        _ => bail!("bounds must be x,y,width,height, got {:?}", input),
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let contents = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("failed to parse {}", path.display()))
}

#[derive(Serialize)]
struct LayoutReport<'a> {
    seed: &'a str,
    bounds: Rect,
    center: Point,
    explode_sweeps: u64,
    condense_iterations: u64,
    rooms: &'a RoomCollection,
}

fn run(main_args: &MainArgs) -> anyhow::Result<Layout> {
    let args = LayoutArgs::new(
        &main_args.catalog,
        main_args.room_count,
        &main_args.seed,
        main_args.bounds,
    )
    .with_settings(main_args.settings.clone());

    let directory = match &main_args.frames {
        Some(directory) => directory,
        None => return Ok(LayoutGenerator::new(args).run()?),
    };
    let mut writer = PngFrameWriter::new(directory, main_args.every, main_args.bounds)?;
    let layout = LayoutGenerator::new(args)
        .with_render_hook(|rooms: &RoomCollection, phase: Phase, iteration: u64| {
            writer.render(rooms, phase, iteration)
        })
        .run()?;
    if let Some(err) = writer.take_error() {
        return Err(err.context("failed to write layout frames"));
    }
    writer.write_final(&layout.rooms)?;
    info!(
        frames = writer.frames_written(),
        directory = %directory.display(),
        "frames written"
    );
    Ok(layout)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let main_args = MainArgs::from_matches(&cli().get_matches())?;
    let layout = run(&main_args)?;
    let report = LayoutReport {
        seed: &main_args.seed,
        bounds: main_args.bounds,
        center: layout.center,
        explode_sweeps: layout.explode_sweeps,
        condense_iterations: layout.condense_iterations,
        rooms: &layout.rooms,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
