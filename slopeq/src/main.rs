use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, Parser, Subcommand};
use log::info;
use memmap2::Mmap;
use slopegrid::{geo::BoundingRect, Grid, Policy, NO_DATA};
use std::{fs::File, io::Write};

/// A slope grid blob multitool.
#[derive(Debug, Parser)]
struct Cli {
    /// Reject negative cells, check sample positions past the header,
    /// and recognize water cells.
    #[arg(long, global = true)]
    strict: bool,

    #[command(subcommand)]
    command: SubCmd,
}

#[derive(Clone, Debug, Subcommand)]
enum SubCmd {
    /// Print a blob's header.
    Info(InfoArgs),
    /// Print the slope at a single location.
    Lookup(LookupArgs),
    /// Print every slope inside a rectangle as JSON.
    Area(AreaArgs),
    /// Render a blob as an image.
    Render(RenderArgs),
}

#[derive(Args, Clone, Debug)]
struct InfoArgs {
    /// Source slope grid blob.
    src: Utf8PathBuf,
}

#[derive(Args, Clone, Debug)]
struct LookupArgs {
    /// Source slope grid blob.
    src: Utf8PathBuf,

    /// Latitude in degrees.
    #[arg(allow_hyphen_values = true)]
    lat: f64,

    /// Longitude in degrees.
    #[arg(allow_hyphen_values = true)]
    lng: f64,
}

#[derive(Args, Clone, Debug)]
struct AreaArgs {
    /// Source slope grid blob.
    src: Utf8PathBuf,

    /// Latitude of the first corner.
    #[arg(allow_hyphen_values = true)]
    lat_a: f64,

    /// Longitude of the first corner.
    #[arg(allow_hyphen_values = true)]
    lng_a: f64,

    /// Latitude of the opposite corner.
    #[arg(allow_hyphen_values = true)]
    lat_b: f64,

    /// Longitude of the opposite corner.
    #[arg(allow_hyphen_values = true)]
    lng_b: f64,
}

#[derive(Args, Clone, Debug)]
struct RenderArgs {
    /// Source slope grid blob.
    src: Utf8PathBuf,

    /// Optional output file name.
    ///
    /// Image format will be based on `dest`'s extension.
    ///
    /// If not specified, a png will be written with the blob's
    /// basename in the blob's dir.
    dest: Option<Utf8PathBuf>,
}

fn map(path: &Utf8Path) -> Result<Mmap> {
    let file = File::open(path).with_context(|| format!("opening {path}"))?;
    let mmap = unsafe { Mmap::map(&file) }.with_context(|| format!("mapping {path}"))?;
    Ok(mmap)
}

fn grid(raw: &[u8], policy: Policy) -> Result<Grid<'_>> {
    Ok(Grid::new(raw)?.with_policy(policy))
}

fn info(InfoArgs { src }: InfoArgs, policy: Policy) -> Result<()> {
    let raw = map(&src)?;
    let grid = grid(&raw, policy)?;
    let header = grid.header();
    println!("unit:     {} (scaled: {})", header.unit, header.is_scaled());
    println!("origin:   x {}, y {}", header.start_x, header.start_y);
    println!("cell:     x {}, y {}", header.unit_x, header.unit_y);
    println!("size:     {} cols x {} rows", header.cols, header.rows);
    match grid.variant() {
        Some(variant) => println!("variant:  {variant:?}"),
        None => println!("variant:  unsupported"),
    }
    if let Some(rect) = grid.polygon().bounding_rect() {
        let (min, max) = (rect.min(), rect.max());
        println!("lat:      {} .. {}", min.y, max.y);
        println!("lng:      {} .. {}", min.x, max.x);
    }
    Ok(())
}

fn lookup(LookupArgs { src, lat, lng }: LookupArgs, policy: Policy) -> Result<()> {
    let raw = map(&src)?;
    let grid = grid(&raw, policy)?;
    match grid.lookup(lat, lng) {
        Ok(slope) => println!("{slope}"),
        Err(miss) => {
            info!("({lat}, {lng}): {miss}");
            println!("{NO_DATA}");
        }
    }
    Ok(())
}

fn area(args: AreaArgs, policy: Policy) -> Result<()> {
    let raw = map(&args.src)?;
    let grid = grid(&raw, policy)?;
    let hits = grid.samples_in((args.lat_a, args.lng_a), (args.lat_b, args.lng_b));
    info!("{} samples", hits.len());
    let mut out = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, &hits)?;
    writeln!(out)?;
    Ok(())
}

fn render(RenderArgs { src, dest }: RenderArgs, policy: Policy) -> Result<()> {
    let raw = map(&src)?;
    let grid = grid(&raw, policy)?;
    let out = match dest {
        None => src.with_extension("png"),
        Some(mut out) => {
            if out.is_dir() {
                let name = src.file_name().context("source has no file name")?;
                out.push(name);
                out.set_extension("png");
            }
            out
        }
    };

    info!("writing to {out}");
    if let Some("png" | "tif" | "tiff") = out.extension() {
        let img = grid.to_image::<u16>();
        img.save(&out).with_context(|| format!("writing {out}"))?;
    } else {
        let img = grid.to_image::<u8>();
        img.save(&out).with_context(|| format!("writing {out}"))?;
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let policy = if cli.strict {
        Policy::STRICT
    } else {
        Policy::LEGACY
    };
    match cli.command {
        SubCmd::Info(args) => info(args, policy),
        SubCmd::Lookup(args) => lookup(args, policy),
        SubCmd::Area(args) => area(args, policy),
        SubCmd::Render(args) => render(args, policy),
    }
}
