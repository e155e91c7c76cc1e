//! Crop an XYZ point cloud with screen-space boxes and export it as PCD
//!
//! ```text
//! crop_cloud scan.xyz --box 100,100,400,300 --box 380,250,700,500 --mode outside
//! ```
//!
//! The cloud is framed exactly as an interactive viewer would frame it, so box
//! coordinates are pixels in a `--width` x `--height` view.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use nalgebra::Point2;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cloudtrim_core::{Axis, Point3f};
use cloudtrim_editor::{EditSession, EditorConfig};
use cloudtrim_io::{PcdWriteOptions, DEFAULT_EXPORT_FILE_NAME};
use cloudtrim_selection::Viewport;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Mode {
    /// Delete the points inside the boxes
    Inside,
    /// Keep only the points inside the boxes
    Outside,
}

#[derive(Parser)]
#[command(name = "crop_cloud", version, about = "Crop a point cloud with screen-space boxes")]
struct Args {
    /// Whitespace-separated `x y z` rows; extra columns are ignored
    input: PathBuf,

    /// Selection box in pixels as `x0,y0,x1,y1`; repeatable
    #[arg(long = "box", value_parser = parse_box)]
    boxes: Vec<(Point2<f32>, Point2<f32>)>,

    #[arg(short, long, value_enum, default_value_t = Mode::Inside)]
    mode: Mode,

    /// Rotation applied before selecting, as `axis:radians`; repeatable
    #[arg(long, value_parser = parse_rotation)]
    rotate: Vec<(Axis, f32)>,

    #[arg(long, default_value_t = 1280.0)]
    width: f32,

    #[arg(long, default_value_t = 720.0)]
    height: f32,

    #[arg(short, long, default_value = DEFAULT_EXPORT_FILE_NAME)]
    output: PathBuf,

    /// Write binary PCD
    #[arg(long, conflicts_with = "strict_rgb")]
    binary: bool,

    /// Write `rgb` as a float-reinterpreted packed value
    #[arg(long)]
    strict_rgb: bool,
}

fn parse_box(s: &str) -> Result<(Point2<f32>, Point2<f32>), String> {
    let values: Vec<f32> = s
        .split(',')
        .map(|v| v.trim().parse::<f32>().map_err(|e| format!("{v:?}: {e}")))
        .collect::<Result<_, _>>()?;
    match values.as_slice() {
        [x0, y0, x1, y1] => Ok((Point2::new(*x0, *y0), Point2::new(*x1, *y1))),
        _ => Err(format!("expected x0,y0,x1,y1, got {} values", values.len())),
    }
}

fn parse_rotation(s: &str) -> Result<(Axis, f32), String> {
    let (axis, angle) = s.split_once(':').ok_or("expected axis:radians")?;
    let axis: Axis = axis.parse().map_err(|e| format!("{e}"))?;
    let angle: f32 = angle.trim().parse().map_err(|e| format!("{angle:?}: {e}"))?;
    Ok((axis, angle))
}

fn read_xyz(path: &Path) -> Result<Vec<Point3f>> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let mut points = Vec::new();
    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let coords: Vec<f32> = line
            .split_whitespace()
            .take(3)
            .map(str::parse)
            .collect::<Result<_, _>>()
            .with_context(|| format!("{}:{}", path.display(), line_no + 1))?;
        if coords.len() != 3 {
            bail!("{}:{}: expected 3 coordinates", path.display(), line_no + 1);
        }
        points.push(Point3f::new(coords[0], coords[1], coords[2]));
    }
    Ok(points)
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();

    let mut config = EditorConfig::default();
    config.export = if args.binary {
        PcdWriteOptions::binary()
    } else if args.strict_rgb {
        PcdWriteOptions::strict_ascii()
    } else {
        PcdWriteOptions::default()
    };

    let mut session = EditSession::new(config);
    session.set_viewport(Viewport::new(args.width, args.height));
    session.load(read_xyz(&args.input)?);

    for (axis, angle) in &args.rotate {
        session.rotate(*axis, *angle);
    }
    for (start, end) in &args.boxes {
        session.add_box(*start, *end);
    }
    info!(selected = session.selection().len(), boxes = args.boxes.len(), "selection ready");

    let removed = match args.mode {
        Mode::Inside => session.delete_inside()?,
        Mode::Outside => session.delete_outside()?,
    };

    session
        .export_pcd_to_file(&args.output)
        .with_context(|| format!("writing {}", args.output.display()))?;
    info!(removed, kept = session.buffer().len(), output = %args.output.display(), "done");
    Ok(())
}
