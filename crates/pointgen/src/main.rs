use anyhow::{ensure, Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use pointfile::{shapes, PointMesh, DEFAULT_POINTS_FILE};
use std::{
    io::{self, Write},
    path::{Path, PathBuf},
    time::Instant,
};

/// Creates and reshapes point files for the stream viewer.
#[derive(Parser, Debug)]
#[command(name = "pointgen", version, about)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a centred lattice cube of `side_count`³ points, or one filling
    /// an edge of `--side` world units.
    Cube {
        #[arg(long, default_value_t = 70)]
        side_count: usize,

        /// Edge length; overrides `--side-count`.
        #[arg(long, conflicts_with = "side_count")]
        side: Option<f32>,

        #[arg(long, default_value_t = 0.01)]
        step: f32,

        #[arg(long, default_value = DEFAULT_POINTS_FILE)]
        out: PathBuf,
    },

    /// Write the lattice points inside a sphere.
    Sphere {
        #[arg(long, default_value_t = 2.0)]
        radius: f32,

        #[arg(long, default_value_t = 0.03)]
        step: f32,

        #[arg(long, default_value = DEFAULT_POINTS_FILE)]
        out: PathBuf,
    },

    /// Smooth a cloud by pulling each point towards its neighbours.
    Relax {
        /// Points closer than this are neighbours.
        #[arg(long)]
        radius: f32,

        /// Share of the way towards the neighbour centroid moved per iteration.
        #[arg(long, default_value_t = 0.5)]
        factor: f32,

        #[arg(long, default_value_t = 3)]
        iterations: usize,

        /// Drop points that end up with no neighbour.
        #[arg(long, default_value_t = false)]
        prune: bool,

        #[arg(long, default_value = DEFAULT_POINTS_FILE)]
        input: PathBuf,

        /// Defaults to overwriting `--input`.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Write an empty points file.
    Clear {
        #[arg(long, default_value = DEFAULT_POINTS_FILE)]
        out: PathBuf,
    },

    /// Print a points file as the viewer's wire format (a JSON array of triples).
    Json {
        #[arg(long, default_value = DEFAULT_POINTS_FILE)]
        input: PathBuf,
    },
}

fn write(out: &Path, points: &[pointfile::Point3]) -> Result<()> {
    let written = pointfile::write_points(out, points)
        .with_context(|| format!("writing {}", out.display()))?;
    info!("Wrote {} points to {}", written, out.display());
    Ok(())
}

fn read(input: &Path) -> Result<Vec<pointfile::Point3>> {
    pointfile::read_points(input).with_context(|| format!("reading {}", input.display()))
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();

    match args.command {
        Command::Cube {
            side_count,
            side,
            step,
            out,
        } => {
            ensure!(step > 0.0, "--step must be positive");
            let points = match side {
                Some(side) => {
                    ensure!(side > 0.0, "--side must be positive");
                    shapes::filled_cube(side, step)
                }
                None => shapes::cube(side_count, step),
            };
            write(&out, &points)?;
        }
        Command::Sphere { radius, step, out } => {
            ensure!(step > 0.0, "--step must be positive");
            ensure!(radius > 0.0, "--radius must be positive");
            write(&out, &shapes::sphere(radius, step))?;
        }
        Command::Relax {
            radius,
            factor,
            iterations,
            prune,
            input,
            out,
        } => {
            ensure!(radius > 0.0, "--radius must be positive");

            let t0 = Instant::now();
            let mut mesh = PointMesh::new(read(&input)?);
            mesh.establish_connections(radius);

            let before = mesh.statistics();
            info!(
                "Before: {} points, {:.2} neighbours/point, {} isolated",
                mesh.points.len(),
                before.average_connections,
                before.unconnected
            );

            for _ in 0..iterations {
                mesh.relaxation_step(factor);
                mesh.establish_connections(radius);
            }

            if prune {
                mesh.remove_unconnected_points();
            }

            let after = mesh.statistics();
            info!(
                "After {} iterations: {} points, {:.2} neighbours/point, {} isolated ({:.2?})",
                iterations,
                mesh.points.len(),
                after.average_connections,
                after.unconnected,
                t0.elapsed()
            );

            write(out.as_deref().unwrap_or(&input), &mesh.points)?;
        }
        Command::Clear { out } => {
            write(&out, &[])?;
        }
        Command::Json { input } => {
            let points = read(&input)?;
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            serde_json::to_writer(&mut lock, &points)?;
            writeln!(lock)?;
        }
    }

    Ok(())
}
