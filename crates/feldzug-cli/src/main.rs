//! Feldzug command line tools.
//!
//! Generates skirmish scenarios and inspects scenario files without a
//! graphical client.

use anyhow::Context;
use clap::{Parser, Subcommand};
use feldzug_core::{Battlefield, Cell, ScenarioSnapshot, Side};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Feldzug scenario toolbox
#[derive(Parser, Debug)]
#[command(name = "feldzug")]
#[command(about = "Generate and inspect Feldzug scenarios")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a random skirmish scenario
    Generate {
        /// Grid rows
        #[arg(long, default_value_t = 12)]
        rows: u32,

        /// Grid columns
        #[arg(long, default_value_t = 16)]
        cols: u32,

        /// Random seed for reproducible scenarios
        #[arg(long)]
        seed: Option<u64>,

        /// File to write, stdout when omitted
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Load a scenario file and print a summary
    Inspect {
        /// Scenario JSON file
        scenario: PathBuf,

        /// Also print the occupancy grid
        #[arg(long)]
        map: bool,
    },
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Generate {
            rows,
            cols,
            seed,
            out,
        } => generate(rows, cols, seed, out),
        Command::Inspect { scenario, map } => inspect(&scenario, map),
    }
}

fn generate(rows: u32, cols: u32, seed: Option<u64>, out: Option<PathBuf>) -> anyhow::Result<()> {
    anyhow::ensure!(rows >= 5 && cols >= 5, "grid must be at least 5x5");
    let seed = seed.unwrap_or_else(|| rand::random());
    info!("generating {}x{} skirmish with seed {}", rows, cols, seed);

    let snapshot =
        ScenarioSnapshot::skirmish_with_rng(rows, cols, &mut StdRng::seed_from_u64(seed));
    let json = snapshot.to_json()?;
    match out {
        Some(path) => {
            std::fs::write(&path, json)
                .with_context(|| format!("writing {}", path.display()))?;
            info!("wrote {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn inspect(path: &Path, map: bool) -> anyhow::Result<()> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let snapshot = ScenarioSnapshot::from_json(&json)?;

    let mut field = Battlefield::standard();
    field.apply_scenario(&snapshot)?;

    println!("Scenario: {}", field.name);
    if !field.description.is_empty() {
        println!("{}", field.description);
    }
    println!(
        "Grid: {}x{}  Turn: {}  Side to move: {:?}",
        field.rows(),
        field.cols(),
        field.turn(),
        field.current_side()
    );
    print!("{}", field.dump_map());
    println!("Units: {}", field.units().len());

    if map {
        print!("{}", render_grid(&field));
    }
    Ok(())
}

/// ASCII occupancy sketch, one token per hex: unit side digit, `*` for an
/// unheld objective, `-` for empty ground
fn render_grid(field: &Battlefield) -> String {
    let mut out = String::new();
    for row in 0..field.rows() as i32 {
        if row % 2 == 1 {
            out.push(' ');
        }
        for col in 0..field.cols() as i32 {
            let cell = Cell::new(row, col);
            let token = match field.unit_at(cell, false).and_then(|unit| unit.side()) {
                Some(Side::Axis) => '0',
                Some(Side::Allies) => '1',
                None => {
                    if field.hex(cell).victory_side.is_some() {
                        '*'
                    } else {
                        '-'
                    }
                }
            };
            out.push(token);
            out.push(' ');
        }
        out.push('\n');
    }
    out
}
