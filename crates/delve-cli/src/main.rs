//! delve: world engine inspection tool
//!
//! Runs the interior generators, reconciles proposal files into a saved
//! world, and lists where the overworld can still grow.

use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use delve_core::generation::{LayoutGenerator, TowerGenerator, generator_for};
use delve_core::reconcile::{fallback_proposals, proposals_or_fallback};
use delve_core::save::{LoadedWorld, load_world, save_world};
use delve_core::world::{Category, CoordinateGrid, Direction, Location};
use delve_core::{AreaReconciler, Proposal, ReconcileMode, WorldOptions};

type CliResult<T> = Result<T, Box<dyn Error>>;

/// Spatial world engine
#[derive(Parser, Debug)]
#[command(name = "delve")]
#[command(author, version, about = "Grow and inspect a delve world", long_about = None)]
struct Args {
    /// Options file (JSON, or OPTIONS=/BOUNDS= lines)
    #[arg(short = 'o', long = "options", global = true)]
    options: Option<PathBuf>,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short = 'v', long = "verbose", global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a generated interior layout as JSON
    Generate {
        /// Area category (dungeon, cave, town, tower, ...)
        #[arg(short = 'c', long = "category")]
        category: String,

        #[arg(short = 's', long = "seed", default_value_t = 0)]
        seed: u64,

        /// Print named proposals for this owner instead of raw templates
        #[arg(long = "owner")]
        owner: Option<String>,
    },

    /// Commit a batch of proposals into a world file
    Reconcile {
        /// World file; created with a single starting location if missing
        #[arg(short = 'w', long = "world")]
        world: PathBuf,

        /// JSON list of proposals; the seeded fallback is used when absent
        /// or unreadable
        #[arg(short = 'p', long = "proposals")]
        proposals: Option<PathBuf>,

        /// Expand the overworld next to this location
        #[arg(long = "anchor", requires = "direction", conflicts_with = "owner")]
        anchor: Option<String>,

        #[arg(long = "direction", requires = "anchor")]
        direction: Option<Direction>,

        /// Populate the interior of this location
        #[arg(long = "owner")]
        owner: Option<String>,

        /// Category for fallback proposals when expanding
        #[arg(short = 'c', long = "category", default_value = "dungeon")]
        category: String,

        /// Name for fallback proposals when expanding
        #[arg(long = "name", default_value = "Uncharted Depths")]
        name: String,

        /// Name of the starting location of a new world
        #[arg(long = "start", default_value = "Crossroads")]
        start: String,

        #[arg(short = 's', long = "seed", default_value_t = 0)]
        seed: u64,
    },

    /// List empty cells next to the explored overworld
    Frontier {
        #[arg(short = 'w', long = "world")]
        world: PathBuf,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "delve failed");
            eprintln!("delve: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: Args) -> CliResult<()> {
    let options = match &args.options {
        Some(path) => WorldOptions::load_from_file(path)?,
        None => WorldOptions::default(),
    };

    match args.command {
        Command::Generate {
            category,
            seed,
            owner,
        } => generate(&options, &Category::parse(&category), seed, owner.as_deref()),
        Command::Reconcile {
            world,
            proposals,
            anchor,
            direction,
            owner,
            category,
            name,
            start,
            seed,
        } => {
            let mode = match (anchor, direction, owner) {
                (Some(anchor), Some(direction), None) => ReconcileMode::Expansion { anchor, direction },
                (None, None, Some(owner)) => ReconcileMode::PopulateInterior { owner },
                _ => return Err("give either --owner or both --anchor and --direction".into()),
            };
            let mut grid = open_world(&world, &start)?;
            let (fallback_category, fallback_owner) = match &mode {
                ReconcileMode::PopulateInterior { owner } => {
                    let category = grid
                        .get_by_name(owner)
                        .map(|loc| loc.category.clone())
                        .ok_or_else(|| format!("no location named '{}'", owner))?;
                    (category, owner.clone())
                }
                ReconcileMode::Expansion { .. } => (Category::parse(&category), name),
            };
            let batch = proposals_or_fallback(
                read_proposals(proposals.as_deref()),
                &fallback_category,
                &fallback_owner,
                seed,
                &options,
            );

            let outcome = AreaReconciler::new(options).reconcile(&mut grid, &mode, &batch, seed)?;
            save_world(&grid, &world)?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            Ok(())
        }
        Command::Frontier { world } => {
            let grid = match load_world(&world)? {
                LoadedWorld::Gridded(grid) => grid,
                LoadedWorld::Ungridded(_) => {
                    return Err("legacy world has no coordinates; nothing to expand".into());
                }
            };
            let exits = grid.find_frontier_exits();
            for exit in &exits {
                let from = grid
                    .get_by_coordinates(exit.from.0, exit.from.1)
                    .map(Location::name)
                    .unwrap_or("?");
                println!(
                    "{} ({}, {}) {} -> ({}, {})",
                    from, exit.from.0, exit.from.1, exit.direction, exit.target.0, exit.target.1
                );
            }
            println!("{} frontier exits across {} locations", exits.len(), grid.len());
            Ok(())
        }
    }
}

fn generate(
    options: &WorldOptions,
    category: &Category,
    seed: u64,
    owner: Option<&str>,
) -> CliResult<()> {
    if let Some(owner) = owner {
        let proposals = fallback_proposals(category, owner, seed, options);
        println!("{}", serde_json::to_string_pretty(&proposals)?);
        return Ok(());
    }

    let bounds = options.subgrid_bounds(category);
    let generator: Box<dyn LayoutGenerator> = if *category == Category::Tower {
        Box::new(TowerGenerator::with_treasure_chance(options.tower_treasure_chance))
    } else {
        generator_for(category)
            .ok_or_else(|| format!("no interior generator for category '{}'", category))?
    };
    let rooms = generator.generate(&bounds, seed);
    tracing::info!(generator = generator.name(), rooms = rooms.len(), seed, "Layout generated");
    println!("{}", serde_json::to_string_pretty(&rooms)?);
    Ok(())
}

fn open_world(path: &Path, start: &str) -> CliResult<CoordinateGrid> {
    if !path.exists() {
        let mut grid = CoordinateGrid::new();
        grid.add_location(Location::new(start, Category::Plains), 0, 0)?;
        tracing::info!(path = %path.display(), start, "Starting a new world");
        return Ok(grid);
    }
    match load_world(path)? {
        LoadedWorld::Gridded(grid) => Ok(grid),
        LoadedWorld::Ungridded(_) => {
            Err("legacy world has no coordinates and cannot be reconciled".into())
        }
    }
}

fn read_proposals(path: Option<&Path>) -> Result<Vec<Proposal>, String> {
    let path = path.ok_or_else(|| "no proposal file given".to_string())?;
    let contents = std::fs::read_to_string(path)
        .map_err(|e| format!("{}: {}", path.display(), e))?;
    serde_json::from_str(&contents).map_err(|e| format!("{}: {}", path.display(), e))
}
