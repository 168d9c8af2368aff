//! Headless map tool
//!
//! Run with: gmap_editor info world.gmap --root ./levels
//!           gmap_editor resave in.nw out.nw

use clap::{Parser, Subcommand};
use gmap_editor::{EditorConfig, LevelDocument};
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Editor configuration file (JSON)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the shape of a map and what each level contains
    Info {
        file: PathBuf,
        /// Treat the file as a map descriptor even without a .gmap extension
        #[arg(long)]
        gmap: bool,
        /// Directory searched for the levels of a map descriptor
        #[arg(long, value_name = "DIR")]
        root: Option<PathBuf>,
    },
    /// Read a level file and write it back in normalised form
    Resave { input: PathBuf, output: PathBuf },
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EditorConfig::load_or_default(path),
        None => EditorConfig::default(),
    };

    let result = match cli.command {
        Command::Info { file, gmap, root } => {
            let mut config = config;
            if root.is_some() {
                config.search_root = root;
            }
            info_command(&file, gmap, &config)
        }
        Command::Resave { input, output } => resave_command(&input, &output, &config),
    };

    if let Err(err) = result {
        error!("{}", err);
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn is_gmap(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gmap"))
}

fn info_command(file: &Path, gmap: bool, config: &EditorConfig) -> gmap_core::Result<()> {
    let mut document = if gmap || is_gmap(file) {
        LevelDocument::open_gmap(file, config)?
    } else {
        LevelDocument::open_level(file, config)?
    };

    let map = document.map_mut();
    println!(
        "{}: {}x{} levels, {}x{} tiles",
        file.display(),
        map.width(),
        map.height(),
        map.width_tiles(),
        map.height_tiles()
    );

    for y in 0..map.height() {
        for x in 0..map.width() {
            let name = map
                .source()
                .map(|source| source.level_name(x, y).to_string())
                .unwrap_or_default();
            match map.get_level(x, y)? {
                Some(level) => println!(
                    "  ({}, {}) {}: {} layers, {} links, {} signs, {} npcs",
                    x,
                    y,
                    name,
                    level.layer_count(),
                    level.links.len(),
                    level.signs.len(),
                    level.npcs().len()
                ),
                None if name.is_empty() => {}
                None => println!("  ({}, {}) {}: not found", x, y, name),
            }
        }
    }
    Ok(())
}

fn resave_command(input: &Path, output: &Path, config: &EditorConfig) -> gmap_core::Result<()> {
    let level = gmap_core::nw::load_level(input, config.map.level_size())?;
    gmap_core::nw::save_level(&level, output)?;
    info!("Wrote {:?}", output);
    Ok(())
}
