use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Args, CommandFactory, Parser, Subcommand};
use pocketdex_core::api::{PageStore, WikiClient};
use pocketdex_core::config::load_config;
use pocketdex_core::import::{ImportOptions, run_import};
use pocketdex_core::report::ImportReport;
use pocketdex_core::runtime::{
    PathOverrides, ResolvedPaths, ensure_layout, init_layout, resolve_paths,
};

#[derive(Debug, Parser)]
#[command(
    name = "pocketdex",
    version,
    about = "Import Pokémon TCG Pocket card data from Bulbapedia into the pokemon-tcg-data format"
)]
struct Cli {
    #[arg(long, global = true, value_name = "PATH")]
    project_root: Option<PathBuf>,
    #[arg(long, global = true, value_name = "PATH")]
    cache_dir: Option<PathBuf>,
    #[arg(long, global = true, value_name = "PATH")]
    out_dir: Option<PathBuf>,
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Print resolved runtime diagnostics")]
    diagnostics: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Clone)]
struct RuntimeOptions {
    project_root: Option<PathBuf>,
    cache_dir: Option<PathBuf>,
    out_dir: Option<PathBuf>,
    config: Option<PathBuf>,
    diagnostics: bool,
}

impl RuntimeOptions {
    fn from_cli(cli: &Cli) -> Self {
        Self {
            project_root: cli.project_root.clone(),
            cache_dir: cli.cache_dir.clone(),
            out_dir: cli.out_dir.clone(),
            config: cli.config.clone(),
            diagnostics: cli.diagnostics,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    Import(ImportArgs),
    Status,
    Init(InitArgs),
}

#[derive(Debug, Args)]
struct ImportArgs {
    #[arg(long, help = "Read pages from the cache only; never touch the network")]
    offline: bool,
    #[arg(long, help = "Skip merging the upstream base catalog into the sets index")]
    no_base: bool,
}

#[derive(Debug, Args)]
struct InitArgs {
    #[arg(long, help = "Overwrite an existing config file")]
    force: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let runtime = RuntimeOptions::from_cli(&cli);

    match cli.command {
        Some(Commands::Import(args)) => cmd_import(&runtime, args),
        Some(Commands::Status) => cmd_status(&runtime),
        Some(Commands::Init(args)) => cmd_init(&runtime, args),
        None => {
            let mut command = Cli::command();
            command.print_help()?;
            println!();
            Ok(())
        }
    }
}

fn cmd_import(runtime: &RuntimeOptions, args: ImportArgs) -> Result<()> {
    let paths = resolve_runtime_paths(runtime)?;
    let config = load_config(&paths.config_path)?;
    ensure_layout(&paths)?;

    let store = if args.offline {
        PageStore::offline(&paths)
    } else {
        let client = WikiClient::new(&config.api_url(), &config.user_agent())?;
        PageStore::new(client, &paths)
    };

    let report = run_import(
        &store,
        &config,
        &paths,
        &ImportOptions {
            merge_base: !args.no_base,
        },
    )?;
    print_report(&report);
    if runtime.diagnostics {
        println!("\n[diagnostics]\n{}", paths.diagnostics());
    }
    Ok(())
}

fn print_report(report: &ImportReport) {
    println!("\nimport complete");
    println!("sets: {}", report.sets.len());
    for set in &report.sets {
        if set.skipped_cards > 0 {
            println!(
                "  {}: {} ({} cards, {} skipped)",
                set.id, set.name, set.total, set.skipped_cards
            );
        } else {
            println!("  {}: {} ({} cards)", set.id, set.name, set.total);
        }
    }
    println!("cards: {}", report.total_cards());
    if report.skipped_sets > 0 {
        println!("skipped_sets: {}", report.skipped_sets);
    }
    if !report.warnings.is_empty() {
        println!("warnings:");
        for warning in &report.warnings {
            println!("  - {warning}");
        }
    }
}

fn cmd_status(runtime: &RuntimeOptions) -> Result<()> {
    let paths = resolve_runtime_paths(runtime)?;
    let config = load_config(&paths.config_path)?;

    println!("runtime status");
    println!("project_root: {}", normalize_path(&paths.project_root));
    println!(
        "config: {} ({})",
        normalize_path(&paths.config_path),
        if paths.config_path.exists() {
            "found"
        } else {
            "missing"
        }
    );
    println!("api_url: {}", config.api_url());
    println!("category: {}", config.category());
    println!(
        "cached_set_pages: {}",
        count_cached_pages(&paths.sets_cache_dir)
    );
    println!(
        "cached_card_pages: {}",
        count_cached_pages(&paths.cards_cache_dir)
    );
    println!(
        "sets_index_exists: {}",
        format_flag(paths.sets_out_dir.join("en.json").exists())
    );
    if runtime.diagnostics {
        println!("\n[diagnostics]\n{}", paths.diagnostics());
    }
    Ok(())
}

fn cmd_init(runtime: &RuntimeOptions, args: InitArgs) -> Result<()> {
    let paths = resolve_runtime_paths(runtime)?;
    let report = init_layout(&paths, args.force)?;

    println!("Initialized pocketdex runtime layout");
    println!("project_root: {}", normalize_path(&paths.project_root));
    println!("cache_dir: {}", normalize_path(&paths.cache_dir));
    println!("out_dir: {}", normalize_path(&paths.out_dir));
    println!("created_dirs: {}", report.created_dirs.len());
    println!("wrote_config: {}", report.wrote_config);
    if runtime.diagnostics {
        println!("\n[diagnostics]\n{}", paths.diagnostics());
    }
    Ok(())
}

fn resolve_runtime_paths(runtime: &RuntimeOptions) -> Result<ResolvedPaths> {
    dotenvy::dotenv().ok();

    let overrides = PathOverrides {
        project_root: runtime.project_root.clone(),
        cache_dir: runtime.cache_dir.clone(),
        out_dir: runtime.out_dir.clone(),
        config: runtime.config.clone(),
    };

    let initial = resolve_paths(&overrides)?;
    let project_env = initial.project_root.join(".env");
    if project_env.exists() {
        let _ = dotenvy::from_path_override(&project_env);
    }

    resolve_paths(&overrides)
}

fn count_cached_pages(dir: &Path) -> usize {
    let Ok(entries) = fs::read_dir(dir) else {
        return 0;
    };
    entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_string_lossy().ends_with(".wikitext"))
        .count()
}

fn normalize_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

fn format_flag(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}
