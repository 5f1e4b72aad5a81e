mod display;

use clap::{Parser, Subcommand};
use display::output::{
    display_cache_summary, display_counters, display_error, display_favorites, display_hero_stats,
    display_info, display_precache_report, display_success, display_warning,
};
use dota_helper::analysis::favorites::summarize_favorites;
use dota_helper::api::browser::{BrowserRenderer, RenderOptions};
use dota_helper::api::client::DotabuffClient;
use dota_helper::api::models::Hero;
use dota_helper::cache::CacheStore;
use dota_helper::config::Config;
use dota_helper::directory::{FavoritesStore, HeroDirectory, PatchStore};
use dota_helper::error::AppError;
use dota_helper::logging;
use dota_helper::scrape::identity::{slug_from_name, SlugHashResolver};
use dota_helper::service::{ServiceParts, StatsService};
use indicatif::ProgressBar;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

#[derive(Parser, Debug)]
#[command(name = "Dota Helper")]
#[command(about = "Hero statistics and counterpicks scraped from Dotabuff", long_about = None)]
struct Args {
    /// Data directory for caches, heroes and patch (default: platform data dir)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Set the current patch version. A new version clears both caches
    Patch { version: String },

    /// Refresh the hero directory from OpenDota
    Heroes,

    /// Show aggregate hero statistics for the current patch
    Stats {
        /// Ignore a valid cache and fetch fresh data
        #[arg(long)]
        refresh: bool,
    },

    /// Show counterpicks for one hero (display name or slug)
    Counters {
        hero: String,

        /// Number of counters to display (default: 10)
        #[arg(short, long, default_value = "10")]
        top_n: usize,

        /// Ignore the cached entry and fetch fresh data
        #[arg(long)]
        refresh: bool,
    },

    /// Cache counterpicks for every hero. Press Enter to cancel
    Precache,

    /// Show counterpicks cache status
    Cache,

    /// Clear the counterpicks cache
    ClearCounters,

    /// List favorite heroes with win rate and viable positions, or edit the list
    Favorites {
        #[command(subcommand)]
        action: Option<FavoritesAction>,
    },
}

#[derive(Subcommand, Debug)]
enum FavoritesAction {
    /// Add a hero (display name or slug)
    Add { hero: String },
    /// Remove a hero (display name or slug)
    Remove { hero: String },
    /// Show the favorites table (default)
    List,
}

fn main() {
    let args = Args::parse();

    if let Err(e) = logging::init() {
        display_error(&e.to_string());
    }

    if let Err(e) = run(args) {
        display_error(&e.to_string());
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), AppError> {
    let mut config = Config::from_env()?;
    if let Some(dir) = args.data_dir {
        config.data_dir = dir;
    }

    let directory = HeroDirectory::new(&config.data_dir);
    let patches = PatchStore::new(&config.data_dir);
    let client = Arc::new(DotabuffClient::new(&config));

    if let Command::Heroes = args.command {
        display_info("Fetching heroes data from OpenDota API...");
        let heroes = client.fetch_hero_directory()?;
        directory.save(&heroes)?;
        display_success(&format!("{} heroes fetched and saved locally", heroes.len()));
        return Ok(());
    }

    let command = match args.command {
        Command::Favorites { action } => {
            let heroes = directory.load()?;
            return favorites(&config.data_dir, &heroes, action.unwrap_or(FavoritesAction::List));
        }
        command => command,
    };

    let renderer = Arc::new(BrowserRenderer::new(
        RenderOptions::from_config(&config),
        config.request_interval,
    ));
    let service = StatsService::new(
        ServiceParts {
            source: client,
            renderer: renderer.clone(),
            resolver: Arc::new(SlugHashResolver),
            store: CacheStore::new(&config.data_dir),
            base_url: config.base_url.clone(),
            render_timeout: config.render_timeout,
        },
        directory.load()?,
    );

    let result = dispatch(&service, &patches, command);
    renderer.shutdown();
    result
}

fn dispatch(service: &StatsService, patches: &PatchStore, command: Command) -> Result<(), AppError> {
    match command {
        Command::Heroes | Command::Favorites { .. } => Ok(()),
        Command::Patch { version } => set_patch(service, patches, &version),
        Command::Stats { refresh } => show_stats(service, &current_patch(patches)?, refresh),
        Command::Counters { hero, top_n, refresh } => {
            show_counters(service, &current_patch(patches)?, &hero, top_n, refresh)
        }
        Command::Precache => precache(service, &current_patch(patches)?),
        Command::Cache => {
            let summary = service.cache_summary()?;
            let patch = patches.current()?.map(|p| p.version);
            display_cache_summary(&summary, patch.as_deref(), service.heroes().len());
            Ok(())
        }
        Command::ClearCounters => {
            service.clear_counters_cache()?;
            display_success("Counterpicks cache cleared");
            Ok(())
        }
    }
}

fn current_patch(patches: &PatchStore) -> Result<String, AppError> {
    patches.current()?.map(|p| p.version).ok_or_else(|| {
        AppError::ConfigError("No patch version set. Run `dota-helper patch <VERSION>` first".to_string())
    })
}

fn set_patch(service: &StatsService, patches: &PatchStore, version: &str) -> Result<(), AppError> {
    let previous = patches.current()?.map(|p| p.version);
    let patch = patches.set(version)?;

    if previous.as_deref() != Some(patch.version.as_str()) {
        service.reset_for_patch()?;
        display_info("Cached statistics and counterpicks cleared for the new patch");
    }
    display_success(&format!("Patch updated to: {}", patch.version));
    Ok(())
}

fn show_stats(service: &StatsService, patch: &str, refresh: bool) -> Result<(), AppError> {
    if !refresh && service.has_valid_aggregate_cache(patch) {
        display_success("Using cached statistics (less than 1 day old)");
        let stats = service.cached_aggregate_stats()?.unwrap_or_default();
        display_hero_stats(&stats, patch);
        return Ok(());
    }

    if !refresh {
        match service.cached_aggregate()? {
            Some(cache) => display_warning(&format!(
                "Statistics are {} day(s) old. Fetching fresh data from Dotabuff...",
                cache.age_at(chrono::Utc::now()).num_days()
            )),
            None => display_warning("No statistics found. Fetching from Dotabuff..."),
        }
    }
    display_info("This will take approximately 25 seconds (5 positions with 5-second delays)");

    let stats = match service.fetch_aggregate_stats(patch)? {
        Some(stats) => {
            display_success(&format!("Successfully fetched stats for {} heroes", stats.len()));
            stats
        }
        None => {
            display_error("Failed to fetch. Using cached data if available.");
            service.cached_aggregate_stats()?.unwrap_or_default()
        }
    };

    display_hero_stats(&stats, patch);
    Ok(())
}

fn show_counters(
    service: &StatsService,
    patch: &str,
    hero: &str,
    top_n: usize,
    refresh: bool,
) -> Result<(), AppError> {
    let (name, slug) = match HeroDirectory::find(service.heroes(), hero) {
        Some(found) => (found.localized_name.clone(), found.slug()),
        None => (hero.to_string(), slug_from_name(hero)),
    };

    display_info(&format!("Loading counterpicks for {}...", name));
    let counters = if refresh {
        service.refetch_counters(&slug, patch)?
    } else {
        service.fetch_counters(&slug, patch)?
    };

    match counters {
        Some(counters) => display_counters(&name, &counters, top_n),
        None => display_error(&format!(
            "Failed to fetch counterpicks for {}. Try again in a moment.",
            name
        )),
    }
    Ok(())
}

fn precache(service: &StatsService, patch: &str) -> Result<(), AppError> {
    let heroes = service.heroes().to_vec();
    if heroes.is_empty() {
        return Err(AppError::NoHeroes);
    }

    display_info(&format!("Preparing to cache counterpicks for {} heroes...", heroes.len()));
    display_info("Press Enter to cancel at any time.");

    let cancelled = Arc::new(AtomicBool::new(false));
    {
        let cancelled = Arc::clone(&cancelled);
        thread::spawn(move || {
            let mut line = String::new();
            // EOF (non-interactive stdin) is not a cancel request.
            if let Ok(read) = std::io::stdin().read_line(&mut line) {
                if read > 0 {
                    cancelled.store(true, Ordering::SeqCst);
                }
            }
        });
    }

    let pb = ProgressBar::new(heroes.len() as u64);
    pb.set_message("heroes cached");
    let report = service.pre_cache_report(
        patch,
        &heroes,
        |done, _total| pb.set_position(done as u64),
        || !cancelled.load(Ordering::SeqCst),
    );
    pb.finish_and_clear();

    display_precache_report(&report?);
    Ok(())
}

fn favorites(data_dir: &Path, heroes: &[Hero], action: FavoritesAction) -> Result<(), AppError> {
    if heroes.is_empty() {
        return Err(AppError::NoHeroes);
    }
    let store = FavoritesStore::new(data_dir);

    match action {
        FavoritesAction::Add { hero } => {
            let hero = find_hero(heroes, &hero)?;
            if store.add(hero.id)? {
                display_success(&format!("Added {} to favorites", hero.localized_name));
            } else {
                display_info(&format!("{} is already a favorite", hero.localized_name));
            }
        }
        FavoritesAction::Remove { hero } => {
            let hero = find_hero(heroes, &hero)?;
            if store.remove(hero.id)? {
                display_success(&format!("Removed {} from favorites", hero.localized_name));
            } else {
                display_info(&format!("{} is not a favorite", hero.localized_name));
            }
        }
        FavoritesAction::List => {
            let stats = CacheStore::new(data_dir)
                .load_aggregate()?
                .map(|cache| cache.stats)
                .unwrap_or_default();
            if stats.is_empty() {
                display_warning("No cached statistics. Run `dota-helper stats` for win rates and positions");
            }
            display_favorites(&summarize_favorites(&store.load()?, heroes, &stats));
        }
    }
    Ok(())
}

fn find_hero<'h>(heroes: &'h [Hero], query: &str) -> Result<&'h Hero, AppError> {
    HeroDirectory::find(heroes, query)
        .ok_or_else(|| AppError::ConfigError(format!("Unknown hero: {}", query)))
}
