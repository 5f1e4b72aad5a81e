use chrono::{DateTime, Utc};
use colored::*;
use dota_helper::analysis::favorites::FavoriteSummary;
use dota_helper::cache::CacheSummary;
use dota_helper::models::{CounterEntry, HeroStat};
use dota_helper::precache::{PreCacheReport, RunOutcome};
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
struct StatRow {
    #[tabled(rename = "#")]
    rank: String,
    hero: String,
    #[tabled(rename = "win rate")]
    win_rate: String,
    #[tabled(rename = "ban rate")]
    ban_rate: String,
    mid: String,
    safe: String,
    off: String,
    #[tabled(rename = "soft sup")]
    support_safe: String,
    #[tabled(rename = "hard sup")]
    support_off: String,
}

#[derive(Tabled)]
struct CounterRow {
    #[tabled(rename = "#")]
    rank: String,
    hero: String,
    disadvantage: String,
    #[tabled(rename = "win rate")]
    win_rate: String,
    matches: String,
}

#[derive(Tabled)]
struct FavoriteRow {
    hero: String,
    positions: String,
    #[tabled(rename = "win rate")]
    win_rate: String,
}

pub fn display_hero_stats(stats: &[HeroStat], patch_version: &str) {
    println!(
        "\n{}",
        format!("📊 Hero statistics for patch {}", patch_version)
            .bold()
            .cyan()
    );
    println!("{}\n", "=".repeat(80).cyan());

    if stats.is_empty() {
        println!("{}", "No statistics available".yellow());
        return;
    }

    let mut sorted: Vec<&HeroStat> = stats.iter().collect();
    sorted.sort_by(|a, b| b.win_rate.total_cmp(&a.win_rate));

    let rows: Vec<StatRow> = sorted
        .iter()
        .enumerate()
        .map(|(idx, stat)| StatRow {
            rank: format!("{}", idx + 1),
            hero: stat.localized_name.clone(),
            win_rate: win_rate_cell(stat.win_rate),
            ban_rate: format!("{:.2}%", stat.ban_rate),
            mid: format!("{:.2}%", stat.pick_rate_core_mid),
            safe: format!("{:.2}%", stat.pick_rate_core_safe),
            off: format!("{:.2}%", stat.pick_rate_core_off),
            support_safe: format!("{:.2}%", stat.pick_rate_support_safe),
            support_off: format!("{:.2}%", stat.pick_rate_support_off),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}", table);

    if let Some(first) = stats.first() {
        println!(
            "\n{} {}\n",
            "Last fetched:".bold(),
            first.last_fetched.format("%Y-%m-%d %H:%M UTC")
        );
    }
}

pub fn display_counters(hero_name: &str, counters: &[CounterEntry], top_n: usize) {
    println!(
        "\n{}",
        format!("⚔️  Counters for {}", hero_name).bold().cyan()
    );
    println!("{}\n", "=".repeat(60).cyan());

    if counters.is_empty() {
        println!("{}", "No counter data available".yellow());
        return;
    }

    let rows: Vec<CounterRow> = counters
        .iter()
        .take(top_n)
        .enumerate()
        .map(|(idx, counter)| CounterRow {
            rank: format!("#{}", idx + 1),
            hero: counter.hero_name.clone(),
            disadvantage: format!("{:+.2}%", counter.disadvantage),
            win_rate: win_rate_cell(counter.win_rate),
            matches: counter.matches_played.to_string(),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}", table);

    println!("\n{}", "Interpretation".bold().yellow());
    println!("• Disadvantage: matchup delta as published by the source, lowest first");
    println!("• Win Rate: the listed hero's win rate in this matchup\n");
}

pub fn display_favorites(favorites: &[FavoriteSummary]) {
    println!(
        "\n{}",
        format!("⭐ Favorite heroes ({})", favorites.len()).bold().cyan()
    );
    println!("{}\n", "=".repeat(60).cyan());

    if favorites.is_empty() {
        println!("{}", "No favorite heroes yet. Add one with `favorites add <HERO>`".yellow());
        return;
    }

    let rows: Vec<FavoriteRow> = favorites
        .iter()
        .map(|favorite| FavoriteRow {
            hero: favorite.localized_name.clone(),
            positions: match &favorite.positions {
                Some(positions) if !positions.is_empty() => positions
                    .iter()
                    .map(|p| p.number().to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
                _ => "N/A".to_string(),
            },
            win_rate: win_rate_cell(favorite.win_rate),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}\n", table);
}

pub fn display_cache_summary(summary: &CacheSummary, current_patch: Option<&str>, total_heroes: usize) {
    println!("\n{}", "🗄️  Counterpicks cache".bold().cyan());
    println!("{}\n", "=".repeat(60).cyan());

    let Some(cached_patch) = summary.patch_version.as_deref() else {
        println!("No cache data available.\n");
        return;
    };

    if let Some(current) = current_patch {
        if current != cached_patch {
            println!("{}", "Cache is for a different patch version.".yellow());
            println!("{}", format!("Cache patch: {}", cached_patch).yellow());
            println!("{}\n", format!("Current patch: {}", current).yellow());
            return;
        }
    }

    println!(
        "{} {}",
        "Cached heroes:".bold(),
        format!("{}/{}", summary.entry_count, total_heroes).cyan()
    );
    println!("{} {}", "Patch:".bold(), cached_patch.yellow());

    let now = Utc::now();
    if let Some(oldest) = summary.oldest_fetched {
        println!("{} {}", "Oldest cache:".bold(), age_cell(oldest, now));
    }
    if let Some(newest) = summary.newest_fetched {
        println!("{} {}", "Newest cache:".bold(), age_cell(newest, now));
    }
    println!();
}

pub fn display_precache_report(report: &PreCacheReport) {
    match report.outcome {
        RunOutcome::Cancelled => display_warning(&format!(
            "Caching cancelled after {}/{} heroes. Progress has been saved.",
            report.completed(),
            report.total
        )),
        RunOutcome::Completed if report.failed.is_empty() => {
            display_success(&format!("All {} heroes cached", report.total))
        }
        RunOutcome::Completed => display_warning(&format!(
            "{}/{} heroes cached, {} failed: {}",
            report.completed(),
            report.total,
            report.failed.len(),
            report.failed.join(", ")
        )),
    }
    display_info(&format!(
        "{} fetched this run, {} already cached",
        report.fetched, report.skipped
    ));
}

fn win_rate_cell(win_rate: f64) -> String {
    let text = format!("{:.2}%", win_rate);
    if win_rate >= 52.0 {
        text.green().to_string()
    } else if win_rate < 48.0 {
        text.red().to_string()
    } else {
        text
    }
}

fn age_cell(fetched: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let days = now.signed_duration_since(fetched).num_days();
    let text = format!("{} day(s) ago", days);
    if days > 7 {
        text.red().to_string()
    } else if days > 3 {
        text.yellow().to_string()
    } else {
        text.green().to_string()
    }
}

pub fn display_error(error: &str) {
    eprintln!("{} {}", "❌ Error:".red().bold(), error);
}

pub fn display_warning(message: &str) {
    println!("{} {}", "⚠️".yellow(), message.yellow());
}

pub fn display_info(message: &str) {
    println!("{} {}", "ℹ️".cyan(), message);
}

pub fn display_success(message: &str) {
    println!("{} {}", "✓".green(), message);
}
