use crate::prelude::{print, println, *};
use chrono::Utc;
use colored::Colorize;
use dependaball_core::draft::{pick_order, run_draft, season_file_stem, DraftSetup, Pick};
use dependaball_core::season::RosterPlayer;
use dependaball_core::{PointValues, ReleaseMap};
use rand::seq::SliceRandom;

#[derive(Debug, clap::Parser)]
#[command(name = "draft")]
#[command(about = "Run a draft and write the season file")]
pub struct App {
    /// Season name
    #[arg(long, default_value = "Season N")]
    name: String,

    /// Season length in days
    #[arg(long, default_value = "21")]
    days: u32,

    /// Participating player (repeatable). Defaults to every active player.
    #[arg(long = "player", value_name = "NAME")]
    players: Vec<String>,

    /// Number of draft rounds
    #[arg(long, default_value = "6")]
    rounds: usize,

    /// Draft-eligible package (repeatable). Defaults to the whole dependency list.
    #[arg(long = "pool", value_name = "PACKAGE")]
    pool: Vec<String>,

    /// Picks in snake order (repeatable). Without picks, only the draft board is printed.
    #[arg(long = "pick", value_name = "PACKAGE")]
    picks: Vec<String>,

    /// Points for a major version bump
    #[arg(long, default_value = "5")]
    major: u32,

    /// Points for a minor version bump
    #[arg(long, default_value = "3")]
    minor: u32,

    /// Points for a patch version bump
    #[arg(long, default_value = "1")]
    patch: u32,

    /// Keep players in the given order instead of shuffling
    #[arg(long)]
    no_shuffle: bool,

    /// Season file name without .json. Defaults to a slug of the season name.
    #[arg(long)]
    file: Option<String>,

    /// Replace an existing season file
    #[arg(long)]
    overwrite: bool,
}

pub async fn run(app: App, global: crate::Global) -> Result<()> {
    let data = global.data();
    let roster = data.load_players()?;

    let mut players = select_players(&roster, &app.players)?;
    if !app.no_shuffle {
        players.shuffle(&mut rand::thread_rng());
    }

    let pool = if app.pool.is_empty() {
        data.load_remote_dependencies()?
    } else {
        app.pool.clone()
    };

    let setup = DraftSetup {
        name: app.name.clone(),
        start: Utc::now(),
        days: app.days,
        players,
        draft_pool: pool,
        point_values: PointValues {
            major: app.major,
            minor: app.minor,
            patch: app.patch,
        },
        rounds: app.rounds.max(1),
    };

    if app.picks.is_empty() {
        let releases = data.cached_releases()?.unwrap_or_default();
        print!("{}", format_draft_board(&setup, &releases));
        return Ok(());
    }

    let definition = run_draft(&setup, &app.picks)?;
    let file = app
        .file
        .clone()
        .unwrap_or_else(|| season_file_stem(&definition.name));
    let path = data.write_season(&file, &definition, app.overwrite)?;

    if global.verbose {
        println!("{}", serde_json::to_string_pretty(&definition)?);
    }
    println!(
        "{}",
        f!("Best of luck to all our players this season! Wrote {}", path.display()).green()
    );

    Ok(())
}

/// Resolve requested player names against the roster
///
/// With no names, every active player takes part.
fn select_players(roster: &[RosterPlayer], requested: &[String]) -> Result<Vec<String>> {
    if requested.is_empty() {
        return Ok(roster
            .iter()
            .filter(|p| p.active)
            .map(|p| p.name.clone())
            .collect());
    }

    requested
        .iter()
        .map(|name| {
            roster
                .iter()
                .find(|p| p.name.eq_ignore_ascii_case(name))
                .map(|p| p.name.clone())
                .ok_or_else(|| eyre!("Could not find player data for {}", name))
        })
        .collect()
}

/// Latest known version of a package, for the pick list
fn current_version<'a>(releases: &'a ReleaseMap, package: &str) -> &'a str {
    releases
        .get(package)
        .and_then(|r| r.last())
        .map(|r| r.version.as_str())
        .unwrap_or("no initial version")
}

fn format_draft_board(setup: &DraftSetup, releases: &ReleaseMap) -> String {
    let mut result = String::new();

    result.push_str(&f!(
        "\n{}\n",
        f!("{}: {} rounds, {} days", setup.name, setup.rounds, setup.days)
            .bright_cyan()
            .bold()
    ));

    result.push_str(&f!("\n{}\n", "PICK ORDER".bright_yellow().bold()));
    let order: Vec<Pick> = pick_order(&setup.players, setup.rounds);
    for (index, pick) in order.iter().enumerate() {
        result.push_str(&f!(
            "  {:>3}. Round {}: {}\n",
            index + 1,
            pick.round,
            pick.player
        ));
    }

    result.push_str(&f!("\n{}\n", "DRAFT POOL".bright_yellow().bold()));
    for package in &setup.draft_pool {
        result.push_str(&f!(
            "  {} ({})\n",
            package,
            current_version(releases, package)
        ));
    }

    result.push_str(&f!(
        "\nPass --pick once per slot, in order, to record the draft.\n"
    ));
    result
}
