use crate::prelude::{print, println, *};
use chrono::{DateTime, Utc};
use colored::Colorize;
use dependaball_core::points::points_noun;
use dependaball_core::season::{PlayerRecord, SeasonStatus};
use dependaball_core::stats::{format_average, format_percent, SeasonStats};
use dependaball_core::window::by_points;
use dependaball_core::{Release, SeasonRecord};
use serde::Serialize;

#[derive(Debug, clap::Parser)]
#[command(name = "season")]
#[command(about = "Show one season, or list all seasons")]
pub struct App {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, clap::Subcommand)]
pub enum Commands {
    /// Standings, package scorecards and statistics for one season
    #[clap(name = "show")]
    Show(ShowOptions),

    /// In-progress and completed seasons
    #[clap(name = "list")]
    List(ListOptions),
}

#[derive(Debug, clap::Args, Clone)]
pub struct ShowOptions {
    /// Season id (the season file name without .json)
    season: String,

    /// Score the season as of this instant (epoch milliseconds) instead of now
    #[arg(long)]
    as_of: Option<i64>,

    /// Only show one player's picks and scoring releases (player id: lower-cased name)
    #[arg(long)]
    player: Option<String>,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, clap::Args, Clone)]
pub struct ListOptions {
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

pub async fn run(app: App, global: crate::Global) -> Result<()> {
    match app.command {
        Commands::Show(options) => show(options, global),
        Commands::List(options) => list(options, global),
    }
}

fn resolve_as_of(as_of: Option<i64>) -> Result<DateTime<Utc>> {
    as_of.map(from_millis).unwrap_or_else(|| Ok(Utc::now()))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SeasonOutput<'a> {
    #[serde(flatten)]
    season: &'a SeasonRecord,
    stats: SeasonStats,
}

#[derive(Debug, Serialize)]
struct PlayerOutput<'a> {
    #[serde(flatten)]
    player: &'a PlayerRecord,
    releases: Vec<&'a Release>,
}

fn show(options: ShowOptions, global: crate::Global) -> Result<()> {
    let as_of = resolve_as_of(options.as_of)?;
    let season = global.data().load_season_record(&options.season, as_of)?;

    if let Some(id) = &options.player {
        let player = season
            .player(&id.to_lowercase())
            .ok_or_else(|| eyre!("No player {} in season {}", id, options.season))?;

        if options.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&PlayerOutput {
                    player,
                    releases: season.player_releases(player),
                })?
            );
        } else {
            print!("{}", format_player_text(&season, player));
        }
        return Ok(());
    }

    let stats = SeasonStats::from_season(&season);

    if options.json {
        let output = SeasonOutput {
            season: &season,
            stats,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print!("{}", format_season_text(&season, &stats));
    }

    Ok(())
}

/// One player's picks with their scoring releases, oldest first
fn format_player_text(season: &SeasonRecord, player: &PlayerRecord) -> String {
    let mut result = String::new();

    result.push_str(&f!(
        "\n{} | {}\n",
        player.player.name.bright_cyan().bold(),
        season.name
    ));
    result.push_str(&f!(
        "Place {} | {} {}\n",
        player.place,
        player.total_points,
        points_noun(player.total_points)
    ));

    result.push_str(&f!("\n{}\n", "PICKS".bright_yellow().bold()));
    let mut table = new_table();
    table.add_row(prettytable::row!["Round", "Package", "Points"]);
    for (round, (name, points)) in player
        .draftees
        .iter()
        .zip(&player.points_by_round)
        .enumerate()
    {
        table.add_row(prettytable::row![round + 1, name, points]);
    }
    result.push_str(&table.to_string());

    result.push_str(&f!("\n{}\n", "RELEASES".bright_yellow().bold()));
    let releases = season.player_releases(player);
    if releases.is_empty() {
        result.push_str("No releases yet.\n");
        return result;
    }

    let mut table = new_table();
    table.add_row(prettytable::row!["Date", "Package", "Version", "Bump", "Points"]);
    for release in releases {
        table.add_row(prettytable::row![
            release.timestamp.format("%Y-%m-%d %H:%M"),
            &release.package_name,
            &release.version,
            release.bump,
            season.point_values.points_for(release.bump)
        ]);
    }
    result.push_str(&table.to_string());

    result
}

fn status_label(season: &SeasonRecord) -> String {
    match season.status() {
        SeasonStatus::Upcoming => "Upcoming".to_string(),
        SeasonStatus::InProgress => f!(
            "{:.1}% complete, ends in {}",
            season.progress() * 100.0,
            season.time_remaining()
        ),
        SeasonStatus::Ended => "Final".to_string(),
    }
}

fn format_season_text(season: &SeasonRecord, stats: &SeasonStats) -> String {
    let mut result = String::new();

    result.push_str(&f!("\n{}\n", "=".repeat(80).bright_cyan()));
    result.push_str(&f!(
        "{}\n",
        season.name.to_uppercase().bright_cyan().bold()
    ));
    result.push_str(&f!(
        "{} to {} ({} days) | {}\n",
        season.start.format("%Y-%m-%d %H:%M UTC"),
        season.end.format("%Y-%m-%d %H:%M UTC"),
        season.day_count(),
        status_label(season).yellow()
    ));
    result.push_str(&f!(
        "Points: major {} | minor {} | patch {}\n",
        season.point_values.major,
        season.point_values.minor,
        season.point_values.patch
    ));
    result.push_str(&f!("{}\n", "=".repeat(80).bright_cyan()));

    // Standings
    result.push_str(&f!("\n{}\n", "STANDINGS".bright_yellow().bold()));
    let mut table = new_table();
    let mut header = vec!["#".to_string(), "Player".to_string(), "Points".to_string()];
    header.extend((1..=season.rounds).map(|r| f!("R{r}")));
    table.add_row(prettytable::Row::new(
        header.iter().map(|h| prettytable::Cell::new(h)).collect(),
    ));
    for player in &season.players {
        let mut cells = vec![
            player.place.to_string(),
            player.player.name.clone(),
            player.total_points.to_string(),
        ];
        cells.extend(
            player
                .draftees
                .iter()
                .zip(&player.points_by_round)
                .map(|(name, points)| f!("{name} ({points})")),
        );
        table.add_row(prettytable::Row::new(
            cells.iter().map(|c| prettytable::Cell::new(c)).collect(),
        ));
    }
    result.push_str(&table.to_string());

    // Package scorecards
    result.push_str(&f!("\n{}\n", "PACKAGES".bright_yellow().bold()));
    let mut table = new_table();
    table.add_row(prettytable::row![
        "Package", "Points", "Versions", "Releases", "Drafted by"
    ]);
    for package in by_points(season.packages.values()) {
        let versions = match package.initial_version.as_str() {
            "" => f!("(new) → {}", package.final_version),
            initial if initial == package.final_version => initial.to_string(),
            initial => f!("{initial} → {}", package.final_version),
        };
        let drafted_by = season
            .draft_board
            .slot(&package.name)
            .map(|slot| f!("{} (round {})", slot.owner, slot.round))
            .unwrap_or_else(|| "-".to_string());
        let releases = package
            .releases
            .iter()
            .map(|r| f!("{} {}", r.version, r.bump))
            .collect::<Vec<_>>()
            .join(", ");

        table.add_row(prettytable::row![
            &package.name,
            package.total_points,
            versions,
            releases,
            drafted_by
        ]);
    }
    result.push_str(&table.to_string());

    // Stats
    result.push_str(&f!("\n{}\n", "STATS".bright_yellow().bold()));
    let mut table = new_table();
    table.add_row(prettytable::row!["Total points scored", stats.total_points]);
    table.add_row(prettytable::row!["Total drafted points", stats.drafted_points]);
    table.add_row(prettytable::row!["Total undrafted points", stats.undrafted_points]);
    table.add_row(prettytable::row!["Draft efficiency", format_percent(stats.draft_efficiency)]);
    table.add_row(prettytable::row!["Total releases", stats.total_releases]);
    table.add_row(prettytable::row!["Major releases", stats.major_releases]);
    table.add_row(prettytable::row!["Minor releases", stats.minor_releases]);
    table.add_row(prettytable::row!["Patch releases", stats.patch_releases]);
    table.add_row(prettytable::row![
        "Avg. player efficiency",
        format_percent(stats.average_player_efficiency)
    ]);
    table.add_row(prettytable::row![
        "Avg. points per player",
        format_average(stats.average_points_per_player)
    ]);
    table.add_row(prettytable::row![
        "Avg. points per draftee",
        format_average(stats.average_points_per_draftee)
    ]);
    result.push_str(&table.to_string());

    result.push('\n');
    result
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SeasonSummary {
    id: String,
    name: String,
    status: SeasonStatus,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    leader: Option<String>,
    leader_points: Option<u32>,
}

impl From<&SeasonRecord> for SeasonSummary {
    fn from(season: &SeasonRecord) -> Self {
        Self {
            id: season.id.clone(),
            name: season.name.clone(),
            status: season.status(),
            start: season.start,
            end: season.end,
            leader: season.leader().map(|p| p.player.name.clone()),
            leader_points: season.leader().map(|p| p.total_points),
        }
    }
}

fn list(options: ListOptions, global: crate::Global) -> Result<()> {
    let data = global.data();
    let now = Utc::now();

    let summaries: Vec<SeasonSummary> = data
        .season_ids()?
        .iter()
        .map(|id| {
            data.load_season_record(id, now)
                .map(|season| SeasonSummary::from(&season))
        })
        .collect::<Result<_>>()?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    for (title, status) in [
        ("IN PROGRESS", SeasonStatus::InProgress),
        ("PAST SEASONS", SeasonStatus::Ended),
        ("UPCOMING", SeasonStatus::Upcoming),
    ] {
        let group: Vec<&SeasonSummary> = summaries.iter().filter(|s| s.status == status).collect();
        if group.is_empty() {
            continue;
        }

        println!("\n{}", title.bright_yellow().bold());
        let mut table = new_table();
        table.add_row(prettytable::row!["Id", "Season", "Dates", "Leader"]);
        for summary in group {
            let leader = match (&summary.leader, summary.leader_points) {
                (Some(name), Some(points)) => f!("{name} ({points})"),
                _ => "-".to_string(),
            };
            table.add_row(prettytable::row![
                &summary.id,
                &summary.name,
                f!(
                    "{} - {}",
                    summary.start.format("%Y-%m-%d"),
                    summary.end.format("%Y-%m-%d")
                ),
                leader
            ]);
        }
        table.printstd();
    }

    if summaries.is_empty() {
        println!("No seasons found in {}", data.seasons_dir().display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use dependaball_core::season::{RosterPlayer, SeasonEntry};
    use dependaball_core::{build_season, Bump, PointValues, Release, ReleaseMap, SeasonDefinition};

    fn season(as_of: DateTime<Utc>) -> SeasonRecord {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let definition = SeasonDefinition {
            name: "Season 1".to_string(),
            point_values: PointValues::default(),
            start,
            end: Utc.with_ymd_and_hms(2024, 1, 22, 0, 0, 0).unwrap(),
            players: vec![SeasonEntry {
                name: "Alice".to_string(),
                draftees: vec!["react".to_string()],
            }],
            draft_pool: vec!["react".to_string(), "zod".to_string()],
        };
        let roster = vec![RosterPlayer {
            name: "Alice".to_string(),
            photo: String::new(),
            active: true,
        }];
        let mut releases = ReleaseMap::new();
        releases.insert(
            "react".to_string(),
            vec![Release {
                package_name: "react".to_string(),
                version: "19.0.0".to_string(),
                timestamp: Utc.with_ymd_and_hms(2024, 1, 3, 0, 0, 0).unwrap(),
                bump: Bump::Initial,
            }],
        );
        releases.insert("zod".to_string(), Vec::new());

        build_season("season-1", &definition, &roster, &releases, as_of).unwrap()
    }

    #[test]
    fn test_status_label() {
        let upcoming = season(Utc.with_ymd_and_hms(2023, 12, 1, 0, 0, 0).unwrap());
        assert_eq!(status_label(&upcoming), "Upcoming");

        let running = season(Utc.with_ymd_and_hms(2024, 1, 11, 12, 0, 0).unwrap());
        assert_eq!(status_label(&running), "50.0% complete, ends in 10 days & 12 hours");

        let ended = season(Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap());
        assert_eq!(status_label(&ended), "Final");
    }

    #[test]
    fn test_format_season_text_mentions_players_and_packages() {
        let season = season(Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap());
        let stats = SeasonStats::from_season(&season);

        let text = format_season_text(&season, &stats);

        assert!(text.contains("Alice"));
        assert!(text.contains("react"));
        assert!(text.contains("(new) → 19.0.0"));
        assert!(text.contains("Alice (round 1)"));
    }

    #[test]
    fn test_format_player_text() {
        let season = season(Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap());
        let alice = season.player("alice").unwrap();

        let text = format_player_text(&season, alice);

        assert!(text.contains("Place 1 | 0 points"));
        assert!(text.contains("react"));
        assert!(text.contains("19.0.0"));
        assert!(text.contains("2024-01-03 00:00"));
    }

    #[test]
    fn test_format_season_text_round_columns() {
        let season = season(Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap());
        let stats = SeasonStats::from_season(&season);

        let text = format_season_text(&season, &stats);

        assert!(text.contains("R1"));
        assert!(!text.contains("R2"));
    }

    #[test]
    fn test_season_summary() {
        let season = season(Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap());

        let summary = SeasonSummary::from(&season);

        assert_eq!(summary.status, SeasonStatus::Ended);
        assert_eq!(summary.leader.as_deref(), Some("Alice"));
        assert_eq!(summary.leader_points, Some(0));
    }

    #[test]
    fn test_resolve_as_of() {
        assert_eq!(
            resolve_as_of(Some(1_704_067_200_000)).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
        );
    }
}
