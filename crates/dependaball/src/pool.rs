use crate::prelude::{print, println, *};
use chrono::{DateTime, Utc};
use colored::Colorize;
use dependaball_core::window::{by_points, score_packages, PackageRecord, Window};
use dependaball_core::PointValues;
use serde::Serialize;

#[derive(Debug, clap::Parser)]
#[command(name = "pool")]
#[command(about = "Score the current dependency list over a trailing window")]
pub struct App {
    /// Window length in days (the site publishes 7, 30, 90 and 365)
    #[arg(short, long, default_value = "180")]
    days: i64,

    /// Only show the top N packages
    #[arg(short, long)]
    limit: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolOutput {
    pub window: Window,
    pub day_count: i64,
    pub point_values: PointValues,
    pub packages: Vec<PackageRecord>,
}

pub async fn run(app: App, global: crate::Global) -> Result<()> {
    let window = trailing_window(Utc::now(), app.days)?;

    let data = global.data();
    let dependencies = data.load_remote_dependencies()?;
    let releases = data.load_releases()?;

    if global.verbose {
        println!("Scoring {} packages from {} to {}", dependencies.len(), window.start, window.end);
    }

    let output = pool_data(&dependencies, &releases, window, app.days, app.limit)?;

    if app.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print!("{}", format_pool_text(&output));
    }

    Ok(())
}

/// The scoring window ending at `now`, rejecting non-positive or out-of-range day counts
fn trailing_window(now: DateTime<Utc>, days: i64) -> Result<Window> {
    if days <= 0 {
        return Err(eyre!("--days must be positive, got {}", days));
    }

    Window::trailing_days(now, days).ok_or_else(|| eyre!("--days {} is out of range", days))
}

pub fn pool_data(
    dependencies: &[String],
    releases: &dependaball_core::ReleaseMap,
    window: Window,
    day_count: i64,
    limit: Option<usize>,
) -> Result<PoolOutput> {
    let point_values = PointValues::default();
    let scored = score_packages(dependencies, releases, &window, &point_values)
        .context("Dependency list and release data are out of sync")?;

    let packages: Vec<PackageRecord> = by_points(scored.values())
        .into_iter()
        .take(limit.unwrap_or(usize::MAX))
        .cloned()
        .collect();

    Ok(PoolOutput {
        window,
        day_count,
        point_values,
        packages,
    })
}

fn format_pool_text(output: &PoolOutput) -> String {
    let mut result = String::new();

    result.push_str(&f!("\n{}\n", "=".repeat(80).bright_cyan()));
    result.push_str(&f!(
        "{}\n",
        f!("DRAFT POOL: LAST {} DAYS ({} packages)", output.day_count, output.packages.len())
            .bright_cyan()
            .bold()
    ));
    result.push_str(&f!("{}\n", "=".repeat(80).bright_cyan()));

    let mut table = new_table();
    table.add_row(prettytable::row![
        "Package", "Points", "Major", "Minor", "Patch", "Current version"
    ]);
    for package in &output.packages {
        table.add_row(prettytable::row![
            &package.name,
            package.total_points,
            package.count_of(dependaball_core::Bump::Major),
            package.count_of(dependaball_core::Bump::Minor),
            package.count_of(dependaball_core::Bump::Patch),
            &package.final_version
        ]);
    }
    result.push_str(&table.to_string());

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use dependaball_core::{Bump, Release, ReleaseMap};

    fn releases() -> ReleaseMap {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let release = |package: &str, version: &str, days_ago: i64, bump| Release {
            package_name: package.to_string(),
            version: version.to_string(),
            timestamp: now - Duration::days(days_ago),
            bump,
        };

        let mut map = ReleaseMap::new();
        map.insert(
            "vite".to_string(),
            vec![
                release("vite", "4.0.0", 400, Bump::Initial),
                release("vite", "5.0.0", 20, Bump::Major),
                release("vite", "5.1.0", 2, Bump::Minor),
            ],
        );
        map.insert(
            "zod".to_string(),
            vec![
                release("zod", "3.0.0", 400, Bump::Initial),
                release("zod", "3.0.1", 3, Bump::Patch),
            ],
        );
        map.insert(
            "ajv".to_string(),
            vec![
                release("ajv", "8.0.0", 400, Bump::Initial),
                release("ajv", "8.0.1", 5, Bump::Patch),
            ],
        );
        map
    }

    fn window(days: i64) -> Window {
        trailing_window(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(), days).unwrap()
    }

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_pool_data_orders_by_points_then_name() {
        let output = pool_data(&names(&["zod", "vite", "ajv"]), &releases(), window(30), 30, None).unwrap();

        let order: Vec<(&str, u32)> = output
            .packages
            .iter()
            .map(|p| (p.name.as_str(), p.total_points))
            .collect();
        assert_eq!(order, vec![("vite", 8), ("ajv", 1), ("zod", 1)]);
    }

    #[test]
    fn test_pool_data_window_length() {
        let output = pool_data(&names(&["vite"]), &releases(), window(7), 7, None).unwrap();

        assert_eq!(output.packages[0].total_points, 3);
        assert_eq!(output.packages[0].initial_version, "5.0.0");
    }

    #[test]
    fn test_pool_data_limit() {
        let output = pool_data(&names(&["zod", "vite", "ajv"]), &releases(), window(30), 30, Some(1)).unwrap();

        assert_eq!(output.packages.len(), 1);
        assert_eq!(output.packages[0].name, "vite");
    }

    #[test]
    fn test_trailing_window_rejects_bad_day_counts() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();

        assert!(trailing_window(now, 0).is_err());
        assert!(trailing_window(now, -7).is_err());
        assert!(trailing_window(now, 1_000_000_000_000).is_err());
        assert!(trailing_window(now, i64::MAX).is_err());
    }

    #[test]
    fn test_pool_data_unknown_package_fails() {
        assert!(pool_data(&names(&["express"]), &releases(), window(30), 30, None).is_err());
    }
}
