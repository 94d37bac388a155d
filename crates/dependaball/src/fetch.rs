use crate::prelude::{println, *};
use crate::registry::{RegistryClient, DEFAULT_REGISTRY_URL};
use colored::Colorize;
use dependaball_core::ReleaseMap;
use std::collections::BTreeSet;

#[derive(Debug, clap::Parser)]
#[command(name = "fetch")]
#[command(about = "Fetch and classify release history for every known package")]
pub struct App {
    /// Dependency list: a local JSON file or an http(s) URL serving a JSON array of package names
    #[clap(long, env = "DEPENDENCIES_FILE")]
    dependencies: Option<String>,

    /// npm registry base URL
    #[clap(long, env = "NPM_REGISTRY_URL", default_value = DEFAULT_REGISTRY_URL)]
    registry: String,

    /// Hide the progress bar
    #[clap(long)]
    quiet: bool,
}

pub async fn run(app: App, global: crate::Global) -> Result<()> {
    let data = global.data();

    let dependencies = match &app.dependencies {
        Some(source) => {
            let list = load_dependency_list(source).await?;
            let path = data.write_remote_dependencies(&list)?;
            if global.verbose {
                println!("Wrote {} dependencies to {}", list.len(), path.display());
            }
            list
        }
        None => {
            log::warn!("No dependency list given; reusing the cached one if present");
            data.cached_remote_dependencies()?.unwrap_or_default()
        }
    };

    let seasons = data.load_seasons()?;
    let packages = all_packages(
        &dependencies,
        seasons.iter().map(|(_, season)| season.draft_pool.as_slice()),
    );

    if global.verbose {
        println!(
            "Fetching {} packages from {} ({} seasons)",
            packages.len(),
            app.registry,
            seasons.len()
        );
    }

    let client = RegistryClient::new(&app.registry)?;
    let fetched = client
        .many_package_releases(&packages, !app.quiet)
        .await?;

    let mut releases = ReleaseMap::new();
    for (package, package_releases) in fetched {
        println!(
            "{}",
            f!("[{package}] Found {} releases.", package_releases.len()).green()
        );
        releases.insert(package, package_releases);
    }

    let path = data.write_releases(&releases)?;
    println!("Done fetching releases: {}", path.display());

    Ok(())
}

/// Read a dependency list from disk or over HTTP
async fn load_dependency_list(source: &str) -> Result<Vec<String>> {
    let contents = if source.starts_with("http://") || source.starts_with("https://") {
        let response = reqwest::get(source)
            .await
            .with_context(|| f!("Failed to fetch dependency list from {source}"))?;

        if !response.status().is_success() {
            return Err(Error::Network(f!(
                "Dependency list request returned {}",
                response.status()
            ))
            .into());
        }

        response
            .text()
            .await
            .context("Failed to read dependency list response")?
    } else {
        std::fs::read_to_string(source)
            .with_context(|| f!("Failed to read dependency list {source}"))?
    };

    serde_json::from_str(&contents).context("Dependency list must be a JSON array of package names")
}

/// Union of the dependency list and every season's draft pool, each name once
fn all_packages<'a>(
    dependencies: &'a [String],
    pools: impl IntoIterator<Item = &'a [String]>,
) -> Vec<String> {
    let mut seen = BTreeSet::new();

    dependencies
        .iter()
        .chain(pools.into_iter().flatten())
        .filter(|name| seen.insert(name.as_str()))
        .cloned()
        .collect()
}
