use crate::prelude::{println, *};
use clap::Parser;
use std::path::PathBuf;

mod announce;
mod data;
mod draft;
mod error;
mod fetch;
mod pool;
mod prelude;
mod registry;
mod season;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Fantasy sports for package releases: draft packages, score version bumps"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Directory holding players.json, seasons/ and the .tmp/ release cache
    #[clap(long, env = "DEPENDABALL_DATA_DIR", global = true, default_value = "data")]
    data_dir: PathBuf,

    /// Whether to display additional information.
    #[clap(long, env = "DEPENDABALL_VERBOSE", global = true, default_value = "false")]
    verbose: bool,
}

impl Global {
    pub fn data(&self) -> crate::data::DataDir {
        crate::data::DataDir::new(&self.data_dir)
    }
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// Fetch and classify release history for every known package
    Fetch(crate::fetch::App),

    /// Show one season, or list all seasons
    Season(crate::season::App),

    /// Score the current dependency list over a trailing window
    Pool(crate::pool::App),

    /// Run a draft and write the season file
    Draft(crate::draft::App),

    /// Announce new releases and standings to Slack
    Announce(crate::announce::App),
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    color_eyre::install()?;

    let app = App::parse();

    if app.global.verbose {
        println!("Data directory: {}", app.global.data_dir.display());
    }

    match app.command {
        SubCommands::Fetch(sub_app) => crate::fetch::run(sub_app, app.global).await,
        SubCommands::Season(sub_app) => crate::season::run(sub_app, app.global).await,
        SubCommands::Pool(sub_app) => crate::pool::run(sub_app, app.global).await,
        SubCommands::Draft(sub_app) => crate::draft::run(sub_app, app.global).await,
        SubCommands::Announce(sub_app) => crate::announce::run(sub_app, app.global).await,
    }
    .map_err(|err: color_eyre::eyre::Report| eyre!(err))
}
