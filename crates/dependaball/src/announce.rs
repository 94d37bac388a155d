use crate::prelude::{println, *};
use chrono::{DateTime, Utc};
use dependaball_core::announce::{compose_announcement, join_names, Announcement, AnnouncementOutcome};
use dependaball_core::points::points_noun;
use dependaball_core::Bump;
use serde::{Deserialize, Serialize};

const SLACK_POST_MESSAGE_URL: &str = "https://slack.com/api/chat.postMessage";
const SLACK_USERNAME: &str = "Dependaball";
const SLACK_ICON: &str = ":rugby_football:";

#[derive(Debug, clap::Parser)]
#[command(name = "announce")]
#[command(about = "Announce new releases and standings to Slack")]
pub struct App {
    /// Start of the announcement window (epoch milliseconds). Defaults to now.
    #[arg(long, env = "ANNOUNCE_SINCE")]
    since: Option<i64>,

    /// End of the announcement window (epoch milliseconds). Defaults to now.
    #[arg(long, env = "ANNOUNCE_NOW")]
    now: Option<i64>,

    /// Print the messages instead of posting them
    #[arg(long)]
    dry_run: bool,

    /// Print the announcements as JSON instead of posting them
    #[arg(long)]
    json: bool,
}

/// Slack configuration from environment variables
#[derive(Debug, Clone)]
pub struct SlackConfig {
    pub auth_token: String,
    pub channel: String,
}

impl SlackConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            auth_token: std::env::var("SLACK_AUTH_TOKEN")
                .map_err(|_| eyre!("SLACK_AUTH_TOKEN environment variable not set"))?,
            channel: std::env::var("SLACK_CHANNEL")
                .map_err(|_| eyre!("SLACK_CHANNEL environment variable not set"))?,
        })
    }
}

#[derive(Debug, Serialize)]
struct PostMessage<'a> {
    text: &'a str,
    username: &'a str,
    icon_emoji: &'a str,
    channel: &'a str,
}

#[derive(Debug, Deserialize)]
struct PostMessageResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

fn resolve_instant(value: Option<i64>, label: &str) -> Result<DateTime<Utc>> {
    match value {
        Some(millis) => from_millis(millis),
        None => {
            log::info!("No \"{}\" timestamp given, using the current time", label);
            Ok(Utc::now())
        }
    }
}

pub async fn run(app: App, global: crate::Global) -> Result<()> {
    let posting = !app.dry_run && !app.json;
    // Fail before any work when the message cannot be delivered.
    let slack = if posting {
        Some(SlackConfig::from_env()?)
    } else {
        None
    };

    let since = resolve_instant(app.since, "since")?;
    let now = resolve_instant(app.now, "now")?;
    log::info!(
        "Looking for releases between {} and {}",
        since.timestamp_millis(),
        now.timestamp_millis()
    );

    let data = global.data();
    let roster = data.load_players()?;
    let releases = data.load_releases()?;

    let mut announcements = Vec::new();
    for (id, definition) in data.load_seasons()? {
        let outcome = compose_announcement(&id, &definition, &roster, &releases, since, now)
            .with_context(|| f!("Could not score season {}", id))?;

        match outcome {
            AnnouncementOutcome::NotStarted => {
                log::info!("{}: Has not started yet", definition.name)
            }
            AnnouncementOutcome::AlreadyEnded => {
                log::info!("{}: Has already ended", definition.name)
            }
            AnnouncementOutcome::Quiet => {
                log::info!("{}: No new releases, no announcement", definition.name)
            }
            AnnouncementOutcome::Announce(announcement) => {
                if announcement.ended {
                    log::info!("{}: Season has ended. Announcing!", definition.name);
                } else {
                    log::info!(
                        "{}: {} new releases found. Announcing!",
                        definition.name,
                        announcement.new_releases.len()
                    );
                }
                announcements.push(announcement);
            }
        }
    }

    if app.json {
        println!("{}", serde_json::to_string_pretty(&announcements)?);
        return Ok(());
    }

    let client = reqwest::Client::new();
    for announcement in &announcements {
        let message = format_slack_message(announcement);
        match &slack {
            Some(config) => post_message(&client, config, &message).await?,
            None => println!("{}\n", message),
        }
    }

    Ok(())
}

async fn post_message(client: &reqwest::Client, config: &SlackConfig, text: &str) -> Result<()> {
    let body = PostMessage {
        text,
        username: SLACK_USERNAME,
        icon_emoji: SLACK_ICON,
        channel: &config.channel,
    };

    let response = client
        .post(SLACK_POST_MESSAGE_URL)
        .bearer_auth(&config.auth_token)
        .json(&body)
        .send()
        .await
        .map_err(|e| Error::Slack(e.to_string()))?;

    if !response.status().is_success() {
        return Err(Error::Slack(f!("HTTP {}", response.status())).into());
    }

    let reply: PostMessageResponse = response
        .json()
        .await
        .map_err(|e| Error::Slack(f!("Failed to parse response: {}", e)))?;

    if !reply.ok {
        return Err(Error::Slack(reply.error.unwrap_or_else(|| "unknown error".to_string())).into());
    }

    log::debug!("Posted announcement to {}", config.channel);
    Ok(())
}

fn bump_emoji(bump: Bump) -> &'static str {
    match bump {
        Bump::Initial => ":new:",
        Bump::Major => ":dependaball-major:",
        Bump::Minor => ":dependaball-minor:",
        Bump::Patch => ":dependaball-patch:",
    }
}

/// Slack mrkdwn body for one announcement
pub fn format_slack_message(announcement: &Announcement) -> String {
    let mut message = String::new();

    if announcement.ended {
        message.push_str(&f!(
            "*:checkered_flag: {} has ended!*\n\n",
            announcement.season_name
        ));
    } else {
        message.push_str(&f!(
            "*:clipboard: {} is {:.1}% complete.*\n\n",
            announcement.season_name,
            announcement.progress * 100.0
        ));
    }

    if !announcement.new_releases.is_empty() {
        let lines: Vec<String> = announcement
            .new_releases
            .iter()
            .map(|release| {
                let mut line = f!(
                    "{} `{}`: `{}` ({})",
                    bump_emoji(release.bump),
                    release.package_name,
                    release.version,
                    release.bump
                );
                if let Some(owner) = &release.owner {
                    line.push_str(&f!(
                        "\n       +{} {} for *{}*",
                        release.points,
                        points_noun(release.points),
                        owner
                    ));
                }
                line
            })
            .collect();
        message.push_str(&f!("*New package versions:*\n\n{}\n\n", lines.join("\n\n")));
    }

    let standings: Vec<String> = announcement
        .standings
        .iter()
        .map(|change| {
            f!(
                "{}) *{}* - {} {} {}",
                change.place,
                change.name,
                change.total_points,
                points_noun(change.total_points),
                change.arrows()
            )
        })
        .collect();
    message.push_str(&f!("*Current Standings:*\n{}\n\n", standings.join("\n")));

    if announcement.ended {
        let noun = if announcement.winners.len() == 1 {
            "winner"
        } else {
            "winners"
        };
        message.push_str(&f!(
            "*:sports_medal: Congratulations to our {} {}!*",
            noun,
            join_names(&announcement.winners)
        ));
    } else {
        message.push_str(&f!(
            "_:stopwatch: The season will end in {}._",
            announcement.time_remaining
        ));
    }

    message
}
