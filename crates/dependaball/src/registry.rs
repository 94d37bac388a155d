use crate::prelude::*;
use dependaball_core::registry::{releases_from_body, RegistryError};
use dependaball_core::Release;
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

pub const DEFAULT_REGISTRY_URL: &str = "https://registry.npmjs.org";

const MAX_ATTEMPTS: usize = 3;
const RETRY_DELAY: Duration = Duration::from_millis(500);
const CONCURRENCY: usize = 8;

/// npm registry client
#[derive(Debug, Clone)]
pub struct RegistryClient {
    client: reqwest::Client,
    base_url: String,
}

impl RegistryClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("dependaball/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| eyre!("Failed to build HTTP client: {}", e))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Scoped names keep their `@` but encode the slash
    pub fn package_url(&self, package: &str) -> String {
        let encoded = urlencoding::encode(package).replace("%40", "@");
        f!("{}/{}", self.base_url, encoded)
    }

    async fn fetch_once(&self, package: &str) -> std::result::Result<Vec<Release>, Error> {
        let response = self
            .client
            .get(self.package_url(package))
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        match releases_from_body(package, &body) {
            Ok(releases) if status.is_success() => Ok(releases),
            Ok(_) => Err(Error::Registry {
                package: package.to_string(),
                message: f!("HTTP {status}"),
            }),
            Err(RegistryError::Registry(message)) | Err(RegistryError::Malformed(message)) => {
                Err(Error::Registry {
                    package: package.to_string(),
                    message,
                })
            }
        }
    }

    /// Fetch and classify one package, retrying before giving up
    pub async fn package_releases(&self, package: &str) -> Result<Vec<Release>> {
        for attempt in 1..=MAX_ATTEMPTS {
            match self.fetch_once(package).await {
                Ok(releases) => return Ok(releases),
                Err(err) => {
                    log::warn!("[{package}] attempt {attempt}/{MAX_ATTEMPTS} failed: {err}");
                    if attempt < MAX_ATTEMPTS {
                        tokio::time::sleep(RETRY_DELAY * attempt as u32).await;
                    }
                }
            }
        }

        Err(Error::FetchFailed {
            package: package.to_string(),
            attempts: MAX_ATTEMPTS,
        }
        .into())
    }

    /// Fetch many packages concurrently
    ///
    /// Results come back in completion order; any failure fails the batch.
    pub async fn many_package_releases(
        &self,
        packages: &[String],
        show_progress: bool,
    ) -> Result<Vec<(String, Vec<Release>)>> {
        let progress = show_progress.then(|| {
            let bar = ProgressBar::new(packages.len() as u64);
            if let Ok(style) = ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            {
                bar.set_style(style);
            }
            bar
        });

        let results: Vec<Result<(String, Vec<Release>)>> = stream::iter(packages.iter().cloned())
            .map(|package| {
                let progress = progress.clone();
                async move {
                    let releases = self.package_releases(&package).await;
                    if let Some(bar) = &progress {
                        bar.set_message(package.clone());
                        bar.inc(1);
                    }
                    releases.map(|r| (package, r))
                }
            })
            .buffer_unordered(CONCURRENCY)
            .collect()
            .await;

        if let Some(bar) = progress {
            bar.finish_and_clear();
        }

        results.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_url_plain() {
        let client = RegistryClient::new(DEFAULT_REGISTRY_URL).unwrap();
        assert_eq!(
            client.package_url("left-pad"),
            "https://registry.npmjs.org/left-pad"
        );
    }

    #[test]
    fn test_package_url_scoped() {
        let client = RegistryClient::new("https://registry.example.com/").unwrap();
        assert_eq!(
            client.package_url("@types/node"),
            "https://registry.example.com/@types%2Fnode"
        );
    }
}
