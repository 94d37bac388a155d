#[derive(thiserror::Error, Debug, serde::Deserialize, serde::Serialize)]
#[allow(clippy::enum_variant_names)]
pub enum Error {
    #[error("Generic {0}")]
    Generic(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Registry error for {package}: {message}")]
    Registry { package: String, message: String },

    #[error("Failed to fetch releases for {package} after {attempts} attempts")]
    FetchFailed { package: String, attempts: usize },

    #[error("Slack error: {0}")]
    Slack(String),
}
