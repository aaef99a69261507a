#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

#[allow(clippy::module_name_repetitions)]
pub mod local_storage;
pub mod rest;

pub const DEFAULT_API_URL: &str = "http://localhost:5000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base URL of the server, without the `/api` prefix.
    pub api_url: String,
}

impl Config {
    /// Use the URL given by `SPOTTER_API_URL` at compile time.
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(option_env!("SPOTTER_API_URL"))
    }

    #[must_use]
    pub fn new(api_url: Option<&str>) -> Self {
        let api_url = api_url
            .map(|url| url.trim().trim_end_matches('/'))
            .filter(|url| !url.is_empty())
            .unwrap_or(DEFAULT_API_URL);
        Self {
            api_url: api_url.to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
mod tests {
    pub mod data;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(None, DEFAULT_API_URL)]
    #[case(Some(""), DEFAULT_API_URL)]
    #[case(Some("  "), DEFAULT_API_URL)]
    #[case(Some("https://gym.example.org"), "https://gym.example.org")]
    #[case(Some("https://gym.example.org/"), "https://gym.example.org")]
    fn test_config_new(#[case] api_url: Option<&str>, #[case] expected: &str) {
        assert_eq!(Config::new(api_url).api_url, expected);
    }
}
