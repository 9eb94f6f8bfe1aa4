//! Repository identity parsing

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GithubError;
use crate::Result;

pub const GITHUB_HOST: &str = "github.com";

/// A repository on github.com or a GitHub Enterprise host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Repository {
    pub hostname: String,
    pub owner: String,
    pub name: String,
}

impl Repository {
    pub fn new(owner: &str, name: &str) -> Self {
        Repository {
            hostname: GITHUB_HOST.to_string(),
            owner: owner.to_string(),
            name: name.to_string(),
        }
    }

    /// Parse `OWNER/NAME`, `HOST/OWNER/NAME`, `https://HOST/OWNER/NAME[.git]`
    /// or `git@HOST:OWNER/NAME.git`.
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = || GithubError::InvalidRepository(input.to_string());
        let trimmed = input.trim();

        let (has_host, rest) = if let Some(rest) = trimmed
            .strip_prefix("https://")
            .or_else(|| trimmed.strip_prefix("http://"))
        {
            (true, rest.to_string())
        } else if let Some(rest) = trimmed.strip_prefix("git@") {
            (true, rest.replacen(':', "/", 1))
        } else {
            (false, trimmed.to_string())
        };

        let segments: Vec<&str> = rest.split('/').filter(|s| !s.is_empty()).collect();
        let (hostname, owner, name) = match (has_host, segments.as_slice()) {
            (false, [owner, name]) => (GITHUB_HOST, *owner, *name),
            (false, [host, owner, name]) => (*host, *owner, *name),
            (true, [host, owner, name, ..]) => (*host, *owner, *name),
            _ => return Err(invalid()),
        };
        let name = name.strip_suffix(".git").unwrap_or(name);

        let valid = |s: &str| !s.is_empty() && !s.chars().any(char::is_whitespace);
        if !valid(hostname) || !valid(owner) || !valid(name) {
            return Err(invalid());
        }

        Ok(Repository {
            hostname: hostname.to_ascii_lowercase(),
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }

    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    /// REST base URL for the repository's host.
    pub fn api_base(&self) -> String {
        if self.hostname == GITHUB_HOST || self.hostname == "api.github.com" {
            "https://api.github.com".to_string()
        } else {
            format!("https://{}/api/v3", self.hostname)
        }
    }
}

impl FromStr for Repository {
    type Err = GithubError;

    fn from_str(s: &str) -> Result<Self> {
        Repository::parse(s)
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hostname == GITHUB_HOST {
            write!(f, "{}", self.full_name())
        } else {
            write!(f, "{}/{}", self.hostname, self.full_name())
        }
    }
}
