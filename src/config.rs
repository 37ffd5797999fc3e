use std::collections::HashSet;
use std::str::FromStr;

use serde::Deserialize;

use crate::consts::DEFAULT_REPUTATION_THRESHOLD;

/// Raw process environment, deserialized once at startup.
#[derive(Debug, Deserialize)]
pub struct Env {
    pub github_token: String,
    pub github_webhook_secret: Option<String>,
    /// Comma-separated logins whose reactions carry bonus/penalty weight.
    pub core_team_members: Option<String>,
    /// Target repository as `owner/name`.
    pub repo_name: String,
    pub reputation_threshold: Option<i64>,
}

/// Immutable process configuration. Built once from [`Env`] and passed by
/// reference into every component; nothing reads the environment afterwards.
#[derive(Debug, Clone)]
pub struct Config {
    pub repo: RepoId,
    pub core_team: HashSet<String>,
    pub threshold: i64,
    pub webhook_secret: Option<String>,
}

impl TryFrom<&Env> for Config {
    type Error = anyhow::Error;

    fn try_from(env: &Env) -> anyhow::Result<Self> {
        let core_team = env
            .core_team_members
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|login| !login.is_empty())
            .map(str::to_owned)
            .collect();

        Ok(Self {
            repo: env.repo_name.parse()?,
            core_team,
            threshold: env
                .reputation_threshold
                .unwrap_or(DEFAULT_REPUTATION_THRESHOLD),
            webhook_secret: env.github_webhook_secret.clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoId {
    pub owner: String,
    pub name: String,
}

impl FromStr for RepoId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() => Ok(Self {
                owner: owner.to_owned(),
                name: name.to_owned(),
            }),
            _ => Err(anyhow::anyhow!("expected owner/name, got: {s}")),
        }
    }
}

impl std::fmt::Display for RepoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}
