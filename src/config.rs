use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use thiserror::Error;

use crate::models::project::{ProjectConfig, ProjectsConfig};
use crate::service::time_service::Zone;

pub const DEFAULT_PROJECTS_FILE: &str = "projects.json";
pub const DEFAULT_NOTION_API_BASE: &str = "https://api.notion.com/v1";
pub const DEFAULT_NOTION_VERSION: &str = "2022-06-28";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_PROJECT_NAME: &str = "default";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {reason}")]
    Io { path: String, reason: String },
    #[error("invalid config line {line}: {content}")]
    InvalidLine { line: usize, content: String },
    #[error("projects file is not valid JSON: {0}")]
    Json(String),
    #[error("project {project} is malformed: {reason}")]
    Malformed { project: String, reason: String },
    #[error("project {project} has an empty {field}")]
    InvalidProject { project: String, field: &'static str },
    #[error("no projects configured")]
    NoProjects,
    #[error("project {0} is not configured")]
    UnknownProject(String),
    #[error("invalid value for {key}: {value}")]
    InvalidSetting { key: &'static str, value: String },
}

/// Flat `KEY=VALUE` settings file. Lookups fall back to the process
/// environment through [`AppConfig::get_or_env`].
#[derive(Debug, Default, Clone)]
pub struct AppConfig {
    values: HashMap<String, String>,
}

impl AppConfig {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let mut values = HashMap::new();
        for (idx, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let trimmed = trimmed.strip_prefix("export ").unwrap_or(trimmed);
            let Some((key, value)) = trimmed.split_once('=') else {
                return Err(ConfigError::InvalidLine {
                    line: idx + 1,
                    content: line.to_string(),
                });
            };
            let key = key.trim();
            let mut value = value.trim().to_string();
            if value.len() >= 2
                && ((value.starts_with('"') && value.ends_with('"'))
                    || (value.starts_with('\'') && value.ends_with('\'')))
            {
                value = value[1..value.len() - 1].to_string();
            }
            values.insert(key.to_string(), value);
        }
        Ok(Self { values })
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    pub fn get_or_env(&self, key: &str) -> Option<String> {
        self.get(key).or_else(|| std::env::var(key).ok())
    }
}

/// Run-wide settings resolved from the settings file and environment.
#[derive(Debug, Clone)]
pub struct Settings {
    pub projects_file: String,
    pub zone: Zone,
    pub http_timeout: Duration,
    pub notion_api_base: String,
    pub notion_version: String,
    pub log_level: Option<String>,
}

impl Settings {
    pub fn resolve<F>(get_prop: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let zone = match get_prop("TIMEZONE").filter(|v| !v.trim().is_empty()) {
            Some(name) => Zone::from_name(name.trim()).ok_or(ConfigError::InvalidSetting {
                key: "TIMEZONE",
                value: name,
            })?,
            None => Zone::Local,
        };

        let http_timeout = match get_prop("HTTP_TIMEOUT_SECS") {
            Some(raw) => {
                let secs = raw
                    .trim()
                    .parse::<u64>()
                    .ok()
                    .filter(|secs| *secs > 0)
                    .ok_or(ConfigError::InvalidSetting {
                        key: "HTTP_TIMEOUT_SECS",
                        value: raw,
                    })?;
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        };

        Ok(Self {
            projects_file: get_prop("PROJECTS_FILE")
                .unwrap_or_else(|| DEFAULT_PROJECTS_FILE.to_string()),
            zone,
            http_timeout,
            notion_api_base: get_prop("NOTION_API_BASE")
                .unwrap_or_else(|| DEFAULT_NOTION_API_BASE.to_string())
                .trim_end_matches('/')
                .to_string(),
            notion_version: get_prop("NOTION_VERSION")
                .unwrap_or_else(|| DEFAULT_NOTION_VERSION.to_string()),
            log_level: get_prop("LOG_LEVEL"),
        })
    }
}

/// Reads the projects file when it exists, otherwise builds a single
/// `default` project from `NOTION_API_TOKEN`, `NOTION_DATABASE_ID` and
/// `DISCORD_WEBHOOK_URL`.
pub fn load_projects<F>(projects_file: &str, get_prop: F) -> Result<ProjectsConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if Path::new(projects_file).exists() {
        let content = fs::read_to_string(projects_file).map_err(|e| ConfigError::Io {
            path: projects_file.to_string(),
            reason: e.to_string(),
        })?;
        return ProjectsConfig::from_json(&content);
    }

    let project = ProjectConfig {
        notion_api_token: get_prop("NOTION_API_TOKEN").unwrap_or_default(),
        notion_database_id: get_prop("NOTION_DATABASE_ID").unwrap_or_default(),
        discord_webhook: get_prop("DISCORD_WEBHOOK_URL").unwrap_or_default(),
        properties: Default::default(),
    };
    ProjectsConfig::single(DEFAULT_PROJECT_NAME, project)
}
