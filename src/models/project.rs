use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Credentials and destination for one Notion database.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct ProjectConfig {
    #[serde(default)]
    pub notion_api_token: String,
    #[serde(default)]
    pub notion_database_id: String,
    #[serde(default)]
    pub discord_webhook: String,
    #[serde(default)]
    pub properties: PropertyNames,
}

/// Literal Notion property names looked up on every page.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct PropertyNames {
    pub title: String,
    pub date: String,
    pub location: String,
    pub role: String,
    pub remind_date: String,
    pub notification_date: String,
}

impl Default for PropertyNames {
    fn default() -> Self {
        Self {
            title: "名前".to_string(),
            date: "日付".to_string(),
            location: "開催場所".to_string(),
            role: "ロール".to_string(),
            remind_date: "リマインド日時".to_string(),
            notification_date: "通知日".to_string(),
        }
    }
}

impl ProjectConfig {
    pub fn validate(&self, project: &str) -> Result<(), ConfigError> {
        let required = [
            ("notion_api_token", &self.notion_api_token),
            ("notion_database_id", &self.notion_database_id),
            ("discord_webhook", &self.discord_webhook),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::InvalidProject {
                    project: project.to_string(),
                    field,
                });
            }
        }
        Ok(())
    }
}

/// Every configured project, keyed by name. Only built through
/// [`ProjectsConfig::from_json`] or [`ProjectsConfig::single`], so each entry
/// has already passed validation.
#[derive(Debug, Clone, Default)]
pub struct ProjectsConfig {
    projects: BTreeMap<String, ProjectConfig>,
}

impl ProjectsConfig {
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let raw: BTreeMap<String, serde_json::Value> =
            serde_json::from_str(content).map_err(|e| ConfigError::Json(e.to_string()))?;
        if raw.is_empty() {
            return Err(ConfigError::NoProjects);
        }

        let mut projects = BTreeMap::new();
        for (name, value) in raw {
            if !value.is_object() {
                return Err(ConfigError::Malformed {
                    project: name,
                    reason: "expected an object".to_string(),
                });
            }
            let project: ProjectConfig =
                serde_json::from_value(value).map_err(|e| ConfigError::Malformed {
                    project: name.clone(),
                    reason: e.to_string(),
                })?;
            project.validate(&name)?;
            projects.insert(name, project);
        }
        Ok(Self { projects })
    }

    pub fn single(name: &str, project: ProjectConfig) -> Result<Self, ConfigError> {
        project.validate(name)?;
        let mut projects = BTreeMap::new();
        projects.insert(name.to_string(), project);
        Ok(Self { projects })
    }

    /// Keeps only the named projects. Naming a project that is not configured
    /// is an error rather than a silent no-op.
    pub fn retain_named(&mut self, names: &[String]) -> Result<(), ConfigError> {
        if names.is_empty() {
            return Ok(());
        }
        if let Some(unknown) = names.iter().find(|n| !self.projects.contains_key(*n)) {
            return Err(ConfigError::UnknownProject(unknown.clone()));
        }
        self.projects.retain(|name, _| names.contains(name));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ProjectConfig> {
        self.projects.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ProjectConfig)> {
        self.projects.iter()
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }
}
