use std::{fs, path::Path};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Deserializer, Serialize};

use crate::access::{AccessPolicy, PermissionName};
use crate::scope::ScopeConfig;

pub const DEFAULT_DISCORD_API_BASE: &str = "https://discord.com/api/v10";

/// `config.yaml` as written by the operator. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub discord_token: String,
    #[serde(default, deserialize_with = "string_list")]
    pub forum_parent_ids: Vec<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub allowed_role_ids: Vec<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub allowed_permissions: Vec<String>,
    #[serde(default)]
    pub search_enabled: Option<bool>,
    #[serde(default, deserialize_with = "string_list")]
    pub search_channels: Vec<String>,
    #[serde(default)]
    pub discord_api_base: Option<String>,
    #[serde(default)]
    pub anilist_url: Option<String>,
}

/// List entries may be quoted or bare; snowflakes are often written
/// unquoted in YAML.
#[derive(Deserialize)]
#[serde(untagged)]
enum ListEntry {
    Number(u64),
    Text(String),
}

/// Any YAML list as strings; `null` is an empty list.
fn string_list<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries: Option<Vec<ListEntry>> = Option::deserialize(deserializer)?;
    Ok(entries
        .unwrap_or_default()
        .into_iter()
        .map(|entry| match entry {
            ListEntry::Number(n) => n.to_string(),
            ListEntry::Text(s) => s,
        })
        .collect())
}

/// Validated runtime settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub discord_token: String,
    pub scope: ScopeConfig,
    pub access: AccessPolicy,
    pub search_enabled: bool,
    pub discord_api_base: String,
    pub anilist_url: String,
}

pub fn resolve_env_var(raw: &str) -> String {
    resolve_env_var_with(raw, |key| std::env::var(key).ok())
}

fn resolve_env_var_with(raw: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut output = String::new();
    let mut rest = raw;

    while let Some(start) = rest.find("${") {
        output.push_str(&rest[..start]);

        let candidate = &rest[start + 2..];
        let Some(end) = candidate.find('}') else {
            output.push_str(&rest[start..]);
            return output;
        };

        output.push_str(&lookup(&candidate[..end]).unwrap_or_default());
        rest = &candidate[end + 1..];
    }

    output.push_str(rest);
    output
}

/// Reads the YAML file if it exists. A missing file is all defaults.
pub fn read_config_file(path: &Path) -> Result<FileConfig> {
    if !path.exists() {
        return Ok(FileConfig::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;
    if content.trim().is_empty() {
        return Ok(FileConfig::default());
    }
    serde_yaml::from_str(&content)
        .with_context(|| format!("failed to parse yaml file: {}", path.display()))
}

fn resolve_file_env(cfg: &mut FileConfig, lookup: &impl Fn(&str) -> Option<String>) {
    cfg.discord_token = resolve_env_var_with(&cfg.discord_token, lookup);
    for list in [
        &mut cfg.forum_parent_ids,
        &mut cfg.allowed_role_ids,
        &mut cfg.allowed_permissions,
        &mut cfg.search_channels,
    ] {
        for value in list.iter_mut() {
            *value = resolve_env_var_with(value, lookup);
        }
    }
    for url in [&mut cfg.discord_api_base, &mut cfg.anilist_url]
        .into_iter()
        .flatten()
    {
        *url = resolve_env_var_with(url, lookup);
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Environment values replace file values field by field. Unset or empty
/// variables leave the file value alone.
pub fn apply_env_overrides(cfg: &mut FileConfig, lookup: impl Fn(&str) -> Option<String>) {
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(token) = get("DISCORD_TOKEN") {
        cfg.discord_token = token.trim().to_string();
    }
    if let Some(ids) = get("FORUM_PARENT_IDS") {
        cfg.forum_parent_ids = split_list(&ids);
    }
    if let Some(ids) = get("ALLOWED_ROLE_IDS") {
        cfg.allowed_role_ids = split_list(&ids);
    }
    if let Some(names) = get("ALLOWED_PERMISSIONS") {
        cfg.allowed_permissions = split_list(&names);
    }
    if let Some(flag) = get("SEARCH_ENABLED") {
        let flag = flag.trim().to_lowercase();
        cfg.search_enabled = Some(matches!(flag.as_str(), "1" | "true" | "yes"));
    }
    if let Some(ids) = get("SEARCH_CHANNELS") {
        cfg.search_channels = split_list(&ids);
    }
}

fn parse_ids(field: &str, values: &[String]) -> Result<Vec<u64>> {
    values
        .iter()
        .map(|raw| raw.trim())
        .filter(|raw| !raw.is_empty())
        .map(|raw| {
            raw.parse::<u64>()
                .map_err(|_| anyhow!("invalid id in {field}: {raw:?}"))
        })
        .collect()
}

impl Settings {
    pub fn from_config(cfg: FileConfig) -> Result<Self> {
        let discord_token = cfg.discord_token.trim().to_string();
        if discord_token.is_empty() {
            return Err(anyhow!(
                "discord_token is required (set it in config.yaml or DISCORD_TOKEN)"
            ));
        }

        let scope = ScopeConfig {
            forum_parent_ids: parse_ids("forum_parent_ids", &cfg.forum_parent_ids)?
                .into_iter()
                .collect(),
            search_channel_ids: parse_ids("search_channels", &cfg.search_channels)?
                .into_iter()
                .collect(),
        };

        let role_ids = parse_ids("allowed_role_ids", &cfg.allowed_role_ids)?;
        let permissions = cfg
            .allowed_permissions
            .iter()
            .filter(|name| !name.trim().is_empty())
            .map(|name| name.parse::<PermissionName>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("invalid allowed_permissions")?;

        Ok(Self {
            discord_token,
            scope,
            access: AccessPolicy::from_lists(role_ids, permissions),
            search_enabled: cfg.search_enabled.unwrap_or(true),
            discord_api_base: cfg
                .discord_api_base
                .filter(|url| !url.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_DISCORD_API_BASE.to_string()),
            anilist_url: cfg
                .anilist_url
                .filter(|url| !url.trim().is_empty())
                .unwrap_or_else(|| kotatsu_provider::anilist::ANILIST_URL.to_string()),
        })
    }
}

/// File, then `${VAR}` placeholders, then environment overrides, then validation.
pub fn load_settings(path: &Path) -> Result<Settings> {
    load_settings_with(path, |key| std::env::var(key).ok())
}

pub fn load_settings_with(
    path: &Path,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Settings> {
    let mut cfg = read_config_file(path)?;
    resolve_file_env(&mut cfg, &lookup);
    apply_env_overrides(&mut cfg, &lookup);
    Settings::from_config(cfg)
}
