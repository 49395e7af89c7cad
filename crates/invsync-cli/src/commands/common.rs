use std::env;
use std::path::PathBuf;

use invsync_core::db::{CloudConfig, Database};
use invsync_core::util::normalize_text_option;
use invsync_core::TenantId;
use serde::Serialize;

use crate::config_profiles::{CliProfile, CliProfilesConfig};
use crate::error::CliError;

pub const TENANT_ENV: &str = "INVSYNC_TENANT";
pub const CLOUD_URL_ENV: &str = "INVSYNC_CLOUD_URL";
pub const CLOUD_TOKEN_ENV: &str = "INVSYNC_CLOUD_TOKEN";
pub const LOCAL_DIR_ENV: &str = "INVSYNC_LOCAL_DIR";

/// Settings taken from the process environment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverrides {
    pub tenant_id: Option<String>,
    pub cloud_url: Option<String>,
    pub cloud_token: Option<String>,
    pub local_dir: Option<PathBuf>,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        Self {
            tenant_id: normalize_text_option(env::var(TENANT_ENV).ok()),
            cloud_url: normalize_text_option(env::var(CLOUD_URL_ENV).ok()),
            cloud_token: normalize_text_option(env::var(CLOUD_TOKEN_ENV).ok()),
            local_dir: env::var_os(LOCAL_DIR_ENV)
                .map(PathBuf::from)
                .filter(|dir| !dir.as_os_str().is_empty()),
        }
    }
}

/// Everything a sync pass needs, fully resolved
#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub profile: String,
    pub tenant: TenantId,
    pub cloud: CloudConfig,
    pub local_path: PathBuf,
}

/// Effective profile values, as shown by `config show`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EffectiveSettings {
    pub profile: String,
    pub tenant_id: Option<String>,
    pub cloud_url: Option<String>,
    pub cloud_token_set: bool,
    pub local_path: Option<PathBuf>,
}

pub fn default_local_dir() -> Result<PathBuf, CliError> {
    dirs::data_dir()
        .map(|dir| dir.join("invsync"))
        .ok_or_else(|| CliError::Config("Failed to resolve CLI data directory".to_string()))
}

/// Merge `--db-path`, the environment, and the stored profile, in that order.
pub fn resolve_sync_settings(
    profile_name: &str,
    profile: Option<&CliProfile>,
    overrides: &EnvOverrides,
    db_path: Option<PathBuf>,
) -> Result<SyncSettings, CliError> {
    let tenant_id = overrides
        .tenant_id
        .clone()
        .or_else(|| profile.and_then(CliProfile::tenant_id))
        .ok_or(CliError::SyncNotConfigured {
            setting: "tenant_id",
            env_var: TENANT_ENV,
        })?;
    let tenant: TenantId = tenant_id.parse()?;

    let cloud_url = overrides
        .cloud_url
        .clone()
        .or_else(|| profile.and_then(CliProfile::cloud_url))
        .ok_or(CliError::SyncNotConfigured {
            setting: "cloud_url",
            env_var: CLOUD_URL_ENV,
        })?;
    let cloud_token = overrides
        .cloud_token
        .clone()
        .ok_or(CliError::SyncNotConfigured {
            setting: "cloud token",
            env_var: CLOUD_TOKEN_ENV,
        })?;
    let cloud = CloudConfig::new(cloud_url, cloud_token)?;

    let local_path = match db_path {
        Some(path) => path,
        None => {
            let local_dir = match resolve_local_dir(profile, overrides) {
                Some(dir) => dir,
                None => default_local_dir()?,
            };
            Database::local_path_for(local_dir, &tenant)
        }
    };

    Ok(SyncSettings {
        profile: profile_name.to_string(),
        tenant,
        cloud,
        local_path,
    })
}

/// Same merge as [`resolve_sync_settings`], without requiring any value
pub fn effective_settings(
    profile_name: &str,
    profile: Option<&CliProfile>,
    overrides: &EnvOverrides,
    db_path: Option<PathBuf>,
) -> EffectiveSettings {
    let tenant_id = overrides
        .tenant_id
        .clone()
        .or_else(|| profile.and_then(CliProfile::tenant_id));
    let local_path = db_path.or_else(|| {
        let tenant = tenant_id.as_deref()?.parse::<TenantId>().ok()?;
        let local_dir = resolve_local_dir(profile, overrides).or_else(|| default_local_dir().ok())?;
        Some(Database::local_path_for(local_dir, &tenant))
    });

    EffectiveSettings {
        profile: profile_name.to_string(),
        cloud_url: overrides
            .cloud_url
            .clone()
            .or_else(|| profile.and_then(CliProfile::cloud_url)),
        cloud_token_set: overrides.cloud_token.is_some(),
        tenant_id,
        local_path,
    }
}

fn resolve_local_dir(profile: Option<&CliProfile>, overrides: &EnvOverrides) -> Option<PathBuf> {
    overrides
        .local_dir
        .clone()
        .or_else(|| profile.and_then(|profile| profile.local_dir.clone()))
}

/// Load the profile config and resolve sync settings from it and the environment
pub fn load_sync_settings(
    explicit_profile: Option<&str>,
    db_path: Option<PathBuf>,
) -> Result<SyncSettings, CliError> {
    let config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(explicit_profile);
    resolve_sync_settings(
        &profile_name,
        config.profile(&profile_name),
        &EnvOverrides::from_env(),
        db_path,
    )
}
