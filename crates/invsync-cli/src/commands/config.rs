use std::path::PathBuf;

use invsync_core::util::normalize_text_option;
use invsync_core::TenantId;

use crate::cli::ConfigCommands;
use crate::commands::common::{effective_settings, EnvOverrides, CLOUD_TOKEN_ENV};
use crate::config_profiles::{is_cloud_url, CliProfile, CliProfilesConfig};
use crate::error::CliError;

pub fn run_config(
    command: ConfigCommands,
    global_profile: Option<&str>,
    db_path: Option<PathBuf>,
) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init {
            tenant,
            cloud_url,
            local_dir,
            no_activate,
        } => run_config_init(global_profile, tenant, cloud_url, local_dir, no_activate),
        ConfigCommands::Show { json } => run_config_show(global_profile, db_path, json),
    }
}

pub fn run_config_init(
    profile_name: Option<&str>,
    tenant: Option<String>,
    cloud_url: Option<String>,
    local_dir: Option<PathBuf>,
    no_activate: bool,
) -> Result<(), CliError> {
    let mut config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(profile_name);

    apply_profile_update(
        config.profile_mut_or_default(&profile_name),
        tenant,
        cloud_url,
        local_dir,
    )?;

    if !no_activate {
        config.active_profile = Some(profile_name.clone());
    }

    let path = config.save().map_err(CliError::Config)?;
    println!(
        "Profile '{}' initialized at {}",
        profile_name,
        path.display()
    );

    let profile = config
        .profiles
        .get(&profile_name)
        .ok_or_else(|| CliError::Config("Failed to persist profile".to_string()))?;
    let missing_fields = missing_profile_fields(profile);
    if missing_fields.is_empty() {
        println!(
            "Profile '{profile_name}' is ready. Export {CLOUD_TOKEN_ENV} and run `invsync sync pull`."
        );
    } else {
        println!(
            "Profile '{}' is missing: {}",
            profile_name,
            missing_fields.join(", ")
        );
    }

    Ok(())
}

/// Overwrite the fields given explicitly, validating each one
pub fn apply_profile_update(
    profile: &mut CliProfile,
    tenant: Option<String>,
    cloud_url: Option<String>,
    local_dir: Option<PathBuf>,
) -> Result<(), CliError> {
    if let Some(tenant) = normalize_text_option(tenant) {
        let tenant: TenantId = tenant.parse()?;
        profile.tenant_id = Some(tenant.into());
    }
    if let Some(url) = normalize_text_option(cloud_url) {
        if !is_cloud_url(&url) {
            return Err(CliError::Config(
                "cloud_url must include libsql://, https://, or http://".to_string(),
            ));
        }
        profile.cloud_url = Some(url);
    }
    if let Some(dir) = local_dir.filter(|dir| !dir.as_os_str().is_empty()) {
        profile.local_dir = Some(dir);
    }
    Ok(())
}

pub fn missing_profile_fields(profile: &CliProfile) -> Vec<&'static str> {
    let mut missing_fields = Vec::new();
    if profile.tenant_id().is_none() {
        missing_fields.push("tenant_id");
    }
    if profile.cloud_url().is_none() {
        missing_fields.push("cloud_url");
    }
    missing_fields
}

fn run_config_show(
    profile_name: Option<&str>,
    db_path: Option<PathBuf>,
    as_json: bool,
) -> Result<(), CliError> {
    let config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(profile_name);
    let settings = effective_settings(
        &profile_name,
        config.profile(&profile_name),
        &EnvOverrides::from_env(),
        db_path,
    );

    if as_json {
        println!("{}", serde_json::to_string_pretty(&settings)?);
        return Ok(());
    }

    let unset = || "(not set)".to_string();
    println!("profile:     {}", settings.profile);
    println!(
        "tenant:      {}",
        settings.tenant_id.clone().unwrap_or_else(unset)
    );
    println!(
        "cloud url:   {}",
        settings.cloud_url.clone().unwrap_or_else(unset)
    );
    println!(
        "cloud token: {}",
        if settings.cloud_token_set {
            "set"
        } else {
            "not set"
        }
    );
    println!(
        "local file:  {}",
        settings
            .local_path
            .as_ref()
            .map_or_else(unset, |path| path.display().to_string())
    );
    Ok(())
}
