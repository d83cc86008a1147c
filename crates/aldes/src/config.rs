//! Flag-aware configuration: the profile chain from `aldes-config` with
//! `--username`, `--password`, `--base-url`, and `--timeout` layered on top.

use std::time::Duration;

use secrecy::SecretString;

use aldes_config::{Config, Profile};
use aldes_core::ControllerConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Build a `ControllerConfig` from the config file, profile, and CLI overrides.
pub fn build_controller_config(global: &GlobalOpts) -> Result<ControllerConfig, CliError> {
    let cfg = aldes_config::load_config_or_default();
    resolve(&cfg, global)
}

fn resolve(cfg: &Config, global: &GlobalOpts) -> Result<ControllerConfig, CliError> {
    let profile_name = cfg.active_profile_name(global.profile.as_deref());

    let profile = match cfg.profiles.get(&profile_name) {
        Some(profile) => profile.clone(),
        // An explicitly requested profile must exist.
        None if global.profile.is_some() => {
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: available(cfg),
            });
        }
        // No profile at all: flags and env vars only.
        None => Profile::default(),
    };

    let profile = apply_overrides(profile, global);
    let mut config =
        aldes_config::profile_to_controller_config(&profile, &profile_name, &cfg.defaults)?;

    if let Some(ref raw) = global.base_url {
        config.base_url = raw.parse().map_err(|_| CliError::Validation {
            field: "base-url".into(),
            reason: format!("invalid URL: {raw}"),
        })?;
    }
    if let Some(secs) = global.timeout {
        config.timeout = Duration::from_secs(secs);
    }
    if let Some(ref pw) = global.password {
        config.password = SecretString::from(pw.clone());
    }
    Ok(config)
}

/// Flags win over profile values for identity fields.
fn apply_overrides(mut profile: Profile, global: &GlobalOpts) -> Profile {
    if let Some(ref username) = global.username {
        profile.username = Some(username.clone());
    }
    // A flag password short-circuits keyring lookup.
    if let Some(ref pw) = global.password {
        profile.password = Some(pw.clone());
        profile.password_env = None;
    }
    profile
}

fn available(cfg: &Config) -> String {
    let names = cfg.profile_names();
    if names.is_empty() {
        "(none)".into()
    } else {
        names.join(", ")
    }
}
