//! Config subcommands: path, profiles, set-password.

use std::io::{BufRead, IsTerminal};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            output::print_output(
                &aldes_config::config_path().display().to_string(),
                global.quiet,
            );
            Ok(())
        }

        ConfigCommand::Profiles => {
            let cfg = aldes_config::load_config()?;
            let active = cfg.active_profile_name(global.profile.as_deref());
            let lines: Vec<String> = cfg
                .profile_names()
                .into_iter()
                .map(|name| {
                    if name == active {
                        format!("* {name}")
                    } else {
                        format!("  {name}")
                    }
                })
                .collect();
            output::print_output(&lines.join("\n"), global.quiet);
            Ok(())
        }

        ConfigCommand::SetPassword => {
            let cfg = aldes_config::load_config_or_default();
            let profile = cfg.active_profile_name(global.profile.as_deref());

            let password = read_password()?;
            if password.is_empty() {
                return Err(CliError::Validation {
                    field: "password".into(),
                    reason: "password cannot be empty".into(),
                });
            }

            aldes_config::store_password(&profile, &password)?;
            if !global.quiet {
                eprintln!("Password stored in keyring for profile '{profile}'");
            }
            Ok(())
        }
    }
}

/// Prompt without echo on a terminal; read one line when stdin is piped.
fn read_password() -> Result<String, CliError> {
    let stdin = std::io::stdin();
    if stdin.is_terminal() {
        return Ok(rpassword::prompt_password("Password: ")?);
    }

    let mut line = String::new();
    stdin.lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_owned())
}
