//! Command dispatch: bridges CLI args -> controller calls -> output formatting.

pub mod config_cmd;
pub mod mode;
pub mod modes;
pub mod products;
pub mod thermostats;
pub mod watch;

use aldes_core::{Controller, ControllerConfig};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a network-bound command to the appropriate handler.
///
/// One-shot commands connect without the poller; `watch` owns its
/// controller lifecycle.
pub async fn dispatch(
    cmd: Command,
    config: ControllerConfig,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let cmd = match cmd {
        Command::Watch(args) => return watch::handle(config, args, global).await,
        other => other,
    };

    let controller = Controller::new(config.with_refresh_interval(std::time::Duration::ZERO));
    controller.connect().await?;

    let result = match cmd {
        Command::Products => products::handle(&controller, global),
        Command::Thermostats => thermostats::list(&controller, global),
        Command::Mode(args) => mode::handle(&controller, args, global).await,
        Command::Thermostat(args) => thermostats::handle(&controller, args, global).await,
        Command::Watch(_) | Command::Modes | Command::Config(_) | Command::Completions(_) => {
            Err(CliError::Internal("command handled before dispatch".into()))
        }
    };

    controller.disconnect().await;
    result
}
