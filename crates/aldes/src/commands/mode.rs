//! Air mode read and change.

use serde::Serialize;

use aldes_core::{AirMode, Controller, HvacState};

use crate::cli::{GlobalOpts, ModeArgs, ModeCommand};
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct ModeStatus {
    code: Option<String>,
    name: Option<&'static str>,
    hvac: HvacState,
}

pub async fn handle(
    controller: &Controller,
    args: ModeArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        ModeCommand::Get => {
            let code = controller.current_mode_code();
            let status = ModeStatus {
                name: code.as_deref().and_then(AirMode::from_code).map(AirMode::name),
                hvac: controller.hvac_state(),
                code,
            };
            let color = output::should_color(&global.color);
            let out = output::render_single(
                &global.output,
                &status,
                |s| {
                    format!(
                        "{} ({}) {}",
                        s.name.unwrap_or("unknown"),
                        s.code.as_deref().unwrap_or("-"),
                        output::hvac_label(s.hvac, color)
                    )
                },
                |s| s.code.clone().unwrap_or_default(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ModeCommand::Set { mode } => {
            let mode: AirMode = mode.parse()?;
            controller.update_mode(mode).await?;
            if !global.quiet {
                eprintln!("Mode set to {mode} ({})", mode.code());
            }
            Ok(())
        }
    }
}
