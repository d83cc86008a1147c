//! Thermostat listing and setpoint changes.

use std::sync::Arc;

use tabled::Tabled;

use aldes_core::{Controller, Thermostat};

use crate::cli::{GlobalOpts, ThermostatArgs, ThermostatCommand};
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct ThermostatRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Setpoint")]
    setpoint: String,
    #[tabled(rename = "Current")]
    current: String,
}

impl ThermostatRow {
    fn new(t: &Thermostat) -> Self {
        Self {
            id: t.thermostat_id.to_string(),
            name: t.name.clone(),
            setpoint: t
                .temperature_set
                .map(|v| format!("{v} °C"))
                .unwrap_or_default(),
            current: t
                .current_temperature
                .map(|v| format!("{v} °C"))
                .unwrap_or_default(),
        }
    }
}

fn detail(t: &Arc<Thermostat>) -> String {
    let row = ThermostatRow::new(t);
    format!(
        "{} ({})\n  setpoint: {}\n  current:  {}",
        row.name, row.id, row.setpoint, row.current
    )
}

// ── Handlers ────────────────────────────────────────────────────────

pub fn list(controller: &Controller, global: &GlobalOpts) -> Result<(), CliError> {
    let thermostats = controller.thermostats();
    let out = output::render_list(
        &global.output,
        thermostats.as_slice(),
        |t| ThermostatRow::new(t),
        |t| t.thermostat_id.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn handle(
    controller: &Controller,
    args: ThermostatArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        ThermostatCommand::Set { id, temperature } => {
            let updated = controller.set_target_temperature(id, temperature).await?;
            let out = output::render_single(&global.output, &updated, detail, |t| {
                t.thermostat_id.to_string()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
