//! Mode table (offline).

use tabled::Tabled;

use aldes_core::{AirMode, ModeInfo};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct ModeRow {
    #[tabled(rename = "Code")]
    code: &'static str,
    #[tabled(rename = "Name")]
    name: &'static str,
    #[tabled(rename = "HVAC")]
    hvac: String,
}

pub fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let color = output::should_color(&global.color);
    let table = AirMode::table();
    let out = output::render_list(
        &global.output,
        table.as_slice(),
        |m: &ModeInfo| ModeRow {
            code: m.code,
            name: m.name,
            hvac: output::hvac_label(m.hvac, color),
        },
        |m| m.code.to_owned(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
