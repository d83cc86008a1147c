//! Product listing.

use tabled::Tabled;

use aldes_core::{AirMode, Controller, HvacState, Product};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct ProductRow {
    #[tabled(rename = "Modem")]
    modem: String,
    #[tabled(rename = "Reference")]
    reference: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Mode")]
    mode: String,
    #[tabled(rename = "HVAC")]
    hvac: String,
    #[tabled(rename = "Thermostats")]
    thermostats: usize,
}

impl ProductRow {
    fn new(p: &Product, color: bool) -> Self {
        let code = p.air_mode();
        let mode = match code {
            Some(c) => AirMode::from_code(c).map_or_else(|| c.to_owned(), |m| format!("{c} ({m})")),
            None => "-".into(),
        };
        Self {
            modem: p.modem.clone(),
            reference: p.reference.clone().unwrap_or_default(),
            name: p.name.clone().unwrap_or_default(),
            mode,
            hvac: output::hvac_label(HvacState::from_code(code), color),
            thermostats: p.thermostats().len(),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(controller: &Controller, global: &GlobalOpts) -> Result<(), CliError> {
    let color = output::should_color(&global.color);
    let products = controller.products();
    let out = output::render_list(
        &global.output,
        products.as_slice(),
        |p| ProductRow::new(p, color),
        |p| p.modem.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
