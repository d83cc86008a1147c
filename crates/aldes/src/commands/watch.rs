//! Long-running watch: run the poller and print change events until Ctrl-C.

use std::time::Duration;

use chrono::Local;
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

use aldes_core::{ChangeEvent, Controller, ControllerConfig, HvacState};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output;

pub async fn handle(
    mut config: ControllerConfig,
    args: WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    if let Some(secs) = args.interval {
        config.refresh_interval = Duration::from_secs(secs.max(1));
    }
    if config.refresh_interval.is_zero() {
        return Err(CliError::Validation {
            field: "interval".into(),
            reason: "watch needs a non-zero poll period".into(),
        });
    }

    let controller = Controller::new(config);
    let mut events = controller.events();
    controller.connect().await?;

    if !global.quiet {
        eprintln!(
            "Watching {} product(s), {} thermostat(s). Press Ctrl-C to stop.",
            controller.products().len(),
            controller.thermostats().len()
        );
    }

    let color = output::should_color(&global.color);
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            received = events.recv() => match received {
                Ok(event) => print_event(&event, global, color)?,
                Err(RecvError::Lagged(n)) => warn!(skipped = n, "event stream lagged"),
                Err(RecvError::Closed) => break,
            },
        }
    }

    controller.disconnect().await;
    Ok(())
}

fn print_event(event: &ChangeEvent, global: &GlobalOpts, color: bool) -> Result<(), CliError> {
    let line = match global.output {
        OutputFormat::Json | OutputFormat::JsonCompact => serde_json::to_string(event)?,
        _ => describe(event, color),
    };
    output::print_output(&line, global.quiet);
    Ok(())
}

fn describe(event: &ChangeEvent, color: bool) -> String {
    let now = Local::now().format("%H:%M:%S");
    match event {
        ChangeEvent::ModeChanged { previous, current } => {
            let hvac = HvacState::from_code(current.as_deref());
            format!(
                "{now} mode {} -> {} ({})",
                previous.as_deref().unwrap_or("-"),
                current.as_deref().unwrap_or("-"),
                output::hvac_label(hvac, color)
            )
        }
        ChangeEvent::ProductsChanged { products } => {
            let thermostats: Vec<String> = products
                .first()
                .map(|p| {
                    p.thermostats()
                        .iter()
                        .map(|t| {
                            let set = t.temperature_set.map(|v| v.to_string()).unwrap_or_default();
                            format!("{}={set}", t.name)
                        })
                        .collect()
                })
                .unwrap_or_default();
            format!("{now} products updated [{}]", thermostats.join(", "))
        }
    }
}
