// Products endpoints
//
// One read (`GET …/products`) and two writes keyed by the modem id
// (`PATCH …/updateThermostats`, `POST …/commands`).

use tracing::{debug, info};

use crate::client::AldesClient;
use crate::error::Error;
use crate::models::{ModeCommand, Product, ThermostatUpdate};

const PRODUCTS_PATH: [&str; 5] = ["aldesoc", "v5", "users", "me", "products"];

impl AldesClient {
    fn product_endpoint(&self, modem: &str, action: &str) -> url::Url {
        let mut segments: Vec<&str> = PRODUCTS_PATH.to_vec();
        segments.extend([modem, action]);
        self.endpoint(&segments)
    }

    /// Fetch every product attached to the account, in service order.
    pub async fn fetch_products(&self) -> Result<Vec<Product>, Error> {
        let url = self.endpoint(&PRODUCTS_PATH);
        debug!("GET {url}");

        let resp = self.send_authorized(|http| http.get(url.clone())).await?;
        self.handle_response(resp).await
    }

    /// Push a new setpoint for one thermostat.
    ///
    /// The body is a single-element array: `[{"ThermostatId":…,"TemperatureSet":…}]`.
    pub async fn update_thermostats(
        &self,
        modem: &str,
        update: &ThermostatUpdate,
    ) -> Result<(), Error> {
        let url = self.product_endpoint(modem, "updateThermostats");
        info!(
            thermostat = %update.thermostat_id,
            setpoint = %update.temperature_set,
            "PATCH {url}"
        );

        let body = [*update];
        let resp = self
            .send_authorized(|http| http.patch(url.clone()).json(&body))
            .await?;
        self.handle_empty(resp).await
    }

    /// Send a `changeMode` command with a single-letter air mode code.
    pub async fn change_mode(&self, modem: &str, code: &str) -> Result<(), Error> {
        let url = self.product_endpoint(modem, "commands");
        info!(mode = code, "POST {url}");

        let body = ModeCommand::change_mode(code);
        let resp = self
            .send_authorized(|http| http.post(url.clone()).json(&body))
            .await?;
        self.handle_empty(resp).await
    }
}
