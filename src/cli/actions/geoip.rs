// src/cli/actions/geoip.rs

use reqwest::Method;

use crate::cli::actions::{Action, ActionError};
use crate::cli::context::Context;
use crate::cli::rest::RestClient;

/// The service queried when no `geoip.url` property overrides it.
const DEFAULT_SERVICE_URL: &str = "http://ip-api.com/json";

const URL_PROPERTY: &str = "geoip.url";

/// An example of how to call a REST service in an action.
///
/// Looks up the geolocation of the caller's public IP address and prints the
/// service's response. The service URL can be overridden per environment
/// with the `geoip.url` property.
#[derive(Default)]
pub struct GeoIpAction;

impl GeoIpAction {
    pub fn new() -> Self {
        Self
    }
}

impl Action for GeoIpAction {
    fn execute(&mut self, ctx: &mut Context) -> Result<(), ActionError> {
        let url = ctx
            .property(URL_PROPERTY)
            .unwrap_or(DEFAULT_SERVICE_URL)
            .to_string();

        let client = RestClient::new(ctx.properties.proxy_config().as_ref())?;
        let response = client.execute(Method::GET, &url, None)?;

        if !response.is_success() {
            return Err(ActionError::Execution(format!(
                "The geolocation service returned {} {}",
                response.status_code, response.reason
            )));
        }

        match response.result {
            Some(record) => {
                let text = serde_json::to_string_pretty(&record)
                    .unwrap_or_else(|_| record.to_string());
                ctx.output_line(&text);
            }
            None => ctx.info("The geolocation service returned no data"),
        }
        Ok(())
    }

    fn help(&self) -> String {
        "Get the location of the computer based on the geolocation of the IP address."
            .to_string()
    }
}
