// src/cli/actions/incident.rs

use reqwest::Method;
use serde_json::Value;

use crate::cli::actions::{Action, ActionError};
use crate::cli::context::Context;
use crate::cli::options::OptionSet;
use crate::cli::rest::RestClient;

const OPT_ID: &str = "id";

/// The table resource queried on the configured service.
const INCIDENT_URI: &str = "/api/now/v1/table/incident";

const SAAS_SCHEME: &str = "saas.scheme";
const SAAS_HOST: &str = "saas.host";
const SAAS_PORT: &str = "saas.port";
const SAAS_USER: &str = "saas.user";
const SAAS_PASS: &str = "saas.pass";

/// Retrieve an incident record from the configured SaaS service.
///
/// The service location and credentials come from environment-qualified
/// properties (`saas.host`, `saas.user` and the obfuscated `saas.pass`), so
/// `-env` selects which deployment is queried. The record is rendered in the
/// format selected with `-fmt`.
#[derive(Default)]
pub struct IncidentAction {
    id: Option<String>,
    scheme: String,
    host: String,
    port: Option<u16>,
    user: Option<String>,
    password: Option<String>,
}

impl IncidentAction {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Action for IncidentAction {
    fn declare_options(&self, options: &mut OptionSet) {
        options.add_option(OPT_ID, "text", "The identifier to query.");
    }

    fn validate(&mut self, ctx: &mut Context) -> Result<(), ActionError> {
        self.id = ctx.command_value(OPT_ID).map(str::to_string);
        if self.id.is_none() {
            return Err(ActionError::Validation(self.help()));
        }

        let Some(host) = ctx.property(SAAS_HOST) else {
            return Err(ActionError::Validation(format!(
                "The property '{}.{}' is not set",
                ctx.env, SAAS_HOST
            )));
        };
        self.host = host.to_string();
        self.scheme = ctx.property(SAAS_SCHEME).unwrap_or("https").to_string();
        self.port = ctx.property(SAAS_PORT).and_then(|p| p.trim().parse().ok());

        self.user = ctx.property(SAAS_USER).map(str::to_string);
        if let Some(user) = &self.user {
            let Some(password) = ctx.encrypted_property(SAAS_PASS) else {
                return Err(ActionError::Validation(format!(
                    "The property '{}.{}' is missing or could not be decrypted",
                    ctx.env, SAAS_PASS
                )));
            };
            ctx.trace(&format!("Using a SaaS user of: {}", user));
            self.password = Some(password);
        }

        ctx.debug(&format!(
            "Getting incident {} from {}",
            self.id.as_deref().unwrap_or_default(),
            self.host
        ));
        Ok(())
    }

    fn execute(&mut self, ctx: &mut Context) -> Result<(), ActionError> {
        let id = self.id.take().unwrap_or_default();
        let mut url = format!("{}://{}", self.scheme, self.host);
        if let Some(port) = self.port {
            url.push_str(&format!(":{}", port));
        }
        url.push_str(&format!("{}/{}", INCIDENT_URI, id));

        let client = RestClient::new(ctx.properties.proxy_config().as_ref())?;
        let response = match (&self.user, &self.password) {
            (Some(user), Some(password)) => {
                client.execute_with_auth(Method::GET, &url, user, password, None)?
            }
            _ => client.execute(Method::GET, &url, None)?,
        };

        if !response.is_success() {
            return Err(ActionError::Execution(format!(
                "The service returned {} {}",
                response.status_code, response.reason
            )));
        }
        if let Some(error) = response.error {
            return Err(ActionError::Execution(format!(
                "The service reported an error: {}",
                error
            )));
        }

        match response.result {
            Some(record) => {
                let rendered = render(&record, &ctx.display_format());
                ctx.output_line(&rendered);
            }
            None => ctx.info(&format!("No incident found for '{}'", id)),
        }
        Ok(())
    }

    fn help(&self) -> String {
        "Get an incident record.\n    Specify an (-id) of an incident to retrieve.".to_string()
    }
}

/// Render a record in the requested display format. `csv` and `tab` flatten
/// the top-level members into a header line and a value line; anything else
/// pretty-prints the JSON.
fn render(record: &Value, format: &str) -> String {
    match format.to_lowercase().as_str() {
        "csv" => delimit(record, ","),
        "tab" => delimit(record, "\t"),
        _ => serde_json::to_string_pretty(record).unwrap_or_else(|_| record.to_string()),
    }
}

fn delimit(record: &Value, separator: &str) -> String {
    let Some(members) = record.as_object() else {
        return record.to_string();
    };
    let headers: Vec<&str> = members.keys().map(String::as_str).collect();
    let values: Vec<String> = members
        .values()
        .map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect();
    format!("{}\n{}", headers.join(separator), values.join(separator))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cipher;
    use crate::core::properties::PropertyStore;
    use crate::core::symbols::SymbolTable;
    use serde_json::json;

    fn context_with(args: &[&str], properties: PropertyStore) -> Context {
        let mut options = OptionSet::new();
        options.add_option("fmt", "CSV,TAB", "output format");
        IncidentAction::new().declare_options(&mut options);
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        let cmd = options.parse(&args).unwrap();
        Context::new(cmd, SymbolTable::new(), properties)
    }

    #[test]
    fn test_validate_requires_an_id() {
        let mut action = IncidentAction::new();
        let mut ctx = context_with(&[], PropertyStore::empty());
        let err = action.validate(&mut ctx).unwrap_err();
        assert!(matches!(err, ActionError::Validation(_)));
        assert!(err.to_string().contains("-id"));
    }

    #[test]
    fn test_validate_requires_a_configured_host() {
        let mut action = IncidentAction::new();
        let mut ctx = context_with(&["-id", "INC001"], PropertyStore::empty());
        let err = action.validate(&mut ctx).unwrap_err();
        assert!(err.to_string().contains("DEV.saas.host"));
    }

    #[test]
    fn test_validate_resolves_credentials_from_properties() {
        let armored = cipher::encrypt_token("hunter2").unwrap();
        let mut store = PropertyStore::empty();
        store.set("UAT.saas.host", "uat.example.com");
        store.set("UAT.saas.port", "8443");
        store.set("UAT.saas.user", "alice");
        store.set("UAT.saas.pass", &armored);

        let mut action = IncidentAction::new();
        let mut ctx = context_with(&["-id", "INC001"], store);
        ctx.env = "uat".parse().unwrap();

        assert!(action.validate(&mut ctx).is_ok());
        assert_eq!(action.host, "uat.example.com");
        assert_eq!(action.scheme, "https");
        assert_eq!(action.port, Some(8443));
        assert_eq!(action.password.as_deref(), Some("hunter2"));
    }

    #[test]
    fn test_validate_rejects_undecryptable_password() {
        let mut store = PropertyStore::empty();
        store.set("DEV.saas.host", "dev.example.com");
        store.set("DEV.saas.user", "alice");
        store.set("DEV.saas.pass", "!!not armor!!");

        let mut action = IncidentAction::new();
        let mut ctx = context_with(&["-id", "INC001"], store);
        let err = action.validate(&mut ctx).unwrap_err();
        assert!(err.to_string().contains("DEV.saas.pass"));
    }

    #[test]
    fn test_render_formats() {
        let record = json!({"number": "INC001", "state": 2, "short_description": "printer on fire"});
        let csv = render(&record, "CSV");
        assert_eq!(
            csv,
            "number,short_description,state\nINC001,printer on fire,2"
        );
        let tab = render(&record, "tab");
        assert!(tab.contains("number\tshort_description\tstate"));
        let txt = render(&record, "txt");
        assert!(txt.contains("\"number\": \"INC001\""));
    }
}
