// src/cli/actions/mod.rs

//! The pluggable verb behind each noun the driver accepts.
//!
//! An action's lifecycle is fixed: `declare_options` during option-surface
//! assembly, then `validate`, `execute` and finally `close` once the noun is
//! dispatched. `close` runs even when validation or execution failed.

mod encrypt;
mod geoip;
mod incident;
mod probe;

pub use encrypt::EncryptAction;
pub use geoip::GeoIpAction;
pub use incident::IncidentAction;
pub use probe::ProbeAction;

use std::collections::BTreeMap;

use thiserror::Error;

use crate::cli::context::Context;
use crate::cli::options::OptionSet;
use crate::cli::rest::RestError;

/// Noun printing the application version. Handled by the driver itself and
/// never dispatched to the registry.
pub const NOUN_VERSION: &str = "version";
/// Noun printing the aggregated help text. Handled by the driver itself.
pub const NOUN_HELP: &str = "help";

#[derive(Error, Debug)]
pub enum ActionError {
    /// The invocation does not make sense; reported before any work starts.
    #[error("{0}")]
    Validation(String),

    /// The action started but could not finish.
    #[error("{0}")]
    Execution(String),

    /// A remote collaborator could not be reached or refused the request.
    #[error(transparent)]
    Transport(#[from] RestError),
}

/// One verb. Implementations are registered under a noun and receive the
/// execution context at each lifecycle stage.
pub trait Action {
    /// Contribute the options this action understands to the shared option
    /// surface. Called for every registered action on every invocation, so
    /// contributions must be idempotent (the `OptionSet` makes them so).
    fn declare_options(&self, _options: &mut OptionSet) {}

    /// Confirm the invocation makes sense before any work starts.
    fn validate(&mut self, _ctx: &mut Context) -> Result<(), ActionError> {
        Ok(())
    }

    /// Perform the work.
    fn execute(&mut self, ctx: &mut Context) -> Result<(), ActionError>;

    /// Release resources. Runs on every path, including after a validation
    /// or execution failure, and must not fail.
    fn close(&mut self, _ctx: &mut Context) {}

    /// A short description of the noun for the aggregated help output.
    fn help(&self) -> String {
        "No additional help is available.".to_string()
    }
}

/// The noun-to-action mapping the driver dispatches through.
///
/// Nouns are matched case-insensitively and the reserved `help`/`version`
/// nouns can never be claimed by an action.
#[derive(Default)]
pub struct ActionRegistry {
    actions: BTreeMap<String, Box<dyn Action>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in set of actions.
    pub fn catalog() -> Self {
        let mut registry = Self::new();
        registry.register("encrypt", Box::new(EncryptAction::new()));
        registry.register("geoip", Box::new(GeoIpAction::new()));
        registry.register("incident", Box::new(IncidentAction::new()));
        registry.register("test", Box::new(ProbeAction::new()));
        registry
    }

    /// Register an action under a noun. The noun is lowercased; reserved
    /// nouns are refused.
    pub fn register(&mut self, noun: &str, action: Box<dyn Action>) {
        let key = noun.to_lowercase();
        if key == NOUN_HELP || key == NOUN_VERSION {
            log::warn!("Ignoring an attempt to register the reserved noun '{}'", noun);
            return;
        }
        self.actions.insert(key, action);
    }

    /// Find the action for a noun, matching case-insensitively.
    pub fn find(&mut self, noun: &str) -> Option<&mut (dyn Action + '_)> {
        Some(self.actions.get_mut(&noun.to_lowercase())?.as_mut())
    }

    /// Visit every registered action, in noun order.
    pub fn visit(&self) -> impl Iterator<Item = (&str, &dyn Action)> {
        self.actions
            .iter()
            .map(|(noun, action)| (noun.as_str(), action.as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Marker;
    impl Action for Marker {
        fn execute(&mut self, _ctx: &mut Context) -> Result<(), ActionError> {
            Ok(())
        }
    }

    #[test]
    fn test_nouns_are_case_insensitive() {
        let mut registry = ActionRegistry::new();
        registry.register("Echo", Box::new(Marker));
        assert!(registry.find("echo").is_some());
        assert!(registry.find("ECHO").is_some());
        assert!(registry.find("other").is_none());
    }

    #[test]
    fn test_reserved_nouns_cannot_be_registered() {
        let mut registry = ActionRegistry::new();
        registry.register("Help", Box::new(Marker));
        registry.register("VERSION", Box::new(Marker));
        assert!(registry.find("help").is_none());
        assert!(registry.find("version").is_none());
    }

    #[test]
    fn test_catalog_contains_builtin_nouns() {
        let mut registry = ActionRegistry::catalog();
        for noun in ["encrypt", "geoip", "incident", "test"] {
            assert!(registry.find(noun).is_some(), "missing noun {}", noun);
        }
    }

    #[test]
    fn test_visit_is_in_noun_order() {
        let registry = ActionRegistry::catalog();
        let nouns: Vec<&str> = registry.visit().map(|(noun, _)| noun).collect();
        assert_eq!(nouns, vec!["encrypt", "geoip", "incident", "test"]);
    }
}
