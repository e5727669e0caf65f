// src/cli/actions/encrypt.rs

use crate::cli::actions::{Action, ActionError};
use crate::cli::context::Context;
use crate::cli::options::OptionSet;
use crate::core::cipher;

const OPT_TOKEN: &str = "token";

/// Encrypt a token for the properties file.
///
/// Values obfuscated this way can be stored under any property key and read
/// back through the encrypted-property lookup on the context.
#[derive(Default)]
pub struct EncryptAction {
    token: Option<String>,
}

impl EncryptAction {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Action for EncryptAction {
    fn declare_options(&self, options: &mut OptionSet) {
        options.add_option(OPT_TOKEN, "text", "The string token to parse or process.");
    }

    fn validate(&mut self, ctx: &mut Context) -> Result<(), ActionError> {
        self.token = ctx.command_value(OPT_TOKEN).map(str::to_string);
        if self.token.is_none() {
            return Err(ActionError::Validation(format!(
                "No arguments specified\n{}",
                self.help()
            )));
        }
        Ok(())
    }

    fn execute(&mut self, ctx: &mut Context) -> Result<(), ActionError> {
        let token = self.token.take().unwrap_or_default();
        let ciphertext = cipher::encrypt_token(&token)
            .map_err(|e| ActionError::Execution(e.to_string()))?;
        ctx.output_line(&format!("Token '{}' encrypts to '{}'", token, ciphertext));
        Ok(())
    }

    fn help(&self) -> String {
        "Encrypt a token for the properties file.".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::properties::PropertyStore;
    use crate::core::symbols::SymbolTable;

    fn context_with(args: &[&str]) -> Context {
        let mut options = OptionSet::new();
        EncryptAction::new().declare_options(&mut options);
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        let cmd = options.parse(&args).unwrap();
        Context::new(cmd, SymbolTable::new(), PropertyStore::empty())
    }

    #[test]
    fn test_validate_requires_a_token() {
        let mut action = EncryptAction::new();
        let mut ctx = context_with(&[]);
        let err = action.validate(&mut ctx).unwrap_err();
        assert!(matches!(err, ActionError::Validation(_)));

        let mut ctx = context_with(&["-token", "hunter2"]);
        assert!(action.validate(&mut ctx).is_ok());
    }

    #[test]
    fn test_execute_emits_armored_ciphertext() {
        let mut action = EncryptAction::new();
        let mut ctx = context_with(&["-token", "hunter2"]);
        action.validate(&mut ctx).unwrap();
        assert!(action.execute(&mut ctx).is_ok());
    }
}
