// src/cli/options.rs

//! The declared-option descriptor and the argument parser behind it.
//!
//! The option surface is assembled at runtime: the driver adds its own
//! options first and every registered action then contributes the options it
//! understands. Because of that, and because driver options are single-dash
//! multi-character names (`-env`, `-fmt`), parsing is done directly over the
//! raw tokens rather than through a static declarative parser.

use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum OptionsError {
    #[error("Unrecognized option '-{0}'")]
    Unrecognized(String),
    #[error("Missing argument for option '-{0}'")]
    MissingArgument(String),
}

#[derive(Debug, Clone)]
struct OptionSpec {
    name: String,
    /// Display name for the option's argument; `None` marks a boolean flag.
    arg_name: Option<String>,
    description: String,
}

/// An ordered set of declared options.
///
/// Declarations are first-wins: contributing an option whose name is already
/// present is a no-op, so every action can declare the options it needs
/// without coordinating with the others.
#[derive(Debug, Default)]
pub struct OptionSet {
    specs: Vec<OptionSpec>,
}

impl OptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has(&self, name: &str) -> bool {
        self.specs.iter().any(|s| s.name == name)
    }

    /// Declare a boolean flag.
    pub fn add_flag(&mut self, name: &str, description: &str) {
        if self.has(name) {
            return;
        }
        self.specs.push(OptionSpec {
            name: name.to_string(),
            arg_name: None,
            description: description.to_string(),
        });
    }

    /// Declare an option that takes a value.
    pub fn add_option(&mut self, name: &str, arg_name: &str, description: &str) {
        if self.has(name) {
            return;
        }
        self.specs.push(OptionSpec {
            name: name.to_string(),
            arg_name: Some(arg_name.to_string()),
            description: description.to_string(),
        });
    }

    /// Render the option table for usage and help output.
    pub fn usage(&self) -> String {
        let headers: Vec<String> = self
            .specs
            .iter()
            .map(|s| match &s.arg_name {
                Some(arg) => format!("-{} <{}>", s.name, arg),
                None => format!("-{}", s.name),
            })
            .collect();
        let width = headers.iter().map(String::len).max().unwrap_or(0);

        let mut b = String::new();
        for (header, spec) in headers.iter().zip(&self.specs) {
            b.push_str(&format!(" {:<width$}  {}\n", header, spec.description));
        }
        b
    }

    /// Parse an option vector against the declared set.
    ///
    /// Tokens starting with `-` must name a declared option; an option that
    /// takes a value consumes the following token. Anything else is kept as
    /// a residual positional argument.
    pub fn parse(&self, args: &[String]) -> Result<CommandLine, OptionsError> {
        let mut values = HashMap::new();
        let mut positional = Vec::new();
        let mut iter = args.iter().peekable();

        while let Some(token) = iter.next() {
            let name = token
                .strip_prefix("--")
                .or_else(|| token.strip_prefix('-'))
                .filter(|n| !n.is_empty());

            let Some(name) = name else {
                positional.push(token.clone());
                continue;
            };

            let Some(spec) = self.specs.iter().find(|s| s.name == name) else {
                return Err(OptionsError::Unrecognized(name.to_string()));
            };

            if spec.arg_name.is_some() {
                match iter.next() {
                    Some(value) => {
                        values.insert(name.to_string(), Some(value.clone()));
                    }
                    None => return Err(OptionsError::MissingArgument(name.to_string())),
                }
            } else {
                values.insert(name.to_string(), None);
            }
        }

        Ok(CommandLine { values, positional })
    }
}

/// The parsed, read-only command-line state for one invocation.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CommandLine {
    values: HashMap<String, Option<String>>,
    positional: Vec<String>,
}

impl CommandLine {
    /// True when the named option or flag appeared on the command line.
    pub fn has(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// The value given for the named option, when one was supplied.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(|v| v.as_deref())
    }

    /// Residual arguments that were not options.
    pub fn positional(&self) -> &[String] {
        &self.positional
    }

    /// Every option name seen, paired with its value if it had one. Used to
    /// seed the symbol table.
    pub fn entries(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.values
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_deref()))
    }
}
