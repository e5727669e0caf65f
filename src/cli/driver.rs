// src/cli/driver.rs

//! The orchestrator: turns an argument vector into one action invocation.
//!
//! The first argument is the noun; everything after it is parsed against an
//! option surface assembled at runtime from the driver's own options plus
//! the contributions of every registered action. The selected action then
//! runs through its fixed lifecycle with `close` guaranteed on every path.

use std::io::Write;
use std::time::Instant;

use chrono::{Datelike, Local, Timelike};

use crate::cli::CliError;
use crate::cli::actions::{ActionRegistry, NOUN_HELP, NOUN_VERSION};
use crate::cli::context::Context;
use crate::cli::options::OptionSet;
use crate::constants::{
    APP_NAME, DEFAULT_OUTPUT_TEMPLATE, EMBEDDED_PROPERTIES, OPT_DEBUG, OPT_ENV, OPT_FORMAT,
    OPT_OUTPUT, OPT_QUIET, OPT_VERBOSE, VERSION,
};
use crate::core::fmt::format_elapsed;
use crate::core::metric::Metric;
use crate::core::properties::{Environment, PropertyStore};
use crate::core::symbols::SymbolTable;

/// Elapsed time after which the terminal bell is sounded on completion.
const BELL_THRESHOLD_MS: u64 = 30_000;

/// Run one invocation. The caller maps the error to a process exit code.
pub fn run(args: &[String]) -> Result<(), CliError> {
    let mut properties = PropertyStore::new();
    properties.load_secure(APP_NAME, Some(EMBEDDED_PROPERTIES));

    let mut registry = ActionRegistry::catalog();

    let mut options = OptionSet::new();
    options.add_flag(OPT_QUIET, "Run quietly, emitting nothing but the data.");
    options.add_flag(OPT_VERBOSE, "Show detailed console messages.");
    options.add_flag(OPT_DEBUG, "Show debugging console messages.");
    options.add_option(OPT_ENV, "environment", "The environment in which to run (DEV, TEST, UAT or PROD).");
    options.add_option(OPT_FORMAT, "CSV,TAB", "The format in which data is to be displayed.");
    options.add_option(OPT_OUTPUT, "filename", "Write output to the named file; 'default' generates a name.");
    for (_, action) in registry.visit() {
        action.declare_options(&mut options);
    }

    let Some(noun) = args.first().cloned() else {
        return Err(CliError::Usage(format!(
            "No noun specified\n\n{}",
            usage(&options, &registry)
        )));
    };

    let cmd = options.parse(&args[1..]).map_err(|e| {
        CliError::Usage(format!("{}\n\n{}", e, usage(&options, &registry)))
    })?;

    // Symbols available to templates: every option value under its option
    // name, the environment, the moment the run started and the noun.
    let symbols = SymbolTable::new();
    for (name, value) in cmd.entries() {
        symbols.put(name, value.unwrap_or_default());
    }
    let now = Local::now();
    let env_name = cmd
        .value(OPT_ENV)
        .map(str::to_uppercase)
        .unwrap_or_else(|| Environment::default().to_string());
    symbols.put("env", &env_name);
    symbols.put("nowDate", &now.format("%Y/%m/%d").to_string());
    symbols.put("nowTime", &now.format("%H:%M:%S").to_string());
    symbols.put("nowDateTime", &now.format("%Y/%m/%d %H:%M:%S").to_string());
    symbols.put("nowYear", &now.year().to_string());
    symbols.put("nowMonth", &now.month().to_string());
    symbols.put("nowDay", &now.day().to_string());
    symbols.put("nowHour", &now.hour().to_string());
    symbols.put("nowMinute", &now.minute().to_string());
    symbols.put("nowSecond", &now.second().to_string());
    symbols.put("nowMillisecond", &now.timestamp_subsec_millis().to_string());
    symbols.put("Action", &noun);

    let quiet = cmd.has(OPT_QUIET);
    let verbose = cmd.has(OPT_VERBOSE);
    let debug = cmd.has(OPT_DEBUG);

    let mut ctx = Context::new(cmd, symbols, properties);
    ctx.set_flags(quiet, verbose, debug);

    if ctx.cmd.has(OPT_OUTPUT) {
        let name = ctx
            .command_value(OPT_OUTPUT)
            .unwrap_or_default()
            .to_string();
        let name = if name.eq_ignore_ascii_case("default") {
            DEFAULT_OUTPUT_TEMPLATE.to_string()
        } else {
            name
        };
        ctx.set_output(&name)?;
    }

    let outcome = dispatch(&mut ctx, &mut registry, &options, &noun);
    ctx.close_output();
    outcome
}

/// Validate the environment, resolve the noun and run the action lifecycle.
/// Reserved nouns are handled here and never reach the registry. The caller
/// owns the output sink and closes it whatever happens in here.
fn dispatch(
    ctx: &mut Context,
    registry: &mut ActionRegistry,
    options: &OptionSet,
    noun: &str,
) -> Result<(), CliError> {
    if let Some(value) = ctx.command_value(OPT_ENV) {
        let value = value.to_string();
        ctx.env = value.parse().map_err(CliError::Usage)?;
    }

    let lower = noun.to_lowercase();

    if lower == NOUN_VERSION {
        ctx.output_line(&format!("{} version {}", APP_NAME, VERSION));
        return Ok(());
    }
    if lower == NOUN_HELP {
        ctx.output(&usage(options, registry));
        return Ok(());
    }

    let Some(action) = registry.find(&lower) else {
        return Err(CliError::Usage(format!("Unsupported noun '{}'", noun)));
    };

    let metric = Metric::new(&lower);
    let started = Instant::now();

    let result = action
        .validate(ctx)
        .and_then(|()| action.execute(ctx));
    action.close(ctx);

    let elapsed = started.elapsed().as_millis() as u64;
    metric.sample(elapsed as i64);
    log::debug!("{}", metric);
    ctx.debug(&format!("Completed in {}", describe_elapsed(elapsed)));

    if should_ring_bell(result.is_ok(), elapsed, ctx.is_quiet()) {
        print!("\x07");
        let _ = std::io::stdout().flush();
    }

    result.map_err(CliError::from)
}

/// The bell marks long, successful work only: never for failed runs and
/// never in quiet mode.
fn should_ring_bell(success: bool, elapsed_ms: u64, quiet: bool) -> bool {
    success && elapsed_ms > BELL_THRESHOLD_MS && !quiet
}

fn describe_elapsed(millis: u64) -> String {
    let text = format_elapsed(millis);
    if text.is_empty() {
        format!("{} ms", millis)
    } else {
        text
    }
}

/// The aggregated usage text: nouns with their help lines, then the full
/// option table.
fn usage(options: &OptionSet, registry: &ActionRegistry) -> String {
    let mut b = String::new();
    b.push_str(&format!("Usage: {} <noun> [options]\n\nNouns:\n", APP_NAME));
    for (noun, action) in registry.visit() {
        b.push_str(&format!(" {:<10} {}\n", noun, action.help()));
    }
    b.push_str(&format!(" {:<10} Show this message.\n", NOUN_HELP));
    b.push_str(&format!(" {:<10} Show the application version.\n", NOUN_VERSION));
    b.push_str("\nOptions:\n");
    b.push_str(&options.usage());
    b
}
