// src/bin/cliq.rs

use std::env;

use cliq::cli::driver;
use colored::*;

/// The entry point: set up logging, hand the argument vector to the driver
/// and perform centralized error handling.
fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();

    if let Err(e) = driver::run(&args) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(e.exit_code());
    }
}
