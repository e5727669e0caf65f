// src/constants.rs

/// The application name; also names the `<name>.properties` layers.
pub const APP_NAME: &str = "cliq";

/// The version reported by the `version` noun.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The default properties bundled into the binary, forming the first
/// configuration layer.
pub const EMBEDDED_PROPERTIES: &str = include_str!("../resources/cliq.properties");

/// The output filename template used when `-o default` is given.
pub const DEFAULT_OUTPUT_TEMPLATE: &str = "[#$Action#]_[#$nowYear#]-[#$nowMonth#]-[#$nowDay#].txt";

/// Suppress console messages.
pub const OPT_QUIET: &str = "q";
/// Show detailed console messages.
pub const OPT_VERBOSE: &str = "v";
/// Show debugging console messages.
pub const OPT_DEBUG: &str = "d";
/// Select the deployment environment qualifying property lookups.
pub const OPT_ENV: &str = "env";
/// Select the display format for action output.
pub const OPT_FORMAT: &str = "fmt";
/// Redirect action output to a file.
pub const OPT_OUTPUT: &str = "o";
