// src/cli/context.rs

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::cli::CliError;
use crate::cli::options::CommandLine;
use crate::core::properties::{Environment, PropertyStore};
use crate::core::symbols::SymbolTable;
use crate::core::template;

const OPT_FMT: &str = "fmt";
const FMT_TXT: &str = "txt";

/// Where user data (as opposed to log chatter) is written.
#[derive(Debug)]
enum OutputSink {
    Stdout,
    File(BufWriter<File>),
}

/// The shared environment handed to every action.
///
/// Carries the parsed command line, the symbol table, the layered property
/// store, the active environment and the output destination. Actions receive
/// the context explicitly; there is no process-wide state behind it.
#[derive(Debug)]
pub struct Context {
    pub cmd: CommandLine,
    pub symbols: SymbolTable,
    pub properties: PropertyStore,
    pub env: Environment,
    quiet: bool,
    verbose: bool,
    debug: bool,
    display_format: Option<String>,
    sink: OutputSink,
}

impl Context {
    pub fn new(cmd: CommandLine, symbols: SymbolTable, properties: PropertyStore) -> Self {
        Self {
            cmd,
            symbols,
            properties,
            env: Environment::default(),
            quiet: false,
            verbose: false,
            debug: false,
            display_format: None,
            sink: OutputSink::Stdout,
        }
    }

    pub fn set_flags(&mut self, quiet: bool, verbose: bool, debug: bool) {
        self.quiet = quiet;
        self.verbose = verbose;
        self.debug = debug;
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    /// An informational message for the console. Suppressed in quiet mode.
    pub fn info(&self, msg: &str) {
        if !self.quiet {
            println!("{}", msg);
        }
    }

    /// An error message for the console. Suppressed in quiet mode.
    pub fn error(&self, msg: &str) {
        if !self.quiet {
            eprintln!("{}", msg);
        }
    }

    /// A debugging message describing what is happening.
    pub fn debug(&self, msg: &str) {
        if !self.quiet && self.debug {
            println!("{}", msg);
        }
    }

    /// A detailed message shown in verbose mode.
    pub fn trace(&self, msg: &str) {
        if !self.quiet && self.verbose {
            println!("{}", msg);
        }
    }

    /// A named value from the command line, when one was given.
    pub fn command_value(&self, name: &str) -> Option<&str> {
        self.cmd.value(name)
    }

    /// The output format from the command line, defaulting to `txt`.
    pub fn display_format(&mut self) -> String {
        if self.display_format.is_none() {
            let fmt = self
                .cmd
                .value(OPT_FMT)
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .unwrap_or(FMT_TXT);
            self.display_format = Some(fmt.to_string());
        }
        self.display_format.clone().unwrap_or_default()
    }

    /// The property appropriate for the active environment.
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.property(self.env, key)
    }

    /// The decrypted value of an environment-qualified encrypted property.
    pub fn encrypted_property(&self, key: &str) -> Option<String> {
        self.properties.encrypted_property(self.env, key)
    }

    /// Send data to the chosen output destination, flushing with each call.
    /// Line feeds must be embedded in the data when they are desired.
    pub fn output(&mut self, data: &str) {
        let result = match &mut self.sink {
            OutputSink::Stdout => {
                let mut stdout = std::io::stdout();
                stdout.write_all(data.as_bytes()).and_then(|()| stdout.flush())
            }
            OutputSink::File(writer) => {
                writer.write_all(data.as_bytes()).and_then(|()| writer.flush())
            }
        };
        if let Err(e) = result {
            log::error!("Could not write to the output destination: {}", e);
        }
    }

    /// Same as `output` but with a trailing line terminator.
    pub fn output_line(&mut self, data: &str) {
        self.output(&format!("{}\n", data));
    }

    /// Redirect output to a file.
    ///
    /// The filename is template-expanded against the current symbol table
    /// before use, so names like `[#$Action#]_[#$nowDate#].txt` work. Parent
    /// directories are created as needed. A blank name leaves output on
    /// stdout.
    pub fn set_output(&mut self, filename: &str) -> Result<(), CliError> {
        self.debug(&format!("Setting output to {}", filename));
        if filename.trim().is_empty() {
            return Ok(());
        }

        let fname = template::expand(filename, &self.symbols);
        let path = Path::new(&fname);

        if path.exists() {
            if path.is_dir() {
                return Err(CliError::OutputTarget(format!(
                    "File '{}' exists but is a directory",
                    fname
                )));
            }
            let writable = fs::metadata(path)
                .map(|m| !m.permissions().readonly())
                .unwrap_or(false);
            if !writable {
                return Err(CliError::OutputTarget(format!(
                    "File '{}' exists but cannot be written",
                    fname
                )));
            }
            self.debug(&format!("Over-writing existing file '{}'", fname));
        } else if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|_| {
                    CliError::OutputTarget(format!("File '{}' could not be created", fname))
                })?;
            }
        }

        let file = File::create(path).map_err(|e| {
            CliError::OutputTarget(format!(
                "Could not send output to file '{}' reason: {}",
                fname, e
            ))
        })?;
        self.sink = OutputSink::File(BufWriter::new(file));
        Ok(())
    }

    /// True when output has been redirected away from stdout.
    pub fn output_redirected(&self) -> bool {
        matches!(self.sink, OutputSink::File(_))
    }

    /// Flush and release a redirected output sink. Called by the driver on
    /// every exit path; harmless when output is still on stdout.
    pub fn close_output(&mut self) {
        if let OutputSink::File(writer) = &mut self.sink {
            if let Err(e) = writer.flush() {
                log::error!("Could not flush the output file: {}", e);
            }
            log::debug!("Closing output stream.");
            self.sink = OutputSink::Stdout;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::options::OptionSet;
    use tempfile::tempdir;

    fn context_with(args: &[&str]) -> Context {
        let mut options = OptionSet::new();
        options.add_option("fmt", "CSV,TAB", "output format");
        options.add_option("o", "filename", "output file");
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        let cmd = options.parse(&args).unwrap();
        Context::new(cmd, SymbolTable::new(), PropertyStore::empty())
    }

    #[test]
    fn test_display_format_defaults_to_txt() {
        let mut ctx = context_with(&[]);
        assert_eq!(ctx.display_format(), "txt");
        let mut ctx = context_with(&["-fmt", "csv"]);
        assert_eq!(ctx.display_format(), "csv");
    }

    #[test]
    fn test_set_output_expands_template_and_writes() {
        let dir = tempdir().unwrap();
        let mut ctx = context_with(&[]);
        ctx.symbols.put("Action", "Get");
        let target = dir.path().join("[#$Action#].txt");
        ctx.set_output(&target.display().to_string()).unwrap();
        assert!(ctx.output_redirected());
        ctx.output_line("hello");
        ctx.close_output();

        let written = std::fs::read_to_string(dir.path().join("Get.txt")).unwrap();
        assert_eq!(written, "hello\n");
    }

    #[test]
    fn test_set_output_rejects_directory() {
        let dir = tempdir().unwrap();
        let mut ctx = context_with(&[]);
        let err = ctx
            .set_output(&dir.path().display().to_string())
            .unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("is a directory"));
    }

    #[test]
    fn test_set_output_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let mut ctx = context_with(&[]);
        let target = dir.path().join("deep/nested/out.txt");
        ctx.set_output(&target.display().to_string()).unwrap();
        ctx.output("data");
        ctx.close_output();
        assert_eq!(std::fs::read_to_string(target).unwrap(), "data");
    }

    #[test]
    fn test_blank_output_name_stays_on_stdout() {
        let mut ctx = context_with(&[]);
        ctx.set_output("  ").unwrap();
        assert!(!ctx.output_redirected());
    }

    #[test]
    fn test_environment_qualified_property_access() {
        let mut ctx = context_with(&[]);
        ctx.properties.set("UAT.saas.host", "uat.example.com");
        ctx.env = "uat".parse().unwrap();
        assert_eq!(ctx.property("saas.host"), Some("uat.example.com"));
        assert_eq!(ctx.property("saas.port"), None);
    }
}
