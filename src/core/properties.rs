// src/core/properties.rs

//! Layered process configuration.
//!
//! Properties are composed from four ordered sources, each later source
//! overriding earlier keys of the same name: a resource embedded in the
//! binary, `<name>.properties` in the user's home directory, the same file in
//! the directory named by the `cfg.dir` property, and finally the current
//! working directory. Missing files at any layer are skipped.

use std::collections::HashMap;
use std::fmt;
use std::path::{MAIN_SEPARATOR, Path};
use std::str::FromStr;

use crate::core::cipher;

/// Property naming the user name for the proxy server.
pub const PROXY_USER: &str = "http.proxyUser";
/// Property naming the user password for the proxy server.
pub const PROXY_PASSWORD: &str = "http.proxyPassword";
/// Property naming the proxy server host.
pub const PROXY_HOST: &str = "http.proxyHost";
/// Property naming the port on which the proxy server listens.
pub const PROXY_PORT: &str = "http.proxyPort";
/// Property naming the NTLM domain for proxy authentication.
pub const PROXY_DOMAIN: &str = "http.proxyDomain";
/// Property naming the configuration override directory.
pub const CONFIG_DIR: &str = "cfg.dir";

/// The deployment environment that qualifies property lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Dev,
    Test,
    Uat,
    Prod,
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "DEV" => Ok(Self::Dev),
            "TEST" => Ok(Self::Test),
            "UAT" => Ok(Self::Uat),
            "PROD" => Ok(Self::Prod),
            _ => Err(format!("Unsupported environment '{}'", s)),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Dev => "DEV",
            Self::Test => "TEST",
            Self::Uat => "UAT",
            Self::Prod => "PROD",
        };
        write!(f, "{}", name)
    }
}

/// Credentials and location of an HTTP proxy, captured from the property
/// store after layering. Immutable once built, so it may be read from any
/// thread the HTTP collaborator uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    pub host: String,
    pub port: Option<u16>,
    pub user: String,
    pub password: String,
    /// When set, the NTLM variant of proxy authentication is requested.
    pub domain: Option<String>,
}

/// The process-wide property mapping.
#[derive(Debug, Default)]
pub struct PropertyStore {
    entries: HashMap<String, String>,
}

impl PropertyStore {
    /// Create a store seeded from the process environment: every environment
    /// variable, plus the conventional `user.home` and `user.dir` keys.
    pub fn new() -> Self {
        let mut entries: HashMap<String, String> = std::env::vars().collect();

        if let Some(home) = dirs::home_dir() {
            entries.insert("user.home".to_string(), home.display().to_string());
        }
        if let Ok(cwd) = std::env::current_dir() {
            entries.insert("user.dir".to_string(), cwd.display().to_string());
        }

        Self { entries }
    }

    /// A store with no seeding at all. Used by tests that need full control
    /// over layering.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load `<name>.properties` from the four conventional locations, in
    /// order, with later layers overriding earlier ones. `embedded` is the
    /// resource bundled with the binary and forms the first layer.
    pub fn load(&mut self, name: &str, embedded: Option<&str>) {
        if let Some(text) = embedded {
            let count = self.merge_text(text);
            log::debug!(
                "Loaded {} properties from the embedded '{}.properties' resource",
                count,
                name
            );
        }

        let home = self.get("user.home").map(str::to_string);
        if let Some(home) = home {
            self.load_file(name, &home);
        }

        let config_path = self.config_path();
        if !config_path.is_empty() {
            self.load_file(name, &config_path);
        }

        let cwd = self.get("user.dir").map(str::to_string);
        if let Some(cwd) = cwd {
            self.load_file(name, &cwd);
        }
    }

    /// Secure variant of `load`: `http.proxyPassword` is treated as armored
    /// ciphertext and re-stored as plaintext after layering. A value that
    /// fails to decrypt is left untouched.
    pub fn load_secure(&mut self, name: &str, embedded: Option<&str>) {
        self.load(name, embedded);
        if let Some(ciphertext) = self.get(PROXY_PASSWORD).map(str::to_string) {
            match cipher::decrypt_token(&ciphertext) {
                Ok(plain) => self.set(PROXY_PASSWORD, &plain),
                Err(e) => log::debug!("Could not decrypt '{}': {}", PROXY_PASSWORD, e),
            }
        }
    }

    /// Load one property-file layer from a directory, skipping silently when
    /// the file cannot be read.
    fn load_file(&mut self, name: &str, directory: &str) {
        let path = Path::new(directory).join(format!("{}.properties", name));
        log::debug!("Trying to load properties from {}", path.display());
        match std::fs::read_to_string(&path) {
            Ok(text) => {
                let count = self.merge_text(&text);
                log::debug!("Loaded {} properties from '{}'", count, path.display());
            }
            Err(e) => {
                log::debug!("Failed to read from {} - Reason: {}", path.display(), e);
            }
        }
    }

    /// Parse line-oriented `key=value` text into the store, overwriting
    /// existing keys. Returns the number of properties read.
    fn merge_text(&mut self, text: &str) -> usize {
        let mut count = 0;
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                let key = key.trim();
                if !key.is_empty() {
                    self.entries.insert(key.to_string(), value.trim().to_string());
                    count += 1;
                }
            }
        }
        count
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }

    /// Look up `<env>.<key>`, the environment-qualified form every action
    /// uses for its configuration.
    pub fn property(&self, env: Environment, key: &str) -> Option<&str> {
        self.entries
            .get(&format!("{}.{}", env, key))
            .map(String::as_str)
    }

    /// Environment-qualified lookup of an armored, encrypted value. A
    /// missing value or a failed decryption yields `None`; failures are
    /// logged at debug level and the action decides whether that is fatal.
    pub fn encrypted_property(&self, env: Environment, key: &str) -> Option<String> {
        let raw = self.property(env, key)?;
        match cipher::decrypt_token(raw) {
            Ok(plain) => Some(plain),
            Err(e) => {
                log::debug!(
                    "Problems getting encrypted property '{}' = '{}' - {}",
                    key,
                    raw,
                    e
                );
                None
            }
        }
    }

    /// The configuration override directory from the `cfg.dir` property,
    /// trimmed of any trailing separator. Empty when unset.
    pub fn config_path(&self) -> String {
        let Some(raw) = self.get(CONFIG_DIR) else {
            log::debug!("No configuration override path found in '{}'", CONFIG_DIR);
            return String::new();
        };
        let mut retval = raw.trim().to_string();
        while retval.ends_with(MAIN_SEPARATOR) || retval.ends_with('/') {
            retval.pop();
        }
        retval
    }

    /// Capture proxy credentials when the user, password and host properties
    /// are all non-blank, for installation into the HTTP collaborator.
    pub fn proxy_config(&self) -> Option<ProxyConfig> {
        let user = self.get(PROXY_USER).unwrap_or_default();
        let password = self.get(PROXY_PASSWORD).unwrap_or_default();
        let host = self.get(PROXY_HOST).unwrap_or_default();

        if user.trim().is_empty() || password.trim().is_empty() || host.trim().is_empty() {
            return None;
        }

        log::debug!(
            "Detected http proxy settings ({}@{}), will configure the client",
            user,
            host
        );

        Some(ProxyConfig {
            host: host.to_string(),
            port: self.get(PROXY_PORT).and_then(|p| p.trim().parse().ok()),
            user: user.to_string(),
            password: password.to_string(),
            domain: self
                .get(PROXY_DOMAIN)
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_layering_last_wins() {
        let home = tempdir().unwrap();
        let override_dir = tempdir().unwrap();
        let cwd = tempdir().unwrap();

        fs::write(
            home.path().join("app.properties"),
            "a=home\nb=home\nc=home\n",
        )
        .unwrap();
        fs::write(
            override_dir.path().join("app.properties"),
            "b=override\nc=override\n",
        )
        .unwrap();
        fs::write(cwd.path().join("app.properties"), "c=cwd\n").unwrap();

        let mut store = PropertyStore::empty();
        store.set("user.home", &home.path().display().to_string());
        store.set(CONFIG_DIR, &override_dir.path().display().to_string());
        store.set("user.dir", &cwd.path().display().to_string());

        store.load("app", Some("a=embedded\nz=embedded\n"));

        assert_eq!(store.get("z"), Some("embedded"));
        assert_eq!(store.get("a"), Some("home"));
        assert_eq!(store.get("b"), Some("override"));
        assert_eq!(store.get("c"), Some("cwd"));
        assert_eq!(store.get("missing"), None);
    }

    #[test]
    fn test_missing_layers_are_not_fatal() {
        let mut store = PropertyStore::empty();
        store.set("user.home", "/no/such/directory/anywhere");
        store.load("app", None);
        assert_eq!(store.get("anything"), None);
    }

    #[test]
    fn test_comments_and_blank_lines_ignored() {
        let mut store = PropertyStore::empty();
        store.load(
            "app",
            Some("# comment\n! also comment\n\nkey = value \nbroken line\n"),
        );
        assert_eq!(store.get("key"), Some("value"));
        assert_eq!(store.get("broken line"), None);
    }

    #[test]
    fn test_config_path_trims_trailing_separator() {
        let mut store = PropertyStore::empty();
        assert_eq!(store.config_path(), "");
        store.set(CONFIG_DIR, "/etc/cliq/");
        assert_eq!(store.config_path(), "/etc/cliq");
    }

    #[test]
    fn test_environment_qualified_lookup() {
        let mut store = PropertyStore::empty();
        store.set("DEV.saas.host", "h1");
        store.set("PROD.saas.host", "h2");
        assert_eq!(store.property(Environment::Prod, "saas.host"), Some("h2"));
        assert_eq!(store.property(Environment::Dev, "saas.host"), Some("h1"));
        assert_eq!(store.property(Environment::Uat, "saas.host"), None);
    }

    #[test]
    fn test_encrypted_property_round_trip() {
        let armored = cipher::encrypt_token("hunter2").unwrap();
        let mut store = PropertyStore::empty();
        store.set("PROD.saas.pass", &armored);
        assert_eq!(
            store.encrypted_property(Environment::Prod, "saas.pass"),
            Some("hunter2".to_string())
        );
        // garbage ciphertext is treated as absent
        store.set("PROD.saas.pass", "!!not armor!!");
        assert_eq!(store.encrypted_property(Environment::Prod, "saas.pass"), None);
    }

    #[test]
    fn test_proxy_config_requires_all_three() {
        let mut store = PropertyStore::empty();
        store.set(PROXY_HOST, "proxy.example.com");
        store.set(PROXY_USER, "alice");
        assert!(store.proxy_config().is_none());

        store.set(PROXY_PASSWORD, "secret");
        store.set(PROXY_PORT, "8080");
        let proxy = store.proxy_config().unwrap();
        assert_eq!(proxy.host, "proxy.example.com");
        assert_eq!(proxy.port, Some(8080));
        assert_eq!(proxy.domain, None);
    }

    #[test]
    fn test_secure_load_decrypts_proxy_password() {
        let armored = cipher::encrypt_token("secret").unwrap();
        let mut store = PropertyStore::empty();
        store.load_secure(
            "app",
            Some(&format!("{}={}\n", PROXY_PASSWORD, armored)),
        );
        assert_eq!(store.get(PROXY_PASSWORD), Some("secret"));
    }

    #[test]
    fn test_environment_parsing() {
        assert_eq!("prod".parse::<Environment>().unwrap(), Environment::Prod);
        assert_eq!("Uat".parse::<Environment>().unwrap(), Environment::Uat);
        assert_eq!(Environment::default(), Environment::Dev);
        assert!("STAGE".parse::<Environment>().is_err());
        assert_eq!(Environment::Test.to_string(), "TEST");
    }
}
