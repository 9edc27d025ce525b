use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_DEVICES: &[&str] = &[
    "Samsung Galaxy S23",
    "Google Pixel 7",
    "Samsung Galaxy S22",
    "Google Pixel 6",
    "OnePlus 9",
];

/// Effective configuration. Loaded section by section (see `from_toml_str`),
/// serialized whole by `to_toml`.
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    pub devices: Vec<String>,
    pub target: Target,
    pub timing: Timing,
    pub session: Session,
    pub credentials: Credentials,
    pub logging: Logging,
}

/// Configuration plus the warnings produced while falling back to defaults.
/// Warnings are kept until logging is up.
#[derive(Debug, Clone)]
pub struct Loaded {
    pub config: Config,
    pub warnings: Vec<String>,
}

impl Config {
    /// Reads `path` if it exists. Anything unreadable or malformed is replaced
    /// by defaults, section by section; this never fails.
    pub fn load(path: Option<&Path>) -> Loaded {
        let Some(path) = path else {
            return Loaded {
                config: Config::default(),
                warnings: Vec::new(),
            };
        };
        match std::fs::read_to_string(path) {
            Ok(raw) => {
                let mut loaded = Config::from_toml_str(&raw);
                for w in &mut loaded.warnings {
                    *w = format!("{}: {w}", path.display());
                }
                loaded
            }
            Err(err) => Loaded {
                config: Config::default(),
                warnings: vec![format!(
                    "reading config {}: {err}; using built-in defaults",
                    path.display()
                )],
            },
        }
    }

    pub fn from_toml_str(raw: &str) -> Loaded {
        let mut warnings = Vec::new();
        let table: toml::Table = match toml::from_str(raw) {
            Ok(t) => t,
            Err(err) => {
                warnings.push(format!("parsing TOML: {err}; using built-in defaults"));
                return Loaded {
                    config: Config::default(),
                    warnings,
                };
            }
        };

        let config = Config {
            devices: parse_devices(table.get("devices"), &mut warnings),
            target: section(&table, "target", &mut warnings),
            timing: section(&table, "timing", &mut warnings),
            session: section(&table, "session", &mut warnings),
            credentials: section(&table, "credentials", &mut warnings),
            logging: section(&table, "logging", &mut warnings),
        };
        Loaded { config, warnings }
    }

    /// The effective config as TOML, in a form `from_toml_str` reads back.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// The query typed into the search box; falls back to the app name.
    pub fn search_query(&self) -> &str {
        let q = self.target.search_query.trim();
        if q.is_empty() {
            self.target.app_name.as_str()
        } else {
            q
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            devices: default_device_names(),
            target: Default::default(),
            timing: Default::default(),
            session: Default::default(),
            credentials: Default::default(),
            logging: Default::default(),
        }
    }
}

fn default_device_names() -> Vec<String> {
    DEFAULT_DEVICES.iter().map(|d| d.to_string()).collect()
}

fn section<T: DeserializeOwned + Default>(
    table: &toml::Table,
    key: &str,
    warnings: &mut Vec<String>,
) -> T {
    let Some(value) = table.get(key) else {
        return T::default();
    };
    match value.clone().try_into() {
        Ok(v) => v,
        Err(err) => {
            warnings.push(format!("invalid [{key}] section: {err}; using defaults"));
            T::default()
        }
    }
}

/// Accepted shapes for `devices`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DeviceList {
    Flat(Vec<String>),
    Grouped(Vec<DeviceGroup>),
}

#[derive(Debug, Deserialize)]
struct DeviceGroup {
    #[serde(default)]
    category: String,
    names: Vec<String>,
}

fn parse_devices(value: Option<&toml::Value>, warnings: &mut Vec<String>) -> Vec<String> {
    let Some(value) = value else {
        return default_device_names();
    };

    let names = match value.clone().try_into::<DeviceList>() {
        Ok(DeviceList::Flat(names)) => names,
        Ok(DeviceList::Grouped(groups)) => groups
            .into_iter()
            .inspect(|g| {
                if g.names.is_empty() {
                    warnings.push(format!("device category {:?} is empty", g.category));
                }
            })
            .flat_map(|g| g.names)
            .collect(),
        Err(_) => {
            warnings.push(format!(
                "devices must be an array of names or of {{ category, names }} tables, got {}; using default device list",
                value.type_str()
            ));
            return default_device_names();
        }
    };

    let names: Vec<String> = names
        .into_iter()
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .collect();

    if names.is_empty() {
        warnings.push("device list is empty; using default device list".to_string());
        return default_device_names();
    }
    names
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Target {
    pub app_name: String,
    /// Empty means "search for `app_name`".
    pub search_query: String,
    pub project_name: String,
}
impl Default for Target {
    fn default() -> Self {
        Self {
            app_name: "Spotify".into(),
            search_query: "".into(),
            project_name: "install-sweep".into(),
        }
    }
}

/// Fixed pauses, in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Timing {
    pub warmup_seconds: u64,
    pub results_seconds: u64,
    pub detail_seconds: u64,
    pub install_observe_seconds: u64,
    pub between_devices_seconds: u64,
}
impl Default for Timing {
    fn default() -> Self {
        Self {
            warmup_seconds: 8,
            results_seconds: 4,
            detail_seconds: 4,
            install_observe_seconds: 10,
            between_devices_seconds: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Session {
    pub hub_url: String,
    pub platform_version_default: String,
    pub command_timeout_seconds: u64,
    pub idle_timeout_seconds: u64,
}
impl Default for Session {
    fn default() -> Self {
        Self {
            hub_url: "https://hub-cloud.browserstack.com/wd/hub".into(),
            platform_version_default: "12.0".into(),
            command_timeout_seconds: 120,
            idle_timeout_seconds: 300,
        }
    }
}

/// Names of the environment variables holding provider credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub username_env: String,
    pub access_key_env: String,
}
impl Default for Credentials {
    fn default() -> Self {
        Self {
            username_env: "BROWSERSTACK_USERNAME".into(),
            access_key_env: "BROWSERSTACK_ACCESS_KEY".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Logging {
    pub level: String,
    pub json: bool,
    pub write_to_file: bool,
    pub file_path: String,
}
impl Default for Logging {
    fn default() -> Self {
        Self {
            level: "info".into(),
            json: false,
            write_to_file: false,
            file_path: "logs/install-sweep.log".into(),
        }
    }
}
