use crate::{
    batch::Batch,
    config::Config,
    credentials::Credentials,
    device::DeviceProfile,
    flow::DeviceFlowRunner,
    session::WebDriverProvider,
    util::ensure_dir,
};
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[derive(Parser, Debug)]
#[command(name = "install-sweep")]
#[command(about = "Search for an app and trigger its install on a list of cloud devices")]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,

    /// Path to config TOML. If omitted, uses ./install-sweep.toml if present.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace/debug/info/warn/error).
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the flow on every configured device, one at a time.
    Run {
        /// Run only these devices instead of the configured list. Repeatable.
        #[arg(long = "device")]
        devices: Vec<String>,
    },
    /// Run the flow on a single device.
    Device { name: String },
    /// Print the resolved device list with profiles.
    Devices {},
    /// Print the capability descriptor for a device, access key redacted.
    Capabilities { name: String },
    /// Print the effective config (file merged over defaults) as TOML.
    Config {},
}

/// Returns whether the process should exit successfully.
pub fn dispatch(args: Args) -> Result<bool> {
    let cfg_path = resolve_config_path(args.config.as_deref());
    let loaded = Config::load(cfg_path.as_deref());
    let cfg = loaded.config;

    let log_path = resolve_log_path(&cfg);
    let _guard = init_logging(&args, &cfg, log_path.as_deref())?;
    for w in &loaded.warnings {
        warn!("{w}");
    }
    match &cfg_path {
        Some(p) => info!("config {}", p.display()),
        None => info!("no config file; using built-in defaults"),
    }

    match &args.cmd {
        Command::Run { devices } => {
            let devices = if devices.is_empty() {
                cfg.devices.clone()
            } else {
                devices.clone()
            };
            run(&cfg, &devices)
        }
        Command::Device { name } => run(&cfg, std::slice::from_ref(name)),
        Command::Devices {} => {
            list_devices(&cfg)?;
            Ok(true)
        }
        Command::Capabilities { name } => {
            capabilities(&cfg, name)?;
            Ok(true)
        }
        Command::Config {} => {
            print!("{}", cfg.to_toml().context("serializing effective config")?);
            Ok(true)
        }
    }
}

fn resolve_config_path(user: Option<&Path>) -> Option<PathBuf> {
    if let Some(p) = user {
        return Some(p.to_path_buf());
    }
    let default = PathBuf::from("install-sweep.toml");
    default.exists().then_some(default)
}

fn init_logging(args: &Args, cfg: &Config, file_path: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = args
        .log_level
        .as_deref()
        .unwrap_or(cfg.logging.level.as_str());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let stdout_layer = if cfg.logging.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .boxed()
    };

    let (file_layer, guard) = if let Some(path) = file_path {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        ensure_dir(parent)?;
        let file = std::fs::File::create(path)
            .with_context(|| format!("create log file: {}", path.display()))?;
        let (non_blocking, guard) = tracing_appender::non_blocking(file);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true)
            .boxed();
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("failed to init logging: {e}"))?;

    Ok(guard)
}

fn resolve_log_path(cfg: &Config) -> Option<PathBuf> {
    if !cfg.logging.write_to_file || cfg.logging.file_path.is_empty() {
        return None;
    }
    Some(PathBuf::from(&cfg.logging.file_path))
}

fn runner(cfg: &Config) -> Result<DeviceFlowRunner<'_, WebDriverProvider>> {
    let provider = WebDriverProvider::new(cfg)?;
    let credentials = Credentials::from_env(cfg);
    if let Err(err) = &credentials {
        warn!("{err}; every device will fail");
    }
    Ok(DeviceFlowRunner::new(cfg, provider, credentials))
}

fn run(cfg: &Config, devices: &[String]) -> Result<bool> {
    info!(
        "searching for {:?} ({} device{})",
        cfg.target.app_name,
        devices.len(),
        if devices.len() == 1 { "" } else { "s" }
    );

    let report = Batch::new(cfg, runner(cfg)?).run_all(devices);

    println!("{}", report.render());
    Ok(report.any_passed())
}

fn list_devices(cfg: &Config) -> Result<()> {
    let profiles: Vec<DeviceProfile> = cfg
        .devices
        .iter()
        .map(|d| DeviceProfile::resolve(d, &cfg.session.platform_version_default))
        .collect();
    println!("{}", serde_json::to_string_pretty(&profiles)?);
    Ok(())
}

fn capabilities(cfg: &Config, name: &str) -> Result<()> {
    let provider = WebDriverProvider::new(cfg)?;
    let runner = DeviceFlowRunner::new(cfg, provider, Credentials::from_env(cfg));
    let caps = runner
        .capabilities(name)
        .with_context(|| format!("building capabilities for {name}"))?;
    println!("{}", serde_json::to_string_pretty(&caps.redacted())?);
    Ok(())
}
