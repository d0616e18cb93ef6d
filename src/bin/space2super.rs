// Space2Super CLI
// Tap the target key for the substitute, hold it for Super

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use space2super_core::config::{default_config_content, Config, KeySpec};
use space2super_core::daemon::DEFAULT_POLL_TIMEOUT_MS;
use space2super_core::event::EventLoop;
use space2super_core::output::VirtualDevice;
use space2super_core::{Daemon, Engine, KeyNames, MonotonicClock, RoleTable};

/// Tap/hold disambiguation for a single key
#[derive(Parser, Debug)]
#[command(name = "space2super")]
#[command(version)]
#[command(about = "Tap space for space, hold it for Super", long_about = None)]
struct Args {
    /// TOML configuration file (default: ~/.config/space2super/config.toml)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Key to disambiguate, by name or evdev code
    #[arg(short, long, value_name = "KEY")]
    target: Option<KeySpec>,

    /// Key emitted on a tap, by name or evdev code
    #[arg(short, long, value_name = "KEY")]
    substitute: Option<KeySpec>,

    /// Longest hold still counted as a tap, in milliseconds
    #[arg(long, value_name = "MS")]
    timeout: Option<u64>,

    /// Watch only these devices (can be used multiple times)
    #[arg(short, long, value_name = "DEVICE")]
    devices: Vec<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Validate config, print the role table and exit
    #[arg(long)]
    check_config: bool,

    /// List available keyboard and pointer devices
    #[arg(long)]
    list_devices: bool,

    /// Print a starter config file and exit
    #[arg(long)]
    print_config: bool,
}

/// Main application state
struct Application {
    config: Config,
    /// Flag to signal event loop to stop
    running: Arc<AtomicBool>,
}

impl Application {
    /// Load config and apply command-line overrides
    fn new(args: &Args) -> anyhow::Result<Self> {
        let mut config = match &args.config {
            Some(path) => Config::from_toml_path(path)
                .with_context(|| format!("Failed to load {}", path.display()))?,
            None => Config::load_default()?,
        };
        apply_overrides(&mut config, args);
        config.validate()?;

        Ok(Self {
            config,
            running: Arc::new(AtomicBool::new(true)),
        })
    }

    fn role_table(&self) -> anyhow::Result<RoleTable> {
        Ok(self.config.role_table(&KeyNames)?)
    }

    /// Validate configuration
    fn check(&self) -> anyhow::Result<()> {
        let table = self.role_table()?;
        let substitute = self.config.substitute_key(&KeyNames)?;
        println!("Configuration is valid");
        println!("  target:     {}", table.target());
        println!("  substitute: {}", substitute);
        println!("  timeout:    {} ms", self.config.timeout_ms);
        println!("  companions: {}", join_keys(&table.companions()));
        println!("  modifiers:  {}", join_keys(&table.modifiers()));
        Ok(())
    }

    /// List available input devices
    fn list_devices() -> anyhow::Result<()> {
        let devices = EventLoop::list_devices()?;
        println!("Available input devices:");
        for device in devices {
            println!(
                "  [{}] {} ({}) {}",
                device.index,
                device.name,
                device.kind,
                device.path.as_deref().unwrap_or("-")
            );
        }
        Ok(())
    }

    fn spawn_signal_handler(&self) -> anyhow::Result<()> {
        use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM};
        use signal_hook::iterator::Signals;

        let mut signals = Signals::new([SIGINT, SIGTERM, SIGHUP])
            .context("Failed to install signal handlers")?;
        let running = self.running.clone();

        std::thread::spawn(move || {
            for signal in &mut signals {
                match signal {
                    SIGINT | SIGTERM => {
                        log::info!("Received signal {}, shutting down", signal);
                        running.store(false, Ordering::SeqCst);
                        break;
                    }
                    // Survive the controlling terminal going away
                    _ => log::debug!("Ignoring signal {}", signal),
                }
            }
        });
        Ok(())
    }

    fn run(&self) -> anyhow::Result<()> {
        let table = self.role_table()?;
        let substitute = self.config.substitute_key(&KeyNames)?;
        log::info!(
            "Target {}, substitute {}, timeout {} ms",
            table.target(),
            substitute,
            self.config.timeout_ms
        );

        self.spawn_signal_handler()?;

        let mut event_loop = EventLoop::new_filtered(&self.config.device_filter)?;
        log::info!("Watching {} device(s)", event_loop.device_count());

        let mut output_device = VirtualDevice::new(&self.config.device_name, substitute)?;

        let engine = Engine::new(substitute, self.config.timeout());
        let mut daemon = Daemon::new(table, engine, MonotonicClock);

        log::info!("space2super is running. Press Ctrl+C to exit.");
        daemon.run_until(
            &mut event_loop,
            &mut output_device,
            &self.running,
            DEFAULT_POLL_TIMEOUT_MS,
        )?;
        Ok(())
    }
}

/// CLI values win over the config file
fn apply_overrides(config: &mut Config, args: &Args) {
    if let Some(target) = &args.target {
        config.target = target.clone();
    }
    if let Some(substitute) = &args.substitute {
        config.substitute = substitute.clone();
    }
    if let Some(timeout) = args.timeout {
        config.timeout_ms = timeout;
    }
    if !args.devices.is_empty() {
        config.device_filter = args.devices.clone();
    }
}

fn join_keys(keys: &[space2super_core::Key]) -> String {
    keys.iter()
        .map(|k| k.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    if args.print_config {
        print!("{}", default_config_content());
        return Ok(());
    }

    // Handle list-devices flag (doesn't require config)
    if args.list_devices {
        return Application::list_devices();
    }

    let app = Application::new(&args)?;

    if args.check_config {
        return app.check();
    }

    app.run()
}
