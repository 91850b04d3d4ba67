use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{bail, Context};
use clap::Parser;
use tracing::{error, info};

use luapad_core::{demos, LuapadConfig};
use luapad_tui::{event_handler::EventHandler, logging, ui::try_init_tui, App, ScriptSource};

#[derive(Parser)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Lua script to run
    script: Option<PathBuf>,

    /// Run a bundled demo instead of a script file
    #[arg(long, conflicts_with = "script")]
    demo: Option<String>,

    /// List the bundled demos and exit
    #[arg(long)]
    list_demos: bool,

    /// Config file to use instead of the platform default
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the effective config to the config path and exit
    #[arg(long)]
    write_config: bool,

    /// Enables debug mode
    #[arg(short, long, action = clap::ArgAction::Count)]
    debug: u8,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.list_demos {
        for name in demos::names() {
            println!("{name}");
        }
        return Ok(());
    }

    let config = match &cli.config {
        Some(path) if cli.write_config && !path.exists() => LuapadConfig::default(),
        Some(path) => LuapadConfig::load_from(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => LuapadConfig::load_or_default().context("failed to load config")?,
    };

    if cli.write_config {
        let path = match cli.config {
            Some(path) => path,
            None => LuapadConfig::config_path().context("no config directory")?,
        };
        config
            .save_to(&path)
            .with_context(|| format!("failed to write config {}", path.display()))?;
        println!("Wrote {}", path.display());
        return Ok(());
    }

    let _log_guard =
        logging::init_logging(config.logging.file, cli.debug).context("failed to set up logging")?;

    let source = match (cli.script, cli.demo) {
        (Some(path), _) => {
            if !path.is_file() {
                bail!("script not found: {}", path.display());
            }
            ScriptSource::File(path)
        }
        (None, Some(name)) => match demos::get(&name) {
            Some(demo) => ScriptSource::Demo(demo.name),
            None => bail!(
                "unknown demo '{}'. Available: {}",
                name,
                demos::names().collect::<Vec<_>>().join(", ")
            ),
        },
        (None, None) => ScriptSource::Demo(demos::all()[0].name),
    };

    let mut tui = try_init_tui().context("failed to initialise terminal")?;
    let mut app = App::new(&config, source);

    let (event_handler, mut tui_event_rx) = EventHandler::new();
    event_handler.start();

    let tick_interval = config.runtime.tick_interval();
    let mut ticker = tokio::time::interval(tick_interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    info!("Starting {:?} at {} Hz", app.source, config.runtime.frame_rate);
    app.run_source(Instant::now());

    loop {
        if let Err(e) = tui.draw(&mut app) {
            error!("Failed to draw: {}", e);
            break;
        }

        // Host timer backing sleep(); parked far away while nothing sleeps
        let deadline = app.next_deadline();
        let wake = tokio::time::Instant::from_std(
            deadline.unwrap_or_else(|| Instant::now() + Duration::from_secs(3600)),
        );

        tokio::select! {
            _ = ticker.tick() => {
                app.tick(Instant::now());
            }
            _ = tokio::time::sleep_until(wake), if deadline.is_some() => {
                app.fire_timers(Instant::now());
            }
            event = tui_event_rx.recv() => match event {
                Some(event) => app.handle_event(event, Instant::now()),
                None => {
                    error!("Terminal event channel closed");
                    break;
                }
            },
        }

        if app.should_quit {
            break;
        }
    }

    info!("luapad shut down cleanly");

    // Explicitly restore terminal before exiting
    drop(tui);

    Ok(())
}
