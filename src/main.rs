//! # Smart Clock Application Entry Point
//!
//! This binary crate loads the configuration and the native `clock_util`
//! library, then runs the clock window on a tokio current-thread runtime until
//! Ctrl-C. It supports a one-frame development mode (`--stdout`) and a
//! one-shot time synchronization (`--set-time`).

use anyhow::{bail, Context};
use chrono::Local;
use log::{info, warn};
use smart_clock_lib::app::ClockApp;
use smart_clock_lib::config::Config;
use smart_clock_lib::ntp::set_time;
use smart_clock_lib::renderer::draw_ascii;
use smart_clock_lib::window::{Surface, TerminalSurface};
use smart_clock_lib::ClockUtil;
use std::env;
use std::path::PathBuf;
use tokio::time::MissedTickBehavior;

/// Command line options.
#[derive(Debug, Default, PartialEq)]
struct Args {
    /// Configuration file instead of clock-config.toml
    config: Option<PathBuf>,
    /// Weather API key overriding the configured one
    weather_appid: Option<String>,
    /// Print one frame and exit
    stdout: bool,
    /// Set the system clock from the NTP server and exit
    set_time: bool,
}

impl Args {
    fn parse<I: IntoIterator<Item = String>>(args: I) -> anyhow::Result<Self> {
        let mut parsed = Args::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" => {
                    let path = args.next().context("--config needs a path")?;
                    parsed.config = Some(PathBuf::from(path));
                }
                "--weather-appid" | "--weather_appid" => {
                    parsed.weather_appid = Some(args.next().context("--weather-appid needs a key")?);
                }
                "--stdout" => parsed.stdout = true,
                "--set-time" => parsed.set_time = true,
                other => bail!("unknown argument `{other}`"),
            }
        }
        Ok(parsed)
    }
}

/// Main application entry point.
fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse(env::args().skip(1))?;

    let mut config = match &args.config {
        Some(path) => Config::load_from_path(path),
        None => Config::load(),
    };
    if let Some(key) = args.weather_appid {
        config.weather.api_key = key;
    }

    let library = ClockUtil::load(&config.library.path);

    if args.set_time {
        let util = library.context("--set-time needs the clock_util library")?;
        let outcome = set_time(&util, &config.ntp.server, config.ntp.timeout())?;
        println!("{}", outcome.message());
        if !outcome.is_success() {
            bail!("{} ({})", outcome.message(), config.ntp.server);
        }
        return Ok(());
    }

    // Development mode: ASCII output for testing
    if args.stdout {
        let mut app = ClockApp::new(config, TerminalSurface::stdout());
        if let Ok(util) = library {
            app.attach(util);
        }
        draw_ascii(&app.frame(Local::now().naive_local()));
        return Ok(());
    }

    let mut app = ClockApp::new(config, TerminalSurface::stdout());
    match library {
        Ok(util) => app.attach(util),
        Err(e) => {
            warn!("{:#}", anyhow::Error::new(e));
            warn!("Running as a plain clock without NTP, weather or alarms");
        }
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run(app))
}

/// Tick the clock until Ctrl-C.
async fn run<S: Surface>(mut app: ClockApp<S>) -> anyhow::Result<()> {
    app.start().context("failed to open the clock window")?;

    let mut ticker = tokio::time::interval(app.config().display.tick());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                app.tick(Local::now().fixed_offset()).context("failed to draw the clock")?;
            }
            result = &mut ctrl_c => {
                result.context("failed to listen for Ctrl-C")?;
                info!("Shutting down");
                break;
            }
        }
    }

    app.shutdown()?;
    Ok(())
}
