//! Sense HAT field logger.
//!
//! Joystick presses are stamped with a status, sampled and posted to Fulcrum.
//! Every two seconds the newest 64 records are drawn on the LED matrix, one
//! colored cell per record.
//!
//! | Press  | Status | Color      |
//! |--------|--------|------------|
//! | Up     | hot    | red        |
//! | Right  | toasty | orange     |
//! | Left   | warm   | yellow     |
//! | Down   | cold   | light blue |
//! | Center | frozen | blue       |

use std::process;
use std::sync::Arc;
use std::time::Duration;

use embassy_executor::Spawner;
use log::{error, info, warn};

use fulcrum_hat::app_state::{AppError, INPUT_CHANNEL, SHUTDOWN, init_hardware};
use fulcrum_hat::config::{Config, ConfigError, USAGE};
use fulcrum_hat::event_loop::EventLoop;
use fulcrum_hat::input::spawn_forwarder;
use fulcrum_hat::remote::{DetachedSubmitter, FulcrumClient, SubmissionTracker};

/// How long in-flight submissions may run after shutdown is requested.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(3);

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    let dotenv = dotenvy::dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Ok(path) = dotenv {
        info!("Loaded environment from {}", path.display());
    }

    let config = match Config::from_args(std::env::args().skip(1)) {
        Ok(config) => config,
        Err(ConfigError::HelpRequested) => {
            println!("{USAGE}");
            process::exit(0);
        }
        Err(e) => {
            let e = AppError::from(e);
            error!("{}", e);
            eprintln!("{USAGE}");
            process::exit(e.exit_code());
        }
    };

    // The executor never returns on its own, so every path exits explicitly.
    match run(config).await {
        Ok(()) => process::exit(0),
        Err(e) => {
            error!("{}", e);
            process::exit(e.exit_code());
        }
    }
}

async fn run(config: Config) -> Result<(), AppError> {
    info!("Starting {} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    let hardware = init_hardware(&config)?;

    ctrlc::set_handler(|| SHUTDOWN.signal(()))?;

    let client = Arc::new(FulcrumClient::new(config.service)?);
    info!("Posting records to {}", client.config().records_url);
    let tracker = SubmissionTracker::default();
    let submitter = DetachedSubmitter::new(Arc::clone(&client), tracker.clone());

    spawn_forwarder(hardware.joystick, &INPUT_CHANNEL)?;

    let mut event_loop = EventLoop::new(hardware.sensors, submitter, client, hardware.matrix);
    event_loop.run(&SHUTDOWN, &INPUT_CHANNEL).await;

    let pending = tracker.in_flight();
    if pending > 0 {
        info!("Waiting for {} submission(s) to finish", pending);
        if !tracker.wait_idle(SHUTDOWN_GRACE) {
            warn!("Abandoning {} unfinished submission(s)", tracker.in_flight());
        }
    }

    info!("Shut down");
    Ok(())
}
