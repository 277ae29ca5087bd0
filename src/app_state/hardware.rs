//! Opening the Sense HAT devices
//!
//! Both device nodes are opened before the event loop starts, so a missing
//! joystick or framebuffer stops the program up front.

use log::info;

use super::AppError;
use crate::config::Config;
use crate::input::Joystick;
use crate::led_matrix::{LedDisplay, SenseHatMatrix};
use crate::sensors::SenseHatCli;

pub struct Hardware {
    pub joystick: Joystick,
    pub matrix: SenseHatMatrix,
    pub sensors: SenseHatCli,
}

pub fn init_hardware(config: &Config) -> Result<Hardware, AppError> {
    info!("Opening joystick at {}", config.input_path.display());
    let joystick = Joystick::open(&config.input_path)?;
    info!("Joystick ready: {}", joystick.name());

    let mut matrix = SenseHatMatrix::discover()?;
    matrix.clear()?;

    let sensors = SenseHatCli::from_env();
    info!("Reading sensors through {}", sensors.interpreter());

    Ok(Hardware {
        joystick,
        matrix,
        sensors,
    })
}
