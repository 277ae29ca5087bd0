//! Sense HAT instruments through the vendor Python library
//!
//! The IMU fusion and sensor calibration live in the `sense_hat` package, so
//! each read runs a one-line script and parses what it prints.

use std::process::Command;

use log::{debug, error};

use super::{Orientation, Scalar, SensorError, SensorGateway};

/// Environment variable naming the Python interpreter to run.
pub const INTERPRETER_ENV: &str = "SENSE_HAT_PYTHON";

const DEFAULT_INTERPRETER: &str = "python3";

const ORIENTATION_SCRIPT: &str = "from sense_hat import SenseHat;\
o=SenseHat().get_orientation();print(o['pitch'],o['roll'],o['yaw'])";

pub struct SenseHatCli {
    interpreter: String,
}

impl Default for SenseHatCli {
    fn default() -> Self {
        Self::new(DEFAULT_INTERPRETER)
    }
}

impl SenseHatCli {
    pub fn new(interpreter: impl Into<String>) -> Self {
        Self {
            interpreter: interpreter.into(),
        }
    }

    /// Use the interpreter named by `SENSE_HAT_PYTHON`, falling back to `python3`.
    pub fn from_env() -> Self {
        match std::env::var(INTERPRETER_ENV) {
            Ok(interpreter) if !interpreter.trim().is_empty() => Self::new(interpreter),
            _ => Self::default(),
        }
    }

    pub fn interpreter(&self) -> &str {
        &self.interpreter
    }

    fn run(&self, reading: &'static str, script: &str) -> Result<String, SensorError> {
        let output = Command::new(&self.interpreter)
            .arg("-c")
            .arg(script)
            .output()
            .map_err(|source| SensorError::Spawn { reading, source })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!("Sense HAT {} read exited with {}", reading, output.status);
            return Err(SensorError::ReadFailed {
                reading,
                details: format!("{}: {}", output.status, stderr.trim()),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        debug!("Sense HAT {} -> {}", reading, stdout.trim());
        Ok(stdout)
    }
}

fn scalar_script(scalar: Scalar) -> String {
    format!(
        "from sense_hat import SenseHat;print(SenseHat().get_{}())",
        scalar.name()
    )
}

fn parse_value(reading: &'static str, raw: &str) -> Result<f64, SensorError> {
    raw.trim().parse().map_err(|_| SensorError::Parse {
        reading,
        raw: raw.trim().to_owned(),
    })
}

/// Parse `pitch roll yaw` as printed by the orientation script.
fn parse_orientation(raw: &str) -> Result<Orientation, SensorError> {
    let mut values = raw.split_whitespace();
    let mut next = |reading: &'static str| -> Result<f64, SensorError> {
        let value = values.next().ok_or_else(|| SensorError::Parse {
            reading,
            raw: raw.trim().to_owned(),
        })?;
        parse_value(reading, value)
    };

    Ok(Orientation {
        pitch: next("orientation.pitch")?,
        roll: next("orientation.roll")?,
        yaw: next("orientation.yaw")?,
    })
}

impl SensorGateway for SenseHatCli {
    fn read_scalar(&mut self, scalar: Scalar) -> Result<f64, SensorError> {
        let out = self.run(scalar.name(), &scalar_script(scalar))?;
        parse_value(scalar.name(), &out)
    }

    fn read_orientation(&mut self) -> Result<Orientation, SensorError> {
        let out = self.run("orientation", ORIENTATION_SCRIPT)?;
        parse_orientation(&out)
    }
}
