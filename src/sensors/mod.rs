mod sense_hat;

pub use sense_hat::{INTERPRETER_ENV, SenseHatCli};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SensorError {
    #[error("failed to start the {reading} reader: {source}")]
    Spawn {
        reading: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("{reading} read failed: {details}")]
    ReadFailed {
        reading: &'static str,
        details: String,
    },
    #[error("could not parse {reading} value {raw:?}")]
    Parse { reading: &'static str, raw: String },
}

/// Scalar instruments on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scalar {
    /// Degrees Celsius
    Temperature,
    /// Relative humidity, percent
    Humidity,
    /// Millibars
    Pressure,
}

impl Scalar {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Temperature => "temperature",
            Self::Humidity => "humidity",
            Self::Pressure => "pressure",
        }
    }
}

/// Orientation in degrees. All three axes come from a single instrument call.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Orientation {
    pub pitch: f64,
    pub roll: f64,
    pub yaw: f64,
}

/// One reading of every instrument, taken for a single input event.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Sample {
    pub temperature: f64,
    pub humidity: f64,
    pub pressure: f64,
    pub orientation: Orientation,
}

/// Synchronous access to the environmental instruments.
///
/// Every call blocks until the instrument answers. Nothing is cached; callers
/// that need a fresh value simply read again.
pub trait SensorGateway {
    /// Read a single scalar instrument.
    fn read_scalar(&mut self, scalar: Scalar) -> Result<f64, SensorError>;

    /// Read pitch, roll and yaw as one unit.
    fn read_orientation(&mut self) -> Result<Orientation, SensorError>;

    /// Take a full sample: three scalar reads followed by one orientation read.
    ///
    /// Stops at the first failing instrument.
    fn sample(&mut self) -> Result<Sample, SensorError> {
        Ok(Sample {
            temperature: self.read_scalar(Scalar::Temperature)?,
            humidity: self.read_scalar(Scalar::Humidity)?,
            pressure: self.read_scalar(Scalar::Pressure)?,
            orientation: self.read_orientation()?,
        })
    }
}
