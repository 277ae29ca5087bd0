//! Process-wide queues and the startup error type

mod hardware;

pub use hardware::*;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use thiserror::Error;

use crate::config::ConfigError;
use crate::input::{Direction, InputError};
use crate::led_matrix::DisplayError;
use crate::remote::RemoteError;

/// Joystick presses buffered between the reader thread and the event loop
pub const INPUT_CHANNEL_CAPACITY: usize = 16;

pub type InputChannel = Channel<CriticalSectionRawMutex, Direction, INPUT_CHANNEL_CAPACITY>;
pub type ShutdownSignal = Signal<CriticalSectionRawMutex, ()>;

/// Filled by the joystick reader thread, drained by the event loop.
pub static INPUT_CHANNEL: InputChannel = Channel::new();

/// Raised once from the SIGINT/SIGTERM handler.
pub static SHUTDOWN: ShutdownSignal = Signal::new();

#[derive(Error, Debug)]
pub enum AppError {
    #[error("invalid command line: {0}")]
    Config(#[from] ConfigError),
    #[error("input device error: {0}")]
    Input(#[from] InputError),
    #[error("display error: {0}")]
    Display(#[from] DisplayError),
    #[error("remote service error: {0}")]
    Remote(#[from] RemoteError),
    #[error("failed to install signal handler: {0}")]
    Signal(#[from] ctrlc::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Process exit status for a failure that stops the program.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Config(_) => 2,
            _ => 1,
        }
    }
}
