//! Sense HAT joystick over the Linux evdev interface
//!
//! The joystick shows up as a keyboard that only ever reports the arrow keys
//! and enter. Raw `input_event` structs are read straight from the device node
//! and presses are turned into [`Direction`]s. Releases, auto-repeat and any
//! other key are ignored.

use std::fs::File;
use std::io::{self, ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::{debug, info, warn};
use thiserror::Error;

/// Conventional device node of the Sense HAT joystick.
pub const DEFAULT_DEVICE_PATH: &str = "/dev/input/event0";

/// `struct timeval` is two C longs, which are pointer sized on Linux.
const TIMEVAL_SIZE: usize = 2 * size_of::<usize>();

/// Size of `struct input_event`: timeval, type (u16), code (u16), value (i32).
pub const INPUT_EVENT_SIZE: usize = TIMEVAL_SIZE + 8;

const EV_KEY: u16 = 0x01;
const KEY_PRESSED: i32 = 1;

const KEY_ENTER: u16 = 28;
const KEY_UP: u16 = 103;
const KEY_LEFT: u16 = 105;
const KEY_RIGHT: u16 = 106;
const KEY_DOWN: u16 = 108;

#[derive(Error, Debug)]
pub enum InputError {
    #[error("unable to open input device {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("input device read failed: {0}")]
    Read(#[from] io::Error),
}

/// Joystick directions. Pressing the stick in is `Center`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Center,
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const fn from_key_code(code: u16) -> Option<Self> {
        match code {
            KEY_ENTER => Some(Self::Center),
            KEY_UP => Some(Self::Up),
            KEY_DOWN => Some(Self::Down),
            KEY_LEFT => Some(Self::Left),
            KEY_RIGHT => Some(Self::Right),
            _ => None,
        }
    }

    pub const fn glyph(self) -> &'static str {
        match self {
            Self::Center => "⏎",
            Self::Up => "↑",
            Self::Down => "↓",
            Self::Left => "←",
            Self::Right => "→",
        }
    }
}

/// Decode one raw `input_event`, returning a direction only for key presses
/// of the five joystick keys.
pub fn decode_event(raw: &[u8; INPUT_EVENT_SIZE]) -> Option<Direction> {
    let field = &raw[TIMEVAL_SIZE..];
    let kind = u16::from_ne_bytes([field[0], field[1]]);
    let code = u16::from_ne_bytes([field[2], field[3]]);
    let value = i32::from_ne_bytes([field[4], field[5], field[6], field[7]]);

    if kind != EV_KEY || value != KEY_PRESSED {
        return None;
    }
    Direction::from_key_code(code)
}

/// Read the human readable device name from sysfs.
fn device_name(path: &Path) -> Option<String> {
    let node = path.file_name()?;
    let sysfs = Path::new("/sys/class/input").join(node).join("device/name");
    std::fs::read_to_string(sysfs)
        .ok()
        .map(|name| name.trim().to_owned())
        .filter(|name| !name.is_empty())
}

pub struct Joystick<R = File> {
    reader: R,
    name: String,
}

impl Joystick<File> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, InputError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| InputError::Open {
            path: path.to_owned(),
            source,
        })?;
        let name = device_name(path).unwrap_or_else(|| path.display().to_string());
        Ok(Self::from_reader(file, name))
    }
}

impl<R: Read> Joystick<R> {
    pub fn from_reader(reader: R, name: impl Into<String>) -> Self {
        Self {
            reader,
            name: name.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Block until the next joystick press. Returns `None` once the device
    /// stops producing events.
    pub fn next_direction(&mut self) -> Result<Option<Direction>, InputError> {
        let mut raw = [0u8; INPUT_EVENT_SIZE];
        loop {
            match self.reader.read_exact(&mut raw) {
                Ok(()) => {
                    if let Some(direction) = decode_event(&raw) {
                        return Ok(Some(direction));
                    }
                }
                Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

/// Lazy, blocking sequence of presses.
impl<R: Read> Iterator for Joystick<R> {
    type Item = Result<Direction, InputError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_direction().transpose()
    }
}

/// Move the joystick onto its own reader thread and forward every press into
/// `channel`.
///
/// The channel is bounded. A press that arrives while it is full is dropped
/// rather than stalling the device.
pub fn spawn_forwarder<R, const N: usize>(
    joystick: Joystick<R>,
    channel: &'static Channel<CriticalSectionRawMutex, Direction, N>,
) -> io::Result<JoinHandle<()>>
where
    R: Read + Send + 'static,
{
    thread::Builder::new()
        .name("joystick".into())
        .spawn(move || forward(joystick, channel))
}

fn forward<R: Read, const N: usize>(
    joystick: Joystick<R>,
    channel: &Channel<CriticalSectionRawMutex, Direction, N>,
) {
    info!("Listening for joystick presses on {}", joystick.name());
    for event in joystick {
        match event {
            Ok(direction) => {
                debug!("Joystick {:?}", direction);
                if channel.try_send(direction).is_err() {
                    warn!("Input queue full, dropping {:?} press", direction);
                }
            }
            Err(e) => {
                warn!("Joystick reader stopped: {}", e);
                return;
            }
        }
    }
    info!("Joystick device closed");
}
