//! Status labels attached to every logged reading
//!
//! The operator picks the label with the joystick. The same label decides the
//! color of the record's cell on the dashboard.

use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::RgbColor;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::input::Direction;

/// Qualitative temperature classification of a record
///
/// `Unknown` stands for anything the service returns that is not one of the
/// five labels, including a missing or empty status. It is never produced by
/// the joystick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    Frozen,
    Hot,
    Cold,
    Warm,
    Toasty,
    #[default]
    Unknown,
}

impl Status {
    /// Status chosen by a joystick direction
    pub const fn from_direction(direction: Direction) -> Self {
        match direction {
            Direction::Center => Self::Frozen,
            Direction::Up => Self::Hot,
            Direction::Down => Self::Cold,
            Direction::Left => Self::Warm,
            Direction::Right => Self::Toasty,
        }
    }

    pub fn from_label(label: &str) -> Self {
        match label {
            "frozen" => Self::Frozen,
            "hot" => Self::Hot,
            "cold" => Self::Cold,
            "warm" => Self::Warm,
            "toasty" => Self::Toasty,
            _ => Self::Unknown,
        }
    }

    /// Wire label. `Unknown` has none.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Frozen => "frozen",
            Self::Hot => "hot",
            Self::Cold => "cold",
            Self::Warm => "warm",
            Self::Toasty => "toasty",
            Self::Unknown => "",
        }
    }

    /// Dashboard cell color
    pub const fn color(self) -> Rgb888 {
        match self {
            Self::Hot => Rgb888::new(255, 0, 0),
            Self::Toasty => Rgb888::new(255, 165, 0),
            Self::Warm => Rgb888::new(255, 255, 0),
            Self::Cold => Rgb888::new(135, 206, 250),
            Self::Frozen => Rgb888::new(0, 0, 255),
            Self::Unknown => Rgb888::BLACK,
        }
    }
}

impl Serialize for Status {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for Status {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = Option::<String>::deserialize(deserializer)?;
        Ok(label.as_deref().map(Self::from_label).unwrap_or_default())
    }
}
