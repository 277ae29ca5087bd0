//! 8x8 LED matrix frame and the Sense HAT framebuffer device.
//!
//! Drawing targets an in-memory [`Frame`]; a finished frame is pushed to the
//! hardware with a single [`LedDisplay::flush`].

use std::convert::Infallible;
use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::fs::FileExt;
use std::path::{Path, PathBuf};

use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use log::{debug, info};
use thiserror::Error;

/// Cells per side of the matrix.
pub const GRID_SIZE: usize = 8;

/// Total number of cells (8 x 8 = 64).
pub const CELL_COUNT: usize = GRID_SIZE * GRID_SIZE;

/// Name the Sense HAT kernel driver gives its framebuffer.
const SENSE_HAT_FB_NAME: &str = "RPi-Sense FB";

const GRAPHICS_CLASS: &str = "/sys/class/graphics";

#[derive(Error, Debug)]
pub enum DisplayError {
    #[error("no Sense HAT framebuffer found under /sys/class/graphics")]
    NotFound,
    #[error("unable to open LED framebuffer {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("LED framebuffer write failed: {0}")]
    Write(#[from] io::Error),
}

/// Output side of the LED matrix.
pub trait LedDisplay {
    /// Turn every LED off.
    fn clear(&mut self) -> Result<(), DisplayError>;

    /// Show `frame` in one write.
    fn flush(&mut self, frame: &Frame) -> Result<(), DisplayError>;
}

/// In-memory 8x8 frame, all cells off by default.
///
/// Cells are stored row-major: `x` is the column and `y` the row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    cells: [Rgb888; CELL_COUNT],
}

impl Default for Frame {
    fn default() -> Self {
        Self {
            cells: [Rgb888::BLACK; CELL_COUNT],
        }
    }
}

impl Frame {
    /// Set one cell. Coordinates outside the grid are ignored and return `false`.
    pub fn set_cell(&mut self, x: usize, y: usize, color: Rgb888) -> bool {
        if x >= GRID_SIZE || y >= GRID_SIZE {
            return false;
        }
        self.cells[y * GRID_SIZE + x] = color;
        true
    }

    pub fn cell(&self, x: usize, y: usize) -> Option<Rgb888> {
        (x < GRID_SIZE && y < GRID_SIZE).then(|| self.cells[y * GRID_SIZE + x])
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|&c| c == Rgb888::BLACK)
    }

    /// Number of cells that are not off.
    pub fn lit_cells(&self) -> usize {
        self.cells.iter().filter(|&&c| c != Rgb888::BLACK).count()
    }

    /// Pack the frame as little-endian RGB565, the framebuffer's pixel format.
    pub fn to_rgb565(&self) -> [u8; CELL_COUNT * 2] {
        let mut raw = [0u8; CELL_COUNT * 2];
        for (chunk, color) in raw.chunks_exact_mut(2).zip(self.cells.iter()) {
            let (r, g, b) = (color.r() as u16, color.g() as u16, color.b() as u16);
            let mut rgb565: u16 = (r & 0b1111_1000) << 8;
            rgb565 |= (g & 0b1111_1100) << 3;
            rgb565 |= b >> 3;
            chunk.copy_from_slice(&rgb565.to_le_bytes());
        }
        raw
    }
}

impl OriginDimensions for Frame {
    fn size(&self) -> Size {
        Size::new(GRID_SIZE as u32, GRID_SIZE as u32)
    }
}

impl DrawTarget for Frame {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if let (Ok(x), Ok(y)) = (usize::try_from(point.x), usize::try_from(point.y)) {
                self.set_cell(x, y, color);
            }
        }
        Ok(())
    }
}

/// The Sense HAT LED matrix, exposed by its kernel driver as an RGB565
/// framebuffer device.
pub struct SenseHatMatrix {
    file: File,
}

impl SenseHatMatrix {
    /// Find the Sense HAT framebuffer among `/dev/fb*` and open it.
    pub fn discover() -> Result<Self, DisplayError> {
        let path = find_framebuffer(Path::new(GRAPHICS_CLASS)).ok_or(DisplayError::NotFound)?;
        Self::open(path)
    }

    pub fn open(path: impl Into<PathBuf>) -> Result<Self, DisplayError> {
        let path = path.into();
        let file = OpenOptions::new()
            .write(true)
            .open(&path)
            .map_err(|source| DisplayError::Open {
                path: path.clone(),
                source,
            })?;
        info!("LED matrix on {}", path.display());
        Ok(Self { file })
    }
}

impl LedDisplay for SenseHatMatrix {
    fn clear(&mut self) -> Result<(), DisplayError> {
        self.file.write_all_at(&[0u8; CELL_COUNT * 2], 0)?;
        Ok(())
    }

    fn flush(&mut self, frame: &Frame) -> Result<(), DisplayError> {
        debug!("Flushing {} lit cells", frame.lit_cells());
        self.file.write_all_at(&frame.to_rgb565(), 0)?;
        Ok(())
    }
}

/// Look through `class_dir/fb*/name` for the Sense HAT driver and return the
/// matching `/dev/fbN` node.
fn find_framebuffer(class_dir: &Path) -> Option<PathBuf> {
    let mut nodes: Vec<_> = std::fs::read_dir(class_dir)
        .ok()?
        .filter_map(Result::ok)
        .map(|entry| entry.file_name())
        .filter(|node| node.to_string_lossy().starts_with("fb"))
        .collect();
    nodes.sort();

    nodes.into_iter().find_map(|node| {
        let name = std::fs::read_to_string(class_dir.join(&node).join("name")).ok()?;
        (name.trim() == SENSE_HAT_FB_NAME).then(|| Path::new("/dev").join(node))
    })
}
