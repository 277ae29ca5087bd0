//! Dashboard of recent records on the LED matrix
//!
//! Record `i` of a page lands on cell `(i / 8, i % 8)`, colored by its status.
//! Only the first 64 records fit; the rest are not drawn.

use embedded_graphics::Pixel;
use embedded_graphics::prelude::*;
use log::debug;

use crate::led_matrix::{CELL_COUNT, DisplayError, Frame, GRID_SIZE, LedDisplay};
use crate::records::{Record, ResultPage};

/// Paint `records` into a fresh frame.
pub fn paint(records: &[Record]) -> Frame {
    let mut frame = Frame::default();
    let pixels = records.iter().take(CELL_COUNT).enumerate().map(|(i, record)| {
        let x = (i / GRID_SIZE) as i32;
        let y = (i % GRID_SIZE) as i32;
        Pixel(Point::new(x, y), record.status.color())
    });
    let Ok(()) = frame.draw_iter(pixels);
    frame
}

/// Owns the LED display and redraws it from result pages.
pub struct Dashboard<D> {
    display: D,
}

impl<D: LedDisplay> Dashboard<D> {
    pub fn new(display: D) -> Self {
        Self { display }
    }

    /// Show `page` with a single write. Every frame starts all-off, so cells
    /// without a record are cleared by the same flush.
    pub fn render(&mut self, page: &ResultPage) -> Result<(), DisplayError> {
        if page.records.len() > CELL_COUNT {
            debug!(
                "Page has {} records, showing the first {}",
                page.records.len(),
                CELL_COUNT
            );
        }
        self.display.flush(&paint(&page.records))
    }

    pub fn display(&self) -> &D {
        &self.display
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::Status;
    use embedded_graphics::pixelcolor::Rgb888;

    #[derive(Default)]
    struct RecordingDisplay {
        clears: usize,
        frames: Vec<Frame>,
    }

    impl LedDisplay for RecordingDisplay {
        fn clear(&mut self) -> Result<(), DisplayError> {
            self.clears += 1;
            Ok(())
        }

        fn flush(&mut self, frame: &Frame) -> Result<(), DisplayError> {
            self.frames.push(frame.clone());
            Ok(())
        }
    }

    fn page_of(statuses: &[Status]) -> ResultPage {
        ResultPage {
            records: statuses
                .iter()
                .map(|&status| Record {
                    status,
                    ..Record::default()
                })
                .collect(),
            ..ResultPage::default()
        }
    }

    #[test]
    fn test_first_cells_follow_status_colors() {
        let frame = paint(
            &page_of(&[Status::Hot, Status::Cold, Status::Unknown, Status::Warm]).records,
        );

        assert_eq!(frame.cell(0, 0), Some(Rgb888::new(255, 0, 0)));
        assert_eq!(frame.cell(0, 1), Some(Rgb888::new(135, 206, 250)));
        assert_eq!(frame.cell(0, 2), Some(Rgb888::new(0, 0, 0)));
        assert_eq!(frame.cell(0, 3), Some(Rgb888::new(255, 255, 0)));
        assert_eq!(frame.lit_cells(), 3);
    }

    #[test]
    fn test_ninth_record_starts_next_column() {
        let mut statuses = vec![Status::Unknown; 8];
        statuses.push(Status::Frozen);

        let frame = paint(&page_of(&statuses).records);

        assert_eq!(frame.cell(1, 0), Some(Rgb888::new(0, 0, 255)));
        assert_eq!(frame.lit_cells(), 1);
    }

    #[test]
    fn test_only_first_64_records_painted() {
        let mut statuses = vec![Status::Toasty; CELL_COUNT];
        statuses.push(Status::Hot);

        let frame = paint(&page_of(&statuses).records);

        assert_eq!(frame.lit_cells(), CELL_COUNT);
        assert_eq!(frame.cell(7, 7), Some(Rgb888::new(255, 165, 0)));
        assert!(
            (0..GRID_SIZE)
                .flat_map(|x| (0..GRID_SIZE).map(move |y| (x, y)))
                .all(|(x, y)| frame.cell(x, y) != Some(Status::Hot.color()))
        );
    }

    #[test]
    fn test_empty_page_renders_all_off() {
        let mut dashboard = Dashboard::new(RecordingDisplay::default());

        dashboard.render(&ResultPage::default()).unwrap();

        assert_eq!(dashboard.display().clears, 0);
        assert_eq!(dashboard.display().frames.len(), 1);
        assert!(dashboard.display().frames[0].is_blank());
    }

    #[test]
    fn test_render_flushes_once_per_page() {
        let mut dashboard = Dashboard::new(RecordingDisplay::default());
        let page = page_of(&[Status::Hot; 20]);

        dashboard.render(&page).unwrap();
        dashboard.render(&page).unwrap();

        // One hardware write per render, never a blank write in between
        assert_eq!(dashboard.display().clears, 0);
        assert_eq!(dashboard.display().frames.len(), 2);
        assert!(dashboard.display().frames.iter().all(|f| f.lit_cells() == 20));
    }
}
