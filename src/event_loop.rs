//! Main event loop
//!
//! A single task waits on shutdown, joystick presses and the dashboard timer,
//! and handles whichever becomes ready first. Presses turn into detached
//! submissions; timer ticks poll the service and redraw the matrix.

use core::ops::ControlFlow;

use embassy_futures::select::{Either3, select3};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Instant, Timer};
use log::{debug, error, info};

use crate::dashboard::Dashboard;
use crate::input::Direction;
use crate::led_matrix::LedDisplay;
use crate::records::{Record, ResultPage};
use crate::remote::{PagePoller, Submit};
use crate::sensors::SensorGateway;
use crate::status::Status;

/// Time between dashboard refreshes
pub const POLL_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopEvent {
    Shutdown,
    Input(Direction),
    Tick,
}

pub struct EventLoop<G, S, P, D> {
    sensors: G,
    submitter: S,
    poller: P,
    dashboard: Dashboard<D>,
    next_tick: Instant,
}

impl<G, S, P, D> EventLoop<G, S, P, D>
where
    G: SensorGateway,
    S: Submit,
    P: PagePoller,
    D: LedDisplay,
{
    pub fn new(sensors: G, submitter: S, poller: P, display: D) -> Self {
        Self {
            sensors,
            submitter,
            poller,
            dashboard: Dashboard::new(display),
            next_tick: Instant::now() + POLL_INTERVAL,
        }
    }

    /// Deadline of the next dashboard refresh.
    pub fn next_tick(&self) -> Instant {
        self.next_tick
    }

    /// Wait for the next thing to do. Shutdown wins over pending input.
    pub async fn next_event<const N: usize>(
        &self,
        shutdown: &Signal<CriticalSectionRawMutex, ()>,
        input: &Channel<CriticalSectionRawMutex, Direction, N>,
    ) -> LoopEvent {
        match select3(shutdown.wait(), input.receive(), Timer::at(self.next_tick)).await {
            Either3::First(()) => LoopEvent::Shutdown,
            Either3::Second(direction) => LoopEvent::Input(direction),
            Either3::Third(()) => LoopEvent::Tick,
        }
    }

    /// Run until `shutdown` is signalled.
    pub async fn run<const N: usize>(
        &mut self,
        shutdown: &Signal<CriticalSectionRawMutex, ()>,
        input: &Channel<CriticalSectionRawMutex, Direction, N>,
    ) {
        info!("Event loop running, dashboard refresh every {}s", POLL_INTERVAL.as_secs());
        loop {
            let event = self.next_event(shutdown, input).await;
            if self.handle(event).is_break() {
                break;
            }
        }
        info!("Event loop stopped");
    }

    pub fn handle(&mut self, event: LoopEvent) -> ControlFlow<()> {
        match event {
            LoopEvent::Shutdown => return ControlFlow::Break(()),
            LoopEvent::Input(direction) => self.dispatch_input(direction),
            LoopEvent::Tick => {
                self.refresh_dashboard();
                self.schedule_next_tick(Instant::now());
            }
        }
        ControlFlow::Continue(())
    }

    fn dispatch_input(&mut self, direction: Direction) {
        let status = Status::from_direction(direction);
        info!("{} {}", direction.glyph(), status.label());

        let sample = match self.sensors.sample() {
            Ok(sample) => sample,
            Err(e) => {
                error!("Skipping {} record, sensor read failed: {}", status.label(), e);
                return;
            }
        };

        self.submitter.submit(Record::new(status, &sample));
    }

    fn refresh_dashboard(&mut self) {
        let page = self.poller.poll().unwrap_or_else(|e| {
            error!("Fetching recent records failed: {}", e);
            ResultPage::default()
        });

        if let Err(e) = self.dashboard.render(&page) {
            error!("Dashboard render failed: {}", e);
        }
    }

    /// Missed deadlines collapse into one immediate tick.
    fn schedule_next_tick(&mut self, now: Instant) {
        self.next_tick += POLL_INTERVAL;
        if self.next_tick < now {
            debug!(
                "Dashboard refresh overran by {}ms",
                (now - self.next_tick).as_millis()
            );
            self.next_tick = now;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::led_matrix::{DisplayError, Frame};
    use crate::records::{FORM_ID, field_keys};
    use crate::remote::RemoteError;
    use crate::sensors::{Orientation, Scalar, SensorError};
    use std::cell::RefCell;
    use std::thread;
    use std::time::Duration as StdDuration;

    struct FakeSensors {
        failing: bool,
    }

    impl SensorGateway for FakeSensors {
        fn read_scalar(&mut self, scalar: Scalar) -> Result<f64, SensorError> {
            if self.failing {
                return Err(SensorError::ReadFailed {
                    reading: scalar.name(),
                    details: "no sense hat".into(),
                });
            }
            Ok(match scalar {
                Scalar::Temperature => 31.5,
                Scalar::Humidity => 40.25,
                Scalar::Pressure => 1013.0,
            })
        }

        fn read_orientation(&mut self) -> Result<Orientation, SensorError> {
            Ok(Orientation {
                pitch: 1.0,
                roll: 2.0,
                yaw: 3.0,
            })
        }
    }

    #[derive(Default)]
    struct RecordingSubmitter {
        records: RefCell<Vec<Record>>,
    }

    impl Submit for RecordingSubmitter {
        fn submit(&self, record: Record) {
            self.records.borrow_mut().push(record);
        }
    }

    enum FakePoller {
        Page(ResultPage),
        Failing,
    }

    impl PagePoller for FakePoller {
        fn poll(&self) -> Result<ResultPage, RemoteError> {
            match self {
                FakePoller::Page(page) => Ok(page.clone()),
                FakePoller::Failing => Err(RemoteError::MissingToken("FULCRUM_TOKEN".into())),
            }
        }
    }

    #[derive(Default)]
    struct RecordingDisplay {
        frames: Vec<Frame>,
        failing: bool,
    }

    impl LedDisplay for RecordingDisplay {
        fn clear(&mut self) -> Result<(), DisplayError> {
            Ok(())
        }

        fn flush(&mut self, frame: &Frame) -> Result<(), DisplayError> {
            if self.failing {
                return Err(DisplayError::NotFound);
            }
            self.frames.push(frame.clone());
            Ok(())
        }
    }

    fn event_loop(
        sensors_failing: bool,
        poller: FakePoller,
    ) -> EventLoop<FakeSensors, RecordingSubmitter, FakePoller, RecordingDisplay> {
        EventLoop::new(
            FakeSensors {
                failing: sensors_failing,
            },
            RecordingSubmitter::default(),
            poller,
            RecordingDisplay::default(),
        )
    }

    #[test]
    fn test_each_press_submits_one_record() {
        let mut event_loop = event_loop(false, FakePoller::Failing);

        assert!(event_loop.handle(LoopEvent::Input(Direction::Up)).is_continue());
        assert!(event_loop.handle(LoopEvent::Input(Direction::Center)).is_continue());

        let records = event_loop.submitter.records.borrow();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].status, Status::Hot);
        assert_eq!(records[1].status, Status::Frozen);
        assert_eq!(records[0].form_id, FORM_ID);
        assert_eq!(records[0].form_values[field_keys::TEMPERATURE], "31.5");
        assert_eq!(records[0].form_values[field_keys::YAW], "3");
    }

    #[test]
    fn test_sensor_failure_skips_dispatch() {
        let mut event_loop = event_loop(true, FakePoller::Failing);

        assert!(event_loop.handle(LoopEvent::Input(Direction::Left)).is_continue());

        assert!(event_loop.submitter.records.borrow().is_empty());
    }

    #[test]
    fn test_failed_poll_renders_blank_and_continues() {
        let mut event_loop = event_loop(false, FakePoller::Failing);

        assert!(event_loop.handle(LoopEvent::Tick).is_continue());

        let frames = &event_loop.dashboard.display().frames;
        assert_eq!(frames.len(), 1);
        assert!(frames[0].is_blank());
    }

    #[test]
    fn test_tick_renders_polled_page() {
        let page = ResultPage {
            records: vec![
                Record {
                    status: Status::Warm,
                    ..Record::default()
                };
                3
            ],
            ..ResultPage::default()
        };
        let mut event_loop = event_loop(false, FakePoller::Page(page));

        event_loop.handle(LoopEvent::Tick);

        assert_eq!(event_loop.dashboard.display().frames[0].lit_cells(), 3);
    }

    #[test]
    fn test_display_failure_keeps_running() {
        let mut event_loop = EventLoop::new(
            FakeSensors { failing: false },
            RecordingSubmitter::default(),
            FakePoller::Failing,
            RecordingDisplay {
                failing: true,
                ..RecordingDisplay::default()
            },
        );

        assert!(event_loop.handle(LoopEvent::Tick).is_continue());
        assert!(event_loop.handle(LoopEvent::Input(Direction::Down)).is_continue());
        assert_eq!(event_loop.submitter.records.borrow().len(), 1);
    }

    #[test]
    fn test_shutdown_breaks() {
        let mut event_loop = event_loop(false, FakePoller::Failing);
        assert!(event_loop.handle(LoopEvent::Shutdown).is_break());
    }

    #[test]
    fn test_overrun_fires_once_without_backlog() {
        let mut event_loop = event_loop(false, FakePoller::Failing);
        let late = event_loop.next_tick() + Duration::from_secs(10);

        event_loop.schedule_next_tick(late);
        assert_eq!(event_loop.next_tick(), late);

        event_loop.schedule_next_tick(late);
        assert_eq!(event_loop.next_tick(), late + POLL_INTERVAL);
    }

    #[test]
    fn test_on_time_tick_keeps_cadence() {
        let mut event_loop = event_loop(false, FakePoller::Failing);
        let deadline = event_loop.next_tick();

        event_loop.schedule_next_tick(deadline);

        assert_eq!(event_loop.next_tick(), deadline + POLL_INTERVAL);
    }

    #[test]
    fn test_shutdown_wins_over_queued_input() {
        static SHUTDOWN: Signal<CriticalSectionRawMutex, ()> = Signal::new();
        static INPUT: Channel<CriticalSectionRawMutex, Direction, 4> = Channel::new();
        let event_loop = event_loop(false, FakePoller::Failing);

        INPUT.try_send(Direction::Right).unwrap();
        SHUTDOWN.signal(());

        let event = embassy_futures::block_on(event_loop.next_event(&SHUTDOWN, &INPUT));
        assert_eq!(event, LoopEvent::Shutdown);
    }

    #[test]
    fn test_run_drains_input_until_shutdown() {
        static SHUTDOWN: Signal<CriticalSectionRawMutex, ()> = Signal::new();
        static INPUT: Channel<CriticalSectionRawMutex, Direction, 4> = Channel::new();
        let mut event_loop = event_loop(false, FakePoller::Failing);

        INPUT.try_send(Direction::Up).unwrap();
        INPUT.try_send(Direction::Right).unwrap();
        let stopper = thread::spawn(|| {
            thread::sleep(StdDuration::from_millis(100));
            SHUTDOWN.signal(());
        });

        embassy_futures::block_on(event_loop.run(&SHUTDOWN, &INPUT));
        stopper.join().unwrap();

        let statuses: Vec<Status> = event_loop
            .submitter
            .records
            .borrow()
            .iter()
            .map(|record| record.status)
            .collect();
        assert_eq!(statuses, vec![Status::Hot, Status::Toasty]);
    }
}
