//! Fixed-width CSV data recorder.
//!
//! [`CsvRecorder`] streams one row per tick boundary to any `Write`
//! sink, enforcing strictly increasing timestamps — a stale or duplicate
//! row is dropped with a warning rather than corrupting the series.
//! [`RecorderWorker`] is the clock-synchronized sampler that feeds it.

use std::error::Error;
use std::fmt;
use std::fs::{self, File};
use std::io::{self, LineWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use groundroll_core::SharedState;
use groundroll_engine::clock::{run_synced, SimClock};

/// Column width of every CSV field.
const COLUMN_WIDTH: usize = 12;

/// Errors opening or writing the data sink.
#[derive(Debug)]
pub enum RecorderError {
    /// The output file could not be created.
    Open {
        /// The file that failed to open.
        path: PathBuf,
        /// The underlying I/O error.
        source: io::Error,
    },
    /// A row or the header failed to write.
    Io(io::Error),
}

impl fmt::Display for RecorderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open { path, source } => {
                write!(f, "cannot open data file {}: {source}", path.display())
            }
            Self::Io(e) => write!(f, "data write failed: {e}"),
        }
    }
}

impl Error for RecorderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Open { source, .. } => Some(source),
            Self::Io(e) => Some(e),
        }
    }
}

impl From<io::Error> for RecorderError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

/// One sampled row of vehicle state.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StateRow {
    /// Simulated time of the sample (s).
    pub time: f64,
    /// Position (m).
    pub position: f64,
    /// Velocity (m/s).
    pub velocity: f64,
    /// Acceleration (m/s²).
    pub acceleration: f64,
    /// Throttle setting.
    pub throttle: f64,
    /// Brake setting.
    pub brake: f64,
    /// Thrust (N).
    pub thrust: f64,
    /// Drag (N).
    pub drag: f64,
    /// Brake force (N).
    pub brake_force: f64,
}

impl StateRow {
    /// Sample the shared state at the given simulated time.
    pub fn sample(state: &SharedState, time: f64) -> Self {
        Self {
            time,
            position: state.position.load(),
            velocity: state.velocity.load(),
            acceleration: state.acceleration.load(),
            throttle: state.throttle.load(),
            brake: state.brake.load(),
            thrust: state.thrust.load(),
            drag: state.drag_force.load(),
            brake_force: state.brake_force.load(),
        }
    }
}

/// Streams fixed-width rows to a `Write` sink.
///
/// Generic over the sink so tests can record into a `Vec<u8>` while
/// production code uses a line-buffered file.
pub struct CsvRecorder<W: Write> {
    writer: W,
    last_time: f64,
    rows_written: u64,
}

impl CsvRecorder<LineWriter<File>> {
    /// Create (truncating) the data file at `path`, creating parent
    /// directories as needed.
    pub fn create_file(path: &Path) -> Result<Self, RecorderError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| RecorderError::Open {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let file = File::create(path).map_err(|source| RecorderError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Self::new(LineWriter::new(file))
    }
}

impl<W: Write> CsvRecorder<W> {
    /// Wrap a sink, immediately writing the header row.
    pub fn new(mut writer: W) -> Result<Self, RecorderError> {
        for name in [
            "time",
            "position",
            "velocity",
            "acc",
            "throttle",
            "brake",
            "thrust",
            "drag",
            "brake_force",
        ] {
            write!(writer, "{name:<COLUMN_WIDTH$}")?;
        }
        writeln!(writer)?;
        writer.flush()?;
        Ok(Self {
            writer,
            last_time: f64::NEG_INFINITY,
            rows_written: 0,
        })
    }

    /// Record one row.
    ///
    /// Returns `Ok(false)` — with a warning — when the row's timestamp
    /// is not strictly greater than the previous one.
    pub fn record(&mut self, row: &StateRow) -> Result<bool, RecorderError> {
        if row.time <= self.last_time {
            log::warn!(
                "[recorder] non-increasing timestamp {:.4} (last {:.4}), row dropped",
                row.time,
                self.last_time,
            );
            return Ok(false);
        }
        self.last_time = row.time;

        write!(self.writer, "{:<COLUMN_WIDTH$.2}", row.time)?;
        write!(self.writer, "{:<COLUMN_WIDTH$.2}", row.position)?;
        write!(self.writer, "{:<COLUMN_WIDTH$.2}", row.velocity)?;
        write!(self.writer, "{:<COLUMN_WIDTH$.2}", row.acceleration)?;
        write!(self.writer, "{:<COLUMN_WIDTH$.4}", row.throttle)?;
        write!(self.writer, "{:<COLUMN_WIDTH$.2}", row.brake)?;
        write!(self.writer, "{:<COLUMN_WIDTH$.2}", row.thrust)?;
        write!(self.writer, "{:<COLUMN_WIDTH$.2}", row.drag)?;
        write!(self.writer, "{:<COLUMN_WIDTH$.2}", row.brake_force)?;
        writeln!(self.writer)?;
        self.writer.flush()?;
        self.rows_written += 1;
        Ok(true)
    }

    /// Number of rows recorded so far (header excluded).
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Consume the recorder and return the underlying sink.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Owns the clock-synchronized recorder worker.
pub struct RecorderWorker {
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl RecorderWorker {
    /// Spawn the worker.
    ///
    /// It records the initial state at t = 0.00 before entering the
    /// tick loop, then one row each time the clock crosses the next
    /// `dt` boundary.
    pub fn start<W>(
        state: Arc<SharedState>,
        clock: Arc<SimClock>,
        mut recorder: CsvRecorder<W>,
    ) -> Self
    where
        W: Write + Send + 'static,
    {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let worker = thread::Builder::new()
            .name("data-recorder".into())
            .spawn(move || {
                log::debug!("[recorder] worker started");
                if let Err(e) = recorder.record(&StateRow::sample(&state, 0.0)) {
                    log::warn!("[recorder] initial row failed: {e}");
                }

                let mut next_time = clock.time_step();
                let tick_clock = Arc::clone(&clock);
                run_synced(&clock, &flag, move || {
                    if tick_clock.current_time() >= next_time {
                        let row = StateRow::sample(&state, next_time);
                        match recorder.record(&row) {
                            Ok(_) => next_time += tick_clock.time_step(),
                            Err(e) => log::warn!("[recorder] row failed: {e}"),
                        }
                    }
                });
                log::debug!("[recorder] worker finished");
            })
            .expect("spawn data-recorder thread");
        Self {
            running,
            worker: Some(worker),
        }
    }

    /// Signal the worker to exit and join it.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for RecorderWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn row(time: f64) -> StateRow {
        StateRow {
            time,
            position: 1.0,
            velocity: 2.0,
            acceleration: 3.0,
            throttle: 0.1234,
            brake: 0.5,
            thrust: 1000.0,
            drag: 10.0,
            brake_force: 20.0,
        }
    }

    fn output(recorder: CsvRecorder<Vec<u8>>) -> String {
        String::from_utf8(recorder.into_inner()).unwrap()
    }

    #[test]
    fn header_is_written_on_construction() {
        let recorder = CsvRecorder::new(Vec::new()).unwrap();
        let text = output(recorder);
        let header = text.lines().next().unwrap();
        assert!(header.starts_with("time"));
        for name in ["position", "velocity", "acc", "throttle", "brake", "thrust", "drag", "brake_force"] {
            assert!(header.contains(name), "missing column {name}");
        }
        // Nine fixed-width columns.
        assert_eq!(header.len(), 9 * COLUMN_WIDTH);
    }

    #[test]
    fn rows_are_fixed_width_with_throttle_precision() {
        let mut recorder = CsvRecorder::new(Vec::new()).unwrap();
        assert!(recorder.record(&row(0.0)).unwrap());
        let text = output(recorder);
        let data = text.lines().nth(1).unwrap();
        assert_eq!(data.len(), 9 * COLUMN_WIDTH);
        assert!(data.starts_with("0.00"));
        // Throttle column keeps four decimals.
        assert!(data.contains("0.1234"));
        // The rest keep two.
        assert!(data.contains("1000.00"));
    }

    #[test]
    fn duplicate_timestamp_is_dropped() {
        let mut recorder = CsvRecorder::new(Vec::new()).unwrap();
        assert!(recorder.record(&row(1.23)).unwrap());
        assert!(!recorder.record(&row(1.23)).unwrap());
        assert_eq!(recorder.rows_written(), 1);
    }

    #[test]
    fn backwards_timestamp_is_dropped() {
        // A stale worker posting t=1.23 after t=1.24 yields one recorded
        // row and strictly increasing file times.
        let mut recorder = CsvRecorder::new(Vec::new()).unwrap();
        assert!(recorder.record(&row(1.24)).unwrap());
        assert!(!recorder.record(&row(1.23)).unwrap());
        assert!(recorder.record(&row(1.25)).unwrap());

        let text = output(recorder);
        let times: Vec<f64> = text
            .lines()
            .skip(1)
            .map(|line| line.split_whitespace().next().unwrap().parse().unwrap())
            .collect();
        assert_eq!(times, [1.24, 1.25]);
    }

    #[test]
    fn sample_reads_all_nine_fields() {
        let state = SharedState::default();
        state.position.store(5.0);
        state.velocity.store(6.0);
        state.thrust.store(7.0);
        let sampled = StateRow::sample(&state, 2.5);
        assert_eq!(sampled.time, 2.5);
        assert_eq!(sampled.position, 5.0);
        assert_eq!(sampled.velocity, 6.0);
        assert_eq!(sampled.thrust, 7.0);
    }

    #[test]
    fn worker_records_t_zero_then_tick_boundaries() {
        let state = Arc::new(SharedState::default());
        state.position.store(42.0);
        let clock = Arc::new(SimClock::new(0.01));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        let recorder = CsvRecorder::create_file(&path).unwrap();

        let mut worker = RecorderWorker::start(Arc::clone(&state), Arc::clone(&clock), recorder);
        let clock_handle = {
            let clock = Arc::clone(&clock);
            thread::spawn(move || clock.start())
        };

        let deadline = Instant::now() + Duration::from_secs(2);
        while clock.step_count() < 10 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(2));
        }
        clock.stop();
        worker.stop();
        clock_handle.join().unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let times: Vec<f64> = text
            .lines()
            .skip(1)
            .map(|line| line.split_whitespace().next().unwrap().parse().unwrap())
            .collect();
        assert!(times.len() >= 2, "expected t=0 plus tick rows, got {times:?}");
        assert_eq!(times[0], 0.0);
        assert!((times[1] - 0.01).abs() < 1e-9);
        // Strictly increasing throughout.
        for pair in times.windows(2) {
            assert!(pair[1] > pair[0], "times not increasing: {times:?}");
        }
    }
}
