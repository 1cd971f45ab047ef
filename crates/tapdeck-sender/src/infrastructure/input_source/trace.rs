//! Replays a recorded touch trace as an input source.
//!
//! A trace is plain text, one record per line.  Blank lines and everything
//! after `#` are ignored:
//!
//! ```text
//! # surface size
//! resize 1280 800
//! down 0 150.0 400.0 42.5      # id x y contact-size
//! move 0 152.0 401.0 42.5
//! up 0
//! cancel 3
//! mode absolute                # or: mode relative
//! ```
//!
//! Malformed lines are logged and skipped so that one bad record does not
//! abort a long replay.  The reader runs on its own thread and stops at end of
//! input, when [`InputSource::stop`] is called, or when the receiver is
//! dropped.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    mpsc, Arc, Mutex,
};

use tapdeck_core::{Mode, ParseModeError};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::{CaptureError, InputSource, RawTouchEvent};

/// Why a trace line could not be parsed.
#[derive(Debug, Error, PartialEq)]
pub enum TraceParseError {
    #[error("unknown record {0:?}")]
    UnknownRecord(String),

    #[error("`{record}` record is missing `{field}`")]
    MissingField {
        record: &'static str,
        field: &'static str,
    },

    #[error("invalid `{field}` value {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    #[error(transparent)]
    InvalidMode(#[from] ParseModeError),

    #[error("unexpected trailing input {0:?}")]
    TrailingInput(String),
}

/// Parses one trace line.
///
/// Returns `Ok(None)` for blank and comment-only lines.
///
/// # Errors
///
/// Returns [`TraceParseError`] when the record is unknown, a field is missing
/// or not a number, or extra fields follow the record.
pub fn parse_trace_line(line: &str) -> Result<Option<RawTouchEvent>, TraceParseError> {
    let content = match line.find('#') {
        Some(idx) => &line[..idx],
        None => line,
    };
    let mut fields = content.split_whitespace();
    let Some(record) = fields.next() else {
        return Ok(None);
    };

    let event = match record {
        "resize" => RawTouchEvent::Resize {
            width: finite(&mut fields, "resize", "width")?,
            height: finite(&mut fields, "resize", "height")?,
        },
        "down" => RawTouchEvent::Down {
            id: number(&mut fields, "down", "id")?,
            x: finite(&mut fields, "down", "x")?,
            y: finite(&mut fields, "down", "y")?,
            size: finite(&mut fields, "down", "size")?,
        },
        "move" => RawTouchEvent::Move {
            id: number(&mut fields, "move", "id")?,
            x: finite(&mut fields, "move", "x")?,
            y: finite(&mut fields, "move", "y")?,
            size: finite(&mut fields, "move", "size")?,
        },
        "up" => RawTouchEvent::Up {
            id: number(&mut fields, "up", "id")?,
        },
        "cancel" => RawTouchEvent::Cancel {
            id: number(&mut fields, "cancel", "id")?,
        },
        "mode" => {
            let name = fields.next().ok_or(TraceParseError::MissingField {
                record: "mode",
                field: "mode",
            })?;
            RawTouchEvent::SetMode(name.parse::<Mode>()?)
        }
        other => return Err(TraceParseError::UnknownRecord(other.to_string())),
    };

    let rest: Vec<&str> = fields.collect();
    if !rest.is_empty() {
        return Err(TraceParseError::TrailingInput(rest.join(" ")));
    }
    Ok(Some(event))
}

fn number<'a, T, I>(
    fields: &mut I,
    record: &'static str,
    field: &'static str,
) -> Result<T, TraceParseError>
where
    T: std::str::FromStr,
    I: Iterator<Item = &'a str>,
{
    let raw = fields
        .next()
        .ok_or(TraceParseError::MissingField { record, field })?;
    raw.parse().map_err(|_| TraceParseError::InvalidNumber {
        field,
        value: raw.to_string(),
    })
}

/// Like [`number`], but also rejects `inf` and `NaN`.
fn finite<'a, I>(fields: &mut I, record: &'static str, field: &'static str) -> Result<f32, TraceParseError>
where
    I: Iterator<Item = &'a str>,
{
    let value: f32 = number(fields, record, field)?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(TraceParseError::InvalidNumber {
            field,
            value: value.to_string(),
        })
    }
}

type TraceReader = Box<dyn BufRead + Send>;

/// [`InputSource`] that replays a touch trace on a dedicated thread.
pub struct TraceInputSource {
    name: String,
    reader: Mutex<Option<TraceReader>>,
    running: Arc<AtomicBool>,
}

impl TraceInputSource {
    /// Creates a source that replays `reader`; `name` is used in log output.
    pub fn from_reader<R>(name: impl Into<String>, reader: R) -> Self
    where
        R: BufRead + Send + 'static,
    {
        Self {
            name: name.into(),
            reader: Mutex::new(Some(Box::new(reader))),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Opens a trace file.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::OpenTrace`] if the file cannot be opened.
    pub fn open(path: &Path) -> Result<Self, CaptureError> {
        let file = File::open(path).map_err(|source| CaptureError::OpenTrace {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_reader(
            path.display().to_string(),
            BufReader::new(file),
        ))
    }

    /// Replays a trace piped on standard input.
    pub fn stdin() -> Self {
        Self::from_reader("<stdin>", BufReader::new(std::io::stdin()))
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }
}

impl InputSource for TraceInputSource {
    fn start(&self) -> Result<mpsc::Receiver<RawTouchEvent>, CaptureError> {
        let reader = self
            .reader
            .lock()
            .map_err(|_| CaptureError::AlreadyStarted)?
            .take()
            .ok_or(CaptureError::AlreadyStarted)?;

        let (tx, rx) = mpsc::channel();
        let running = Arc::clone(&self.running);
        let name = self.name.clone();
        running.store(true, Ordering::Relaxed);

        std::thread::Builder::new()
            .name("tapdeck-trace".to_string())
            .spawn(move || replay(&name, reader, &tx, &running))
            .map_err(|e| {
                self.running.store(false, Ordering::Relaxed);
                CaptureError::ThreadSpawn(e)
            })?;

        Ok(rx)
    }

    fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }
}

fn replay(
    name: &str,
    reader: TraceReader,
    tx: &mpsc::Sender<RawTouchEvent>,
    running: &AtomicBool,
) {
    info!(trace = name, "trace replay started");
    let mut sent = 0usize;

    for (index, line) in reader.lines().enumerate() {
        if !running.load(Ordering::Relaxed) {
            debug!(trace = name, "trace replay stopped");
            break;
        }
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!(trace = name, "trace read error: {e}");
                break;
            }
        };
        match parse_trace_line(&line) {
            Ok(Some(event)) => {
                if tx.send(event).is_err() {
                    debug!(trace = name, "receiver dropped; ending replay");
                    break;
                }
                sent += 1;
            }
            Ok(None) => {}
            Err(e) => warn!(trace = name, line = index + 1, "skipping malformed line: {e}"),
        }
    }

    running.store(false, Ordering::Relaxed);
    info!(trace = name, events = sent, "trace replay finished");
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse_down_record() {
        assert_eq!(
            parse_trace_line("down 2 150.5 400 42"),
            Ok(Some(RawTouchEvent::Down {
                id: 2,
                x: 150.5,
                y: 400.0,
                size: 42.0
            }))
        );
    }

    #[test]
    fn test_parse_ignores_comments_and_blank_lines() {
        assert_eq!(parse_trace_line(""), Ok(None));
        assert_eq!(parse_trace_line("   "), Ok(None));
        assert_eq!(parse_trace_line("# just a comment"), Ok(None));
        assert_eq!(parse_trace_line("up 7   # lift"), Ok(Some(RawTouchEvent::Up { id: 7 })));
    }

    #[test]
    fn test_parse_mode_record() {
        assert_eq!(
            parse_trace_line("mode absolute"),
            Ok(Some(RawTouchEvent::SetMode(Mode::Absolute)))
        );
        assert!(matches!(
            parse_trace_line("mode diagonal"),
            Err(TraceParseError::InvalidMode(_))
        ));
    }

    #[test]
    fn test_parse_resize_record() {
        assert_eq!(
            parse_trace_line("resize 1280 800"),
            Ok(Some(RawTouchEvent::Resize {
                width: 1280.0,
                height: 800.0
            }))
        );
    }

    #[test]
    fn test_parse_rejects_missing_field() {
        assert_eq!(
            parse_trace_line("move 1 10 20"),
            Err(TraceParseError::MissingField {
                record: "move",
                field: "size"
            })
        );
    }

    #[test]
    fn test_parse_rejects_bad_number() {
        assert_eq!(
            parse_trace_line("cancel one"),
            Err(TraceParseError::InvalidNumber {
                field: "id",
                value: "one".to_string()
            })
        );
    }

    #[test]
    fn test_parse_rejects_non_finite_coordinates_and_sizes() {
        assert!(matches!(
            parse_trace_line("down 1 inf 700 40"),
            Err(TraceParseError::InvalidNumber { field: "x", .. })
        ));
        assert!(matches!(
            parse_trace_line("move 1 500 -inf 40"),
            Err(TraceParseError::InvalidNumber { field: "y", .. })
        ));
        assert!(matches!(
            parse_trace_line("move 1 500 700 NaN"),
            Err(TraceParseError::InvalidNumber { field: "size", .. })
        ));
        assert!(matches!(
            parse_trace_line("resize inf 800"),
            Err(TraceParseError::InvalidNumber { field: "width", .. })
        ));
    }

    #[test]
    fn test_parse_rejects_unknown_record_and_trailing_input() {
        assert_eq!(
            parse_trace_line("tap 1 2"),
            Err(TraceParseError::UnknownRecord("tap".to_string()))
        );
        assert_eq!(
            parse_trace_line("up 1 2"),
            Err(TraceParseError::TrailingInput("2".to_string()))
        );
    }

    #[test]
    fn test_trace_source_replays_valid_lines_in_order_and_skips_bad_ones() {
        // Arrange
        let trace = "resize 1000 800\n\
                     down 1 150 400 40\n\
                     bogus line\n\
                     up 1\n";
        let source = TraceInputSource::from_reader("test", Cursor::new(trace));

        // Act
        let rx = source.start().expect("start should succeed");
        let events: Vec<RawTouchEvent> = rx.iter().collect();

        // Assert
        assert_eq!(
            events,
            vec![
                RawTouchEvent::Resize {
                    width: 1000.0,
                    height: 800.0
                },
                RawTouchEvent::Down {
                    id: 1,
                    x: 150.0,
                    y: 400.0,
                    size: 40.0
                },
                RawTouchEvent::Up { id: 1 },
            ]
        );
    }

    #[test]
    fn test_trace_source_cannot_start_twice() {
        let source = TraceInputSource::from_reader("test", Cursor::new(""));
        let _rx = source.start().expect("first start");
        assert!(matches!(source.start(), Err(CaptureError::AlreadyStarted)));
    }

    #[test]
    fn test_open_missing_file_reports_path() {
        let err = TraceInputSource::open(Path::new("/nonexistent/tapdeck/trace.txt"))
            .err()
            .expect("open must fail");
        assert!(matches!(err, CaptureError::OpenTrace { .. }));
        assert!(err.to_string().contains("trace.txt"));
    }
}
