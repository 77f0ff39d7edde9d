use std::borrow::Cow;
use std::collections::VecDeque;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard, Once, OnceLock, PoisonError};

use serde::{Deserialize, Serialize};
use tracing_subscriber::filter::{Directive, LevelFilter};
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::LOG_TARGET;

const DEFAULT_LEVEL: &str = "info";
const DEFAULT_BUFFER_LINES: usize = 2_000;

/// The `[logging]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// A bare level (`info`, `Warning`, ...) or any `EnvFilter` directive list.
    pub level: String,
    /// Format events as JSON objects.
    pub json: bool,
    /// Also write events to stderr.
    pub stderr: bool,
    /// Capacity of the in-memory [`LogBuffer`].
    pub buffer_lines: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LEVEL.to_owned(),
            json: false,
            stderr: true,
            buffer_lines: DEFAULT_BUFFER_LINES,
        }
    }
}

impl LoggingConfig {
    /// `level` as `EnvFilter` directives. Bare level names are matched without
    /// regard to case, and `warning`/`none` are accepted as aliases.
    pub(crate) fn level_directives(&self) -> Cow<'_, str> {
        let level = self.level.trim();
        if level.is_empty() {
            Cow::Borrowed(DEFAULT_LEVEL)
        } else if level.eq_ignore_ascii_case("warning") {
            Cow::Borrowed("warn")
        } else if level.eq_ignore_ascii_case("none") {
            Cow::Borrowed("off")
        } else if level.parse::<LevelFilter>().is_ok() {
            Cow::Owned(level.to_ascii_lowercase())
        } else {
            Cow::Borrowed(level)
        }
    }

    /// The filter described by `level`, extended with every directive in
    /// `RUST_LOG` that parses. Unparseable `level` text falls back to `info`.
    pub fn env_filter(&self) -> EnvFilter {
        let base = EnvFilter::try_new(self.level_directives())
            .unwrap_or_else(|_| EnvFilter::default().add_directive(LevelFilter::INFO.into()));

        let from_env = std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_default();
        from_env
            .split(',')
            .map(str::trim)
            .filter(|directive| !directive.is_empty())
            .filter_map(|directive| directive.parse::<Directive>().ok())
            .fold(base, EnvFilter::add_directive)
    }
}

/// Bounded in-memory history of formatted log lines, newest last.
#[derive(Debug)]
pub struct LogBuffer {
    capacity: usize,
    lines: Mutex<VecDeque<String>>,
}

impl LogBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            lines: Mutex::new(VecDeque::new()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn guard(&self) -> MutexGuard<'_, VecDeque<String>> {
        // Every mutation leaves the deque valid, so a poisoned lock is usable.
        self.lines.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn push_line(&self, line: String) {
        let mut lines = self.guard();
        lines.push_back(line);
        let excess = lines.len().saturating_sub(self.capacity);
        lines.drain(..excess);
    }

    /// Up to `n` of the newest lines, oldest first.
    pub fn last_lines(&self, n: usize) -> Vec<String> {
        let lines = self.guard();
        let skip = lines.len().saturating_sub(n);
        lines.range(skip..).cloned().collect()
    }

    /// A writer factory that appends formatted events to this buffer.
    pub fn make_writer(self: &Arc<Self>) -> LogCapture {
        LogCapture {
            buffer: Arc::clone(self),
        }
    }
}

/// [`MakeWriter`] that feeds a shared [`LogBuffer`].
#[derive(Clone, Debug)]
pub struct LogCapture {
    buffer: Arc<LogBuffer>,
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = LineSplitter;

    fn make_writer(&'a self) -> Self::Writer {
        LineSplitter {
            buffer: Arc::clone(&self.buffer),
            pending: Vec::new(),
        }
    }
}

/// Pushes each complete line as soon as it is written, and any unterminated
/// tail when dropped.
pub struct LineSplitter {
    buffer: Arc<LogBuffer>,
    pending: Vec<u8>,
}

impl LineSplitter {
    fn emit(&self, raw: &[u8]) {
        let text = String::from_utf8_lossy(raw);
        let line = text.trim_end_matches(|c: char| c == '\n' || c == '\r');
        if !line.is_empty() {
            self.buffer.push_line(line.to_owned());
        }
    }
}

impl Write for LineSplitter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pending.extend_from_slice(buf);
        while let Some(newline) = self.pending.iter().position(|byte| *byte == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=newline).collect();
            self.emit(&line);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for LineSplitter {
    fn drop(&mut self) {
        let tail = std::mem::take(&mut self.pending);
        self.emit(&tail);
    }
}

static INSTALLED: Once = Once::new();
static GLOBAL_LOG_BUFFER: OnceLock<Arc<LogBuffer>> = OnceLock::new();

fn shared_buffer(capacity: usize) -> Arc<LogBuffer> {
    Arc::clone(GLOBAL_LOG_BUFFER.get_or_init(|| Arc::new(LogBuffer::new(capacity))))
}

/// The buffer [`init_tracing`] writes to. Created with the default capacity if
/// tracing has not been initialized yet.
pub fn global_log_buffer() -> Arc<LogBuffer> {
    shared_buffer(DEFAULT_BUFFER_LINES)
}

/// Install the process-wide subscriber described by `config`.
///
/// Only the first call installs anything; later calls (and calls made after
/// another subscriber was set elsewhere) just return the shared buffer.
pub fn init_tracing(config: &LoggingConfig) -> Arc<LogBuffer> {
    let buffer = shared_buffer(config.buffer_lines);
    INSTALLED.call_once(|| install(config, &buffer));
    buffer
}

fn install(config: &LoggingConfig, buffer: &Arc<LogBuffer>) {
    let writer = if config.stderr {
        BoxMakeWriter::new(buffer.make_writer().and(io::stderr))
    } else {
        BoxMakeWriter::new(buffer.make_writer())
    };

    let format = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(writer);
    let layer: Box<dyn Layer<Registry> + Send + Sync> = if config.json {
        format.json().boxed()
    } else {
        format.boxed()
    };

    let installed = tracing_subscriber::registry()
        .with(layer)
        .with(config.env_filter())
        .try_init()
        .is_ok();
    if installed {
        tracing::debug!(
            target: LOG_TARGET,
            level = %config.level,
            json = config.json,
            stderr = config.stderr,
            "tracing initialized"
        );
    }
}
