//! Trace output and error reporting.
//!
//! All inspector output flows through a [`Trace`], which couples a
//! caller-supplied [`Sink`] with the shared indent counter, the
//! consistency-check configuration, and per-table error/warning counters.
//! Errors are reported, not raised: nothing in the inspector unwinds on bad
//! table data.

use core::fmt;

use alloc::string::String;
use alloc::vec::Vec;

use crate::arch::ArchMask;

/// Width of the field-name column in trace output.
pub const FIELD_COLUMN_WIDTH: usize = 36;

/// Severity of a reported line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// An unspecified good outcome (e.g. a checksum that validates).
    Good,
    /// Standard trace output.
    Info,
    /// An unusual event happened.
    Warn,
    /// An unspecified bad outcome.
    Bad,
    /// A structure or array element heading.
    Item,
    /// The table is not conformant; carries an [`ErrorKind`].
    Error,
    /// An internal invariant is broken; aborts the current table only.
    Fatal,
}

/// Categories of errors that the inspector can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The byte-sum of an entire table is non-zero.
    Checksum,
    /// A field violates a spec-stated constraint.
    Value,
    /// A declared length is zero, overruns its buffer, or underflows the
    /// fixed header.
    Length,
    /// A descriptor table disagrees with the accumulated offset, or a
    /// required captured pointer is missing.
    Parse,
    /// A constraint spanning multiple structures was violated.
    Cross,
    /// An unspecified error.
    Generic,
}

/// Receiver for inspector output.
///
/// The sink is treated as a serial append log; the inspector emits exactly
/// one call per output line, in table order.
pub trait Sink {
    /// Receive one formatted line with its severity and error category.
    fn line(&mut self, severity: Severity, error: Option<ErrorKind>, text: &str);
}

/// A [`Sink`] that buffers every line, preserving severity tags.
///
/// Deterministic, so two identical parses produce identical buffers. Used
/// by the test suite and by callers that post-process the report.
#[derive(Default)]
pub struct BufferSink {
    lines: Vec<(Severity, Option<ErrorKind>, String)>,
}

impl BufferSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// All lines received so far.
    pub fn lines(&self) -> &[(Severity, Option<ErrorKind>, String)] {
        &self.lines
    }

    /// The buffered text, one line per emitted event.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for (_, _, line) in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        out
    }

    /// Lines reported with the given error kind.
    pub fn errors_of(&self, kind: ErrorKind) -> Vec<&str> {
        self.lines
            .iter()
            .filter(|(_, e, _)| *e == Some(kind))
            .map(|(_, _, s)| s.as_str())
            .collect()
    }
}

impl Sink for BufferSink {
    fn line(&mut self, severity: Severity, error: Option<ErrorKind>, text: &str) {
        self.lines.push((severity, error, String::from(text)));
    }
}

/// Inspector configuration.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// Enable per-field validators and cross-structure checks.
    pub consistency_check: bool,
    /// Suppress warnings and errors; forces consistency checks off.
    pub quiet: bool,
    /// The architectures the current build reports for. Structure types
    /// outside this set are flagged when instances are present.
    pub arch: ArchMask,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            consistency_check: true,
            quiet: false,
            arch: crate::arch::build_arch(),
        }
    }
}

/// Shared parsing state: sink, indent counter, configuration, counters.
///
/// The indent counter is raised by the generic parser on entry and restored
/// on every exit path; dispatchers never mutate it directly.
pub struct Trace<'s> {
    sink: &'s mut dyn Sink,
    config: Config,
    indent: u32,
    errors: u32,
    warnings: u32,
}

impl<'s> Trace<'s> {
    /// Create a trace writing to `sink`.
    pub fn new(sink: &'s mut dyn Sink, config: Config) -> Self {
        Self {
            sink,
            config,
            indent: 0,
            errors: 0,
            warnings: 0,
        }
    }

    /// Whether consistency checks are active. Quiet mode forces them off.
    pub fn consistency(&self) -> bool {
        self.config.consistency_check && !self.config.quiet
    }

    /// The architecture set structures are validated against.
    pub fn arch(&self) -> ArchMask {
        self.config.arch
    }

    /// Current indent depth in spaces.
    pub fn indent(&self) -> u32 {
        self.indent
    }

    pub(crate) fn push_indent(&mut self, by: u32) {
        self.indent += by;
    }

    pub(crate) fn pop_indent(&mut self, by: u32) {
        self.indent -= by;
    }

    /// Errors reported since the last [`Trace::reset_counters`].
    pub fn error_count(&self) -> u32 {
        self.errors
    }

    /// Warnings reported since the last [`Trace::reset_counters`].
    pub fn warning_count(&self) -> u32 {
        self.warnings
    }

    /// Reset the per-table error and warning counters.
    pub fn reset_counters(&mut self) {
        self.errors = 0;
        self.warnings = 0;
    }

    /// Emit one line at the given severity.
    ///
    /// In quiet mode `Warn`, `Bad`, `Error` and `Fatal` lines are counted
    /// but not forwarded to the sink.
    pub fn log(&mut self, severity: Severity, error: Option<ErrorKind>, args: fmt::Arguments<'_>) {
        match severity {
            Severity::Warn => self.warnings += 1,
            Severity::Error | Severity::Fatal => self.errors += 1,
            _ => {}
        }

        if self.config.quiet
            && matches!(
                severity,
                Severity::Warn | Severity::Bad | Severity::Error | Severity::Fatal
            )
        {
            return;
        }

        let mut text = String::new();
        let _ = fmt::write(&mut text, args);
        self.sink.line(severity, error, &text);
    }

    /// Emit a field line: indented name padded to the field column, then
    /// the rendered value.
    pub fn field_line(&mut self, indent: u32, name: &str, value: fmt::Arguments<'_>) {
        let pad = (self.indent + indent) as usize;
        self.log(
            Severity::Info,
            None,
            format_args!("{:pad$}{:<width$} : {}", "", name, value, width = FIELD_COLUMN_WIDTH),
        );
    }

    /// Emit an item heading at the given indent relative to the current one.
    pub fn item_line(&mut self, indent: u32, args: fmt::Arguments<'_>) {
        let pad = (self.indent + indent) as usize;
        self.log(Severity::Item, None, format_args!("{:pad$}{}", "", args));
    }
}

/// Log an `Info` line.
#[macro_export]
macro_rules! acpi_info {
    ($t:expr, $($arg:tt)*) => {
        $t.log($crate::Severity::Info, None, core::format_args!($($arg)*))
    };
}

/// Log a `Good` line.
#[macro_export]
macro_rules! acpi_good {
    ($t:expr, $($arg:tt)*) => {
        $t.log($crate::Severity::Good, None, core::format_args!($($arg)*))
    };
}

/// Log a `Warn` line and bump the warning counter.
#[macro_export]
macro_rules! acpi_warn {
    ($t:expr, $($arg:tt)*) => {
        $t.log($crate::Severity::Warn, None, core::format_args!($($arg)*))
    };
}

/// Log a `Bad` line.
#[macro_export]
macro_rules! acpi_bad {
    ($t:expr, $($arg:tt)*) => {
        $t.log($crate::Severity::Bad, None, core::format_args!($($arg)*))
    };
}

/// Log an error of the given [`ErrorKind`] and bump the error counter.
#[macro_export]
macro_rules! acpi_error {
    ($t:expr, $kind:expr, $($arg:tt)*) => {
        $t.log($crate::Severity::Error, Some($kind), core::format_args!($($arg)*))
    };
}

/// Log a `Fatal` line; the current table is abandoned by the caller.
#[macro_export]
macro_rules! acpi_fatal {
    ($t:expr, $($arg:tt)*) => {
        $t.log(
            $crate::Severity::Fatal,
            Some($crate::ErrorKind::Generic),
            core::format_args!($($arg)*),
        )
    };
}
