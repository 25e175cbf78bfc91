//! `acpi-inspect` --- a standalone, `no_std` ACPI table inspector.
//!
//! This crate decodes a contiguous in-memory image of a single ACPI table,
//! cross-validates the structural invariants stated in the ACPI 6.3
//! specification, and emits a human-readable, indented trace plus a
//! structured error report through a caller-supplied [`Sink`].
//!
//! Parsing is table-driven: each ACPI table is described by arrays of
//! [`FieldDescriptor`]s giving the name, length, offset and formatting of
//! every packed field, and a per-table [`StructDatabase`] mapping
//! sub-structure type tags to handlers. The engine walks these descriptions
//! with bounds safety; a malformed table produces error lines, never a
//! panic.
//!
//! # Usage
//!
//! ```ignore
//! let mut sink = BufferSink::new();
//! let mut trace = Trace::new(&mut sink, Config::default());
//! tables::parse_table(&mut trace, true, &table_bytes, revision);
//! ```

#![no_std]
#![warn(missing_docs)]

extern crate alloc;

pub mod arch;
pub mod bytes;
pub mod cross;
pub mod parser;
pub mod structdb;
pub mod tables;
pub mod trace;

pub use arch::ArchMask;
pub use cross::{CrossEntry, CrossList};
pub use parser::{Captures, FieldDescriptor, FieldFormat, HeaderInfo, Slot};
pub use structdb::{StructDatabase, StructHandler, StructInfo};
pub use trace::{BufferSink, Config, ErrorKind, Severity, Sink, Trace};
