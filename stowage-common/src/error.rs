// Copyright 2026 stowage Project Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::{
    backtrace::Backtrace,
    fmt::{Debug, Display},
    sync::Arc,
};

/// ErrorKind is all kinds of Error of stowage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// An index, count or capacity argument is outside of its valid range.
    OutOfRange,
    /// An argument or a value produced by a user supplied factory is invalid.
    InvalidArgument,
    /// The collection is empty.
    Empty,
    /// The collection cannot grow any further.
    CapacityOverflow,
    /// The collection was modified while a cursor was walking it.
    Modified,
    /// The owner-cache entry has been removed and cannot be mutated anymore.
    EntryRemoved,
    /// The owner-cache entry is already attached to a cache.
    AlreadyAttached,
    /// The current thread tried to enter a lock it already holds.
    Reentrant,
    /// An I/O error raised by the operating system, e.g. when spawning a background thread.
    Io,
}

impl ErrorKind {
    /// Convert self into static str.
    pub fn into_static(self) -> &'static str {
        self.into()
    }

    /// Returns `true` if the kind belongs to the invalid-operation family.
    ///
    /// Invalid-operation errors are raised because of the state of the target, not because of the arguments.
    pub fn is_invalid_operation(self) -> bool {
        !matches!(self, ErrorKind::OutOfRange | ErrorKind::InvalidArgument | ErrorKind::Io)
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.into_static())
    }
}

impl From<ErrorKind> for &'static str {
    fn from(v: ErrorKind) -> &'static str {
        match v {
            ErrorKind::OutOfRange => "Out of range",
            ErrorKind::InvalidArgument => "Invalid argument",
            ErrorKind::Empty => "Empty collection",
            ErrorKind::CapacityOverflow => "Capacity overflow",
            ErrorKind::Modified => "Collection modified",
            ErrorKind::EntryRemoved => "Entry removed",
            ErrorKind::AlreadyAttached => "Entry already attached",
            ErrorKind::Reentrant => "Re-entrant lock",
            ErrorKind::Io => "I/O error",
        }
    }
}

/// Error is the error struct returned by all stowage functions.
///
/// ## Display
///
/// - Via `Display`, the error is printed in a single line:
///
/// ```shell
/// Out of range, context: { index: 7, bound: 4 } => index out of range
/// ```
///
/// - Via `Debug`, the error is printed in multiple lines with the context and the backtrace (if captured).
///
/// - Via `{:#?}`, the error is printed as a conventional struct.
pub struct Error {
    kind: ErrorKind,
    message: String,

    context: Vec<(&'static str, String)>,

    backtrace: Option<Arc<Backtrace>>,
}

impl Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // If alternate has been specified, we will print like Debug.
        if f.alternate() {
            let mut de = f.debug_struct("Error");
            de.field("kind", &self.kind);
            de.field("message", &self.message);
            de.field("context", &self.context);
            de.field("backtrace", &self.backtrace);
            return de.finish();
        }

        write!(f, "{}", self.kind)?;
        if !self.message.is_empty() {
            write!(f, " => {}", self.message)?;
        }
        writeln!(f)?;

        if !self.context.is_empty() {
            writeln!(f)?;
            writeln!(f, "Context:")?;
            for (k, v) in self.context.iter() {
                writeln!(f, "  {}: {}", k, v)?;
            }
        }

        if let Some(backtrace) = &self.backtrace {
            writeln!(f)?;
            writeln!(f, "Backtrace:")?;
            writeln!(f, "{backtrace}")?;
        }

        Ok(())
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind)?;

        if !self.context.is_empty() {
            write!(f, ", context: {{ ")?;
            let mut iter = self.context.iter().peekable();
            while let Some((k, v)) = iter.next() {
                write!(f, "{}: {}", k, v)?;
                if iter.peek().is_some() {
                    write!(f, ", ")?;
                }
            }
            write!(f, " }}")?;
        }

        if !self.message.is_empty() {
            write!(f, " => {}", self.message)?;
        }

        Ok(())
    }
}

impl std::error::Error for Error {}

impl Clone for Error {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            context: self.context.clone(),
            backtrace: self.backtrace.clone(),
        }
    }
}

impl Error {
    /// Create a new error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            context: Vec::new(),
            backtrace: Some(Arc::new(Backtrace::capture())),
        }
    }

    /// Add more context in error.
    pub fn with_context(mut self, key: &'static str, value: impl ToString) -> Self {
        self.context.push((key, value.to_string()));
        self
    }

    /// Get the error kind.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Get the error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the error context.
    pub fn context(&self) -> &[(&'static str, String)] {
        &self.context
    }

    /// Get the value of the first context entry with the given key.
    pub fn context_value(&self, key: &str) -> Option<&str> {
        self.context.iter().find(|(k, _)| *k == key).map(|(_, v)| v.as_str())
    }

    /// Get the error backtrace.
    pub fn backtrace(&self) -> Option<&Backtrace> {
        self.backtrace.as_deref()
    }
}

/// Result type for stowage.
pub type Result<T> = std::result::Result<T, Error>;

/// Helper methods for Error.
impl Error {
    /// Helper for creating an [`ErrorKind::OutOfRange`] error carrying the attempted value and the valid bound.
    pub fn out_of_range(name: &'static str, value: usize, bound: usize) -> Self {
        Error::new(ErrorKind::OutOfRange, format!("{name} out of range"))
            .with_context(name, value)
            .with_context("bound", bound)
    }

    /// Helper for creating an [`ErrorKind::InvalidArgument`] error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Error::new(ErrorKind::InvalidArgument, message)
    }

    /// Helper for creating an [`ErrorKind::Empty`] error.
    pub fn empty() -> Self {
        Error::new(ErrorKind::Empty, "the collection is empty")
    }

    /// Helper for creating an [`ErrorKind::CapacityOverflow`] error with context.
    pub fn capacity_overflow(required: usize, maximum: usize) -> Self {
        Error::new(ErrorKind::CapacityOverflow, "capacity exceeds the maximum")
            .with_context("required", required)
            .with_context("maximum", maximum)
    }

    /// Helper for creating an [`ErrorKind::Modified`] error with context.
    pub fn modified(expected: u64, actual: u64) -> Self {
        Error::new(
            ErrorKind::Modified,
            "collection was modified; enumeration operation may not execute",
        )
        .with_context("expected_version", expected)
        .with_context("actual_version", actual)
    }

    /// Helper for creating an [`ErrorKind::EntryRemoved`] error.
    pub fn entry_removed(key: impl Debug) -> Self {
        Error::new(ErrorKind::EntryRemoved, "entry already removed").with_context("key", format!("{key:?}"))
    }

    /// Helper for creating an [`ErrorKind::AlreadyAttached`] error.
    pub fn already_attached(key: impl Debug) -> Self {
        Error::new(ErrorKind::AlreadyAttached, "entry already attached to a cache")
            .with_context("key", format!("{key:?}"))
    }

    /// Helper for creating an [`ErrorKind::Reentrant`] error.
    pub fn reentrant(lock: &'static str) -> Self {
        Error::new(ErrorKind::Reentrant, "the current thread already holds the lock").with_context("lock", lock)
    }

    /// Helper for creating an [`ErrorKind::Io`] error from [`std::io::Error`].
    pub fn io(err: std::io::Error) -> Self {
        Error::new(ErrorKind::Io, err.to_string()).with_context("io_kind", err.kind())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::io(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_send_sync_static<T: Send + Sync + 'static>() {}

    #[test]
    fn test_send_sync_static() {
        is_send_sync_static::<Error>();
    }

    #[test]
    fn test_error_display() {
        let err = Error::out_of_range("index", 7, 4);
        assert_eq!(
            "Out of range, context: { index: 7, bound: 4 } => index out of range",
            err.to_string()
        );
        assert_eq!(err.context_value("index"), Some("7"));
        assert_eq!(err.context_value("bound"), Some("4"));
        assert_eq!(err.context_value("missing"), None);
    }

    #[test]
    fn test_error_kind_family() {
        assert!(!ErrorKind::OutOfRange.is_invalid_operation());
        assert!(!ErrorKind::InvalidArgument.is_invalid_operation());
        assert!(ErrorKind::Empty.is_invalid_operation());
        assert!(ErrorKind::EntryRemoved.is_invalid_operation());
        assert!(ErrorKind::Reentrant.is_invalid_operation());
        assert!(!ErrorKind::Io.is_invalid_operation());
    }

    #[test]
    fn test_error_format() {
        let e = Error::capacity_overflow(10, 8).with_context("mode", "queue");

        println!("========== BEGIN DISPLAY FORMAT ==========");
        println!("{e}");
        println!("========== END DISPLAY FORMAT ==========");

        println!();

        println!("========== BEGIN DEBUG FORMAT ==========");
        println!("{e:?}");
        println!("========== END DEBUG FORMAT ==========");

        println!();

        println!("========== BEGIN DEBUG FORMAT (PRETTY) ==========");
        println!("{e:#?}");
        println!("========== END DEBUG FORMAT (PRETTY) ==========");

        assert_eq!(e.kind(), ErrorKind::CapacityOverflow);
        assert_eq!(e.context().len(), 3);
    }
}
