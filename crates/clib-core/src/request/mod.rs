//! Request frames and their parser.
//!
//! A request frame has the shape
//! `SOH task_id US extension US action STX data ETX`. The header markers and
//! the body markers are located positionally; each may be absent, in which
//! case the header runs from the start of the input and the body is empty.

use std::fmt;

use crate::control::{ETX, SOH, STX, US, is_control};
use crate::error::ParseError;

/// Number of fields in a request header.
const HEADER_FIELDS: usize = 3;

/// Correlation identifier of a request.
///
/// [`TaskId::SYNC`] asks for synchronous execution; any other value names a
/// background task whose result is collected by a later poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(i32);

impl TaskId {
    /// Sentinel requesting synchronous execution.
    pub const SYNC: Self = Self(-1);

    /// Wraps a raw identifier.
    #[must_use]
    pub const fn new(value: i32) -> Self {
        Self(value)
    }

    /// Returns the raw identifier.
    #[must_use]
    pub const fn get(self) -> i32 {
        self.0
    }

    /// Returns `true` for the synchronous sentinel.
    #[must_use]
    pub const fn is_sync(self) -> bool {
        self.0 == Self::SYNC.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One decoded unit of work.
///
/// # Example
///
/// ```
/// use clib_core::{Request, TaskId};
///
/// let request = Request::parse("\u{1}2\u{1f}MyExt\u{1f}MyAction\u{2}hello\u{3}")
///     .expect("frame parses");
/// assert_eq!(request.task_id(), TaskId::new(2));
/// assert_eq!(request.extension(), "MyExt");
/// assert_eq!(request.action(), "MyAction");
/// assert_eq!(request.data(), "hello");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    task_id: TaskId,
    extension: String,
    action: String,
    data: String,
}

impl Request {
    /// Builds a request from its parts.
    #[must_use]
    pub fn new(
        task_id: TaskId,
        extension: impl Into<String>,
        action: impl Into<String>,
        data: impl Into<String>,
    ) -> Self {
        Self {
            task_id,
            extension: extension.into(),
            action: action.into(),
            data: data.into(),
        }
    }

    /// Parses a complete request frame.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] when the input is empty, when the body
    /// markers are unbalanced or out of order, when the header holds fewer
    /// than three fields, or when the task id is not an integer.
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        if raw.is_empty() {
            return Err(ParseError::Empty);
        }

        let header_start = raw.find(SOH);
        let body_start = raw.find(STX);
        let body_end = raw.find(ETX);

        let body = match (body_start, body_end) {
            (Some(_), None) => return Err(ParseError::MissingBodyEnd),
            (Some(start), Some(end)) if end < start => {
                return Err(ParseError::BodyEndBeforeStart);
            }
            (Some(start), Some(end)) => raw.get(start + STX.len_utf8()..end).unwrap_or_default(),
            (None, _) => "",
        };

        let header = header_region(raw, header_start, body_start);
        let fields: Vec<&str> = header.splitn(HEADER_FIELDS, US).collect();
        let [id_field, extension, action] = fields.as_slice() else {
            return Err(ParseError::FieldCount {
                found: fields.len(),
            });
        };

        let task_id = id_field
            .trim()
            .parse::<i32>()
            .map(TaskId::new)
            .map_err(|_| ParseError::InvalidTaskId {
                value: (*id_field).to_owned(),
            })?;

        Ok(Self::new(task_id, extension.trim(), action.trim(), body))
    }

    /// Encodes the request as a wire frame.
    #[must_use]
    pub fn encode(&self) -> String {
        format!(
            "{SOH}{}{US}{}{US}{}{STX}{}{ETX}",
            self.task_id, self.extension, self.action, self.data
        )
    }

    /// Correlation identifier.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Name of the extension library to invoke.
    #[must_use]
    pub fn extension(&self) -> &str {
        self.extension.as_str()
    }

    /// Name of the exported action inside the extension.
    #[must_use]
    pub fn action(&self) -> &str {
        self.action.as_str()
    }

    /// Opaque payload passed verbatim to the action.
    #[must_use]
    pub fn data(&self) -> &str {
        self.data.as_str()
    }
}

/// Slices the header out of `raw`, dropping one trailing control character.
fn header_region(raw: &str, header_start: Option<usize>, body_start: Option<usize>) -> &str {
    let begin = header_start.map_or(0, |index| index + SOH.len_utf8());
    let end = body_start.unwrap_or(raw.len());
    let header = raw.get(begin..end).unwrap_or_default();
    match header.chars().next_back() {
        Some(last) if is_control(last) => header
            .get(..header.len() - last.len_utf8())
            .unwrap_or_default(),
        _ => header,
    }
}

#[cfg(test)]
mod tests;
