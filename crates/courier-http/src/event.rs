//! Lifecycle events and their canonical ordering.

use std::fmt;
use std::sync::Arc;

use crate::error::HttpError;
use crate::response::Response;

/// Terminal result of a request: the final response, or the failure that
/// prevented one.
pub type Outcome = Result<Arc<Response>, Arc<HttpError>>;

/// Status class of a response (`"2XX"`, `"4XX"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusClass {
    Informational,
    Success,
    Redirection,
    ClientError,
    ServerError,
}

impl StatusClass {
    /// Class of `status`; `None` outside `100..600`.
    pub fn from_status(status: u16) -> Option<Self> {
        match status / 100 {
            1 => Some(Self::Informational),
            2 => Some(Self::Success),
            3 => Some(Self::Redirection),
            4 => Some(Self::ClientError),
            5 => Some(Self::ServerError),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Informational => "1XX",
            Self::Success => "2XX",
            Self::Redirection => "3XX",
            Self::ClientError => "4XX",
            Self::ServerError => "5XX",
        }
    }
}

impl fmt::Display for StatusClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An event observed on a [`crate::RequestHandle`].
#[derive(Debug, Clone)]
pub enum Event {
    /// Named by the exact status code of the final response.
    Status(Arc<Response>),
    /// Named by the status class of the final response.
    StatusClass(StatusClass, Arc<Response>),
    /// The final response is `2XX`.
    Success(Arc<Response>),
    /// The final response is not `2XX`.
    Fail(Arc<Response>),
    /// The request failed before a final response existed.
    Error(Arc<HttpError>),
    /// Always the last event.
    Complete(Outcome),
}

impl Event {
    /// Event name: `"404"`, `"4XX"`, `"success"`, `"fail"`, `"error"` or
    /// `"complete"`.
    pub fn name(&self) -> String {
        match self {
            Event::Status(response) => response.status.to_string(),
            Event::StatusClass(class, _) => class.as_str().to_string(),
            Event::Success(_) => "success".to_string(),
            Event::Fail(_) => "fail".to_string(),
            Event::Error(_) => "error".to_string(),
            Event::Complete(_) => "complete".to_string(),
        }
    }

    /// The response this event carries, if any.
    pub fn response(&self) -> Option<&Arc<Response>> {
        match self {
            Event::Status(response)
            | Event::StatusClass(_, response)
            | Event::Success(response)
            | Event::Fail(response)
            | Event::Complete(Ok(response)) => Some(response),
            Event::Error(_) | Event::Complete(Err(_)) => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Event::Complete(_))
    }
}

/// Events for a final response: status, class, success or fail, complete.
pub fn response_events(response: Response) -> Vec<Event> {
    let response = Arc::new(response);
    let mut events = Vec::with_capacity(4);
    events.push(Event::Status(Arc::clone(&response)));
    if let Some(class) = response.status_class() {
        events.push(Event::StatusClass(class, Arc::clone(&response)));
    }
    if response.is_success() {
        events.push(Event::Success(Arc::clone(&response)));
    } else {
        events.push(Event::Fail(Arc::clone(&response)));
    }
    events.push(Event::Complete(Ok(response)));
    events
}

/// Events for a failed request: error, then complete.
pub fn error_events(error: HttpError) -> Vec<Event> {
    let error = Arc::new(error);
    vec![Event::Error(Arc::clone(&error)), Event::Complete(Err(error))]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::Decoded;
    use crate::headers::Headers;
    use crate::response::Body;
    use bytes::Bytes;
    use pretty_assertions::assert_eq;
    use url::Url;

    fn response(status: u16) -> Response {
        Response {
            status,
            headers: Headers::new(),
            url: Url::parse("http://localhost/").unwrap(),
            redirects: 0,
            raw: Bytes::new(),
            decoded: Decoded::Text(String::new()),
            body: Body::Raw(Decoded::Text(String::new())),
            parse_error: None,
        }
    }

    fn names(events: &[Event]) -> Vec<String> {
        events.iter().map(Event::name).collect()
    }

    #[test]
    fn test_not_found_sequence() {
        assert_eq!(names(&response_events(response(404))), ["404", "4XX", "fail", "complete"]);
    }

    #[test]
    fn test_success_sequence() {
        let events = response_events(response(201));
        assert_eq!(names(&events), ["201", "2XX", "success", "complete"]);
        assert!(matches!(events.last(), Some(Event::Complete(Ok(r))) if r.status == 201));
    }

    #[test]
    fn test_status_events_carry_response() {
        let events = response_events(response(404));
        let Event::Status(status) = &events[0] else {
            panic!("expected status event");
        };
        assert_eq!(status.status, 404);
        assert!(matches!(&events[1], Event::StatusClass(StatusClass::ClientError, r) if Arc::ptr_eq(r, status)));
        assert!(events.iter().all(|e| e.response().is_some_and(|r| Arc::ptr_eq(r, status))));
    }

    #[test]
    fn test_unclassified_status_skips_class_event() {
        assert_eq!(names(&response_events(response(799))), ["799", "fail", "complete"]);
    }

    #[test]
    fn test_error_sequence() {
        let events = error_events(HttpError::Aborted);
        assert_eq!(names(&events), ["error", "complete"]);
        assert!(events.iter().all(|e| e.response().is_none()));
        assert!(matches!(&events[1], Event::Complete(Err(e)) if matches!(**e, HttpError::Aborted)));
    }
}
