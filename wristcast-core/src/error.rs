use thiserror::Error;

/// Failure of a fetch cycle. Any stage error aborts the remaining stages and
/// surfaces exactly one of these to the caller; no partial payload is ever
/// sent to the device.
///
/// A reverse-geocode response without a usable locality is not an error:
/// [`crate::geocode::PlaceNameResolver::resolve`] returns `Ok(None)` and the
/// encoder substitutes a placeholder city name.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The positioning sensor failed or timed out.
    #[error("location sensor failed ({code}): {message}")]
    Location { code: i32, message: String },

    /// Fewer than two future sun events were found in the two-day window.
    #[error("fewer than two future sun events in the two-day window")]
    InsufficientSunData,

    /// The completeness predicate failed after all stages ran.
    #[error("forecast state is incomplete, refusing to build a payload")]
    IncompleteData,

    /// A trend series is shorter than the declared entry count. The device
    /// expects exactly `expected` values, so truncating short would corrupt
    /// the payload on the receiving end.
    #[error("trend holds {actual} entries but the payload declares {expected}")]
    IncompletePayload { expected: usize, actual: usize },

    /// The transport failed to deliver the payload to the paired device.
    #[error("payload delivery failed: {0}")]
    Delivery(String),

    /// A fetch cycle was requested while another one was still in flight.
    #[error("a fetch cycle is already in flight")]
    FetchInFlight,

    /// An HTTP request could not be sent or its body could not be read.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A service answered with a non-success status.
    #[error("{service} request failed with status {status}: {body}")]
    UnexpectedStatus {
        service: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },

    /// A response body did not match the expected shape.
    #[error("unexpected response: {0}")]
    Parse(String),
}

/// Keep service error bodies readable in logs. The cut must land on a char
/// boundary; error bodies are arbitrary text and may hold multibyte UTF-8.
pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}
