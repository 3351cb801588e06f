use thiserror::Error;

/// Failure of a read against the moderation backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("no response from server")]
    NetworkUnreachable,
    #[error("request timed out")]
    Timeout,
    #[error("server returned {status}: {message}")]
    ServerError { status: u16, message: String },
    #[error("server returned an empty response")]
    EmptyResponse,
    /// A 2xx body that does not match the expected shape.
    #[error("server returned an unreadable response: {0}")]
    MalformedResponse(String),
}

/// Failure of an approve/reject call, single or bulk.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("no response from server")]
    NetworkUnreachable,
    #[error("request timed out")]
    Timeout,
    #[error("server returned {status}: {message}")]
    ServerError { status: u16, message: String },
    #[error("nothing selected")]
    NoSelection,
    /// The request went out but its response could not be read.
    #[error("response lost: {0}")]
    ResponseLost(FetchError),
}

impl ActionError {
    /// Validation failures are warnings rather than errors.
    pub fn is_warning(&self) -> bool {
        matches!(self, Self::NoSelection)
    }
}

impl From<FetchError> for ActionError {
    fn from(value: FetchError) -> Self {
        match value {
            FetchError::NetworkUnreachable => Self::NetworkUnreachable,
            FetchError::Timeout => Self::Timeout,
            FetchError::ServerError { status, message } => Self::ServerError { status, message },
            FetchError::EmptyResponse => Self::ResponseLost(FetchError::EmptyResponse),
            FetchError::MalformedResponse(detail) => {
                Self::ResponseLost(FetchError::MalformedResponse(detail))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_errors_map_onto_action_errors() {
        assert_eq!(
            ActionError::from(FetchError::ServerError {
                status: 502,
                message: "Bad Gateway".into()
            }),
            ActionError::ServerError {
                status: 502,
                message: "Bad Gateway".into()
            }
        );
        assert_eq!(
            ActionError::from(FetchError::EmptyResponse),
            ActionError::ResponseLost(FetchError::EmptyResponse)
        );
        assert!(ActionError::NoSelection.is_warning());
        assert!(!ActionError::Timeout.is_warning());
    }

    #[test]
    fn server_error_display_includes_status_and_message() {
        let err = FetchError::ServerError {
            status: 403,
            message: "Forbidden".into(),
        };
        assert_eq!(err.to_string(), "server returned 403: Forbidden");
    }

    #[test]
    fn malformed_response_carries_the_parse_detail() {
        let err = FetchError::MalformedResponse("missing field `_id`".into());
        assert_eq!(
            err.to_string(),
            "server returned an unreadable response: missing field `_id`"
        );
        assert_eq!(
            ActionError::from(err.clone()),
            ActionError::ResponseLost(err)
        );
    }
}
