use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A request came back with a status outside `200..300`.
    #[error("Failed {client} request - {method} {path} {params:?} {body} -- {status}")]
    Api {
        client: String,
        method: String,
        path: String,
        params: Vec<(String, String)>,
        body: String,
        status: StatusCode,
    },
    #[error("{client} transport error: {source}")]
    Transport {
        client: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Trello {kind} '{identifier}' not found")]
    NotFound { kind: &'static str, identifier: String },
    /// Operator chose quit from a menu. Not a failure.
    #[error("quit requested")]
    Quit,
    #[error("standard input closed while waiting for an answer")]
    InputClosed,
    #[error("editor '{command}' exited with {status}")]
    Editor { command: String, status: String },
    #[error("invalid header value: {0}")]
    InvalidHeader(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    pub fn is_quit(&self) -> bool {
        matches!(self, Error::Quit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_message_carries_diagnostics() {
        let err = Error::Api {
            client: "GitHub".into(),
            method: "POST".into(),
            path: "repos/o/r/issues".into(),
            params: vec![("state".into(), "open".into())],
            body: "{\"title\":\"x\"}".into(),
            status: StatusCode::UNPROCESSABLE_ENTITY,
        };
        let msg = err.to_string();
        assert!(msg.contains("Failed GitHub request"));
        assert!(msg.contains("POST repos/o/r/issues"));
        assert!(msg.contains("state"));
        assert!(msg.contains("422"));
    }

    #[test]
    fn not_found_names_the_missing_resource() {
        let err = Error::NotFound {
            kind: "list",
            identifier: "Backlog".into(),
        };
        assert_eq!(err.to_string(), "Trello list 'Backlog' not found");
        assert!(!err.is_quit());
        assert!(Error::Quit.is_quit());
    }
}
