use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{driver} driver requires a non-empty {field}")]
    MissingField {
        driver: &'static str,
        field: &'static str,
    },

    #[error("Unsupported notification driver: {0}")]
    UnsupportedDriver(String),

    #[error("Invalid cron expression '{expr}': {reason}")]
    InvalidCron { expr: String, reason: String },

    #[error("Rate limit exceeded for {service}")]
    RateLimited { service: &'static str },

    #[error("{service} reported a failure: {message}")]
    Service {
        service: &'static str,
        message: String,
    },

    #[error("{service} returned {status}: {body}")]
    Status {
        service: &'static str,
        status: StatusCode,
        body: String,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Maps a non-2xx response into `RateLimited` or `Status`, consuming the body.
    pub(crate) async fn from_response(service: &'static str, response: reqwest::Response) -> Self {
        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Error::RateLimited { service };
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("unknown error"));
        Error::Status {
            service,
            status,
            body,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
