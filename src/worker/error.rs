use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request failed with status {0}")]
    Status(u16),

    #[error("No cached response for {0}")]
    CacheMiss(String),

    #[error("Page is not controlled by a cache worker")]
    NotControlled,

    #[error("Cache worker terminated")]
    WorkerGone,
}

impl From<reqwest::Error> for FetchError {
    fn from(error: reqwest::Error) -> Self {
        FetchError::Network(error.to_string())
    }
}
