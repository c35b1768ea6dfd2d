use std::io;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("credential not resolvable: {0}")]
    Credential(String),

    #[error("blob store request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("blob store returned status {status} for '{locator}'")]
    Status { status: u16, locator: String },

    #[error("local file I/O: {0}")]
    Io(#[from] io::Error),
}
