use std::io;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("not a readable archive: {0}")]
    Open(#[source] zip::result::ZipError),

    #[error("corrupted archive entry at index {index}: {source}")]
    Entry {
        index: usize,
        source: zip::result::ZipError,
    },

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
