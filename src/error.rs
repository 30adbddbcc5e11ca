use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("io: read/write on closed pipe")]
    ClosedPipe,

    #[error("failed spawning writer worker")]
    Spawn(#[source] io::Error),

    #[error("writer worker panicked")]
    WorkerPanicked,
}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::ClosedPipe => io::Error::new(io::ErrorKind::BrokenPipe, err),
            Error::Spawn(source) => source,
            Error::WorkerPanicked => io::Error::other(err),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
