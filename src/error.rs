use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("could not open {port}: {source}")]
    Connection {
        port: String,
        #[source]
        source: serialport::Error,
    },

    #[error("invalid channel: {0}")]
    InvalidChannel(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("light engine connection is closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, Error>;
