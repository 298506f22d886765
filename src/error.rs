//! Errors surfaced by fallible allocation.

use std::collections::TryReserveError;
use std::error;
use std::fmt;
use std::result;

#[derive(Debug)]
pub enum Error {
    AllocationFailed(TryReserveError),
}

impl From<TryReserveError> for Error {
    fn from(err: TryReserveError) -> Error {
        Error::AllocationFailed(err)
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::AllocationFailed(error) => Some(error),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::AllocationFailed(error) => write!(f, "allocation failed: {}", error),
        }
    }
}

pub type Result<T> = result::Result<T, Error>;
