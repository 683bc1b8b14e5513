//! Error surface of the persist-immediately policy operations.
//!
//! # Invariants
//! - Persistence failures are carried unchanged inside `Repo`.
//! - Parse failures happen before any write is attempted.

use crate::repo::RepoError;
use crate::timestamp::TimestampParseError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type PublicationResult<T> = Result<T, PublicationError>;

#[derive(Debug)]
pub enum PublicationError {
    InvalidTimestamp(TimestampParseError),
    Repo(RepoError),
}

impl Display for PublicationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTimestamp(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for PublicationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidTimestamp(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<TimestampParseError> for PublicationError {
    fn from(value: TimestampParseError) -> Self {
        Self::InvalidTimestamp(value)
    }
}

impl From<RepoError> for PublicationError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}
