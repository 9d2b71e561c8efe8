use raydb_application::error::{AppError, BError};
pub use raydb_core::{repositories::Error as RepoError, usecases::Error as ParameterError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    App(#[from] AppError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<ParameterError> for Error {
    fn from(err: ParameterError) -> Self {
        Self::App(err.into())
    }
}

impl From<RepoError> for Error {
    fn from(err: RepoError) -> Self {
        Self::App(err.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

const TRY_AGAIN: &str = "Something went wrong, please try again.";

impl Error {
    /// What the user who triggered the failure gets to read.
    pub fn reply(&self) -> String {
        match self {
            Error::App(AppError::Business(err)) => match err {
                BError::Parameter(ParameterError::Repo(_) | ParameterError::Index(_)) => {
                    TRY_AGAIN.to_string()
                }
                BError::Parameter(err) => err.to_string(),
                BError::Repo(RepoError::NotFound) => "Not found.".to_string(),
                BError::Repo(_) | BError::Internal(_) => TRY_AGAIN.to_string(),
            },
            Error::App(_) | Error::Other(_) => TRY_AGAIN.to_string(),
        }
    }

    /// Failures of the user's input, as opposed to failures
    /// of the system.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Error::App(AppError::Business(BError::Parameter(err)))
                if !matches!(err, ParameterError::Repo(_) | ParameterError::Index(_))
        )
    }
}
