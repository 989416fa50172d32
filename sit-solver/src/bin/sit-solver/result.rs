use sit_solver::ModelError;
use thiserror::Error;

use crate::model_file::ModelFileError;

pub(crate) type SitResult<T> = Result<T, SitError>;

#[derive(Error, Debug)]
pub(crate) enum SitError {
    #[error("IO error, more details: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid model file, more details: {0}")]
    InvalidModel(#[from] ModelFileError),
    #[error("The model could not be optimised, more details: {0}")]
    Model(#[from] ModelError),
}
