mod model_error;
mod status;

pub use model_error::ModelError;
pub use status::Status;
