mod backend_errors;
mod storage_errors;
mod validation_errors;

pub use backend_errors::*;
pub use storage_errors::*;
pub use validation_errors::*;
