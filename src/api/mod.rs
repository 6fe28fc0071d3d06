pub mod error;
pub mod handlers;
pub mod identity_extractor;
pub mod routes;

pub use error::*;
pub use handlers::*;
pub use identity_extractor::*;
pub use routes::*;
