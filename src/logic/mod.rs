pub mod assembler;
pub mod describe;
pub mod registry;
pub mod resolve;
pub mod scaling;
pub mod validate;

pub use assembler::*;
pub use describe::*;
pub use registry::*;
pub use resolve::*;
pub use scaling::*;
pub use validate::*;
