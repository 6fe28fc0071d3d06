pub mod authorize;
pub mod cluster;
pub mod common;
pub mod deploy;
pub mod devtool;
pub mod identity;
pub mod kind;
pub mod meta;
pub mod resource;
pub mod scale;
pub mod security;

pub use authorize::*;
pub use cluster::*;
pub use common::*;
pub use deploy::*;
pub use devtool::*;
pub use identity::*;
pub use kind::*;
pub use meta::*;
pub use resource::*;
pub use scale::*;
pub use security::*;
