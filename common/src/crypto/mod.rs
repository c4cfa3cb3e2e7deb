mod identity;
mod key;

pub mod error;

pub use error::IdentityError;
pub use identity::*;
pub use key::*;
