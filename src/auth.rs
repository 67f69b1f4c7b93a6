//! Session-domain token models and access-token claims.

pub mod claims;
pub mod token;

pub use claims::*;
pub use token::{pair::*, secret::*};
