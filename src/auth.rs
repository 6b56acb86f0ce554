//! Auth-domain identifiers, claims, markers, and token models.

pub mod claims;
pub mod marker;
pub mod secret;
pub mod subject;
pub mod token;

pub use claims::*;
pub use marker::*;
pub use secret::*;
pub use subject::*;
pub use token::*;
