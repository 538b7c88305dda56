mod assets;
mod claims;
pub mod dto;
pub mod response;
mod router;
mod signals;
pub mod validation;

pub use router::{AppState, create_router};
