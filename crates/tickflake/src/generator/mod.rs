mod config;
mod flake;
mod interface;
mod status;

pub use config::*;
pub use flake::*;
pub use interface::*;
pub use status::*;
