mod flake;
mod layout;

pub use flake::*;
pub use layout::*;
