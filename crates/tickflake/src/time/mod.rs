mod interface;
mod mono_clock;
mod source;
mod system;

pub use interface::*;
pub use mono_clock::*;
pub use source::*;
pub use system::*;
