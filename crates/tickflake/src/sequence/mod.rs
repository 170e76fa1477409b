mod atomic;
mod counter;
mod gate;
mod interface;
mod lock;
mod mutex;
#[cfg(test)]
mod tests;

pub use atomic::*;
pub use counter::*;
pub use gate::*;
pub use interface::*;
pub use lock::*;
pub(crate) use mutex::Mutex;
