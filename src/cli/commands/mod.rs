//! Command implementations

mod init;
mod inspect;
mod match_study;

pub use init::init;
pub use inspect::inspect;
pub use match_study::match_study;
