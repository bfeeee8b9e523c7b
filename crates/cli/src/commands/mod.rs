//! Command handlers for the MyTherapy CLI.

pub mod advise;
pub mod index;
pub mod retrieve;

pub use advise::AdviseCommand;
pub use index::IndexCommand;
pub use retrieve::RetrieveCommand;
