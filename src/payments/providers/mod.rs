pub mod versell;

pub use versell::VersellProvider;
