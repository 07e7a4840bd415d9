pub mod cli;
pub mod commands;
pub mod utils;

pub use cli::*;
pub use commands::*;
pub use utils::*;
