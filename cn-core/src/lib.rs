pub mod canonical_json;
pub mod command_policy;
pub mod errors;
pub mod ids;
pub mod path_policy;
pub mod types;

pub use canonical_json::*;
pub use command_policy::*;
pub use errors::*;
pub use ids::*;
pub use path_policy::*;
pub use types::*;