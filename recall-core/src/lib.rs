pub mod collection;
pub mod errors;
pub mod models;
pub mod queue;
pub mod repo;
pub mod scheduler;
pub mod session;
pub mod stats;

pub use collection::*;
pub use errors::*;
pub use models::*;
pub use queue::*;
pub use repo::*;
pub use scheduler::*;
pub use session::*;
pub use stats::*;
