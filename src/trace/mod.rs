pub mod engine;
pub mod enrich;
pub mod pending;
pub mod receiver;

pub use engine::*;
pub use enrich::*;
pub use pending::*;
pub use receiver::*;
