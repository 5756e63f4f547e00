pub mod health;
pub mod routes;
pub mod stream;

pub use health::SessionMetrics;
pub use routes::{router, ApiState};
