pub mod handlers;
pub mod relay;
pub mod server;
pub mod state;

pub use relay::{ChatRelay, RelayError, DEFAULT_SESSION_ID};
pub use server::{router, run_server};
pub use state::AppState;
