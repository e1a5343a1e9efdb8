pub mod app;
pub mod competition;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod remote;
pub mod stats;
pub mod storage;
pub mod state;

pub use app::router;
pub use config::Config;
pub use remote::RemoteMirror;
pub use state::AppState;
pub use storage::{initialize_data, load_data, resolve_data_path};
