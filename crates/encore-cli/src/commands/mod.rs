pub mod analyze;
pub mod config;
pub mod fetch;
pub mod playlist;
pub mod process;
pub mod status;

pub use analyze::run_analyze;
pub use fetch::run_fetch;
pub use playlist::show_playlist;
pub use process::run_process;
pub use status::show_status;
