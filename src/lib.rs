// Library surface for headless/integration tests and reuse.
// The terminal front end lives in main.rs and ui/.
pub mod app_dirs;
pub mod audio;
pub mod difficulty;
pub mod error;
pub mod feedback;
pub mod game;
pub mod question;
pub mod runtime;
pub mod stats;
pub mod store;
pub mod timer;
