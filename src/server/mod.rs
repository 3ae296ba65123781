mod handlers;
mod models;
mod process;
mod state;
mod util;

pub use handlers::run_server;
