pub mod config;
pub mod models;
pub mod notices;
pub mod notifications;
pub mod services;
pub mod session;
pub mod startup;
pub mod utils;

pub use startup::Console;
