pub mod format;
pub mod jwt;
