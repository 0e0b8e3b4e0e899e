pub mod models;
pub mod weather;
