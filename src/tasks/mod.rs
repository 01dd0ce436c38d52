pub mod engagement;
pub mod monitor;
pub mod summary;
