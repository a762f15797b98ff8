pub mod human;
pub mod logging;
