pub mod config;
pub mod forest;
pub mod run;
