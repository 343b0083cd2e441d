pub mod config;
pub mod feed;
pub mod port;
pub mod serve;
