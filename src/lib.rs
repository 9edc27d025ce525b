pub mod batch;
pub mod capabilities;
pub mod cli;
pub mod config;
pub mod credentials;
pub mod device;
pub mod error;
pub mod flow;
pub mod locator;
pub mod report;
pub mod session;
pub mod util;
