pub mod archiver;
pub mod audit;
pub mod config;
pub mod layout;
pub mod orchestrator;
pub mod paths;
pub mod scanner;
pub mod writer;
