pub mod archive;
pub mod config;
pub mod error;
pub mod grading;
pub mod output;
pub mod parser;
pub mod reconcile;
pub mod record;
pub mod roster;
pub mod run;
pub mod source;
