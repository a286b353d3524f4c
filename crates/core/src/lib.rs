#![deny(warnings)]

pub mod aggregate;
pub mod audio;
pub mod config;
pub mod emotion;
pub mod pipeline;
pub mod report;
pub mod runtime;
pub mod session;
pub mod stress;
pub mod text;
pub mod transcribe;
pub mod util;
