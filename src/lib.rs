pub mod cli;
pub mod config;
pub mod pki;
pub mod sensor;
pub mod telemetry;
