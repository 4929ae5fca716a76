pub mod compounder;
pub mod config;
pub mod reporter;
