//! CLI Adapter
//!
//! Command-line interface for the mint-sniper binary.
//! Uses clap derive macros for argument parsing.

mod commands;

pub use commands::{
    default_directive, init_logging, BuyCmd, CliApp, Command, PreviewCmd, RunCmd, SellCmd,
    TokensCmd,
};
