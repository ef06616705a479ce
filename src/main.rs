use crate::cli::run;

pub mod catalog;
pub mod cli;
mod config;
pub mod domain;
pub mod http;
pub mod ranking;
pub mod storage;

fn main() -> anyhow::Result<()> {
    run()
}
