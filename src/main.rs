#[macro_use]
extern crate log;

mod cli;
mod config;
mod console;

fn main() -> anyhow::Result<()> {
    env_logger::init();
    cli::run()
}
