use clap::Parser;

mod app;
mod build;
mod cli;
mod config;
mod errors;
mod sdk;
mod tasks;
mod util;

fn main() {
    let cli = crate::cli::Cli::parse();
    if let Err(err) = crate::app::run(cli) {
        crate::util::console::error(&format!("{err:#}"));
        std::process::exit(1);
    }
}
