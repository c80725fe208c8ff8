mod cli;
mod execute;

use clap::Parser;
use colored::Colorize;
use crate::cli::CLI;

fn main() {
    let cli = CLI::parse();
    if let Err(e) = execute::execute(cli) {
        eprintln!("{} {:#}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}
