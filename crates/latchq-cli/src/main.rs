//! latchq CLI: the `latchq` command.

mod cli;
mod commands;
mod config;

use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Status {
            queue,
            output_root,
            json,
        } => commands::status::run(queue, output_root, json),

        Commands::Peek {
            queue,
            from,
            max,
            output_root,
            json,
        } => commands::peek::run(queue, from, max, output_root, json),

        Commands::Pick {
            root,
            kind,
            index,
            sort,
            on_out_of_range,
            include,
            exclude,
            extensions,
            max_list_items,
            json,
        } => commands::pick::run(commands::pick::Args {
            root,
            kind,
            index,
            sort,
            on_out_of_range,
            include,
            exclude,
            extensions,
            max_list_items,
            json,
        }),

        Commands::Serve { bind } => commands::serve::run(bind),
    }
}
