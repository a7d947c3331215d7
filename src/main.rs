//! ccexport - Command-line tool for converting Cocos Creator scenes to JSON

use std::process::ExitCode;

use ccexport::cli;

fn main() -> ExitCode {
    cli::run()
}
