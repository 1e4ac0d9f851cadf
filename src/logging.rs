//! Pretty-printing messages to the console

use colored::Colorize;

/// Pretty-print an error message to the console
pub fn error(message: String) {
    let error_title = "ERROR:".red().bold();
    eprintln!("{} {}", error_title, message);
}

/// Pretty-print a warning message to the console
pub fn warning(message: String) {
    let warning_title = "WARN:".yellow().bold();
    eprintln!("{} {}", warning_title, message);
}
