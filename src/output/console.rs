//! Console output utilities.

use console::style;

/// Print an info message.
pub fn print_info(message: &str) {
    println!("{} {}", style("INFO").cyan().bold(), message);
}

/// Print a success message.
pub fn print_success(message: &str) {
    println!("{} {}", style("OK").green().bold(), message);
}

/// Print a warning message.
pub fn print_warning(message: &str) {
    println!("{} {}", style("WARN").yellow().bold(), message);
}

/// Print an error message.
pub fn print_error(message: &str) {
    eprintln!("{} {}", style("ERROR").red().bold(), message);
}

/// Print the application banner.
pub fn print_banner() {
    let banner = r#"
╔═══════════════════════════════════════════════════════╗
║     DeviantArt Downloader                             ║
║     Incremental mirror of followed galleries          ║
╚═══════════════════════════════════════════════════════╝
"#;
    println!("{}", style(banner).cyan());
}

/// Print configuration summary.
pub fn print_config_summary(username: &str, save_dir: &str, ledger: &str, tagger: Option<&str>) {
    println!();
    println!("{}", style("Configuration:").bold());
    println!("  Account:   {}", username);
    println!("  Directory: {}", save_dir);
    println!("  Ledger:    {}", ledger);
    println!("  Tagger:    {}", tagger.unwrap_or("disabled"));
    println!();
}
