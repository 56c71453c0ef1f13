//! Output module for console output and progress.
//!
//! Provides:
//! - Colored console output
//! - Log file sink
//! - Download progress bars
//! - Statistics reporting

pub mod console;
pub mod logging;
pub mod progress;
pub mod stats;

pub use self::console::{
    print_banner, print_config_summary, print_error, print_info, print_success, print_warning,
};
pub use logging::log_file_writer;
pub use progress::create_download_bar;
pub use stats::{print_creator_stats, print_global_stats};
