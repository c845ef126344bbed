use directories::ProjectDirs;
use log::LevelFilter;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

use crate::Result;

const LOG_FILE_NAME: &str = "volume-compression-resize.log";

/// Initialize the logger with file and console output
///
/// Console output goes to stderr; stdout carries the report.
///
/// # Arguments
///
/// * `verbose` - Enable debug level logging
/// * `quiet` - Suppress console output (logs still written to file)
///
/// # Platform-specific log locations
///
/// * **macOS**: `~/Library/Application Support/com.storage-tools.volume-compression-resize/volume-compression-resize.log`
/// * **Linux**: `~/.local/share/volume-compression-resize/volume-compression-resize.log`
/// * **Windows**: `C:\Users\<User>\AppData\Local\storage-tools\volume-compression-resize\data\volume-compression-resize.log`
///
pub fn init_logger(verbose: bool, quiet: bool) -> Result<()> {
    let log_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let log_path = log_path()?;

    // Open log file for writing
    let log_file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .map_err(|e| crate::ConfigError::InvalidValue(format!("Failed to open log file: {}", e)))?;

    let mut builder = env_logger::Builder::new();
    builder
        .filter_level(log_level)
        // reqwest/hyper chatter is only interesting when explicitly asked for
        .filter_module("hyper_util", LevelFilter::Warn)
        .filter_module("reqwest", LevelFilter::Warn)
        .format_timestamp_secs();

    if quiet {
        builder.target(env_logger::Target::Pipe(Box::new(log_file)));
    } else {
        struct MultiWriter {
            stderr: std::io::Stderr,
            file: fs::File,
        }

        impl Write for MultiWriter {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                self.stderr.write_all(buf)?;
                self.file.write_all(buf)?;
                Ok(buf.len())
            }

            fn flush(&mut self) -> std::io::Result<()> {
                self.stderr.flush()?;
                self.file.flush()?;
                Ok(())
            }
        }

        let multi_writer = MultiWriter {
            stderr: std::io::stderr(),
            file: log_file,
        };
        builder.target(env_logger::Target::Pipe(Box::new(multi_writer)));
    }

    builder.init();

    log::debug!("Logging to: {}", log_path.display());

    Ok(())
}

/// Platform data directory for the log file, or the current directory
fn log_path() -> Result<PathBuf> {
    if let Some(proj_dirs) =
        ProjectDirs::from("com", "storage-tools", "volume-compression-resize")
    {
        let log_dir = proj_dirs.data_local_dir();
        fs::create_dir_all(log_dir).map_err(|e| {
            crate::ConfigError::InvalidValue(format!("Failed to create log directory: {}", e))
        })?;
        Ok(log_dir.join(LOG_FILE_NAME))
    } else {
        // Fallback to current directory if ProjectDirs fails
        Ok(std::env::current_dir()
            .map_err(|e| {
                crate::ConfigError::InvalidValue(format!("Failed to get current directory: {}", e))
            })?
            .join(LOG_FILE_NAME))
    }
}
