// Human-readable error messages for volley

use std::fmt;
use std::io::IsTerminal;
use std::path::PathBuf;

use colored::*;

/// Initialize color output based on TTY detection and NO_COLOR environment variable
fn should_use_colors() -> bool {
    // Check NO_COLOR environment variable first (https://no-color.org/)
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    // Check if stderr is a TTY (errors are typically written to stderr)
    std::io::stderr().is_terminal()
}

/// Fatal errors reported by the volley binary
#[derive(Debug)]
pub enum VolleyError {
    /// I/O errors
    Io {
        message: String,
        path: Option<PathBuf>,
    },

    /// Host list file problems
    HostFile {
        message: String,
        line: Option<usize>,
        suggestion: Option<String>,
    },

    /// Bad or missing configuration
    Config {
        message: String,
        suggestion: Option<String>,
    },
}

impl std::error::Error for VolleyError {}

impl fmt::Display for VolleyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Set color mode based on TTY detection and NO_COLOR
        let use_colors = should_use_colors();
        if !use_colors {
            colored::control::set_override(false);
        }

        match self {
            VolleyError::Io { message, path } => {
                writeln!(f, "{}: {}", "I/O ERROR".red().bold(), message)?;
                if let Some(path) = path {
                    writeln!(f, "  {} {}", "Path:".dimmed(), path.display())?;
                }
                Ok(())
            }

            VolleyError::HostFile {
                message,
                line,
                suggestion,
            } => {
                writeln!(f, "{}: {}", "HOST FILE ERROR".red().bold(), message)?;
                if let Some(line) = line {
                    writeln!(f, "  {} {}", "Line:".dimmed(), line)?;
                }

                if let Some(suggestion) = suggestion {
                    writeln!(f)?;
                    writeln!(f, "{}: {}", "Hint".yellow().bold(), suggestion)?;
                }

                Ok(())
            }

            VolleyError::Config {
                message,
                suggestion,
            } => {
                writeln!(f, "{}: {}", "CONFIG ERROR".red().bold(), message)?;

                if let Some(suggestion) = suggestion {
                    writeln!(f)?;
                    writeln!(f, "{}: {}", "Hint".yellow().bold(), suggestion)?;
                }

                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_file_error_display() {
        let err = VolleyError::HostFile {
            message: "Invalid port 'abc' in host entry 'web-01:abc'".to_string(),
            line: Some(3),
            suggestion: Some("Use host, user@host, host:port, or user@host:port".to_string()),
        };

        let output = format!("{}", err);
        // Strip ANSI codes for comparison
        let clean_output = console::strip_ansi_codes(&output);

        assert!(clean_output.contains("Invalid port 'abc'"));
        assert!(clean_output.contains("Line: 3"));
        assert!(clean_output.contains("user@host:port"));
    }

    #[test]
    fn test_io_error_display_includes_path() {
        let err = VolleyError::Io {
            message: "Failed to read hosts file: No such file or directory".to_string(),
            path: Some(PathBuf::from("/etc/volley/hosts")),
        };

        let output = format!("{}", err);
        let clean_output = console::strip_ansi_codes(&output);

        assert!(clean_output.contains("I/O ERROR"));
        assert!(clean_output.contains("/etc/volley/hosts"));
    }
}
