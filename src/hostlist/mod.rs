// Host list loading for volley

use std::path::Path;

use crate::output::errors::VolleyError;

/// A single target host parsed from the hosts file
///
/// Unset fields fall back to the global CLI defaults when the task list
/// is assembled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Host {
    pub name: String,
    pub user: Option<String>,
    pub port: Option<u16>,
}

impl Host {
    pub fn new(name: impl Into<String>) -> Self {
        Host {
            name: name.into(),
            user: None,
            port: None,
        }
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }
}

/// Read and parse a hosts file
pub fn load_host_file(path: &Path) -> Result<Vec<Host>, VolleyError> {
    let content = std::fs::read_to_string(path).map_err(|e| VolleyError::Io {
        message: format!("Failed to read hosts file: {}", e),
        path: Some(path.to_path_buf()),
    })?;

    parse_hosts(&content)
}

/// Parse host list content
///
/// One entry per line. Blank lines and `#` comments are skipped. An entry
/// is `host`, `user@host`, `host:port`, or `user@host:port`. Duplicates
/// are kept in file order.
pub fn parse_hosts(content: &str) -> Result<Vec<Host>, VolleyError> {
    let mut hosts = Vec::new();

    for (index, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (user, rest) = match line.split_once('@') {
            Some((user, rest)) => (Some(user), rest),
            None => (None, line),
        };

        // A single colon separates an explicit port; more than one means
        // an IPv6 literal, which passes through as the bare name.
        let (name, port_str) = if rest.matches(':').count() == 1 {
            match rest.split_once(':') {
                Some((name, port)) => (name, Some(port)),
                None => (rest, None),
            }
        } else {
            (rest, None)
        };

        if name.is_empty() {
            return Err(VolleyError::HostFile {
                message: format!("Missing hostname in entry '{}'", line),
                line: Some(index + 1),
                suggestion: Some("Use host, user@host, host:port, or user@host:port".to_string()),
            });
        }

        let port = match port_str {
            Some(port) => Some(
                port.parse::<u16>()
                    .ok()
                    .filter(|p| *p != 0)
                    .ok_or_else(|| VolleyError::HostFile {
                        message: format!("Invalid port '{}' in host entry '{}'", port, line),
                        line: Some(index + 1),
                        suggestion: Some("Ports must be numbers between 1 and 65535".to_string()),
                    })?,
            ),
            None => None,
        };

        let mut host = Host::new(name);
        if let Some(user) = user.filter(|u| !u.is_empty()) {
            host = host.with_user(user);
        }
        if let Some(port) = port {
            host = host.with_port(port);
        }

        hosts.push(host);
    }

    Ok(hosts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_skips_comments_and_blanks() {
        let content = "a.example.com\nbob@b.example.com\n# maintenance window\n\n";
        let hosts = parse_hosts(content).unwrap();

        assert_eq!(
            hosts,
            vec![
                Host::new("a.example.com"),
                Host::new("b.example.com").with_user("bob"),
            ]
        );
    }

    #[test]
    fn test_parse_port_forms() {
        let hosts = parse_hosts("web-01:2222\nalice@web-02:2200\n").unwrap();

        assert_eq!(
            hosts,
            vec![
                Host::new("web-01").with_port(2222),
                Host::new("web-02").with_user("alice").with_port(2200),
            ]
        );
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let hosts = parse_hosts("  web-01  \n\tcarol@web-02\n").unwrap();

        assert_eq!(hosts[0], Host::new("web-01"));
        assert_eq!(hosts[1], Host::new("web-02").with_user("carol"));
    }

    #[test]
    fn test_parse_invalid_port_reports_line() {
        let err = parse_hosts("ok.example.com\nweb-01:notaport\n").unwrap_err();

        match err {
            VolleyError::HostFile { line, message, .. } => {
                assert_eq!(line, Some(2));
                assert!(message.contains("notaport"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_port_zero() {
        let err = parse_hosts("web-01:0\n").unwrap_err();

        match err {
            VolleyError::HostFile { line, message, .. } => {
                assert_eq!(line, Some(1));
                assert!(message.contains("'0'"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_parse_empty_user_falls_back() {
        // "@host" carries no usable user part
        let hosts = parse_hosts("@web-01\n").unwrap();
        assert_eq!(hosts, vec![Host::new("web-01")]);
    }

    #[test]
    fn test_parse_ipv6_literal_is_not_a_port() {
        let hosts = parse_hosts("fe80::1\n").unwrap();
        assert_eq!(hosts, vec![Host::new("fe80::1")]);
    }

    #[test]
    fn test_parse_keeps_duplicates_in_order() {
        let hosts = parse_hosts("web-01\nweb-02\nweb-01\n").unwrap();

        let names: Vec<&str> = hosts.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["web-01", "web-02", "web-01"]);
    }

    #[test]
    fn test_parse_missing_hostname() {
        let err = parse_hosts("bob@:22\n").unwrap_err();
        assert!(matches!(err, VolleyError::HostFile { line: Some(1), .. }));
    }

    #[test]
    fn test_load_host_file_missing_is_io_error() {
        let err = load_host_file(Path::new("/nonexistent/hosts.txt")).unwrap_err();
        assert!(matches!(err, VolleyError::Io { .. }));
    }
}
