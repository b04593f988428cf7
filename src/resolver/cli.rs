//! Vendor CLI output parsing for the SSH fallback path
//!
//! Pure text -> `{username -> IP}` extraction, one regex per vendor
//! output format, so the parsers are testable without an SSH stack.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use super::Vendor;
use super::tables::normalize_username;

/// Mikrotik `/ppp active print` rows:
/// ` 0 R joao.silva  pppoe  AA:BB:CC:DD:EE:FF  100.64.1.23 ...`
fn mikrotik_row() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^\s*\d+\s+(?:[A-Z]+\s+)?(\S+)\s+\S+\s+\S+\s+(\d{1,3}(?:\.\d{1,3}){3})")
            .expect("static regex")
    })
}

/// Cisco `show subscriber session all` rows:
/// `12  pp1  authen  Local-Term  joao.silva@isp  100.64.1.23 ...`
fn cisco_row() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^\s*\d+\s+\S+\s+\S+\s+\S+\s+(\S+)\s+(\d{1,3}(?:\.\d{1,3}){3})")
            .expect("static regex")
    })
}

/// Huawei `display access-user` rows:
/// `1001  joao.silva  GE1/0/1.100  100.64.1.23 ...`
fn huawei_row() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^\s*\d+\s+(\S+)\s+\S+\s+(\d{1,3}(?:\.\d{1,3}){3})").expect("static regex")
    })
}

/// Parses the vendor CLI session listing into `{username -> IP}`.
/// Usernames are normalized the same way as SNMP-discovered ones.
pub fn parse_cli_sessions(vendor: Vendor, output: &str) -> HashMap<String, String> {
    let re = match vendor {
        Vendor::Mikrotik | Vendor::Generic => mikrotik_row(),
        Vendor::Cisco => cisco_row(),
        Vendor::Huawei => huawei_row(),
    };

    let mut sessions = HashMap::new();
    for caps in re.captures_iter(output) {
        let username = normalize_username(&caps[1]);
        let ip = caps[2].to_string();
        sessions.entry(username).or_insert(ip);
    }
    sessions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mikrotik_active_print_rows() {
        let output = "\
Flags: R - radius
 #   NAME            SERVICE CALLER-ID          ADDRESS        UPTIME
 0 R joao.silva      pppoe   AA:BB:CC:DD:EE:01  100.64.1.23    1d2h3m
 1   maria.souza     pppoe   AA:BB:CC:DD:EE:02  100.64.1.24    5h1m
";
        let sessions = parse_cli_sessions(Vendor::Mikrotik, output);
        assert_eq!(sessions.get("joao.silva"), Some(&"100.64.1.23".to_string()));
        assert_eq!(sessions.get("maria.souza"), Some(&"100.64.1.24".to_string()));
        assert_eq!(sessions.len(), 2);
    }

    #[test]
    fn cisco_subscriber_session_rows() {
        let output = "\
Uniq ID  Interface  State   Service     Identifier       IP Address
12       pp1        authen  Local-Term  joao.silva@isp   100.64.9.1
13       pp2        authen  Local-Term  other.user@isp   100.64.9.2
";
        let sessions = parse_cli_sessions(Vendor::Cisco, output);
        assert_eq!(
            sessions.get("joao.silva@isp"),
            Some(&"100.64.9.1".to_string())
        );
        assert_eq!(sessions.len(), 2);
    }

    #[test]
    fn huawei_access_user_rows() {
        let output = "\
  UserID  Username      Interface     IP address    MAC
  1001    joao.silva    GE1/0/1.100   100.64.1.23   aabb-ccdd-ee01
  1002    ana.lima      GE1/0/1.101   100.64.1.29   aabb-ccdd-ee02
";
        let sessions = parse_cli_sessions(Vendor::Huawei, output);
        assert_eq!(sessions.get("ana.lima"), Some(&"100.64.1.29".to_string()));
    }

    #[test]
    fn garbage_output_parses_to_nothing() {
        let sessions = parse_cli_sessions(Vendor::Mikrotik, "bad command name\r\n");
        assert!(sessions.is_empty());
    }
}
