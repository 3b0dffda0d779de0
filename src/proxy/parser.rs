//! Proxy parser module for reading and writing proxy list files

use crate::proxy::models::Proxy;
use crate::Result;
use anyhow::{bail, Context};
use std::fs;
use std::path::Path;

/// Proxy parser for parsing records and loading/saving list files
pub struct ProxyParser;

impl ProxyParser {
    /// Parse a single proxy record.
    ///
    /// Supported format: `HOST:PORT:USER:PASS`. Everything after the third
    /// colon is the password, so passwords containing `:` survive intact.
    pub fn parse_record(line: &str) -> Result<Proxy> {
        let line = line.trim();
        let parts: Vec<&str> = line.split(':').collect();

        if parts.len() < 4 {
            bail!("invalid proxy format: {}", line);
        }

        let host = parts[0].to_string();
        let port: u16 = parts[1]
            .parse()
            .with_context(|| format!("invalid proxy port: {}", parts[1]))?;
        let username = parts[2].to_string();
        let password = parts[3..].join(":");

        Ok(Proxy::new(host, port, username, password))
    }

    /// Collect raw records from file content: one per non-empty line,
    /// trimmed, in input order. Malformed records are kept so they are
    /// counted and reported when vetted.
    pub fn parse_string(content: &str) -> Vec<String> {
        content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Load raw proxy records from a file
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read proxy list {}", path.display()))?;
        Ok(Self::parse_string(&content))
    }

    /// Save proxy records to a file, one per line, newline-terminated.
    /// Overwrites any previous content.
    pub fn save_to_file<P: AsRef<Path>>(records: &[String], path: P) -> Result<()> {
        let path = path.as_ref();
        let mut content = records.join("\n");
        if !content.is_empty() {
            content.push('\n');
        }
        fs::write(path, content)
            .with_context(|| format!("failed to write proxy list {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_record() {
        let proxy = ProxyParser::parse_record("192.168.1.1:1080:user:pass").unwrap();
        assert_eq!(proxy.host, "192.168.1.1");
        assert_eq!(proxy.port, 1080);
        assert_eq!(proxy.auth.username, "user");
        assert_eq!(proxy.auth.password, "pass");
    }

    #[test]
    fn test_parse_record_password_with_colons() {
        let proxy = ProxyParser::parse_record("192.168.1.1:1080:user:pa:ss:wd").unwrap();
        assert_eq!(proxy.auth.password, "pa:ss:wd");
        assert_eq!(proxy.to_record_string(), "192.168.1.1:1080:user:pa:ss:wd");
    }

    #[test]
    fn test_parse_record_trims_whitespace() {
        let proxy = ProxyParser::parse_record("  192.168.1.1:1080:user:pass\n").unwrap();
        assert_eq!(proxy.host, "192.168.1.1");
    }

    #[test]
    fn test_parse_record_too_few_fields() {
        let err = ProxyParser::parse_record("192.168.1.1:1080").unwrap_err();
        assert!(err.to_string().contains("invalid proxy format"));

        assert!(ProxyParser::parse_record("").is_err());
        assert!(ProxyParser::parse_record("192.168.1.1:1080:user").is_err());
    }

    #[test]
    fn test_parse_record_bad_port() {
        let err = ProxyParser::parse_record("192.168.1.1:abc:user:pass").unwrap_err();
        assert!(err.to_string().contains("invalid proxy port"));

        assert!(ProxyParser::parse_record("192.168.1.1:99999:user:pass").is_err());
    }

    #[test]
    fn test_parse_string_keeps_order_and_skips_blanks() {
        let content = "1.2.3.4:1080:u:p\n\n   \n5.6.7.8:1080:u:p\nnot-a-proxy\n";
        let records = ProxyParser::parse_string(content);
        assert_eq!(
            records,
            vec!["1.2.3.4:1080:u:p", "5.6.7.8:1080:u:p", "not-a-proxy"]
        );
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let records = vec![
            "1.2.3.4:1080:u:p".to_string(),
            "5.6.7.8:1080:u:p:q".to_string(),
        ];
        let path = std::env::temp_dir().join("clean_proxy_parser_test.txt");

        ProxyParser::save_to_file(&records, &path).unwrap();
        let loaded = ProxyParser::load_file(&path).unwrap();
        assert_eq!(loaded, records);

        // Overwrites prior content entirely
        let shorter = vec!["9.9.9.9:1080:u:p".to_string()];
        ProxyParser::save_to_file(&shorter, &path).unwrap();
        let loaded = ProxyParser::load_file(&path).unwrap();
        assert_eq!(loaded, shorter);

        std::fs::remove_file(&path).ok();
    }
}
