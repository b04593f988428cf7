//! Versioned SNMP session construction
//!
//! Maps a credential profile onto a v1, v2c or v3 `snmp2` session. The
//! v3 path translates named security levels and algorithm names to
//! protocol constants; unknown names degrade to "none" rather than
//! failing the session.

use anyhow::{Context, Result};
use snmp2::{AsyncSession, v3};

use crate::models::SnmpProfile;

/// Named v3 security level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityLevel {
    NoAuthNoPriv,
    AuthNoPriv,
    AuthPriv,
}

/// Maps a named security level; unknown names default to no auth
pub fn map_security_level(name: Option<&str>) -> SecurityLevel {
    match name.map(str::trim) {
        Some("authPriv") => SecurityLevel::AuthPriv,
        Some("authNoPriv") => SecurityLevel::AuthNoPriv,
        _ => SecurityLevel::NoAuthNoPriv,
    }
}

/// Maps a named auth algorithm; unknown names mean "no auth"
pub fn map_auth_protocol(name: Option<&str>) -> Option<v3::AuthProtocol> {
    match name.map(|n| n.trim().to_ascii_uppercase()).as_deref() {
        Some("MD5") => Some(v3::AuthProtocol::Md5),
        Some("SHA") => Some(v3::AuthProtocol::Sha1),
        _ => None,
    }
}

/// Maps a named privacy algorithm; unknown names mean "no privacy"
pub fn map_priv_protocol(name: Option<&str>) -> Option<v3::Cipher> {
    match name.map(|n| n.trim().to_ascii_uppercase()).as_deref() {
        Some("DES") => Some(v3::Cipher::Des),
        Some("AES") => Some(v3::Cipher::Aes128),
        _ => None,
    }
}

/// Builds the agent socket address from the profile port
fn agent_addr(target_ip: &str, profile: &SnmpProfile) -> String {
    format!("{}:{}", target_ip, profile.port)
}

/// Creates a session for the profile's SNMP version.
///
/// v1/v2c use the community string ("public" when absent); v3 builds a
/// user-security session from the profile's level and algorithms.
pub async fn create_session(target_ip: &str, profile: &SnmpProfile) -> Result<AsyncSession> {
    let addr = agent_addr(target_ip, profile);
    let community = profile.community.as_deref().unwrap_or("public");

    match profile.version.trim() {
        "1" => AsyncSession::new_v1(addr.as_str(), community.as_bytes(), 0)
            .await
            .with_context(|| format!("SNMPv1 session to {} failed", addr)),
        "3" => {
            let security = build_v3_security(profile)?;
            AsyncSession::new_v3(addr.as_str(), 0, security)
                .await
                .with_context(|| format!("SNMPv3 session to {} failed", addr))
        }
        // "2c" and anything else fall through to v2c
        _ => AsyncSession::new_v2c(addr.as_str(), community.as_bytes(), 0)
            .await
            .with_context(|| format!("SNMPv2c session to {} failed", addr)),
    }
}

fn build_v3_security(profile: &SnmpProfile) -> Result<v3::Security> {
    let username = profile
        .username
        .as_deref()
        .context("SNMPv3 profile without a username")?;

    let level = map_security_level(profile.security_level.as_deref());
    let auth_password = profile.auth_password.as_deref().unwrap_or("");
    let mut security = v3::Security::new(username.as_bytes(), auth_password.as_bytes());

    if level != SecurityLevel::NoAuthNoPriv
        && let Some(auth) = map_auth_protocol(profile.auth_algorithm.as_deref())
    {
        security = security.with_auth_protocol(auth);
    }

    if level == SecurityLevel::AuthPriv
        && let Some(privacy) = map_priv_protocol(profile.priv_algorithm.as_deref())
    {
        let priv_password = profile.priv_password.as_deref().unwrap_or("");
        security = security.with_auth(v3::Auth::AuthPriv {
            cipher: privacy,
            privacy_password: priv_password.as_bytes().to_vec(),
        });
    }

    Ok(security)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn security_level_names() {
        assert_eq!(
            map_security_level(Some("authPriv")),
            SecurityLevel::AuthPriv
        );
        assert_eq!(
            map_security_level(Some("authNoPriv")),
            SecurityLevel::AuthNoPriv
        );
        assert_eq!(
            map_security_level(Some("noAuthNoPriv")),
            SecurityLevel::NoAuthNoPriv
        );
        // Unknown names default to none
        assert_eq!(
            map_security_level(Some("superSecure")),
            SecurityLevel::NoAuthNoPriv
        );
        assert_eq!(map_security_level(None), SecurityLevel::NoAuthNoPriv);
    }

    #[test]
    fn algorithm_names_are_case_insensitive() {
        assert!(matches!(
            map_auth_protocol(Some("md5")),
            Some(v3::AuthProtocol::Md5)
        ));
        assert!(matches!(
            map_auth_protocol(Some("SHA")),
            Some(v3::AuthProtocol::Sha1)
        ));
        assert!(map_auth_protocol(Some("SHA-512")).is_none());
        assert!(map_auth_protocol(None).is_none());

        assert!(matches!(
            map_priv_protocol(Some("aes")),
            Some(v3::Cipher::Aes128)
        ));
        assert!(matches!(
            map_priv_protocol(Some("DES")),
            Some(v3::Cipher::Des)
        ));
        assert!(map_priv_protocol(Some("3DES")).is_none());
    }
}
