//! SSH CLI fallback for SNMP-dead concentrators
//!
//! Old embedded SSH stacks on access equipment often only speak legacy
//! key exchanges, so the client advertises a broadened kex list. The
//! connection and command timeouts are independent of any SNMP timeout.
//! Every failure path degrades to an empty result; nothing here errors
//! past the module boundary.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use russh::client::{self, Msg};
use russh::{Channel, ChannelMsg, Preferred, kex};
use tokio::time::timeout;

use crate::config::{SSH_COMMAND_TIMEOUT, SSH_CONNECT_TIMEOUT, SSH_DEFAULT_PORT};
use crate::models::Concentrator;

use super::Vendor;
use super::cli::parse_cli_sessions;

/// Output larger than this is truncated before parsing
const MAX_CLI_OUTPUT: usize = 512 * 1024;

struct LegacyHostClient;

#[async_trait]
impl client::Handler for LegacyHostClient {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        _server_public_key: &russh_keys::key::PublicKey,
    ) -> Result<bool, Self::Error> {
        // Concentrators are addressed by operator-managed IPs; host key
        // pinning lives outside this fallback path.
        Ok(true)
    }
}

/// Runs the vendor session-listing command over SSH and parses it into
/// `{username -> IP}`. Missing credentials, connection failures, auth
/// failures and timeouts all log and return an empty map.
pub async fn run_cli_lookup(
    concentrator: &Concentrator,
    vendor: Vendor,
) -> HashMap<String, String> {
    let (Some(user), Some(password)) = (
        concentrator.ssh_user.as_deref(),
        concentrator.ssh_password.as_deref(),
    ) else {
        tracing::debug!(
            "no SSH credentials for {}, skipping CLI fallback",
            concentrator.ip_address
        );
        return HashMap::new();
    };

    let addr = format!(
        "{}:{}",
        concentrator.ip_address,
        concentrator.ssh_port.unwrap_or(SSH_DEFAULT_PORT)
    );

    match exec_command(&addr, user, password, vendor.cli_command()).await {
        Ok(output) => parse_cli_sessions(vendor, &output),
        Err(e) => {
            tracing::warn!("SSH CLI fallback against {} failed: {}", addr, e);
            HashMap::new()
        }
    }
}

async fn exec_command(addr: &str, user: &str, password: &str, command: &str) -> Result<String> {
    let config = Arc::new(client::Config {
        inactivity_timeout: Some(SSH_COMMAND_TIMEOUT),
        preferred: Preferred {
            // Legacy RouterOS/IOS images only offer group1/group14-sha1.
            kex: Cow::Borrowed(&[
                kex::CURVE25519,
                kex::DH_G14_SHA256,
                kex::DH_G14_SHA1,
                kex::DH_G1_SHA1,
            ]),
            ..Preferred::DEFAULT
        },
        ..Default::default()
    });

    let mut session = timeout(
        SSH_CONNECT_TIMEOUT,
        client::connect(config, addr, LegacyHostClient),
    )
    .await
    .map_err(|_| anyhow!("connection to {} timed out", addr))?
    .with_context(|| format!("connection to {} failed", addr))?;

    let authenticated = timeout(
        SSH_CONNECT_TIMEOUT,
        session.authenticate_password(user, password),
    )
    .await
    .map_err(|_| anyhow!("authentication against {} timed out", addr))??;
    if !authenticated {
        return Err(anyhow!("password authentication rejected by {}", addr));
    }

    let mut channel = session
        .channel_open_session()
        .await
        .context("channel open failed")?;
    channel
        .exec(true, command)
        .await
        .context("exec request failed")?;

    let output = read_channel_output(&mut channel).await?;

    let _ = channel.close().await;
    let _ = session
        .disconnect(russh::Disconnect::ByApplication, "", "en")
        .await;

    Ok(output)
}

async fn read_channel_output(channel: &mut Channel<Msg>) -> Result<String> {
    let mut stdout: Vec<u8> = Vec::new();

    let result = timeout(SSH_COMMAND_TIMEOUT, async {
        loop {
            match channel.wait().await {
                Some(ChannelMsg::Data { data }) => {
                    stdout.extend_from_slice(&data);
                    if stdout.len() > MAX_CLI_OUTPUT {
                        stdout.truncate(MAX_CLI_OUTPUT);
                        break;
                    }
                }
                Some(ChannelMsg::ExtendedData { .. }) => {}
                Some(ChannelMsg::ExitStatus { .. }) => {}
                Some(ChannelMsg::Eof) | Some(ChannelMsg::Close) | None => break,
                Some(_) => {}
            }
        }
    })
    .await;

    if result.is_err() {
        tracing::debug!("CLI command output timed out, parsing partial output");
    }

    Ok(String::from_utf8_lossy(&stdout).into_owned())
}
