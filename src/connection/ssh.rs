// This file is part of the terraform-provider-junos project
//
// Copyright (C) ANEO, 2024-2024. All rights reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License")
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use russh::client::{self, Handle, Handler};
use russh::keys::key::PublicKey;
use russh::{ChannelMsg, Disconnect};
use russh_keys::agent::client::AgentClient;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::{Connection, ExecutionResult};

/// Host key verification against `~/.ssh/known_hosts`.
///
/// Unknown hosts are accepted, changed keys are rejected.
struct KnownHosts {
    host: String,
    port: u16,
}

#[async_trait]
impl Handler for KnownHosts {
    type Error = russh::Error;

    async fn check_server_key(&mut self, server_public_key: &PublicKey) -> Result<bool, Self::Error> {
        match russh_keys::check_known_hosts(&self.host, self.port, server_public_key) {
            Ok(true) => Ok(true),
            Ok(false) => {
                warn!(host = %self.host, "host not found in known_hosts, accepting its key");
                Ok(true)
            }
            Err(err) => {
                warn!(host = %self.host, %err, "host key verification failed");
                Ok(false)
            }
        }
    }
}

/// Reach the device CLI over ssh.
///
/// Authentication uses the first method available among `key_file`,
/// `password` and the ssh agent. The connection is opened on first use and
/// every command runs in its own channel.
pub struct ConnectionSsh {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: Option<String>,
    pub key_file: Option<String>,
    pub key_pass: Option<String>,
    pub timeout: Duration,
    handle: Mutex<Option<Handle<KnownHosts>>>,
}

impl Default for ConnectionSsh {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 22,
            username: "netconf".to_owned(),
            password: None,
            key_file: None,
            key_pass: None,
            timeout: Duration::from_secs(60),
            handle: Mutex::new(None),
        }
    }
}

impl std::fmt::Debug for ConnectionSsh {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionSsh")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("key_file", &self.key_file)
            .finish_non_exhaustive()
    }
}

impl ConnectionSsh {
    async fn connect(&self) -> Result<Handle<KnownHosts>> {
        let config = Arc::new(client::Config {
            inactivity_timeout: Some(self.timeout),
            ..Default::default()
        });
        let handler = KnownHosts {
            host: self.host.clone(),
            port: self.port,
        };
        let addr = (self.host.as_str(), self.port);

        let mut handle = tokio::time::timeout(self.timeout, client::connect(config, addr, handler))
            .await
            .with_context(|| format!("ssh connection to {}:{} timed out", self.host, self.port))?
            .with_context(|| format!("ssh connection to {}:{} failed", self.host, self.port))?;

        if !self.authenticate(&mut handle).await? {
            bail!(
                "ssh authentication failed for user {:?} on {}",
                self.username,
                self.host
            );
        }
        debug!(host = %self.host, port = self.port, "ssh connection established");
        Ok(handle)
    }

    async fn authenticate(&self, handle: &mut Handle<KnownHosts>) -> Result<bool> {
        if let Some(key_file) = &self.key_file {
            let key = russh_keys::load_secret_key(key_file, self.key_pass.as_deref())
                .with_context(|| format!("failed to load ssh key {key_file:?}"))?;
            return Ok(handle
                .authenticate_publickey(&self.username, Arc::new(key))
                .await?);
        }
        if let Some(password) = &self.password {
            return Ok(handle
                .authenticate_password(&self.username, password)
                .await?);
        }

        let mut agent = AgentClient::connect_env()
            .await
            .context("no ssh key, password or agent to authenticate with")?;
        let identities = agent.request_identities().await?;
        for identity in identities {
            let (returned, res) = handle
                .authenticate_future(&self.username, identity, agent)
                .await;
            agent = returned;
            if matches!(res, Ok(true)) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Run `cmd`, or a shell fed with `input` when there is no command
    async fn run(&self, cmd: Option<&str>, input: Option<&str>) -> Result<ExecutionResult> {
        let mut handle = self.handle.lock().await;
        let opened = match handle.as_ref() {
            Some(current) => current.channel_open_session().await.ok(),
            None => None,
        };
        let mut channel = match opened {
            Some(channel) => channel,
            None => {
                // first use, or the previous connection was lost
                let fresh = handle.insert(self.connect().await?);
                fresh
                    .channel_open_session()
                    .await
                    .context("failed to open ssh channel")?
            }
        };
        drop(handle);

        match cmd {
            Some(cmd) => channel.exec(true, cmd).await?,
            None => channel.request_shell(true).await?,
        }
        if let Some(input) = input {
            channel.data(input.as_bytes()).await?;
        }
        channel.eof().await?;

        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let mut status = None;
        while let Some(msg) = channel.wait().await {
            match msg {
                ChannelMsg::Data { ref data } => stdout.extend_from_slice(data),
                ChannelMsg::ExtendedData { ref data, ext: 1 } => stderr.extend_from_slice(data),
                ChannelMsg::ExitStatus { exit_status } => status = Some(exit_status),
                ChannelMsg::Close => break,
                _ => (),
            }
        }

        Ok(ExecutionResult {
            status: status.map_or(-1, |status| status as i32),
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
        })
    }

    pub async fn disconnect(&self) -> Result<()> {
        if let Some(handle) = self.handle.lock().await.take() {
            handle
                .disconnect(Disconnect::ByApplication, "", "en")
                .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Connection for ConnectionSsh {
    fn name(&self) -> &'static str {
        "ssh"
    }

    async fn command(&self, cmd: &str) -> Result<ExecutionResult> {
        self.run(Some(cmd), None).await
    }

    async fn script(&self, input: &str) -> Result<ExecutionResult> {
        self.run(None, Some(input)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secrets_are_not_displayed() {
        let connect = ConnectionSsh {
            host: "192.0.2.1".to_owned(),
            password: Some("s3cret".to_owned()),
            key_pass: Some("k3y".to_owned()),
            ..Default::default()
        };
        let debug = format!("{connect:?}");
        assert!(debug.contains("192.0.2.1"));
        assert!(debug.contains("netconf"));
        assert!(!debug.contains("s3cret"));
        assert!(!debug.contains("k3y"));
    }

    #[tokio::test]
    async fn unreachable_host_is_an_error() {
        let connect = ConnectionSsh {
            host: "127.0.0.1".to_owned(),
            port: 1,
            timeout: Duration::from_secs(5),
            ..Default::default()
        };
        let err = connect.command("show version").await.unwrap_err();
        assert!(err.to_string().starts_with("ssh connection to 127.0.0.1:1"));
        connect.disconnect().await.unwrap();
    }
}
