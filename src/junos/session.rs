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

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::connection::{Connection, ExecutionResult};
use crate::utils::DisplayJoinable;

use super::{config_lines, quote, setfile, Error, DEFAULT_ROUTING_INSTANCE};
use super::{PIPE_DISPLAY_SET_RELATIVE, SHOW_CONFIG};

/// Provider wide settings applied to every session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub cmd_timeout: Duration,
    pub file_permission: u32,
    pub fake_create_with_setfile: Option<PathBuf>,
    pub fake_update_also: bool,
    pub fake_delete_also: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cmd_timeout: Duration::from_secs(60),
            file_permission: 0o644,
            fake_create_with_setfile: None,
            fake_update_also: false,
            fake_delete_also: false,
        }
    }
}

/// Device handle shared by all the resources of a configured provider.
///
/// Every operation goes through [`JunosClient::start_session`], which
/// serializes them: the device configuration is a single shared state.
#[derive(Debug)]
pub struct JunosClient {
    connect: Box<dyn Connection>,
    settings: Settings,
    lock: Mutex<()>,
}

impl JunosClient {
    pub fn new(connect: Box<dyn Connection>, settings: Settings) -> Self {
        Self {
            connect,
            settings,
            lock: Mutex::new(()),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn fake_create(&self) -> bool {
        self.settings.fake_create_with_setfile.is_some()
    }

    pub fn fake_update(&self) -> bool {
        self.fake_create() && self.settings.fake_update_also
    }

    pub fn fake_delete(&self) -> bool {
        self.fake_create() && self.settings.fake_delete_also
    }

    pub async fn start_session(&self) -> Session<'_> {
        let guard = self.lock.lock().await;
        debug!(connection = self.connect.name(), "session started");
        Session {
            client: self,
            _guard: guard,
            pending: Vec::new(),
        }
    }
}

/// Exclusive access to the device for the duration of one operation
pub struct Session<'c> {
    client: &'c JunosClient,
    _guard: MutexGuard<'c, ()>,
    pending: Vec<String>,
}

impl<'c> Session<'c> {
    async fn with_timeout<F>(&self, cmd: &str, fut: F) -> Result<ExecutionResult, Error>
    where
        F: Future<Output = anyhow::Result<ExecutionResult>>,
    {
        let timeout = self.client.settings.cmd_timeout;
        match tokio::time::timeout(timeout, fut).await {
            Ok(res) => Ok(res?),
            Err(_) => Err(Error::Timeout {
                cmd: cmd.to_owned(),
                timeout: timeout.as_secs(),
            }),
        }
    }

    /// Run an operational mode command and return its output
    pub async fn command(&self, cmd: &str) -> Result<String, Error> {
        debug!(cmd, "command");
        let res = self
            .with_timeout(cmd, self.client.connect.command(cmd))
            .await?;
        if res.status != 0 {
            return Err(Error::CommandFailed {
                cmd: cmd.to_owned(),
                status: res.status,
                stderr: res.stderr,
            });
        }
        if !res.stderr.is_empty() {
            warn!(cmd, stderr = res.stderr.as_str(), "command stderr was not empty");
        }
        Ok(res.stdout)
    }

    /// Configuration under `path` as `set` statements relative to `path`
    pub async fn show_config(&self, path: &str) -> Result<String, Error> {
        self.command(&format!("{SHOW_CONFIG}{path}{PIPE_DISPLAY_SET_RELATIVE}"))
            .await
    }

    pub async fn config_exists(&self, path: &str) -> Result<bool, Error> {
        let output = self.show_config(path).await?;
        let exists = config_lines(&output).next().is_some();
        Ok(exists)
    }

    pub async fn routing_instance_exists(&self, routing_instance: &str) -> Result<bool, Error> {
        if routing_instance.is_empty() || routing_instance == DEFAULT_ROUTING_INSTANCE {
            return Ok(true);
        }
        self.config_exists(&format!("routing-instances {routing_instance}"))
            .await
    }

    /// Security features are only available on SRX like devices
    pub async fn check_compatibility_security(&self) -> Result<bool, Error> {
        let output = self.command("show version").await?;
        Ok(hardware_model(&output).is_some_and(|model| is_security_model(&model)))
    }

    /// Queue configuration lines for the next commit (or setfile write)
    pub fn config_set<I>(&mut self, lines: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.pending.extend(lines);
    }

    /// Load the queued lines in a private candidate and commit them.
    /// Returns the warnings emitted by the device.
    pub async fn commit(&mut self, message: &str) -> Result<Vec<String>, Error> {
        let lines = std::mem::take(&mut self.pending);
        let script = commit_script(&lines, message);
        info!(message, lines = lines.len(), "commit");

        let res = self
            .with_timeout("commit", self.client.connect.script(&script))
            .await?;
        if res.status != 0 && res.stdout.is_empty() {
            return Err(Error::CommandFailed {
                cmd: "commit".to_owned(),
                status: res.status,
                stderr: res.stderr,
            });
        }
        check_commit_output(&res.stdout)
    }

    /// Append the queued lines to the setfile instead of the device
    pub async fn write_setfile(&mut self) -> Result<(), Error> {
        let lines = std::mem::take(&mut self.pending);
        let Some(path) = &self.client.settings.fake_create_with_setfile else {
            return Ok(());
        };
        info!(path = %path.display(), lines = lines.len(), "write setfile");
        setfile::append(path, &lines, self.client.settings.file_permission)
            .await
            .map_err(|source| Error::Setfile {
                path: path.display().to_string(),
                source,
            })
    }
}

pub(crate) fn commit_script(lines: &[String], message: &str) -> String {
    format!(
        "configure private\n{}\ncommit comment {}\nexit configuration-mode\n",
        lines.iter().join_with("\n"),
        quote(message)
    )
}

/// Split the output of a commit script into warnings, or errors when the
/// commit did not complete.
pub(crate) fn check_commit_output(output: &str) -> Result<Vec<String>, Error> {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let mut complete = false;

    for line in output.lines().map(str::trim) {
        if line.starts_with("commit complete") {
            complete = true;
        } else if line.starts_with("error:")
            || line.starts_with("syntax error")
            || line.starts_with("unknown command")
        {
            errors.push(line.to_owned());
        } else if line.starts_with("warning:") && !line.contains("uncommitted changes") {
            warnings.push(line.to_owned());
        }
    }

    if complete && errors.is_empty() {
        Ok(warnings)
    } else if errors.is_empty() {
        Err(Error::CommitFailed(vec![format!(
            "commit not complete: {}",
            output.trim()
        )]))
    } else {
        Err(Error::CommitFailed(errors))
    }
}

fn hardware_model(output: &str) -> Option<String> {
    output
        .lines()
        .find_map(|line| line.trim().strip_prefix("Model:"))
        .map(|model| model.trim().to_lowercase())
}

fn is_security_model(model: &str) -> bool {
    ["srx", "vsrx", "j"]
        .iter()
        .any(|prefix| model.starts_with(prefix))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::connection::mock::MockConnection;

    use super::*;

    #[test]
    fn commit_script_wraps_lines_in_private_candidate() {
        let lines = vec![
            "delete applications application app1".to_owned(),
            "set applications application app1 protocol tcp".to_owned(),
        ];
        assert_eq!(
            commit_script(&lines, "update resource junos_application"),
            "configure private\n\
             delete applications application app1\n\
             set applications application app1 protocol tcp\n\
             commit comment \"update resource junos_application\"\n\
             exit configuration-mode\n"
        );
    }

    #[test]
    fn commit_output_with_errors_fails() {
        let output = "Entering configuration mode\n\
                      [edit]\n\
                      error: configuration check-out failed\n\
                      warning: uncommitted changes will be discarded on exit\n";
        match check_commit_output(output) {
            Err(Error::CommitFailed(errors)) => {
                assert_eq!(errors, vec!["error: configuration check-out failed"]);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn commit_output_returns_warnings() {
        let output = "[edit]\n  warning: statement not found\ncommit complete\n";
        assert_eq!(
            check_commit_output(output).unwrap(),
            vec!["warning: statement not found"]
        );
    }

    #[test]
    fn commit_output_without_completion_fails() {
        assert!(matches!(
            check_commit_output("[edit]\n"),
            Err(Error::CommitFailed(_))
        ));
    }

    #[test]
    fn security_models() {
        let output = "Hostname: fw1\nModel: vSRX\nJunos: 22.4R1.10\n";
        let model = hardware_model(output).unwrap();
        assert_eq!(model, "vsrx");
        assert!(is_security_model(&model));
        assert!(!is_security_model("mx240"));
    }

    #[tokio::test]
    async fn session_runs_commands_and_commits() {
        let connect = MockConnection::default()
            .with_command(
                "show configuration routing-instances ri1 | display set relative",
                "set instance-type virtual-router\n",
            )
            .with_command("show version", "Model: mx204\n");
        let scripts = Arc::clone(&connect.scripts);
        let client = JunosClient::new(Box::new(connect), Settings::default());

        let mut session = client.start_session().await;
        assert!(session.routing_instance_exists("default").await.unwrap());
        assert!(session.routing_instance_exists("ri1").await.unwrap());
        assert!(!session.routing_instance_exists("ri2").await.unwrap());
        assert!(!session.check_compatibility_security().await.unwrap());

        session.config_set(vec!["set snmp location lab".to_owned()]);
        session.commit("test").await.unwrap();

        let scripts = scripts.lock().unwrap();
        assert_eq!(scripts.len(), 1);
        assert!(scripts[0].contains("\nset snmp location lab\n"));
    }

    #[tokio::test]
    async fn failed_command_is_an_error() {
        let client = JunosClient::new(
            Box::new(MockConnection::default().with_failure("show version")),
            Settings::default(),
        );
        let session = client.start_session().await;
        assert!(matches!(
            session.command("show version").await,
            Err(Error::CommandFailed { status: 1, .. })
        ));
    }

    #[tokio::test]
    async fn commit_errors_are_reported() {
        let connect = MockConnection::default().with_commit_output(
            "[edit]\nerror: configuration check-out failed\nerror: commit failed\n",
        );
        let client = JunosClient::new(Box::new(connect), Settings::default());
        let mut session = client.start_session().await;
        session.config_set(vec!["set snmp location lab".to_owned()]);
        match session.commit("test").await {
            Err(Error::CommitFailed(errors)) => assert_eq!(
                errors,
                vec![
                    "error: configuration check-out failed",
                    "error: commit failed"
                ]
            ),
            other => panic!("unexpected commit result: {other:?}"),
        }
    }
}
