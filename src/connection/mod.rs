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

use anyhow::{Context, Result};
use async_process::{Command, Stdio};
use async_trait::async_trait;
use futures::AsyncWriteExt;

pub mod local;
#[cfg(test)]
pub mod mock;
pub mod ssh;

pub use local::ConnectionLocal;
pub use ssh::ConnectionSsh;

#[derive(Debug, PartialEq, Eq)]
pub struct ExecutionResult {
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

#[async_trait]
pub trait Connection: Send + Sync + std::fmt::Debug + 'static {
    /// Name of the transport
    fn name(&self) -> &'static str;

    /// execute an operational command on the device CLI
    async fn command(&self, cmd: &str) -> Result<ExecutionResult>;

    /// feed `input` to an interactive CLI, line by line
    async fn script(&self, input: &str) -> Result<ExecutionResult>;
}

/// Spawn `program` and collect its outputs, writing `input` to its stdin if any
pub(crate) async fn run_process<I, S>(
    program: &str,
    args: I,
    input: Option<&str>,
) -> Result<ExecutionResult>
where
    I: IntoIterator<Item = S>,
    S: AsRef<std::ffi::OsStr>,
{
    let mut child = Command::new(program)
        .args(args)
        .stdin(if input.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .with_context(|| format!("failed to spawn `{program}`"))?;

    if let (Some(input), Some(mut stdin)) = (input, child.stdin.take()) {
        stdin
            .write_all(input.as_bytes())
            .await
            .with_context(|| format!("failed to write to `{program}` stdin"))?;
        stdin.close().await?;
    }

    let output = child
        .output()
        .await
        .with_context(|| format!("failed to wait for `{program}`"))?;

    Ok(ExecutionResult {
        status: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn process_outputs_are_collected() {
        let res = run_process("sh", ["-c", "cat; echo err >&2; exit 3"], Some("hello\n"))
            .await
            .unwrap();
        assert_eq!(
            res,
            ExecutionResult {
                status: 3,
                stdout: "hello\n".to_owned(),
                stderr: "err\n".to_owned(),
            }
        );
    }

    #[tokio::test]
    async fn missing_program_is_an_error() {
        let err = run_process("/nonexistent/cli", ["-c", "show version"], None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("failed to spawn"));
    }
}
