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

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;

use super::{Connection, ExecutionResult};

/// In-memory device: fixed command outputs, recorded configuration scripts
#[derive(Debug, Default)]
pub struct MockConnection {
    pub commands: HashMap<String, String>,
    /// Outputs replacing `commands` once a script has been run
    pub committed: HashMap<String, String>,
    pub failures: HashSet<String>,
    pub commit_output: Option<String>,
    pub scripts: Arc<Mutex<Vec<String>>>,
}

impl MockConnection {
    pub fn with_command(mut self, cmd: &str, output: &str) -> Self {
        self.commands.insert(cmd.to_owned(), output.to_owned());
        self
    }

    /// Output of `cmd` after the first configuration script
    pub fn with_committed(mut self, cmd: &str, output: &str) -> Self {
        self.committed.insert(cmd.to_owned(), output.to_owned());
        self
    }

    pub fn with_failure(mut self, cmd: &str) -> Self {
        self.failures.insert(cmd.to_owned());
        self
    }

    pub fn with_commit_output(mut self, output: &str) -> Self {
        self.commit_output = Some(output.to_owned());
        self
    }
}

#[async_trait]
impl Connection for MockConnection {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn command(&self, cmd: &str) -> Result<ExecutionResult> {
        if self.failures.contains(cmd) {
            return Ok(ExecutionResult {
                status: 1,
                stdout: String::new(),
                stderr: "error: mock failure".to_owned(),
            });
        }
        let committed = self
            .scripts
            .lock()
            .map(|scripts| !scripts.is_empty())
            .unwrap_or_default();
        let stdout = committed
            .then(|| self.committed.get(cmd))
            .flatten()
            .or_else(|| self.commands.get(cmd))
            .cloned()
            .unwrap_or_default();
        Ok(ExecutionResult {
            status: 0,
            stdout,
            stderr: String::new(),
        })
    }

    async fn script(&self, input: &str) -> Result<ExecutionResult> {
        if let Ok(mut scripts) = self.scripts.lock() {
            scripts.push(input.to_owned());
        }
        Ok(ExecutionResult {
            status: 0,
            stdout: self
                .commit_output
                .clone()
                .unwrap_or_else(|| "commit complete\n".to_owned()),
            stderr: String::new(),
        })
    }
}
