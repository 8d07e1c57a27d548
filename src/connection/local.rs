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

use anyhow::Result;
use async_trait::async_trait;

use super::{run_process, Connection, ExecutionResult};

/// Run the Junos `cli` of the host the provider runs on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionLocal {
    pub cli: String,
}

impl Default for ConnectionLocal {
    fn default() -> Self {
        Self {
            cli: "cli".to_owned(),
        }
    }
}

#[async_trait]
impl Connection for ConnectionLocal {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn command(&self, cmd: &str) -> Result<ExecutionResult> {
        run_process(&self.cli, ["-c", cmd], None).await
    }

    async fn script(&self, input: &str) -> Result<ExecutionResult> {
        run_process(&self.cli, std::iter::empty::<&str>(), Some(input)).await
    }
}
