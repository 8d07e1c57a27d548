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

use tracing_subscriber::EnvFilter;

use junos_provider::JunosProvider;

mod adapter;
mod connection;
mod diag;
mod junos;
mod junos_provider;
mod resources;
mod schema;
mod utils;

/// Environment variable holding the log filter
const LOG_ENV: &str = "TF_PROVIDER_JUNOS_LOG";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries the plugin handshake
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    tf_provider::serve("junos", JunosProvider::default()).await?;
    Ok(())
}
