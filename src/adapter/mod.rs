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

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tf_provider::{value::ValueString, Diagnostics};

use crate::diag;
use crate::junos::{config_lines, JunosClient, Session};
use crate::utils::{WithSchema, WithValidate};

mod data_source;
mod resource;

pub use data_source::JunosDataSource;
pub use resource::JunosResourceAdapter;

/// Client set by the provider configuration, shared with every resource
pub type ClientHandle = Arc<RwLock<Option<Arc<JunosClient>>>>;

/// A device feature managed through `set`/`delete` statements under a
/// configuration path identified by the key attributes of the state.
#[async_trait]
pub trait JunosResource: Send + Sync + 'static {
    /// Terraform type name, used in commit comments
    const TYPE_NAME: &'static str;
    /// Key attributes: changing one of them replaces the resource
    const KEYS: &'static [&'static str];
    /// Format of the id expected by import
    const ID_FORMAT: &'static str;
    /// Whether the feature needs a device with security services
    const SECURITY: bool = false;

    type State<'a>: WithSchema
        + WithValidate
        + Send
        + Sync
        + Clone
        + Default
        + std::fmt::Debug
        + Serialize
        + for<'de> Deserialize<'de>;

    fn id_mut<'s, 'a>(state: &'s mut Self::State<'a>) -> &'s mut ValueString<'a>;

    /// Id built from the key attributes
    fn id(state: &Self::State<'_>) -> String;

    /// State holding only the key attributes of `id`, None if malformed
    fn from_id<'a>(id: &str) -> Option<Self::State<'a>>;

    /// Human description of the configured object, for diagnostics
    fn describe(state: &Self::State<'_>) -> String;

    /// Configuration path of the object, relative to the root
    fn config_path(state: &Self::State<'_>) -> String;

    /// Lines to configure the object
    fn set(state: &Self::State<'_>) -> anyhow::Result<Vec<String>>;

    /// Rebuild the state from `show configuration <path> | display set relative`
    fn parse<'a>(keys: &Self::State<'a>, output: &str) -> anyhow::Result<Self::State<'a>>;

    /// Lines to remove the object
    fn del(state: &Self::State<'_>) -> Vec<String>;

    /// Checks against the device before creating the object
    async fn pre_check<'a>(
        _session: &Session<'_>,
        _state: &Self::State<'a>,
        _diags: &mut Diagnostics,
    ) -> Option<()> {
        Some(())
    }

    /// Complete the parsed state with configuration outside of the object path
    async fn read_more<'a>(
        _session: &Session<'_>,
        _state: &mut Self::State<'a>,
    ) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Read the object from the device, None if it is not configured
pub(crate) async fn read_config<'a, R: JunosResource>(
    session: &Session<'_>,
    keys: &R::State<'a>,
) -> anyhow::Result<Option<R::State<'a>>> {
    let output = session.show_config(&R::config_path(keys)).await?;
    if config_lines(&output).next().is_none() {
        return Ok(None);
    }
    let mut state = R::parse(keys, &output)?;
    R::read_more(session, &mut state).await?;
    Ok(Some(state))
}

pub(crate) async fn config_exists<R: JunosResource>(
    session: &Session<'_>,
    state: &R::State<'_>,
) -> anyhow::Result<bool> {
    Ok(session.config_exists(&R::config_path(state)).await?)
}

/// Report a compatibility error when the device lacks the needed features
pub(crate) async fn check_compatibility<R: JunosResource>(
    session: &Session<'_>,
    diags: &mut Diagnostics,
) -> Option<()> {
    if !R::SECURITY {
        return Some(());
    }
    match session.check_compatibility_security().await {
        Ok(true) => Some(()),
        Ok(false) => {
            diags.root_error(
                diag::COMPATIBILITY,
                format!("{} not compatible with Junos device", R::TYPE_NAME),
            );
            None
        }
        Err(err) => {
            diags.root_error(diag::COMPATIBILITY, err.to_string());
            None
        }
    }
}

pub(crate) fn get_client(handle: &ClientHandle, diags: &mut Diagnostics) -> Option<Arc<JunosClient>> {
    let client = handle.read().ok().and_then(|client| client.clone());
    if client.is_none() {
        diags.root_error(
            diag::PROVIDER_NOT_CONFIGURED,
            "The provider has not been configured before the resource was used",
        );
    }
    client
}
