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

use std::borrow::Cow;
use std::marker::PhantomData;

use async_trait::async_trait;
use tracing::{info, warn};

use tf_provider::value::{Value, ValueEmpty};
use tf_provider::{schema::Schema, AttributePath, Diagnostics, Resource};

use crate::diag;
use crate::junos::{JunosClient, Session};
use crate::utils::{WithSchema, WithValidate};

use super::{check_compatibility, config_exists, get_client, read_config, ClientHandle, JunosResource};

pub struct JunosResourceAdapter<R: JunosResource> {
    client: ClientHandle,
    resource: PhantomData<fn() -> R>,
}

impl<R: JunosResource> JunosResourceAdapter<R> {
    pub fn new(client: ClientHandle) -> Self {
        Self {
            client,
            resource: PhantomData,
        }
    }
}

/// Commit the queued lines, forwarding device warnings
async fn commit(session: &mut Session<'_>, diags: &mut Diagnostics, message: String) -> Option<()> {
    match session.commit(&message).await {
        Ok(warnings) => {
            for warning in warnings {
                diags.root_warning(diag::COMMIT_WARNING, warning);
            }
            Some(())
        }
        Err(err) => {
            diags.root_error(diag::COMMIT, err.to_string());
            None
        }
    }
}

async fn write_setfile(session: &mut Session<'_>, diags: &mut Diagnostics) -> Option<()> {
    match session.write_setfile().await {
        Ok(()) => Some(()),
        Err(err) => {
            diags.root_error(diag::SETFILE, err.to_string());
            None
        }
    }
}

fn set_lines<R: JunosResource>(state: &R::State<'_>, diags: &mut Diagnostics) -> Option<Vec<String>> {
    match R::set(state) {
        Ok(lines) => Some(lines),
        Err(err) => {
            diags.root_error(diag::CONFIG_SET, err.to_string());
            None
        }
    }
}

impl<R: JunosResource> JunosResourceAdapter<R> {
    async fn apply_create<'a>(
        client: &JunosClient,
        diags: &mut Diagnostics,
        state: &R::State<'a>,
    ) -> Option<()> {
        let lines = set_lines::<R>(state, diags)?;
        let mut session = client.start_session().await;

        if client.fake_create() {
            session.config_set(lines);
            return write_setfile(&mut session, diags).await;
        }

        check_compatibility::<R>(&session, diags).await?;
        R::pre_check(&session, state, diags).await?;
        match config_exists::<R>(&session, state).await {
            Ok(false) => (),
            Ok(true) => {
                diags.root_error(
                    diag::DUPLICATE_CONFIG,
                    format!("{} already exists", R::describe(state)),
                );
                return None;
            }
            Err(err) => {
                diags.root_error(diag::PRE_CHECK, err.to_string());
                return None;
            }
        }

        session.config_set(lines);
        commit(&mut session, diags, format!("create resource {}", R::TYPE_NAME)).await?;

        match config_exists::<R>(&session, state).await {
            Ok(true) => Some(()),
            Ok(false) => {
                diags.root_error(
                    diag::POST_CHECK,
                    format!(
                        "{} not exists after commit => check your config",
                        R::describe(state)
                    ),
                );
                None
            }
            Err(err) => {
                diags.root_error(diag::POST_CHECK, err.to_string());
                None
            }
        }
    }

    /// Replace the configuration of `prior` by the one of `state`
    async fn apply_update<'a>(
        client: &JunosClient,
        diags: &mut Diagnostics,
        prior: &R::State<'a>,
        state: &R::State<'a>,
    ) -> Option<()> {
        let lines = set_lines::<R>(state, diags)?;
        let mut session = client.start_session().await;

        session.config_set(R::del(prior));
        session.config_set(lines);

        if client.fake_update() {
            return write_setfile(&mut session, diags).await;
        }

        check_compatibility::<R>(&session, diags).await?;
        R::pre_check(&session, state, diags).await?;
        commit(&mut session, diags, format!("update resource {}", R::TYPE_NAME)).await
    }

    async fn apply_delete<'a>(
        client: &JunosClient,
        diags: &mut Diagnostics,
        state: &R::State<'a>,
    ) -> Option<()> {
        let mut session = client.start_session().await;
        session.config_set(R::del(state));

        if client.fake_delete() {
            return write_setfile(&mut session, diags).await;
        }

        check_compatibility::<R>(&session, diags).await?;
        commit(&mut session, diags, format!("delete resource {}", R::TYPE_NAME)).await
    }
}

#[async_trait]
impl<R: JunosResource> Resource for JunosResourceAdapter<R> {
    type State<'a> = R::State<'a>;
    type PrivateState<'a> = ValueEmpty;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(<R::State<'static> as WithSchema>::schema())
    }

    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::State<'a>) -> Option<()> {
        config.validate(diags, AttributePath::default());

        if diags.errors.is_empty() {
            Some(())
        } else {
            None
        }
    }

    async fn read<'a>(
        &self,
        diags: &mut Diagnostics,
        state: Self::State<'a>,
        private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let client = get_client(&self.client, diags)?;

        // Nothing on the device to compare with
        if client.fake_create() {
            return Some((state, private_state));
        }

        let session = client.start_session().await;
        check_compatibility::<R>(&session, diags).await?;

        let mut state = state;
        match read_config::<R>(&session, &state).await {
            Ok(Some(mut new_state)) => {
                *R::id_mut(&mut new_state) = std::mem::take(R::id_mut(&mut state));
                Some((new_state, private_state))
            }
            Ok(None) => {
                info!(
                    resource = R::TYPE_NAME,
                    id = %R::id(&state),
                    "not found on the device, removed from state"
                );
                None
            }
            Err(err) => {
                diags.root_error(diag::CONFIG_READ, err.to_string());
                None
            }
        }
    }

    async fn plan_create<'a>(
        &self,
        _diags: &mut Diagnostics,
        proposed_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let mut state = proposed_state;
        *R::id_mut(&mut state) = Value::Unknown;

        Some((state, Default::default()))
    }

    async fn plan_update<'a>(
        &self,
        _diags: &mut Diagnostics,
        prior_state: Self::State<'a>,
        proposed_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        prior_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(
        Self::State<'a>,
        Self::PrivateState<'a>,
        Vec<tf_provider::AttributePath>,
    )> {
        let mut prior_state = prior_state;
        let mut state = proposed_state;

        *R::id_mut(&mut state) = if R::id(&prior_state) == R::id(&state) {
            std::mem::take(R::id_mut(&mut prior_state))
        } else {
            Value::Unknown
        };

        // Terraform only replaces when one of these attributes actually changes
        let trigger_replace = R::KEYS.iter().map(|key| AttributePath::new(*key)).collect();

        Some((state, prior_private_state, trigger_replace))
    }

    async fn plan_destroy<'a>(
        &self,
        _diags: &mut Diagnostics,
        _prior_state: Self::State<'a>,
        _prior_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<()> {
        Some(())
    }

    async fn create<'a>(
        &self,
        diags: &mut Diagnostics,
        planned_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let client = get_client(&self.client, diags)?;
        let mut state = planned_state;

        Self::apply_create(&client, diags, &state).await?;

        *R::id_mut(&mut state) = Value::Value(Cow::Owned(R::id(&state)));
        Some((state, private_state))
    }

    async fn update<'a>(
        &self,
        diags: &mut Diagnostics,
        prior_state: Self::State<'a>,
        planned_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let client = get_client(&self.client, diags)?;
        let mut state = planned_state;

        if R::id(&prior_state) != R::id(&state) {
            warn!(
                resource = R::TYPE_NAME,
                "key attributes changed during update, the resource should have been replaced"
            );
        }
        Self::apply_update(&client, diags, &prior_state, &state).await?;

        *R::id_mut(&mut state) = Value::Value(Cow::Owned(R::id(&state)));
        Some((state, private_state))
    }

    async fn destroy<'a>(
        &self,
        diags: &mut Diagnostics,
        state: Self::State<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<()> {
        let client = get_client(&self.client, diags)?;
        Self::apply_delete(&client, diags, &state).await
    }

    async fn import<'a>(
        &self,
        diags: &mut Diagnostics,
        id: String,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let Some(keys) = R::from_id(&id) else {
            diags.root_error(
                diag::NOT_FOUND,
                format!("can't parse id '{id}' (id must be {})", R::ID_FORMAT),
            );
            return None;
        };

        let client = get_client(&self.client, diags)?;
        let session = client.start_session().await;
        check_compatibility::<R>(&session, diags).await?;

        match read_config::<R>(&session, &keys).await {
            Ok(Some(mut state)) => {
                *R::id_mut(&mut state) = Value::Value(Cow::Owned(id));
                Some((state, Default::default()))
            }
            Ok(None) => {
                diags.root_error(
                    diag::NOT_FOUND,
                    format!(
                        "don't find {} with id '{id}' (id must be {})",
                        R::describe(&keys),
                        R::ID_FORMAT
                    ),
                );
                None
            }
            Err(err) => {
                diags.root_error(diag::CONFIG_READ, err.to_string());
                None
            }
        }
    }
}
