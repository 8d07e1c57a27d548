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

use tf_provider::value::{Value, ValueEmpty};
use tf_provider::{AttributePath, DataSource, Diagnostics, Schema};

use crate::diag;
use crate::schema::computed_schema;
use crate::utils::{WithSchema, WithValidate};

use super::{check_compatibility, get_client, read_config, ClientHandle, JunosResource};

/// Read-only view of a [`JunosResource`]: keys are inputs, everything else is read
pub struct JunosDataSource<R: JunosResource> {
    client: ClientHandle,
    resource: PhantomData<fn() -> R>,
}

impl<R: JunosResource> JunosDataSource<R> {
    pub fn new(client: ClientHandle) -> Self {
        Self {
            client,
            resource: PhantomData,
        }
    }
}

#[async_trait]
impl<R: JunosResource> DataSource for JunosDataSource<R> {
    type State<'a> = R::State<'a>;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(computed_schema(
            <R::State<'static> as WithSchema>::schema(),
            R::KEYS,
        ))
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
        config: Self::State<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<Self::State<'a>> {
        let client = get_client(&self.client, diags)?;
        let session = client.start_session().await;
        check_compatibility::<R>(&session, diags).await?;

        match read_config::<R>(&session, &config).await {
            Ok(Some(mut state)) => {
                *R::id_mut(&mut state) = Value::Value(Cow::Owned(R::id(&config)));
                Some(state)
            }
            Ok(None) => {
                diags.root_error(
                    diag::NOT_FOUND,
                    format!("{} not found", R::describe(&config)),
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
