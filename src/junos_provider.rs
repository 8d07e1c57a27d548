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

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use tf_provider::value::{Value, ValueBool, ValueNumber, ValueString};
use tf_provider::{map, AttributePath, Diagnostics, Provider, Schema, ValueEmpty};

use crate::adapter::{ClientHandle, JunosDataSource, JunosResourceAdapter};
use crate::connection::{Connection, ConnectionLocal, ConnectionSsh};
use crate::diag;
use crate::junos::{JunosClient, Settings};
use crate::resources::{
    AccessGroup, Application, IpsecVpn, LogStream, PolicyStatement, PrefixList, RipNeighbor,
    SecurityToGroup, WebFilteringJuniperLocal,
};
use crate::schema::{
    block, optional_bool, optional_number, optional_string, resource_schema, sensitive_string,
};
use crate::utils::{
    missing, new_number, new_str, validate_range, value_bool, value_number, value_str,
    WithValidate,
};

#[derive(Debug, Default, Clone)]
pub struct JunosProvider {
    client: ClientHandle,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig<'a> {
    pub host: ValueString<'a>,
    pub port: ValueNumber,
    pub username: ValueString<'a>,
    pub password: ValueString<'a>,
    pub ssh_key_file: ValueString<'a>,
    pub ssh_key_pass: ValueString<'a>,
    pub cmd_timeout: ValueNumber,
    pub file_permission: ValueString<'a>,
    pub fake_create_with_setfile: ValueString<'a>,
    pub fake_update_also: ValueBool,
    pub fake_delete_also: ValueBool,
}

/// Booleans from the environment, the way `strconv.ParseBool` reads them
fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

fn parse_file_permission(value: &str) -> Option<u32> {
    let digits = value.strip_prefix("0o").unwrap_or(value);
    u32::from_str_radix(digits, 8)
        .ok()
        .filter(|mode| *mode <= 0o777)
}

impl<'a> ProviderConfig<'a> {
    /// Fill the attributes left null from their environment variable
    fn with_env<F>(mut self, diags: &mut Diagnostics, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        for (var, value) in [
            ("JUNOS_HOST", &mut self.host),
            ("JUNOS_USERNAME", &mut self.username),
            ("JUNOS_PASSWORD", &mut self.password),
            ("JUNOS_KEYFILE", &mut self.ssh_key_file),
            ("JUNOS_KEYPASS", &mut self.ssh_key_pass),
            ("JUNOS_FILE_PERMISSION", &mut self.file_permission),
            ("JUNOS_FAKECREATE_SETFILE", &mut self.fake_create_with_setfile),
        ] {
            if matches!(value, Value::Null) {
                if let Some(env) = lookup(var) {
                    *value = new_str(&env);
                }
            }
        }
        for (var, attr, value) in [
            ("JUNOS_PORT", "port", &mut self.port),
            ("JUNOS_CMD_TIMEOUT", "cmd_timeout", &mut self.cmd_timeout),
        ] {
            let Some(env) = lookup(var).filter(|_| matches!(value, Value::Null)) else {
                continue;
            };
            match env.parse() {
                Ok(number) => *value = new_number(number),
                Err(_) => diags.error(
                    diag::BAD_FORMAT,
                    format!("{var}={env:?} is not a number"),
                    AttributePath::new(attr),
                ),
            }
        }
        for (var, attr, value) in [
            ("JUNOS_FAKEUPDATE_ALSO", "fake_update_also", &mut self.fake_update_also),
            ("JUNOS_FAKEDELETE_ALSO", "fake_delete_also", &mut self.fake_delete_also),
        ] {
            let Some(env) = lookup(var).filter(|_| matches!(value, Value::Null)) else {
                continue;
            };
            match parse_bool(&env) {
                Some(flag) => *value = Value::Value(flag),
                None => diags.error(
                    diag::BAD_FORMAT,
                    format!("{var}={env:?} is not a boolean"),
                    AttributePath::new(attr),
                ),
            }
        }
        self
    }

    fn settings(&self) -> Settings {
        let default = Settings::default();
        Settings {
            cmd_timeout: value_number(&self.cmd_timeout)
                .map(|secs| Duration::from_secs(secs.max(1) as u64))
                .unwrap_or(default.cmd_timeout),
            file_permission: value_str(&self.file_permission)
                .and_then(parse_file_permission)
                .unwrap_or(default.file_permission),
            fake_create_with_setfile: value_str(&self.fake_create_with_setfile).map(PathBuf::from),
            fake_update_also: value_bool(&self.fake_update_also),
            fake_delete_also: value_bool(&self.fake_delete_also),
        }
    }

    /// Transport to the device: local `cli` without host
    fn connection(&self) -> Box<dyn Connection> {
        match value_str(&self.host) {
            None => Box::new(ConnectionLocal::default()),
            Some(host) => {
                let mut ssh = ConnectionSsh::default();
                ssh.host = host.to_owned();
                if let Some(port) = value_number(&self.port).and_then(|port| u16::try_from(port).ok()) {
                    ssh.port = port;
                }
                if let Some(username) = value_str(&self.username) {
                    ssh.username = username.to_owned();
                }
                ssh.password = value_str(&self.password).map(str::to_owned);
                ssh.key_file = value_str(&self.ssh_key_file).map(str::to_owned);
                ssh.key_pass = value_str(&self.ssh_key_pass).map(str::to_owned);
                ssh.timeout = self.settings().cmd_timeout;
                Box::new(ssh)
            }
        }
    }
}

impl<'a> WithValidate for ProviderConfig<'a> {
    fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath) {
        validate_range(
            diags,
            &self.port,
            attr_path.clone().attribute("port"),
            1,
            65535,
        );
        validate_range(
            diags,
            &self.cmd_timeout,
            attr_path.clone().attribute("cmd_timeout"),
            1,
            i64::MAX,
        );
        if let Some(mode) = value_str(&self.file_permission) {
            if parse_file_permission(mode).is_none() {
                diags.error(
                    diag::BAD_FORMAT,
                    format!("{mode:?} is not an octal file mode below 0777"),
                    attr_path.clone().attribute("file_permission"),
                );
            }
        }
        if value_str(&self.fake_create_with_setfile).is_none()
            && !matches!(self.fake_create_with_setfile, Value::Unknown)
        {
            for (name, value) in [
                ("fake_update_also", &self.fake_update_also),
                ("fake_delete_also", &self.fake_delete_also),
            ] {
                if value_bool(value) {
                    missing(
                        diags,
                        attr_path.clone().attribute(name),
                        format!("{name} needs fake_create_with_setfile"),
                    );
                }
            }
        }
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

#[async_trait]
impl Provider for JunosProvider {
    type Config<'a> = ProviderConfig<'a>;
    type MetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(resource_schema(block(
            "Junos devices configuration through the CLI",
            map! {
                "host" => optional_string("IP or name of the device, the local `cli` is used when empty (env: JUNOS_HOST)"),
                "port" => optional_number("Port to connect to with ssh, 22 by default (env: JUNOS_PORT)"),
                "username" => optional_string("User for the ssh connection, `netconf` by default (env: JUNOS_USERNAME)"),
                "password" => sensitive_string("Password of the ssh user, when no key is used (env: JUNOS_PASSWORD)"),
                "ssh_key_file" => optional_string("Private key used by ssh, the ssh agent is used without key or password (env: JUNOS_KEYFILE)"),
                "ssh_key_pass" => sensitive_string("Passphrase of the ssh key (env: JUNOS_KEYPASS)"),
                "cmd_timeout" => optional_number("Timeout of each command in seconds, 60 by default (env: JUNOS_CMD_TIMEOUT)"),
                "file_permission" => optional_string("Octal mode of the setfile, 0644 by default (env: JUNOS_FILE_PERMISSION)"),
                "fake_create_with_setfile" => optional_string("Write the set lines of created resources to this file instead of committing them (env: JUNOS_FAKECREATE_SETFILE)"),
                "fake_update_also" => optional_bool("Also write updates to the setfile (env: JUNOS_FAKEUPDATE_ALSO)"),
                "fake_delete_also" => optional_bool("Also write deletions to the setfile (env: JUNOS_FAKEDELETE_ALSO)"),
            },
            map! {},
        )))
    }

    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::Config<'a>) -> Option<()> {
        let errors = diags.errors.len();
        config
            .with_env(diags, env_var)
            .validate(diags, AttributePath::default());
        (diags.errors.len() == errors).then_some(())
    }

    async fn configure<'a>(
        &self,
        diags: &mut Diagnostics,
        terraform_version: String,
        config: Self::Config<'a>,
    ) -> Option<()> {
        let errors = diags.errors.len();
        let config = config.with_env(diags, env_var);
        config.validate(diags, AttributePath::default());
        if diags.errors.len() != errors {
            return None;
        }

        let connect = config.connection();
        info!(
            %terraform_version,
            connection = connect.name(),
            host = value_str(&config.host).unwrap_or("localhost"),
            "provider configured"
        );
        let client = Arc::new(JunosClient::new(connect, config.settings()));
        match self.client.write() {
            Ok(mut handle) => {
                *handle = Some(client);
                Some(())
            }
            Err(err) => {
                diags.root_error(diag::PROVIDER_NOT_CONFIGURED, err.to_string());
                None
            }
        }
    }

    fn get_resources(
        &self,
        _diags: &mut Diagnostics,
    ) -> Option<HashMap<String, Box<dyn tf_provider::resource::DynamicResource>>> {
        let client = &self.client;
        Some(map! {
            "junos_application" => JunosResourceAdapter::<Application>::new(client.clone()),
            "junos_policyoptions_policy_statement" => JunosResourceAdapter::<PolicyStatement>::new(client.clone()),
            "junos_policyoptions_prefix_list" => JunosResourceAdapter::<PrefixList>::new(client.clone()),
            "junos_rip_neighbor" => JunosResourceAdapter::<RipNeighbor>::new(client.clone()),
            "junos_security_ipsec_vpn" => JunosResourceAdapter::<IpsecVpn>::new(client.clone()),
            "junos_security_log_stream" => JunosResourceAdapter::<LogStream>::new(client.clone()),
            "junos_security_utm_profile_web_filtering_juniper_local" => JunosResourceAdapter::<WebFilteringJuniperLocal>::new(client.clone()),
            "junos_snmp_v3_vacm_accessgroup" => JunosResourceAdapter::<AccessGroup>::new(client.clone()),
            "junos_snmp_v3_vacm_securitytogroup" => JunosResourceAdapter::<SecurityToGroup>::new(client.clone()),
        })
    }

    fn get_data_sources(
        &self,
        _diags: &mut Diagnostics,
    ) -> Option<HashMap<String, Box<dyn tf_provider::data_source::DynamicDataSource>>> {
        Some(map! {
            "junos_application" => JunosDataSource::<Application>::new(self.client.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(vars: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |name| {
            vars.iter()
                .find(|(var, _)| *var == name)
                .map(|(_, value)| (*value).to_owned())
        }
    }

    #[test]
    fn environment_fills_unset_attributes() {
        let mut diags = Diagnostics::default();
        let config = ProviderConfig {
            host: new_str("192.0.2.1"),
            ..Default::default()
        }
        .with_env(
            &mut diags,
            lookup(&[
                ("JUNOS_HOST", "198.51.100.1"),
                ("JUNOS_PORT", "830"),
                ("JUNOS_PASSWORD", "s3cret"),
                ("JUNOS_FAKECREATE_SETFILE", "/tmp/junos.set"),
                ("JUNOS_FAKEDELETE_ALSO", "true"),
            ]),
        );
        assert!(diags.errors.is_empty());
        assert_eq!(config.host, new_str("192.0.2.1"));
        assert_eq!(config.port, new_number(830));
        assert_eq!(config.password, new_str("s3cret"));
        assert_eq!(config.ssh_key_pass, Value::Null);
        assert_eq!(config.fake_delete_also, Value::Value(true));

        let settings = config.settings();
        assert_eq!(
            settings.fake_create_with_setfile,
            Some(PathBuf::from("/tmp/junos.set"))
        );
        assert!(settings.fake_delete_also);
        assert!(!settings.fake_update_also);
        assert_eq!(settings.cmd_timeout, Duration::from_secs(60));
    }

    #[test]
    fn bad_environment_values() {
        let mut diags = Diagnostics::default();
        ProviderConfig::default().with_env(
            &mut diags,
            lookup(&[("JUNOS_PORT", "ssh"), ("JUNOS_FAKEUPDATE_ALSO", "maybe")]),
        );
        assert_eq!(diags.errors.len(), 2);
    }

    #[test]
    fn file_permission_is_octal() {
        assert_eq!(parse_file_permission("0644"), Some(0o644));
        assert_eq!(parse_file_permission("600"), Some(0o600));
        assert_eq!(parse_file_permission("0o755"), Some(0o755));
        assert_eq!(parse_file_permission("0888"), None);
        assert_eq!(parse_file_permission("1777"), None);
    }

    #[test]
    fn validation() {
        let config = ProviderConfig {
            port: new_number(0),
            cmd_timeout: new_number(0),
            file_permission: new_str("999"),
            fake_update_also: Value::Value(true),
            ..Default::default()
        };
        let mut diags = Diagnostics::default();
        config.validate(&mut diags, AttributePath::default());
        assert_eq!(diags.errors.len(), 4);
    }

    #[test]
    fn connection_depends_on_host() {
        assert_eq!(ProviderConfig::default().connection().name(), "local");
        let config = ProviderConfig {
            host: new_str("router"),
            port: new_number(830),
            ..Default::default()
        };
        assert_eq!(config.connection().name(), "ssh");
    }

    #[tokio::test]
    async fn configure_shares_the_client() {
        let provider = JunosProvider::default();
        let mut diags = Diagnostics::default();
        assert!(provider.get_resources(&mut diags).unwrap().len() == 9);
        assert!(provider
            .configure(&mut diags, "1.7.0".to_owned(), ProviderConfig::default())
            .await
            .is_some());
        assert!(provider.client.read().unwrap().is_some());
    }
}
