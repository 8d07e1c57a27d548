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

mod application;
mod policyoptions_policy_statement;
mod policyoptions_prefix_list;
mod rip_neighbor;
mod security_ipsec_vpn;
mod security_log_stream;
mod security_utm_profile_web_filtering_juniper_local;
mod snmp_v3_vacm_accessgroup;
mod snmp_v3_vacm_securitytogroup;

pub use application::Application;
pub use policyoptions_policy_statement::PolicyStatement;
pub use policyoptions_prefix_list::PrefixList;
pub use rip_neighbor::RipNeighbor;
pub use security_ipsec_vpn::IpsecVpn;
pub use security_log_stream::LogStream;
pub use security_utm_profile_web_filtering_juniper_local::WebFilteringJuniperLocal;
pub use snmp_v3_vacm_accessgroup::AccessGroup;
pub use snmp_v3_vacm_securitytogroup::SecurityToGroup;
