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

//! Summaries of the diagnostics reported to Terraform

pub const MISSING_CONFIG: &str = "Missing Configuration Error";
pub const DUPLICATE_CONFIG: &str = "Duplicate Configuration Error";
pub const CONFLICT_CONFIG: &str = "Conflict Configuration Error";
pub const BAD_FORMAT: &str = "Invalid Attribute Value";
pub const NOT_FOUND: &str = "Not Found Error";
pub const COMPATIBILITY: &str = "Compatibility Error";
pub const PRE_CHECK: &str = "Pre Check Error";
pub const POST_CHECK: &str = "Post Check Error";

pub const PROVIDER_NOT_CONFIGURED: &str = "Provider Not Configured";
pub const CONFIG_READ: &str = "Config Read Error";
pub const CONFIG_SET: &str = "Config Set Error";
pub const COMMIT: &str = "Commit Error";
pub const COMMIT_WARNING: &str = "Commit Warning";
pub const SETFILE: &str = "Setfile Error";
