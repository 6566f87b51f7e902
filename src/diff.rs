// This file is part of the terraform-provider-huaweicloud project
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

//! Diff suppression
//!
//! The API often reports a value in a different but equivalent form than the
//! one written in the configuration. When reading, an equivalent remote value
//! is replaced by the prior one so that the next plan is empty.

use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use tf_provider::value::{Value, ValueString};

/// Equivalence of two string attributes
pub type Equivalence = fn(&str, &str) -> bool;

/// Equal up to the case
pub fn equal_fold(old: &str, new: &str) -> bool {
    old.to_lowercase() == new.to_lowercase()
}

/// Equal up to leading and trailing whitespaces
pub fn equal_trim_space(old: &str, new: &str) -> bool {
    old.trim() == new.trim()
}

/// Same comma separated elements, in any order
pub fn equal_comma_separated(old: &str, new: &str) -> bool {
    if old.len() != new.len() {
        return false;
    }
    let mut old: Vec<&str> = old.split(',').collect();
    let mut new: Vec<&str> = new.split(',').collect();
    old.sort_unstable();
    new.sort_unstable();
    old == new
}

/// The new version is a prefix of the old one: `8.0` matches `8.0.28`
pub fn equal_version_prefix(old: &str, new: &str) -> bool {
    let split = |version: &str| -> Vec<String> {
        version
            .split(['.', '-'])
            .filter(|part| !part.is_empty())
            .map(str::to_owned)
            .collect()
    };
    let old = split(old);
    let new = split(new);
    new.len() <= old.len() && old.iter().zip(&new).all(|(old, new)| old == new)
}

/// Same instant, whatever the offset used to write it
pub fn equal_time(old: &str, new: &str) -> bool {
    match (
        OffsetDateTime::parse(old, &Rfc3339),
        OffsetDateTime::parse(new, &Rfc3339),
    ) {
        (Ok(old), Ok(new)) => old == new,
        _ => false,
    }
}

/// Keep the prior value when the refreshed one is equivalent
///
/// Returns `true` when the prior value has been kept.
pub fn keep_prior_if<'a>(
    prior: &ValueString<'a>,
    proposed: &mut ValueString<'a>,
    equivalent: Equivalence,
) -> bool {
    let keep = match (prior, &*proposed) {
        (Value::Value(old), Value::Value(new)) => old != new && equivalent(old, new),
        _ => false,
    };
    if keep {
        *proposed = prior.clone();
    }
    keep
}
