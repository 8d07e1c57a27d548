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

//! Reversible `$9$` secrets, as displayed by the device for keys and passwords.

use std::collections::HashMap;

use lazy_static::lazy_static;

use super::Error;

const MAGIC: &str = "$9$";

const FAMILY: [&str; 4] = [
    "QzF3n6/9CAtpu0O",
    "B1IREhcSyrleKvMW8LXx",
    "7N-dVbwsY2g4oaJZGUDj",
    "iHkq.mPf5T",
];

/// Weights of the characters encoding one byte, in turn
const ENCODING: [&[u32]; 7] = [
    &[1, 4, 32],
    &[1, 16, 32],
    &[1, 8, 32],
    &[1, 64],
    &[1, 32],
    &[1, 4, 16, 128],
    &[1, 32, 64],
];

lazy_static! {
    static ref ALPHABET: Vec<char> = FAMILY.concat().chars().collect();
    static ref POSITION: HashMap<char, usize> = ALPHABET
        .iter()
        .enumerate()
        .map(|(i, c)| (*c, i))
        .collect();
    /// Number of random characters following the salt
    static ref EXTRA: HashMap<char, usize> = FAMILY
        .iter()
        .enumerate()
        .flat_map(|(i, family)| family.chars().map(move |c| (c, 3 - i)))
        .collect();
}

pub fn is_secret(value: &str) -> bool {
    value.starts_with(MAGIC)
}

/// Plain text of a `$9$` secret
pub fn decode_secret(value: &str) -> Result<String, Error> {
    let chars: Vec<char> = value
        .strip_prefix(MAGIC)
        .ok_or(Error::BadSecret("missing $9$ prefix"))?
        .chars()
        .collect();
    let (&salt, rest) = chars.split_first().ok_or(Error::BadSecret("empty"))?;
    let toss = *EXTRA
        .get(&salt)
        .ok_or(Error::BadSecret("invalid character"))?;
    let mut rest = rest.get(toss..).ok_or(Error::BadSecret("truncated"))?;

    let mut prev = salt;
    let mut plain = String::new();
    for weights in ENCODING.iter().cycle() {
        if rest.is_empty() {
            break;
        }
        if rest.len() < weights.len() {
            return Err(Error::BadSecret("truncated"));
        }
        let (nibble, tail) = rest.split_at(weights.len());
        rest = tail;

        let mut byte = 0;
        for (&c, weight) in nibble.iter().zip(weights.iter()) {
            byte += gap(prev, c).ok_or(Error::BadSecret("invalid character"))? * weight;
            prev = c;
        }
        plain.push(char::from((byte % 256) as u8));
    }
    Ok(plain)
}

fn gap(from: char, to: char) -> Option<u32> {
    let len = ALPHABET.len();
    let (from, to) = (POSITION.get(&from)?, POSITION.get(&to)?);
    let distance = (to + len - from) % len;
    distance.checked_sub(1).map(|gap| gap as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_secrets() {
        assert_eq!(decode_secret("$9$LbHX-wg4Z").unwrap(), "lc");
        assert_eq!(decode_secret("$9$QabcnA0IEcleW1RrvM8Vb").unwrap(), "s3cret");
        assert_eq!(
            decode_secret("$9$iq5Fu0IRcl/9EylKx7P5QzFn/Ct").unwrap(),
            "rip-key 1"
        );
    }

    #[test]
    fn malformed_secrets() {
        assert!(is_secret("$9$LbHX-wg4Z"));
        assert!(!is_secret("s3cret"));
        assert!(matches!(
            decode_secret("s3cret"),
            Err(Error::BadSecret("missing $9$ prefix"))
        ));
        assert!(matches!(
            decode_secret("$9$LbHX-wg4"),
            Err(Error::BadSecret("truncated"))
        ));
        assert!(matches!(
            decode_secret("$9$Lb HX-wg4Z"),
            Err(Error::BadSecret(_))
        ));
    }
}
