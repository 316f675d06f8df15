use std::fmt;

use serde::{Deserialize, Serialize};

/// Maximum display-name length accepted by the destination platform.
const MAX_CODE_CHARS: usize = 32;

/// Characters the destination platform rejects in emoji names, and the
/// tokens they are rewritten to.
const REPLACEMENTS: [(char, &str); 6] = [
    (':', "colon"),
    ('&', "and"),
    ('+', "plus"),
    ('-', "minus"),
    ('(', ""),
    (')', ""),
];

/// A legalized emote display name.
///
/// The only way to build one is [`EmoteCode::legalize`], so holding an
/// `EmoteCode` means the name already passed the rewrite and the length
/// cap. Two raw names that differ only in disallowed characters can
/// legalize to the same code.
#[derive(Clone, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmoteCode(String);

impl EmoteCode {
    /// Rewrite a raw source-catalog name into a legal display name.
    ///
    /// Disallowed characters are replaced with their fixed tokens, then
    /// the result is truncated to 32 characters. The transform is a pure
    /// function of the raw name and is idempotent.
    pub fn legalize(raw: &str) -> Self {
        let mut out = String::with_capacity(raw.len());

        'chars: for ch in raw.chars() {
            for (bad, token) in REPLACEMENTS {
                if ch == bad {
                    out.push_str(token);
                    continue 'chars;
                }
            }
            out.push(ch);
        }

        if out.chars().count() > MAX_CODE_CHARS {
            out = out.chars().take(MAX_CODE_CHARS).collect();
        }

        Self(out)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmoteCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl PartialEq<str> for EmoteCode {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for EmoteCode {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
