use std::fmt;

use serde::{Deserialize, Serialize};

/// Allocation index of a class (or keyframes) name.
///
/// Renders in bijective base-26: `a`..`z`, `aa`, `ab`, ... so every index has
/// exactly one spelling and `parse(render(i)) == i`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClassToken(usize);

impl ClassToken {
    pub fn from_index(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }

    /// Parse a rendered token; `None` for anything outside `[a-z]+`
    pub fn parse(text: &str) -> Option<Self> {
        if text.is_empty() {
            return None;
        }
        let mut n: usize = 0;
        for byte in text.bytes() {
            if !byte.is_ascii_lowercase() {
                return None;
            }
            n = n.checked_mul(26)?.checked_add((byte - b'a') as usize + 1)?;
        }
        Some(Self(n - 1))
    }

    /// Class name with the session prefix applied
    pub fn with_prefix(self, prefix: &str) -> String {
        format!("{}{}", prefix, self)
    }
}

impl fmt::Display for ClassToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut n = self.0 + 1;
        let mut letters = Vec::new();
        while n > 0 {
            n -= 1;
            letters.push(b'a' + (n % 26) as u8);
            n /= 26;
        }
        letters.reverse();
        f.write_str(&String::from_utf8_lossy(&letters))
    }
}

impl From<ClassToken> for String {
    fn from(token: ClassToken) -> Self {
        token.to_string()
    }
}

impl TryFrom<String> for ClassToken {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ClassToken::parse(&value).ok_or_else(|| format!("invalid class token '{}'", value))
    }
}
