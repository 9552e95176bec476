//! Newtype identifiers.
//!
//! Wrapping these in distinct types (rather than passing `String` everywhere)
//! is the cheap guard against swapping a market id for a token id at a call
//! site — the compiler catches it, nobody has to remember.

use std::fmt;

macro_rules! string_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[derive(serde::Serialize, serde::Deserialize)]
        pub struct $name(String);

        impl $name {
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

string_id!(MarketId);
string_id!(ConditionId);
string_id!(TokenId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_inner_string() {
        let id = TokenId::new("12345");
        assert_eq!(id.to_string(), "12345");
        assert_eq!(id.as_str(), "12345");
    }

    #[test]
    fn distinct_id_types_do_not_compare() {
        let token = TokenId::new("abc");
        let market = MarketId::new("abc");
        assert_eq!(token.as_str(), market.as_str());
    }
}
