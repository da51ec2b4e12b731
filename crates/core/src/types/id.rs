//! Newtype identifiers for platform-issued references.
//!
//! LINE hands out opaque string identifiers for users and reply tokens. The
//! `define_id!` macro wraps them so a reply token can never be passed where a
//! user ID is expected.

/// Macro to define a type-safe string identifier.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`
/// - Conversion methods: `new()`, `as_str()`
/// - `From<String>`, `From<&str>` and `Display` implementations
///
/// # Example
///
/// ```rust
/// # use perfume_bot_core::define_id;
/// define_id!(UserId);
/// define_id!(ReplyToken);
///
/// let user = UserId::new("U4af4980629");
/// let token = ReplyToken::new("nHuyWiB7yP5Zw52FIkcQobQuGDXCTA");
///
/// // These are different types, so this won't compile:
/// // let _: UserId = token;
/// assert_eq!(user.as_str(), "U4af4980629");
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new identifier from a string value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

// LINE user identifier (`source.userId`).
define_id!(UserId);
// Single-use token for the reply API (`replyToken`).
define_id!(ReplyToken);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_display_and_conversion() {
        let id = UserId::new("U123");
        assert_eq!(id.to_string(), "U123");
        assert_eq!(id.as_str(), "U123");
        assert_eq!(String::from(id.clone()), "U123");
        assert_eq!(UserId::from("U123"), id);
    }

    #[test]
    fn test_ids_serialize_transparently() {
        let token = ReplyToken::new("abc");
        let json = serde_json::to_string(&token).expect("serialize");
        assert_eq!(json, "\"abc\"");

        let parsed: UserId = serde_json::from_str("\"U999\"").expect("deserialize");
        assert_eq!(parsed.as_str(), "U999");
    }
}
