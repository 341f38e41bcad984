//! Newtype IDs for type-safe entity references.
//!
//! The backend identifies records with opaque string IDs (`_id` on the wire).
//! The `define_id!` macro wraps them so enquiry and user IDs cannot be mixed up.

/// Macro to define a type-safe, string-backed ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `Display`
/// - `new()`, `as_str()`, `From<String>` and `From<&str>`
///
/// # Example
///
/// ```rust
/// # use enquiry_desk_core::define_id;
/// define_id!(TicketId);
///
/// let id = TicketId::new("65f1c0ffee");
/// assert_eq!(id.as_str(), "65f1c0ffee");
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
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from its backend representation.
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
                Self(id.to_owned())
            }
        }
    };
}

define_id!(EnquiryId);
define_id!(UserId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_serialize_as_plain_strings() {
        let id = EnquiryId::new("65f1a2b3c4d5e6f708192a3b");
        assert_eq!(
            serde_json::to_string(&id).unwrap(),
            "\"65f1a2b3c4d5e6f708192a3b\""
        );
        let back: UserId = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(back, UserId::from("abc"));
        assert_eq!(back.to_string(), "abc");
    }
}
