//! Small helpers shared by scheme crates.

// Hidden re-exports just for macro expansion.
#[doc(hidden)]
pub mod __reexports {
    pub use serde;
}

/// Declares a unit type that (de)serializes as exactly one string literal.
///
/// Used for protocol constants such as the `"exact"` scheme name: deserializing
/// any other string fails, which turns a scheme mismatch into a parse error.
///
/// ```
/// x402_types::lit_str!(ExactScheme, "exact");
///
/// let parsed: ExactScheme = serde_json::from_str("\"exact\"").unwrap();
/// assert_eq!(parsed.to_string(), "exact");
/// assert!(serde_json::from_str::<ExactScheme>("\"upto\"").is_err());
/// ```
#[macro_export]
macro_rules! lit_str {
    ($name:ident, $value:expr) => {
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
        pub struct $name;

        impl $name {
            pub const VALUE: &'static str = $value;
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                $value
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str($value)
            }
        }

        impl $crate::util::__reexports::serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> ::std::result::Result<S::Ok, S::Error>
            where
                S: $crate::util::__reexports::serde::Serializer,
            {
                serializer.serialize_str($value)
            }
        }

        impl<'de> $crate::util::__reexports::serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> ::std::result::Result<Self, D::Error>
            where
                D: $crate::util::__reexports::serde::Deserializer<'de>,
            {
                let s = <::std::string::String as $crate::util::__reexports::serde::Deserialize>::deserialize(
                    deserializer,
                )?;
                if s == $value {
                    Ok($name)
                } else {
                    Err(<D::Error as $crate::util::__reexports::serde::de::Error>::custom(
                        format!("expected {:?}, got {:?}", $value, s),
                    ))
                }
            }
        }
    };
}
