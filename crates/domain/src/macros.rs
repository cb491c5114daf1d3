//! Macro for implementing Display and FromStr for unit status enums
//!
//! Status enums are stored as text (task rows, logs, event metadata). The
//! macro gives each of them one canonical lowercase spelling and a
//! case-insensitive parser.
//!
//! # Example
//!
//! ```rust
//! use course_export_domain::impl_status_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Delivery {
//!     Queued,
//!     Delivered,
//! }
//!
//! impl_status_conversions!(Delivery {
//!     Queued => "queued",
//!     Delivered => "delivered",
//! });
//!
//! assert_eq!(Delivery::Queued.to_string(), "queued");
//! ```

/// Implements Display and FromStr traits for unit status enums
///
/// * `$enum_name` - The name of the enum type
/// * `$variant => $str` - Mapping of enum variants to their lowercase string
///   representations
#[macro_export]
macro_rules! impl_status_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => f.write_str($str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}
