//! Helper macros and small utilities shared across the crate.
//!
//! Contains the `getter_fn!`/`with_field_fn!` struct-accessor macros and the
//! sequence-name ordering rule used by the chromosome registry.

use std::cmp::Ordering;

/// Prefix stripped from sequence names before ordering comparisons.
pub const SYNTHETIC_NAME_PREFIX: &str = "chr";

#[macro_export]
macro_rules! getter_fn {
    ($field_name: ident, $field_type: ty) => {
        pub fn $field_name(&self) -> &$field_type {
            &self.$field_name
        }
    };
}
pub use getter_fn;

#[macro_export]
macro_rules! with_field_fn {
    ($field_name: ident, $field_type: ty) => {
        paste::paste! {
            pub fn [<with_$field_name>](mut self, value: $field_type) -> Self {
                self.$field_name = value;
                self
            }
        }
    };
}
pub use with_field_fn;

/// Total order over sequence names.
///
/// Numeric names compare as integers and always order before non-numeric
/// names; non-numeric names compare lexically. A recognized synthetic
/// prefix (`chr`) is ignored, so `"chr2"` and `"2"` compare as equal.
pub fn compare_seq_names(
    left: &str,
    right: &str,
) -> Ordering {
    let left = left
        .strip_prefix(SYNTHETIC_NAME_PREFIX)
        .unwrap_or(left);
    let right = right
        .strip_prefix(SYNTHETIC_NAME_PREFIX)
        .unwrap_or(right);

    match (left.parse::<u64>(), right.parse::<u64>()) {
        (Ok(l), Ok(r)) => l.cmp(&r),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => left.cmp(right),
    }
}
