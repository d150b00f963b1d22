//! Derive macros for strata
//!
//! Provides `#[derive(Entity)]`.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod entity;

/// Derive `Reflect` and `Entity` for a struct.
///
/// # Example
///
/// ```ignore
/// use strata::Entity;
///
/// #[derive(Default, Entity)]
/// #[orm(table = "users")]
/// struct User {
///     id: i64,
///     #[orm(column = "nick")]
///     nick_name: String,
///     #[orm("column=created")]
///     created_at: chrono::DateTime<chrono::Utc>,
/// }
/// ```
///
/// # Generated
///
/// - `impl strata::reflect::Reflect` - struct metadata with field offsets and tags
/// - `impl strata::reflect::Entity` - by-name field accessors
/// - `FIELD_*: &'static str` - field name constants for use with `col()`
///
/// # Attributes
///
/// - `#[orm(table = "name")]` - Override the table name (default: snake_case struct name)
/// - `#[orm(column = "name")]` - Override a column name (default: snake_case field name)
/// - `#[orm("key=value,...")]` - Raw tag, validated when the model is registered
///
/// Every field type must implement `ToValue` and `FromValue`.
#[proc_macro_derive(Entity, attributes(orm))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    entity::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
