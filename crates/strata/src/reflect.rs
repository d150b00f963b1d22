//! Type metadata consumed by the model registry.
//!
//! `#[derive(Entity)]` generates the [`Reflect`] and [`Entity`] impls; the
//! registry turns [`TypeInfo`] into a cached [`Model`](crate::model::Model)
//! exactly once per type.

use crate::value::{FromValue, ToValue, Value};
use std::any::{TypeId, type_name};

/// Static type metadata for a Rust type.
///
/// Prefer `#[derive(Entity)]`, which upholds the contract below.
///
/// # Safety
///
/// The pointer resolver reads and writes fields through the returned
/// metadata; the registry only rejects a mismatched struct `TypeId` and
/// fields that fall outside `size`. For a [`TypeInfo::Struct`], `type_id`
/// must be `TypeId::of::<Self>()`, `size` must be `size_of::<Self>()`, and every [`FieldInfo`] must describe a
/// real field of `Self`: `offset` equal to `offset_of!(Self, field)` and
/// `raw` created by `RawAccess::of::<F>()` for that field's type `F`. The
/// struct must not be `#[repr(packed)]`. A [`TypeInfo::Pointer`] must wrap
/// the metadata of a type that upholds the same contract.
pub unsafe trait Reflect: 'static {
    fn type_info() -> TypeInfo;
}

/// Shape of a reflected type.
#[derive(Debug, Clone)]
pub enum TypeInfo {
    Struct(StructInfo),
    /// A single level of indirection (`Box<T>`).
    Pointer(Box<TypeInfo>),
    /// Anything else; carries the type name for diagnostics.
    Other(&'static str),
}

/// Struct-level metadata.
#[derive(Debug, Clone)]
pub struct StructInfo {
    /// Unqualified type name, e.g. `UserProfile`
    pub name: &'static str,
    pub type_id: TypeId,
    /// `size_of::<Self>()`
    pub size: usize,
    /// Explicit table name from `#[orm(table = "...")]`
    pub table_name: Option<&'static str>,
    /// Fields in declaration order
    pub fields: Vec<FieldInfo>,
}

/// Field-level metadata.
#[derive(Debug, Clone)]
pub struct FieldInfo {
    pub name: &'static str,
    pub ty: FieldType,
    /// Raw `orm` tag, a comma-separated `key=value` list
    pub tag: Option<&'static str>,
    /// Byte offset of the field inside the struct
    pub offset: usize,
    pub raw: RawAccess,
}

/// Runtime identity of a field type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldType {
    pub name: &'static str,
    pub id: TypeId,
    pub size: usize,
}

impl FieldType {
    pub fn of<F: 'static>() -> Self {
        Self {
            name: type_name::<F>(),
            id: TypeId::of::<F>(),
            size: size_of::<F>(),
        }
    }
}

/// Monomorphised accessors that read or write a field through a raw pointer
/// to its first byte.
#[derive(Clone, Copy)]
pub struct RawAccess {
    read: unsafe fn(*const u8) -> Value,
    write: unsafe fn(*mut u8, Value) -> Result<(), String>,
}

impl std::fmt::Debug for RawAccess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawAccess").finish_non_exhaustive()
    }
}

unsafe fn read_raw<F: ToValue>(ptr: *const u8) -> Value {
    // SAFETY: caller guarantees `ptr` points to a live, aligned `F`.
    unsafe { (*ptr.cast::<F>()).to_value() }
}

unsafe fn write_raw<F: FromValue>(ptr: *mut u8, value: Value) -> Result<(), String> {
    let decoded = F::from_value(value)?;
    // SAFETY: caller guarantees `ptr` points to a live, aligned, initialized `F`
    // with no outstanding borrows.
    unsafe { *ptr.cast::<F>() = decoded };
    Ok(())
}

impl RawAccess {
    /// Accessors for a field of type `F`.
    pub fn of<F: ToValue + FromValue + 'static>() -> Self {
        Self {
            read: read_raw::<F>,
            write: write_raw::<F>,
        }
    }

    /// Read the field value.
    ///
    /// # Safety
    ///
    /// `ptr` must point to a live, properly aligned value of the type this
    /// accessor was created for.
    pub unsafe fn read(&self, ptr: *const u8) -> Value {
        unsafe { (self.read)(ptr) }
    }

    /// Overwrite the field value.
    ///
    /// # Safety
    ///
    /// `ptr` must point to a live, properly aligned, initialized value of the
    /// type this accessor was created for, and must be valid for writes.
    pub unsafe fn write(&self, ptr: *mut u8, value: Value) -> Result<(), String> {
        unsafe { (self.write)(ptr, value) }
    }
}

/// A struct that maps to a table.
///
/// Usually derived with `#[derive(Entity)]`. The by-name accessors back the
/// reflection resolver; the raw accessors in [`Reflect`] back the pointer
/// resolver.
pub trait Entity: Reflect + Default + Send + Sync {
    /// Read a field by its Rust name; `None` if the field does not exist.
    fn read_field(&self, field: &str) -> Option<Value>;

    /// Write a field by its Rust name; `None` if the field does not exist.
    fn write_field(&mut self, field: &str, value: Value) -> Option<Result<(), String>>;
}

// SAFETY: forwards the metadata of `T`, which upholds the contract.
unsafe impl<T: Reflect> Reflect for Box<T> {
    fn type_info() -> TypeInfo {
        TypeInfo::Pointer(Box::new(T::type_info()))
    }
}

macro_rules! impl_reflect_scalar {
    ($($ty:ty),*) => {$(
        // SAFETY: scalars carry no field metadata.
        unsafe impl Reflect for $ty {
            fn type_info() -> TypeInfo {
                TypeInfo::Other(type_name::<$ty>())
            }
        }
    )*};
}

impl_reflect_scalar!(
    bool,
    i8,
    i16,
    i32,
    i64,
    u8,
    u16,
    u32,
    u64,
    f32,
    f64,
    String,
    Vec<u8>
);
