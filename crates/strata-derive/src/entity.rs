//! Entity derive macro implementation

use heck::ToShoutySnakeCase;
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::ext::IdentExt;
use syn::punctuated::Punctuated;
use syn::{Data, DeriveInput, Fields, LitStr, Result};

/// Parsed field-level `#[orm(...)]` attribute.
///
/// Accepts either `column = "name"` or a raw tag string such as
/// `"column=name"`, which is passed through untouched.
#[derive(Default)]
struct FieldAttr {
    tag: Option<String>,
}

impl syn::parse::Parse for FieldAttr {
    fn parse(input: syn::parse::ParseStream) -> Result<Self> {
        if input.peek(LitStr) {
            let raw: LitStr = input.parse()?;
            return Ok(FieldAttr {
                tag: Some(raw.value()),
            });
        }

        let mut pairs = Vec::new();
        while !input.is_empty() {
            let key: syn::Ident = input.parse()?;
            let _: syn::Token![=] = input.parse()?;
            let value: LitStr = input.parse()?;
            if key != "column" {
                return Err(syn::Error::new_spanned(
                    &key,
                    format!("unknown orm field attribute `{key}`"),
                ));
            }
            pairs.push(format!("{key}={}", value.value()));

            if input.peek(syn::Token![,]) {
                let _: syn::Token![,] = input.parse()?;
            } else {
                break;
            }
        }

        Ok(FieldAttr {
            tag: (!pairs.is_empty()).then(|| pairs.join(",")),
        })
    }
}

fn field_attr(field: &syn::Field) -> Result<FieldAttr> {
    let mut out = FieldAttr::default();
    for attr in &field.attrs {
        if attr.path().is_ident("orm") {
            let parsed: FieldAttr = attr.parse_args()?;
            if parsed.tag.is_some() {
                out = parsed;
            }
        }
    }
    Ok(out)
}

/// Struct-level `#[orm(table = "...")]`, if present.
fn table_name(input: &DeriveInput) -> Result<Option<String>> {
    for attr in &input.attrs {
        if attr.path().is_ident("orm") {
            let nested = attr.parse_args::<syn::MetaNameValue>()?;
            if !nested.path.is_ident("table") {
                return Err(syn::Error::new_spanned(
                    &nested.path,
                    "expected #[orm(table = \"table_name\")]",
                ));
            }
            if let syn::Expr::Lit(syn::ExprLit {
                lit: syn::Lit::Str(lit),
                ..
            }) = &nested.value
            {
                return Ok(Some(lit.value()));
            }
            return Err(syn::Error::new_spanned(
                &nested.value,
                "table name must be a string literal",
            ));
        }
    }
    Ok(None)
}

/// Fails on `#[repr(packed)]`; fields are accessed through aligned pointers.
fn reject_packed(input: &DeriveInput) -> Result<()> {
    for attr in &input.attrs {
        if !attr.path().is_ident("repr") {
            continue;
        }
        let reprs = attr.parse_args_with(
            Punctuated::<syn::Meta, syn::Token![,]>::parse_terminated,
        )?;
        if let Some(packed) = reprs.iter().find(|m| m.path().is_ident("packed")) {
            return Err(syn::Error::new_spanned(
                packed,
                "Entity cannot be derived for #[repr(packed)] structs",
            ));
        }
    }
    Ok(())
}

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Entity cannot be derived for generic structs",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "Entity can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "Entity can only be derived for structs",
            ));
        }
    };

    reject_packed(&input)?;

    let struct_name = name.unraw().to_string();
    let table = match table_name(&input)? {
        Some(t) => quote! { ::core::option::Option::Some(#t) },
        None => quote! { ::core::option::Option::None },
    };

    let mut infos = Vec::with_capacity(fields.len());
    let mut reads = Vec::with_capacity(fields.len());
    let mut writes = Vec::with_capacity(fields.len());
    let mut consts = Vec::with_capacity(fields.len());

    for field in fields {
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let ty = &field.ty;
        let field_name = ident.unraw().to_string();
        let tag = match field_attr(field)?.tag {
            Some(t) => quote! { ::core::option::Option::Some(#t) },
            None => quote! { ::core::option::Option::None },
        };

        infos.push(quote! {
            ::strata::reflect::FieldInfo {
                name: #field_name,
                ty: ::strata::reflect::FieldType::of::<#ty>(),
                tag: #tag,
                offset: ::core::mem::offset_of!(#name, #ident),
                raw: ::strata::reflect::RawAccess::of::<#ty>(),
            }
        });
        reads.push(quote! {
            #field_name => ::core::option::Option::Some(
                ::strata::value::ToValue::to_value(&self.#ident)
            ),
        });
        writes.push(quote! {
            #field_name => ::core::option::Option::Some(
                <#ty as ::strata::value::FromValue>::from_value(value).map(|v| {
                    self.#ident = v;
                })
            ),
        });

        let const_name = format_ident!("FIELD_{}", field_name.to_shouty_snake_case());
        consts.push(quote! {
            pub const #const_name: &'static str = #field_name;
        });
    }

    Ok(quote! {
        // SAFETY: offsets come from `offset_of!` on this struct, accessors are
        // built for each field's declared type, and packed layouts are rejected.
        unsafe impl ::strata::reflect::Reflect for #name {
            fn type_info() -> ::strata::reflect::TypeInfo {
                ::strata::reflect::TypeInfo::Struct(::strata::reflect::StructInfo {
                    name: #struct_name,
                    type_id: ::core::any::TypeId::of::<#name>(),
                    size: ::core::mem::size_of::<#name>(),
                    table_name: #table,
                    fields: ::std::vec![#(#infos),*],
                })
            }
        }

        impl ::strata::reflect::Entity for #name {
            fn read_field(&self, field: &str) -> ::core::option::Option<::strata::value::Value> {
                match field {
                    #(#reads)*
                    _ => ::core::option::Option::None,
                }
            }

            #[allow(unused_variables)]
            fn write_field(
                &mut self,
                field: &str,
                value: ::strata::value::Value,
            ) -> ::core::option::Option<::core::result::Result<(), ::std::string::String>> {
                match field {
                    #(#writes)*
                    _ => ::core::option::Option::None,
                }
            }
        }

        impl #name {
            #(#consts)*
        }
    })
}
