//! Implementation of `#[derive(ApiError)]`.
//!
//! Each variant must either carry an `#[api(...)]` attribute describing the
//! HTTP status and user-visible error code of this error, or have a field
//! marked `#[cause]`, in which case both are taken from that field.
//!
//! Recognised arguments of `#[api(...)]`:
//!
//! - `internal`: this error is not to be reported to the user. Such errors
//!   are served as 500 Internal Server Error with no code.
//! - `status = "NAME"`: name of an [`actix_web::http::StatusCode`] constant.
//! - `code = "name"`: machine-readable error code.

use proc_macro2::{Span, TokenStream};
use quote::{quote, quote_spanned};
use syn::{Attribute, Ident, Lit, Meta, NestedMeta, spanned::Spanned};
use synstructure::{BindingInfo, Structure, VariantInfo};

pub fn derive_api_error(s: Structure) -> TokenStream {
    let statuses = s.each_variant(|v| match variant_meta(v) {
        Ok(meta) => meta.status(),
        Err(err) => err,
    });

    let codes = s.each_variant(|v| match variant_meta(v) {
        Ok(meta) => meta.code(),
        Err(err) => err,
    });

    s.gen_impl(quote! {
        extern crate actix_web;
        use std::borrow::Cow;

        gen impl ApiError for @Self {
            fn status(&self) -> actix_web::http::StatusCode {
                match *self { #statuses }
            }

            fn code(&self) -> Option<Cow<'static, str>> {
                match *self { #codes }
            }
        }
    })
}

/// Description of a single variant's error mapping.
enum VariantMeta<'a> {
    /// Variant has `#[api(internal)]`.
    Internal,
    /// Variant has `#[api(status = ..., code = ...)]`.
    Mapped {
        status: Option<Ident>,
        code: Option<Lit>,
    },
    /// Variant has no `#[api]` attribute and delegates to its `#[cause]`.
    Delegated(&'a BindingInfo<'a>),
}

impl<'a> VariantMeta<'a> {
    fn status(&self) -> TokenStream {
        match *self {
            VariantMeta::Internal => quote!(
                actix_web::http::StatusCode::INTERNAL_SERVER_ERROR),
            VariantMeta::Mapped { ref status, .. } => match status {
                Some(status) => quote!(actix_web::http::StatusCode::#status),
                None => quote!(
                    actix_web::http::StatusCode::INTERNAL_SERVER_ERROR),
            },
            VariantMeta::Delegated(cause) => quote!(#cause.status()),
        }
    }

    fn code(&self) -> TokenStream {
        match *self {
            VariantMeta::Internal => quote!(None),
            VariantMeta::Mapped { ref code, .. } => match code {
                Some(code) => quote!(Some(Cow::Borrowed(#code))),
                None => quote!(None),
            },
            VariantMeta::Delegated(cause) => quote!(#cause.code()),
        }
    }
}

fn variant_meta<'a>(v: &'a VariantInfo) -> Result<VariantMeta<'a>, TokenStream> {
    let meta = match find_api_attr(v.ast().attrs)? {
        Some(meta) => meta,
        None => return v.bindings()
            .iter()
            .find(is_cause)
            .map(VariantMeta::Delegated)
            .ok_or_else(|| error(
                v.ast().ident.span(),
                "each variant must be #[api]-annotated or have a #[cause]",
            )),
    };

    let mut internal = false;
    let mut status = None;
    let mut code = None;

    for item in meta.nested {
        match item {
            NestedMeta::Meta(Meta::Path(ref path))
            if path.is_ident("internal") => internal = true,
            NestedMeta::Meta(Meta::NameValue(ref nv))
            if nv.path.is_ident("status") => status = Some(match nv.lit {
                Lit::Str(ref s) => Ident::new(&s.value(), s.span()),
                _ => return Err(error(nv.lit.span(), "expected a string")),
            }),
            NestedMeta::Meta(Meta::NameValue(ref nv))
            if nv.path.is_ident("code") => code = Some(nv.lit.clone()),
            _ => return Err(error(
                item.span(), "expected one of: internal, code, status")),
        }
    }

    if internal {
        if status.is_some() || code.is_some() {
            return Err(error(
                v.ast().ident.span(),
                "internal errors can't have statuses or codes",
            ));
        }
        return Ok(VariantMeta::Internal);
    }

    Ok(VariantMeta::Mapped { status, code })
}

/// Given a list of attributes find `#[api(...)]`, and ensure there is only
/// one of them.
fn find_api_attr(attrs: &[Attribute]) -> Result<Option<syn::MetaList>, TokenStream> {
    let mut attrs = attrs.iter()
        .filter_map(|attr| attr.parse_meta().ok())
        .filter(|meta| meta.path().is_ident("api"));

    let meta = match attrs.next() {
        Some(meta) => meta,
        None => return Ok(None),
    };

    if let Some(meta) = attrs.next() {
        return Err(error(meta.span(), "api attribute must be used exactly once"));
    }

    match meta {
        Meta::List(meta) => {
            if meta.nested.is_empty() {
                Err(error(
                    meta.span(),
                    "api attribute requires at least one argument",
                ))
            } else {
                Ok(Some(meta))
            }
        }
        _ => Err(error(
            meta.span(),
            "api attribute must take a list in parentheses",
        )),
    }
}

fn is_cause(bi: &&BindingInfo) -> bool {
    bi.ast()
        .attrs
        .iter()
        .filter_map(|attr| attr.parse_meta().ok())
        .any(|meta| meta.path().is_ident("cause"))
}

fn error(span: Span, message: &str) -> TokenStream {
    quote_spanned! { span =>
        compile_error!(#message);
    }
}
