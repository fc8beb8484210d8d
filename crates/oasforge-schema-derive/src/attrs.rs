//! Parses `#[serde(...)]` and `#[oas(...)]` field attributes into the
//! tokens the derive macro splices into its generated `generate()` body.

use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Attribute, Ident};

/// The subset of `#[serde(...)]` / `#[oas(...)]` meta read per field.
#[derive(Default)]
pub struct FieldAttrs {
    pub rename: Option<String>,
    pub skip: bool,
    pub omit_if_empty: bool,
    pub oas_options: Vec<(String, Option<String>)>,
}

impl FieldAttrs {
    pub fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut out = Self::default();
        for attr in attrs {
            if attr.path().is_ident("serde") {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("rename") {
                        let value = meta.value()?;
                        let lit: syn::LitStr = value.parse()?;
                        out.rename = Some(lit.value());
                    } else if meta.path.is_ident("skip") {
                        out.skip = true;
                    } else if meta.path.is_ident("skip_serializing_if") || meta.path.is_ident("default") {
                        out.omit_if_empty = true;
                        if meta.input.peek(syn::token::Eq) {
                            let value = meta.value()?;
                            let _: syn::LitStr = value.parse()?;
                        }
                    } else if meta.input.peek(syn::token::Eq) {
                        let value = meta.value()?;
                        let _: syn::Lit = value.parse()?;
                    }
                    Ok(())
                })?;
            } else if attr.path().is_ident("oas") {
                attr.parse_nested_meta(|meta| {
                    let Some(key) = meta.path.get_ident().map(Ident::to_string) else {
                        return Ok(());
                    };
                    let value = if meta.input.peek(syn::token::Eq) {
                        let value = meta.value()?;
                        let lit: syn::Lit = value.parse()?;
                        Some(lit_to_string(&lit))
                    } else {
                        None
                    };
                    out.oas_options.push((key, value));
                    Ok(())
                })?;
            }
        }
        Ok(out)
    }
}

fn lit_to_string(lit: &syn::Lit) -> String {
    match lit {
        syn::Lit::Str(s) => s.value(),
        syn::Lit::Int(i) => i.base10_digits().to_owned(),
        syn::Lit::Float(f) => f.base10_digits().to_owned(),
        syn::Lit::Bool(b) => b.value.to_string(),
        other => quote::ToTokens::to_token_stream(other).to_string(),
    }
}

/// Whether `ty` is syntactically `Option<...>` (the "is a pointer" signal
/// used for required-field computation; good enough without full type
/// resolution since this is the universal convention for optional fields).
pub fn is_option_type(ty: &syn::Type) -> bool {
    let syn::Type::Path(p) = ty else { return false };
    p.path
        .segments
        .last()
        .is_some_and(|seg| seg.ident == "Option")
}

/// Build the `oasforge_schema::FieldInfo { ... }` construction tokens for one
/// field, given its parsed attributes.
pub fn field_info_tokens(field_ident: &Ident, field_ty: &syn::Type, attrs: &FieldAttrs) -> TokenStream2 {
    let field_name = field_ident.to_string();
    let wire_name = attrs.rename.clone().unwrap_or_else(|| field_name.clone());
    let omit_if_empty = attrs.omit_if_empty;
    let is_option = is_option_type(field_ty);

    let option_calls = attrs.oas_options.iter().map(|(key, value)| {
        let value_tokens = match value {
            Some(v) => quote! { Some(#v) },
            None => quote! { None },
        };
        quote! { options.apply(#key, #value_tokens); }
    });

    quote! {
        {
            let mut options = ::oasforge_schema::OasOptions::default();
            #(#option_calls)*
            ::oasforge_schema::FieldInfo {
                field_name: #field_name.to_owned(),
                wire_name: #wire_name.to_owned(),
                skip: false,
                omit_if_empty: #omit_if_empty,
                is_option: #is_option,
                options,
            }
        }
    }
}
