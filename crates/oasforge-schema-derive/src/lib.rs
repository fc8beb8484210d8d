//! `#[derive(ApiSchema)]`: generates an `oasforge_schema::ApiSchema`
//! implementation from a struct or enum definition, reading field names,
//! `#[serde(...)]` attributes (name/skip/omitempty-equivalent), and
//! `#[oas(...)]` attributes (the enumerated validation/metadata options)
//! at compile time — the compile-time stand-in for the runtime reflection
//! this crate's host language lacks.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields};

mod attrs;

use attrs::{field_info_tokens, FieldAttrs};

/// See the crate-level documentation.
#[proc_macro_derive(ApiSchema, attributes(oas, serde))]
pub fn derive_api_schema(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand(input: DeriveInput) -> syn::Result<TokenStream2> {
    let ident = &input.ident;

    let body = match &input.data {
        Data::Struct(data) => expand_struct(ident, &data.fields)?,
        Data::Enum(data) => expand_enum(ident, data)?,
        Data::Union(_) => {
            return Err(syn::Error::new_spanned(
                &input,
                "#[derive(ApiSchema)] does not support unions",
            ));
        }
    };

    Ok(quote! {
        #[automatically_derived]
        impl ::oasforge_schema::ApiSchema for #ident {
            fn name_context() -> ::oasforge_schema::NameContext {
                ::oasforge_schema::NameContext::simple(stringify!(#ident), ::core::module_path!())
            }

            fn generate(gen: &mut ::oasforge_schema::SchemaGenerator) -> ::oasforge_schema::oasforge_core::SchemaOrRef {
                #body
            }
        }
    })
}

fn expand_struct(ident: &syn::Ident, fields: &Fields) -> syn::Result<TokenStream2> {
    let Fields::Named(named) = fields else {
        return Err(syn::Error::new_spanned(
            ident,
            "#[derive(ApiSchema)] requires named fields",
        ));
    };

    let mut field_entries = Vec::new();
    for field in &named.named {
        let field_ident = field.ident.as_ref().expect("named field has an ident");
        let field_ty = &field.ty;
        let attrs = FieldAttrs::parse(&field.attrs)?;
        if attrs.skip {
            continue;
        }
        let info_tokens = field_info_tokens(field_ident, field_ty, &attrs);
        field_entries.push(quote! {
            {
                let field_info = #info_tokens;
                let field_schema = <#field_ty as ::oasforge_schema::ApiSchema>::generate(gen);
                let field_schema = ::oasforge_schema::apply_oas_options(field_schema, &field_info.options);
                let field_schema = gen.apply_field_processor(field_schema, &field_info);
                if field_info.is_required() {
                    required.push(field_info.wire_name.clone());
                }
                properties.insert(field_info.wire_name.clone(), field_schema);
            }
        });
    }

    Ok(quote! {
        let type_id = ::core::any::TypeId::of::<#ident>();
        let ctx = <#ident as ::oasforge_schema::ApiSchema>::name_context();
        match gen.reserve_name(type_id, &ctx, || format!("{}_{}", ctx.package_path.replace("::", "_"), ctx.base_name)) {
            ::oasforge_schema::oasforge_core::Reservation::Existing { name } => gen.reference_for(&name),
            ::oasforge_schema::oasforge_core::Reservation::New { name } => {
                let mut properties = ::indexmap::IndexMap::new();
                let mut required: Vec<String> = Vec::new();
                #(#field_entries)*
                let mut schema = ::oasforge_schema::oasforge_core::Schema::object();
                schema.properties = properties;
                schema.required = required;
                gen.fill(type_id, schema);
                gen.reference_for(&name)
            }
        }
    })
}

fn expand_enum(ident: &syn::Ident, data: &syn::DataEnum) -> syn::Result<TokenStream2> {
    let all_unit = data
        .variants
        .iter()
        .all(|v| matches!(v.fields, Fields::Unit));

    if all_unit {
        let variant_names = data.variants.iter().map(|v| {
            let name = v.ident.to_string();
            quote! { #name }
        });
        return Ok(quote! {
            let type_id = ::core::any::TypeId::of::<#ident>();
            let ctx = <#ident as ::oasforge_schema::ApiSchema>::name_context();
            match gen.reserve_name(type_id, &ctx, || format!("{}_{}", ctx.package_path.replace("::", "_"), ctx.base_name)) {
                ::oasforge_schema::oasforge_core::Reservation::Existing { name } => gen.reference_for(&name),
                ::oasforge_schema::oasforge_core::Reservation::New { name } => {
                    let mut schema = ::oasforge_schema::oasforge_core::Schema::string(None);
                    schema.enum_values = vec![#(::serde_json::Value::String(#variant_names.to_owned())),*];
                    gen.fill(type_id, schema);
                    gen.reference_for(&name)
                }
            }
        });
    }

    // Data-carrying variants: `oneOf` composition over each variant's
    // payload. The enum itself is named (like the all-unit case); each
    // branch is the externally-tagged shape serde produces by default —
    // `{"<Variant>": <payload>}` — inlined rather than individually named.
    let variant_branches: Vec<TokenStream2> = data
        .variants
        .iter()
        .map(|v| expand_variant_branch(&v.ident, &v.fields))
        .collect();

    Ok(quote! {
        let type_id = ::core::any::TypeId::of::<#ident>();
        let ctx = <#ident as ::oasforge_schema::ApiSchema>::name_context();
        match gen.reserve_name(type_id, &ctx, || format!("{}_{}", ctx.package_path.replace("::", "_"), ctx.base_name)) {
            ::oasforge_schema::oasforge_core::Reservation::Existing { name } => gen.reference_for(&name),
            ::oasforge_schema::oasforge_core::Reservation::New { name } => {
                let mut schema = ::oasforge_schema::oasforge_core::Schema::empty();
                schema.one_of = vec![#(#variant_branches),*];
                gen.fill(type_id, schema);
                gen.reference_for(&name)
            }
        }
    })
}

/// Build the branch schema for one enum variant, tagged externally under
/// its variant name the way serde's default enum representation does:
/// `Unit` → the bare string; `Variant(T)` / `Variant { a: T, .. }` →
/// `{"Variant": <payload>}`. A tuple variant with more than one field uses
/// its positional indices ("0", "1", ...) as the payload's property names,
/// since JSON Schema has no tuple-array equivalent shared across every OAS
/// version this crate targets.
fn expand_variant_branch(ident: &syn::Ident, fields: &Fields) -> TokenStream2 {
    let name = ident.to_string();
    match fields {
        Fields::Unit => quote! {
            ::oasforge_schema::oasforge_core::SchemaOrRef::inline({
                let mut branch = ::oasforge_schema::oasforge_core::Schema::string(None);
                branch.enum_values = vec![::serde_json::Value::String(#name.to_owned())];
                branch
            })
        },
        Fields::Unnamed(unnamed) if unnamed.unnamed.len() == 1 => {
            let ty = &unnamed.unnamed[0].ty;
            quote! {
                ::oasforge_schema::oasforge_core::SchemaOrRef::inline({
                    let payload = <#ty as ::oasforge_schema::ApiSchema>::generate(gen);
                    let mut branch = ::oasforge_schema::oasforge_core::Schema::object();
                    branch.properties.insert(#name.to_owned(), payload);
                    branch.required.push(#name.to_owned());
                    branch
                })
            }
        }
        Fields::Unnamed(unnamed) => {
            let tys: Vec<_> = unnamed.unnamed.iter().map(|f| &f.ty).collect();
            let indices: Vec<String> = (0..tys.len()).map(|i| i.to_string()).collect();
            quote! {
                ::oasforge_schema::oasforge_core::SchemaOrRef::inline({
                    let mut payload = ::oasforge_schema::oasforge_core::Schema::object();
                    #(
                        payload.properties.insert(#indices.to_owned(), <#tys as ::oasforge_schema::ApiSchema>::generate(gen));
                        payload.required.push(#indices.to_owned());
                    )*
                    let mut branch = ::oasforge_schema::oasforge_core::Schema::object();
                    branch.properties.insert(#name.to_owned(), ::oasforge_schema::oasforge_core::SchemaOrRef::inline(payload));
                    branch.required.push(#name.to_owned());
                    branch
                })
            }
        }
        Fields::Named(named) => {
            let field_names: Vec<String> = named
                .named
                .iter()
                .map(|f| f.ident.as_ref().expect("named field has an ident").to_string())
                .collect();
            let tys: Vec<_> = named.named.iter().map(|f| &f.ty).collect();
            quote! {
                ::oasforge_schema::oasforge_core::SchemaOrRef::inline({
                    let mut payload = ::oasforge_schema::oasforge_core::Schema::object();
                    #(
                        payload.properties.insert(#field_names.to_owned(), <#tys as ::oasforge_schema::ApiSchema>::generate(gen));
                        payload.required.push(#field_names.to_owned());
                    )*
                    let mut branch = ::oasforge_schema::oasforge_core::Schema::object();
                    branch.properties.insert(#name.to_owned(), ::oasforge_schema::oasforge_core::SchemaOrRef::inline(payload));
                    branch.required.push(#name.to_owned());
                    branch
                })
            }
        }
    }
}
