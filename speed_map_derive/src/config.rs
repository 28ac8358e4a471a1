use proc_macro2::{Ident, TokenStream};
use quote::{format_ident, quote, quote_spanned, ToTokens};
use syn::spanned::Spanned;
use syn::{Data, DeriveInput, Field, Fields, Type};

pub fn expand_derive_from_service_config(
    input: &DeriveInput,
) -> Result<TokenStream, Vec<syn::Error>> {
    let name = &input.ident;
    let setters = config_setters(input)?;
    let expanded = quote! {
        impl crate::config::FromServiceConfig for #name {
            fn from_config(
                config: &crate::config::ServiceConfig,
            ) -> ::std::result::Result<Self, crate::Error> {
                let mut base = Self::default();
                for key in config.parameters() {
                    match key.as_str() {
                        #setters
                        _ => log::warn!(
                            "unknown configuration parameter for {}: {}={:?}",
                            stringify!(#name),
                            key,
                            config.get_parameter(key)
                        ),
                    }
                }
                Ok(base)
            }
        }
    };

    Ok(expanded)
}

/// Generate a match arm setting each field from the config key of the same name
fn config_setters(input: &DeriveInput) -> Result<TokenStream, Vec<syn::Error>> {
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(vec![syn::Error::new(
                    input.span(),
                    "FromServiceConfig requires a struct with named fields",
                )])
            }
        },
        _ => {
            return Err(vec![syn::Error::new(
                input.span(),
                "FromServiceConfig can only be derived for structs",
            )])
        }
    };

    let mut arms = Vec::new();
    let mut errors = Vec::new();
    for field in fields {
        match generate_setter(field) {
            Ok(arm) => arms.push(arm),
            Err(e) => errors.push(e),
        }
    }
    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(quote! { #(#arms,)* })
}

fn generate_setter(field: &Field) -> syn::Result<TokenStream> {
    let name = field
        .ident
        .as_ref()
        .ok_or_else(|| syn::Error::new(field.span(), "field must be named"))?;
    let key = name.to_string();
    let ty = &field.ty;
    let (get_fn, param_kind) = get_param_fn_ident(ty)?;

    // integers are read as i64 and must fit in the field type
    let assignment = match param_kind {
        ParamKind::Integer => quote_spanned! { field.span() =>
            let val = val?;
            base.#name = <#ty as ::std::convert::TryFrom<i64>>::try_from(val).map_err(|_| {
                crate::Error::InvalidConfigurationValue(::std::format!(
                    "invalid value for {}.{}, expected {}: {}",
                    config.handler(),
                    #key,
                    stringify!(#ty),
                    val
                ))
            })?;
        },
        ParamKind::Float => quote_spanned! { field.span() => base.#name = val? as #ty; },
        ParamKind::Exact => quote_spanned! { field.span() => base.#name = val?; },
    };

    Ok(quote_spanned! {
        field.span() => #key => {
            if let Some(val) = config.#get_fn(#key) {
                #assignment
            }
        }
    })
}

enum ParamKind {
    Exact,
    Float,
    Integer,
}

fn get_param_fn_ident(ty: &Type) -> syn::Result<(Ident, ParamKind)> {
    let type_str = ty.to_token_stream().to_string();
    match type_str.as_str() {
        "String" => Ok((format_ident!("get_parameter_as_string"), ParamKind::Exact)),
        "f32" | "f64" => Ok((format_ident!("get_parameter_as_f64"), ParamKind::Float)),
        "u8" | "u16" | "u32" | "u64" | "usize" | "i8" | "i16" | "i32" | "i64" | "isize" => {
            Ok((format_ident!("get_parameter_as_i64"), ParamKind::Integer))
        }
        _ => Err(syn::Error::new(
            ty.span(),
            format!("FromServiceConfig doesn't support fields of type {}", type_str),
        )),
    }
}
