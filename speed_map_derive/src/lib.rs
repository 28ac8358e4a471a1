//! Define procedural macro to build service handlers from their config entries
extern crate proc_macro;

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, DeriveInput};

mod config;

/// Implements `speed_map::config::FromServiceConfig` for a struct with named fields.
///
/// Every field becomes a configuration key of the same name. The struct must implement
/// `Default`, the defaults are used for any key missing from the config file. Integer values
/// that do not fit in the field type are rejected.
#[proc_macro_derive(FromServiceConfig)]
pub fn derive_from_service_config(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    config::expand_derive_from_service_config(&input)
        .unwrap_or_else(to_compile_errors)
        .into()
}

fn to_compile_errors(errors: Vec<syn::Error>) -> proc_macro2::TokenStream {
    let compile_errors = errors.iter().map(syn::Error::to_compile_error);
    quote!(#(#compile_errors)*)
}
