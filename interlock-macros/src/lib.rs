//! Procedural macros for the Interlock runtime.
//!
//! - `#[interlock::main]` turns `async fn main` into a synchronous `main`
//!   running on a fresh runtime.
//! - `#[interlock::test]` does the same for `async` test functions.
//!
//! Both accept an optional `worker_threads = N` argument.

mod args;
use args::RuntimeArgs;

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Error, ItemFn, parse_macro_input};

#[proc_macro_attribute]
pub fn main(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as RuntimeArgs);
    let input = parse_macro_input!(item as ItemFn);

    if input.sig.ident != "main" {
        return Error::new_spanned(&input.sig.ident, "#[interlock::main] must be used on fn main")
            .to_compile_error()
            .into();
    }

    expand(args, input, "#[interlock::main]", quote! {}).into()
}

#[proc_macro_attribute]
pub fn test(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as RuntimeArgs);
    let input = parse_macro_input!(item as ItemFn);

    expand(args, input, "#[interlock::test]", quote! { #[::core::prelude::v1::test] }).into()
}

/// Rewrites `async fn` into a synchronous function that builds a runtime
/// and blocks on the original body.
fn expand(args: RuntimeArgs, input: ItemFn, name: &str, extra: TokenStream2) -> TokenStream2 {
    let ItemFn {
        attrs,
        vis,
        mut sig,
        block,
    } = input;

    if sig.asyncness.take().is_none() {
        return Error::new_spanned(
            sig.fn_token,
            format!("{name} must be used on an async function"),
        )
        .to_compile_error();
    }

    if !sig.inputs.is_empty() {
        return Error::new_spanned(&sig.inputs, format!("{name} functions take no arguments"))
            .to_compile_error();
    }

    let worker_threads = args
        .worker_threads
        .map(|n| quote! { .worker_threads(#n) });

    quote! {
        #extra
        #(#attrs)*
        #vis #sig {
            ::interlock::RuntimeBuilder::new()
                #worker_threads
                .build()
                .expect("failed to build runtime")
                .block_on(async move #block)
        }
    }
}
