use syn::parse::{Parse, ParseStream};
use syn::{Error, Ident, LitInt, Token};

/// Arguments accepted by `#[interlock::main]` and `#[interlock::test]`.
///
/// ```text
/// #[interlock::test]
/// #[interlock::test(worker_threads = 2)]
/// ```
#[derive(Default)]
pub(crate) struct RuntimeArgs {
    pub(crate) worker_threads: Option<LitInt>,
}

impl Parse for RuntimeArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut args = RuntimeArgs::default();

        while !input.is_empty() {
            let key: Ident = input.parse()?;
            input.parse::<Token![=]>()?;

            if key == "worker_threads" {
                let value: LitInt = input.parse()?;

                if value.base10_parse::<usize>()? == 0 {
                    return Err(Error::new_spanned(value, "worker_threads must be > 0"));
                }

                if args.worker_threads.replace(value).is_some() {
                    return Err(Error::new_spanned(key, "duplicate `worker_threads` argument"));
                }
            } else {
                return Err(Error::new_spanned(
                    &key,
                    format!("unknown argument `{key}`, expected `worker_threads`"),
                ));
            }

            if input.is_empty() {
                break;
            }

            input.parse::<Token![,]>()?;
        }

        Ok(args)
    }
}
