use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::quote;
use syn::{
    parse_macro_input, parse_quote,
    visit_mut::{self, VisitMut},
    Expr, ExprCall, Ident, Item, ItemFn,
};

const LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

struct ErrorLogger {
    level: Ident,
}

impl ErrorLogger {
    fn inspect(&self) -> proc_macro2::TokenStream {
        let level = &self.level;
        quote! {
            |err| { ::tracing::#level!("{}", err); }
        }
    }

    fn is_err_constructor(call: &ExprCall) -> bool {
        let Expr::Path(path) = &*call.func else {
            return false;
        };
        call.args.len() == 1
            && path
                .path
                .segments
                .last()
                .is_some_and(|segment| segment.ident == "Err")
    }
}

impl VisitMut for ErrorLogger {
    fn visit_expr_mut(&mut self, expr: &mut Expr) {
        // A closure returns to its caller, not to the annotated function.
        if matches!(expr, Expr::Closure(_)) {
            return;
        }

        // Children first, so a rewritten node is never visited twice.
        visit_mut::visit_expr_mut(self, expr);

        let inspect = self.inspect();
        match expr {
            Expr::Try(expr_try) => {
                let inner = &expr_try.expr;
                *expr = parse_quote! {
                    (#inner.inspect_err(#inspect))?
                };
            }
            Expr::Call(call) if Self::is_err_constructor(call) => {
                let error_expr = &call.args[0];
                *expr = parse_quote! {
                    Err(#error_expr).inspect_err(#inspect)
                };
            }
            _ => {}
        }
    }

    // Nested fns and impls are out of reach.
    fn visit_item_mut(&mut self, _item: &mut Item) {}
}

/// Logs every error leaving the annotated function through `?` or an `Err(..)`
/// expression.
///
/// The level defaults to `error` and can be given as `#[log_errors(warn)]`.
/// Every `?` in the body must be applied to a `Result`.
#[proc_macro_attribute]
pub fn log_errors(attr: TokenStream, item: TokenStream) -> TokenStream {
    let level = if attr.is_empty() {
        Ident::new("error", Span::call_site())
    } else {
        parse_macro_input!(attr as Ident)
    };

    if !LEVELS.contains(&level.to_string().as_str()) {
        return syn::Error::new(
            level.span(),
            "log_errors level must be one of error, warn, info, debug or trace",
        )
        .to_compile_error()
        .into();
    }

    let mut input_fn = parse_macro_input!(item as ItemFn);
    let mut logger = ErrorLogger { level };
    logger.visit_block_mut(&mut input_fn.block);

    let output = quote! {
        #input_fn
    };

    output.into()
}
