mod utils;

use proc_macro::{Delimiter, Group, TokenStream, TokenTree};

/// Runs `main`'s body as the top-level script of a fresh scheduler, then
/// runs the loop and prints the ordered log.
///
/// ```rust,ignore
/// #[phaseloop::main(startup_cost_ms = 2)]
/// fn main() {
///     phaseloop::task::set_immediate(|| phaseloop::task::log("immediate"));
/// }
/// ```
///
/// The process panics with the halting error if the run does not finish.
#[proc_macro_attribute]
pub fn main(attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut tokens: Vec<TokenTree> = item.into_iter().collect();

    let builder = match utils::builder_expr(&attr.to_string()) {
        Ok(builder) => builder,
        Err(message) => return utils::compile_error(&message),
    };

    utils::strip_async(&mut tokens);

    let Some(pos) = utils::body_position(&tokens) else {
        return TokenStream::new();
    };

    let block = match &tokens[pos] {
        TokenTree::Group(g) => g.stream().to_string(),
        _ => unreachable!(),
    };

    let new_block = format!(
        "{{
            let scheduler = {builder};
            match scheduler.block_on(move |_| {{ {block} }}) {{
                ::std::result::Result::Ok(summary) => ::std::print!(\"{{summary}}\"),
                ::std::result::Result::Err(err) => ::std::panic!(\"{{err}}\"),
            }}
        }}"
    );

    replace_body(tokens, pos, &new_block)
}

/// Turns a function into a `#[test]` driven by a fresh scheduler.
///
/// Without parameters, the body is the scheduler's top-level script and the
/// test fails if the run halts:
///
/// ```rust,ignore
/// #[phaseloop::test]
/// fn immediate_runs() {
///     phaseloop::task::set_immediate(|| phaseloop::task::log("immediate"));
/// }
/// ```
///
/// With a single parameter, the configured scheduler is bound to it and the
/// body drives the scheduler itself:
///
/// ```rust,ignore
/// #[phaseloop::test(microtask_limit = 4)]
/// fn starves(scheduler: PhaseScheduler) {
///     assert!(scheduler.run().is_ok());
/// }
/// ```
#[proc_macro_attribute]
pub fn test(attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut tokens = item.into_iter().collect::<Vec<_>>();

    let builder = match utils::builder_expr(&attr.to_string()) {
        Ok(builder) => builder,
        Err(message) => return utils::compile_error(&message),
    };

    utils::strip_async(&mut tokens);

    let binding = match utils::params_position(&tokens) {
        Some(params) => {
            let binding = match &tokens[params] {
                TokenTree::Group(g) => g.stream().to_string(),
                _ => unreachable!(),
            };

            tokens[params] =
                TokenTree::Group(Group::new(Delimiter::Parenthesis, TokenStream::new()));
            binding
        }
        None => String::new(),
    };

    let Some(pos) = utils::body_position(&tokens) else {
        return TokenStream::new();
    };

    let block = match &tokens[pos] {
        TokenTree::Group(g) => g.stream().to_string(),
        _ => unreachable!(),
    };

    let new_block = if binding.trim().is_empty() {
        format!(
            "{{
                let scheduler = {builder};
                if let ::std::result::Result::Err(err) = scheduler.block_on(move |_| {{ {block} }}) {{
                    ::std::panic!(\"{{err}}\");
                }}
            }}"
        )
    } else {
        let binding = binding.trim().trim_end_matches(',');
        format!(
            "{{
                let {binding} = {builder};
                {block}
            }}"
        )
    };

    let test_attr: TokenStream = "#[::core::prelude::v1::test]".parse().unwrap_or_default();
    let mut result: Vec<TokenTree> = test_attr.into_iter().collect();

    result.extend(into_tokens(tokens, pos, &new_block));

    result.into_iter().collect()
}

/// Replaces the body at `pos` with `new_block`.
fn replace_body(tokens: Vec<TokenTree>, pos: usize, new_block: &str) -> TokenStream {
    into_tokens(tokens, pos, new_block).into_iter().collect()
}

fn into_tokens(mut tokens: Vec<TokenTree>, pos: usize, new_block: &str) -> Vec<TokenTree> {
    let stream = match new_block.parse::<TokenStream>() {
        Ok(stream) => stream,
        Err(err) => {
            let message = format!("phaseloop macro error: {err}");
            return utils::compile_error(&message).into_iter().collect();
        }
    };

    tokens[pos] = TokenTree::Group(Group::new(Delimiter::Brace, stream));
    tokens
}
