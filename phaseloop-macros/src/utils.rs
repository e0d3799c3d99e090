use proc_macro::{Delimiter, TokenTree};

/// Options accepted as integers and forwarded unchanged to the builder.
const COUNT_OPTIONS: &[&str] = &["microtask_limit", "max_ticks", "poll_callback_limit"];

/// Options accepted in milliseconds and forwarded as a `Duration`.
const MILLIS_OPTIONS: &[&str] = &["poll_budget_ms", "timer_resolution_ms", "startup_cost_ms"];

/// Builds the `SchedulerBuilder` expression described by an attribute.
///
/// The attribute is a comma-separated list of `key = value` pairs, for
/// example `microtask_limit = 8, startup_cost_ms = 2`. Keys ending in
/// `_ms` take milliseconds and map to the builder method without the
/// suffix.
///
/// Returns an error message naming the first malformed or unknown option.
pub(crate) fn builder_expr(attr: &str) -> Result<String, String> {
    let mut builder = String::from("::phaseloop::SchedulerBuilder::new()");

    for part in attr.split(',') {
        let part = part.trim();

        if part.is_empty() {
            continue;
        }

        let Some((key, value)) = part.split_once('=') else {
            return Err(format!("expected `key = value`, found `{part}`"));
        };

        let key = key.trim();
        let value = value.trim().replace('_', "");

        if value.parse::<u64>().is_err() {
            return Err(format!("`{key}` expects an integer, found `{value}`"));
        }

        if COUNT_OPTIONS.contains(&key) {
            builder.push_str(&format!(".{key}({value})"));
        } else if MILLIS_OPTIONS.contains(&key) {
            let method = key.trim_end_matches("_ms");
            builder.push_str(&format!(
                ".{method}(::std::time::Duration::from_millis({value}))"
            ));
        } else {
            return Err(format!("unknown phaseloop option `{key}`"));
        }
    }

    builder.push_str(".build()");

    Ok(builder)
}

/// Returns the position of the function body, the last brace-delimited
/// group of the item.
pub(crate) fn body_position(tokens: &[TokenTree]) -> Option<usize> {
    tokens
        .iter()
        .rposition(|t| matches!(t, TokenTree::Group(g) if g.delimiter() == Delimiter::Brace))
}

/// Returns the position of the parameter list, the first
/// parenthesis-delimited group following the `fn` keyword.
pub(crate) fn params_position(tokens: &[TokenTree]) -> Option<usize> {
    let fn_pos = tokens
        .iter()
        .position(|t| matches!(t, TokenTree::Ident(id) if id.to_string() == "fn"))?;

    tokens
        .iter()
        .skip(fn_pos)
        .position(|t| matches!(t, TokenTree::Group(g) if g.delimiter() == Delimiter::Parenthesis))
        .map(|offset| fn_pos + offset)
}

/// Removes a leading `async` keyword, if present.
pub(crate) fn strip_async(tokens: &mut Vec<TokenTree>) {
    if let Some(pos) = tokens
        .iter()
        .position(|t| matches!(t, TokenTree::Ident(id) if id.to_string() == "async"))
    {
        tokens.remove(pos);
    }
}

/// Expands to a `compile_error!` carrying `message`.
pub(crate) fn compile_error(message: &str) -> proc_macro::TokenStream {
    format!("compile_error!({message:?});")
        .parse()
        .unwrap_or_default()
}
