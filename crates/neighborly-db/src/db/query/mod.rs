//! Query builders and single-statement query functions, one module per table
//! family. Builders return boxed queries so callers can refine them further.

pub mod allowed_email;
pub mod audit;
pub mod club;
pub mod community;
pub mod event;
pub mod login;
pub mod residence;
pub mod user;

/// Escapes `%`, `_` and `\` so user input matches literally inside `LIKE`.
#[must_use]
pub fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
