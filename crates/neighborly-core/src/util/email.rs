//! Email normalisation helpers.
//!
//! ## Summary
//! Emails are compared case-insensitively everywhere (whitelist gate, account
//! lookup, bootstrap admins), so every email is trimmed and lowercased before it
//! is stored or compared.

/// Trim surrounding whitespace and lowercase an email address.
#[must_use]
pub fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

/// ## Summary
/// Splits a pasted block of emails into normalised addresses.
///
/// Entries may be separated by commas, semicolons or newlines. Blank entries
/// and entries without an `@` are dropped, and duplicates keep their first
/// position.
#[must_use]
pub fn split_bulk(input: &str) -> Vec<String> {
    let mut emails: Vec<String> = Vec::new();
    for entry in input.split([',', ';', '\n', '\r']) {
        let email = normalize(entry);
        if email.is_empty() || !email.contains('@') {
            continue;
        }
        if !emails.contains(&email) {
            emails.push(email);
        }
    }
    emails
}
