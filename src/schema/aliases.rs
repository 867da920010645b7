//! Key renaming functions used by `alias_function`

use std::sync::OnceLock;

use regex::Regex;

static WORD_BOUNDARY: OnceLock<Option<Regex>> = OnceLock::new();
static CASE_BOUNDARY: OnceLock<Option<Regex>> = OnceLock::new();

fn compiled(cell: &'static OnceLock<Option<Regex>>, pattern: &str) -> Option<&'static Regex> {
    cell.get_or_init(|| Regex::new(pattern).ok()).as_ref()
}

/// `emailAddress` / `EmailAddress` / `HTTPResponse` to `email_address` / `http_response`
pub fn to_snakecase(name: &str) -> String {
    let mut out = name.to_string();
    if let Some(re) = compiled(&WORD_BOUNDARY, r"(.)([A-Z][a-z]+)") {
        out = re.replace_all(&out, "${1}_${2}").into_owned();
    }
    if let Some(re) = compiled(&CASE_BOUNDARY, r"([a-z0-9])([A-Z])") {
        out = re.replace_all(&out, "${1}_${2}").into_owned();
    }
    out.to_lowercase()
}

/// `email_address` / `email-address` to `EmailAddress`
pub fn to_pascalcase(name: &str) -> String {
    name.split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_snakecase() {
        assert_eq!(to_snakecase("emailAddress"), "email_address");
        assert_eq!(to_snakecase("EmailAddress"), "email_address");
        assert_eq!(to_snakecase("HTTPResponse"), "http_response");
        assert_eq!(to_snakecase("already_snake"), "already_snake");
        assert_eq!(to_snakecase("userId2Fa"), "user_id2_fa");
    }

    #[test]
    fn test_to_pascalcase() {
        assert_eq!(to_pascalcase("email_address"), "EmailAddress");
        assert_eq!(to_pascalcase("email-address"), "EmailAddress");
        assert_eq!(to_pascalcase("Email"), "Email");
        assert_eq!(to_pascalcase("__private"), "Private");
    }
}
