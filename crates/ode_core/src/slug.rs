//! URL slugs derived from titles

/// Turn a title into a lowercase, dash-separated slug
///
/// Keeps ASCII letters, digits and underscores, folds whitespace and dash
/// runs into a single dash and drops every other character.
pub fn slugify(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_dash = false;
    for c in text.chars().flat_map(|c| c.to_lowercase()) {
        if c.is_ascii_alphanumeric() || c == '_' {
            out.push(c);
            prev_dash = false;
        } else if (c.is_whitespace() || c == '-') && !prev_dash {
            out.push('-');
            prev_dash = true;
        }
    }
    out.trim_matches(|c| c == '-' || c == '_').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("  Rust: Ownership & Borrowing!  "), "rust-ownership-borrowing");
        assert_eq!(slugify("data_structures -- part 2"), "data_structures-part-2");
        assert_eq!(slugify("???"), "");
    }
}
