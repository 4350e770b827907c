/// Derive a URL-safe slug from a title.
///
/// Lowercases ASCII alphanumerics, collapses every other run of characters
/// into a single `-`, and trims dashes at both ends.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;

    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

/// First candidate not rejected by `taken`: `base`, then `base-2`, `base-3`, …
pub fn unique_slug(base: &str, taken: impl Fn(&str) -> bool) -> String {
    if !taken(base) {
        return base.to_string();
    }
    (2..)
        .map(|n| format!("{base}-{n}"))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| base.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Heap Exploitation 101"), "heap-exploitation-101");
        assert_eq!(slugify("  PicoCTF 2024: Writeups!! "), "picoctf-2024-writeups");
        assert_eq!(slugify("Web/XSS & CSRF"), "web-xss-csrf");
        assert_eq!(slugify("???"), "");
    }

    #[test]
    fn test_unique_slug() {
        let existing = ["intro", "intro-2"];
        assert_eq!(unique_slug("intro", |s| existing.contains(&s)), "intro-3");
        assert_eq!(unique_slug("fresh", |s| existing.contains(&s)), "fresh");
    }
}
