/// Slugs that collide with static routes under `/blogs`.
const RESERVED_SLUGS: [&str; 1] = ["me"];

/// Lowercase ASCII alphanumerics; every run of anything else becomes a single `-`,
/// with none at either end. Non-ASCII letters are dropped. A reserved slug gets a
/// `-1` suffix.
pub fn generate_slug(title: &str) -> String {
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
    if RESERVED_SLUGS.contains(&slug.as_str()) {
        slug.push_str("-1");
    }
    slug
}
