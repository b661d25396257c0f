//! Connection string composition.
//!
//! Templates use positional slots: `{0}` is the resource name and `{1}` the
//! secret, e.g. `{0}.redis.cache.windows.net:6380,password={1},ssl=True`.
//! `{{` and `}}` produce literal braces. Anything else is copied as-is; the
//! template is not validated here.

use crate::models::secret::{ConnectionString, SecretValue};

/// Substitutes `resource_name` and `secret` into `template` in one pass.
///
/// Inserted text is never scanned again, so braces inside the secret are
/// kept literally.
pub fn compose(template: &str, resource_name: &str, secret: &SecretValue) -> ConnectionString {
    let mut out = String::with_capacity(template.len() + resource_name.len() + secret.expose().len());
    let mut rest = template;

    while let Some(pos) = rest.find(|c: char| c == '{' || c == '}') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if tail.starts_with("{{") {
            out.push('{');
            rest = &tail[2..];
        } else if tail.starts_with("}}") {
            out.push('}');
            rest = &tail[2..];
        } else if tail.starts_with("{0}") {
            out.push_str(resource_name);
            rest = &tail[3..];
        } else if tail.starts_with("{1}") {
            out.push_str(secret.expose());
            rest = &tail[3..];
        } else {
            out.push_str(&tail[..1]);
            rest = &tail[1..];
        }
    }
    out.push_str(rest);

    ConnectionString::new(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const REDIS_TEMPLATE: &str = "{0}.redis.cache.windows.net:6380,abortConnect=false,ssl=true,password={1}";

    #[test]
    fn test_exact_substitution() {
        let conn = compose(REDIS_TEMPLATE, "contoso", &SecretValue::new("k3y="));
        assert_eq!(
            conn.expose(),
            "contoso.redis.cache.windows.net:6380,abortConnect=false,ssl=true,password=k3y="
        );
    }

    #[test]
    fn test_slots_follow_template_order() {
        let conn = compose("pw={1};host={0}", "cache-a", &SecretValue::new("s"));
        assert_eq!(conn.expose(), "pw=s;host=cache-a");
    }

    #[test]
    fn test_secret_with_braces_is_not_rescanned() {
        let conn = compose("{0}:{1}", "host", &SecretValue::new("a{0}b{1}c"));
        assert_eq!(conn.expose(), "host:a{0}b{1}c");
    }

    #[test]
    fn test_escaped_and_unknown_braces() {
        let conn = compose("{{{0}}} {2} {x", "r", &SecretValue::new("s"));
        assert_eq!(conn.expose(), "{r} {2} {x");
    }

    #[test]
    fn test_missing_slot_is_not_an_error() {
        let conn = compose("{0} only", "r", &SecretValue::new("s"));
        assert_eq!(conn.expose(), "r only");
    }

    #[test]
    fn test_repeated_slots_and_empty_inputs() {
        let conn = compose("{0}{0}|{1}", "ab", &SecretValue::new(""));
        assert_eq!(conn.expose(), "abab|");
    }

    #[test]
    fn test_contains_both_inputs_in_order() {
        for (resource, secret) in [("a", "b"), ("cache-01", "Zx9+/=="), ("ünï", "çødé")] {
            let conn = compose(REDIS_TEMPLATE, resource, &SecretValue::new(secret));
            let s = conn.expose();
            let r_at = s.find(resource).unwrap();
            let s_at = s.rfind(secret).unwrap();
            assert!(r_at < s_at);
        }
    }
}
