//! Name inflection: resource keys from type names, category names from declarations.

/// Convert a single identifier from CamelCase to snake_case.
/// e.g. "UserAccount" -> "user_account", "userId" -> "user_id"
pub fn to_snake_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    for (i, c) in s.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 && !out.ends_with('_') {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Camelize a declared name. Underscores start a new word and `/` becomes a `::` separator.
/// e.g. "payment_required" -> "PaymentRequired", "billing/card_declined" -> "Billing::CardDeclined"
pub fn camelize(s: &str) -> String {
    s.split('/')
        .map(|segment| {
            let mut out = String::with_capacity(segment.len());
            let mut capitalize_next = true;
            for c in segment.chars() {
                if c == '_' {
                    capitalize_next = true;
                } else if capitalize_next {
                    out.extend(c.to_uppercase());
                    capitalize_next = false;
                } else {
                    out.push(c);
                }
            }
            out
        })
        .collect::<Vec<_>>()
        .join("::")
}

/// English plural of a snake_case noun. Covers the regular rules only.
pub fn pluralize(word: &str) -> String {
    if word.is_empty() {
        return String::new();
    }
    if let Some(stem) = word.strip_suffix('y') {
        let before = stem.chars().last();
        if !matches!(before, Some('a' | 'e' | 'i' | 'o' | 'u')) {
            return format!("{}ies", stem);
        }
    }
    if word.ends_with('s')
        || word.ends_with('x')
        || word.ends_with('z')
        || word.ends_with("ch")
        || word.ends_with("sh")
    {
        return format!("{}es", word);
    }
    format!("{}s", word)
}

/// Inverse of [`pluralize`] for the same regular rules.
pub fn singularize(word: &str) -> String {
    if let Some(stem) = word.strip_suffix("ies") {
        return format!("{}y", stem);
    }
    for suffix in ["sses", "xes", "zes", "ches", "shes"] {
        if word.ends_with(suffix) {
            return word[..word.len() - 2].to_string();
        }
    }
    match word.strip_suffix('s') {
        Some(stem) if !stem.ends_with('s') => stem.to_string(),
        _ => word.to_string(),
    }
}

/// Last path segment of a type name with generic arguments removed.
/// e.g. `my_app::models::User` -> `User`
pub fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BlogPost;

    #[test]
    fn snake_case_from_type_names() {
        assert_eq!(to_snake_case("User"), "user");
        assert_eq!(to_snake_case("BlogPost"), "blog_post");
        assert_eq!(to_snake_case("createdAt"), "created_at");
    }

    #[test]
    fn camelize_handles_nesting() {
        assert_eq!(camelize("payment_required"), "PaymentRequired");
        assert_eq!(camelize("billing/card_declined"), "Billing::CardDeclined");
        assert_eq!(camelize("NotFound"), "NotFound");
    }

    #[test]
    fn pluralize_regular_nouns() {
        assert_eq!(pluralize("user"), "users");
        assert_eq!(pluralize("category"), "categories");
        assert_eq!(pluralize("day"), "days");
        assert_eq!(pluralize("box"), "boxes");
        assert_eq!(pluralize("address"), "addresses");
        assert_eq!(pluralize("match"), "matches");
    }

    #[test]
    fn singularize_undoes_pluralize() {
        for word in ["user", "category", "day", "box", "address", "match", "blog_post"] {
            assert_eq!(singularize(&pluralize(word)), word);
        }
        assert_eq!(singularize("glass"), "glass");
    }

    #[test]
    fn short_type_name_strips_path() {
        assert_eq!(short_type_name::<BlogPost>(), "BlogPost");
        assert_eq!(short_type_name::<Vec<BlogPost>>(), "Vec");
    }
}
