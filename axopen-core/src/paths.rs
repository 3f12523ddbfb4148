//! Conversions between colon-style route paths, OpenAPI document paths and
//! axum router paths.
//!
//! Routes are declared as `/pets/:id` or `/files/*rest`. The document uses
//! `/pets/{id}` and `/files/{rest}`; axum 0.8 wants `/pets/{id}` and
//! `/files/{*rest}`. Paths already written with braces pass through.

fn is_word(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Rewrite `:name` and `*name` captures, rendering each with `render`.
fn rewrite(path: &str, render: impl Fn(&str, bool) -> String) -> String {
    let mut out = String::with_capacity(path.len() + 4);
    let mut chars = path.char_indices().peekable();
    let mut segment_start = true;

    while let Some((i, c)) = chars.next() {
        let capture = c == ':' || (c == '*' && segment_start);
        if capture && chars.peek().is_some_and(|(_, n)| is_word(*n)) {
            let start = i + 1;
            let mut end = start;
            while let Some((j, n)) = chars.peek().copied() {
                if !is_word(n) {
                    break;
                }
                end = j + n.len_utf8();
                chars.next();
            }
            out.push_str(&render(&path[start..end], c == '*'));
            segment_start = false;
            continue;
        }
        out.push(c);
        segment_start = c == '/';
    }
    out
}

/// `/pets/:id` → `/pets/{id}`, `/files/*rest` → `/files/{rest}`.
pub fn to_document_path(path: &str) -> String {
    rewrite(path, |name, _| format!("{{{name}}}"))
}

/// `/pets/:id` → `/pets/{id}`, `/files/*rest` → `/files/{*rest}`.
pub fn to_router_path(path: &str) -> String {
    rewrite(path, |name, wildcard| {
        if wildcard {
            format!("{{*{name}}}")
        } else {
            format!("{{{name}}}")
        }
    })
}

/// Concatenate a group prefix (or base URL) with a route path.
pub fn join_paths(prefix: &str, path: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    if path.is_empty() {
        return prefix.to_string();
    }
    if path.starts_with('/') {
        format!("{prefix}{path}")
    } else {
        format!("{prefix}/{path}")
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Operation id from method and path: `GET /pets/:id` → `getPetsById`.
pub fn generate_operation_id(method: &str, path: &str) -> String {
    let mut id = method.to_ascii_lowercase();
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        let param = segment
            .strip_prefix(':')
            .or_else(|| segment.strip_prefix('*'))
            .or_else(|| {
                segment
                    .strip_prefix('{')
                    .and_then(|s| s.strip_suffix('}'))
                    .map(|s| s.trim_start_matches('*'))
            });
        match param {
            Some(name) => {
                id.push_str("By");
                id.push_str(&capitalize(name));
            }
            None => id.push_str(&capitalize(segment)),
        }
    }
    id
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_paths() {
        assert_eq!(to_document_path("/pets/:id"), "/pets/{id}");
        assert_eq!(to_document_path("/a/:x/b/:y_z"), "/a/{x}/b/{y_z}");
        assert_eq!(to_document_path("/files/*rest"), "/files/{rest}");
        assert_eq!(to_document_path("/pets/{id}"), "/pets/{id}");
        assert_eq!(to_document_path("/"), "/");
    }

    #[test]
    fn router_paths() {
        assert_eq!(to_router_path("/pets/:id"), "/pets/{id}");
        assert_eq!(to_router_path("/files/*rest"), "/files/{*rest}");
        assert_eq!(to_router_path("/plain"), "/plain");
    }

    #[test]
    fn operation_ids() {
        assert_eq!(generate_operation_id("GET", "/pets/:id"), "getPetsById");
        assert_eq!(generate_operation_id("POST", "/pets"), "postPets");
        assert_eq!(generate_operation_id("GET", "/"), "get");
        assert_eq!(generate_operation_id("DELETE", "/v1/users/{user_id}"), "deleteV1UsersByUser_id");
    }

    #[test]
    fn joining() {
        assert_eq!(join_paths("/v1", "/pets"), "/v1/pets");
        assert_eq!(join_paths("/v1/", "/pets"), "/v1/pets");
        assert_eq!(join_paths("", "/pets"), "/pets");
        assert_eq!(join_paths("/v1", ""), "/v1");
        assert_eq!(join_paths("/v1", "pets"), "/v1/pets");
    }
}
