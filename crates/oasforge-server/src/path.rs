//! Path-matcher compilation (C7): compiles the document's distinct path
//! templates into a `matchit`-backed matcher ahead of time.

use indexmap::IndexMap;

use crate::error::{Result, ServerError};

/// A compiled set of path templates. Matching a concrete URL path returns
/// the template it matched plus the captured path parameters, insertion
/// ordered as they appear in the template.
pub struct PathMatcher {
    router: matchit::Router<String>,
}

impl PathMatcher {
    /// Compile `templates` ahead of time. Each template uses `{name}` capture
    /// syntax, passed through unchanged to `matchit`.
    pub fn compile<I, S>(templates: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut router = matchit::Router::new();
        for template in templates {
            let template = template.as_ref();
            router
                .insert(template, template.to_owned())
                .map_err(|e| ServerError::PathMatcherCompile {
                    template: template.to_owned(),
                    message: e.to_string(),
                })?;
        }
        Ok(Self { router })
    }

    /// Match a concrete request path against the compiled template set,
    /// returning the matched template and its captured parameters.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<(String, IndexMap<String, String>)> {
        let matched = self.router.at(path).ok()?;
        let params = matched
            .params
            .iter()
            .map(|(name, value)| (name.to_owned(), value.to_owned()))
            .collect();
        Some((matched.value.clone(), params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_literal_and_captures_params() {
        let matcher = PathMatcher::compile(["/pets/{id}", "/pets"]).unwrap();
        let (template, params) = matcher.match_path("/pets/42").unwrap();
        assert_eq!(template, "/pets/{id}");
        assert_eq!(params.get("id"), Some(&"42".to_owned()));

        let (template, params) = matcher.match_path("/pets").unwrap();
        assert_eq!(template, "/pets");
        assert!(params.is_empty());
    }

    #[test]
    fn unmatched_path_returns_none() {
        let matcher = PathMatcher::compile(["/pets/{id}"]).unwrap();
        assert!(matcher.match_path("/owners/1").is_none());
    }

    #[test]
    fn conflicting_templates_fail_to_compile() {
        let result = PathMatcher::compile(["/pets/{id}", "/pets/{petId}"]);
        assert!(result.is_err());
    }
}
