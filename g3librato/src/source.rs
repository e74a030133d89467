/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::borrow::Cow;

use regex::Regex;

use crate::config::LibratoSinkConfig;

/// Resolves the per-measurement source.
///
/// A match of `source_regex` wins over the static `source`, and the matched
/// span is spliced out of the metric name. The optional `source_prefix` is
/// joined with `.` in front of whatever source was resolved.
#[derive(Clone, Debug, Default)]
pub struct SourceResolver {
    source: Option<String>,
    source_regex: Option<Regex>,
    source_prefix: Option<String>,
}

impl SourceResolver {
    pub fn new(
        source: Option<String>,
        source_regex: Option<Regex>,
        source_prefix: Option<String>,
    ) -> Self {
        SourceResolver {
            source,
            source_regex,
            source_prefix,
        }
    }

    pub fn from_config(config: &LibratoSinkConfig) -> Self {
        SourceResolver::new(
            config.source.clone(),
            config.source_regex.clone(),
            config.source_prefix.clone(),
        )
    }

    /// Search `source_regex` in `name`, returning the name with the whole
    /// match removed and the first capture group.
    pub fn extract<'a>(&self, name: &'a str) -> (Cow<'a, str>, Option<String>) {
        let Some(regex) = &self.source_regex else {
            return (Cow::Borrowed(name), None);
        };
        let Some(captures) = regex.captures(name) else {
            return (Cow::Borrowed(name), None);
        };
        // group 0 always exists for a match
        let Some(whole) = captures.get(0) else {
            return (Cow::Borrowed(name), None);
        };

        let mut spliced = String::with_capacity(name.len() - whole.len());
        spliced.push_str(&name[..whole.start()]);
        spliced.push_str(&name[whole.end()..]);
        let source = captures.get(1).map(|m| m.as_str().to_string());
        (Cow::Owned(spliced), source)
    }

    pub fn resolve<'a>(&self, name: &'a str) -> (Cow<'a, str>, Option<String>) {
        let (name, extracted) = self.extract(name);
        let source = extracted.or_else(|| self.source.clone());
        let source = match (&self.source_prefix, source) {
            (Some(prefix), Some(source)) => Some(format!("{prefix}.{source}")),
            (_, source) => source,
        };
        (name, source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regex(s: &str) -> Option<Regex> {
        Some(Regex::new(s).unwrap())
    }

    #[test]
    fn regex_splice() {
        let resolver = SourceResolver::new(None, regex(r"\.source__(.*?)__"), None);
        let (name, source) = resolver.resolve("baby-animals.source__puppy-cam-1__.active_sessions");
        assert_eq!(name, "baby-animals.active_sessions");
        assert_eq!(source.as_deref(), Some("puppy-cam-1"));
    }

    #[test]
    fn regex_miss_falls_back() {
        let resolver = SourceResolver::new(
            Some("static".to_string()),
            regex(r"^([^-]+)--"),
            None,
        );
        let (name, source) = resolver.resolve("web1--requests");
        assert_eq!(name, "requests");
        assert_eq!(source.as_deref(), Some("web1"));

        let (name, source) = resolver.resolve("requests");
        assert!(matches!(name, Cow::Borrowed("requests")));
        assert_eq!(source.as_deref(), Some("static"));
    }

    #[test]
    fn prefix() {
        let resolver = SourceResolver::new(
            Some("db1".to_string()),
            None,
            Some("prod".to_string()),
        );
        let (_, source) = resolver.resolve("foo");
        assert_eq!(source.as_deref(), Some("prod.db1"));

        let resolver = SourceResolver::new(None, None, Some("prod".to_string()));
        let (_, source) = resolver.resolve("foo");
        assert_eq!(source, None);
    }

    #[test]
    fn nothing_configured() {
        let resolver = SourceResolver::default();
        let (name, source) = resolver.resolve("foo.bar");
        assert_eq!(name, "foo.bar");
        assert_eq!(source, None);
    }
}
