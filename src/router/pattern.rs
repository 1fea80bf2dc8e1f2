//! Route pattern compilation.
//!
//! A pattern is literal text with `:name` placeholders and an optional trailing `/*` that makes
//! it greedy. `/user/display/:id/*` compiles to
//! `^/user/display/([a-zA-Z0-9\-_.%()]+)(.*)$`.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::core::ArgVec;

/// Placeholder token inside a pattern (`:id`, `:file_name`).
static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r":[a-zA-Z0-9_\-]+").expect("Failed to compile placeholder regex"));

/// Characters a single placeholder may capture. `/` is not among them.
const SEGMENT: &str = r"([a-zA-Z0-9\-_.%()]+)";

const GREEDY_SUFFIX: &str = "/*";

/// A route pattern compiled into an anchored matcher.
#[derive(Debug, Clone)]
pub struct RoutePattern {
    raw: String,
    matcher: Regex,
    placeholders: usize,
    greedy: bool,
}

impl RoutePattern {
    /// Compile a pattern. Literal text is regex-escaped before placeholders are substituted.
    pub fn compile(raw: &str) -> Result<Self, regex::Error> {
        let (body, greedy) = match raw.strip_suffix(GREEDY_SUFFIX) {
            Some(body) => (body, true),
            None => (raw, false),
        };

        let mut source = String::with_capacity(body.len() + 32);
        source.push('^');
        let mut placeholders = 0;
        let mut last = 0;
        for token in PLACEHOLDER.find_iter(body) {
            source.push_str(&regex::escape(&body[last..token.start()]));
            source.push_str(SEGMENT);
            placeholders += 1;
            last = token.end();
        }
        source.push_str(&regex::escape(&body[last..]));
        if greedy {
            source.push_str("(.*)");
        }
        source.push('$');

        Ok(Self {
            raw: raw.to_owned(),
            matcher: Regex::new(&source)?,
            placeholders,
            greedy,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn is_greedy(&self) -> bool {
        self.greedy
    }

    /// Number of `:name` placeholders.
    pub fn placeholder_count(&self) -> usize {
        self.placeholders
    }

    /// Match a path (query string already stripped) and extract positional arguments.
    ///
    /// Empty captures are dropped. For greedy patterns the tail capture is split on `/`, the
    /// text before its first `/` is discarded and the remaining non-empty segments are appended
    /// after the named captures. Every value is HTML-escaped.
    pub fn extract(&self, path: &str) -> Option<ArgVec> {
        let caps = self.matcher.captures(path)?;
        let mut args: ArgVec = caps
            .iter()
            .skip(1)
            .flatten()
            .map(|m| m.as_str())
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
            .collect();

        if self.greedy && args.len() > self.placeholders {
            if let Some(tail) = args.pop() {
                args.extend(
                    tail.split('/')
                        .skip(1)
                        .filter(|segment| !segment.is_empty())
                        .map(str::to_owned),
                );
            }
        }

        for arg in args.iter_mut() {
            if arg.contains(|c: char| matches!(c, '&' | '<' | '>' | '"' | '\'')) {
                *arg = escape_html(arg);
            }
        }
        Some(args)
    }
}

/// Replace `&`, `<`, `>`, `"` and `'` with HTML entities.
pub fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 8);
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            other => out.push(other),
        }
    }
    out
}

/// Build a URL from a pattern and named arguments.
///
/// `anchor` is never substituted; it is appended verbatim. A pure greedy pattern
/// (`/cms/page/*`) gets every remaining value appended `/`-joined instead of substitution.
pub(crate) fn build_link(pattern: &str, args: &[(&str, &str)]) -> String {
    let anchor = args
        .iter()
        .rfind(|(key, _)| *key == "anchor")
        .map_or("", |(_, value)| *value);
    let values: Vec<(&str, &str)> = args
        .iter()
        .filter(|(key, _)| *key != "anchor")
        .copied()
        .collect();

    let template = match pattern.strip_suffix(GREEDY_SUFFIX) {
        Some(prefix) if prefix.contains(':') => prefix,
        Some(prefix) => {
            let tail: Vec<&str> = values.iter().map(|(_, value)| *value).collect();
            let mut url = String::with_capacity(prefix.len() + 1 + anchor.len() + 16);
            url.push_str(prefix);
            url.push('/');
            url.push_str(&tail.join("/"));
            url.push_str(anchor);
            return url;
        }
        None => pattern,
    };

    let mut url = PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| {
            let token = &caps[0];
            values
                .iter()
                .rfind(|(key, _)| key.strip_prefix(':').unwrap_or(*key) == &token[1..])
                .map_or_else(|| token.to_owned(), |(_, value)| (*value).to_owned())
        })
        .into_owned();
    url.push_str(anchor);
    url
}
