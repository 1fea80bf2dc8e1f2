use std::fmt;
use std::marker::PhantomData;

use http::Method;
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::Deserialize;

use crate::dispatcher::RetryPolicy;

/// Permission descriptor attached to a route, consumed by authorization filters.
pub type Acl = Vec<String>;

/// Key of a route bucket: a concrete HTTP method or the `*` bucket shared by all methods.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MethodKey {
    Any,
    Exact(Method),
}

impl MethodKey {
    /// Parse a bucket key as written in configuration (`GET`, `post`, `*`).
    pub fn parse(s: &str) -> Result<Self, http::method::InvalidMethod> {
        if s.trim() == "*" {
            return Ok(MethodKey::Any);
        }
        Method::from_bytes(s.trim().to_ascii_uppercase().as_bytes()).map(MethodKey::Exact)
    }
}

impl From<Method> for MethodKey {
    fn from(method: Method) -> Self {
        MethodKey::Exact(method)
    }
}

impl fmt::Display for MethodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodKey::Any => f.pad("*"),
            MethodKey::Exact(method) => f.pad(method.as_str()),
        }
    }
}

/// One URL-pattern-to-handler binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    pub pattern: String,
    pub controller: String,
    pub action: String,
    pub acl: Option<Acl>,
}

impl RouteEntry {
    pub fn new(
        pattern: impl Into<String>,
        controller: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            pattern: pattern.into(),
            controller: controller.into(),
            action: action.into(),
            acl: None,
        }
    }

    #[must_use]
    pub fn with_acl<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.acl = Some(permissions.into_iter().map(Into::into).collect());
        self
    }
}

/// Target of a route as written in configuration: `[Controller, action]` or a table with an ACL.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RouteTarget {
    Pair(String, String),
    Detailed {
        controller: String,
        action: String,
        #[serde(default)]
        acl: Option<Acl>,
    },
}

impl RouteTarget {
    fn into_entry(self, pattern: String) -> RouteEntry {
        match self {
            RouteTarget::Pair(controller, action) => RouteEntry::new(pattern, controller, action),
            RouteTarget::Detailed {
                controller,
                action,
                acl,
            } => RouteEntry {
                pattern,
                controller,
                action,
                acl,
            },
        }
    }
}

/// Ordered mapping from method bucket to route entries.
///
/// Declaration order inside a bucket is the only precedence rule the router applies, so the
/// table keeps entries in a `Vec` and never sorts them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteTable {
    buckets: Vec<(MethodKey, Vec<RouteEntry>)>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry to a bucket. Re-declaring a pattern replaces the target in place.
    pub fn insert(&mut self, method: impl Into<MethodKey>, entry: RouteEntry) {
        let method = method.into();
        let idx = match self.buckets.iter().position(|(key, _)| *key == method) {
            Some(idx) => idx,
            None => {
                self.buckets.push((method, Vec::new()));
                self.buckets.len() - 1
            }
        };
        let entries = &mut self.buckets[idx].1;
        match entries.iter_mut().find(|e| e.pattern == entry.pattern) {
            Some(existing) => *existing = entry,
            None => entries.push(entry),
        }
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn route(
        mut self,
        method: impl Into<MethodKey>,
        pattern: &str,
        controller: &str,
        action: &str,
    ) -> Self {
        self.insert(method, RouteEntry::new(pattern, controller, action));
        self
    }

    pub fn bucket(&self, method: &MethodKey) -> Option<&[RouteEntry]> {
        self.buckets
            .iter()
            .find(|(key, _)| key == method)
            .map(|(_, entries)| entries.as_slice())
    }

    pub fn buckets(&self) -> impl Iterator<Item = (&MethodKey, &[RouteEntry])> {
        self.buckets
            .iter()
            .map(|(key, entries)| (key, entries.as_slice()))
    }

    /// Total number of entries across all buckets.
    pub fn len(&self) -> usize {
        self.buckets.iter().map(|(_, entries)| entries.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Map deserialized into a `Vec` so document order survives regardless of the format.
struct Ordered<V>(Vec<(String, V)>);

impl<'de, V: Deserialize<'de>> Deserialize<'de> for Ordered<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedVisitor<V> {
            type Value = Ordered<V>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut items = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, value)) = map.next_entry::<String, V>()? {
                    items.push((key, value));
                }
                Ok(Ordered(items))
            }
        }

        deserializer.deserialize_map(OrderedVisitor(PhantomData))
    }
}

impl<'de> Deserialize<'de> for RouteTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let Ordered(raw) = Ordered::<Ordered<RouteTarget>>::deserialize(deserializer)?;
        let mut table = RouteTable::new();
        for (method, Ordered(routes)) in raw {
            let key = MethodKey::parse(&method)
                .map_err(|_| de::Error::custom(format!("invalid HTTP method `{method}`")))?;
            // An empty bucket is still a declared bucket.
            if table.bucket(&key).is_none() {
                table.buckets.push((key.clone(), Vec::new()));
            }
            for (pattern, target) in routes {
                table.insert(key.clone(), target.into_entry(pattern));
            }
        }
        Ok(table)
    }
}

/// Controller/action pair that renders an error page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "(String, String)")]
pub struct HandlerRef {
    pub controller: String,
    pub action: String,
}

impl HandlerRef {
    pub fn new(controller: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            controller: controller.into(),
            action: action.into(),
        }
    }
}

impl From<(String, String)> for HandlerRef {
    fn from((controller, action): (String, String)) -> Self {
        Self { controller, action }
    }
}

/// Process-wide application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Renders 404 responses; called with the requested URL and a message.
    pub not_found: HandlerRef,
    /// Renders 500 responses; called with the failure message.
    pub server_error: HandlerRef,
    #[serde(default)]
    pub retry: RetryPolicy,
    #[serde(default)]
    pub routes: RouteTable,
}

impl AppConfig {
    pub fn new(routes: RouteTable, not_found: HandlerRef, server_error: HandlerRef) -> Self {
        Self {
            not_found,
            server_error,
            retry: RetryPolicy::default(),
            routes,
        }
    }
}
