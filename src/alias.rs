/*
 * Copyright the basalt-mqtt project contributors. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0.
 */

/*!
A module with types for handling outbound topic alias resolution.  The included resolvers
should be sufficient for most use cases, but the trait allows custom resolution
implementations to be injected into a client.
*/

use lru::LruCache;
use std::collections::HashMap;
use std::num::NonZeroUsize;

/// The outcome of resolving a publish against the session's alias state.
#[derive(Default, Copy, Clone, Debug, Eq, PartialEq)]
pub struct OutboundAliasResolution {
    /// True when the alias binding already exists on the server and the topic may be elided.
    pub skip_topic: bool,

    /// Alias to attach to the outgoing publish, if any.
    pub alias: Option<u16>,
}

/// Strategy interface for assigning topic aliases to outbound publishes.
pub trait OutboundAliasResolver {
    /// Largest alias value this resolver will hand out.
    fn maximum_alias_value(&self) -> u16;

    /// Drops all alias bindings.  The server forgets them on every reconnect, so the
    /// resolver must too.  The new maximum is whatever the latest CONNACK advertised.
    fn reset_for_new_connection(&mut self, maximum_alias_value: u16);

    /// Resolves and records the binding a publish to `topic` should use.
    fn resolve_and_apply_topic_alias(&mut self, alias: Option<u16>, topic: &str) -> OutboundAliasResolution;
}

/// Resolver that never aliases anything.
pub struct NullOutboundAliasResolver {}

impl NullOutboundAliasResolver {
    /// Creates a resolver that disables outbound aliasing.
    pub fn new() -> NullOutboundAliasResolver {
        NullOutboundAliasResolver {}
    }
}

impl Default for NullOutboundAliasResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl OutboundAliasResolver for NullOutboundAliasResolver {
    fn maximum_alias_value(&self) -> u16 {
        0
    }

    fn reset_for_new_connection(&mut self, _: u16) {}

    fn resolve_and_apply_topic_alias(&mut self, _: Option<u16>, _: &str) -> OutboundAliasResolution {
        OutboundAliasResolution {
            ..Default::default()
        }
    }
}

/// Resolver that honors user-chosen alias values and remembers which topic each one is
/// currently bound to.
pub struct ManualOutboundAliasResolver {
    maximum_alias_value: u16,

    current_aliases: HashMap<u16, String>,
}

impl ManualOutboundAliasResolver {
    /// Creates a resolver honoring aliases up to the given maximum.
    pub fn new(maximum_alias_value: u16) -> ManualOutboundAliasResolver {
        ManualOutboundAliasResolver {
            maximum_alias_value,
            current_aliases: HashMap::new(),
        }
    }
}

impl OutboundAliasResolver for ManualOutboundAliasResolver {
    fn maximum_alias_value(&self) -> u16 {
        self.maximum_alias_value
    }

    fn reset_for_new_connection(&mut self, maximum_alias_value: u16) {
        self.maximum_alias_value = maximum_alias_value;
        self.current_aliases.clear();
    }

    fn resolve_and_apply_topic_alias(&mut self, alias: Option<u16>, topic: &str) -> OutboundAliasResolution {
        let Some(alias_value) = alias else {
            return OutboundAliasResolution { ..Default::default() };
        };

        if alias_value == 0 || alias_value > self.maximum_alias_value {
            return OutboundAliasResolution { ..Default::default() };
        }

        if let Some(existing_topic) = self.current_aliases.get(&alias_value) {
            if existing_topic == topic {
                return OutboundAliasResolution {
                    skip_topic: true,
                    alias: Some(alias_value),
                };
            }
        }

        self.current_aliases.insert(alias_value, topic.to_string());
        OutboundAliasResolution {
            skip_topic: false,
            alias: Some(alias_value),
        }
    }
}

/// Resolver that assigns aliases automatically, keeping the most recently used topics
/// aliased and rebinding the least recently used alias when the space fills up.
pub struct LruOutboundAliasResolver {
    maximum_alias_value: u16,

    cache: LruCache<String, u16>,
}

impl LruOutboundAliasResolver {
    /// Creates a resolver managing at most the given number of aliases.
    pub fn new(maximum_alias_value: u16) -> LruOutboundAliasResolver {
        LruOutboundAliasResolver {
            maximum_alias_value,
            cache: LruCache::new(NonZeroUsize::new((maximum_alias_value as usize).max(1)).unwrap()),
        }
    }
}

impl OutboundAliasResolver for LruOutboundAliasResolver {
    fn maximum_alias_value(&self) -> u16 {
        self.maximum_alias_value
    }

    fn reset_for_new_connection(&mut self, maximum_alias_value: u16) {
        self.maximum_alias_value = maximum_alias_value;
        self.cache = LruCache::new(NonZeroUsize::new((maximum_alias_value as usize).max(1)).unwrap());
    }

    fn resolve_and_apply_topic_alias(&mut self, _: Option<u16>, topic: &str) -> OutboundAliasResolution {
        if self.maximum_alias_value == 0 {
            return OutboundAliasResolution { ..Default::default() };
        }

        if let Some(alias) = self.cache.get(topic) {
            let alias = *alias;
            return OutboundAliasResolution {
                skip_topic: true,
                alias: Some(alias),
            };
        }

        let alias = if self.cache.len() < self.maximum_alias_value as usize {
            (self.cache.len() + 1) as u16
        } else {
            // rebind the least recently used alias to the new topic
            let (_, alias) = self.cache.pop_lru().unwrap();
            alias
        };

        self.cache.put(topic.to_string(), alias);
        OutboundAliasResolution {
            skip_topic: false,
            alias: Some(alias),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_resolver_never_aliases() {
        let mut resolver = NullOutboundAliasResolver::new();
        assert_eq!(
            OutboundAliasResolution::default(),
            resolver.resolve_and_apply_topic_alias(Some(1), "a/b")
        );
    }

    #[test]
    fn manual_resolver_binds_then_elides() {
        let mut resolver = ManualOutboundAliasResolver::new(10);

        let first = resolver.resolve_and_apply_topic_alias(Some(2), "a/b");
        assert_eq!(OutboundAliasResolution { skip_topic: false, alias: Some(2) }, first);

        let second = resolver.resolve_and_apply_topic_alias(Some(2), "a/b");
        assert_eq!(OutboundAliasResolution { skip_topic: true, alias: Some(2) }, second);

        // rebinding the alias to a different topic resends the topic
        let third = resolver.resolve_and_apply_topic_alias(Some(2), "c/d");
        assert_eq!(OutboundAliasResolution { skip_topic: false, alias: Some(2) }, third);
    }

    #[test]
    fn manual_resolver_rejects_out_of_range_aliases() {
        let mut resolver = ManualOutboundAliasResolver::new(4);
        assert_eq!(None, resolver.resolve_and_apply_topic_alias(Some(0), "a").alias);
        assert_eq!(None, resolver.resolve_and_apply_topic_alias(Some(5), "a").alias);
    }

    #[test]
    fn lru_resolver_assigns_and_reuses() {
        let mut resolver = LruOutboundAliasResolver::new(2);

        let first = resolver.resolve_and_apply_topic_alias(None, "one");
        assert_eq!(OutboundAliasResolution { skip_topic: false, alias: Some(1) }, first);

        let repeat = resolver.resolve_and_apply_topic_alias(None, "one");
        assert_eq!(OutboundAliasResolution { skip_topic: true, alias: Some(1) }, repeat);

        let second = resolver.resolve_and_apply_topic_alias(None, "two");
        assert_eq!(OutboundAliasResolution { skip_topic: false, alias: Some(2) }, second);

        // "one" is now least recently used; a third topic evicts it and takes alias 1
        let third = resolver.resolve_and_apply_topic_alias(None, "three");
        assert_eq!(OutboundAliasResolution { skip_topic: false, alias: Some(1) }, third);

        // the evicted topic must resend its topic string
        let reassigned = resolver.resolve_and_apply_topic_alias(None, "one");
        assert_eq!(false, reassigned.skip_topic);
    }

    #[test]
    fn reset_drops_bindings() {
        let mut resolver = LruOutboundAliasResolver::new(2);
        resolver.resolve_and_apply_topic_alias(None, "one");
        resolver.reset_for_new_connection(2);

        let after_reset = resolver.resolve_and_apply_topic_alias(None, "one");
        assert_eq!(false, after_reset.skip_topic);
    }
}
