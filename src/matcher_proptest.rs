//! Property-based tests for pattern matching and precedence.
//!
//! These tests use proptest to generate random paths and rule sets and
//! verify that the matching and classification invariants hold for all of
//! them.

#[cfg(test)]
mod proptest_tests {
    use crate::config::{Bucket, RuleSet};
    use crate::inventory::expand;
    use crate::matcher::{matches, CompiledPattern};
    use crate::precedence::{PrecedenceResolver, Reason};
    use proptest::prelude::*;

    fn segment() -> impl Strategy<Value = String> {
        "[a-z0-9_][a-z0-9_.]{0,8}"
    }

    fn relative_path() -> impl Strategy<Value = String> {
        prop::collection::vec(segment(), 1..5).prop_map(|segments| segments.join("/"))
    }

    // ============================================================================
    // matches property tests
    // ============================================================================

    proptest! {
        /// Property: matching is pure, repeated calls agree
        #[test]
        fn matches_is_deterministic(
            pattern in "[a-z0-9*?/._]{1,12}",
            path in "[a-z0-9/._]{1,16}",
        ) {
            let compiled = CompiledPattern::new(&pattern);
            let first = compiled.matches(&path);
            prop_assert_eq!(first, compiled.matches(&path));
            prop_assert_eq!(first, matches(&path, &pattern));
        }

        /// Property: a plain path is a pattern matching itself
        #[test]
        fn literal_pattern_matches_itself(path in relative_path()) {
            prop_assert!(matches(&path, &path), "'{}' should match itself", path);
        }

        /// Property: leading `**/` matches with and without a prefix
        #[test]
        fn leading_double_star_is_optional(
            a in segment(),
            b in segment(),
            c in segment(),
        ) {
            let pattern = format!("**/{}/{}", b, c);
            let nested = format!("{}/{}/{}", a, b, c);
            let direct = format!("{}/{}", b, c);
            prop_assert!(matches(&nested, &pattern));
            prop_assert!(matches(&direct, &pattern));
        }

        /// Property: trailing `/**` matches the directory and everything in it
        #[test]
        fn trailing_double_star_covers_root(dir in segment(), rest in relative_path()) {
            let pattern = format!("{}/**", dir);
            prop_assert!(matches(&dir, &pattern));
            let nested = format!("{}/{}", dir, rest);
            prop_assert!(matches(&nested, &pattern));
        }

        /// Property: a single `*` never crosses a separator
        #[test]
        fn single_star_stays_in_segment(a in segment(), b in segment()) {
            let path = format!("{}/{}", a, b);
            prop_assert!(matches(&a, "*"));
            prop_assert!(!matches(&path, "*"));
        }
    }

    // ============================================================================
    // precedence property tests
    // ============================================================================

    fn rules_with(host: &str, host_paths: &[String], exclude: &[&str]) -> RuleSet {
        let mut rules = RuleSet::new();
        rules.append_to_bucket(&Bucket::Exclude, exclude.iter().copied());
        rules.append_to_bucket(&Bucket::Host(host.to_string()), host_paths.iter().cloned());
        rules
    }

    proptest! {
        /// Property: a path the host declares is always included, even when
        /// every path is excluded
        #[test]
        fn explicit_host_wins_over_exclusion(path in relative_path()) {
            let rules = rules_with("desk", std::slice::from_ref(&path), &["**"]);
            let resolver = PrecedenceResolver::new(&rules);
            let classification = resolver.classify(&path, "desk");
            prop_assert!(classification.include);
            prop_assert_eq!(classification.reason, Reason::ExplicitHost);
        }

        /// Property: without a host declaration, an excluded path is excluded
        #[test]
        fn exclusion_wins_over_default(path in relative_path()) {
            let rules = rules_with("desk", &[], &["**"]);
            let resolver = PrecedenceResolver::new(&rules);
            let classification = resolver.classify(&path, "desk");
            prop_assert!(!classification.include);
            prop_assert_eq!(classification.reason, Reason::Excluded);
        }

        /// Property: paths matching no rule fall back to the shared default
        #[test]
        fn default_is_shared(path in relative_path()) {
            let rules = rules_with("desk", &[], &[]);
            let resolver = PrecedenceResolver::new(&rules);
            let classification = resolver.classify(&path, "desk");
            prop_assert!(classification.include);
            prop_assert_eq!(classification.reason, Reason::DefaultShared);
        }

        /// Property: one record per declared path of the relevant buckets
        #[test]
        fn inventory_is_complete(
            shared in prop::collection::vec(relative_path(), 0..6),
            host in prop::collection::vec(relative_path(), 0..6),
            other in prop::collection::vec(relative_path(), 0..6),
            system in prop::collection::vec(relative_path(), 0..6),
            include_system in any::<bool>(),
        ) {
            let mut rules = RuleSet::new();
            rules.append_to_bucket(&Bucket::Shared, shared.iter().cloned());
            rules.append_to_bucket(&Bucket::Host("desk".into()), host.iter().cloned());
            rules.append_to_bucket(&Bucket::Host("laptop".into()), other.iter().cloned());
            rules.append_to_bucket(&Bucket::System, system.iter().cloned());

            let expected = shared.len() + host.len() + if include_system { system.len() } else { 0 };
            prop_assert_eq!(expand(&rules, "desk", include_system).len(), expected);
        }
    }
}
