//! Property tests for in-app boundary resolution

use crate::integration::test_utils::{lookup, FakeHost};
use proptest::prelude::*;
use sentry_host::config::options;
use sentry_host::{Dsn, HostClientFactory};

fn prefix() -> impl Strategy<Value = String> {
    "[a-z]{2,6}(\\.[a-z]{2,6}){0,2}"
}

proptest! {
    #[test]
    fn prop_configured_prefixes_win_over_identity(
        prefixes in prop::collection::vec(prefix(), 1..4),
        identity in prefix(),
    ) {
        let host = FakeHost::new("/cache").identity(&identity).shared();
        let joined = prefixes.join(",");
        let factory = HostClientFactory::from_context(&host, lookup(&[(options::IN_APP_FRAMES, joined.as_str())]));
        let dsn = Dsn::parse("https://pub@sentry.example.com/1").unwrap();

        let resolved = factory.resolve(&dsn).unwrap();
        for p in &prefixes {
            prop_assert!(resolved.in_app.contains(p));
        }
        prop_assert!(resolved.in_app.len() <= prefixes.len());
        if !prefixes.contains(&identity) {
            prop_assert!(!resolved.in_app.contains(&identity));
        }
    }

    #[test]
    fn prop_identity_fallback_is_single_element(identity in prefix()) {
        let host = FakeHost::new("/cache").identity(&identity).shared();
        let factory = HostClientFactory::from_context(&host, lookup(&[]));
        let dsn = Dsn::parse("https://pub@sentry.example.com/1").unwrap();

        let resolved = factory.resolve(&dsn).unwrap();
        prop_assert_eq!(resolved.in_app.iter().collect::<Vec<_>>(), vec![identity.as_str()]);
    }
}

#[test]
fn test_failing_identity_leaves_boundary_empty() {
    let host = FakeHost::new("/cache").failing_identity().shared();
    let factory = HostClientFactory::from_context(&host, lookup(&[]));
    let resolved = factory
        .resolve(&Dsn::parse("https://pub@sentry.example.com/1").unwrap())
        .unwrap();
    assert!(resolved.in_app.is_empty());
}
