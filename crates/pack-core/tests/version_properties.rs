use pack_core::Version;
use pack_core::version::legacy;
use proptest::prelude::*;

fn version_strategy() -> impl Strategy<Value = Version> {
    (
        0u64..20,
        0u64..20,
        0u64..20,
        prop::option::of(("[a-c]{1,3}", prop::option::of(0u64..5))),
    )
        .prop_map(|(major, minor, patch, flag)| {
            let version = Version::new(major, minor, patch);
            match flag {
                Some((name, counter)) => version.with_flag(name, counter),
                None => version,
            }
        })
}

proptest! {
    #[test]
    fn test_exactly_one_of_lt_eq_gt(a in version_strategy(), b in version_strategy()) {
        let holds = [a < b, a == b, a > b];
        prop_assert_eq!(holds.iter().filter(|h| **h).count(), 1);
    }

    #[test]
    fn test_ordering_is_antisymmetric(a in version_strategy(), b in version_strategy()) {
        prop_assert_eq!(a.cmp(&b), b.cmp(&a).reverse());
    }

    #[test]
    fn test_display_round_trips(v in version_strategy()) {
        let text = v.to_string();
        prop_assert_eq!(text.parse::<Version>().unwrap(), v);
    }

    #[test]
    fn test_plain_strings_round_trip(major in 0u64..1000, minor in 0u64..1000, patch in 0u64..1000) {
        let text = format!("{major}.{minor}.{patch}");
        prop_assert_eq!(text.parse::<Version>().unwrap().to_string(), text);
    }

    #[test]
    fn test_legacy_agrees_when_only_one_component_differs(base in 0u64..10, delta in 1u64..10) {
        let low = Version::new(base, 0, 0);
        let high = Version::new(base + delta, 0, 0);
        prop_assert!(legacy::gt(&high, &low) && high > low);
        prop_assert!(legacy::lt(&low, &high) && low < high);
    }
}
