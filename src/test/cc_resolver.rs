use crate::cc::{self, CcVariant};

#[test]
fn supported_names_resolve_unchanged() {
    for (name, variant) in [("NewReno", CcVariant::NewReno), ("Vegas", CcVariant::Vegas)] {
        let res = cc::resolve(name).expect("supported name must resolve");
        assert_eq!(res.variant, variant);
        assert_eq!(res.resolved_name(), name);
        assert!(!res.substituted, "{name} must not be substituted");
    }
}

#[test]
fn legacy_names_fall_back_to_newreno() {
    for name in ["Reno", "Tahoe"] {
        let res = cc::resolve(name).expect("legacy name must resolve via fallback");
        assert_eq!(res.variant, CcVariant::NewReno);
        assert_eq!(res.requested, name);
        assert!(res.substituted, "{name} must be marked as substituted");
    }
}

#[test]
fn unknown_name_is_a_fatal_error() {
    let err = cc::resolve("Cubic").expect_err("unknown name must be rejected");
    assert_eq!(err.requested, "Cubic");

    let err = cc::resolve("").expect_err("empty name must be rejected");
    assert_eq!(err.requested, "");
}

#[test]
fn resolution_is_case_sensitive_like_the_registered_names() {
    assert!(cc::resolve("vegas").is_err());
    assert!(cc::resolve("newreno").is_err());
}
