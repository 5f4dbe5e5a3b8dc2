use chrono::{Duration, Utc};
use tcf_prep_portal::models::{Profile, Role, Tier};
use uuid::Uuid;

#[test]
fn test_role_parse_is_lenient_about_formatting() {
    assert_eq!(Role::parse("ADMIN"), Some(Role::Admin));
    assert_eq!(Role::parse(" admin "), Some(Role::Admin));
    assert_eq!(Role::parse("senior-manager"), Some(Role::SeniorManager));
    assert_eq!(Role::parse("Junior Manager"), Some(Role::JuniorManager));
    assert_eq!(Role::parse("student"), Some(Role::Student));
    assert_eq!(Role::parse("user"), Some(Role::User));
}

#[test]
fn test_role_parse_rejects_unknown_values() {
    assert_eq!(Role::parse(""), None);
    assert_eq!(Role::parse("superuser"), None);
    assert_eq!(Role::parse("admins"), None);
}

#[test]
fn test_tier_parse() {
    assert_eq!(Tier::parse("pro"), Some(Tier::Pro));
    assert_eq!(Tier::parse("Premium"), Some(Tier::Premium));
    assert_eq!(Tier::parse("gold"), None);
}

#[test]
fn test_role_wire_names_match_as_str() {
    for role in [Role::Admin, Role::SeniorManager, Role::JuniorManager, Role::User, Role::Student] {
        let json = serde_json::to_value(role).unwrap();
        assert_eq!(json, serde_json::Value::String(role.as_str().to_string()));
        assert_eq!(Role::parse(role.as_str()), Some(role));
    }
}

#[test]
fn test_is_manager() {
    assert!(Role::SeniorManager.is_manager());
    assert!(Role::JuniorManager.is_manager());
    assert!(!Role::Admin.is_manager());
    assert!(!Role::Student.is_manager());
}

#[test]
fn test_effective_tier_respects_expiry() {
    let now = Utc::now();
    let mut profile = Profile {
        id: Uuid::new_v4(),
        email: "a@b.fr".to_string(),
        role: Some(Role::User),
        subscription_tier: Some(Tier::Premium),
        subscription_expires_at: Some(now + Duration::days(30)),
    };
    assert_eq!(profile.effective_tier(now), Some(Tier::Premium));

    profile.subscription_expires_at = Some(now - Duration::seconds(1));
    assert_eq!(profile.effective_tier(now), None);

    let session_user = profile.session_user(now);
    assert_eq!(session_user.role, Some(Role::User));
    assert_eq!(session_user.tier, None);
}
