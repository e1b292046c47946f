//! Tests for the freeze/thaw controller

use rstest::rstest;

use rsdomain::domain::frozen::{sites, CallSite, FrozenClass, Thawable, ThawableClass};
use rsdomain::util::testing::init_test_setup;
use rsdomain::DomainError;

const OUTSIDE: CallSite = CallSite::new("outside_caller");

#[test]
fn given_strict_declaration_with_unfrozen_flag_when_building_then_errors() {
    // Arrange / Act
    let result = FrozenClass::<i64>::declare("Unfreezable").frozen(false).build();

    // Assert
    assert!(matches!(
        result,
        Err(DomainError::InvalidDeclaration { .. })
    ));
}

#[test]
fn given_empty_class_name_when_building_then_errors() {
    let result = ThawableClass::<i64>::declare("").build();

    assert!(matches!(
        result,
        Err(DomainError::InvalidDeclaration { .. })
    ));
}

#[test]
fn given_frozen_class_when_mutating_class_level_then_errors() {
    // Arrange
    init_test_setup();
    let class = FrozenClass::<i64>::declare("Record")
        .class_attr("a", 1)
        .class_item("i", 2)
        .build()
        .unwrap();

    // Act / Assert: set/del of attrs and items all refuse
    assert!(matches!(
        class.set_attr(OUTSIDE, "c", 3),
        Err(DomainError::FrozenObject { .. })
    ));
    assert!(matches!(
        class.del_attr(OUTSIDE, "a"),
        Err(DomainError::FrozenObject { .. })
    ));
    assert!(matches!(
        class.set_item(OUTSIDE, "j", 4),
        Err(DomainError::FrozenObject { .. })
    ));
    assert!(matches!(
        class.del_item(OUTSIDE, "i"),
        Err(DomainError::FrozenObject { .. })
    ));

    // The declared state is untouched and readable
    assert_eq!(class.class_attr("a"), Some(1));
    assert_eq!(class.class_item("i"), Some(2));
}

#[test]
fn given_frozen_instance_when_built_then_constructor_state_is_readable() {
    let class = FrozenClass::<i64>::declare("Point").build().unwrap();

    let instance = class.instantiate().attr("frozen_attr", 123).finish();

    assert_eq!(instance.attr("frozen_attr"), Some(&123));
    assert!(class.is_frozen());
}

#[test]
fn given_frozen_instance_when_mutating_then_errors_naming_the_target() {
    let class = FrozenClass::<i64>::declare("Point").build().unwrap();
    let mut instance = class.instantiate().attr("frozen_attr", 123).finish();

    let err = instance.set_attr(OUTSIDE, "other", 1).unwrap_err();

    assert!(matches!(err, DomainError::FrozenInstance { .. }));
    assert!(err.to_string().contains("Point"));
    assert!(matches!(
        instance.del_attr(OUTSIDE, "frozen_attr"),
        Err(DomainError::FrozenInstance { .. })
    ));
}

fn set_attr_outside(obj: &mut Thawable<i64>) -> Result<(), DomainError> {
    obj.set_attr(OUTSIDE, "a", 1)
}

fn del_attr_outside(obj: &mut Thawable<i64>) -> Result<(), DomainError> {
    obj.del_attr(OUTSIDE, "seeded").map(|_| ())
}

fn set_item_outside(obj: &mut Thawable<i64>) -> Result<(), DomainError> {
    obj.set_item(OUTSIDE, "i", 1)
}

fn del_item_outside(obj: &mut Thawable<i64>) -> Result<(), DomainError> {
    obj.del_item(OUTSIDE, "seeded").map(|_| ())
}

#[rstest]
#[case(set_attr_outside)]
#[case(del_attr_outside)]
#[case(set_item_outside)]
#[case(del_item_outside)]
fn given_default_thawable_instance_when_mutating_outside_then_errors(
    #[case] mutator: fn(&mut Thawable<i64>) -> Result<(), DomainError>,
) {
    // Arrange: thawable classes are frozen by default
    let class = ThawableClass::<i64>::declare("Thawed").build().unwrap();
    let mut instance = class.instantiate();
    instance.set_attr(sites::INIT, "seeded", 0).unwrap();
    instance.set_item(sites::INIT, "seeded", 0).unwrap();

    // Act
    let result = mutator(&mut instance);

    // Assert
    assert!(matches!(result, Err(DomainError::FrozenInstance { .. })));
}

#[test]
fn given_thawable_instance_when_mutating_from_constructor_site_then_succeeds() {
    let class = ThawableClass::<i64>::declare("Thawed").build().unwrap();
    let mut instance = class.instantiate();

    instance.set_attr(sites::INIT, "thawable_attr", 123).unwrap();

    assert_eq!(instance.attr("thawable_attr"), Some(&123));
}

#[test]
fn given_declared_thawed_site_when_mutating_from_it_then_succeeds() {
    // Arrange: one named call path is exempt, others are not
    let class = ThawableClass::<i64>::declare("Counter")
        .member("change_value")
        .thawed_site("change_value")
        .build()
        .unwrap();
    let mut instance = class.instantiate();
    instance.set_attr(sites::INIT, "value", 123).unwrap();

    // Act / Assert
    instance
        .set_attr(CallSite::new("change_value"), "value", 321)
        .unwrap();
    assert_eq!(instance.attr("value"), Some(&321));

    assert!(matches!(
        instance.set_attr(CallSite::new("unable_to_change_value"), "value", 1),
        Err(DomainError::FrozenInstance { .. })
    ));
}

#[test]
fn given_thaw_without_names_when_called_then_class_is_fully_mutable() {
    let class = ThawableClass::<i64>::declare("Open").build().unwrap();
    assert!(class.is_frozen());

    class.thaw(None, true).unwrap();

    assert!(!class.is_frozen());
    class.set_attr(OUTSIDE, "free", 1).unwrap();
    assert_eq!(class.class_attr("free"), Some(1));

    let mut instance = class.instantiate();
    instance.set_attr(OUTSIDE, "free", 2).unwrap();
}

#[test]
fn given_thawed_class_when_freezing_then_relocks() {
    let class = ThawableClass::<i64>::declare("Relock").build().unwrap();
    class.thaw(None, true).unwrap();

    class.freeze(true).unwrap();

    assert!(class.is_frozen());
    assert!(matches!(
        class.set_attr(OUTSIDE, "a", 1),
        Err(DomainError::FrozenObject { .. })
    ));
}

#[test]
fn given_frozen_class_when_freezing_again_then_strictness_decides() {
    let class = ThawableClass::<i64>::declare("Twice").build().unwrap();

    let strict = class.freeze(true);
    let lenient = class.freeze(false);

    assert!(matches!(strict, Err(DomainError::AlreadyFrozen { .. })));
    assert!(lenient.is_ok());
    assert!(class.is_frozen());
}

#[test]
fn given_unknown_member_when_thawing_with_ensure_then_errors() {
    let class = ThawableClass::<i64>::declare("Checked").build().unwrap();

    let result = class.thaw(Some(&["missing"]), true);

    assert!(matches!(
        result,
        Err(DomainError::ThawMemberNotFound { .. })
    ));
}

#[test]
fn given_unknown_member_when_thawing_without_ensure_then_site_opens() {
    let class = ThawableClass::<i64>::declare("Unchecked").build().unwrap();

    class.thaw(Some(&["missing"]), false).unwrap();

    let mut instance = class.instantiate();
    instance.set_attr(CallSite::new("missing"), "a", 1).unwrap();
}

#[test]
fn given_class_attr_when_thawing_with_ensure_then_it_resolves() {
    let class = ThawableClass::<i64>::declare("Resolved")
        .class_attr("counter", 0)
        .build()
        .unwrap();

    class.thaw(Some(&["counter"]), true).unwrap();

    class.set_attr(CallSite::new("counter"), "counter", 1).unwrap();
    assert_eq!(class.class_attr("counter"), Some(1));
}

#[test]
fn given_subclass_when_parent_thaws_at_runtime_then_subclass_keeps_declared_state() {
    // Arrange: parent declared frozen (the default), then thawed at runtime
    let base = ThawableClass::<i64>::declare("Base").build().unwrap();
    base.thaw(None, true).unwrap();
    assert!(!base.is_frozen());

    // Act: the subclass is seeded from the declared default, not the
    // parent's current runtime state
    let sub = base.subclass("Sub").build().unwrap();

    // Assert
    assert!(sub.is_frozen());
    assert!(!base.is_frozen());
}

#[test]
fn given_subclass_when_either_side_changes_then_the_other_is_unaffected() {
    let base = ThawableClass::<i64>::declare("Base")
        .thawed_site("adjust")
        .build()
        .unwrap();
    let sub = base.subclass("Sub").build().unwrap();

    // Runtime thaw on the parent does not leak into the subclass
    base.thaw(Some(&["extra"]), false).unwrap();
    let mut sub_instance = sub.instantiate();
    assert!(matches!(
        sub_instance.set_attr(CallSite::new("extra"), "a", 1),
        Err(DomainError::FrozenInstance { .. })
    ));

    // Declared sites carry over through the declaration
    sub_instance.set_attr(CallSite::new("adjust"), "a", 1).unwrap();

    // And the reverse direction: thawing the subclass leaves the parent alone
    sub.thaw(None, true).unwrap();
    assert!(base.is_frozen());
}

#[test]
fn given_missing_attribute_when_deleting_from_thawed_class_then_errors() {
    let class = ThawableClass::<i64>::declare("Sparse").build().unwrap();
    class.thaw(None, true).unwrap();

    let result = class.del_attr(OUTSIDE, "absent");

    assert!(matches!(
        result,
        Err(DomainError::AttributeNotFound { .. })
    ));
}
