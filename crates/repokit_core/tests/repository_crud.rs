mod common;

use common::{contact, raw_count, setup, tag, Contact, Tag};
use repokit_core::{scopes, Order, Query, RepoError, Repository, SqliteRepository};
use rusqlite::types::Value;

#[test]
fn create_populates_generated_fields_and_roundtrips() {
    let conn = setup();
    let repo = SqliteRepository::<Contact>::new(&conn);

    let mut ada = contact("ada", Some("ada@example.com"), Some(36));
    let returned = repo.create(&mut ada, &[]).unwrap().clone();

    assert!(ada.id.is_some());
    assert!(ada.created_at.is_some());
    assert_eq!(returned, ada);

    let loaded = repo.find_by_id(ada.id.unwrap(), &[]).unwrap();
    assert_eq!(loaded, ada);
}

#[test]
fn create_with_caller_id_keeps_it() {
    let conn = setup();
    let repo = SqliteRepository::<Contact>::new(&conn);

    let mut fixed = contact("fixed", None, None);
    fixed.id = Some(42);
    repo.create(&mut fixed, &[]).unwrap();

    assert_eq!(fixed.id, Some(42));
    assert_eq!(repo.find_by_id(42, &[]).unwrap().name, "fixed");
}

#[test]
fn create_honors_omitted_columns() {
    let conn = setup();
    let repo = SqliteRepository::<Contact>::new(&conn);

    let mut pending = contact("pending", None, None);
    pending.status = "ignored".to_string();
    let omit_status = scopes::omit("status");
    repo.create(&mut pending, &[&omit_status]).unwrap();

    assert_eq!(pending.status, "active");
}

#[test]
fn find_by_id_missing_is_not_found() {
    let conn = setup();
    let repo = SqliteRepository::<Contact>::new(&conn);

    let err = repo.find_by_id(999, &[]).unwrap_err();
    assert!(matches!(
        err,
        RepoError::NotFound {
            table: "contacts",
            id: Some(999)
        }
    ));
}

#[test]
fn find_by_id_applies_modifiers() {
    let conn = setup();
    let repo = SqliteRepository::<Contact>::new(&conn);

    let mut ada = contact("ada", None, Some(36));
    repo.create(&mut ada, &[]).unwrap();
    let id = ada.id.unwrap();

    let adults = scopes::filter("age >= ?", [Value::Integer(18)]);
    let minors = scopes::filter("age < ?", [Value::Integer(18)]);
    assert_eq!(repo.find_by_id(id, &[&adults]).unwrap().name, "ada");
    assert!(repo.find_by_id(id, &[&minors]).unwrap_err().is_not_found());
}

#[test]
fn find_by_id_honors_caller_offset() {
    let conn = setup();
    let repo = SqliteRepository::<Contact>::new(&conn);
    for name in ["ada", "bo"] {
        repo.create(&mut contact(name, None, None), &[]).unwrap();
    }
    let bo_id = repo.find_all(&[&scopes::where_eq("name", "bo".to_string())]).unwrap()[0]
        .id
        .unwrap();

    let skip_one = scopes::offset(1);
    assert!(repo.find_by_id(bo_id, &[&skip_one]).unwrap_err().is_not_found());

    let by_name = scopes::order_by("name", Order::Asc);
    let second = repo
        .query_builder(&[&by_name, &skip_one])
        .fetch_one::<Contact>()
        .unwrap();
    assert_eq!(second.name, "bo");
}

#[test]
fn find_all_on_empty_table_returns_empty_vec() {
    let conn = setup();
    let repo = SqliteRepository::<Contact>::new(&conn);

    assert!(repo.find_all(&[]).unwrap().is_empty());
}

#[test]
fn find_all_composes_filters_and_order() {
    let conn = setup();
    let repo = SqliteRepository::<Contact>::new(&conn);
    for (name, age) in [("cy", 40), ("ada", 36), ("bo", 12), ("di", 51)] {
        repo.create(&mut contact(name, None, Some(age)), &[]).unwrap();
    }

    let adults = scopes::filter("age >= ?", [Value::Integer(18)]);
    let by_name = scopes::order_by("name", Order::Asc);
    let names: Vec<String> = repo
        .find_all(&[&adults, &by_name])
        .unwrap()
        .into_iter()
        .map(|item| item.name)
        .collect();

    assert_eq!(names, vec!["ada", "cy", "di"]);
}

#[test]
fn zero_modifiers_behave_like_unmodified_query() {
    let conn = setup();
    let repo = SqliteRepository::<Contact>::new(&conn);
    for name in ["a", "b", "c"] {
        repo.create(&mut contact(name, None, None), &[]).unwrap();
    }

    let via_repo = repo.find_all(&[]).unwrap();
    let via_query = repo.query_builder(&[]).fetch_all::<Contact>().unwrap();

    assert_eq!(via_repo, via_query);
    assert_eq!(repo.query_builder(&[]).query(), &Query::new("contacts", "id"));
    assert_eq!(repo.count(&[]).unwrap(), raw_count(&conn, "contacts"));
}

#[test]
fn update_is_a_full_save() {
    let conn = setup();
    let repo = SqliteRepository::<Contact>::new(&conn);

    let mut ada = contact("ada", Some("ada@example.com"), Some(36));
    repo.create(&mut ada, &[]).unwrap();
    let id = ada.id.unwrap();

    let mut renamed = contact("ada lovelace", None, None);
    repo.update(&mut renamed, id, &[]).unwrap();

    let stored = repo.find_by_id(id, &[]).unwrap();
    assert_eq!(stored.name, "ada lovelace");
    assert_eq!(stored.email, None);
    assert_eq!(stored.age, None);
    assert_eq!(renamed, stored);
}

#[test]
fn update_explicit_id_wins_over_record_id() {
    let conn = setup();
    let repo = SqliteRepository::<Contact>::new(&conn);

    let mut first = contact("first", None, None);
    let mut second = contact("second", None, None);
    repo.create(&mut first, &[]).unwrap();
    repo.create(&mut second, &[]).unwrap();

    let mut edit = first.clone();
    edit.name = "edited".to_string();
    repo.update(&mut edit, second.id.unwrap(), &[]).unwrap();

    assert_eq!(edit.id, second.id);
    assert_eq!(repo.find_by_id(first.id.unwrap(), &[]).unwrap().name, "first");
    assert_eq!(repo.find_by_id(second.id.unwrap(), &[]).unwrap().name, "edited");
}

#[test]
fn update_missing_row_is_not_found() {
    let conn = setup();
    let repo = SqliteRepository::<Contact>::new(&conn);

    let err = repo
        .update(&mut contact("ghost", None, None), 7, &[])
        .unwrap_err();
    assert!(matches!(err, RepoError::NotFound { id: Some(7), .. }));
}

#[test]
fn update_is_scoped_by_modifiers() {
    let conn = setup();
    let repo = SqliteRepository::<Contact>::new(&conn);

    let mut ada = contact("ada", None, Some(36));
    repo.create(&mut ada, &[]).unwrap();
    let id = ada.id.unwrap();

    let only_bo = scopes::where_eq("name", "bo".to_string());
    let err = repo
        .update(&mut contact("changed", None, None), id, &[&only_bo])
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(repo.find_by_id(id, &[]).unwrap().name, "ada");
}

#[test]
fn update_leaves_omitted_columns_unchanged() {
    let conn = setup();
    let repo = SqliteRepository::<Contact>::new(&conn);

    let mut ada = contact("ada", Some("ada@example.com"), Some(36));
    repo.create(&mut ada, &[]).unwrap();
    let id = ada.id.unwrap();

    let keep_email = scopes::omit("email");
    let mut edit = contact("ada", None, Some(37));
    repo.update(&mut edit, id, &[&keep_email]).unwrap();

    assert_eq!(edit.email.as_deref(), Some("ada@example.com"));
    assert_eq!(edit.age, Some(37));
}

#[test]
fn save_creates_then_updates() {
    let conn = setup();
    let repo = SqliteRepository::<Contact>::new(&conn);

    let mut ada = contact("ada", None, None);
    repo.save(&mut ada, &[]).unwrap();
    let id = ada.id.unwrap();

    ada.age = Some(36);
    repo.save(&mut ada, &[]).unwrap();

    assert_eq!(ada.id, Some(id));
    assert_eq!(repo.count(&[]).unwrap(), 1);
    assert_eq!(repo.find_by_id(id, &[]).unwrap().age, Some(36));
}

#[test]
fn delete_removes_only_target_and_repeat_is_noop() {
    let conn = setup();
    let repo = SqliteRepository::<Contact>::new(&conn);

    let mut ada = contact("ada", None, None);
    let mut bo = contact("bo", None, None);
    repo.create(&mut ada, &[]).unwrap();
    repo.create(&mut bo, &[]).unwrap();

    repo.delete(&ada, &[]).unwrap();
    assert!(repo.find_by_id(ada.id.unwrap(), &[]).unwrap_err().is_not_found());
    assert_eq!(repo.count(&[]).unwrap(), 1);

    repo.delete(&ada, &[]).unwrap();
    assert_eq!(repo.count(&[]).unwrap(), 1);
}

#[test]
fn delete_is_narrowed_by_modifiers() {
    let conn = setup();
    let repo = SqliteRepository::<Contact>::new(&conn);

    let mut ada = contact("ada", None, Some(36));
    repo.create(&mut ada, &[]).unwrap();

    let minors = scopes::filter("age < ?", [Value::Integer(18)]);
    repo.delete(&ada, &[&minors]).unwrap();

    assert!(repo.exist(&[]).unwrap());
}

#[test]
fn delete_without_id_uses_conditions_and_refuses_bare_table() {
    let conn = setup();
    let repo = SqliteRepository::<Contact>::new(&conn);
    for (name, age) in [("ada", 36), ("bo", 12), ("cy", 9)] {
        repo.create(&mut contact(name, None, Some(age)), &[]).unwrap();
    }

    let unsaved = contact("template", None, None);
    let err = repo.delete(&unsaved, &[]).unwrap_err();
    assert!(matches!(err, RepoError::MissingCondition("contacts")));

    let minors = scopes::filter("age < ?", [Value::Integer(18)]);
    repo.delete(&unsaved, &[&minors]).unwrap();
    assert_eq!(repo.count(&[]).unwrap(), 1);
}

#[test]
fn count_and_exist_agree() {
    let conn = setup();
    let repo = SqliteRepository::<Contact>::new(&conn);
    let named_ada = scopes::where_eq("name", "ada".to_string());

    assert_eq!(repo.count(&[]).unwrap(), 0);
    assert!(!repo.exist(&[]).unwrap());

    repo.create(&mut contact("ada", None, None), &[]).unwrap();
    repo.create(&mut contact("bo", None, None), &[]).unwrap();

    assert_eq!(repo.count(&[]).unwrap(), 2);
    assert!(repo.exist(&[]).unwrap());
    assert_eq!(repo.count(&[&named_ada]).unwrap(), 1);
    assert!(repo.exist(&[&named_ada]).unwrap());

    let nobody = scopes::where_eq("name", "nobody".to_string());
    assert_eq!(repo.count(&[&nobody]).unwrap(), 0);
    assert!(!repo.exist(&[&nobody]).unwrap());
}

#[test]
fn constraint_failures_are_classified() {
    let conn = setup();
    let repo = SqliteRepository::<Contact>::new(&conn);

    repo.create(&mut contact("ada", Some("same@example.com"), None), &[])
        .unwrap();
    let err = repo
        .create(&mut contact("bo", Some("same@example.com"), None), &[])
        .unwrap_err();
    assert!(matches!(err, RepoError::ConstraintViolation(_)));

    let tags = SqliteRepository::<Tag>::new(&conn);
    let err = tags.create(&mut tag(12345, "orphan"), &[]).unwrap_err();
    assert!(matches!(err, RepoError::ConstraintViolation(_)));
}

#[test]
fn malformed_modifiers_never_reach_sqlite() {
    let conn = setup();
    let repo = SqliteRepository::<Contact>::new(&conn);

    let injected = scopes::where_eq("name; DROP TABLE contacts", "x".to_string());
    let err = repo.find_all(&[&injected]).unwrap_err();
    assert!(matches!(err, RepoError::InvalidQuery(_)));

    let broken = scopes::filter("age > ? AND age < ?", [Value::Integer(1)]);
    assert!(matches!(
        repo.count(&[&broken]).unwrap_err(),
        RepoError::InvalidQuery(_)
    ));

    let commented = scopes::filter("age > ? -- adults only", [Value::Integer(18)]);
    assert!(matches!(
        repo.find_all(&[&commented]).unwrap_err(),
        RepoError::InvalidQuery(message) if message.contains("SQL comment")
    ));
    assert_eq!(raw_count(&conn, "contacts"), 0);
}

#[test]
fn engine_errors_surface_as_db() {
    let conn = setup();
    let repo = SqliteRepository::<Contact>::new(&conn);

    let unknown_column = scopes::filter("missing_column = ?", [Value::Integer(1)]);
    let err = repo.find_all(&[&unknown_column]).unwrap_err();
    assert!(matches!(err, RepoError::Db(_)));
}

#[test]
fn join_modifier_filters_through_related_table() {
    let conn = setup();
    let contacts = SqliteRepository::<Contact>::new(&conn);
    let tags = SqliteRepository::<Tag>::new(&conn);

    let mut ada = contact("ada", None, None);
    let mut bo = contact("bo", None, None);
    contacts.create(&mut ada, &[]).unwrap();
    contacts.create(&mut bo, &[]).unwrap();
    tags.create(&mut tag(ada.id.unwrap(), "vip"), &[]).unwrap();
    tags.create(&mut tag(ada.id.unwrap(), "vip"), &[]).unwrap();
    tags.create(&mut tag(bo.id.unwrap(), "new"), &[]).unwrap();

    let vip = scopes::join(
        "INNER JOIN tags ON tags.contact_id = contacts.id AND tags.label = ?",
        [Value::Text("vip".to_string())],
    );
    let distinct = scopes::distinct();

    let found = contacts.find_all(&[&vip, &distinct]).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "ada");
    assert_eq!(contacts.count(&[&vip, &distinct]).unwrap(), 1);
    assert_eq!(contacts.count(&[&vip]).unwrap(), 2);
}

#[test]
fn query_builder_exposes_engine_level_access() {
    let conn = setup();
    let contacts = SqliteRepository::<Contact>::new(&conn);
    let tags = SqliteRepository::<Tag>::new(&conn);

    let mut ada = contact("ada", None, Some(36));
    contacts.create(&mut ada, &[]).unwrap();
    tags.create(&mut tag(ada.id.unwrap(), "vip"), &[]).unwrap();

    let with_tags = scopes::join("INNER JOIN tags ON tags.contact_id = contacts.id", Vec::new());
    let rows = contacts
        .query_builder(&[&with_tags])
        .modify(|query| query.select("contacts.name, tags.label"))
        .fetch_with(|row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
        .unwrap();
    assert_eq!(rows, vec![("ada".to_string(), "vip".to_string())]);

    let first = contacts
        .query_builder(&[])
        .modify(|query| query.order_by("name", Order::Desc))
        .fetch_one::<Contact>()
        .unwrap();
    assert_eq!(first.name, "ada");

    let none = contacts
        .query_builder(&[])
        .modify(|query| query.where_eq("name", "nobody".to_string()));
    assert_eq!(none.count().unwrap(), 0);
    assert!(none.fetch_one::<Contact>().unwrap_err().is_not_found());
}
