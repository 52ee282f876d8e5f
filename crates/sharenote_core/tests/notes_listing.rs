use rusqlite::Connection;
use sharenote_core::db::open_db_in_memory;
use sharenote_core::{
    ErrorKind, NewNote, NewUser, Note, NoteId, NotePatch, NoteService, ServiceError,
    SqliteNoteRepository, SqliteUserRepository, UserDirectory, UserId, UserRepository,
    DEFAULT_NOTE_COLOR, SORT_ORDER_LAST,
};

type SqliteNoteService<'conn> =
    NoteService<SqliteNoteRepository<'conn>, UserDirectory<SqliteUserRepository<'conn>>>;

fn note_service(conn: &Connection) -> SqliteNoteService<'_> {
    NoteService::new(
        SqliteNoteRepository::try_new(conn).unwrap(),
        UserDirectory::new(SqliteUserRepository::try_new(conn).unwrap()),
    )
}

fn seed_user(conn: &Connection, username: &str) -> UserId {
    SqliteUserRepository::try_new(conn)
        .unwrap()
        .insert_user(&NewUser::new(
            username,
            format!("{username}@example.com"),
            "hash",
        ))
        .unwrap()
}

fn titles(notes: &[Note]) -> Vec<&str> {
    notes.iter().map(|note| note.title.as_str()).collect()
}

fn ids(notes: &[Note]) -> Vec<NoteId> {
    notes.iter().map(|note| note.id).collect()
}

#[test]
fn create_assigns_id_and_defaults() {
    let conn = open_db_in_memory().unwrap();
    let alice = seed_user(&conn, "alice");
    let service = note_service(&conn);

    let created = service
        .create(NewNote::new(alice, "Groceries", "milk, eggs"))
        .unwrap();

    assert!(created.id > 0);
    assert_eq!(created.owner_id, alice);
    assert_eq!(created.title, "Groceries");
    assert_eq!(created.content, "milk, eggs");
    assert_eq!(created.sort_order, SORT_ORDER_LAST);
    assert!(created.shared_with.is_empty());
    assert!(!created.pinned);
    assert!(created.tags.is_empty());
    assert_eq!(created.color.as_deref(), Some(DEFAULT_NOTE_COLOR));
    assert_eq!(created.due_date, None);
    assert_eq!(created.username.as_deref(), Some("alice"));

    let listed = service.list_visible(alice, None, None).unwrap();
    assert_eq!(listed, vec![created]);
}

#[test]
fn create_keeps_optional_fields_and_tag_order() {
    let conn = open_db_in_memory().unwrap();
    let alice = seed_user(&conn, "alice");
    let service = note_service(&conn);

    let created = service
        .create(
            NewNote::new(alice, "Trip", "pack")
                .with_tags(["travel", "Urgent", "a"])
                .with_due_date("2024-07-01")
                .with_color("#ffcc00"),
        )
        .unwrap();

    assert_eq!(created.tags, vec!["travel", "Urgent", "a"]);
    assert_eq!(created.due_date.as_deref(), Some("2024-07-01"));
    assert_eq!(created.color.as_deref(), Some("#ffcc00"));
}

#[test]
fn create_rejects_blank_title_or_content() {
    let conn = open_db_in_memory().unwrap();
    let alice = seed_user(&conn, "alice");
    let service = note_service(&conn);

    let err = service.create(NewNote::new(alice, "  ", "body")).unwrap_err();
    assert!(matches!(err, ServiceError::InvalidInput(_)));
    assert_eq!(err.kind(), ErrorKind::BadRequest);

    let err = service.create(NewNote::new(alice, "title", "")).unwrap_err();
    assert!(matches!(err, ServiceError::InvalidInput(_)));
    assert!(service.list_visible(alice, None, None).unwrap().is_empty());
}

#[test]
fn list_orders_by_sort_order_then_newest_id() {
    let conn = open_db_in_memory().unwrap();
    let alice = seed_user(&conn, "alice");
    let service = note_service(&conn);
    let first = service.create(NewNote::new(alice, "first", "x")).unwrap();
    let second = service.create(NewNote::new(alice, "second", "x")).unwrap();
    let third = service.create(NewNote::new(alice, "third", "x")).unwrap();

    let listed = service.list_visible(alice, None, None).unwrap();
    assert_eq!(ids(&listed), vec![third.id, second.id, first.id]);

    let to_front = NotePatch {
        sort_order: Some(0),
        ..NotePatch::default()
    };
    service.update(first.id, alice, &to_front).unwrap();

    let listed = service.list_visible(alice, None, None).unwrap();
    assert_eq!(ids(&listed), vec![first.id, third.id, second.id]);
}

#[test]
fn list_includes_shared_notes_but_not_foreign_ones() {
    let conn = open_db_in_memory().unwrap();
    let alice = seed_user(&conn, "alice");
    let bob = seed_user(&conn, "bob");
    let service = note_service(&conn);
    let own = service.create(NewNote::new(bob, "bob's", "x")).unwrap();
    let shared = service.create(NewNote::new(alice, "shared", "x")).unwrap();
    service.create(NewNote::new(alice, "private", "x")).unwrap();
    service.share_with(shared.id, alice, "bob").unwrap();

    let listed = service.list_visible(bob, None, None).unwrap();
    assert_eq!(ids(&listed), vec![shared.id, own.id]);
    assert_eq!(listed[0].username.as_deref(), Some("alice"));
}

#[test]
fn search_matches_title_substring_case_insensitively() {
    let conn = open_db_in_memory().unwrap();
    let alice = seed_user(&conn, "alice");
    let bob = seed_user(&conn, "bob");
    let service = note_service(&conn);
    service.create(NewNote::new(alice, "Groceries", "x")).unwrap();
    service.create(NewNote::new(alice, "Work plan", "grocer in body")).unwrap();
    service.create(NewNote::new(alice, "big GROCER run", "x")).unwrap();
    service.create(NewNote::new(bob, "grocer list", "x")).unwrap();

    let found = service.list_visible(alice, Some("grocer"), None).unwrap();
    assert_eq!(titles(&found), vec!["big GROCER run", "Groceries"]);

    let unfiltered = service.list_visible(alice, Some(""), None).unwrap();
    assert_eq!(unfiltered.len(), 3);
}

#[test]
fn search_treats_like_wildcards_literally() {
    let conn = open_db_in_memory().unwrap();
    let alice = seed_user(&conn, "alice");
    let service = note_service(&conn);
    service.create(NewNote::new(alice, "100% done", "x")).unwrap();
    service.create(NewNote::new(alice, "1000 things", "x")).unwrap();
    service.create(NewNote::new(alice, "snake_case", "x")).unwrap();
    service.create(NewNote::new(alice, "snakeXcase", "x")).unwrap();

    let percent = service.list_visible(alice, Some("0%"), None).unwrap();
    assert_eq!(titles(&percent), vec!["100% done"]);

    let underscore = service.list_visible(alice, Some("e_c"), None).unwrap();
    assert_eq!(titles(&underscore), vec!["snake_case"]);
}

#[test]
fn tag_filter_requires_exact_tag() {
    let conn = open_db_in_memory().unwrap();
    let alice = seed_user(&conn, "alice");
    let service = note_service(&conn);
    let tagged = service
        .create(NewNote::new(alice, "a", "x").with_tags(["work", "urgent"]))
        .unwrap();
    service
        .create(NewNote::new(alice, "b", "x").with_tags(["Work"]))
        .unwrap();
    service
        .create(NewNote::new(alice, "c", "x").with_tags(["workshop"]))
        .unwrap();

    let found = service.list_visible(alice, None, Some("work")).unwrap();
    assert_eq!(ids(&found), vec![tagged.id]);

    let combined = service
        .list_visible(alice, Some("A"), Some("urgent"))
        .unwrap();
    assert_eq!(ids(&combined), vec![tagged.id]);

    assert!(service
        .list_visible(alice, Some("zzz"), Some("work"))
        .unwrap()
        .is_empty());
}

#[test]
fn update_applies_only_given_fields() {
    let conn = open_db_in_memory().unwrap();
    let alice = seed_user(&conn, "alice");
    let service = note_service(&conn);
    let created = service
        .create(
            NewNote::new(alice, "Trip", "pack")
                .with_tags(["travel"])
                .with_due_date("2024-07-01"),
        )
        .unwrap();

    let patch: NotePatch =
        serde_json::from_str(r##"{"tags":["z","a"],"dueDate":null,"color":"#000000"}"##).unwrap();
    let updated = service.update(created.id, alice, &patch).unwrap();

    assert_eq!(updated.title, "Trip");
    assert_eq!(updated.content, "pack");
    assert_eq!(updated.tags, vec!["z", "a"]);
    assert_eq!(updated.due_date, None);
    assert_eq!(updated.color.as_deref(), Some("#000000"));
    assert_eq!(updated.sort_order, SORT_ORDER_LAST);

    let emptied = NotePatch {
        content: Some(String::new()),
        ..NotePatch::default()
    };
    assert_eq!(
        service.update(created.id, alice, &emptied).unwrap().content,
        ""
    );
}

#[test]
fn update_rejects_blank_title_and_tolerates_empty_patch() {
    let conn = open_db_in_memory().unwrap();
    let alice = seed_user(&conn, "alice");
    let service = note_service(&conn);
    let created = service.create(NewNote::new(alice, "Trip", "pack")).unwrap();

    let blank = NotePatch {
        title: Some("   ".to_string()),
        ..NotePatch::default()
    };
    assert!(matches!(
        service.update(created.id, alice, &blank).unwrap_err(),
        ServiceError::InvalidInput(_)
    ));

    let unchanged = service
        .update(created.id, alice, &NotePatch::default())
        .unwrap();
    assert_eq!(unchanged, created);
}

#[test]
fn note_serializes_to_transport_shape() {
    let conn = open_db_in_memory().unwrap();
    let alice = seed_user(&conn, "alice");
    let service = note_service(&conn);
    let created = service
        .create(NewNote::new(alice, "Groceries", "milk, eggs"))
        .unwrap();

    let json = serde_json::to_value(&created).unwrap();
    assert_eq!(json["ownerId"], alice);
    assert_eq!(json["sortOrder"], SORT_ORDER_LAST);
    assert_eq!(json["sharedWithUserIds"], serde_json::json!([]));
    assert_eq!(json["pinned"], false);
    assert_eq!(json["username"], "alice");
    assert!(json.get("dueDate").is_none());
}

#[test]
fn search_folds_case_of_non_ascii_titles() {
    let conn = open_db_in_memory().unwrap();
    let elodie = seed_user(&conn, "Élodie");
    let service = note_service(&conn);
    let school = service
        .create(NewNote::new(elodie, "ÉCOLE Grocer", "x"))
        .unwrap();
    service
        .create(NewNote::new(elodie, "Straße", "x"))
        .unwrap();

    let listed = service.list_visible(elodie, Some("école"), None).unwrap();
    assert_eq!(ids(&listed), vec![school.id]);

    let listed = service.list_visible(elodie, Some("STRAẞE"), None).unwrap();
    assert_eq!(titles(&listed), vec!["Straße"]);
}
