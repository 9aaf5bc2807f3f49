use rusqlite::Connection;
use taxonomy_core::db::open_store_in_memory;
use taxonomy_core::{
    CategoryDraft, CategoryRepository, Item, ItemDraft, ItemRepository, ItemService,
    MissingEntity, Properties, PropertyValue, Session, SessionRepository,
    SqliteCategoryRepository, SqliteItemRepository, SqliteSessionRepository, StoreError,
};
use uuid::Uuid;

fn setup() -> Connection {
    open_store_in_memory().unwrap()
}

fn item_service(
    conn: &Connection,
) -> ItemService<
    SqliteSessionRepository<'_>,
    SqliteCategoryRepository<'_>,
    SqliteItemRepository<'_>,
> {
    ItemService::new(
        SqliteSessionRepository::try_new(conn).unwrap(),
        SqliteCategoryRepository::try_new(conn).unwrap(),
        SqliteItemRepository::try_new(conn).unwrap(),
    )
}

fn new_session(conn: &Connection) -> Session {
    SqliteSessionRepository::try_new(conn)
        .unwrap()
        .create_session()
        .unwrap()
}

fn props(entries: &[(&str, PropertyValue)]) -> Properties {
    entries
        .iter()
        .map(|(key, value)| (key.to_string(), value.clone()))
        .collect()
}

fn contained_ids(conn: &Connection, session_id: &str, category_id: Uuid) -> Vec<String> {
    SqliteItemRepository::try_new(conn)
        .unwrap()
        .list_items(session_id)
        .unwrap()
        .into_iter()
        .filter(|item| item.category_id == Some(category_id))
        .map(|item| item.id)
        .collect()
}

#[test]
fn three_way_diff_deletes_updates_and_creates() {
    let conn = setup();
    let session = new_session(&conn);
    let root_id = session.root_category_id.unwrap();
    let service = item_service(&conn);

    for id in ["a", "b", "c"] {
        service
            .create_item(
                &session.id,
                ItemDraft::new(id, props(&[("state", PropertyValue::from("old"))])),
                Some(root_id),
            )
            .unwrap();
    }
    let original_a = SqliteItemRepository::try_new(&conn)
        .unwrap()
        .get_item(&session.id, "a")
        .unwrap()
        .unwrap();

    let result = service
        .update_category_items(
            &session.id,
            root_id,
            vec![
                ItemDraft::new("a", props(&[("state", PropertyValue::from("new"))])),
                ItemDraft::new("d", props(&[("state", PropertyValue::from("fresh"))])),
            ],
        )
        .unwrap();

    // Updated items come back first, then created ones.
    let result_ids: Vec<&str> = result.iter().map(|item| item.id.as_str()).collect();
    assert_eq!(result_ids, vec!["a", "d"]);
    assert_eq!(
        result[0].properties.get("state"),
        Some(&PropertyValue::from("new"))
    );
    assert_eq!(result[0].internal_id, original_a.internal_id);

    let repo = SqliteItemRepository::try_new(&conn).unwrap();
    assert!(repo.get_item(&session.id, "b").unwrap().is_none());
    assert!(repo.get_item(&session.id, "c").unwrap().is_none());
    assert_eq!(contained_ids(&conn, &session.id, root_id), vec!["a", "d"]);
}

#[test]
fn reconcile_twice_with_same_list_changes_nothing() {
    let conn = setup();
    let session = new_session(&conn);
    let root_id = session.root_category_id.unwrap();
    let service = item_service(&conn);

    let desired = vec![
        ItemDraft::new("a", props(&[("qty", PropertyValue::from(1_i64))])),
        ItemDraft::new("b", props(&[("qty", PropertyValue::from(2_i64))])),
    ];

    let first = service
        .update_category_items(&session.id, root_id, desired.clone())
        .unwrap();
    let second = service
        .update_category_items(&session.id, root_id, desired)
        .unwrap();

    let first_internal: Vec<_> = first.iter().map(|item| item.internal_id).collect();
    let second_internal: Vec<_> = second.iter().map(|item| item.internal_id).collect();
    assert_eq!(first_internal, second_internal);
    assert_eq!(contained_ids(&conn, &session.id, root_id), vec!["a", "b"]);

    let total: i64 = conn
        .query_row("SELECT COUNT(*) FROM items;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(total, 2);
}

#[test]
fn reconcile_adopts_items_from_elsewhere_in_the_session() {
    let conn = setup();
    let session = new_session(&conn);
    let root_id = session.root_category_id.unwrap();
    let service = item_service(&conn);

    let categories = SqliteCategoryRepository::try_new(&conn).unwrap();
    let other = categories
        .create_category(&session.id, &CategoryDraft::new("Other", "Source container"))
        .unwrap();

    let elsewhere = service
        .create_item(
            &session.id,
            ItemDraft::new("moved", Properties::new()),
            Some(other.id),
        )
        .unwrap();
    let orphan = service
        .create_item(&session.id, ItemDraft::new("stray", Properties::new()), None)
        .unwrap();

    let result = service
        .update_category_items(
            &session.id,
            root_id,
            vec![
                ItemDraft::new("moved", Properties::new()),
                ItemDraft::new("stray", Properties::new()),
            ],
        )
        .unwrap();

    let by_id = |id: &str| -> &Item {
        result
            .iter()
            .find(|item| item.id == id)
            .expect("result must contain the item")
    };
    assert_eq!(by_id("moved").internal_id, elsewhere.internal_id);
    assert_eq!(by_id("stray").internal_id, orphan.internal_id);

    assert_eq!(
        contained_ids(&conn, &session.id, root_id),
        vec!["moved", "stray"]
    );
    assert!(contained_ids(&conn, &session.id, other.id).is_empty());
}

#[test]
fn reconcile_with_empty_list_clears_membership() {
    let conn = setup();
    let session = new_session(&conn);
    let root_id = session.root_category_id.unwrap();
    let service = item_service(&conn);

    for id in ["a", "b"] {
        service
            .create_item(&session.id, ItemDraft::new(id, Properties::new()), Some(root_id))
            .unwrap();
    }

    let result = service
        .update_category_items(&session.id, root_id, Vec::new())
        .unwrap();
    assert!(result.is_empty());
    assert!(contained_ids(&conn, &session.id, root_id).is_empty());

    let repo = SqliteItemRepository::try_new(&conn).unwrap();
    assert!(repo.get_item(&session.id, "a").unwrap().is_none());
    assert!(repo.get_item(&session.id, "b").unwrap().is_none());
}

#[test]
fn duplicate_ids_in_replacement_list_fail_with_validation() {
    let conn = setup();
    let session = new_session(&conn);
    let root_id = session.root_category_id.unwrap();
    let service = item_service(&conn);

    let err = service
        .update_category_items(
            &session.id,
            root_id,
            vec![
                ItemDraft::new("a", Properties::new()),
                ItemDraft::new("a", Properties::new()),
            ],
        )
        .unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
}

#[test]
fn reconcile_unknown_category_fails_with_not_found() {
    let conn = setup();
    let session = new_session(&conn);
    let service = item_service(&conn);

    let unknown = Uuid::new_v4();
    let err = service
        .update_category_items(&session.id, unknown, Vec::new())
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::NotFound(MissingEntity::Category(id)) if id == unknown
    ));
}

#[test]
fn failed_reconcile_rolls_back_the_whole_plan() {
    let conn = setup();
    let session = new_session(&conn);
    let root_id = session.root_category_id.unwrap();
    let service = item_service(&conn);

    for id in ["keep", "stale"] {
        service
            .create_item(
                &session.id,
                ItemDraft::new(id, props(&[("state", PropertyValue::from("old"))])),
                Some(root_id),
            )
            .unwrap();
    }

    conn.execute_batch(
        "CREATE TRIGGER items_fail_poison_insert_test
         BEFORE INSERT ON items
         WHEN NEW.client_id = 'poison'
         BEGIN
             SELECT RAISE(ABORT, 'forced reconcile failure');
         END;",
    )
    .unwrap();

    let result = service.update_category_items(
        &session.id,
        root_id,
        vec![
            ItemDraft::new("keep", props(&[("state", PropertyValue::from("new"))])),
            ItemDraft::new("poison", Properties::new()),
        ],
    );
    assert!(result.is_err());

    // The delete of `stale` and the update of `keep` must both be undone.
    let mut membership = contained_ids(&conn, &session.id, root_id);
    membership.sort();
    assert_eq!(membership, vec!["keep", "stale"]);

    let kept = SqliteItemRepository::try_new(&conn)
        .unwrap()
        .get_item(&session.id, "keep")
        .unwrap()
        .unwrap();
    assert_eq!(
        kept.properties.get("state"),
        Some(&PropertyValue::from("old"))
    );
}
