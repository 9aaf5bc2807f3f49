use rusqlite::Connection;
use taxonomy_core::db::open_store_in_memory;
use taxonomy_core::{
    CategoryDraft, CategoryService, ItemDraft, ItemRepository, Session, SessionRepository,
    SessionService, SqliteCategoryRepository, SqliteItemRepository, SqliteSessionRepository,
};

fn setup() -> Connection {
    open_store_in_memory().unwrap()
}

fn session_service(
    conn: &Connection,
) -> SessionService<
    SqliteSessionRepository<'_>,
    SqliteCategoryRepository<'_>,
    SqliteItemRepository<'_>,
> {
    SessionService::new(
        SqliteSessionRepository::try_new(conn).unwrap(),
        SqliteCategoryRepository::try_new(conn).unwrap(),
        SqliteItemRepository::try_new(conn).unwrap(),
    )
}

fn category_service(
    conn: &Connection,
) -> CategoryService<SqliteSessionRepository<'_>, SqliteCategoryRepository<'_>> {
    CategoryService::new(
        SqliteSessionRepository::try_new(conn).unwrap(),
        SqliteCategoryRepository::try_new(conn).unwrap(),
    )
}

fn new_session(conn: &Connection) -> Session {
    SqliteSessionRepository::try_new(conn)
        .unwrap()
        .create_session()
        .unwrap()
}

fn add_item(conn: &Connection, session_id: &str, item_id: &str, container: uuid::Uuid) {
    SqliteItemRepository::try_new(conn)
        .unwrap()
        .create_item(
            session_id,
            &ItemDraft::new(item_id, Default::default()),
            Some(container),
        )
        .unwrap();
}

#[test]
fn reconstruction_nests_multiple_levels_with_items() {
    let conn = setup();
    let session = new_session(&conn);
    let root_id = session.root_category_id.unwrap();
    let categories = category_service(&conn);

    let animals = categories
        .create_category(
            &session.id,
            CategoryDraft {
                parent_id: Some(root_id),
                ..CategoryDraft::new("Animals", "Living creatures")
            },
        )
        .unwrap();
    let dogs = categories
        .create_category(
            &session.id,
            CategoryDraft {
                parent_id: Some(animals.id),
                ..CategoryDraft::new("Dogs", "Canines")
            },
        )
        .unwrap();

    add_item(&conn, &session.id, "root-item", root_id);
    add_item(&conn, &session.id, "animal-item", animals.id);
    add_item(&conn, &session.id, "dog-item", dogs.id);

    let snapshot = session_service(&conn).get_session_data(&session.id).unwrap();
    assert_eq!(snapshot.roots.len(), 1);

    let root = &snapshot.roots[0];
    assert_eq!(root.id, root_id);
    assert_eq!(root.items.len(), 1);
    assert_eq!(root.items[0].id, "root-item");

    let animals_node = &root.children[0];
    assert_eq!(animals_node.id, animals.id);
    assert_eq!(animals_node.items[0].id, "animal-item");

    let dogs_node = &animals_node.children[0];
    assert_eq!(dogs_node.id, dogs.id);
    assert_eq!(dogs_node.items[0].id, "dog-item");
    assert!(dogs_node.children.is_empty());
    assert!(snapshot.orphan_items.is_empty());
}

#[test]
fn sibling_order_follows_insertion_order() {
    let conn = setup();
    let session = new_session(&conn);
    let root_id = session.root_category_id.unwrap();
    let categories = category_service(&conn);

    let names = ["Gamma", "Alpha", "Beta"];
    let mut created = Vec::new();
    for name in names {
        created.push(
            categories
                .create_category(
                    &session.id,
                    CategoryDraft {
                        parent_id: Some(root_id),
                        ..CategoryDraft::new(name, "Sibling")
                    },
                )
                .unwrap(),
        );
    }

    let snapshot = session_service(&conn).get_session_data(&session.id).unwrap();
    let children: Vec<_> = snapshot.roots[0]
        .children
        .iter()
        .map(|node| node.id)
        .collect();
    let expected: Vec<_> = created.iter().map(|category| category.id).collect();
    assert_eq!(children, expected);
}

#[test]
fn deleting_a_parent_promotes_its_subtree_children() {
    let conn = setup();
    let session = new_session(&conn);
    let root_id = session.root_category_id.unwrap();
    let categories = category_service(&conn);

    let middle = categories
        .create_category(
            &session.id,
            CategoryDraft {
                parent_id: Some(root_id),
                ..CategoryDraft::new("Middle", "Will be deleted")
            },
        )
        .unwrap();
    let child = categories
        .create_category(
            &session.id,
            CategoryDraft {
                parent_id: Some(middle.id),
                ..CategoryDraft::new("Child", "Keeps its own subtree")
            },
        )
        .unwrap();
    let grandchild = categories
        .create_category(
            &session.id,
            CategoryDraft {
                parent_id: Some(child.id),
                ..CategoryDraft::new("Grandchild", "Stays below child")
            },
        )
        .unwrap();
    add_item(&conn, &session.id, "boxed", middle.id);

    categories.delete_category(&session.id, middle.id).unwrap();

    let snapshot = session_service(&conn).get_session_data(&session.id).unwrap();
    let root_ids: Vec<_> = snapshot.roots.iter().map(|node| node.id).collect();
    assert_eq!(root_ids, vec![root_id, child.id]);

    let promoted = snapshot.find(child.id).unwrap();
    assert_eq!(promoted.children.len(), 1);
    assert_eq!(promoted.children[0].id, grandchild.id);

    // The deleted category's item stays owned by the session as an orphan.
    assert_eq!(snapshot.orphan_items.len(), 1);
    assert_eq!(snapshot.orphan_items[0].id, "boxed");
}

#[test]
fn snapshot_never_leaks_other_sessions() {
    let conn = setup();
    let first = new_session(&conn);
    let second = new_session(&conn);
    let categories = category_service(&conn);

    categories
        .create_category(
            &first.id,
            CategoryDraft {
                parent_id: first.root_category_id,
                ..CategoryDraft::new("FirstOnly", "Scoped")
            },
        )
        .unwrap();
    add_item(&conn, &first.id, "first-item", first.root_category_id.unwrap());

    let snapshot = session_service(&conn).get_session_data(&second.id).unwrap();
    assert_eq!(snapshot.roots.len(), 1);
    assert_eq!(Some(snapshot.roots[0].id), second.root_category_id);
    assert!(snapshot.roots[0].children.is_empty());
    assert!(snapshot.roots[0].items.is_empty());
    assert!(snapshot.orphan_items.is_empty());
}
