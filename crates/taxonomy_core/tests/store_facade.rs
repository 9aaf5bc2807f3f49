use std::sync::Arc;
use taxonomy_core::{CategoryDraft, ItemDraft, Properties, PropertyValue, TaxonomyStore};

fn props(entries: &[(&str, PropertyValue)]) -> Properties {
    entries
        .iter()
        .map(|(key, value)| (key.to_string(), value.clone()))
        .collect()
}

#[test]
fn full_session_lifecycle_through_the_facade() {
    let store = TaxonomyStore::open_in_memory().unwrap();

    let session = store.create_session().unwrap();
    let root_id = session.root_category_id.unwrap();

    let animals = store
        .create_category(
            &session.id,
            CategoryDraft {
                parent_id: Some(root_id),
                ..CategoryDraft::new("Animals", "Living creatures")
            },
        )
        .unwrap();

    store
        .create_item(
            &session.id,
            ItemDraft::new("sku-1", props(&[("color", PropertyValue::from("red"))])),
            Some(animals.id),
        )
        .unwrap();
    store
        .create_item(&session.id, ItemDraft::new("stray", Properties::new()), None)
        .unwrap();

    let snapshot = store.get_session_data(&session.id).unwrap();
    assert_eq!(snapshot.roots.len(), 1);
    let animals_node = snapshot.find(animals.id).unwrap();
    assert_eq!(animals_node.items.len(), 1);
    assert_eq!(snapshot.orphan_items.len(), 1);

    let result = store
        .update_category_items(
            &session.id,
            animals.id,
            vec![
                ItemDraft::new("sku-1", props(&[("color", PropertyValue::from("blue"))])),
                ItemDraft::new("sku-2", Properties::new()),
            ],
        )
        .unwrap();
    assert_eq!(result.len(), 2);

    store.delete_category(&session.id, animals.id).unwrap();
    let snapshot = store.get_session_data(&session.id).unwrap();
    assert!(snapshot.find(animals.id).is_none());
    // Former members survive the category as orphans.
    assert_eq!(snapshot.orphan_items.len(), 3);

    let removed = store
        .delete_items(
            &session.id,
            &["sku-1".to_string(), "sku-2".to_string(), "stray".to_string()],
        )
        .unwrap();
    assert_eq!(removed, 3);

    let snapshot = store.get_session_data(&session.id).unwrap();
    assert!(snapshot.orphan_items.is_empty());
}

#[test]
fn concurrent_membership_replacements_do_not_interleave() {
    let store = Arc::new(TaxonomyStore::open_in_memory().unwrap());
    let session = store.create_session().unwrap();
    let root_id = session.root_category_id.unwrap();

    let first: Vec<String> = (0..8).map(|index| format!("first-{index}")).collect();
    let second: Vec<String> = (0..8).map(|index| format!("second-{index}")).collect();

    let spawn_reconcile = |ids: Vec<String>| {
        let store = Arc::clone(&store);
        let session_id = session.id.clone();
        std::thread::spawn(move || {
            let desired: Vec<ItemDraft> = ids
                .iter()
                .map(|id| ItemDraft::new(id.clone(), Properties::new()))
                .collect();
            store
                .update_category_items(&session_id, root_id, desired)
                .unwrap();
        })
    };

    let handle_a = spawn_reconcile(first.clone());
    let handle_b = spawn_reconcile(second.clone());
    handle_a.join().unwrap();
    handle_b.join().unwrap();

    // One replacement wins wholesale; a lost update would leave a mix.
    let snapshot = store.get_session_data(&session.id).unwrap();
    let mut membership: Vec<String> = snapshot.roots[0]
        .items
        .iter()
        .map(|item| item.id.clone())
        .collect();
    membership.sort();

    let mut expected_first = first;
    expected_first.sort();
    let mut expected_second = second;
    expected_second.sort();
    assert!(membership == expected_first || membership == expected_second);
}
