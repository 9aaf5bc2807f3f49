//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `taxonomy_core` wiring.
//! - Keep output deterministic apart from generated ids.

use taxonomy_core::TaxonomyStore;

fn main() {
    if let Err(err) = run() {
        eprintln!("taxonomy_cli error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("taxonomy_core version={}", taxonomy_core::core_version());

    let store = TaxonomyStore::open_in_memory()?;
    let session = store.create_session()?;
    println!("session id={}", session.id);

    let snapshot = store.get_session_data(&session.id)?;
    println!(
        "root categories={} orphan items={}",
        snapshot.roots.len(),
        snapshot.orphan_items.len()
    );
    Ok(())
}
