//! Scroll a simulated settings list until an off-screen entry appears, then
//! open it and type into its search field.
//!
//! Run with `RUST_LOG=debug` to see every scroll phase.

use anyhow::{anyhow, Result};
use nodewright::platforms::memory::{MemoryHost, MemoryTree, NodeSpec};
use nodewright::types::NodeAction;
use nodewright::{init_logging, Driver, DriverConfig, SearchMode, TextQuery, EDIT_TEXT_CLASS};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::info;

const PAGES: [[&str; 3]; 3] = [
    ["Network", "Bluetooth", "Display"],
    ["Sound", "Storage", "Battery"],
    ["Privacy", "Accessibility", "About phone"],
];

fn row(label: &str) -> NodeSpec {
    NodeSpec::new("android.widget.LinearLayout")
        .clickable()
        .bounds(0, 0, 1080, 160)
        .child(NodeSpec::new("android.widget.TextView").text(label))
}

fn main() -> Result<()> {
    init_logging(None);

    let tree = MemoryTree::new(
        NodeSpec::new("android.widget.FrameLayout")
            .key("root")
            .bounds(0, 0, 1080, 1920)
            .child(
                NodeSpec::new("androidx.recyclerview.widget.RecyclerView")
                    .key("list")
                    .scrollable()
                    .bounds(0, 200, 1080, 1920)
                    .children(PAGES[0].iter().copied().map(row)),
            ),
    );
    let list_id = tree.id("list").ok_or_else(|| anyhow!("list missing"))?;

    let root_id = tree.id("root").ok_or_else(|| anyhow!("root missing"))?;
    let page = Arc::new(AtomicUsize::new(0));
    tree.on_action(move |tree, node, action| match action {
        // Each forward scroll swaps in the next page of rows
        NodeAction::ScrollForward if node == list_id => {
            let next = page.fetch_add(1, Ordering::SeqCst) + 1;
            let Some(labels) = PAGES.get(next) else {
                return;
            };
            for child in tree.node(list_id).children() {
                if let Some(id) = tree.id_of(&child) {
                    tree.remove(id);
                }
            }
            for label in labels {
                tree.insert(list_id, None, row(label));
            }
        }
        // Opening a row shows a search field
        NodeAction::Click if tree.id("search").is_none() => {
            tree.insert(root_id, Some(0), NodeSpec::new(EDIT_TEXT_CLASS).key("search"));
        }
        _ => {}
    });

    let host = Arc::new(MemoryHost::new(1080, 1920));
    let config = DriverConfig::from_env()?;
    let driver = Driver::new(Arc::new(tree.clone()), host.clone(), config)?;
    let root = driver.root(true)?;

    let entry = driver
        .scroll_and_find(&root, &TextQuery::exact(["Accessibility"]), 3)
        .ok_or_else(|| anyhow!("Accessibility entry never appeared"))?;
    info!("found {:?}", entry);

    if !driver.click(&entry, true) {
        return Err(anyhow!("could not open the entry"));
    }
    if !driver.find_text_input(&root, "magnification", SearchMode::Retry, false) {
        return Err(anyhow!("search field never appeared"));
    }

    driver.log_tree(&root, true);
    println!("{}", driver.snapshot(&root, Some(1)).to_json()?);
    info!(
        "done: {} node actions, {} gestures",
        tree.actions().len(),
        host.gestures().len()
    );
    Ok(())
}
