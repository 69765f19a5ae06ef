//! Binix Multicol - Multi-column Fragmentation Engine
//!
//! Entry point for the multicol demo.

use binix_multicol::devtools::ColumnInspector;
use binix_multicol::style::{BoxStyle, MulticolStyle};
use binix_multicol::{BlockFlowLayouter, BoxTree, FlowThread, MulticolLayout, NAME, Result, VERSION};
use std::env;

fn main() {
    binix_multicol::utils::logging::init();

    // Check for CLI mode
    let args: Vec<String> = env::args().collect();

    if args.len() > 1 && args[1] == "--cli" {
        if let Err(e) = run_cli_mode() {
            eprintln!("❌ Layout failed: {}", e);
            std::process::exit(1);
        }
    } else {
        println!("{} v{}", NAME, VERSION);
        println!("Usage: {} --cli [column-count]", args[0]);
    }
}

/// Lay out a small article with a spanning heading and print the column boxes
fn run_cli_mode() -> Result<()> {
    let column_count = env::args()
        .nth(2)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(3);

    println!("🚀 {} v{}", NAME, VERSION);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let mut tree = BoxTree::new();
    let root = tree.root();
    for lines in [4, 7] {
        let paragraph = tree.append_element(root, "p", BoxStyle::for_tag("p"))?;
        tree.append_text(paragraph, lines, 20.0)?;
    }
    let heading = tree.append_element(root, "h2", BoxStyle::spanner())?;
    tree.append_text(heading, 2, 24.0)?;
    for lines in [5, 3, 6] {
        let paragraph = tree.append_element(root, "p", BoxStyle::for_tag("p"))?;
        tree.append_text(paragraph, lines, 20.0)?;
    }

    let mut flow_thread = FlowThread::multicol(root);
    flow_thread.populate(&tree);

    let style = MulticolStyle::with_count(column_count);
    let mut layouter = BlockFlowLayouter::new();
    let mut layout = MulticolLayout::default();
    let outcome = layout.run(&mut flow_thread, &tree, &style, 960.0, &mut layouter)?;
    flow_thread.check_invariants(&tree)?;

    println!(
        "✅ {} columns, {} passes, content height {}",
        outcome.column_count, outcome.passes, outcome.content_logical_height
    );
    println!("{}", ColumnInspector::new().to_pretty_string(&flow_thread));
    Ok(())
}
