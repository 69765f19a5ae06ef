use binix_multicol::style::{BoxStyle, MulticolStyle};
use binix_multicol::{BlockFlowLayouter, BoxTree, FlowThread, MulticolLayout};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

/// An article of `sections` sections, each a spanning heading followed by
/// a few paragraphs
fn article(sections: usize) -> BoxTree {
    let mut tree = BoxTree::new();
    let root = tree.root();
    for section in 0..sections {
        let heading = tree.append_element(root, "h2", BoxStyle::spanner()).unwrap();
        tree.append_text(heading, 1, 32.0).unwrap();
        for paragraph in 0..4 {
            let p = tree.append_element(root, "p", BoxStyle::block()).unwrap();
            tree.append_text(p, 3 + (section + paragraph) % 7, 20.0).unwrap();
        }
    }
    tree
}

/// Balancing performance for whole articles
fn benchmark_balancing(c: &mut Criterion) {
    let mut group = c.benchmark_group("balancing");

    for sections in [1, 10, 50] {
        let tree = article(sections);
        group.bench_with_input(BenchmarkId::from_parameter(sections), &tree, |b, tree| {
            b.iter(|| {
                let mut flow_thread = FlowThread::multicol(tree.root());
                flow_thread.populate(tree);
                let mut layouter = BlockFlowLayouter::new();
                let outcome = MulticolLayout::default()
                    .run(&mut flow_thread, tree, &MulticolStyle::with_count(3), 960.0, &mut layouter)
                    .unwrap();
                black_box(outcome)
            })
        });
    }

    group.finish();
}

/// Column box reconciliation as content comes and goes
fn benchmark_reconciliation(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconciliation");

    group.bench_function("populate", |b| {
        let tree = article(50);
        b.iter(|| {
            let mut flow_thread = FlowThread::multicol(tree.root());
            flow_thread.populate(&tree);
            black_box(flow_thread.column_boxes().len())
        })
    });

    group.bench_function("insert_spanners", |b| {
        b.iter(|| {
            let mut tree = article(1);
            let root = tree.root();
            let mut flow_thread = FlowThread::multicol(root);
            flow_thread.populate(&tree);
            for _ in 0..100 {
                let heading = tree.append_element(root, "h2", BoxStyle::spanner()).unwrap();
                flow_thread.descendant_was_inserted(&tree, heading);
                let p = tree.append_element(root, "p", BoxStyle::block()).unwrap();
                flow_thread.descendant_was_inserted(&tree, p);
            }
            black_box(flow_thread.column_boxes().len())
        })
    });

    group.finish();
}

/// Coordinate mapping over a laid out article
fn benchmark_mapping(c: &mut Criterion) {
    let tree = article(10);
    let mut flow_thread = FlowThread::multicol(tree.root());
    flow_thread.populate(&tree);
    let mut layouter = BlockFlowLayouter::new();
    MulticolLayout::default()
        .run(&mut flow_thread, &tree, &MulticolStyle::with_count(3), 960.0, &mut layouter)
        .unwrap();

    c.bench_function("column_rects", |b| b.iter(|| black_box(flow_thread.column_rects())));
}

criterion_group!(benches, benchmark_balancing, benchmark_reconciliation, benchmark_mapping);
criterion_main!(benches);
