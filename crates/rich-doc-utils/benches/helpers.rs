use criterion::{Criterion, criterion_group, criterion_main};
use rich_doc_model::{Fragment, Node, basic_schema};
use rich_doc_transform::Transaction;
use rich_doc_utils::{
    can_insert, find_block_nodes, find_cell_closest_to_pos, find_children_by_type,
    remove_node_at_pos,
};

fn paragraph(text: &str) -> Node {
    let schema = basic_schema();
    schema
        .node("paragraph", None, schema.text(text, &[]).unwrap(), &[])
        .unwrap()
}

fn table(rows: usize, cols: usize) -> Node {
    let schema = basic_schema();
    let rows = (0..rows).map(|r| {
        let cells = (0..cols).map(|c| {
            schema
                .node("table_cell", None, paragraph(&format!("cell {r}x{c}")), &[])
                .unwrap()
        });
        schema
            .node("table_row", None, Fragment::from_nodes(cells), &[])
            .unwrap()
    });
    schema
        .node("table", None, Fragment::from_nodes(rows), &[])
        .unwrap()
}

fn generate_document(sections: usize) -> Node {
    let blocks = (0..sections).flat_map(|i| {
        [
            paragraph(&format!("Section {i} with some paragraph content.")),
            table(4, 4),
        ]
    });
    basic_schema()
        .node("doc", None, Fragment::from_nodes(blocks), &[])
        .unwrap()
}

fn bench_helpers(c: &mut Criterion) {
    let mut group = c.benchmark_group("helpers");
    group.sample_size(10);

    let doc = generate_document(200);
    let cell_type = basic_schema().node_type("table_cell").unwrap();
    let last_cell = find_children_by_type(&doc, cell_type, true)
        .pop()
        .unwrap();
    let in_cell = last_cell.pos + 2;
    let last_paragraph = find_block_nodes(&doc, false)
        .into_iter()
        .rev()
        .find(|block| block.node.is_textblock())
        .unwrap();
    let atom = basic_schema()
        .node("atom_inline", None, Fragment::empty(), &[])
        .unwrap();
    let block = paragraph("inserted");

    group.bench_function("resolve_deep", |b| {
        b.iter(|| std::hint::black_box(doc.resolve(std::hint::black_box(in_cell)).unwrap()));
    });

    group.bench_function("can_insert_inline", |b| {
        let pos = doc.resolve(in_cell).unwrap();
        b.iter(|| std::hint::black_box(can_insert(&pos, &atom)));
    });

    group.bench_function("can_insert_block_walks_up", |b| {
        let pos = doc.resolve(in_cell).unwrap();
        b.iter(|| std::hint::black_box(can_insert(&pos, &block)));
    });

    group.bench_function("remove_node_at_pos", |b| {
        let remove = remove_node_at_pos(last_paragraph.pos);
        b.iter(|| {
            let tr = remove(Transaction::new(doc.clone())).unwrap();
            std::hint::black_box(tr);
        });
    });

    group.bench_function("find_cell_closest_to_pos", |b| {
        let pos = doc.resolve(in_cell).unwrap();
        b.iter(|| std::hint::black_box(find_cell_closest_to_pos(&pos)));
    });

    group.finish();
}

criterion_group!(benches, bench_helpers);
criterion_main!(benches);
