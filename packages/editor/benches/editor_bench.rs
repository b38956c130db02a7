use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pagecraft_editor::{Block, BlockType, Document, EditSession, EditorConfig, StyleTarget};
use serde_json::json;

fn page(sections: usize) -> Document {
    let mut doc = Document::new();
    doc.page_settings.theme_tokens.insert("primary".into(), json!("#3366FF"));
    doc.page_settings.theme_tokens.insert("fontFamily".into(), json!("Inter"));

    for s in 0..sections {
        let cards: Vec<_> = (0..6)
            .map(|i| {
                json!({
                    "id": format!("s{}-card-{}", s, i),
                    "title": "Card",
                    "styles": { "background": "#fff" },
                    "fieldStyles": { "title": { "fontSize": "20px" } }
                })
            })
            .collect();
        doc.blocks.push(
            Block::new(format!("s{}", s), BlockType::Section).with_child(
                Block::new(format!("s{}-cards", s), BlockType::Cards)
                    .with_style("color", json!("$primary"))
                    .with_setting("cards", json!(cards)),
            ),
        );
    }
    doc
}

fn resolve_field_uncached(c: &mut Criterion) {
    let config = EditorConfig {
        cache_styles: false,
        ..EditorConfig::default()
    };
    let mut session = EditSession::with_config("bench", page(50), config);
    let target = StyleTarget::field(3, "title");

    c.bench_function("resolve_field_uncached", |b| {
        b.iter(|| session.resolve_style(black_box("s25-cards"), black_box(&target)))
    });
}

fn resolve_field_cached(c: &mut Criterion) {
    let mut session = EditSession::new("bench", page(50));
    let target = StyleTarget::field(3, "title");

    c.bench_function("resolve_field_cached", |b| {
        b.iter(|| session.resolve_style(black_box("s25-cards"), black_box(&target)))
    });
}

fn shared_style_fan_out(c: &mut Criterion) {
    let mut session = EditSession::new("bench", page(200));
    let style = session
        .create_shared_style("Cards", "s0-cards")
        .expect("source block exists");
    for s in 1..200 {
        session
            .apply_shared_style(&format!("s{}-cards", s), &style.id)
            .expect("same block type");
    }

    let mut toggle = false;
    c.bench_function("shared_style_fan_out_200", |b| {
        b.iter(|| {
            toggle = !toggle;
            let padding = if toggle { "16px" } else { "24px" };
            session
                .set_style("s0-cards", "padding", json!(padding))
                .expect("block exists");
            session.update_shared_style_from_block(black_box("s0-cards"))
        })
    });
}

fn duplicate_section(c: &mut Criterion) {
    c.bench_function("duplicate_section", |b| {
        b.iter_batched(
            || EditSession::new("bench", page(20)),
            |mut session| session.duplicate_block(black_box("s10")),
            criterion::BatchSize::SmallInput,
        )
    });
}

criterion_group!(
    benches,
    resolve_field_uncached,
    resolve_field_cached,
    shared_style_fan_out,
    duplicate_section
);
criterion_main!(benches);
