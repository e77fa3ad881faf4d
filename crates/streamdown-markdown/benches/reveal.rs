use std::time::Duration;
use std::time::Instant;

use criterion::criterion_group;
use criterion::criterion_main;
use criterion::Criterion;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use streamdown_core::theme::Theme;
use streamdown_markdown::reveal::RevealOptions;
use streamdown_markdown::streaming::RevealView;
use streamdown_markdown::view::MarkdownView;

fn sample_doc(paragraphs: usize) -> String {
    let mut doc = String::from("# Benchmark document\n\n");
    for i in 0..paragraphs {
        doc.push_str(&format!(
            "Paragraph {i} has some **bold** text, a [link](https://example.com/{i}), \
             `inline code`, and a ??highlighted phrase?? to find.\n\n"
        ));
        if i % 7 == 0 {
            doc.push_str("- a list item\n- another list item\n\n");
        }
    }
    doc
}

fn bench_parse_and_layout(c: &mut Criterion) {
    let doc = sample_doc(50);
    let theme = Theme::default();

    c.bench_function("parse_and_layout_80_cols", |b| {
        b.iter(|| {
            let mut view = MarkdownView::new();
            view.set_markdown(&doc);
            view.lines_for_width(80, &theme)
        });
    });
}

fn bench_reveal_to_completion(c: &mut Criterion) {
    let doc = sample_doc(20);
    let area = Rect::new(0, 0, 80, 24);
    let theme = Theme::default();

    c.bench_function("reveal_to_completion_with_render", |b| {
        b.iter(|| {
            let t0 = Instant::now();
            let mut rv = RevealView::new();
            rv.set_source(&doc, t0);
            let mut now = t0;
            while let Some(deadline) = rv.next_deadline() {
                now = now.max(deadline);
                if rv.poll(now) {
                    let mut buf = Buffer::empty(area);
                    rv.render_ref(area, &mut buf, &theme);
                }
            }
            rv.current_prefix().len()
        });
    });
}

fn bench_single_tick(c: &mut Criterion) {
    let doc = sample_doc(50);
    let theme = Theme::default();
    let area = Rect::new(0, 0, 80, 24);

    c.bench_function("one_reveal_tick_mid_document", |b| {
        let t0 = Instant::now();
        let mut rv = RevealView::new();
        rv.set_source(&doc, t0);
        // Advance halfway so each measured tick reparses a large prefix.
        rv.poll(t0 + Duration::from_millis(30) * (doc.len() as u32 / 10));
        let mut buf = Buffer::empty(area);
        rv.render_ref(area, &mut buf, &theme);

        let mut now = t0 + Duration::from_millis(30) * (doc.len() as u32 / 10);
        b.iter(|| {
            if let Some(deadline) = rv.next_deadline() {
                now = now.max(deadline);
                rv.poll(now);
                let mut buf = Buffer::empty(area);
                rv.render_ref(area, &mut buf, &theme);
            }
        });
    });
}

criterion_group!(
    benches,
    bench_parse_and_layout,
    bench_reveal_to_completion,
    bench_single_tick
);
criterion_main!(benches);
