//! Benchmarks for the editor component's text handling.
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use vslite_buffer::{History, TextBuffer};
use vslite_core::keymap::{Key, KeyPress, Modifiers};
use vslite_core::{BufferEditor, EditorComponent};

/// Generates a document with the given number of lines.
fn generate_text(lines: usize) -> String {
    (0..lines)
        .map(|i| format!("Line {}: some notes typed into the editor.\n", i))
        .collect()
}

/// Binding a document replaces the whole buffer.
fn bench_set_text(c: &mut Criterion) {
    let mut group = c.benchmark_group("set_text");

    for size in [100, 1000, 10000, 100000].iter() {
        let text = generate_text(*size);

        group.bench_with_input(BenchmarkId::new("buffer", size), &text, |b, text| {
            let mut buffer = TextBuffer::new();
            b.iter(|| {
                buffer.set_text(black_box(text));
                black_box(buffer.len_lines())
            })
        });

        group.bench_with_input(BenchmarkId::new("editor", size), &text, |b, text| {
            let mut editor = BufferEditor::new();
            b.iter(|| {
                editor.set_value(black_box(text));
                black_box(editor.take_events())
            })
        });
    }

    group.finish();
}

/// Pumping edits back reads the full value after every change.
fn bench_value(c: &mut Criterion) {
    let mut group = c.benchmark_group("value");

    for size in [1000, 10000].iter() {
        let mut editor = BufferEditor::new();
        editor.set_value(&generate_text(*size));

        group.bench_with_input(BenchmarkId::from_parameter(size), &editor, |b, editor| {
            b.iter(|| black_box(editor.value()))
        });
    }

    group.finish();
}

/// Line export reads and clears a single line.
fn bench_line_ops(c: &mut Criterion) {
    let mut group = c.benchmark_group("line_ops");

    let text = generate_text(10000);

    group.bench_function("line_text", |b| {
        let buffer = TextBuffer::from(text.as_str());
        b.iter(|| black_box(buffer.line_text(black_box(5000)).unwrap()))
    });

    group.bench_function("replace_line_text", |b| {
        b.iter_with_setup(
            || TextBuffer::from(text.as_str()),
            |mut buffer| {
                buffer.replace_line_text(5000, "").unwrap();
                black_box(buffer)
            },
        )
    });

    group.finish();
}

/// Typing through the key handler.
fn bench_typing(c: &mut Criterion) {
    let mut group = c.benchmark_group("typing");

    let keys: Vec<KeyPress> = "the quick brown fox jumps over the lazy dog"
        .chars()
        .map(|ch| KeyPress::new(Key::Char(ch), Modifiers::NONE))
        .chain(std::iter::once(KeyPress::plain(Key::Enter)))
        .collect();

    group.bench_function("key_down_line", |b| {
        b.iter_with_setup(BufferEditor::new, |mut editor| {
            for key in &keys {
                editor.key_down(black_box(key));
            }
            black_box(editor)
        })
    });

    group.finish();
}

/// Undo after a run of separate edits.
fn bench_undo(c: &mut Criterion) {
    let mut group = c.benchmark_group("undo");

    group.bench_function("undo_100_edits", |b| {
        b.iter_with_setup(
            || {
                let mut buffer = TextBuffer::with_history(History::new(1000).without_coalescing());
                for i in 0..100 {
                    buffer.insert(i * 5, "test ").unwrap();
                }
                buffer
            },
            |mut buffer| {
                for _ in 0..100 {
                    buffer.undo().unwrap();
                }
                black_box(buffer)
            },
        )
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_set_text,
    bench_value,
    bench_line_ops,
    bench_typing,
    bench_undo,
);

criterion_main!(benches);
