use link_panel::{
    config::LinkPanelConfig,
    editor::{CursorPointer, DocumentEditor, ParagraphPath, SpanPath},
    editor_display::EditorDisplay,
    link_ui::LinkUi,
    locator::{find_enclosing_link, links_in_range},
    render::{RenderOptions, render_document},
    selection::SelectionRange,
    surface::MutationEngine,
    theme::Theme,
};
use ratatui::layout::Rect;
use std::time::{Duration, Instant};
use tdoc::{Document, InlineStyle, Paragraph, Span};

/// Performance benchmarks for link lookup, layout and panel tracking
///
/// Run with: cargo test --release --bench performance -- --nocapture
const SMALL_DOC_PARAGRAPHS: usize = 10;
const MEDIUM_DOC_PARAGRAPHS: usize = 100;
const LARGE_DOC_PARAGRAPHS: usize = 1000;

const ITERATIONS: usize = 100;

fn link(text: &str, target: &str) -> Span {
    let mut span = Span::new_text(text);
    span.style = InlineStyle::Link;
    span.link_target = Some(target.to_string());
    span
}

/// Every paragraph holds two links, one of them nested inside bold text.
fn create_linked_document(num_paragraphs: usize) -> Document {
    let mut doc = Document::new();

    for i in 0..num_paragraphs {
        let nested = Span::new_styled(InlineStyle::Bold)
            .with_children(vec![link("nested link", &format!("https://example.com/{i}/b"))]);
        let paragraph = Paragraph::new_text().with_content(vec![
            Span::new_text(&format!("Paragraph {i} starts with plain words and then ")),
            link("a link", &format!("https://example.com/{i}/a")),
            Span::new_text(" followed by more plain words and a "),
            nested,
            Span::new_text(" before the end of the line."),
        ]);
        doc.add_paragraph(paragraph);
    }

    doc
}

fn at(root: usize, span: Vec<usize>, offset: usize) -> CursorPointer {
    CursorPointer::new(ParagraphPath::new_root(root), SpanPath::new(span), offset)
}

struct BenchmarkResult {
    name: String,
    iterations: usize,
    total_duration: Duration,
    avg_duration: Duration,
    min_duration: Duration,
    max_duration: Duration,
}

impl BenchmarkResult {
    fn print(&self) {
        println!("\n{}", "=".repeat(70));
        println!("Benchmark: {}", self.name);
        println!("{}", "=".repeat(70));
        println!("Iterations:     {}", self.iterations);
        println!("Total time:     {:?}", self.total_duration);
        println!("Average:        {:?}", self.avg_duration);
        println!("Min:            {:?}", self.min_duration);
        println!("Max:            {:?}", self.max_duration);
        println!(
            "Ops/sec:        {:.2}",
            1_000_000.0 / self.avg_duration.as_micros().max(1) as f64
        );

        if self.avg_duration.as_millis() > 100 {
            println!("\n⚠️  WARNING: Average duration > 100ms (user-perceptible lag)");
        } else if self.avg_duration.as_millis() > 16 {
            println!("\n⚠️  WARNING: Average duration > 16ms (may drop frames)");
        }
    }
}

fn benchmark<F>(name: &str, iterations: usize, mut f: F) -> BenchmarkResult
where
    F: FnMut(),
{
    let mut durations = Vec::with_capacity(iterations);

    // Warmup
    for _ in 0..10 {
        f();
    }

    for _ in 0..iterations {
        let start = Instant::now();
        f();
        durations.push(start.elapsed());
    }

    let total_duration: Duration = durations.iter().sum();
    let avg_duration = total_duration / iterations as u32;
    let min_duration = *durations.iter().min().unwrap();
    let max_duration = *durations.iter().max().unwrap();

    BenchmarkResult {
        name: name.to_string(),
        iterations,
        total_duration,
        avg_duration,
        min_duration,
        max_duration,
    }
}

fn sized_documents() -> Vec<(&'static str, Document)> {
    vec![
        ("Small (10 paras)", create_linked_document(SMALL_DOC_PARAGRAPHS)),
        ("Medium (100 paras)", create_linked_document(MEDIUM_DOC_PARAGRAPHS)),
        ("Large (1000 paras)", create_linked_document(LARGE_DOC_PARAGRAPHS)),
    ]
}

#[test]
fn bench_enclosing_link_lookup() {
    println!("\n\n╔════════════════════════════════════════════════════════════════╗");
    println!("║           ENCLOSING LINK LOOKUP BENCHMARKS                     ║");
    println!("╚════════════════════════════════════════════════════════════════╝");

    for (name, doc) in sized_documents() {
        let last = doc.paragraphs.len() - 1;
        let inside_nested = at(last, vec![3, 0], 4);
        let plain = at(last, vec![0], 4);

        let result = benchmark(
            &format!("find_enclosing_link (nested) - {}", name),
            ITERATIONS * 10,
            || {
                assert!(find_enclosing_link(&doc, Some(&inside_nested)).is_found());
            },
        );
        result.print();

        let result = benchmark(
            &format!("find_enclosing_link (plain text) - {}", name),
            ITERATIONS * 10,
            || {
                assert!(!find_enclosing_link(&doc, Some(&plain)).is_found());
            },
        );
        result.print();
    }
}

#[test]
fn bench_links_in_range() {
    println!("\n\n╔════════════════════════════════════════════════════════════════╗");
    println!("║           LINKS IN RANGE BENCHMARKS                            ║");
    println!("╚════════════════════════════════════════════════════════════════╝");

    for (name, doc) in sized_documents() {
        let editor = DocumentEditor::new(doc);
        let segments = editor.segments();
        let Some(start) = editor.pointer_key(&at(0, vec![0], 0)) else {
            panic!("start of document has no key");
        };
        let end_paragraph = editor.document().paragraphs.len().min(10) - 1;
        let Some(end) = editor.pointer_key(&at(end_paragraph, vec![4], 3)) else {
            panic!("end of range has no key");
        };

        let result = benchmark(
            &format!("links_in_range (first 10 paras) - {}", name),
            ITERATIONS,
            || {
                let links = links_in_range(editor.document(), segments, start, end);
                assert_eq!(links.len(), (end_paragraph + 1) * 2);
            },
        );
        result.print();
    }
}

#[test]
fn bench_rendering_linked_documents() {
    println!("\n\n╔════════════════════════════════════════════════════════════════╗");
    println!("║           RENDERING PERFORMANCE BENCHMARKS                     ║");
    println!("╚════════════════════════════════════════════════════════════════╝");

    let theme = Theme::default();
    for (name, doc) in sized_documents() {
        let editor = DocumentEditor::new(doc);
        let cursor = editor.pointer_key(&editor.cursor_pointer());
        let options = RenderOptions {
            width: 80,
            cursor,
            selection: None,
            theme: &theme,
        };

        let result = benchmark(&format!("render_document - {}", name), ITERATIONS, || {
            let _ = render_document(editor.document(), editor.segments(), &options);
        });
        result.print();
    }
}

#[test]
fn bench_apply_and_remove_link() {
    println!("\n\n╔════════════════════════════════════════════════════════════════╗");
    println!("║           LINK MUTATION BENCHMARKS                             ║");
    println!("╚════════════════════════════════════════════════════════════════╝");

    for (name, doc) in sized_documents() {
        let middle = doc.paragraphs.len() / 2;
        let mut display = EditorDisplay::new(DocumentEditor::new(doc));
        let range = SelectionRange::new(at(middle, vec![0], 0), at(middle, vec![0], 9));

        let result = benchmark(
            &format!("apply_link + remove_link - {}", name),
            ITERATIONS,
            || {
                assert_eq!(display.apply_link(&range, "https://bench.example"), Ok(true));
                let linked = SelectionRange::collapsed(at(middle, vec![0], 2));
                assert_eq!(display.remove_link(&linked), Ok(true));
            },
        );
        result.print();

        println!("\n💡 NOTE: Each mutation rebuilds the segment list.");
    }
}

#[test]
fn bench_tracking_across_renders() {
    println!("\n\n╔════════════════════════════════════════════════════════════════╗");
    println!("║           PANEL TRACKING BENCHMARKS                            ║");
    println!("╚════════════════════════════════════════════════════════════════╝");

    let theme = Theme::default();
    for (name, doc) in sized_documents() {
        let mut display = EditorDisplay::new(DocumentEditor::new(doc));
        display.move_to_pointer(&at(0, vec![1], 2));
        let render = display.render_document(80, &theme);
        display.update_after_render(Rect::new(0, 0, 80, 40), render.total_lines, 0);

        let mut ui = LinkUi::from_config(&LinkPanelConfig::default());
        assert!(ui.handle_document_click(&mut display));

        let result = benchmark(
            &format!("render + handle_render while tracking - {}", name),
            ITERATIONS,
            || {
                let render = display.render_document(80, &theme);
                display.update_after_render(Rect::new(0, 0, 80, 40), render.total_lines, 0);
                ui.handle_render(&mut display);
                assert!(ui.is_tracking());
            },
        );
        result.print();
    }
}
