use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span},
};
use unicode_width::UnicodeWidthChar;

use tdoc::{ChecklistItem, Document, InlineStyle, Paragraph, ParagraphType, Span as DocSpan};

use crate::editor::{CursorPointer, PointerKey, SegmentRef, emits_segment};
use crate::theme::Theme;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CursorVisualPosition {
    pub line: usize,
    pub column: u16,
}

/// Where a document position ended up on screen.
#[derive(Clone, Debug)]
pub struct CursorDisplay {
    pub key: PointerKey,
    pub pointer: CursorPointer,
    pub position: CursorVisualPosition,
}

#[derive(Debug)]
pub struct RenderResult {
    pub lines: Vec<Line<'static>>,
    pub cursor: Option<CursorVisualPosition>,
    pub total_lines: usize,
    pub cursor_map: Vec<CursorDisplay>,
}

pub struct RenderOptions<'a> {
    pub width: usize,
    pub cursor: Option<PointerKey>,
    /// Half-open range of selected characters, in document order.
    pub selection: Option<(PointerKey, PointerKey)>,
    pub theme: &'a Theme,
}

/// Lays out `document` into terminal lines. `segments` must be the segment
/// list collected from the same document; positions are keyed by it.
pub fn render_document(
    document: &Document,
    segments: &[SegmentRef],
    options: &RenderOptions<'_>,
) -> RenderResult {
    let mut renderer = Renderer::new(segments, options);
    renderer.render_document(document);
    renderer.finish()
}

struct Renderer<'a> {
    wrap_width: usize,
    segments: &'a [SegmentRef],
    options: &'a RenderOptions<'a>,
    next_segment: usize,
    cursor: Option<CursorVisualPosition>,
    cursor_map: Vec<CursorDisplay>,
    lines: Vec<Line<'static>>,
    current_line_index: usize,
}

impl<'a> Renderer<'a> {
    fn new(segments: &'a [SegmentRef], options: &'a RenderOptions<'a>) -> Self {
        Self {
            wrap_width: options.width.max(1),
            segments,
            options,
            next_segment: 0,
            cursor: None,
            cursor_map: Vec::new(),
            lines: Vec::new(),
            current_line_index: 0,
        }
    }

    fn render_document(&mut self, document: &Document) {
        for (idx, paragraph) in document.paragraphs.iter().enumerate() {
            if idx > 0 {
                self.push_blank_line();
            }
            self.render_paragraph(paragraph, "");
        }
    }

    fn render_paragraph(&mut self, paragraph: &Paragraph, prefix: &str) {
        match paragraph.paragraph_type() {
            ParagraphType::Text => self.render_text(paragraph.content(), prefix, prefix),
            ParagraphType::Header1 => self.render_header(paragraph, prefix, HeaderLevel::One),
            ParagraphType::Header2 => self.render_header(paragraph, prefix, HeaderLevel::Two),
            ParagraphType::Header3 => self.render_header(paragraph, prefix, HeaderLevel::Three),
            ParagraphType::CodeBlock => self.render_code_block(paragraph, prefix),
            ParagraphType::Quote => self.render_quote(paragraph, prefix),
            ParagraphType::UnorderedList => self.render_list(paragraph, prefix, false),
            ParagraphType::OrderedList => self.render_list(paragraph, prefix, true),
            ParagraphType::Checklist => {
                for (idx, item) in paragraph.checklist_items().iter().enumerate() {
                    if idx > 0 {
                        self.push_blank_line();
                    }
                    self.render_checklist_item(item, prefix);
                }
            }
            #[allow(unreachable_patterns)]
            _ => {
                if paragraph.paragraph_type().is_leaf() {
                    self.render_text(paragraph.content(), prefix, prefix);
                }
                for child in paragraph.children() {
                    self.render_paragraph(child, prefix);
                }
            }
        }
    }

    fn render_text(&mut self, content: &[DocSpan], first_prefix: &str, continuation_prefix: &str) {
        let fragments = self.fragments_for(content);
        let lines = wrap_fragments(&fragments, first_prefix, continuation_prefix, self.wrap_width);
        self.consume_lines(lines);
    }

    fn render_header(&mut self, paragraph: &Paragraph, prefix: &str, level: HeaderLevel) {
        let fragments = self.fragments_for(paragraph.content());
        let mut lines = wrap_fragments(&fragments, prefix, prefix, self.wrap_width);
        for line in &mut lines {
            for segment in &mut line.spans {
                segment.style = segment.style.add_modifier(Modifier::BOLD);
            }
        }
        self.consume_lines(lines);

        let underline_char = match level {
            HeaderLevel::One => None,
            HeaderLevel::Two => Some('='),
            HeaderLevel::Three => Some('-'),
        };
        if let Some(ch) = underline_char {
            let width = self.lines.last().map(line_width).unwrap_or(0);
            self.push_plain_line(&underline_string(width, ch));
        }
    }

    fn render_code_block(&mut self, paragraph: &Paragraph, prefix: &str) {
        let fence = self.code_block_fence(prefix);
        self.push_plain_line(&fence);
        let fragments = self.fragments_for(paragraph.content());
        let lines = wrap_fragments(&fragments, prefix, prefix, usize::MAX / 4);
        self.consume_lines(lines);
        self.push_plain_line(&fence);
    }

    fn render_quote(&mut self, paragraph: &Paragraph, prefix: &str) {
        let quote_prefix = format!("{}| ", prefix);
        for (idx, child) in paragraph.children().iter().enumerate() {
            if idx > 0 {
                self.push_blank_line();
            }
            self.render_paragraph(child, &quote_prefix);
        }
    }

    fn render_list(&mut self, paragraph: &Paragraph, prefix: &str, ordered: bool) {
        for (idx, entry) in paragraph.entries().iter().enumerate() {
            if idx > 0 {
                self.push_blank_line();
            }
            let marker = if ordered {
                format!("{}. ", idx + 1)
            } else {
                "• ".to_string()
            };
            let first_prefix = format!("{}{}", prefix, marker);
            let continuation_prefix = format!("{}{}", prefix, " ".repeat(marker.chars().count()));
            self.render_list_entry(entry, &first_prefix, &continuation_prefix);
        }
    }

    fn render_list_entry(&mut self, entry: &[Paragraph], first_prefix: &str, continuation_prefix: &str) {
        let mut iter = entry.iter();
        let Some(first) = iter.next() else {
            self.push_plain_line(first_prefix);
            return;
        };
        if first.paragraph_type() == ParagraphType::Text {
            self.render_text(first.content(), first_prefix, continuation_prefix);
        } else {
            self.push_plain_line(first_prefix);
            self.render_paragraph(first, continuation_prefix);
        }
        for rest in iter {
            self.render_paragraph(rest, continuation_prefix);
        }
    }

    fn render_checklist_item(&mut self, item: &ChecklistItem, prefix: &str) {
        let marker = if item.checked { "[✓] " } else { "[ ] " };
        let first_prefix = format!("{}{}", prefix, marker);
        let continuation_prefix = format!("{}{}", prefix, " ".repeat(marker.chars().count()));
        self.render_text(&item.content, &first_prefix, &continuation_prefix);
        for child in &item.children {
            self.render_checklist_item(child, &continuation_prefix);
        }
    }

    fn fragments_for(&mut self, content: &[DocSpan]) -> Vec<FragmentItem> {
        let mut fragments = Vec::new();
        for span in content {
            self.collect_fragments(span, Style::default(), &mut fragments);
        }
        fragments
    }

    fn collect_fragments(&mut self, span: &DocSpan, base_style: Style, fragments: &mut Vec<FragmentItem>) {
        let style = merge_style(self.options.theme, base_style, span.style);
        if emits_segment(span) {
            let segment_index = self.next_segment;
            self.next_segment += 1;
            self.tokenize_text(&span.text, segment_index, style, fragments);
        }
        for child in &span.children {
            self.collect_fragments(child, style, fragments);
        }
    }

    fn char_style(&self, key: PointerKey, style: Style) -> Style {
        match self.options.selection {
            Some((start, end)) if start <= key && key < end => {
                style.patch(self.options.theme.selection_style())
            }
            _ => style,
        }
    }

    fn tokenize_text(
        &self,
        text: &str,
        segment_index: usize,
        style: Style,
        fragments: &mut Vec<FragmentItem>,
    ) {
        let mut builder: Option<TokenBuilder> = None;
        let mut pending_events: Vec<TextEvent> = Vec::new();

        for (offset, ch) in text.chars().enumerate() {
            let key = PointerKey {
                segment_index,
                offset,
            };
            pending_events.push(TextEvent { offset: 0, key });
            if ch == '\r' {
                continue;
            }
            if ch == '\n' {
                if let Some(mut token) = builder.take() {
                    token.add_events(&mut pending_events);
                    fragments.push(FragmentItem::Token(token.finish()));
                } else {
                    fragments.push(FragmentItem::Token(Fragment::empty(
                        pending_events.drain(..).collect(),
                    )));
                }
                fragments.push(FragmentItem::LineBreak);
                continue;
            }

            let char_style = self.char_style(key, style);
            let tab = [' '; 4];
            let single = [ch];
            let expanded: &[char] = if ch == '\t' { &tab } else { &single };
            for actual in expanded {
                let is_whitespace = actual.is_whitespace();
                if let Some(current) = builder.as_mut()
                    && current.kind_matches(is_whitespace)
                {
                    current.add_events(&mut pending_events);
                    current.push_char(*actual, char_style);
                    continue;
                }
                // The pending event belongs to this character, so it moves
                // to the new token.
                if let Some(existing) = builder.take() {
                    fragments.push(FragmentItem::Token(existing.finish()));
                }
                let mut new_builder = TokenBuilder::new(is_whitespace);
                new_builder.add_events(&mut pending_events);
                new_builder.push_char(*actual, char_style);
                builder = Some(new_builder);
            }
        }

        pending_events.push(TextEvent {
            offset: 0,
            key: PointerKey {
                segment_index,
                offset: text.chars().count(),
            },
        });
        match builder {
            Some(mut token) => {
                token.add_events(&mut pending_events);
                fragments.push(FragmentItem::Token(token.finish()));
            }
            None => fragments.push(FragmentItem::Token(Fragment::empty(pending_events))),
        }
    }

    fn push_blank_line(&mut self) {
        self.lines.push(Line::from(""));
        self.current_line_index += 1;
    }

    fn push_plain_line(&mut self, content: &str) {
        self.lines.push(Line::from(vec![Span::raw(content.to_string())]));
        self.current_line_index += 1;
    }

    fn code_block_fence(&self, prefix: &str) -> String {
        const MIN_FENCE_WIDTH: usize = 4;
        let available_width = self.wrap_width.saturating_sub(prefix.chars().count());
        format!("{}{}", prefix, "-".repeat(available_width.max(MIN_FENCE_WIDTH)))
    }

    fn consume_lines(&mut self, outputs: Vec<LineOutput>) {
        for output in outputs {
            let spans: Vec<Span<'static>> = output
                .spans
                .into_iter()
                .map(|segment| Span::styled(segment.text, segment.style))
                .collect();
            for event in output.events {
                let position = CursorVisualPosition {
                    line: self.current_line_index,
                    column: event.column,
                };
                if self.options.cursor == Some(event.key) {
                    self.cursor = Some(position);
                }
                if let Some(segment) = self.segments.get(event.key.segment_index) {
                    let mut pointer = segment.start();
                    pointer.offset = event.key.offset;
                    self.cursor_map.push(CursorDisplay {
                        key: event.key,
                        pointer,
                        position,
                    });
                }
            }
            self.lines.push(Line::from(spans));
            self.current_line_index += 1;
        }
    }

    fn finish(mut self) -> RenderResult {
        if self.lines.is_empty() {
            self.lines.push(Line::from(""));
        }
        RenderResult {
            total_lines: self.lines.len(),
            lines: self.lines,
            cursor: self.cursor,
            cursor_map: self.cursor_map,
        }
    }
}

#[derive(Copy, Clone)]
enum HeaderLevel {
    One,
    Two,
    Three,
}

#[derive(Clone)]
struct LineSegment {
    text: String,
    style: Style,
}

struct LineOutput {
    spans: Vec<LineSegment>,
    events: Vec<LocatedEvent>,
}

#[derive(Clone, Copy)]
struct LocatedEvent {
    column: u16,
    key: PointerKey,
}

#[derive(Clone)]
struct Fragment {
    pieces: Vec<LineSegment>,
    kind: FragmentKind,
    width: usize,
    events: Vec<TextEvent>,
}

impl Fragment {
    fn empty(events: Vec<TextEvent>) -> Self {
        Self {
            pieces: Vec::new(),
            kind: FragmentKind::Word,
            width: 0,
            events,
        }
    }
}

#[derive(Clone, Copy)]
enum FragmentKind {
    Word,
    Whitespace,
}

#[derive(Clone)]
enum FragmentItem {
    Token(Fragment),
    LineBreak,
}

#[derive(Clone, Copy)]
struct TextEvent {
    offset: usize,
    key: PointerKey,
}

fn merge_style(theme: &Theme, base: Style, inline: InlineStyle) -> Style {
    match inline {
        InlineStyle::None => base,
        InlineStyle::Bold => base.add_modifier(Modifier::BOLD),
        InlineStyle::Italic => base.add_modifier(Modifier::ITALIC),
        InlineStyle::Highlight => base.patch(theme.highlight_style()),
        InlineStyle::Underline => base.add_modifier(Modifier::UNDERLINED),
        InlineStyle::Strike => base.add_modifier(Modifier::CROSSED_OUT),
        InlineStyle::Link => base.patch(theme.link_style()),
        InlineStyle::Code => base.add_modifier(Modifier::DIM),
    }
}

struct TokenBuilder {
    pieces: Vec<LineSegment>,
    kind: FragmentKind,
    width: usize,
    events: Vec<TextEvent>,
}

impl TokenBuilder {
    fn new(is_whitespace: bool) -> Self {
        Self {
            pieces: Vec::new(),
            kind: if is_whitespace {
                FragmentKind::Whitespace
            } else {
                FragmentKind::Word
            },
            width: 0,
            events: Vec::new(),
        }
    }

    fn kind_matches(&self, is_whitespace: bool) -> bool {
        matches!(
            (self.kind, is_whitespace),
            (FragmentKind::Whitespace, true) | (FragmentKind::Word, false)
        )
    }

    fn add_events(&mut self, pending: &mut Vec<TextEvent>) {
        for mut event in pending.drain(..) {
            event.offset = self.width;
            self.events.push(event);
        }
    }

    fn push_char(&mut self, ch: char, style: Style) {
        match self.pieces.last_mut() {
            Some(piece) if piece.style == style => piece.text.push(ch),
            _ => self.pieces.push(LineSegment {
                text: ch.to_string(),
                style,
            }),
        }
        self.width += UnicodeWidthChar::width(ch).unwrap_or(0);
    }

    fn finish(self) -> Fragment {
        Fragment {
            pieces: self.pieces,
            kind: self.kind,
            width: self.width,
            events: self.events,
        }
    }
}

fn wrap_fragments(
    fragments: &[FragmentItem],
    first_prefix: &str,
    continuation_prefix: &str,
    width: usize,
) -> Vec<LineOutput> {
    let mut outputs = Vec::new();
    let mut builder = LineBuilder::new(first_prefix);
    let mut pending_whitespace: Vec<Fragment> = Vec::new();

    for fragment in fragments {
        match fragment {
            FragmentItem::LineBreak => {
                builder.consume_pending(&mut pending_whitespace);
                outputs.push(builder.build_line());
                builder = LineBuilder::new(continuation_prefix);
            }
            FragmentItem::Token(token) => match token.kind {
                FragmentKind::Whitespace => pending_whitespace.push(token.clone()),
                FragmentKind::Word => {
                    let whitespace_width: usize =
                        pending_whitespace.iter().map(|item| item.width).sum();
                    if builder.width > builder.prefix_width
                        && builder.width + whitespace_width + token.width > width
                    {
                        builder.consume_pending(&mut pending_whitespace);
                        outputs.push(builder.build_line());
                        builder = LineBuilder::new(continuation_prefix);
                    }
                    builder.consume_pending(&mut pending_whitespace);
                    builder.append_token(token.clone());
                }
            },
        }
    }

    builder.consume_pending(&mut pending_whitespace);
    outputs.push(builder.build_line());
    outputs
}

struct LineBuilder {
    segments: Vec<LineSegment>,
    events: Vec<LocatedEvent>,
    width: usize,
    prefix_width: usize,
}

impl LineBuilder {
    fn new(prefix: &str) -> Self {
        let prefix_width = visible_width(prefix);
        let mut segments = Vec::new();
        if !prefix.is_empty() {
            segments.push(LineSegment {
                text: prefix.to_string(),
                style: Style::default(),
            });
        }
        Self {
            segments,
            events: Vec::new(),
            width: prefix_width,
            prefix_width,
        }
    }

    fn consume_pending(&mut self, pending_whitespace: &mut Vec<Fragment>) {
        for fragment in pending_whitespace.drain(..) {
            self.append_token(fragment);
        }
    }

    fn append_token(&mut self, fragment: Fragment) {
        let start = self.width;
        for event in &fragment.events {
            self.events.push(LocatedEvent {
                column: (start + event.offset) as u16,
                key: event.key,
            });
        }
        self.width += fragment.width;
        self.segments.extend(fragment.pieces);
    }

    fn build_line(mut self) -> LineOutput {
        if self.segments.is_empty() {
            self.segments.push(LineSegment {
                text: String::new(),
                style: Style::default(),
            });
        }
        self.events.sort_by_key(|event| (event.column, event.key));
        LineOutput {
            spans: self.segments,
            events: self.events,
        }
    }
}

fn visible_width(text: &str) -> usize {
    text.chars()
        .map(|ch| UnicodeWidthChar::width(ch).unwrap_or(0))
        .sum()
}

fn line_width(line: &Line<'_>) -> usize {
    line.spans
        .iter()
        .map(|span| visible_width(span.content.as_ref()))
        .sum()
}

fn underline_string(width: usize, ch: char) -> String {
    std::iter::repeat_n(ch, width.max(1)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::DocumentEditor;
    use pretty_assertions::assert_eq;
    use tdoc::ftml;

    fn line_text(line: &Line<'_>) -> String {
        line.spans.iter().map(|span| span.content.as_ref()).collect()
    }

    fn render(document: Document, width: usize) -> (DocumentEditor, RenderResult) {
        let editor = DocumentEditor::new(document);
        let theme = Theme::default();
        let options = RenderOptions {
            width,
            cursor: None,
            selection: None,
            theme: &theme,
        };
        let result = render_document(editor.document(), editor.segments(), &options);
        (editor, result)
    }

    fn link(text: &str, target: &str) -> DocSpan {
        let mut span = DocSpan::new_text(text);
        span.style = InlineStyle::Link;
        span.link_target = Some(target.to_string());
        span
    }

    #[test]
    fn wraps_words_at_the_width() {
        let document = ftml! { p { "alpha beta gamma" } };
        let (_, result) = render(document, 11);
        let lines: Vec<_> = result.lines.iter().map(line_text).collect();
        assert_eq!(lines, vec!["alpha beta ", "gamma"]);
    }

    #[test]
    fn cursor_map_covers_every_segment_in_order() {
        let document = ftml! {
            p { "Top" }
            quote {
                p { "Quoted" }
            }
            ul {
                li { p { "Item" } }
            }
        };
        let (editor, result) = render(document, 40);
        let mut seen: Vec<usize> = result
            .cursor_map
            .iter()
            .map(|display| display.key.segment_index)
            .collect();
        seen.dedup();
        assert_eq!(seen, (0..editor.segments().len()).collect::<Vec<_>>());
    }

    #[test]
    fn quote_children_are_prefixed() {
        let document = ftml! { quote { p { "Quoted" } } };
        let (_, result) = render(document, 40);
        assert_eq!(line_text(&result.lines[0]), "| Quoted");
        let first = result
            .cursor_map
            .iter()
            .find(|display| display.key.offset == 0)
            .unwrap();
        assert_eq!(first.position, CursorVisualPosition { line: 0, column: 2 });
    }

    #[test]
    fn links_use_the_link_style() {
        let paragraph = Paragraph::new_text()
            .with_content(vec![DocSpan::new_text("Visit "), link("docs", "https://docs.rs")]);
        let (_, result) = render(Document::new().with_paragraphs(vec![paragraph]), 40);
        let docs = result.lines[0]
            .spans
            .iter()
            .find(|span| span.content.as_ref() == "docs")
            .unwrap();
        assert!(docs.style.add_modifier.contains(Modifier::UNDERLINED));
        assert_eq!(docs.style.fg, Some(Theme::default().link_color));
    }

    #[test]
    fn selection_splits_styles_inside_a_word() {
        let document = ftml! { p { "abcdef" } };
        let editor = DocumentEditor::new(document);
        let theme = Theme::default();
        let options = RenderOptions {
            width: 40,
            cursor: Some(PointerKey {
                segment_index: 0,
                offset: 4,
            }),
            selection: Some((
                PointerKey {
                    segment_index: 0,
                    offset: 2,
                },
                PointerKey {
                    segment_index: 0,
                    offset: 4,
                },
            )),
            theme: &theme,
        };
        let result = render_document(editor.document(), editor.segments(), &options);
        let pieces: Vec<_> = result.lines[0]
            .spans
            .iter()
            .map(|span| span.content.to_string())
            .collect();
        assert_eq!(pieces, vec!["ab", "cd", "ef"]);
        assert_eq!(result.lines[0].spans[1].style.bg, Some(theme.selection_bg));
        assert_eq!(
            result.cursor,
            Some(CursorVisualPosition { line: 0, column: 4 })
        );
    }

    #[test]
    fn checklist_items_render_with_markers() {
        let checked = ChecklistItem::new(true).with_content(vec![DocSpan::new_text("Done")]);
        let open = ChecklistItem::new(false).with_content(vec![DocSpan::new_text("Open")]);
        let checklist = Paragraph::new_checklist().with_checklist_items(vec![checked, open]);
        let (_, result) = render(Document::new().with_paragraphs(vec![checklist]), 40);
        let lines: Vec<_> = result.lines.iter().map(line_text).collect();
        assert_eq!(lines, vec!["[✓] Done", "", "[ ] Open"]);
    }
}
