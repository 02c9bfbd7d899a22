//! Link lookup over the span tree.
//!
//! A position's ancestors are the spans on its span path, innermost first.
//! The first ancestor styled as a link is the enclosing link annotation.

use tdoc::{Document, InlineStyle, Span};

use crate::editor::{
    CursorPointer, ParagraphPath, PointerKey, SegmentRef, SpanPath, first_text_span_path,
    last_text_span_path, span_ref_at,
};
use crate::selection::SelectionRange;

/// A link annotation: the span carrying the link plus the first and last
/// positions of the text it covers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkSpan {
    pub paragraph_path: ParagraphPath,
    pub span_path: SpanPath,
    pub target: Option<String>,
    pub start: CursorPointer,
    pub end: CursorPointer,
}

impl LinkSpan {
    /// Identity is the address of the link node, not the text it covers,
    /// which may shift as the document is edited.
    pub fn is_same_span(&self, other: &LinkSpan) -> bool {
        self.paragraph_path == other.paragraph_path && self.span_path == other.span_path
    }

    pub fn range(&self) -> SelectionRange {
        SelectionRange::new(self.start.clone(), self.end.clone())
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LinkLookup {
    Found(LinkSpan),
    NotFound,
}

impl LinkLookup {
    pub fn found(self) -> Option<LinkSpan> {
        match self {
            LinkLookup::Found(link) => Some(link),
            LinkLookup::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, LinkLookup::Found(_))
    }
}

pub fn find_enclosing_link(document: &Document, position: Option<&CursorPointer>) -> LinkLookup {
    let Some(position) = position else {
        return LinkLookup::NotFound;
    };
    if span_ref_at(document, &position.paragraph_path, &position.span_path).is_none() {
        return LinkLookup::NotFound;
    }

    let indices = position.span_path.indices();
    for depth in (1..=indices.len()).rev() {
        let path = SpanPath::new(indices[..depth].to_vec());
        let Some(span) = span_ref_at(document, &position.paragraph_path, &path) else {
            continue;
        };
        if span.style == InlineStyle::Link {
            return LinkLookup::Found(link_span(&position.paragraph_path, path, span));
        }
    }
    LinkLookup::NotFound
}

fn link_span(paragraph_path: &ParagraphPath, span_path: SpanPath, span: &Span) -> LinkSpan {
    let start_path = first_text_span_path(span, &span_path).unwrap_or_else(|| span_path.clone());
    let (end_path, end_offset) = match last_text_span_path(span, &span_path) {
        Some(path) => {
            let len = span_text_len(span, &span_path, &path);
            (path, len)
        }
        None => (span_path.clone(), 0),
    };
    LinkSpan {
        paragraph_path: paragraph_path.clone(),
        start: CursorPointer::new(paragraph_path.clone(), start_path, 0),
        end: CursorPointer::new(paragraph_path.clone(), end_path, end_offset),
        target: span.link_target.clone(),
        span_path,
    }
}

/// Character length of the descendant at `path`, given the subtree root at `root_path`.
fn span_text_len(root: &Span, root_path: &SpanPath, path: &SpanPath) -> usize {
    let mut span = root;
    for idx in &path.indices()[root_path.len()..] {
        match span.children.get(*idx) {
            Some(child) => span = child,
            None => return 0,
        }
    }
    span.text.chars().count()
}

/// Every distinct link touched by the characters between `start` and `end`.
pub fn links_in_range(
    document: &Document,
    segments: &[SegmentRef],
    start: PointerKey,
    end: PointerKey,
) -> Vec<LinkSpan> {
    let mut links: Vec<LinkSpan> = Vec::new();
    if start == end {
        if let Some(segment) = segments.get(start.segment_index) {
            let mut position = segment.start();
            position.offset = start.offset;
            if let LinkLookup::Found(link) = find_enclosing_link(document, Some(&position)) {
                links.push(link);
            }
        }
        return links;
    }

    for index in start.segment_index..=end.segment_index {
        let Some(segment) = segments.get(index) else {
            break;
        };
        let touches_only_end = index == start.segment_index && start.offset >= segment.len;
        let touches_only_start = index == end.segment_index && end.offset == 0;
        if touches_only_end || touches_only_start {
            continue;
        }
        let position = segment.start();
        if let LinkLookup::Found(link) = find_enclosing_link(document, Some(&position))
            && !links.iter().any(|known| known.is_same_span(&link))
        {
            links.push(link);
        }
    }
    links
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use tdoc::Paragraph;

    fn link(text: &str, target: &str) -> Span {
        let mut span = Span::new_text(text);
        span.style = InlineStyle::Link;
        span.link_target = Some(target.to_string());
        span
    }

    fn styled(style: InlineStyle, children: Vec<Span>) -> Span {
        let mut span = Span::new_text("");
        span.style = style;
        span.children = children;
        span
    }

    /// Wraps `leaf` in `depth` spans, the one at `link_depth` styled as a link.
    fn chain(depth: usize, link_depth: Option<usize>) -> Span {
        let mut span = Span::new_text("leaf");
        for level in (0..depth).rev() {
            let style = if Some(level) == link_depth {
                InlineStyle::Link
            } else {
                InlineStyle::Italic
            };
            let mut parent = styled(style, vec![span]);
            if style == InlineStyle::Link {
                parent.link_target = Some(format!("https://example.com/{level}"));
            }
            span = parent;
        }
        span
    }

    fn document_with(spans: Vec<Span>) -> Document {
        Document::new().with_paragraphs(vec![Paragraph::new_text().with_content(spans)])
    }

    fn pointer(span_path: Vec<usize>, offset: usize) -> CursorPointer {
        CursorPointer::new(ParagraphPath::new_root(0), SpanPath::new(span_path), offset)
    }

    #[rstest]
    #[case(1, 0)]
    #[case(3, 0)]
    #[case(3, 1)]
    #[case(3, 2)]
    #[case(6, 4)]
    fn finds_the_single_link_at_any_depth(#[case] depth: usize, #[case] link_depth: usize) {
        let document = document_with(vec![chain(depth, Some(link_depth))]);
        let leaf_path: Vec<usize> = std::iter::once(0).chain(std::iter::repeat_n(0, depth)).collect();
        let position = pointer(leaf_path, 2);

        let found = find_enclosing_link(&document, Some(&position))
            .found()
            .expect("link should be found");
        assert_eq!(found.span_path, SpanPath::new(vec![0; link_depth + 1]));
        assert_eq!(
            found.target(),
            Some(format!("https://example.com/{link_depth}").as_str())
        );
    }

    #[rstest]
    #[case(0)]
    #[case(2)]
    #[case(5)]
    fn reports_none_without_a_link_ancestor(#[case] depth: usize) {
        let document = document_with(vec![chain(depth, None)]);
        let leaf_path: Vec<usize> = std::iter::once(0).chain(std::iter::repeat_n(0, depth)).collect();
        let position = pointer(leaf_path, 1);
        assert_eq!(find_enclosing_link(&document, Some(&position)), LinkLookup::NotFound);
    }

    #[test]
    fn missing_position_is_not_found() {
        let document = document_with(vec![link("docs", "https://docs.rs")]);
        assert_eq!(find_enclosing_link(&document, None), LinkLookup::NotFound);
    }

    #[test]
    fn stale_position_is_not_found() {
        let document = document_with(vec![link("docs", "https://docs.rs")]);
        let position = pointer(vec![4], 0);
        assert_eq!(find_enclosing_link(&document, Some(&position)), LinkLookup::NotFound);
    }

    #[test]
    fn innermost_link_wins() {
        let inner = link("inner", "https://inner.example");
        let mut outer = styled(InlineStyle::Link, vec![inner]);
        outer.link_target = Some("https://outer.example".to_string());
        let document = document_with(vec![outer]);

        let found = find_enclosing_link(&document, Some(&pointer(vec![0, 0], 1)))
            .found()
            .unwrap();
        assert_eq!(found.target(), Some("https://inner.example"));
    }

    #[test]
    fn link_bounds_cover_nested_text() {
        let mut bold = Span::new_text("bold");
        bold.style = InlineStyle::Bold;
        let mut outer = styled(InlineStyle::Link, vec![Span::new_text("see "), bold]);
        outer.link_target = Some("https://example.com".to_string());
        let document = document_with(vec![Span::new_text("Intro "), outer]);

        let found = find_enclosing_link(&document, Some(&pointer(vec![1, 1], 2)))
            .found()
            .unwrap();
        assert_eq!(found.start, pointer(vec![1, 0], 0));
        assert_eq!(found.end, pointer(vec![1, 1], 4));
    }

    #[test]
    fn links_in_range_skips_touching_boundaries() {
        let document = document_with(vec![
            Span::new_text("Visit "),
            link("docs", "https://docs.rs"),
            Span::new_text(" and "),
            link("crates", "https://crates.io"),
        ]);
        let segments = crate::editor::DocumentEditor::new(document.clone())
            .segments()
            .to_vec();

        let touching = links_in_range(
            &document,
            &segments,
            PointerKey { segment_index: 0, offset: 2 },
            PointerKey { segment_index: 1, offset: 0 },
        );
        assert!(touching.is_empty());

        let both = links_in_range(
            &document,
            &segments,
            PointerKey { segment_index: 1, offset: 1 },
            PointerKey { segment_index: 3, offset: 2 },
        );
        let targets: Vec<_> = both.iter().map(|link| link.target().unwrap()).collect();
        assert_eq!(targets, vec!["https://docs.rs", "https://crates.io"]);
    }
}
