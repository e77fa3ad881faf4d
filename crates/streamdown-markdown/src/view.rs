use pulldown_cmark::Event;
use pulldown_cmark::HeadingLevel;
use pulldown_cmark::Options;
use pulldown_cmark::Parser;
use pulldown_cmark::Tag;
use pulldown_cmark::TagEnd;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Modifier;
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::text::Span;
use streamdown_core::input::KeyCode;
use streamdown_core::input::KeyEvent;
use streamdown_core::render;
use streamdown_core::theme::Theme;
use streamdown_core::viewport::ViewportState;
use unicode_width::UnicodeWidthChar;
use unicode_width::UnicodeWidthStr;
use url::Url;

use crate::highlight;

#[derive(Clone, Copy, Debug, Default)]
struct InlineFlags {
    emphasis: bool,
    strong: bool,
    strike: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ProseStyle {
    Normal,
    Heading(u8),
    BlockQuote,
    List,
}

#[derive(Clone, Debug)]
struct Segment {
    text: String,
    style: ProseStyle,
    flags: InlineFlags,
    inline_code: bool,
    link: bool,
    muted: bool,
    /// Hover label for `??text??` highlight spans.
    hover: Option<String>,
}

impl Segment {
    fn new(text: String, style: ProseStyle, flags: InlineFlags) -> Self {
        Self {
            text,
            style,
            flags,
            inline_code: false,
            link: false,
            muted: false,
            hover: None,
        }
    }

    fn derived(&self, text: String) -> Self {
        Self {
            text,
            ..self.clone()
        }
    }
}

#[derive(Clone, Debug)]
struct ProseBlock {
    lines: Vec<Vec<Segment>>,
    initial_prefix: Vec<Segment>,
    subsequent_prefix: Vec<Segment>,
}

#[derive(Clone, Debug)]
struct CodeBlock {
    lines: Vec<String>,
    indent: u16,
    prefix: Vec<Segment>,
}

#[derive(Clone, Debug)]
enum Block {
    Prose(ProseBlock),
    Code(CodeBlock),
    Rule(Vec<Segment>),
    Blank(Vec<Segment>),
}

#[derive(Clone, Debug)]
pub struct MarkdownViewOptions {
    pub wrap_prose: bool,
    pub show_scrollbar: bool,
    pub show_link_destinations: bool,
    pub padding_left: u16,
    pub padding_right: u16,
    pub blockquote_prefix: String,
    pub code_block_indent: u16,
    pub base_url: Option<String>,
}

impl Default for MarkdownViewOptions {
    fn default() -> Self {
        Self {
            wrap_prose: true,
            show_scrollbar: true,
            show_link_destinations: false,
            padding_left: 0,
            padding_right: 0,
            blockquote_prefix: "| ".to_string(),
            code_block_indent: 4,
            base_url: None,
        }
    }
}

/// One highlight span's position on a laid-out line, in cell columns.
#[derive(Clone, Debug)]
struct HighlightHit {
    start_col: u32,
    end_col: u32,
    label: String,
}

#[derive(Clone, Debug)]
struct RenderedLine {
    spans: Vec<Span<'static>>,
    width: u32,
    hits: Vec<HighlightHit>,
}

/// A scrollable markdown viewer with `??text??` hover highlights.
///
/// Parsing happens in [`Self::set_markdown`]; layout is cached per width and
/// rebuilt lazily on render. The view never owns timers — pair it with
/// [`crate::streaming::RevealView`] for streaming reveal.
#[derive(Clone, Debug, Default)]
pub struct MarkdownView {
    source: String,
    blocks: Vec<Block>,
    rendered: Vec<RenderedLine>,
    cached_width: Option<u16>,
    pub state: ViewportState,
    options: MarkdownViewOptions,
}

impl MarkdownView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: MarkdownViewOptions) -> Self {
        Self {
            options,
            ..Default::default()
        }
    }

    /// Sets the markdown source and reparses blocks. Layout is invalidated.
    pub fn set_markdown(&mut self, input: &str) {
        self.source = input.to_string();
        self.blocks = parse_markdown_blocks(input, &self.options);
        self.cached_width = None;
        self.rendered.clear();
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Handles a scroll key. Returns `true` when the viewport moved.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.state.scroll_y_by(-1),
            KeyCode::Down | KeyCode::Char('j') => self.state.scroll_y_by(1),
            KeyCode::PageUp => self.state.page_up(),
            KeyCode::PageDown => self.state.page_down(),
            KeyCode::Home | KeyCode::Char('g') => self.state.to_top(),
            KeyCode::End | KeyCode::Char('G') => self.state.to_bottom(),
            _ => return false,
        }
        true
    }

    pub fn render_ref(&mut self, area: Rect, buf: &mut Buffer, theme: &Theme) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        let (content_area, inner, scrollbar_x) = self.layout_areas(area);
        // Layout first so a pending "stick to bottom" offset clamps against
        // the new content height, not last frame's.
        self.ensure_layout(inner.width, theme);
        self.state.set_viewport(inner.width, inner.height);

        for row in 0..content_area.height {
            let y = content_area.y + row;
            buf.set_style(
                Rect::new(content_area.x, y, content_area.width, 1),
                theme.text_primary,
            );
            let idx = (self.state.y as usize).saturating_add(row as usize);
            if let Some(line) = self.rendered.get(idx) {
                render::render_spans_clipped(
                    inner.x,
                    y,
                    self.state.x,
                    inner.width,
                    buf,
                    &line.spans,
                    theme.text_primary,
                );
            }
        }

        if let Some(sb_x) = scrollbar_x {
            render::render_scrollbar(
                Rect::new(sb_x, area.y, 1, area.height),
                buf,
                &self.state,
                theme.text_muted,
            );
        }
    }

    /// Fully laid-out lines for `width`. Mainly for tests and snapshots.
    pub fn lines_for_width(&mut self, width: u16, theme: &Theme) -> Vec<Line<'static>> {
        let width = width
            .saturating_sub(self.options.padding_left)
            .saturating_sub(self.options.padding_right);
        self.ensure_layout(width, theme);
        self.rendered
            .iter()
            .map(|l| Line::from(l.spans.clone()))
            .collect()
    }

    /// The hover label of the highlight span under screen cell `(x, y)`, if
    /// any. Requires a prior render (layout must exist for the current area).
    pub fn highlight_at(&self, area: Rect, x: u16, y: u16) -> Option<&str> {
        let (content_area, inner, _) = self.layout_areas(area);
        if x < inner.x
            || x >= inner.x + inner.width
            || y < content_area.y
            || y >= content_area.y + content_area.height
        {
            return None;
        }

        let idx = (self.state.y as usize).saturating_add((y - content_area.y) as usize);
        let col = self.state.x.saturating_add((x - inner.x) as u32);
        let line = self.rendered.get(idx)?;
        line.hits
            .iter()
            .find(|h| col >= h.start_col && col < h.end_col)
            .map(|h| h.label.as_str())
    }

    /// Screen cell just past the end of the last laid-out line, for drawing a
    /// streaming caret. `None` when that cell is scrolled out of view.
    pub fn caret_cell(&self, area: Rect) -> Option<(u16, u16)> {
        let (content_area, inner, _) = self.layout_areas(area);
        if inner.width == 0 || content_area.height == 0 {
            return None;
        }

        let (line_idx, line_w) = match self.rendered.last() {
            Some(last) => (self.rendered.len() - 1, last.width),
            None => (0, 0),
        };

        let row = (line_idx as u32).checked_sub(self.state.y)?;
        if row >= content_area.height as u32 {
            return None;
        }
        let col = line_w.checked_sub(self.state.x)?;
        let col = col.min(inner.width.saturating_sub(1) as u32);

        Some((inner.x + col as u16, content_area.y + row as u16))
    }

    fn layout_areas(&self, area: Rect) -> (Rect, Rect, Option<u16>) {
        let (content_area, scrollbar_x) = if self.options.show_scrollbar && area.width >= 2 {
            (
                Rect::new(area.x, area.y, area.width - 1, area.height),
                Some(area.x + area.width - 1),
            )
        } else {
            (area, None)
        };
        let inner = inset_h(
            content_area,
            self.options.padding_left,
            self.options.padding_right,
        );
        (content_area, inner, scrollbar_x)
    }

    fn ensure_layout(&mut self, width: u16, theme: &Theme) {
        if self.cached_width == Some(width) {
            return;
        }
        self.cached_width = Some(width);

        if width == 0 {
            self.rendered.clear();
            self.state.set_content(0, 0);
            return;
        }

        self.rendered = layout_blocks(&self.blocks, width, &self.options, theme);
        let content_h = self.rendered.len() as u32;
        let content_w = self.rendered.iter().map(|l| l.width).max().unwrap_or(0);
        self.state.set_content(content_w, content_h);
    }
}

fn inset_h(area: Rect, left: u16, right: u16) -> Rect {
    let left = left.min(area.width);
    let right = right.min(area.width.saturating_sub(left));
    Rect::new(
        area.x.saturating_add(left),
        area.y,
        area.width.saturating_sub(left).saturating_sub(right),
        area.height,
    )
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

struct IndentCtx {
    initial: Vec<Segment>,
    subsequent: Vec<Segment>,
    /// Set once a block consumed the initial prefix (e.g. the bullet); later
    /// blocks in the same item indent instead.
    used: bool,
}

struct ListCtx {
    ordered: bool,
    index: u64,
}

struct Builder<'o> {
    options: &'o MarkdownViewOptions,
    blocks: Vec<Block>,
    indent_stack: Vec<IndentCtx>,
    list_stack: Vec<ListCtx>,
    blockquote_depth: usize,
    in_paragraph: bool,
    current_style: ProseStyle,
    inline: InlineFlags,
    in_link: bool,
    link_dest: Option<String>,
    link_text: String,
    image_alt: Option<String>,
    para_lines: Vec<Vec<Segment>>,
    para_current: Vec<Segment>,
    para_prefix_initial: Vec<Segment>,
    para_prefix_subsequent: Vec<Segment>,
    in_code_block: bool,
    code_lines: Vec<String>,
    code_current: String,
    code_prefix: Vec<Segment>,
    wants_blank: bool,
}

impl<'o> Builder<'o> {
    fn new(options: &'o MarkdownViewOptions) -> Self {
        Self {
            options,
            blocks: Vec::new(),
            indent_stack: Vec::new(),
            list_stack: Vec::new(),
            blockquote_depth: 0,
            in_paragraph: false,
            current_style: ProseStyle::Normal,
            inline: InlineFlags::default(),
            in_link: false,
            link_dest: None,
            link_text: String::new(),
            image_alt: None,
            para_lines: Vec::new(),
            para_current: Vec::new(),
            para_prefix_initial: Vec::new(),
            para_prefix_subsequent: Vec::new(),
            in_code_block: false,
            code_lines: Vec::new(),
            code_current: String::new(),
            code_prefix: Vec::new(),
            wants_blank: false,
        }
    }

    fn snapshot_prefixes(&self) -> (Vec<Segment>, Vec<Segment>) {
        let mut initial = Vec::new();
        let mut subsequent = Vec::new();
        for ctx in &self.indent_stack {
            let first = if ctx.used { &ctx.subsequent } else { &ctx.initial };
            initial.extend(first.iter().cloned());
            subsequent.extend(ctx.subsequent.iter().cloned());
        }
        (initial, subsequent)
    }

    fn consume_initial(&mut self) {
        for ctx in &mut self.indent_stack {
            ctx.used = true;
        }
    }

    fn maybe_blank(&mut self) {
        if self.wants_blank && !matches!(self.blocks.last(), None | Some(Block::Blank(_))) {
            let (_, subsequent) = self.snapshot_prefixes();
            self.blocks.push(Block::Blank(subsequent));
        }
        self.wants_blank = false;
    }

    fn start_paragraph(&mut self, style: ProseStyle) {
        self.flush_para();
        self.maybe_blank();
        self.in_paragraph = true;
        self.current_style = match style {
            ProseStyle::Normal if self.blockquote_depth > 0 => ProseStyle::BlockQuote,
            other => other,
        };
        let (initial, subsequent) = self.snapshot_prefixes();
        self.para_prefix_initial = initial;
        self.para_prefix_subsequent = subsequent;
    }

    fn ensure_paragraph(&mut self) {
        if !self.in_paragraph {
            self.start_paragraph(ProseStyle::Normal);
        }
    }

    fn flush_para(&mut self) {
        if !self.in_paragraph {
            return;
        }
        if !self.para_current.is_empty() {
            self.para_lines.push(std::mem::take(&mut self.para_current));
        }
        let lines = std::mem::take(&mut self.para_lines);
        if !lines.is_empty() {
            let block = ProseBlock {
                lines,
                initial_prefix: std::mem::take(&mut self.para_prefix_initial),
                subsequent_prefix: std::mem::take(&mut self.para_prefix_subsequent),
            };
            self.blocks.push(Block::Prose(block));
            self.consume_initial();
            self.wants_blank = self.list_stack.is_empty();
        }
        self.in_paragraph = false;
    }

    fn flush_code(&mut self) {
        if !self.in_code_block {
            return;
        }
        if !self.code_current.is_empty() {
            self.code_lines.push(std::mem::take(&mut self.code_current));
        }
        if self.code_lines.last().is_some_and(String::is_empty) {
            self.code_lines.pop();
        }
        self.maybe_blank();
        self.blocks.push(Block::Code(CodeBlock {
            lines: std::mem::take(&mut self.code_lines),
            indent: self.options.code_block_indent,
            prefix: std::mem::take(&mut self.code_prefix),
        }));
        self.consume_initial();
        self.in_code_block = false;
        self.wants_blank = self.list_stack.is_empty();
    }

    fn push_inline(&mut self, seg: Segment) {
        self.ensure_paragraph();
        self.para_current.push(seg);
    }

    /// Rewrites a text leaf through the highlight transform and appends the
    /// resulting parts in order. Clean text stays a single segment.
    fn push_text(&mut self, text: &str) {
        self.ensure_paragraph();
        let style = self.current_style;
        let flags = self.inline;
        let in_link = self.in_link;

        let plain = |b: &mut Self, t: &str| {
            let mut seg = Segment::new(t.to_string(), style, flags);
            seg.link = in_link;
            b.para_current.push(seg);
        };

        match highlight::split_text(text) {
            None => plain(self, text),
            Some(parts) => {
                for part in parts {
                    match part {
                        highlight::HighlightPart::Text(t) => plain(self, t),
                        highlight::HighlightPart::Highlight(inner) => {
                            let mut seg = Segment::new(inner.to_string(), style, flags);
                            seg.hover = Some(highlight::auxiliary_label(inner));
                            self.para_current.push(seg);
                        }
                    }
                }
            }
        }
    }

    fn resolve_dest(&self, dest: &str) -> String {
        let Some(base) = self.options.base_url.as_deref() else {
            return dest.to_string();
        };
        if Url::parse(dest).is_ok() {
            return dest.to_string();
        }
        match Url::parse(base).and_then(|b| b.join(dest)) {
            Ok(url) => url.to_string(),
            Err(_) => dest.to_string(),
        }
    }
}

fn parse_markdown_blocks(input: &str, options: &MarkdownViewOptions) -> Vec<Block> {
    let mut parse_options = Options::empty();
    parse_options.insert(Options::ENABLE_STRIKETHROUGH);
    let parser = Parser::new_ext(input, parse_options);

    let mut b = Builder::new(options);

    for ev in parser {
        match ev {
            Event::Start(tag) => match tag {
                Tag::Paragraph => b.start_paragraph(ProseStyle::Normal),
                Tag::Heading { level, .. } => {
                    b.start_paragraph(ProseStyle::Heading(heading_level(level)));
                }
                Tag::BlockQuote(_) => {
                    b.flush_code();
                    b.flush_para();
                    b.maybe_blank();
                    b.blockquote_depth += 1;
                    let bar = Segment::new(
                        b.options.blockquote_prefix.clone(),
                        ProseStyle::BlockQuote,
                        InlineFlags::default(),
                    );
                    b.indent_stack.push(IndentCtx {
                        initial: vec![bar.clone()],
                        subsequent: vec![bar],
                        used: false,
                    });
                }
                Tag::List(start) => {
                    b.list_stack.push(ListCtx {
                        ordered: start.is_some(),
                        index: start.unwrap_or(1),
                    });
                }
                Tag::Item => {
                    b.flush_code();
                    b.flush_para();
                    let Some(list) = b.list_stack.last() else {
                        continue;
                    };
                    let marker = if list.ordered {
                        format!("{}. ", list.index)
                    } else {
                        "• ".to_string()
                    };
                    let pad = " ".repeat(UnicodeWidthStr::width(marker.as_str()));
                    b.indent_stack.push(IndentCtx {
                        initial: vec![Segment::new(marker, ProseStyle::List, InlineFlags::default())],
                        subsequent: vec![Segment::new(pad, ProseStyle::List, InlineFlags::default())],
                        used: false,
                    });
                }
                Tag::Emphasis => b.inline.emphasis = true,
                Tag::Strong => b.inline.strong = true,
                Tag::Strikethrough => b.inline.strike = true,
                Tag::Link { dest_url, .. } => {
                    b.in_link = true;
                    b.link_dest = Some(b.resolve_dest(dest_url.as_ref()));
                    b.link_text.clear();
                }
                Tag::Image { .. } => {
                    b.image_alt = Some(String::new());
                }
                Tag::CodeBlock(kind) => {
                    b.flush_para();
                    b.flush_code();
                    b.maybe_blank();
                    b.in_code_block = true;
                    b.code_lines.clear();
                    b.code_current.clear();
                    let (_, subsequent) = b.snapshot_prefixes();
                    b.code_prefix = subsequent;
                    // The fence language is dropped: there is no highlighter here.
                    let _ = kind;
                }
                _ => {}
            },
            Event::End(tag) => match tag {
                TagEnd::Paragraph | TagEnd::Heading(_) => b.flush_para(),
                TagEnd::BlockQuote(_) => {
                    b.flush_para();
                    b.indent_stack.pop();
                    b.blockquote_depth = b.blockquote_depth.saturating_sub(1);
                }
                TagEnd::List(_) => {
                    b.flush_para();
                    b.list_stack.pop();
                    b.wants_blank = b.list_stack.is_empty();
                }
                TagEnd::Item => {
                    b.flush_para();
                    if let Some(list) = b.list_stack.last_mut() {
                        if list.ordered {
                            list.index += 1;
                        }
                    }
                    b.indent_stack.pop();
                }
                TagEnd::Emphasis => b.inline.emphasis = false,
                TagEnd::Strong => b.inline.strong = false,
                TagEnd::Strikethrough => b.inline.strike = false,
                TagEnd::Link => {
                    b.in_link = false;
                    if b.options.show_link_destinations {
                        if let Some(url) = b.link_dest.take() {
                            let text = b.link_text.trim().to_string();
                            if !text.is_empty() && text != url {
                                let mut seg = Segment::new(
                                    format!(" ({url})"),
                                    ProseStyle::Normal,
                                    InlineFlags::default(),
                                );
                                seg.muted = true;
                                b.push_inline(seg);
                            }
                        }
                    }
                    b.link_dest = None;
                    b.link_text.clear();
                }
                TagEnd::Image => {
                    if let Some(alt) = b.image_alt.take() {
                        let alt = alt.trim().to_string();
                        let label = if alt.is_empty() {
                            "[image]".to_string()
                        } else {
                            format!("[{alt}]")
                        };
                        let mut seg =
                            Segment::new(label, ProseStyle::Normal, InlineFlags::default());
                        seg.muted = true;
                        b.push_inline(seg);
                    }
                }
                TagEnd::CodeBlock => b.flush_code(),
                _ => {}
            },
            Event::Text(text) => {
                if b.in_code_block {
                    for ch in text.chars() {
                        match ch {
                            '\n' => b.code_lines.push(std::mem::take(&mut b.code_current)),
                            '\r' => {}
                            '\t' => b.code_current.push_str("    "),
                            other => b.code_current.push(other),
                        }
                    }
                    continue;
                }
                if let Some(alt) = b.image_alt.as_mut() {
                    alt.push_str(text.as_ref());
                    continue;
                }
                if b.in_link {
                    b.link_text.push_str(text.as_ref());
                }
                let text = normalize_tabs(text.as_ref());
                b.push_text(&text);
            }
            Event::Code(code) => {
                if let Some(alt) = b.image_alt.as_mut() {
                    alt.push_str(code.as_ref());
                    continue;
                }
                if b.in_link {
                    b.link_text.push_str(code.as_ref());
                }
                let mut seg = Segment::new(code.to_string(), b.current_style, b.inline);
                seg.inline_code = true;
                seg.link = b.in_link;
                b.push_inline(seg);
            }
            Event::SoftBreak => {
                if b.in_code_block {
                    b.code_lines.push(std::mem::take(&mut b.code_current));
                    continue;
                }
                if b.in_paragraph {
                    b.para_current.push(Segment::new(
                        " ".to_string(),
                        b.current_style,
                        b.inline,
                    ));
                }
                if b.in_link {
                    b.link_text.push(' ');
                }
            }
            Event::HardBreak => {
                if b.in_code_block {
                    b.code_lines.push(std::mem::take(&mut b.code_current));
                    continue;
                }
                if b.in_paragraph {
                    b.para_lines.push(std::mem::take(&mut b.para_current));
                }
                if b.in_link {
                    b.link_text.push(' ');
                }
            }
            Event::Rule => {
                b.flush_para();
                b.flush_code();
                b.maybe_blank();
                let (_, subsequent) = b.snapshot_prefixes();
                b.blocks.push(Block::Rule(subsequent));
                b.wants_blank = b.list_stack.is_empty();
            }
            _ => {}
        }
    }

    b.flush_para();
    b.flush_code();

    while matches!(b.blocks.last(), Some(Block::Blank(_))) {
        b.blocks.pop();
    }

    b.blocks
}

fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

fn normalize_tabs(s: &str) -> String {
    if s.contains('\t') {
        s.replace('\t', "    ")
    } else {
        s.to_string()
    }
}

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

fn layout_blocks(
    blocks: &[Block],
    width: u16,
    options: &MarkdownViewOptions,
    theme: &Theme,
) -> Vec<RenderedLine> {
    let mut out = Vec::new();

    for block in blocks {
        match block {
            Block::Prose(prose) => {
                let mut first_in_block = true;
                for segments in &prose.lines {
                    let prefix = if first_in_block {
                        &prose.initial_prefix
                    } else {
                        &prose.subsequent_prefix
                    };
                    let prefix_w = segments_width(prefix);
                    let avail = (width as usize).saturating_sub(prefix_w).max(1);

                    let wrapped = if options.wrap_prose {
                        wrap_segments(segments, avail)
                    } else {
                        vec![segments.clone()]
                    };

                    for (i, line_segments) in wrapped.iter().enumerate() {
                        let prefix = if first_in_block && i == 0 {
                            &prose.initial_prefix
                        } else {
                            &prose.subsequent_prefix
                        };
                        out.push(build_line(prefix, line_segments, theme));
                    }
                    first_in_block = false;
                }
            }
            Block::Code(code) => {
                let indent = " ".repeat(code.indent as usize);
                for line in &code.lines {
                    let mut spans = segment_spans(&code.prefix, theme);
                    spans.push(Span::raw(indent.clone()));
                    spans.push(Span::styled(line.clone(), theme.code));
                    let width = line_width(&spans);
                    out.push(RenderedLine {
                        spans,
                        width,
                        hits: Vec::new(),
                    });
                }
                if code.lines.is_empty() {
                    out.push(RenderedLine {
                        spans: segment_spans(&code.prefix, theme),
                        width: segments_width(&code.prefix) as u32,
                        hits: Vec::new(),
                    });
                }
            }
            Block::Rule(prefix) => {
                let prefix_w = segments_width(prefix);
                let rule_w = (width as usize).saturating_sub(prefix_w).max(1);
                let mut spans = segment_spans(prefix, theme);
                spans.push(Span::styled("─".repeat(rule_w), theme.text_muted));
                let width = line_width(&spans);
                out.push(RenderedLine {
                    spans,
                    width,
                    hits: Vec::new(),
                });
            }
            Block::Blank(prefix) => {
                let spans = segment_spans(prefix, theme);
                let width = line_width(&spans);
                out.push(RenderedLine {
                    spans,
                    width,
                    hits: Vec::new(),
                });
            }
        }
    }

    out
}

fn build_line(prefix: &[Segment], segments: &[Segment], theme: &Theme) -> RenderedLine {
    let mut spans = Vec::with_capacity(prefix.len() + segments.len());
    let mut hits = Vec::new();
    let mut col = 0u32;

    for seg in prefix.iter().chain(segments) {
        let w = UnicodeWidthStr::width(seg.text.as_str()) as u32;
        if let Some(label) = &seg.hover {
            hits.push(HighlightHit {
                start_col: col,
                end_col: col + w,
                label: label.clone(),
            });
        }
        spans.push(segment_span(seg, theme));
        col += w;
    }

    RenderedLine {
        spans,
        width: col,
        hits,
    }
}

fn segment_spans(segments: &[Segment], theme: &Theme) -> Vec<Span<'static>> {
    segments.iter().map(|s| segment_span(s, theme)).collect()
}

fn segment_span(seg: &Segment, theme: &Theme) -> Span<'static> {
    let mut style = base_style(seg, theme);
    if seg.flags.emphasis {
        style = style.add_modifier(Modifier::ITALIC);
    }
    if seg.flags.strong {
        style = style.add_modifier(Modifier::BOLD);
    }
    if seg.flags.strike {
        style = style.add_modifier(Modifier::CROSSED_OUT);
    }
    Span::styled(seg.text.clone(), style)
}

fn base_style(seg: &Segment, theme: &Theme) -> Style {
    if seg.hover.is_some() {
        return theme.highlight;
    }
    if seg.inline_code {
        return theme.code;
    }
    if seg.link {
        return theme.link;
    }
    if seg.muted {
        return theme.text_muted;
    }
    match seg.style {
        ProseStyle::Heading(_) => theme.heading,
        ProseStyle::BlockQuote => theme.text_muted,
        ProseStyle::Normal | ProseStyle::List => theme.text_primary,
    }
}

fn segments_width(segments: &[Segment]) -> usize {
    segments
        .iter()
        .map(|s| UnicodeWidthStr::width(s.text.as_str()))
        .sum()
}

fn line_width(spans: &[Span<'_>]) -> u32 {
    spans
        .iter()
        .map(|s| UnicodeWidthStr::width(s.content.as_ref()) as u32)
        .sum()
}

/// Word-wraps a run of styled segments to `max_cols` cells.
///
/// Tokens are whitespace or word runs; a word that exceeds a whole line is
/// hard-split by chars. Each output piece keeps its source segment's styling
/// (including the hover label, so every wrapped piece stays hoverable).
fn wrap_segments(segments: &[Segment], max_cols: usize) -> Vec<Vec<Segment>> {
    let mut lines: Vec<Vec<Segment>> = Vec::new();
    let mut cur: Vec<Segment> = Vec::new();
    let mut cur_w = 0usize;

    let flush = |cur: &mut Vec<Segment>, cur_w: &mut usize, lines: &mut Vec<Vec<Segment>>| {
        trim_line_end(cur);
        lines.push(std::mem::take(cur));
        *cur_w = 0;
    };

    for seg in segments {
        for token in tokenize(&seg.text) {
            let token_w = UnicodeWidthStr::width(token);
            let is_ws = token.chars().all(char::is_whitespace);

            if cur_w + token_w > max_cols && cur_w > 0 {
                flush(&mut cur, &mut cur_w, &mut lines);
                if is_ws {
                    continue;
                }
            }
            if is_ws && cur_w == 0 && !lines.is_empty() {
                continue;
            }

            if token_w > max_cols {
                for piece in hard_split(token, max_cols) {
                    let piece_w = UnicodeWidthStr::width(piece);
                    if cur_w + piece_w > max_cols && cur_w > 0 {
                        flush(&mut cur, &mut cur_w, &mut lines);
                    }
                    cur.push(seg.derived(piece.to_string()));
                    cur_w += piece_w;
                }
            } else {
                cur.push(seg.derived(token.to_string()));
                cur_w += token_w;
            }
        }
    }

    trim_line_end(&mut cur);
    if !cur.is_empty() || lines.is_empty() {
        lines.push(cur);
    }
    lines
}

fn trim_line_end(line: &mut Vec<Segment>) {
    while let Some(last) = line.last_mut() {
        let trimmed = last.text.trim_end();
        if trimmed.is_empty() {
            line.pop();
        } else {
            if trimmed.len() != last.text.len() {
                last.text.truncate(trimmed.len());
            }
            break;
        }
    }
}

/// Splits text into alternating whitespace and word runs, preserving order.
fn tokenize(text: &str) -> impl Iterator<Item = &str> {
    let mut rest = text;
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        let first_is_ws = rest.chars().next().is_some_and(char::is_whitespace);
        let end = rest
            .char_indices()
            .find(|(_, c)| c.is_whitespace() != first_is_ws)
            .map_or(rest.len(), |(i, _)| i);
        let (token, tail) = rest.split_at(end);
        rest = tail;
        Some(token)
    })
}

/// Greedily splits one overlong word into pieces of at most `max_cols` cells.
fn hard_split(token: &str, max_cols: usize) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0usize;
    let mut cols = 0usize;
    for (i, ch) in token.char_indices() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if cols + w > max_cols && cols > 0 {
            pieces.push(&token[start..i]);
            start = i;
            cols = 0;
        }
        cols += w;
    }
    pieces.push(&token[start..]);
    pieces
}
