//! Accumulates streamed text and extracts structured tags cross-chunk.
//!
//! Every extraction regex runs against the full accumulated buffer, never a
//! single chunk: a `[QUICK_REPLIES]` tag can arrive split across SSE chunk
//! boundaries, and a per-chunk regex would simply miss it.

use once_cell::sync::Lazy;
use regex::Regex;

/// A single product line extracted from numbered product markdown.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    /// Product name.
    pub name: String,
    /// Price, as the model rendered it (e.g. `"24.90"`).
    pub price: String,
}

/// A read-only view of the buffer's current extraction state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseSnapshot {
    /// Narrative text with known structured-tag regions stripped out.
    pub text: String,
    /// Product lines recognized in the buffer so far.
    pub products: Vec<Product>,
    /// The single tip, if a closed `[TIP]` tag has been seen.
    pub tip: Option<String>,
    /// Quick-reply options, in order.
    pub quick_replies: Vec<String>,
}

#[expect(clippy::expect_used, reason = "pattern is a compile-time constant, failure is a test-caught bug")]
fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("valid regex")
}

static QUICK_REPLIES_CLOSED: Lazy<Regex> =
    Lazy::new(|| compile(r"(?s)\[QUICK_REPLIES\](.*?)\[/QUICK_REPLIES\]"));
static QUICK_REPLIES_TRUNCATED: Lazy<Regex> = Lazy::new(|| compile(r"(?s)\[QUICK_REPLIES\](.*)$"));
static QUICK_REPLIES_LOCALIZED_HEADING: Lazy<Regex> =
    Lazy::new(|| compile(r"(?s)შემდეგი ნაბიჯი:\s*((?:\s*-\s*.+\n?)+)"));
static TIP_CLOSED: Lazy<Regex> = Lazy::new(|| compile(r"(?s)\[TIP\](.*?)\[/TIP\]"));
static PRODUCT_LINE: Lazy<Regex> =
    Lazy::new(|| compile(r"(?m)^\s*\d+\.\s+(.+?)\s+—\s+(\d+(?:\.\d+)?)\s*₾\s*$"));

fn parse_dash_lines(block: &str) -> Vec<String> {
    block
        .lines()
        .filter_map(|line| line.trim().strip_prefix('-'))
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn extract_quick_replies(buffer: &str) -> (Vec<String>, Vec<std::ops::Range<usize>>) {
    if let Some(captures) = QUICK_REPLIES_CLOSED.captures(buffer) {
        #[expect(clippy::expect_used, reason = "group 0 always matches when captures is Some")]
        let whole = captures.get(0).expect("group 0 always matches");
        let replies = parse_dash_lines(&captures[1]);
        return (replies, vec![whole.range()]);
    }
    if let Some(captures) = QUICK_REPLIES_TRUNCATED.captures(buffer) {
        #[expect(clippy::expect_used, reason = "group 0 always matches when captures is Some")]
        let whole = captures.get(0).expect("group 0 always matches");
        let replies = parse_dash_lines(&captures[1]);
        return (replies, vec![whole.range()]);
    }
    if let Some(captures) = QUICK_REPLIES_LOCALIZED_HEADING.captures(buffer) {
        #[expect(clippy::expect_used, reason = "group 0 always matches when captures is Some")]
        let whole = captures.get(0).expect("group 0 always matches");
        let replies = parse_dash_lines(&captures[1]);
        return (replies, vec![whole.range()]);
    }
    (Vec::new(), Vec::new())
}

fn extract_tip(buffer: &str) -> (Option<String>, Option<std::ops::Range<usize>>) {
    TIP_CLOSED.captures(buffer).map_or((None, None), |captures| {
        #[expect(clippy::expect_used, reason = "group 0 always matches when captures is Some")]
        let whole = captures.get(0).expect("group 0 always matches");
        (Some(captures[1].trim().to_string()), Some(whole.range()))
    })
}

fn extract_products(buffer: &str) -> (Vec<Product>, Vec<std::ops::Range<usize>>) {
    let mut products = Vec::new();
    let mut ranges = Vec::new();
    for captures in PRODUCT_LINE.captures_iter(buffer) {
        #[expect(clippy::expect_used, reason = "group 0 always matches when captures is Some")]
        let whole = captures.get(0).expect("group 0 always matches");
        products.push(Product {
            name: captures[1].trim().to_string(),
            price: captures[2].to_string(),
        });
        ranges.push(whole.range());
    }
    (products, ranges)
}

/// Removes the given byte ranges from `text`, highest offset first so
/// earlier ranges stay valid while later ones are removed.
fn strip_ranges(text: &str, mut ranges: Vec<std::ops::Range<usize>>) -> String {
    ranges.sort_by_key(|r| std::cmp::Reverse(r.start));
    let mut out = text.to_string();
    for range in ranges {
        out.replace_range(range, "");
    }
    out
}

/// Accumulates model output text and extracts tip/quick-reply/product
/// markup, operating only on the full accumulated buffer.
#[derive(Debug, Clone, Default)]
pub struct ResponseBuffer {
    text: String,
}

impl ResponseBuffer {
    /// Construct an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk of raw model text to the buffer.
    pub fn append_chunk(&mut self, chunk: &str) {
        self.text.push_str(chunk);
    }

    /// The raw accumulated text, before any tag stripping.
    pub fn raw_text(&self) -> &str {
        &self.text
    }

    /// Re-run extraction over the full accumulated buffer and return a
    /// snapshot of narrative text plus any structured content recognized
    /// so far.
    pub fn snapshot(&self) -> ResponseSnapshot {
        let (quick_replies, qr_ranges) = extract_quick_replies(&self.text);
        let (tip, tip_range) = extract_tip(&self.text);
        let (products, product_ranges) = extract_products(&self.text);

        let mut ranges = qr_ranges;
        ranges.extend(tip_range);
        ranges.extend(product_ranges);
        let text = strip_ranges(&self.text, ranges).trim().to_string();

        ResponseSnapshot {
            text,
            products,
            tip,
            quick_replies,
        }
    }

    /// Discard all accumulated text, e.g. before a fallback re-run.
    pub fn clear(&mut self) {
        self.text.clear();
    }
}
