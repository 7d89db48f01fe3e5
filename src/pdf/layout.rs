//! Page layout reconstruction
//!
//! Turns absolutely positioned text fragments into reading-order rows,
//! marks runs of wide rows as tables, and renders each page as text.

use crate::extractors::table::render_pipe;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Vertical distance (layout units) within which tokens share a row.
pub const ROW_TOLERANCE: f32 = 5.0;
/// Rows with at least this many tokens are treated as table rows.
pub const MIN_TABLE_ROW_SIZE: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutOptions {
    pub row_tolerance: f32,
    pub min_table_row_size: usize,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            row_tolerance: ROW_TOLERANCE,
            min_table_row_size: MIN_TABLE_ROW_SIZE,
        }
    }
}

/// A text run as the text layer reports it: the string plus the matrix
/// that maps its local origin onto the page.
///
/// Matrix format: [a, b, c, d, e, f]
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphRun {
    pub text: String,
    pub transform: [f32; 6],
}

/// A positioned text fragment in page space.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub text: String,
    pub x: f32,
    pub y: f32,
}

impl Token {
    pub fn new(text: impl Into<String>, x: f32, y: f32) -> Self {
        Self { text: text.into(), x, y }
    }
}

impl From<&GlyphRun> for Token {
    fn from(run: &GlyphRun) -> Self {
        let (x, y) = transform_point(0.0, 0.0, &run.transform);
        Token { text: run.text.clone(), x, y }
    }
}

/// Tokens sharing a baseline, left to right.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub y: f32,
    pub tokens: Vec<Token>,
}

impl Row {
    pub fn texts(&self) -> Vec<String> {
        self.tokens.iter().map(|t| t.text.clone()).collect()
    }

    /// A lone token is never a table row, whatever the threshold says.
    pub fn is_tabular(&self, min_table_row_size: usize) -> bool {
        self.tokens.len() >= min_table_row_size.max(2)
    }
}

/// Rows of one page, top to bottom. `number` is 1-based.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub number: usize,
    pub rows: Vec<Row>,
}

/// Maps (x, y) through a rendering matrix.
pub fn transform_point(x: f32, y: f32, [a, b, c, d, e, f]: &[f32; 6]) -> (f32, f32) {
    (x * a + y * c + e, x * b + y * d + f)
}

/// Reading order: higher y first, then lower x. Text breaks exact ties so
/// the result does not depend on input order.
fn reading_order(a: &Token, b: &Token) -> Ordering {
    b.y.total_cmp(&a.y)
        .then_with(|| a.x.total_cmp(&b.x))
        .then_with(|| a.text.cmp(&b.text))
}

/// Clusters tokens into rows.
///
/// A token joins the first existing row whose key lies within `tolerance`
/// of its y, otherwise it opens a new row keyed by its own y. Tokens with a
/// non-finite y each get a row of their own, placed after the page body.
pub fn group_rows(tokens: &[Token], tolerance: f32) -> Vec<Row> {
    let (mut positioned, mut stray): (Vec<&Token>, Vec<&Token>) =
        tokens.iter().partition(|t| t.y.is_finite());
    positioned.sort_by(|a, b| reading_order(a, b));

    let mut rows: Vec<Row> = Vec::new();
    for token in positioned {
        match rows.iter_mut().find(|row| (row.y - token.y).abs() <= tolerance) {
            Some(row) => row.tokens.push(token.clone()),
            None => rows.push(Row { y: token.y, tokens: vec![token.clone()] }),
        }
    }

    if !stray.is_empty() {
        tracing::warn!("{} text fragments have non-finite coordinates", stray.len());
        stray.sort_by(|a, b| a.text.cmp(&b.text).then_with(|| a.x.total_cmp(&b.x)));
        rows.extend(stray.into_iter().map(|t| Row { y: t.y, tokens: vec![t.clone()] }));
    }

    // Keys are already descending; only the x order inside rows needs fixing.
    rows.sort_by(|a, b| match (a.y.is_finite(), b.y.is_finite()) {
        (true, true) => b.y.total_cmp(&a.y),
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => Ordering::Equal,
    });
    for row in &mut rows {
        row.tokens.sort_by(|a, b| a.x.total_cmp(&b.x).then_with(|| a.text.cmp(&b.text)));
    }
    rows
}

/// Renders rows as prose lines with table blocks set off by blank lines.
pub fn render_rows(rows: &[Row], min_table_row_size: usize) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut table: Vec<Vec<String>> = Vec::new();

    for row in rows {
        if row.is_tabular(min_table_row_size) {
            table.push(row.texts());
            continue;
        }
        if !table.is_empty() {
            flush_table(&mut lines, &mut table);
            lines.push(String::new());
        }
        lines.push(row.texts().join(" "));
    }
    if !table.is_empty() {
        flush_table(&mut lines, &mut table);
    }

    lines.join("\n")
}

fn flush_table(lines: &mut Vec<String>, table: &mut Vec<Vec<String>>) {
    lines.push(String::new());
    lines.push(render_pipe(table));
    table.clear();
}

pub fn build_page(number: usize, runs: &[GlyphRun], options: &LayoutOptions) -> Page {
    let tokens: Vec<Token> = runs.iter().map(Token::from).collect();
    Page {
        number,
        rows: group_rows(&tokens, options.row_tolerance),
    }
}

/// Reconstructs the text of a whole document, one run list per page.
pub fn reconstruct(pages: &[Vec<GlyphRun>], options: &LayoutOptions) -> String {
    pages
        .iter()
        .enumerate()
        .map(|(idx, runs)| {
            let page = build_page(idx + 1, runs, options);
            format!("Page {}:\n{}", page.number, render_rows(&page.rows, options.min_table_row_size))
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(text: &str, x: f32, y: f32) -> GlyphRun {
        GlyphRun { text: text.to_string(), transform: [1.0, 0.0, 0.0, 1.0, x, y] }
    }

    fn wide_row(y: f32, n: usize) -> Vec<Token> {
        (0..n).map(|i| Token::new(format!("c{}", i), 50.0 * i as f32, y)).collect()
    }

    #[test]
    fn transform_applies_scale_and_translation() {
        let (x, y) = transform_point(2.0, 3.0, &[2.0, 0.0, 0.0, 2.0, 10.0, 20.0]);
        assert_eq!((x, y), (14.0, 26.0));
        let token = Token::from(&GlyphRun { text: "Revenue".into(), transform: [9.0, 0.0, 0.0, 9.0, 72.0, 700.0] });
        assert_eq!((token.x, token.y), (72.0, 700.0));
    }

    #[test]
    fn groups_rows_top_to_bottom_and_left_to_right() {
        let tokens = vec![
            Token::new("World", 160.0, 698.0),
            Token::new("Next line", 100.0, 680.0),
            Token::new("Hello", 100.0, 700.0),
        ];
        let rows = group_rows(&tokens, ROW_TOLERANCE);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].texts(), vec!["Hello", "World"]);
        assert_eq!(rows[1].texts(), vec!["Next line"]);
    }

    #[test]
    fn grouping_ignores_input_order() {
        let tokens = vec![
            Token::new("a", 10.0, 500.0),
            Token::new("b", 30.0, 503.0),
            Token::new("c", 20.0, 480.0),
            Token::new("d", 5.0, 481.0),
            Token::new("e", 1.0, 300.0),
        ];
        let expected = group_rows(&tokens, ROW_TOLERANCE);

        let mut reversed = tokens.clone();
        reversed.reverse();
        let mut rotated = tokens.clone();
        rotated.rotate_left(2);

        assert_eq!(group_rows(&reversed, ROW_TOLERANCE), expected);
        assert_eq!(group_rows(&rotated, ROW_TOLERANCE), expected);
    }

    #[test]
    fn table_threshold_boundary() {
        let below = group_rows(&wide_row(100.0, MIN_TABLE_ROW_SIZE - 1), ROW_TOLERANCE);
        assert_eq!(render_rows(&below, MIN_TABLE_ROW_SIZE), "c0 c1 c2 c3");

        let at = group_rows(&wide_row(100.0, MIN_TABLE_ROW_SIZE), ROW_TOLERANCE);
        assert_eq!(render_rows(&at, MIN_TABLE_ROW_SIZE), "\n| c0 | c1 | c2 | c3 | c4 |");
    }

    #[test]
    fn single_token_row_is_never_tabular() {
        let rows = group_rows(&[Token::new("Total", 0.0, 10.0)], ROW_TOLERANCE);
        assert!(!rows[0].is_tabular(1));
        assert_eq!(render_rows(&rows, 1), "Total");
    }

    #[test]
    fn table_block_is_set_off_from_prose() {
        let mut tokens = vec![Token::new("Balance sheet", 0.0, 700.0)];
        tokens.extend(wide_row(680.0, 5));
        tokens.extend(wide_row(660.0, 5));
        tokens.push(Token::new("See notes.", 0.0, 640.0));

        let rows = group_rows(&tokens, ROW_TOLERANCE);
        assert_eq!(
            render_rows(&rows, MIN_TABLE_ROW_SIZE),
            "Balance sheet\n\n| c0 | c1 | c2 | c3 | c4 |\n| c0 | c1 | c2 | c3 | c4 |\n\nSee notes."
        );
    }

    #[test]
    fn non_finite_coordinates_get_their_own_rows() {
        let tokens = vec![
            Token::new("ok", 0.0, 100.0),
            Token::new("nan", 0.0, f32::NAN),
            Token::new("inf", 0.0, f32::INFINITY),
            Token::new("also ok", 20.0, 101.0),
        ];
        let rows = group_rows(&tokens, ROW_TOLERANCE);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].texts(), vec!["ok", "also ok"]);
        assert_eq!(rows[1].texts(), vec!["inf"]);
        assert_eq!(rows[2].texts(), vec!["nan"]);
    }

    #[test]
    fn reconstruct_numbers_pages() {
        let pages = vec![
            vec![run("Annual", 10.0, 700.0), run("Report", 60.0, 700.0)],
            vec![run("Page two", 10.0, 700.0)],
        ];
        let text = reconstruct(&pages, &LayoutOptions::default());
        assert_eq!(text, "Page 1:\nAnnual Report\n\nPage 2:\nPage two");
    }

    #[test]
    fn reconstruct_empty_document() {
        assert_eq!(reconstruct(&[], &LayoutOptions::default()), "");
    }
}
