use scraper::{ElementRef, Html, Selector};

use crate::error::ParseError;
use crate::xg_value::{parse_plain, split_leading};

/// Row-index column the site prepends to every table.
pub const INDEX_COLUMN: &str = "№";

#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

fn selector(css: &'static str) -> Selector {
    Selector::parse(css).unwrap_or_else(|_| unreachable!("static selector {css}"))
}

/// Parses the first `<table>` of a fragment. Headers come from `thead` (or the
/// first row when there is none); footer rows are not data and are skipped.
pub fn parse_first_table(fragment: &str) -> Result<RawTable, ParseError> {
    let doc = Html::parse_fragment(fragment);
    let table = doc
        .select(&selector("table"))
        .next()
        .ok_or(ParseError::MissingTable)?;

    let head_cells = selector("thead tr th, thead tr td");
    let mut headers: Vec<String> = table.select(&head_cells).map(cell_text).collect();

    let row_sel = selector("tr");
    let foot_rows = selector("tfoot tr");
    let head_rows = selector("thead tr");
    let skip: Vec<ElementRef> = table
        .select(&foot_rows)
        .chain(table.select(&head_rows))
        .collect();

    let cell_sel = selector("th, td");
    let mut body = table
        .select(&row_sel)
        .filter(|tr| !skip.contains(tr))
        .filter(|tr| owning_table(*tr) == Some(table))
        .map(|tr| tr.select(&cell_sel).map(cell_text).collect::<Vec<_>>())
        .filter(|cells| !cells.is_empty());

    if headers.is_empty() {
        headers = body.next().unwrap_or_default();
    }
    let rows = body.collect::<Vec<_>>();

    for (idx, row) in rows.iter().enumerate() {
        if row.len() < headers.len() {
            return Err(ParseError::ShortRow {
                row: idx,
                len: row.len(),
            });
        }
    }

    Ok(RawTable { headers, rows })
}

fn owning_table(tr: ElementRef<'_>) -> Option<ElementRef<'_>> {
    tr.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "table")
}

fn cell_text(cell: ElementRef<'_>) -> String {
    let joined: String = cell.text().collect();
    joined.split_whitespace().collect::<Vec<_>>().join(" ")
}

impl RawTable {
    pub fn drop_column(&mut self, name: &str) {
        let Some(idx) = self.headers.iter().position(|h| h == name) else {
            return;
        };
        self.headers.remove(idx);
        for row in &mut self.rows {
            if idx < row.len() {
                row.remove(idx);
            }
        }
    }

    pub fn truncate(&mut self, limit: usize) {
        self.rows.truncate(limit);
    }

    pub fn column(&self, name: &'static str) -> Result<usize, ParseError> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or(ParseError::MissingColumn(name))
    }
}

/// Resolved cell accessor for one row; column names are only used in errors.
pub struct Cells<'a> {
    table: &'a RawTable,
    row: &'a [String],
}

impl<'a> Cells<'a> {
    pub fn new(table: &'a RawTable, row: &'a [String]) -> Self {
        Self { table, row }
    }

    pub fn text(&self, idx: usize) -> String {
        self.row.get(idx).cloned().unwrap_or_default()
    }

    pub fn plain(&self, idx: usize) -> Result<f64, ParseError> {
        parse_plain(self.raw(idx), self.header(idx))
    }

    pub fn expected(&self, idx: usize) -> Result<f64, ParseError> {
        split_leading(self.raw(idx), self.header(idx))
    }

    fn raw(&self, idx: usize) -> &str {
        self.row.get(idx).map(String::as_str).unwrap_or_default()
    }

    fn header(&self, idx: usize) -> &str {
        self.table
            .headers
            .get(idx)
            .map(String::as_str)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = r#"<table>
        <thead><tr><th>№</th><th> Player <i class="fa fa-sort"></i></th><th>xG</th></tr></thead>
        <tbody>
            <tr><td>1</td><td><a href="player/1">Jonathan   David</a></td><td>1.23<sup>+0.45</sup></td></tr>
            <tr><td>2</td><td>Burak Yilmaz</td><td>2.00<sup>-0.10</sup></td></tr>
        </tbody>
        <tfoot><tr><th></th><th></th><th>3.23</th></tr></tfoot>
    </table>"#;

    #[test]
    fn parses_headers_and_body_rows() {
        let table = parse_first_table(TABLE).expect("table");
        assert_eq!(table.headers, vec!["№", "Player", "xG"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0][1], "Jonathan David");
        assert_eq!(table.rows[0][2], "1.23+0.45");
    }

    #[test]
    fn drop_index_column_shifts_cells() {
        let mut table = parse_first_table(TABLE).expect("table");
        table.drop_column(INDEX_COLUMN);
        assert_eq!(table.headers, vec!["Player", "xG"]);
        assert_eq!(table.rows[1], vec!["Burak Yilmaz", "2.00-0.10"]);
        table.drop_column("not there");
        assert_eq!(table.headers.len(), 2);
    }

    #[test]
    fn headerless_table_uses_first_row() {
        let table =
            parse_first_table("<table><tr><th>A</th><th>B</th></tr><tr><td>1</td><td>2</td></tr></table>")
                .expect("table");
        assert_eq!(table.headers, vec!["A", "B"]);
        assert_eq!(table.rows, vec![vec!["1".to_string(), "2".to_string()]]);
    }

    #[test]
    fn missing_table_and_column_are_errors() {
        assert_eq!(parse_first_table("<div>nothing</div>"), Err(ParseError::MissingTable));
        let table = parse_first_table(TABLE).expect("table");
        assert_eq!(table.column("xA"), Err(ParseError::MissingColumn("xA")));
    }
}
