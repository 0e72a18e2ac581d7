// src/table/parse.rs

use crate::core::html::{
    first_href, inner_after_open_tag, slice_between_ci, strip_tags, tag_blocks_ci, to_lower,
};
use crate::core::sanitize::normalize_entities;
use crate::error::structure_error;
use crate::Result;

use super::types::{Locator, RawRow, TableSchema};

pub enum TableParse<'a> {
    /// The page says there is nothing to read. Not an error.
    NoData,
    Rows(Rows<'a>),
}

impl<'a> TableParse<'a> {
    /// Rows as a vector; `NoData` is empty.
    pub fn collect_rows(self) -> Vec<RawRow> {
        match self {
            TableParse::NoData => Vec::new(),
            TableParse::Rows(rows) => rows.collect(),
        }
    }
}

/// Lazy row iterator. Cells are only extracted as rows are pulled.
pub struct Rows<'a> {
    table: &'a str,
    spans: std::vec::IntoIter<(usize, usize)>,
    schema: TableSchema,
    dropped: usize,
}

impl<'a> Rows<'a> {
    /// Rows dropped so far for having the wrong number of cells.
    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

impl<'a> Iterator for Rows<'a> {
    type Item = RawRow;

    fn next(&mut self) -> Option<RawRow> {
        loop {
            let (s, e) = self.spans.next()?;
            let tr = &self.table[s..e];
            let cells = row_cells(tr);

            // Scraping artifact (spacer rows, flight events, ads); not a failure.
            if cells.len() != self.schema.width() {
                self.dropped += 1;
                logd!(
                    "{}: dropped row with {} cells (want {})",
                    self.schema.name,
                    cells.len(),
                    self.schema.width()
                );
                continue;
            }
            return Some(RawRow { cells, href: first_href(tr) });
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.spans.size_hint().1)
    }
}

/// Locate the schema's table in `doc` and iterate its data rows.
///
/// Fails with `Error::Structure` only when the table element is absent.
pub fn parse_table<'a>(doc: &'a str, schema: &TableSchema) -> Result<TableParse<'a>> {
    let table = match schema.locator {
        Locator::TagPrefix(prefix) => slice_between_ci(doc, prefix, "</table>"),
    }
    .ok_or_else(|| structure_error!("{} table not found", schema.name))?;

    let spans = tag_blocks_ci(table, "<tr", "</tr>");

    for &(s, e) in &spans {
        let text = to_lower(&strip_tags(&table[s..e]));
        if schema.no_data_markers.iter().any(|m| text.contains(m)) {
            logf!("{}: no data", schema.name);
            return Ok(TableParse::NoData);
        }
    }

    let end = spans.len().saturating_sub(schema.skip_tail);
    let start = schema.skip_head.min(end);
    let body: Vec<(usize, usize)> = spans[start..end].to_vec();

    Ok(TableParse::Rows(Rows {
        table,
        spans: body.into_iter(),
        schema: *schema,
        dropped: 0,
    }))
}

fn row_cells(tr: &str) -> Vec<String> {
    tag_blocks_ci(tr, "<td", "</td>")
        .into_iter()
        .map(|(s, e)| normalize_entities(&strip_tags(inner_after_open_tag(&tr[s..e]))))
        .collect()
}
