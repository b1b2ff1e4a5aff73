//! Label sheet conversion
//!
//! Reviewers label candidate pairs in a spreadsheet, read either as an
//! `.xlsx` workbook (first worksheet) or as a CSV export. Two layouts exist:
//! a split sheet with one column per field, and a packed sheet whose first
//! column holds the whole comma-joined row. Both are turned into a labels CSV
//! and a candidates CSV.

use std::iter::Peekable;
use std::path::Path;

use crate::error::{DevmatchError, Result};
use crate::io::{Table, PAIR_COLUMNS};
use crate::record::IdentityPair;

/// Similarity metric columns carried by a label sheet
pub const METRIC_COLUMNS: [&str; 8] = ["c1", "c2", "c3.1", "c3.2", "c4", "c5", "c6", "c7"];

/// Value of the `method` column in converted candidates
pub const SHEET_METHOD: &str = "bird_sheet";

/// Sheet layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetLayout {
    /// `name_1,email_1,name_2,email_2,c1,...,c7` as separate columns
    Split,
    /// First column holds the row joined by commas
    Packed,
}

impl SheetLayout {
    pub fn detect(table: &Table) -> Self {
        let has = |name: &str| table.column_index(name).is_some();
        if PAIR_COLUMNS.iter().chain(METRIC_COLUMNS.iter()).all(|c| has(c)) {
            SheetLayout::Split
        } else {
            SheetLayout::Packed
        }
    }
}

/// One labelled row of a sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRow {
    pub pair: IdentityPair,
    /// Metric cells in [`METRIC_COLUMNS`] order, as they should be written
    pub metrics: [String; 8],
    /// `TP` or `FP` (split sheets keep whatever the cell says, uppercased)
    pub label: String,
}

/// Lenient float parsing; anything unparseable is `None`
pub fn parse_float(value: &str) -> Option<f64> {
    value.trim().parse().ok()
}

/// Accepts true/1/t/yes and false/0/f/no in any case
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "t" | "yes" => Some(true),
        "false" | "0" | "f" | "no" => Some(false),
        _ => None,
    }
}

fn label_column(table: &Table) -> Result<usize> {
    table
        .column_index("label")
        .or_else(|| table.column_index("Label"))
        .ok_or_else(|| DevmatchError::MissingColumn("label".to_string()))
}

/// Split a packed cell into the identity pair and its eight metric cells
///
/// The last eight comma-separated fields are metrics. The rest is read as
/// name tokens up to the first token containing `@` (the first email), then
/// name tokens up to the next `@` token (the second email). Name tokens are
/// trimmed and re-joined with commas.
pub fn parse_packed_row(cell: &str, row: usize) -> Result<(IdentityPair, [String; 8])> {
    let parts: Vec<&str> = cell.split(',').collect();
    if parts.len() < METRIC_COLUMNS.len() {
        return Err(DevmatchError::MalformedRow {
            row,
            reason: format!(
                "expected at least {} comma-separated fields, found {}",
                METRIC_COLUMNS.len(),
                parts.len()
            ),
        });
    }
    let (left, metric_cells) = parts.split_at(parts.len() - METRIC_COLUMNS.len());

    let mut tokens = left.iter().copied().peekable();

    let name_1 = take_name(&mut tokens);
    let email_1 = tokens.next().map(|t| t.trim().to_string()).unwrap_or_default();
    let name_2 = take_name(&mut tokens);
    let email_2 = tokens.next().map(|t| t.trim().to_string()).unwrap_or_default();

    let metrics: [String; 8] = std::array::from_fn(|i| {
        let raw = metric_cells[i];
        if i < 4 {
            parse_float(raw).map(|v| v.to_string()).unwrap_or_default()
        } else {
            match parse_bool(raw) {
                Some(true) => "True".to_string(),
                Some(false) => "False".to_string(),
                None => String::new(),
            }
        }
    });

    Ok((IdentityPair::new(name_1, email_1, name_2, email_2), metrics))
}

fn take_name<'a>(tokens: &mut Peekable<impl Iterator<Item = &'a str>>) -> String {
    let mut name = Vec::new();
    while let Some(token) = tokens.next_if(|t| !t.contains('@')) {
        name.push(token.trim());
    }
    name.join(",").trim().to_string()
}

/// Parse every row of a label sheet, whichever layout it uses
pub fn parse_sheet(table: &Table) -> Result<Vec<SheetRow>> {
    let label = label_column(table)?;
    let layout = SheetLayout::detect(table);
    tracing::debug!("Label sheet layout: {:?}", layout);

    match layout {
        SheetLayout::Split => {
            let mut pair_columns = [0; 4];
            for (slot, name) in pair_columns.iter_mut().zip(PAIR_COLUMNS) {
                *slot = table.require_column(name)?;
            }
            let mut metric_columns = [0; 8];
            for (slot, name) in metric_columns.iter_mut().zip(METRIC_COLUMNS) {
                *slot = table.require_column(name)?;
            }
            let [n1, e1, n2, e2] = pair_columns;

            Ok((0..table.len())
                .map(|row| SheetRow {
                    pair: IdentityPair::new(
                        table.cell(row, n1),
                        table.cell(row, e1),
                        table.cell(row, n2),
                        table.cell(row, e2),
                    ),
                    metrics: metric_columns.map(|c| table.cell(row, c).to_string()),
                    label: table.cell(row, label).to_uppercase(),
                })
                .collect())
        }
        SheetLayout::Packed => (0..table.len())
            .map(|row| {
                let (pair, metrics) = parse_packed_row(table.cell(row, 0), row + 1)?;
                let label = match table.cell(row, label).trim() {
                    "1" | "TP" | "tp" => "TP",
                    _ => "FP",
                };
                Ok(SheetRow {
                    pair,
                    metrics,
                    label: label.to_string(),
                })
            })
            .collect(),
    }
}

/// `name_1,email_1,name_2,email_2,label`
pub fn labels_table(rows: &[SheetRow]) -> Table {
    let mut headers: Vec<String> = PAIR_COLUMNS.iter().map(|c| c.to_string()).collect();
    headers.push("label".to_string());
    let mut table = Table::new(headers);
    for row in rows {
        let mut cells = pair_cells(&row.pair);
        cells.push(row.label.clone());
        table.rows.push(cells);
    }
    table
}

/// Identity columns, metric columns and `method`
pub fn sheet_candidates_table(rows: &[SheetRow]) -> Table {
    let mut headers: Vec<String> = PAIR_COLUMNS
        .iter()
        .chain(METRIC_COLUMNS.iter())
        .map(|c| c.to_string())
        .collect();
    headers.push("method".to_string());
    let mut table = Table::new(headers);
    for row in rows {
        let mut cells = pair_cells(&row.pair);
        cells.extend(row.metrics.iter().cloned());
        cells.push(SHEET_METHOD.to_string());
        table.rows.push(cells);
    }
    table
}

fn pair_cells(pair: &IdentityPair) -> Vec<String> {
    vec![
        pair.name_1.clone(),
        pair.email_1.clone(),
        pair.name_2.clone(),
        pair.email_2.clone(),
    ]
}

/// Convert a label sheet into a labels CSV and a candidates CSV
///
/// Workbook extensions (`.xlsx`, `.xlsm`, `.xls`, `.ods`) are read from their
/// first worksheet; anything else is read as CSV. Returns the number of rows
/// converted.
pub fn convert_labels(
    sheet: impl AsRef<Path>,
    labels_out: impl AsRef<Path>,
    candidates_out: impl AsRef<Path>,
) -> Result<usize> {
    let rows = parse_sheet(&Table::read_any(sheet)?)?;
    labels_table(&rows).write(labels_out.as_ref())?;
    sheet_candidates_table(&rows).write(candidates_out.as_ref())?;
    tracing::info!(
        "Converted {} labelled rows into {:?} and {:?}",
        rows.len(),
        labels_out.as_ref(),
        candidates_out.as_ref()
    );
    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn table(csv: &str) -> Table {
        Table::from_reader(csv.as_bytes()).unwrap()
    }

    enum Cell<'a> {
        Text(&'a str),
        Number(f64),
        Bool(bool),
    }

    fn cell_xml(reference: &str, cell: &Cell) -> String {
        match cell {
            Cell::Text(text) => {
                format!(r#"<c r="{reference}" t="inlineStr"><is><t>{text}</t></is></c>"#)
            }
            Cell::Number(value) => format!(r#"<c r="{reference}"><v>{value}</v></c>"#),
            Cell::Bool(value) => {
                format!(r#"<c r="{reference}" t="b"><v>{}</v></c>"#, u8::from(*value))
            }
        }
    }

    /// Minimal single-sheet .xlsx package
    fn write_workbook(path: &Path, rows: &[Vec<Cell>]) {
        use std::io::Write;

        let mut sheet_data = String::new();
        for (r, row) in rows.iter().enumerate() {
            sheet_data.push_str(&format!(r#"<row r="{}">"#, r + 1));
            for (c, cell) in row.iter().enumerate() {
                let reference = format!("{}{}", char::from(b'A' + c as u8), r + 1);
                sheet_data.push_str(&cell_xml(&reference, cell));
            }
            sheet_data.push_str("</row>");
        }

        const MAIN_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
        const REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
        const DOC_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
        let parts = [
            (
                "[Content_Types].xml",
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/></Types>"#
                    .to_string(),
            ),
            (
                "_rels/.rels",
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="{REL_NS}"><Relationship Id="rId1" Type="{DOC_REL}/officeDocument" Target="xl/workbook.xml"/></Relationships>"#
                ),
            ),
            (
                "xl/workbook.xml",
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><workbook xmlns="{MAIN_NS}" xmlns:r="{DOC_REL}"><sheets><sheet name="Labels" sheetId="1" r:id="rId1"/></sheets></workbook>"#
                ),
            ),
            (
                "xl/_rels/workbook.xml.rels",
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="{REL_NS}"><Relationship Id="rId1" Type="{DOC_REL}/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#
                ),
            ),
            (
                "xl/worksheets/sheet1.xml",
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><worksheet xmlns="{MAIN_NS}"><sheetData>{sheet_data}</sheetData></worksheet>"#
                ),
            ),
        ];

        let mut zip = zip::ZipWriter::new(std::fs::File::create(path).unwrap());
        for (name, body) in parts {
            zip.start_file(name, zip::write::SimpleFileOptions::default())
                .unwrap();
            zip.write_all(body.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }

    #[rstest]
    #[case("true", Some(true))]
    #[case(" YES ", Some(true))]
    #[case("t", Some(true))]
    #[case("1", Some(true))]
    #[case("False", Some(false))]
    #[case("no", Some(false))]
    #[case("0", Some(false))]
    #[case("maybe", None)]
    #[case("", None)]
    fn test_parse_bool(#[case] input: &str, #[case] expected: Option<bool>) {
        assert_eq!(parse_bool(input), expected);
    }

    #[test]
    fn test_parse_float() {
        assert_eq!(parse_float(" 0.75"), Some(0.75));
        assert_eq!(parse_float("n/a"), None);
    }

    #[test]
    fn test_parse_packed_row() {
        let (pair, metrics) = parse_packed_row(
            "Doe, Jane,jane@x.io,Jane Doe,jd@y.io,0.9,0.8,0.7,0.6,true,false,1,no",
            1,
        )
        .unwrap();
        assert_eq!(pair, IdentityPair::new("Doe,Jane", "jane@x.io", "Jane Doe", "jd@y.io"));
        assert_eq!(metrics[0], "0.9");
        assert_eq!(metrics[4], "True");
        assert_eq!(metrics[5], "False");
        assert_eq!(metrics[6], "True");
        assert_eq!(metrics[7], "False");
    }

    #[test]
    fn test_parse_packed_row_missing_second_email() {
        let (pair, _) = parse_packed_row("Ann,ann@x.io,Bob,x,x,x,x,x,x,x,x", 1).unwrap();
        assert_eq!(pair.name_2, "Bob");
        assert_eq!(pair.email_2, "");
        assert_eq!(pair.email_1, "ann@x.io");
    }

    #[test]
    fn test_parse_packed_row_lenient_metrics() {
        let (_, metrics) = parse_packed_row("A,a@x,B,b@x,bad,1,2,3,maybe,t,f,yes", 1).unwrap();
        assert_eq!(metrics[0], "");
        assert_eq!(metrics[1], "1");
        assert_eq!(metrics[4], "");
    }

    #[test]
    fn test_parse_packed_row_too_short() {
        assert!(matches!(
            parse_packed_row("a,b,c", 4),
            Err(DevmatchError::MalformedRow { row: 4, .. })
        ));
    }

    #[test]
    fn test_split_sheet() {
        let t = table(
            "name_1,email_1,name_2,email_2,c1,c2,c3.1,c3.2,c4,c5,c6,c7,Label\n\
             Ann,a@x.io,Ann L,a@y.io,1,1,1,1,True,True,False,False,tp\n",
        );
        assert_eq!(SheetLayout::detect(&t), SheetLayout::Split);
        let rows = parse_sheet(&t).unwrap();
        assert_eq!(rows[0].label, "TP");
        assert_eq!(rows[0].pair.name_2, "Ann L");
        assert_eq!(rows[0].metrics[6], "False");
    }

    #[test]
    fn test_packed_sheet() {
        let t = table(
            "row,label\n\
             \"Ann,a@x.io,Ann L,a@y.io,1,1,1,1,t,t,f,f\",1\n\
             \"Bo,b@x.io,Cy,c@y.io,0,0,0,0,f,f,f,f\",0\n",
        );
        assert_eq!(SheetLayout::detect(&t), SheetLayout::Packed);
        let rows = parse_sheet(&t).unwrap();
        assert_eq!(rows[0].label, "TP");
        assert_eq!(rows[1].label, "FP");
        assert_eq!(rows[1].pair.email_2, "c@y.io");
    }

    #[test]
    fn test_missing_label_column() {
        let t = table("row\n\"a,b@c,d,e@f,1,1,1,1,t,t,t,t\"\n");
        assert!(matches!(parse_sheet(&t), Err(DevmatchError::MissingColumn(_))));
    }

    #[test]
    fn test_convert_labels_from_workbook() {
        use Cell::*;

        let dir = tempfile::tempdir().unwrap();
        let sheet = dir.path().join("reviewed.xlsx");
        let mut rows = vec![[
            "name_1", "email_1", "name_2", "email_2", "c1", "c2", "c3.1", "c3.2", "c4", "c5",
            "c6", "c7", "label",
        ]
        .map(Text)
        .into_iter()
        .collect::<Vec<_>>()];
        rows.push(vec![
            Text("Ann Lee"),
            Text("ann@x.io"),
            Text("Ann L."),
            Text("ann@y.io"),
            Number(0.9),
            Number(1.0),
            Number(0.75),
            Number(0.5),
            Bool(true),
            Bool(true),
            Bool(false),
            Bool(true),
            Text("tp"),
        ]);
        rows.push(vec![
            Text("Bo Chen"),
            Text("bo@x.io"),
            Text("Cy Diaz"),
            Text("cy@z.io"),
            Number(0.1),
            Number(0.0),
            Number(0.2),
            Number(0.3),
            Bool(false),
            Bool(false),
            Bool(false),
            Bool(false),
            Text("FP"),
        ]);
        write_workbook(&sheet, &rows);

        let workbook = Table::read_any(&sheet).unwrap();
        assert_eq!(workbook.headers.len(), 13);
        assert_eq!(SheetLayout::detect(&workbook), SheetLayout::Split);

        let labels_out = dir.path().join("labels.csv");
        let candidates_out = dir.path().join("candidates.csv");
        assert_eq!(convert_labels(&sheet, &labels_out, &candidates_out).unwrap(), 2);

        let labels = Table::read(&labels_out).unwrap();
        assert_eq!(labels.rows[0], ["Ann Lee", "ann@x.io", "Ann L.", "ann@y.io", "TP"]);
        assert_eq!(labels.cell(1, 4), "FP");

        let candidates = Table::read(&candidates_out).unwrap();
        let c1 = candidates.require_column("c1").unwrap();
        let c4 = candidates.require_column("c4").unwrap();
        assert_eq!(parse_float(candidates.cell(0, c1)), Some(0.9));
        assert_eq!(parse_bool(candidates.cell(0, c4)), Some(true));
        assert_eq!(parse_bool(candidates.cell(1, c4)), Some(false));
    }

    #[test]
    fn test_read_any_falls_back_to_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sheet.csv");
        std::fs::write(&path, "row,label\nx,1\n").unwrap();
        let t = Table::read_any(&path).unwrap();
        assert_eq!(t.headers, ["row", "label"]);
        assert_eq!(t.cell(0, 1), "1");
    }

    #[test]
    fn test_output_tables() {
        let rows = vec![SheetRow {
            pair: IdentityPair::new("Ann", "a@x.io", "Ann", "a@y.io"),
            metrics: Default::default(),
            label: "TP".to_string(),
        }];
        let labels = labels_table(&rows);
        assert_eq!(labels.headers, ["name_1", "email_1", "name_2", "email_2", "label"]);
        let candidates = sheet_candidates_table(&rows);
        assert_eq!(candidates.headers.len(), 13);
        assert_eq!(candidates.rows[0].last().map(String::as_str), Some(SHEET_METHOD));
    }
}
