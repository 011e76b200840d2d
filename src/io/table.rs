//! Delimited (CSV/TSV) tables: allele sequences, working lists, score
//! columns and raw per-allele representations.

use std::fs::File;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use tracing::{debug, info};

use crate::allele::RawTable;
use crate::error::{PrepError, Result};
use crate::util::amino;

/// 分隔符由扩展名决定：`.tsv` / `.txt` 为制表符，其余为逗号。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimited {
    Csv,
    Tsv,
}

impl Delimited {
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        match path.as_ref().extension().and_then(|e| e.to_str()) {
            Some("tsv" | "txt") => Delimited::Tsv,
            _ => Delimited::Csv,
        }
    }

    pub fn delimiter(self) -> u8 {
        match self {
            Delimited::Csv => b',',
            Delimited::Tsv => b'\t',
        }
    }
}

fn open(path: &Path) -> Result<csv::Reader<File>> {
    let format = Delimited::from_path(path);
    debug!(path = %path.display(), ?format, "opening table");
    Ok(ReaderBuilder::new()
        .delimiter(format.delimiter())
        .has_headers(true)
        .from_reader(File::open(path)?))
}

fn column(headers: &StringRecord, name: &str, path: &Path) -> Result<usize> {
    headers.iter().position(|h| h == name).ok_or_else(|| {
        PrepError::malformed(format!(
            "{}: no column '{}' (have: {})",
            path.display(),
            name,
            headers.iter().collect::<Vec<_>>().join(", ")
        ))
    })
}

/// Read `(allele, sequence)` pairs in file order.
pub fn read_allele_sequences(
    path: impl AsRef<Path>,
    allele_col: &str,
    sequence_col: &str,
) -> Result<Vec<(String, String)>> {
    let path = path.as_ref();
    let mut reader = open(path)?;
    let headers = reader.headers()?.clone();
    let a = column(&headers, allele_col, path)?;
    let s = column(&headers, sequence_col, path)?;

    let mut pairs = Vec::new();
    for record in reader.records() {
        let record = record?;
        let allele = record.get(a).unwrap_or("").trim();
        if allele.is_empty() {
            continue;
        }
        let sequence = record.get(s).unwrap_or("").trim();
        pairs.push((allele.to_string(), amino::normalize_seq(sequence)));
    }
    info!(path = %path.display(), alleles = pairs.len(), "read allele sequences");
    Ok(pairs)
}

/// Read a string column; empty cells become `None`.
pub fn read_column(path: impl AsRef<Path>, name: &str) -> Result<Vec<Option<String>>> {
    let path = path.as_ref();
    let mut reader = open(path)?;
    let headers = reader.headers()?.clone();
    let c = column(&headers, name, path)?;
    let mut out = Vec::new();
    for record in reader.records() {
        let record = record?;
        let cell = record.get(c).unwrap_or("").trim();
        out.push(if cell.is_empty() {
            None
        } else {
            Some(cell.to_string())
        });
    }
    info!(path = %path.display(), column = name, rows = out.len(), "read column");
    Ok(out)
}

/// Read a numeric column.
pub fn read_values(path: impl AsRef<Path>, name: &str) -> Result<Vec<f64>> {
    let path = path.as_ref();
    let mut reader = open(path)?;
    let headers = reader.headers()?.clone();
    let c = column(&headers, name, path)?;
    let mut out = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let cell = record.get(c).unwrap_or("").trim();
        let v = cell.parse::<f64>().map_err(|_| {
            PrepError::invalid_value(format!(
                "{} row {}: '{}' in column '{}' is not a number",
                path.display(),
                row + 2,
                cell,
                name
            ))
        })?;
        out.push(v);
    }
    info!(path = %path.display(), column = name, rows = out.len(), "read values");
    Ok(out)
}

/// Read per-allele feature vectors: `allele_col` names the allele, every
/// other column is one feature. Rows with an empty allele cell are skipped.
pub fn read_raw_table(path: impl AsRef<Path>, allele_col: &str) -> Result<RawTable> {
    let path = path.as_ref();
    let mut reader = open(path)?;
    let headers = reader.headers()?.clone();
    let a = column(&headers, allele_col, path)?;
    let width = headers.len() - 1;

    let mut table = RawTable::new(1, width);
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let mut allele = String::new();
        let mut values = Vec::with_capacity(width);
        for (i, cell) in record.iter().enumerate() {
            if i == a {
                allele = cell.trim().to_string();
                continue;
            }
            let v = cell.trim().parse::<f32>().map_err(|_| {
                PrepError::invalid_value(format!(
                    "{} row {}: '{}' is not a number",
                    path.display(),
                    row + 2,
                    cell
                ))
            })?;
            values.push(v);
        }
        if allele.is_empty() {
            continue;
        }
        table.insert(allele, values)?;
    }
    info!(path = %path.display(), alleles = table.len(), width, "read raw table");
    Ok(table)
}

/// Copy `input` to `output` with one more column `name` holding `values`.
pub fn append_column(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    name: &str,
    values: &[f64],
) -> Result<()> {
    let (input, output) = (input.as_ref(), output.as_ref());
    let mut reader = open(input)?;
    let mut writer = WriterBuilder::new()
        .delimiter(Delimited::from_path(output).delimiter())
        .from_path(output)?;

    let mut headers = reader.headers()?.clone();
    headers.push_field(name);
    writer.write_record(&headers)?;

    let mut rows = 0usize;
    for record in reader.records() {
        let mut record = record?;
        let v = values.get(rows).ok_or_else(|| {
            PrepError::shape(
                format!("{} values", values.len()),
                format!("more rows in {}", input.display()),
            )
        })?;
        record.push_field(&v.to_string());
        writer.write_record(&record)?;
        rows += 1;
    }
    if rows != values.len() {
        return Err(PrepError::shape(
            format!("{} rows", values.len()),
            format!("{} rows in {}", rows, input.display()),
        ));
    }
    writer.flush()?;
    info!(path = %output.display(), rows, column = name, "wrote table");
    Ok(())
}
