use std::fs::{File, read_to_string};
use std::io::{BufRead, BufReader, Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use bzip2::read::BzDecoder;
use flate2::read::GzDecoder;
use ndarray::Array2;
use polars::prelude::*;
use sphererot::{Compartment, Hemisphere};
use tempfile::NamedTempFile;

use crate::config::{Parcellation, SurfaceName};
use crate::epicentre::Connectome;
use crate::results::ResultStore;
use crate::surface::{SurfaceDescriptor, SurfaceRegion};
use crate::types::{BrainMap, EpicentreResult, SimilarityMatrix, SpinResult};

pub fn read_table(path: &Path) -> Result<DataFrame> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    if ext == "gz" || ext == "bz2" {
        let tmp = decompress_to_temp(path, &ext)?;
        return read_table_plain(tmp.path());
    }

    read_table_plain(path)
}

fn read_table_plain(path: &Path) -> Result<DataFrame> {
    let delimiter = detect_delimiter(path)?;
    if delimiter == b' ' {
        let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
        return read_table_whitespace(BufReader::new(file));
    }

    CsvReadOptions::default()
        .with_has_header(true)
        .with_parse_options(
            CsvParseOptions::default()
                .with_separator(delimiter)
                .with_null_values(Some(NullValues::AllColumns(vec![
                    "".into(),
                    "NA".into(),
                    "NaN".into(),
                ])))
                .with_missing_is_null(true),
        )
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()
        .with_context(|| format!("read {}", path.display()))
}

fn read_table_whitespace<R: Read>(reader: R) -> Result<DataFrame> {
    let mut reader = BufReader::new(reader);
    let mut header_line = String::new();
    reader.read_line(&mut header_line)?;
    if header_line.trim().is_empty() {
        return Err(anyhow::anyhow!("empty file"));
    }
    let headers: Vec<&str> = header_line.split_whitespace().collect();
    let mut columns: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let parts: Vec<&str> = line.split_whitespace().collect();
        for (i, col) in columns.iter_mut().enumerate() {
            col.push(parts.get(i).and_then(|v| normalize_missing_token(v)));
        }
    }

    let cols: Vec<Column> = headers
        .iter()
        .zip(columns)
        .map(|(name, values)| {
            let series = Series::new((*name).into(), values);
            let numeric = series.cast(&DataType::Float64);
            // keep text columns (labels, hemispheres) as strings
            match numeric {
                Ok(num) if num.null_count() == series.null_count() => num.into(),
                _ => series.into(),
            }
        })
        .collect();
    Ok(DataFrame::new(cols)?)
}

fn detect_delimiter(path: &Path) -> Result<u8> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut reader = BufReader::new(file);
    let mut first = String::new();
    reader.read_line(&mut first)?;
    if first.contains('\t') {
        return Ok(b'\t');
    }
    if first.contains(',') {
        return Ok(b',');
    }
    Ok(b' ')
}

fn decompress_to_temp(path: &Path, ext: &str) -> Result<NamedTempFile> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut decoder: Box<dyn Read> = match ext {
        "gz" => Box::new(GzDecoder::new(file)),
        "bz2" => Box::new(BzDecoder::new(file)),
        _ => Box::new(file),
    };
    let mut tmp = NamedTempFile::new()?;
    std::io::copy(&mut decoder, &mut tmp)?;
    Ok(tmp)
}

fn normalize_missing_token(value: &str) -> Option<String> {
    let trimmed = value.trim();
    let upper = trimmed.to_ascii_uppercase();
    if trimmed.is_empty() || upper == "NA" || upper == "NAN" {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn is_text_column(df: &DataFrame, name: &str) -> Result<bool> {
    Ok(df.column(name)?.dtype() == &DataType::String)
}

/// Numeric column; missing or unparsable entries are errors.
fn f64_column(df: &DataFrame, name: &str, path: &Path) -> Result<Vec<f64>> {
    let series = df
        .column(name)?
        .as_materialized_series()
        .cast(&DataType::Float64)
        .with_context(|| format!("column {name} of {} is not numeric", path.display()))?;
    let col = series.f64()?;
    col.into_iter()
        .enumerate()
        .map(|(row, v)| {
            v.ok_or_else(|| {
                anyhow::anyhow!(
                    "column {name} of {} has a missing value at row {row}",
                    path.display()
                )
            })
        })
        .collect()
}

fn string_column(df: &DataFrame, name: &str, path: &Path) -> Result<Vec<String>> {
    let series = df
        .column(name)?
        .as_materialized_series()
        .cast(&DataType::String)?;
    let col = series.str()?;
    col.into_iter()
        .enumerate()
        .map(|(row, v)| {
            v.map(|s| s.trim().to_string()).ok_or_else(|| {
                anyhow::anyhow!(
                    "column {name} of {} has a missing value at row {row}",
                    path.display()
                )
            })
        })
        .collect()
}

/// One numeric column, optionally preceded by a region label column.
pub fn read_brain_map(path: &Path) -> Result<BrainMap> {
    let df = read_table(path)?;
    let names = column_names(&df);
    let first = names
        .first()
        .ok_or_else(|| anyhow::anyhow!("Empty map file {}", path.display()))?;
    if names.len() >= 2 && is_text_column(&df, first)? {
        let labels = string_column(&df, first, path)?;
        let values = f64_column(&df, &names[1], path)?;
        Ok(BrainMap::with_labels(values, labels))
    } else {
        Ok(BrainMap::new(f64_column(&df, first, path)?))
    }
}

/// Numeric matrix. A leading text column holds row labels, in which case the
/// remaining header names are used as column labels.
pub fn read_connectome(path: &Path) -> Result<Connectome> {
    let df = read_table(path)?;
    let names = column_names(&df);
    if names.is_empty() || df.height() == 0 {
        return Err(anyhow::anyhow!("Empty connectome file {}", path.display()));
    }
    let labelled = is_text_column(&df, &names[0])?;
    let (row_labels, value_names) = if labelled {
        (Some(string_column(&df, &names[0], path)?), &names[1..])
    } else {
        (None, &names[..])
    };
    let n = df.height();
    let m = value_names.len();
    let mut values = Array2::<f64>::zeros((n, m));
    for (j, name) in value_names.iter().enumerate() {
        for (i, v) in f64_column(&df, name, path)?.into_iter().enumerate() {
            values[(i, j)] = v;
        }
    }
    let column_labels = labelled.then(|| value_names.to_vec());
    Ok(Connectome::with_labels(values, row_labels, column_labels)?)
}

/// Sphere coordinates table with columns `region, hemisphere, x, y, z` and an
/// optional `compartment` column (`ctx` or `sctx`). Without it, compartments
/// follow the parcellation's region order.
pub fn read_surface(
    path: &Path,
    surface: SurfaceName,
    parcellation: Parcellation,
) -> Result<SurfaceDescriptor> {
    let df = read_table(path)?;
    let labels = string_column(&df, "region", path)?;
    let hemispheres = string_column(&df, "hemisphere", path)?;
    let compartments = if column_names(&df).iter().any(|c| c == "compartment") {
        Some(string_column(&df, "compartment", path)?)
    } else {
        None
    };
    let x = f64_column(&df, "x", path)?;
    let y = f64_column(&df, "y", path)?;
    let z = f64_column(&df, "z", path)?;
    let mut regions = Vec::with_capacity(labels.len());
    for (i, label) in labels.into_iter().enumerate() {
        let hemisphere: Hemisphere = hemispheres[i]
            .parse()
            .with_context(|| format!("row {i} of {}", path.display()))?;
        let compartment: Compartment = match &compartments {
            Some(values) => values[i]
                .parse()
                .with_context(|| format!("row {i} of {}", path.display()))?,
            None => parcellation.default_compartment(i),
        };
        regions.push(SurfaceRegion {
            label,
            hemisphere,
            compartment,
            point: [x[i], y[i], z[i]],
        });
    }
    Ok(SurfaceDescriptor::new(surface, parcellation, regions)?)
}

pub fn write_vector<T: std::fmt::Display>(vec: &[T], path: &Path) -> Result<()> {
    let mut file = File::create(path)?;
    for v in vec {
        writeln!(file, "{v}")?;
    }
    Ok(())
}

pub fn spin_json(result: &SpinResult) -> String {
    format!(
        "{{\"r\":{},\"p\":{},\"rotation_count\":{},\"identity_rotations\":{},\"seed\":{},\"null\":{}}}",
        format_number(result.r),
        format_number(result.p),
        result.rotation_count,
        result.identity_rotations,
        result
            .seed
            .map(|s| s.to_string())
            .unwrap_or_else(|| "null".to_string()),
        result
            .null
            .as_deref()
            .map(format_vec)
            .unwrap_or_else(|| "null".to_string()),
    )
}

pub fn epicentre_json(result: &EpicentreResult) -> String {
    format!(
        "{{\"seeds\":{},\"r\":{},\"p\":{}}}",
        format_string_vec(&result.seeds),
        format_vec(&result.r),
        format_vec(&result.p),
    )
}

pub fn similarity_json(matrix: &SimilarityMatrix) -> String {
    format!(
        "{{\"row_labels\":{},\"column_labels\":{},\"r\":{},\"p\":{}}}",
        format_string_vec(&matrix.row_labels),
        format_string_vec(&matrix.column_labels),
        format_array2(&matrix.r),
        format_array2(&matrix.p),
    )
}

pub fn write_spin_json(result: &SpinResult, path: &Path) -> Result<()> {
    write_json(&spin_json(result), path)
}

pub fn write_epicentre_json(result: &EpicentreResult, path: &Path) -> Result<()> {
    write_json(&epicentre_json(result), path)
}

pub fn write_similarity_json(matrix: &SimilarityMatrix, path: &Path) -> Result<()> {
    write_json(&similarity_json(matrix), path)
}

/// Writes a keyed store as one JSON object, `format` rendering each entry.
pub fn write_store_json<T, F>(store: &ResultStore<T>, format: F, path: &Path) -> Result<()>
where
    F: Fn(&T) -> String,
{
    let entries = store
        .iter()
        .map(|(key, value)| {
            format!(
                "\"{}\":{}",
                escape_json_string(&key.to_string()),
                format(value)
            )
        })
        .collect::<Vec<_>>()
        .join(",");
    write_json(&format!("{{{entries}}}"), path)
}

fn write_json(json: &str, path: &Path) -> Result<()> {
    let mut file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    writeln!(file, "{json}")?;
    Ok(())
}

pub fn read_epicentre_json(path: &Path) -> Result<EpicentreResult> {
    let text = read_to_string(path).context("read epicentre json")?;
    let seeds = parse_string_array(&extract_json_value(&text, "seeds")?)?;
    let r = parse_number_array(&extract_json_value(&text, "r")?)?;
    let p = parse_number_array(&extract_json_value(&text, "p")?)?;
    if seeds.len() != r.len() || r.len() != p.len() {
        return Err(anyhow::anyhow!(
            "epicentre json {} has mismatched seeds/r/p lengths",
            path.display()
        ));
    }
    Ok(EpicentreResult { seeds, r, p })
}

fn extract_json_value(text: &str, key: &str) -> Result<String> {
    let needle = format!("\"{key}\":");
    let start = text
        .find(&needle)
        .ok_or_else(|| anyhow::anyhow!("Key {key} not found in JSON"))?;
    let mut idx = start + needle.len();
    let bytes = text.as_bytes();
    while idx < bytes.len() && bytes[idx].is_ascii_whitespace() {
        idx += 1;
    }
    if idx >= bytes.len() {
        return Err(anyhow::anyhow!("Key {key} has no value"));
    }
    if bytes[idx] == b'[' {
        let mut depth = 0isize;
        let mut in_string = false;
        let mut escaped = false;
        for j in idx..bytes.len() {
            let b = bytes[j];
            if in_string {
                match (escaped, b) {
                    (true, _) => escaped = false,
                    (false, b'\\') => escaped = true,
                    (false, b'"') => in_string = false,
                    _ => {}
                }
                continue;
            }
            match b {
                b'"' => in_string = true,
                b'[' => depth += 1,
                b']' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(text[idx..=j].to_string());
                    }
                }
                _ => {}
            }
        }
        Err(anyhow::anyhow!("Unterminated array for key {key}"))
    } else {
        let mut j = idx;
        while j < bytes.len() && bytes[j] != b',' && bytes[j] != b'}' {
            j += 1;
        }
        Ok(text[idx..j].trim().to_string())
    }
}

fn parse_number_array(value: &str) -> Result<Vec<f64>> {
    let trimmed = value.trim();
    if !trimmed.starts_with('[') || !trimmed.ends_with(']') {
        return Err(anyhow::anyhow!("Expected numeric array"));
    }
    let inner = &trimmed[1..trimmed.len() - 1];
    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }
    let mut out = Vec::new();
    for part in inner.split(',') {
        let token = part.trim();
        if token == "null" {
            return Err(anyhow::anyhow!("Unexpected null in numeric array"));
        }
        out.push(token.parse::<f64>().context("parse number")?);
    }
    Ok(out)
}

fn parse_string_array(value: &str) -> Result<Vec<String>> {
    let trimmed = value.trim();
    if !trimmed.starts_with('[') || !trimmed.ends_with(']') {
        return Err(anyhow::anyhow!("Expected string array"));
    }
    let inner = &trimmed[1..trimmed.len() - 1];
    let mut out = Vec::new();
    let mut chars = inner.chars().peekable();
    while let Some(ch) = chars.peek().copied() {
        if ch.is_whitespace() || ch == ',' {
            chars.next();
            continue;
        }
        if ch == '"' {
            chars.next();
            let mut buf = String::new();
            while let Some(c) = chars.next() {
                if c == '\\' {
                    if let Some(esc) = chars.next() {
                        buf.push(match esc {
                            'n' => '\n',
                            't' => '\t',
                            other => other,
                        });
                    }
                } else if c == '"' {
                    break;
                } else {
                    buf.push(c);
                }
            }
            out.push(buf);
        } else {
            return Err(anyhow::anyhow!("Unexpected token in string array"));
        }
    }
    Ok(out)
}

fn format_array2(matrix: &Array2<f64>) -> String {
    let rows = matrix
        .rows()
        .into_iter()
        .map(|row| format_vec(&row.to_vec()))
        .collect::<Vec<_>>()
        .join(",");
    format!("[{rows}]")
}

fn format_vec(values: &[f64]) -> String {
    let vals = values
        .iter()
        .map(|v| format_number(*v))
        .collect::<Vec<_>>()
        .join(",");
    format!("[{vals}]")
}

fn format_string_vec(values: &[String]) -> String {
    let vals = values
        .iter()
        .map(|v| format!("\"{}\"", escape_json_string(v)))
        .collect::<Vec<_>>()
        .join(",");
    format!("[{vals}]")
}

fn escape_json_string(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\t', "\\t")
}

fn format_number(value: f64) -> String {
    if value.is_finite() {
        format!("{value:?}")
    } else {
        "null".to_string()
    }
}
