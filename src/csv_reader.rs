// CSV input for the CLI and tests

use crate::data::Dataset;
use crate::error::Result;
use std::io::Read;

/// Raw CSV contents: a header row plus string records
#[derive(Debug, Clone)]
pub struct CsvData {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl CsvData {
    /// Convert into a typed dataset (empty field -> null, numbers parsed)
    pub fn into_dataset(self) -> Dataset {
        Dataset::from_records(&self.headers, self.rows)
    }
}

/// Read CSV data from any reader. Short rows are allowed and padded with nulls.
pub fn read_csv<R: Read>(reader: R) -> Result<CsvData> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.to_string()).collect();

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        rows.push(record.iter().map(|f| f.to_string()).collect());
    }

    Ok(CsvData { headers, rows })
}

pub fn read_csv_str(input: &str) -> Result<CsvData> {
    read_csv(input.as_bytes())
}
