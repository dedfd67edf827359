use crate::model::{Column, ItemColor, Record};
use tracing::debug;

/// Parse pasted or fetched sheet text into records.
///
/// The first non-empty line is the header. Parsing never fails: malformed
/// rows produce empty text and zeroed numbers.
pub fn parse(text: &str) -> Vec<Record> {
    let mut lines = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty());

    let Some(header_line) = lines.next() else {
        return Vec::new();
    };

    let delim = if header_line.contains('\t') { '\t' } else { ',' };
    let headers: Vec<Option<Column>> = header_line
        .split(delim)
        .map(|h| Column::from_header(h.trim()))
        .collect();

    let records: Vec<Record> = lines
        .map(|line| parse_row(&headers, line.split(delim).collect()))
        .collect();

    debug!(rows = records.len(), delimiter = ?delim, "parsed sheet");
    records
}

fn parse_row(headers: &[Option<Column>], cols: Vec<&str>) -> Record {
    let mut record = Record::default();

    for (i, header) in headers.iter().enumerate() {
        let Some(column) = header else { continue };
        let value = clean_field(cols.get(i).copied().unwrap_or(""));

        match column {
            Column::ItemName => record.item_name = value.to_string(),
            Column::ItemPrice => record.item_price = to_number(value),
            Column::Quality => record.quality = to_number(value),
            Column::Accuracy => record.accuracy = to_number(value),
            Column::Damage => record.damage = to_number(value),
            Column::Defense => record.defense = to_number(value),
            Column::Bonus1Name => record.bonus1_name = value.to_string(),
            Column::Bonus1Value => record.bonus1_value = to_number(value),
            Column::Bonus2Name => record.bonus2_name = value.to_string(),
            Column::Bonus2Value => record.bonus2_value = to_number(value),
            Column::Color => record.color = ItemColor::parse(value),
            Column::AuctionEnds => record.auction_ends = value.to_string(),
        }
    }

    record
}

fn clean_field(raw: &str) -> &str {
    let v = raw.trim();
    if v == "N/A" {
        return "";
    }
    if v.starts_with('"') && v.ends_with('"') {
        // a lone quote both starts and ends the field
        return v
            .strip_prefix('"')
            .and_then(|s| s.strip_suffix('"'))
            .unwrap_or("");
    }
    v
}

/// Best-effort numeric coercion; anything unusable becomes zero.
pub fn to_number(s: &str) -> f64 {
    match s.trim().parse::<f64>() {
        Ok(n) if n.is_finite() => n,
        _ => 0.0,
    }
}
