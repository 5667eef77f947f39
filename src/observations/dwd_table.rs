//! Parser for the HTML observation tables published by the DWD.
//!
//! The first `<table>` of the document is read; its first row is the header.
//! Known column headers are translated to modalities (with a unit scale where
//! the table reports in different units), everything else is ignored.

use crate::stations::catalog::StationCatalog;
use crate::types::modality::Modality;
use crate::types::observation::{ObservationValues, RawObservation};
use chrono::{DateTime, Utc};
use html_escape::decode_html_entities;
use log::warn;
use regex::Regex;
use std::sync::LazyLock;

static TABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<table[^>]*>(.*?)</table>").expect("valid regex"));
static ROW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<tr[^>]*>(.*?)</tr>").expect("valid regex"));
static CELL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<t[hd][^>]*>(.*?)</t[hd]>").expect("valid regex"));
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq)]
enum Column {
    Station,
    Value { modality: Modality, scale: f64 },
    WindDirection,
}

fn translate_header(header: &str) -> Option<Column> {
    let value = |modality, scale| Some(Column::Value { modality, scale });
    match header {
        "STATION" | "Station" => Some(Column::Station),
        "LUFTD." | "Luftd." | "Luftdruck" => value(Modality::Pressure, 1.0),
        "TEMP." | "Temp." => value(Modality::Temperature, 1.0),
        "U%" => value(Modality::Humidity, 1.0),
        "RR1" => value(Modality::Precipitation, 1.0),
        // Half-hourly sum, extrapolated to one hour.
        "RR30" => value(Modality::Precipitation, 2.0),
        "DD" => Some(Column::WindDirection),
        // km/h to m/s
        "FF" => value(Modality::WindSpeed, 1.0 / 3.6),
        "FX" => value(Modality::WindGust, 1.0 / 3.6),
        _ => None,
    }
}

/// Compass names used in the `DD` column.
fn compass_degrees(name: &str) -> Option<f64> {
    match name {
        "N" => Some(0.0),
        "NO" => Some(45.0),
        "O" => Some(90.0),
        "SO" => Some(135.0),
        "S" => Some(180.0),
        "SW" => Some(225.0),
        "W" => Some(270.0),
        "NW" => Some(315.0),
        _ => None,
    }
}

fn cell_text(inner: &str) -> String {
    let stripped = TAG.replace_all(inner, " ");
    // `&nbsp;` decodes to U+00A0, which `split_whitespace` also splits on.
    let decoded = decode_html_entities(&stripped);
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn parse_number(text: &str) -> Option<f64> {
    text.replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Extracts one [`RawObservation`] per recognised station row.
///
/// Every record is stamped with `published_at`. Rows naming an unknown station
/// are logged and skipped, unparsable cells become missing values, and rows
/// without any usable value are dropped.
pub fn parse_observation_table(
    html: &str,
    catalog: &StationCatalog,
    published_at: DateTime<Utc>,
) -> Vec<RawObservation> {
    let Some(table) = TABLE.captures(html).and_then(|c| c.get(1)) else {
        return vec![];
    };

    let mut rows = ROW.captures_iter(table.as_str()).map(|row| {
        CELL.captures_iter(&row[1])
            .map(|cell| cell_text(&cell[1]))
            .collect::<Vec<_>>()
    });

    let Some(header) = rows.next() else {
        return vec![];
    };
    let columns: Vec<Option<Column>> = header.iter().map(|h| translate_header(h)).collect();

    let mut records = Vec::new();
    for row in rows {
        let mut station_id = None;
        let mut values = ObservationValues::default();

        for (cell, column) in row.iter().zip(columns.iter()) {
            match column {
                None => {}
                Some(Column::Station) => match catalog.id_by_name(cell) {
                    Some(id) => station_id = Some(id),
                    None => warn!("Unmatched station \"{}\"", cell),
                },
                Some(Column::WindDirection) => {
                    if let Some(deg) = compass_degrees(cell) {
                        values.set(Modality::WindDirection, Some(deg));
                    }
                }
                Some(Column::Value { modality, scale }) => {
                    if let Some(v) = parse_number(cell) {
                        values.set(*modality, Some(v * scale));
                    }
                }
            }
        }

        if let Some(station_id) = station_id {
            if !values.is_empty() {
                records.push(RawObservation {
                    station_id,
                    timestamp: published_at,
                    values,
                });
            }
        }
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn catalog() -> StationCatalog {
        let xml = r#"<stations>
            <station id="10637" name="Frankfurt/M." lat="50.05" lon="8.6" alt="111"/>
            <station id="10384" name="Berlin-Tem." lat="52.47" lon="13.4" alt="48"/>
            <station id="10962" name="Hohenpeissenberg" lat="47.8" lon="11.01" alt="977"/>
        </stations>"#;
        StationCatalog::from_xml_str(xml).unwrap()
    }

    fn published() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap()
    }

    const DOMESTIC: &str = r#"<html><body>
<p>Aktuelle Messwerte</p>
<table border="1">
<tr><th>Station</th><th>H&ouml;he</th><th>LUFTD.</th><th>TEMP.</th><th>U%</th><th>DD</th><th>FF</th><th>FX</th><th>RR30</th><th>WETTER</th></tr>
<tr><td>Frankfurt/M.</td><td>111</td><td>1012.3</td><td>7.5</td><td>81</td><td>SW</td><td>18</td><td>36</td><td>0.2</td><td>bedeckt</td></tr>
<tr><td><b>Berlin-Tem.</b></td><td>48</td><td>1009.8</td><td>5.1</td><td>---</td><td>N</td><td>9</td><td>---</td><td>0.0</td><td>heiter</td></tr>
<tr><td>Atlantis</td><td>0</td><td>1000.0</td><td>20.0</td><td>50</td><td>S</td><td>3</td><td>5</td><td>0.0</td><td>klar</td></tr>
<tr><td>Hohenpeissenberg</td><td>977</td><td>---</td><td>---</td><td>---</td><td>kalm</td><td>---</td><td>---</td><td>---</td><td>Nebel</td></tr>
</table>
<table><tr><th>Station</th><th>TEMP.</th></tr><tr><td>Frankfurt/M.</td><td>99</td></tr></table>
</body></html>"#;

    #[test]
    fn test_domestic_table() {
        let records = parse_observation_table(DOMESTIC, &catalog(), published());
        assert_eq!(records.len(), 2);

        let frankfurt = &records[0];
        assert_eq!(frankfurt.station_id, 10637);
        assert_eq!(frankfurt.timestamp, published());
        assert_eq!(frankfurt.values.get(Modality::Pressure), Some(1012.3));
        assert_eq!(frankfurt.values.get(Modality::Temperature), Some(7.5));
        assert_eq!(frankfurt.values.get(Modality::Humidity), Some(81.0));
        assert_eq!(frankfurt.values.get(Modality::WindDirection), Some(225.0));
        assert!((frankfurt.values.get(Modality::WindSpeed).unwrap() - 5.0).abs() < 1e-9);
        assert!((frankfurt.values.get(Modality::WindGust).unwrap() - 10.0).abs() < 1e-9);
        assert!((frankfurt.values.get(Modality::Precipitation).unwrap() - 0.4).abs() < 1e-9);

        let berlin = &records[1];
        assert_eq!(berlin.station_id, 10384);
        assert_eq!(berlin.values.get(Modality::Humidity), None);
        assert_eq!(berlin.values.get(Modality::WindGust), None);
        assert_eq!(berlin.values.get(Modality::WindDirection), Some(0.0));
    }

    #[test]
    fn test_continental_headers() {
        let html = "<table><tr><th>STATION</th><th>Luftdruck</th><th>Temp.</th><th>RR1</th></tr>\
                    <tr><td>Frankfurt/M.</td><td>1001,5</td><td>-3.2</td><td>1.1</td></tr></table>";
        let records = parse_observation_table(html, &catalog(), published());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].values.get(Modality::Pressure), Some(1001.5));
        assert_eq!(records[0].values.get(Modality::Temperature), Some(-3.2));
        assert_eq!(records[0].values.get(Modality::Precipitation), Some(1.1));
    }

    #[test]
    fn test_no_table() {
        assert!(parse_observation_table("<html>Wartung</html>", &catalog(), published()).is_empty());
        assert!(parse_observation_table("<table></table>", &catalog(), published()).is_empty());
    }

    #[test]
    fn test_station_names_with_character_references() {
        let xml = r#"<stations>
            <station id="10865" name="München" lat="48.13" lon="11.55" alt="515"/>
            <station id="10488" name="Dresden-Klotzsche" lat="51.13" lon="13.75" alt="227"/>
        </stations>"#;
        let catalog = StationCatalog::from_xml_str(xml).unwrap();
        let html = "<table><tr><th>Station</th><th>TEMP.</th></tr>\
                    <tr><td>M&uuml;nchen</td><td>2.3</td></tr>\
                    <tr><td>Dresden&#45;Klotzsche</td><td>1.0</td></tr>\
                    <tr><td>M&#252;nchen</td><td>2.4</td></tr>\
                    <tr><td>M&#xFC;nchen</td><td>2.5</td></tr></table>";
        let records = parse_observation_table(html, &catalog, published());
        let ids: Vec<_> = records.iter().map(|r| r.station_id).collect();
        assert_eq!(ids, vec![10865, 10488, 10865, 10865]);
        assert_eq!(records[2].values.get(Modality::Temperature), Some(2.4));
    }

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(" <b>Berlin&nbsp;Tem.</b>\n"), "Berlin Tem.");
        assert_eq!(cell_text("A &amp; B"), "A & B");
        assert_eq!(cell_text("H&ouml;he &lt;m&gt;"), "Höhe <m>");
    }
}
