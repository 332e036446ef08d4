use anyhow::{Context, Result};
use serde_json::Number;

use crate::store::SensorReading;

pub const CSV_HEADER: [&str; 8] = [
    "ID",
    "Time",
    "Temperature",
    "Humidity",
    "Air Flow",
    "MRT",
    "PMV",
    "Thermal Comfort",
];

/// `Content-Disposition` for the download.
pub const CSV_ATTACHMENT: &str = "attachment;filename=sensor_data.csv";

/// Serialize readings in the order given, header first, CRLF-terminated with
/// minimal quoting. Null columns become empty fields.
pub fn readings_to_csv(readings: &[SensorReading]) -> Result<Vec<u8>> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::CRLF)
        .from_writer(Vec::new());

    wtr.write_record(CSV_HEADER)?;
    for r in readings {
        wtr.write_record([
            r.id.to_string(),
            r.time.clone().unwrap_or_default(),
            number_field(r.temperature.as_ref()),
            number_field(r.humidity.as_ref()),
            number_field(r.air_flow.as_ref()),
            number_field(r.mrt.as_ref()),
            number_field(r.pmv.as_ref()),
            r.thermal_comfort.clone().unwrap_or_default(),
        ])?;
    }

    wtr.into_inner().context("failed to flush CSV writer")
}

fn number_field(value: Option<&Number>) -> String {
    match value {
        None => String::new(),
        Some(n) => match n.as_f64() {
            Some(f) if n.is_f64() => float_text(f),
            _ => n.to_string(),
        },
    }
}

/// Shortest round-trip text for a float: integral values keep `.0`, and
/// magnitudes below `1e-4` or from `1e16` up use an exponent with a sign and
/// at least two digits (`1e-05`, `1e+16`).
fn float_text(value: f64) -> String {
    let sci = format!("{value:e}");
    let Some((mantissa, exp)) = sci.split_once('e') else {
        return value.to_string();
    };
    let Ok(exp) = exp.parse::<i32>() else {
        return value.to_string();
    };

    let (sign, mantissa) = match mantissa.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", mantissa),
    };
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    // Position of the decimal point relative to the first digit.
    let point = exp + 1;

    let body = if point <= -4 || point > 16 {
        let (first, rest) = digits.split_at(1);
        let frac = if rest.is_empty() { String::new() } else { format!(".{rest}") };
        let exp_sign = if exp < 0 { '-' } else { '+' };
        format!("{first}{frac}e{exp_sign}{:02}", exp.unsigned_abs())
    } else if point <= 0 {
        format!("0.{}{digits}", "0".repeat(point.unsigned_abs() as usize))
    } else {
        let point = point as usize;
        if point >= digits.len() {
            format!("{digits}{}.0", "0".repeat(point - digits.len()))
        } else {
            format!("{}.{}", &digits[..point], &digits[point..])
        }
    };
    format!("{sign}{body}")
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Map};

    use super::*;

    fn reading(id: i64, time: &str, pmv: f64, label: &str) -> SensorReading {
        SensorReading {
            id,
            time: Some(time.to_owned()),
            temperature: Number::from_f64(26.5),
            humidity: Number::from_f64(60.0),
            air_flow: Number::from_f64(0.1),
            mrt: Number::from_f64(27.0),
            pmv: Number::from_f64(pmv),
            thermal_comfort: Some(label.to_owned()),
            extra: Map::new(),
        }
    }

    fn data_line(reading: &SensorReading) -> String {
        let csv = String::from_utf8(readings_to_csv(std::slice::from_ref(reading)).unwrap()).unwrap();
        csv.split_terminator("\r\n").nth(1).unwrap().to_owned()
    }

    #[test]
    fn empty_export_is_header_only() {
        let csv = String::from_utf8(readings_to_csv(&[]).unwrap()).unwrap();
        assert_eq!(csv, "ID,Time,Temperature,Humidity,Air Flow,MRT,PMV,Thermal Comfort\r\n");
    }

    #[test]
    fn rows_follow_header_in_given_order() {
        let rows = [
            reading(2, "2025-05-14T11:00:00.000000", 1.25, "A bit Warm"),
            reading(1, "2025-05-14T10:00:00.000000", -0.5, "Normal"),
        ];
        let csv = String::from_utf8(readings_to_csv(&rows).unwrap()).unwrap();
        let lines: Vec<&str> = csv.split_terminator("\r\n").collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[1],
            "2,2025-05-14T11:00:00.000000,26.5,60.0,0.1,27.0,1.25,A bit Warm"
        );
        assert_eq!(
            lines[2],
            "1,2025-05-14T10:00:00.000000,26.5,60.0,0.1,27.0,-0.5,Normal"
        );
    }

    #[test]
    fn every_row_has_eight_fields() {
        let rows: Vec<SensorReading> = (1..=5)
            .map(|i| reading(i, "2025-05-14T10:00:00.000000", 0.0, "Normal"))
            .collect();
        let bytes = readings_to_csv(&rows).unwrap();

        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(bytes.as_slice());
        assert_eq!(rdr.headers().unwrap().len(), 8);
        let records: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 5);
        assert!(records.iter().all(|r| r.len() == 8));
        assert_eq!(&records[4][0], "5");
    }

    #[test]
    fn fields_with_commas_are_quoted() {
        let rows = [reading(7, "2025-05-14T10:00:00.000000", 0.0, "Normal, mostly")];
        let csv = String::from_utf8(readings_to_csv(&rows).unwrap()).unwrap();
        assert!(csv.ends_with(",\"Normal, mostly\"\r\n"));
    }

    #[test]
    fn null_columns_are_empty_fields() {
        let row: SensorReading = serde_json::from_value(json!({
            "id": 3, "time": null, "temperature": 25.0, "humidity": null,
            "air_flow": 0.1, "mrt": null, "pmv": null, "thermal_comfort": null
        }))
        .unwrap();
        assert_eq!(data_line(&row), "3,,25.0,,0.1,,,");
    }

    #[test]
    fn numbers_keep_their_stored_form() {
        let row: SensorReading = serde_json::from_value(json!({
            "id": 4, "time": "2025-05-14T10:00:00.000000", "temperature": 26,
            "humidity": 60.0, "air_flow": 1e-5, "mrt": 1e16, "pmv": -0.00012,
            "thermal_comfort": "Normal"
        }))
        .unwrap();
        assert_eq!(
            data_line(&row),
            "4,2025-05-14T10:00:00.000000,26,60.0,1e-05,1e+16,-0.00012,Normal"
        );
    }

    #[test]
    fn float_text_switches_to_exponent_at_the_edges() {
        assert_eq!(float_text(0.0), "0.0");
        assert_eq!(float_text(0.0001), "0.0001");
        assert_eq!(float_text(0.00001), "1e-05");
        assert_eq!(float_text(1.5e-7), "1.5e-07");
        assert_eq!(float_text(1e15), "1000000000000000.0");
        assert_eq!(float_text(1e16), "1e+16");
        assert_eq!(float_text(1.25e22), "1.25e+22");
        assert_eq!(float_text(123.456), "123.456");
        assert_eq!(float_text(-3.0), "-3.0");
    }
}
