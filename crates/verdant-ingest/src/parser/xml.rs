// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of Verdant.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

//! ENTSO-E market documents (load and aggregated generation per type)

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::Deserialize;
use verdant_types::{LOAD_CODE, PipelineError, RawSeriesRecord, Result, SeriesKind};

#[derive(Debug, Deserialize)]
struct MarketDocument {
    #[serde(rename = "TimeSeries", default)]
    time_series: Vec<TimeSeriesBlock>,
}

#[derive(Debug, Deserialize)]
struct TimeSeriesBlock {
    #[serde(rename = "quantity_Measure_Unit.name")]
    unit: String,
    #[serde(rename = "MktPSRType")]
    psr: Option<PsrTypeBlock>,
    #[serde(rename = "Period", default)]
    periods: Vec<PeriodBlock>,
}

#[derive(Debug, Deserialize)]
struct PsrTypeBlock {
    #[serde(rename = "psrType")]
    psr_type: String,
}

#[derive(Debug, Deserialize)]
struct PeriodBlock {
    #[serde(rename = "timeInterval")]
    time_interval: TimeInterval,
    resolution: String,
    #[serde(rename = "Point", default)]
    points: Vec<PointBlock>,
}

#[derive(Debug, Deserialize)]
struct TimeInterval {
    start: String,
}

#[derive(Debug, Deserialize)]
struct PointBlock {
    position: u32,
    quantity: f64,
}

/// Parse one XML document into records.
///
/// Every time-series block must be declared in `expected_unit`. Generation
/// blocks carry their production type; load blocks are tagged `load`.
pub fn parse_document(
    body: &str,
    kind: SeriesKind,
    expected_unit: &str,
) -> Result<Vec<RawSeriesRecord>> {
    let document: MarketDocument = quick_xml::de::from_str(body)
        .map_err(|e| PipelineError::Protocol(format!("malformed XML payload: {e}")))?;

    let mut records = Vec::new();
    for block in document.time_series {
        if block.unit != expected_unit {
            return Err(PipelineError::Protocol(format!(
                "unexpected unit {}, expected {expected_unit}",
                block.unit
            )));
        }

        let series_type = match kind {
            SeriesKind::Load => LOAD_CODE.to_owned(),
            SeriesKind::Generation => block
                .psr
                .map(|p| p.psr_type)
                .ok_or_else(|| {
                    PipelineError::Protocol("generation series without psrType".to_owned())
                })?,
        };

        for period in block.periods {
            let start = parse_timestamp(&period.time_interval.start)?;
            let resolution = parse_resolution(&period.resolution)?;

            for point in period.points {
                if point.position == 0 {
                    return Err(PipelineError::Protocol(
                        "point positions start at 1".to_owned(),
                    ));
                }
                let time = i32::try_from(point.position - 1)
                    .ok()
                    .and_then(|steps| resolution.checked_mul(steps))
                    .and_then(|offset| start.checked_add_signed(offset))
                    .ok_or_else(|| {
                        PipelineError::Protocol(format!(
                            "position {} out of range",
                            point.position
                        ))
                    })?;
                records.push(RawSeriesRecord {
                    time,
                    unit: block.unit.clone(),
                    series_type: series_type.clone(),
                    quantity: point.quantity,
                });
            }
        }
    }

    Ok(records)
}

/// Accepts RFC 3339 and the minute-precision `2022-01-01T00:00Z` form
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%MZ")
        .map(|naive| naive.and_utc())
        .map_err(|e| PipelineError::Protocol(format!("invalid timestamp {raw}: {e}")))
}

/// `PT{n}M` or `PT{n}H`
pub fn parse_resolution(raw: &str) -> Result<Duration> {
    let invalid = || PipelineError::Protocol(format!("invalid resolution {raw}"));

    let body = raw.trim().strip_prefix("PT").ok_or_else(invalid)?;
    let (amount, minutes_per_unit) = if let Some(n) = body.strip_suffix('M') {
        (n, 1)
    } else if let Some(n) = body.strip_suffix('H') {
        (n, 60)
    } else {
        return Err(invalid());
    };

    let amount: i64 = amount.parse().map_err(|_| invalid())?;
    if amount <= 0 {
        return Err(invalid());
    }
    amount
        .checked_mul(minutes_per_unit)
        .and_then(Duration::try_minutes)
        .ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const LOAD_DOC: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<GL_MarketDocument xmlns="urn:iec62325.351:tc57wg16:451-6:generationloaddocument:3:0">
  <mRID>5f1c</mRID>
  <type>A65</type>
  <TimeSeries>
    <mRID>1</mRID>
    <businessType>A04</businessType>
    <outBiddingZone_Domain.mRID codingScheme="A01">10YNL----------L</outBiddingZone_Domain.mRID>
    <quantity_Measure_Unit.name>MAW</quantity_Measure_Unit.name>
    <curveType>A01</curveType>
    <Period>
      <timeInterval>
        <start>2022-01-01T00:00Z</start>
        <end>2022-01-01T01:00Z</end>
      </timeInterval>
      <resolution>PT15M</resolution>
      <Point><position>1</position><quantity>100</quantity></Point>
      <Point><position>2</position><quantity>110</quantity></Point>
      <Point><position>4</position><quantity>130.5</quantity></Point>
    </Period>
  </TimeSeries>
</GL_MarketDocument>"#;

    const GENERATION_DOC: &str = r#"<GL_MarketDocument xmlns="urn:iec62325.351:tc57wg16:451-6:generationloaddocument:3:0">
  <TimeSeries>
    <quantity_Measure_Unit.name>MAW</quantity_Measure_Unit.name>
    <MktPSRType><psrType>B16</psrType></MktPSRType>
    <Period>
      <timeInterval><start>2022-01-01T10:00Z</start><end>2022-01-01T12:00Z</end></timeInterval>
      <resolution>PT60M</resolution>
      <Point><position>1</position><quantity>5</quantity></Point>
      <Point><position>2</position><quantity>7</quantity></Point>
    </Period>
  </TimeSeries>
  <TimeSeries>
    <quantity_Measure_Unit.name>MAW</quantity_Measure_Unit.name>
    <MktPSRType><psrType>B18</psrType></MktPSRType>
    <Period>
      <timeInterval><start>2022-01-01T10:00Z</start><end>2022-01-01T10:30Z</end></timeInterval>
      <resolution>PT15M</resolution>
      <Point><position>2</position><quantity>42</quantity></Point>
    </Period>
  </TimeSeries>
</GL_MarketDocument>"#;

    #[test]
    fn test_parse_load_document() {
        let records = parse_document(LOAD_DOC, SeriesKind::Load, "MAW").unwrap();
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.series_type == "load"));

        let start = Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(records[0].time, start);
        assert_eq!(records[1].time, start + Duration::minutes(15));
        assert_eq!(records[2].time, start + Duration::minutes(45));
        assert_eq!(records[2].quantity, 130.5);
    }

    #[test]
    fn test_parse_generation_document() {
        let records = parse_document(GENERATION_DOC, SeriesKind::Generation, "MAW").unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].series_type, "B16");
        assert_eq!(
            records[1].time,
            Utc.with_ymd_and_hms(2022, 1, 1, 11, 0, 0).unwrap()
        );
        assert_eq!(records[2].series_type, "B18");
        assert_eq!(
            records[2].time,
            Utc.with_ymd_and_hms(2022, 1, 1, 10, 15, 0).unwrap()
        );
    }

    #[test]
    fn test_unexpected_unit_is_protocol_error() {
        let body = LOAD_DOC.replace(">MAW<", ">KWH<");
        let result = parse_document(&body, SeriesKind::Load, "MAW");
        assert!(matches!(result, Err(PipelineError::Protocol(_))));
    }

    #[test]
    fn test_generation_without_psr_type() {
        let result = parse_document(LOAD_DOC, SeriesKind::Generation, "MAW");
        assert!(matches!(result, Err(PipelineError::Protocol(_))));
    }

    #[test]
    fn test_document_without_time_series() {
        let body = r#"<Acknowledgement_MarketDocument xmlns="urn:iec62325.351:tc57wg16:451-1:acknowledgementdocument:7:0">
  <mRID>1</mRID>
  <Reason><code>999</code><text>No matching data found</text></Reason>
</Acknowledgement_MarketDocument>"#;
        let records = parse_document(body, SeriesKind::Load, "MAW").unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_parse_timestamp_forms() {
        let expected = Utc.with_ymd_and_hms(2022, 3, 1, 23, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2022-03-01T23:00Z").unwrap(), expected);
        assert_eq!(parse_timestamp("2022-03-01T23:00:00Z").unwrap(), expected);
        assert_eq!(parse_timestamp("2022-03-02T00:00:00+01:00").unwrap(), expected);
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn test_parse_resolution() {
        assert_eq!(parse_resolution("PT15M").unwrap(), Duration::minutes(15));
        assert_eq!(parse_resolution("PT60M").unwrap(), Duration::hours(1));
        assert_eq!(parse_resolution("PT1H").unwrap(), Duration::hours(1));
        assert!(parse_resolution("P1D").is_err());
        assert!(parse_resolution("PT0M").is_err());
        assert!(parse_resolution("PTxM").is_err());
    }
}
