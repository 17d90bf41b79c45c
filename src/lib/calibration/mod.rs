//! Auger calibration: measured volumetric flow at a handful of auger speeds, and the
//! inverse lookup from a required flow to the auger speed that delivers it.
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

/// One measured row of the calibration table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationPoint {
    /// Auger speed, rpm
    #[serde(rename = "RPM")]
    pub rpm: f64,
    /// Volumetric flow measured at `rpm`
    #[serde(rename = "Q_m3_per_min")]
    pub flow: f64,
}

impl CalibrationPoint {
    pub fn new(rpm: f64, flow: f64) -> Self {
        CalibrationPoint { rpm, flow }
    }
}

#[derive(Debug, Error)]
pub enum CalibrationError {
    #[error("calibration file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed calibration data in {path:?}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("calibration table has no rows")]
    Empty,

    #[error("calibration row {row} is not finite (rpm {rpm}, flow {flow})")]
    NonFinite { row: usize, rpm: f64, flow: f64 },
}

/// A non-empty table of calibration rows, expected in ascending order of flow.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationTable {
    points: Vec<CalibrationPoint>,
}

impl CalibrationTable {
    /// Build a table from rows. An empty table, or a row with a NaN or infinite value, is a
    /// configuration error. Rows out of flow order are accepted, with a warning, because the
    /// lookup still clamps and interpolates over them.
    pub fn new(points: Vec<CalibrationPoint>) -> Result<Self, CalibrationError> {
        if points.is_empty() {
            return Err(CalibrationError::Empty);
        }
        for (row, p) in points.iter().enumerate() {
            if !p.rpm.is_finite() || !p.flow.is_finite() {
                return Err(CalibrationError::NonFinite {
                    row,
                    rpm: p.rpm,
                    flow: p.flow,
                });
            }
        }
        if let Some(i) = points.windows(2).position(|w| w[1].flow < w[0].flow) {
            warn!(
                row = i + 1,
                "calibration rows are not in ascending order of flow; interpolation may be wrong"
            );
        }
        Ok(CalibrationTable { points })
    }

    /// The table written when no calibration file exists yet
    pub fn default_auger() -> Self {
        CalibrationTable {
            points: vec![
                CalibrationPoint::new(10.0, 0.00020),
                CalibrationPoint::new(20.0, 0.00036),
                CalibrationPoint::new(30.0, 0.00050),
                CalibrationPoint::new(40.0, 0.00064),
                CalibrationPoint::new(50.0, 0.00078),
            ],
        }
    }

    pub fn points(&self) -> &[CalibrationPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    // Always false: the constructor rejects empty tables
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    fn first(&self) -> &CalibrationPoint {
        &self.points[0]
    }

    fn last(&self) -> &CalibrationPoint {
        &self.points[self.points.len() - 1]
    }

    /// Flow at the first and last rows
    pub fn flow_range(&self) -> (f64, f64) {
        (self.first().flow, self.last().flow)
    }

    /// Auger speed at the first and last rows
    pub fn rpm_range(&self) -> (f64, f64) {
        (self.first().rpm, self.last().rpm)
    }

    /// Auger speed needed for `flow`, by piecewise linear interpolation between rows.
    /// Flows below the first row clamp to its speed, flows above the last row clamp to that
    /// row's speed.
    pub fn rpm_for_flow(&self, flow: f64) -> f64 {
        let first = self.first();
        let last = self.last();
        if flow <= first.flow {
            return first.rpm;
        }
        if flow >= last.flow {
            return last.rpm;
        }

        for pair in self.points.windows(2) {
            let (lo, hi) = (&pair[0], &pair[1]);
            if lo.flow <= flow && flow <= hi.flow {
                // Two rows with the same flow: take the first, rather than dividing by zero
                if hi.flow == lo.flow {
                    return lo.rpm;
                }
                let t = (flow - lo.flow) / (hi.flow - lo.flow);
                return lo.rpm + t * (hi.rpm - lo.rpm);
            }
        }

        // Only reachable for out-of-order tables (or NaN flow)
        last.rpm
    }

    /// Parse a table from CSV with a `RPM,Q_m3_per_min` header row. `path` names the
    /// source in errors.
    pub fn from_reader<R: Read>(reader: R, path: &Path) -> Result<Self, CalibrationError> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let points = rdr
            .deserialize::<CalibrationPoint>()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| CalibrationError::Csv {
                path: path.to_path_buf(),
                source,
            })?;
        Self::new(points)
    }

    pub fn to_writer<W: Write>(&self, writer: W, path: &Path) -> Result<(), CalibrationError> {
        let mut wtr = csv::Writer::from_writer(writer);
        for p in &self.points {
            wtr.serialize(p).map_err(|source| CalibrationError::Csv {
                path: path.to_path_buf(),
                source,
            })?;
        }
        wtr.flush().map_err(|source| CalibrationError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, CalibrationError> {
        let file = File::open(path).map_err(|source| CalibrationError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let table = Self::from_reader(file, path)?;
        info!(rows = table.len(), path = ?path, "loaded calibration points");
        Ok(table)
    }

    pub fn save(&self, path: &Path) -> Result<(), CalibrationError> {
        let file = File::create(path).map_err(|source| CalibrationError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.to_writer(file, path)
    }

    /// Make sure a calibration file exists at `path`, writing the default table if it doesn't.
    /// Returns true if a new file was written.
    pub fn ensure(path: &Path) -> Result<bool, CalibrationError> {
        if path.exists() {
            info!(path = ?path, "found calibration file");
            return Ok(false);
        }
        warn!(path = ?path, "no calibration file found, writing the default table");
        Self::default_auger().save(path)?;
        Ok(true)
    }

    /// `ensure` then `load`
    pub fn load_or_create(path: &Path) -> Result<Self, CalibrationError> {
        Self::ensure(path)?;
        Self::load(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn two_row() -> CalibrationTable {
        CalibrationTable::new(vec![
            CalibrationPoint::new(10.0, 0.00020),
            CalibrationPoint::new(20.0, 0.00036),
        ])
        .unwrap()
    }

    #[test]
    fn test_midpoint_interpolation() {
        let table = two_row();
        assert!((table.rpm_for_flow(0.00028) - 15.0).abs() < EPSILON);
    }

    #[test]
    fn test_clamps_below_and_above() {
        let table = CalibrationTable::default_auger();
        assert_eq!(table.rpm_for_flow(0.0), 10.0);
        assert_eq!(table.rpm_for_flow(-1.0), 10.0);
        assert_eq!(table.rpm_for_flow(0.00020), 10.0);
        assert_eq!(table.rpm_for_flow(0.00078), 50.0);
        assert_eq!(table.rpm_for_flow(1.0), 50.0);
    }

    #[test]
    fn test_exact_rows() {
        let table = CalibrationTable::default_auger();
        for p in table.points() {
            assert!((table.rpm_for_flow(p.flow) - p.rpm).abs() < EPSILON);
        }
    }

    #[test]
    fn test_interpolates_in_upper_interval() {
        let table = CalibrationTable::default_auger();
        // A quarter of the way from 0.00064 to 0.00078
        let rpm = table.rpm_for_flow(0.000675);
        assert!((rpm - 42.5).abs() < EPSILON);
    }

    #[test]
    fn test_single_row_table_always_clamps() {
        let table = CalibrationTable::new(vec![CalibrationPoint::new(25.0, 0.0004)]).unwrap();
        assert_eq!(table.rpm_for_flow(0.0), 25.0);
        assert_eq!(table.rpm_for_flow(0.0004), 25.0);
        assert_eq!(table.rpm_for_flow(0.1), 25.0);
    }

    #[test]
    fn test_duplicate_flow_rows() {
        let table = CalibrationTable::new(vec![
            CalibrationPoint::new(10.0, 0.0001),
            CalibrationPoint::new(20.0, 0.0002),
            CalibrationPoint::new(30.0, 0.0002),
            CalibrationPoint::new(40.0, 0.0003),
        ])
        .unwrap();
        assert!(table.rpm_for_flow(0.0002).is_finite());
        assert!((table.rpm_for_flow(0.00015) - 15.0).abs() < EPSILON);
    }

    #[test]
    fn test_empty_table_rejected() {
        assert!(matches!(
            CalibrationTable::new(vec![]),
            Err(CalibrationError::Empty)
        ));
    }

    #[test]
    fn test_non_finite_rejected() {
        let res = CalibrationTable::new(vec![
            CalibrationPoint::new(10.0, 0.0001),
            CalibrationPoint::new(f64::NAN, 0.0002),
        ]);
        assert!(matches!(res, Err(CalibrationError::NonFinite { row: 1, .. })));
    }

    #[test]
    fn test_out_of_order_table_still_clamps() {
        let table = CalibrationTable::new(vec![
            CalibrationPoint::new(10.0, 0.0002),
            CalibrationPoint::new(30.0, 0.0005),
            CalibrationPoint::new(20.0, 0.0003),
        ])
        .unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.rpm_for_flow(0.0001), 10.0);
        assert_eq!(table.rpm_for_flow(0.0003), 20.0);
        assert_eq!(table.rpm_for_flow(0.001), 20.0);
        // Inside the first pair the lookup still interpolates
        assert!((table.rpm_for_flow(0.00026) - 14.0).abs() < EPSILON);
    }

    #[test]
    fn test_parse_csv() {
        let data = "RPM,Q_m3_per_min\n10,0.00020\n20, 0.00036\n";
        let table =
            CalibrationTable::from_reader(data.as_bytes(), Path::new("test.csv")).unwrap();
        assert_eq!(table, two_row());
    }

    #[test]
    fn test_parse_header_only_is_empty() {
        let data = "RPM,Q_m3_per_min\n";
        assert!(matches!(
            CalibrationTable::from_reader(data.as_bytes(), Path::new("test.csv")),
            Err(CalibrationError::Empty)
        ));
    }

    #[test]
    fn test_parse_malformed_row() {
        let data = "RPM,Q_m3_per_min\n10,lots\n";
        assert!(matches!(
            CalibrationTable::from_reader(data.as_bytes(), Path::new("test.csv")),
            Err(CalibrationError::Csv { .. })
        ));
    }

    #[test]
    fn test_writes_header() {
        let mut buf = Vec::new();
        CalibrationTable::default_auger()
            .to_writer(&mut buf, Path::new("buf.csv"))
            .unwrap();
        let s = String::from_utf8(buf).unwrap();
        assert!(s.starts_with("RPM,Q_m3_per_min\n"));
        assert_eq!(s.lines().count(), 6);
    }

    #[test]
    fn test_ranges() {
        let table = CalibrationTable::default_auger();
        assert_eq!(table.flow_range(), (0.00020, 0.00078));
        assert_eq!(table.rpm_range(), (10.0, 50.0));
        assert_eq!(table.len(), 5);
        assert!(!table.is_empty());
    }
}
