//! CSV export of summary tables and single trajectories.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use crate::types::{SUMMARY_HEADER, SummaryRecord, TrajectorySeries};
use crate::{ResultsError, ResultsResult};

const TRAJECTORY_HEADER: [&str; 4] = [
    "time_s",
    "position_m",
    "velocity_mps",
    "acceleration_mps2",
];

/// Write the summary table. The header is always written, even for an empty table.
pub fn write_summary<W: Write>(writer: W, records: &[SummaryRecord]) -> ResultsResult<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    writer.write_record(SUMMARY_HEADER)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_summary_csv(path: &Path, records: &[SummaryRecord]) -> ResultsResult<()> {
    let file = File::create(path)?;
    write_summary(file, records)
}

pub fn read_summary<R: Read>(reader: R) -> ResultsResult<Vec<SummaryRecord>> {
    let mut reader = csv::Reader::from_reader(reader);
    let headers = reader.headers()?;
    if headers.iter().ne(SUMMARY_HEADER) {
        let found = headers.iter().collect::<Vec<_>>().join(",");
        return Err(ResultsError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("unexpected summary header: {found}"),
        )));
    }
    let mut records = Vec::new();
    for row in reader.deserialize() {
        records.push(row?);
    }
    Ok(records)
}

pub fn read_summary_csv(path: &Path) -> ResultsResult<Vec<SummaryRecord>> {
    read_summary(File::open(path)?)
}

pub fn write_trajectory<W: Write>(writer: W, series: &TrajectorySeries) -> ResultsResult<()> {
    if series.is_empty() {
        return Err(ResultsError::Empty {
            what: format!("trajectory {}", series.label()),
        });
    }
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(TRAJECTORY_HEADER)?;
    for i in 0..series.len() {
        writer.write_record([
            series.t[i].to_string(),
            series.position[i].to_string(),
            series.velocity[i].to_string(),
            series.acceleration[i].to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_trajectory_csv(path: &Path, series: &TrajectorySeries) -> ResultsResult<()> {
    let file = File::create(path)?;
    write_trajectory(file, series)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(stiffness: f64) -> SummaryRecord {
        SummaryRecord {
            loss_factor: 0.15,
            stiffness,
            max_acc: 12.5,
            max_acc_time: 4.8,
            max_vel: 21.25,
            max_vel_time: 2.4,
            min_pos: 43.0,
            min_pos_time: 4.82,
        }
    }

    #[test]
    fn summary_header_and_rows() {
        let mut buf = Vec::new();
        write_summary(&mut buf, &[record(40.0), record(73.3)]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(
            lines[0],
            "eta,K,max_acc,max_acc_time,max_vel,max_vel_time,min_pos,min_pos_time"
        );
        assert_eq!(lines[1], "0.15,40.0,12.5,4.8,21.25,2.4,43.0,4.82");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn empty_summary_still_has_header() {
        let mut buf = Vec::new();
        write_summary(&mut buf, &[]).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap().lines().count(), 1);
    }

    #[test]
    fn summary_reads_back() {
        let records = vec![record(40.0), record(240.0)];
        let mut buf = Vec::new();
        write_summary(&mut buf, &records).unwrap();
        assert_eq!(read_summary(buf.as_slice()).unwrap(), records);
    }

    #[test]
    fn foreign_header_is_rejected() {
        let text = "K,eta\n40,0.15\n";
        assert!(read_summary(text.as_bytes()).is_err());
    }

    #[test]
    fn trajectory_columns() {
        let series = TrajectorySeries {
            stiffness: 40.0,
            loss_factor: 0.15,
            t: vec![0.0, 0.5],
            position: vec![100.0, 98.5],
            velocity: vec![0.0, -4.9],
            acceleration: vec![-9.8, -9.8],
        };
        let mut buf = Vec::new();
        write_trajectory(&mut buf, &series).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "time_s,position_m,velocity_mps,acceleration_mps2");
        assert_eq!(lines[2], "0.5,98.5,-4.9,-9.8");
    }

    #[test]
    fn empty_trajectory_is_an_error() {
        let series = TrajectorySeries {
            stiffness: 40.0,
            loss_factor: 0.15,
            t: vec![],
            position: vec![],
            velocity: vec![],
            acceleration: vec![],
        };
        let err = write_trajectory(Vec::new(), &series).unwrap_err();
        assert!(matches!(err, ResultsError::Empty { .. }));
    }
}
