use std::fmt;
use chrono::{DateTime, Local};
use super::target::Sample;

/// One report line: every target's last known state at the end of a round.
#[derive(Clone, Debug)]
pub struct Round {
    pub seq:     u64,
    pub time:    DateTime<Local>,
    pub columns: Vec<Column>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Column {
    pub host:   String,
    pub sample: Sample,
}

impl Round {
    pub fn rtts(&self) -> Vec<u64> {
        self.columns.iter().map(|c| c.sample.rtt).collect()
    }
}

impl Column {
    pub fn new(host: &str) -> Self {
        Self {
            host:   host.to_owned(),
            sample: Sample::default(),
        }
    }
}

impl fmt::Display for Round {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t", self.time.format("%H:%M:%S"))?;
        for column in &self.columns {
            write!(f, "{:>10}ms\t", column.sample.rtt)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use super::*;

    #[test]
    fn line_is_time_then_aligned_columns() {
        let time = Local.with_ymd_and_hms(2022, 3, 4, 9, 5, 7).unwrap();

        let mut slow = Column::new("192.0.2.1");
        slow.sample.rtt = 1234;

        let round = Round {
            seq:     1,
            time:    time,
            columns: vec![Column::new("192.0.2.2"), slow],
        };

        let expect = format!("09:05:07\t{:>10}ms\t{:>10}ms\t", 0, 1234);
        assert_eq!(round.to_string(), expect);
        assert_eq!(round.to_string(), "09:05:07\t         0ms\t      1234ms\t");
    }
}
