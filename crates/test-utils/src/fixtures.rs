//! Common fixtures in the object tracker's output formats.
//!
//! A track file holds one group per storm: a marker line starting with `*`,
//! a storm line `id ? lifetime ...`, then one line per tracked time step with
//! the time index in column 1 and the one-based grid position in columns 14
//! (x) and 15 (y).

use std::fmt::Write as _;
use std::path::Path;

/// Marker line written by the tracker before every storm.
pub const TRACK_MARKER: &str = "****************************************";

/// One tracked position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackPoint {
    pub t: usize,
    /// One-based fractional column.
    pub x: f64,
    /// One-based fractional row.
    pub y: f64,
}

/// One storm group.
#[derive(Debug, Clone, PartialEq)]
pub struct StormTrack {
    pub id: u32,
    pub lifetime: u32,
    pub points: Vec<TrackPoint>,
}

impl StormTrack {
    pub fn new(id: u32, lifetime: u32) -> Self {
        Self {
            id,
            lifetime,
            points: Vec::new(),
        }
    }

    /// Add a position given as one-based fractional indices.
    pub fn at(mut self, t: usize, x: f64, y: f64) -> Self {
        self.points.push(TrackPoint { t, x, y });
        self
    }

    /// Add a position at zero-based cell `(j, i)`.
    pub fn at_cell(self, t: usize, j: usize, i: usize) -> Self {
        self.at(t, i as f64 + 1.0, j as f64 + 1.0)
    }
}

/// Storm line: `id ? lifetime`.
pub fn storm_line(id: u32, lifetime: u32) -> String {
    format!("{} 1 {}", id, lifetime)
}

/// Position line with `t` in column 1, `x` in column 14 and `y` in column 15.
pub fn position_line(id: u32, point: &TrackPoint) -> String {
    let mut line = format!("{:>6} {:>6}", id, point.t);
    for column in 2..14 {
        let _ = write!(line, " {:>8.2}", column as f64 * 0.5);
    }
    let _ = write!(line, " {:>8.2} {:>8.2} {:>8.2}", point.x, point.y, 0.0);
    line
}

/// Render a whole track file.
pub fn track_file(storms: &[StormTrack]) -> String {
    let mut text = String::new();
    for storm in storms {
        text.push_str(TRACK_MARKER);
        text.push('\n');
        text.push_str(&storm_line(storm.id, storm.lifetime));
        text.push('\n');
        for point in &storm.points {
            text.push_str(&position_line(storm.id, point));
            text.push('\n');
        }
    }
    text
}

/// Write a raw mask in the tracker's layout (native-endian `f32`).
pub fn write_raw_mask(path: &Path, values: &[f32]) {
    let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_ne_bytes()).collect();
    std::fs::write(path, bytes).expect("write raw mask");
}

/// A raw mask of `len` zeros with `id` at each of `cells`.
pub fn raw_mask(len: usize, cells: &[(usize, u32)]) -> Vec<f32> {
    let mut mask = vec![0.0f32; len];
    for &(index, id) in cells {
        mask[index] = id as f32;
    }
    mask
}

/// Fortran parameter block as shipped with the tracker.
pub const TRACKER_PARAMETERS: &str = "\
MODULE irt_parameters

INTEGER, PARAMETER    :: domainsize_x = 288
INTEGER, PARAMETER    :: domainsize_y = 192
INTEGER, PARAMETER    :: time_steps = 8760
REAL, PARAMETER       :: lat_first = -90.0000000
REAL, PARAMETER       :: lat_inc = 0.942408377
REAL, PARAMETER       :: lon_inc = 1.2500000
LOGICAL, PARAMETER    :: lpole = .TRUE.
REAL, PARAMETER       :: threshold = 0.00005

END MODULE irt_parameters
";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_line_columns() {
        let line = position_line(5, &TrackPoint { t: 3, x: 12.5, y: 7.25 });
        let tokens: Vec<&str> = line.split_whitespace().collect();
        assert_eq!(tokens[0], "5");
        assert_eq!(tokens[1], "3");
        assert_eq!(tokens[14], "12.50");
        assert_eq!(tokens[15], "7.25");
    }

    #[test]
    fn test_track_file_layout() {
        let text = track_file(&[StormTrack::new(5, 40).at_cell(0, 2, 3)]);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with('*'));
        assert_eq!(lines[1], "5 1 40");
    }
}
