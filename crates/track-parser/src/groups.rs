//! Group-by-marker splitting of a track file.
//!
//! The tracker writes one group per storm: a marker line beginning with `*`
//! followed by the storm's body lines. [`TrackGroups`] streams a reader and
//! yields one [`TrackGroup`] per marker without holding more than the
//! current group in memory.

use std::io::BufRead;

use crate::error::{Result, TrackError};

/// One numbered line of a track file.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackLine {
    /// One-based line number in the file.
    pub number: usize,
    pub text: String,
}

/// A marker line plus every body line up to the next marker.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackGroup {
    pub marker: TrackLine,
    pub lines: Vec<TrackLine>,
}

impl TrackGroup {
    fn new(marker: TrackLine) -> Self {
        Self {
            marker,
            lines: Vec::new(),
        }
    }

    /// The storm line, first line after the marker.
    pub fn storm_line(&self) -> Option<&TrackLine> {
        self.lines.first()
    }

    /// Per-time-step position lines.
    pub fn position_lines(&self) -> &[TrackLine] {
        self.lines.get(1..).unwrap_or(&[])
    }
}

/// True for lines that open a new group.
pub fn is_marker(line: &str) -> bool {
    line.trim_start().starts_with('*')
}

enum State {
    AwaitingHeader,
    InGroup(TrackGroup),
    Done,
}

/// Streaming iterator over the groups of a track file.
///
/// Consecutive marker lines collapse into the first one, blank lines are
/// skipped, and a marker with no body at the end of the file is dropped.
/// Non-blank content before the first marker is an error, after which the
/// iterator is exhausted.
pub struct TrackGroups<R> {
    reader: R,
    line_no: usize,
    buf: String,
    state: State,
}

impl<R: BufRead> TrackGroups<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_no: 0,
            buf: String::new(),
            state: State::AwaitingHeader,
        }
    }

    fn read_line(&mut self) -> Result<Option<TrackLine>> {
        self.buf.clear();
        if self.reader.read_line(&mut self.buf)? == 0 {
            return Ok(None);
        }
        self.line_no += 1;
        Ok(Some(TrackLine {
            number: self.line_no,
            text: self.buf.trim_end_matches(['\n', '\r']).to_string(),
        }))
    }
}

impl<R: BufRead> Iterator for TrackGroups<R> {
    type Item = Result<TrackGroup>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if matches!(self.state, State::Done) {
                return None;
            }

            let line = match self.read_line() {
                Ok(line) => line,
                Err(e) => {
                    self.state = State::Done;
                    return Some(Err(e));
                }
            };

            let state = std::mem::replace(&mut self.state, State::Done);
            match (state, line) {
                (State::InGroup(group), None) => {
                    return (!group.lines.is_empty()).then_some(Ok(group));
                }
                (_, None) => return None,
                (state, Some(line)) if line.text.trim().is_empty() => self.state = state,
                (State::AwaitingHeader, Some(line)) => {
                    if !is_marker(&line.text) {
                        return Some(Err(TrackError::malformed(
                            line.number,
                            "expected a '*' marker before storm records",
                        )));
                    }
                    self.state = State::InGroup(TrackGroup::new(line));
                }
                (State::InGroup(mut group), Some(line)) => {
                    if !is_marker(&line.text) {
                        group.lines.push(line);
                        self.state = State::InGroup(group);
                    } else if group.lines.is_empty() {
                        self.state = State::InGroup(group);
                    } else {
                        self.state = State::InGroup(TrackGroup::new(line));
                        return Some(Ok(group));
                    }
                }
                (State::Done, Some(_)) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn groups(text: &str) -> Vec<Result<TrackGroup>> {
        TrackGroups::new(Cursor::new(text.to_string())).collect()
    }

    fn bodies(text: &str) -> Vec<Vec<String>> {
        groups(text)
            .into_iter()
            .map(|g| g.unwrap().lines.into_iter().map(|l| l.text).collect())
            .collect()
    }

    #[test]
    fn test_splits_on_markers() {
        let text = "****\n1 0 40\na\nb\n  ***\n2 0 12\nc\n";
        assert_eq!(
            bodies(text),
            vec![
                vec!["1 0 40".to_string(), "a".into(), "b".into()],
                vec!["2 0 12".to_string(), "c".into()],
            ]
        );
    }

    #[test]
    fn test_line_numbers_and_accessors() {
        let all = groups("*\n7 0 40\npos\n");
        let group = all[0].as_ref().unwrap();
        assert_eq!(group.marker.number, 1);
        assert_eq!(group.storm_line().unwrap().number, 2);
        assert_eq!(group.position_lines().len(), 1);
        assert_eq!(group.position_lines()[0].number, 3);
    }

    #[test]
    fn test_consecutive_markers_collapse() {
        assert_eq!(bodies("*\n**\n1 0 40\n"), vec![vec!["1 0 40".to_string()]]);
    }

    #[test]
    fn test_trailing_marker_and_blank_lines() {
        assert_eq!(
            bodies("\n*\n1 0 40\n\nx\n*\n\n"),
            vec![vec!["1 0 40".to_string(), "x".into()]]
        );
        assert!(groups("").is_empty());
        assert!(groups("*\n").is_empty());
    }

    #[test]
    fn test_content_before_marker_is_malformed() {
        let all = groups("1 0 40\n*\n2 0 40\n");
        assert_eq!(all.len(), 1);
        assert!(matches!(
            all[0],
            Err(TrackError::MalformedTrack { line: 1, .. })
        ));
    }

    #[test]
    fn test_crlf_line_endings() {
        assert_eq!(bodies("*\r\n1 0 40\r\n"), vec![vec!["1 0 40".to_string()]]);
    }
}
