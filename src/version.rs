//! Release version comparison
//!
//! Upstream version strings are free-form ("1.2.3", "3.20.1-rc2", "2015a"),
//! so they are compared segment by segment instead of as semver.

use std::cmp::Ordering;

/// Compare two version strings.
///
/// Returns `None` when the pair cannot be compared: either side is missing,
/// empty, or contains whitespace or control characters.
///
/// Segments are separated by `.` and a missing segment counts as `0`. Inside
/// a segment, runs of digits compare numerically and other runs compare
/// lexically; a digit run outranks a letter run in the same position.
pub fn vercmp(a: Option<&str>, b: Option<&str>) -> Option<Ordering> {
    let (a, b) = (a?, b?);
    if !is_comparable(a) || !is_comparable(b) {
        return None;
    }
    if a == b {
        return Some(Ordering::Equal);
    }

    let segments_a: Vec<&str> = a.split('.').collect();
    let segments_b: Vec<&str> = b.split('.').collect();
    let longest = segments_a.len().max(segments_b.len());

    for i in 0..longest {
        let seg_a = segments_a.get(i).copied().unwrap_or("0");
        let seg_b = segments_b.get(i).copied().unwrap_or("0");
        match compare_segment(seg_a, seg_b) {
            Ordering::Equal => continue,
            ord => return Some(ord),
        }
    }
    Some(Ordering::Equal)
}

fn is_comparable(version: &str) -> bool {
    !version.is_empty()
        && !version
            .chars()
            .any(|c| c.is_whitespace() || c.is_control())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Run<'a> {
    Digits(&'a str),
    Text(&'a str),
}

/// Splits a segment into alternating digit and non-digit runs
struct Runs<'a> {
    rest: &'a str,
}

impl<'a> Iterator for Runs<'a> {
    type Item = Run<'a>;

    fn next(&mut self) -> Option<Run<'a>> {
        let first = self.rest.chars().next()?;
        let digits = first.is_ascii_digit();
        let end = self
            .rest
            .find(|c: char| c.is_ascii_digit() != digits)
            .unwrap_or(self.rest.len());
        let (run, rest) = self.rest.split_at(end);
        self.rest = rest;
        Some(if digits { Run::Digits(run) } else { Run::Text(run) })
    }
}

fn compare_segment(a: &str, b: &str) -> Ordering {
    let mut runs_a = Runs { rest: a };
    let mut runs_b = Runs { rest: b };
    loop {
        match (runs_a.next(), runs_b.next()) {
            (None, None) => return Ordering::Equal,
            (Some(_), None) => return Ordering::Greater,
            (None, Some(_)) => return Ordering::Less,
            (Some(x), Some(y)) => match compare_run(x, y) {
                Ordering::Equal => continue,
                ord => return ord,
            },
        }
    }
}

fn compare_run(a: Run<'_>, b: Run<'_>) -> Ordering {
    match (a, b) {
        (Run::Digits(x), Run::Digits(y)) => compare_numeric(x, y),
        (Run::Text(x), Run::Text(y)) => x.cmp(y),
        (Run::Digits(_), Run::Text(_)) => Ordering::Greater,
        (Run::Text(_), Run::Digits(_)) => Ordering::Less,
    }
}

/// Numeric comparison of arbitrary-length ASCII digit strings
fn compare_numeric(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}
