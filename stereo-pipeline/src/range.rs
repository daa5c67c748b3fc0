use crate::error::ConfigError;
use std::fmt;
use std::str::FromStr;

/// An arithmetic progression of frame indices.
///
/// The textual form is `start:end` or `start:step:end`. Empty tokens keep the
/// defaults `start = 0`, `step = 1` and `end = -1`; any negative end means the
/// range is unbounded and only ends when the source runs out of frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameRange {
    pub start: usize,
    pub step: usize,
    /// Last frame to process (inclusive), or `None` when unbounded.
    pub end: Option<usize>,
}

impl FrameRange {
    /// Creates a range, rejecting a zero step.
    pub fn new(start: usize, step: usize, end: Option<usize>) -> Result<Self, ConfigError> {
        if step == 0 {
            return Err(ConfigError::InvalidFrameStep(0));
        }
        Ok(Self { start, step, end })
    }

    /// The whole source, frame by frame.
    pub fn unbounded() -> Self {
        Self {
            start: 0,
            step: 1,
            end: None,
        }
    }

    pub fn is_bounded(&self) -> bool {
        self.end.is_some()
    }

    /// The end as it appears in templates and logs: `-1` when unbounded.
    pub fn end_value(&self) -> i64 {
        self.end.map_or(-1, |end| end as i64)
    }

    /// Lazy sequence of frame indices in this range.
    pub fn iter(&self) -> FrameRangeIter {
        FrameRangeIter {
            next: Some(self.start),
            step: self.step,
            end: self.end,
        }
    }
}

impl Default for FrameRange {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl IntoIterator for &FrameRange {
    type Item = usize;
    type IntoIter = FrameRangeIter;

    fn into_iter(self) -> FrameRangeIter {
        self.iter()
    }
}

impl fmt::Display for FrameRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.start, self.step, self.end_value())
    }
}

fn parse_token(token: &str, default: i64) -> Result<i64, ConfigError> {
    let token = token.trim();
    if token.is_empty() {
        return Ok(default);
    }
    token
        .parse()
        .map_err(|_| ConfigError::InvalidRangeToken(token.to_owned()))
}

impl FromStr for FrameRange {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, ConfigError> {
        let tokens: Vec<&str> = s.split(':').collect();
        let (start, step, end) = match tokens[..] {
            [start, end] => (parse_token(start, 0)?, 1, parse_token(end, -1)?),
            [start, step, end] => (
                parse_token(start, 0)?,
                parse_token(step, 1)?,
                parse_token(end, -1)?,
            ),
            _ => return Err(ConfigError::InvalidRange(s.to_owned())),
        };
        if start < 0 {
            return Err(ConfigError::NegativeRangeStart(start));
        }
        if step < 1 {
            return Err(ConfigError::InvalidFrameStep(step));
        }
        Ok(Self {
            start: start as usize,
            step: step as usize,
            end: (end >= 0).then(|| end as usize),
        })
    }
}

/// Iterator over the frame indices of a [`FrameRange`].
#[derive(Debug, Clone)]
pub struct FrameRangeIter {
    next: Option<usize>,
    step: usize,
    end: Option<usize>,
}

impl Iterator for FrameRangeIter {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let current = self.next?;
        if self.end.map_or(false, |end| current > end) {
            self.next = None;
            return None;
        }
        self.next = current.checked_add(self.step);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::TestResult;
    use quickcheck_macros::quickcheck;

    fn parse(s: &str) -> Result<FrameRange, ConfigError> {
        s.parse()
    }

    #[test]
    fn two_tokens_are_start_and_end() {
        assert_eq!(
            parse("5:10").unwrap(),
            FrameRange {
                start: 5,
                step: 1,
                end: Some(10)
            }
        );
    }

    #[test]
    fn empty_tokens_keep_defaults() {
        assert_eq!(
            parse(":2:").unwrap(),
            FrameRange {
                start: 0,
                step: 2,
                end: None
            }
        );
        assert_eq!(parse(":").unwrap(), FrameRange::unbounded());
        assert_eq!(parse("0:1:-1").unwrap(), FrameRange::unbounded());
        assert_eq!(parse("3:-7").unwrap().end, None);
    }

    #[test]
    fn rejects_bad_tokens() {
        assert!(matches!(parse("a:2:10"), Err(ConfigError::InvalidRangeToken(t)) if t == "a"));
        assert!(matches!(parse("1:2.5"), Err(ConfigError::InvalidRangeToken(_))));
        assert!(matches!(parse("10"), Err(ConfigError::InvalidRange(_))));
        assert!(matches!(parse("1:2:3:4"), Err(ConfigError::InvalidRange(_))));
        assert!(matches!(parse("0:0:10"), Err(ConfigError::InvalidFrameStep(0))));
        assert!(matches!(parse("-2:10"), Err(ConfigError::NegativeRangeStart(-2))));
    }

    #[test]
    fn bounded_iteration() {
        let frames: Vec<usize> = parse("2:3:11").unwrap().iter().collect();
        assert_eq!(frames, [2, 5, 8, 11]);
        let frames: Vec<usize> = parse("4:3").unwrap().iter().collect();
        assert!(frames.is_empty());
    }

    #[test]
    fn unbounded_iteration_continues() {
        let frames: Vec<usize> = parse("1:4:").unwrap().iter().take(4).collect();
        assert_eq!(frames, [1, 5, 9, 13]);
    }

    #[test]
    fn display_round_trips() {
        for text in ["0:1:-1", "5:2:20"] {
            assert_eq!(parse(text).unwrap().to_string(), text);
        }
    }

    #[quickcheck]
    fn bounded_length(start: u16, step: u8, end: u16) -> TestResult {
        if step == 0 || end < start {
            return TestResult::discard();
        }
        let range = FrameRange::new(start.into(), step.into(), Some(end.into())).unwrap();
        let frames: Vec<usize> = range.iter().collect();
        let expected_len = (usize::from(end) - usize::from(start)) / usize::from(step) + 1;
        TestResult::from_bool(
            frames.len() == expected_len
                && frames.first() == Some(&usize::from(start))
                && frames.windows(2).all(|w| w[1] - w[0] == usize::from(step))
                && frames.iter().all(|&f| f <= usize::from(end)),
        )
    }
}
