//! Page selection parsing ("1", "2-5", "1,3,7-", ...).

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Set of 1-based page numbers a job should run OCR on.
///
/// Open-ended ranges (`"7-"`) extend to the last page of the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PageSelection {
    ranges: Vec<(u32, Option<u32>)>,
}

impl PageSelection {
    pub fn parse(spec: &str) -> Result<Self, ConfigError> {
        let invalid = |msg: &str| ConfigError::InvalidPageRange(spec.to_string(), msg.to_string());

        let mut ranges = Vec::new();
        for part in spec.split(',') {
            let part = part.trim();
            if part.is_empty() {
                return Err(invalid("empty range"));
            }
            let range = match part.split_once('-') {
                Some((start, end)) => {
                    let start: u32 = start
                        .trim()
                        .parse()
                        .map_err(|_| invalid("range start is not a number"))?;
                    let end = match end.trim() {
                        "" => None,
                        e => Some(e.parse::<u32>().map_err(|_| invalid("range end is not a number"))?),
                    };
                    (start, end)
                }
                None => {
                    let page: u32 = part.parse().map_err(|_| invalid("page is not a number"))?;
                    (page, Some(page))
                }
            };
            if range.0 == 0 {
                return Err(invalid("pages are numbered from 1"));
            }
            if matches!(range.1, Some(end) if end < range.0) {
                return Err(invalid("range end precedes its start"));
            }
            ranges.push(range);
        }
        Ok(Self { ranges })
    }

    pub fn contains(&self, page: u32) -> bool {
        self.ranges
            .iter()
            .any(|(start, end)| page >= *start && end.map_or(true, |e| page <= e))
    }

    /// Fail when no selected page exists in a `total_pages` document.
    pub fn check_against(&self, total_pages: u32) -> Result<(), ConfigError> {
        if (1..=total_pages).any(|p| self.contains(p)) {
            Ok(())
        } else {
            Err(ConfigError::InvalidPageRange(
                self.to_string(),
                format!("document has only {} page(s)", total_pages),
            ))
        }
    }
}

impl std::fmt::Display for PageSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .ranges
            .iter()
            .map(|(start, end)| match end {
                Some(e) if e == start => start.to_string(),
                Some(e) => format!("{}-{}", start, e),
                None => format!("{}-", start),
            })
            .collect();
        write!(f, "{}", parts.join(","))
    }
}

impl TryFrom<String> for PageSelection {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PageSelection> for String {
    fn from(value: PageSelection) -> Self {
        value.to_string()
    }
}
