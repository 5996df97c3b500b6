//! Name/id correlation for application and dashboard listings.
//!
//! Upstream listings reach us as a flat line stream: for every object
//! whose `name` matches the filter, the name on one line followed by the
//! numeric id. [`parse_entities`] folds that stream back into ordered
//! `(name, id)` pairs, rejoining names that arrive split over several
//! lines. A name made only of digits is read as an id; that limitation
//! comes with the stream shape and is not papered over.

use regex::Regex;
use serde_json::Value;
use thiserror::Error;
use tracing::trace;

/// One named application or dashboard with its numeric id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityInfo {
    pub name: String,
    pub id: u64,
}

impl EntityInfo {
    pub fn new(name: impl Into<String>, id: u64) -> Self {
        Self {
            name: name.into(),
            id,
        }
    }
}

/// Ordered listing of [`EntityInfo`], as matched by a name filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityList(Vec<EntityInfo>);

impl EntityList {
    pub fn iter(&self) -> std::slice::Iter<'_, EntityInfo> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Exact, case-sensitive name lookup (first match wins).
    pub fn find_by_name(&self, name: &str) -> Option<&EntityInfo> {
        self.0.iter().find(|e| e.name == name)
    }

    /// `name1=id1,name2=id2,...`
    pub fn to_canonical(&self) -> String {
        self.0
            .iter()
            .map(|e| format!("{}={}", e.name, e.id))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Inverse of [`to_canonical`](Self::to_canonical). Pairs split on `,`,
    /// then on the first `=`; names containing either are unsupported.
    pub fn from_canonical(s: &str) -> Result<Self, ParseError> {
        s.split(',')
            .filter(|pair| !pair.is_empty())
            .map(|pair| {
                let (name, id) = pair
                    .split_once('=')
                    .ok_or_else(|| ParseError::MalformedPair { pair: pair.to_owned() })?;
                let id = id
                    .parse()
                    .map_err(|_| ParseError::MalformedPair { pair: pair.to_owned() })?;
                Ok(EntityInfo::new(name, id))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}

impl From<Vec<EntityInfo>> for EntityList {
    fn from(v: Vec<EntityInfo>) -> Self {
        Self(v)
    }
}

impl<'a> IntoIterator for &'a EntityList {
    type Item = &'a EntityInfo;
    type IntoIter = std::slice::Iter<'a, EntityInfo>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("id {id} on line {line} has no name before it")]
    OrphanId { id: u64, line: usize },

    #[error("name '{name}' has no id after it")]
    DanglingName { name: String },

    #[error("id on line {line} does not fit in 64 bits")]
    IdOverflow { line: usize },

    #[error("listing transcript does not end with an HTTP status")]
    MissingStatus,

    #[error("controller refused the listing (HTTP {status})")]
    Rejected { status: u16 },

    #[error("malformed entity pair '{pair}'")]
    MalformedPair { pair: String },
}

/// Flatten JSON listing rows into the name/id line stream.
///
/// Each name is one line with runs of whitespace collapsed, so numeric
/// words inside a name ("MyApp 2") never look like ids. Rows whose `name`
/// does not match `filter`, or that lack a usable name or id, are dropped.
pub fn flatten_rows(rows: &[Value], filter: &Regex) -> Vec<String> {
    let mut lines = Vec::new();
    for row in rows {
        let Some(name) = row.get("name").and_then(Value::as_str) else {
            continue;
        };
        if name.trim().is_empty() || !filter.is_match(name) {
            continue;
        }
        let id = match row.get("id") {
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::String(s)) => s.clone(),
            _ => continue,
        };
        lines.push(name.split_whitespace().collect::<Vec<_>>().join(" "));
        lines.push(id);
    }
    lines
}

/// A line is an id line iff it is one or more ASCII digits.
fn is_id_line(line: &str) -> bool {
    !line.is_empty() && line.bytes().all(|b| b.is_ascii_digit())
}

/// Fold a name/id token stream into ordered `(name, id)` pairs.
///
/// Consecutive non-id lines are joined with a single space into one name;
/// the next id line closes it. With `authenticated` set the stream is a
/// controller transcript whose final line is the HTTP status code: it is
/// stripped first, and a non-2xx status fails with [`ParseError::Rejected`].
pub fn parse_entities<S: AsRef<str>>(
    lines: &[S],
    authenticated: bool,
) -> Result<EntityList, ParseError> {
    let mut lines = lines;
    if authenticated {
        let (status, rest) = lines.split_last().ok_or(ParseError::MissingStatus)?;
        let status: u16 = status
            .as_ref()
            .trim()
            .parse()
            .map_err(|_| ParseError::MissingStatus)?;
        if !(200..300).contains(&status) {
            return Err(ParseError::Rejected { status });
        }
        lines = rest;
    }

    let mut entities = Vec::new();
    let mut name: Option<String> = None;

    for (idx, raw) in lines.iter().enumerate() {
        let line = raw.as_ref().trim();
        if line.is_empty() {
            continue;
        }

        if is_id_line(line) {
            let id = line
                .parse()
                .map_err(|_| ParseError::IdOverflow { line: idx + 1 })?;
            let name = name.take().ok_or(ParseError::OrphanId { id, line: idx + 1 })?;
            trace!(%name, id, "entity");
            entities.push(EntityInfo { name, id });
        } else {
            match name.as_mut() {
                Some(current) => {
                    current.push(' ');
                    current.push_str(line);
                }
                None => name = Some(line.to_owned()),
            }
        }
    }

    if let Some(name) = name {
        return Err(ParseError::DanglingName { name });
    }
    Ok(EntityList(entities))
}
