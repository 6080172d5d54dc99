use crate::error::ColumnUnresolvable;

/// How a candidate matched an available column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// Whole name, ignoring case.
    Exact,
    /// Candidate text found inside the column name, ignoring case.
    Substring,
}

/// A resolved column: its position in the schema and its actual name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMatch {
    pub index: usize,
    pub name: String,
    pub kind: MatchKind,
}

/// Resolve the first column matching any of `candidates`.
///
/// Rules, in order:
/// 1. exact case-insensitive match, walking candidates in order;
/// 2. substring case-insensitive match, walking candidates in order and,
///    for each, columns in schema order.
///
/// Ties are not disambiguated: the first hit in that iteration order wins.
pub fn resolve_column(
    columns: &[String],
    candidates: &[&str],
) -> Result<ColumnMatch, ColumnUnresolvable> {
    let lowered: Vec<String> = columns.iter().map(|c| c.to_lowercase()).collect();

    for cand in candidates {
        let key = cand.to_lowercase();
        if let Some(index) = lowered.iter().position(|c| *c == key) {
            return Ok(ColumnMatch {
                index,
                name: columns[index].clone(),
                kind: MatchKind::Exact,
            });
        }
    }

    for cand in candidates {
        let key = cand.to_lowercase();
        if let Some(index) = lowered.iter().position(|c| c.contains(&key)) {
            return Ok(ColumnMatch {
                index,
                name: columns[index].clone(),
                kind: MatchKind::Substring,
            });
        }
    }

    Err(ColumnUnresolvable {
        sought: candidates.iter().map(|c| c.to_string()).collect(),
        available: columns.to_vec(),
    })
}

/// [`resolve_column`] for callers that fall back to a default: the miss is
/// logged and flattened to `None`.
pub fn find_column(columns: &[String], candidates: &[&str]) -> Option<ColumnMatch> {
    match resolve_column(columns, candidates) {
        Ok(found) => Some(found),
        Err(miss) => {
            log::debug!("{miss}");
            None
        }
    }
}
