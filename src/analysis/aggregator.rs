//! Row derivation, grouping and ordering.
//!
//! This module turns surviving occurrences into export rows and provides
//! the ordering shared by freshly built rows and rows reloaded from disk.

use crate::analysis::fingerprint::short_hash;
use crate::analysis::resolver::PathResolver;
use crate::models::{ExportRow, LocationGroup, Occurrence, UNSET_LINE};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// Anything that can be placed in the module/file/start ordering.
pub trait SortKey {
    fn module(&self) -> &str;
    fn file(&self) -> &str;
    fn start(&self) -> i64;
}

impl SortKey for ExportRow {
    fn module(&self) -> &str {
        &self.module
    }

    fn file(&self) -> &str {
        &self.file
    }

    fn start(&self) -> i64 {
        self.start
    }
}

/// Compare by module, then file (both ordinal), then start line.
pub fn compare_rows<T: SortKey>(a: &T, b: &T) -> Ordering {
    a.module()
        .cmp(b.module())
        .then_with(|| a.file().cmp(b.file()))
        .then_with(|| a.start().cmp(&b.start()))
}

/// Stable sort; rows equal on all keys keep their input order.
pub fn sort_rows<T: SortKey>(rows: &mut [T]) {
    rows.sort_by(compare_rows);
}

/// Group the locations of an occurrence by path, in first-seen order.
pub fn group_locations(occurrence: &Occurrence) -> Vec<LocationGroup> {
    let mut groups: Vec<LocationGroup> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for fs in &occurrence.file_starts {
        match index.get(fs.file_path.as_str()) {
            Some(&i) => groups[i].lines.push(fs.line_number),
            None => {
                index.insert(&fs.file_path, groups.len());
                groups.push(LocationGroup {
                    file_path: fs.file_path.clone(),
                    lines: vec![fs.line_number],
                });
            }
        }
    }

    groups
}

/// Inputs needed to derive a row from an occurrence.
#[derive(Debug, Clone)]
pub struct RowBuilder {
    /// Keyword selecting the location a row is attributed to.
    primary: String,
    resolver: PathResolver,
}

impl RowBuilder {
    pub fn new(primary: Option<&str>, resolver: PathResolver) -> Self {
        Self {
            primary: primary.unwrap_or_default().to_string(),
            resolver,
        }
    }

    /// Derive the export row for one occurrence.
    pub fn build(&self, occurrence: &Occurrence) -> ExportRow {
        let (start, resolved) = match occurrence.first_match(&self.primary) {
            Some(fs) => (
                i64::from(fs.line_number),
                self.resolver.resolve(&fs.file_path),
            ),
            None => (UNSET_LINE, Default::default()),
        };

        ExportRow {
            lines: occurrence.line_count,
            tokens: occurrence.token_count,
            occurrence_count: occurrence.occurrence_count(),
            module: resolved.module,
            file: resolved.file,
            start,
            end: start + i64::from(occurrence.line_count),
            locations: group_locations(occurrence),
            code: occurrence.code.clone(),
            code_hash: short_hash(&occurrence.raw_code()),
            is_new: None,
        }
    }

    /// Derive rows for all occurrences and put them in report order.
    pub fn build_sorted(&self, occurrences: &[Occurrence]) -> Vec<ExportRow> {
        let mut rows: Vec<ExportRow> = occurrences.iter().map(|o| self.build(o)).collect();
        sort_rows(&mut rows);
        rows
    }
}

/// Flag each row by whether its hash is missing from `baseline`.
pub fn mark_new_rows(rows: &mut [ExportRow], baseline: &HashSet<String>) {
    for row in rows {
        row.is_new = Some(!baseline.contains(&row.code_hash));
    }
}

/// Split sorted rows into consecutive runs sharing a module.
pub fn group_by_module(rows: &[ExportRow]) -> Vec<(&str, &[ExportRow])> {
    let mut groups = Vec::new();
    let mut start = 0;

    for i in 1..=rows.len() {
        if i == rows.len() || rows[i].module != rows[start].module {
            groups.push((rows[start].module.as_str(), &rows[start..i]));
            start = i;
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::resolver::ResolveOrder;
    use crate::models::FileStart;

    fn occurrence(starts: &[(u32, &str)], code: &[&str]) -> Occurrence {
        Occurrence {
            line_count: 6,
            token_count: 40,
            file_starts: starts
                .iter()
                .map(|(line, path)| FileStart {
                    line_number: *line,
                    file_path: path.to_string(),
                })
                .collect(),
            code: code.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn builder(primary: Option<&str>) -> RowBuilder {
        let resolver = PathResolver::new(primary, Some("dtsre"), ResolveOrder::PrimaryFirst);
        RowBuilder::new(primary, resolver)
    }

    #[test]
    fn test_group_locations_preserves_first_seen_order() {
        let occ = occurrence(
            &[(30, "b.cpp"), (10, "a.cpp"), (90, "b.cpp"), (5, "c.cpp")],
            &[],
        );
        let groups = group_locations(&occ);
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].file_path, "b.cpp");
        assert_eq!(groups[0].lines, vec![30, 90]);
        assert_eq!(groups[1].file_path, "a.cpp");
        assert_eq!(groups[2].lines, vec![5]);
    }

    #[test]
    fn test_row_uses_first_matching_location() {
        let occ = occurrence(
            &[
                (12, r"F:\old\org\Render\a.cpp"),
                (40, r"F:\new\dtsre\Engine\src\a.cpp"),
                (70, r"F:\new\dtsre\Engine\src\b.cpp"),
            ],
            &["int x;"],
        );
        let row = builder(Some("dtsre")).build(&occ);

        assert_eq!(row.module, "Engine");
        assert_eq!(row.file, r"src\a.cpp");
        assert_eq!(row.start, 40);
        assert_eq!(row.end, 46);
        assert_eq!(row.occurrence_count, 3);
        assert_eq!(row.code_hash, short_hash("int x;"));
        assert_eq!(row.is_new, None);
    }

    #[test]
    fn test_unmatched_row_is_unset() {
        let occ = occurrence(&[(12, r"F:\old\org\Render\a.cpp")], &[]);
        let row = builder(Some("dtsre")).build(&occ);

        assert!(row.is_unset());
        assert_eq!(row.module, "");
        assert_eq!(row.file, "");
        assert_eq!(row.end, UNSET_LINE + 6);
    }

    #[test]
    fn test_no_primary_uses_first_location_and_anchor() {
        let occ = occurrence(
            &[(8, r"F:\x\dtsre\Core\m.h"), (20, r"F:\y\dtsre\Gfx\n.h")],
            &[],
        );
        let row = builder(None).build(&occ);
        assert_eq!(row.start, 8);
        assert_eq!(row.module, "Core");
        assert_eq!(row.file, "m.h");
    }

    #[test]
    fn test_sort_by_module_file_start() {
        let b = builder(Some("dtsre"));
        let occs = vec![
            occurrence(&[(50, r"r\dtsre\B\x.cpp")], &["1"]),
            occurrence(&[(90, r"r\dtsre\A\y.cpp")], &["2"]),
            occurrence(&[(10, r"r\dtsre\A\y.cpp")], &["3"]),
            occurrence(&[(70, r"r\dtsre\A\x.cpp")], &["4"]),
        ];
        let rows = b.build_sorted(&occs);
        let keys: Vec<(&str, &str, i64)> = rows
            .iter()
            .map(|r| (r.module.as_str(), r.file.as_str(), r.start))
            .collect();
        assert_eq!(
            keys,
            vec![("A", "x.cpp", 70), ("A", "y.cpp", 10), ("A", "y.cpp", 90), ("B", "x.cpp", 50)]
        );
    }

    #[test]
    fn test_sort_is_independent_of_parse_order() {
        let b = builder(Some("dtsre"));
        let first = occurrence(&[(1, r"r\dtsre\B\x.cpp")], &["same"]);
        let second = occurrence(&[(1, r"r\dtsre\A\x.cpp")], &["same"]);

        let forward = b.build_sorted(&[first.clone(), second.clone()]);
        let backward = b.build_sorted(&[second, first]);
        assert_eq!(forward, backward);
        assert_eq!(forward[0].module, "A");
        assert_eq!(forward[1].module, "B");
    }

    #[test]
    fn test_ordinal_comparison_is_case_sensitive() {
        let b = builder(Some("dtsre"));
        let rows = b.build_sorted(&[
            occurrence(&[(1, r"r\dtsre\apple\x.cpp")], &[]),
            occurrence(&[(1, r"r\dtsre\Zebra\x.cpp")], &[]),
        ]);
        assert_eq!(rows[0].module, "Zebra");
        assert_eq!(rows[1].module, "apple");
    }

    #[test]
    fn test_unset_rows_sort_first() {
        let b = builder(Some("dtsre"));
        let rows = b.build_sorted(&[
            occurrence(&[(1, r"r\dtsre\A\x.cpp")], &[]),
            occurrence(&[(1, r"r\org\A\x.cpp")], &[]),
        ]);
        assert!(rows[0].is_unset());
    }

    #[test]
    fn test_mark_new_rows() {
        let b = builder(Some("dtsre"));
        let mut rows = b.build_sorted(&[
            occurrence(&[(1, r"r\dtsre\A\x.cpp")], &["old"]),
            occurrence(&[(5, r"r\dtsre\A\x.cpp")], &["fresh"]),
        ]);
        let baseline: HashSet<String> = [short_hash("old")].into_iter().collect();
        mark_new_rows(&mut rows, &baseline);
        assert_eq!(rows[0].is_new, Some(false));
        assert_eq!(rows[1].is_new, Some(true));
    }

    #[test]
    fn test_group_by_module() {
        let b = builder(Some("dtsre"));
        let rows = b.build_sorted(&[
            occurrence(&[(1, r"r\dtsre\A\x.cpp")], &[]),
            occurrence(&[(2, r"r\dtsre\B\x.cpp")], &[]),
            occurrence(&[(3, r"r\dtsre\A\y.cpp")], &[]),
        ]);
        let groups = group_by_module(&rows);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, "A");
        assert_eq!(groups[0].1.len(), 2);
        assert_eq!(groups[1].0, "B");
        assert!(group_by_module(&[]).is_empty());
    }
}
