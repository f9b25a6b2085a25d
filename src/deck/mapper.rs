//! Column mapping: which row text goes into which template paragraph.
//!
//! Mapping is positional. The content slots of a text shape are its
//! non-spacer paragraphs in order, and the k-th declared column fills the
//! k-th content slot. Spacers are a property of the template (paragraphs
//! left empty by its author), never inferred from the data.

use crate::deck::config::TextGroup;
use crate::deck::introspect::{ParagraphMetadata, ShapeMetadata, TemplateIndex};
use crate::deck::report::RowWarning;
use crate::deck::row::ColumnContentMap;
use tracing::debug;

/// One filled slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotFill {
    /// Paragraph index in the template text body
    pub paragraph: usize,
    pub column: String,
    pub text: String,
}

/// Slot assignment for one text shape.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotAssignment {
    pub fills: Vec<SlotFill>,
    /// Columns left over once every content slot was filled
    pub dropped: Vec<String>,
}

impl SlotAssignment {
    /// Replacement text per paragraph; `None` keeps the template paragraph.
    pub fn replacements(&self, paragraph_count: usize) -> Vec<Option<&str>> {
        let mut out = vec![None; paragraph_count];
        for fill in &self.fills {
            if let Some(slot) = out.get_mut(fill.paragraph) {
                *slot = Some(fill.text.as_str());
            }
        }
        out
    }

    /// The warning for dropped columns, if any.
    pub fn excess_warning(&self, shape: &str) -> Option<RowWarning> {
        (!self.dropped.is_empty()).then(|| RowWarning::ExcessColumns {
            shape: shape.to_string(),
            dropped: self.dropped.clone(),
        })
    }
}

/// Indices of the paragraphs that take content.
pub fn content_slots(paragraphs: &[ParagraphMetadata]) -> Vec<usize> {
    paragraphs.iter().filter(|p| !p.is_spacer).map(|p| p.index).collect()
}

/// Assign columns to the content slots of one text shape.
///
/// Extra columns are returned in `dropped`; slots without a column keep
/// their template text.
pub fn map(paragraphs: &[ParagraphMetadata], columns: &ColumnContentMap) -> SlotAssignment {
    let slots = content_slots(paragraphs);
    let mut assignment = SlotAssignment::default();

    for (k, (column, text)) in columns.iter().enumerate() {
        match slots.get(k) {
            Some(&paragraph) => assignment.fills.push(SlotFill {
                paragraph,
                column: column.to_string(),
                text: text.to_string(),
            }),
            None => assignment.dropped.push(column.to_string()),
        }
    }

    assignment
}

/// Join the non-empty texts of a block into one entry under the first
/// non-empty column. Blocks with fewer than two non-empty texts are left as
/// they are.
pub fn join_texts(columns: &ColumnContentMap, separator: Option<&str>) -> ColumnContentMap {
    let Some(separator) = separator.filter(|s| !s.is_empty()) else {
        return columns.clone();
    };
    let filled: Vec<(&str, &str)> = columns.iter().filter(|(_, t)| !t.trim().is_empty()).collect();
    if filled.len() < 2 {
        return columns.clone();
    }

    let joined = filled.iter().map(|(_, t)| *t).collect::<Vec<_>>().join(separator);
    std::iter::once((filled[0].0, joined)).collect()
}

/// Slot assignment of one text group to its template shape.
#[derive(Debug, Clone)]
pub struct GroupAssignment<'t> {
    pub shape: &'t ShapeMetadata,
    pub assignment: SlotAssignment,
}

/// Map every text group of a row onto the template.
///
/// Groups are matched to shapes by exact name. A group whose shape is
/// missing is skipped with a warning; groups without a name are ignored.
/// `default_separator` applies to groups that set none.
pub fn map_groups<'t>(
    groups: &[TextGroup],
    index: &'t TemplateIndex,
    texts: &ColumnContentMap,
    default_separator: Option<&str>,
) -> (Vec<GroupAssignment<'t>>, Vec<RowWarning>) {
    let mut assignments = Vec::with_capacity(groups.len());
    let mut warnings = Vec::new();

    for group in groups {
        let name = group.placeholder_name.trim();
        if name.is_empty() {
            debug!(columns = ?group.columns, "text group without placeholder name ignored");
            continue;
        }
        let Some(shape) = index.get(&group.placeholder_name) else {
            warnings.push(RowWarning::PlaceholderNotFound {
                name: group.placeholder_name.clone(),
            });
            continue;
        };

        let separator = group.separator.as_deref().or(default_separator);
        let columns = join_texts(&texts.select(&group.columns), separator);
        let assignment = map(&shape.paragraphs, &columns);
        if let Some(warning) = assignment.excess_warning(&shape.name) {
            warnings.push(warning);
        }
        assignments.push(GroupAssignment { shape, assignment });
    }

    (assignments, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::template_slide;
    use proptest::prelude::*;

    fn paragraphs(texts: &[&str]) -> Vec<ParagraphMetadata> {
        texts
            .iter()
            .enumerate()
            .map(|(index, text)| ParagraphMetadata {
                index,
                is_spacer: text.trim().is_empty(),
                font_name: None,
                font_size: None,
                bold: None,
                italic: None,
                color: None,
                alignment: None,
                level: 0,
                text: text.to_string(),
            })
            .collect()
    }

    fn columns(pairs: &[(&str, &str)]) -> ColumnContentMap {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_spacers_are_skipped() {
        let template = paragraphs(&["", "Brand", "Desc", ""]);
        let assignment = map(&template, &columns(&[("C", "Acme"), ("D", "Rockets")]));
        assert_eq!(
            assignment.fills,
            vec![
                SlotFill { paragraph: 1, column: "C".into(), text: "Acme".into() },
                SlotFill { paragraph: 2, column: "D".into(), text: "Rockets".into() },
            ]
        );
        assert!(assignment.dropped.is_empty());
        assert_eq!(assignment.replacements(4), vec![None, Some("Acme"), Some("Rockets"), None]);
    }

    #[test]
    fn test_standard_mapping_uses_declared_order() {
        let template = paragraphs(&["A", "B", " ", "C"]);
        let assignment = map(&template, &columns(&[("F", "f"), ("C", "c"), ("E", "e")]));
        let placed: Vec<(usize, &str)> = assignment
            .fills
            .iter()
            .map(|f| (f.paragraph, f.column.as_str()))
            .collect();
        assert_eq!(placed, vec![(0, "F"), (1, "C"), (3, "E")]);
    }

    #[test]
    fn test_excess_columns_are_dropped() {
        let template = paragraphs(&["Title", "", "Body"]);
        let assignment = map(&template, &columns(&[("A", "1"), ("B", "2"), ("C", "3"), ("D", "4")]));
        assert_eq!(assignment.fills.len(), 2);
        assert_eq!(assignment.dropped, vec!["C", "D"]);
        assert_eq!(
            assignment.excess_warning("TextBox 2"),
            Some(RowWarning::ExcessColumns {
                shape: "TextBox 2".into(),
                dropped: vec!["C".into(), "D".into()],
            })
        );
    }

    #[test]
    fn test_fewer_columns_leave_template_text() {
        let template = paragraphs(&["Title", "Body", "Footer"]);
        let assignment = map(&template, &columns(&[("A", "only")]));
        assert_eq!(assignment.replacements(3), vec![Some("only"), None, None]);
    }

    #[test]
    fn test_join_texts() {
        let joined = join_texts(&columns(&[("A", ""), ("B", "Tea"), ("C", "Cups")]), Some(" for "));
        assert_eq!(joined.iter().collect::<Vec<_>>(), vec![("B", "Tea for Cups")]);

        let single = columns(&[("A", "x"), ("B", "")]);
        assert_eq!(join_texts(&single, Some(", ")), single);
        let many = columns(&[("A", "x"), ("B", "y")]);
        assert_eq!(join_texts(&many, None), many);
        assert_eq!(join_texts(&many, Some("")), many);
    }

    #[test]
    fn test_map_groups() {
        let index = TemplateIndex::introspect(&template_slide()).unwrap();
        let groups = vec![
            TextGroup {
                columns: vec!["Brand".into(), "Desc".into(), "Notes".into()],
                placeholder_name: "TextBox 2".into(),
                separator: None,
            },
            TextGroup {
                columns: vec!["Price".into()],
                placeholder_name: "Price Tag".into(),
                separator: None,
            },
            TextGroup {
                columns: vec!["Ignored".into()],
                placeholder_name: " ".into(),
                separator: None,
            },
        ];
        let texts = columns(&[("Desc", "Fast"), ("Brand", "Acme"), ("Notes", "n"), ("Price", "9")]);

        let (assignments, warnings) = map_groups(&groups, &index, &texts, None);
        assert_eq!(assignments.len(), 1);
        assert_eq!(assignments[0].shape.name, "TextBox 2");
        let placed: Vec<(usize, &str)> = assignments[0]
            .assignment
            .fills
            .iter()
            .map(|f| (f.paragraph, f.text.as_str()))
            .collect();
        assert_eq!(placed, vec![(1, "Acme"), (2, "Fast")]);
        assert_eq!(
            warnings,
            vec![
                RowWarning::ExcessColumns { shape: "TextBox 2".into(), dropped: vec!["Notes".into()] },
                RowWarning::PlaceholderNotFound { name: "Price Tag".into() },
            ]
        );
    }

    #[test]
    fn test_map_groups_is_case_sensitive() {
        let index = TemplateIndex::introspect(&template_slide()).unwrap();
        let groups = vec![TextGroup {
            columns: vec!["A".into()],
            placeholder_name: "textbox 2".into(),
            separator: None,
        }];
        let (assignments, warnings) = map_groups(&groups, &index, &columns(&[("A", "x")]), None);
        assert!(assignments.is_empty());
        assert_eq!(warnings.len(), 1);
    }

    proptest! {
        #[test]
        fn prop_columns_fill_content_slots_in_order(
            spacer_mask in proptest::collection::vec(any::<bool>(), 0..12),
            column_count in 0usize..12,
        ) {
            let texts: Vec<&str> = spacer_mask.iter().map(|&s| if s { "" } else { "x" }).collect();
            let template = paragraphs(&texts);
            let cols: ColumnContentMap = (0..column_count).map(|i| (format!("c{i}"), format!("t{i}"))).collect();

            let assignment = map(&template, &cols);
            let slots = content_slots(&template);

            prop_assert_eq!(assignment.fills.len(), column_count.min(slots.len()));
            prop_assert_eq!(assignment.dropped.len(), column_count.saturating_sub(slots.len()));
            for (k, fill) in assignment.fills.iter().enumerate() {
                prop_assert_eq!(fill.paragraph, slots[k]);
                prop_assert!(!template[fill.paragraph].is_spacer);
                prop_assert_eq!(&fill.column, &format!("c{k}"));
            }
        }
    }
}
