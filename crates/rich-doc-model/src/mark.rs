use std::fmt;

use crate::schema::{Attrs, MarkType};

/// An annotation (strong, emphasis, ...) carried by inline nodes.
#[derive(Clone, PartialEq)]
pub struct Mark {
    mark_type: MarkType,
    attrs: Attrs,
}

impl Mark {
    pub(crate) fn new(mark_type: MarkType, attrs: Attrs) -> Self {
        Self { mark_type, attrs }
    }

    pub fn mark_type(&self) -> &MarkType {
        &self.mark_type
    }

    pub fn attrs(&self) -> &Attrs {
        &self.attrs
    }

    /// Add this mark to a sorted set, replacing a mark of the same type.
    pub fn add_to_set(&self, set: &[Mark]) -> Vec<Mark> {
        let mut out: Vec<Mark> = set
            .iter()
            .filter(|m| m.mark_type != self.mark_type)
            .cloned()
            .collect();
        let at = out
            .iter()
            .position(|m| m.mark_type.rank() > self.mark_type.rank())
            .unwrap_or(out.len());
        out.insert(at, self.clone());
        out
    }

    pub fn remove_from_set(&self, set: &[Mark]) -> Vec<Mark> {
        set.iter().filter(|m| *m != self).cloned().collect()
    }

    pub fn is_in_set(&self, set: &[Mark]) -> bool {
        set.iter().any(|m| m == self)
    }

    pub fn same_set(a: &[Mark], b: &[Mark]) -> bool {
        a == b
    }

    /// Normalize an arbitrary list of marks into a sorted set.
    pub fn set_from(marks: &[Mark]) -> Vec<Mark> {
        marks.iter().fold(Vec::new(), |set, mark| mark.add_to_set(&set))
    }
}

impl fmt::Debug for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.attrs.is_empty() {
            write!(f, "{}", self.mark_type.name())
        } else {
            write!(f, "{}{:?}", self.mark_type.name(), self.attrs)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic::basic_schema;
    use pretty_assertions::assert_eq;

    #[test]
    fn sets_are_ordered_by_rank() {
        let schema = basic_schema();
        let strong = schema.mark("strong", None).unwrap();
        let em = schema.mark("em", None).unwrap();

        let set = em.add_to_set(&[]);
        let set = strong.add_to_set(&set);
        assert_eq!(set, vec![strong.clone(), em.clone()]);
        assert_eq!(Mark::set_from(&[em.clone(), strong.clone()]), set);
    }

    #[test]
    fn adding_a_present_mark_does_not_duplicate_it() {
        let strong = basic_schema().mark("strong", None).unwrap();
        let set = strong.add_to_set(&[strong.clone()]);
        assert_eq!(set.len(), 1);
        assert!(strong.is_in_set(&set));
        assert!(strong.remove_from_set(&set).is_empty());
    }
}
