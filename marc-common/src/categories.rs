//! Item category lookup table
//!
//! One shared label → category tag mapping, built once from the
//! `[categories]` config section and handed to every consumer that needs
//! to know which category an item or a trial belongs to.

use crate::{Error, Result};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Classification of one trial's label set
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrialCategory {
    /// Label set equals the union of every category
    Full,
    /// Label set equals exactly one category's membership
    Group(String),
    /// Anything else (partial, mixed or unrecognised labels)
    Unknown,
}

impl TrialCategory {
    /// Tag used for duplicate detection and reporting
    pub fn tag(&self) -> Option<&str> {
        match self {
            TrialCategory::Full => Some("all_items"),
            TrialCategory::Group(tag) => Some(tag.as_str()),
            TrialCategory::Unknown => None,
        }
    }
}

/// Label → category tag mapping
#[derive(Debug, Clone, Default)]
pub struct CategoryTable {
    tag_by_label: HashMap<String, String>,
    members: BTreeMap<String, BTreeSet<String>>,
}

impl CategoryTable {
    /// Build from tag → labels groups
    ///
    /// # Errors
    /// * `Error::Config` if a label is listed under more than one tag
    pub fn from_groups(groups: &BTreeMap<String, Vec<String>>) -> Result<Self> {
        let mut tag_by_label = HashMap::new();
        let mut members = BTreeMap::new();

        for (tag, labels) in groups {
            let set: BTreeSet<String> = labels.iter().cloned().collect();
            for label in &set {
                if let Some(previous) = tag_by_label.insert(label.clone(), tag.clone()) {
                    return Err(Error::Config(format!(
                        "Label '{}' listed under both '{}' and '{}'",
                        label, previous, tag
                    )));
                }
            }
            members.insert(tag.clone(), set);
        }

        Ok(Self {
            tag_by_label,
            members,
        })
    }

    /// True when no categories are configured
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Total number of distinct labels across all categories
    pub fn label_count(&self) -> usize {
        self.tag_by_label.len()
    }

    /// Category tag of one label
    pub fn category_of(&self, label: &str) -> Option<&str> {
        self.tag_by_label.get(label).map(String::as_str)
    }

    /// Classify a trial by its label set
    ///
    /// Duplicated labels collapse to one; order is irrelevant.
    pub fn classify<S: AsRef<str>>(&self, labels: &[S]) -> TrialCategory {
        if self.is_empty() || labels.is_empty() {
            return TrialCategory::Unknown;
        }

        let set: BTreeSet<&str> = labels.iter().map(AsRef::as_ref).collect();

        if set.len() == self.label_count()
            && set.iter().all(|l| self.tag_by_label.contains_key(*l))
        {
            return TrialCategory::Full;
        }

        let first_tag = match self.category_of(set.iter().next().copied().unwrap_or_default()) {
            Some(tag) => tag,
            None => return TrialCategory::Unknown,
        };

        let Some(group) = self.members.get(first_tag) else {
            return TrialCategory::Unknown;
        };

        if group.len() == set.len() && set.iter().all(|l| group.contains(*l)) {
            TrialCategory::Group(first_tag.to_string())
        } else {
            TrialCategory::Unknown
        }
    }
}
