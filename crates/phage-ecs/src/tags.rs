use std::fmt;

use serde::{Deserialize, Serialize};

use crate::component::Component;
use crate::error::{require_name, EcsError, Result, Subject};
use crate::value::FieldValue;

/// An immutable, ordered list of distinct tags.
///
/// Every "mutation" returns a new list; the receiver is never changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct TagList {
    tags: Vec<String>,
}

impl TagList {
    /// Create an empty tag list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a list from tags, rejecting empty and repeated ones.
    pub fn from_tags<I, S>(tags: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut list = Vec::new();
        for tag in tags {
            let tag = tag.into();
            require_name(&tag, "tag")?;
            if list.contains(&tag) {
                return Err(EcsError::duplicate(Subject::Tag, tag));
            }
            list.push(tag);
        }
        Ok(Self { tags: list })
    }

    /// A new list equal to this one plus `tag`.
    pub fn with(&self, tag: &str) -> Result<TagList> {
        require_name(tag, "tag")?;
        if self.contains(tag) {
            return Err(EcsError::duplicate(Subject::Tag, tag));
        }
        let mut tags = self.tags.clone();
        tags.push(tag.to_string());
        Ok(TagList { tags })
    }

    /// A new list equal to this one minus `tag`. Removing an absent tag is an error.
    pub fn without(&self, tag: &str) -> Result<TagList> {
        require_name(tag, "tag")?;
        let Some(position) = self.tags.iter().position(|t| t == tag) else {
            return Err(EcsError::not_found(Subject::Tag, tag));
        };
        let mut tags = self.tags.clone();
        tags.remove(position);
        Ok(TagList { tags })
    }

    /// Check whether a tag is present.
    pub fn contains(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Whether every tag of `other` is in this list (vacuously true for an empty `other`).
    pub fn contains_all(&self, other: &TagList) -> bool {
        other.tags.iter().all(|t| self.contains(t))
    }

    /// Whether the two lists share at least one tag.
    pub fn intersects(&self, other: &TagList) -> bool {
        other.tags.iter().any(|t| self.contains(t))
    }

    /// Iterate over the tags in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }

    /// Number of tags.
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Check whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

impl TryFrom<Vec<String>> for TagList {
    type Error = EcsError;

    fn try_from(tags: Vec<String>) -> Result<Self> {
        TagList::from_tags(tags)
    }
}

impl From<TagList> for Vec<String> {
    fn from(list: TagList) -> Self {
        list.tags
    }
}

impl fmt::Display for TagList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.tags.join(", "))
    }
}

/// Built-in component holding an entity's [`TagList`].
#[derive(Debug, Clone, Default)]
pub struct CTags {
    tags: TagList,
}

impl CTags {
    pub const NAME: &'static str = "tags";
    pub const TAGS: &'static str = "tags";

    /// Create a tags component holding `tags`.
    pub fn new(tags: TagList) -> Self {
        Self { tags }
    }

    /// The current tag list.
    pub fn tags(&self) -> &TagList {
        &self.tags
    }

    /// Replace the tag list.
    pub fn set_tags(&mut self, tags: TagList) {
        self.tags = tags;
    }

    /// Add a tag. Fails if it is already present.
    pub fn add_tag(&mut self, tag: &str) -> Result<()> {
        self.tags = self.tags.with(tag)?;
        Ok(())
    }

    /// Remove a tag. Fails if it is missing.
    pub fn remove_tag(&mut self, tag: &str) -> Result<()> {
        self.tags = self.tags.without(tag)?;
        Ok(())
    }
}

impl Component for CTags {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn identifiers(&self) -> Vec<String> {
        vec![Self::TAGS.to_string()]
    }

    fn get(&self, identifier: &str) -> Result<FieldValue> {
        require_name(identifier, "identifier")?;
        if identifier == Self::TAGS {
            return Ok(FieldValue::Tags(self.tags.clone()));
        }
        Err(EcsError::unknown_field(Self::NAME, identifier))
    }

    fn set(&mut self, identifier: &str, value: FieldValue) -> Result<()> {
        require_name(identifier, "identifier")?;
        if identifier != Self::TAGS {
            return Err(EcsError::unknown_field(Self::NAME, identifier));
        }
        self.tags = value.expect_tags(identifier)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn list(tags: &[&str]) -> TagList {
        TagList::from_tags(tags.iter().copied()).unwrap()
    }

    #[test]
    fn add_then_remove_restores_membership() {
        let original = list(&["player", "solid"]);
        let round = original.with("flying").unwrap().without("flying").unwrap();
        assert_eq!(round, original);
        assert!(!round.contains("flying"));
    }

    #[test]
    fn with_does_not_mutate_receiver() {
        let original = list(&["a"]);
        let added = original.with("b").unwrap();
        assert_eq!(original.len(), 1);
        assert_eq!(added.iter().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn duplicate_add_fails() {
        let err = list(&["a"]).with("a").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Lookup);
        assert!(TagList::from_tags(["x", "x"]).is_err());
    }

    #[test]
    fn removing_missing_tag_fails() {
        let err = list(&["a"]).without("b").unwrap_err();
        assert!(matches!(err, EcsError::NotFound { subject: Subject::Tag, .. }));
    }

    #[test]
    fn empty_tag_is_usage_error() {
        assert_eq!(list(&[]).with("").unwrap_err().kind(), ErrorKind::Usage);
    }

    #[test]
    fn set_queries() {
        let tags = list(&["a", "b", "c"]);
        assert!(tags.contains_all(&list(&["a", "c"])));
        assert!(tags.contains_all(&TagList::new()));
        assert!(!tags.contains_all(&list(&["a", "d"])));
        assert!(tags.intersects(&list(&["d", "c"])));
        assert!(!tags.intersects(&list(&["d"])));
    }

    #[test]
    fn ctags_field_access() {
        let mut c = CTags::default();
        c.add_tag("enemy").unwrap();
        assert_eq!(
            c.get(CTags::TAGS).unwrap().as_tags().unwrap(),
            &list(&["enemy"])
        );
        c.set(CTags::TAGS, FieldValue::Tags(list(&["x", "y"]))).unwrap();
        assert_eq!(c.tags().len(), 2);
        assert!(c.set("colour", FieldValue::Bool(true)).is_err());
        assert!(c.remove_tag("enemy").is_err());
    }
}
