use crate::entity::Entity;
use crate::error::Result;
use crate::tags::TagList;

/// A pure predicate over entities, used by systems to pick what they see.
pub trait EntityFilter {
    fn matches(&self, entity: &Entity) -> bool;
}

/// Matches entities carrying every required component, field and tag.
///
/// Empty requirement sets match everything. With `top_level_only` the
/// entity must also be a direct child of its scene.
#[derive(Debug, Clone, Default)]
pub struct SimpleEntityFilter {
    components: Vec<String>,
    fields: Vec<String>,
    tags: TagList,
    top_level_only: bool,
}

impl SimpleEntityFilter {
    /// Require every component in `components` and every tag in `tags`, optionally only for top-level entities.
    pub fn new<I, S>(components: I, tags: TagList, top_level_only: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            components: components.into_iter().map(Into::into).collect(),
            fields: Vec::new(),
            tags,
            top_level_only,
        }
    }

    /// A filter matching every entity.
    pub fn all() -> Self {
        Self::default()
    }

    /// Shorthand taking tags as strings.
    pub fn with_tags<I, S>(components: I, tags: &[&str], top_level_only: bool) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(Self::new(
            components,
            TagList::from_tags(tags.iter().copied())?,
            top_level_only,
        ))
    }

    /// Additionally require these field identifiers to resolve.
    pub fn require_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.extend(fields.into_iter().map(Into::into));
        self
    }

    /// Required component names.
    pub fn components(&self) -> &[String] {
        &self.components
    }

    /// Required field identifiers.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Required tags.
    pub fn tags(&self) -> &TagList {
        &self.tags
    }

    /// Whether only direct children of the scene match.
    pub fn top_level_only(&self) -> bool {
        self.top_level_only
    }
}

impl EntityFilter for SimpleEntityFilter {
    fn matches(&self, entity: &Entity) -> bool {
        (!self.top_level_only || entity.is_top_level())
            && entity.tags().contains_all(&self.tags)
            && self.components.iter().all(|c| entity.has_component(c))
            && self.fields.iter().all(|f| entity.has_field(f))
    }
}

/// Matches entities accepted by any of its filters. No filters match nothing.
#[derive(Default)]
pub struct CompositeEntityFilter {
    filters: Vec<Box<dyn EntityFilter>>,
}

impl CompositeEntityFilter {
    /// Combine `filters`; an entity matching any of them matches.
    pub fn new(filters: Vec<Box<dyn EntityFilter>>) -> Self {
        Self { filters }
    }

    /// Add another alternative.
    pub fn or(mut self, filter: impl EntityFilter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    /// Number of alternatives.
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Check whether there are no alternatives.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl EntityFilter for CompositeEntityFilter {
    fn matches(&self, entity: &Entity) -> bool {
        self.filters.iter().any(|f| f.matches(entity))
    }
}

/// Matches nothing. For systems that only use their global update.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEntities;

impl EntityFilter for NoEntities {
    fn matches(&self, _entity: &Entity) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::tests::Stats;
    use crate::scene::Scene;
    use crate::tree::Parent;

    fn scene_with_render() -> (Scene, crate::EntityId, crate::EntityId) {
        let mut scene = Scene::new("test", "game");
        let root = scene.create_named_entity("root", Parent::Scene).unwrap();
        let sprite = scene.create_named_entity("sprite", Parent::Scene).unwrap();
        scene
            .add_component(sprite, Box::new(Stats::new("render", &[("layer", 0.0)])))
            .unwrap();
        (scene, root, sprite)
    }

    #[test]
    fn top_level_filter_tracks_reparenting() {
        let (mut scene, root, sprite) = scene_with_render();
        let filter = SimpleEntityFilter::new(["render"], TagList::new(), true);
        assert!(filter.matches(scene.entity(sprite).unwrap()));
        assert!(!filter.matches(scene.entity(root).unwrap()));

        scene.move_entity(sprite, Parent::Entity(root)).unwrap();
        assert!(!filter.matches(scene.entity(sprite).unwrap()));
        let nested = SimpleEntityFilter::new(["render"], TagList::new(), false);
        assert!(nested.matches(scene.entity(sprite).unwrap()));
    }

    #[test]
    fn tags_and_fields_are_required() {
        let (mut scene, _, sprite) = scene_with_render();
        let tagged = SimpleEntityFilter::with_tags(Vec::<String>::new(), &["enemy"], false).unwrap();
        assert!(!tagged.matches(scene.entity(sprite).unwrap()));
        scene.add_tag(sprite, "enemy").unwrap();
        assert!(tagged.matches(scene.entity(sprite).unwrap()));

        let by_field = SimpleEntityFilter::all().require_fields(["layer"]);
        assert!(by_field.matches(scene.entity(sprite).unwrap()));
        let by_missing = SimpleEntityFilter::all().require_fields(["depth"]);
        assert!(!by_missing.matches(scene.entity(sprite).unwrap()));
    }

    #[test]
    fn empty_filter_matches_everything() {
        let (scene, root, sprite) = scene_with_render();
        let all = SimpleEntityFilter::all();
        assert!(all.matches(scene.entity(root).unwrap()));
        assert!(all.matches(scene.entity(sprite).unwrap()));
    }

    #[test]
    fn composite_is_or_in_either_order() {
        let (scene, root, sprite) = scene_with_render();
        let render = || SimpleEntityFilter::new(["render"], TagList::new(), false);
        let physics = || SimpleEntityFilter::new(["physics"], TagList::new(), false);
        let sprite = scene.entity(sprite).unwrap();

        let a = CompositeEntityFilter::default().or(render()).or(physics());
        let b = CompositeEntityFilter::default().or(physics()).or(render());
        assert!(a.matches(sprite));
        assert!(b.matches(sprite));

        let neither = CompositeEntityFilter::default().or(physics()).or(NoEntities);
        assert!(!neither.matches(sprite));
        assert!(!a.matches(scene.entity(root).unwrap()));
        assert!(!CompositeEntityFilter::default().matches(sprite));
    }
}
