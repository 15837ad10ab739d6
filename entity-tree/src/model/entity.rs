//! Typed content entities
//!
//! The server sends entities as loosely shaped JSON objects tagged with a
//! `type` string. Here each type is a variant of [`EntityKind`] carrying only
//! the child collections that are meaningful for it, so a folder's `users` or
//! a group's `files` cannot be read by construction.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Closed set of entity types the console knows how to render
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityType {
    Resource,
    Component,
    Content,
    Folder,
    Image,
    File,
    User,
    Group,
    Element,
}

impl EntityType {
    /// Map a wire type string onto a known type. Anything unrecognised is a
    /// generic element container.
    pub fn from_type_str(s: &str) -> Self {
        match s {
            "Resource" => Self::Resource,
            "Component" => Self::Component,
            "Content" => Self::Content,
            "Folder" => Self::Folder,
            "Image" => Self::Image,
            "File" => Self::File,
            "User" => Self::User,
            "Group" => Self::Group,
            _ => Self::Element,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Resource => "Resource",
            Self::Component => "Component",
            Self::Content => "Content",
            Self::Folder => "Folder",
            Self::Image => "Image",
            Self::File => "File",
            Self::User => "User",
            Self::Group => "Group",
            Self::Element => "Element",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Self::Resource => "📄",
            Self::Component => "🧩",
            Self::Content => "📝",
            Self::Folder => "📁",
            Self::Image => "🖼",
            Self::File => "📎",
            Self::User => "👤",
            Self::Group => "👥",
            Self::Element => "▫",
        }
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Type tag plus the child collections that belong to that type
#[derive(Debug, Clone, PartialEq)]
pub enum EntityKind {
    Resource,
    Component,
    Content,
    Folder {
        folders: Vec<Entity>,
        images: Vec<Entity>,
        files: Vec<Entity>,
    },
    Image,
    File,
    User,
    Group {
        users: Vec<Entity>,
    },
    /// Generic container. `type_name` keeps the wire type string, which is
    /// `"Element"` for literal elements and something else for types the
    /// console does not know.
    Element {
        type_name: String,
        elements: Vec<Entity>,
    },
}

impl EntityKind {
    pub fn entity_type(&self) -> EntityType {
        match self {
            Self::Resource => EntityType::Resource,
            Self::Component => EntityType::Component,
            Self::Content => EntityType::Content,
            Self::Folder { .. } => EntityType::Folder,
            Self::Image => EntityType::Image,
            Self::File => EntityType::File,
            Self::User => EntityType::User,
            Self::Group { .. } => EntityType::Group,
            Self::Element { .. } => EntityType::Element,
        }
    }

    pub fn element() -> Self {
        Self::Element {
            type_name: "Element".to_string(),
            elements: Vec::new(),
        }
    }

    pub fn empty_folder() -> Self {
        Self::Folder {
            folders: Vec::new(),
            images: Vec::new(),
            files: Vec::new(),
        }
    }
}

/// A content entity as resident in the console
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireEntity", into = "WireEntity")]
pub struct Entity {
    pub id: String,
    pub name: String,
    /// Root resource this entity was loaded under, if any
    pub resource_id: Option<String>,
    pub kind: EntityKind,
    /// Children when the graph is already laid out as a tree
    pub children: Vec<Entity>,
}

impl Entity {
    pub fn new(id: impl Into<String>, kind: EntityKind) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            resource_id: None,
            kind,
            children: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_resource(mut self, resource_id: impl Into<String>) -> Self {
        self.resource_id = Some(resource_id.into());
        self
    }

    pub fn with_children(mut self, children: Vec<Entity>) -> Self {
        self.children = children;
        self
    }

    pub fn entity_type(&self) -> EntityType {
        self.kind.entity_type()
    }

    /// Wire type string, preserving unknown types
    pub fn type_name(&self) -> &str {
        match &self.kind {
            EntityKind::Element { type_name, .. } => type_name,
            other => other.entity_type().as_str(),
        }
    }

    /// True when any of this type's own child collections is non-empty.
    /// Tree-form `children` are not part of the type-specific collections.
    pub fn has_typed_children(&self) -> bool {
        match &self.kind {
            EntityKind::Folder {
                folders,
                images,
                files,
            } => !folders.is_empty() || !images.is_empty() || !files.is_empty(),
            EntityKind::Group { users } => !users.is_empty(),
            EntityKind::Element { elements, .. } => !elements.is_empty(),
            EntityKind::Resource
            | EntityKind::Component
            | EntityKind::Content
            | EntityKind::Image
            | EntityKind::File
            | EntityKind::User => false,
        }
    }

    /// Look an entity up by id in this subtree, including typed collections.
    pub fn find(&self, id: &str) -> Option<&Entity> {
        if self.id == id {
            return Some(self);
        }
        let typed: Vec<&Entity> = match &self.kind {
            EntityKind::Folder {
                folders,
                images,
                files,
            } => folders.iter().chain(images).chain(files).collect(),
            EntityKind::Group { users } => users.iter().collect(),
            EntityKind::Element { elements, .. } => elements.iter().collect(),
            _ => Vec::new(),
        };
        typed
            .into_iter()
            .chain(self.children.iter())
            .find_map(|child| child.find(id))
    }
}

/// Order entities by name; unnamed entities sort first.
pub fn sort_by_name(entities: &mut [Entity]) {
    entities.sort_by(|a, b| match (a.name.is_empty(), b.name.is_empty()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.name.cmp(&b.name),
    });
}

/// JSON shape exchanged with the server
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireEntity {
    id: String,
    #[serde(rename = "type", default)]
    entity_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    resource_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    folders: Option<Vec<Entity>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    images: Option<Vec<Entity>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    files: Option<Vec<Entity>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    users: Option<Vec<Entity>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    elements: Option<Vec<Entity>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    children: Option<Vec<Entity>>,
}

impl From<WireEntity> for Entity {
    fn from(wire: WireEntity) -> Self {
        let kind = match EntityType::from_type_str(&wire.entity_type) {
            EntityType::Resource => EntityKind::Resource,
            EntityType::Component => EntityKind::Component,
            EntityType::Content => EntityKind::Content,
            EntityType::Folder => EntityKind::Folder {
                folders: wire.folders.unwrap_or_default(),
                images: wire.images.unwrap_or_default(),
                files: wire.files.unwrap_or_default(),
            },
            EntityType::Image => EntityKind::Image,
            EntityType::File => EntityKind::File,
            EntityType::User => EntityKind::User,
            EntityType::Group => EntityKind::Group {
                users: wire.users.unwrap_or_default(),
            },
            EntityType::Element => EntityKind::Element {
                type_name: if wire.entity_type.is_empty() {
                    "Element".to_string()
                } else {
                    wire.entity_type.clone()
                },
                elements: wire.elements.unwrap_or_default(),
            },
        };

        Entity {
            id: wire.id,
            name: wire.name.unwrap_or_default(),
            resource_id: wire.resource_id,
            kind,
            children: wire.children.unwrap_or_default(),
        }
    }
}

impl From<Entity> for WireEntity {
    fn from(entity: Entity) -> Self {
        let entity_type = entity.type_name().to_string();
        let mut wire = WireEntity {
            id: entity.id,
            entity_type,
            name: Some(entity.name).filter(|n| !n.is_empty()),
            resource_id: entity.resource_id,
            children: Some(entity.children).filter(|c| !c.is_empty()),
            ..Default::default()
        };
        match entity.kind {
            EntityKind::Folder {
                folders,
                images,
                files,
            } => {
                wire.folders = Some(folders);
                wire.images = Some(images);
                wire.files = Some(files);
            }
            EntityKind::Group { users } => wire.users = Some(users),
            EntityKind::Element { elements, .. } => {
                wire.elements = Some(elements).filter(|e| !e.is_empty())
            }
            _ => {}
        }
        wire
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_type_becomes_generic_element() {
        let entity: Entity = serde_json::from_value(json!({"id": "e1", "type": "Unknown"})).unwrap();

        assert_eq!(entity.entity_type(), EntityType::Element);
        assert_eq!(entity.type_name(), "Unknown");
        assert!(!entity.has_typed_children());
    }

    #[test]
    fn foreign_collections_are_dropped() {
        let entity: Entity = serde_json::from_value(json!({
            "id": "n1",
            "type": "Folder",
            "users": [{"id": "u1", "type": "User"}],
            "files": [{"id": "f1", "type": "File"}]
        }))
        .unwrap();

        match &entity.kind {
            EntityKind::Folder { files, folders, images } => {
                assert_eq!(files.len(), 1);
                assert!(folders.is_empty());
                assert!(images.is_empty());
            }
            other => panic!("expected folder, got {:?}", other),
        }
        assert!(entity.find("u1").is_none());
        assert!(entity.find("f1").is_some());
    }

    #[test]
    fn null_collections_are_empty() {
        let entity: Entity = serde_json::from_value(json!({
            "id": "g1", "type": "Group", "name": null, "users": null
        }))
        .unwrap();
        assert_eq!(entity.kind, EntityKind::Group { users: vec![] });
        assert_eq!(entity.name, "");
    }

    #[test]
    fn wire_shape_is_preserved() {
        let input = json!({
            "id": "r1",
            "type": "Resource",
            "name": "Home",
            "resourceId": "r1",
            "children": [{"id": "c1", "type": "Content", "name": "Hello"}]
        });
        let entity: Entity = serde_json::from_value(input.clone()).unwrap();
        assert_eq!(serde_json::to_value(&entity).unwrap(), input);
    }

    #[test]
    fn sort_puts_unnamed_first() {
        let mut entities = vec![
            Entity::new("b", EntityKind::Component).with_name("Footer"),
            Entity::new("x", EntityKind::Component),
            Entity::new("a", EntityKind::Component).with_name("Banner"),
        ];
        sort_by_name(&mut entities);
        let ids: Vec<_> = entities.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["x", "a", "b"]);
    }
}
