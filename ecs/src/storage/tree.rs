use std::collections::HashMap;

use crate::{
    entity::Entity,
    error::{Error, Result},
};

/// Parent/child hierarchy over a layer's entities.
///
/// Every node has exactly one parent; the root sentinel [`Entity::ROOT`]
/// is its own parent and anchors the forest. Re-parenting that would make
/// an entity its own ancestor is rejected before any mutation.
pub struct Tree {
    nodes: HashMap<Entity, Node>,
}

struct Node {
    parent: Entity,
    children: Vec<Entity>,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    /// Create a tree holding only the root sentinel.
    pub fn new() -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(
            Entity::ROOT,
            Node {
                parent: Entity::ROOT,
                children: Vec::new(),
            },
        );
        Self { nodes }
    }

    /// Add a node for an entity under the root.
    pub(crate) fn insert(&mut self, entity: Entity) {
        debug_assert!(
            !self.nodes.contains_key(&entity),
            "entity {entity:?} already has a tree node"
        );
        self.nodes.insert(
            entity,
            Node {
                parent: Entity::ROOT,
                children: Vec::new(),
            },
        );
        self.attach_child(Entity::ROOT, entity);
    }

    /// Remove an entity's node, re-parenting its children to the root.
    ///
    /// A missing node means the tree and the entity table have drifted
    /// apart; that is a consistency-guard failure, not a normal path.
    pub(crate) fn remove(&mut self, entity: Entity) -> Result<()> {
        let node = self
            .nodes
            .remove(&entity)
            .ok_or(Error::UnknownEntity(entity))?;
        self.detach_child(node.parent, entity);
        for child in node.children {
            if let Some(orphan) = self.nodes.get_mut(&child) {
                orphan.parent = Entity::ROOT;
                self.attach_child(Entity::ROOT, child);
            }
        }
        Ok(())
    }

    /// Re-parent `child` under `parent` (which may be the root).
    ///
    /// Fails with [`Error::HierarchyCycle`] if `parent` sits in `child`'s
    /// subtree, and with [`Error::UnknownEntity`] if either node is
    /// missing.
    pub fn link(&mut self, child: Entity, parent: Entity) -> Result<()> {
        if !self.nodes.contains_key(&parent) {
            return Err(Error::UnknownEntity(parent));
        }
        let Some(node) = self.nodes.get(&child) else {
            return Err(Error::UnknownEntity(child));
        };
        if node.parent == parent {
            return Ok(());
        }
        if child == parent || self.is_ancestor(child, parent) {
            return Err(Error::HierarchyCycle { child, parent });
        }

        let old_parent = node.parent;
        self.detach_child(old_parent, child);
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = parent;
        }
        self.attach_child(parent, child);
        Ok(())
    }

    /// Return `child` to the root.
    pub fn unlink(&mut self, child: Entity) -> Result<()> {
        self.link(child, Entity::ROOT)
    }

    /// The parent of an entity; `None` for the root or an unknown entity.
    pub fn parent(&self, entity: Entity) -> Option<Entity> {
        if entity == Entity::ROOT {
            return None;
        }
        self.nodes.get(&entity).map(|node| node.parent)
    }

    /// The direct children of an entity (or of the root).
    pub fn children(&self, entity: Entity) -> &[Entity] {
        self.nodes
            .get(&entity)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    /// Whether the entity has a node.
    pub fn contains(&self, entity: Entity) -> bool {
        self.nodes.contains_key(&entity)
    }

    /// Walk parents from `of` to the root looking for `ancestor`.
    fn is_ancestor(&self, ancestor: Entity, of: Entity) -> bool {
        let mut current = of;
        while current != Entity::ROOT {
            if current == ancestor {
                return true;
            }
            match self.nodes.get(&current) {
                Some(node) => current = node.parent,
                None => return false,
            }
        }
        false
    }

    fn attach_child(&mut self, parent: Entity, child: Entity) {
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.push(child);
        }
    }

    fn detach_child(&mut self, parent: Entity, child: Entity) {
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.retain(|c| *c != child);
        }
    }
}
