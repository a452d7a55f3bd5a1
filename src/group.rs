//! The registration tree of a suite.
//!
//! Groups live in an arena owned by [`GroupTree`] and refer to their parent by
//! [`GroupId`]. Children keep declaration order, which is also execution order.

use std::borrow::Cow;

use crate::{example::Example, flags::Flags, hooks::HookRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(usize);

#[derive(Debug, Clone)]
pub enum Node {
    Group(GroupId),
    Example(Example),
}

#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct ExampleGroup {
    pub description: Cow<'static, str>,
    pub flags: Flags,
    pub hooks: HookRegistry,
    children: Vec<Node>,
    parent: Option<GroupId>,
}

impl ExampleGroup {
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn parent(&self) -> Option<GroupId> {
        self.parent
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct GroupTree {
    groups: Vec<ExampleGroup>,
}

impl Default for GroupTree {
    fn default() -> Self {
        Self::new()
    }
}

impl GroupTree {
    const ROOT: GroupId = GroupId(0);

    /// A tree holding only an empty, undescribed root group.
    pub fn new() -> Self {
        Self {
            groups: vec![ExampleGroup {
                description: Cow::Borrowed(""),
                flags: Flags::new(),
                hooks: HookRegistry::new(),
                children: Vec::new(),
                parent: None,
            }],
        }
    }

    pub fn root(&self) -> GroupId {
        Self::ROOT
    }

    pub fn group(&self, id: GroupId) -> &ExampleGroup {
        &self.groups[id.0]
    }

    pub fn group_mut(&mut self, id: GroupId) -> &mut ExampleGroup {
        &mut self.groups[id.0]
    }

    pub fn parent(&self, id: GroupId) -> Option<GroupId> {
        self.group(id).parent
    }

    pub fn add_group(
        &mut self,
        parent: GroupId,
        description: impl Into<Cow<'static, str>>,
        flags: Flags,
    ) -> GroupId {
        let id = GroupId(self.groups.len());
        self.groups.push(ExampleGroup {
            description: description.into(),
            flags,
            hooks: HookRegistry::new(),
            children: Vec::new(),
            parent: Some(parent),
        });
        self.groups[parent.0].children.push(Node::Group(id));
        id
    }

    pub fn add_example(&mut self, parent: GroupId, example: Example) {
        self.groups[parent.0].children.push(Node::Example(example));
    }

    /// Visit every example below `id`, however deep.
    pub fn walk_examples_mut(&mut self, id: GroupId, mut f: impl FnMut(&mut Example)) {
        let mut pending = vec![id];
        while let Some(group) = pending.pop() {
            for child in &mut self.groups[group.0].children {
                match child {
                    Node::Group(nested) => pending.push(*nested),
                    Node::Example(example) => f(example),
                }
            }
        }
    }

    pub fn examples(&self) -> impl Iterator<Item = &Example> {
        self.groups.iter().flat_map(|group| {
            group.children.iter().filter_map(|child| match child {
                Node::Example(example) => Some(example),
                Node::Group(_) => None,
            })
        })
    }

    /// Whether any group or example carries an explicit `focused = true`.
    pub fn any_focused(&self) -> bool {
        self.groups.iter().any(|group| group.flags.is_focused())
            || self.examples().any(|example| example.flags.is_focused())
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn example_count(&self) -> usize {
        self.examples().count()
    }
}
