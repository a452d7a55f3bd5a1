//! Turning a registration tree into the ordered list of examples to run.

use std::borrow::Cow;

use crate::{
    example::{Example, ExampleFnHandle, ExampleMetadata},
    flags::Flags,
    group::{GroupId, GroupTree, Node},
    hooks::{HookRegistry, RegisteredHook},
    outcome::SkipReason,
};

/// An example with everything resolved that running it needs.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct FlatExample {
    pub meta: ExampleMetadata,
    /// Flags of all ancestors merged root to leaf, then the example's own.
    pub flags: Flags,
    pub before: Vec<RegisteredHook>,
    pub after: Vec<RegisteredHook>,
    pub skip: Option<SkipReason>,
    pub(crate) body: ExampleFnHandle,
}

impl FlatExample {
    pub fn name(&self) -> &str {
        &self.meta.name
    }
}

/// Flatten `tree` in depth first declaration order.
///
/// `world_hooks` are composed ahead of the groups' own hooks.
pub fn flatten(tree: &GroupTree, world_hooks: &HookRegistry) -> Vec<FlatExample> {
    let mut flattening = Flattening {
        tree,
        world_hooks,
        any_focused: tree.any_focused(),
        chain: Vec::new(),
        out: Vec::new(),
    };
    flattening.visit(tree.root());
    flattening.out
}

struct Flattening<'t> {
    tree: &'t GroupTree,
    world_hooks: &'t HookRegistry,
    any_focused: bool,
    chain: Vec<GroupId>,
    out: Vec<FlatExample>,
}

impl Flattening<'_> {
    fn visit(&mut self, id: GroupId) {
        let tree = self.tree;
        self.chain.push(id);
        for child in tree.group(id).children() {
            match child {
                Node::Group(nested) => self.visit(*nested),
                Node::Example(example) => {
                    let flat = self.resolve(example);
                    self.out.push(flat);
                }
            }
        }
        self.chain.pop();
    }

    fn resolve(&self, example: &Example) -> FlatExample {
        let groups = self.chain.iter().map(|id| self.tree.group(*id));

        let inherited = groups
            .clone()
            .fold(Flags::new(), |acc, group| Flags::merge(&group.flags, &acc));
        let flags = Flags::merge(&example.flags, &inherited);

        let group_path: Vec<Cow<'static, str>> = groups
            .clone()
            .filter(|group| !group.is_root())
            .map(|group| group.description.clone())
            .collect();
        let name = group_path
            .iter()
            .map(|segment| &**segment)
            .chain([&*example.description])
            .collect::<Vec<&str>>()
            .join(" ");

        let registries = || {
            [self.world_hooks]
                .into_iter()
                .chain(groups.clone().map(|group| &group.hooks))
        };
        let before = HookRegistry::compose_before(registries());
        let after = HookRegistry::compose_after(registries());

        let skip = match (self.any_focused, flags.is_focused(), flags.is_pending()) {
            (true, false, _) => Some(SkipReason::Unfocused),
            (_, _, true) => Some(SkipReason::Pending),
            _ => None,
        };

        FlatExample {
            meta: ExampleMetadata {
                description: example.description.clone(),
                name,
                callsite: example.callsite.clone(),
                group_path,
                index: self.out.len(),
                is_shared_example: example.is_shared_example,
            },
            flags,
            before,
            after,
            skip,
            body: example.body().clone(),
        }
    }
}
