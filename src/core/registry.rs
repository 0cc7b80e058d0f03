//! Command registry
//!
//! Holds the tree of command groups and leaf commands. The tree is assembled
//! once through explicit declarations and handed to the dispatcher, which
//! only ever reads it.

use crate::config::Config;
use crate::core::signature::{Function, Handler, Introspector, ParameterSpec};
use crate::error::{DeclarationError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, instrument};

/// Whether a node groups other commands or runs a function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Group,
    Leaf,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Group => f.write_str("group"),
            Self::Leaf => f.write_str("leaf command"),
        }
    }
}

enum NodeBody {
    Group {
        children: Vec<CommandNode>,
        /// Registered explicitly rather than created as an intermediate
        declared: bool,
    },
    Leaf {
        params: Vec<ParameterSpec>,
        handler: Handler,
    },
}

/// One group or leaf in the command tree
pub struct CommandNode {
    path: Vec<String>,
    help: String,
    body: NodeBody,
}

impl CommandNode {
    fn group(path: Vec<String>, help: String, declared: bool) -> Self {
        Self {
            path,
            help,
            body: NodeBody::Group {
                children: Vec::new(),
                declared,
            },
        }
    }

    /// Last path segment; empty for the root
    pub fn name(&self) -> &str {
        self.path.last().map_or("", String::as_str)
    }

    pub fn path(&self) -> &[String] {
        &self.path
    }

    pub const fn kind(&self) -> NodeKind {
        match self.body {
            NodeBody::Group { .. } => NodeKind::Group,
            NodeBody::Leaf { .. } => NodeKind::Leaf,
        }
    }

    pub const fn is_leaf(&self) -> bool {
        matches!(self.body, NodeBody::Leaf { .. })
    }

    pub fn help(&self) -> &str {
        &self.help
    }

    /// First non-empty line of the help text
    pub fn summary(&self) -> &str {
        self.help
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or("")
    }

    /// Children in registration order; empty for leaves
    pub fn children(&self) -> &[CommandNode] {
        match &self.body {
            NodeBody::Group { children, .. } => children,
            NodeBody::Leaf { .. } => &[],
        }
    }

    /// Child with exactly this name
    pub fn child(&self, name: &str) -> Option<&CommandNode> {
        self.children().iter().find(|child| child.name() == name)
    }

    /// Parameter specs in declaration order; empty for groups
    pub fn params(&self) -> &[ParameterSpec] {
        match &self.body {
            NodeBody::Leaf { params, .. } => params,
            NodeBody::Group { .. } => &[],
        }
    }

    pub(crate) fn handler(&self) -> Option<&Handler> {
        match &self.body {
            NodeBody::Leaf { handler, .. } => Some(handler),
            NodeBody::Group { .. } => None,
        }
    }

    const fn is_declared(&self) -> bool {
        match self.body {
            NodeBody::Group { declared, .. } => declared,
            NodeBody::Leaf { .. } => true,
        }
    }

    fn display_path(&self) -> String {
        display_path(&self.path)
    }
}

impl fmt::Debug for CommandNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandNode")
            .field("path", &self.path)
            .field("kind", &self.kind())
            .field("help", &self.help)
            .field("params", &self.params())
            .field("children", &self.children())
            .finish()
    }
}

fn display_path(path: &[String]) -> String {
    if path.is_empty() {
        "<root>".to_string()
    } else {
        path.join(" ")
    }
}

/// Tree of command groups and leaf commands
pub struct Registry {
    root: CommandNode,
    introspector: Introspector,
    require_declared_groups: bool,
}

impl Registry {
    /// Create an empty registry whose root is an implicit group
    pub fn new() -> Result<Self> {
        Ok(Self {
            root: CommandNode::group(Vec::new(), String::new(), true),
            introspector: Introspector::new()?,
            require_declared_groups: false,
        })
    }

    /// Create an empty registry configured from `config`
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new()?.require_declared_groups(config.require_declared_groups))
    }

    /// Require every parent group of a leaf to be declared first
    #[must_use]
    pub const fn require_declared_groups(mut self, required: bool) -> Self {
        self.require_declared_groups = required;
        self
    }

    pub const fn root(&self) -> &CommandNode {
        &self.root
    }

    /// Declare a group (the `base` decorator)
    pub fn base<S: AsRef<str>>(&mut self, path: &[S], doc: &str) -> Result<&CommandNode> {
        self.register_group(path, doc)
    }

    /// Introspect `function` and declare it as a leaf (the `cmd` decorator)
    pub fn cmd<S: AsRef<str>>(&mut self, path: &[S], function: Function) -> Result<&CommandNode> {
        let signature = self.introspector.introspect(&function)?;
        self.register_leaf(path, signature.params, signature.help, function.handler)
    }

    /// Create a group, or re-enter an existing one
    #[instrument(skip_all, fields(path = ?segments(path)))]
    pub fn register_group<S: AsRef<str>>(&mut self, path: &[S], help: &str) -> Result<&CommandNode> {
        let path = normalize_path(path)?;
        self.check_path(&path, NodeKind::Group)?;

        let node = descend_creating(&mut self.root, &path)?;
        if let NodeBody::Group { declared, .. } = &mut node.body {
            *declared = true;
        }
        if !help.is_empty() {
            node.help = help.to_string();
        }

        debug!("Registered group '{}'", display_path(&path));
        Ok(node)
    }

    /// Attach a leaf command bound to `handler`
    #[instrument(skip_all, fields(path = ?segments(path)))]
    pub fn register_leaf<S: AsRef<str>>(
        &mut self,
        path: &[S],
        params: Vec<ParameterSpec>,
        help: impl Into<String>,
        handler: Handler,
    ) -> Result<&CommandNode> {
        let path = normalize_path(path)?;
        let Some((_, parent_path)) = path.split_last() else {
            return Err(DeclarationError::invalid_name(
                "",
                "a leaf command needs at least one path segment",
            ));
        };
        self.introspector.check_params(&display_path(&path), &params)?;
        self.check_path(&path, NodeKind::Leaf)?;
        if self.require_declared_groups {
            self.check_declared_parents(parent_path)?;
        }

        let parent = descend_creating(&mut self.root, parent_path)?;
        let parent_display = parent.display_path();
        let NodeBody::Group { children, .. } = &mut parent.body else {
            return Err(DeclarationError::path_conflict(
                parent_display,
                "a leaf command cannot contain subcommands",
            ));
        };

        debug!(
            "Registered leaf '{}' with {} parameter(s)",
            display_path(&path),
            params.len()
        );
        children.push(CommandNode {
            path,
            help: help.into(),
            body: NodeBody::Leaf { params, handler },
        });
        Ok(&children[children.len() - 1])
    }

    /// Find the node at `path`
    pub fn lookup<S: AsRef<str>>(&self, path: &[S]) -> Option<&CommandNode> {
        path.iter()
            .try_fold(&self.root, |node, segment| node.child(segment.as_ref()))
    }

    /// Reject registrations that collide with existing nodes before touching the tree
    fn check_path(&self, path: &[String], kind: NodeKind) -> Result<()> {
        let mut node = &self.root;
        for (depth, segment) in path.iter().enumerate() {
            let Some(child) = node.child(segment) else {
                return Ok(());
            };
            let last = depth + 1 == path.len();

            if !last && child.is_leaf() {
                return Err(DeclarationError::path_conflict(
                    child.display_path(),
                    "a leaf command cannot contain subcommands",
                ));
            }
            if last {
                return match (child.kind(), kind) {
                    (NodeKind::Leaf, NodeKind::Leaf) => {
                        Err(DeclarationError::duplicate_command(child.display_path()))
                    }
                    (NodeKind::Group, NodeKind::Group) => Ok(()),
                    (existing, _) => Err(DeclarationError::path_conflict(
                        child.display_path(),
                        format!("already registered as a {existing}"),
                    )),
                };
            }
            node = child;
        }
        Ok(())
    }

    fn check_declared_parents(&self, parents: &[String]) -> Result<()> {
        for depth in 1..=parents.len() {
            let prefix = &parents[..depth];
            let declared = self.lookup(prefix).is_some_and(CommandNode::is_declared);
            if !declared {
                return Err(DeclarationError::missing_group(display_path(prefix)));
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("root", &self.root)
            .field("require_declared_groups", &self.require_declared_groups)
            .finish_non_exhaustive()
    }
}

fn segments<S: AsRef<str>>(path: &[S]) -> Vec<&str> {
    path.iter().map(AsRef::as_ref).collect()
}

fn normalize_path<S: AsRef<str>>(path: &[S]) -> Result<Vec<String>> {
    path.iter()
        .map(|segment| {
            let segment = segment.as_ref();
            if segment.is_empty() {
                Err(DeclarationError::invalid_name(segment, "command names cannot be empty"))
            } else if segment.starts_with('-') {
                Err(DeclarationError::invalid_name(segment, "command names cannot start with '-'"))
            } else if segment.chars().any(char::is_whitespace) {
                Err(DeclarationError::invalid_name(segment, "command names cannot contain whitespace"))
            } else {
                Ok(segment.to_string())
            }
        })
        .collect()
}

/// Walk down `path`, creating undeclared groups for missing segments
fn descend_creating<'a>(root: &'a mut CommandNode, path: &[String]) -> Result<&'a mut CommandNode> {
    let mut node = root;
    for (depth, segment) in path.iter().enumerate() {
        let node_path = node.display_path();
        let NodeBody::Group { children, .. } = &mut node.body else {
            return Err(DeclarationError::path_conflict(
                node_path,
                "a leaf command cannot contain subcommands",
            ));
        };

        let index = match children.iter().position(|child| child.name() == segment) {
            Some(index) => index,
            None => {
                children.push(CommandNode::group(path[..=depth].to_vec(), String::new(), false));
                children.len() - 1
            }
        };
        node = &mut children[index];
    }
    Ok(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::binder::BoundArguments;
    use crate::core::signature::{Arg, Param};
    use crate::core::types::{ScalarKind, Shape};

    fn noop(_: &BoundArguments) -> anyhow::Result<()> {
        Ok(())
    }

    fn leaf(name: &str) -> Function {
        Function::new(name, noop).doc(format!("Run {name}."))
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = Registry::new().unwrap();
        registry.base(&["ops"], "Arithmetic.").unwrap();
        registry
            .cmd(&["ops", "add"], leaf("add").param(Param::new("x", Arg::new("int"))))
            .unwrap();
        registry.cmd(&["version"], leaf("version")).unwrap();

        let ops = registry.lookup(&["ops"]).unwrap();
        assert_eq!(ops.kind(), NodeKind::Group);
        assert_eq!(ops.help(), "Arithmetic.");

        let add = registry.lookup(&["ops", "add"]).unwrap();
        assert!(add.is_leaf());
        assert_eq!(add.path(), ["ops", "add"]);
        assert_eq!(add.params().len(), 1);
        assert_eq!(add.summary(), "Run add.");

        assert!(registry.lookup(&["version"]).unwrap().is_leaf());
        assert!(registry.lookup(&["ops", "sub"]).is_none());
        assert!(registry.lookup(&["Ops"]).is_none());
        assert_eq!(registry.lookup::<&str>(&[]).unwrap().kind(), NodeKind::Group);
    }

    #[test]
    fn test_duplicate_leaf_rejected_in_any_order() {
        for (first, second) in [("one", "two"), ("two", "one")] {
            let mut registry = Registry::new().unwrap();
            registry.cmd(&["g", first], leaf(first)).unwrap();
            registry.cmd(&["g", "run"], leaf(first)).unwrap();
            registry.cmd(&["g", second], leaf(second)).unwrap();

            let err = registry.cmd(&["g", "run"], leaf(second)).unwrap_err();
            assert_eq!(err, DeclarationError::duplicate_command("g run"));
            assert_eq!(registry.lookup(&["g"]).unwrap().children().len(), 3);
        }
    }

    #[test]
    fn test_group_re_entry_keeps_children() {
        let mut registry = Registry::new().unwrap();
        registry.base(&["ops"], "").unwrap();
        registry.cmd(&["ops", "add"], leaf("add")).unwrap();
        registry.base(&["ops"], "Arithmetic.").unwrap();

        let ops = registry.lookup(&["ops"]).unwrap();
        assert_eq!(ops.help(), "Arithmetic.");
        assert_eq!(ops.children().len(), 1);
    }

    #[test]
    fn test_group_leaf_collision_rejected() {
        let mut registry = Registry::new().unwrap();
        registry.cmd(&["run"], leaf("run")).unwrap();
        assert!(matches!(
            registry.base(&["run"], "").unwrap_err(),
            DeclarationError::PathConflict { .. }
        ));
        assert!(matches!(
            registry.cmd(&["run", "fast"], leaf("fast")).unwrap_err(),
            DeclarationError::PathConflict { .. }
        ));

        registry.base(&["tools"], "").unwrap();
        assert!(matches!(
            registry.cmd(&["tools"], leaf("tools")).unwrap_err(),
            DeclarationError::PathConflict { .. }
        ));
    }

    #[test]
    fn test_implicit_groups_and_strict_mode() {
        let mut registry = Registry::new().unwrap();
        registry.cmd(&["a", "b", "c"], leaf("c")).unwrap();
        assert_eq!(registry.lookup(&["a", "b"]).unwrap().kind(), NodeKind::Group);

        let mut strict = Registry::new().unwrap().require_declared_groups(true);
        let err = strict.cmd(&["a", "b", "c"], leaf("c")).unwrap_err();
        assert_eq!(err, DeclarationError::missing_group("a"));

        strict.base(&["a"], "").unwrap();
        let err = strict.cmd(&["a", "b", "c"], leaf("c")).unwrap_err();
        assert_eq!(err, DeclarationError::missing_group("a b"));

        strict.base(&["a", "b"], "").unwrap();
        strict.cmd(&["a", "b", "c"], leaf("c")).unwrap();
        strict.cmd(&["top"], leaf("top")).unwrap();
    }

    #[test]
    fn test_invalid_paths() {
        let mut registry = Registry::new().unwrap();
        assert!(registry.cmd::<&str>(&[], leaf("root")).is_err());
        assert!(registry.cmd(&["bad name"], leaf("x")).is_err());
        assert!(registry.cmd(&["--flag"], leaf("x")).is_err());
        assert!(registry.base(&[""], "").is_err());

        registry.base::<&str>(&[], "Program help.").unwrap();
        assert_eq!(registry.root().help(), "Program help.");
    }

    #[test]
    fn test_register_leaf_checks_param_names() {
        fn spec(name: &str) -> ParameterSpec {
            ParameterSpec::new(name, Shape::scalar(ScalarKind::Int), Vec::new(), "", None).unwrap()
        }

        let mut registry = Registry::new().unwrap();
        for params in [
            vec![spec("x"), spec("x")],
            vec![spec("help")],
            vec![spec("h")],
            vec![spec("1x")],
        ] {
            let err = registry
                .register_leaf(&["t"], params, "", Box::new(noop))
                .unwrap_err();
            assert!(matches!(err, DeclarationError::InvalidName { .. }), "{err}");
        }
        assert!(registry.lookup(&["t"]).is_none());

        registry
            .register_leaf(&["t"], vec![spec("x"), spec("y")], "", Box::new(noop))
            .unwrap();
        assert_eq!(registry.lookup(&["t"]).unwrap().params().len(), 2);
    }

    #[test]
    fn test_children_keep_registration_order() {
        let mut registry = Registry::new().unwrap();
        for name in ["zeta", "alpha", "mid"] {
            registry.cmd(&[name], leaf(name)).unwrap();
        }
        let names: Vec<&str> = registry.root().children().iter().map(CommandNode::name).collect();
        assert_eq!(names, ["zeta", "alpha", "mid"]);
    }
}
