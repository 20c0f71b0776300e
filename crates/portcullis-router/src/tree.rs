use crate::error::RouterError;
use std::collections::HashMap;
use std::sync::Arc;

/// What a [`Node`] represents along the edge from its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeKind {
    /// A literal byte label, matched verbatim (case-insensitively).
    Static,
    /// Captures exactly one path segment (up to the next `/`).
    Param,
    /// Captures the remainder of the path. Always terminal.
    Wildcard,
}

/// A node of the per-(domain, method) radix route tree (spec.md §3).
///
/// `children` holds every child regardless of kind; `fallback` is the
/// cached index of the single parameter-or-wildcard child, populated
/// by [`Tree::build`] so that lookup never has to scan `children`
/// looking for one.
#[derive(Debug)]
struct Node<T> {
    kind: NodeKind,
    /// Literal text for `Static` nodes (always lowercase); empty for
    /// `Param`/`Wildcard` nodes, whose identity is their `arg_name`.
    label: String,
    arg_name: Option<String>,
    children: Vec<Node<T>>,
    fallback: Option<usize>,
    value: Option<Arc<T>>,
}

impl<T> Node<T> {
    fn new(kind: NodeKind, label: impl Into<String>) -> Self {
        Self {
            kind,
            label: label.into(),
            arg_name: None,
            children: Vec::new(),
            fallback: None,
            value: None,
        }
    }

    fn param_child_mut(&mut self) -> Option<&mut Node<T>> {
        self.children
            .iter_mut()
            .find(|c| c.kind == NodeKind::Param)
    }
}

/// A prefix-compressed route tree for a single (domain, HTTP method)
/// pair (spec.md §4.1).
#[derive(Debug)]
pub struct Tree<T> {
    root: Node<T>,
}

impl<T> Default for Tree<T> {
    fn default() -> Self {
        Self {
            root: Node::new(NodeKind::Static, ""),
        }
    }
}

/// The outcome of a [`Tree::lookup`].
#[derive(Debug)]
pub enum Matched<'a, T> {
    /// An exact match: the route value and its captured parameters,
    /// in path order, with original request casing preserved.
    Route {
        value: &'a T,
        params: Vec<(String, String)>,
    },
    /// The tree contains the same path with the trailing `/` toggled;
    /// the caller should redirect rather than dispatch.
    Redirect,
    /// No match at all.
    NotFound,
}

fn common_prefix_len(a: &str, b: &str) -> usize {
    a.as_bytes()
        .iter()
        .zip(b.as_bytes())
        .take_while(|(x, y)| x == y)
        .count()
}

/// finds the byte index of the next `:` or `*` that starts a new path
/// segment (i.e. is the first character of `s`, or immediately
/// follows a `/`).
fn next_wild_index(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    bytes.iter().enumerate().find_map(|(i, &b)| {
        let starts_segment = i == 0 || bytes[i - 1] == b'/';
        if starts_segment && (b == b':' || b == b'*') {
            Some(i)
        } else {
            None
        }
    })
}

impl<T> Tree<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `template` (e.g. `/hotels/:id/cancel`, `/src/*filepath`)
    /// with `value`. See spec.md §4.1 for the insertion rules.
    pub fn add(&mut self, template: &str, value: T) -> Result<(), RouterError> {
        if !template.starts_with('/') {
            return Err(RouterError::PathMustBeAbsolute(template.to_string()));
        }
        let lowered = template.to_ascii_lowercase();
        validate_segments(&lowered)?;
        insert(&mut self.root, &lowered, Arc::new(value))
    }

    /// Must be called after all routes for this tree have been added.
    /// Populates the cached parameter/wildcard fallback pointer on
    /// every node (spec.md §4.1's "post-pass").
    pub fn build(&mut self) {
        build_fallbacks(&mut self.root);
    }

    /// Case-insensitive exact lookup; does not consider trailing-slash
    /// redirects. Captured values preserve the original casing of `path`.
    fn lookup_exact<'a>(&'a self, path: &str) -> Option<(&'a T, Vec<(String, String)>)> {
        let lowered = path.to_ascii_lowercase();
        let mut params = Vec::new();
        walk(&self.root, &lowered, path, &mut params).map(|v| (v, params))
    }

    /// Full lookup including trailing-slash redirect detection
    /// (spec.md §4.1 and §8).
    pub fn lookup<'a>(&'a self, path: &str, trailing_slash_redirect: bool) -> Matched<'a, T> {
        if let Some((value, params)) = self.lookup_exact(path) {
            return Matched::Route { value, params };
        }
        if trailing_slash_redirect {
            let toggled = if let Some(stripped) = path.strip_suffix('/') {
                if stripped.is_empty() {
                    None
                } else {
                    Some(stripped.to_string())
                }
            } else {
                Some(format!("{path}/"))
            };
            if let Some(toggled) = toggled {
                if self.lookup_exact(&toggled).is_some() {
                    return Matched::Redirect;
                }
            }
        }
        Matched::NotFound
    }
}

/// Rejects a template containing a parameter segment that embeds a
/// second `:`/`*` token, per spec.md §4.1.
fn validate_segments(template: &str) -> Result<(), RouterError> {
    for segment in template.split('/') {
        if let Some(rest) = segment.strip_prefix(':').or_else(|| segment.strip_prefix('*')) {
            if rest.contains(':') || rest.contains('*') {
                return Err(RouterError::NestedParam(segment.to_string()));
            }
        }
    }
    Ok(())
}

fn insert<T>(node: &mut Node<T>, path: &str, value: Arc<T>) -> Result<(), RouterError> {
    // Shortcut: a completely empty node (the fresh root) just takes
    // the whole template as a literal prefix via insert_child.
    if node.label.is_empty()
        && node.children.is_empty()
        && node.value.is_none()
        && node.kind == NodeKind::Static
    {
        return insert_child(node, path, value);
    }

    let common = common_prefix_len(&node.label, path);
    if common < node.label.len() {
        let (keep, rest) = node.label.split_at(common);
        let mut split_off = Node {
            kind: NodeKind::Static,
            label: rest.to_string(),
            arg_name: None,
            children: std::mem::take(&mut node.children),
            fallback: None,
            value: node.value.take(),
        };
        split_off.fallback = None;
        node.label = keep.to_string();
        node.children = vec![split_off];
    }

    let remainder = &path[common..];
    if remainder.is_empty() {
        if node.value.is_some() {
            return Err(RouterError::NodeExists(path.to_string()));
        }
        node.value = Some(value);
        return Ok(());
    }

    if remainder.starts_with(':') || remainder.starts_with('*') {
        return insert_wild(node, remainder, value);
    }

    let first = remainder.as_bytes()[0];
    if let Some(child) = node
        .children
        .iter_mut()
        .find(|c| c.kind == NodeKind::Static && c.label.as_bytes().first() == Some(&first))
    {
        return insert(child, remainder, value);
    }

    insert_child(node, remainder, value)
}

/// Attaches `path` (known not to match any existing static child) as
/// new node(s) under `node`.
fn insert_child<T>(node: &mut Node<T>, path: &str, value: Arc<T>) -> Result<(), RouterError> {
    match next_wild_index(path) {
        None => {
            let mut child = Node::new(NodeKind::Static, path);
            child.value = Some(value);
            node.children.push(child);
            Ok(())
        }
        Some(0) => insert_wild(node, path, value),
        Some(idx) => {
            let (literal, rest) = path.split_at(idx);
            let mut child = Node::new(NodeKind::Static, literal);
            insert_wild(&mut child, rest, value)?;
            node.children.push(child);
            Ok(())
        }
    }
}

/// Attaches a `:name` or `*name` token (and anything after it) under `node`.
fn insert_wild<T>(node: &mut Node<T>, path: &str, value: Arc<T>) -> Result<(), RouterError> {
    debug_assert!(path.starts_with(':') || path.starts_with('*'));
    let is_wildcard = path.starts_with('*');
    let end = path[1..]
        .find('/')
        .map(|i| i + 1)
        .unwrap_or(path.len());
    let name = &path[1..end];
    let rest = &path[end..];

    if is_wildcard && !rest.is_empty() {
        return Err(RouterError::WildcardNotTerminal(path.to_string()));
    }

    if let Some(existing) = node
        .children
        .iter()
        .find(|c| c.kind != NodeKind::Static)
        .map(|c| (c.kind, c.arg_name.clone().unwrap_or_default()))
    {
        let (existing_kind, existing_name) = existing;
        let this_kind = if is_wildcard {
            NodeKind::Wildcard
        } else {
            NodeKind::Param
        };
        if existing_kind != this_kind {
            return Err(RouterError::ParamConflict {
                path: path.to_string(),
                expected: existing_name,
                found: name.to_string(),
            });
        }
        if existing_name != name {
            return Err(RouterError::ParamConflict {
                path: path.to_string(),
                expected: existing_name,
                found: name.to_string(),
            });
        }
        if is_wildcard {
            // A wildcard node is always terminal and unique; a second
            // registration with the same name is a duplicate path.
            return Err(RouterError::NodeExists(path.to_string()));
        }
        let child = node.param_child_mut().expect("checked above");
        return insert(child, rest, value);
    }

    let kind = if is_wildcard {
        NodeKind::Wildcard
    } else {
        NodeKind::Param
    };
    let mut child = Node::new(kind, "");
    child.arg_name = Some(name.to_string());
    if rest.is_empty() {
        child.value = Some(value);
    } else {
        insert(&mut child, rest, value)?;
    }
    node.children.push(child);
    Ok(())
}

fn build_fallbacks<T>(node: &mut Node<T>) {
    node.fallback = node
        .children
        .iter()
        .position(|c| c.kind != NodeKind::Static);
    for child in &mut node.children {
        build_fallbacks(child);
    }
}

/// Walks `lowered` (already-lowercased) against the tree, recording
/// captures by slicing `original` at the same byte offsets.
fn walk<'a, T>(
    node: &'a Node<T>,
    lowered: &str,
    original: &str,
    params: &mut Vec<(String, String)>,
) -> Option<&'a T> {
    match node.kind {
        NodeKind::Static => {
            if !lowered.starts_with(node.label.as_str()) {
                return None;
            }
            let rest_lowered = &lowered[node.label.len()..];
            let rest_original = &original[node.label.len()..];
            if rest_lowered.is_empty() {
                return node.value.as_deref();
            }
            descend(node, rest_lowered, rest_original, params)
        }
        NodeKind::Param => {
            let seg_len = lowered.find('/').unwrap_or(lowered.len());
            if seg_len == 0 {
                return None;
            }
            let captured = &original[..seg_len];
            let rest_lowered = &lowered[seg_len..];
            let rest_original = &original[seg_len..];
            if rest_lowered.is_empty() {
                if let Some(value) = node.value.as_deref() {
                    params.push((node.arg_name.clone().unwrap_or_default(), captured.to_string()));
                    return Some(value);
                }
                return None;
            }
            params.push((node.arg_name.clone().unwrap_or_default(), captured.to_string()));
            let found = descend(node, rest_lowered, rest_original, params);
            if found.is_none() {
                params.pop();
            }
            found
        }
        NodeKind::Wildcard => {
            if lowered.is_empty() {
                return None;
            }
            let value = node.value.as_deref()?;
            params.push((node.arg_name.clone().unwrap_or_default(), original.to_string()));
            Some(value)
        }
    }
}

/// Tries static children first (longest-match-first is unnecessary
/// since labels are disjoint by first byte), then the cached fallback.
fn descend<'a, T>(
    node: &'a Node<T>,
    lowered: &str,
    original: &str,
    params: &mut Vec<(String, String)>,
) -> Option<&'a T> {
    let first = lowered.as_bytes().first()?;
    if let Some(child) = node
        .children
        .iter()
        .find(|c| c.kind == NodeKind::Static && c.label.as_bytes().first() == Some(first))
    {
        if let Some(v) = walk(child, lowered, original, params) {
            return Some(v);
        }
    }
    if let Some(idx) = node.fallback {
        return walk(&node.children[idx], lowered, original, params);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build<const N: usize>(routes: [(&str, &str); N]) -> Tree<String> {
        let mut tree = Tree::new();
        for (path, value) in routes {
            tree.add(path, value.to_string()).unwrap();
        }
        tree.build();
        tree
    }

    fn lookup_ok(tree: &Tree<String>, path: &str) -> (String, Vec<(String, String)>) {
        match tree.lookup(path, false) {
            Matched::Route { value, params } => (value.clone(), params),
            other => panic!("expected a route match for {path:?}, got {other:?}"),
        }
    }

    #[test]
    fn scenario_1_param_then_redirect() {
        let tree = build([("/hotels/:id/cancel", "cancel")]);
        let (value, params) = lookup_ok(&tree, "/hotels/12345/cancel");
        assert_eq!(value, "cancel");
        assert_eq!(params, vec![("id".to_string(), "12345".to_string())]);

        match tree.lookup("/hotels/12345/cancel/", true) {
            Matched::Redirect => {}
            other => panic!("expected redirect, got {other:?}"),
        }
        match tree.lookup("/hotels/12345/cancel/", false) {
            Matched::NotFound => {}
            other => panic!("expected not found with redirects disabled, got {other:?}"),
        }
    }

    #[test]
    fn scenario_2_wildcard() {
        let tree = build([("/src/*filepath", "files")]);
        let (value, params) = lookup_ok(&tree, "/src/js/inc/framework.js");
        assert_eq!(value, "files");
        assert_eq!(
            params,
            vec![("filepath".to_string(), "js/inc/framework.js".to_string())]
        );
    }

    #[test]
    fn scenario_3_static_beats_param() {
        let tree = build([
            ("/cmd/vet", "vet"),
            ("/cmd/:tool/:sub", "tool-sub"),
        ]);
        let (value, params) = lookup_ok(&tree, "/cmd/vet");
        assert_eq!(value, "vet");
        assert!(params.is_empty());

        let (value, params) = lookup_ok(&tree, "/cmd/go/build");
        assert_eq!(value, "tool-sub");
        assert_eq!(
            params,
            vec![
                ("tool".to_string(), "go".to_string()),
                ("sub".to_string(), "build".to_string())
            ]
        );
    }

    #[test]
    fn case_insensitive_matching_preserves_capture_case() {
        let tree = build([("/Users/:name", "user")]);
        let (value, params) = lookup_ok(&tree, "/USERS/AdaLovelace");
        assert_eq!(value, "user");
        assert_eq!(params, vec![("name".to_string(), "AdaLovelace".to_string())]);
    }

    #[test]
    fn duplicate_exact_path_is_an_error() {
        let mut tree: Tree<&str> = Tree::new();
        tree.add("/a", "first").unwrap();
        let err = tree.add("/a", "second").unwrap_err();
        assert!(matches!(err, RouterError::NodeExists(_)));
    }

    #[test]
    fn conflicting_param_names_is_an_error() {
        let mut tree: Tree<&str> = Tree::new();
        tree.add("/a/:id", "first").unwrap();
        let err = tree.add("/a/:slug", "second").unwrap_err();
        assert!(matches!(err, RouterError::ParamConflict { .. }));
    }

    #[test]
    fn nested_param_in_segment_is_rejected() {
        let mut tree: Tree<&str> = Tree::new();
        let err = tree.add("/a/:id:extra", "x").unwrap_err();
        assert!(matches!(err, RouterError::NestedParam(_)));
    }

    #[test]
    fn wildcard_must_be_terminal() {
        let mut tree: Tree<&str> = Tree::new();
        let err = tree.add("/a/*rest/more", "x").unwrap_err();
        assert!(matches!(err, RouterError::WildcardNotTerminal(_)));
    }

    #[test]
    fn path_must_be_absolute() {
        let mut tree: Tree<&str> = Tree::new();
        let err = tree.add("a", "x").unwrap_err();
        assert!(matches!(err, RouterError::PathMustBeAbsolute(_)));
    }

    #[test]
    fn not_found_for_unregistered_path() {
        let tree = build([("/a", "a")]);
        assert!(matches!(tree.lookup("/b", true), Matched::NotFound));
    }

    /// for every registered template, looking it back up returns the
    /// same value with captures listed in path order (spec.md §8).
    #[test]
    fn invariant_round_trip_for_every_added_template() {
        let mut tree: Tree<String> = Tree::new();
        let templates = [
            "/",
            "/about",
            "/users/:id",
            "/users/:id/posts/:post_id",
            "/static/*path",
        ];
        for t in templates {
            tree.add(t, t.to_string()).unwrap();
        }
        tree.build();

        let probe = |concrete: &str, expected_template: &str, expected_params: &[(&str, &str)]| {
            match tree.lookup(concrete, false) {
                Matched::Route { value, params } => {
                    assert_eq!(value, expected_template);
                    let expected: Vec<(String, String)> = expected_params
                        .iter()
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .collect();
                    assert_eq!(params, expected);
                }
                other => panic!("expected match for {concrete}, got {other:?}"),
            }
        };

        probe("/", "/", &[]);
        probe("/about", "/about", &[]);
        probe("/users/42", "/users/:id", &[("id", "42")]);
        probe(
            "/users/42/posts/7",
            "/users/:id/posts/:post_id",
            &[("id", "42"), ("post_id", "7")],
        );
        probe("/static/js/a.js", "/static/*path", &[("path", "js/a.js")]);
    }

    #[test]
    fn at_most_one_param_or_wildcard_child_per_parent() {
        let mut tree: Tree<&str> = Tree::new();
        tree.add("/a/:id", "param").unwrap();
        assert!(tree.add("/a/*rest", "wild").is_err());
    }
}
