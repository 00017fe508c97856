//! Intermediate representation for a regex

use crate::charclass::ClassDescriptor;
use crate::types::{CaptureGroupID, Flags, GroupTable, INFINITE};
use std::fmt;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AnchorType {
    /// `^` in multiline mode.
    StartOfLine,
    /// `$` in multiline mode.
    EndOfLine,
    /// `\A`, or `^` outside multiline mode.
    Beginning,
    /// `\G`: where the current scan started.
    Start,
    /// `\Z`, or `$` outside multiline mode: the end, or before a final newline.
    EndZ,
    /// `\z`
    End,
}

/// A Quantifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Quantifier {
    /// Minimum number of iterations of the loop, inclusive.
    pub min: usize,

    /// Maximum number of iterations of the loop, inclusive.
    /// INFINITE for an unbounded loop.
    pub max: usize,

    /// Whether the loop is greedy.
    pub greedy: bool,
}

/// The node types of our IR.
#[derive(Debug, Clone)]
pub enum Node {
    /// Matches the empty string.
    Empty,

    /// Reaching this node terminates the match successfully.
    Goal,

    /// Never matches.
    Fail,

    /// Match a literal character.
    /// If icase is true, then `c` MUST be already folded.
    Char { c: char, icase: bool },

    /// Match any character except `c`.
    NotChar { c: char, icase: bool },

    /// Match a literal string, stored in text order.
    /// If icase is true, the string MUST be already folded.
    Literal { chars: String, icase: bool },

    /// Match a character class. If icase is true, the input char is lowered
    /// before the membership test.
    Class { class: ClassDescriptor, icase: bool },

    /// Match anything including newlines.
    MatchAny,

    /// Match the catenation of multiple nodes.
    Cat(Vec<Node>),

    /// Match an ordered alternation like a|b|c.
    Alt(Vec<Node>),

    /// Match an anchor like ^ or $
    Anchor(AnchorType),

    /// Word boundary (\b or \B).
    WordBoundary { invert: bool, ecma: bool },

    /// A capturing group. A balancing group `(?<a-b>...)` also pops the last
    /// capture of `uncapture`; `(?<-b>...)` has no group of its own.
    CaptureGroup {
        contents: Box<Node>,
        group: Option<CaptureGroupID>,
        uncapture: Option<CaptureGroupID>,
    },

    /// A backreference to a capture slot.
    BackRef { group: CaptureGroupID, icase: bool },

    /// A lookaround assertion like (?=) or (?<!).
    LookaroundAssertion {
        negate: bool,
        backwards: bool,
        contents: Box<Node>,
    },

    /// An atomic group (?>...).
    Atomic(Box<Node>),

    /// A loop like /(ab)*/ or /(?:x|y){3,5}?/
    Loop {
        loopee: Box<Node>,
        quant: Quantifier,
    },

    /// A loop whose body matches exactly one character.
    /// An atomic loop never gives back what it matched.
    Loop1CharBody {
        loopee: Box<Node>,
        quant: Quantifier,
        atomic: bool,
    },

    /// (?(name)yes|no)
    BackrefConditional {
        group: CaptureGroupID,
        yes: Box<Node>,
        no: Box<Node>,
    },

    /// (?(expr)yes|no). The condition is a positive lookahead.
    ExprConditional {
        condition: Box<Node>,
        yes: Box<Node>,
        no: Box<Node>,
    },
}

pub type NodeList = Vec<Node>;

impl Node {
    /// Helper to return an "always fails" node.
    pub fn make_always_fails() -> Node {
        Node::Fail
    }

    /// Reverse the children of \p self if matching backwards.
    /// Used as a parameter to walk_mut.
    pub fn reverse_cats(&mut self, w: &mut Walk) {
        if let Node::Cat(nodes) = self {
            if w.backwards {
                nodes.reverse()
            }
        }
    }

    /// \return whether this is an Empty node.
    pub fn is_empty(&self) -> bool {
        matches!(self, Node::Empty)
    }

    /// \return whether this is a Cat node.
    pub fn is_cat(&self) -> bool {
        matches!(self, Node::Cat(..))
    }

    /// \return whether this node is known to match exactly one char.
    /// This is best-effort: a false return is always safe.
    pub fn matches_exactly_one_char(&self) -> bool {
        match self {
            Node::Char { .. } | Node::NotChar { .. } | Node::MatchAny => true,
            Node::Class { class, .. } => !class.is_empty(),
            _ => false,
        }
    }

    /// \return true if this node will always fail to match.
    /// Note this is different than matching the empty string.
    /// For example, an empty bracket /[]/ tries to match one char
    /// from an empty set.
    pub fn match_always_fails(&self) -> bool {
        match self {
            Node::Fail => true,
            Node::Class { class, .. } => class.is_empty(),
            _ => false,
        }
    }

    /// \return whether this node or any descendant is a capture group.
    pub fn contains_captures(&self) -> bool {
        let mut found = false;
        walk(false, false, self, &mut |n: &Node, w: &mut Walk| {
            if matches!(n, Node::CaptureGroup { .. }) {
                found = true;
            }
            w.skip_children = found;
        });
        found
    }

    /// \return the minimum number of chars any match of this node consumes.
    pub fn min_length(&self) -> usize {
        match self {
            Node::Empty
            | Node::Goal
            | Node::Fail
            | Node::Anchor(..)
            | Node::WordBoundary { .. }
            | Node::BackRef { .. }
            | Node::LookaroundAssertion { .. } => 0,
            Node::Char { .. } | Node::NotChar { .. } | Node::Class { .. } | Node::MatchAny => 1,
            Node::Literal { chars, .. } => chars.chars().count(),
            Node::Cat(nodes) => nodes
                .iter()
                .fold(0usize, |acc, n| acc.saturating_add(n.min_length())),
            Node::Alt(nodes) => nodes.iter().map(Node::min_length).min().unwrap_or(0),
            Node::CaptureGroup { contents, .. } | Node::Atomic(contents) => contents.min_length(),
            Node::Loop { loopee, quant } | Node::Loop1CharBody { loopee, quant, .. } => {
                loopee.min_length().saturating_mul(quant.min)
            }
            Node::BackrefConditional { yes, no, .. } | Node::ExprConditional { yes, no, .. } => {
                yes.min_length().min(no.min_length())
            }
        }
    }

    /// \return whether this node can only match the empty string.
    pub fn is_zero_width(&self) -> bool {
        matches!(
            self,
            Node::Empty
                | Node::Anchor(..)
                | Node::WordBoundary { .. }
                | Node::LookaroundAssertion { .. }
        )
    }
}

/// A helper type for walking.
#[derive(Debug, Clone)]
pub struct Walk {
    // It set to true, skip the children of this node.
    pub skip_children: bool,

    // The current depth of the walk.
    pub depth: usize,

    // If true, the cursor moves backwards here: we are in a lookbehind, or in
    // a right-to-left regex outside of any lookahead.
    pub backwards: bool,
}

impl Walk {
    fn new(backwards: bool) -> Self {
        Self {
            skip_children: false,
            depth: 0,
            backwards,
        }
    }
}

#[derive(Debug)]
struct Walker<'a, F>
where
    F: FnMut(&Node, &mut Walk),
{
    func: &'a mut F,
    postorder: bool,
    walk: Walk,
}

impl<F> Walker<'_, F>
where
    F: FnMut(&Node, &mut Walk),
{
    fn process_with_direction(&mut self, n: &Node, backwards: bool) {
        let saved = self.walk.backwards;
        self.walk.backwards = backwards;
        self.process(n);
        self.walk.backwards = saved;
    }

    fn process_children(&mut self, n: &Node) {
        match n {
            Node::Empty
            | Node::Goal
            | Node::Fail
            | Node::Char { .. }
            | Node::NotChar { .. }
            | Node::Literal { .. }
            | Node::Class { .. }
            | Node::MatchAny
            | Node::WordBoundary { .. }
            | Node::BackRef { .. }
            | Node::Anchor { .. } => {}
            Node::Cat(nodes) | Node::Alt(nodes) => {
                for node in nodes {
                    self.process(node);
                }
            }
            Node::Loop { loopee, .. } | Node::Loop1CharBody { loopee, .. } => self.process(loopee),
            Node::CaptureGroup { contents, .. } | Node::Atomic(contents) => {
                self.process(contents.as_ref())
            }
            Node::LookaroundAssertion {
                backwards,
                contents,
                ..
            } => self.process_with_direction(contents, *backwards),
            Node::BackrefConditional { yes, no, .. } => {
                self.process(yes);
                self.process(no);
            }
            Node::ExprConditional { condition, yes, no } => {
                self.process_with_direction(condition, false);
                self.process(yes);
                self.process(no);
            }
        }
    }

    fn process(&mut self, n: &Node) {
        self.walk.skip_children = false;
        if !self.postorder {
            (self.func)(n, &mut self.walk);
        }
        if !self.walk.skip_children {
            self.walk.depth += 1;
            self.process_children(n);
            self.walk.depth -= 1;
        }
        if self.postorder {
            (self.func)(n, &mut self.walk)
        }
    }
}

#[derive(Debug)]
struct MutWalker<'a, F>
where
    F: FnMut(&mut Node, &mut Walk),
{
    func: &'a mut F,
    postorder: bool,
    walk: Walk,
}

impl<F> MutWalker<'_, F>
where
    F: FnMut(&mut Node, &mut Walk),
{
    fn process_with_direction(&mut self, n: &mut Node, backwards: bool) {
        let saved = self.walk.backwards;
        self.walk.backwards = backwards;
        self.process(n);
        self.walk.backwards = saved;
    }

    fn process_children(&mut self, n: &mut Node) {
        match n {
            Node::Empty
            | Node::Goal
            | Node::Fail
            | Node::Char { .. }
            | Node::NotChar { .. }
            | Node::Literal { .. }
            | Node::Class { .. }
            | Node::MatchAny
            | Node::Anchor { .. }
            | Node::WordBoundary { .. }
            | Node::BackRef { .. } => {}
            Node::Cat(nodes) | Node::Alt(nodes) => {
                nodes.iter_mut().for_each(|node| self.process(node));
            }
            Node::Loop { loopee, .. } | Node::Loop1CharBody { loopee, .. } => {
                self.process(loopee);
            }
            Node::CaptureGroup { contents, .. } | Node::Atomic(contents) => {
                self.process(contents.as_mut())
            }
            Node::LookaroundAssertion {
                backwards,
                contents,
                ..
            } => {
                let backwards = *backwards;
                self.process_with_direction(contents, backwards)
            }
            Node::BackrefConditional { yes, no, .. } => {
                self.process(yes);
                self.process(no);
            }
            Node::ExprConditional { condition, yes, no } => {
                self.process_with_direction(condition, false);
                self.process(yes);
                self.process(no);
            }
        }
    }

    fn process(&mut self, n: &mut Node) {
        self.walk.skip_children = false;
        if !self.postorder {
            (self.func)(n, &mut self.walk);
        }
        if !self.walk.skip_children {
            self.walk.depth += 1;
            self.process_children(n);
            self.walk.depth -= 1;
        }
        if self.postorder {
            (self.func)(n, &mut self.walk);
        }
    }
}

/// Call a function on every Node.
/// If \p postorder is true, then process children before the node;
/// otherwise process children after the node.
/// \p backwards gives the direction of the root.
pub fn walk<F>(postorder: bool, backwards: bool, n: &Node, func: &mut F)
where
    F: FnMut(&Node, &mut Walk),
{
    let mut walker = Walker {
        func,
        postorder,
        walk: Walk::new(backwards),
    };
    walker.process(n);
}

/// Call a function on every Node, which may mutate the node.
/// If \p postorder is true, then process children before the node;
/// otherwise process children after the node.
/// In preorder, setting `skip_children` avoids descending into the node.
pub fn walk_mut<F>(postorder: bool, backwards: bool, n: &mut Node, func: &mut F)
where
    F: FnMut(&mut Node, &mut Walk),
{
    let mut walker = MutWalker {
        func,
        postorder,
        walk: Walk::new(backwards),
    };
    walker.process(n);
}

/// A regex in IR form.
#[derive(Debug, Clone)]
pub struct Regex {
    /// The root node. For a right-to-left regex, its Cats are already in
    /// matching order.
    pub node: Node,
    pub flags: Flags,
    pub groups: GroupTable,
}

impl Regex {
    /// \return the number of nodes in the tree.
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        walk(false, self.flags.right_to_left, &self.node, &mut |_, _| count += 1);
        count
    }

    /// \return the depth of the deepest node.
    pub fn max_depth(&self) -> usize {
        let mut depth = 0;
        walk(false, self.flags.right_to_left, &self.node, &mut |_, w| {
            depth = depth.max(w.depth)
        });
        depth
    }
}

fn display_quant(q: &Quantifier) -> String {
    let max = if q.max == INFINITE {
        "inf".to_string()
    } else {
        q.max.to_string()
    };
    format!("{{{},{}}}{}", q.min, max, if q.greedy { "" } else { "?" })
}

fn display_node(node: &Node, depth: usize, f: &mut fmt::Formatter) -> fmt::Result {
    for _ in 0..depth {
        write!(f, "..")?;
    }
    let icase_suffix = |icase: bool| if icase { " (icase)" } else { "" };
    match node {
        Node::Empty => writeln!(f, "Empty"),
        Node::Goal => writeln!(f, "Goal"),
        Node::Fail => writeln!(f, "Fail"),
        Node::Char { c, icase } => writeln!(f, "'{}'{}", c.escape_debug(), icase_suffix(*icase)),
        Node::NotChar { c, icase } => {
            writeln!(f, "NotChar '{}'{}", c.escape_debug(), icase_suffix(*icase))
        }
        Node::Literal { chars, icase } => {
            writeln!(f, "Literal {:?}{}", chars, icase_suffix(*icase))
        }
        Node::Class { class, icase } => writeln!(f, "Class {}{}", class, icase_suffix(*icase)),
        Node::MatchAny => writeln!(f, "MatchAny"),
        Node::Cat(..) => writeln!(f, "Cat"),
        Node::Alt(..) => writeln!(f, "Alt"),
        Node::Anchor(anchor_type) => writeln!(f, "Anchor {:?}", anchor_type),
        Node::Loop { quant, .. } => writeln!(f, "Loop {}", display_quant(quant)),
        Node::Loop1CharBody { quant, atomic, .. } => writeln!(
            f,
            "Loop1Char {}{}",
            display_quant(quant),
            if *atomic { " (atomic)" } else { "" }
        ),
        Node::CaptureGroup {
            group, uncapture, ..
        } => writeln!(f, "CaptureGroup {:?} uncapture {:?}", group, uncapture),
        Node::WordBoundary { invert, ecma } => {
            let kind = if *invert { "\\B" } else { "\\b" };
            writeln!(f, "WordBoundary {}{}", kind, if *ecma { " (ecma)" } else { "" })
        }
        Node::BackRef { group, icase } => {
            writeln!(f, "BackRef {}{}", group, icase_suffix(*icase))
        }
        Node::LookaroundAssertion {
            negate, backwards, ..
        } => {
            let sense = if *negate { "negative" } else { "positive" };
            let direction = if *backwards { "backwards" } else { "forwards" };
            writeln!(f, "LookaroundAssertion {} {}", sense, direction)
        }
        Node::Atomic(..) => writeln!(f, "Atomic"),
        Node::BackrefConditional { group, .. } => writeln!(f, "BackrefConditional {}", group),
        Node::ExprConditional { .. } => writeln!(f, "ExprConditional"),
    }
}

impl fmt::Display for Regex {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut result = Ok(());
        walk(
            false,
            self.flags.right_to_left,
            &self.node,
            &mut |node: &Node, walk: &mut Walk| {
                if result.is_ok() {
                    result = display_node(node, walk.depth, f)
                }
            },
        );
        result
    }
}
