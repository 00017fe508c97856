//! Optimizations on regex IR

use crate::charclass::{CharClass, ClassDescriptor};
use crate::folds;
use crate::ir::*;
use crate::types::{INFINITE, MAX_PARSE_DEPTH};
use log::debug;

/// Trees deeper than this are left unoptimized. Every group the parser
/// accepts adds at least one level, so maximally nested patterns trip it.
const MAX_OPTIMIZE_DEPTH: usize = MAX_PARSE_DEPTH;

/// Classes with at most this many members may be reduced to a char.
const MAX_FOLDABLE_CLASS_MEMBERS: usize = 4;

/// Things that a Pass may do.
pub enum PassAction {
    // Do nothing to the given node.
    Keep,

    // Notes that we modified the node in-place.
    Modified,

    // Remove the given node outright, effectively replacing it with empty.
    Remove,

    /// Replace the given node with a new Node.
    Replace(Node),
}

#[derive(Debug)]
struct Pass<'a, F>
where
    F: FnMut(&mut Node, &Walk) -> PassAction,
{
    // The function.
    func: &'a mut F,

    // Whether this pass has changed anything.
    changed: bool,

    // Whether the root matches backwards.
    backwards: bool,
}

impl<'a, F> Pass<'a, F>
where
    F: FnMut(&mut Node, &Walk) -> PassAction,
{
    fn new(func: &'a mut F, backwards: bool) -> Self {
        Pass {
            func,
            changed: false,
            backwards,
        }
    }

    fn run_postorder(&mut self, start: &mut Node) {
        walk_mut(
            true,
            self.backwards,
            start,
            &mut |n: &mut Node, walk: &mut Walk| match (self.func)(n, walk) {
                PassAction::Keep => {}
                PassAction::Modified => {
                    self.changed = true;
                }
                PassAction::Remove => {
                    *n = Node::Empty;
                    self.changed = true;
                }
                PassAction::Replace(newnode) => {
                    *n = newnode;
                    self.changed = true;
                }
            },
        )
    }

    fn run_to_fixpoint(&mut self, n: &mut Node) {
        debug_assert!(!self.changed, "Pass has already been run");
        loop {
            self.changed = false;
            self.run_postorder(n);
            if !self.changed {
                break;
            }
        }
    }
}

/// Run a "pass" on a regex, which is a function that takes a Node and maybe
/// returns a new node. \return true if something changed, false if nothing did.
fn run_pass<F>(r: &mut Regex, func: &mut F) -> bool
where
    F: FnMut(&mut Node, &Walk) -> PassAction,
{
    let mut p = Pass::new(func, r.flags.right_to_left);
    p.run_to_fixpoint(&mut r.node);
    p.changed
}

/// Merge runs of adjacent nodes. `merge` is given a node and its successor
/// and returns their combination, if they combine.
fn coalesce<F>(nodes: &mut Vec<Node>, mut merge: F) -> bool
where
    F: FnMut(&Node, &Node) -> Option<Node>,
{
    let mut changed = false;
    let mut result: Vec<Node> = Vec::with_capacity(nodes.len());
    for node in nodes.drain(..) {
        if let Some(prev) = result.last_mut() {
            if let Some(merged) = merge(prev, &node) {
                *prev = merged;
                changed = true;
                continue;
            }
        }
        result.push(node);
    }
    *nodes = result;
    changed
}

// Remove excess cats, and flatten alternations of alternations.
fn decat(n: &mut Node, _w: &Walk) -> PassAction {
    match n {
        Node::Cat(nodes) | Node::Alt(nodes) if nodes.len() <= 1 => match nodes.pop() {
            Some(node) => PassAction::Replace(node),
            None => PassAction::Remove,
        },
        Node::Cat(nodes) if nodes.iter().any(Node::is_cat) => {
            let mut decatted = Vec::with_capacity(nodes.len());
            for nn in std::mem::take(nodes) {
                match nn {
                    Node::Cat(mut nnodes) => decatted.append(&mut nnodes),
                    _ => decatted.push(nn),
                }
            }
            PassAction::Replace(Node::Cat(decatted))
        }
        Node::Alt(nodes) if nodes.iter().any(|nn| matches!(nn, Node::Alt(..))) => {
            // Ordered choice is associative.
            let mut flattened = Vec::with_capacity(nodes.len());
            for nn in std::mem::take(nodes) {
                match nn {
                    Node::Alt(mut nnodes) => flattened.append(&mut nnodes),
                    _ => flattened.push(nn),
                }
            }
            PassAction::Replace(Node::Alt(flattened))
        }
        _ => PassAction::Keep,
    }
}

// Remove empty Nodes.
fn remove_empties(n: &mut Node, _w: &Walk) -> PassAction {
    match n {
        Node::Cat(nodes) => {
            let blen = nodes.len();
            nodes.retain(|nn| !nn.is_empty());
            if nodes.len() == blen {
                PassAction::Keep
            } else {
                match nodes.pop() {
                    None => PassAction::Remove,
                    Some(last) if nodes.is_empty() => PassAction::Replace(last),
                    Some(last) => {
                        nodes.push(last);
                        PassAction::Modified
                    }
                }
            }
        }
        // An empty branch may still be followed by others, so an Alt only
        // goes away if every branch is empty.
        Node::Alt(nodes) if nodes.iter().all(Node::is_empty) => PassAction::Remove,
        Node::Loop { loopee, .. } if loopee.is_empty() => PassAction::Remove,
        Node::Atomic(contents) if contents.is_empty() => PassAction::Remove,
        Node::LookaroundAssertion {
            negate, contents, ..
        } if contents.is_empty() => {
            if *negate {
                PassAction::Replace(Node::make_always_fails())
            } else {
                PassAction::Remove
            }
        }
        _ => PassAction::Keep,
    }
}

// If a node can never match, replace it with an always fails node.
fn propagate_early_fails(n: &mut Node, _w: &Walk) -> PassAction {
    match n {
        Node::Fail => PassAction::Keep,
        Node::Class { class, .. } if class.is_empty() => {
            PassAction::Replace(Node::make_always_fails())
        }
        Node::Cat(nodes) if nodes.iter().any(Node::match_always_fails) => {
            PassAction::Replace(Node::make_always_fails())
        }
        Node::Alt(nodes) if nodes.iter().any(Node::match_always_fails) => {
            nodes.retain(|nn| !nn.match_always_fails());
            match nodes.len() {
                0 => PassAction::Replace(Node::make_always_fails()),
                1 => PassAction::Replace(nodes.pop().unwrap_or(Node::Fail)),
                _ => PassAction::Modified,
            }
        }
        Node::Loop { loopee, quant } | Node::Loop1CharBody { loopee, quant, .. }
            if loopee.match_always_fails() =>
        {
            if quant.min > 0 {
                PassAction::Replace(Node::make_always_fails())
            } else {
                PassAction::Remove
            }
        }
        Node::CaptureGroup { contents, .. } | Node::Atomic(contents)
            if contents.match_always_fails() =>
        {
            PassAction::Replace(Node::make_always_fails())
        }
        Node::LookaroundAssertion {
            negate, contents, ..
        } if contents.match_always_fails() => {
            if *negate {
                PassAction::Remove
            } else {
                PassAction::Replace(Node::make_always_fails())
            }
        }
        _ => PassAction::Keep,
    }
}

/// \return whether `c` lowers to `target` under either casing culture.
fn folds_to(c: char, target: char) -> bool {
    folds::fold(c, false) == target && folds::fold(c, true) == target
}

/// Reduce classes with one member, or one excluded member, to chars.
/// Alternations of chars become classes.
fn simplify_classes(n: &mut Node, _w: &Walk) -> PassAction {
    match n {
        Node::Class { class, icase } => {
            let icase = *icase;
            if let Some(c) = class.singleton() {
                if !icase || folds_to(c, c) {
                    return PassAction::Replace(Node::Char { c, icase });
                }
            }
            if let Some(c) = class.negated_singleton() {
                if !icase || folds_to(c, c) {
                    return PassAction::Replace(Node::NotChar { c, icase });
                }
            }
            if icase {
                // Members that all lower to one of themselves act as that char.
                if let Some(members) = class.small_members(MAX_FOLDABLE_CLASS_MEMBERS) {
                    if let Some(&first) = members.first() {
                        let c = folds::fold(first, false);
                        if members.contains(&c) && members.iter().all(|&m| folds_to(m, c))
                        {
                            return PassAction::Replace(Node::Char { c, icase: true });
                        }
                    }
                }
            }
            PassAction::Keep
        }
        Node::Alt(nodes) if nodes.len() > 1 => {
            let mut icase = None;
            let mut chars = Vec::with_capacity(nodes.len());
            for nn in nodes.iter() {
                match nn {
                    Node::Char { c, icase: ic } if icase.map_or(true, |prev| prev == *ic) => {
                        icase = Some(*ic);
                        chars.push(*c);
                    }
                    _ => return PassAction::Keep,
                }
            }
            let mut cc = CharClass::new();
            chars.iter().for_each(|&c| cc.add_char(c));
            cc.canonicalize();
            PassAction::Replace(Node::Class {
                class: cc.to_descriptor(),
                icase: icase.unwrap_or(false),
            })
        }
        _ => PassAction::Keep,
    }
}

/// Replace Loops with 1Char loops whenever possible, and drop trivial loops.
fn promote_1char_loops(n: &mut Node, _w: &Walk) -> PassAction {
    match n {
        Node::Loop { loopee, quant } => {
            if quant.max == 0 {
                return PassAction::Remove;
            }
            if quant.min == 1 && quant.max == 1 {
                return PassAction::Replace(std::mem::replace(loopee.as_mut(), Node::Empty));
            }
            if !loopee.matches_exactly_one_char() {
                return PassAction::Keep;
            }
            let loopee = std::mem::replace(loopee, Box::new(Node::Empty));
            PassAction::Replace(Node::Loop1CharBody {
                loopee,
                quant: *quant,
                atomic: false,
            })
        }
        _ => PassAction::Keep,
    }
}

/// Fold atomic groups into what they contain where atomicity is implied.
fn simplify_atomics(n: &mut Node, _w: &Walk) -> PassAction {
    let Node::Atomic(contents) = n else {
        return PassAction::Keep;
    };
    let inner = contents.as_mut();
    let unwrap = match *inner {
        Node::Atomic(..) => true,
        Node::Loop1CharBody { ref mut atomic, .. } => {
            *atomic = true;
            true
        }
        _ => inner.matches_exactly_one_char() || inner.is_zero_width(),
    };
    if unwrap {
        PassAction::Replace(std::mem::replace(inner, Node::Empty))
    } else {
        PassAction::Keep
    }
}

/// \return whether two one-char nodes match the same chars.
fn same_single_char(a: &Node, b: &Node) -> bool {
    match (a, b) {
        (Node::Char { c: c1, icase: i1 }, Node::Char { c: c2, icase: i2 })
        | (Node::NotChar { c: c1, icase: i1 }, Node::NotChar { c: c2, icase: i2 }) => {
            c1 == c2 && i1 == i2
        }
        (Node::MatchAny, Node::MatchAny) => true,
        (
            Node::Class {
                class: c1,
                icase: i1,
            },
            Node::Class {
                class: c2,
                icase: i2,
            },
        ) => c1 == c2 && i1 == i2,
        _ => false,
    }
}

/// View a node as a non-atomic loop over a one-char body.
/// A lone one-char node is a loop of exactly one iteration.
fn as_1char_loop(n: &Node) -> Option<(&Node, Quantifier, bool)> {
    match n {
        Node::Loop1CharBody {
            loopee,
            quant,
            atomic: false,
        } => Some((loopee, *quant, true)),
        _ if n.matches_exactly_one_char() => Some((
            n,
            Quantifier {
                min: 1,
                max: 1,
                greedy: true,
            },
            false,
        )),
        _ => None,
    }
}

fn add_max(a: usize, b: usize) -> usize {
    if a == INFINITE || b == INFINITE {
        INFINITE
    } else {
        a.checked_add(b).unwrap_or(INFINITE)
    }
}

/// Merge `a*a*`, `a*a` and `aa*` style neighbors into one loop.
fn merge_loops(n: &mut Node, _w: &Walk) -> PassAction {
    let Node::Cat(nodes) = n else {
        return PassAction::Keep;
    };
    let changed = coalesce(nodes, |prev, next| {
        let (body1, q1, is_loop1) = as_1char_loop(prev)?;
        let (body2, q2, is_loop2) = as_1char_loop(next)?;
        if !(is_loop1 || is_loop2) || !same_single_char(body1, body2) {
            return None;
        }
        let greedy = match (is_loop1, is_loop2) {
            (true, true) if q1.greedy != q2.greedy => return None,
            (true, _) => q1.greedy,
            _ => q2.greedy,
        };
        Some(Node::Loop1CharBody {
            loopee: Box::new(body1.clone()),
            quant: Quantifier {
                min: q1.min.saturating_add(q2.min),
                max: add_max(q1.max, q2.max),
                greedy,
            },
            atomic: false,
        })
    });
    if changed {
        PassAction::Modified
    } else {
        PassAction::Keep
    }
}

/// \return the text and case-sensitivity of a literal node.
fn literal_text(n: &Node) -> Option<(String, bool)> {
    match n {
        Node::Char { c, icase } => Some((c.to_string(), *icase)),
        Node::Literal { chars, icase } => Some((chars.clone(), *icase)),
        _ => None,
    }
}

fn make_literal(chars: String, icase: bool) -> Node {
    let mut iter = chars.chars();
    match (iter.next(), iter.next()) {
        (None, _) => Node::Empty,
        (Some(c), None) => Node::Char { c, icase },
        _ => Node::Literal { chars, icase },
    }
}

/// Replace runs of chars with literals.
fn merge_literals(n: &mut Node, w: &Walk) -> PassAction {
    let Node::Cat(nodes) = n else {
        return PassAction::Keep;
    };
    let backwards = w.backwards;
    let changed = coalesce(nodes, |prev, next| {
        let (first, icase1) = literal_text(prev)?;
        let (second, icase2) = literal_text(next)?;
        if icase1 != icase2 {
            return None;
        }
        // Backwards, a Cat is in reverse text order, but literals are always
        // stored in text order.
        let text = if backwards {
            second + &first
        } else {
            first + &second
        };
        Some(make_literal(text, icase1))
    });
    if changed {
        PassAction::Modified
    } else {
        PassAction::Keep
    }
}

/// A single-char test, for disjointness checks.
#[derive(Debug, Copy, Clone)]
enum CharTest<'a> {
    Char(char, bool),
    NotChar(char, bool),
    Class(&'a ClassDescriptor, bool),
    Any,
}

impl<'a> CharTest<'a> {
    fn of(n: &'a Node) -> Option<CharTest<'a>> {
        match n {
            Node::Char { c, icase } => Some(CharTest::Char(*c, *icase)),
            Node::NotChar { c, icase } => Some(CharTest::NotChar(*c, *icase)),
            Node::Class { class, icase } => Some(CharTest::Class(class, *icase)),
            Node::MatchAny => Some(CharTest::Any),
            _ => None,
        }
    }

    /// \return false only if no char can pass both tests.
    fn may_overlap(self, other: CharTest) -> bool {
        use CharTest::*;
        // Either casing culture may be in effect.
        let folds = |c| [folds::fold(c, false), folds::fold(c, true)];
        match (self, other) {
            (Any, _) | (_, Any) => true,
            (Char(a, ia), Char(b, ib)) => match (ia, ib) {
                (false, false) => a == b,
                (true, true) => a == b,
                (true, false) => folds(b).contains(&a),
                (false, true) => folds(a).contains(&b),
            },
            (Char(a, ia), NotChar(b, ib)) | (NotChar(b, ib), Char(a, ia)) => {
                !(ia == ib && a == b)
            }
            (Char(c, ic), Class(class, icl)) | (Class(class, icl), Char(c, ic)) => {
                match (ic, icl) {
                    (false, false) | (true, true) => class.contains(c),
                    (false, true) => folds(c).iter().any(|&f| class.contains(f)),
                    (true, false) => true,
                }
            }
            (Class(a, ia), Class(b, ib)) => ia != ib || a.may_overlap(b),
            (NotChar(..), _) | (_, NotChar(..)) => true,
        }
    }
}

/// \return a test that the first char consumed by a node must pass, if the
/// node always consumes at least one char.
fn leading_char_test(n: &Node, backwards: bool) -> Option<CharTest<'_>> {
    match n {
        Node::Char { .. } | Node::NotChar { .. } | Node::Class { .. } | Node::MatchAny => {
            CharTest::of(n)
        }
        Node::Literal { chars, icase } => {
            let c = if backwards {
                chars.chars().next_back()
            } else {
                chars.chars().next()
            };
            c.map(|c| CharTest::Char(c, *icase))
        }
        Node::Loop1CharBody { loopee, quant, .. } if quant.min > 0 => CharTest::of(loopee),
        Node::Cat(nodes) => leading_char_test(nodes.first()?, backwards),
        Node::CaptureGroup { contents, .. } | Node::Atomic(contents) => {
            leading_char_test(contents, backwards)
        }
        _ => None,
    }
}

/// \return whether what follows a greedy loop can never give back chars to
/// it, so the loop may be made atomic.
fn follower_excludes(body: &Node, follower: &Node, backwards: bool) -> bool {
    let Some(body_test) = CharTest::of(body) else {
        return false;
    };
    match follower {
        Node::Anchor(AnchorType::End) if !backwards => true,
        Node::Anchor(AnchorType::Beginning) if backwards => true,
        Node::Anchor(AnchorType::EndZ) if !backwards => {
            !body_test.may_overlap(CharTest::Char('\n', false))
        }
        Node::Alt(branches) => branches.iter().all(|b| follower_excludes(body, b, backwards)),
        _ => match leading_char_test(follower, backwards) {
            Some(test) => !body_test.may_overlap(test),
            None => false,
        },
    }
}

/// Make greedy single-char loops atomic when their follower cannot match
/// what they would give back.
fn auto_atomicize(n: &mut Node, w: &Walk) -> PassAction {
    let Node::Cat(nodes) = n else {
        return PassAction::Keep;
    };
    let mut changed = false;
    for idx in 1..nodes.len() {
        let (head, tail) = nodes.split_at_mut(idx);
        if let Some(Node::Loop1CharBody {
            loopee,
            quant,
            atomic,
        }) = head.last_mut()
        {
            if !*atomic && quant.greedy && follower_excludes(loopee, &tail[0], w.backwards) {
                *atomic = true;
                changed = true;
            }
        }
    }
    if changed {
        PassAction::Modified
    } else {
        PassAction::Keep
    }
}

/// Make a trailing greedy single-char loop atomic: nothing after it can fail,
/// so giving back chars never helps. \return whether anything changed.
fn atomicize_tail(n: &mut Node) -> bool {
    match n {
        Node::Loop1CharBody {
            quant, atomic, ..
        } if quant.greedy && !*atomic && quant.min != quant.max => {
            *atomic = true;
            true
        }
        Node::Cat(nodes) => {
            let last = match nodes.last() {
                Some(Node::Goal) => nodes.len().checked_sub(2),
                Some(_) => Some(nodes.len() - 1),
                None => None,
            };
            match last {
                Some(idx) => atomicize_tail(&mut nodes[idx]),
                None => false,
            }
        }
        Node::CaptureGroup { contents, .. } | Node::Atomic(contents) => atomicize_tail(contents),
        Node::Alt(branches) => branches
            .iter_mut()
            .fold(false, |changed, b| atomicize_tail(b) | changed),
        Node::BackrefConditional { yes, no, .. } | Node::ExprConditional { yes, no, .. } => {
            atomicize_tail(yes) | atomicize_tail(no)
        }
        _ => false,
    }
}

/// Eliminate backtracking into the last loop of the whole regex, and of
/// every atomic group and lookaround body.
fn eliminate_ending_backtracking(r: &mut Regex) -> bool {
    let mut changed = atomicize_tail(&mut r.node);
    walk_mut(false, r.flags.right_to_left, &mut r.node, &mut |n, _w| match n {
        Node::LookaroundAssertion { contents, .. } | Node::Atomic(contents) => {
            changed |= atomicize_tail(contents);
        }
        _ => {}
    });
    changed
}

/// \return the leading literal of an alternation branch.
fn leading_literal(n: &Node) -> Option<(String, bool)> {
    match n {
        Node::Cat(nodes) => literal_text(nodes.first()?),
        _ => literal_text(n),
    }
}

/// Remove the first `count` chars of a branch's leading literal.
fn strip_leading_literal(n: &mut Node, count: usize) {
    let target = match n {
        Node::Cat(nodes) if !nodes.is_empty() => &mut nodes[0],
        _ => n,
    };
    if let Some((text, icase)) = literal_text(target) {
        let rest: String = text.chars().skip(count).collect();
        *target = make_literal(rest, icase);
    }
}

/// Hoist a literal that begins every branch of an alternation out in front
/// of it. Only valid going forwards.
fn extract_common_prefix(n: &mut Node, w: &Walk) -> PassAction {
    if w.backwards {
        return PassAction::Keep;
    }
    let Node::Alt(branches) = n else {
        return PassAction::Keep;
    };
    let mut prefix: Option<(Vec<char>, bool)> = None;
    for branch in branches.iter() {
        let Some((text, icase)) = leading_literal(branch) else {
            return PassAction::Keep;
        };
        prefix = Some(match prefix {
            None => (text.chars().collect(), icase),
            Some((common, prev_icase)) => {
                if prev_icase != icase {
                    return PassAction::Keep;
                }
                let len = common
                    .iter()
                    .zip(text.chars())
                    .take_while(|(a, b)| *a == b)
                    .count();
                (common[..len].to_vec(), icase)
            }
        });
    }
    let Some((common, icase)) = prefix else {
        return PassAction::Keep;
    };
    if common.is_empty() {
        return PassAction::Keep;
    }
    let mut branches = std::mem::take(branches);
    branches
        .iter_mut()
        .for_each(|b| strip_leading_literal(b, common.len()));
    PassAction::Replace(Node::Cat(vec![
        make_literal(common.into_iter().collect(), icase),
        Node::Alt(branches),
    ]))
}

/// Optimize a regex in place, running every pass until none applies.
pub fn optimize(r: &mut Regex) {
    let depth = r.max_depth();
    if depth > MAX_OPTIMIZE_DEPTH {
        debug!("Regex is {} deep, skipping optimization", depth);
        return;
    }
    loop {
        let mut changed = false;
        changed |= run_pass(r, &mut decat);
        changed |= run_pass(r, &mut remove_empties);
        changed |= run_pass(r, &mut propagate_early_fails);
        changed |= run_pass(r, &mut simplify_classes);
        changed |= run_pass(r, &mut promote_1char_loops);
        changed |= run_pass(r, &mut simplify_atomics);
        changed |= run_pass(r, &mut merge_loops);
        changed |= run_pass(r, &mut merge_literals);
        changed |= run_pass(r, &mut extract_common_prefix);
        changed |= run_pass(r, &mut auto_atomicize);
        changed |= eliminate_ending_backtracking(r);
        if !changed {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::try_parse;
    use crate::types::Flags;

    fn optimized(pattern: &str, flags: &str) -> Regex {
        let mut re = try_parse(pattern, Flags::from(flags)).unwrap();
        optimize(&mut re);
        re
    }

    /// The optimized regex without its trailing Goal.
    fn body(re: &Regex) -> Node {
        match &re.node {
            Node::Cat(nodes) => {
                let mut nodes = nodes.clone();
                if matches!(nodes.last(), Some(Node::Goal)) {
                    nodes.pop();
                }
                if nodes.len() == 1 {
                    nodes.remove(0)
                } else {
                    Node::Cat(nodes)
                }
            }
            Node::Goal => Node::Empty,
            other => other.clone(),
        }
    }

    #[test]
    fn idempotent() {
        for pattern in [
            r"abc|abd|ab",
            r"a*a+b?\d+x",
            r"(?<n>foo)+[a]bar\w*$",
            r"(?=ab*)(?<=xy+)z",
            r"(?:a|b|c)d|e",
            r"[^\n]x{2,}x{3}",
        ] {
            for flags in ["", "i", "r"] {
                let once = optimized(pattern, flags);
                let mut twice = once.clone();
                optimize(&mut twice);
                assert_eq!(once.to_string(), twice.to_string(), "pattern {}", pattern);
            }
        }
    }

    #[test]
    fn literals_merge() {
        let re = optimized("abc", "");
        assert!(matches!(body(&re), Node::Literal { ref chars, .. } if chars == "abc"));
        // Backwards literals keep text order.
        let re = optimized("abc", "r");
        assert!(matches!(body(&re), Node::Literal { ref chars, .. } if chars == "abc"));
    }

    #[test]
    fn loops_merge() {
        let re = optimized("xa*aa{2,3}", "");
        let Node::Cat(nodes) = body(&re) else {
            panic!("expected a Cat: {}", re)
        };
        let Node::Loop1CharBody { quant, .. } = &nodes[1] else {
            panic!("expected a loop: {}", re)
        };
        assert_eq!((quant.min, quant.max), (3, INFINITE));
    }

    #[test]
    fn prefix_extraction() {
        let re = optimized("abc|abd", "");
        let Node::Cat(nodes) = body(&re) else {
            panic!("expected a Cat: {}", re)
        };
        assert!(matches!(&nodes[0], Node::Literal { chars, .. } if chars == "ab"));
        assert!(matches!(&nodes[1], Node::Class { .. }));
    }

    #[test]
    fn singleton_classes() {
        let re = optimized("[a]", "");
        assert!(matches!(body(&re), Node::Char { c: 'a', icase: false }));
        let re = optimized("[^a]", "");
        assert!(matches!(body(&re), Node::NotChar { c: 'a', icase: false }));
        let re = optimized("[Aa]", "i");
        assert!(matches!(body(&re), Node::Char { c: 'a', icase: true }));
    }

    #[test]
    fn atomic_inference() {
        // \d+ cannot give back to a letter.
        let re = optimized(r"\d+x", "");
        let Node::Cat(nodes) = body(&re) else {
            panic!("expected a Cat: {}", re)
        };
        assert!(matches!(&nodes[0], Node::Loop1CharBody { atomic: true, .. }));

        // .+ may overlap x.
        let re = optimized(r".+x\d", "");
        let Node::Cat(nodes) = body(&re) else {
            panic!("expected a Cat: {}", re)
        };
        assert!(matches!(&nodes[0], Node::Loop1CharBody { atomic: false, .. }));
    }

    #[test]
    fn ending_loops_become_atomic() {
        let re = optimized(r"ab+", "");
        let Node::Cat(nodes) = body(&re) else {
            panic!("expected a Cat: {}", re)
        };
        assert!(matches!(&nodes[1], Node::Loop1CharBody { atomic: true, .. }));
        // Lazy loops are left alone.
        let re = optimized(r"ab+?", "");
        let Node::Cat(nodes) = body(&re) else {
            panic!("expected a Cat: {}", re)
        };
        assert!(matches!(&nodes[1], Node::Loop1CharBody { atomic: false, .. }));
    }

    #[test]
    fn early_fails() {
        let re = optimized(r"a(?!)b|c", "");
        assert!(matches!(body(&re), Node::Char { c: 'c', .. }));
    }

    #[test]
    fn deep_trees_are_left_alone() {
        let nested = |n: usize| "(".repeat(n) + "ab" + &")".repeat(n);

        let mut shallow = try_parse(&nested(100), Flags::default()).unwrap();
        let before = shallow.node_count();
        optimize(&mut shallow);
        assert!(shallow.node_count() < before, "{}", shallow);

        // The deepest nesting the parser accepts is past the guard.
        let mut deep = try_parse(&nested(MAX_PARSE_DEPTH), Flags::default()).unwrap();
        assert!(deep.max_depth() > MAX_OPTIMIZE_DEPTH);
        let before = deep.to_string();
        optimize(&mut deep);
        assert_eq!(deep.to_string(), before);
    }
}
