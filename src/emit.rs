//! Regex compiler back-end: transforms IR into a CompiledRegex

use crate::charclass::ClassDescriptor;
use crate::insn::{CompiledRegex, Insn, LoopFields};
use crate::ir;
use crate::ir::Node;
use crate::startpredicate;
use crate::types::{JumpTarget, LoopID};
use std::sync::Arc;

/// A forward reference to an instruction offset, resolved after emission.
type Label = JumpTarget;

/// Pending emission work. Nodes are expanded into further work items, so the
/// tree is walked without recursion.
enum Work<'n> {
    Node(&'n Node),
    Insn(Insn),
    Bind(Label),
}

/// Type which wraps up the context needed to emit a CompiledRegex.
struct Emitter<'n> {
    result: CompiledRegex,

    // Offset bound to each label, once known.
    labels: Vec<Option<u32>>,

    // Work remaining, popped from the back.
    stack: Vec<Work<'n>>,

    // Number of loops seen so far.
    next_loop_id: usize,
}

impl<'n> Emitter<'n> {
    fn new_label(&mut self) -> Label {
        self.labels.push(None);
        (self.labels.len() - 1) as Label
    }

    /// \return the offset of the next instruction emitted.
    fn next_offset(&self) -> u32 {
        self.result.insns.len() as u32
    }

    /// Intern a class, returning its index.
    fn intern_class(&mut self, class: &ClassDescriptor) -> usize {
        match self.result.classes.iter().position(|c| c == class) {
            Some(idx) => idx,
            None => {
                self.result.classes.push(class.clone());
                self.result.classes.len() - 1
            }
        }
    }

    /// Intern a literal, returning its index.
    fn intern_literal(&mut self, s: &str) -> usize {
        match self.result.literals.iter().position(|l| &**l == s) {
            Some(idx) => idx,
            None => {
                self.result.literals.push(s.into());
                self.result.literals.len() - 1
            }
        }
    }

    /// Queue work items to run in the given order.
    fn schedule(&mut self, items: Vec<Work<'n>>) {
        self.stack.extend(items.into_iter().rev());
    }

    /// Expand a node into instructions and further work.
    fn expand(&mut self, node: &'n Node) {
        match node {
            Node::Empty => {}
            Node::Goal => self.stack.push(Work::Insn(Insn::Goal)),
            Node::Fail => self.stack.push(Work::Insn(Insn::JustFail)),
            &Node::Char { c, icase } => self.stack.push(Work::Insn(Insn::Char { c, icase })),
            &Node::NotChar { c, icase } => {
                self.stack.push(Work::Insn(Insn::NotChar { c, icase }))
            }
            Node::MatchAny => self.stack.push(Work::Insn(Insn::MatchAny)),
            Node::Literal { chars, icase } => {
                let idx = self.intern_literal(chars);
                self.stack.push(Work::Insn(Insn::Literal { idx, icase: *icase }))
            }
            Node::Class { class, icase } => {
                let idx = self.intern_class(class);
                self.stack.push(Work::Insn(Insn::Class { idx, icase: *icase }))
            }
            &Node::Anchor(anchor) => self.stack.push(Work::Insn(Insn::Anchor(anchor))),
            &Node::WordBoundary { invert, ecma } => {
                self.stack.push(Work::Insn(Insn::WordBoundary { invert, ecma }))
            }
            &Node::BackRef { group, icase } => self.stack.push(Work::Insn(Insn::BackRef {
                slot: group,
                icase,
            })),
            Node::Cat(children) => self.schedule(children.iter().map(Work::Node).collect()),
            Node::Alt(branches) => {
                // Each branch but the last is preceded by an Alt pointing at
                // the next branch, and followed by a jump to the exit.
                let exit = self.new_label();
                let mut items = Vec::with_capacity(branches.len() * 4 + 1);
                if let Some((last, rest)) = branches.split_last() {
                    for branch in rest {
                        let next = self.new_label();
                        items.push(Work::Insn(Insn::Alt { secondary: next }));
                        items.push(Work::Node(branch));
                        items.push(Work::Insn(Insn::Jump { target: exit }));
                        items.push(Work::Bind(next));
                    }
                    items.push(Work::Node(last));
                }
                items.push(Work::Bind(exit));
                self.schedule(items)
            }
            Node::CaptureGroup {
                contents,
                group,
                uncapture,
            } => self.schedule(vec![
                Work::Insn(Insn::BeginCapture),
                Work::Node(contents),
                Work::Insn(Insn::EndCapture {
                    slot: *group,
                    uncapture: *uncapture,
                }),
            ]),
            Node::LookaroundAssertion {
                negate,
                backwards,
                contents,
            } => {
                let continuation = self.new_label();
                let insn = if *backwards {
                    Insn::Lookbehind {
                        negate: *negate,
                        continuation,
                    }
                } else {
                    Insn::Lookahead {
                        negate: *negate,
                        continuation,
                    }
                };
                self.schedule(vec![
                    Work::Insn(insn),
                    Work::Node(contents),
                    Work::Insn(Insn::Goal),
                    Work::Bind(continuation),
                ])
            }
            Node::Atomic(contents) => {
                let continuation = self.new_label();
                self.schedule(vec![
                    Work::Insn(Insn::Atomic { continuation }),
                    Work::Node(contents),
                    Work::Insn(Insn::Goal),
                    Work::Bind(continuation),
                ])
            }
            Node::Loop { loopee, quant } => {
                let loop_id = self.next_loop_id as LoopID;
                self.next_loop_id += 1;
                let begin = self.new_label();
                let exit = self.new_label();
                self.schedule(vec![
                    Work::Bind(begin),
                    Work::Insn(Insn::EnterLoop(LoopFields {
                        loop_id,
                        min_iters: quant.min,
                        max_iters: quant.max,
                        greedy: quant.greedy,
                        exit,
                    })),
                    Work::Node(loopee),
                    Work::Insn(Insn::LoopAgain { begin }),
                    Work::Bind(exit),
                ])
            }
            Node::Loop1CharBody {
                loopee,
                quant,
                atomic,
            } => {
                debug_assert!(loopee.matches_exactly_one_char());
                // An atomic lazy loop never takes more than its minimum.
                let (max_iters, greedy) = if *atomic && !quant.greedy {
                    (quant.min, true)
                } else {
                    (quant.max, quant.greedy)
                };
                self.schedule(vec![
                    Work::Insn(Insn::Loop1CharBody {
                        min_iters: quant.min,
                        max_iters,
                        greedy,
                        atomic: *atomic,
                    }),
                    Work::Node(loopee),
                ])
            }
            Node::BackrefConditional { group, yes, no } => {
                let no_label = self.new_label();
                let exit = self.new_label();
                self.schedule(vec![
                    Work::Insn(Insn::BackrefCondition {
                        slot: *group,
                        no: no_label,
                    }),
                    Work::Node(yes),
                    Work::Insn(Insn::Jump { target: exit }),
                    Work::Bind(no_label),
                    Work::Node(no),
                    Work::Bind(exit),
                ])
            }
            Node::ExprConditional { condition, yes, no } => {
                let yes_label = self.new_label();
                let no_label = self.new_label();
                let exit = self.new_label();
                self.schedule(vec![
                    Work::Insn(Insn::ExprCondition {
                        yes: yes_label,
                        no: no_label,
                    }),
                    Work::Node(condition),
                    Work::Insn(Insn::Goal),
                    Work::Bind(yes_label),
                    Work::Node(yes),
                    Work::Insn(Insn::Jump { target: exit }),
                    Work::Bind(no_label),
                    Work::Node(no),
                    Work::Bind(exit),
                ])
            }
        }
    }

    /// Drain the work stack.
    fn run(&mut self) {
        while let Some(work) = self.stack.pop() {
            match work {
                Work::Node(node) => self.expand(node),
                Work::Insn(insn) => {
                    if insn.may_backtrack() {
                        self.result.track_count += 1;
                    }
                    self.result.insns.push(insn)
                }
                Work::Bind(label) => {
                    debug_assert!(self.labels[label as usize].is_none(), "Label bound twice");
                    self.labels[label as usize] = Some(self.next_offset());
                }
            }
        }
    }

    /// Replace labels with the offsets they were bound to.
    fn relocate(&mut self) {
        let labels = &self.labels;
        let resolve = |target: &mut JumpTarget| match labels[*target as usize] {
            Some(offset) => *target = offset,
            None => unreachable!("Label {} was never bound", target),
        };
        for insn in self.result.insns.iter_mut() {
            match insn {
                Insn::Atomic { continuation }
                | Insn::Lookahead { continuation, .. }
                | Insn::Lookbehind { continuation, .. } => resolve(continuation),
                Insn::EnterLoop(fields) => resolve(&mut fields.exit),
                Insn::LoopAgain { begin } => resolve(begin),
                Insn::Alt { secondary } => resolve(secondary),
                Insn::Jump { target } => resolve(target),
                Insn::BackrefCondition { no, .. } => resolve(no),
                Insn::ExprCondition { yes, no } => {
                    resolve(yes);
                    resolve(no);
                }
                _ => {}
            }
        }
    }
}

/// Compile the given IR to a CompiledRegex.
pub fn emit(n: &ir::Regex) -> CompiledRegex {
    let mut emitter = Emitter {
        labels: Vec::new(),
        stack: vec![Work::Node(&n.node)],
        next_loop_id: 0,
        result: CompiledRegex {
            insns: Vec::new(),
            classes: Vec::new(),
            literals: Vec::new(),
            start_pred: startpredicate::predicate_for_re(n),
            min_length: n.node.min_length(),
            loops: 0,
            track_count: 0,
            groups: Arc::new(n.groups.clone()),
            flags: n.flags,
        },
    };
    emitter.run();
    emitter.relocate();
    emitter.result.loops = emitter.next_loop_id;
    emitter.result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizer;
    use crate::parse;
    use crate::types::Flags;

    fn compile(pattern: &str, optimize: bool) -> CompiledRegex {
        let mut re = parse::try_parse(pattern, Flags::default()).expect("should parse");
        if optimize {
            optimizer::optimize(&mut re);
        }
        emit(&re)
    }

    #[test]
    fn alternation_targets() {
        let cr = compile("a|b|c", false);
        let alts: Vec<u32> = cr
            .insns
            .iter()
            .filter_map(|insn| match insn {
                Insn::Alt { secondary } => Some(*secondary),
                _ => None,
            })
            .collect();
        assert_eq!(alts.len(), 2);
        for target in alts {
            assert!(matches!(cr.insns[target as usize], Insn::Alt { .. } | Insn::Char { .. }));
        }
        assert!(matches!(cr.insns.last(), Some(Insn::Goal)));
    }

    #[test]
    fn loops_and_interning() {
        let cr = compile("(?:ab)+x(?:ab)*", true);
        assert_eq!(cr.loops, 2);
        assert_eq!(cr.literals.len(), 1);
        for insn in &cr.insns {
            if let Insn::LoopAgain { begin } = insn {
                assert!(matches!(cr.insns[*begin as usize], Insn::EnterLoop(..)));
            }
        }
        assert!(cr.track_count >= 4);
    }

    #[test]
    fn deep_nesting_emits() {
        let pattern = "(".repeat(200) + "a" + &")".repeat(200);
        let cr = compile(&pattern, false);
        assert_eq!(cr.groups.len(), 201);
        assert_eq!(
            cr.insns.iter().filter(|i| matches!(i, Insn::BeginCapture)).count(),
            200
        );
    }
}
