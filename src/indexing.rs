//! Positions into the subject text, and stepping over it in either direction.
//! Positions are byte offsets that always lie on char boundaries.

use crate::folds;
use std::ops::Range;

#[derive(Debug, Copy, Clone)]
pub struct Forward;

#[derive(Debug, Copy, Clone)]
pub struct Backward;

pub trait Direction: std::fmt::Debug + Copy + Clone {
    const FORWARD: bool;
    fn new() -> Self;
}

impl Direction for Forward {
    const FORWARD: bool = true;
    #[inline(always)]
    fn new() -> Self {
        Forward {}
    }
}

impl Direction for Backward {
    const FORWARD: bool = false;
    #[inline(always)]
    fn new() -> Self {
        Backward {}
    }
}

/// The subject text of a match.
#[derive(Debug, Copy, Clone)]
pub struct Input<'t> {
    text: &'t str,
}

impl<'t> Input<'t> {
    pub fn new(text: &'t str) -> Self {
        Input { text }
    }

    #[inline(always)]
    pub fn text(&self) -> &'t str {
        self.text
    }

    #[inline(always)]
    pub fn bytes(&self) -> &'t [u8] {
        self.text.as_bytes()
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// \return the char to the right of `pos`.
    #[inline(always)]
    pub fn peek_right(&self, pos: usize) -> Option<char> {
        self.text[pos..].chars().next()
    }

    /// \return the char to the left of `pos`.
    #[inline(always)]
    pub fn peek_left(&self, pos: usize) -> Option<char> {
        self.text[..pos].chars().next_back()
    }

    /// \return the next char in direction Dir, updating the position.
    #[inline(always)]
    pub fn next<Dir: Direction>(&self, pos: &mut usize) -> Option<char> {
        if Dir::FORWARD {
            let c = self.peek_right(*pos)?;
            *pos += c.len_utf8();
            Some(c)
        } else {
            let c = self.peek_left(*pos)?;
            *pos -= c.len_utf8();
            Some(c)
        }
    }

    /// \return the next char in direction Dir without moving.
    #[inline(always)]
    pub fn peek<Dir: Direction>(&self, pos: usize) -> Option<char> {
        if Dir::FORWARD {
            self.peek_right(pos)
        } else {
            self.peek_left(pos)
        }
    }

    /// Match a literal string exactly, moving in direction Dir.
    /// The literal is in text order regardless of direction.
    #[inline]
    pub fn match_str<Dir: Direction>(&self, pos: &mut usize, s: &str) -> bool {
        let bytes = self.bytes();
        if Dir::FORWARD {
            if bytes[*pos..].starts_with(s.as_bytes()) {
                *pos += s.len();
                return true;
            }
        } else if bytes[..*pos].ends_with(s.as_bytes()) {
            *pos -= s.len();
            return true;
        }
        false
    }

    /// Match a lowered literal case-insensitively, moving in direction Dir.
    #[inline]
    pub fn match_str_icase<Dir: Direction>(
        &self,
        pos: &mut usize,
        lowered: &str,
        culture_invariant: bool,
    ) -> bool {
        let mut p = *pos;
        let ok = if Dir::FORWARD {
            lowered.chars().all(|lc| {
                self.next::<Dir>(&mut p)
                    .map_or(false, |c| folds::fold(c, culture_invariant) == lc)
            })
        } else {
            lowered.chars().rev().all(|lc| {
                self.next::<Dir>(&mut p)
                    .map_or(false, |c| folds::fold(c, culture_invariant) == lc)
            })
        };
        if ok {
            *pos = p;
        }
        ok
    }

    /// Match the text of a previous capture at `pos`, moving in direction Dir.
    #[inline]
    pub fn match_capture<Dir: Direction>(
        &self,
        pos: &mut usize,
        capture: Range<usize>,
        icase: bool,
        culture_invariant: bool,
    ) -> bool {
        let captured = &self.text[capture];
        if !icase {
            return self.match_str::<Dir>(pos, captured);
        }
        let mut p = *pos;
        let eq = |a: char, b: char| folds::eq_icase(a, b, culture_invariant);
        let ok = if Dir::FORWARD {
            captured
                .chars()
                .all(|cc| self.next::<Dir>(&mut p).map_or(false, |c| eq(c, cc)))
        } else {
            captured
                .chars()
                .rev()
                .all(|cc| self.next::<Dir>(&mut p).map_or(false, |c| eq(c, cc)))
        };
        if ok {
            *pos = p;
        }
        ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stepping() {
        let input = Input::new("aé€");
        let mut pos = 0;
        assert_eq!(input.next::<Forward>(&mut pos), Some('a'));
        assert_eq!(input.next::<Forward>(&mut pos), Some('é'));
        assert_eq!(pos, 3);
        assert_eq!(input.next::<Backward>(&mut pos), Some('é'));
        assert_eq!(pos, 1);
        let mut end = input.len();
        assert_eq!(input.next::<Backward>(&mut end), Some('€'));
        assert_eq!(input.peek::<Forward>(input.len()), None);
    }

    #[test]
    fn literals() {
        let input = Input::new("Hello World");
        let mut pos = 6;
        assert!(input.match_str::<Forward>(&mut pos, "World"));
        assert_eq!(pos, 11);
        assert!(input.match_str::<Backward>(&mut pos, "World"));
        assert_eq!(pos, 6);
        let mut pos = 0;
        assert!(input.match_str_icase::<Forward>(&mut pos, "hello", false));
        assert_eq!(pos, 5);
        assert!(input.match_str_icase::<Backward>(&mut pos, "hello", false));
        assert_eq!(pos, 0);
        let mut pos = 6;
        assert!(!input.match_capture::<Forward>(&mut pos, 0..5, false, false));
        assert!(input.match_capture::<Forward>(&mut pos, 6..11, false, false));
    }
}
