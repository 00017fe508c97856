/*!

# retrace - a backtracking regex engine with .NET syntax

This crate provides a regular expression engine which targets the .NET regular expression dialect: named and balancing groups, full capture histories, conditionals, atomic groups, lookbehind of any width and right-to-left matching.

# Example: test if a string contains a match

```rust
use retrace::Regex;
let re = Regex::new(r"\d{4}").unwrap();
assert!(re.is_match("2020-20-05").unwrap());
```

Searching returns a `Result` because a regex may be built with a match timeout; a search which runs past it fails with [`Error::MatchTimeout`] instead of returning a partial result.

# Example: iterating over matches

Here we use a backreference to find doubled characters:

```rust
use retrace::Regex;
let re = Regex::new(r"(\w)\1").unwrap();
let text = "Frankly, Miss Piggy, I don't give a hoot!";
let doubled: Vec<&str> = re
    .find_iter(text)
    .map(|m| m.map(|m| m.as_str()))
    .collect::<Result<_, _>>()
    .unwrap();
assert_eq!(doubled, vec!["ss", "gg", "oo"]);
```

# Example: using capture groups

Groups may be accessed by number or by name. A group inside a loop remembers every capture it made, not just the last one.

```rust
use retrace::Regex;
let re = Regex::new(r"(?<year>\d{4})-(?<month>\d{2})").unwrap();
let m = re.find("x 2024-05 y").unwrap().unwrap();
assert_eq!(m.start(), 2);
assert_eq!(m.name("year").unwrap().as_str(), "2024");
assert_eq!(m.name("month").unwrap().as_str(), "05");

let re = Regex::new(r"(?:(\w),?)+").unwrap();
let m = re.find("a,b,c").unwrap().unwrap();
let letters: Vec<&str> = m.group(1).unwrap().captures().collect();
assert_eq!(letters, vec!["a", "b", "c"]);
```

# Example: balancing groups

Balancing groups pop a capture off another group, which lets a pattern match nested constructs:

```rust
use retrace::Regex;
let re = Regex::new(r"^\((?>[^()]+|\((?<depth>)|\)(?<-depth>))*(?(depth)(?!))\)$").unwrap();
assert!(re.is_match("(a(b)(c(d)))").unwrap());
assert!(!re.is_match("(a(b)").unwrap());
```

# Flags

Flags may be given as a string of letters, as in `Regex::with_flags(pattern, "im")`:

- `i`: case-insensitive.
- `m`: `^` and `$` match at line boundaries.
- `n`: only named or explicitly numbered groups capture.
- `s`: `.` matches `\n`.
- `x`: unescaped whitespace in the pattern is ignored and `#` starts a comment.
- `r`: scan from right to left.
- `e`: ECMAScript behavior. May only be combined with `i` and `m`.
- `c`: case-insensitive matching ignores culture-specific mappings.

[`RegexBuilder`] sets the same options one at a time, along with a match timeout.

# Architecture

retrace has a parser, intermediate representation, optimizer which acts on the IR, bytecode emitter, and a bytecode interpreter using "classical backtracking" with explicit track and capture undo stacks. Each regex keeps a pool of interpreter states so that concurrent searches do not allocate.

retrace does not guarantee linear-time matching. Use a match timeout when matching untrusted patterns or input.

*/

#![warn(clippy::all)]
#![allow(clippy::upper_case_acronyms, clippy::match_like_matches_macro)]
// Clippy's manual_range_contains suggestion produces worse codegen.
#![allow(clippy::manual_range_contains)]

pub use crate::api::*;
pub use crate::error::{Error, ParseError, ParseErrorKind};
pub use crate::escape::{escape, unescape};

mod util;

mod api;
mod bytesearch;
mod categories;
mod charclass;
mod classicalbacktrack;
mod emit;
mod error;
mod escape;
mod exec;
mod folds;
mod indexing;
mod insn;
mod ir;
mod optimizer;
mod parse;
mod pool;
mod replacer;
mod startpredicate;
mod types;

// Access to the compiler stages, for the command line tool.
#[doc(hidden)]
pub mod backends {
    pub use crate::emit::emit;
    pub use crate::optimizer::optimize;
    pub use crate::parse::try_parse;
}
