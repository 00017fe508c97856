//! Unicode general categories, named blocks and the shorthand classes
//! (`\w`, `\d`, `\s`) built from them.

use crate::charclass::{CharClass, CharRange};
use unicode_general_category::{get_general_category, GeneralCategory};

/// The general categories, in a fixed order so that a set of them fits in a
/// bitmask.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum Category {
    Lu,
    Ll,
    Lt,
    Lm,
    Lo,
    Mn,
    Mc,
    Me,
    Nd,
    Nl,
    No,
    Pc,
    Pd,
    Ps,
    Pe,
    Pi,
    Pf,
    Po,
    Sm,
    Sc,
    Sk,
    So,
    Zs,
    Zl,
    Zp,
    Cc,
    Cf,
    Cs,
    Co,
    Cn,
}

const CATEGORY_NAMES: [(&str, Category); 30] = [
    ("Lu", Category::Lu),
    ("Ll", Category::Ll),
    ("Lt", Category::Lt),
    ("Lm", Category::Lm),
    ("Lo", Category::Lo),
    ("Mn", Category::Mn),
    ("Mc", Category::Mc),
    ("Me", Category::Me),
    ("Nd", Category::Nd),
    ("Nl", Category::Nl),
    ("No", Category::No),
    ("Pc", Category::Pc),
    ("Pd", Category::Pd),
    ("Ps", Category::Ps),
    ("Pe", Category::Pe),
    ("Pi", Category::Pi),
    ("Pf", Category::Pf),
    ("Po", Category::Po),
    ("Sm", Category::Sm),
    ("Sc", Category::Sc),
    ("Sk", Category::Sk),
    ("So", Category::So),
    ("Zs", Category::Zs),
    ("Zl", Category::Zl),
    ("Zp", Category::Zp),
    ("Cc", Category::Cc),
    ("Cf", Category::Cf),
    ("Cs", Category::Cs),
    ("Co", Category::Co),
    ("Cn", Category::Cn),
];

impl Category {
    /// \return the general category of a character.
    pub fn of(c: char) -> Category {
        use GeneralCategory as G;
        match get_general_category(c) {
            G::UppercaseLetter => Category::Lu,
            G::LowercaseLetter => Category::Ll,
            G::TitlecaseLetter => Category::Lt,
            G::ModifierLetter => Category::Lm,
            G::OtherLetter => Category::Lo,
            G::NonspacingMark => Category::Mn,
            G::SpacingMark => Category::Mc,
            G::EnclosingMark => Category::Me,
            G::DecimalNumber => Category::Nd,
            G::LetterNumber => Category::Nl,
            G::OtherNumber => Category::No,
            G::ConnectorPunctuation => Category::Pc,
            G::DashPunctuation => Category::Pd,
            G::OpenPunctuation => Category::Ps,
            G::ClosePunctuation => Category::Pe,
            G::InitialPunctuation => Category::Pi,
            G::FinalPunctuation => Category::Pf,
            G::OtherPunctuation => Category::Po,
            G::MathSymbol => Category::Sm,
            G::CurrencySymbol => Category::Sc,
            G::ModifierSymbol => Category::Sk,
            G::OtherSymbol => Category::So,
            G::SpaceSeparator => Category::Zs,
            G::LineSeparator => Category::Zl,
            G::ParagraphSeparator => Category::Zp,
            G::Control => Category::Cc,
            G::Format => Category::Cf,
            G::Surrogate => Category::Cs,
            G::PrivateUse => Category::Co,
            G::Unassigned => Category::Cn,
            #[allow(unreachable_patterns)]
            _ => Category::Cn,
        }
    }

    fn bit(self) -> u32 {
        1 << (self as u8)
    }
}

/// A set of general categories.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct CategorySet(u32);

impl CategorySet {
    pub const fn empty() -> CategorySet {
        CategorySet(0)
    }

    pub fn of(cats: &[Category]) -> CategorySet {
        CategorySet(cats.iter().fold(0, |acc, c| acc | c.bit()))
    }

    pub fn union(self, rhs: CategorySet) -> CategorySet {
        CategorySet(self.0 | rhs.0)
    }

    #[inline]
    pub fn contains(self, cat: Category) -> bool {
        self.0 & cat.bit() != 0
    }

    #[inline]
    pub fn matches(self, c: char) -> bool {
        self.contains(Category::of(c))
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// What a `\p{Name}` escape refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Property {
    Categories(CategorySet),
    Block(CharRange),
}

/// Named blocks accepted as `\p{IsName}`.
const BLOCKS: &[(&str, u32, u32)] = &[
    ("IsBasicLatin", 0x0000, 0x007F),
    ("IsLatin-1Supplement", 0x0080, 0x00FF),
    ("IsLatinExtended-A", 0x0100, 0x017F),
    ("IsLatinExtended-B", 0x0180, 0x024F),
    ("IsIPAExtensions", 0x0250, 0x02AF),
    ("IsSpacingModifierLetters", 0x02B0, 0x02FF),
    ("IsCombiningDiacriticalMarks", 0x0300, 0x036F),
    ("IsGreek", 0x0370, 0x03FF),
    ("IsGreekandCoptic", 0x0370, 0x03FF),
    ("IsCyrillic", 0x0400, 0x04FF),
    ("IsCyrillicSupplement", 0x0500, 0x052F),
    ("IsArmenian", 0x0530, 0x058F),
    ("IsHebrew", 0x0590, 0x05FF),
    ("IsArabic", 0x0600, 0x06FF),
    ("IsSyriac", 0x0700, 0x074F),
    ("IsThaana", 0x0780, 0x07BF),
    ("IsDevanagari", 0x0900, 0x097F),
    ("IsBengali", 0x0980, 0x09FF),
    ("IsGurmukhi", 0x0A00, 0x0A7F),
    ("IsGujarati", 0x0A80, 0x0AFF),
    ("IsTamil", 0x0B80, 0x0BFF),
    ("IsThai", 0x0E00, 0x0E7F),
    ("IsLao", 0x0E80, 0x0EFF),
    ("IsTibetan", 0x0F00, 0x0FFF),
    ("IsGeorgian", 0x10A0, 0x10FF),
    ("IsHangulJamo", 0x1100, 0x11FF),
    ("IsCherokee", 0x13A0, 0x13FF),
    ("IsLatinExtendedAdditional", 0x1E00, 0x1EFF),
    ("IsGreekExtended", 0x1F00, 0x1FFF),
    ("IsGeneralPunctuation", 0x2000, 0x206F),
    ("IsSuperscriptsandSubscripts", 0x2070, 0x209F),
    ("IsCurrencySymbols", 0x20A0, 0x20CF),
    ("IsLetterlikeSymbols", 0x2100, 0x214F),
    ("IsNumberForms", 0x2150, 0x218F),
    ("IsArrows", 0x2190, 0x21FF),
    ("IsMathematicalOperators", 0x2200, 0x22FF),
    ("IsBoxDrawing", 0x2500, 0x257F),
    ("IsGeometricShapes", 0x25A0, 0x25FF),
    ("IsMiscellaneousSymbols", 0x2600, 0x26FF),
    ("IsDingbats", 0x2700, 0x27BF),
    ("IsCJKSymbolsandPunctuation", 0x3000, 0x303F),
    ("IsHiragana", 0x3040, 0x309F),
    ("IsKatakana", 0x30A0, 0x30FF),
    ("IsCJKUnifiedIdeographs", 0x4E00, 0x9FFF),
    ("IsHangulSyllables", 0xAC00, 0xD7AF),
    ("IsPrivateUse", 0xE000, 0xF8FF),
    ("IsPrivateUseArea", 0xE000, 0xF8FF),
    ("IsAlphabeticPresentationForms", 0xFB00, 0xFB4F),
    ("IsArabicPresentationForms-A", 0xFB50, 0xFDFF),
    ("IsHalfwidthandFullwidthForms", 0xFF00, 0xFFEF),
    ("IsSpecials", 0xFFF0, 0xFFFF),
];

/// Resolve a property name from `\p{...}`.
pub fn lookup_property(name: &str) -> Option<Property> {
    if let Some((_, cat)) = CATEGORY_NAMES.iter().find(|(n, _)| *n == name) {
        return Some(Property::Categories(CategorySet::of(&[*cat])));
    }
    let group = |prefix: char| -> CategorySet {
        CATEGORY_NAMES
            .iter()
            .filter(|(n, _)| n.starts_with(prefix))
            .fold(CategorySet::empty(), |acc, (_, cat)| {
                acc.union(CategorySet::of(&[*cat]))
            })
    };
    match name {
        "L" | "M" | "N" | "P" | "S" | "Z" | "C" => {
            let prefix = name.chars().next()?;
            return Some(Property::Categories(group(prefix)));
        }
        _ => {}
    }
    BLOCKS
        .iter()
        .find(|(n, _, _)| *n == name)
        .map(|&(_, first, last)| Property::Block(CharRange::new(first, last)))
}

/// Categories making up `\w`.
pub fn word_categories() -> CategorySet {
    CategorySet::of(&[
        Category::Lu,
        Category::Ll,
        Category::Lt,
        Category::Lm,
        Category::Lo,
        Category::Mn,
        Category::Nd,
        Category::Pc,
    ])
}

/// \return the class for `\w`.
pub fn word_class(ecmascript: bool) -> CharClass {
    let mut cc = CharClass::new();
    if ecmascript {
        cc.add_range('a', 'z');
        cc.add_range('A', 'Z');
        cc.add_range('0', '9');
        cc.add_char('_');
    } else {
        cc.add_categories(word_categories(), false);
    }
    cc
}

/// \return the class for `\d`.
pub fn digit_class(ecmascript: bool) -> CharClass {
    let mut cc = CharClass::new();
    if ecmascript {
        cc.add_range('0', '9');
    } else {
        cc.add_categories(CategorySet::of(&[Category::Nd]), false);
    }
    cc
}

/// \return the class for `\s`.
pub fn space_class(ecmascript: bool) -> CharClass {
    let mut cc = CharClass::new();
    cc.add_range('\t', '\r');
    cc.add_char(' ');
    if !ecmascript {
        cc.add_char('\u{85}');
        cc.add_categories(CategorySet::of(&[Category::Zs, Category::Zl, Category::Zp]), false);
    }
    cc
}

/// \return whether `c` counts as a word character for `\b` and `\B`.
/// The zero-width joiners count so that boundaries do not split joined
/// sequences.
#[inline]
pub fn is_boundary_word_char(c: char) -> bool {
    if c.is_ascii() {
        return c.is_ascii_alphanumeric() || c == '_';
    }
    c == '\u{200C}' || c == '\u{200D}' || word_categories().matches(c)
}

#[inline]
pub fn is_ecma_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_of_chars() {
        assert_eq!(Category::of('A'), Category::Lu);
        assert_eq!(Category::of('a'), Category::Ll);
        assert_eq!(Category::of('5'), Category::Nd);
        assert_eq!(Category::of('_'), Category::Pc);
        assert_eq!(Category::of(' '), Category::Zs);
        assert_eq!(Category::of('$'), Category::Sc);
    }

    #[test]
    fn property_lookup() {
        let Some(Property::Categories(letters)) = lookup_property("L") else {
            panic!("L should be a category group");
        };
        assert!(letters.matches('x') && letters.matches('Ж') && !letters.matches('1'));
        assert_eq!(
            lookup_property("IsGreek"),
            Some(Property::Block(CharRange::new(0x370, 0x3FF)))
        );
        assert_eq!(lookup_property("Bogus"), None);
    }

    #[test]
    fn boundary_words() {
        assert!(is_boundary_word_char('é'));
        assert!(is_boundary_word_char('\u{200D}'));
        assert!(!is_boundary_word_char('-'));
        assert!(!is_ecma_word_char('é'));
    }
}
