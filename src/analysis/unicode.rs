//! Code point classification and folding tables.
//!
//! Both BMP bitmaps are computed once on first use and shared read-only by
//! every thread. Supplementary planes are rare in practice and classified on
//! the fly.

use std::sync::LazyLock;

use unicode_normalization::UnicodeNormalization;
use unicode_properties::{GeneralCategory, UnicodeGeneralCategory};

const BMP: usize = 0x10000;

/// Identifier-start/continue extras outside the letter, mark and digit
/// categories.
const OTHER_ID: &[char] = &[
    '\u{00B7}', '\u{0387}', '\u{1369}', '\u{136A}', '\u{136B}', '\u{136C}', '\u{136D}',
    '\u{136E}', '\u{136F}', '\u{1370}', '\u{1371}', '\u{1885}', '\u{1886}', '\u{19DA}',
    '\u{2118}', '\u{212E}', '\u{309B}', '\u{309C}',
];

/// Letters that are also pattern syntax.
const PATTERN_LETTERS: &[char] = &['\u{2E2F}'];

pub(crate) const ZERO_WIDTH_JOINER: char = '\u{200D}';

struct Bitmap(Box<[u8]>);

impl Bitmap {
    fn build(predicate: impl Fn(char) -> bool) -> Self {
        let mut bits = vec![0u8; BMP / 8].into_boxed_slice();
        for (cp, c) in (0..BMP as u32).filter_map(|cp| char::from_u32(cp).map(|c| (cp, c))) {
            if predicate(c) {
                bits[cp as usize / 8] |= 1 << (cp % 8);
            }
        }
        Bitmap(bits)
    }

    fn get(&self, c: char) -> Option<bool> {
        let cp = c as usize;
        (cp < BMP).then(|| self.0[cp / 8] & (1 << (cp % 8)) != 0)
    }
}

static CONTINUE_BMP: LazyLock<Bitmap> = LazyLock::new(|| Bitmap::build(continue_slow));
static FOLDABLE_BMP: LazyLock<Bitmap> = LazyLock::new(|| Bitmap::build(foldable_slow));

fn continue_slow(c: char) -> bool {
    use GeneralCategory::*;
    match c.general_category() {
        UppercaseLetter | LowercaseLetter | TitlecaseLetter | ModifierLetter | OtherLetter
        | LetterNumber | NonspacingMark | SpacingMark | DecimalNumber | ConnectorPunctuation => {
            !PATTERN_LETTERS.contains(&c)
        }
        _ => OTHER_ID.contains(&c),
    }
}

fn foldable_slow(c: char) -> bool {
    use GeneralCategory::*;
    match c.general_category() {
        DecimalNumber | LetterNumber => true,
        UppercaseLetter | LowercaseLetter | TitlecaseLetter | ModifierLetter => true,
        _ => false,
    }
}

/// Whether `c` may appear in an indexed term at all.
pub fn is_continue(c: char) -> bool {
    CONTINUE_BMP.get(c).unwrap_or_else(|| continue_slow(c))
}

/// Whether `c` is a non-logographic letter or a decimal or letter numeral,
/// i.e. part of a run that is folded into trigrams. Logographic letters
/// (`Lo`: CJK ideographs, kana, Hangul, Thai, Arabic...) are not.
pub fn is_foldable(c: char) -> bool {
    FOLDABLE_BMP.get(c).unwrap_or_else(|| foldable_slow(c))
}

/// Combining marks and the zero width joiner extend a run without adding to it.
pub fn is_run_extender(c: char) -> bool {
    c == ZERO_WIDTH_JOINER
        || matches!(
            c.general_category(),
            GeneralCategory::NonspacingMark
                | GeneralCategory::SpacingMark
                | GeneralCategory::EnclosingMark
        )
}

/// Fold a foldable code point: strip accents through canonical decomposition
/// and recomposition, then lowercase. Returns `None` for anything else.
pub fn fold(c: char) -> Option<char> {
    if !is_continue(c) || !is_foldable(c) {
        return None;
    }
    let stripped = std::iter::once(c)
        .nfd()
        .filter(|m| m.general_category() != GeneralCategory::NonspacingMark)
        .nfc()
        .next()
        .unwrap_or(c);
    stripped.to_lowercase().next().or(Some(stripped))
}
