// src/fonts.rs
//! Metrics for the two standard PDF base fonts the reports use.
//!
//! Base-14 fonts are not embedded, so widths come from the Adobe font metrics rather than
//! a font file. Widths are in thousandths of the font size.

/// The fonts referenced by generated documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseFont {
    Helvetica,
    CourierBold,
}

impl BaseFont {
    pub const ALL: [BaseFont; 2] = [BaseFont::Helvetica, BaseFont::CourierBold];

    /// PostScript name written to the font dictionary.
    pub fn postscript_name(self) -> &'static str {
        match self {
            BaseFont::Helvetica => "Helvetica",
            BaseFont::CourierBold => "Courier-Bold",
        }
    }

    /// Resource name used inside content streams.
    pub fn resource_name(self) -> &'static str {
        match self {
            BaseFont::Helvetica => "F1",
            BaseFont::CourierBold => "F2",
        }
    }

    pub fn char_width(self, c: char) -> u16 {
        match self {
            BaseFont::CourierBold => 600,
            BaseFont::Helvetica => helvetica_width(c),
        }
    }

    /// Rendered width of `text` in points at `size`.
    pub fn text_width(self, text: &str, size: f32) -> f32 {
        let units: u32 = text.chars().map(|c| self.char_width(c) as u32).sum();
        units as f32 * size / 1000.0
    }
}

/// Helvetica widths for the printable ASCII range, starting at the space character.
#[rustfmt::skip]
const HELVETICA_ASCII: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // '0'..'?'
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 'P'..'_'
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // '`'..'o'
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,      // 'p'..'~'
];

/// Helvetica widths for U+00A0..=U+00FF, which WinAnsiEncoding maps one to one.
#[rustfmt::skip]
const HELVETICA_LATIN1: [u16; 96] = [
    278, 333, 556, 556, 556, 556, 260, 556, 333, 737, 370, 556, 584, 333, 737, 333, // nbsp..macron
    400, 584, 333, 333, 333, 556, 537, 278, 333, 333, 365, 556, 834, 834, 834, 611, // degree..questiondown
    667, 667, 667, 667, 667, 667, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278, // 'À'..'Ï'
    722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722, 722, 667, 667, 611, // 'Ð'..'ß'
    556, 556, 556, 556, 556, 556, 889, 500, 556, 556, 556, 556, 278, 278, 278, 278, // 'à'..'ï'
    556, 556, 556, 556, 556, 556, 556, 584, 611, 556, 556, 556, 556, 500, 556, 500, // 'ð'..'ÿ'
];

fn helvetica_width(c: char) -> u16 {
    match c {
        ' '..='~' => HELVETICA_ASCII[c as usize - 0x20],
        '\u{a0}'..='\u{ff}' => HELVETICA_LATIN1[c as usize - 0xa0],
        // WinAnsi 0x80..=0x9F
        '‚' | '‘' | '’' => 222,
        'ˆ' | '˜' | '„' | '“' | '”' | '‹' | '›' => 333,
        '•' => 350,
        'š' | 'ž' => 500,
        '€' | 'ƒ' | '†' | '‡' | '–' => 556,
        'Ž' => 611,
        'Š' | 'Ÿ' => 667,
        'œ' => 944,
        '…' | '‰' | 'Œ' | '—' | '™' => 1000,
        // Anything else is written as '?'.
        _ => 556,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helvetica_widths_match_afm() {
        assert_eq!(BaseFont::Helvetica.char_width(' '), 278);
        assert_eq!(BaseFont::Helvetica.char_width('W'), 944);
        assert_eq!(BaseFont::Helvetica.char_width('i'), 222);
        assert_eq!(BaseFont::Helvetica.char_width('~'), 584);
        assert_eq!(BaseFont::Helvetica.char_width('ü'), 556);
    }

    #[test]
    fn helvetica_covers_win_ansi_upper_half() {
        let expected = [
            ('¡', 333), ('¿', 611), ('·', 278), ('¼', 834), ('ø', 611), ('Þ', 667),
            ('™', 1000), ('Œ', 1000), ('œ', 944), ('Š', 667), ('š', 500), ('Ÿ', 667),
            ('€', 556), ('–', 556), ('ß', 611),
        ];
        for (c, width) in expected {
            assert_eq!(BaseFont::Helvetica.char_width(c), width, "width of {:?}", c);
        }
        // Unencodable characters are drawn as '?'.
        assert_eq!(BaseFont::Helvetica.char_width('日'), BaseFont::Helvetica.char_width('?'));
    }

    #[test]
    fn text_width_scales_with_size() {
        // "Name" = 722 + 556 + 833 + 556
        let width = BaseFont::Helvetica.text_width("Name", 12.0);
        assert!((width - 2667.0 * 12.0 / 1000.0).abs() < 1e-3);
        assert_eq!(BaseFont::Helvetica.text_width("", 12.0), 0.0);
    }

    #[test]
    fn courier_is_monospaced() {
        assert_eq!(
            BaseFont::CourierBold.text_width("iiii", 10.0),
            BaseFont::CourierBold.text_width("WWWW", 10.0)
        );
    }
}
