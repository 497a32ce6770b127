pub const GLYPH_WIDTH: u32 = 3;
pub const GLYPH_HEIGHT: u32 = 5;
/// Columns a glyph occupies including the one-column gap after it.
pub const GLYPH_ADVANCE: u32 = GLYPH_WIDTH + 1;

const FIRST_PRINTABLE: u32 = 0x20;
const FALLBACK_GLYPH: char = '?';

// One entry per printable ASCII character starting at space. Each row is
// three bits (leftmost column in the high bit), top row in the high bits.
const FONT_3X5: [u16; 95] = [
    0x0000, 0x2482, 0x5A00, 0x5F7D, 0x7DDF, 0x52A5, 0x2AAB, 0x2400,
    0x1491, 0x4494, 0x0AA8, 0x05D0, 0x0014, 0x01C0, 0x0002, 0x12A4,
    0x7B6F, 0x2C97, 0x73E7, 0x73CF, 0x5BC9, 0x79CF, 0x79EF, 0x7292,
    0x7BEF, 0x7BCF, 0x0410, 0x0414, 0x1511, 0x0E38, 0x4454, 0x72C2,
    0x7BE7, 0x2BED, 0x6BAE, 0x7927, 0x6B6E, 0x79A7, 0x79A4, 0x796F,
    0x5BED, 0x7497, 0x726F, 0x5BAD, 0x4927, 0x5FED, 0x5FFD, 0x7B6F,
    0x6BA4, 0x7B79, 0x6BAD, 0x79CF, 0x7492, 0x5B6F, 0x5B6A, 0x5BFD,
    0x5AAD, 0x5A92, 0x72A7, 0x6926, 0x4889, 0x324B, 0x2A00, 0x0007,
    0x4400, 0x0E7F, 0x49AE, 0x0F27, 0x13EF, 0x0FA7, 0x39A4, 0x0F79,
    0x49AD, 0x2092, 0x106A, 0x4BAD, 0x4927, 0x0DED, 0x0D6D, 0x0F6F,
    0x0D74, 0x0F79, 0x0D64, 0x0F8F, 0x2E93, 0x0B6F, 0x0B6A, 0x0B7A,
    0x0A95, 0x0B79, 0x0E57, 0x3593, 0x2492, 0x64D6, 0x0780,
];

/// Packed 3x5 bitmap for `ch`. Characters outside printable ASCII render
/// as `?`.
pub(crate) fn glyph_bits(ch: char) -> u16 {
    let index = (ch as u32)
        .checked_sub(FIRST_PRINTABLE)
        .filter(|index| (*index as usize) < FONT_3X5.len())
        .unwrap_or(FALLBACK_GLYPH as u32 - FIRST_PRINTABLE);
    FONT_3X5[index as usize]
}

pub(crate) fn glyph_pixel(bits: u16, column: u32, row: u32) -> bool {
    if column >= GLYPH_WIDTH || row >= GLYPH_HEIGHT {
        return false;
    }
    let row_bits = (bits >> ((GLYPH_HEIGHT - 1 - row) * GLYPH_WIDTH)) & 0b111;
    row_bits & (0b100 >> column) != 0
}

/// Size of one font cell when glyphs are drawn `size` units tall.
pub(crate) fn cell_size(size: f32) -> f32 {
    size / GLYPH_HEIGHT as f32
}

/// Width of `text` drawn `size` units tall. The trailing gap after the last
/// glyph is not counted.
pub fn text_width(text: &str, size: f32) -> f32 {
    let count = text.chars().count() as f32;
    if count == 0.0 {
        return 0.0;
    }
    (count * GLYPH_ADVANCE as f32 - 1.0) * cell_size(size)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(ch: char) -> Vec<String> {
        let bits = glyph_bits(ch);
        (0..GLYPH_HEIGHT)
            .map(|row| {
                (0..GLYPH_WIDTH)
                    .map(|column| if glyph_pixel(bits, column, row) { '#' } else { '.' })
                    .collect()
            })
            .collect()
    }

    #[test]
    fn space_is_blank() {
        assert_eq!(glyph_bits(' '), 0);
    }

    #[test]
    fn digit_zero_is_a_box() {
        assert_eq!(render('0'), vec!["###", "#.#", "#.#", "#.#", "###"]);
    }

    #[test]
    fn letter_t_has_a_crossbar_and_stem() {
        assert_eq!(render('T'), vec!["###", ".#.", ".#.", ".#.", ".#."]);
    }

    #[test]
    fn non_ascii_falls_back_to_question_mark() {
        assert_eq!(glyph_bits('é'), glyph_bits('?'));
        assert_eq!(glyph_bits('\n'), glyph_bits('?'));
    }

    #[test]
    fn every_printable_character_has_an_entry() {
        for code in 0x21u8..=0x7e {
            assert_ne!(glyph_bits(code as char), 0, "glyph {:?}", code as char);
        }
    }

    #[test]
    fn width_scales_with_size_and_length() {
        assert_eq!(text_width("", 10.0), 0.0);
        assert!((text_width("a", 5.0) - 3.0).abs() < 1e-6);
        assert!((text_width("ab", 10.0) - 14.0).abs() < 1e-6);
    }
}
