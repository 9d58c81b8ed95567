//! Block-character font for the clock face.

/// Rows in every glyph
pub const HEIGHT: usize = 5;

type Glyph = [&'static str; HEIGHT];

const ZERO: Glyph = ["██████", "██  ██", "██  ██", "██  ██", "██████"];
const ONE: Glyph = ["    ██", "    ██", "    ██", "    ██", "    ██"];
const TWO: Glyph = ["██████", "    ██", "██████", "██    ", "██████"];
const THREE: Glyph = ["██████", "    ██", "██████", "    ██", "██████"];
const FOUR: Glyph = ["██  ██", "██  ██", "██████", "    ██", "    ██"];
const FIVE: Glyph = ["██████", "██    ", "██████", "    ██", "██████"];
const SIX: Glyph = ["██████", "██    ", "██████", "██  ██", "██████"];
const SEVEN: Glyph = ["██████", "    ██", "    ██", "    ██", "    ██"];
const EIGHT: Glyph = ["██████", "██  ██", "██████", "██  ██", "██████"];
const NINE: Glyph = ["██████", "██  ██", "██████", "    ██", "██████"];
const COLON: Glyph = ["  ", "██", "  ", "██", "  "];
const BLANK: Glyph = ["      ", "      ", "      ", "      ", "      "];

fn glyph(c: char) -> &'static Glyph {
    match c {
        '0' => &ZERO,
        '1' => &ONE,
        '2' => &TWO,
        '3' => &THREE,
        '4' => &FOUR,
        '5' => &FIVE,
        '6' => &SIX,
        '7' => &SEVEN,
        '8' => &EIGHT,
        '9' => &NINE,
        ':' => &COLON,
        _ => &BLANK,
    }
}

/// A rendered string, one `String` per terminal row
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GlyphBlock {
    rows: Vec<String>,
}

impl GlyphBlock {
    /// Width in cells of the widest row
    pub fn width(&self) -> usize {
        self.rows
            .iter()
            .map(|row| row.chars().count())
            .max()
            .unwrap_or(0)
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self) -> &[String] {
        &self.rows
    }
}

/// Render text in the block font, with one blank column between glyphs.
///
/// Characters outside `0-9` and `:` render as blank space.
pub fn render(text: &str) -> GlyphBlock {
    let glyphs: Vec<&Glyph> = text.chars().map(glyph).collect();

    let rows = (0..HEIGHT)
        .map(|row| {
            glyphs
                .iter()
                .map(|g| g[row])
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect();

    GlyphBlock { rows }
}

#[cfg(test)]
mod test {
    use super::{render, HEIGHT};

    #[test]
    fn clock_dimensions() {
        let block = render("25:00");

        assert_eq!(block.height(), HEIGHT);
        assert_eq!(block.width(), 4 * 6 + 2 + 4);
    }

    #[test]
    fn long_clock_dimensions() {
        let block = render("01:00:00");

        assert_eq!(block.width(), 6 * 6 + 2 * 2 + 7);
    }

    #[test]
    fn digits_are_drawn_row_by_row() {
        let block = render("10");

        assert_eq!(block.rows()[0], "    ██ ██████");
        assert_eq!(block.rows()[2], "    ██ ██  ██");
    }

    #[test]
    fn all_rows_share_the_same_width() {
        let block = render("0123456789:");
        let width = block.width();

        assert!(block.rows().iter().all(|row| row.chars().count() == width));
    }
}
