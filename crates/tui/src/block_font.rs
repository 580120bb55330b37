use std::collections::HashMap;

use once_cell::sync::Lazy;

/// Rows in a rendered glyph, not counting the shadow.
pub const FONT_HEIGHT: usize = 5;
const SHADOW_OFFSET: usize = 1;
const SPACING: usize = 2;
const FILL_CHAR: char = '█';
const SHADOW_CHAR: char = '░';

type Glyph = [&'static str; FONT_HEIGHT];

static GLYPHS: Lazy<HashMap<char, Glyph>> = Lazy::new(|| {
    HashMap::from([
        ('M', ["#   #", "## ##", "# # #", "#   #", "#   #"]),
        ('D', ["### ", "#  #", "#  #", "#  #", "### "]),
        ('R', ["### ", "#  #", "### ", "# # ", "#  #"]),
        ('0', ["###", "# #", "# #", "# #", "###"]),
        ('1', [" # ", "## ", " # ", " # ", "###"]),
        ('2', ["###", "  #", "###", "#  ", "###"]),
        ('3', ["###", "  #", "###", "  #", "###"]),
        ('4', ["# #", "# #", "###", "  #", "  #"]),
        ('5', ["###", "#  ", "###", "  #", "###"]),
        ('6', ["###", "#  ", "###", "# #", "###"]),
        ('7', ["###", "  #", " # ", " # ", " # "]),
        ('8', ["###", "# #", "###", "# #", "###"]),
        ('9', ["###", "# #", "###", "  #", "###"]),
        ('%', ["#   #", "   # ", "  #  ", " #   ", "#   #"]),
        (' ', ["  ", "  ", "  ", "  ", "  "]),
        ('?', ["###", "  #", " ##", "   ", " # "]),
    ])
});

fn glyph_for(ch: char) -> Option<&'static Glyph> {
    GLYPHS
        .get(&ch.to_ascii_uppercase())
        .or_else(|| GLYPHS.get(&'?'))
}

fn glyph_width(glyph: &Glyph) -> usize {
    glyph[0].chars().count() * 2
}

/// Terminal cells needed to draw `text` with [`render`].
pub fn width(text: &str) -> usize {
    let glyphs: Vec<&Glyph> = text.chars().filter_map(glyph_for).collect();
    if glyphs.is_empty() {
        return 0;
    }
    glyphs.iter().map(|glyph| glyph_width(glyph)).sum::<usize>()
        + (glyphs.len() - 1) * SPACING
        + SHADOW_OFFSET * 2
}

/// Render `text` in double-width block letters with a drop shadow.
pub fn render(text: &str) -> Vec<String> {
    let canvas_height = FONT_HEIGHT + SHADOW_OFFSET;
    let total_width = width(text);
    if total_width == 0 {
        return vec![String::new(); canvas_height];
    }
    let mut canvas = vec![vec![' '; total_width]; canvas_height];

    let mut x_offset = 0;
    for glyph in text.chars().filter_map(glyph_for) {
        paint_glyph(&mut canvas, glyph, x_offset);
        x_offset += glyph_width(glyph) + SPACING;
    }

    canvas
        .into_iter()
        .map(|row| row.into_iter().collect::<String>().trim_end().to_string())
        .collect()
}

fn paint_glyph(canvas: &mut [Vec<char>], glyph: &Glyph, x_offset: usize) {
    for (row_idx, row) in glyph.iter().enumerate() {
        for (col_idx, symbol) in row.chars().enumerate() {
            if symbol != '#' {
                continue;
            }
            let x = x_offset + col_idx * 2;
            for dx in 0..2 {
                place(
                    canvas,
                    row_idx + SHADOW_OFFSET,
                    x + SHADOW_OFFSET * 2 + dx,
                    SHADOW_CHAR,
                );
                place(canvas, row_idx, x + dx, FILL_CHAR);
            }
        }
    }
}

fn place(canvas: &mut [Vec<char>], y: usize, x: usize, ch: char) {
    let Some(cell) = canvas.get_mut(y).and_then(|row| row.get_mut(x)) else {
        return;
    };
    if *cell == ' ' || (*cell == SHADOW_CHAR && ch == FILL_CHAR) {
        *cell = ch;
    }
}
