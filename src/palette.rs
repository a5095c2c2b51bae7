use eframe::egui::Color32;

const PALETTE: [Color32; 15] = [
    Color32::from_rgb(0xf4, 0x3f, 0x5e),
    Color32::from_rgb(0x3b, 0x82, 0xf6),
    Color32::from_rgb(0x10, 0xb9, 0x81),
    Color32::from_rgb(0xf5, 0x9e, 0x0b),
    Color32::from_rgb(0x8b, 0x5c, 0xf6),
    Color32::from_rgb(0x06, 0xb6, 0xd4),
    Color32::from_rgb(0xec, 0x48, 0x99),
    Color32::from_rgb(0x84, 0xcc, 0x16),
    Color32::from_rgb(0x63, 0x66, 0xf1),
    Color32::from_rgb(0xf9, 0x73, 0x16),
    Color32::from_rgb(0x14, 0xb8, 0xa6),
    Color32::from_rgb(0xd9, 0x46, 0xef),
    Color32::from_rgb(0xea, 0xb3, 0x08),
    Color32::from_rgb(0x22, 0xc5, 0x5e),
    Color32::from_rgb(0x0e, 0xa5, 0xe9),
];

pub const UNGROUPED: Color32 = Color32::from_rgb(0x94, 0xa3, 0xb8);

/// Stable colour for a group tag; the same tag always maps to the same slot.
pub fn group_color(group: &str) -> Color32 {
    if group.is_empty() {
        return UNGROUPED;
    }
    PALETTE[palette_index(group)]
}

/// `h = unit + ((h << 5) - h)` over UTF-16 units. Only the shift operand is
/// truncated to 32 bits; the running sum keeps full precision.
fn palette_index(group: &str) -> usize {
    let hash = group.encode_utf16().fold(0_i64, |hash, unit| {
        let shifted = i64::from((hash as i32).wrapping_shl(5));
        i64::from(unit) + (shifted - hash)
    });
    (hash.unsigned_abs() % PALETTE.len() as u64) as usize
}

pub fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let mix = |a: u8, b: u8| (a as f32 * (1.0 - amount) + b as f32 * amount) as u8;

    Color32::from_rgba_unmultiplied(
        mix(base.r(), overlay.r()),
        mix(base.g(), overlay.g()),
        mix(base.b(), overlay.b()),
        mix(base.a(), overlay.a()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_group_uses_neutral_colour() {
        assert_eq!(group_color(""), UNGROUPED);
    }

    #[test]
    fn colour_is_stable_per_group() {
        assert_eq!(group_color("Chapter 2"), group_color("Chapter 2"));
        assert!(PALETTE.contains(&group_color("Enzyme")));
    }

    #[test]
    fn palette_slots_match_reference_hash() {
        assert_eq!(palette_index("Chapter 2"), 14);
        assert_eq!(palette_index("Enzymes"), 12);
        // Long tags overflow 32 bits in the running sum.
        assert_eq!(palette_index("Cellular Respiration"), 3);
        assert_eq!(palette_index("ตัวอย่าง"), 6);
    }

    #[test]
    fn similar_groups_spread_over_palette() {
        let distinct = (1..=10)
            .map(|i| group_color(&format!("Chapter {i}")))
            .collect::<std::collections::HashSet<_>>();
        assert!(distinct.len() > 3);
    }

    #[test]
    fn blend_endpoints() {
        let a = Color32::from_rgb(0, 0, 0);
        let b = Color32::from_rgb(200, 100, 50);
        assert_eq!(blend_color(a, b, 0.0), a);
        assert_eq!(blend_color(a, b, 1.0), b);
    }
}
