//! XYZ tile URL templates (`{z}/{x}/{y}` plus `{a-c}` style subdomain ranges).

use crate::projection::TileIndex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileSource {
    template: String,
}

impl TileSource {
    /// `None` for a blank template: the host leaves the custom layer unset.
    pub fn parse(template: &str) -> Option<Self> {
        let template = template.trim();
        if template.is_empty() {
            return None;
        }
        Some(Self {
            template: template.to_string(),
        })
    }

    pub fn url_for(&self, tile: TileIndex) -> String {
        let mut out = String::with_capacity(self.template.len() + 16);
        let mut rest = self.template.as_str();

        while let Some(start) = rest.find('{') {
            out.push_str(&rest[..start]);
            let Some(len) = rest[start..].find('}') else {
                out.push_str(&rest[start..]);
                return out;
            };
            let token = &rest[start + 1..start + len];
            match token {
                "z" => out.push_str(&tile.z.to_string()),
                "x" => out.push_str(&tile.x.to_string()),
                "y" => out.push_str(&tile.y.to_string()),
                "-y" => {
                    let max = 1_u64.checked_shl(tile.z).unwrap_or(u64::MAX) - 1;
                    out.push_str(&max.saturating_sub(u64::from(tile.y)).to_string());
                }
                "r" => {}
                other => match expand_range(other, tile) {
                    Some(ch) => out.push(ch),
                    None => {
                        out.push('{');
                        out.push_str(other);
                        out.push('}');
                    }
                },
            }
            rest = &rest[start + len + 1..];
        }

        out.push_str(rest);
        out
    }
}

/// Picks a stable member of a single-character range such as `a-c` or `1-4`.
fn expand_range(token: &str, tile: TileIndex) -> Option<char> {
    let mut chars = token.chars();
    let (first, dash, last) = (chars.next()?, chars.next()?, chars.next()?);
    if dash != '-' || chars.next().is_some() || last < first {
        return None;
    }

    let span = u32::from(last) - u32::from(first) + 1;
    let pick = (tile.x.wrapping_add(tile.y)) % span;
    char::from_u32(u32::from(first) + pick)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TILE: TileIndex = TileIndex { z: 18, x: 139_032, y: 90_260 };

    #[test]
    fn blank_template_is_no_source() {
        assert!(TileSource::parse("   ").is_none());
    }

    #[test]
    fn expands_xyz_placeholders() {
        let source = TileSource::parse("https://tiles.example.com/{z}/{x}/{y}.png").unwrap();
        assert_eq!(
            source.url_for(TILE),
            "https://tiles.example.com/18/139032/90260.png"
        );
    }

    #[test]
    fn expands_subdomain_range_and_drops_retina_suffix() {
        let source = TileSource::parse(
            "https://{1-4}.basemaps.cartocdn.com/rastertiles/voyager/{z}/{x}/{y}{r}.png",
        )
        .unwrap();
        let url = source.url_for(TILE);
        // (139032 + 90260) % 4 == 0
        assert_eq!(
            url,
            "https://1.basemaps.cartocdn.com/rastertiles/voyager/18/139032/90260.png"
        );
    }

    #[test]
    fn flips_y_for_tms_templates() {
        let source = TileSource::parse("{z}/{x}/{-y}").unwrap();
        let tile = TileIndex { z: 2, x: 1, y: 0 };
        assert_eq!(source.url_for(tile), "2/1/3");
    }

    #[test]
    fn unknown_placeholders_are_kept() {
        let source = TileSource::parse("{s}/{z}").unwrap();
        assert_eq!(source.url_for(TileIndex { z: 3, x: 0, y: 0 }), "{s}/3");
    }
}
