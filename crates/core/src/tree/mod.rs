//! Passive skill tree description and sprite sheet mirroring.

mod sync;

use std::collections::{BTreeMap, HashMap};

use reqwest::Url;
use serde::Deserialize;

use crate::error::{ExportError, Result};

pub use sync::{DownloadedSet, TreeSummary, TreeSync};

/// The parts of the published tree `data.json` needed to mirror sprites.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SkillTreeDescription {
    /// Zoom multipliers, ascending; the last one is the sharpest.
    #[serde(rename = "imageZoomLevels", default)]
    pub image_zoom_levels: Vec<f64>,
    /// Sprite group name to resolution key to sheet reference.
    #[serde(default)]
    pub sprites: HashMap<String, BTreeMap<String, AssetReference>>,
}

/// One sprite sheet as published in the tree description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AssetReference {
    /// URL (or URL path) of the sheet.
    #[serde(default, alias = "Filename")]
    pub filename: String,
}

/// Sheet chosen for a sprite group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedAsset {
    /// Sprite group the sheet was chosen for.
    pub group: String,
    /// Resolution key that was used.
    pub resolution: String,
    /// Bare file name, used both remotely and on disk.
    pub file_name: String,
}

impl SkillTreeDescription {
    /// Parse a tree description document.
    pub fn from_slice(document: &[u8]) -> Result<Self> {
        serde_json::from_slice(document).map_err(ExportError::TreeParse)
    }

    /// Resolution key of the highest zoom level.
    pub fn preferred_resolution_key(&self) -> Result<String> {
        self.image_zoom_levels
            .last()
            .map(|zoom| resolution_key(*zoom))
            .ok_or(ExportError::EmptyZoomLevels)
    }

    /// Pick a sheet for every group in order.
    pub fn plan(&self, groups: &[&str]) -> Result<Vec<PlannedAsset>> {
        let preferred = self.preferred_resolution_key()?;
        groups
            .iter()
            .map(|group| {
                let resolutions = self.sprites.get(*group).ok_or_else(|| {
                    ExportError::UnresolvedSprite {
                        group: group.to_string(),
                    }
                })?;
                let (resolution, asset) = select_asset(group, resolutions, &preferred)?;
                Ok(PlannedAsset {
                    group: group.to_string(),
                    resolution: resolution.to_string(),
                    file_name: asset_file_name(&asset.filename)?,
                })
            })
            .collect()
    }
}

/// Format a zoom multiplier the way the document keys its resolution maps.
///
/// This is the shortest representation that round-trips, without exponent:
/// `1.0` becomes `"1"` and `0.3835` stays `"0.3835"`.
pub fn resolution_key(zoom: f64) -> String {
    format!("{zoom}")
}

/// Choose a sheet for one group.
///
/// The preferred resolution wins when it is present with a filename.
/// Otherwise the first resolution (by key) that has a filename is used, since
/// groups do not publish every resolution.
pub fn select_asset<'a>(
    group: &str,
    resolutions: &'a BTreeMap<String, AssetReference>,
    preferred: &str,
) -> Result<(&'a str, &'a AssetReference)> {
    if let Some((key, asset)) = resolutions.get_key_value(preferred) {
        if !asset.filename.is_empty() {
            return Ok((key.as_str(), asset));
        }
    }

    resolutions
        .iter()
        .find(|(_, asset)| !asset.filename.is_empty())
        .map(|(key, asset)| (key.as_str(), asset))
        .ok_or_else(|| ExportError::UnresolvedSprite {
            group: group.to_string(),
        })
}

/// Last path segment of a sheet reference, ignoring query and fragment.
pub fn asset_file_name(raw: &str) -> Result<String> {
    let invalid = || ExportError::InvalidAssetName {
        raw: raw.to_string(),
    };

    let url = Url::parse(raw)
        .or_else(|_| Url::parse("http://localhost/").and_then(|base| base.join(raw)))
        .map_err(|_| invalid())?;
    let segment = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .ok_or_else(invalid)?;
    let name = urlencoding::decode(segment).map_err(|_| invalid())?;

    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(invalid());
    }
    Ok(name.into_owned())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn resolutions(entries: &[(&str, &str)]) -> BTreeMap<String, AssetReference> {
        entries
            .iter()
            .map(|(key, filename)| {
                (
                    key.to_string(),
                    AssetReference {
                        filename: filename.to_string(),
                    },
                )
            })
            .collect()
    }

    #[test]
    fn resolution_keys_match_document_format() {
        assert_eq!(resolution_key(0.3835), "0.3835");
        assert_eq!(resolution_key(1.0), "1");
        assert_eq!(resolution_key(2.6700000762939453), "2.6700000762939453");
        assert_eq!(resolution_key(2.67_f32 as f64), "2.6700000762939453");
    }

    #[test]
    fn preferred_resolution_is_chosen_when_present() {
        let map = resolutions(&[("0.1246", "low.png"), ("0.3835", "high.png")]);
        let (key, asset) = select_asset("normalActive", &map, "0.3835").expect("resolvable");
        assert_eq!(key, "0.3835");
        assert_eq!(asset.filename, "high.png");
    }

    #[test]
    fn falls_back_when_preferred_key_is_missing() {
        let map = resolutions(&[("1", "https://cdn/frame.png")]);
        let (key, asset) = select_asset("frame", &map, "2.6700000762939453").expect("fallback");
        assert_eq!(key, "1");
        assert_eq!(asset.filename, "https://cdn/frame.png");
    }

    #[test]
    fn empty_filenames_are_never_selected() {
        let map = resolutions(&[("0.1", "fallback.png"), ("0.3835", "")]);
        let (_, asset) = select_asset("line", &map, "0.3835").expect("fallback");
        assert_eq!(asset.filename, "fallback.png");

        let map = resolutions(&[("0.3835", "")]);
        let err = select_asset("line", &map, "0.3835").expect_err("nothing usable");
        assert!(matches!(err, ExportError::UnresolvedSprite { group } if group == "line"));
    }

    #[test]
    fn file_names_drop_directories_and_queries() {
        let cases = [
            ("https://web.poecdn.com/image/passive-skill/skills-3.jpg?1688123", "skills-3.jpg"),
            ("assets/frame-3.png", "frame-3.png"),
            ("/image/passive-skill/mastery-active-effect-3.png#x", "mastery-active-effect-3.png"),
            ("line-3.png", "line-3.png"),
            ("https://cdn/sheets/group%20background.png", "group background.png"),
        ];
        for (raw, expected) in cases {
            assert_eq!(asset_file_name(raw).expect(raw), expected);
        }
    }

    #[test]
    fn unusable_file_names_are_rejected() {
        for raw in ["", "https://cdn/sheets/", "https://cdn/a/..%2F..%2Fpasswd", "mailto:someone"] {
            assert!(
                matches!(asset_file_name(raw), Err(ExportError::InvalidAssetName { .. })),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn plans_every_group_in_order() {
        let document = json!({
            "tree": "Default",
            "imageZoomLevels": [0.1246, 0.2109, 0.3835],
            "sprites": {
                "background": {
                    "0.1246": {"filename": "https://cdn/background-0.png", "w": 1},
                    "0.3835": {"filename": "https://cdn/background-3.png", "w": 1}
                },
                "jewel": {"0.1246": {"filename": "https://cdn/jewel-0.png"}}
            }
        });
        let tree =
            SkillTreeDescription::from_slice(document.to_string().as_bytes()).expect("valid");

        let plan = tree.plan(&["background", "jewel"]).expect("resolvable");
        assert_eq!(
            plan,
            vec![
                PlannedAsset {
                    group: "background".into(),
                    resolution: "0.3835".into(),
                    file_name: "background-3.png".into(),
                },
                PlannedAsset {
                    group: "jewel".into(),
                    resolution: "0.1246".into(),
                    file_name: "jewel-0.png".into(),
                },
            ]
        );

        let err = tree.plan(&["background", "keystoneActive"]).expect_err("unknown group");
        assert!(matches!(
            err,
            ExportError::UnresolvedSprite { group } if group == "keystoneActive"
        ));
    }

    #[test]
    fn missing_zoom_levels_are_fatal() {
        let tree = SkillTreeDescription::from_slice(br#"{"sprites": {}}"#).expect("valid json");
        assert!(matches!(tree.plan(&["background"]), Err(ExportError::EmptyZoomLevels)));
        assert!(matches!(
            SkillTreeDescription::from_slice(b"not json"),
            Err(ExportError::TreeParse(_))
        ));
    }
}
