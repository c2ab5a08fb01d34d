//! Fixed lists of what gets exported.

use std::path::Path;

/// Bundle paths of every table exported by a run, in export order.
pub const TABLE_CATALOG: &[&str] = &[
    "Data/PassiveTreeExpansionJewels.dat64",
    "Data/PassiveTreeExpansionSkills.dat64",
    "Data/PassiveTreeExpansionSpecialSkills.dat64",
    "Data/CostTypes.dat64",
    "Data/Mods.dat64",
    "Data/ActiveSkills.dat64",
    "Data/Essences.dat64",
    "Data/CraftingBenchOptions.dat64",
    "Data/PantheonPanelLayout.dat64",
    "Data/WeaponTypes.dat64",
    "Data/ArmourTypes.dat64",
    "Data/ShieldTypes.dat64",
    "Data/Flasks.dat64",
    "Data/ComponentCharges.dat64",
    "Data/ComponentAttributeRequirements.dat64",
    "Data/BaseItemTypes.dat64",
    "Data/Stats.dat64",
    "Data/AlternatePassiveSkills.dat64",
    "Data/AlternatePassiveAdditions.dat64",
    "Data/DefaultMonsterStats.dat64",
    "Data/SkillTotemVariations.dat64",
    "Data/MonsterVarieties.dat64",
    "Data/MonsterMapDifficulty.dat64",
    "Data/MonsterMapBossDifficulty.dat64",
    "Data/GrantedEffects.dat64",
    "Data/SkillTotems.dat64",
    "Data/GrantedEffectStatSetsPerLevel.dat64",
    "Data/GrantedEffectsPerLevel.dat64",
    "Data/GrantedEffectQualityStats.dat64",
    "Data/SkillGems.dat64",
    "Data/ItemExperiencePerLevel.dat64",
    "Data/Tags.dat64",
    "Data/ActiveSkillType.dat64",
    "Data/ItemClasses.dat64",
    "Data/GrantedEffectStatSets.dat64",
];

/// Sprite groups whose sheets are mirrored next to the tree description.
pub const SPRITE_GROUPS: &[&str] = &[
    "background",
    "normalActive",
    "notableActive",
    "keystoneActive",
    "normalInactive",
    "notableInactive",
    "keystoneInactive",
    "mastery",
    "masteryConnected",
    "masteryActiveSelected",
    "masteryInactive",
    "masteryActiveEffect",
    "ascendancyBackground",
    "ascendancy",
    "startNode",
    "groupBackground",
    "frame",
    "jewel",
    "line",
    "jewelRadius",
];

/// Relative path of the bundle index inside a game installation.
pub const BUNDLE_INDEX_MARKER: &str = "Bundles2/_.index.bin";

/// File name component of a table path, e.g. `Stats.dat64`.
pub fn table_file_name(table_path: &str) -> &str {
    Path::new(table_path)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(table_path)
}

/// Table name without any extension, e.g. `Stats` for `Data/Stats.dat64`.
pub fn table_base_name(table_path: &str) -> &str {
    let file_name = table_file_name(table_path);
    file_name.split('.').next().unwrap_or(file_name)
}
