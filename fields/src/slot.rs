//! Slot enumerations for every trackable field kind.

/// An equipment slot, armor first, weapons last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EquipSlot {
    Head,
    Body,
    Hands,
    Legs,
    Feet,
    Ears,
    Neck,
    Wrists,
    RFinger,
    LFinger,
    MainHand,
    OffHand,
}

impl EquipSlot {
    /// Number of equipment slots.
    pub const COUNT: usize = 12;

    /// All slots in index order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Head,
        Self::Body,
        Self::Hands,
        Self::Legs,
        Self::Feet,
        Self::Ears,
        Self::Neck,
        Self::Wrists,
        Self::RFinger,
        Self::LFinger,
        Self::MainHand,
        Self::OffHand,
    ];

    /// Armor and accessory slots.
    pub const ARMOR: [Self; 10] = [
        Self::Head,
        Self::Body,
        Self::Hands,
        Self::Legs,
        Self::Feet,
        Self::Ears,
        Self::Neck,
        Self::Wrists,
        Self::RFinger,
        Self::LFinger,
    ];

    /// Weapon slots.
    pub const WEAPONS: [Self; 2] = [Self::MainHand, Self::OffHand];

    /// Returns the dense index of this slot.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Returns the slot at a dense index.
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Returns `true` for the main-hand and off-hand slots.
    #[must_use]
    pub const fn is_weapon(self) -> bool {
        matches!(self, Self::MainHand | Self::OffHand)
    }

    /// Returns the crest slot attached to this equipment slot, if any.
    #[must_use]
    pub const fn crest(self) -> Option<CrestSlot> {
        match self {
            Self::Head => Some(CrestSlot::Head),
            Self::Body => Some(CrestSlot::Body),
            Self::OffHand => Some(CrestSlot::OffHand),
            _ => None,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Head => "head",
            Self::Body => "body",
            Self::Hands => "hands",
            Self::Legs => "legs",
            Self::Feet => "feet",
            Self::Ears => "ears",
            Self::Neck => "neck",
            Self::Wrists => "wrists",
            Self::RFinger => "right-finger",
            Self::LFinger => "left-finger",
            Self::MainHand => "main-hand",
            Self::OffHand => "off-hand",
        }
    }
}

/// Equipment slots that can display a free company crest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CrestSlot {
    Head,
    Body,
    OffHand,
}

impl CrestSlot {
    pub const COUNT: usize = 3;

    pub const ALL: [Self; Self::COUNT] = [Self::Head, Self::Body, Self::OffHand];

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Returns the equipment slot carrying this crest.
    #[must_use]
    pub const fn equip_slot(self) -> EquipSlot {
        match self {
            Self::Head => EquipSlot::Head,
            Self::Body => EquipSlot::Body,
            Self::OffHand => EquipSlot::OffHand,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Head => "head-crest",
            Self::Body => "body-crest",
            Self::OffHand => "off-hand-crest",
        }
    }
}

/// Meta fields: the model identity plus the boolean display flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MetaIndex {
    ModelId,
    HatVisible,
    WeaponVisible,
    VisorToggled,
    Wetness,
}

impl MetaIndex {
    pub const COUNT: usize = 5;

    pub const ALL: [Self; Self::COUNT] = [
        Self::ModelId,
        Self::HatVisible,
        Self::WeaponVisible,
        Self::VisorToggled,
        Self::Wetness,
    ];

    /// The boolean display flags (everything except the model identity).
    pub const FLAGS: [Self; 4] = [
        Self::HatVisible,
        Self::WeaponVisible,
        Self::VisorToggled,
        Self::Wetness,
    ];

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Returns `true` for boolean flags, `false` for the model identity.
    #[must_use]
    pub const fn is_flag(self) -> bool {
        !matches!(self, Self::ModelId)
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ModelId => "model-id",
            Self::HatVisible => "hat-visible",
            Self::WeaponVisible => "weapon-visible",
            Self::VisorToggled => "visor-toggled",
            Self::Wetness => "wetness",
        }
    }
}

/// Byte-sized appearance values.
///
/// `Race`, `Gender`, `BodyType` and `Clan` form the identity that decides which
/// values are legal for every other index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AppearanceIndex {
    Race,
    Gender,
    BodyType,
    Height,
    Clan,
    Face,
    Hairstyle,
    Highlights,
    SkinColor,
    EyeColorRight,
    HairColor,
    HighlightsColor,
    FacialFeatures,
    TattooColor,
    Eyebrows,
    EyeColorLeft,
    EyeShape,
    SmallIris,
    Nose,
    Jaw,
    Mouth,
    Lipstick,
    LipColor,
    MuscleMass,
    TailShape,
    BustSize,
    FacePaint,
    FacePaintReversed,
    FacePaintColor,
}

impl AppearanceIndex {
    pub const COUNT: usize = 29;

    pub const ALL: [Self; Self::COUNT] = [
        Self::Race,
        Self::Gender,
        Self::BodyType,
        Self::Height,
        Self::Clan,
        Self::Face,
        Self::Hairstyle,
        Self::Highlights,
        Self::SkinColor,
        Self::EyeColorRight,
        Self::HairColor,
        Self::HighlightsColor,
        Self::FacialFeatures,
        Self::TattooColor,
        Self::Eyebrows,
        Self::EyeColorLeft,
        Self::EyeShape,
        Self::SmallIris,
        Self::Nose,
        Self::Jaw,
        Self::Mouth,
        Self::Lipstick,
        Self::LipColor,
        Self::MuscleMass,
        Self::TailShape,
        Self::BustSize,
        Self::FacePaint,
        Self::FacePaintReversed,
        Self::FacePaintColor,
    ];

    /// Identity indices, in the order they must be applied.
    pub const IDENTITY: [Self; 4] = [Self::Race, Self::Clan, Self::Gender, Self::BodyType];

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Returns `true` if this index decides which values are legal elsewhere.
    #[must_use]
    pub const fn is_identity(self) -> bool {
        matches!(self, Self::Race | Self::Gender | Self::BodyType | Self::Clan)
    }

    /// Returns `true` if a change here needs a full model rebuild in the host.
    #[must_use]
    pub const fn requires_rebuild(self) -> bool {
        matches!(
            self,
            Self::Race | Self::Gender | Self::BodyType | Self::Clan | Self::Face
        )
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Race => "race",
            Self::Gender => "gender",
            Self::BodyType => "body-type",
            Self::Height => "height",
            Self::Clan => "clan",
            Self::Face => "face",
            Self::Hairstyle => "hairstyle",
            Self::Highlights => "highlights",
            Self::SkinColor => "skin-color",
            Self::EyeColorRight => "eye-color-right",
            Self::HairColor => "hair-color",
            Self::HighlightsColor => "highlights-color",
            Self::FacialFeatures => "facial-features",
            Self::TattooColor => "tattoo-color",
            Self::Eyebrows => "eyebrows",
            Self::EyeColorLeft => "eye-color-left",
            Self::EyeShape => "eye-shape",
            Self::SmallIris => "small-iris",
            Self::Nose => "nose",
            Self::Jaw => "jaw",
            Self::Mouth => "mouth",
            Self::Lipstick => "lipstick",
            Self::LipColor => "lip-color",
            Self::MuscleMass => "muscle-mass",
            Self::TailShape => "tail-shape",
            Self::BustSize => "bust-size",
            Self::FacePaint => "face-paint",
            Self::FacePaintReversed => "face-paint-reversed",
            Self::FacePaintColor => "face-paint-color",
        }
    }
}

/// Advanced color parameters, applied asynchronously by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ColorParam {
    SkinDiffuse,
    SkinSpecular,
    MuscleTone,
    LipDiffuse,
    HairDiffuse,
    HairSpecular,
    HairHighlight,
    LeftEye,
    RightEye,
    FeatureColor,
    DecalColor,
    FacePaintUvMultiplier,
    FacePaintUvOffset,
}

impl ColorParam {
    pub const COUNT: usize = 13;

    pub const ALL: [Self; Self::COUNT] = [
        Self::SkinDiffuse,
        Self::SkinSpecular,
        Self::MuscleTone,
        Self::LipDiffuse,
        Self::HairDiffuse,
        Self::HairSpecular,
        Self::HairHighlight,
        Self::LeftEye,
        Self::RightEye,
        Self::FeatureColor,
        Self::DecalColor,
        Self::FacePaintUvMultiplier,
        Self::FacePaintUvOffset,
    ];

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::SkinDiffuse => "skin-diffuse",
            Self::SkinSpecular => "skin-specular",
            Self::MuscleTone => "muscle-tone",
            Self::LipDiffuse => "lip-diffuse",
            Self::HairDiffuse => "hair-diffuse",
            Self::HairSpecular => "hair-specular",
            Self::HairHighlight => "hair-highlight",
            Self::LeftEye => "left-eye",
            Self::RightEye => "right-eye",
            Self::FeatureColor => "feature-color",
            Self::DecalColor => "decal-color",
            Self::FacePaintUvMultiplier => "face-paint-uv-multiplier",
            Self::FacePaintUvOffset => "face-paint-uv-offset",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_match_all_order() {
        for (i, slot) in EquipSlot::ALL.iter().enumerate() {
            assert_eq!(slot.index(), i);
            assert_eq!(EquipSlot::from_index(i), Some(*slot));
        }
        for (i, index) in AppearanceIndex::ALL.iter().enumerate() {
            assert_eq!(index.index(), i);
        }
        for (i, param) in ColorParam::ALL.iter().enumerate() {
            assert_eq!(param.index(), i);
        }
        for (i, meta) in MetaIndex::ALL.iter().enumerate() {
            assert_eq!(meta.index(), i);
        }
        assert_eq!(EquipSlot::from_index(EquipSlot::COUNT), None);
    }

    #[test]
    fn weapon_and_crest_mapping() {
        assert!(EquipSlot::MainHand.is_weapon());
        assert!(!EquipSlot::Head.is_weapon());
        for crest in CrestSlot::ALL {
            assert_eq!(crest.equip_slot().crest(), Some(crest));
        }
        assert_eq!(EquipSlot::Feet.crest(), None);
    }

    #[test]
    fn identity_indices_require_rebuild() {
        for index in AppearanceIndex::IDENTITY {
            assert!(index.is_identity());
            assert!(index.requires_rebuild());
        }
        assert!(AppearanceIndex::Face.requires_rebuild());
        assert!(!AppearanceIndex::Face.is_identity());
        assert!(!AppearanceIndex::HairColor.requires_rebuild());
    }

    #[test]
    fn meta_flags_exclude_model_id() {
        assert!(!MetaIndex::ModelId.is_flag());
        assert!(MetaIndex::FLAGS.iter().all(|flag| flag.is_flag()));
    }
}
