//! Appearance values and their legality rules.

use std::ops::RangeInclusive;

use fields::{AppearanceIndex, AppearanceMask};

pub const RACE_HYUR: u8 = 1;
pub const RACE_ELEZEN: u8 = 2;
pub const RACE_LALAFELL: u8 = 3;
pub const RACE_MIQOTE: u8 = 4;
pub const RACE_ROEGADYN: u8 = 5;
pub const RACE_AU_RA: u8 = 6;
pub const RACE_HROTHGAR: u8 = 7;
pub const RACE_VIERA: u8 = 8;

pub const GENDER_MALE: u8 = 0;
pub const GENDER_FEMALE: u8 = 1;

/// One byte per appearance index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Appearance([u8; AppearanceIndex::COUNT]);

impl Appearance {
    /// The canonical default appearance.
    pub const DEFAULT: Self = {
        let mut values = [0u8; AppearanceIndex::COUNT];
        values[AppearanceIndex::Race as usize] = RACE_HYUR;
        values[AppearanceIndex::Gender as usize] = GENDER_MALE;
        values[AppearanceIndex::BodyType as usize] = 1;
        values[AppearanceIndex::Height as usize] = 50;
        values[AppearanceIndex::Clan as usize] = 1;
        values[AppearanceIndex::Face as usize] = 1;
        values[AppearanceIndex::Hairstyle as usize] = 1;
        values[AppearanceIndex::MuscleMass as usize] = 50;
        values[AppearanceIndex::BustSize as usize] = 0;
        Self(values)
    };

    #[must_use]
    pub const fn from_bytes(values: [u8; AppearanceIndex::COUNT]) -> Self {
        Self(values)
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; AppearanceIndex::COUNT] {
        &self.0
    }

    #[must_use]
    pub const fn get(&self, index: AppearanceIndex) -> u8 {
        self.0[index as usize]
    }

    /// Sets one value, returning the previous one.
    pub fn set(&mut self, index: AppearanceIndex, value: u8) -> u8 {
        std::mem::replace(&mut self.0[index.index()], value)
    }

    #[must_use]
    pub const fn race(&self) -> u8 {
        self.get(AppearanceIndex::Race)
    }

    #[must_use]
    pub const fn clan(&self) -> u8 {
        self.get(AppearanceIndex::Clan)
    }

    #[must_use]
    pub const fn gender(&self) -> u8 {
        self.get(AppearanceIndex::Gender)
    }

    #[must_use]
    pub const fn body_type(&self) -> u8 {
        self.get(AppearanceIndex::BodyType)
    }

    /// Returns the indices whose values differ between `self` and `other`.
    #[must_use]
    pub fn diff(&self, other: &Self) -> AppearanceMask {
        AppearanceIndex::ALL
            .into_iter()
            .filter(|index| self.get(*index) != other.get(*index))
            .collect()
    }

    /// Copies the values selected by `mask` from `other`.
    pub fn copy_from(&mut self, other: &Self, mask: AppearanceMask) {
        for index in mask.iter() {
            self.set(index, other.get(index));
        }
    }
}

impl Default for Appearance {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Decides which appearance values are legal for a given identity.
///
/// The legal set for every index is a contiguous range that may depend on the
/// appearance's current race, clan, gender and body type.
pub trait AppearanceRules {
    /// Returns the legal range of `index` for the identity of `appearance`.
    fn range(&self, appearance: &Appearance, index: AppearanceIndex) -> RangeInclusive<u8>;

    /// Returns `true` if `value` is legal at `index` for the identity of `appearance`.
    fn is_valid(&self, appearance: &Appearance, index: AppearanceIndex, value: u8) -> bool {
        self.range(appearance, index).contains(&value)
    }

    /// Returns `true` if race, clan, gender and body type form a legal identity.
    fn identity_valid(&self, appearance: &Appearance) -> bool {
        AppearanceIndex::IDENTITY
            .into_iter()
            .all(|index| self.is_valid(appearance, index, appearance.get(index)))
    }

    /// Clamps every value into its legal range, identity first.
    ///
    /// Returns the indices that had to change.
    fn fix(&self, appearance: &mut Appearance) -> AppearanceMask {
        let mut changed = AppearanceMask::EMPTY;
        let ordered = AppearanceIndex::IDENTITY.into_iter().chain(
            AppearanceIndex::ALL
                .into_iter()
                .filter(|index| !index.is_identity()),
        );
        for index in ordered {
            let range = self.range(appearance, index);
            let value = appearance.get(index);
            let clamped = value.clamp(*range.start(), *range.end());
            if clamped != value {
                appearance.set(index, clamped);
                changed.insert(index);
            }
        }
        changed
    }
}

/// Built-in legality table for playable humanoid appearances.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardRules;

impl StandardRules {
    const fn has_tail(race: u8) -> bool {
        matches!(race, RACE_MIQOTE | RACE_AU_RA | RACE_HROTHGAR)
    }
}

impl AppearanceRules for StandardRules {
    fn range(&self, appearance: &Appearance, index: AppearanceIndex) -> RangeInclusive<u8> {
        let race = appearance.race();
        match index {
            AppearanceIndex::Race => RACE_HYUR..=RACE_VIERA,
            AppearanceIndex::Clan => {
                let race = race.clamp(RACE_HYUR, RACE_VIERA);
                (race * 2 - 1)..=(race * 2)
            }
            AppearanceIndex::Gender => GENDER_MALE..=GENDER_FEMALE,
            AppearanceIndex::BodyType => 1..=1,
            AppearanceIndex::Height | AppearanceIndex::MuscleMass => 0..=100,
            AppearanceIndex::BustSize => {
                if appearance.gender() == GENDER_FEMALE {
                    0..=100
                } else {
                    0..=0
                }
            }
            AppearanceIndex::Face => 1..=4,
            AppearanceIndex::Hairstyle => match race {
                RACE_HROTHGAR => 1..=8,
                RACE_VIERA | RACE_LALAFELL => 1..=40,
                _ => 1..=50,
            },
            AppearanceIndex::TailShape => {
                if Self::has_tail(race) {
                    1..=4
                } else {
                    0..=0
                }
            }
            AppearanceIndex::Highlights
            | AppearanceIndex::SmallIris
            | AppearanceIndex::Lipstick
            | AppearanceIndex::FacePaintReversed => 0..=1,
            AppearanceIndex::FacialFeatures => 0..=u8::MAX,
            AppearanceIndex::Eyebrows => 0..=4,
            AppearanceIndex::EyeShape
            | AppearanceIndex::Nose
            | AppearanceIndex::Jaw
            | AppearanceIndex::Mouth => 0..=5,
            AppearanceIndex::FacePaint => 0..=30,
            AppearanceIndex::SkinColor
            | AppearanceIndex::EyeColorRight
            | AppearanceIndex::EyeColorLeft
            | AppearanceIndex::HairColor
            | AppearanceIndex::HighlightsColor
            | AppearanceIndex::TattooColor
            | AppearanceIndex::LipColor
            | AppearanceIndex::FacePaintColor => 0..=191,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid_under_standard_rules() {
        let mut appearance = Appearance::DEFAULT;
        assert!(StandardRules.identity_valid(&appearance));
        assert!(StandardRules.fix(&mut appearance).is_empty());
    }

    #[test]
    fn clan_range_follows_race() {
        let mut appearance = Appearance::DEFAULT;
        appearance.set(AppearanceIndex::Race, RACE_MIQOTE);
        assert_eq!(
            StandardRules.range(&appearance, AppearanceIndex::Clan),
            7..=8
        );
        assert!(!StandardRules.identity_valid(&appearance));
    }

    #[test]
    fn fix_revalidates_after_race_change() {
        let mut appearance = Appearance::DEFAULT;
        appearance.set(AppearanceIndex::Race, RACE_HROTHGAR);
        appearance.set(AppearanceIndex::Hairstyle, 30);

        let changed = StandardRules.fix(&mut appearance);

        assert_eq!(appearance.clan(), 13);
        assert_eq!(appearance.get(AppearanceIndex::Hairstyle), 8);
        assert_eq!(appearance.get(AppearanceIndex::TailShape), 1);
        assert!(changed.contains(AppearanceIndex::Clan));
        assert!(changed.contains(AppearanceIndex::Hairstyle));
        assert!(changed.contains(AppearanceIndex::TailShape));
        assert!(StandardRules.identity_valid(&appearance));
    }

    #[test]
    fn diff_reports_changed_indices() {
        let mut other = Appearance::DEFAULT;
        other.set(AppearanceIndex::HairColor, 12);
        other.set(AppearanceIndex::Face, 3);
        let diff = Appearance::DEFAULT.diff(&other);
        assert_eq!(diff.len(), 2);
        assert!(diff.contains(AppearanceIndex::Face));
    }

    #[test]
    fn copy_from_respects_mask() {
        let mut source = Appearance::DEFAULT;
        source.set(AppearanceIndex::HairColor, 12);
        source.set(AppearanceIndex::Face, 3);
        let mut target = Appearance::DEFAULT;
        target.copy_from(&source, AppearanceMask::single(AppearanceIndex::Face));
        assert_eq!(target.get(AppearanceIndex::Face), 3);
        assert_eq!(target.get(AppearanceIndex::HairColor), 0);
    }
}
