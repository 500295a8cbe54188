use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;

/// A closed set of profile attribute values with an explicit "unknown" zero value.
///
/// Ordinals are stable: they are what the attribute store persists, and what
/// `RankMap` uses as table indices.
pub trait Choice: Copy + Eq + fmt::Debug + Send + Sync + 'static {
    /// Every member except the unknown zero value, in ordinal order.
    const VALID: &'static [Self];

    fn ordinal(self) -> usize;

    /// Stable string key, used in serialized rank maps.
    fn key(self) -> &'static str;

    fn from_ordinal(ordinal: i64) -> Option<Self>;

    fn from_key(key: &str) -> Option<Self> {
        Self::VALID.iter().copied().find(|value| value.key() == key)
    }

    #[inline]
    fn is_known(self) -> bool {
        self.ordinal() != 0
    }
}

macro_rules! choice_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident = $ordinal:literal => $key:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            #[default]
            Unknown,
            $($variant),+
        }

        impl Choice for $name {
            const VALID: &'static [Self] = &[$(Self::$variant),+];

            #[inline]
            fn ordinal(self) -> usize {
                match self {
                    Self::Unknown => 0,
                    $(Self::$variant => $ordinal),+
                }
            }

            fn key(self) -> &'static str {
                match self {
                    Self::Unknown => "unknown",
                    $(Self::$variant => $key),+
                }
            }

            fn from_ordinal(ordinal: i64) -> Option<Self> {
                match ordinal {
                    0 => Some(Self::Unknown),
                    $($ordinal => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.key())
            }
        }
    };
}

choice_enum! {
    Gender {
        Female = 1 => "female",
        Male = 2 => "male",
        Other = 3 => "other",
    }
}

choice_enum! {
    Diet {
        Vegan = 1 => "vegan",
        Vegetarian = 2 => "vegetarian",
        Carnist = 3 => "carnist",
    }
}

choice_enum! {
    SmokingStatus {
        No = 1 => "no",
        Sometimes = 2 => "sometimes",
        Yes = 3 => "yes",
    }
}

choice_enum! {
    MaritalStatus {
        Single = 1 => "single",
        Divorced = 2 => "divorced",
        Widowed = 3 => "widowed",
        InRelationship = 4 => "in_relationship",
        InOpenRelationship = 5 => "in_open_relationship",
        Complicated = 6 => "complicated",
        Separated = 7 => "separated",
        Married = 8 => "married",
    }
}

/// Compatibility strength on the closed scale 0..=5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize)]
#[serde(transparent)]
pub struct Rank(u8);

impl Rank {
    pub const UNACCEPTABLE: Rank = Rank(0);
    pub const IDEAL: Rank = Rank(5);

    /// Every rank on the scale, ascending.
    pub const SCALE: [Rank; 6] = [Rank(0), Rank(1), Rank(2), Rank(3), Rank(4), Rank(5)];

    pub fn new(value: i64) -> Option<Rank> {
        (0..=5).contains(&value).then(|| Rank(value as u8))
    }

    #[inline]
    pub fn value(self) -> u8 {
        self.0
    }

    #[inline]
    pub fn is_unacceptable(self) -> bool {
        self.0 == 0
    }
}

impl<'de> Deserialize<'de> for Rank {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = i64::deserialize(deserializer)?;
        Rank::new(value).ok_or_else(|| serde::de::Error::custom(format!("rank {} is not in 0..=5", value)))
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Large enough for the widest choice (marital status, ordinals 0..=8).
const RANK_SLOTS: usize = 9;

/// Per-value rank table keyed by the candidate's attribute value.
///
/// Slots are indexed by `Choice::ordinal`; `None` marks a missing key. Raw
/// values are kept as supplied so that validation can report out-of-scale
/// ranks, while scoring treats anything missing or invalid as unacceptable.
/// Keys that name no valid value are carried along in `stray` so they survive
/// a save and reload and keep failing validation.
pub struct RankMap<C: Choice> {
    slots: [Option<i64>; RANK_SLOTS],
    stray: BTreeMap<String, i64>,
    _choice: PhantomData<C>,
}

impl<C: Choice> RankMap<C> {
    pub fn empty() -> Self {
        Self {
            slots: [None; RANK_SLOTS],
            stray: BTreeMap::new(),
            _choice: PhantomData,
        }
    }

    /// Every valid value ranked ideal.
    pub fn all_ideal() -> Self {
        Self::from_pairs(C::VALID.iter().map(|value| (*value, Rank::IDEAL.value() as i64)))
    }

    pub fn from_pairs<I: IntoIterator<Item = (C, i64)>>(pairs: I) -> Self {
        let mut map = Self::empty();
        for (value, rank) in pairs {
            map.set_raw(value, rank);
        }
        map
    }

    /// Build from the string-keyed form used by the store and the HTTP layer.
    pub fn from_raw(raw: &BTreeMap<String, i64>) -> Self {
        let mut map = Self::empty();
        for (key, rank) in raw {
            match C::from_key(key) {
                Some(value) => map.set_raw(value, *rank),
                None => {
                    map.stray.insert(key.clone(), *rank);
                }
            }
        }
        map
    }

    pub fn to_raw(&self) -> BTreeMap<String, i64> {
        let mut raw = self.stray.clone();
        raw.extend(
            C::VALID
                .iter()
                .filter_map(|value| self.slots[value.ordinal()].map(|rank| (value.key().to_string(), rank))),
        );
        raw
    }

    /// Keys that name no valid value, as supplied.
    pub fn stray_keys(&self) -> impl Iterator<Item = &str> {
        self.stray.keys().map(String::as_str)
    }

    pub fn set(&mut self, value: C, rank: Rank) {
        self.set_raw(value, rank.value() as i64);
    }

    fn set_raw(&mut self, value: C, rank: i64) {
        if value.is_known() {
            self.slots[value.ordinal()] = Some(rank);
        } else {
            self.stray.insert(value.key().to_string(), rank);
        }
    }

    /// Rank for a candidate's value. Missing keys and out-of-scale entries
    /// are unacceptable.
    #[inline]
    pub fn rank_of(&self, value: C) -> Rank {
        self.slots
            .get(value.ordinal())
            .copied()
            .flatten()
            .and_then(Rank::new)
            .unwrap_or(Rank::UNACCEPTABLE)
    }

    /// True when exactly the valid values are keys and each maps onto the scale.
    pub fn is_complete(&self) -> bool {
        self.stray.is_empty()
            && C::VALID
                .iter()
                .all(|value| matches!(self.slots[value.ordinal()], Some(rank) if Rank::new(rank).is_some()))
    }

    pub fn has_ideal(&self) -> bool {
        C::VALID.iter().any(|value| self.rank_of(*value) == Rank::IDEAL)
    }

    /// Coarse preference set: values ranked above unacceptable.
    pub fn acceptable_values(&self) -> Vec<C> {
        C::VALID
            .iter()
            .copied()
            .filter(|value| !self.rank_of(*value).is_unacceptable())
            .collect()
    }
}

impl<C: Choice> Default for RankMap<C> {
    fn default() -> Self {
        Self::all_ideal()
    }
}

impl<C: Choice> Clone for RankMap<C> {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots,
            stray: self.stray.clone(),
            _choice: PhantomData,
        }
    }
}

impl<C: Choice> PartialEq for RankMap<C> {
    fn eq(&self, other: &Self) -> bool {
        self.slots == other.slots && self.stray == other.stray
    }
}

impl<C: Choice> fmt::Debug for RankMap<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.to_raw()).finish()
    }
}

impl<C: Choice> Serialize for RankMap<C> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_raw().serialize(serializer)
    }
}

impl<'de, C: Choice> Deserialize<'de> for RankMap<C> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, i64>::deserialize(deserializer)?;
        Ok(Self::from_raw(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_values_exclude_unknown() {
        assert_eq!(Diet::VALID, &[Diet::Vegan, Diet::Vegetarian, Diet::Carnist]);
        assert_eq!(SmokingStatus::VALID.len(), 3);
        assert_eq!(MaritalStatus::VALID.len(), 8);
        assert!(!Gender::VALID.contains(&Gender::Unknown));
    }

    #[test]
    fn test_ordinals_round_trip() {
        for value in MaritalStatus::VALID {
            assert_eq!(MaritalStatus::from_ordinal(value.ordinal() as i64), Some(*value));
        }
        assert_eq!(MaritalStatus::from_ordinal(9), None);
        assert_eq!(Diet::from_key("vegan"), Some(Diet::Vegan));
        assert_eq!(Diet::from_key("unknown"), None);
    }

    #[test]
    fn test_rank_scale() {
        assert_eq!(Rank::new(0), Some(Rank::UNACCEPTABLE));
        assert_eq!(Rank::new(5), Some(Rank::IDEAL));
        assert_eq!(Rank::new(6), None);
        assert_eq!(Rank::new(-1), None);
    }

    #[test]
    fn test_default_map_is_all_ideal() {
        let map = RankMap::<SmokingStatus>::default();
        assert!(map.is_complete());
        for value in SmokingStatus::VALID {
            assert_eq!(map.rank_of(*value), Rank::IDEAL);
        }
    }

    #[test]
    fn test_missing_key_is_unacceptable() {
        let map = RankMap::<Diet>::from_pairs([(Diet::Vegan, 5)]);
        assert_eq!(map.rank_of(Diet::Vegan), Rank::IDEAL);
        assert_eq!(map.rank_of(Diet::Carnist), Rank::UNACCEPTABLE);
        assert!(!map.is_complete());
    }

    #[test]
    fn test_out_of_scale_rank_is_incomplete() {
        let map = RankMap::<Diet>::from_pairs([(Diet::Vegan, 5), (Diet::Vegetarian, 6), (Diet::Carnist, 0)]);
        assert!(!map.is_complete());
        assert_eq!(map.rank_of(Diet::Vegetarian), Rank::UNACCEPTABLE);
    }

    #[test]
    fn test_stray_key_is_incomplete() {
        let raw: BTreeMap<String, i64> = [("vegan", 5), ("vegetarian", 5), ("carnist", 5), ("fruitarian", 5)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        let map = RankMap::<Diet>::from_raw(&raw);
        assert!(!map.is_complete());
        assert!(map.has_ideal());
        assert_eq!(map.stray_keys().collect::<Vec<_>>(), vec!["fruitarian"]);
    }

    #[test]
    fn test_stray_key_survives_reload() {
        let raw: BTreeMap<String, i64> = [("vegan", 5), ("vegetarian", 5), ("carnist", 5), ("fruitarian", 5)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        let map = RankMap::<Diet>::from_raw(&raw);
        assert_eq!(map.to_raw(), raw);

        let json = serde_json::to_value(&map).unwrap();
        assert_eq!(json["fruitarian"], 5);
        let reloaded: RankMap<Diet> = serde_json::from_value(json).unwrap();
        assert!(!reloaded.is_complete());
        assert_eq!(reloaded, map);
    }

    #[test]
    fn test_acceptable_values() {
        let map = RankMap::<Diet>::from_pairs([(Diet::Vegan, 5), (Diet::Vegetarian, 4), (Diet::Carnist, 0)]);
        assert_eq!(map.acceptable_values(), vec![Diet::Vegan, Diet::Vegetarian]);
    }

    #[test]
    fn test_serialized_form_is_string_keyed() {
        let map = RankMap::<Diet>::from_pairs([(Diet::Vegan, 5), (Diet::Carnist, 1)]);
        let json = serde_json::to_value(&map).unwrap();
        assert_eq!(json, serde_json::json!({"carnist": 1, "vegan": 5}));

        let parsed: RankMap<Diet> = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, map);
    }
}
