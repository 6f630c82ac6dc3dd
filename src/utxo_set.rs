//! Indexed collection of UTXOs with set algebra.
//!
//! A `UtxoSet` is owned by one caller at a time. Set operations never touch
//! their arguments; they return a fresh set.

use std::{fmt, str::FromStr};

use indexmap::{IndexMap, IndexSet};
use serde_json::Value;
use tracing::trace;

use crate::{
    data_structures::{
        asset_amount::AssetAmountDestination,
        output_owners::Ownable,
        types::{unix_now, Address, AssetId},
        utxo::Utxo,
    },
    encoding::{serialization::get_object, Encoding, Fields, Serializable, Serialization},
    errors::{WalletError, WalletResult},
    signing::prepare::input_selector::{InputSelector, SelectionOptions},
};

/// A UTXO given either as a value or in its cb58 string form
#[derive(Debug, Clone, Copy)]
pub enum UtxoInput<'a> {
    Value(&'a Utxo),
    Encoded(&'a str),
}

impl<'a> From<&'a Utxo> for UtxoInput<'a> {
    fn from(utxo: &'a Utxo) -> Self {
        UtxoInput::Value(utxo)
    }
}

impl<'a> From<&'a str> for UtxoInput<'a> {
    fn from(encoded: &'a str) -> Self {
        UtxoInput::Encoded(encoded)
    }
}

/// Always returns an owned copy, never a handle into the caller's value
pub fn parse_utxo(input: UtxoInput<'_>) -> WalletResult<Utxo> {
    match input {
        UtxoInput::Value(utxo) => Ok(utxo.clone()),
        UtxoInput::Encoded(encoded) => Utxo::from_cb58(encoded),
    }
}

/// How [`UtxoSet::merge_by_rule`] combines two sets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MergeRule {
    Intersection,
    DifferenceSelf,
    DifferenceNew,
    SymDifference,
    Union,
    UnionMinusNew,
    UnionMinusSelf,
}

impl fmt::Display for MergeRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MergeRule::Intersection => "intersection",
            MergeRule::DifferenceSelf => "differenceSelf",
            MergeRule::DifferenceNew => "differenceNew",
            MergeRule::SymDifference => "symDifference",
            MergeRule::Union => "union",
            MergeRule::UnionMinusNew => "unionMinusNew",
            MergeRule::UnionMinusSelf => "unionMinusSelf",
        };
        write!(f, "{name}")
    }
}

impl FromStr for MergeRule {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "intersection" => Ok(MergeRule::Intersection),
            "differenceSelf" => Ok(MergeRule::DifferenceSelf),
            "differenceNew" => Ok(MergeRule::DifferenceNew),
            "symDifference" => Ok(MergeRule::SymDifference),
            "union" => Ok(MergeRule::Union),
            "unionMinusNew" => Ok(MergeRule::UnionMinusNew),
            "unionMinusSelf" => Ok(MergeRule::UnionMinusSelf),
            other => Err(WalletError::MergeRule(format!("unknown merge rule {other}"))),
        }
    }
}

/// UTXOs keyed by id, plus an index from owner address to the ids it owns
/// and each output's locktime
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UtxoSet {
    utxos: IndexMap<String, Utxo>,
    address_utxos: IndexMap<Address, IndexMap<String, u64>>,
}

impl UtxoSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.utxos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.utxos.is_empty()
    }

    /// UTXOs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Utxo> {
        self.utxos.values()
    }

    pub fn includes(&self, utxo: &Utxo) -> bool {
        self.utxos.contains_key(&utxo.id())
    }

    /// Insert a UTXO. An existing id is only replaced when `overwrite` is
    /// set; returns the stored copy, or `None` when nothing changed.
    pub fn add<'a>(
        &mut self,
        input: impl Into<UtxoInput<'a>>,
        overwrite: bool,
    ) -> WalletResult<Option<Utxo>> {
        let utxo = parse_utxo(input.into())?;
        Ok(self.insert(utxo, overwrite))
    }

    fn insert(&mut self, utxo: Utxo, overwrite: bool) -> Option<Utxo> {
        let id = utxo.id();
        if self.utxos.contains_key(&id) {
            if !overwrite {
                return None;
            }
            self.unindex(&id);
        }
        let locktime = utxo.output.locktime();
        for address in utxo.output.addresses() {
            self.address_utxos
                .entry(*address)
                .or_default()
                .insert(id.clone(), locktime);
        }
        trace!(utxo_id = %id, overwrite, "Added UTXO");
        self.utxos.insert(id, utxo.clone());
        Some(utxo)
    }

    pub fn add_array<'a, I, U>(&mut self, inputs: I, overwrite: bool) -> WalletResult<Vec<Utxo>>
    where
        I: IntoIterator<Item = U>,
        U: Into<UtxoInput<'a>>,
    {
        let mut added = Vec::new();
        for input in inputs {
            if let Some(utxo) = self.add(input, overwrite)? {
                added.push(utxo);
            }
        }
        Ok(added)
    }

    /// Remove a UTXO and its address index entries
    pub fn remove<'a>(&mut self, input: impl Into<UtxoInput<'a>>) -> WalletResult<Option<Utxo>> {
        let utxo = parse_utxo(input.into())?;
        let id = utxo.id();
        if !self.utxos.contains_key(&id) {
            return Ok(None);
        }
        self.unindex(&id);
        let removed = self.utxos.shift_remove(&id);
        trace!(utxo_id = %id, "Removed UTXO");
        Ok(removed)
    }

    pub fn remove_array<'a, I, U>(&mut self, inputs: I) -> WalletResult<Vec<Utxo>>
    where
        I: IntoIterator<Item = U>,
        U: Into<UtxoInput<'a>>,
    {
        let mut removed = Vec::new();
        for input in inputs {
            if let Some(utxo) = self.remove(input)? {
                removed.push(utxo);
            }
        }
        Ok(removed)
    }

    fn unindex(&mut self, id: &str) {
        let Some(existing) = self.utxos.get(id) else {
            return;
        };
        for address in existing.output.addresses() {
            if let Some(ids) = self.address_utxos.get_mut(address) {
                ids.shift_remove(id);
                if ids.is_empty() {
                    self.address_utxos.shift_remove(address);
                }
            }
        }
    }

    pub fn get_utxo(&self, id: &str) -> Option<&Utxo> {
        self.utxos.get(id)
    }

    /// Every UTXO, or only those named in `ids`
    pub fn get_all_utxos(&self, ids: Option<&[String]>) -> Vec<Utxo> {
        match ids {
            Some(ids) => ids
                .iter()
                .filter_map(|id| self.utxos.get(id))
                .cloned()
                .collect(),
            None => self.utxos.values().cloned().collect(),
        }
    }

    /// cb58 forms of [`get_all_utxos`](Self::get_all_utxos)
    pub fn get_all_utxo_strings(&self, ids: Option<&[String]>) -> Vec<String> {
        self.get_all_utxos(ids).iter().map(Utxo::to_cb58).collect()
    }

    /// Ids owned by any of `addresses` (all ids when `None`). With
    /// `spendable`, outputs whose locktime has not passed are left out.
    pub fn get_utxo_ids(&self, addresses: Option<&[Address]>, spendable: bool) -> Vec<String> {
        let Some(addresses) = addresses else {
            return self.utxos.keys().cloned().collect();
        };
        let now = unix_now();
        let mut ids = IndexSet::new();
        for address in addresses {
            if let Some(owned) = self.address_utxos.get(address) {
                for (id, locktime) in owned {
                    if !spendable || *locktime <= now {
                        ids.insert(id.clone());
                    }
                }
            }
        }
        ids.into_iter().collect()
    }

    pub fn get_addresses(&self) -> Vec<Address> {
        self.address_utxos.keys().copied().collect()
    }

    pub fn get_asset_ids(&self, addresses: Option<&[Address]>) -> Vec<AssetId> {
        let ids = self.get_utxo_ids(addresses, false);
        let assets: IndexSet<AssetId> = ids
            .iter()
            .filter_map(|id| self.utxos.get(id))
            .map(|utxo| utxo.asset_id)
            .collect();
        assets.into_iter().collect()
    }

    /// Value of `asset_id` that `addresses` can spend at `as_of`
    pub fn get_balance(&self, addresses: &[Address], asset_id: &AssetId, as_of: u64) -> u64 {
        self.get_utxo_ids(Some(addresses), false)
            .iter()
            .filter_map(|id| self.utxos.get(id))
            .filter(|utxo| &utxo.asset_id == asset_id)
            .filter(|utxo| utxo.output.meets_threshold(addresses, as_of))
            .filter_map(|utxo| utxo.amount())
            .fold(0u64, |total, amount| total.saturating_add(amount))
    }

    pub fn filter<F>(&self, predicate: F) -> UtxoSet
    where
        F: Fn(&Utxo) -> bool,
    {
        let mut result = UtxoSet::new();
        for utxo in self.utxos.values().filter(|u| predicate(u)) {
            result.insert(utxo.clone(), false);
        }
        result
    }

    /// New set holding the UTXOs of both sets (first occurrence wins),
    /// restricted to `ids` when given
    pub fn merge(&self, other: &UtxoSet, ids: Option<&[String]>) -> UtxoSet {
        let mut result = UtxoSet::new();
        for source in [self, other] {
            for utxo in source.get_all_utxos(ids) {
                result.insert(utxo, false);
            }
        }
        result
    }

    pub fn intersection(&self, other: &UtxoSet) -> UtxoSet {
        let ids: Vec<String> = self
            .utxos
            .keys()
            .filter(|id| other.utxos.contains_key(*id))
            .cloned()
            .collect();
        self.merge(other, Some(&ids))
    }

    /// UTXOs of this set that are not in `other`
    pub fn difference(&self, other: &UtxoSet) -> UtxoSet {
        let ids: Vec<String> = self
            .utxos
            .keys()
            .filter(|id| !other.utxos.contains_key(*id))
            .cloned()
            .collect();
        self.merge(other, Some(&ids))
    }

    pub fn sym_difference(&self, other: &UtxoSet) -> UtxoSet {
        let ids: Vec<String> = self
            .utxos
            .keys()
            .filter(|id| !other.utxos.contains_key(*id))
            .chain(
                other
                    .utxos
                    .keys()
                    .filter(|id| !self.utxos.contains_key(*id)),
            )
            .cloned()
            .collect();
        self.merge(other, Some(&ids))
    }

    pub fn union(&self, other: &UtxoSet) -> UtxoSet {
        self.merge(other, None)
    }

    pub fn merge_by_rule(&self, other: &UtxoSet, rule: MergeRule) -> UtxoSet {
        match rule {
            MergeRule::Intersection => self.intersection(other),
            MergeRule::DifferenceSelf => self.difference(other),
            MergeRule::DifferenceNew => other.difference(self),
            MergeRule::SymDifference => self.sym_difference(other),
            MergeRule::Union => self.union(other),
            MergeRule::UnionMinusNew => self.union(other).difference(other),
            MergeRule::UnionMinusSelf => self.union(other).difference(self),
        }
    }

    /// Fund `aad` from this set; see [`InputSelector`]
    pub fn get_minimum_spendable(
        &self,
        aad: AssetAmountDestination,
        options: SelectionOptions,
    ) -> WalletResult<AssetAmountDestination> {
        InputSelector::new(self, options).select(aad)
    }
}

impl Serializable for UtxoSet {
    fn type_name(&self) -> &'static str {
        "UTXOSet"
    }

    fn serialize_fields(&self, ctx: &Serialization, encoding: Encoding) -> WalletResult<Fields> {
        let mut utxos = Fields::new();
        for (id, utxo) in &self.utxos {
            utxos.insert(id.clone(), utxo.serialize_json(ctx, encoding)?);
        }
        let mut fields = Fields::new();
        fields.insert("utxos".into(), Value::Object(utxos));
        Ok(fields)
    }

    fn deserialize_fields(
        fields: &Fields,
        ctx: &Serialization,
        encoding: Encoding,
    ) -> WalletResult<Self> {
        let mut set = UtxoSet::new();
        for value in get_object(fields, "utxos")?.values() {
            set.insert(Utxo::deserialize_json(value, ctx, encoding)?, false);
        }
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structures::{transaction_output::Output, types::TxId};

    fn addr(b: u8) -> Address {
        Address::new([b; 20])
    }

    fn utxo(tx: u8, amount: u64, owner: u8, locktime: u64) -> Utxo {
        Utxo::new(
            TxId::new([tx; 32]),
            0,
            AssetId::new([1u8; 32]),
            Output::transfer(amount, vec![addr(owner)], locktime, 1).unwrap(),
        )
    }

    #[test]
    fn test_add_respects_overwrite() {
        let mut set = UtxoSet::new();
        let first = utxo(1, 10, 1, 0);
        assert!(set.add(&first, false).unwrap().is_some());
        let mut replacement = first.clone();
        replacement.output = Output::transfer(20, vec![addr(2)], 0, 1).unwrap();
        assert!(set.add(&replacement, false).unwrap().is_none());
        assert_eq!(set.get_utxo(&first.id()).unwrap().amount(), Some(10));
        assert!(set.add(&replacement, true).unwrap().is_some());
        assert_eq!(set.get_utxo(&first.id()).unwrap().amount(), Some(20));
        assert_eq!(set.get_addresses(), vec![addr(2)]);
    }

    #[test]
    fn test_add_encoded_form() {
        let mut set = UtxoSet::new();
        let value = utxo(4, 10, 1, 0);
        let encoded = value.to_cb58();
        set.add(encoded.as_str(), false).unwrap();
        assert!(set.includes(&value));
        assert_eq!(set.get_all_utxo_strings(None), vec![encoded]);
    }

    #[test]
    fn test_remove_prunes_index() {
        let mut set = UtxoSet::new();
        let a = utxo(1, 10, 1, 0);
        let b = utxo(2, 10, 2, 0);
        set.add_array([&a, &b], false).unwrap();
        assert_eq!(set.remove(&a).unwrap(), Some(a.clone()));
        assert_eq!(set.remove(&a).unwrap(), None);
        assert_eq!(set.get_addresses(), vec![addr(2)]);
        assert!(set.get_utxo_ids(Some(&[addr(1)]), false).is_empty());
        set.remove_array([&b]).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn test_spendable_ids_skip_future_locktime() {
        let mut set = UtxoSet::new();
        let locked = utxo(1, 10, 1, u64::MAX);
        let free = utxo(2, 10, 1, 0);
        set.add_array([&locked, &free], false).unwrap();
        assert_eq!(set.get_utxo_ids(Some(&[addr(1)]), false).len(), 2);
        assert_eq!(set.get_utxo_ids(Some(&[addr(1)]), true), vec![free.id()]);
    }

    #[test]
    fn test_balance_needs_threshold() {
        let mut set = UtxoSet::new();
        set.add(&utxo(1, 10, 1, 0), false).unwrap();
        set.add(&utxo(2, 15, 1, 100), false).unwrap();
        let asset = AssetId::new([1u8; 32]);
        assert_eq!(set.get_balance(&[addr(1)], &asset, 50), 10);
        assert_eq!(set.get_balance(&[addr(1)], &asset, 101), 25);
        assert_eq!(set.get_balance(&[addr(9)], &asset, 101), 0);
        assert_eq!(set.get_asset_ids(None), vec![asset]);
    }

    #[test]
    fn test_merge_rules() {
        let mut a = UtxoSet::new();
        let mut b = UtxoSet::new();
        let shared = utxo(1, 1, 1, 0);
        let only_a = utxo(2, 1, 1, 0);
        let only_b = utxo(3, 1, 2, 0);
        a.add_array([&shared, &only_a], false).unwrap();
        b.add_array([&shared, &only_b], false).unwrap();

        let check = |rule: &str, expected: &[&Utxo]| {
            let rule: MergeRule = rule.parse().unwrap();
            let result = a.merge_by_rule(&b, rule);
            assert_eq!(result.len(), expected.len(), "{rule}");
            for utxo in expected {
                assert!(result.includes(utxo), "{rule}");
            }
        };
        check("intersection", &[&shared]);
        check("differenceSelf", &[&only_a]);
        check("differenceNew", &[&only_b]);
        check("symDifference", &[&only_a, &only_b]);
        check("union", &[&shared, &only_a, &only_b]);
        check("unionMinusNew", &[&only_a]);
        check("unionMinusSelf", &[&only_b]);

        let err = "merge".parse::<MergeRule>().unwrap_err();
        assert!(matches!(err, WalletError::MergeRule(_)));
    }

    #[test]
    fn test_filter_copies() {
        let mut set = UtxoSet::new();
        set.add_array([&utxo(1, 5, 1, 0), &utxo(2, 50, 1, 0)], false)
            .unwrap();
        let big = set.filter(|u| u.amount().unwrap_or_default() > 10);
        assert_eq!(big.len(), 1);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_reflection_round_trip() {
        let ctx = Serialization::new("local", "P");
        let mut set = UtxoSet::new();
        set.add_array([&utxo(1, 5, 1, 0), &utxo(2, 50, 2, 0)], false)
            .unwrap();
        let value = set.serialize_json(&ctx, Encoding::Hex).unwrap();
        assert_eq!(UtxoSet::deserialize_json(&value, &ctx, Encoding::Hex).unwrap(), set);
    }
}
