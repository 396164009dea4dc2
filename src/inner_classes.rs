use crate::class_file::{ConstantPoolOverflow, ConstantsPool, InnerClass, InnerClasses};
use crate::InnerClassAccessFlags;
use std::collections::BTreeMap;

/// Nested-class relationship, in symbolic form
///
/// One of these becomes one record of the `InnerClasses` attribute once the class names are
/// resolved against a constant pool.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct InnerClassRecord {
    /// Internal name of the nested class (eg. `Outer$Inner`)
    pub inner_class: String,

    /// Internal name of the enclosing class (eg. `Outer`)
    pub outer_class: String,

    /// Simple name of the nested class (eg. `Inner`)
    pub inner_name: String,

    pub access_flags: InnerClassAccessFlags,
}

/// Inner-class records keyed by inner simple name
///
/// Backed by a `BTreeMap` so that the emitted attribute records come out in a deterministic
/// order regardless of how the class references were collected.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct InnerClassMap(BTreeMap<String, InnerClassRecord>);

impl InnerClassMap {
    pub fn new() -> InnerClassMap {
        InnerClassMap(BTreeMap::new())
    }

    /// Synthesize nested-class relationships from class names referenced in a compiled unit
    ///
    /// A name is treated as nested if splitting it on the rightmost `$` leaves a non-empty outer
    /// and inner segment, where the inner segment does not end with `;` (which would mean the
    /// "name" is really a descriptor, eg. `[Lfoo$bar;`). Synthesized records get
    /// `PUBLIC | STATIC` access flags.
    ///
    /// The convention can misfire on classes that legitimately carry `$` in their name; callers
    /// can veto individual names through `exclude`. When two names share an inner simple name,
    /// the first one encountered wins.
    pub fn detect<'a>(
        class_names: impl IntoIterator<Item = &'a str>,
        exclude: impl Fn(&str) -> bool,
    ) -> InnerClassMap {
        let mut records = BTreeMap::new();
        for name in class_names {
            if exclude(name) {
                continue;
            }
            let (outer, inner) = match name.rsplit_once('$') {
                Some(split) => split,
                None => continue,
            };
            if outer.is_empty() || inner.is_empty() || inner.ends_with(';') {
                continue;
            }
            log::trace!("synthesizing inner class record for {}", name);
            records.entry(inner.to_owned()).or_insert_with(|| InnerClassRecord {
                inner_class: name.to_owned(),
                outer_class: outer.to_owned(),
                inner_name: inner.to_owned(),
                access_flags: InnerClassAccessFlags::PUBLIC | InnerClassAccessFlags::STATIC,
            });
        }
        InnerClassMap(records)
    }

    /// Left-biased union: on a key collision the entry from `self` wins
    ///
    /// This is deliberately not a commutative set union - `a.merge(b)` and `b.merge(a)` differ
    /// whenever both maps carry a record for the same inner simple name, and callers composing
    /// compiled units rely on which operand takes precedence.
    pub fn merge(self, other: InnerClassMap) -> InnerClassMap {
        let mut merged = self.0;
        for (inner_name, record) in other.0 {
            merged.entry(inner_name).or_insert(record);
        }
        InnerClassMap(merged)
    }

    pub fn insert(&mut self, record: InnerClassRecord) {
        self.0.insert(record.inner_name.clone(), record);
    }

    pub fn get(&self, inner_name: &str) -> Option<&InnerClassRecord> {
        self.0.get(inner_name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &InnerClassRecord> {
        self.0.values()
    }

    /// Resolve the records against the pool and build the attribute body
    ///
    /// This registers the constants each record needs: the inner and outer class constants (and
    /// transitively their UTF-8 names) plus the inner simple name.
    pub fn into_attribute(
        self,
        constants: &mut ConstantsPool,
    ) -> Result<InnerClasses, ConstantPoolOverflow> {
        let mut records = Vec::with_capacity(self.0.len());
        for record in self.0.values() {
            let inner_class = constants.get_class(&record.inner_class)?;
            let outer_class = constants.get_class(&record.outer_class)?;
            let inner_name = constants.get_utf8(record.inner_name.as_str())?;
            records.push(InnerClass {
                inner_class,
                outer_class,
                inner_name,
                access_flags: record.access_flags,
            });
        }
        Ok(InnerClasses(records))
    }
}
