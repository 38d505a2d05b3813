//! Identity-preserving deep cloning and branch merging.
//!
//! When the evaluator forks for a conditional it deep-clones the
//! environment once per branch: every object is cloned exactly once and
//! every binding that aliased it is rewritten to the same clone, so
//! aliases remain aliases inside the branch while mutations stay isolated
//! from the other branch. Clones get fresh identity tokens; the fork
//! records clone-to-original provenance so the merge can pair the two
//! branch versions of each object back up.
//!
//! Merging writes per-key unions of the two post-branch property maps
//! into the *original* objects, which keeps every alias in the unforked
//! environment valid without rebinding, then re-unions every binding.

use indexmap::IndexMap;
use rustc_hash::FxHashMap;

use crate::types::{Env, InstanceValue, ObjectId, ObjectIdGen, ObjectRef, TypeValue};

/// Provenance of one branch fork: original object per clone.
#[derive(Debug, Default)]
pub struct BranchClones {
    /// original id -> (original handle, clone handle)
    pairs: FxHashMap<ObjectId, (ObjectRef, ObjectRef)>,
    /// clone id -> original id
    origin: FxHashMap<ObjectId, ObjectId>,
}

impl BranchClones {
    fn clone_of(&mut self, orig: &ObjectRef, idgen: &ObjectIdGen) -> ObjectRef {
        let orig_id = orig.id();
        if let Some((_, clone)) = self.pairs.get(&orig_id) {
            return clone.clone();
        }
        // Register the (empty) clone before descending into properties so
        // self-referential objects terminate.
        let clone = ObjectRef::new(idgen, IndexMap::new());
        self.origin.insert(clone.id(), orig_id);
        self.pairs.insert(orig_id, (orig.clone(), clone.clone()));

        let props: Vec<(String, TypeValue)> = orig
            .0
            .borrow()
            .props
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        for (key, value) in props {
            let cloned = self.clone_value(&value, idgen);
            clone.set(key, cloned);
        }
        clone
    }

    fn clone_value(&mut self, value: &TypeValue, idgen: &ObjectIdGen) -> TypeValue {
        match value {
            TypeValue::Object(obj) => TypeValue::Object(self.clone_of(obj, idgen)),
            TypeValue::Instance(instance) => TypeValue::Instance(InstanceValue {
                class_name: instance.class_name.clone(),
                ancestry: instance.ancestry.clone(),
                data: self.clone_of(&instance.data, idgen),
            }),
            TypeValue::Array(elem) => {
                TypeValue::Array(Box::new(self.clone_value(elem, idgen)))
            }
            TypeValue::Tuple(elems) => TypeValue::Tuple(
                elems.iter().map(|e| self.clone_value(e, idgen)).collect(),
            ),
            TypeValue::Promise(inner) => {
                TypeValue::Promise(Box::new(self.clone_value(inner, idgen)))
            }
            TypeValue::Union(members) => TypeValue::Union(std::rc::Rc::new(
                members.iter().map(|m| self.clone_value(m, idgen)).collect(),
            )),
            // Functions and classes are shared: their captured scopes are
            // append-only and branch bodies cannot rebind through them.
            other => other.clone(),
        }
    }

    /// Map a branch value back to pre-fork handles: clones become their
    /// originals, recursively through containers.
    fn resolve(&self, value: &TypeValue) -> TypeValue {
        match value {
            TypeValue::Object(obj) => match self.origin.get(&obj.id()) {
                Some(orig_id) => match self.pairs.get(orig_id) {
                    Some((orig, _)) => TypeValue::Object(orig.clone()),
                    None => value.clone(),
                },
                None => value.clone(),
            },
            TypeValue::Instance(instance) => match self.origin.get(&instance.data.id()) {
                Some(orig_id) => match self.pairs.get(orig_id) {
                    Some((orig, _)) => TypeValue::Instance(InstanceValue {
                        class_name: instance.class_name.clone(),
                        ancestry: instance.ancestry.clone(),
                        data: orig.clone(),
                    }),
                    None => value.clone(),
                },
                None => value.clone(),
            },
            TypeValue::Array(elem) => TypeValue::Array(Box::new(self.resolve(elem))),
            TypeValue::Tuple(elems) => {
                TypeValue::Tuple(elems.iter().map(|e| self.resolve(e)).collect())
            }
            TypeValue::Promise(inner) => TypeValue::Promise(Box::new(self.resolve(inner))),
            TypeValue::Union(members) => TypeValue::Union(std::rc::Rc::new(
                members.iter().map(|m| self.resolve(m)).collect(),
            )),
            other => other.clone(),
        }
    }
}

/// Deep-copy an environment chain, preserving aliasing within the copy.
/// This is both `snapshot` and the per-branch fork.
pub fn fork_env(env: &Env, idgen: &ObjectIdGen) -> (Env, BranchClones) {
    let mut clones = BranchClones::default();
    let forked = clone_chain(env, idgen, &mut clones);
    (forked, clones)
}

/// `snapshot` without provenance, for callers that only need the copy.
pub fn snapshot_env(env: &Env, idgen: &ObjectIdGen) -> Env {
    fork_env(env, idgen).0
}

fn clone_chain(env: &Env, idgen: &ObjectIdGen, clones: &mut BranchClones) -> Env {
    let target = match env.parent() {
        Some(parent) => clone_chain(&parent, idgen, clones).child(),
        None => Env::new(),
    };
    for (name, value) in env.local_bindings() {
        target.bind(name, clones.clone_value(&value, idgen));
    }
    target
}

/// Fold the two branch environments back into `base`.
///
/// Property maps of paired objects merge per key (union of the two
/// post-branch values, `undefined` joining keys present on one side
/// only), written into the original object so untouched aliases observe
/// the merge. Every binding reachable from `base` is then re-unioned from
/// the two branch values.
pub fn merge_branches(
    base: &Env,
    left: &Env,
    left_clones: &BranchClones,
    right: &Env,
    right_clones: &BranchClones,
) {
    // Both forks cloned the same reachable set, so iterate one map and
    // look pairs up in the other.
    for (orig_id, (orig, left_clone)) in &left_clones.pairs {
        let Some((_, right_clone)) = right_clones.pairs.get(orig_id) else {
            continue;
        };
        let merged = merge_props(left_clone, left_clones, right_clone, right_clones);
        orig.0.borrow_mut().props = merged;
    }

    for name in base.names() {
        let left_value = left.lookup(&name);
        let right_value = right.lookup(&name);
        let merged = merge_values(&left_value, left_clones, &right_value, right_clones);
        base.update(&name, merged);
    }
}

fn merge_props(
    left: &ObjectRef,
    left_clones: &BranchClones,
    right: &ObjectRef,
    right_clones: &BranchClones,
) -> IndexMap<String, TypeValue> {
    let left_props = left.0.borrow().props.clone();
    let right_props = right.0.borrow().props.clone();

    let mut merged = IndexMap::new();
    for (key, left_value) in &left_props {
        let value = match right_props.get(key) {
            Some(right_value) => {
                merge_values(left_value, left_clones, right_value, right_clones)
            }
            None => TypeValue::union2(left_clones.resolve(left_value), TypeValue::undefined()),
        };
        merged.insert(key.clone(), value);
    }
    for (key, right_value) in &right_props {
        if merged.contains_key(key) {
            continue;
        }
        merged.insert(
            key.clone(),
            TypeValue::union2(right_clones.resolve(right_value), TypeValue::undefined()),
        );
    }
    merged
}

fn merge_values(
    left: &TypeValue,
    left_clones: &BranchClones,
    right: &TypeValue,
    right_clones: &BranchClones,
) -> TypeValue {
    let left = left_clones.resolve(left);
    let right = right_clones.resolve(right);
    match (&left, &right) {
        // The same pre-fork object on both sides: its properties were
        // merged in place, keep the identity.
        (TypeValue::Object(a), TypeValue::Object(b)) if a.id() == b.id() => left.clone(),
        (TypeValue::Instance(a), TypeValue::Instance(b)) if a.data.id() == b.data.id() => {
            left.clone()
        }
        (TypeValue::Tuple(xs), TypeValue::Tuple(ys)) if xs.len() == ys.len() => {
            TypeValue::Tuple(
                xs.iter()
                    .zip(ys)
                    .map(|(x, y)| merge_values(x, left_clones, y, right_clones))
                    .collect(),
            )
        }
        (TypeValue::Array(x), TypeValue::Array(y)) => TypeValue::Array(Box::new(
            merge_values(x, left_clones, y, right_clones),
        )),
        _ => TypeValue::union2(left, right),
    }
}
