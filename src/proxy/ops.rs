//! Lets a [`ValueProxy`] stand in for the value it wraps.
//!
//! Every impl here resolves the proxy and forwards to the typed value.
//! Traits whose signatures can not carry an error (comparison, hashing,
//! formatting, operators) panic with the `ConfigurationError` message when
//! the value is missing or invalid, the same as [`ValueProxy::value`].
//! Call [`ValueProxy::resolve`] or [`crate::config::validate`] first when
//! that matters.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Add, BitAnd, BitOr, BitXor, Div, Mul, Neg, Not, Rem, Sub};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Serialize, Serializer};
use serde_json::Value;

use super::value::ValueProxy;

impl<T: PartialEq + Send + Sync + 'static> PartialEq for ValueProxy<T> {
    fn eq(&self, other: &Self) -> bool {
        *self.value() == *other.value()
    }
}

impl<T: Eq + Send + Sync + 'static> Eq for ValueProxy<T> {}

impl<T: PartialOrd + Send + Sync + 'static> PartialOrd for ValueProxy<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.value().as_ref().partial_cmp(other.value().as_ref())
    }
}

impl<T: Ord + Send + Sync + 'static> Ord for ValueProxy<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value().as_ref().cmp(other.value().as_ref())
    }
}

impl<T: Hash + Send + Sync + 'static> Hash for ValueProxy<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value().hash(state)
    }
}

impl<T: fmt::Display + Send + Sync + 'static> fmt::Display for ValueProxy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.value().as_ref(), f)
    }
}

impl<T: Serialize + Send + Sync + 'static> Serialize for ValueProxy<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let value = self.resolve().map_err(serde::ser::Error::custom)?;
        value.serialize(serializer)
    }
}

// Comparisons against plain values, in both directions.
macro_rules! scalar_comparisons {
    ($($ty:ty),* $(,)?) => {$(
        impl PartialEq<$ty> for ValueProxy<$ty> {
            fn eq(&self, other: &$ty) -> bool {
                *self.value() == *other
            }
        }

        impl PartialEq<ValueProxy<$ty>> for $ty {
            fn eq(&self, other: &ValueProxy<$ty>) -> bool {
                *self == *other.value()
            }
        }

        impl PartialOrd<$ty> for ValueProxy<$ty> {
            fn partial_cmp(&self, other: &$ty) -> Option<Ordering> {
                self.value().as_ref().partial_cmp(other)
            }
        }

        impl PartialOrd<ValueProxy<$ty>> for $ty {
            fn partial_cmp(&self, other: &ValueProxy<$ty>) -> Option<Ordering> {
                self.partial_cmp(other.value().as_ref())
            }
        }
    )*};
}

scalar_comparisons!(i64, f64, bool, String, NaiveDate, NaiveDateTime, NaiveTime, tracing::Level);

impl PartialEq<&str> for ValueProxy<String> {
    fn eq(&self, other: &&str) -> bool {
        self.value().as_str() == *other
    }
}

impl PartialEq<str> for ValueProxy<String> {
    fn eq(&self, other: &str) -> bool {
        self.value().as_str() == other
    }
}

impl PartialOrd<&str> for ValueProxy<String> {
    fn partial_cmp(&self, other: &&str) -> Option<Ordering> {
        self.value().as_str().partial_cmp(*other)
    }
}

impl PartialEq<Value> for ValueProxy<Value> {
    fn eq(&self, other: &Value) -> bool {
        *self.value() == *other
    }
}

impl<V: PartialEq + Send + Sync + 'static> PartialEq<Vec<V>> for ValueProxy<Vec<V>> {
    fn eq(&self, other: &Vec<V>) -> bool {
        *self.value() == *other
    }
}

impl<V: PartialEq + Send + Sync + 'static> PartialEq<Option<V>> for ValueProxy<Option<V>> {
    fn eq(&self, other: &Option<V>) -> bool {
        *self.value() == *other
    }
}

// `proxy op rhs` for anything the wrapped type supports.
macro_rules! forward_binary_ops {
    ($($trait:ident::$method:ident),* $(,)?) => {$(
        impl<T, Rhs> $trait<Rhs> for ValueProxy<T>
        where
            T: $trait<Rhs> + Clone + Send + Sync + 'static,
        {
            type Output = <T as $trait<Rhs>>::Output;

            fn $method(self, rhs: Rhs) -> Self::Output {
                $trait::$method(self.get(), rhs)
            }
        }

        impl<T, Rhs> $trait<Rhs> for &ValueProxy<T>
        where
            T: $trait<Rhs> + Clone + Send + Sync + 'static,
        {
            type Output = <T as $trait<Rhs>>::Output;

            fn $method(self, rhs: Rhs) -> Self::Output {
                $trait::$method(self.get(), rhs)
            }
        }
    )*};
}

forward_binary_ops!(
    Add::add,
    Sub::sub,
    Mul::mul,
    Div::div,
    Rem::rem,
    BitAnd::bitand,
    BitOr::bitor,
    BitXor::bitxor,
);

// `scalar op proxy`, which also makes `proxy op proxy` work.
macro_rules! scalar_lhs_ops {
    ($ty:ty => $($trait:ident::$method:ident),* $(,)?) => {$(
        impl $trait<ValueProxy<$ty>> for $ty {
            type Output = <$ty as $trait>::Output;

            fn $method(self, rhs: ValueProxy<$ty>) -> Self::Output {
                $trait::$method(self, rhs.get())
            }
        }

        impl $trait<&ValueProxy<$ty>> for $ty {
            type Output = <$ty as $trait>::Output;

            fn $method(self, rhs: &ValueProxy<$ty>) -> Self::Output {
                $trait::$method(self, rhs.get())
            }
        }
    )*};
}

scalar_lhs_ops!(i64 => Add::add, Sub::sub, Mul::mul, Div::div, Rem::rem, BitAnd::bitand, BitOr::bitor, BitXor::bitxor);
scalar_lhs_ops!(f64 => Add::add, Sub::sub, Mul::mul, Div::div, Rem::rem);
scalar_lhs_ops!(bool => BitAnd::bitand, BitOr::bitor, BitXor::bitxor);

macro_rules! forward_unary_ops {
    ($($trait:ident::$method:ident),* $(,)?) => {$(
        impl<T> $trait for ValueProxy<T>
        where
            T: $trait + Clone + Send + Sync + 'static,
        {
            type Output = <T as $trait>::Output;

            fn $method(self) -> Self::Output {
                $trait::$method(self.get())
            }
        }

        impl<T> $trait for &ValueProxy<T>
        where
            T: $trait + Clone + Send + Sync + 'static,
        {
            type Output = <T as $trait>::Output;

            fn $method(self) -> Self::Output {
                $trait::$method(self.get())
            }
        }
    )*};
}

forward_unary_ops!(Neg::neg, Not::not);

/// Boolean interpretation of a value: zero, empty and `None` are false.
pub trait Truthy {
    fn is_truthy(&self) -> bool;
}

impl Truthy for bool {
    fn is_truthy(&self) -> bool {
        *self
    }
}

macro_rules! numeric_truthy {
    ($($ty:ty),*) => {$(
        impl Truthy for $ty {
            fn is_truthy(&self) -> bool {
                *self != (0 as $ty)
            }
        }
    )*};
}

numeric_truthy!(i32, i64, u32, u64, usize, f32, f64);

impl Truthy for String {
    fn is_truthy(&self) -> bool {
        !self.is_empty()
    }
}

impl<V> Truthy for Vec<V> {
    fn is_truthy(&self) -> bool {
        !self.is_empty()
    }
}

impl<V> Truthy for BTreeSet<V> {
    fn is_truthy(&self) -> bool {
        !self.is_empty()
    }
}

impl<K, V> Truthy for BTreeMap<K, V> {
    fn is_truthy(&self) -> bool {
        !self.is_empty()
    }
}

impl<V> Truthy for Option<V> {
    fn is_truthy(&self) -> bool {
        self.is_some()
    }
}

impl Truthy for Value {
    fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
            Value::String(s) => !s.is_empty(),
            Value::Array(items) => !items.is_empty(),
            Value::Object(map) => !map.is_empty(),
        }
    }
}

impl<T: Truthy + Send + Sync + 'static> Truthy for ValueProxy<T> {
    fn is_truthy(&self) -> bool {
        self.value().is_truthy()
    }
}

/// Lossy numeric conversions.
pub trait Numeric {
    fn to_i64(&self) -> i64;
    fn to_f64(&self) -> f64;
}

macro_rules! numeric {
    ($($ty:ty),*) => {$(
        impl Numeric for $ty {
            fn to_i64(&self) -> i64 {
                *self as i64
            }

            fn to_f64(&self) -> f64 {
                *self as f64
            }
        }
    )*};
}

numeric!(i32, i64, u32, u64, usize, f32, f64);

impl Numeric for bool {
    fn to_i64(&self) -> i64 {
        i64::from(*self)
    }

    fn to_f64(&self) -> f64 {
        if *self {
            1.0
        } else {
            0.0
        }
    }
}

impl<T: Numeric + Send + Sync + 'static> Numeric for ValueProxy<T> {
    fn to_i64(&self) -> i64 {
        self.value().to_i64()
    }

    fn to_f64(&self) -> f64 {
        self.value().to_f64()
    }
}

/// Size and membership for container values.
pub trait Collection {
    type Item: ?Sized;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn contains_item(&self, item: &Self::Item) -> bool;
}

impl<V: PartialEq> Collection for Vec<V> {
    type Item = V;

    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn contains_item(&self, item: &V) -> bool {
        self.contains(item)
    }
}

impl<V: Ord> Collection for BTreeSet<V> {
    type Item = V;

    fn len(&self) -> usize {
        BTreeSet::len(self)
    }

    fn contains_item(&self, item: &V) -> bool {
        self.contains(item)
    }
}

impl<V: Eq + Hash> Collection for HashSet<V> {
    type Item = V;

    fn len(&self) -> usize {
        HashSet::len(self)
    }

    fn contains_item(&self, item: &V) -> bool {
        self.contains(item)
    }
}

/// Membership means "has this key".
impl<K: Ord, V> Collection for BTreeMap<K, V> {
    type Item = K;

    fn len(&self) -> usize {
        BTreeMap::len(self)
    }

    fn contains_item(&self, item: &K) -> bool {
        self.contains_key(item)
    }
}

impl<K: Eq + Hash, V> Collection for HashMap<K, V> {
    type Item = K;

    fn len(&self) -> usize {
        HashMap::len(self)
    }

    fn contains_item(&self, item: &K) -> bool {
        self.contains_key(item)
    }
}

/// Membership means "has this substring".
impl Collection for String {
    type Item = str;

    fn len(&self) -> usize {
        String::len(self)
    }

    fn contains_item(&self, item: &str) -> bool {
        self.contains(item)
    }
}

impl<T: Collection + Send + Sync + 'static> ValueProxy<T> {
    pub fn len(&self) -> usize {
        self.value().len()
    }

    pub fn is_empty(&self) -> bool {
        Collection::is_empty(self.value().as_ref())
    }

    pub fn contains(&self, item: &T::Item) -> bool {
        self.value().contains_item(item)
    }
}

impl<V: Clone + Send + Sync + 'static> ValueProxy<Vec<V>> {
    /// Element at `index`, if any.
    pub fn item(&self, index: usize) -> Option<V> {
        self.value().get(index).cloned()
    }
}

impl<K: Ord + Send + Sync + 'static, V: Clone + Send + Sync + 'static> ValueProxy<BTreeMap<K, V>> {
    pub fn lookup(&self, key: &K) -> Option<V> {
        self.value().get(key).cloned()
    }
}

impl<V: Clone + Send + Sync + 'static> IntoIterator for &ValueProxy<Vec<V>> {
    type Item = V;
    type IntoIter = std::vec::IntoIter<V>;

    fn into_iter(self) -> Self::IntoIter {
        self.get().into_iter()
    }
}
