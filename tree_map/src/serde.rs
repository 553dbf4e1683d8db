use core::fmt;
use core::marker::PhantomData;

use allocator_api2::alloc::{Allocator, Global};
use compare::Compare;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::TreeMap;

impl<K, V, C, A> Serialize for TreeMap<K, V, C, A>
where
    K: Serialize,
    V: Serialize,
    A: Allocator,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (k, v) in self {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

struct TreeMapVisitor<K, V, C> {
    marker: PhantomData<fn() -> TreeMap<K, V, C, Global>>,
}

impl<'de, K, V, C> Visitor<'de> for TreeMapVisitor<K, V, C>
where
    K: Deserialize<'de>,
    V: Deserialize<'de>,
    C: Compare<K> + Default,
{
    type Value = TreeMap<K, V, C>;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a map")
    }

    fn visit_map<M>(self, mut access: M) -> Result<Self::Value, M::Error>
    where
        M: MapAccess<'de>,
    {
        // duplicate keys keep the first value, like `insert`
        let mut map = TreeMap::with_cmp(C::default());
        while let Some((k, v)) = access.next_entry()? {
            map.insert(k, v);
        }
        Ok(map)
    }
}

impl<'de, K, V, C> Deserialize<'de> for TreeMap<K, V, C>
where
    K: Deserialize<'de>,
    V: Deserialize<'de>,
    C: Compare<K> + Default,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(TreeMapVisitor {
            marker: PhantomData,
        })
    }
}
