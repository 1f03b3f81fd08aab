// LocalAPI variable queries
//
// `/vars` addresses telemetry as filesystem-like paths
// (`/sys/devices/inverter/0/ltea3phsumKwh`). This module builds the query
// string and regroups the flat answer into per-device field maps.

use indexmap::IndexMap;
use serde_json::Value;
use strum::{Display, IntoStaticStr};

/// Flat `path → value` answer of a `/vars?fmt=obj` query, in response order.
pub type VarMap = IndexMap<String, Value>;

/// Fields of one device, keyed by the final path segment.
pub type FieldMap = IndexMap<String, Value>;

/// Server-side cache identifiers, one per telemetry category.
///
/// A query that names a cache *and* a match pattern (re)builds the set on
/// the supervisor; naming only the cache reads the stored set back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
pub enum CacheId {
    #[strum(serialize = "mdata")]
    Meters,
    #[strum(serialize = "idata")]
    Inverters,
    #[strum(serialize = "sysinfo")]
    SysInfo,
    #[strum(serialize = "ldata")]
    LiveData,
}

impl CacheId {
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// Substring pattern that selects this category's variables.
    pub fn match_pattern(self) -> &'static str {
        match self {
            Self::Meters => "meter",
            Self::Inverters => "inverter",
            Self::SysInfo => "info",
            Self::LiveData => "livedata",
        }
    }
}

/// Device classes whose variables are grouped per device index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    Meter,
    Inverter,
}

impl DeviceClass {
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Meter => "/sys/devices/meter/",
            Self::Inverter => "/sys/devices/inverter/",
        }
    }
}

/// A `/vars` query. Answers are always requested as `fmt=obj`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VarQuery {
    pub names: Vec<String>,
    pub match_pattern: Option<String>,
    pub cache: Option<CacheId>,
}

impl VarQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Query for a cached category. With `refresh`, the category's match
    /// pattern is sent so the supervisor rebuilds the set.
    pub fn for_cache(cache: CacheId, refresh: bool) -> Self {
        Self {
            match_pattern: refresh.then(|| cache.match_pattern().to_owned()),
            cache: Some(cache),
            ..Self::default()
        }
    }

    pub fn names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn matching(mut self, pattern: impl Into<String>) -> Self {
        self.match_pattern = Some(pattern.into());
        self
    }

    pub fn cache(mut self, cache: CacheId) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Query-string pairs, in the order the supervisor documents them.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::with_capacity(4);
        if !self.names.is_empty() {
            params.push(("name", self.names.join(",")));
        }
        if let Some(ref pattern) = self.match_pattern {
            params.push(("match", pattern.clone()));
        }
        if let Some(cache) = self.cache {
            params.push(("cache", cache.as_str().to_owned()));
        }
        params.push(("fmt", "obj".to_owned()));
        params
    }
}

/// Group a class's variables by device index.
///
/// `/sys/devices/<class>/<index>/<field>`: the 5th `/`-segment is the index,
/// the 6th the field. Shorter paths carry no field and are dropped.
pub fn group_devices(vars: &VarMap, class: DeviceClass) -> IndexMap<String, FieldMap> {
    let mut devices: IndexMap<String, FieldMap> = IndexMap::new();

    for (path, value) in vars {
        if !path.starts_with(class.prefix()) {
            continue;
        }
        let mut segments = path.split('/').skip(4);
        let (Some(index), Some(field)) = (segments.next(), segments.next()) else {
            continue;
        };
        if index.is_empty() || field.is_empty() {
            continue;
        }
        devices
            .entry(index.to_owned())
            .or_default()
            .insert(field.to_owned(), value.clone());
    }

    devices
}
