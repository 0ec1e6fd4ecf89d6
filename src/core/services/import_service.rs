//! One-shot import of records cached by the offline-only version of the app.
//!
//! Each collection is imported at most once per owner: the presence of any document tagged with
//! [`IMPORT_TAG`] for that owner marks the collection as done. Failures are logged and collected
//! in the [`ImportReport`], never returned as errors.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{info, warn};
use uuid::Uuid;

use crate::core::utils::PathResolver;
use crate::domain::customer::digits_only;
use crate::domain::{Customer, Product, Purchase, Sale};
use crate::errors::{Result, StockError};
use crate::storage::{Collection, DocumentStore, WriteMode, OWNER_FIELD};

pub const IMPORT_TAG: &str = "importedFromLocalCache";
/// Id the record had in the local cache, used to resolve references between imported records.
pub const LEGACY_ID_FIELD: &str = "legacyId";

/// Referenced collections come first so their new ids are known when movements are imported.
const IMPORT_ORDER: [Collection; 4] = [
    Collection::Customers,
    Collection::Products,
    Collection::Purchases,
    Collection::Sales,
];

/// Source of locally cached records.
pub trait LegacyCache {
    /// Cached items for `collection`, or `None` when nothing was cached.
    fn load(&self, collection: Collection) -> Result<Option<Vec<Value>>>;
}

impl LegacyCache for BTreeMap<Collection, Vec<Value>> {
    fn load(&self, collection: Collection) -> Result<Option<Vec<Value>>> {
        Ok(self.get(&collection).cloned())
    }
}

/// Directory holding one JSON array file per collection.
///
/// Files are looked up as `<collection>.json` (`products.json`) and then by the key the
/// Portuguese-language app used (`produtos.json`). Its field names (`quantidade`, `produtoId`,
/// ...) are translated when the records are imported.
#[derive(Debug, Clone)]
pub struct JsonFileCache {
    dir: PathBuf,
}

impl JsonFileCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Cache located in the `local_cache` directory under `base`.
    pub fn in_base_dir(base: &Path) -> Self {
        Self::new(PathResolver::legacy_cache_dir_in(base))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_for(&self, collection: Collection) -> Option<PathBuf> {
        [collection.name(), legacy_key(collection)]
            .into_iter()
            .map(|name| self.dir.join(format!("{name}.json")))
            .find(|path| path.exists())
    }
}

impl LegacyCache for JsonFileCache {
    fn load(&self, collection: Collection) -> Result<Option<Vec<Value>>> {
        let Some(path) = self.file_for(collection) else {
            return Ok(None);
        };
        let raw = fs::read_to_string(&path)?;
        match serde_json::from_str::<Value>(&raw)? {
            Value::Array(items) => Ok(Some(items)),
            Value::Null => Ok(None),
            _ => Err(StockError::validation(format!(
                "{} does not hold a JSON array",
                path.display()
            ))),
        }
    }
}

fn legacy_key(collection: Collection) -> &'static str {
    match collection {
        Collection::Products => "produtos",
        Collection::Purchases => "compras",
        Collection::Sales => "vendas",
        Collection::Customers => "clientes",
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportReport {
    /// Items inserted per collection during this run.
    pub imported: BTreeMap<Collection, usize>,
    /// Collections left untouched because an earlier run already imported them.
    pub skipped: Vec<Collection>,
    pub failures: Vec<String>,
}

impl ImportReport {
    pub fn total_imported(&self) -> usize {
        self.imported.values().sum()
    }

    pub fn imported_in(&self, collection: Collection) -> usize {
        self.imported.get(&collection).copied().unwrap_or(0)
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn fail(&mut self, collection: Collection, err: &StockError) {
        warn!(%collection, error = %err, "legacy import step failed");
        self.failures.push(format!("{collection}: {err}"));
    }
}

type LegacyIds = HashMap<(Collection, String), Uuid>;

pub struct ImportService;

impl ImportService {
    /// Copies cached records into `owner`'s scope, skipping collections imported before.
    pub fn run(store: &dyn DocumentStore, owner: &str, cache: &dyn LegacyCache) -> ImportReport {
        let mut report = ImportReport::default();
        let mut cached: BTreeMap<Collection, Vec<Value>> = BTreeMap::new();
        for collection in IMPORT_ORDER {
            match cache.load(collection) {
                Ok(Some(items)) if !items.is_empty() => {
                    cached.insert(collection, items.into_iter().map(translate_fields).collect());
                }
                Ok(_) => {}
                Err(err) => report.fail(collection, &err),
            }
        }
        let openings = opening_quantities(&cached);

        let mut ids = LegacyIds::new();
        for collection in IMPORT_ORDER {
            let Some(items) = cached.remove(&collection) else {
                continue;
            };
            match Self::previous_import(store, collection, owner) {
                Ok(Some(known)) => {
                    info!(%collection, owner, "legacy records already imported");
                    for (legacy, id) in known {
                        ids.insert((collection, legacy), id);
                    }
                    report.skipped.push(collection);
                    continue;
                }
                Ok(None) => {}
                Err(err) => {
                    report.fail(collection, &err);
                    continue;
                }
            }

            let mut count = 0;
            for item in items {
                match Self::import_item(store, owner, collection, item, &ids, &openings) {
                    Ok((legacy, id)) => {
                        if let Some(legacy) = legacy {
                            ids.insert((collection, legacy), id);
                        }
                        count += 1;
                    }
                    Err(err) => report.fail(collection, &err),
                }
            }
            info!(%collection, owner, count, "legacy records imported");
            report.imported.insert(collection, count);
        }
        report
    }

    /// Legacy-to-new id pairs of an earlier import, or `None` when none happened.
    fn previous_import(
        store: &dyn DocumentStore,
        collection: Collection,
        owner: &str,
    ) -> Result<Option<Vec<(String, Uuid)>>> {
        let tagged: Vec<_> = store
            .query(collection, owner)?
            .into_iter()
            .filter(|doc| doc.data.get(IMPORT_TAG).and_then(Value::as_bool) == Some(true))
            .collect();
        if tagged.is_empty() {
            return Ok(None);
        }
        Ok(Some(
            tagged
                .iter()
                .filter_map(|doc| {
                    doc.data
                        .get(LEGACY_ID_FIELD)
                        .and_then(legacy_id)
                        .map(|legacy| (legacy, doc.id))
                })
                .collect(),
        ))
    }

    fn import_item(
        store: &dyn DocumentStore,
        owner: &str,
        collection: Collection,
        item: Value,
        ids: &LegacyIds,
        openings: &HashMap<String, i64>,
    ) -> Result<(Option<String>, Uuid)> {
        let Value::Object(mut fields) = item else {
            return Err(StockError::validation("cached entry is not an object"));
        };
        let legacy = fields.remove("id").as_ref().and_then(legacy_id);
        match collection {
            Collection::Products => {
                if !fields.contains_key("openingQuantity") {
                    if let Some(opening) = legacy.as_ref().and_then(|key| openings.get(key)) {
                        fields.insert("openingQuantity".into(), Value::from(*opening));
                    }
                }
            }
            Collection::Purchases => {
                remap(&mut fields, "productId", Collection::Products, ids)?;
            }
            Collection::Sales => {
                remap(&mut fields, "productId", Collection::Products, ids)?;
                remap(&mut fields, "customerId", Collection::Customers, ids)?;
            }
            Collection::Customers => {}
        }

        let id = Uuid::new_v4();
        fields.insert("id".into(), Value::String(id.to_string()));
        fields.insert(OWNER_FIELD.into(), Value::String(owner.to_string()));
        fields.insert(IMPORT_TAG.into(), Value::Bool(true));
        if let Some(key) = &legacy {
            fields.insert(LEGACY_ID_FIELD.into(), Value::String(key.clone()));
        }
        let data = Value::Object(fields);
        check_shape(collection, &data)?;
        store.set(collection, id, data, WriteMode::Replace)?;
        Ok((legacy, id))
    }
}

/// Field names the Portuguese-language app wrote, with their current equivalents.
const LEGACY_FIELDS: [(&str, &str); 10] = [
    ("nome", "name"),
    ("whatsapp", "phoneNumber"),
    ("descricao", "description"),
    ("tamanho", "size"),
    ("quantidade", "quantity"),
    ("produtoId", "productId"),
    ("clienteId", "customerId"),
    ("precoCusto", "unitCost"),
    ("precoVenda", "unitPrice"),
    ("data", "date"),
];

/// Renames legacy fields, keeps phone digits only and reads numeric-string quantities.
/// Fields already under their current name win over legacy ones.
fn translate_fields(item: Value) -> Value {
    let Value::Object(mut fields) = item else {
        return item;
    };
    for (legacy, current) in LEGACY_FIELDS {
        if let Some(value) = fields.remove(legacy) {
            fields.entry(current).or_insert(value);
        }
    }
    if let Some(Value::String(phone)) = fields.get("phoneNumber") {
        let digits = digits_only(phone);
        fields.insert("phoneNumber".into(), Value::String(digits));
    }
    if let Some(Value::String(text)) = fields.get("quantity") {
        if let Ok(quantity) = text.trim().parse::<i64>() {
            fields.insert("quantity".into(), Value::from(quantity));
        }
    }
    Value::Object(fields)
}

fn legacy_id(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn remap(
    fields: &mut Map<String, Value>,
    field: &str,
    target: Collection,
    ids: &LegacyIds,
) -> Result<()> {
    let Some(key) = fields.get(field).and_then(legacy_id) else {
        return Err(StockError::validation(format!("{field} is missing")));
    };
    if let Some(id) = ids.get(&(target, key.clone())) {
        fields.insert(field.into(), Value::String(id.to_string()));
        return Ok(());
    }
    if Uuid::parse_str(&key).is_ok() {
        return Ok(());
    }
    Err(StockError::validation(format!(
        "{field} `{key}` does not match any imported {target}"
    )))
}

/// Decodes the prepared document into its record type so malformed items never reach the store.
fn check_shape(collection: Collection, data: &Value) -> Result<()> {
    let data = data.clone();
    match collection {
        Collection::Products => serde_json::from_value::<Product>(data).map(|_| ()),
        Collection::Purchases => serde_json::from_value::<Purchase>(data).map(|_| ()),
        Collection::Sales => serde_json::from_value::<Sale>(data).map(|_| ()),
        Collection::Customers => serde_json::from_value::<Customer>(data).map(|_| ()),
    }?;
    Ok(())
}

/// Opening quantity for cached products: cached quantity minus cached purchases plus cached sales.
fn opening_quantities(cached: &BTreeMap<Collection, Vec<Value>>) -> HashMap<String, i64> {
    let mut net: HashMap<String, i64> = HashMap::new();
    for (collection, sign) in [(Collection::Purchases, 1), (Collection::Sales, -1)] {
        for item in cached.get(&collection).into_iter().flatten() {
            let product = item.get("productId").and_then(legacy_id);
            let quantity = item.get("quantity").and_then(Value::as_i64);
            if let (Some(product), Some(quantity)) = (product, quantity) {
                *net.entry(product).or_default() += sign * quantity;
            }
        }
    }

    cached
        .get(&Collection::Products)
        .into_iter()
        .flatten()
        .filter_map(|item| {
            let key = item.get("id").and_then(legacy_id)?;
            let quantity = item.get("quantity").and_then(Value::as_i64)?;
            let opening = quantity - net.get(&key).copied().unwrap_or(0);
            Some((key, opening))
        })
        .collect()
}
