//! Resolution driver.
//!
//! The driver walks the selection tree one depth at a time: it runs the
//! resolver of every (field, parent) pair of every selection set at that
//! depth concurrently, flushes the batch cache once, and then descends with
//! all child records of all sibling subtrees at once. This keeps the number
//! of store calls proportional to the depth of the query rather than to the
//! number of records visited.
//!
//! Errors never escape [`ResolutionDriver::execute`]; they are attributed to
//! their response path and collected next to the best-effort data tree.

use std::ops::Range;
use std::sync::{Arc, Mutex, PoisonError};

use futures_util::future::{BoxFuture, join_all};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::batch_cache::BatchCache;
use super::ports::RecordStore;
use super::resolvers::{self, Settled};
use super::response::{GraphqlError, GraphqlResponse, PathSegment, ResolveError, ResponsePath};
use super::schema::{FieldDef, ObjectType, Shape};
use super::selection::Field;
use super::Record;

type ObjectData = Map<String, Value>;

/// Executes selection trees against a record store.
///
/// # Examples
/// ```no_run
/// use std::sync::Arc;
/// use feedgraph::domain::{Field, ResolutionDriver};
/// use feedgraph::outbound::memory::InMemoryRecordStore;
///
/// # async fn run() {
/// let driver = ResolutionDriver::new(Arc::new(InMemoryRecordStore::default()));
/// let response = driver
///     .execute(&[Field::new("users").with_selection(vec![Field::new("name")])])
///     .await;
/// assert!(response.errors.is_empty());
/// # }
/// ```
#[derive(Clone)]
pub struct ResolutionDriver {
    store: Arc<dyn RecordStore>,
}

impl ResolutionDriver {
    /// Create a driver reading from `store`.
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Resolve the root selection set into a response envelope.
    ///
    /// Every call uses a fresh batch cache, so nothing fetched here is
    /// visible to later requests.
    pub async fn execute(&self, selection: &[Field]) -> GraphqlResponse {
        let execution = Execution {
            cache: BatchCache::new(Arc::clone(&self.store)),
            errors: Mutex::new(Vec::new()),
        };
        let root = Group {
            object: ObjectType::Query,
            selection: selection.iter().collect(),
            parents: vec![Node {
                record: None,
                path: ResponsePath::new(),
            }],
        };
        let data = execution
            .resolve_depth(vec![root])
            .await
            .pop()
            .and_then(|mut objects| objects.pop())
            .flatten()
            .map_or(Value::Null, Value::Object);

        let stats = execution.cache.stats();
        debug!(
            keyed_fetches = stats.keyed_fetches,
            scans = stats.scans,
            hits = stats.hits,
            "resolution finished"
        );

        GraphqlResponse {
            data: Some(data),
            errors: execution
                .errors
                .into_inner()
                .unwrap_or_else(PoisonError::into_inner),
        }
    }
}

/// State of one request.
struct Execution {
    cache: BatchCache,
    errors: Mutex<Vec<GraphqlError>>,
}

/// A non-null object awaiting its sub-selection.
struct Node {
    /// `None` only for the query root.
    record: Option<Arc<Record>>,
    path: ResponsePath,
}

/// One selection set at the current depth and the objects it applies to.
struct Group<'a> {
    object: ObjectType,
    selection: Vec<&'a Field>,
    parents: Vec<Node>,
}

/// One response key of a selection set after field collection.
struct Planned<'a> {
    key: &'a str,
    field: &'a Field,
    def: Result<FieldDef, ResolveError>,
    /// Sub-selections of every field merged under this key.
    children: Vec<&'a Field>,
}

impl Planned<'_> {
    fn nullable(&self) -> bool {
        self.def.as_ref().map_or(true, |def| def.nullable)
    }

    fn child_type(&self) -> Option<ObjectType> {
        match self.def.as_ref().ok()?.shape {
            Shape::Leaf => None,
            Shape::Object(object) | Shape::List(object) => Some(object),
        }
    }
}

/// Value of one field on one parent, before sub-selections are resolved.
enum Cell {
    Ready(Value),
    /// Null with an error already recorded.
    Failed,
    /// Index into the field's child nodes.
    Object(usize),
    /// Range of the field's child nodes.
    List(Range<usize>),
}

fn child_path(parent: &[PathSegment], segment: PathSegment) -> ResponsePath {
    let mut path = Vec::with_capacity(parent.len() + 1);
    path.extend_from_slice(parent);
    path.push(segment);
    path
}

impl Execution {
    fn record_error(&self, path: ResponsePath, error: &ResolveError) {
        if matches!(error, ResolveError::Store(_)) {
            warn!(%error, ?path, "field resolution failed");
        }
        self.errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(GraphqlError::at(path, error));
    }

    /// Merge fields by response key in first-seen order, dropping fields
    /// whose type condition does not match `object`.
    fn collect_fields<'a>(object: ObjectType, selection: &[&'a Field]) -> Vec<Planned<'a>> {
        let mut planned: Vec<Planned<'a>> = Vec::new();
        for field in selection
            .iter()
            .copied()
            .filter(|field| field.applies_to(object.name()))
        {
            let key = field.response_key();
            if let Some(existing) = planned.iter_mut().find(|entry| entry.key == key) {
                existing.children.extend(field.selection.iter());
                continue;
            }
            planned.push(Planned {
                key,
                field,
                def: Self::field_def(object, field),
                children: field.selection.iter().collect(),
            });
        }
        planned
    }

    fn field_def(object: ObjectType, field: &Field) -> Result<FieldDef, ResolveError> {
        let def = object.field(&field.name).ok_or_else(|| {
            ResolveError::validation(format!(
                "Cannot query field \"{}\" on type \"{}\".",
                field.name,
                object.name()
            ))
        })?;
        resolvers::check_arguments(object, &def, field)?;
        match (def.shape, field.selection.is_empty()) {
            (Shape::Leaf, false) => Err(ResolveError::validation(format!(
                "Field \"{}\" must not have a selection since it has no subfields.",
                field.name
            ))),
            (Shape::Object(child) | Shape::List(child), true) => {
                Err(ResolveError::validation(format!(
                    "Field \"{}\" of type \"{}\" must have a selection of subfields.",
                    field.name,
                    child.name()
                )))
            }
            _ => Ok(def),
        }
    }

    /// Resolve every selection set of one depth together. Returns, per
    /// group, one entry per parent: `None` where a null bubbled up to the
    /// parent object itself.
    fn resolve_depth<'a>(
        &'a self,
        groups: Vec<Group<'a>>,
    ) -> BoxFuture<'a, Vec<Vec<Option<ObjectData>>>> {
        Box::pin(async move {
            if groups.is_empty() {
                return Vec::new();
            }
            let plans: Vec<Vec<Planned<'a>>> = groups
                .iter()
                .map(|group| Self::collect_fields(group.object, &group.selection))
                .collect();

            // An invalid field is reported once per selection set, at the
            // first parent.
            for (group, plan) in groups.iter().zip(&plans) {
                let Some(first) = group.parents.first() else {
                    continue;
                };
                for planned in plan {
                    if let Err(error) = &planned.def {
                        let path =
                            child_path(&first.path, PathSegment::Key(planned.key.to_owned()));
                        self.record_error(path, error);
                    }
                }
            }

            // Batch window: every resolver of this depth, across all sibling
            // subtrees, enqueues before the single flush below.
            let outcomes = join_all(groups.iter().zip(&plans).flat_map(|(group, plan)| {
                plan.iter()
                    .filter_map(|planned| planned.def.as_ref().ok().map(|def| (planned, *def)))
                    .flat_map(move |(planned, def)| {
                        group.parents.iter().map(move |node| async move {
                            resolvers::resolve(
                                &self.cache,
                                group.object,
                                def,
                                planned.field,
                                node.record.as_deref(),
                            )
                            .await
                        })
                    })
            }))
            .await;
            self.cache.flush().await;

            let mut settled = Vec::with_capacity(outcomes.len());
            for outcome in outcomes {
                settled.push(match outcome {
                    Ok(resolution) => resolution.settle(&self.cache).await,
                    Err(error) => Err(error),
                });
            }
            let mut settled = settled.into_iter();

            let mut rows: Vec<Vec<Vec<Cell>>> = Vec::with_capacity(groups.len());
            let mut targets: Vec<Vec<Option<usize>>> = Vec::with_capacity(groups.len());
            let mut next: Vec<Group<'a>> = Vec::new();
            for (group, plan) in groups.iter().zip(&plans) {
                let mut cells: Vec<Vec<Cell>> = group
                    .parents
                    .iter()
                    .map(|_| Vec::with_capacity(plan.len()))
                    .collect();
                let mut group_targets = Vec::with_capacity(plan.len());
                for planned in plan {
                    if planned.def.is_err() {
                        for row in &mut cells {
                            row.push(Cell::Failed);
                        }
                        group_targets.push(None);
                        continue;
                    }
                    let mut children = Vec::new();
                    for (row, node) in cells.iter_mut().zip(&group.parents) {
                        let path = child_path(&node.path, PathSegment::Key(planned.key.to_owned()));
                        let Some(outcome) = settled.next() else {
                            break;
                        };
                        let cell = match outcome {
                            Err(error) => {
                                self.record_error(path, &error);
                                Cell::Failed
                            }
                            Ok(Settled::Leaf(value)) => Cell::Ready(value),
                            Ok(Settled::Object(None)) => Cell::Ready(Value::Null),
                            Ok(Settled::Object(Some(record))) => {
                                children.push(Node {
                                    record: Some(record),
                                    path,
                                });
                                Cell::Object(children.len() - 1)
                            }
                            Ok(Settled::List(records)) => {
                                let start = children.len();
                                children.extend(records.into_iter().enumerate().map(
                                    |(position, record)| Node {
                                        record: Some(record),
                                        path: child_path(&path, PathSegment::Index(position)),
                                    },
                                ));
                                Cell::List(start..children.len())
                            }
                        };
                        row.push(cell);
                    }
                    group_targets.push(match planned.child_type() {
                        Some(child) if !children.is_empty() => {
                            next.push(Group {
                                object: child,
                                selection: planned.children.clone(),
                                parents: children,
                            });
                            Some(next.len() - 1)
                        }
                        _ => None,
                    });
                }
                rows.push(cells);
                targets.push(group_targets);
            }

            let mut nested = self.resolve_depth(next).await;

            let mut resolved = Vec::with_capacity(groups.len());
            for ((group, plan), (cells, group_targets)) in
                groups.iter().zip(&plans).zip(rows.into_iter().zip(targets))
            {
                let mut objects = Vec::with_capacity(group.parents.len());
                for (node, row) in group.parents.iter().zip(cells) {
                    objects.push(self.assemble(
                        group.object,
                        plan,
                        &group_targets,
                        &mut nested,
                        node,
                        row,
                    ));
                }
                resolved.push(objects);
            }
            resolved
        })
    }

    /// Build one parent's object from its cells and the resolved children.
    /// `None` when a non-null field came back null.
    fn assemble(
        &self,
        object: ObjectType,
        plan: &[Planned<'_>],
        targets: &[Option<usize>],
        nested: &mut [Vec<Option<ObjectData>>],
        node: &Node,
        row: Vec<Cell>,
    ) -> Option<ObjectData> {
        let mut data = ObjectData::new();
        let mut bubbled = false;
        for ((planned, target), cell) in plan.iter().zip(targets).zip(row) {
            let (value, reported) = match cell {
                Cell::Ready(value) => (value, false),
                Cell::Failed => (Value::Null, true),
                Cell::Object(child) => match take_child(nested, *target, child) {
                    Some(object) => (Value::Object(object), false),
                    None => (Value::Null, true),
                },
                Cell::List(range) => {
                    let items: Option<Vec<Value>> = range
                        .map(|child| take_child(nested, *target, child).map(Value::Object))
                        .collect();
                    match items {
                        Some(items) => (Value::Array(items), false),
                        None => (Value::Null, true),
                    }
                }
            };
            if value.is_null() && !planned.nullable() {
                if !reported {
                    let path = child_path(&node.path, PathSegment::Key(planned.key.to_owned()));
                    self.record_error(
                        path,
                        &ResolveError::Nullability {
                            type_name: object.name(),
                            field: planned.field.name.clone(),
                        },
                    );
                }
                bubbled = true;
            }
            data.insert(planned.key.to_owned(), value);
        }
        (!bubbled).then_some(data)
    }
}

fn take_child(
    nested: &mut [Vec<Option<ObjectData>>],
    target: Option<usize>,
    child: usize,
) -> Option<ObjectData> {
    nested
        .get_mut(target?)?
        .get_mut(child)
        .and_then(Option::take)
}

#[cfg(test)]
#[path = "driver_tests.rs"]
mod tests;
