//! Declarative tag -> node constructor table.
//!
//! A [`Registry`] is built once, before any graph document is read, by
//! explicit `register*` calls. Graphs only borrow it immutably.

pub mod metadata;

pub use metadata::{BoundPorts, NodeArgs, NodeDef, NodeSchema, Transform};

use std::collections::HashMap;

use crate::core::{ConfigError, Node};

/// Constructor for one node type
pub type Constructor<T> =
    Box<dyn Fn(NodeArgs<T>) -> Result<Box<dyn Node>, ConfigError> + Send + Sync>;

struct Entry<T: Send + 'static> {
    schema: NodeSchema,
    constructor: Constructor<T>,
}

pub struct Registry<T: Send + 'static> {
    entries: HashMap<String, Entry<T>>,
}

impl<T: Send + 'static> Registry<T> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Register a node type with its port schema and constructor.
    ///
    /// The schema is checked against the supplied channels before the
    /// constructor runs, so constructors may assume every port is bound.
    pub fn register<F>(
        &mut self,
        tag: impl Into<String>,
        schema: NodeSchema,
        constructor: F,
    ) -> Result<(), ConfigError>
    where
        F: Fn(NodeArgs<T>) -> Result<Box<dyn Node>, ConfigError> + Send + Sync + 'static,
    {
        let tag = tag.into();
        schema.validate(&format!("{}()", tag))?;
        if self.entries.contains_key(&tag) {
            return Err(ConfigError::DuplicateTag(tag));
        }

        self.entries.insert(
            tag,
            Entry {
                schema,
                constructor: Box::new(constructor),
            },
        );
        Ok(())
    }

    /// Register a function node type.
    pub fn register_def(&mut self, def: NodeDef<T>) -> Result<(), ConfigError> {
        if def.schema().outputs.is_empty() {
            return Err(ConfigError::NoOutputs {
                node: format!("{}()", def.tag()),
            });
        }

        let tag = def.tag().to_string();
        let schema = def.schema().clone();
        self.register(tag, schema, move |args| {
            let node = def.build(&args)?;
            Ok(Box::new(node) as Box<dyn Node>)
        })
    }

    /// Instantiate the node type registered under `tag`.
    pub fn create(&self, tag: &str, args: NodeArgs<T>) -> Result<Box<dyn Node>, ConfigError> {
        let entry = self
            .entries
            .get(tag)
            .ok_or_else(|| ConfigError::UnknownTag(tag.to_string()))?;

        entry.schema.bind(&format!("{}()", tag), &args)?;
        (entry.constructor)(args)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.entries.contains_key(tag)
    }

    pub fn schema(&self, tag: &str) -> Option<&NodeSchema> {
        self.entries.get(tag).map(|entry| &entry.schema)
    }

    /// Registered tags, sorted
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: Send + 'static> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}
