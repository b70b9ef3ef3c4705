//! Flattened method index for a service's resource tree

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;

use indexmap::IndexMap;
use tracing::debug;

use crate::types::{ApiMethod, ApiService, HasMethodsAndResources};

/// Lazily built map of dotted method identifier -> method.
///
/// Owned by an [`ApiService`]; built on first access and rebuilt only after
/// the service's method tree changes. Clones start unbuilt.
#[derive(Default)]
pub struct MethodIndex {
    methods: OnceLock<IndexMap<String, ApiMethod>>,
    builds: AtomicUsize,
}

impl MethodIndex {
    /// Return the index, walking the resource tree if this is the first access
    pub fn get_or_build(&self, service: &ApiService) -> &IndexMap<String, ApiMethod> {
        self.methods.get_or_init(|| {
            self.builds.fetch_add(1, Ordering::Relaxed);
            let methods = Self::build(service);
            debug!(
                "Indexed {} methods for {}:{}",
                methods.len(),
                service.name,
                service.version
            );
            methods
        })
    }

    /// Forget the built index so the next access walks the tree again
    pub(crate) fn invalidate(&mut self) {
        self.methods.take();
    }

    /// Number of completed tree walks
    pub fn build_count(&self) -> usize {
        self.builds.load(Ordering::Relaxed)
    }

    /// Walk a method/resource tree depth-first
    pub fn build<T: HasMethodsAndResources>(root: &T) -> IndexMap<String, ApiMethod> {
        let mut methods = IndexMap::new();
        Self::populate("", root, &mut methods);
        methods
    }

    fn populate<T: HasMethodsAndResources>(
        prefix: &str,
        node: &T,
        methods: &mut IndexMap<String, ApiMethod>,
    ) {
        for (name, method) in node.methods() {
            methods.insert(format!("{}{}", prefix, name), method.clone());
        }

        for (name, resource) in node.resources() {
            let child_prefix = format!("{}{}.", prefix, name);
            Self::populate(&child_prefix, resource, methods);
        }
    }
}

impl Clone for MethodIndex {
    fn clone(&self) -> Self {
        Self::default()
    }
}

impl std::fmt::Debug for MethodIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodIndex")
            .field("built", &self.methods.get().is_some())
            .field("len", &self.methods.get().map(|m| m.len()).unwrap_or(0))
            .finish()
    }
}
