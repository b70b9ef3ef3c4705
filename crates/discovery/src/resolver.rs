//! `$ref` resolution against a service's schema map
//!
//! References are resolved by name at use time. Nothing is copied or
//! expanded, so self-referencing schemas are fine.

use indexmap::IndexMap;

use crate::types::{ApiMethod, ApiService, Property, Schema, SchemaRef};

/// Resolves schema references by name
pub struct SchemaResolver<'a> {
    /// Schemas declared by the service
    schemas: &'a IndexMap<String, Schema>,
}

impl<'a> SchemaResolver<'a> {
    /// Create a new resolver over the given schema map
    pub fn new(schemas: &'a IndexMap<String, Schema>) -> Self {
        Self { schemas }
    }

    /// Look up a schema by name
    pub fn resolve_ref(&self, name: &str) -> Option<&'a Schema> {
        self.schemas.get(name)
    }

    /// Request body schema of a method
    pub fn request(&self, method: &ApiMethod) -> Option<&'a Schema> {
        self.follow(method.request.as_ref())
    }

    /// Response body schema of a method
    pub fn response(&self, method: &ApiMethod) -> Option<&'a Schema> {
        self.follow(method.response.as_ref())
    }

    /// Schema referenced by a property, `None` for primitives
    pub fn for_property(&self, property: &Property) -> Option<&'a Schema> {
        property
            .reference
            .as_deref()
            .and_then(|name| self.resolve_ref(name))
    }

    /// Each property of a schema paired with the schema it references, one level deep
    pub fn property_schemas<'s>(
        &self,
        schema: &'s Schema,
    ) -> Vec<(&'s str, &'s Property, Option<&'a Schema>)> {
        schema
            .properties
            .iter()
            .map(|(name, property)| (name.as_str(), property, self.for_property(property)))
            .collect()
    }

    fn follow(&self, schema_ref: Option<&SchemaRef>) -> Option<&'a Schema> {
        schema_ref
            .and_then(|r| r.reference.as_deref())
            .and_then(|name| self.resolve_ref(name))
    }
}

impl ApiService {
    /// Resolver over this service's schemas
    pub fn resolver(&self) -> SchemaResolver<'_> {
        SchemaResolver::new(&self.schemas)
    }

    /// Request schema used by the given method, or `None` if it takes no body
    pub fn request_schema(&self, method: &ApiMethod) -> Option<&Schema> {
        self.resolver().request(method)
    }

    /// Response schema used by the given method, or `None` if none is declared
    pub fn response_schema(&self, method: &ApiMethod) -> Option<&Schema> {
        self.resolver().response(method)
    }

    /// Schema used by a property, or `None` for simple types
    pub fn schema_for_property(&self, property: &Property) -> Option<&Schema> {
        self.resolver().for_property(property)
    }
}
