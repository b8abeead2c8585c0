//! Integration Factory - the engine's function-call API.
//!
//! The factory coordinates the whole template and integration lifecycle:
//! 1. Parse template scripts and persist them
//! 2. Build integrations from a template and caller properties
//! 3. Persist the primary object, then fan out to the template's sinks
//!
//! It implements the driving side and uses the driven ports: an
//! [`ObjectStore`], a [`ScriptEngine`] and the sink writers of a
//! [`WriterRegistry`].

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};

use crate::{
    application::{
        error::{ApplicationError, StoreError},
        ports::{IntegrationReader, ObjectStore, ScriptEngine},
        services::writer::WriterRegistry,
    },
    domain::{
        decode_properties, encode, encode_properties, keys, DomainError, ExpandedWriterConfig,
        ExpandedWriterData, Format, Integration, IntegrationRequest, LabelSelector, ObjectKind,
        PrimaryOutput, PropertyMap, PropertyValue, RenderContext, Schema, Scope, SinkConfig,
        StoredObject, Template, TemplateScript, Validation,
    },
    error::ConfluxResult,
};

/// Namespace of system-scoped integrations unless configured otherwise.
pub const DEFAULT_SYSTEM_NAMESPACE: &str = "conflux-system";

/// Tunables of an [`IntegrationFactory`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactoryConfig {
    pub system_namespace: String,
    /// Limit for single-object store calls.
    pub request_timeout: Duration,
    pub template_list_timeout: Duration,
    pub integration_list_timeout: Duration,
}

impl Default for FactoryConfig {
    fn default() -> Self {
        Self {
            system_namespace: DEFAULT_SYSTEM_NAMESPACE.into(),
            request_timeout: Duration::from_secs(10),
            template_list_timeout: Duration::from_secs(60),
            integration_list_timeout: Duration::from_secs(180),
        }
    }
}

/// Template parsing, integration building and distribution.
pub struct IntegrationFactory {
    store: Box<dyn ObjectStore>,
    engine: Box<dyn ScriptEngine>,
    writers: WriterRegistry,
    config: FactoryConfig,
}

impl IntegrationFactory {
    /// Create a factory with the given adapters and default settings.
    pub fn new(
        store: Box<dyn ObjectStore>,
        engine: Box<dyn ScriptEngine>,
        writers: WriterRegistry,
    ) -> Self {
        Self {
            store,
            engine,
            writers,
            config: FactoryConfig::default(),
        }
    }

    pub fn with_config(mut self, config: FactoryConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &FactoryConfig {
        &self.config
    }

    pub fn writers(&self) -> &WriterRegistry {
        &self.writers
    }

    // ------------------------------------------------------------------------
    // Templates
    // ------------------------------------------------------------------------

    /// Parse a template script.
    ///
    /// A non-empty `default_name` wins over the name declared in the script.
    /// The returned template has no namespace until it is applied.
    #[instrument(skip_all, fields(default_name = %default_name))]
    pub fn parse_template(&self, default_name: &str, content: &[u8]) -> ConfluxResult<Template> {
        let body = std::str::from_utf8(content)
            .map_err(|e| DomainError::InvalidScript(format!("the script is not UTF-8: {e}")))?;
        let script = TemplateScript::new(body);
        let document = self.engine.parse(&script)?;

        let metadata = self
            .engine
            .render(
                &script,
                &RenderContext::default(),
                &PropertyMap::new(),
                &["metadata"],
            )?
            .and_then(PropertyValue::into_map)
            .unwrap_or_default();

        let name = if default_name.is_empty() {
            metadata
                .get("name")
                .and_then(PropertyValue::as_str)
                .filter(|n| !n.is_empty())
                .ok_or(DomainError::MissingName)?
                .to_string()
        } else {
            default_name.to_string()
        };

        let alias = optional_string(&metadata, "alias", &name);
        let description = optional_string(&metadata, "description", &name);
        let scope = match metadata.get("scope") {
            Some(PropertyValue::String(s)) => match s.parse::<Scope>() {
                Ok(scope) => Some(scope),
                Err(reason) => {
                    warn!(template = %name, %reason, "Ignoring template scope");
                    None
                }
            },
            other => {
                warn_missing(&name, "scope", other);
                None
            }
        };
        let sensitive = match metadata.get("sensitive") {
            Some(PropertyValue::Bool(b)) => *b,
            other => {
                warn_missing(&name, "sensitive", other);
                false
            }
        };

        let schema = match lookup(&document, &["template", "parameter"]) {
            None => None,
            Some(PropertyValue::Map(declarations)) => Some(Schema::from_declarations(declarations)?),
            Some(other) => {
                return Err(DomainError::InvalidSchema(format!(
                    "template.parameter must be a table, found {}",
                    other.kind()
                ))
                .into());
            }
        };

        let expanded_writer = self.sink_configs(&document)?;

        debug!(
            template = %name,
            sinks = expanded_writer.sinks.len(),
            "Parsed template"
        );

        Ok(Template {
            name,
            namespace: String::new(),
            alias,
            description,
            scope,
            sensitive,
            script,
            schema,
            expanded_writer,
            create_time: None,
        })
    }

    /// Create or replace a template in `namespace`.
    #[instrument(skip_all, fields(template = %template.name, namespace = %namespace))]
    pub async fn apply_template(&self, namespace: &str, template: &Template) -> ConfluxResult<()> {
        let object = template.to_object(namespace)?;
        self.timed(self.config.request_timeout, self.store.apply(object))
            .await
            .map_err(|e| {
                ApplicationError::store(format!("apply the template {}", template.name), e)
            })?;
        info!("Applied template");
        Ok(())
    }

    /// Load a template by name.
    #[instrument(skip_all, fields(template = %name, namespace = %namespace))]
    pub async fn load_template(&self, name: &str, namespace: &str) -> ConfluxResult<Template> {
        let object = self
            .timed(
                self.config.request_timeout,
                self.store
                    .get(ObjectKind::Config, namespace, &Template::object_name(name)),
            )
            .await
            .map_err(|e| match e {
                e if e.is_not_found() => ApplicationError::TemplateNotFound {
                    name: name.into(),
                    namespace: namespace.into(),
                },
                e => ApplicationError::store(format!("load the template {name}"), e),
            })?;
        Ok(Template::from_object(&object)?)
    }

    /// List the templates of a namespace, optionally of one scope.
    /// Unreadable entries are skipped.
    #[instrument(skip_all, fields(namespace = %namespace))]
    pub async fn list_templates(
        &self,
        namespace: &str,
        scope: Option<Scope>,
    ) -> ConfluxResult<Vec<Template>> {
        let selector = scoped(
            LabelSelector::new().with(keys::LABEL_CATALOG, keys::CATALOG_INTEGRATION),
            scope,
        );
        let objects = self
            .timed(
                self.config.template_list_timeout,
                self.store.list(ObjectKind::Config, namespace, &selector),
            )
            .await
            .map_err(|e| ApplicationError::store("list the templates", e))?;

        let templates = objects
            .iter()
            .filter_map(|object| match Template::from_object(object) {
                Ok(template) => Some(template),
                Err(e) => {
                    warn!(object = %object.name, error = %e, "Skipping unreadable template");
                    None
                }
            })
            .collect();
        Ok(templates)
    }

    /// Delete a template.
    #[instrument(skip_all, fields(template = %name, namespace = %namespace))]
    pub async fn delete_template(&self, namespace: &str, name: &str) -> ConfluxResult<()> {
        self.timed(
            self.config.request_timeout,
            self.store
                .delete(ObjectKind::Config, namespace, &Template::object_name(name)),
        )
        .await
        .map_err(|e| match e {
            e if e.is_not_found() => ApplicationError::TemplateNotFound {
                name: name.into(),
                namespace: namespace.into(),
            },
            e => ApplicationError::store(format!("delete the template {name}"), e),
        })?;
        info!("Deleted template");
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Integrations
    // ------------------------------------------------------------------------

    /// Build an integration without persisting anything.
    #[instrument(
        skip_all,
        fields(
            integration = %request.name,
            namespace = %request.namespace,
            template = request.template_name().unwrap_or_default()
        )
    )]
    pub async fn parse_integration(&self, request: IntegrationRequest) -> ConfluxResult<Integration> {
        let mut object = StoredObject::new(ObjectKind::Secret, &request.namespace, &request.name);
        object
            .labels
            .insert(keys::LABEL_CATALOG.into(), keys::CATALOG_INTEGRATION.into());

        let Some(template_name) = request.template_name() else {
            object.labels.insert(keys::LABEL_TYPE.into(), String::new());
            describe(&mut object, &request);
            object.data.insert(
                keys::INPUT_PROPERTIES.into(),
                encode_properties(&request.properties)?,
            );
            return Ok(Integration {
                name: request.name.clone(),
                namespace: request.namespace.clone(),
                alias: request.alias,
                description: request.description,
                properties: Some(request.properties),
                object,
                ..Default::default()
            });
        };

        let template = self
            .load_template(template_name, &request.template_namespace)
            .await?;

        if let Some(schema) = &template.schema {
            schema.validate(&request.properties)?;
        }
        let parameter = template
            .schema
            .as_ref()
            .map(|schema| schema.apply_defaults(&request.properties))
            .unwrap_or_else(|| request.properties.clone());

        let namespace = template
            .integration_namespace(&request.namespace, &self.config.system_namespace)
            .to_string();
        let context = RenderContext::new(&request.name, &namespace);

        if let Some(verdict) = self.engine.render(
            &template.script,
            &context,
            &parameter,
            &["template", "validation"],
        )? {
            Validation::from_value(verdict)?.check()?;
        }

        let output = match self.engine.render(
            &template.script,
            &context,
            &parameter,
            &["template", "output"],
        )? {
            Some(value) => PrimaryOutput::from_value(value)?,
            None => PrimaryOutput::default(),
        };

        object.namespace = namespace.clone();
        object.object_type = output
            .object_type
            .clone()
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| format!("conflux.io/{}", template.name));
        object.data = output.string_data();
        object.labels.extend(output.labels.clone());
        object.annotations.extend(output.annotations.clone());
        stamp(&mut object, &template);
        describe(&mut object, &request);
        object.data.insert(
            keys::INPUT_PROPERTIES.into(),
            encode_properties(&request.properties)?,
        );

        let expanded_writer_data = self.render_expanded_writers(&template, &context, &parameter)?;

        debug!(
            object_type = %object.object_type,
            sinks = expanded_writer_data.len(),
            "Rendered integration"
        );

        Ok(Integration {
            name: request.name.clone(),
            namespace,
            alias: request.alias,
            description: request.description,
            create_time: None,
            template: Some(template),
            properties: Some(request.properties),
            object,
            expanded_writer_data,
        })
    }

    /// Persist an integration, then deliver its sink payloads.
    ///
    /// The object is stored in `namespace` unless its template is
    /// system-scoped. An existing integration keeps its template and type.
    /// Every sink is attempted; the first failure is returned and the stored
    /// object is kept.
    #[instrument(skip_all, fields(integration = %integration.name, namespace = %namespace))]
    pub async fn apply_integration(
        &self,
        integration: &Integration,
        namespace: &str,
    ) -> ConfluxResult<()> {
        let mut object = integration.object.clone();
        let system_scoped = integration
            .template
            .as_ref()
            .is_some_and(|t| t.scope == Some(Scope::System));
        if !system_scoped && !namespace.is_empty() {
            object.namespace = namespace.to_string();
        }
        self.check_update(&object).await?;

        self.timed(self.config.request_timeout, self.store.apply(object))
            .await
            .map_err(|e| {
                ApplicationError::store(format!("apply the integration {}", integration.name), e)
            })?;
        info!("Applied integration");

        if integration.expanded_writer_data.is_empty() {
            return Ok(());
        }

        let mut errors = self
            .writers
            .dispatch(&integration.expanded_writer_data, self)
            .await;
        if errors.is_empty() {
            return Ok(());
        }
        warn!(failures = errors.len(), "Some sinks were not updated");
        Err(errors.swap_remove(0).into())
    }

    /// Read the properties of an integration. Sensitive integrations are refused.
    #[instrument(skip_all, fields(integration = %name, namespace = %namespace))]
    pub async fn read_integration(&self, namespace: &str, name: &str) -> ConfluxResult<PropertyMap> {
        let object = self.get_integration_object(namespace, name).await?;
        if object.is_sensitive() {
            return Err(ApplicationError::SensitiveIntegration { name: name.into() }.into());
        }
        Ok(decode_properties(&object)?)
    }

    /// List the integrations of a namespace, optionally for one template
    /// or one scope.
    ///
    /// Sensitive integrations come back without data or properties.
    #[instrument(skip_all, fields(namespace = %namespace, template = template.unwrap_or_default()))]
    pub async fn list_integrations(
        &self,
        namespace: &str,
        template: Option<&str>,
        scope: Option<Scope>,
    ) -> ConfluxResult<Vec<Integration>> {
        let mut selector =
            LabelSelector::new().with(keys::LABEL_CATALOG, keys::CATALOG_INTEGRATION);
        if let Some(template) = template {
            selector = selector.with(keys::LABEL_TYPE, template);
        }
        let selector = scoped(selector, scope);

        let objects = self
            .timed(
                self.config.integration_list_timeout,
                self.store.list(ObjectKind::Secret, namespace, &selector),
            )
            .await
            .map_err(|e| ApplicationError::store("list the integrations", e))?;

        let mut templates: HashMap<(String, String), Option<Template>> = HashMap::new();
        let mut integrations = Vec::with_capacity(objects.len());
        for object in objects {
            let template = self.listed_template(&object, &mut templates).await;
            let name = object.name.clone();
            match Integration::from_object(object, template) {
                Ok(integration) => integrations.push(integration),
                Err(e) => warn!(integration = %name, error = %e, "Skipping unreadable integration"),
            }
        }
        Ok(integrations)
    }

    /// Delete an integration. Objects not managed by the catalog are refused.
    #[instrument(skip_all, fields(integration = %name, namespace = %namespace))]
    pub async fn delete_integration(&self, namespace: &str, name: &str) -> ConfluxResult<()> {
        let object = self.get_integration_object(namespace, name).await?;
        if !object.is_integration() {
            return Err(ApplicationError::NotAnIntegration { name: name.into() }.into());
        }

        self.timed(
            self.config.request_timeout,
            self.store.delete(ObjectKind::Secret, namespace, name),
        )
        .await
        .map_err(|e| match e {
            e if e.is_not_found() => ApplicationError::IntegrationNotFound {
                name: name.into(),
                namespace: namespace.into(),
            },
            e => ApplicationError::store(format!("delete the integration {name}"), e),
        })?;
        info!("Deleted integration");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Internal Helpers
    // -------------------------------------------------------------------------

    async fn timed<T>(
        &self,
        limit: Duration,
        call: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, StoreError> {
        tokio::time::timeout(limit, call)
            .await
            .unwrap_or(Err(StoreError::Timeout(limit)))
    }

    async fn get_integration_object(
        &self,
        namespace: &str,
        name: &str,
    ) -> ConfluxResult<StoredObject> {
        let object = self
            .timed(
                self.config.request_timeout,
                self.store.get(ObjectKind::Secret, namespace, name),
            )
            .await
            .map_err(|e| match e {
                e if e.is_not_found() => ApplicationError::IntegrationNotFound {
                    name: name.into(),
                    namespace: namespace.into(),
                },
                e => ApplicationError::store(format!("get the integration {name}"), e),
            })?;
        Ok(object)
    }

    /// Refuse to move an existing integration to another template or type.
    async fn check_update(&self, object: &StoredObject) -> ConfluxResult<()> {
        let existing = match self
            .timed(
                self.config.request_timeout,
                self.store
                    .get(ObjectKind::Secret, &object.namespace, &object.name),
            )
            .await
        {
            Ok(existing) => existing,
            Err(e) if e.is_not_found() => return Ok(()),
            Err(e) => {
                return Err(
                    ApplicationError::store(format!("get the integration {}", object.name), e)
                        .into(),
                );
            }
        };

        let from = existing.label(keys::LABEL_TYPE).unwrap_or_default();
        let to = object.label(keys::LABEL_TYPE).unwrap_or_default();
        if from != to {
            return Err(ApplicationError::TemplateChanged {
                name: object.name.clone(),
                from: from.into(),
                to: to.into(),
            }
            .into());
        }
        if existing.object_type != object.object_type {
            return Err(ApplicationError::TypeChanged {
                name: object.name.clone(),
                from: existing.object_type,
                to: object.object_type.clone(),
            }
            .into());
        }
        Ok(())
    }

    /// Template of a listed integration, loaded once per listing.
    async fn listed_template(
        &self,
        object: &StoredObject,
        cache: &mut HashMap<(String, String), Option<Template>>,
    ) -> Option<Template> {
        let name = object.label(keys::LABEL_TYPE).filter(|n| !n.is_empty())?;
        let namespace = object
            .annotation(keys::ANNOTATION_TEMPLATE_NAMESPACE)
            .unwrap_or(&object.namespace);
        let key = (name.to_string(), namespace.to_string());

        if let Some(cached) = cache.get(&key) {
            return cached.clone();
        }
        let template = match self.load_template(name, namespace).await {
            Ok(template) => Some(template),
            Err(e) => {
                warn!(integration = %object.name, template = name, error = %e, "Template of integration is unavailable");
                None
            }
        };
        cache.insert(key, template.clone());
        template
    }

    /// Pick the `[template.<sink>]` tables: every table with an `endpoint`,
    /// and the table of every registered writer.
    fn sink_configs(&self, document: &PropertyMap) -> Result<ExpandedWriterConfig, DomainError> {
        let tables = match lookup(document, &["template"]) {
            Some(PropertyValue::Map(tables)) => tables,
            _ => return Ok(ExpandedWriterConfig::default()),
        };

        let mut sinks = Vec::new();
        for (kind, table) in tables {
            if RESERVED_SECTIONS.contains(&kind.as_str()) {
                continue;
            }
            let registered = self.writers.contains(kind);
            let table = match table {
                PropertyValue::Map(table) if registered || table.contains_key("endpoint") => table,
                PropertyValue::Map(_) => continue,
                _ if registered => {
                    return Err(DomainError::InvalidScript(format!(
                        "template.{kind} must be a table"
                    )));
                }
                _ => continue,
            };

            let endpoint = match table.get("endpoint") {
                Some(PropertyValue::String(name)) => name.clone(),
                Some(PropertyValue::Map(endpoint)) => endpoint
                    .get("name")
                    .and_then(PropertyValue::as_str)
                    .unwrap_or_default()
                    .to_string(),
                _ => String::new(),
            };
            if endpoint.is_empty() {
                return Err(DomainError::InvalidScript(format!(
                    "template.{kind}.endpoint.name is required"
                )));
            }

            let format = match table.get("format") {
                None => Format::Default,
                Some(PropertyValue::String(s)) => s.parse::<Format>().map_err(|_| {
                    DomainError::InvalidScript(format!("template.{kind}.format '{s}' is unknown"))
                })?,
                Some(other) => {
                    return Err(DomainError::InvalidScript(format!(
                        "template.{kind}.format must be a string, found {}",
                        other.kind()
                    )));
                }
            };

            sinks.push(SinkConfig {
                sink: kind.clone(),
                endpoint,
                format,
            });
        }
        Ok(ExpandedWriterConfig { sinks })
    }

    fn render_expanded_writers(
        &self,
        template: &Template,
        context: &RenderContext,
        parameter: &PropertyMap,
    ) -> Result<Vec<ExpandedWriterData>, DomainError> {
        template
            .expanded_writer
            .sinks
            .iter()
            .map(|config| -> Result<ExpandedWriterData, DomainError> {
                let sink = config.sink.as_str();
                let content =
                    self.render_map(template, context, parameter, &["template", sink, "content"])?;
                let metadata =
                    self.render_map(template, context, parameter, &["template", sink, "metadata"])?;
                Ok(ExpandedWriterData {
                    config: config.clone(),
                    content: encode(&content, config.format)?,
                    metadata,
                })
            })
            .collect()
    }

    fn render_map(
        &self,
        template: &Template,
        context: &RenderContext,
        parameter: &PropertyMap,
        path: &[&str],
    ) -> Result<PropertyMap, DomainError> {
        match self.engine.render(&template.script, context, parameter, path)? {
            None => Ok(PropertyMap::new()),
            Some(PropertyValue::Map(map)) => Ok(map),
            Some(other) => Err(DomainError::InvalidOutput(format!(
                "{} must be a table, found {}",
                path.join("."),
                other.kind()
            ))),
        }
    }
}

#[async_trait]
impl IntegrationReader for IntegrationFactory {
    fn system_namespace(&self) -> &str {
        &self.config.system_namespace
    }

    async fn resolve_integration(
        &self,
        namespace: &str,
        name: &str,
    ) -> ConfluxResult<PropertyMap> {
        let object = self.get_integration_object(namespace, name).await?;
        debug!(integration = name, namespace, "Resolved integration for a sink");
        Ok(decode_properties(&object)?)
    }
}

/// Sections of `[template]` that are not sinks.
const RESERVED_SECTIONS: [&str; 3] = ["parameter", "output", "validation"];

fn scoped(selector: LabelSelector, scope: Option<Scope>) -> LabelSelector {
    match scope {
        Some(scope) => selector.with(keys::LABEL_SCOPE, scope.to_string()),
        None => selector,
    }
}

fn lookup<'a>(document: &'a PropertyMap, path: &[&str]) -> Option<&'a PropertyValue> {
    let (first, rest) = path.split_first()?;
    document.get(*first)?.lookup(rest)
}

/// Labels and annotations every templated integration carries.
fn stamp(object: &mut StoredObject, template: &Template) {
    object
        .labels
        .insert(keys::LABEL_CATALOG.into(), keys::CATALOG_INTEGRATION.into());
    object
        .labels
        .insert(keys::LABEL_TYPE.into(), template.name.clone());
    object.labels.insert(
        keys::LABEL_SCOPE.into(),
        template.scope.map(|s| s.to_string()).unwrap_or_default(),
    );
    object.annotations.insert(
        keys::ANNOTATION_SENSITIVE.into(),
        template.sensitive.to_string(),
    );
    object.annotations.insert(
        keys::ANNOTATION_TEMPLATE_NAMESPACE.into(),
        template.namespace.clone(),
    );
}

/// Alias and description given by the caller.
fn describe(object: &mut StoredObject, request: &IntegrationRequest) {
    object
        .annotations
        .insert(keys::ANNOTATION_ALIAS.into(), request.alias.clone());
    object.annotations.insert(
        keys::ANNOTATION_DESCRIPTION.into(),
        request.description.clone(),
    );
}

fn optional_string(metadata: &PropertyMap, field: &str, template: &str) -> String {
    match metadata.get(field) {
        Some(PropertyValue::String(s)) => s.clone(),
        other => {
            warn_missing(template, field, other);
            String::new()
        }
    }
}

fn warn_missing(template: &str, field: &str, value: Option<&PropertyValue>) {
    match value {
        None => warn!(template, field, "Template metadata field is missing"),
        Some(v) => warn!(template, field, found = %v.kind(), "Template metadata field has the wrong type"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::MockObjectStore;
    use crate::error::ConfluxError;

    /// Accepts every script and finds nothing in it.
    struct EmptyEngine;

    impl ScriptEngine for EmptyEngine {
        fn parse(&self, _script: &TemplateScript) -> Result<PropertyMap, DomainError> {
            Ok(PropertyMap::new())
        }

        fn render(
            &self,
            _script: &TemplateScript,
            _context: &RenderContext,
            _parameter: &PropertyMap,
            _path: &[&str],
        ) -> Result<Option<PropertyValue>, DomainError> {
            Ok(None)
        }
    }

    /// Answers every call after a delay.
    struct SlowStore(Duration);

    #[async_trait]
    impl ObjectStore for SlowStore {
        async fn get(
            &self,
            kind: ObjectKind,
            namespace: &str,
            name: &str,
        ) -> Result<StoredObject, StoreError> {
            tokio::time::sleep(self.0).await;
            Ok(StoredObject::new(kind, namespace, name))
        }

        async fn list(
            &self,
            _kind: ObjectKind,
            _namespace: &str,
            _selector: &LabelSelector,
        ) -> Result<Vec<StoredObject>, StoreError> {
            tokio::time::sleep(self.0).await;
            Ok(Vec::new())
        }

        async fn apply(&self, object: StoredObject) -> Result<StoredObject, StoreError> {
            tokio::time::sleep(self.0).await;
            Ok(object)
        }

        async fn delete(&self, _: ObjectKind, _: &str, _: &str) -> Result<(), StoreError> {
            tokio::time::sleep(self.0).await;
            Ok(())
        }
    }

    fn factory(store: impl ObjectStore + 'static) -> IntegrationFactory {
        IntegrationFactory::new(Box::new(store), Box::new(EmptyEngine), WriterRegistry::new())
    }

    fn not_found(kind: ObjectKind, namespace: &str, name: &str) -> StoreError {
        StoreError::NotFound {
            kind: kind.to_string(),
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    fn integration_object(sensitive: bool) -> StoredObject {
        let mut object = StoredObject::new(ObjectKind::Secret, "default", "cache-1");
        object
            .labels
            .insert(keys::LABEL_CATALOG.into(), keys::CATALOG_INTEGRATION.into());
        object
            .annotations
            .insert(keys::ANNOTATION_SENSITIVE.into(), sensitive.to_string());
        object
            .data
            .insert(keys::INPUT_PROPERTIES.into(), r#"{"host":"10.0.0.1"}"#.into());
        object
    }

    #[test]
    fn parse_template_requires_a_name() {
        let err = factory(MockObjectStore::new())
            .parse_template("", b"")
            .unwrap_err();
        assert!(matches!(err, ConfluxError::Domain(DomainError::MissingName)));
    }

    #[test]
    fn parse_template_uses_the_default_name() {
        let template = factory(MockObjectStore::new())
            .parse_template("redis", b"")
            .unwrap();
        assert_eq!(template.name, "redis");
        assert_eq!(template.scope, None);
        assert!(!template.sensitive);
        assert!(template.schema.is_none());
    }

    #[test]
    fn parse_template_rejects_invalid_utf8() {
        let err = factory(MockObjectStore::new())
            .parse_template("x", &[0xff, 0xfe])
            .unwrap_err();
        assert!(matches!(err, ConfluxError::Domain(DomainError::InvalidScript(_))));
    }

    #[tokio::test]
    async fn load_template_maps_not_found() {
        let mut store = MockObjectStore::new();
        store
            .expect_get()
            .withf(|kind, ns, name| {
                *kind == ObjectKind::Config && ns == "default" && name == "integration-template-redis"
            })
            .returning(|kind, ns, name| Err(not_found(kind, ns, name)));

        let err = factory(store)
            .load_template("redis", "default")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ConfluxError::Application(ApplicationError::TemplateNotFound { ref name, .. }) if name == "redis"
        ));
    }

    #[tokio::test]
    async fn delete_template_maps_not_found() {
        let mut store = MockObjectStore::new();
        store
            .expect_delete()
            .returning(|kind, ns, name| Err(not_found(kind, ns, name)));

        let err = factory(store)
            .delete_template("default", "redis")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn backend_failures_keep_the_operation() {
        let mut store = MockObjectStore::new();
        store
            .expect_delete()
            .returning(|_, _, _| Err(StoreError::Backend("disk full".into())));

        let err = factory(store)
            .delete_template("default", "redis")
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "fail to delete the template redis: store backend error: disk full"
        );
    }

    #[tokio::test]
    async fn read_integration_refuses_sensitive_objects() {
        let mut store = MockObjectStore::new();
        store
            .expect_get()
            .returning(|_, _, _| Ok(integration_object(true)));

        let err = factory(store)
            .read_integration("default", "cache-1")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ConfluxError::Application(ApplicationError::SensitiveIntegration { .. })
        ));
    }

    #[tokio::test]
    async fn read_integration_returns_the_properties() {
        let mut store = MockObjectStore::new();
        store
            .expect_get()
            .returning(|_, _, _| Ok(integration_object(false)));

        let properties = factory(store)
            .read_integration("default", "cache-1")
            .await
            .unwrap();
        assert_eq!(properties["host"], PropertyValue::from("10.0.0.1"));
    }

    #[tokio::test]
    async fn delete_integration_checks_the_catalog_label() {
        let mut store = MockObjectStore::new();
        store.expect_get().returning(|kind, ns, name| {
            Ok(StoredObject::new(kind, ns, name))
        });
        store.expect_delete().never();

        let err = factory(store)
            .delete_integration("default", "registry-auth")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ConfluxError::Application(ApplicationError::NotAnIntegration { .. })
        ));
    }

    #[tokio::test]
    async fn delete_integration_of_missing_object_is_not_found() {
        let mut store = MockObjectStore::new();
        store
            .expect_get()
            .returning(|kind, ns, name| Err(not_found(kind, ns, name)));

        let err = factory(store)
            .delete_integration("default", "cache-1")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ConfluxError::Application(ApplicationError::IntegrationNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn list_integrations_filters_by_template_and_strips_sensitive_data() {
        let mut store = MockObjectStore::new();
        store
            .expect_list()
            .withf(|kind, ns, selector| {
                *kind == ObjectKind::Secret
                    && ns == "default"
                    && selector.to_string() == "conflux.io/catalog=integration,conflux.io/type=redis"
            })
            .returning(|_, _, _| {
                let mut object = integration_object(true);
                object.labels.insert(keys::LABEL_TYPE.into(), "redis".into());
                Ok(vec![object])
            });
        store
            .expect_get()
            .times(1)
            .returning(|kind, ns, name| Err(not_found(kind, ns, name)));

        let listed = factory(store)
            .list_integrations("default", Some("redis"), None)
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert!(listed[0].properties.is_none());
        assert!(listed[0].object.data.is_empty());
        assert!(listed[0].template.is_none());
    }

    #[tokio::test]
    async fn list_templates_filters_by_scope() {
        let mut store = MockObjectStore::new();
        store
            .expect_list()
            .withf(|kind, ns, selector| {
                *kind == ObjectKind::Config
                    && ns == "default"
                    && selector.to_string() == "conflux.io/catalog=integration,conflux.io/scope=system"
            })
            .returning(|_, _, _| Ok(Vec::new()));

        let listed = factory(store)
            .list_templates("default", Some(Scope::System))
            .await
            .unwrap();
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn apply_integration_stops_when_the_existing_object_is_unreadable() {
        let mut store = MockObjectStore::new();
        store
            .expect_get()
            .returning(|_, _, _| Err(StoreError::Backend("disk full".into())));
        store.expect_apply().never();

        let factory = factory(store);
        let integration = factory
            .parse_integration(IntegrationRequest::new("registry", "default").property("user", "admin"))
            .await
            .unwrap();
        let err = factory
            .apply_integration(&integration, "default")
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "fail to get the integration registry: store backend error: disk full"
        );
    }

    #[tokio::test]
    async fn raw_integration_carries_only_the_properties() {
        let request = IntegrationRequest::new("registry", "default").property("user", "admin");
        let integration = factory(MockObjectStore::new())
            .parse_integration(request)
            .await
            .unwrap();

        assert!(integration.template.is_none());
        assert_eq!(integration.object.label(keys::LABEL_TYPE), Some(""));
        assert!(integration.object.is_integration());
        assert_eq!(integration.object.data.len(), 1);
        assert_eq!(
            integration.object.data[keys::INPUT_PROPERTIES],
            r#"{"user":"admin"}"#
        );
        assert_eq!(integration.object.annotation(keys::ANNOTATION_ALIAS), Some(""));
    }

    #[tokio::test]
    async fn slow_store_calls_time_out() {
        let factory = factory(SlowStore(Duration::from_secs(5))).with_config(FactoryConfig {
            request_timeout: Duration::from_millis(20),
            ..Default::default()
        });

        let err = factory.load_template("redis", "default").await.unwrap_err();
        assert!(matches!(
            err,
            ConfluxError::Application(ApplicationError::Store {
                source: StoreError::Timeout(_),
                ..
            })
        ));
        assert!(err.is_retryable());
    }
}
